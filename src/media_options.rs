use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaOptions {
    pub bitrate: String,
    pub sample_rate: String,
    pub vbr_quality: String,
}

impl Default for MediaOptions {
    fn default() -> Self {
        MediaOptions {
            bitrate: String::from("320k"),
            sample_rate: String::from("44100"),
            vbr_quality: String::from("4"),
        }
    }
}

impl MediaOptions {
    /// Bitrate in kbit/s as the encoder wants it ("320k" -> "320").
    pub fn kbps(&self) -> &str {
        self.bitrate.trim_end_matches(['k', 'K'])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let media = MediaOptions::default();
        assert_eq!(media.bitrate, "320k");
        assert_eq!(media.sample_rate, "44100");
        assert_eq!(media.vbr_quality, "4");
    }

    #[test]
    fn test_kbps() {
        assert_eq!(MediaOptions::default().kbps(), "320");
        let media = MediaOptions { bitrate: String::from("192K"), ..MediaOptions::default() };
        assert_eq!(media.kbps(), "192");
        let media = MediaOptions { bitrate: String::from("128"), ..MediaOptions::default() };
        assert_eq!(media.kbps(), "128");
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let media: MediaOptions = serde_json::from_str(r#"{"sample_rate": "48000"}"#).unwrap();
        assert_eq!(media.sample_rate, "48000");
        assert_eq!(media.bitrate, "320k");
        assert_eq!(media.vbr_quality, "4");
    }
}
