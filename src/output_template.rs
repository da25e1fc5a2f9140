use std::ffi::OsString;
use std::path::{Path, PathBuf};

pub const EXTNAME: &str = "mp3";

/// Expand `%{filename}` (input path minus its extension) and `%{extname}`.
/// Anything else in the template is copied as is.
pub fn render(template: &str, input: &Path) -> PathBuf {
    let filename = input.with_extension("");
    let mut out = OsString::new();
    let mut rest = template;

    while let Some(start) = rest.find("%{") {
        out.push(&rest[..start]);
        let tail = &rest[start..];
        if let Some(after) = tail.strip_prefix("%{filename}") {
            out.push(filename.as_os_str());
            rest = after;
        } else if let Some(after) = tail.strip_prefix("%{extname}") {
            out.push(EXTNAME);
            rest = after;
        } else {
            out.push("%{");
            rest = &tail[2..];
        }
    }
    out.push(rest);

    PathBuf::from(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_OUTPUT_TEMPLATE;

    #[test]
    fn test_default_template_replaces_extension() {
        assert_eq!(render(DEFAULT_OUTPUT_TEMPLATE, Path::new("/foo/bar/baz.flac")), PathBuf::from("/foo/bar/baz.mp3"));
        assert_eq!(render(DEFAULT_OUTPUT_TEMPLATE, Path::new("bar/baz.tar.ogg")), PathBuf::from("bar/baz.tar.mp3"));
        assert_eq!(render(DEFAULT_OUTPUT_TEMPLATE, Path::new("noext")), PathBuf::from("noext.mp3"));
    }

    #[test]
    fn test_custom_template() {
        assert_eq!(render("%{filename}-320.%{extname}", Path::new("a/song.wma")), PathBuf::from("a/song-320.mp3"));
        assert_eq!(render("fixed.mp3", Path::new("a/song.wma")), PathBuf::from("fixed.mp3"));
        assert_eq!(render("%{extname}/%{filename}.%{extname}", Path::new("song.wma")), PathBuf::from("mp3/song.mp3"));
    }

    #[test]
    fn test_unknown_placeholder_left_alone() {
        assert_eq!(render("%{dirname}/%{filename}.%{extname}", Path::new("x.ogg")), PathBuf::from("%{dirname}/x.mp3"));
        assert_eq!(render("100%{", Path::new("x.ogg")), PathBuf::from("100%{"));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_filename_kept_byte_for_byte() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let input = Path::new(OsStr::from_bytes(b"music/caf\xe9.ogg"));
        let output = render(DEFAULT_OUTPUT_TEMPLATE, input);
        assert_eq!(output.as_os_str().as_bytes(), b"music/caf\xe9.mp3");
    }
}
