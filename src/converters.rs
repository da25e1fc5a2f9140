use std::ffi::OsString;
use std::fmt;
use std::path::Path;

use crate::config::ProgramOptions;
use crate::error::ConversionError;
use crate::media_options::MediaOptions;

pub mod mplayer;

pub const DEFAULT_CONVERTER: &str = "mplayer";

/// A decoding backend that can write raw audio to stdout.
pub struct ConverterSpec {
    pub name: &'static str,
    pub description: &'static str,
    /// Decoder arguments derived from the media options alone.
    pub build_args: fn(&MediaOptions) -> Vec<String>,
    /// Decoder arguments that stream `input` to stdout as WAV.
    pub stream_args: fn(&Path) -> Vec<OsString>,
    pub program: fn(&ProgramOptions) -> &Path,
}

impl ConverterSpec {
    pub fn decoder_args(&self, media: &MediaOptions, input: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = (self.build_args)(media)
            .into_iter()
            .map(OsString::from)
            .collect();
        args.append(&mut (self.stream_args)(input));
        args
    }
}

impl fmt::Debug for ConverterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConverterSpec").field("name", &self.name).finish_non_exhaustive()
    }
}

static CONVERTERS: &[ConverterSpec] = &[mplayer::MPLAYER];

pub fn all() -> &'static [ConverterSpec] {
    CONVERTERS
}

pub fn resolve(name: &str) -> Result<&'static ConverterSpec, ConversionError> {
    CONVERTERS
        .iter()
        .find(|c| c.name == name)
        .ok_or_else(|| ConversionError::ConverterNotFound(String::from(name)))
}
