use std::fs;
use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;
use crate::media_options::MediaOptions;

pub const DEFAULT_OUTPUT_TEMPLATE: &str = "%{filename}.%{extname}";

/// External binaries. Bare names are looked up on `$PATH`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgramOptions {
    pub mplayer: PathBuf,
    pub lame: PathBuf,
}

impl Default for ProgramOptions {
    fn default() -> Self {
        ProgramOptions {
            mplayer: PathBuf::from("mplayer"),
            lame: PathBuf::from("lame"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RunOptions {
    pub verbose: bool,
    pub output_template: String,
    pub dry_run: bool,
    pub overwrite: bool,
    pub progress: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        RunOptions {
            verbose: false,
            output_template: String::from(DEFAULT_OUTPUT_TEMPLATE),
            dry_run: false,
            overwrite: false,
            progress: false,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Options {
    pub media: MediaOptions,
    pub programs: ProgramOptions,
    pub run: RunOptions,
}

/// Contents of a JSON config file. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub converter: Option<String>,
    pub verbose: Option<bool>,
    pub output_template: Option<String>,
    pub overwrite: Option<bool>,
    pub media: MediaOptions,
    pub programs: ProgramOptions,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        debug!("loading config from {:?}", path);
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: PathBuf::from(path),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: PathBuf::from(path),
            source,
        })
    }

    pub fn apply(self, options: &mut Options) {
        options.media = self.media;
        options.programs = self.programs;
        if let Some(verbose) = self.verbose {
            options.run.verbose = verbose;
        }
        if let Some(template) = self.output_template {
            options.run.output_template = template;
        }
        if let Some(overwrite) = self.overwrite {
            options.run.overwrite = overwrite;
        }
    }
}

/// Values given on the command line; `None` leaves the lower layer alone.
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub verbose: Option<bool>,
    pub output_template: Option<String>,
    pub bitrate: Option<String>,
    pub sample_rate: Option<String>,
    pub vbr_quality: Option<String>,
    pub mplayer: Option<PathBuf>,
    pub lame: Option<PathBuf>,
    pub dry_run: bool,
    pub overwrite: bool,
}

impl CliOverrides {
    pub fn apply(self, options: &mut Options) {
        if let Some(verbose) = self.verbose {
            options.run.verbose = verbose;
        }
        if let Some(template) = self.output_template {
            options.run.output_template = template;
        }
        if let Some(bitrate) = self.bitrate {
            options.media.bitrate = bitrate;
        }
        if let Some(rate) = self.sample_rate {
            options.media.sample_rate = rate;
        }
        if let Some(quality) = self.vbr_quality {
            options.media.vbr_quality = quality;
        }
        if let Some(mplayer) = self.mplayer {
            options.programs.mplayer = mplayer;
        }
        if let Some(lame) = self.lame {
            options.programs.lame = lame;
        }
        options.run.dry_run |= self.dry_run;
        options.run.overwrite |= self.overwrite;
    }
}
