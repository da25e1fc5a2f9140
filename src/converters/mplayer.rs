use std::ffi::OsString;
use std::path::Path;

use crate::config::ProgramOptions;
use crate::media_options::MediaOptions;
use super::ConverterSpec;

pub const MPLAYER: ConverterSpec = ConverterSpec {
    name: "mplayer",
    description: "decode anything mplayer can play, resampled to the target rate",
    build_args,
    stream_args,
    program,
};

fn build_args(media: &MediaOptions) -> Vec<String> {
    vec![
        String::from("-vo"), String::from("null"),
        String::from("-vc"), String::from("dummy"),
        String::from("-af"), format!("resample={}", media.sample_rate),
    ]
}

fn stream_args(input: &Path) -> Vec<OsString> {
    vec![
        OsString::from("-ao"), OsString::from("pcm:fast:file=/dev/stdout"),
        OsString::from("-really-quiet"),
        OsString::from("-noconsolecontrols"),
        input.as_os_str().to_os_string(),
    ]
}

fn program(programs: &ProgramOptions) -> &Path {
    &programs.mplayer
}
