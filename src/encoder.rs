use std::ffi::OsString;
use std::path::Path;

use crate::media_options::MediaOptions;

/// `lame` arguments for reading a WAV stream on stdin and writing `output`.
pub fn encoder_args(media: &MediaOptions, output: &Path, verbose: bool) -> Vec<OsString> {
    let mut args = vec![];

    if !verbose {
        args.push(OsString::from("--quiet"));
    }

    if media.vbr_quality.is_empty() {
        args.push(OsString::from("-b"));
        args.push(OsString::from(media.kbps()));
    } else {
        // bitrate becomes the ceiling in vbr mode
        args.push(OsString::from("-V"));
        args.push(OsString::from(&media.vbr_quality));
        args.push(OsString::from("-B"));
        args.push(OsString::from(media.kbps()));
    }

    args.push(OsString::from("-"));
    args.push(output.as_os_str().to_os_string());
    args
}
