pub mod config;
pub mod converters;
pub mod encoder;
pub mod error;
pub mod fstools;
pub mod job;
pub mod media_options;
pub mod output_template;
pub mod pipeline;

use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use config::{CliOverrides, FileConfig, Options};
use converters::DEFAULT_CONVERTER;
use job::{ConversionJob, EXIT_SETUP_FAILURE};
use pipeline::{DryRunner, SystemRunner};
use rustop::opts;
use signal_hook::consts::{SIGINT, SIGTERM};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let (args, _rest) = opts! {
        synopsis "Convert media files to mp3 by piping an external decoder into lame.";
        opt verbose:bool=false, short:'v', desc:"Log what is being done to stderr.";
        opt no_verbose:bool=false, short:'V', desc:"Turn verbose logging off again (overrides the config file).";
        opt output:Option<String>, short:'o', desc:"Output template instead of just replacing the file extension. Placeholders: %{filename}, %{extname}.";
        opt converter:Option<String>, short:'c', desc:"Converter to use (default: mplayer). Use -L to see possible converters.";
        opt list_converters:bool=false, short:'L', desc:"List available converters and exit.";
        opt bitrate:Option<String>, short:'b', desc:"Bitrate, e.g. 320k. The ceiling when --vbr is set.";
        opt samplerate:Option<String>, short:'r', desc:"Sampling rate to resample to, e.g. 44100.";
        opt vbr:Option<String>, short:'q', desc:"VBR quality 0-9; empty for constant bitrate.";
        opt mplayer:Option<String>, short:'m', desc:"Path of the mplayer binary.";
        opt lame:Option<String>, short:'l', desc:"Path of the lame binary.";
        opt config:Option<String>, short:'f', desc:"JSON config file.";
        opt dry_run:bool=false, short:'n', desc:"Print the commands instead of running them.";
        opt overwrite:bool=false, short:'y', desc:"Replace existing output files.";
        param files:Vec<String>, desc:"Input files.";
    }.parse_or_exit();

    if args.list_converters {
        for converter in converters::all() {
            println!("{:<10} {}", converter.name, converter.description);
        }
        return ExitCode::SUCCESS;
    }

    let mut options = Options::default();
    let mut converter = None;
    if let Some(path) = &args.config {
        match FileConfig::load(Path::new(path)) {
            Ok(mut file_config) => {
                converter = file_config.converter.take();
                file_config.apply(&mut options);
            },
            Err(err) => {
                eprintln!("a2mp3: {}", err);
                return ExitCode::from(EXIT_SETUP_FAILURE);
            },
        }
    }

    CliOverrides {
        verbose: if args.no_verbose { Some(false) } else if args.verbose { Some(true) } else { None },
        output_template: args.output,
        bitrate: args.bitrate,
        sample_rate: args.samplerate,
        vbr_quality: args.vbr,
        mplayer: args.mplayer.map(PathBuf::from),
        lame: args.lame.map(PathBuf::from),
        dry_run: args.dry_run,
        overwrite: args.overwrite,
    }.apply(&mut options);
    options.run.progress = !options.run.verbose && io::stderr().is_terminal();

    init_logging(options.run.verbose);
    debug!("{:?}", options);

    let stop = Arc::new(AtomicBool::new(false));
    for signal in [SIGINT, SIGTERM] {
        if let Err(err) = signal_hook::flag::register(signal, Arc::clone(&stop)) {
            warn!("unable to handle signal {}: {}", signal, err);
        }
    }

    let converter = args.converter
        .or(converter)
        .unwrap_or_else(|| String::from(DEFAULT_CONVERTER));
    let files: Vec<PathBuf> = args.files.into_iter().map(PathBuf::from).collect();
    let dry_run = options.run.dry_run;
    let verbose = options.run.verbose;
    let job = ConversionJob::new(&converter, options, files);

    let code = if dry_run {
        job::run(job, &DryRunner::stdout(), &stop)
    } else {
        job::run(job, &SystemRunner::new(verbose), &stop)
    };
    ExitCode::from(code)
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .init();
}
