use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use human_repr::HumanCount;
use kdam::{term, tqdm, Bar, BarExt};
use tracing::{debug, error, info, warn};

use crate::config::Options;
use crate::converters::{self, ConverterSpec};
use crate::encoder::encoder_args;
use crate::error::ConversionError;
use crate::fstools::{classify_file, file_size, DirEntryCategory};
use crate::output_template;
use crate::pipeline::{CommandRunner, Pipeline, ToolCommand};

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_SETUP_FAILURE: u8 = 1;
pub const EXIT_FILES_FAILED: u8 = 2;
pub const EXIT_STOPPED: u8 = 130;

/// One invocation: a converter name still to be resolved, plus what to convert.
#[derive(Debug)]
pub struct ConversionJob {
    pub converter: String,
    pub options: Options,
    pub files: Vec<PathBuf>,
}

impl ConversionJob {
    pub fn new(converter: &str, options: Options, files: Vec<PathBuf>) -> Self {
        ConversionJob {
            converter: String::from(converter),
            options,
            files,
        }
    }

    pub fn resolve(self) -> Result<Session, ConversionError> {
        let converter = converters::resolve(&self.converter)?;
        debug!("using converter {:?}", converter.name);
        Ok(Session {
            converter,
            options: self.options,
            files: self.files,
        })
    }
}

/// A job whose converter has been found.
#[derive(Debug)]
pub struct Session {
    converter: &'static ConverterSpec,
    options: Options,
    files: Vec<PathBuf>,
}

#[derive(Debug, Default)]
pub struct JobReport {
    pub converted: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, ConversionError)>,
    pub stopped: bool,
}

impl JobReport {
    pub fn exit_code(&self) -> u8 {
        if self.stopped {
            EXIT_STOPPED
        } else if !self.failed.is_empty() {
            EXIT_FILES_FAILED
        } else {
            EXIT_SUCCESS
        }
    }
}

impl Session {
    pub fn converter(&self) -> &'static ConverterSpec {
        self.converter
    }

    pub fn programs(&self) -> Vec<&Path> {
        vec![(self.converter.program)(&self.options.programs), self.options.programs.lame.as_path()]
    }

    pub fn pipeline(&self, input: &Path) -> Pipeline {
        let media = &self.options.media;
        let output = output_template::render(&self.options.run.output_template, input);
        Pipeline {
            input: PathBuf::from(input),
            decoder: ToolCommand::new(
                (self.converter.program)(&self.options.programs),
                self.converter.decoder_args(media, input),
            ),
            encoder: ToolCommand::new(
                &self.options.programs.lame,
                encoder_args(media, &output, self.options.run.verbose),
            ),
            output,
        }
    }

    fn prepare(&self, input: &Path) -> Result<Pipeline, ConversionError> {
        match classify_file(input) {
            DirEntryCategory::RegularFile => (),
            DirEntryCategory::DoesNotExist => return Err(ConversionError::InputNotFound(PathBuf::from(input))),
            DirEntryCategory::Directory | DirEntryCategory::Unknown => return Err(ConversionError::NotAFile(PathBuf::from(input))),
        }

        let pipeline = self.pipeline(input);
        if pipeline.output == pipeline.input {
            return Err(ConversionError::OutputExists(pipeline.output));
        }
        if !self.options.run.overwrite && pipeline.output.exists() {
            return Err(ConversionError::OutputExists(pipeline.output));
        }
        Ok(pipeline)
    }

    pub fn convert_file(&self, input: &Path, runner: &dyn CommandRunner) -> Result<PathBuf, ConversionError> {
        let pipeline = self.prepare(input)?;
        runner.run(&pipeline)?;
        Ok(pipeline.output)
    }

    /// Converts every file in order. A failed file does not stop the rest;
    /// a raised `stop` flag does.
    pub fn convert_all(&self, runner: &dyn CommandRunner, stop: &Arc<AtomicBool>) -> JobReport {
        let mut report = JobReport::default();
        let mut pbar = self.progress_bar();

        for input in &self.files {
            if stop.load(Ordering::Relaxed) {
                warn!("stop requested; skipping remaining files");
                report.stopped = true;
                break;
            }

            info!("converting {:?}", input);
            match self.convert_file(input, runner) {
                Ok(output) => {
                    if !self.options.run.dry_run {
                        info!("wrote {:?} ({})", output, file_size(&output).human_count_bytes());
                    }
                    report.converted.push(output);
                },
                Err(err) => {
                    error!("{}", err);
                    report.failed.push((input.clone(), err));
                },
            }

            if let Some(pb) = pbar.as_mut() {
                let _ = pb.update(1);
            }
        }

        if pbar.is_some() {
            eprintln!();
        }

        debug!("{} converted, {} failed", report.converted.len(), report.failed.len());
        report
    }

    fn progress_bar(&self) -> Option<Bar> {
        if !self.options.run.progress || self.options.run.dry_run || self.files.is_empty() {
            return None;
        }
        term::init(false);
        Some(tqdm!(
            total = self.files.len(),
            desc = format!("converting with {}", self.converter.name),
            position = 0,
            force_refresh = true
        ))
    }
}

/// Resolve, then convert. Returns the process exit code.
pub fn run(job: ConversionJob, runner: &dyn CommandRunner, stop: &Arc<AtomicBool>) -> u8 {
    let session = match job.resolve() {
        Ok(session) => session,
        Err(err) => {
            eprintln!("a2mp3: {}", err);
            return EXIT_SETUP_FAILURE;
        },
    };

    if let Err(err) = runner.check(&session.programs()) {
        eprintln!("a2mp3: {}", err);
        return EXIT_SETUP_FAILURE;
    }

    session.convert_all(runner, stop).exit_code()
}
