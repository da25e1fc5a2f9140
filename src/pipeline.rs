use std::ffi::OsString;
use std::fmt::{self, Display};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use tracing::{debug, warn};

use crate::error::ConversionError;

#[derive(Clone, Debug, PartialEq)]
pub struct ToolCommand {
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

impl ToolCommand {
    pub fn new(program: &Path, args: Vec<OsString>) -> Self {
        ToolCommand {
            program: PathBuf::from(program),
            args,
        }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }
}

impl Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", shell_quote(&self.program.as_os_str().to_string_lossy()))?;
        for arg in &self.args {
            write!(f, " {}", shell_quote(&arg.to_string_lossy()))?;
        }
        Ok(())
    }
}

fn shell_quote(s: &str) -> String {
    let plain = !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || "-_./=:,+%@".contains(c));
    if plain {
        String::from(s)
    } else {
        format!("'{}'", s.replace('\'', "'\\''"))
    }
}

/// Decoder writing WAV to stdout, piped into the encoder.
#[derive(Clone, Debug, PartialEq)]
pub struct Pipeline {
    pub input: PathBuf,
    pub output: PathBuf,
    pub decoder: ToolCommand,
    pub encoder: ToolCommand,
}

impl Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} | {}", self.decoder, self.encoder)
    }
}

pub trait CommandRunner {
    /// Called once before any file is converted.
    fn check(&self, _programs: &[&Path]) -> Result<(), ConversionError> {
        Ok(())
    }

    fn run(&self, pipeline: &Pipeline) -> Result<(), ConversionError>;
}

/// Runs the pipeline for real.
pub struct SystemRunner {
    /// Let the tools write to our stderr instead of discarding it.
    pub show_tool_output: bool,
}

impl SystemRunner {
    pub fn new(show_tool_output: bool) -> Self {
        SystemRunner { show_tool_output }
    }

    fn stderr(&self) -> Stdio {
        if self.show_tool_output { Stdio::inherit() } else { Stdio::null() }
    }
}

impl CommandRunner for SystemRunner {
    fn check(&self, programs: &[&Path]) -> Result<(), ConversionError> {
        match programs.iter().find(|p| !is_installed(p)) {
            Some(missing) => Err(ConversionError::ToolNotInstalled(PathBuf::from(missing))),
            None => Ok(()),
        }
    }

    fn run(&self, pipeline: &Pipeline) -> Result<(), ConversionError> {
        let input = &pipeline.input;
        debug!("{}", pipeline);

        let mut decoder = pipeline.decoder.command()
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(self.stderr())
            .spawn()
            .map_err(|e| ConversionError::for_file(input, &pipeline.decoder.program, &format!("could not be started: {}", e)))?;

        let decoded = match decoder.stdout.take() {
            Some(stdout) => stdout,
            None => {
                kill_and_reap(&mut decoder);
                return Err(ConversionError::for_file(input, &pipeline.decoder.program, "has no stdout."));
            },
        };

        let encoder = pipeline.encoder.command()
            .stdin(Stdio::from(decoded))
            .stdout(Stdio::null())
            .stderr(self.stderr())
            .spawn();
        let mut encoder = match encoder {
            Ok(child) => child,
            Err(e) => {
                kill_and_reap(&mut decoder);
                return Err(ConversionError::for_file(input, &pipeline.encoder.program, &format!("could not be started: {}", e)));
            },
        };

        let encoder_status = encoder.wait()
            .map_err(|e| ConversionError::for_file(input, &pipeline.encoder.program, &format!("could not be waited for: {}", e)));
        let decoder_status = decoder.wait()
            .map_err(|e| ConversionError::for_file(input, &pipeline.decoder.program, &format!("could not be waited for: {}", e)));

        // an encoder that gives up takes the decoder down with SIGPIPE
        let decoder_signalled = matches!(&decoder_status, Ok(status) if status.code().is_none());
        let encoder_result = check_status(input, &pipeline.encoder.program, encoder_status);
        let result = match encoder_result {
            Err(err) if decoder_signalled => Err(err),
            encoder_result => check_status(input, &pipeline.decoder.program, decoder_status).and(encoder_result),
        };

        if result.is_err() {
            remove_partial_output(&pipeline.output);
        }
        result
    }
}

fn check_status(input: &Path, program: &Path, status: Result<ExitStatus, ConversionError>) -> Result<(), ConversionError> {
    let status = status?;
    match status.success() {
        true => Ok(()),
        false => match status.code() {
            Some(code) => Err(ConversionError::for_file(input, program, &format!("exited with {}", code))),
            None => Err(ConversionError::for_file(input, program, "was terminated by a signal.")),
        },
    }
}

fn kill_and_reap(child: &mut Child) {
    if let Err(err) = child.kill() {
        warn!("error killing process ({}) {:?}", child.id(), err);
    }
    let _ = child.wait();
}

fn remove_partial_output(output: &Path) {
    if output.exists() {
        match fs::remove_file(output) {
            Ok(()) => debug!("removed partial output {:?}", output),
            Err(err) => warn!("could not remove partial output {:?}: {}", output, err),
        }
    }
}

/// Prints each pipeline as a shell command line instead of running it.
pub struct DryRunner<W: Write> {
    out: std::cell::RefCell<W>,
}

impl DryRunner<io::Stdout> {
    pub fn stdout() -> Self {
        DryRunner::new(io::stdout())
    }
}

impl<W: Write> DryRunner<W> {
    pub fn new(out: W) -> Self {
        DryRunner { out: std::cell::RefCell::new(out) }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }
}

impl<W: Write> CommandRunner for DryRunner<W> {
    fn run(&self, pipeline: &Pipeline) -> Result<(), ConversionError> {
        writeln!(self.out.borrow_mut(), "{}", pipeline)
            .map_err(|e| ConversionError::io(&pipeline.input, e))
    }
}

/// Whether `program` can be spawned at all. Its exit status is ignored.
pub fn is_installed(program: &Path) -> bool {
    let status = Command::new(program)
        .arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
    match status {
        Ok(_) => true,
        Err(err) => {
            debug!("{:?} is not runnable: {}", program, err);
            false
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pipeline(decoder: &str, decoder_args: &[&str], encoder: &str, encoder_args: &[&str], output: &Path) -> Pipeline {
        Pipeline {
            input: PathBuf::from("in.ogg"),
            output: PathBuf::from(output),
            decoder: ToolCommand::new(Path::new(decoder), decoder_args.iter().map(OsString::from).collect()),
            encoder: ToolCommand::new(Path::new(encoder), encoder_args.iter().map(OsString::from).collect()),
        }
    }

    #[test]
    fn test_display_quotes_args() {
        let p = pipeline("mplayer", &["-af", "resample=44100", "my song.ogg"], "lame", &["-", "it's.mp3"], Path::new("x.mp3"));
        assert_eq!(p.to_string(), "mplayer -af resample=44100 'my song.ogg' | lame - 'it'\\''s.mp3'");
    }

    #[test]
    fn test_dry_runner_writes_command_line() {
        let runner = DryRunner::new(Vec::new());
        let p = pipeline("mplayer", &["a.ogg"], "lame", &["-", "a.mp3"], Path::new("a.mp3"));
        runner.run(&p).unwrap();
        assert_eq!(String::from_utf8(runner.into_inner()).unwrap(), "mplayer a.ogg | lame - a.mp3\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_system_runner_success() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.mp3");
        let p = pipeline("echo", &["hello"], "sh", &["-c", &format!("cat > {}", output.display())], &output);
        SystemRunner::new(false).run(&p).unwrap();
        assert_eq!(fs::read_to_string(&output).unwrap(), "hello\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_system_runner_encoder_failure_removes_output() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.mp3");
        let p = pipeline("echo", &["hello"], "sh", &["-c", &format!("cat > {}; exit 3", output.display())], &output);
        let err = SystemRunner::new(false).run(&p).unwrap_err();
        assert!(err.to_string().contains("exited with 3"), "{}", err);
        assert!(!output.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_system_runner_blames_encoder_over_broken_pipe() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.mp3");
        let p = pipeline("yes", &[], "sh", &["-c", "exit 3"], &output);
        match SystemRunner::new(false).run(&p) {
            Err(ConversionError::ExternalToolFailure { tool, message, .. }) => {
                assert_eq!(tool, "sh");
                assert_eq!(message, "exited with 3");
            },
            other => panic!("unexpected {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_system_runner_decoder_failure() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.mp3");
        let p = pipeline("false", &[], "sh", &["-c", "cat > /dev/null"], &output);
        match SystemRunner::new(false).run(&p) {
            Err(ConversionError::ExternalToolFailure { tool, .. }) => assert_eq!(tool, "false"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_missing_program() {
        let dir = tempfile::tempdir().unwrap();
        let p = pipeline("/nonexistent/mplayer", &[], "/nonexistent/lame", &[], &dir.path().join("out.mp3"));
        let err = SystemRunner::new(false).run(&p).unwrap_err();
        assert!(err.to_string().contains("could not be started"), "{}", err);
        assert!(!is_installed(Path::new("/nonexistent/mplayer")));
    }

    #[cfg(unix)]
    #[test]
    fn test_check() {
        let runner = SystemRunner::new(false);
        assert!(runner.check(&[Path::new("sh")]).is_ok());
        match runner.check(&[Path::new("sh"), Path::new("/nonexistent/lame")]) {
            Err(ConversionError::ToolNotInstalled(path)) => assert_eq!(path, PathBuf::from("/nonexistent/lame")),
            other => panic!("unexpected {:?}", other),
        }
    }
}
