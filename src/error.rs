use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("no converter named {0:?} available")]
    ConverterNotFound(String),

    #[error("Error converting {path:?}: {tool} {message}")]
    ExternalToolFailure {
        path: PathBuf,
        tool: String,
        message: String,
    },

    #[error("{0:?} is not installed or not on $PATH.")]
    ToolNotInstalled(PathBuf),

    #[error("{0:?} does not exist.")]
    InputNotFound(PathBuf),

    #[error("{0:?} is not a regular file.")]
    NotAFile(PathBuf),

    #[error("{0:?} already exists; use --overwrite to replace it.")]
    OutputExists(PathBuf),

    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ConversionError {
    pub fn for_file(path: &Path, tool: &Path, msg: &str) -> Self {
        ConversionError::ExternalToolFailure {
            path: PathBuf::from(path),
            tool: tool.display().to_string(),
            message: String::from(msg),
        }
    }

    pub fn io(path: &Path, source: io::Error) -> Self {
        ConversionError::Io {
            path: PathBuf::from(path),
            source,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_converter_not_found_quotes_name() {
        let err = ConversionError::ConverterNotFound(String::from("does\"not exist"));
        assert_eq!(err.to_string(), "no converter named \"does\\\"not exist\" available");
    }

    #[test]
    fn test_converter_not_found_escapes_control_chars_only() {
        let err = ConversionError::ConverterNotFound(String::from("mp\tlayer\n"));
        assert_eq!(err.to_string(), "no converter named \"mp\\tlayer\\n\" available");
        let err = ConversionError::ConverterNotFound(String::from("mplayér"));
        assert_eq!(err.to_string(), "no converter named \"mplayér\" available");
    }

    #[test]
    fn test_for_file() {
        let err = ConversionError::for_file(Path::new("song.ogg"), Path::new("lame"), "exited with 3");
        assert_eq!(err.to_string(), "Error converting \"song.ogg\": lame exited with 3");
    }
}
