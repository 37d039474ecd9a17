use std::io;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use thiserror::Error;

/// Every way a `tdg` invocation can fail. All variants are fatal and map to
/// the same exit status.
#[derive(Debug, Error)]
pub enum TdgError {
    #[error("template config not found at {path}")]
    ConfigNotFound { path: Utf8PathBuf },

    #[error("reading template config {path}")]
    ConfigRead {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("parsing template config {path}: {message}")]
    ConfigParse { path: Utf8PathBuf, message: String },

    #[error("template `{name}` not defined in {config}")]
    TemplateNotFound { name: String, config: Utf8PathBuf },

    #[error("invalid target name `{name}`: {reason}")]
    InvalidName { name: String, reason: &'static str },

    #[error("creating {path}")]
    PathCreation {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("writing creation log")]
    Output(#[source] io::Error),

    #[error("determining current directory")]
    CurrentDir(#[source] io::Error),

    #[error("path is not valid UTF-8: {}", .0.display())]
    NonUtf8Path(PathBuf),
}

pub type Result<T> = std::result::Result<T, TdgError>;
