//! Errors from reading and writing `config.ron`.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file exists but is not a valid Tessera config.
    #[error("invalid config in {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },

    #[error("cannot serialize config: {0}")]
    Serialize(#[source] ron::Error),

    /// No platform config directory and none given with `--config`.
    #[error("no config directory available on this platform")]
    NoConfigDir,
}

impl ConfigError {
    pub(crate) fn read(path: &std::path::Path) -> impl FnOnce(std::io::Error) -> Self + '_ {
        move |source| Self::Read {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn write(path: &std::path::Path) -> impl FnOnce(std::io::Error) -> Self + '_ {
        move |source| Self::Write {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn parse(
        path: &std::path::Path,
    ) -> impl FnOnce(ron::error::SpannedError) -> Self + '_ {
        move |source| Self::Parse {
            path: path.to_path_buf(),
            source,
        }
    }
}
