// Load average source: first token of a one-line artifact (/proc/loadavg on Linux).

use crate::models::LoadSample;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProbeReadError {
    #[error("failed to read load source {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("load source {path} is empty")]
    Empty { path: PathBuf },
    #[error("load source {path}: {value:?} is not a number")]
    Parse { path: PathBuf, value: String },
    #[error("load source {path}: {value} is not a valid load average")]
    Invalid { path: PathBuf, value: f64 },
}

pub struct LoadavgRepo {
    path: PathBuf,
}

impl LoadavgRepo {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub async fn read_sample(&self) -> Result<LoadSample, ProbeReadError> {
        let content =
            tokio::fs::read_to_string(&self.path)
                .await
                .map_err(|source| ProbeReadError::Io {
                    path: self.path.clone(),
                    source,
                })?;
        parse_sample(&self.path, &content)
    }
}

/// Parse the first whitespace-separated token, e.g. `0.42 0.30 0.25 1/123 4567`.
pub fn parse_sample(path: &Path, content: &str) -> Result<LoadSample, ProbeReadError> {
    let Some(token) = content.split_whitespace().next() else {
        return Err(ProbeReadError::Empty {
            path: path.to_path_buf(),
        });
    };
    let value: f64 = token.parse().map_err(|_| ProbeReadError::Parse {
        path: path.to_path_buf(),
        value: token.to_string(),
    })?;
    LoadSample::new(value).ok_or_else(|| ProbeReadError::Invalid {
        path: path.to_path_buf(),
        value,
    })
}
