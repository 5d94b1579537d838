// Flat-file baseline: one port per line, rewritten every cycle and read back at startup.
// Writes go to a sibling temp file which is then renamed over the target, so a crash
// mid-write leaves the previous baseline intact.

use crate::models::PortSnapshot;
use std::fmt::Write as _;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::instrument;

#[derive(Error, Debug)]
pub enum StateError {
    #[error("failed to write port state {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read port state {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid port on line {line} of {path}: {value:?}")]
    Parse {
        path: PathBuf,
        line: usize,
        value: String,
    },
}

pub struct StateRepo {
    path: PathBuf,
}

impl StateRepo {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Overwrites the artifact with `snapshot`, ascending, one port per line.
    #[instrument(skip(self, snapshot), fields(repo = "state", operation = "save_ports", path = %self.path.display(), ports = snapshot.len()))]
    pub async fn save(&self, snapshot: &PortSnapshot) -> Result<(), StateError> {
        let mut body = String::with_capacity(snapshot.len() * 6);
        for port in snapshot.iter() {
            let _ = writeln!(body, "{}", port);
        }

        let write_err = |source: io::Error| StateError::Write {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
        }
        let tmp = self.tmp_path();
        tokio::fs::write(&tmp, body.as_bytes())
            .await
            .map_err(write_err)?;
        if let Err(e) = tokio::fs::rename(&tmp, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(write_err(e));
        }
        Ok(())
    }

    /// Previous baseline, or `None` if nothing has been saved yet.
    #[instrument(skip(self), fields(repo = "state", operation = "load_ports", path = %self.path.display()))]
    pub async fn load(&self) -> Result<Option<PortSnapshot>, StateError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StateError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        parse_ports(&self.path, &content).map(Some)
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "ports".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

fn parse_ports(path: &Path, content: &str) -> Result<PortSnapshot, StateError> {
    let mut ports = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        let value = line.trim();
        if value.is_empty() {
            continue;
        }
        match value.parse::<u16>() {
            Ok(port) if port > 0 => ports.push(port),
            _ => {
                return Err(StateError::Parse {
                    path: path.to_path_buf(),
                    line: idx + 1,
                    value: value.to_string(),
                });
            }
        }
    }
    Ok(ports.into_iter().collect())
}
