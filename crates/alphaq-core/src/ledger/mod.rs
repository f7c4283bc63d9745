//! Completion ledger: the newline-delimited record of expressions already simulated.
//!
//! The scheduler only ever reads the ledger ([`CompletionLedger`]); appending is done by the
//! submission primitive through [`LedgerAppender`] once the platform confirms a simulation.

use std::{
    collections::HashSet,
    io,
    path::{Path, PathBuf},
};

use alphaq_model::{Job, JobId};
use tokio::{fs, io::AsyncWriteExt, sync::Mutex};
use tracing::{debug, warn};

use crate::error::LedgerError;

/// Read-only set of job identifiers completed by earlier runs.
#[derive(Debug, Clone, Default)]
pub struct CompletionLedger {
    ids: HashSet<JobId>,
}

impl CompletionLedger {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<JobId>,
    {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse ledger text: one identifier per line, surrounding whitespace trimmed, blank lines skipped.
    pub fn parse(content: &str) -> Self {
        Self::from_ids(
            content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty()),
        )
    }

    /// Load the ledger at `path`.
    ///
    /// A missing file means nothing has completed yet and yields an empty ledger.
    /// Every other read failure is returned to the caller.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let path = path.as_ref();
        match fs::read_to_string(path).await {
            Ok(content) => {
                let ledger = Self::parse(&content);
                debug!(path = %path.display(), completed = ledger.len(), "ledger loaded");
                Ok(ledger)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "ledger file not found; treating every job as pending");
                Ok(Self::empty())
            }
            Err(source) => Err(LedgerError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Keep only jobs whose identifier is absent from the ledger, preserving order.
    pub fn filter(&self, jobs: Vec<Job>) -> Vec<Job> {
        jobs.into_iter()
            .filter(|job| !self.contains(job.id().as_str()))
            .collect()
    }
}

/// Append-only writer for the ledger file, shared by concurrent submissions.
#[derive(Debug)]
pub struct LedgerAppender {
    path: PathBuf,
    file: Mutex<Option<fs::File>>,
}

impl LedgerAppender {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record `id` as completed. The file and its parent directory are created on first use.
    pub async fn append(&self, id: &JobId) -> Result<(), LedgerError> {
        if id.as_str().contains(['\n', '\r']) {
            return Err(LedgerError::MultilineIdentifier(id.to_string()));
        }

        let mut guard = self.file.lock().await;
        if guard.is_none() {
            *guard = Some(self.open().await.map_err(|source| self.write_err(source))?);
        }
        let Some(file) = guard.as_mut() else {
            return Err(self.write_err(io::Error::other("ledger file handle unavailable")));
        };

        let line = format!("{id}\n");
        file.write_all(line.as_bytes())
            .await
            .map_err(|source| self.write_err(source))?;
        file.flush().await.map_err(|source| self.write_err(source))
    }

    async fn open(&self) -> io::Result<fs::File> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await?;
        }
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
    }

    fn write_err(&self, source: io::Error) -> LedgerError {
        LedgerError::Write {
            path: self.path.clone(),
            source,
        }
    }
}
