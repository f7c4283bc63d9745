use std::{collections::HashSet, io, path::Path};

use alphaq_core::ConfigError;
use alphaq_model::{Job, JobTemplate};
use anyhow::Context;
use tracing::{info, warn};

/// Expressions of a job file, in order: trimmed, without blanks, `#` comments or repeats.
pub fn parse_expressions(content: &str) -> Vec<&str> {
    let mut seen = HashSet::new();
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter(|expr| seen.insert(*expr))
        .collect()
}

/// Read the job file and stamp every expression with `template`.
pub async fn load_jobs(path: &Path, template: &JobTemplate) -> anyhow::Result<Vec<Job>> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(ConfigError::MissingJobSource(path.to_path_buf()).into());
        }
        Err(e) => {
            return Err(e).with_context(|| format!("failed to read job file {}", path.display()));
        }
    };

    let expressions = parse_expressions(&content);
    if expressions.is_empty() {
        warn!(path = %path.display(), "job file contains no expressions");
    }
    let jobs = template.jobs(expressions)?;
    info!(path = %path.display(), jobs = jobs.len(), "job file loaded");
    Ok(jobs)
}
