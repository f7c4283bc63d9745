use crate::{Job, ModelError, Neutralization, RegionPreset, Tags};

/// Shared simulation settings stamped onto every generated expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobTemplate {
    pub region: RegionPreset,
    pub decay: u32,
    pub delay: u32,
    pub neutralization: Neutralization,
    pub tags: Tags,
}

impl JobTemplate {
    /// Template labelled with a single run tag.
    pub fn tagged(run_tag: impl Into<String>) -> Self {
        Self {
            tags: vec![run_tag.into()],
            ..Default::default()
        }
    }

    /// Build a job for one expression. Surrounding whitespace is dropped.
    pub fn job(&self, expression: &str) -> Result<Job, ModelError> {
        let expression = expression.trim();
        if expression.is_empty() {
            return Err(ModelError::EmptyExpression);
        }
        Ok(Job::new(expression)
            .with_region(self.region.region(), self.region.universe())
            .with_decay(self.decay)
            .with_delay(self.delay)
            .with_neutralization(self.neutralization)
            .with_tags(self.tags.clone()))
    }

    /// Build jobs for every expression, preserving input order.
    pub fn jobs<I, S>(&self, expressions: I) -> Result<Vec<Job>, ModelError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        expressions
            .into_iter()
            .map(|e| self.job(e.as_ref()))
            .collect()
    }
}

impl Default for JobTemplate {
    fn default() -> Self {
        Self {
            region: RegionPreset::Usa,
            decay: 6,
            delay: 1,
            neutralization: Neutralization::Subindustry,
            tags: Vec::new(),
        }
    }
}
