use std::{fmt, num::NonZeroUsize, str::FromStr, time::Duration};

use crate::error::ConfigError;

/// Nominal lifetime of a platform session.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(3 * 60 * 60);
/// Upper bound on one submission, polling included.
pub const DEFAULT_SUBMIT_TIMEOUT: Duration = Duration::from_secs(30 * 60);
pub const DEFAULT_WIDTH: usize = 3;

/// How submissions of one chunk share their slot's session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionMode {
    /// Only the run-wide limiter bounds concurrency; tasks of a chunk may overlap on one session.
    #[default]
    Shared,
    /// At most one submission uses a session at any instant.
    Exclusive,
}

impl FromStr for SessionMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "shared" => Ok(SessionMode::Shared),
            "exclusive" => Ok(SessionMode::Exclusive),
            other => Err(ConfigError::Invalid {
                field: "session_mode",
                reason: format!("unknown mode {other:?} (expected: shared|exclusive)"),
            }),
        }
    }
}

impl fmt::Display for SessionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionMode::Shared => f.write_str("shared"),
            SessionMode::Exclusive => f.write_str("exclusive"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Pool size, chunk count and limiter capacity.
    pub width: NonZeroUsize,
    pub session_ttl: Duration,
    pub submit_timeout: Duration,
    pub session_mode: SessionMode,
    /// Fixed seed for the pre-partition shuffle; `None` draws from the thread RNG.
    pub shuffle_seed: Option<u64>,
}

impl DispatchConfig {
    /// Default config with a caller-supplied width.
    pub fn with_width(width: usize) -> Result<Self, ConfigError> {
        let width = NonZeroUsize::new(width).ok_or(ConfigError::ZeroWidth)?;
        Ok(Self {
            width,
            ..Default::default()
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session_ttl.is_zero() {
            return Err(ConfigError::Invalid {
                field: "session_ttl",
                reason: "must be greater than zero".into(),
            });
        }
        if self.submit_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                field: "submit_timeout",
                reason: "must be greater than zero".into(),
            });
        }
        Ok(())
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            width: NonZeroUsize::new(DEFAULT_WIDTH).unwrap_or(NonZeroUsize::MIN),
            session_ttl: DEFAULT_SESSION_TTL,
            submit_timeout: DEFAULT_SUBMIT_TIMEOUT,
            session_mode: SessionMode::Shared,
            shuffle_seed: None,
        }
    }
}
