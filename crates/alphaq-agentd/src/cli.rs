use std::{path::PathBuf, time::Duration};

use alphaq_brain::{BrainConfig, Credentials, DEFAULT_BASE_URL};
use alphaq_core::{
    ConfigError, DispatchConfig, SessionMode,
    dispatch::{DEFAULT_SESSION_TTL, DEFAULT_SUBMIT_TIMEOUT, DEFAULT_WIDTH},
};
use alphaq_model::{JobTemplate, Neutralization, RegionPreset};
use alphaq_observe::{LoggerConfig, LoggerError};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "alphaq")]
#[command(version)]
#[command(about = "Submit alpha expressions for simulation over a fixed pool of platform sessions")]
pub struct Args {
    /// File with one expression per line; blank lines and `#` comments are skipped
    #[arg(long, env = "ALPHAQ_JOBS")]
    pub jobs: PathBuf,

    /// Completion ledger (default: records/<run-tag>_simulated_alpha_expression.txt)
    #[arg(long)]
    pub ledger: Option<PathBuf>,

    /// Tag attached to every simulated alpha
    #[arg(long, default_value = "alphaq_1step")]
    pub run_tag: String,

    /// Region preset: usa, asi, eur, glb, hkg, twn, jpn, kor, chn, amr
    #[arg(long, default_value = "usa")]
    pub region: RegionPreset,

    #[arg(long, default_value_t = 6)]
    pub decay: u32,

    #[arg(long, default_value_t = 1)]
    pub delay: u32,

    #[arg(long, default_value = "subindustry")]
    pub neutralization: Neutralization,

    /// Number of sessions, chunks and simultaneous submissions
    #[arg(long, short = 'n', default_value_t = DEFAULT_WIDTH)]
    pub concurrency: usize,

    #[arg(long, default_value_t = DEFAULT_SESSION_TTL.as_secs())]
    pub session_ttl_secs: u64,

    #[arg(long, default_value_t = DEFAULT_SUBMIT_TIMEOUT.as_secs())]
    pub submit_timeout_secs: u64,

    /// Never let two submissions use the same session at once
    #[arg(long)]
    pub exclusive_sessions: bool,

    /// Seed for the job shuffle (random when omitted)
    #[arg(long)]
    pub seed: Option<u64>,

    #[arg(long, env = "ALPHAQ_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    #[arg(long, env = "ALPHAQ_USERNAME")]
    pub username: String,

    #[arg(long, env = "ALPHAQ_PASSWORD", hide_env_values = true)]
    pub password: String,

    #[arg(long, env = "ALPHAQ_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// text, json or journald
    #[arg(long, default_value = "text")]
    pub log_format: String,
}

impl Args {
    pub fn ledger_path(&self) -> PathBuf {
        self.ledger.clone().unwrap_or_else(|| {
            PathBuf::from("records").join(format!("{}_simulated_alpha_expression.txt", self.run_tag))
        })
    }

    pub fn template(&self) -> JobTemplate {
        JobTemplate {
            region: self.region,
            decay: self.decay,
            delay: self.delay,
            neutralization: self.neutralization,
            ..JobTemplate::tagged(&self.run_tag)
        }
    }

    pub fn dispatch_config(&self) -> Result<DispatchConfig, ConfigError> {
        let config = DispatchConfig {
            session_ttl: Duration::from_secs(self.session_ttl_secs),
            submit_timeout: Duration::from_secs(self.submit_timeout_secs),
            session_mode: if self.exclusive_sessions {
                SessionMode::Exclusive
            } else {
                SessionMode::Shared
            },
            shuffle_seed: self.seed,
            ..DispatchConfig::with_width(self.concurrency)?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn brain_config(&self) -> BrainConfig {
        BrainConfig::new(
            &self.base_url,
            Credentials::new(&self.username, &self.password),
        )
    }

    pub fn logger_config(&self) -> Result<LoggerConfig, LoggerError> {
        LoggerConfig::from_parts(&self.log_format, &self.log_level)
    }
}
