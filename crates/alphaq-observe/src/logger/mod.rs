mod config;
mod error;
mod format;
mod layers;

pub use config::LoggerConfig;
pub use error::LoggerError;
pub use format::LoggerFormat;

/// Install the process-wide `tracing` subscriber for the `alphaq` binary.
///
/// Only the first call in a process can succeed.
pub fn logger_init(cfg: &LoggerConfig) -> Result<(), LoggerError> {
    layers::install(cfg)
}
