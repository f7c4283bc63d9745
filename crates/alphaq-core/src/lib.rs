pub mod error;
pub use error::{AuthError, ConfigError, CoreError, LedgerError, SubmissionError};

pub mod platform;
pub use platform::Platform;

pub mod ledger;
pub use ledger::{CompletionLedger, LedgerAppender};

pub mod partition;
pub use partition::{chunk_size, partition, shuffle};

pub mod limiter;
pub use limiter::{ConcurrencyLimiter, LimiterPermit};

pub mod lease;
pub use lease::{LeasedHandle, SessionLease};

pub mod pool;
pub use pool::WorkerPool;

pub mod dispatch;
pub use dispatch::{DispatchConfig, Dispatcher, RunPhase, SessionMode};
