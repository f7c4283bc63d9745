mod job_id;
pub use job_id::JobId;

mod job;
pub use job::Job;

mod neutralization;
pub use neutralization::Neutralization;

mod region;
pub use region::RegionPreset;

mod template;
pub use template::JobTemplate;

mod outcome;
pub use outcome::{JobOutcome, RunReport};

mod settings;
pub use settings::{DEFAULT_TRUNCATION, SimulationRequest, SimulationSettings};

/// Zero-based index of a worker slot in the session pool.
///
/// Chunk `i` of the partitioned job list is always served by slot `i`.
pub type SlotIndex = usize;

/// Labels attached to a simulated alpha on the remote platform.
pub type Tags = Vec<String>;
