//! Domain types shared by the alphaq scheduler, the HTTP platform and the agent binary.

mod domain;
pub use domain::*;

mod error;
pub use error::ModelError;
