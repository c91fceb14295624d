mod log;
mod supervisor;

pub mod error;
pub mod status;
pub mod types;

pub use status::JobStatus;
pub use supervisor::{JobWorker, Supervisor};
