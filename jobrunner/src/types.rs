use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque job identifier: ASCII alphanumeric, unique for the supervisor's lifetime.
pub type JobId = String;

/// A command plus its argument list, as submitted by a client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl Job {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
        }
    }
}

pub(crate) fn generate_job_id() -> JobId {
    Uuid::new_v4().simple().to_string()
}
