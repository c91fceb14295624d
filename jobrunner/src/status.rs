use std::fmt;

/// Lifecycle state of a job.
///
/// `Active` is the initial state; the other three are terminal. A job makes
/// exactly one transition out of `Active` and never leaves a terminal state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JobStatus {
    Active,
    Complete,
    Killed,
    Error(String),
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Active)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Active => f.write_str("active"),
            JobStatus::Complete => f.write_str("complete"),
            JobStatus::Killed => f.write_str("killed"),
            JobStatus::Error(description) if description.is_empty() => f.write_str("error"),
            JobStatus::Error(description) => write!(f, "error: {description}"),
        }
    }
}
