use std::result;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JobError {
    #[error("no such job")]
    NotFound,
    #[error("job is not active")]
    NotActive,
}

pub type Result<T> = result::Result<T, JobError>;
