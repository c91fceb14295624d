//! JSON bodies the gateway returns.

use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub id: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub id: String,
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct OutputResponse {
    pub id: String,
    pub output: String,
}

#[derive(Debug, Serialize)]
pub struct KillResponse {
    pub id: String,
    pub status: String,
}

impl KillResponse {
    pub fn killed(id: String) -> Self {
        Self {
            id,
            status: "job successfully killed".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self { status: "ok" }
    }
}
