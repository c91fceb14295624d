//! The four job endpoints plus the liveness probe.

use std::sync::Arc;

use actix_web::{get, post, put, web, HttpResponse};
use tracing::info;

use jobrunner::types::Job;
use jobrunner::{JobStatus, JobWorker};

use crate::auth::ownership::OwnershipRegistry;
use crate::auth::AuthenticatedUser;
use crate::error::ApiError;
use crate::wire::{HealthResponse, KillResponse, OutputResponse, StatusResponse, SubmitResponse};

/// Shared gateway state: the supervisor behind its polymorphic contract,
/// and the ownership registry that gates access to existing jobs.
pub struct AppState {
    pub worker: Arc<dyn JobWorker>,
    pub owners: OwnershipRegistry,
}

impl AppState {
    pub fn new(worker: Arc<dyn JobWorker>) -> Self {
        Self {
            worker,
            owners: OwnershipRegistry::new(),
        }
    }
}

/// Owner gate for id-bearing routes. A caller who does not own the id gets
/// the same answer as for an id that does not exist.
fn authorize(state: &AppState, user: &AuthenticatedUser, id: &str) -> Result<(), ApiError> {
    if state.owners.is_owner(&user.username, id) {
        Ok(())
    } else {
        Err(ApiError::NotFound)
    }
}

#[post("/run")]
pub async fn submit_job(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    body: web::Json<Job>,
) -> Result<HttpResponse, ApiError> {
    let job = body.into_inner();
    if job.command.is_empty() {
        return Err(ApiError::InvalidRequest(
            "request does not contain a valid job".to_string(),
        ));
    }

    let id = state.worker.submit(job).await;
    // Reached only while the client is still connected: actix drops the
    // handler future of an abandoned request, so a vanished submitter never
    // claims the id and the job runs on as a server-side orphan.
    state.owners.set_owner(&user.username, id.clone());
    info!(user = %user.username, job_id = %id, "job accepted");
    Ok(HttpResponse::Ok().json(SubmitResponse { id }))
}

#[get("/{id:[A-Za-z0-9]+}/status")]
pub async fn job_status(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    authorize(&state, &user, &id)?;
    let status = state.worker.status(&id).await?;
    Ok(HttpResponse::Ok().json(StatusResponse {
        id,
        status: status.to_string(),
    }))
}

#[get("/{id:[A-Za-z0-9]+}/out")]
pub async fn job_output(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    authorize(&state, &user, &id)?;
    let output = state.worker.output(&id).await?;
    Ok(HttpResponse::Ok().json(OutputResponse {
        id,
        output: String::from_utf8_lossy(&output).into_owned(),
    }))
}

#[put("/{id:[A-Za-z0-9]+}/kill")]
pub async fn kill_job(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    authorize(&state, &user, &id)?;
    let status = state.worker.kill(&id).await?;
    info!(user = %user.username, job_id = %id, status = %status, "kill requested");
    // A kill can lose the race against natural exit; the body then carries
    // the status the job actually ended with.
    let body = match status {
        JobStatus::Killed => KillResponse::killed(id),
        status => KillResponse {
            id,
            status: status.to_string(),
        },
    };
    Ok(HttpResponse::Ok().json(body))
}

/// Unauthenticated liveness probe.
#[get("/health")]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse::ok())
}
