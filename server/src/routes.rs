use std::sync::Arc;

use actix_web::dev::HttpServiceFactory;
use actix_web::web;

use crate::auth::Credentials;
use crate::handlers;
use crate::middleware::AuthMiddleware;

/// The authenticated `/jobs` scope. Route ids are restricted to the
/// alphanumeric alphabet the id generator emits.
pub fn jobs(credentials: Arc<Credentials>) -> impl HttpServiceFactory {
    web::scope("/jobs")
        .wrap(AuthMiddleware::new(credentials))
        .service(handlers::submit_job)
        .service(handlers::job_status)
        .service(handlers::job_output)
        .service(handlers::kill_job)
}
