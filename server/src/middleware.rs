//! Authentication filter in front of the `/jobs` scope.

use std::future::{ready, Ready};
use std::rc::Rc;
use std::sync::Arc;

use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header;
use actix_web::{Error, HttpMessage, HttpResponse};
use futures_util::future::LocalBoxFuture;
use serde_json::json;
use tracing::{debug, warn};

use crate::auth::{self, AuthenticatedUser, Credentials};

/// Middleware factory: validates each request's basic-auth credentials
/// against the stored account and attaches [`AuthenticatedUser`] to the
/// request extensions. Requests that fail never reach a handler.
pub struct AuthMiddleware {
    credentials: Arc<Credentials>,
}

impl AuthMiddleware {
    pub fn new(credentials: Arc<Credentials>) -> Self {
        Self { credentials }
    }
}

impl<S> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse, Error = Error> + 'static,
    S::Future: 'static,
{
    type Response = ServiceResponse;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
            credentials: self.credentials.clone(),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
    credentials: Arc<Credentials>,
}

impl<S> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse, Error = Error> + 'static,
    S::Future: 'static,
{
    type Response = ServiceResponse;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let credentials = self.credentials.clone();

        Box::pin(async move {
            let parsed = req
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|value| value.to_str().ok())
                .and_then(auth::parse_basic_auth);

            if let Some((username, password)) = parsed {
                if auth::validate(&credentials, &username, &password).await {
                    debug!(user = %username, "request authenticated");
                    req.extensions_mut().insert(AuthenticatedUser { username });
                    return service.call(req).await;
                }
                warn!(user = %username, "invalid credentials");
            } else {
                warn!("missing or malformed authorization header");
            }

            let (req, _) = req.into_parts();
            let response =
                HttpResponse::Unauthorized().json(json!({ "error": "invalid credentials" }));
            Ok(ServiceResponse::new(req, response))
        })
    }
}
