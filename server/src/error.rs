use actix_web::error::JsonPayloadError;
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, ResponseError};
use jobrunner::error::JobError;
use serde_json::json;
use thiserror::Error;

/// Gateway error kinds and their HTTP mapping.
///
/// Authorization failures are deliberately absent: an id the caller does
/// not own is answered with `NotFound`, byte-identical to a truly unknown
/// id, so other users' jobs cannot be enumerated.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("invalid credentials")]
    Unauthorized,

    #[error("job not found")]
    NotFound,

    #[error("job is not active")]
    NotActive,

    #[error("{0}")]
    InvalidRequest(String),

    #[error("internal server error")]
    Internal,
}

impl From<JobError> for ApiError {
    fn from(err: JobError) -> Self {
        match err {
            JobError::NotFound => ApiError::NotFound,
            JobError::NotActive => ApiError::NotActive,
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::NotActive => StatusCode::CONFLICT,
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}

/// Route body-deserialization failures into the uniform 400 shape.
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::InvalidRequest(format!("request does not contain a valid job: {err}")).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_map_to_expected_status_codes() {
        assert_eq!(ApiError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::NotActive.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            ApiError::InvalidRequest("bad".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Internal.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn supervisor_errors_convert() {
        assert_eq!(ApiError::from(JobError::NotFound), ApiError::NotFound);
        assert_eq!(ApiError::from(JobError::NotActive), ApiError::NotActive);
    }
}
