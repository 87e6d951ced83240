use std::fmt;

use actix_web::{HttpResponse, http::StatusCode};
use profiles_lib::error::ProfilesError;
use tracing_actix_web::RequestId;

#[derive(thiserror::Error, Debug)]
#[repr(i32)] // i32 to be used with clients that don't support unsigned integers
#[rustfmt::skip]
pub enum ApiErrorKind {
    // Caution: when creating a new error, you must ensure its code isn't
    // in conflict with another one in `profiles_lib::error::ProfilesError`.

    // Internal server errors (1xx) only come from profiles_lib

    // --------
    // --- Authentication errors
    // --------

    #[error("unauthorized")]
    Unauthorized = 201,

    // --------
    // --- Logical errors
    // --------

    #[error("not found")]
    EndpointNotFound = 301,

    // ...Errors from profiles_lib

    #[error(transparent)]
    Lib(#[from] ProfilesError),
}

impl ApiErrorKind {
    pub fn get_err_type_and_status_code(&self) -> (i32, StatusCode) {
        use ApiErrorKind as E;
        use ProfilesError as LE;
        use StatusCode as S;

        match self {
            E::Lib(LE::DbError(_)) => (102, S::INTERNAL_SERVER_ERROR),
            E::Lib(LE::ExternalRequest(_)) => (104, S::INTERNAL_SERVER_ERROR),
            E::Lib(LE::Internal(_)) => (109, S::INTERNAL_SERVER_ERROR),

            E::Unauthorized => (201, S::UNAUTHORIZED),

            E::EndpointNotFound => (301, S::NOT_FOUND),
            E::Lib(LE::UserNotFound(_)) => (302, S::NOT_FOUND),
            E::Lib(LE::HashAlreadyLinked) => (303, S::CONFLICT),
        }
    }
}

#[derive(Debug)]
pub struct TracedError {
    pub status_code: StatusCode,
    pub r#type: i32,
    pub request_id: RequestId,
    pub message: String,
}

impl fmt::Display for TracedError {
    #[inline(always)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for TracedError {}

impl TracedError {
    /// Attaches the request ID to the provided error.
    ///
    /// The message of the server errors is masked, so the internals never leak to the client.
    /// The original error is logged instead.
    pub fn new(error: ApiErrorKind, request_id: RequestId) -> Self {
        let (r#type, status_code) = error.get_err_type_and_status_code();

        let message = if status_code.is_server_error() {
            tracing::error!("[{request_id}] {error}");
            "internal error".to_owned()
        } else {
            error.to_string()
        };

        Self {
            status_code,
            r#type,
            request_id,
            message,
        }
    }

    fn to_err_res(&self) -> ErrorResponse {
        ErrorResponse {
            request_id: self.request_id.to_string(),
            r#type: self.r#type,
            message: self.message.clone(),
        }
    }
}

#[derive(serde::Serialize)]
pub struct ErrorResponse {
    pub request_id: String,
    pub r#type: i32,
    pub message: String,
}

impl actix_web::ResponseError for TracedError {
    fn status_code(&self) -> StatusCode {
        self.status_code
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code).json(self.to_err_res())
    }
}

pub type ApiResult<T> = Result<T, ApiErrorKind>;

/// The type returned by the route handlers.
pub type ApiResponse<T> = Result<T, TracedError>;

/// Attaches the ID of the current request to an error, to make it a response.
pub trait FitRequestId<T> {
    fn fit(self, request_id: RequestId) -> ApiResponse<T>;
}

impl<T, E> FitRequestId<T> for Result<T, E>
where
    ApiErrorKind: From<E>,
{
    fn fit(self, request_id: RequestId) -> ApiResponse<T> {
        self.map_err(|e| TracedError::new(e.into(), request_id))
    }
}
