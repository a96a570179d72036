use axum::extract::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use std::env;
use std::fmt::{self, Debug};

#[derive(Debug)]
pub struct Error {
    pub code: i32,
    pub message: String,
}

impl Error {
    pub fn is_invalid_invocation_error(&self) -> bool {
        self.code == 100
    }

    pub fn is_invalid_input_error(&self) -> bool {
        self.code == 101
    }

    pub fn is_not_found_error(&self) -> bool {
        self.code == 102
    }

    pub fn is_unauthorized_error(&self) -> bool {
        self.code == 103
    }

    pub fn is_server_error(&self) -> bool {
        (1..=99).contains(&self.code)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)
    }
}

impl std::error::Error for Error {}

impl From<env::VarError> for Error {
    fn from(err: env::VarError) -> Self {
        env_var_error(err)
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        database_error(err)
    }
}

impl From<oso::OsoError> for Error {
    fn from(err: oso::OsoError) -> Self {
        authorizor_error(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!("serialization failed: {}", err);
        unexpected_error()
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_message) = match self.code {
            1..=99 => (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error"),
            100 => (StatusCode::CONFLICT, self.message.as_str()),
            102 => (StatusCode::NOT_FOUND, self.message.as_str()),
            103 => (StatusCode::FORBIDDEN, self.message.as_str()),
            104 => (StatusCode::UNAUTHORIZED, self.message.as_str()),
            _ => (StatusCode::BAD_REQUEST, self.message.as_str()),
        };

        let body = Json(json!({
            "code": self.code,
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

pub fn invalid_invocation_error() -> Error {
    Error {
        code: 100,
        message: "invalid invocation".into(),
    }
}

pub fn invalid_input_error() -> Error {
    Error {
        code: 101,
        message: "invalid input".into(),
    }
}

pub fn not_found_error() -> Error {
    Error {
        code: 102,
        message: "not found".into(),
    }
}

pub fn unauthorized_error() -> Error {
    Error {
        code: 103,
        message: "unauthorized".into(),
    }
}

pub fn unauthenticated_error() -> Error {
    Error {
        code: 104,
        message: "unauthenticated".into(),
    }
}

pub fn config_error(key: &str) -> Error {
    tracing::error!("invalid value for {}", key);

    Error {
        code: 1,
        message: format!("invalid configuration: {}", key),
    }
}

pub fn env_var_error(_: env::VarError) -> Error {
    Error {
        code: 1,
        message: "environment variable error".into(),
    }
}

pub fn database_error<T: Debug>(err: T) -> Error {
    tracing::error!("database error: {:?}", err);

    Error {
        code: 2,
        message: "database error".into(),
    }
}

pub fn authorizor_error<T: Debug>(err: T) -> Error {
    tracing::error!("authorizor error: {:?}", err);

    Error {
        code: 3,
        message: "authorizor error".into(),
    }
}

pub fn notification_error() -> Error {
    Error {
        code: 4,
        message: "notification error".into(),
    }
}

pub fn unexpected_error() -> Error {
    Error {
        code: 5,
        message: "unexpected error".into(),
    }
}

#[test]
fn error_codes_map_to_http_statuses() {
    let response = database_error("connection refused").into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let response = not_found_error().into_response();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = unauthorized_error().into_response();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = invalid_input_error().into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
