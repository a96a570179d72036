use async_trait::async_trait;
use axum::extract::{FromRequest, RequestParts};
use axum::http::HeaderMap;

use crate::auth::User;
use crate::error::{unauthenticated_error, Error};

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLES_HEADER: &str = "x-user-roles";

/// The caller, as vouched for by the gateway in front of this service.
#[async_trait]
impl<B: Send> FromRequest<B> for User {
    type Rejection = Error;

    async fn from_request(req: &mut RequestParts<B>) -> Result<Self, Self::Rejection> {
        user_from_headers(req.headers())
    }
}

fn user_from_headers(headers: &HeaderMap) -> Result<User, Error> {
    let id = headers
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(unauthenticated_error)?;

    let roles = headers
        .get(USER_ROLES_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(|roles| roles.split(',').map(String::from).collect())
        .unwrap_or_default();

    Ok(User::new(id.into(), roles))
}

#[test]
fn identity_from_headers() {
    let mut headers = HeaderMap::new();

    let err = user_from_headers(&headers).unwrap_err();
    assert_eq!(err.code, 104);

    headers.insert(USER_ID_HEADER, " u1 ".parse().unwrap());
    let user = user_from_headers(&headers).unwrap();
    assert_eq!(user.id, "u1");
    assert!(user.roles.is_empty());

    headers.insert(USER_ROLES_HEADER, "Student, driver,,".parse().unwrap());
    let user = user_from_headers(&headers).unwrap();
    assert_eq!(user.roles, vec!["student".to_string(), "driver".to_string()]);
}
