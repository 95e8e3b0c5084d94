//! Request identity.
//!
//! Authentication happens upstream; the proxy forwards the caller's id in
//! `X-User-Id`. Handlers that tolerate anonymous callers take
//! `Option<AuthenticatedUser>`.

use std::future::{ready, Ready};

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest};
use mc_core::error::AppError;
use uuid::Uuid;

use crate::error::ApiError;

pub const USER_ID_HEADER: &str = "X-User-Id";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser(pub Uuid);

impl AuthenticatedUser {
    pub fn id(&self) -> Uuid {
        self.0
    }
}

fn user_from_request(req: &HttpRequest) -> Result<AuthenticatedUser, ApiError> {
    let raw = req
        .headers()
        .get(USER_ID_HEADER)
        .ok_or_else(|| AppError::Unauthorized(format!("missing {USER_ID_HEADER} header")))?;
    raw.to_str()
        .ok()
        .and_then(|value| Uuid::parse_str(value.trim()).ok())
        .map(AuthenticatedUser)
        .ok_or_else(|| AppError::Unauthorized(format!("malformed {USER_ID_HEADER} header")).into())
}

impl FromRequest for AuthenticatedUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(user_from_request(req))
    }
}

/// Plain id of an optional viewer.
pub fn viewer_id(user: &Option<AuthenticatedUser>) -> Option<Uuid> {
    user.map(|u| u.id())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_reads_header() {
        let id = Uuid::now_v7();
        let req = TestRequest::default()
            .insert_header((USER_ID_HEADER, id.to_string()))
            .to_http_request();
        assert_eq!(user_from_request(&req).unwrap(), AuthenticatedUser(id));
    }

    #[test]
    fn test_missing_or_malformed_header_is_unauthorized() {
        let req = TestRequest::default().to_http_request();
        assert!(matches!(user_from_request(&req), Err(ApiError(AppError::Unauthorized(_)))));

        let req = TestRequest::default()
            .insert_header((USER_ID_HEADER, "not-a-uuid"))
            .to_http_request();
        assert!(matches!(user_from_request(&req), Err(ApiError(AppError::Unauthorized(_)))));
    }
}
