//! Request guards that enforce identity checks at the type level.
//! Handlers that take a `User` argument cannot accidentally skip them.

use std::future::Future;
use std::pin::Pin;
use uuid::Uuid;

use actix_web::{Error, FromRequest, HttpRequest};

use crate::error::AppError;

/// Header set by the upstream API gateway after it has authenticated the
/// caller. This service trusts it; token validation happens at the edge.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated caller, extracted from the gateway identity header.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
}

impl FromRequest for User {
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        let user_id = req
            .headers()
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| Uuid::parse_str(s).ok());

        Box::pin(async move {
            let user_id = user_id.ok_or(AppError::Unauthorized)?;
            Ok(User { id: user_id })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[actix_web::test]
    async fn test_user_extracted_from_header() {
        let id = Uuid::new_v4();
        let req = TestRequest::default()
            .insert_header((USER_ID_HEADER, id.to_string()))
            .to_http_request();

        let user = User::from_request(&req, &mut actix_web::dev::Payload::None)
            .await
            .unwrap();
        assert_eq!(user.id, id);
    }

    #[actix_web::test]
    async fn test_missing_header_is_unauthorized() {
        let req = TestRequest::default().to_http_request();
        let result = User::from_request(&req, &mut actix_web::dev::Payload::None).await;
        assert!(result.is_err());
    }

    #[actix_web::test]
    async fn test_malformed_header_is_unauthorized() {
        let req = TestRequest::default()
            .insert_header((USER_ID_HEADER, "not-a-uuid"))
            .to_http_request();

        let result = User::from_request(&req, &mut actix_web::dev::Payload::None).await;
        assert!(result.is_err());
    }
}
