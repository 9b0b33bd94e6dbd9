use actix_web::{Error, FromRequest, HttpMessage};
use application::auth::dtos::Claims;
use application::auth::subject_id;
use application::AppError;
use futures::future::{ready, Ready};
use uuid::Uuid;

use crate::handlers::error_handler::HttpAppError;

/// Verified identity of the requester, resolved by the auth middleware.
pub struct AuthUser {
    pub user_id: Uuid,
}

impl FromRequest for AuthUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(
        req: &actix_web::HttpRequest,
        _payload: &mut actix_web::dev::Payload,
    ) -> Self::Future {
        let resolved = req
            .extensions()
            .get::<Claims>()
            .ok_or_else(|| {
                AppError::Authentication("Missing or invalid credentials".to_string())
            })
            .and_then(|claims| subject_id(claims));

        match resolved {
            Ok(user_id) => ready(Ok(AuthUser { user_id })),
            Err(err) => ready(Err(HttpAppError::from(err).into())),
        }
    }
}
