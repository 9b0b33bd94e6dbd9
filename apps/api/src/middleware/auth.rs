use actix_web::{
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    web, Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::task::{Context, Poll};

use application::auth::decode_token;
use application::AppError;

use crate::config::Config;
use crate::handlers::error_handler::HttpAppError;

pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService { service }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // Validate the bearer token when an Authorization header is present.
        // A missing header passes through; the AuthUser extractor rejects
        // handlers that require an identity. A present but invalid token is
        // a hard 401 before any handler logic runs.
        if let Some(auth_header_value) = req.headers().get(header::AUTHORIZATION) {
            if let Ok(auth_str) = auth_header_value.to_str() {
                if let Some(token) = auth_str
                    .strip_prefix("Bearer ")
                    .or_else(|| auth_str.strip_prefix("bearer "))
                {
                    if let Some(config) = req.app_data::<web::Data<Config>>() {
                        match decode_token(token, &config.jwt_secret) {
                            Ok(claims) => {
                                // Handlers read the claims via the AuthUser extractor.
                                req.extensions_mut().insert(claims);
                            }
                            Err(_) => {
                                return Box::pin(async move {
                                    Err(HttpAppError::from(AppError::Authentication(
                                        "Invalid or expired token".to_string(),
                                    ))
                                    .into())
                                });
                            }
                        }
                    }
                }
            }
        }

        let fut = self.service.call(req);
        Box::pin(async move {
            let res = fut.await?;
            Ok(res)
        })
    }
}
