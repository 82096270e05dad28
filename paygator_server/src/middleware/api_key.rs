//! API key middleware for Actix Web.
//!
//! The vendor payout endpoint and the admin API are only available to callers that present the server's API key,
//! either as a bearer token (`Authorization: Bearer <key>`) or in the `X-Api-Key` header.
//!
//! The key itself is read from the [`ApiKey`] entry in the application data when the request arrives. If no key
//! has been configured, every request through this middleware is rejected.

use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    web,
    Error,
};
use futures::future::LocalBoxFuture;
use log::{trace, warn};
use paygator_common::Secret;

use crate::errors::ServerError;

pub const API_KEY_HEADER: &str = "X-Api-Key";

#[derive(Clone, Debug, Default)]
pub struct ApiKey(Secret<String>);

impl ApiKey {
    pub fn new(key: Secret<String>) -> Self {
        Self(key)
    }

    /// Checks a key presented by a caller. An unconfigured key matches nothing.
    pub fn matches(&self, candidate: &str) -> bool {
        let key = self.0.reveal();
        !key.is_empty() && key.as_bytes() == candidate.trim().as_bytes()
    }
}

fn presented_key(req: &ServiceRequest) -> Option<String> {
    let headers = req.headers();
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|s| s.to_string());
    bearer.or_else(|| headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok()).map(|s| s.to_string()))
}

#[derive(Default)]
pub struct ApiKeyMiddlewareFactory;

impl ApiKeyMiddlewareFactory {
    pub fn new() -> Self {
        ApiKeyMiddlewareFactory
    }
}

impl<S, B> Transform<S, ServiceRequest> for ApiKeyMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = ApiKeyMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ApiKeyMiddlewareService { service: Rc::new(service) }))
    }
}

pub struct ApiKeyMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for ApiKeyMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        Box::pin(async move {
            trace!("🔐️ Checking API key for {}", req.path());
            let Some(api_key) = req.app_data::<web::Data<ApiKey>>().cloned() else {
                warn!("🔐️ No API key is configured for this server. Denying access to {}", req.path());
                return Err(ServerError::Unauthorized("No API key is configured.".into()).into());
            };
            match presented_key(&req) {
                Some(key) if api_key.matches(&key) => {
                    trace!("🔐️ API key check for request ✅️");
                    service.call(req).await
                },
                Some(_) => {
                    warn!("🔐️ Invalid API key presented for {}. Denying access.", req.path());
                    Err(ServerError::Unauthorized("The API key is invalid.".into()).into())
                },
                None => {
                    warn!("🔐️ No API key presented for {}. Denying access.", req.path());
                    Err(ServerError::Unauthorized("No API key was provided.".into()).into())
                },
            }
        })
    }
}
