use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage,
};
use std::future::{Future, Ready, ready};
use std::pin::Pin;

pub const TOKEN_HEADER: &str = "X-Snowflake-Token";

/// Caller-supplied warehouse token, lifted from the request headers.
#[derive(Debug, Clone)]
pub struct ForwardedToken(pub String);

/// Copies `X-Snowflake-Token` into the request extensions.
///
/// Requests without the header pass through untouched; whether a missing
/// token is fatal is decided per operation.
pub struct TokenForwarding;

impl<S, B> Transform<S, ServiceRequest> for TokenForwarding
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = TokenForwardingService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(TokenForwardingService { service }))
    }
}

pub struct TokenForwardingService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for TokenForwardingService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let token = req
            .headers()
            .get(TOKEN_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        if let Some(token) = token {
            req.extensions_mut().insert(ForwardedToken(token));
        }

        Box::pin(self.service.call(req))
    }
}
