use actix_web::{
    body::BoxBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    http::Method,
    web, Error, HttpMessage, ResponseError,
};
use futures_util::future::{ok, LocalBoxFuture, Ready};
use std::{rc::Rc, task::{Context, Poll}};

use crate::{errors::AuthError, use_cases::extractors::BearerToken, AppState};

/// Guards the admin API. The role is checked against the store on every
/// request, so a session that lost it is refused before any handler runs.
pub struct AdminGate;

impl<S> Transform<S, ServiceRequest> for AdminGate
where
    S: Service<ServiceRequest, Response = ServiceResponse<BoxBody>, Error = Error> + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type InitError = ();
    type Transform = AdminGateService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AdminGateService {
            service: Rc::new(service),
        })
    }
}

pub struct AdminGateService<S> {
    service: Rc<S>,
}

impl<S> Service<ServiceRequest> for AdminGateService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<BoxBody>, Error = Error> + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, ctx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            if req.method() == Method::OPTIONS {
                return service.call(req).await;
            }

            let Some(state) = req.app_data::<web::Data<AppState>>().cloned() else {
                tracing::error!("AppState missing in admin gate");
                return Ok(reject(req, AuthError::Backend("application state missing".into())));
            };

            let Some(BearerToken(token)) = BearerToken::from_http(req.request()) else {
                tracing::warn!(path = %req.path(), "Admin request without bearer token");
                return Ok(reject(req, AuthError::MissingCredentials));
            };

            let claims = match state.auth_handler.verify_admin(&token).await {
                Ok(claims) => claims,
                Err(e) => {
                    tracing::warn!(path = %req.path(), error = %e, "Admin gate refused request");
                    return Ok(reject(req, e));
                }
            };

            req.extensions_mut().insert(claims);
            service.call(req).await
        })
    }
}

fn reject(req: ServiceRequest, error: AuthError) -> ServiceResponse<BoxBody> {
    req.into_response(error.error_response())
}
