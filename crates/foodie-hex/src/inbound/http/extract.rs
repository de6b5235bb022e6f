use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::{header::CONTENT_TYPE, Method};
use axum::Form;
use serde::de::DeserializeOwned;

use crate::errors::AppError;

/// Request parameters read from a url-encoded form body when one is sent,
/// otherwise from the query string. Rejections answer with the envelope.
pub struct Params<T>(pub T);

fn has_form_body(req: &Request) -> bool {
    req.method() != Method::GET
        && req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"))
}

impl<T, S> FromRequest<S> for Params<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if has_form_body(&req) {
            let Form(value) = <Form<T> as FromRequest<S>>::from_request(req, state).await?;
            return Ok(Self(value));
        }
        let (mut parts, _body) = req.into_parts();
        let Query(value) = Query::<T>::from_request_parts(&mut parts, state).await?;
        Ok(Self(value))
    }
}
