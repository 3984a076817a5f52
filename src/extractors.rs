use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use std::convert::Infallible;

/// Whether htmx sent the request. htmx requests get a fragment back; a
/// plain browser navigation gets the whole page.
pub struct HxRequest(pub bool);

#[async_trait]
impl<S> FromRequestParts<S> for HxRequest
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        req: &mut Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        Ok(HxRequest(req.headers.contains_key("Hx-Request")))
    }
}
