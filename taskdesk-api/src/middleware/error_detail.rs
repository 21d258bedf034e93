/// Internal error detail middleware
///
/// A 500 produced by [`ApiError`](crate::error::ApiError) only ever says
/// "Internal Server Error" to the client; the underlying detail travels as
/// an [`InternalErrorDetail`] response extension. Outside production this
/// layer copies that detail into the JSON body as `stack`, so local
/// debugging does not require reading the logs.
///
/// # Example
///
/// ```no_run
/// use axum::Router;
/// use taskdesk_api::middleware::error_detail::ErrorDetailLayer;
///
/// let production = false;
/// let app: Router = Router::new().layer(ErrorDetailLayer::new(!production));
/// ```

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::{
    body::Body,
    extract::Request,
    http::header,
    response::Response,
};
use tower::{Layer, Service};

use crate::error::InternalErrorDetail;

/// Adds `stack` to 500 bodies when enabled
#[derive(Debug, Clone, Copy)]
pub struct ErrorDetailLayer {
    expose: bool,
}

impl ErrorDetailLayer {
    /// `expose` should be false in production
    pub fn new(expose: bool) -> Self {
        Self { expose }
    }
}

impl<S> Layer<S> for ErrorDetailLayer {
    type Service = ErrorDetailMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ErrorDetailMiddleware {
            inner,
            expose: self.expose,
        }
    }
}

/// Error detail middleware service
#[derive(Debug, Clone)]
pub struct ErrorDetailMiddleware<S> {
    inner: S,
    expose: bool,
}

impl<S> Service<Request> for ErrorDetailMiddleware<S>
where
    S: Service<Request, Response = Response> + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let future = self.inner.call(request);
        let expose = self.expose;

        Box::pin(async move {
            let response = future.await?;

            if !expose {
                return Ok(response);
            }

            match response.extensions().get::<InternalErrorDetail>().cloned() {
                Some(InternalErrorDetail(detail)) => Ok(with_stack(response, detail).await),
                None => Ok(response),
            }
        })
    }
}

async fn with_stack(response: Response, detail: String) -> Response {
    let (mut parts, body) = response.into_parts();

    let bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(_) => return Response::from_parts(parts, Body::empty()),
    };

    let mut json: serde_json::Value = match serde_json::from_slice(&bytes) {
        Ok(json) => json,
        Err(_) => return Response::from_parts(parts, Body::from(bytes)),
    };

    if let Some(object) = json.as_object_mut() {
        object.insert("stack".to_string(), serde_json::Value::String(detail));
    }

    match serde_json::to_vec(&json) {
        Ok(encoded) => {
            parts.headers.remove(header::CONTENT_LENGTH);
            Response::from_parts(parts, Body::from(encoded))
        }
        Err(_) => Response::from_parts(parts, Body::from(bytes)),
    }
}
