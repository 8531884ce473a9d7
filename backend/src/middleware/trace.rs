//! Tracing middleware attaching a request-scoped trace identifier.
//!
//! Each request runs inside [`TraceId::scope`] so error constructors and log
//! lines can pick the id up. The id is echoed in the `trace-id` response
//! header, and every completed request is logged with its method, URI
//! (query included) and status. Server errors log at `error` together with
//! the underlying cause; the rest log at `info`.

use std::task::{Context, Poll};

use actix_web::Error;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{HeaderName, HeaderValue};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use tracing::{error, info};

use crate::domain::{TRACE_ID_HEADER, TraceId};

/// Middleware giving each request a fresh [`TraceId`].
///
/// # Examples
/// ```
/// use actix_web::App;
/// use roastery::Trace;
///
/// let app = App::new().wrap(Trace);
/// ```
#[derive(Clone)]
pub struct Trace;

impl<S, B> Transform<S, ServiceRequest> for Trace
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = TraceMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(TraceMiddleware { service }))
    }
}

/// Service wrapper produced by [`Trace`].
pub struct TraceMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for TraceMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
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
        let trace_id = TraceId::generate();
        let line = RequestLine::new(&req);
        let pending = self.service.call(req);
        Box::pin(TraceId::scope(trace_id, async move {
            let mut res = pending.await?;
            stamp(&mut res, trace_id);
            line.log(trace_id, &res);
            Ok(res)
        }))
    }
}

/// Method and URI captured before the request is handed on.
#[derive(Debug, PartialEq, Eq)]
struct RequestLine {
    method: String,
    uri: String,
}

impl RequestLine {
    fn new(req: &ServiceRequest) -> Self {
        Self {
            method: req.method().to_string(),
            uri: req.uri().to_string(),
        }
    }

    fn log<B>(&self, trace_id: TraceId, res: &ServiceResponse<B>) {
        let (method, uri, status) = (&self.method, &self.uri, res.status().as_u16());
        if res.status().is_server_error() {
            let cause = res
                .response()
                .error()
                .map_or_else(|| "-".to_owned(), ToString::to_string);
            error!(%trace_id, %method, %uri, status, error = %cause, "request failed");
        } else {
            info!(%trace_id, %method, %uri, status, "request completed");
        }
    }
}

fn stamp<B>(res: &mut ServiceResponse<B>, trace_id: TraceId) {
    let Ok(value) = HeaderValue::from_str(&trace_id.to_string()) else {
        error!(%trace_id, "trace id is not a valid header value");
        return;
    };
    res.headers_mut()
        .insert(HeaderName::from_static(TRACE_ID_HEADER), value);
}
