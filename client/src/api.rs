//! Browser implementations of the transport seams in `chatdesk_core::http`.

use async_trait::async_trait;
use chatdesk_core::http::{
    cookie_value, CsrfSource, HttpRequest, HttpResponse, Method, Transport, CSRF_COOKIE,
};
use chatdesk_core::ApiError;
use futures::future::{self, Either};
use gloo_net::http::Request;
use gloo_timers::future::TimeoutFuture;
use wasm_bindgen::JsCast;
use web_sys::HtmlDocument;

/// Sends requests through `fetch`, optionally abandoning them after a timeout.
pub struct FetchTransport {
    timeout_ms: Option<u32>,
}

impl FetchTransport {
    pub fn new(timeout_ms: Option<u32>) -> Self {
        Self { timeout_ms }
    }
}

#[async_trait(?Send)]
impl Transport for FetchTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let builder = match request.method {
            Method::Get => Request::get(&request.url),
            Method::Post => Request::post(&request.url),
        };
        let builder = request
            .headers
            .iter()
            .fold(builder, |builder, (name, value)| builder.header(name, value));
        let prepared = match request.body {
            Some(body) => builder.body(body),
            None => builder.build(),
        }
        .map_err(|e| ApiError::Network(format!("Failed to create request: {}", e)))?;

        let exchange = async move {
            let response = prepared
                .send()
                .await
                .map_err(|e| ApiError::Network(e.to_string()))?;
            let status = response.status();
            let body = response
                .text()
                .await
                .map_err(|e| ApiError::Decode(e.to_string()))?;
            Ok::<_, ApiError>(HttpResponse { status, body })
        };

        let Some(timeout_ms) = self.timeout_ms else {
            return exchange.await;
        };
        match future::select(Box::pin(exchange), Box::pin(TimeoutFuture::new(timeout_ms))).await {
            Either::Left((result, _)) => result,
            Either::Right(_) => {
                tracing::warn!(url = %request.url, timeout_ms, "request timed out");
                Err(ApiError::Network(format!(
                    "Request timed out after {}ms",
                    timeout_ms
                )))
            }
        }
    }
}

/// Reads the CSRF token from `document.cookie`.
pub struct CookieCsrf;

impl CsrfSource for CookieCsrf {
    fn csrf_token(&self) -> Option<String> {
        let document = gloo_utils::document().dyn_into::<HtmlDocument>().ok()?;
        let cookies = document.cookie().ok()?;
        cookie_value(&cookies, CSRF_COOKIE)
    }
}
