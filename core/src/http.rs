//! Shared request pipeline for every backend call.
//!
//! Outgoing requests get the stored token as `Authorization: Token <token>`
//! and, when the `csrftoken` cookie is present, an `X-CSRFToken` header.
//! A 401 response evicts the stored token before the error is handed back;
//! redirecting is left to the route guard. Nothing is retried.

use std::fmt;
use std::rc::Rc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ApiError;
use crate::session::SessionStore;

pub const AUTHORIZATION_HEADER: &str = "Authorization";
pub const CSRF_HEADER: &str = "X-CSRFToken";
pub const CSRF_COOKIE: &str = "csrftoken";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => f.write_str("GET"),
            Method::Post => f.write_str("POST"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_str(&self.body).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

/// Moves a prepared request over the wire.
#[async_trait(?Send)]
pub trait Transport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError>;
}

pub trait CsrfSource {
    fn csrf_token(&self) -> Option<String>;
}

/// For environments without cookies.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCsrf;

impl CsrfSource for NoCsrf {
    fn csrf_token(&self) -> Option<String> {
        None
    }
}

/// Looks up `name` in a `document.cookie` style string.
pub fn cookie_value(cookies: &str, name: &str) -> Option<String> {
    cookies
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

#[derive(Clone)]
pub struct HttpClient {
    base_url: String,
    session: SessionStore,
    transport: Rc<dyn Transport>,
    csrf: Rc<dyn CsrfSource>,
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl HttpClient {
    pub fn new(
        base_url: impl Into<String>,
        session: SessionStore,
        transport: Rc<dyn Transport>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            session,
            transport,
            csrf: Rc::new(NoCsrf),
        }
    }

    pub fn with_csrf(mut self, csrf: Rc<dyn CsrfSource>) -> Self {
        self.csrf = csrf;
        self
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn prepare(&self, method: Method, path: &str, body: Option<String>) -> HttpRequest {
        let mut headers = Vec::new();
        if let Some(token) = self.session.token().filter(|t| !t.is_empty()) {
            headers.push((AUTHORIZATION_HEADER.to_string(), format!("Token {token}")));
        }
        if let Some(csrf) = self.csrf.csrf_token() {
            headers.push((CSRF_HEADER.to_string(), csrf));
        }
        if body.is_some() {
            headers.push(("Content-Type".to_string(), "application/json".to_string()));
        }
        HttpRequest {
            method,
            url: self.url(path),
            headers,
            body,
        }
    }

    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<String>,
    ) -> Result<HttpResponse, ApiError> {
        let request = self.prepare(method, path, body);
        tracing::debug!(%method, url = %request.url, "sending request");

        let response = self.transport.send(request).await.map_err(|e| {
            tracing::warn!(%method, path, error = %e, "request failed");
            e
        })?;

        if response.is_success() {
            return Ok(response);
        }

        if response.status == 401 {
            if let Err(e) = self.session.evict_token() {
                tracing::warn!(error = %e, "failed to evict token after 401");
            }
        }
        tracing::debug!(%method, path, status = response.status, "request rejected");
        Err(ApiError::from_status(response.status, &response.body))
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(Method::Get, path, None).await?.json()
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_string(body).map_err(|e| ApiError::Decode(e.to_string()))?;
        self.send(Method::Post, path, Some(body)).await?.json()
    }

    /// Like [`HttpClient::post_json`], but an empty success body yields
    /// `T::default()`.
    pub async fn post_json_or_default<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned + Default,
    {
        let body = serde_json::to_string(body).map_err(|e| ApiError::Decode(e.to_string()))?;
        let response = self.send(Method::Post, path, Some(body)).await?;
        if response.body.trim().is_empty() {
            return Ok(T::default());
        }
        response.json()
    }

    /// POST whose response body is irrelevant.
    pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<(), ApiError> {
        let body = serde_json::to_string(body).map_err(|e| ApiError::Decode(e.to_string()))?;
        self.send(Method::Post, path, Some(body)).await.map(|_| ())
    }
}
