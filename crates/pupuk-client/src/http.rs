//! # HTTP Client
//!
//! Thin wrapper over `reqwest` shared by every resource module.
//!
//! ## Request Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         One REST Call                                   │
//! │                                                                         │
//! │  resource fn ──► ApiClient::get/post/... ──► reqwest (cookie jar)       │
//! │                      │                            │                     │
//! │                      │ x-request-id: <uuid v4>    │ session cookie      │
//! │                      ▼                            ▼                     │
//! │                  2xx: body ──► unwrap { "data": ... } ──► T             │
//! │                  4xx/5xx: { "message": ... } ──► ClientError::Api       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The session lives in an HTTP-only cookie set by `POST /auth/login`; the
//! jar sends it back on every request and on the websocket handshake.

use std::sync::Arc;
use std::time::Instant;

use reqwest::cookie::{CookieStore, Jar};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Header carrying the per-request correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Keys a success envelope may carry besides `data`.
const ENVELOPE_KEYS: [&str; 5] = ["data", "message", "success", "status", "meta"];

/// Error body the backend sends with non-2xx answers.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// REST client bound to one backend.
///
/// Cloning is cheap and clones share the connection pool and cookie jar.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    jar: Arc<Jar>,
    timeout_secs: u64,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        config.validate()?;

        let base_url = Url::parse(&config.api.base_url)?;
        let jar = Arc::new(Jar::default());
        let http = reqwest::Client::builder()
            .cookie_provider(jar.clone())
            .timeout(config.request_timeout())
            .user_agent(concat!("pupuk-storefront/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ClientError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            http,
            base_url,
            jar,
            timeout_secs: config.api.timeout_secs,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Absolute URL of an endpoint path such as `/products/42`.
    pub fn endpoint(&self, path: &str) -> ClientResult<Url> {
        let joined = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Ok(Url::parse(&joined)?)
    }

    /// `Cookie` header value the jar would send to the backend, for the
    /// websocket handshake.
    pub fn cookie_header(&self) -> Option<String> {
        self.jar
            .cookies(&self.base_url)
            .and_then(|value| value.to_str().ok().map(str::to_string))
    }

    /// Puts cookies saved from [`ApiClient::cookie_header`] back in the jar.
    pub fn restore_cookies(&self, header: &str) {
        for pair in header.split(';').map(str::trim).filter(|p| p.contains('=')) {
            self.jar
                .add_cookie_str(&format!("{}; Path=/", pair), &self.base_url);
        }
    }

    // =========================================================================
    // Verbs
    // =========================================================================

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let body = self.send(Method::GET, path, |req| req).await?;
        decode_body(&body)
    }

    pub async fn get_query<T, Q>(&self, path: &str, query: &Q) -> ClientResult<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let body = self.send(Method::GET, path, |req| req.query(query)).await?;
        decode_body(&body)
    }

    pub async fn post<T, B>(&self, path: &str, payload: &B) -> ClientResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = self.send(Method::POST, path, |req| req.json(payload)).await?;
        decode_body(&body)
    }

    /// POST whose answer carries nothing the caller needs.
    pub async fn post_unit<B>(&self, path: &str, payload: &B) -> ClientResult<()>
    where
        B: Serialize + ?Sized,
    {
        self.send(Method::POST, path, |req| req.json(payload)).await?;
        Ok(())
    }

    pub async fn put<T, B>(&self, path: &str, payload: &B) -> ClientResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = self.send(Method::PUT, path, |req| req.json(payload)).await?;
        decode_body(&body)
    }

    pub async fn patch<T, B>(&self, path: &str, payload: &B) -> ClientResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = self.send(Method::PATCH, path, |req| req.json(payload)).await?;
        decode_body(&body)
    }

    pub async fn delete(&self, path: &str) -> ClientResult<()> {
        self.send(Method::DELETE, path, |req| req).await?;
        Ok(())
    }

    pub async fn put_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> ClientResult<T> {
        let body = self.send(Method::PUT, path, |req| req.multipart(form)).await?;
        decode_body(&body)
    }

    // =========================================================================
    // Transport
    // =========================================================================

    /// Sends one request and returns the body of a 2xx answer.
    async fn send<F>(&self, method: Method, path: &str, build: F) -> ClientResult<Vec<u8>>
    where
        F: FnOnce(RequestBuilder) -> RequestBuilder,
    {
        let url = self.endpoint(path)?;
        let request_id = Uuid::new_v4().to_string();
        let started = Instant::now();

        let request = build(
            self.http
                .request(method.clone(), url)
                .header(REQUEST_ID_HEADER, &request_id),
        );

        let response = request.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status();
        let body = response.bytes().await.map_err(|e| self.transport_error(e))?;

        debug!(
            %method,
            path,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            request_id = %request_id,
            "API request"
        );

        if status.is_success() {
            return Ok(body.to_vec());
        }

        let err = api_error(status, &body);
        if status.is_server_error() {
            warn!(%method, path, status = status.as_u16(), request_id = %request_id, "Backend error");
        }
        Err(err)
    }

    fn transport_error(&self, err: reqwest::Error) -> ClientError {
        if err.is_timeout() {
            ClientError::Timeout(self.timeout_secs)
        } else {
            ClientError::from(err)
        }
    }
}

/// Builds the error for a non-2xx answer from its `{ "message" }` body.
fn api_error(status: StatusCode, body: &[u8]) -> ClientError {
    let message = serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message.or(b.error))
        .filter(|m| !m.trim().is_empty());

    ClientError::Api {
        status: status.as_u16(),
        message,
    }
}

/// Decodes a success body, bare or wrapped in `{ "data": ..., "message": ... }`.
///
/// An object is treated as an envelope only when it has a `data` key and
/// nothing but envelope keys, so records that happen to have a `data`
/// field still decode whole. An empty body decodes as JSON `null`.
pub fn decode_body<T: DeserializeOwned>(body: &[u8]) -> ClientResult<T> {
    let value: Value = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Null
    } else {
        serde_json::from_slice(body)?
    };

    let value = match value {
        Value::Object(mut map)
            if map.contains_key("data") && map.keys().all(|k| ENVELOPE_KEYS.contains(&k.as_str())) =>
        {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    };

    Ok(serde_json::from_value(value)?)
}
