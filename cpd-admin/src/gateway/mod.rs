//! The single chokepoint every backend call passes through.
//!
//! [`ApiGateway::execute`] turns an endpoint plus [`RequestOptions`] into an
//! [`ApiResult`] without touching session state. [`ApiGateway::request`]
//! adds the one global side effect: a 401 tears the session down and hands
//! the login route to the registered [`Navigator`].

pub mod body;
pub mod result;
pub mod transport;

pub use body::{FormPart, MultipartForm, PartContent, RequestBody};
pub use result::{ApiError, ApiResult, NETWORK_ERROR_MESSAGE};
pub use transport::{
    MockTransport, ReqwestTransport, Transport, TransportError, TransportRequest,
    TransportResponse,
};

use dashboard_core::observability::{inject_request_id, new_request_id};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::{Arc, Mutex, PoisonError};

use crate::session::SessionStore;

pub const DEFAULT_LOGIN_ROUTE: &str = "/login";

/// Reacts to the gateway detecting an unauthenticated session.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: &str);
}

/// Navigator that only records the redirect in the log.
pub struct LoggingNavigator;

impl Navigator for LoggingNavigator {
    fn navigate(&self, route: &str) {
        tracing::warn!(route = %route, "Session ended, redirecting to login");
    }
}

/// Navigator that remembers every route it was sent to.
#[derive(Default)]
pub struct RecordingNavigator {
    routes: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn routes(&self) -> Vec<String> {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn count(&self) -> usize {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: &str) {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(route.to_string());
    }
}

/// Method, extra headers and body for one call. Defaults to a bodiless GET.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn post(body: RequestBody) -> Self {
        Self::default().with_method(Method::POST).with_body(body)
    }

    pub fn put(body: RequestBody) -> Self {
        Self::default().with_method(Method::PUT).with_body(body)
    }

    pub fn delete() -> Self {
        Self::default().with_method(Method::DELETE)
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

pub struct ApiGateway {
    base_url: String,
    login_route: String,
    transport: Arc<dyn Transport>,
    session: Arc<SessionStore>,
    navigator: Arc<dyn Navigator>,
}

impl ApiGateway {
    pub fn new(
        base_url: impl Into<String>,
        transport: Arc<dyn Transport>,
        session: Arc<SessionStore>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            login_route: DEFAULT_LOGIN_ROUTE.to_string(),
            transport,
            session,
            navigator: Arc::new(LoggingNavigator),
        }
    }

    pub fn with_navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = navigator;
        self
    }

    pub fn with_login_route(mut self, route: impl Into<String>) -> Self {
        self.login_route = route.into();
        self
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn login_route(&self) -> &str {
        &self.login_route
    }

    pub fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// Perform one call and normalize the outcome. Reads the credential but
    /// never mutates the session.
    pub async fn execute(&self, endpoint: &str, options: RequestOptions) -> ApiResult<Value> {
        let method = options.method.clone();
        let request = match self.build_request(endpoint, options) {
            Ok(request) => request,
            Err(err) => return ApiResult::Failure(err),
        };

        let request_id = dashboard_core::observability::extract_request_id(&request.headers)
            .unwrap_or_default();
        tracing::debug!(
            method = %method,
            endpoint = %endpoint,
            request_id = %request_id,
            "Sending API request"
        );

        match self.transport.send(request).await {
            Ok(response) => {
                let result = interpret_response(response.status, &response.body);
                if let ApiResult::Failure(err) = &result {
                    tracing::warn!(
                        method = %method,
                        endpoint = %endpoint,
                        request_id = %request_id,
                        status = response.status,
                        error = %err,
                        "API request failed"
                    );
                }
                result
            }
            Err(e) => {
                tracing::error!(
                    method = %method,
                    endpoint = %endpoint,
                    request_id = %request_id,
                    error = %e,
                    "API request could not be completed"
                );
                ApiResult::Failure(ApiError::network())
            }
        }
    }

    /// [`execute`](Self::execute) plus the forced logout on 401.
    pub async fn request(&self, endpoint: &str, options: RequestOptions) -> ApiResult<Value> {
        let result = self.execute(endpoint, options).await;
        if result.error().is_some_and(ApiError::is_unauthorized) {
            tracing::warn!(endpoint = %endpoint, "Unauthorized response, forcing logout");
            self.force_logout();
        }
        result
    }

    /// [`request`](Self::request) with the success payload decoded into `T`.
    pub async fn request_as<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> ApiResult<T> {
        self.request(endpoint, options).await.and_then(|value| {
            match serde_json::from_value::<T>(value) {
                Ok(data) => ApiResult::Success(data),
                Err(e) => ApiResult::Failure(ApiError::Decode(format!(
                    "Unexpected response from {}: {}",
                    endpoint, e
                ))),
            }
        })
    }

    /// Clear credential and profile together, then send the user to login.
    pub fn force_logout(&self) {
        self.session.clear_all();
        self.navigator.navigate(&self.login_route);
    }

    fn build_request(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<TransportRequest, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        for (name, value) in &options.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ApiError::Encode(format!("Invalid header name '{}': {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| ApiError::Encode(format!("Invalid value for header '{}': {}", name, e)))?;
            headers.insert(name, value);
        }

        if let Some(credential) = self.session.get_credential() {
            let value = HeaderValue::from_str(&credential.authorization_value())
                .map_err(|e| ApiError::Encode(format!("Invalid stored credential: {}", e)))?;
            headers.insert(AUTHORIZATION, value);
        }

        match &options.body {
            RequestBody::Json(_) => {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            }
            RequestBody::Multipart(_) => {
                headers.remove(CONTENT_TYPE);
            }
            RequestBody::Empty => {}
        }

        inject_request_id(&mut headers, &new_request_id());

        Ok(TransportRequest {
            method: options.method,
            url: self.url(endpoint),
            headers,
            body: options.body,
        })
    }
}

/// Map status and raw body onto the result envelope.
///
/// Non-2xx responses surface the body's `message` field verbatim when
/// present; otherwise a generic status message. 401 is always
/// [`ApiError::Unauthorized`], whatever the body looks like.
fn interpret_response(status: u16, body: &[u8]) -> ApiResult<Value> {
    let parsed = if body.iter().all(u8::is_ascii_whitespace) {
        Ok(Value::Null)
    } else {
        serde_json::from_slice::<Value>(body)
    };

    if (200..300).contains(&status) {
        return match parsed {
            Ok(value) => ApiResult::Success(value),
            Err(e) => ApiResult::Failure(ApiError::Decode(format!("Invalid JSON response: {}", e))),
        };
    }

    let message = parsed
        .ok()
        .as_ref()
        .and_then(|v| v.get("message"))
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP error! status: {}", status));

    if status == 401 {
        ApiResult::Failure(ApiError::Unauthorized(message))
    } else {
        ApiResult::Failure(ApiError::Http { status, message })
    }
}
