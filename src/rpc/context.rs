//! Per-call RPC context
//!
//! Built once for every inbound call and never shared. The session is looked
//! up fresh through the backend from the `sb-access-token` cookie or the
//! `Authorization` header. Construction fails open: any problem resolving the
//! session yields `session: None`, and the gates decide what that means.

use hyper::header::{HeaderName, HeaderValue, AUTHORIZATION, COOKIE};
use hyper::{HeaderMap, Method};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

use crate::auth::{bearer_token, cookie_value, ACCESS_TOKEN_COOKIE};
use crate::backend::{Session, SharedBackend};

/// The parts of the inbound request a procedure may look at
#[derive(Debug, Clone)]
pub struct RequestMeta {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub remote_addr: Option<SocketAddr>,
}

impl RequestMeta {
    pub fn new(method: Method, path: impl Into<String>, headers: HeaderMap) -> Self {
        Self {
            method,
            path: path.into(),
            headers,
            remote_addr: None,
        }
    }

    pub fn with_remote_addr(mut self, addr: SocketAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }

    fn header(&self, name: HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Access token from the session cookie, falling back to the Authorization header
    pub fn access_token(&self) -> Option<&str> {
        cookie_value(self.header(COOKIE), ACCESS_TOKEN_COOKIE)
            .or_else(|| bearer_token(self.header(AUTHORIZATION)))
    }
}

/// Response handle shared between the server and a procedure.
///
/// Clones share the same header map, so headers set by a handler show up on
/// the HTTP response.
#[derive(Debug, Clone, Default)]
pub struct ResponseMeta {
    headers: Arc<Mutex<HeaderMap>>,
}

impl ResponseMeta {
    pub fn set_header(&self, name: HeaderName, value: HeaderValue) {
        if let Ok(mut headers) = self.headers.lock() {
            headers.insert(name, value);
        }
    }

    /// Drain the headers set so far
    pub fn take_headers(&self) -> HeaderMap {
        self.headers
            .lock()
            .map(|mut headers| std::mem::take(&mut *headers))
            .unwrap_or_default()
    }
}

/// Base context handed to gates and procedures
#[derive(Clone)]
pub struct Context {
    pub backend: SharedBackend,
    pub session: Option<Session>,
    pub request: RequestMeta,
    pub response: ResponseMeta,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("session", &self.session.as_ref().map(|s| &s.user.id))
            .field("request", &self.request)
            .finish()
    }
}

/// Build the context for one call
pub async fn create_context(backend: SharedBackend, request: RequestMeta) -> Context {
    let session = match request.access_token() {
        Some(token) => match backend.session_from_token(token).await {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "Session lookup failed, continuing without session");
                None
            }
        },
        None => None,
    };

    debug!(
        path = %request.path,
        authenticated = session.is_some(),
        "RPC context created"
    );

    Context {
        backend,
        session,
        request,
        response: ResponseMeta::default(),
    }
}
