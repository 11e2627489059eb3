//! Client session middleware for Axum
//!
//! Identifies the caller by a session cookie holding a UUID. Requests
//! without a valid cookie get a freshly minted key, returned to the client
//! in `Set-Cookie`. Handlers read the result as `Extension<ClientSession>`.

use crate::activity;
use axum::{
    extract::ConnectInfo,
    http::{
        header::{COOKIE, SET_COOKIE},
        HeaderMap, HeaderValue, Request,
    },
    response::Response,
};
use ravensh_core::SessionKey;
use std::net::SocketAddr;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::warn;
use uuid::Uuid;

// ============================================================================
// Settings
// ============================================================================

/// Session cookie attributes
#[derive(Debug, Clone)]
pub struct CookieSettings {
    pub name: String,
    pub max_age_secs: u64,
    /// Emit `SameSite=None; Secure` so browsers send the cookie on
    /// cross-site requests (requires HTTPS)
    pub cross_site: bool,
}

impl CookieSettings {
    fn set_cookie(&self, key: &SessionKey) -> String {
        let mut cookie = format!(
            "{}={}; Path=/; Max-Age={}; HttpOnly",
            self.name, key, self.max_age_secs
        );
        if self.cross_site {
            cookie.push_str("; SameSite=None; Secure");
        } else {
            cookie.push_str("; SameSite=Lax");
        }
        cookie
    }
}

// ============================================================================
// Request extension
// ============================================================================

/// Caller identity resolved for this request
#[derive(Debug, Clone)]
pub struct ClientSession {
    pub key: SessionKey,
    pub addr: Option<SocketAddr>,
    /// The key was minted by this request
    pub fresh: bool,
}

// ============================================================================
// Axum Layer
// ============================================================================

/// Layer that attaches a [`ClientSession`] to every request
#[derive(Clone)]
pub struct ClientSessionLayer {
    settings: Arc<CookieSettings>,
}

impl ClientSessionLayer {
    pub fn new(settings: CookieSettings) -> Self {
        Self {
            settings: Arc::new(settings),
        }
    }
}

impl<S> Layer<S> for ClientSessionLayer {
    type Service = ClientSessionService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ClientSessionService {
            inner,
            settings: self.settings.clone(),
        }
    }
}

// ============================================================================
// Axum Service
// ============================================================================

/// Client session service wrapper
#[derive(Clone)]
pub struct ClientSessionService<S> {
    inner: S,
    settings: Arc<CookieSettings>,
}

type BoxFuture<T, E> =
    std::pin::Pin<Box<dyn std::future::Future<Output = std::result::Result<T, E>> + Send>>;

impl<S, B> Service<Request<B>> for ClientSessionService<S>
where
    S: Service<Request<B>, Response = Response> + Send + Clone + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<Response, S::Error>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<std::result::Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<B>) -> BoxFuture<Response, S::Error> {
        let settings = self.settings.clone();
        // Take the service that was polled ready, leave a fresh clone behind.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        let addr = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);

        let client = match session_from_cookies(req.headers(), &settings.name) {
            Some(key) => ClientSession {
                key,
                addr,
                fresh: false,
            },
            None => {
                let client = ClientSession {
                    key: SessionKey::new(Uuid::new_v4().to_string()),
                    addr,
                    fresh: true,
                };
                activity::connect(&client);
                client
            }
        };

        let cookie = client.fresh.then(|| settings.set_cookie(&client.key));
        req.extensions_mut().insert(client);

        Box::pin(async move {
            let mut response = inner.call(req).await?;

            if let Some(cookie) = cookie {
                match HeaderValue::from_str(&cookie) {
                    Ok(value) => {
                        response.headers_mut().append(SET_COOKIE, value);
                    }
                    Err(e) => warn!(error = %e, "Failed to encode session cookie"),
                }
            }

            Ok(response)
        })
    }
}

/// Find the session cookie among all `Cookie` headers.
///
/// Values that are not UUIDs are treated as absent.
fn session_from_cookies(headers: &HeaderMap, name: &str) -> Option<SessionKey> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .and_then(|(_, v)| Uuid::parse_str(v.trim()).ok())
        .map(|uuid| SessionKey::new(uuid.to_string()))
}
