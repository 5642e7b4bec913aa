//! Request/response stages composed around the HTTP client
//!
//! Request stages run in order on the outgoing request right before it is
//! dispatched. Response stages run in order on the result of dispatch,
//! whether a response arrived or the transport failed.

use std::fmt;
use std::sync::Arc;

use reqwest::header::{AUTHORIZATION, HeaderValue};
use reqwest::{Request, Response, StatusCode};
use storefront_model::Severity;

use crate::domains::auth::expiry::SESSION_EXPIRED_MESSAGE;
use crate::domains::auth::storage::SessionStore;
use crate::infra::errors::ClientError;

/// Run when the backend rejects the bearer credential.
pub type SessionExpiredCallback = Arc<dyn Fn() + Send + Sync>;

/// Surface a message to the user.
pub type NotifyCallback = Arc<dyn Fn(&str, Severity) + Send + Sync>;

/// Per-call options visible to every stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestContext {
    /// Endpoint must be called anonymously; skip credential attachment.
    pub public: bool,
}

impl RequestContext {
    pub fn authenticated() -> Self {
        Self { public: false }
    }

    pub fn public() -> Self {
        Self { public: true }
    }
}

/// `(request) -> request'`
pub trait RequestStage: Send + Sync + fmt::Debug {
    fn on_request(&self, request: &mut Request, context: &RequestContext);
}

/// `(response | error) -> response' | error'`
pub trait ResponseStage: Send + Sync + fmt::Debug {
    fn on_response(
        &self,
        result: Result<Response, ClientError>,
        context: &RequestContext,
    ) -> Result<Response, ClientError>;
}

/// Attach `Authorization: Bearer <token>` from the durable store.
///
/// The store is read synchronously for every request, so a login or expiry
/// is picked up by the very next request.
#[derive(Debug)]
pub struct BearerAuth {
    store: Arc<dyn SessionStore>,
}

impl BearerAuth {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }
}

impl RequestStage for BearerAuth {
    fn on_request(&self, request: &mut Request, context: &RequestContext) {
        if context.public {
            return;
        }

        let Some(session) = self.store.read() else {
            return;
        };

        match HeaderValue::from_str(&session.bearer()) {
            Ok(mut value) => {
                value.set_sensitive(true);
                request.headers_mut().insert(AUTHORIZATION, value);
            }
            Err(_) => log::warn!(
                "[ApiClient] Stored token is not a valid header value; sending {} {} unauthenticated",
                request.method(),
                request.url().path()
            ),
        }
    }
}

/// Turn a 401 into [`ClientError::Unauthorized`] after running the expiry
/// hook once for that response.
///
/// Without an expiry hook the notify hook is told the session expired, so
/// the user still hears about it. Public calls carried no credential, so
/// their 401 is returned without touching the session. Every other result
/// passes through.
pub struct UnauthorizedHandler {
    on_session_expired: Option<SessionExpiredCallback>,
    notify: Option<NotifyCallback>,
}

impl fmt::Debug for UnauthorizedHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnauthorizedHandler")
            .field("has_session_expired_hook", &self.on_session_expired.is_some())
            .field("has_notify_hook", &self.notify.is_some())
            .finish()
    }
}

impl UnauthorizedHandler {
    pub fn new(
        on_session_expired: Option<SessionExpiredCallback>,
        notify: Option<NotifyCallback>,
    ) -> Self {
        Self {
            on_session_expired,
            notify,
        }
    }
}

impl ResponseStage for UnauthorizedHandler {
    fn on_response(
        &self,
        result: Result<Response, ClientError>,
        context: &RequestContext,
    ) -> Result<Response, ClientError> {
        let response = result?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        if context.public {
            log::debug!(
                "[ApiClient] Public call to {} answered 401",
                response.url().path()
            );
            return Err(ClientError::Unauthorized);
        }

        log::info!(
            "[ApiClient] {} rejected the bearer credential",
            response.url().path()
        );
        match (&self.on_session_expired, &self.notify) {
            (Some(on_session_expired), _) => on_session_expired(),
            (None, Some(notify)) => notify(SESSION_EXPIRED_MESSAGE, Severity::Error),
            (None, None) => {
                log::warn!("[ApiClient] 401 received with no session hooks configured")
            }
        }
        Err(ClientError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::auth::storage::MemorySessionStore;
    use storefront_model::{Role, Session};

    fn request() -> Request {
        Request::new(
            reqwest::Method::GET,
            "http://localhost/api/orders".parse().unwrap(),
        )
    }

    #[test]
    fn bearer_is_attached_when_a_session_exists() {
        let store = Arc::new(MemorySessionStore::with_session(
            Session::new("abc", Role::Seller).unwrap(),
        ));
        let stage = BearerAuth::new(store);

        let mut req = request();
        stage.on_request(&mut req, &RequestContext::authenticated());
        let header = req.headers().get(AUTHORIZATION).unwrap();
        assert_eq!(header.to_str().unwrap(), "Bearer abc");
        assert!(header.is_sensitive());
    }

    #[test]
    fn no_header_without_session_or_for_public_calls() {
        let stage = BearerAuth::new(Arc::new(MemorySessionStore::new()));
        let mut req = request();
        stage.on_request(&mut req, &RequestContext::authenticated());
        assert!(req.headers().get(AUTHORIZATION).is_none());

        let stage = BearerAuth::new(Arc::new(MemorySessionStore::with_session(
            Session::new("abc", Role::Admin).unwrap(),
        )));
        let mut req = request();
        stage.on_request(&mut req, &RequestContext::public());
        assert!(req.headers().get(AUTHORIZATION).is_none());
    }

    fn response(status: u16) -> Response {
        axum::http::Response::builder()
            .status(status)
            .body(String::new())
            .unwrap()
            .into()
    }

    #[test]
    fn unauthorized_runs_expiry_hook_once_and_still_fails() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let notified = Arc::new(AtomicUsize::new(0));
        let notify_counter = notified.clone();
        let handler = UnauthorizedHandler::new(
            Some(Arc::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })),
            Some(Arc::new(move |_: &str, _: Severity| {
                notify_counter.fetch_add(1, Ordering::SeqCst);
            })),
        );

        let result = handler.on_response(Ok(response(401)), &RequestContext::authenticated());
        assert!(matches!(result, Err(ClientError::Unauthorized)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        // The expiry hook owns the notification when it is configured.
        assert_eq!(notified.load(Ordering::SeqCst), 0);

        let ok = handler.on_response(Ok(response(403)), &RequestContext::authenticated()).unwrap();
        assert_eq!(ok.status(), StatusCode::FORBIDDEN);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn notify_hook_is_the_fallback_for_expiry() {
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let sink = seen.clone();
        let handler = UnauthorizedHandler::new(
            None,
            Some(Arc::new(move |message: &str, severity: Severity| {
                sink.lock().push((message.to_string(), severity));
            })),
        );

        assert!(handler.on_response(Ok(response(401)), &RequestContext::authenticated()).is_err());
        assert_eq!(
            *seen.lock(),
            vec![(SESSION_EXPIRED_MESSAGE.to_string(), Severity::Error)]
        );
    }

    #[test]
    fn public_401_leaves_the_session_alone() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let calls = Arc::new(AtomicUsize::new(0));
        let expiry_counter = calls.clone();
        let notify_counter = calls.clone();
        let handler = UnauthorizedHandler::new(
            Some(Arc::new(move || {
                expiry_counter.fetch_add(1, Ordering::SeqCst);
            })),
            Some(Arc::new(move |_: &str, _: Severity| {
                notify_counter.fetch_add(1, Ordering::SeqCst);
            })),
        );

        let result =
            handler.on_response(Ok(response(401)), &RequestContext::public());
        assert!(matches!(result, Err(ClientError::Unauthorized)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn errors_pass_through_without_running_hooks() {
        use std::sync::atomic::{AtomicBool, Ordering};

        let ran = Arc::new(AtomicBool::new(false));
        let flag = ran.clone();
        let handler = UnauthorizedHandler::new(
            Some(Arc::new(move || flag.store(true, Ordering::SeqCst))),
            None,
        );
        let result = handler.on_response(
            Err(ClientError::Status {
                status: StatusCode::BAD_GATEWAY,
                body: "upstream down".into(),
            }),
            &RequestContext::authenticated(),
        );
        assert!(matches!(
            result,
            Err(ClientError::Status { status, .. }) if status == StatusCode::BAD_GATEWAY
        ));
        assert!(!ran.load(Ordering::SeqCst));
    }
}
