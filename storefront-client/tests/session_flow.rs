mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::Value;
use storefront_client::SessionApp;
use storefront_client::domains::auth::{
    AuthError, AuthService, FileSessionStore, GuardOutcome, MemorySessionStore,
    SESSION_EXPIRED_MESSAGE, SessionStore,
};
use storefront_client::domains::auth::guard::LOGIN_REQUIRED_MESSAGE;
use storefront_client::domains::ui::{HistoryNavigator, Navigator};
use storefront_client::infra::{ApiClient, ClientError};
use storefront_config::ClientConfig;
use storefront_model::{Role, Session, Severity};
use tempfile::TempDir;

fn config_for(base_url: String) -> ClientConfig {
    ClientConfig {
        server_url: base_url,
        ..ClientConfig::default()
    }
}

fn mount(
    base_url: String,
    session: Option<Session>,
    path: &str,
) -> (SessionApp, Arc<MemorySessionStore>, Arc<HistoryNavigator>) {
    let store = Arc::new(match session {
        Some(session) => MemorySessionStore::with_session(session),
        None => MemorySessionStore::new(),
    });
    let navigator = Arc::new(HistoryNavigator::new(path));
    let app = SessionApp::mount(
        config_for(base_url),
        store.clone(),
        navigator.clone(),
    )
    .expect("mount session app");
    (app, store, navigator)
}

fn seller() -> Session {
    Session::new(common::VALID_TOKEN, Role::Seller).unwrap()
}

#[tokio::test]
async fn bearer_header_matches_stored_token() {
    let server = common::spawn().await;
    let (app, _, _) = mount(server.base_url(), Some(seller()), "/");

    let body: Value = app.client().get("/api/echo").await.unwrap();
    assert_eq!(body["authorization"], "Bearer abc");
}

#[tokio::test]
async fn no_header_without_a_token() {
    let server = common::spawn().await;
    let (app, _, _) = mount(server.base_url(), None, "/");

    let body: Value = app.client().get("/api/echo").await.unwrap();
    assert!(body["authorization"].is_null());

    // Public calls stay anonymous even with a session.
    let (app, _, _) = mount(server.base_url(), Some(seller()), "/");
    let body: Value = app.client().get_public("/api/echo").await.unwrap();
    assert!(body["authorization"].is_null());
}

#[tokio::test]
async fn token_changes_apply_to_the_next_request() {
    let server = common::spawn().await;
    let (app, _, _) = mount(server.base_url(), None, "/");

    app.state().login(seller()).unwrap();
    let body: Value = app.client().get("/api/echo").await.unwrap();
    assert_eq!(body["authorization"], "Bearer abc");

    app.state().logout().unwrap();
    let body: Value = app.client().get("/api/echo").await.unwrap();
    assert!(body["authorization"].is_null());
}

#[tokio::test]
async fn seller_401_on_dashboard_expires_session_and_goes_home() {
    let server = common::spawn().await;
    let (app, store, navigator) =
        mount(server.base_url(), None, "/seller-dashboard");
    app.state().login(seller()).unwrap();

    let expiries = Arc::new(AtomicUsize::new(0));
    let counter = expiries.clone();
    app.on_session_change(move |session| {
        if session.is_none() {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    });

    let err = app.client().get::<Value>("/api/orders").await.unwrap_err();
    assert!(matches!(err, ClientError::Unauthorized));

    assert!(store.read().is_none());
    assert!(app.state().current().is_none());
    assert_eq!(expiries.load(Ordering::SeqCst), 1);

    let shown = app.notifications().current().expect("expiry notification");
    assert_eq!(shown.severity, Severity::Error);
    assert_eq!(shown.message, SESSION_EXPIRED_MESSAGE);

    assert!(app.state().is_popup_visible());
    assert_eq!(navigator.history(), vec!["/seller-dashboard", "/"]);
}

#[tokio::test]
async fn customer_401_on_orders_goes_to_login() {
    let server = common::spawn().await;
    let (app, _, navigator) = mount(
        server.base_url(),
        Some(Session::new("abc", Role::Customer).unwrap()),
        "/orders/12",
    );

    assert!(app.client().get::<Value>("/api/orders").await.is_err());
    assert_eq!(navigator.current_path(), "/login");
}

#[tokio::test]
async fn concurrent_401s_are_idempotent() {
    let server = common::spawn().await;
    let (app, store, navigator) =
        mount(server.base_url(), Some(seller()), "/seller-dashboard");

    let client = app.client().clone();
    let (first, second) = tokio::join!(
        client.get::<Value>("/api/orders"),
        client.get::<Value>("/api/orders")
    );
    assert!(matches!(first, Err(ClientError::Unauthorized)));
    assert!(matches!(second, Err(ClientError::Unauthorized)));
    assert_eq!(server.hits(), 2);

    assert!(store.read().is_none());
    assert!(app.state().is_popup_visible());
    // The second run found the user already on a public page.
    assert_eq!(navigator.history(), vec!["/seller-dashboard", "/"]);
    assert_eq!(
        app.notifications().current().unwrap().message,
        SESSION_EXPIRED_MESSAGE
    );
}

#[tokio::test]
async fn other_statuses_pass_through_untouched() {
    let server = common::spawn().await;
    let (app, store, navigator) =
        mount(server.base_url(), Some(seller()), "/seller-dashboard");

    match app.client().get::<Value>("/api/missing").await {
        Err(ClientError::Status { status, body }) => {
            assert_eq!(status.as_u16(), 404);
            assert_eq!(body, "no such thing");
        }
        other => panic!("expected 404, got {other:?}"),
    }

    assert_eq!(store.read(), Some(seller()));
    assert!(app.notifications().current().is_none());
    assert!(!app.state().is_popup_visible());
    assert_eq!(navigator.history(), vec!["/seller-dashboard"]);
}

#[tokio::test]
async fn transport_errors_have_no_session_side_effects() {
    let (app, store, _) =
        mount(common::closed_port().await, Some(seller()), "/seller-dashboard");

    let err = app.client().get::<Value>("/api/echo").await.unwrap_err();
    assert!(matches!(err, ClientError::Transport(_)));
    assert_eq!(store.read(), Some(seller()));
    assert!(app.notifications().current().is_none());
}

#[tokio::test]
async fn empty_success_body_decodes_as_unit() {
    let server = common::spawn().await;
    let (app, _, _) = mount(server.base_url(), Some(seller()), "/");

    app.client().get::<()>("/api/empty").await.unwrap();
    let nothing: Option<Value> = app.client().get("/api/empty").await.unwrap();
    assert!(nothing.is_none());
}

#[tokio::test]
async fn client_without_hooks_still_reports_unauthorized() {
    let server = common::spawn().await;
    let store = Arc::new(MemorySessionStore::with_session(seller()));
    let client = ApiClient::builder(server.base_url())
        .session_store(store.clone())
        .build()
        .unwrap();

    let err = client.get::<Value>("/api/orders").await.unwrap_err();
    assert!(err.is_unauthorized());
    // Nothing wired to clear it.
    assert!(store.read().is_some());
}

#[tokio::test]
async fn login_then_profile_through_the_service() {
    let server = common::spawn().await;
    let (app, store, _) = mount(server.base_url(), None, "/");

    let err = app
        .auth()
        .login("seller@example.com".into(), "wrong".into())
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Client(ClientError::Unauthorized)));
    assert!(store.read().is_none());

    let session = app
        .auth()
        .login("seller@example.com".into(), common::VALID_PASSWORD.into())
        .await
        .unwrap();
    assert_eq!(session.role(), Role::Seller);
    assert_eq!(store.read(), Some(seller()));
    assert_eq!(app.state().role(), Some(Role::Seller));

    let profile = app.auth().current_user().await.unwrap();
    assert_eq!(profile.email, "seller@example.com");
    assert_eq!(profile.role, Role::Seller);

    app.auth().logout().await.unwrap();
    assert!(store.read().is_none());
    assert!(matches!(
        app.auth().current_user().await,
        Err(AuthError::NotAuthenticated)
    ));
}

#[tokio::test]
async fn anonymous_profile_visit_redirects_without_network() {
    let server = common::spawn().await;
    let (app, _, _) = mount(server.base_url(), None, "/profile");

    let mut rendered = false;
    let outcome = app.require_auth(|| rendered = true);
    assert_eq!(outcome, GuardOutcome::Redirect("/".into()));
    assert!(!rendered);

    let shown = app.notifications().current().unwrap();
    assert_eq!(shown.message, LOGIN_REQUIRED_MESSAGE);
    assert_eq!(shown.severity, Severity::Error);
    assert!(app.state().is_popup_visible());
    assert_eq!(server.hits(), 0);
}

#[tokio::test]
async fn role_guard_distinguishes_permission_from_login() {
    let server = common::spawn().await;
    let (app, _, _) = mount(
        server.base_url(),
        Some(Session::new("abc", Role::Customer).unwrap()),
        "/admin",
    );

    let denied = app.require_role(&[Role::Admin, Role::Seller], || "admin");
    assert_eq!(denied.redirect_target(), Some("/"));
    let message = app.notifications().current().unwrap().message;
    assert_ne!(message, LOGIN_REQUIRED_MESSAGE);

    app.state().login(seller()).unwrap();
    assert_eq!(
        app.require_role(&[Role::Admin, Role::Seller], || "admin"),
        GuardOutcome::Render("admin")
    );
}

#[tokio::test]
async fn file_session_survives_a_remount() {
    let server = common::spawn().await;
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("session.json");

    let app = SessionApp::mount(
        config_for(server.base_url()),
        Arc::new(FileSessionStore::new(&path)),
        Arc::new(HistoryNavigator::default()),
    )
    .unwrap();
    app.auth()
        .login("seller@example.com".into(), common::VALID_PASSWORD.into())
        .await
        .unwrap();
    drop(app);

    let reloaded = SessionApp::mount(
        config_for(server.base_url()),
        Arc::new(FileSessionStore::new(&path)),
        Arc::new(HistoryNavigator::default()),
    )
    .unwrap();
    assert_eq!(reloaded.state().role(), Some(Role::Seller));

    let body: Value = reloaded.client().get("/api/echo").await.unwrap();
    assert_eq!(body["authorization"], "Bearer abc");
}

#[tokio::test]
async fn rejected_login_is_not_treated_as_session_expiry() {
    let server = common::spawn().await;
    let (app, store, navigator) =
        mount(server.base_url(), Some(seller()), "/seller-dashboard");

    let err = app
        .auth()
        .login("seller@example.com".into(), "wrong".into())
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Client(ClientError::Unauthorized)));

    // The existing session, page and prompt are untouched.
    assert_eq!(store.read(), Some(seller()));
    assert_eq!(app.state().role(), Some(Role::Seller));
    assert!(app.notifications().current().is_none());
    assert!(!app.state().is_popup_visible());
    assert_eq!(navigator.history(), vec!["/seller-dashboard"]);
}
