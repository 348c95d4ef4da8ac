use std::sync::Arc;

use article_portal::{
    models::{Role, Session},
    routes::{AccessGate, GateDecision, GateState, Route, gate::decide},
    session::{MemorySessionStore, SessionState, SessionStore},
};

fn gate_for(session: Session) -> (AccessGate, Arc<MemorySessionStore>) {
    let store = Arc::new(MemorySessionStore::with_session(session));
    (AccessGate::new(store.clone() as SessionState), store)
}

fn user() -> Session {
    Session::new("t-user", Role::User, "reader")
}

fn admin() -> Session {
    Session::new("t-admin", Role::Admin, "boss")
}

#[test]
fn test_anonymous_viewer_goes_to_login() {
    let (mut gate, _) = gate_for(Session::anonymous());
    assert_eq!(gate.check("/", 0), &GateState::Redirecting(Route::Login));
    assert_eq!(decide(&Session::anonymous(), "/dashboard"), GateDecision::Redirect(Route::Login));
}

#[test]
fn test_non_admin_is_kept_on_root() {
    let (mut gate, _) = gate_for(user());
    assert_eq!(gate.check("/", 0), &GateState::Admitted);
    assert_eq!(gate.check("/dashboard", 0), &GateState::Redirecting(Route::Home));
    assert_eq!(
        gate.check("/dashboard/category", 0),
        &GateState::Redirecting(Route::Home)
    );
}

#[test]
fn test_unknown_role_is_treated_as_non_admin() {
    let session = Session::new("t", Role::parse("Editor"), "ed");
    assert_eq!(decide(&session, "/"), GateDecision::Admit);
    assert_eq!(decide(&session, "/dashboard"), GateDecision::Redirect(Route::Home));
}

#[test]
fn test_admin_is_kept_in_dashboard_area() {
    let (mut gate, _) = gate_for(admin());
    assert_eq!(gate.check("/", 0), &GateState::Redirecting(Route::Dashboard));
    assert_eq!(gate.check("/dashboard", 0), &GateState::Admitted);
    assert_eq!(gate.check("/dashboard/category", 0), &GateState::Admitted);
    assert_eq!(gate.check("/dashboard/", 0), &GateState::Admitted);
    // A lookalike prefix is not part of the dashboard.
    assert_eq!(
        gate.check("/dashboardx", 0),
        &GateState::Redirecting(Route::Dashboard)
    );
}

#[test]
fn test_role_without_token_is_sent_to_login() {
    // Storage tampered with outside the client: a role but no token.
    let store = Arc::new(MemorySessionStore::new());
    store.force(Session {
        token: None,
        role: Some(Role::Admin),
        username: "boss".to_string(),
    });
    let mut gate = AccessGate::new(store as SessionState);

    assert_eq!(gate.check("/dashboard", 0), &GateState::Redirecting(Route::Login));
}

#[test]
fn test_nothing_renders_before_admission() {
    let (mut gate, _) = gate_for(user());
    assert_eq!(gate.state(), &GateState::Pending);
    assert_eq!(gate.render(|| "protected"), None);

    gate.check("/dashboard", 0);
    assert_eq!(gate.render(|| "protected"), None);

    gate.check("/", 0);
    assert_eq!(gate.render(|| "protected"), Some("protected"));

    gate.begin();
    assert_eq!(gate.render(|| "protected"), None);
}

#[test]
fn test_gate_reevaluates_when_path_or_router_changes() {
    let (mut gate, store) = gate_for(user());
    assert_eq!(gate.check("/", 0), &GateState::Admitted);

    // Same key: the cached decision stands even though the session changed.
    store.save(&admin()).unwrap();
    assert_eq!(gate.check("/", 0), &GateState::Admitted);

    // New router generation: the fresh session is read.
    assert_eq!(gate.check("/", 1), &GateState::Redirecting(Route::Dashboard));

    store.clear().unwrap();
    assert_eq!(gate.check("/dashboard", 1), &GateState::Redirecting(Route::Login));
}

#[test]
fn test_route_paths_round_trip() {
    for route in [Route::Home, Route::Login, Route::Register, Route::Dashboard, Route::DashboardCategories] {
        assert_eq!(Route::parse(&route.path()), route);
    }
    assert_eq!(Route::parse("/abc-123"), Route::Article("abc-123".to_string()));
    assert!(Route::Dashboard.is_protected());
    assert!(!Route::Login.is_protected());
}
