use crate::{
    models::Session,
    routes::{Route, is_dashboard_path, is_root_path},
    session::{SessionState, SessionStore},
};

/// GateDecision
///
/// Outcome of one evaluation for a requested path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Admit,
    Redirect(Route),
}

/// GateState
///
/// What the gate renders right now. `Pending` is the neutral loading state
/// shown before the first evaluation of a path completes; protected content is
/// only reachable from `Admitted`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateState {
    Pending,
    Admitted,
    Redirecting(Route),
}

/// decide
///
/// The ordered access rules, applied to a session snapshot:
///
/// 1. no role: go to login;
/// 2. a non-admin role anywhere but root: go to root;
/// 3. an admin outside the dashboard area: go to the dashboard;
/// 4. no token: go to login;
/// 5. otherwise admit.
///
/// The check is navigational only. Nothing here proves the token is valid or
/// unexpired; the remote enforces access on its own.
pub fn decide(session: &Session, path: &str) -> GateDecision {
    let Some(role) = session.role.as_ref() else {
        return GateDecision::Redirect(Route::Login);
    };

    if !role.is_admin() && !is_root_path(path) {
        return GateDecision::Redirect(Route::Home);
    }

    if role.is_admin() && !is_dashboard_path(path) {
        return GateDecision::Redirect(Route::Dashboard);
    }

    if session.token.is_none() {
        return GateDecision::Redirect(Route::Login);
    }

    GateDecision::Admit
}

/// AccessGate
///
/// Re-runs [`decide`] whenever the requested path or the router generation
/// changes, reading the session fresh from the store each time.
pub struct AccessGate {
    store: SessionState,
    state: GateState,
    key: Option<(String, u64)>,
}

impl AccessGate {
    pub fn new(store: SessionState) -> Self {
        Self {
            store,
            state: GateState::Pending,
            key: None,
        }
    }

    pub fn state(&self) -> &GateState {
        &self.state
    }

    /// Drops back to `Pending` ahead of a navigation so nothing protected is
    /// rendered while the next check runs.
    pub fn begin(&mut self) {
        self.state = GateState::Pending;
    }

    /// check
    ///
    /// Evaluates `path` for the router identified by `router_generation`.
    /// Returns the cached state when neither changed since the last call.
    pub fn check(&mut self, path: &str, router_generation: u64) -> &GateState {
        let key = (path.to_string(), router_generation);
        if self.key.as_ref() == Some(&key) && self.state != GateState::Pending {
            return &self.state;
        }

        self.state = GateState::Pending;
        let session = self.store.load();
        let decision = decide(&session, path);
        tracing::debug!(path, ?decision, "access gate evaluated");

        self.state = match decision {
            GateDecision::Admit => GateState::Admitted,
            GateDecision::Redirect(route) => GateState::Redirecting(route),
        };
        self.key = Some(key);
        &self.state
    }

    /// render
    ///
    /// Produces protected content only when admitted. Any other state yields
    /// `None`; the caller shows the loading view or follows the redirect.
    pub fn render<T>(&self, content: impl FnOnce() -> T) -> Option<T> {
        match self.state {
            GateState::Admitted => Some(content()),
            GateState::Pending | GateState::Redirecting(_) => None,
        }
    }
}
