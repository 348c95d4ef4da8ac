//! Screen Index
//!
//! Every screen the client can show, addressed by the same paths the web
//! client used. Screens split into three access groups:
//!
//! - public: login, register and single-article pages, open to anyone;
//! - viewer: the article home at `/`, behind the access gate;
//! - dashboard: article and category management, behind the access gate and
//!   reserved to the Admin role.

use std::fmt;

pub mod gate;

pub use gate::{AccessGate, GateDecision, GateState};

pub const ROOT_PATH: &str = "/";
pub const LOGIN_PATH: &str = "/login";
pub const REGISTER_PATH: &str = "/register";
pub const DASHBOARD_PATH: &str = "/dashboard";
pub const DASHBOARD_CATEGORY_PATH: &str = "/dashboard/category";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Login,
    Register,
    Article(String),
    Dashboard,
    DashboardCategories,
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Route::Home => ROOT_PATH.to_string(),
            Route::Login => LOGIN_PATH.to_string(),
            Route::Register => REGISTER_PATH.to_string(),
            Route::Article(id) => format!("/{id}"),
            Route::Dashboard => DASHBOARD_PATH.to_string(),
            Route::DashboardCategories => DASHBOARD_CATEGORY_PATH.to_string(),
        }
    }

    pub fn parse(path: &str) -> Self {
        let trimmed = path.trim_end_matches('/');
        match trimmed {
            "" => Route::Home,
            LOGIN_PATH => Route::Login,
            REGISTER_PATH => Route::Register,
            DASHBOARD_PATH => Route::Dashboard,
            DASHBOARD_CATEGORY_PATH => Route::DashboardCategories,
            other => Route::Article(other.trim_start_matches('/').to_string()),
        }
    }

    /// Screens wrapped by the access gate.
    pub fn is_protected(&self) -> bool {
        matches!(
            self,
            Route::Home | Route::Dashboard | Route::DashboardCategories
        )
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// True for `/dashboard` and anything nested under it.
pub fn is_dashboard_path(path: &str) -> bool {
    let trimmed = path.trim_end_matches('/');
    trimmed == DASHBOARD_PATH
        || trimmed
            .strip_prefix(DASHBOARD_PATH)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Root is `/`; a trailing slash collapse makes `""` equivalent.
pub fn is_root_path(path: &str) -> bool {
    path.trim_end_matches('/').is_empty()
}
