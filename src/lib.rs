use std::sync::Arc;

// --- Module Structure ---

// Data access, session and access control.
pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod session;
pub mod storage;

// Screen orchestration on top of the data layer.
pub mod controller;
pub mod debounce;
pub mod notify;
pub mod screens;
pub mod validation;
pub mod view;

// Screen paths and the access gate.
pub mod routes;

// --- Public Re-exports ---

pub use api::{ApiState, CmsApi, HttpCmsApi};
pub use config::{AppConfig, Env};
pub use controller::{Articles, Categories, ListController};
pub use error::{ApiError, ErrorKind};
pub use notify::{ConsoleNotifier, Notice, NotifierState, RecordingNotifier};
pub use routes::{AccessGate, Route};
pub use session::{FileSessionStore, MemorySessionStore, SessionState};

/// Portal
///
/// The single container holding every client service: the data-access
/// interface, the session store, the notification sink and the loaded
/// configuration. Screens take it by reference; controllers and gates are
/// built from it so they all share the same session and API.
#[derive(Clone)]
pub struct Portal {
    /// Remote CMS access.
    pub api: ApiState,
    /// Durable session storage (token, role, username).
    pub session: SessionState,
    /// Where success/failure notices go.
    pub notifier: NotifierState,
    /// The loaded, immutable configuration.
    pub config: AppConfig,
}

impl Portal {
    /// from_config
    ///
    /// Production wiring: HTTP API, file-backed session, console notices.
    pub fn from_config(config: AppConfig) -> Result<Self, ApiError> {
        let api = Arc::new(HttpCmsApi::new(&config)?) as ApiState;
        let session = Arc::new(FileSessionStore::new(config.session_file.clone())) as SessionState;
        let notifier = Arc::new(ConsoleNotifier) as NotifierState;
        Ok(Self {
            api,
            session,
            notifier,
            config,
        })
    }

    pub fn articles(&self) -> ListController<Articles> {
        ListController::new(
            Articles,
            Arc::clone(&self.api),
            Arc::clone(&self.session),
            Arc::clone(&self.notifier),
            self.config.page_size,
        )
        .reset_page_on_filter(self.config.reset_page_on_filter)
    }

    pub fn categories(&self) -> ListController<Categories> {
        ListController::new(
            Categories,
            Arc::clone(&self.api),
            Arc::clone(&self.session),
            Arc::clone(&self.notifier),
            self.config.page_size,
        )
        .reset_page_on_filter(self.config.reset_page_on_filter)
    }

    pub fn gate(&self) -> AccessGate {
        AccessGate::new(Arc::clone(&self.session))
    }
}
