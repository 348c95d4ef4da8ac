#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use article_portal::{
    AppConfig, Portal, RecordingNotifier,
    api::{ApiState, CmsApi},
    error::ApiError,
    models::{
        Article, ArticlePatch, Category, CategoryPatch, ListQuery, ListResult, LoginRequest,
        LoginResponse, NewArticle, NewCategory, RegisterRequest, Role, Session, UploadResponse,
    },
    notify::NotifierState,
    session::{MemorySessionStore, SessionState},
    storage::UploadFile,
};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};

// --- Fixtures ---

pub fn category(id: &str, name: &str) -> Category {
    let at = Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap();
    Category {
        id: id.to_string(),
        name: name.to_string(),
        created_at: at,
        updated_at: at,
        user_id: None,
    }
}

pub fn article(id: &str, title: &str, category_id: &str) -> Article {
    let at = Utc.with_ymd_and_hms(2024, 2, 1, 9, 30, 0).unwrap();
    Article {
        id: id.to_string(),
        user_id: Some("u-1".to_string()),
        category_id: category_id.to_string(),
        title: title.to_string(),
        content: format!("Body of {title}"),
        image_url: String::new(),
        created_at: at,
        updated_at: at,
        category: Some(category(category_id, &format!("Category {category_id}"))),
        user: None,
    }
}

/// Canned failure, turned into a fresh `ApiError` each time it fires.
#[derive(Debug, Clone)]
pub enum Failure {
    Unauthorized,
    Server(u16, Option<String>),
}

impl Failure {
    fn to_error(&self) -> ApiError {
        match self {
            Failure::Unauthorized => ApiError::Unauthorized,
            Failure::Server(status, message) => ApiError::Server {
                status: *status,
                message: message.clone(),
            },
        }
    }
}

// --- Mock CMS ---

/// MockCmsControl
///
/// In-memory stand-in for the remote CMS. Holds the collections, records
/// every call, and can be told to fail or to stall specific list requests.
#[derive(Default)]
pub struct MockCmsControl {
    pub articles: Mutex<Vec<Article>>,
    pub categories: Mutex<Vec<Category>>,

    // Totals reported by list calls instead of the computed ones.
    pub total_pages_override: Mutex<Option<u32>>,
    pub total_data_override: Mutex<Option<u64>>,

    // Failure per operation name ("list_articles", "delete_article", ...).
    pub failures: Mutex<HashMap<&'static str, Failure>>,
    // Artificial latency for article list calls, keyed by title filter.
    pub title_delays: Mutex<HashMap<String, Duration>>,

    pub calls: Mutex<Vec<String>>,
    pub article_queries: Mutex<Vec<ListQuery>>,
    pub tokens: Mutex<Vec<Option<String>>>,
}

impl MockCmsControl {
    pub fn with_articles(articles: Vec<Article>) -> Self {
        let mock = Self::default();
        *mock.articles.lock().unwrap() = articles;
        mock
    }

    pub fn with_categories(categories: Vec<Category>) -> Self {
        let mock = Self::default();
        *mock.categories.lock().unwrap() = categories;
        mock
    }

    pub fn fail(&self, operation: &'static str, failure: Failure) {
        self.failures.lock().unwrap().insert(operation, failure);
    }

    pub fn heal(&self, operation: &'static str) {
        self.failures.lock().unwrap().remove(operation);
    }

    pub fn delay_title(&self, title: &str, delay: Duration) {
        self.title_delays
            .lock()
            .unwrap()
            .insert(title.to_string(), delay);
    }

    pub fn report_totals(&self, total_pages: u32, total_data: u64) {
        *self.total_pages_override.lock().unwrap() = Some(total_pages);
        *self.total_data_override.lock().unwrap() = Some(total_data);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn article_queries(&self) -> Vec<ListQuery> {
        self.article_queries.lock().unwrap().clone()
    }

    fn record(&self, call: String, token: Option<&str>) -> Result<(), ApiError> {
        let operation = call.split(':').next().unwrap_or_default().to_string();
        self.calls.lock().unwrap().push(call);
        self.tokens.lock().unwrap().push(token.map(str::to_string));
        match self.failures.lock().unwrap().get(operation.as_str()) {
            Some(failure) => Err(failure.to_error()),
            None => Ok(()),
        }
    }

    fn page<T: Clone>(&self, items: Vec<T>, query: &ListQuery) -> ListResult<T> {
        let limit = query.limit.max(1) as usize;
        let start = (query.page.max(1) as usize - 1) * limit;
        let total_data = self
            .total_data_override
            .lock()
            .unwrap()
            .unwrap_or(items.len() as u64);
        let total_pages = self
            .total_pages_override
            .lock()
            .unwrap()
            .unwrap_or_else(|| (items.len().div_ceil(limit)).max(1) as u32);
        ListResult {
            data: items.into_iter().skip(start).take(limit).collect(),
            total_pages,
            total_data,
        }
    }
}

#[async_trait]
impl CmsApi for MockCmsControl {
    async fn login(&self, req: &LoginRequest) -> Result<LoginResponse, ApiError> {
        self.record(format!("login:{}", req.username), None)?;
        let role = if req.username.starts_with("admin") {
            Role::Admin
        } else {
            Role::User
        };
        Ok(LoginResponse {
            token: format!("token-{}", req.username),
            role,
        })
    }

    async fn register(&self, req: &RegisterRequest) -> Result<(), ApiError> {
        self.record(format!("register:{}", req.username), None)
    }

    async fn list_categories(
        &self,
        token: Option<&str>,
        query: &ListQuery,
    ) -> Result<ListResult<Category>, ApiError> {
        self.record(format!("list_categories:{}", query.page), token)?;
        let items = self.categories.lock().unwrap().clone();
        Ok(self.page(items, query))
    }

    async fn create_category(&self, token: Option<&str>, new: &NewCategory) -> Result<Category, ApiError> {
        self.record(format!("create_category:{}", new.name), token)?;
        let mut categories = self.categories.lock().unwrap();
        let created = category(&format!("c-{}", categories.len() + 1), &new.name);
        categories.push(created.clone());
        Ok(created)
    }

    async fn update_category(
        &self,
        token: Option<&str>,
        id: &str,
        patch: &CategoryPatch,
    ) -> Result<Category, ApiError> {
        self.record(format!("update_category:{id}"), token)?;
        Ok(category(id, &patch.name))
    }

    async fn delete_category(&self, token: Option<&str>, id: &str) -> Result<(), ApiError> {
        self.record(format!("delete_category:{id}"), token)?;
        self.categories.lock().unwrap().retain(|c| c.id != id);
        Ok(())
    }

    async fn list_articles(
        &self,
        token: Option<&str>,
        query: &ListQuery,
    ) -> Result<ListResult<Article>, ApiError> {
        self.article_queries.lock().unwrap().push(query.clone());
        let delay = query
            .title
            .as_ref()
            .and_then(|t| self.title_delays.lock().unwrap().get(t).copied());
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.record(format!("list_articles:{}", query.page), token)?;

        let items: Vec<Article> = self
            .articles
            .lock()
            .unwrap()
            .iter()
            .filter(|a| query.category_id.as_ref().is_none_or(|c| &a.category_id == c))
            .filter(|a| query.title.as_ref().is_none_or(|t| a.title.contains(t.as_str())))
            .cloned()
            .collect();
        Ok(self.page(items, query))
    }

    async fn get_article(&self, token: Option<&str>, id: &str) -> Result<Article, ApiError> {
        self.record(format!("get_article:{id}"), token)?;
        self.articles
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .ok_or(ApiError::Server {
                status: 404,
                message: Some("Article not found".to_string()),
            })
    }

    async fn create_article(&self, token: Option<&str>, new: &NewArticle) -> Result<Article, ApiError> {
        self.record(format!("create_article:{}", new.title), token)?;
        let mut articles = self.articles.lock().unwrap();
        let mut created = article(&format!("a-{}", articles.len() + 1), &new.title, &new.category_id);
        created.content = new.content.clone();
        created.image_url = new.image_url.clone();
        articles.push(created.clone());
        Ok(created)
    }

    async fn update_article(
        &self,
        token: Option<&str>,
        id: &str,
        patch: &ArticlePatch,
    ) -> Result<Article, ApiError> {
        self.record(format!("update_article:{id}"), token)?;
        // Write responses come back without the read projections.
        let mut updated = article(id, &patch.title, &patch.category_id);
        updated.category = None;
        updated.content = String::new();
        updated.image_url = patch.image_url.clone();
        Ok(updated)
    }

    async fn delete_article(&self, token: Option<&str>, id: &str) -> Result<(), ApiError> {
        self.record(format!("delete_article:{id}"), token)?;
        self.articles.lock().unwrap().retain(|a| a.id != id);
        Ok(())
    }

    async fn upload(&self, token: Option<&str>, file: UploadFile) -> Result<UploadResponse, ApiError> {
        self.record(format!("upload:{}", file.file_name), token)?;
        Ok(UploadResponse {
            url: format!("https://cdn.test/{}", file.file_name),
        })
    }
}

// --- Portal Wiring ---

pub struct TestPortal {
    pub portal: Portal,
    pub mock: Arc<MockCmsControl>,
    pub session: Arc<MemorySessionStore>,
    pub notices: Arc<RecordingNotifier>,
}

pub fn admin_session() -> Session {
    Session::new("token-admin", Role::Admin, "admin")
}

pub fn user_session() -> Session {
    Session::new("token-reader", Role::User, "reader")
}

pub fn test_portal(mock: MockCmsControl, session: Session) -> TestPortal {
    let mock = Arc::new(mock);
    let session = Arc::new(MemorySessionStore::with_session(session));
    let notices = Arc::new(RecordingNotifier::new());
    let portal = Portal {
        api: mock.clone() as ApiState,
        session: session.clone() as SessionState,
        notifier: notices.clone() as NotifierState,
        config: AppConfig::default(),
    };
    TestPortal {
        portal,
        mock,
        session,
        notices,
    }
}
