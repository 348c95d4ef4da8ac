use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard},
};

use async_trait::async_trait;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::{
    api::{ApiState, CmsApi},
    error::ApiError,
    models::{
        Article, ArticlePatch, Category, CategoryPatch, ListQuery, ListResult, NewArticle,
        NewCategory,
    },
    notify::{Notice, Notifier, NotifierState},
    session::{SessionState, SessionStore},
    validation::Validate,
};

// --- Resource Contract ---

/// Resource
///
/// Binds one remote collection to the generic list controller: how to list,
/// create, update and delete it through [`CmsApi`], plus the labels used in
/// notifications.
#[async_trait]
pub trait Resource: Send + Sync + 'static {
    type Item: Clone + Send + Sync + 'static;
    type New: Validate + Send + Sync;
    type Patch: Validate + Send + Sync;

    /// Capitalised singular used in notices ("Category").
    fn singular(&self) -> &'static str;
    /// Lower-case plural used in notices ("categories").
    fn plural(&self) -> &'static str;

    fn id<'a>(&self, item: &'a Self::Item) -> &'a str;

    async fn list(
        &self,
        api: &dyn CmsApi,
        token: Option<&str>,
        query: &ListQuery,
    ) -> Result<ListResult<Self::Item>, ApiError>;
    async fn create(
        &self,
        api: &dyn CmsApi,
        token: Option<&str>,
        new: &Self::New,
    ) -> Result<Self::Item, ApiError>;
    async fn update(
        &self,
        api: &dyn CmsApi,
        token: Option<&str>,
        id: &str,
        patch: &Self::Patch,
    ) -> Result<Self::Item, ApiError>;
    async fn delete(&self, api: &dyn CmsApi, token: Option<&str>, id: &str) -> Result<(), ApiError>;

    /// Combines the local copy with the server's answer to an update. The
    /// default takes the server's version as is.
    fn merge(&self, _previous: &Self::Item, updated: Self::Item) -> Self::Item {
        updated
    }
}

/// The `/categories` collection.
#[derive(Debug, Clone, Copy, Default)]
pub struct Categories;

#[async_trait]
impl Resource for Categories {
    type Item = Category;
    type New = NewCategory;
    type Patch = CategoryPatch;

    fn singular(&self) -> &'static str {
        "Category"
    }

    fn plural(&self) -> &'static str {
        "categories"
    }

    fn id<'a>(&self, item: &'a Category) -> &'a str {
        &item.id
    }

    async fn list(
        &self,
        api: &dyn CmsApi,
        token: Option<&str>,
        query: &ListQuery,
    ) -> Result<ListResult<Category>, ApiError> {
        api.list_categories(token, query).await
    }

    async fn create(&self, api: &dyn CmsApi, token: Option<&str>, new: &NewCategory) -> Result<Category, ApiError> {
        let trimmed = NewCategory {
            name: new.name.trim().to_string(),
        };
        api.create_category(token, &trimmed).await
    }

    async fn update(
        &self,
        api: &dyn CmsApi,
        token: Option<&str>,
        id: &str,
        patch: &CategoryPatch,
    ) -> Result<Category, ApiError> {
        let trimmed = CategoryPatch {
            name: patch.name.trim().to_string(),
        };
        api.update_category(token, id, &trimmed).await
    }

    async fn delete(&self, api: &dyn CmsApi, token: Option<&str>, id: &str) -> Result<(), ApiError> {
        api.delete_category(token, id).await
    }
}

/// The `/articles` collection.
#[derive(Debug, Clone, Copy, Default)]
pub struct Articles;

#[async_trait]
impl Resource for Articles {
    type Item = Article;
    type New = NewArticle;
    type Patch = ArticlePatch;

    fn singular(&self) -> &'static str {
        "Article"
    }

    fn plural(&self) -> &'static str {
        "articles"
    }

    fn id<'a>(&self, item: &'a Article) -> &'a str {
        &item.id
    }

    async fn list(
        &self,
        api: &dyn CmsApi,
        token: Option<&str>,
        query: &ListQuery,
    ) -> Result<ListResult<Article>, ApiError> {
        api.list_articles(token, query).await
    }

    async fn create(&self, api: &dyn CmsApi, token: Option<&str>, new: &NewArticle) -> Result<Article, ApiError> {
        let trimmed = NewArticle {
            title: new.title.trim().to_string(),
            ..new.clone()
        };
        api.create_article(token, &trimmed).await
    }

    async fn update(
        &self,
        api: &dyn CmsApi,
        token: Option<&str>,
        id: &str,
        patch: &ArticlePatch,
    ) -> Result<Article, ApiError> {
        let trimmed = ArticlePatch {
            title: patch.title.trim().to_string(),
            ..patch.clone()
        };
        api.update_article(token, id, &trimmed).await
    }

    async fn delete(&self, api: &dyn CmsApi, token: Option<&str>, id: &str) -> Result<(), ApiError> {
        api.delete_article(token, id).await
    }

    /// Write responses may omit the `category`/`user` projections. Keep the
    /// local ones unless the category itself changed.
    fn merge(&self, previous: &Article, mut updated: Article) -> Article {
        if updated.category.is_none() && updated.category_id == previous.category_id {
            updated.category = previous.category.clone();
        }
        if updated.user.is_none() {
            updated.user = previous.user.clone();
        }
        if updated.content.is_empty() {
            updated.content = previous.content.clone();
        }
        updated
    }
}

// --- Controller State ---

/// Pager
///
/// What the pager component needs: the held page and the server's page count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    pub page: u32,
    pub total_pages: u32,
}

impl Pager {
    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

impl fmt::Display for Pager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Page {} of {}", self.page, self.total_pages.max(1))
    }
}

/// Point-in-time copy of a controller's view state.
#[derive(Debug, Clone)]
pub struct ListSnapshot<T> {
    pub items: Vec<T>,
    pub query: ListQuery,
    pub total_pages: u32,
    pub total_data: u64,
    pub loading: bool,
    pub form_open: bool,
}

impl<T> ListSnapshot<T> {
    pub fn pager(&self) -> Pager {
        Pager {
            page: self.query.page,
            total_pages: self.total_pages,
        }
    }
}

/// Whether a finished load was applied or dropped as stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied,
    Stale,
}

struct ListState<T> {
    items: Vec<T>,
    query: ListQuery,
    total_pages: u32,
    total_data: u64,
    // Sequence number of the most recently issued load.
    latest_seq: u64,
    loading: bool,
    form_open: bool,
}

// --- Controller ---

/// ListController
///
/// Owns the filter/pagination state of one remote collection and keeps the
/// in-memory page consistent with user mutations. Every remote failure is
/// caught here, reported through the notifier and handed back as a value;
/// nothing panics into the caller's render path.
///
/// Clones share state, so a clone can be moved into a task (search binding)
/// while the original keeps serving the screen.
pub struct ListController<R: Resource> {
    resource: Arc<R>,
    api: ApiState,
    session: SessionState,
    notifier: NotifierState,
    reset_page_on_filter: bool,
    state: Arc<Mutex<ListState<R::Item>>>,
}

impl<R: Resource> Clone for ListController<R> {
    fn clone(&self) -> Self {
        Self {
            resource: Arc::clone(&self.resource),
            api: Arc::clone(&self.api),
            session: Arc::clone(&self.session),
            notifier: Arc::clone(&self.notifier),
            reset_page_on_filter: self.reset_page_on_filter,
            state: Arc::clone(&self.state),
        }
    }
}

impl<R: Resource> ListController<R> {
    pub fn new(
        resource: R,
        api: ApiState,
        session: SessionState,
        notifier: NotifierState,
        page_size: u32,
    ) -> Self {
        Self {
            resource: Arc::new(resource),
            api,
            session,
            notifier,
            reset_page_on_filter: false,
            state: Arc::new(Mutex::new(ListState {
                items: Vec::new(),
                query: ListQuery::new(page_size),
                total_pages: 0,
                total_data: 0,
                latest_seq: 0,
                loading: false,
                form_open: false,
            })),
        }
    }

    /// Moves back to page 1 whenever a filter changes.
    pub fn reset_page_on_filter(mut self, enabled: bool) -> Self {
        self.reset_page_on_filter = enabled;
        self
    }

    fn lock(&self) -> MutexGuard<'_, ListState<R::Item>> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn snapshot(&self) -> ListSnapshot<R::Item> {
        let state = self.lock();
        ListSnapshot {
            items: state.items.clone(),
            query: state.query.clone(),
            total_pages: state.total_pages,
            total_data: state.total_data,
            loading: state.loading,
            form_open: state.form_open,
        }
    }

    pub fn items(&self) -> Vec<R::Item> {
        self.lock().items.clone()
    }

    pub fn query(&self) -> ListQuery {
        self.lock().query.clone()
    }

    pub fn pager(&self) -> Pager {
        let state = self.lock();
        Pager {
            page: state.query.page,
            total_pages: state.total_pages,
        }
    }

    pub fn open_create_form(&self) {
        self.lock().form_open = true;
    }

    pub fn close_create_form(&self) {
        self.lock().form_open = false;
    }

    // --- Listing ---

    /// load
    ///
    /// Fetches the page described by the current query. Success replaces the
    /// list and totals; failure keeps what was displayed. A response that
    /// comes back after a newer load was issued is discarded.
    pub async fn load(&self) -> Result<LoadOutcome, ApiError> {
        let (seq, query) = {
            let mut state = self.lock();
            state.latest_seq += 1;
            state.loading = true;
            (state.latest_seq, state.query.clone())
        };

        let token = self.session.token();
        let result = self
            .resource
            .list(self.api.as_ref(), token.as_deref(), &query)
            .await;

        let failure = {
            let mut state = self.lock();
            if seq != state.latest_seq {
                tracing::debug!(
                    seq,
                    latest = state.latest_seq,
                    "discarding stale {} response",
                    self.resource.plural()
                );
                return Ok(LoadOutcome::Stale);
            }
            state.loading = false;
            match result {
                Ok(page) => {
                    state.items = page.data;
                    state.total_pages = page.total_pages;
                    state.total_data = page.total_data;
                    None
                }
                Err(e) => Some(e),
            }
        };

        match failure {
            None => Ok(LoadOutcome::Applied),
            Some(e) => {
                let fallback = format!("Failed to load {}. Please try again.", self.resource.plural());
                self.report(&e, &fallback);
                Err(e)
            }
        }
    }

    /// Replaces the page and reloads.
    pub async fn set_page(&self, page: u32) -> Result<LoadOutcome, ApiError> {
        self.lock().query.page = page.max(1);
        self.load().await
    }

    /// Changes the category filter (empty or `None` clears it) and reloads.
    pub async fn set_category(&self, category_id: Option<String>) -> Result<LoadOutcome, ApiError> {
        {
            let mut state = self.lock();
            state.query.category_id = category_id.filter(|c| !c.is_empty());
            if self.reset_page_on_filter {
                state.query.page = 1;
            }
        }
        self.load().await
    }

    /// Changes the title filter (empty clears it) and reloads.
    pub async fn set_title(&self, title: impl Into<String>) -> Result<LoadOutcome, ApiError> {
        let title = title.into();
        {
            let mut state = self.lock();
            state.query.title = if title.is_empty() { None } else { Some(title) };
            if self.reset_page_on_filter {
                state.query.page = 1;
            }
        }
        self.load().await
    }

    /// Sets page and both filters together with a single load.
    pub async fn set_query(
        &self,
        page: u32,
        category_id: Option<String>,
        title: Option<String>,
    ) -> Result<LoadOutcome, ApiError> {
        {
            let mut state = self.lock();
            state.query.page = page.max(1);
            state.query.category_id = category_id.filter(|c| !c.is_empty());
            state.query.title = title.filter(|t| !t.is_empty());
        }
        self.load().await
    }

    /// bind_search
    ///
    /// Applies every committed search value (from [`crate::debounce`]) as the
    /// title filter, one load per value. Ends when the sender side closes.
    pub fn bind_search(&self, mut committed: mpsc::UnboundedReceiver<String>) -> JoinHandle<()> {
        let controller = self.clone();
        tokio::spawn(async move {
            while let Some(title) = committed.recv().await {
                // Failures were already reported by `load`.
                let _ = controller.set_title(title).await;
            }
        })
    }

    // --- Mutations ---

    /// create
    ///
    /// Validates, then posts the new entity. Success closes the creation form,
    /// reloads the current query and reports success.
    pub async fn create(&self, new: &R::New) -> Result<R::Item, ApiError> {
        new.validate()?;

        let singular = self.resource.singular();
        let token = self.session.token();
        match self
            .resource
            .create(self.api.as_ref(), token.as_deref(), new)
            .await
        {
            Ok(item) => {
                self.close_create_form();
                tracing::info!(id = self.resource.id(&item), "{singular} created");
                self.notifier
                    .notify(Notice::success(format!("{singular} added successfully!")));
                // Reload failures are reported by `load` itself.
                let _ = self.load().await;
                Ok(item)
            }
            Err(e) => {
                let fallback = format!("Failed to add {}. Please try again.", singular.to_lowercase());
                self.report(&e, &fallback);
                Err(e)
            }
        }
    }

    /// update
    ///
    /// Validates, then puts the changes. Success patches the item with the
    /// same id in place; every other item is left as it was.
    pub async fn update(&self, id: &str, patch: &R::Patch) -> Result<R::Item, ApiError> {
        patch.validate()?;

        let singular = self.resource.singular();
        let token = self.session.token();
        match self
            .resource
            .update(self.api.as_ref(), token.as_deref(), id, patch)
            .await
        {
            Ok(updated) => {
                let merged = {
                    let mut state = self.lock();
                    match state.items.iter_mut().find(|i| self.resource.id(i) == id) {
                        Some(slot) => {
                            let merged = self.resource.merge(slot, updated);
                            *slot = merged.clone();
                            merged
                        }
                        None => updated,
                    }
                };
                tracing::info!(id, "{singular} updated");
                self.notifier
                    .notify(Notice::success(format!("{singular} updated successfully!")));
                Ok(merged)
            }
            Err(e) => {
                let fallback = format!("Failed to update {}. Please try again.", singular.to_lowercase());
                self.report(&e, &fallback);
                Err(e)
            }
        }
    }

    /// delete
    ///
    /// Always issues the remote call. Success removes the id from the local
    /// list (a no-op when it is not there); failure leaves the list intact.
    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        let singular = self.resource.singular();
        let token = self.session.token();
        match self
            .resource
            .delete(self.api.as_ref(), token.as_deref(), id)
            .await
        {
            Ok(()) => {
                {
                    let mut state = self.lock();
                    let before = state.items.len();
                    state.items.retain(|i| self.resource.id(i) != id);
                    if state.items.len() < before {
                        state.total_data = state.total_data.saturating_sub(1);
                    }
                }
                tracing::info!(id, "{singular} deleted");
                self.notifier
                    .notify(Notice::success(format!("{singular} deleted successfully!")));
                Ok(())
            }
            Err(e) => {
                let fallback = format!("Failed to delete {}. Please try again.", singular.to_lowercase());
                self.report(&e, &fallback);
                Err(e)
            }
        }
    }

    fn report(&self, error: &ApiError, fallback: &str) {
        tracing::warn!(kind = %error.kind(), "{} request failed: {error}", self.resource.plural());
        self.notifier.notify(Notice::error(error.user_message(fallback)));
    }
}
