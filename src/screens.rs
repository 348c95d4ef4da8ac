use crate::{
    Portal,
    api::CmsApi,
    error::ApiError,
    models::{Article, Category, ListQuery, LoginRequest, Session},
    notify::{Notice, Notifier},
    routes::Route,
    session::SessionStore,
    storage::UploadFile,
    validation::{RegisterForm, Validate},
};

/// Recommendations fetched per article page (the current article included).
const RECOMMENDATION_FETCH: u32 = 4;
/// Recommendations actually shown.
const RECOMMENDATION_SHOWN: usize = 3;
/// Category options loaded for filter dropdowns and forms.
const CATEGORY_OPTIONS_LIMIT: u32 = 100;

// --- Identity Screens ---

/// login
///
/// Validates the form, exchanges credentials for a token and persists the
/// session. Returns where to go next: the dashboard for an Admin, the home
/// screen for everyone else.
pub async fn login(portal: &Portal, username: &str, password: &str) -> Result<Route, ApiError> {
    let request = LoginRequest {
        username: username.to_string(),
        password: password.to_string(),
    };
    request.validate()?;

    let response = match portal.api.login(&request).await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(username, kind = %e.kind(), "login failed: {e}");
            portal
                .notifier
                .notify(Notice::error(e.user_message("Login failed. Please try again.")));
            return Err(e);
        }
    };

    let session = Session::new(response.token, response.role.clone(), username);
    if let Err(e) = portal.session.save(&session) {
        tracing::error!("could not persist session: {e}");
        portal
            .notifier
            .notify(Notice::error("Logged in, but the session could not be saved."));
    }

    tracing::info!(username, role = %response.role, "logged in");
    portal.notifier.notify(Notice::success("Login successful!"));

    Ok(if response.role.is_admin() {
        Route::Dashboard
    } else {
        Route::Home
    })
}

/// register
///
/// Validates (including the confirmation field) and creates the account.
/// Success sends the viewer to the login screen.
pub async fn register(portal: &Portal, form: RegisterForm) -> Result<Route, ApiError> {
    form.validate()?;
    let username = form.username.clone();

    match portal.api.register(&form.into_request()).await {
        Ok(()) => {
            tracing::info!(username, "account registered");
            portal
                .notifier
                .notify(Notice::success("Account created successfully!"));
            Ok(Route::Login)
        }
        Err(e) => {
            tracing::warn!(username, kind = %e.kind(), "registration failed: {e}");
            portal.notifier.notify(Notice::error(
                e.user_message("Registration failed. Please try again."),
            ));
            Err(e)
        }
    }
}

/// logout
///
/// Clears token, role and username together, then routes to login.
pub fn logout(portal: &Portal) -> Route {
    if let Err(e) = portal.session.clear() {
        tracing::error!("could not clear session: {e}");
        portal
            .notifier
            .notify(Notice::error("The session could not be cleared."));
    } else {
        tracing::info!("logged out");
    }
    Route::Login
}

/// redirect_for
///
/// Where a failed call sends the viewer: authorization failures (a 401 or no
/// token at all) go to the login screen, anything else stays put.
pub fn redirect_for(error: &ApiError) -> Option<Route> {
    error.requires_login().then_some(Route::Login)
}

// --- Reader Screens ---

/// ArticlePage
///
/// A single article plus up to three others from the same category.
#[derive(Debug, Clone, Default)]
pub struct ArticlePage {
    pub article: Option<Article>,
    pub recommended: Vec<Article>,
}

/// open_article
///
/// Loads one article (anonymous when no token is held) and its
/// recommendations. A failed fetch yields an empty page rather than an error.
pub async fn open_article(portal: &Portal, id: &str) -> ArticlePage {
    let token = portal.session.token();
    let article = match portal.api.get_article(token.as_deref(), id).await {
        Ok(article) => article,
        Err(e) => {
            tracing::warn!(id, kind = %e.kind(), "article fetch failed: {e}");
            return ArticlePage::default();
        }
    };

    let query = ListQuery::new(RECOMMENDATION_FETCH).with_category(article.category_id.clone());
    let recommended = match portal.api.list_articles(token.as_deref(), &query).await {
        Ok(page) => page
            .data
            .into_iter()
            .filter(|a| a.id != article.id)
            .take(RECOMMENDATION_SHOWN)
            .collect(),
        Err(e) => {
            tracing::warn!(id, kind = %e.kind(), "recommendation fetch failed: {e}");
            Vec::new()
        }
    };

    ArticlePage {
        article: Some(article),
        recommended,
    }
}

/// category_options
///
/// Categories for filter dropdowns and article forms. Failures are logged
/// and yield an empty list.
pub async fn category_options(portal: &Portal) -> Vec<Category> {
    let token = portal.session.token();
    let query = ListQuery::new(CATEGORY_OPTIONS_LIMIT);
    match portal.api.list_categories(token.as_deref(), &query).await {
        Ok(page) => page.data,
        Err(e) => {
            tracing::warn!(kind = %e.kind(), "category options fetch failed: {e}");
            Vec::new()
        }
    }
}

// --- Media ---

/// upload_image
///
/// Uploads a local file and returns the URL to store as `imageUrl`.
pub async fn upload_image(portal: &Portal, file: UploadFile) -> Result<String, ApiError> {
    let token = portal.session.token();
    let name = file.file_name.clone();
    match portal.api.upload(token.as_deref(), file).await {
        Ok(response) => {
            tracing::info!(file = %name, url = %response.url, "image uploaded");
            Ok(response.url)
        }
        Err(e) => {
            portal.notifier.notify(Notice::error(
                e.user_message("Failed to upload image. Please try again."),
            ));
            Err(e)
        }
    }
}
