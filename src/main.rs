use std::{
    io::BufRead,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use article_portal::{
    AppConfig, Env, ListController, Portal,
    api::CmsApi,
    controller::{Articles, LoadOutcome},
    debounce::debounce,
    error::ApiError,
    models::{ArticlePatch, CategoryPatch, NewArticle, NewCategory},
    routes::{GateState, Route},
    screens,
    session::SessionStore,
    storage::UploadFile,
    validation::RegisterForm,
    view,
};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "portal")]
#[command(about = "Article portal: browse articles and manage the CMS from the terminal", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and store the session
    Login {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },
    /// Create an account
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        confirm_password: String,
        /// "User" or "Admin"
        #[arg(long)]
        role: String,
    },
    /// Forget the stored session
    Logout,
    /// Show the stored session
    Whoami,
    /// Article list for viewers
    Home(ListArgs),
    /// Live title search: every stdin line is the search box's new content
    Search {
        #[arg(long)]
        category: Option<String>,
    },
    /// Read one article with recommendations
    Article { id: String },
    /// Categories available as filters
    Categories,
    /// Upload an image and print its URL
    Upload { path: PathBuf },
    /// Admin dashboard
    Dashboard {
        #[command(subcommand)]
        action: DashboardAction,
    },
}

#[derive(Args)]
struct ListArgs {
    #[arg(long, default_value_t = 1)]
    page: u32,
    #[arg(long)]
    category: Option<String>,
    #[arg(long)]
    title: Option<String>,
}

#[derive(Subcommand)]
enum DashboardAction {
    /// List articles
    Articles(ListArgs),
    /// Add an article
    ArticleCreate {
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: String,
        #[arg(long)]
        category: String,
        /// Local image to upload as the thumbnail
        #[arg(long)]
        image: Option<PathBuf>,
    },
    /// Edit an article; unspecified fields keep their current value
    ArticleUpdate {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        image: Option<PathBuf>,
    },
    /// Delete an article
    ArticleDelete { id: String },
    /// List categories
    Categories {
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Add a category
    CategoryCreate {
        #[arg(long)]
        name: String,
    },
    /// Rename a category
    CategoryUpdate {
        id: String,
        #[arg(long)]
        name: String,
    },
    /// Delete a category
    CategoryDelete { id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1. Configuration (fail-fast on missing production settings).
    let config = AppConfig::load();

    // 2. Logging. RUST_LOG wins; stdout stays reserved for screen output.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "article_portal=warn,reqwest=warn".into());
    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
    }
    tracing::debug!("portal starting in {:?} mode against {}", config.env, config.api_base_url);

    // 3. Services.
    let portal = Portal::from_config(config).context("failed to build the HTTP client")?;

    match cli.command {
        Commands::Login { username, password } => {
            if let Some(next) = settle(screens::login(&portal, &username, &password).await) {
                println!("Redirecting to {next}");
            }
        }
        Commands::Register {
            username,
            password,
            confirm_password,
            role,
        } => {
            let form = RegisterForm {
                username,
                password,
                confirm_password,
                role,
            };
            if let Some(next) = settle(screens::register(&portal, form).await) {
                println!("Redirecting to {next}");
            }
        }
        Commands::Logout => {
            let next = screens::logout(&portal);
            println!("Redirecting to {next}");
        }
        Commands::Whoami => {
            let session = portal.session.load();
            match (&session.role, session.is_authenticated()) {
                (Some(role), true) => println!("{} ({role})", session.username),
                _ => println!("not logged in"),
            }
        }
        Commands::Home(args) => {
            if admitted(&portal, Route::Home) {
                let articles = portal.articles();
                if apply_list_args(&articles, args).await {
                    println!("{}", view::article_table(&articles.snapshot()));
                }
            }
        }
        Commands::Search { category } => {
            if admitted(&portal, Route::Home) {
                search(&portal, category).await?;
            }
        }
        Commands::Article { id } => {
            let page = screens::open_article(&portal, &id).await;
            println!("{}", view::article_page(&page));
        }
        Commands::Categories => {
            let options = screens::category_options(&portal).await;
            println!("{}", view::category_options(&options));
        }
        Commands::Upload { path } => {
            let file = UploadFile::from_path(&path)
                .await
                .with_context(|| format!("cannot read {}", path.display()))?;
            if let Some(url) = settle(screens::upload_image(&portal, file).await) {
                println!("{url}");
            }
        }
        Commands::Dashboard { action } => {
            let route = match action {
                DashboardAction::Categories { .. }
                | DashboardAction::CategoryCreate { .. }
                | DashboardAction::CategoryUpdate { .. }
                | DashboardAction::CategoryDelete { .. } => Route::DashboardCategories,
                _ => Route::Dashboard,
            };
            if admitted(&portal, route) {
                dashboard(&portal, action).await?;
            }
        }
    }

    Ok(())
}

/// Runs the access gate for a protected screen and prints where it sends the
/// viewer when not admitted.
fn admitted(portal: &Portal, route: Route) -> bool {
    let mut gate = portal.gate();
    println!("{}", view::LOADING);
    match gate.check(&route.path(), 0) {
        GateState::Admitted => true,
        GateState::Redirecting(next) => {
            println!("Redirecting to {next}");
            false
        }
        GateState::Pending => false,
    }
}

/// Turns a screen result into an optional value, printing field errors and
/// the login redirect. Remote failures were already reported as notices.
fn settle<T>(result: Result<T, ApiError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(ApiError::Validation(errors)) => {
            eprintln!("{}", view::field_errors(&errors));
            None
        }
        Err(e) => {
            if let Some(next) = screens::redirect_for(&e) {
                println!("Redirecting to {next}");
            }
            None
        }
    }
}

/// Settles a list load. False when the viewer was sent to login; other
/// failures keep the previous list on screen.
fn loaded(result: Result<LoadOutcome, ApiError>) -> bool {
    match result {
        Ok(_) => true,
        Err(e) => match screens::redirect_for(&e) {
            Some(next) => {
                println!("Redirecting to {next}");
                false
            }
            None => true,
        },
    }
}

async fn apply_list_args(articles: &ListController<Articles>, args: ListArgs) -> bool {
    loaded(articles.set_query(args.page, args.category, args.title).await)
}

async fn search(portal: &Portal, category: Option<String>) -> Result<()> {
    let articles = portal.articles();
    if !loaded(articles.set_category(category).await) {
        return Ok(());
    }
    println!("{}", view::article_table(&articles.snapshot()));

    let (input, committed, _debouncer) = debounce::<String>(portal.config.search_debounce);
    let binding = articles.bind_search(committed);

    let lines = tokio::task::spawn_blocking(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if !input.push(line.trim().to_string()) {
                break;
            }
        }
    });
    lines.await.context("stdin reader failed")?;

    // End of input flushes the last pending value; the binding finishes once
    // it has been applied.
    binding.await.context("search binding failed")?;
    println!("{}", view::article_table(&articles.snapshot()));
    Ok(())
}

async fn dashboard(portal: &Portal, action: DashboardAction) -> Result<()> {
    match action {
        DashboardAction::Articles(args) => {
            let articles = portal.articles();
            if apply_list_args(&articles, args).await {
                println!("{}", view::article_table(&articles.snapshot()));
            }
        }
        DashboardAction::ArticleCreate {
            title,
            content,
            category,
            image,
        } => {
            let image_url = match image {
                Some(path) => match upload(portal, &path).await? {
                    Some(url) => url,
                    None => return Ok(()),
                },
                None => String::new(),
            };
            let articles = portal.articles();
            articles.open_create_form();
            let new = NewArticle {
                title,
                content,
                category_id: category,
                image_url,
            };
            if settle(articles.create(&new).await).is_some() {
                println!("{}", view::article_table(&articles.snapshot()));
            }
        }
        DashboardAction::ArticleUpdate {
            id,
            title,
            category,
            image,
        } => {
            let token = portal.session.token();
            let Some(current) = settle(portal.api.get_article(token.as_deref(), &id).await) else {
                println!("Article not found.");
                return Ok(());
            };
            let image_url = match image {
                Some(path) => match upload(portal, &path).await? {
                    Some(url) => url,
                    None => return Ok(()),
                },
                None => current.image_url.clone(),
            };
            let patch = ArticlePatch {
                title: title.unwrap_or_else(|| current.title.clone()),
                category_id: category.unwrap_or_else(|| current.category_id.clone()),
                image_url,
            };
            let articles = portal.articles();
            if !loaded(articles.load().await) {
                return Ok(());
            }
            if settle(articles.update(&id, &patch).await).is_some() {
                println!("{}", view::article_table(&articles.snapshot()));
            }
        }
        DashboardAction::ArticleDelete { id } => {
            let articles = portal.articles();
            if !loaded(articles.load().await) {
                return Ok(());
            }
            if settle(articles.delete(&id).await).is_some() {
                println!("{}", view::article_table(&articles.snapshot()));
            }
        }
        DashboardAction::Categories { page } => {
            let categories = portal.categories();
            if loaded(categories.set_page(page).await) {
                println!("{}", view::category_table(&categories.snapshot()));
            }
        }
        DashboardAction::CategoryCreate { name } => {
            let categories = portal.categories();
            categories.open_create_form();
            if settle(categories.create(&NewCategory { name }).await).is_some() {
                println!("{}", view::category_table(&categories.snapshot()));
            }
        }
        DashboardAction::CategoryUpdate { id, name } => {
            let categories = portal.categories();
            if !loaded(categories.load().await) {
                return Ok(());
            }
            if settle(categories.update(&id, &CategoryPatch { name }).await).is_some() {
                println!("{}", view::category_table(&categories.snapshot()));
            }
        }
        DashboardAction::CategoryDelete { id } => {
            let categories = portal.categories();
            if !loaded(categories.load().await) {
                return Ok(());
            }
            if settle(categories.delete(&id).await).is_some() {
                println!("{}", view::category_table(&categories.snapshot()));
            }
        }
    }
    Ok(())
}

async fn upload(portal: &Portal, path: &Path) -> Result<Option<String>> {
    let file = UploadFile::from_path(path)
        .await
        .with_context(|| format!("cannot read {}", path.display()))?;
    if !file.is_image() {
        eprintln!("  image: {} is not an image file", file.file_name);
        return Ok(None);
    }
    Ok(settle(screens::upload_image(portal, file).await))
}
