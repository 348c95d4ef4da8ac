//! Plain-text rendering for the terminal front end.

use std::fmt::Write;

use crate::{
    controller::ListSnapshot,
    models::{Article, Category},
    screens::ArticlePage,
    validation::ValidationErrors,
};

const TITLE_WIDTH: usize = 48;
const DATE_FORMAT: &str = "%B %-d, %Y %H:%M:%S";

pub const LOADING: &str = "Loading...";

fn clip(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let mut clipped: String = text.chars().take(width.saturating_sub(3)).collect();
        clipped.push_str("...");
        clipped
    }
}

pub fn article_table(snapshot: &ListSnapshot<Article>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Total Articles : {}", snapshot.total_data);
    let _ = writeln!(
        out,
        "{:<38} {:<w$} {:<18} {}",
        "ID",
        "Title",
        "Category",
        "Created at",
        w = TITLE_WIDTH
    );
    for article in &snapshot.items {
        let _ = writeln!(
            out,
            "{:<38} {:<w$} {:<18} {}",
            article.id,
            clip(&article.title, TITLE_WIDTH),
            clip(article.category_name(), 18),
            article.created_at.format(DATE_FORMAT),
            w = TITLE_WIDTH
        );
    }
    if snapshot.items.is_empty() {
        let _ = writeln!(out, "(no articles)");
    }
    let _ = write!(out, "{}", snapshot.pager());
    out
}

pub fn category_table(snapshot: &ListSnapshot<Category>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Total Categories : {}", snapshot.total_data);
    let _ = writeln!(out, "{:<38} {:<32} {}", "ID", "Category", "Created at");
    for category in &snapshot.items {
        let _ = writeln!(
            out,
            "{:<38} {:<32} {}",
            category.id,
            clip(&category.name, 32),
            category.created_at.format(DATE_FORMAT)
        );
    }
    if snapshot.items.is_empty() {
        let _ = writeln!(out, "(no categories)");
    }
    let _ = write!(out, "{}", snapshot.pager());
    out
}

pub fn category_options(categories: &[Category]) -> String {
    categories
        .iter()
        .map(|c| format!("  {}  {}", c.id, c.name))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn article_page(page: &ArticlePage) -> String {
    let Some(article) = &page.article else {
        return "Article not found.".to_string();
    };

    let mut out = String::new();
    let author = article.user.as_ref().map(|u| u.username.as_str()).unwrap_or("unknown");
    let _ = writeln!(
        out,
        "{} · Created by {}",
        article.created_at.format("%B %-d, %Y"),
        author
    );
    let _ = writeln!(out, "{}", article.title);
    let _ = writeln!(out, "[{}]", article.category_name());
    if !article.image_url.is_empty() {
        let _ = writeln!(out, "Image: {}", article.image_url);
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", article.content);

    if !page.recommended.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Other articles");
        for other in &page.recommended {
            let _ = writeln!(out, "  {}  {}", other.id, clip(&other.title, TITLE_WIDTH));
        }
    }
    out
}

pub fn field_errors(errors: &ValidationErrors) -> String {
    errors
        .iter()
        .map(|(field, message)| format!("  {field}: {message}"))
        .collect::<Vec<_>>()
        .join("\n")
}
