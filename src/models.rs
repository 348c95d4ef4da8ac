use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

// --- Session ---

/// Role
///
/// Role returned by `/auth/login` and persisted with the session. Anything
/// the remote sends besides `Admin` and `User` is kept verbatim and treated as
/// a non-admin role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    Admin,
    User,
    Other(String),
}

impl Role {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "Admin" => Role::Admin,
            "User" => Role::User,
            other => Role::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Role::Admin => "Admin",
            Role::User => "User",
            Role::Other(raw) => raw,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Role {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Role::parse(&raw))
    }
}

/// Session
///
/// The viewer's identity as stored on disk. Created on login, read on every
/// protected navigation, cleared on logout. `token` and `role` travel
/// together: the session store refuses to persist one without the other.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: Option<String>,
    pub role: Option<Role>,
    #[serde(default)]
    pub username: String,
}

impl Session {
    pub fn new(token: impl Into<String>, role: Role, username: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            role: Some(role),
            username: username.into(),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some() && self.role.is_some()
    }
}

// --- Remote Entities ---

/// Category
///
/// Created, edited and deleted only by an Admin. Referenced by
/// `Article::category_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Author projection embedded in an article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleAuthor {
    pub id: String,
    pub username: String,
}

/// Article
///
/// `category` and `user` are read projections denormalised by the server.
/// They are never sent back and may be missing from write responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    pub category_id: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub image_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub user: Option<ArticleAuthor>,
}

impl Article {
    pub fn category_name(&self) -> &str {
        self.category.as_ref().map(|c| c.name.as_str()).unwrap_or("-")
    }
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

// --- Listing ---

/// ListQuery
///
/// Filter and pagination state driving a list fetch. Empty filters are sent
/// as empty strings; the remote tolerates them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub page: u32,
    pub limit: u32,
    pub category_id: Option<String>,
    pub title: Option<String>,
}

impl ListQuery {
    pub fn new(limit: u32) -> Self {
        Self {
            page: 1,
            limit: limit.max(1),
            category_id: None,
            title: None,
        }
    }

    /// Replaces the page, normalising 0 to the first page.
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    pub fn with_category(mut self, category_id: impl Into<String>) -> Self {
        self.category_id = Some(category_id.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Query pairs for the categories endpoint.
    pub fn page_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("page", self.page.max(1).to_string()),
            ("limit", self.limit.to_string()),
        ]
    }

    /// Query pairs for the articles endpoint. Filters are always present.
    pub fn article_params(&self) -> Vec<(&'static str, String)> {
        let mut params = self.page_params();
        params.push(("category", self.category_id.clone().unwrap_or_default()));
        params.push(("title", self.title.clone().unwrap_or_default()));
        params
    }
}

/// ListResult
///
/// One page of a remote collection plus the numbers the pager needs.
#[derive(Debug, Clone, PartialEq)]
pub struct ListResult<T> {
    pub data: Vec<T>,
    pub total_pages: u32,
    pub total_data: u64,
}

impl<T> Default for ListResult<T> {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            total_pages: 0,
            total_data: 0,
        }
    }
}

/// ListEnvelope
///
/// Wire shape of a list response. `data` is mandatory; the totals are
/// tolerated under either naming the service uses and derived when absent.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListEnvelope<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub total_pages: Option<u32>,
    #[serde(default, alias = "total")]
    pub total_data: Option<u64>,
}

impl<T> ListEnvelope<T> {
    pub fn into_result(self, limit: u32) -> ListResult<T> {
        let total_data = self.total_data.unwrap_or(self.data.len() as u64);
        let total_pages = self.total_pages.unwrap_or_else(|| {
            let limit = u64::from(limit.max(1));
            u32::try_from(total_data.div_ceil(limit).max(1)).unwrap_or(u32::MAX)
        });
        ListResult {
            data: self.data,
            total_pages,
            total_data,
        }
    }
}

// --- Request Payloads ---

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NewCategory {
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CategoryPatch {
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewArticle {
    pub title: String,
    pub content: String,
    pub category_id: String,
    pub image_url: String,
}

/// Update payload for `PUT /articles/{id}`. The remote does not accept
/// content changes on update.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ArticlePatch {
    pub title: String,
    pub category_id: String,
    pub image_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub role: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub url: String,
}

/// Body shape of a failed request. Either field may carry the message.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorBody {
    pub fn into_message(self) -> Option<String> {
        self.message
            .filter(|m| !m.trim().is_empty())
            .or(self.error.filter(|m| !m.trim().is_empty()))
    }
}
