use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode, header, multipart};
use serde::{Serialize, de::DeserializeOwned};
use tracing::Instrument;
use uuid::Uuid;

use crate::{
    config::AppConfig,
    error::ApiError,
    models::{
        Article, ArticlePatch, Category, CategoryPatch, ErrorBody, ListEnvelope, ListQuery,
        ListResult, LoginRequest, LoginResponse, NewArticle, NewCategory, RegisterRequest,
        UploadResponse,
    },
    storage::UploadFile,
};

/// CmsApi
///
/// The single data-access contract over the remote CMS service. Screens and
/// controllers only talk to this trait, so list/create/update/delete logic is
/// written once against it and tested against in-memory implementations.
///
/// `token` is the bearer token from the current session. Listing and reading
/// articles or categories accept `None` (anonymous browsing); every write
/// fails with [`ApiError::MissingToken`] without one.
#[async_trait]
pub trait CmsApi: Send + Sync {
    // --- Identity ---
    async fn login(&self, req: &LoginRequest) -> Result<LoginResponse, ApiError>;
    // Succeeds only on 201 Created.
    async fn register(&self, req: &RegisterRequest) -> Result<(), ApiError>;

    // --- Categories ---
    async fn list_categories(
        &self,
        token: Option<&str>,
        query: &ListQuery,
    ) -> Result<ListResult<Category>, ApiError>;
    async fn create_category(&self, token: Option<&str>, new: &NewCategory) -> Result<Category, ApiError>;
    async fn update_category(
        &self,
        token: Option<&str>,
        id: &str,
        patch: &CategoryPatch,
    ) -> Result<Category, ApiError>;
    async fn delete_category(&self, token: Option<&str>, id: &str) -> Result<(), ApiError>;

    // --- Articles ---
    async fn list_articles(
        &self,
        token: Option<&str>,
        query: &ListQuery,
    ) -> Result<ListResult<Article>, ApiError>;
    async fn get_article(&self, token: Option<&str>, id: &str) -> Result<Article, ApiError>;
    async fn create_article(&self, token: Option<&str>, new: &NewArticle) -> Result<Article, ApiError>;
    async fn update_article(
        &self,
        token: Option<&str>,
        id: &str,
        patch: &ArticlePatch,
    ) -> Result<Article, ApiError>;
    async fn delete_article(&self, token: Option<&str>, id: &str) -> Result<(), ApiError>;

    // --- Media ---
    async fn upload(&self, token: Option<&str>, file: UploadFile) -> Result<UploadResponse, ApiError>;
}

/// Shared handle used across the client.
pub type ApiState = Arc<dyn CmsApi>;

/// HttpCmsApi
///
/// `CmsApi` over HTTPS with reqwest. Each request carries a fresh
/// `x-request-id` and runs inside an `http_request` span so every log line of
/// one call can be correlated.
#[derive(Clone)]
pub struct HttpCmsApi {
    client: Client,
    base_url: String,
}

impl HttpCmsApi {
    /// Builds the client from configuration (base URL and optional timeout).
    pub fn new(config: &AppConfig) -> Result<Self, ApiError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.http_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(ApiError::Network)?;
        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// execute
    ///
    /// Sends one request and classifies the outcome. Returns the raw body of a
    /// 2xx answer together with its status.
    async fn execute(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        build: impl FnOnce(RequestBuilder) -> RequestBuilder + Send,
    ) -> Result<(StatusCode, Vec<u8>), ApiError> {
        let url = self.url(path);
        let req_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "http_request",
            method = %method,
            uri = %url,
            req_id = %req_id,
        );

        async move {
            let mut request = self
                .client
                .request(method, &url)
                .header("x-request-id", req_id.to_string());
            if let Some(token) = token {
                request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
            }
            let request = build(request);

            let response = request.send().await.map_err(|e| {
                tracing::warn!("no response: {e}");
                ApiError::Network(e)
            })?;
            let status = response.status();
            let body = response.bytes().await.map_err(ApiError::Network)?;
            tracing::debug!(status = status.as_u16(), bytes = body.len(), "response received");

            if status == StatusCode::UNAUTHORIZED {
                return Err(ApiError::Unauthorized);
            }
            if !status.is_success() {
                let message = serde_json::from_slice::<ErrorBody>(&body)
                    .ok()
                    .and_then(ErrorBody::into_message);
                return Err(ApiError::Server {
                    status: status.as_u16(),
                    message,
                });
            }
            Ok((status, body.to_vec()))
        }
        .instrument(span)
        .await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        token: Option<&str>,
        params: Vec<(&'static str, String)>,
    ) -> Result<T, ApiError> {
        let (_, body) = self
            .execute(Method::GET, path, token, move |req| req.query(&params))
            .await?;
        decode(path, &body)
    }

    async fn send_json<B, T>(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        payload: &B,
    ) -> Result<T, ApiError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let (_, body) = self
            .execute(method, path, token, |req| req.json(payload))
            .await?;
        decode(path, &body)
    }

    async fn list<T: DeserializeOwned>(
        &self,
        path: &str,
        token: Option<&str>,
        query: &ListQuery,
        params: Vec<(&'static str, String)>,
    ) -> Result<ListResult<T>, ApiError> {
        let envelope: ListEnvelope<T> = self.get_json(path, token, params).await?;
        Ok(envelope.into_result(query.limit))
    }
}

/// Writes need a token; reads go out anonymously without one.
fn require(token: Option<&str>) -> Result<&str, ApiError> {
    token.filter(|t| !t.is_empty()).ok_or(ApiError::MissingToken)
}

/// decode
///
/// The schema boundary: a body that does not match `T` becomes a typed
/// `Decode` error instead of leaking half-populated values upward.
fn decode<T: DeserializeOwned>(endpoint: &str, body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|source| {
        tracing::error!(endpoint, "response failed to decode: {source}");
        ApiError::Decode {
            endpoint: endpoint.to_string(),
            source,
        }
    })
}

#[async_trait]
impl CmsApi for HttpCmsApi {
    async fn login(&self, req: &LoginRequest) -> Result<LoginResponse, ApiError> {
        self.send_json(Method::POST, "/auth/login", None, req).await
    }

    async fn register(&self, req: &RegisterRequest) -> Result<(), ApiError> {
        let (status, _) = self
            .execute(Method::POST, "/auth/register", None, |r| r.json(req))
            .await?;
        if status == StatusCode::CREATED {
            Ok(())
        } else {
            Err(ApiError::Server {
                status: status.as_u16(),
                message: None,
            })
        }
    }

    async fn list_categories(
        &self,
        token: Option<&str>,
        query: &ListQuery,
    ) -> Result<ListResult<Category>, ApiError> {
        self.list("/categories", token, query, query.page_params()).await
    }

    async fn create_category(&self, token: Option<&str>, new: &NewCategory) -> Result<Category, ApiError> {
        let token = require(token)?;
        self.send_json(Method::POST, "/categories", Some(token), new).await
    }

    async fn update_category(
        &self,
        token: Option<&str>,
        id: &str,
        patch: &CategoryPatch,
    ) -> Result<Category, ApiError> {
        let token = require(token)?;
        self.send_json(Method::PUT, &format!("/categories/{id}"), Some(token), patch)
            .await
    }

    async fn delete_category(&self, token: Option<&str>, id: &str) -> Result<(), ApiError> {
        let token = require(token)?;
        self.execute(Method::DELETE, &format!("/categories/{id}"), Some(token), |r| r)
            .await?;
        Ok(())
    }

    async fn list_articles(
        &self,
        token: Option<&str>,
        query: &ListQuery,
    ) -> Result<ListResult<Article>, ApiError> {
        self.list("/articles", token, query, query.article_params()).await
    }

    async fn get_article(&self, token: Option<&str>, id: &str) -> Result<Article, ApiError> {
        self.get_json(&format!("/articles/{id}"), token, Vec::new()).await
    }

    async fn create_article(&self, token: Option<&str>, new: &NewArticle) -> Result<Article, ApiError> {
        let token = require(token)?;
        self.send_json(Method::POST, "/articles", Some(token), new).await
    }

    async fn update_article(
        &self,
        token: Option<&str>,
        id: &str,
        patch: &ArticlePatch,
    ) -> Result<Article, ApiError> {
        let token = require(token)?;
        self.send_json(Method::PUT, &format!("/articles/{id}"), Some(token), patch)
            .await
    }

    async fn delete_article(&self, token: Option<&str>, id: &str) -> Result<(), ApiError> {
        let token = require(token)?;
        self.execute(Method::DELETE, &format!("/articles/{id}"), Some(token), |r| r)
            .await?;
        Ok(())
    }

    async fn upload(&self, token: Option<&str>, file: UploadFile) -> Result<UploadResponse, ApiError> {
        let token = require(token)?;
        let part = multipart::Part::bytes(file.bytes)
            .file_name(file.file_name)
            .mime_str(&file.content_type)
            .map_err(ApiError::Network)?;
        let form = multipart::Form::new().part("file", part);
        let (_, body) = self
            .execute(Method::POST, "/upload", Some(token), move |r| r.multipart(form))
            .await?;
        decode("/upload", &body)
    }
}
