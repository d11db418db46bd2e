//! HTTP client for the image management API.
//!
//! One `ApiClient` is shared (cloned) between the session manager and the
//! folder browser. Clones share the `x-auth-token` header value; only the
//! session manager sets or clears it.

mod error;
mod types;

use std::sync::{Arc, PoisonError, RwLock};

use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;

pub use error::{ApiError, ApiErrorKind, ApiResult};
pub(crate) use types::{NewFolder, TokenResponse};
pub use types::{
    Credentials, FolderContents, FolderSummary, ImageSummary, ROOT_FOLDER_ID, ROOT_FOLDER_NAME,
    User,
};

use crate::upload::{UploadFile, validate_upload};

/// Header carrying the session token on every request.
pub const AUTH_HEADER: &str = "x-auth-token";

/// User-Agent sent with every request.
pub const USER_AGENT: &str = concat!("imgdrive/", env!("CARGO_PKG_VERSION"));

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: url::Url,
    auth_token: Arc<RwLock<Option<String>>>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("authenticated", &self.has_auth_token())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Creates a client for the given base URL.
    ///
    /// # Errors
    /// Fails if `base_url` is not an absolute URL that can carry a path.
    pub fn new(base_url: &str) -> ApiResult<Self> {
        let base_url = url::Url::parse(base_url)
            .map_err(|e| ApiError::validation(format!("Invalid API base URL {base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::validation(format!(
                "Invalid API base URL: {base_url}"
            )));
        }

        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
            auth_token: Arc::new(RwLock::new(None)),
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// True when requests currently carry an auth header.
    pub fn has_auth_token(&self) -> bool {
        self.auth_token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Sets or clears the process-wide auth header.
    pub(crate) fn set_auth_token(&self, token: Option<&str>) {
        let mut guard = self
            .auth_token
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *guard = token.map(str::to_string);
        tracing::debug!(present = guard.is_some(), "auth header updated");
    }

    fn endpoint(&self, segments: &[&str]) -> url::Url {
        let mut url = self.base_url.clone();
        // cannot_be_a_base was rejected in new()
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, segments: &[&str]) -> RequestBuilder {
        let url = self.endpoint(segments);
        tracing::debug!(%method, path = url.path(), "api request");

        let builder = self
            .http
            .request(method, url)
            .header("user-agent", USER_AGENT)
            .header("accept", "application/json");

        let token = self
            .auth_token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match token {
            Some(token) => builder.header(AUTH_HEADER, token),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(builder: RequestBuilder) -> ApiResult<T> {
        let response = builder.send().await.map_err(|e| {
            tracing::warn!(error = %e, "api request failed");
            ApiError::from(e)
        })?;
        let response = Self::check_status(response).await?;
        response.json::<T>().await.map_err(ApiError::from)
    }

    async fn check_status(response: Response) -> ApiResult<Response> {
        let status = response.status();
        tracing::debug!(status = status.as_u16(), path = response.url().path(), "api response");
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let err = ApiError::http_status(status.as_u16(), &body);
        tracing::warn!(status = status.as_u16(), error = %err, "api error response");
        Err(err)
    }

    /// `GET /api/auth`: the profile of the token's owner.
    ///
    /// # Errors
    /// Transport, API or parse errors.
    pub async fn current_user(&self) -> ApiResult<User> {
        Self::send(self.request(Method::GET, &["api", "auth"])).await
    }

    /// `POST /api/auth/register`.
    pub(crate) async fn register(&self, credentials: &Credentials) -> ApiResult<TokenResponse> {
        Self::send(
            self.request(Method::POST, &["api", "auth", "register"])
                .json(credentials),
        )
        .await
    }

    /// `POST /api/auth/login`.
    pub(crate) async fn login(&self, credentials: &Credentials) -> ApiResult<TokenResponse> {
        Self::send(
            self.request(Method::POST, &["api", "auth", "login"])
                .json(credentials),
        )
        .await
    }

    /// `GET /api/folders/{id}`.
    ///
    /// # Errors
    /// Transport, API or parse errors.
    pub async fn folder_contents(&self, folder_id: &str) -> ApiResult<FolderContents> {
        Self::send(self.request(Method::GET, &["api", "folders", folder_id])).await
    }

    /// `POST /api/folders`. A `parent_id` of root is sent as `null`.
    ///
    /// # Errors
    /// `Validation` for a blank name; otherwise transport, API or parse errors.
    pub async fn create_folder(&self, name: &str, parent_id: &str) -> ApiResult<FolderSummary> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ApiError::validation("Folder name is required."));
        }
        let body = NewFolder {
            name,
            parent_folder: (parent_id != ROOT_FOLDER_ID).then_some(parent_id),
        };
        Self::send(self.request(Method::POST, &["api", "folders"]).json(&body)).await
    }

    /// `GET /api/images/search?q=`, scoped to all of the user's images.
    ///
    /// # Errors
    /// Transport, API or parse errors.
    pub async fn search_images(&self, query: &str) -> ApiResult<Vec<ImageSummary>> {
        Self::send(
            self.request(Method::GET, &["api", "images", "search"])
                .query(&[("q", query)]),
        )
        .await
    }

    /// `POST /api/images/upload` as multipart (`name`, `image`, `folderId`).
    ///
    /// The local checks in [`validate_upload`] run first; a rejected upload
    /// never reaches the network.
    ///
    /// # Errors
    /// `Precondition`/`Validation` from the local checks; otherwise transport,
    /// API or parse errors.
    pub async fn upload_image(
        &self,
        name: &str,
        file: &UploadFile,
        folder_id: &str,
    ) -> ApiResult<ImageSummary> {
        validate_upload(name, file, folder_id)?;

        let mut part =
            reqwest::multipart::Part::bytes(file.bytes.clone()).file_name(file.file_name.clone());
        if let Some(mime) = file.mime_type() {
            part = part.mime_str(mime)?;
        }

        let form = reqwest::multipart::Form::new()
            .text("name", name.trim().to_string())
            .part("image", part)
            .text("folderId", folder_id.to_string());

        Self::send(
            self.request(Method::POST, &["api", "images", "upload"])
                .multipart(form),
        )
        .await
    }
}
