//! Wire types for the image management API.

use serde::{Deserialize, Serialize};

/// Id of the synthetic top-level folder.
pub const ROOT_FOLDER_ID: &str = "root";
/// Display name of the synthetic top-level folder.
pub const ROOT_FOLDER_NAME: &str = "My Drive";

/// The authenticated user's profile, as returned by `GET /api/auth`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub username: String,
}

/// Username/password pair sent to the login and register endpoints.
#[derive(Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

// Hand-written so passwords never end up in logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Response of the login and register endpoints.
///
/// Only the token is used; the profile is always re-fetched.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TokenResponse {
    #[serde(default, alias = "jwt")]
    pub token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderSummary {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSummary {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub name: String,
    #[serde(rename = "imageUrl", default)]
    pub image_url: String,
}

/// Sub-folders and images of one folder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderContents {
    #[serde(rename = "subFolders", default)]
    pub sub_folders: Vec<FolderSummary>,
    #[serde(default)]
    pub images: Vec<ImageSummary>,
}

impl FolderContents {
    pub fn is_empty(&self) -> bool {
        self.sub_folders.is_empty() && self.images.is_empty()
    }
}

/// Body of `POST /api/folders`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct NewFolder<'a> {
    pub name: &'a str,
    #[serde(rename = "parentFolder")]
    pub parent_folder: Option<&'a str>,
}
