//! Folder browser view model.
//!
//! `FolderBrowserModel` runs the requests `BrowserState` asks for against the
//! API and feeds the responses back. Front ends that interleave user input
//! with in-flight requests can drive `BrowserState` directly.

mod path;
mod state;

pub use path::{FolderPath, FolderPathEntry};
pub use state::{BrowserState, Completion, DisplaySet, FetchRequest, SearchRequest, SearchStart};

use crate::api::{ApiClient, ApiResult, FolderSummary, ImageSummary};
use crate::upload::UploadFile;

#[derive(Debug)]
pub struct FolderBrowserModel {
    api: ApiClient,
    state: BrowserState,
}

impl FolderBrowserModel {
    /// Creates a browser at the root. Nothing is fetched until `open_root`.
    ///
    /// `api` should be a clone of the session's client so requests carry its
    /// auth header.
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            state: BrowserState::new(),
        }
    }

    pub fn state(&self) -> &BrowserState {
        &self.state
    }

    pub fn display(&self) -> DisplaySet<'_> {
        self.state.display()
    }

    pub fn path(&self) -> &FolderPath {
        self.state.path()
    }

    pub fn current_folder(&self) -> &FolderPathEntry {
        self.state.current_folder()
    }

    pub fn is_root(&self) -> bool {
        self.state.is_root()
    }

    pub fn loading(&self) -> bool {
        self.state.loading()
    }

    /// # Errors
    /// The fetch error; prior contents are kept.
    pub async fn open_root(&mut self) -> ApiResult<()> {
        let request = self.state.open_root();
        self.run_fetch(request).await
    }

    /// # Errors
    /// The fetch error; prior contents are kept.
    pub async fn fetch_contents(&mut self, folder_id: &str) -> ApiResult<()> {
        let request = self.state.fetch_folder(folder_id);
        self.run_fetch(request).await
    }

    /// Re-fetches the open folder, e.g. after a create or upload.
    ///
    /// # Errors
    /// The fetch error; prior contents are kept.
    pub async fn refresh(&mut self) -> ApiResult<()> {
        let request = self.state.refresh();
        self.run_fetch(request).await
    }

    /// # Errors
    /// The fetch error; the path still includes `folder`.
    pub async fn navigate_into(&mut self, folder: FolderSummary) -> ApiResult<()> {
        let request = self.state.navigate_into(folder);
        self.run_fetch(request).await
    }

    /// # Errors
    /// The fetch error; the path is already truncated.
    ///
    /// # Panics
    /// If `index` is outside the current path.
    pub async fn navigate_to_breadcrumb(&mut self, index: usize) -> ApiResult<()> {
        let request = self.state.navigate_to_breadcrumb(index);
        self.run_fetch(request).await
    }

    /// Moves to the parent folder. Returns false at root.
    ///
    /// # Errors
    /// The fetch error.
    pub async fn navigate_up(&mut self) -> ApiResult<bool> {
        match self.state.navigate_up() {
            Some(request) => self.run_fetch(request).await.map(|()| true),
            None => Ok(false),
        }
    }

    /// Searches all images by name. A blank query clears search mode.
    ///
    /// # Errors
    /// The search (or re-fetch) error. A failed search leaves an empty
    /// result set on display.
    pub async fn search(&mut self, query: &str) -> ApiResult<()> {
        match self.state.start_search(query) {
            SearchStart::Search(request) => {
                let result = self.api.search_images(&request.query).await;
                if let Ok(images) = &result {
                    tracing::debug!(query = %request.query, hits = images.len(), "search finished");
                }
                self.state.finish_search(&request, result).map(drop)
            }
            SearchStart::Browse(request) => self.run_fetch(request).await,
        }
    }

    /// # Errors
    /// The re-fetch error.
    pub async fn clear_search(&mut self) -> ApiResult<()> {
        let request = self.state.clear_search();
        self.run_fetch(request).await
    }

    /// Creates a folder. Local state is untouched; call `refresh` to see it.
    ///
    /// # Errors
    /// `Validation` for a blank name, otherwise the request error.
    pub async fn create_folder(&self, name: &str, parent_id: &str) -> ApiResult<FolderSummary> {
        let folder = self.api.create_folder(name, parent_id).await?;
        tracing::info!(folder = %folder.id, parent = parent_id, "folder created");
        Ok(folder)
    }

    /// Uploads an image. Local state is untouched; call `refresh` to see it.
    ///
    /// # Errors
    /// `Precondition` for the root folder, `Validation` for an oversized file
    /// or blank name (both before any request), otherwise the request error.
    pub async fn upload_image(
        &self,
        name: &str,
        file: &UploadFile,
        folder_id: &str,
    ) -> ApiResult<ImageSummary> {
        let image = self.api.upload_image(name, file, folder_id).await?;
        tracing::info!(image = %image.id, folder = folder_id, bytes = file.len(), "image uploaded");
        Ok(image)
    }

    async fn run_fetch(&mut self, request: FetchRequest) -> ApiResult<()> {
        let result = self.api.folder_contents(&request.folder_id).await;
        self.state.finish_fetch(&request, result).map(drop)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{method, path, path_regex, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::api::{ApiErrorKind, ROOT_FOLDER_ID};
    use crate::upload::MAX_UPLOAD_BYTES;

    fn folders_body(folders: &[(&str, &str)], images: &[&str]) -> serde_json::Value {
        json!({
            "subFolders": folders.iter().map(|(id, name)| json!({"_id": id, "name": name})).collect::<Vec<_>>(),
            "images": images.iter().map(|id| json!({"_id": id, "name": id, "imageUrl": format!("https://cdn/{id}")})).collect::<Vec<_>>(),
        })
    }

    async fn mount_folder(
        server: &MockServer,
        id: &str,
        folders: &[(&str, &str)],
        images: &[&str],
        times: u64,
    ) {
        Mock::given(method("GET"))
            .and(path(format!("/api/folders/{id}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(folders_body(folders, images)))
            .expect(times)
            .mount(server)
            .await;
    }

    async fn forbid_search(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/api/images/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(0)
            .mount(server)
            .await;
    }

    fn model(server: &MockServer) -> FolderBrowserModel {
        FolderBrowserModel::new(ApiClient::new(&server.uri()).unwrap())
    }

    fn summary(id: &str, name: &str) -> FolderSummary {
        FolderSummary {
            id: id.to_string(),
            name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn test_open_root_loads_root_contents() {
        let server = MockServer::start().await;
        mount_folder(&server, ROOT_FOLDER_ID, &[("a", "A")], &["r1"], 1).await;

        let mut browser = model(&server);
        browser.open_root().await.unwrap();
        assert!(!browser.loading());
        assert_eq!(browser.display().sub_folders.len(), 1);
        assert_eq!(browser.display().images[0].id, "r1");
    }

    #[tokio::test]
    async fn test_breadcrumb_fetches_target_exactly_once() {
        let server = MockServer::start().await;
        mount_folder(&server, ROOT_FOLDER_ID, &[("a", "A")], &[], 1).await;
        mount_folder(&server, "a", &[("b", "B")], &[], 2).await;
        mount_folder(&server, "b", &[], &["b1"], 1).await;

        let mut browser = model(&server);
        browser.open_root().await.unwrap();
        browser.navigate_into(summary("a", "A")).await.unwrap();
        browser.navigate_into(summary("b", "B")).await.unwrap();
        assert_eq!(browser.path().len(), 3);

        // second fetch of "a" comes from the breadcrumb
        browser.navigate_to_breadcrumb(1).await.unwrap();
        let ids: Vec<&str> = browser.path().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec![ROOT_FOLDER_ID, "a"]);
        assert_eq!(browser.display().sub_folders[0].id, "b");
    }

    #[tokio::test]
    async fn test_fetch_failure_keeps_contents() {
        let server = MockServer::start().await;
        mount_folder(&server, ROOT_FOLDER_ID, &[("a", "A")], &[], 1).await;
        Mock::given(method("GET"))
            .and(path("/api/folders/a"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({"msg": "Server Error"})))
            .mount(&server)
            .await;

        let mut browser = model(&server);
        browser.open_root().await.unwrap();
        let err = browser.navigate_into(summary("a", "A")).await.unwrap_err();
        assert_eq!(err.to_string(), "Server Error");
        assert!(!browser.loading());
        assert_eq!(browser.display().sub_folders[0].id, "a");
    }

    #[tokio::test]
    async fn test_blank_search_refetches_without_searching() {
        let server = MockServer::start().await;
        mount_folder(&server, ROOT_FOLDER_ID, &[], &["r1"], 2).await;
        forbid_search(&server).await;

        let mut browser = model(&server);
        browser.open_root().await.unwrap();
        browser.search("  \t ").await.unwrap();
        assert_eq!(browser.state().search(), None);
    }

    #[tokio::test]
    async fn test_search_then_clear() {
        let server = MockServer::start().await;
        mount_folder(&server, ROOT_FOLDER_ID, &[("a", "A")], &[], 2).await;
        Mock::given(method("GET"))
            .and(path("/api/images/search"))
            .and(query_param("q", "cat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"_id": "c1", "name": "cat", "imageUrl": "https://cdn/c1"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let mut browser = model(&server);
        browser.open_root().await.unwrap();
        browser.search("cat").await.unwrap();
        let shown = browser.display();
        assert!(shown.searching);
        assert!(shown.sub_folders.is_empty());
        assert_eq!(shown.images.len(), 1);

        browser.clear_search().await.unwrap();
        assert!(!browser.display().searching);
        assert_eq!(browser.display().sub_folders.len(), 1);
    }

    #[tokio::test]
    async fn test_search_with_no_hits_is_active_and_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/images/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let mut browser = model(&server);
        browser.search("zebra").await.unwrap();
        assert_eq!(browser.state().search(), Some(&[][..]));
        assert_eq!(
            browser.display().empty_message(),
            Some("No images found matching your search.")
        );
    }

    #[tokio::test]
    async fn test_search_failure_reports_and_shows_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/images/search"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let mut browser = model(&server);
        let err = browser.search("cat").await.unwrap_err();
        assert_eq!(err.kind, ApiErrorKind::Api);
        assert_eq!(browser.state().search(), Some(&[][..]));
        assert!(!browser.loading());
    }

    #[tokio::test]
    async fn test_upload_into_root_is_rejected_before_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let browser = model(&server);
        assert!(browser.is_root());
        let file = UploadFile::new("a.png", vec![1u8; 10]);
        let err = browser
            .upload_image("a", &file, &browser.current_folder().id)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ApiErrorKind::Precondition);
    }

    #[tokio::test]
    async fn test_upload_size_limit() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/images/upload"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "_id": "i1", "name": "small", "imageUrl": "https://cdn/i1"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let browser = model(&server);
        let big = UploadFile::new("big.png", vec![1u8; 2 * MAX_UPLOAD_BYTES]);
        let err = browser.upload_image("big", &big, "f1").await.unwrap_err();
        assert_eq!(err.kind, ApiErrorKind::Validation);

        let small = UploadFile::new("small.png", vec![1u8; 500 * 1024]);
        let image = browser.upload_image("small", &small, "f1").await.unwrap();
        assert_eq!(image.id, "i1");
    }

    #[tokio::test]
    async fn test_create_does_not_touch_local_state() {
        let server = MockServer::start().await;
        mount_folder(&server, ROOT_FOLDER_ID, &[], &[], 1).await;
        Mock::given(method("POST"))
            .and(path("/api/folders"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"_id": "n1", "name": "New"})))
            .expect(1)
            .mount(&server)
            .await;

        let mut browser = model(&server);
        browser.open_root().await.unwrap();
        let created = browser.create_folder("New", ROOT_FOLDER_ID).await.unwrap();
        assert_eq!(created.id, "n1");
        assert!(browser.display().sub_folders.is_empty());
    }

    #[tokio::test]
    async fn test_navigate_up_from_child() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path_regex(r"^/api/folders/[a-z]+$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(folders_body(&[], &[])))
            .mount(&server)
            .await;

        let mut browser = model(&server);
        assert!(!browser.navigate_up().await.unwrap());
        browser.navigate_into(summary("a", "A")).await.unwrap();
        assert!(browser.navigate_up().await.unwrap());
        assert!(browser.is_root());
    }
}
