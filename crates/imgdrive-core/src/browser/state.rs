//! Folder browser reducer.
//!
//! `BrowserState` performs no I/O. Navigation methods mutate the state and
//! return the request the caller must run; the caller feeds the response
//! back through `finish_fetch`/`finish_search`. Every request carries a
//! `RequestId`, and completions for superseded requests are dropped.

use crate::api::{
    ApiError, ApiResult, FolderContents, FolderSummary, ImageSummary, ROOT_FOLDER_ID,
};
use crate::task::{RequestId, RequestSeq, RequestSlot};

use super::path::{FolderPath, FolderPathEntry};

/// Folder contents to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub id: RequestId,
    pub folder_id: String,
}

/// Search to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub id: RequestId,
    pub query: String,
}

/// What a search submission turned into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchStart {
    Search(SearchRequest),
    /// Blank query: search was cleared and the current folder is re-fetched.
    Browse(FetchRequest),
}

/// Whether a completion changed the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    /// The request was superseded; the response was ignored.
    Stale,
}

/// Items to render, after applying search mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplaySet<'a> {
    pub sub_folders: &'a [FolderSummary],
    pub images: &'a [ImageSummary],
    /// True when the items are search results.
    pub searching: bool,
}

impl DisplaySet<'_> {
    pub fn is_empty(&self) -> bool {
        self.sub_folders.is_empty() && self.images.is_empty()
    }

    pub fn empty_message(&self) -> Option<&'static str> {
        match (self.is_empty(), self.searching) {
            (false, _) => None,
            (true, true) => Some("No images found matching your search."),
            (true, false) => Some("This folder is empty."),
        }
    }
}

#[derive(Debug, Default)]
pub struct BrowserState {
    path: FolderPath,
    contents: FolderContents,
    search: Option<Vec<ImageSummary>>,
    query: String,
    seq: RequestSeq,
    fetch: RequestSlot,
    searching: RequestSlot,
}

impl BrowserState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn path(&self) -> &FolderPath {
        &self.path
    }

    pub fn current_folder(&self) -> &FolderPathEntry {
        self.path.current()
    }

    pub fn is_root(&self) -> bool {
        self.path.is_root()
    }

    pub fn contents(&self) -> &FolderContents {
        &self.contents
    }

    /// `Some` in search mode (possibly empty), `None` while browsing.
    pub fn search(&self) -> Option<&[ImageSummary]> {
        self.search.as_deref()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn loading(&self) -> bool {
        self.fetch.is_running() || self.searching.is_running()
    }

    /// Search results replace the folder view entirely; folders are never
    /// shown while a search is active.
    pub fn display(&self) -> DisplaySet<'_> {
        match &self.search {
            Some(results) => DisplaySet {
                sub_folders: &[],
                images: results,
                searching: true,
            },
            None => DisplaySet {
                sub_folders: &self.contents.sub_folders,
                images: &self.contents.images,
                searching: false,
            },
        }
    }

    /// Looks up a displayed sub-folder by exact name. Nothing matches in
    /// search mode, where folders are hidden.
    pub fn find_sub_folder(&self, name: &str) -> Option<&FolderSummary> {
        self.display().sub_folders.iter().find(|f| f.name == name)
    }

    pub fn open_root(&mut self) -> FetchRequest {
        self.path.reset();
        self.fetch_folder(ROOT_FOLDER_ID)
    }

    /// Re-fetches the open folder.
    pub fn refresh(&mut self) -> FetchRequest {
        let folder_id = self.path.current().id.clone();
        self.fetch_folder(&folder_id)
    }

    /// Starts a contents fetch for `folder_id` without touching the path.
    ///
    /// Leaves search mode and supersedes any in-flight fetch or search.
    pub fn fetch_folder(&mut self, folder_id: &str) -> FetchRequest {
        self.leave_search();
        let id = self.seq.next_id();
        self.fetch.start(id);
        FetchRequest {
            id,
            folder_id: folder_id.to_string(),
        }
    }

    pub fn navigate_into(&mut self, folder: FolderSummary) -> FetchRequest {
        self.path.push(folder.into());
        self.refresh()
    }

    /// # Panics
    /// If `index` is outside the current path.
    pub fn navigate_to_breadcrumb(&mut self, index: usize) -> FetchRequest {
        self.path.truncate_to(index);
        self.refresh()
    }

    /// Moves to the parent folder; `None` at root.
    pub fn navigate_up(&mut self) -> Option<FetchRequest> {
        let parent = self.path.len().checked_sub(2)?;
        Some(self.navigate_to_breadcrumb(parent))
    }

    /// Submits a search. A blank query clears search mode instead.
    pub fn start_search(&mut self, query: &str) -> SearchStart {
        let query = query.trim();
        if query.is_empty() {
            return SearchStart::Browse(self.clear_search());
        }

        self.query = query.to_string();
        let id = self.seq.next_id();
        self.searching.start(id);
        SearchStart::Search(SearchRequest {
            id,
            query: self.query.clone(),
        })
    }

    /// Leaves search mode and re-fetches the open folder from the server.
    pub fn clear_search(&mut self) -> FetchRequest {
        self.refresh()
    }

    /// Applies a contents response.
    ///
    /// On failure the previous contents stay in place.
    ///
    /// # Errors
    /// The request's error, when the request is still current.
    pub fn finish_fetch(
        &mut self,
        request: &FetchRequest,
        result: ApiResult<FolderContents>,
    ) -> Result<Completion, ApiError> {
        if !self.fetch.finish_if_active(request.id) {
            tracing::debug!(folder = %request.folder_id, "dropping stale folder response");
            return Ok(Completion::Stale);
        }

        match result {
            Ok(contents) => {
                self.contents = contents;
                Ok(Completion::Applied)
            }
            Err(err) => {
                tracing::warn!(folder = %request.folder_id, error = %err, "failed to load folder contents");
                Err(err)
            }
        }
    }

    /// Applies a search response. A failed search shows as an empty result
    /// set.
    ///
    /// # Errors
    /// The request's error, when the request is still current.
    pub fn finish_search(
        &mut self,
        request: &SearchRequest,
        result: ApiResult<Vec<ImageSummary>>,
    ) -> Result<Completion, ApiError> {
        if !self.searching.finish_if_active(request.id) {
            tracing::debug!(query = %request.query, "dropping stale search response");
            return Ok(Completion::Stale);
        }

        match result {
            Ok(images) => {
                self.search = Some(images);
                Ok(Completion::Applied)
            }
            Err(err) => {
                tracing::warn!(query = %request.query, error = %err, "search failed");
                self.search = Some(Vec::new());
                Err(err)
            }
        }
    }

    fn leave_search(&mut self) {
        self.search = None;
        self.query.clear();
        self.searching.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn folder(id: &str, name: &str) -> FolderSummary {
        FolderSummary {
            id: id.to_string(),
            name: name.to_string(),
        }
    }

    fn image(id: &str) -> ImageSummary {
        ImageSummary {
            id: id.to_string(),
            name: format!("image {id}"),
            image_url: format!("https://cdn/{id}.png"),
        }
    }

    fn contents(folders: &[FolderSummary], images: &[ImageSummary]) -> FolderContents {
        FolderContents {
            sub_folders: folders.to_vec(),
            images: images.to_vec(),
        }
    }

    fn loaded_root() -> BrowserState {
        let mut state = BrowserState::new();
        let req = state.open_root();
        state
            .finish_fetch(&req, Ok(contents(&[folder("a", "A")], &[image("r1")])))
            .unwrap();
        state
    }

    #[test]
    fn test_open_root_requests_root_and_sets_loading() {
        let mut state = BrowserState::new();
        assert!(!state.loading());
        let req = state.open_root();
        assert_eq!(req.folder_id, ROOT_FOLDER_ID);
        assert!(state.loading());
        state.finish_fetch(&req, Ok(FolderContents::default())).unwrap();
        assert!(!state.loading());
    }

    #[test]
    fn test_navigate_into_appends_and_fetches_child() {
        let mut state = loaded_root();
        let req = state.navigate_into(folder("a", "A"));
        assert_eq!(req.folder_id, "a");
        assert_eq!(state.path().len(), 2);
        assert_eq!(state.current_folder().name, "A");
    }

    #[test]
    fn test_breadcrumb_truncates_and_fetches_target() {
        let mut state = loaded_root();
        state.navigate_into(folder("a", "A"));
        state.navigate_into(folder("b", "B"));

        let req = state.navigate_to_breadcrumb(1);
        assert_eq!(req.folder_id, "a");
        let ids: Vec<&str> = state.path().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec![ROOT_FOLDER_ID, "a"]);
    }

    #[test]
    fn test_navigate_up_stops_at_root() {
        let mut state = loaded_root();
        assert_eq!(state.navigate_up(), None);
        state.navigate_into(folder("a", "A"));
        let req = state.navigate_up().unwrap();
        assert_eq!(req.folder_id, ROOT_FOLDER_ID);
        assert!(state.is_root());
    }

    #[test]
    fn test_stale_fetch_does_not_overwrite_newer_folder() {
        let mut state = loaded_root();
        let slow = state.navigate_into(folder("x", "X"));
        state.navigate_to_breadcrumb(0);
        let fast = state.navigate_into(folder("y", "Y"));

        let y_contents = contents(&[], &[image("y1")]);
        assert_eq!(
            state.finish_fetch(&fast, Ok(y_contents.clone())).unwrap(),
            Completion::Applied
        );
        assert!(!state.loading());

        let late = state.finish_fetch(&slow, Ok(contents(&[], &[image("x1")])));
        assert_eq!(late.unwrap(), Completion::Stale);
        assert_eq!(state.contents(), &y_contents);
        assert!(!state.loading());
    }

    #[test]
    fn test_stale_failure_is_silent() {
        let mut state = loaded_root();
        let slow = state.navigate_into(folder("x", "X"));
        let _fast = state.navigate_to_breadcrumb(0);
        let late = state.finish_fetch(&slow, Err(ApiError::transport("down")));
        assert_eq!(late.unwrap(), Completion::Stale);
        assert!(state.loading(), "newer fetch is still in flight");
    }

    #[test]
    fn test_failed_fetch_keeps_previous_contents() {
        let mut state = loaded_root();
        let before = state.contents().clone();
        let req = state.navigate_into(folder("a", "A"));
        let err = state
            .finish_fetch(&req, Err(ApiError::http_status(500, "")))
            .unwrap_err();
        assert_eq!(err.status, Some(500));
        assert_eq!(state.contents(), &before);
        assert!(!state.loading());
    }

    #[test]
    fn test_blank_search_is_clear_search() {
        let mut state = loaded_root();
        match state.start_search("   ") {
            SearchStart::Browse(req) => assert_eq!(req.folder_id, ROOT_FOLDER_ID),
            SearchStart::Search(_) => panic!("blank query must not search"),
        }
        assert_eq!(state.search(), None);
    }

    #[test]
    fn test_search_results_override_folders() {
        let mut state = loaded_root();
        let SearchStart::Search(req) = state.start_search("  cat ") else {
            panic!("expected a search request");
        };
        assert_eq!(req.query, "cat");
        assert_eq!(state.query(), "cat");

        state.finish_search(&req, Ok(vec![image("c1")])).unwrap();
        let shown = state.display();
        assert!(shown.searching);
        assert!(shown.sub_folders.is_empty());
        assert_eq!(shown.images.len(), 1);
        // folders are still held, only hidden
        assert_eq!(state.contents().sub_folders.len(), 1);
    }

    #[test]
    fn test_empty_search_is_distinct_from_no_search() {
        let mut state = loaded_root();
        assert_eq!(state.display().empty_message(), None);

        let SearchStart::Search(req) = state.start_search("zebra") else {
            panic!("expected a search request");
        };
        state.finish_search(&req, Ok(Vec::new())).unwrap();

        assert_eq!(state.search(), Some(&[][..]));
        assert_eq!(
            state.display().empty_message(),
            Some("No images found matching your search.")
        );
    }

    #[test]
    fn test_empty_folder_message() {
        let mut state = BrowserState::new();
        let req = state.open_root();
        state.finish_fetch(&req, Ok(FolderContents::default())).unwrap();
        assert_eq!(state.display().empty_message(), Some("This folder is empty."));
    }

    #[test]
    fn test_failed_search_shows_empty_results() {
        let mut state = loaded_root();
        let SearchStart::Search(req) = state.start_search("cat") else {
            panic!("expected a search request");
        };
        assert!(state.loading());
        assert!(state.finish_search(&req, Err(ApiError::transport("down"))).is_err());
        assert_eq!(state.search(), Some(&[][..]));
        assert!(!state.loading());
    }

    #[test]
    fn test_navigation_drops_in_flight_search() {
        let mut state = loaded_root();
        let SearchStart::Search(search) = state.start_search("cat") else {
            panic!("expected a search request");
        };
        let fetch = state.navigate_into(folder("a", "A"));
        assert_eq!(
            state.finish_search(&search, Ok(vec![image("c1")])).unwrap(),
            Completion::Stale
        );
        assert_eq!(state.search(), None);
        state.finish_fetch(&fetch, Ok(FolderContents::default())).unwrap();
        assert!(!state.loading());
    }

    #[test]
    fn test_clear_search_leaves_search_mode_and_refetches_current() {
        let mut state = loaded_root();
        state.navigate_into(folder("a", "A"));
        let SearchStart::Search(req) = state.start_search("cat") else {
            panic!("expected a search request");
        };
        state.finish_search(&req, Ok(vec![image("c1")])).unwrap();

        let refetch = state.clear_search();
        assert_eq!(refetch.folder_id, "a");
        assert_eq!(state.search(), None);
        assert_eq!(state.query(), "");
        assert!(!state.display().searching);
    }

    #[test]
    fn test_find_sub_folder_by_name() {
        let state = loaded_root();
        assert_eq!(state.find_sub_folder("A").unwrap().id, "a");
        assert!(state.find_sub_folder("a").is_none());
    }

    #[test]
    fn test_hidden_folders_are_not_found_while_searching() {
        let mut state = loaded_root();
        let SearchStart::Search(req) = state.start_search("cat") else {
            panic!("expected a search request");
        };
        assert!(state.find_sub_folder("A").is_none());

        state.finish_search(&req, Ok(vec![image("c1")])).unwrap();
        assert!(state.find_sub_folder("A").is_none());

        state.clear_search();
        assert_eq!(state.find_sub_folder("A").unwrap().id, "a");
    }
}
