//! List loader behind a paginated table
//!
//! Input changes (search, page, sort, filters) schedule a fetch once the
//! input has been quiet for the debounce period. Every fetch is tagged with
//! a generation; a response whose generation is no longer current is
//! dropped, so a slow early response never overwrites a later one. A failed
//! fetch keeps the page already shown.

use crate::client::{ApiClient, Filters};
use crate::error::Result;
use async_trait::async_trait;
use labdesk_common::db::{ListQuery, Page, SortOrder};
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Quiet period after the last input change
pub const DEBOUNCE: Duration = Duration::from_millis(300);

/// Where pages come from
#[async_trait]
pub trait ListSource<T>: Send + Sync {
    async fn fetch(&self, query: &ListQuery, filters: &Filters) -> Result<Page<T>>;
}

/// Pages of one resource served by the API
pub struct ResourceList<T> {
    client: ApiClient,
    resource: String,
    _rows: PhantomData<fn() -> T>,
}

impl<T> ResourceList<T> {
    pub fn new(client: ApiClient, resource: impl Into<String>) -> Self {
        Self {
            client,
            resource: resource.into(),
            _rows: PhantomData,
        }
    }
}

#[async_trait]
impl<T: DeserializeOwned + Send + 'static> ListSource<T> for ResourceList<T> {
    async fn fetch(&self, query: &ListQuery, filters: &Filters) -> Result<Page<T>> {
        self.client.fetch_page(&self.resource, query, filters).await
    }
}

struct LoaderState<T> {
    query: ListQuery,
    filters: Filters,
    generation: u64,
    loading: bool,
    page: Option<Page<T>>,
    last_error: Option<String>,
}

pub struct ListLoader<T> {
    source: Arc<dyn ListSource<T>>,
    state: Arc<Mutex<LoaderState<T>>>,
    pending: Mutex<Vec<JoinHandle<()>>>,
    debounce: Duration,
}

fn lock<S>(mutex: &Mutex<S>) -> MutexGuard<'_, S> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<T: Clone + Send + 'static> ListLoader<T> {
    pub fn new(source: impl ListSource<T> + 'static) -> Self {
        Self {
            source: Arc::new(source),
            state: Arc::new(Mutex::new(LoaderState {
                query: ListQuery::default(),
                filters: Filters::new(),
                generation: 0,
                loading: false,
                page: None,
                last_error: None,
            })),
            pending: Mutex::new(Vec::new()),
            debounce: DEBOUNCE,
        }
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// New search term; goes back to the first page
    pub fn set_search(&self, term: &str) {
        self.change(|query, _| {
            query.search = Some(term.to_string());
            query.page = 1;
        });
    }

    pub fn set_page(&self, page: u64) {
        self.change(|query, _| query.page = page.max(1));
    }

    pub fn set_limit(&self, limit: u64) {
        self.change(|query, _| {
            query.limit = limit;
            query.page = 1;
        });
    }

    pub fn set_sort(&self, sort_by: &str, order: SortOrder) {
        self.change(|query, _| {
            query.sort_by = Some(sort_by.to_string());
            query.order = Some(order);
        });
    }

    /// Set or clear (`None`) one equality filter
    pub fn set_filter(&self, name: &str, value: Option<String>) {
        self.change(|query, filters| {
            filters.retain(|(key, _)| key != name);
            if let Some(value) = value {
                filters.push((name.to_string(), value));
            }
            query.page = 1;
        });
    }

    /// Move to the following page; `false` when the shown page is the last
    pub fn next_page(&self) -> bool {
        let target = match lock(&self.state).page {
            Some(ref page) if page.has_next() => page.page + 1,
            _ => return false,
        };
        self.set_page(target);
        true
    }

    /// Move to the preceding page; `false` on the first page
    pub fn previous_page(&self) -> bool {
        let target = match lock(&self.state).page {
            Some(ref page) if page.has_previous() => page.page - 1,
            _ => return false,
        };
        self.set_page(target);
        true
    }

    /// Fetch the current query right away, e.g. after a mutation
    pub fn reload(&self) {
        self.schedule(Duration::ZERO);
    }

    fn change(&self, apply: impl FnOnce(&mut ListQuery, &mut Filters)) {
        {
            let mut state = lock(&self.state);
            let LoaderState { query, filters, .. } = &mut *state;
            apply(query, filters);
        }
        self.schedule(self.debounce);
    }

    fn schedule(&self, delay: Duration) {
        let generation = {
            let mut state = lock(&self.state);
            state.generation += 1;
            state.generation
        };

        let source = Arc::clone(&self.source);
        let state = Arc::clone(&self.state);
        let handle = tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            let (query, filters) = {
                let mut state = lock(&state);
                if state.generation != generation {
                    debug!(generation, "Superseded before fetching");
                    return;
                }
                state.loading = true;
                (state.query.clone(), state.filters.clone())
            };

            let result = source.fetch(&query, &filters).await;

            let mut state = lock(&state);
            if state.generation != generation {
                debug!(generation, current = state.generation, "Discarding stale page");
                return;
            }
            state.loading = false;
            match result {
                Ok(page) => {
                    state.page = Some(page);
                    state.last_error = None;
                }
                Err(err) => {
                    warn!(error = %err, "Failed to load list, keeping previous page");
                    state.last_error = Some(err.user_message());
                }
            }
        });

        let mut pending = lock(&self.pending);
        pending.retain(|task| !task.is_finished());
        pending.push(handle);
    }

    /// Wait until every scheduled fetch has finished or been dropped
    pub async fn settle(&self) {
        let tasks: Vec<_> = lock(&self.pending).drain(..).collect();
        for task in tasks {
            if let Err(err) = task.await {
                warn!(error = %err, "List fetch task failed");
            }
        }
    }

    /// Page currently shown
    pub fn page(&self) -> Option<Page<T>> {
        lock(&self.state).page.clone()
    }

    pub fn query(&self) -> ListQuery {
        lock(&self.state).query.clone()
    }

    pub fn filters(&self) -> Filters {
        lock(&self.state).filters.clone()
    }

    pub fn is_loading(&self) -> bool {
        lock(&self.state).loading
    }

    /// Message of the last failed fetch, cleared by the next success
    pub fn last_error(&self) -> Option<String> {
        lock(&self.state).last_error.clone()
    }
}

impl<T> Drop for ListLoader<T> {
    fn drop(&mut self) {
        for task in lock(&self.pending).drain(..) {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use reqwest::StatusCode;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Echoes the search term back as the only row
    #[derive(Clone, Default)]
    struct EchoSource {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ListSource<String> for EchoSource {
        async fn fetch(&self, query: &ListQuery, filters: &Filters) -> Result<Page<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let term = query.search.clone().unwrap_or_default();

            // Slow answers for "slow", failures for "boom"
            if term == "slow" {
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
            if term == "boom" {
                return Err(ClientError::Api {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    message: "Database error".into(),
                });
            }

            let mut row = term;
            for (key, value) in filters {
                row.push_str(&format!(" {}={}", key, value));
            }
            Ok(Page {
                items: vec![row],
                total_pages: 3,
                total_items: 3,
                page: query.page,
                limit: query.limit,
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_typing_fetches_once() {
        let source = EchoSource::default();
        let calls = Arc::clone(&source.calls);
        let loader = ListLoader::new(source);

        for term in ["c", "ch", "che", "chem"] {
            loader.set_search(term);
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        loader.settle().await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(loader.page().unwrap().items, vec!["chem".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_waits_for_quiet_period() {
        let source = EchoSource::default();
        let calls = Arc::clone(&source.calls);
        let loader = ListLoader::new(source);

        loader.set_search("bio");
        tokio::time::sleep(Duration::from_millis(299)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(2)).await;
        loader.settle().await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_response_is_discarded() {
        let loader = ListLoader::new(EchoSource::default());

        loader.set_search("slow");
        loader.reload();
        // Let the slow fetch start before the input changes again
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(loader.is_loading());

        loader.set_search("fast");
        loader.reload();
        loader.settle().await;

        assert_eq!(loader.page().unwrap().items, vec!["fast".to_string()]);
        assert!(!loader.is_loading());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_keeps_previous_page() {
        let loader = ListLoader::new(EchoSource::default());

        loader.set_search("physics");
        loader.settle().await;

        loader.set_search("boom");
        loader.settle().await;

        assert_eq!(loader.page().unwrap().items, vec!["physics".to_string()]);
        assert_eq!(loader.last_error().as_deref(), Some("Database error"));

        loader.set_search("chemistry");
        loader.settle().await;
        assert_eq!(loader.last_error(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_paging_stops_at_the_ends() {
        let loader = ListLoader::new(EchoSource::default());
        assert!(!loader.next_page());

        loader.reload();
        loader.settle().await;
        assert!(!loader.previous_page());

        assert!(loader.next_page());
        loader.settle().await;
        assert!(loader.next_page());
        loader.settle().await;
        assert_eq!(loader.page().unwrap().page, 3);
        assert!(!loader.next_page());

        assert!(loader.previous_page());
        loader.settle().await;
        assert_eq!(loader.page().unwrap().page, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_input_changes_reset_paging() {
        let loader = ListLoader::new(EchoSource::default());

        loader.set_page(4);
        loader.set_filter("labCode", Some("3".into()));
        assert_eq!(loader.query().page, 1);

        loader.set_filter("labCode", Some("5".into()));
        loader.set_filter("teamId", Some("2".into()));
        loader.set_filter("teamId", None);
        loader.settle().await;

        assert_eq!(loader.filters(), vec![("labCode".to_string(), "5".to_string())]);
        assert_eq!(loader.page().unwrap().items, vec![" labCode=5".to_string()]);
    }
}
