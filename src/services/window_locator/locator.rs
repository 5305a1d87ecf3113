use super::r#trait::WindowQuery;
use crate::events::{TargetWindow, WindowHandle, TOON_SLOTS};
use crate::services::ToonContext;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Finds the game client windows that become toons 1..4.
pub struct WindowLocator {
    query: Arc<dyn WindowQuery>,
    class_name: String,
    left_to_right: AtomicBool,
    // Set once an empty discovery has been reported, so lazy retries stay quiet
    reported_empty: AtomicBool,
}

impl WindowLocator {
    pub fn new(query: Arc<dyn WindowQuery>, class_name: impl Into<String>, left_to_right: bool) -> Self {
        Self {
            query,
            class_name: class_name.into(),
            left_to_right: AtomicBool::new(left_to_right),
            reported_empty: AtomicBool::new(false),
        }
    }

    pub fn left_to_right(&self) -> bool {
        self.left_to_right.load(Ordering::Relaxed)
    }

    pub fn set_left_to_right(&self, enabled: bool) {
        self.left_to_right.store(enabled, Ordering::Relaxed);
    }

    /// Ordered list of at most four visible game windows. Every failure collapses into
    /// an empty list; zero targets is a normal state.
    pub async fn discover(&self) -> Vec<TargetWindow> {
        let handles = match self.query.list_windows(&self.class_name).await {
            Ok(handles) => handles,
            Err(e) => {
                self.report_empty(&format!("{}", e));
                return Vec::new();
            }
        };

        let mut seen = HashSet::new();
        let mut targets = Vec::with_capacity(TOON_SLOTS);
        for handle in handles {
            if !seen.insert(handle) {
                continue;
            }
            match self.query.geometry(handle).await {
                Ok(Some(geometry)) => targets.push(TargetWindow::new(handle, geometry)),
                Ok(None) => debug!("Window {} has no geometry (hidden or gone), skipping", handle),
                Err(e) => debug!("Geometry query for window {} failed: {}", handle, e),
            }
        }

        if self.left_to_right() {
            // stable: equal x keeps discovery order
            targets.sort_by_key(TargetWindow::x);
        }
        targets.truncate(TOON_SLOTS);

        if targets.is_empty() {
            self.report_empty(&format!("no visible '{}' windows", self.class_name));
        } else {
            self.reported_empty.store(false, Ordering::Relaxed);
            debug!("Discovered {} target window(s)", targets.len());
        }
        targets
    }

    /// Discover and publish the result as the context's target list.
    pub async fn refresh(&self, context: &ToonContext) -> Arc<[TargetWindow]> {
        let targets = self.discover().await;
        if !targets.is_empty() {
            let list: Vec<String> = targets.iter().map(ToString::to_string).collect();
            info!("Target windows: [{}]", list.join(", "));
        }
        context.replace_targets(targets)
    }

    /// Focused window, or `None` when the query fails.
    pub async fn focused_window(&self) -> Option<WindowHandle> {
        match self.query.focused_window().await {
            Ok(handle) => handle,
            Err(e) => {
                debug!("Focused window query failed: {}", e);
                None
            }
        }
    }

    fn report_empty(&self, reason: &str) {
        if !self.reported_empty.swap(true, Ordering::Relaxed) {
            warn!("No target windows found: {}", reason);
        } else {
            debug!("No target windows found: {}", reason);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::FakeWindowQuery;

    fn locator(query: &Arc<FakeWindowQuery>, left_to_right: bool) -> WindowLocator {
        WindowLocator::new(query.clone(), "Toontown Rewritten", left_to_right)
    }

    fn handles(targets: &[TargetWindow]) -> Vec<u64> {
        targets.iter().map(|t| t.handle.value()).collect()
    }

    #[tokio::test]
    async fn keeps_discovery_order_by_default() {
        let query = Arc::new(FakeWindowQuery::with_windows(&[(10, 500), (11, 100)]));
        let targets = locator(&query, false).discover().await;
        assert_eq!(handles(&targets), vec![10, 11]);
    }

    #[tokio::test]
    async fn sorts_left_to_right_when_enabled() {
        let query = Arc::new(FakeWindowQuery::with_windows(&[(10, 500), (11, 100)]));
        let targets = locator(&query, true).discover().await;
        assert_eq!(targets.iter().map(TargetWindow::x).collect::<Vec<_>>(), vec![100, 500]);
        assert_eq!(handles(&targets), vec![11, 10]);
    }

    #[tokio::test]
    async fn sort_is_stable_for_equal_positions() {
        let query = Arc::new(FakeWindowQuery::with_windows(&[(3, 200), (1, 0), (2, 200)]));
        let targets = locator(&query, true).discover().await;
        assert_eq!(handles(&targets), vec![1, 3, 2]);
    }

    #[tokio::test]
    async fn drops_windows_without_geometry_and_duplicates() {
        let query = Arc::new(FakeWindowQuery::with_windows(&[(10, 0), (11, 100)]));
        query.push_hidden(12);
        query.push_duplicate(10);
        let targets = locator(&query, false).discover().await;
        assert_eq!(handles(&targets), vec![10, 11]);
    }

    #[tokio::test]
    async fn caps_at_four_windows() {
        let query = Arc::new(FakeWindowQuery::with_windows(&[
            (1, 400), (2, 300), (3, 200), (4, 100), (5, 0),
        ]));
        let targets = locator(&query, true).discover().await;
        assert_eq!(handles(&targets), vec![5, 4, 3, 2]);

        let unsorted = locator(&query, false).discover().await;
        assert_eq!(handles(&unsorted), vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn failed_query_yields_empty_list() {
        let query = Arc::new(FakeWindowQuery::with_windows(&[(10, 0)]));
        query.fail_listing(true);
        let locator = locator(&query, false);
        assert!(locator.discover().await.is_empty());

        query.fail_listing(false);
        assert_eq!(locator.discover().await.len(), 1);
    }

    #[tokio::test]
    async fn refresh_publishes_targets() {
        let query = Arc::new(FakeWindowQuery::with_windows(&[(10, 0), (11, 100)]));
        let context = ToonContext::new();
        let published = locator(&query, false).refresh(&context).await;
        assert_eq!(published.len(), 2);
        assert_eq!(context.targets().len(), 2);
    }
}
