use atoll_core::repository::RouteRepository;
use atoll_core::route::Route;
use atoll_core::timeslot::TimeSlot;
use atoll_shared::models::events::RoutesChangedEvent;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

/// Routes indexed for the booking form: valid origins, destinations and per-pair slots.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct DirectorySnapshot {
    pub from_locations: Vec<String>,
    pub to_locations: Vec<String>,
    /// from -> to -> allowed slots
    pub times_map: BTreeMap<String, BTreeMap<String, Vec<TimeSlot>>>,
    pub routes: Vec<Route>,
}

impl DirectorySnapshot {
    pub fn from_routes(mut routes: Vec<Route>) -> Self {
        routes.sort_by_key(|route| route.display_order);

        let mut from_locations: Vec<String> = Vec::new();
        let mut to_locations: Vec<String> = Vec::new();
        let mut times_map: BTreeMap<String, BTreeMap<String, Vec<TimeSlot>>> = BTreeMap::new();

        for route in &routes {
            if !from_locations.contains(&route.from_location) {
                from_locations.push(route.from_location.clone());
            }
            if !to_locations.contains(&route.to_location) {
                to_locations.push(route.to_location.clone());
            }
            times_map
                .entry(route.from_location.clone())
                .or_default()
                .insert(route.to_location.clone(), route.timings.clone());
        }

        Self {
            from_locations,
            to_locations,
            times_map,
            routes,
        }
    }

    /// Configured slots for the pair, or every slot when none are configured.
    pub fn timings(&self, from: &str, to: &str) -> Vec<TimeSlot> {
        match self.times_map.get(from).and_then(|destinations| destinations.get(to)) {
            Some(slots) if !slots.is_empty() => slots.clone(),
            _ => TimeSlot::ALL.to_vec(),
        }
    }

    pub fn destinations_from(&self, from: &str) -> Vec<String> {
        self.routes
            .iter()
            .filter(|route| route.from_location == from)
            .map(|route| route.to_location.clone())
            .collect()
    }

    pub fn route(&self, from: &str, to: &str) -> Option<&Route> {
        self.routes
            .iter()
            .find(|route| route.from_location == from && route.to_location == to)
    }
}

/// Live view of the routes table, refreshed wholesale on change notifications.
pub struct RouteDirectory {
    repo: Arc<dyn RouteRepository>,
    current: watch::Sender<Arc<DirectorySnapshot>>,
}

impl RouteDirectory {
    pub fn new(repo: Arc<dyn RouteRepository>) -> Self {
        let (current, _) = watch::channel(Arc::new(DirectorySnapshot::default()));
        Self { repo, current }
    }

    /// Re-run the full fetch and replace the snapshot. Query errors leave an empty directory.
    pub async fn refresh(&self) -> Arc<DirectorySnapshot> {
        let snapshot = match self.repo.list_routes().await {
            Ok(records) => {
                let routes = records.into_iter().map(Route::from).collect();
                DirectorySnapshot::from_routes(routes)
            }
            Err(e) => {
                warn!("Failed to fetch routes, serving an empty directory: {}", e);
                DirectorySnapshot::default()
            }
        };

        let snapshot = Arc::new(snapshot);
        self.current.send_replace(snapshot.clone());
        debug!("Route directory refreshed: {} routes", snapshot.routes.len());
        snapshot
    }

    pub fn snapshot(&self) -> Arc<DirectorySnapshot> {
        self.current.borrow().clone()
    }

    pub fn timings(&self, from: &str, to: &str) -> Vec<TimeSlot> {
        self.snapshot().timings(from, to)
    }

    pub fn destinations_from(&self, from: &str) -> Vec<String> {
        self.snapshot().destinations_from(from)
    }

    pub fn route(&self, from: &str, to: &str) -> Option<Route> {
        self.snapshot().route(from, to).cloned()
    }

    /// Receiver that observes every replaced snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Arc<DirectorySnapshot>> {
        self.current.subscribe()
    }

    /// Refetch on every change notification until the feed closes.
    pub async fn watch(self: Arc<Self>, mut changes: broadcast::Receiver<RoutesChangedEvent>) {
        info!("Route directory listening for change notifications");
        loop {
            match changes.recv().await {
                Ok(event) => {
                    debug!("Routes changed ({:?}), refetching", event.change);
                    self.refresh().await;
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Route change feed lagged by {} events, refetching", skipped);
                    self.refresh().await;
                }
                Err(broadcast::error::RecvError::Closed) => {
                    info!("Route change feed closed");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use atoll_core::route::RouteRecord;
    use atoll_core::BoxError;
    use atoll_shared::models::events::RouteChange;
    use std::sync::Mutex;
    use uuid::Uuid;

    struct StubRoutes {
        rows: Mutex<Vec<RouteRecord>>,
        fail: bool,
    }

    #[async_trait]
    impl RouteRepository for StubRoutes {
        async fn list_routes(&self) -> Result<Vec<RouteRecord>, BoxError> {
            if self.fail {
                return Err("connection refused".into());
            }
            Ok(self.rows.lock().unwrap().clone())
        }
    }

    fn record(from: &str, to: &str, timings: Option<Vec<&str>>, order: i32) -> RouteRecord {
        RouteRecord {
            id: Uuid::new_v4(),
            from_location: from.to_string(),
            to_location: to.to_string(),
            price: 70.0,
            duration_minutes: 90,
            timings: timings.map(|t| t.into_iter().map(String::from).collect()),
            display_order: order,
        }
    }

    fn directory(rows: Vec<RouteRecord>) -> (Arc<StubRoutes>, Arc<RouteDirectory>) {
        let repo = Arc::new(StubRoutes {
            rows: Mutex::new(rows),
            fail: false,
        });
        let directory = Arc::new(RouteDirectory::new(repo.clone()));
        (repo, directory)
    }

    #[tokio::test]
    async fn test_refresh_indexes_routes() {
        let (_, directory) = directory(vec![
            record("Dhigurah", "Male", Some(vec!["Afternoon"]), 2),
            record("Male", "Dhigurah", Some(vec!["Morning", "Evening"]), 1),
            record("Male", "Maamigili", None, 3),
        ]);

        let snapshot = directory.refresh().await;
        assert_eq!(snapshot.from_locations, vec!["Male", "Dhigurah"]);
        assert_eq!(snapshot.to_locations, vec!["Dhigurah", "Male", "Maamigili"]);
        assert_eq!(
            directory.timings("Male", "Dhigurah"),
            vec![TimeSlot::Morning, TimeSlot::Evening]
        );
        assert_eq!(directory.destinations_from("Male"), vec!["Dhigurah", "Maamigili"]);
        assert!(directory.route("Dhigurah", "Male").is_some());
    }

    #[tokio::test]
    async fn test_timings_fall_back_to_every_slot() {
        let (_, directory) = directory(vec![record("Male", "Maamigili", Some(vec![]), 1)]);
        directory.refresh().await;

        assert_eq!(directory.timings("Male", "Maamigili"), TimeSlot::ALL.to_vec());
        assert_eq!(directory.timings("Male", "Nowhere"), TimeSlot::ALL.to_vec());
        assert_eq!(directory.timings("", ""), TimeSlot::ALL.to_vec());
    }

    #[tokio::test]
    async fn test_query_error_yields_empty_directory() {
        let repo = Arc::new(StubRoutes {
            rows: Mutex::new(vec![record("Male", "Dhigurah", None, 1)]),
            fail: true,
        });
        let directory = RouteDirectory::new(repo);

        let snapshot = directory.refresh().await;
        assert!(snapshot.routes.is_empty());
        assert!(snapshot.from_locations.is_empty());
        assert_eq!(directory.timings("Male", "Dhigurah"), TimeSlot::ALL.to_vec());
    }

    #[tokio::test]
    async fn test_change_notification_replaces_snapshot() {
        let (repo, directory) = directory(vec![record("Male", "Dhigurah", Some(vec!["Morning"]), 1)]);
        directory.refresh().await;

        let (tx, rx) = broadcast::channel(8);
        let mut updates = directory.subscribe();
        let worker = tokio::spawn(directory.clone().watch(rx));

        repo.rows
            .lock()
            .unwrap()
            .push(record("Male", "Fenfushi", Some(vec!["Midday"]), 2));
        tx.send(RoutesChangedEvent::now(RouteChange::Insert, None)).unwrap();

        updates.changed().await.unwrap();
        assert_eq!(directory.snapshot().routes.len(), 2);
        assert_eq!(directory.timings("Male", "Fenfushi"), vec![TimeSlot::Midday]);

        drop(tx);
        worker.await.unwrap();
    }
}
