// Series store - Metric name to current series, with per-refresh epochs
use crate::domain::series::{CustomSeries, DataPoint, Series};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::{RwLock, broadcast};

/// Refresh generation. Results tagged with an older epoch are discarded.
pub type Epoch = u64;

const EVENT_CAPACITY: usize = 64;

/// Change notification for chart-layer subscribers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreEvent {
    Cleared { epoch: Epoch },
    Replaced { name: String, epoch: Epoch, points: usize },
}

pub type SharedSeriesStore = Arc<RwLock<SeriesStore>>;

/// Owned aggregate state. Every key is written only by its own metric
/// pipeline or by a custom-series submission, so partially refreshed states
/// are visible to readers while a refresh is running.
#[derive(Debug)]
pub struct SeriesStore {
    series: HashMap<String, Series>,
    units: HashMap<String, String>,
    epoch: Epoch,
    events: broadcast::Sender<StoreEvent>,
}

impl SeriesStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            series: HashMap::new(),
            units: HashMap::new(),
            epoch: 0,
            events,
        }
    }

    pub fn shared() -> SharedSeriesStore {
        Arc::new(RwLock::new(Self::new()))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    pub fn get_series(&self, name: &str) -> Option<&[DataPoint]> {
        self.series.get(name).map(Vec::as_slice)
    }

    pub fn unit(&self, name: &str) -> Option<&str> {
        self.units.get(name).map(String::as_str)
    }

    pub fn metric_names(&self) -> BTreeSet<String> {
        self.series.keys().cloned().collect()
    }

    /// Start a new refresh cycle: bump the epoch and empty every series while
    /// keeping the key set.
    pub fn begin_refresh(&mut self) -> Epoch {
        self.epoch += 1;
        for points in self.series.values_mut() {
            points.clear();
        }
        let _ = self.events.send(StoreEvent::Cleared { epoch: self.epoch });
        self.epoch
    }

    /// Replace `name` with `points` if `epoch` is still current.
    ///
    /// Returns `false` when the result belongs to a superseded refresh.
    pub fn commit(&mut self, epoch: Epoch, name: &str, unit: &str, points: Series) -> bool {
        if epoch != self.epoch {
            tracing::warn!(
                "Dropping stale result for {} (epoch {}, current {})",
                name,
                epoch,
                self.epoch
            );
            return false;
        }

        self.replace(name.to_string(), unit.to_string(), points);
        true
    }

    /// Insert a user-defined series, replacing any series of the same name.
    pub fn insert_custom(&mut self, custom: CustomSeries) {
        self.replace(custom.name, custom.unit, custom.points);
    }

    fn replace(&mut self, name: String, unit: String, points: Series) {
        let event = StoreEvent::Replaced {
            name: name.clone(),
            epoch: self.epoch,
            points: points.len(),
        };
        self.units.insert(name.clone(), unit);
        self.series.insert(name, points);
        let _ = self.events.send(event);
    }
}

impl Default for SeriesStore {
    fn default() -> Self {
        Self::new()
    }
}
