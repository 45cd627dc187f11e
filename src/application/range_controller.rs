// Range controller - Owns the selected window and drives refreshes
use crate::application::clock::Clock;
use crate::application::sample_source::{CumulativeQuery, IntervalQuery, SampleSource};
use crate::application::series_store::{Epoch, SharedSeriesStore};
use crate::domain::calendar::iso_week_anchor;
use crate::domain::metric::{Metric, SampleKind};
use crate::domain::range::{DateRange, Window};
use crate::domain::sample::SampleBatch;
use crate::error::DashboardError;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

/// Engine parameters resolved from configuration.
#[derive(Debug, Clone, Copy)]
pub struct RefreshOptions {
    pub tz: Tz,
    pub interval_sample_limit: usize,
}

/// Result of one metric pipeline within a refresh.
#[derive(Debug)]
pub struct MetricOutcome {
    pub metric: Metric,
    /// False when a newer refresh superseded this one before it finished
    pub committed: bool,
    /// Number of points produced
    pub result: Result<usize, DashboardError>,
}

#[derive(Debug)]
pub struct RefreshReport {
    pub epoch: Epoch,
    pub range: DateRange,
    pub outcomes: Vec<MetricOutcome>,
}

impl RefreshReport {
    pub fn outcome(&self, metric: Metric) -> Option<&MetricOutcome> {
        self.outcomes.iter().find(|o| o.metric == metric)
    }

    pub fn failures(&self) -> impl Iterator<Item = &MetricOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_err())
    }
}

/// In-flight refresh. Dropping it leaves the metric pipelines running.
#[derive(Debug)]
pub struct RefreshHandle {
    pub epoch: Epoch,
    pub range: DateRange,
    pub window: Window,
    tasks: Vec<JoinHandle<MetricOutcome>>,
}

impl RefreshHandle {
    pub async fn wait(self) -> RefreshReport {
        let mut outcomes = Vec::with_capacity(self.tasks.len());
        for task in self.tasks {
            match task.await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    tracing::error!("Metric pipeline for epoch {} aborted: {}", self.epoch, e)
                }
            }
        }

        RefreshReport {
            epoch: self.epoch,
            range: self.range,
            outcomes,
        }
    }
}

/// Current range plus how many selections have been made so far.
#[derive(Debug, Clone, Copy)]
struct Selection {
    range: DateRange,
    seq: u64,
}

pub struct RangeController {
    source: Arc<dyn SampleSource>,
    store: SharedSeriesStore,
    clock: Arc<dyn Clock>,
    options: RefreshOptions,
    metrics: Vec<Metric>,
    selected: RwLock<Selection>,
}

impl RangeController {
    pub fn new(
        source: Arc<dyn SampleSource>,
        store: SharedSeriesStore,
        clock: Arc<dyn Clock>,
        options: RefreshOptions,
        initial: DateRange,
    ) -> Self {
        Self {
            source,
            store,
            clock,
            options,
            metrics: Metric::ALL.to_vec(),
            selected: RwLock::new(Selection {
                range: initial,
                seq: 0,
            }),
        }
    }

    pub fn store(&self) -> &SharedSeriesStore {
        &self.store
    }

    pub fn options(&self) -> RefreshOptions {
        self.options
    }

    pub async fn selected(&self) -> DateRange {
        self.selected.read().await.range
    }

    /// Window the given range covers right now.
    pub fn window(&self, range: DateRange) -> Window {
        Window::trailing(range, self.clock.now())
    }

    /// Switch to `range` and refresh. Selecting the current range refreshes too.
    pub async fn select(&self, range: DateRange) -> Result<RefreshHandle, DashboardError> {
        {
            let mut selected = self.selected.write().await;
            selected.range = range;
            selected.seq += 1;
        }
        tracing::info!("Selected range {}", range);
        self.refresh().await
    }

    /// Authorize, then clear the store and start one pipeline per metric.
    ///
    /// On denial the store is left exactly as it was. A refresh whose range
    /// was replaced by a newer selection while authorization was pending is
    /// dropped with `Superseded`.
    pub async fn refresh(&self) -> Result<RefreshHandle, DashboardError> {
        let Selection { range, seq } = *self.selected.read().await;

        match self.source.request_authorization().await {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!("Sample source denied authorization, keeping current series");
                return Err(DashboardError::AuthorizationDenied);
            }
            Err(e) => {
                tracing::warn!("Authorization request failed: {:#}", e);
                return Err(DashboardError::AuthorizationDenied);
            }
        }

        let epoch = {
            let mut store = self.store.write().await;
            if self.selected.read().await.seq != seq {
                tracing::info!(
                    "Range {} was superseded during authorization, skipping refresh",
                    range
                );
                return Err(DashboardError::Superseded { range });
            }
            store.begin_refresh()
        };
        let now = self.clock.now();
        let window = Window::trailing(range, now);
        let anchor = iso_week_anchor(now, self.options.tz);

        tracing::info!(
            "Refresh {} for last {} days ({} -> {})",
            epoch,
            window.days,
            window.start,
            window.end
        );

        let tasks = self
            .metrics
            .iter()
            .map(|&metric| {
                let pipeline = MetricPipeline {
                    source: self.source.clone(),
                    store: self.store.clone(),
                    options: self.options,
                    metric,
                    window,
                    anchor,
                    epoch,
                };
                tokio::spawn(pipeline.run())
            })
            .collect();

        Ok(RefreshHandle {
            epoch,
            range,
            window,
            tasks,
        })
    }
}

struct MetricPipeline {
    source: Arc<dyn SampleSource>,
    store: SharedSeriesStore,
    options: RefreshOptions,
    metric: Metric,
    window: Window,
    anchor: DateTime<Utc>,
    epoch: Epoch,
}

impl MetricPipeline {
    async fn run(self) -> MetricOutcome {
        let metric = self.metric;

        let (points, result) = match self.fetch().await {
            Ok(batch) => {
                tracing::debug!("Fetched {} samples for {}", batch.len(), metric);
                let points = batch.bucket(&self.window, self.options.tz);
                let count = points.len();
                (points, Ok(count))
            }
            Err(e) => {
                tracing::error!("Error fetching {}: {:#}", metric, e);
                (Vec::new(), Err(DashboardError::SourceQueryFailed { metric, source: e }))
            }
        };

        let committed = self
            .store
            .write()
            .await
            .commit(self.epoch, metric.series_name(), metric.unit(), points);

        MetricOutcome {
            metric,
            committed,
            result,
        }
    }

    async fn fetch(&self) -> anyhow::Result<SampleBatch> {
        match self.metric.kind() {
            SampleKind::Cumulative => {
                let query = CumulativeQuery::daily(&self.window, self.anchor);
                let sums = self.source.query_cumulative(self.metric, &query).await?;
                if sums.is_empty() {
                    anyhow::bail!("source returned no statistics");
                }
                Ok(SampleBatch::Cumulative(sums))
            }
            SampleKind::Interval => {
                let query = IntervalQuery::new(&self.window, self.options.interval_sample_limit);
                let samples = self.source.query_intervals(self.metric, &query).await?;
                Ok(SampleBatch::Interval(samples))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::clock::FixedClock;
    use crate::application::series_store::SeriesStore;
    use crate::domain::sample::{DailySum, IntervalSample};
    use async_trait::async_trait;
    use chrono::Duration;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tokio::sync::Notify;

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    // Thursday
    const NOW: &str = "2024-01-18T12:00:00Z";

    struct StubSource {
        authorized: AtomicBool,
        auth_calls: AtomicUsize,
        /// Holds back the first authorization request
        first_auth_gate: Option<Arc<Notify>>,
        failing: Option<Metric>,
        /// Holds back sleep queries covering a whole year
        year_sleep_gate: Option<Arc<Notify>>,
        last_cumulative: Mutex<Option<CumulativeQuery>>,
        last_interval: Mutex<Option<IntervalQuery>>,
    }

    impl StubSource {
        fn new() -> Self {
            Self {
                authorized: AtomicBool::new(true),
                auth_calls: AtomicUsize::new(0),
                first_auth_gate: None,
                failing: None,
                year_sleep_gate: None,
                last_cumulative: Mutex::new(None),
                last_interval: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl SampleSource for StubSource {
        async fn request_authorization(&self) -> anyhow::Result<bool> {
            let call = self.auth_calls.fetch_add(1, Ordering::SeqCst);
            if call == 0 {
                if let Some(gate) = &self.first_auth_gate {
                    gate.notified().await;
                }
            }
            Ok(self.authorized.load(Ordering::SeqCst))
        }

        async fn query_cumulative(
            &self,
            metric: Metric,
            query: &CumulativeQuery,
        ) -> anyhow::Result<Vec<DailySum>> {
            *self.last_cumulative.lock().unwrap() = Some(*query);
            if self.failing == Some(metric) {
                anyhow::bail!("store unavailable");
            }
            let today = utc("2024-01-18T00:00:00Z");
            Ok(vec![
                DailySum::new(today - Duration::days(1), today, Some(1000.0)),
                DailySum::new(today, today + Duration::days(1), Some(250.0)),
            ])
        }

        async fn query_intervals(
            &self,
            metric: Metric,
            query: &IntervalQuery,
        ) -> anyhow::Result<Vec<IntervalSample>> {
            *self.last_interval.lock().unwrap() = Some(*query);
            if self.failing == Some(metric) {
                anyhow::bail!("store unavailable");
            }
            if query.end - query.start == Duration::days(365) {
                if let Some(gate) = &self.year_sleep_gate {
                    gate.notified().await;
                }
                return Ok(vec![IntervalSample::new(
                    utc("2024-01-16T23:00:00Z"),
                    utc("2024-01-17T06:00:00Z"),
                )]);
            }
            Ok(vec![IntervalSample::new(
                utc("2024-01-16T23:00:00Z"),
                utc("2024-01-17T04:00:00Z"),
            )])
        }
    }

    fn controller(source: Arc<StubSource>) -> RangeController {
        RangeController::new(
            source,
            SeriesStore::shared(),
            Arc::new(FixedClock(utc(NOW))),
            RefreshOptions {
                tz: Tz::UTC,
                interval_sample_limit: 100,
            },
            DateRange::default(),
        )
    }

    #[tokio::test]
    async fn test_refresh_fills_every_metric() {
        let controller = controller(Arc::new(StubSource::new()));
        assert_eq!(controller.selected().await, DateRange::Year);

        let report = controller.select(DateRange::Week).await.unwrap().wait().await;

        assert_eq!(report.range, DateRange::Week);
        assert_eq!(report.failures().count(), 0);

        let store = controller.store().read().await;
        let steps = store.get_series("Steps Taken").unwrap();
        assert_eq!(steps.len(), 7);
        assert_eq!(steps[5].value, 1000.0);
        assert_eq!(steps[6].value, 250.0);
        assert!(steps[..5].iter().all(|p| p.value == 0.0));

        let sleep = store.get_series("Hours Asleep").unwrap();
        assert_eq!(sleep.len(), 1);
        assert_eq!(sleep[0].value, 7.0);
        assert_eq!(store.unit("Minutes Exercised"), Some("min"));
    }

    #[tokio::test]
    async fn test_queries_use_selected_window_and_week_anchor() {
        let source = Arc::new(StubSource::new());
        let controller = controller(source.clone());

        controller.select(DateRange::Month).await.unwrap().wait().await;

        let cumulative = source.last_cumulative.lock().unwrap().unwrap();
        assert_eq!(cumulative.start, utc(NOW) - Duration::days(30));
        assert_eq!(cumulative.end, utc(NOW));
        assert_eq!(cumulative.anchor, utc("2024-01-15T00:00:00Z"));
        assert_eq!(cumulative.interval, Duration::days(1));

        let interval = source.last_interval.lock().unwrap().unwrap();
        assert_eq!(interval.start, utc(NOW) - Duration::days(30));
        assert_eq!(interval.limit, 100);
    }

    #[tokio::test]
    async fn test_denied_authorization_keeps_prior_series() {
        let source = Arc::new(StubSource::new());
        let controller = controller(source.clone());
        controller.refresh().await.unwrap().wait().await;

        source.authorized.store(false, Ordering::SeqCst);
        let result = controller.select(DateRange::Week).await;

        assert!(matches!(result, Err(DashboardError::AuthorizationDenied)));
        let store = controller.store().read().await;
        assert_eq!(store.epoch(), 1);
        assert_eq!(store.get_series("Steps Taken").unwrap().len(), 365);
    }

    #[tokio::test]
    async fn test_failed_metric_is_isolated() {
        let mut source = StubSource::new();
        source.failing = Some(Metric::Steps);
        let controller = controller(Arc::new(source));

        let report = controller.refresh().await.unwrap().wait().await;

        let steps = report.outcome(Metric::Steps).unwrap();
        assert!(matches!(
            steps.result,
            Err(DashboardError::SourceQueryFailed { metric: Metric::Steps, .. })
        ));
        assert!(steps.committed);
        assert_eq!(report.failures().count(), 1);

        let store = controller.store().read().await;
        assert_eq!(store.get_series("Steps Taken"), Some(&[][..]));
        assert_eq!(store.get_series("Minutes Exercised").unwrap().len(), 365);
        assert_eq!(store.get_series("Hours Asleep").unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_reselecting_same_range_refreshes_again() {
        let controller = controller(Arc::new(StubSource::new()));

        let first = controller.select(DateRange::Year).await.unwrap();
        let second = controller.select(DateRange::Year).await.unwrap();

        assert_eq!(first.epoch + 1, second.epoch);
        second.wait().await;
        first.wait().await;
    }

    #[tokio::test]
    async fn test_stale_refresh_does_not_overwrite_newer_one() {
        let gate = Arc::new(Notify::new());
        let mut source = StubSource::new();
        source.year_sleep_gate = Some(gate.clone());
        let controller = controller(Arc::new(source));

        let stale = controller.select(DateRange::Year).await.unwrap();
        let current = controller.select(DateRange::Week).await.unwrap();

        let current_report = current.wait().await;
        assert!(current_report.outcome(Metric::Sleep).unwrap().committed);

        gate.notify_one();
        let stale_report = stale.wait().await;
        assert!(!stale_report.outcome(Metric::Sleep).unwrap().committed);

        let store = controller.store().read().await;
        assert_eq!(store.epoch(), current_report.epoch);
        assert_eq!(store.get_series("Hours Asleep").unwrap()[0].value, 5.0);
        assert_eq!(store.get_series("Steps Taken").unwrap().len(), 7);
    }

    #[tokio::test]
    async fn test_selection_made_during_slow_authorization_wins() {
        let gate = Arc::new(Notify::new());
        let mut source = StubSource::new();
        source.first_auth_gate = Some(gate.clone());
        let source = Arc::new(source);
        let controller = Arc::new(controller(source.clone()));

        let slow = tokio::spawn({
            let controller = controller.clone();
            async move { controller.select(DateRange::Year).await.map(|h| h.epoch) }
        });
        while source.auth_calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }

        let report = controller.select(DateRange::Week).await.unwrap().wait().await;
        assert_eq!(report.range, DateRange::Week);

        gate.notify_one();
        let slow = slow.await.unwrap();
        assert!(matches!(
            slow,
            Err(DashboardError::Superseded {
                range: DateRange::Year
            })
        ));

        assert_eq!(controller.selected().await, DateRange::Week);
        let store = controller.store().read().await;
        assert_eq!(store.epoch(), report.epoch);
        assert_eq!(store.get_series("Steps Taken").unwrap().len(), 7);
        assert_eq!(store.get_series("Hours Asleep").unwrap()[0].value, 5.0);
    }
}
