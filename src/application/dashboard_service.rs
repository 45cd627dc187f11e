// Dashboard service - Use cases behind the chart layer
use crate::application::custom_series::CustomSeriesParser;
use crate::application::range_controller::{RangeController, RefreshHandle, RefreshReport};
use crate::application::series_store::StoreEvent;
use crate::domain::range::{DateRange, Window};
use crate::domain::series::SeriesSnapshot;
use crate::error::{DashboardError, ParseError};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::broadcast;

#[derive(Clone)]
pub struct DashboardService {
    controller: Arc<RangeController>,
    parser: CustomSeriesParser,
}

impl DashboardService {
    pub fn new(controller: Arc<RangeController>) -> Self {
        let parser = CustomSeriesParser::new(controller.options().tz);
        Self { controller, parser }
    }

    pub async fn metric_names(&self) -> BTreeSet<String> {
        self.controller.store().read().await.metric_names()
    }

    pub async fn series(&self, name: &str) -> Option<SeriesSnapshot> {
        let store = self.controller.store().read().await;
        store.get_series(name).map(|points| SeriesSnapshot {
            name: name.to_string(),
            unit: store.unit(name).map(str::to_string),
            points: points.to_vec(),
        })
    }

    pub async fn selected_range(&self) -> (DateRange, Window) {
        let range = self.controller.selected().await;
        (range, self.controller.window(range))
    }

    pub async fn select_range(&self, range: DateRange) -> Result<RefreshHandle, DashboardError> {
        self.controller.select(range).await
    }

    pub async fn refresh(&self) -> Result<RefreshHandle, DashboardError> {
        self.controller.refresh().await
    }

    /// Parse a submission and store it; on error the store is not touched.
    pub async fn add_custom_series(
        &self,
        name: &str,
        unit: &str,
        text: &str,
    ) -> Result<SeriesSnapshot, ParseError> {
        let custom = self.parser.parse(name, unit, text)?;
        let snapshot = SeriesSnapshot {
            name: custom.name.clone(),
            unit: Some(custom.unit.clone()),
            points: custom.points.clone(),
        };

        tracing::info!("Adding custom series {} with {} points", custom.name, custom.points.len());
        self.controller.store().write().await.insert_custom(custom);
        Ok(snapshot)
    }

    pub async fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.controller.store().read().await.subscribe()
    }

    /// Let a refresh finish in the background and log how it went.
    pub fn watch(&self, handle: RefreshHandle) {
        tokio::spawn(async move {
            let report = handle.wait().await;
            log_report(&report);
        });
    }
}

fn log_report(report: &RefreshReport) {
    for outcome in report.failures() {
        if let Err(e) = &outcome.result {
            tracing::warn!("Refresh {}: {}", report.epoch, e);
        }
    }

    let stale = report.outcomes.iter().filter(|o| !o.committed).count();
    tracing::info!(
        "Refresh {} ({}) finished: {} metrics, {} failed, {} superseded",
        report.epoch,
        report.range,
        report.outcomes.len(),
        report.failures().count(),
        stale
    );
}
