use crate::errors::BotError;
use crate::models::{Branch, MetricKind, PeriodLabel, PeriodSlot, Snapshot};
use crate::storage::{load_snapshot, persist_snapshot};
use chrono::{DateTime, Utc};
use std::path::Path;
use tracing::info;

/// In-memory KPI figures for every branch plus the tracked periods.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricStore {
    snapshot: Snapshot,
    last_saved: Option<DateTime<Utc>>,
}

impl MetricStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(mut snapshot: Snapshot) -> Self {
        for branch in Branch::ALL {
            snapshot.branches.entry(branch).or_default();
        }
        Self {
            snapshot,
            last_saved: None,
        }
    }

    /// Loads the persisted snapshot; anything unreadable yields an empty store.
    pub async fn restore(path: &Path) -> Self {
        let loaded = load_snapshot(path).await;
        let mut store = Self::from_snapshot(loaded.snapshot);
        store.last_saved = loaded.saved_at;
        info!(
            periods = store.snapshot.periods.len(),
            "metric store restored from {}",
            path.display()
        );
        store
    }

    pub async fn persist(&mut self, path: &Path) -> Result<(), BotError> {
        let now = Utc::now();
        persist_snapshot(path, &self.snapshot, now).await?;
        self.last_saved = Some(now);
        info!("metric store saved to {}", path.display());
        Ok(())
    }

    pub fn set_metric(&mut self, branch: Branch, kind: MetricKind, value: i64) {
        self.snapshot.branches.entry(branch).or_default().set(kind, value);
    }

    /// Sets `kind` for every branch in enumeration order. Nothing changes
    /// unless exactly one value per branch is given.
    pub fn set_values(&mut self, kind: MetricKind, values: &[i64]) -> Result<(), BotError> {
        if values.len() != Branch::COUNT {
            return Err(BotError::validation(format!(
                "Usage: {} <{} values, one for each TELDA>",
                kind.set_command(),
                Branch::COUNT
            )));
        }
        for (branch, value) in Branch::ALL.into_iter().zip(values) {
            self.set_metric(branch, kind, *value);
        }
        Ok(())
    }

    pub fn set_period(&mut self, slot: PeriodSlot, label: PeriodLabel) {
        self.snapshot.periods.insert(slot, label);
    }

    pub fn metric(&self, branch: Branch, kind: MetricKind) -> Option<i64> {
        self.snapshot.metric(branch, kind)
    }

    pub fn values(&self, kind: MetricKind) -> Vec<(Branch, Option<i64>)> {
        Branch::ALL
            .into_iter()
            .map(|branch| (branch, self.metric(branch, kind)))
            .collect()
    }

    pub fn period(&self, slot: PeriodSlot) -> Option<&PeriodLabel> {
        self.snapshot.period(slot)
    }

    pub fn last_saved(&self) -> Option<DateTime<Utc>> {
        self.last_saved
    }

    pub fn snapshot(&self) -> Snapshot {
        self.snapshot.clone()
    }
}
