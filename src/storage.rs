use crate::errors::BotError;
use crate::models::{Branch, MetricRecord, PeriodLabel, PeriodSlot, Snapshot};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, path::Path};
use tokio::fs;
use tracing::error;

/// On-disk layout of the snapshot file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct SnapshotFile {
    #[serde(default)]
    saved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    periods: BTreeMap<PeriodSlot, PeriodLabel>,
    #[serde(default)]
    branches: BTreeMap<Branch, MetricRecord>,
}

/// Snapshot read back from disk together with the time it was written.
#[derive(Debug, Default)]
pub struct LoadedSnapshot {
    pub snapshot: Snapshot,
    pub saved_at: Option<DateTime<Utc>>,
}

pub async fn load_snapshot(path: &Path) -> LoadedSnapshot {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice::<SnapshotFile>(&bytes) {
            Ok(file) => {
                let mut snapshot = Snapshot {
                    periods: file.periods,
                    branches: file.branches,
                };
                for branch in Branch::ALL {
                    snapshot.branches.entry(branch).or_default();
                }
                LoadedSnapshot {
                    snapshot,
                    saved_at: file.saved_at,
                }
            }
            Err(err) => {
                error!("failed to parse snapshot file {}: {err}", path.display());
                LoadedSnapshot::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => LoadedSnapshot::default(),
        Err(err) => {
            error!("failed to read snapshot file {}: {err}", path.display());
            LoadedSnapshot::default()
        }
    }
}

pub async fn persist_snapshot(
    path: &Path,
    snapshot: &Snapshot,
    saved_at: DateTime<Utc>,
) -> Result<(), BotError> {
    let file = SnapshotFile {
        saved_at: Some(saved_at),
        periods: snapshot.periods.clone(),
        branches: snapshot.branches.clone(),
    };
    let payload = serde_json::to_vec_pretty(&file).map_err(BotError::persistence)?;
    fs::write(path, payload).await.map_err(|err| {
        error!("failed to write snapshot file {}: {err}", path.display());
        BotError::persistence(err)
    })?;
    Ok(())
}
