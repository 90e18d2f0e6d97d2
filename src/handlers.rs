use crate::commands::{Command, HELP_TEXT};
use crate::errors::{AppError, BotError};
use crate::models::{Branch, CommandRequest, CommandResponse, MetricKind, PeriodSlot, Snapshot};
use crate::render::render_report;
use crate::report::compute_report;
use crate::state::AppState;
use crate::store::MetricStore;
use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{debug, info, warn};

pub const REPORT_CAPTION: &str = "✅ Report generated!";

/// What a command sends back to the chat.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Text(String),
    Photo { png: Vec<u8>, caption: String },
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        match self {
            Reply::Text(reply) => Json(CommandResponse { reply }).into_response(),
            Reply::Photo { png, .. } => ([(header::CONTENT_TYPE, "image/png")], png).into_response(),
        }
    }
}

/// Parses and runs chat text. Non-command text yields no reply; every
/// failure becomes a text reply.
pub async fn handle_text(state: &AppState, text: &str) -> Option<Reply> {
    let command = match Command::parse(text) {
        Ok(Some(command)) => command,
        Ok(None) => return None,
        Err(err) => {
            info!("rejected command {text:?}: {err}");
            return Some(Reply::Text(err.user_message()));
        }
    };

    match execute(state, command).await {
        Ok(reply) => Some(reply),
        Err(err) => {
            warn!("command {text:?} failed: {err}");
            Some(Reply::Text(err.user_message()))
        }
    }
}

pub async fn execute(state: &AppState, command: Command) -> Result<Reply, BotError> {
    debug!(?command, "executing command");
    match command {
        Command::Help => Ok(Reply::Text(HELP_TEXT.to_string())),
        Command::SetPeriod { slot, label } => {
            let text = format!("✅ {} period set: {label}", slot.label());
            state.store.lock().await.set_period(slot, label);
            Ok(Reply::Text(text))
        }
        Command::SetValues { kind, values } => {
            state.store.lock().await.set_values(kind, &values)?;
            Ok(Reply::Text(format!(
                "✅ {} values set successfully for each TELDA!",
                kind.label()
            )))
        }
        Command::SetOne {
            kind,
            branch,
            value,
        } => {
            state.store.lock().await.set_metric(branch, kind, value);
            Ok(Reply::Text(format!(
                "✅ {} for {branch} set to {value}.",
                kind.label()
            )))
        }
        Command::List(kind) => {
            let store = state.store.lock().await;
            Ok(Reply::Text(list_text(&store, kind)))
        }
        Command::Status => {
            let store = state.store.lock().await;
            Ok(Reply::Text(status_text(&store)))
        }
        Command::Report => {
            let png = build_report_image(state).await?;
            Ok(Reply::Photo {
                png,
                caption: REPORT_CAPTION.to_string(),
            })
        }
        Command::Save => {
            state.store.lock().await.persist(&state.data_path).await?;
            Ok(Reply::Text("✅ Successfully saved data".to_string()))
        }
    }
}

/// Renders the report from a point-in-time copy of the store.
pub async fn build_report_image(state: &AppState) -> Result<Vec<u8>, BotError> {
    let snapshot = state.store.lock().await.snapshot();
    let report = compute_report(&snapshot)?;
    tokio::task::spawn_blocking(move || render_report(&report))
        .await
        .map_err(BotError::render)?
}

fn list_text(store: &MetricStore, kind: MetricKind) -> String {
    let mut text = format!("📋 {} Values Status:\n", kind.label());
    for (branch, value) in store.values(kind) {
        let value = value.map_or_else(|| "-".to_string(), |value| value.to_string());
        text.push_str(&format!("\n• {branch}: {value}"));
    }
    text
}

fn status_text(store: &MetricStore) -> String {
    let mut text = String::from("📊 Status:\n");
    for slot in [PeriodSlot::Mtd, PeriodSlot::Ytd] {
        let period = store
            .period(slot)
            .map_or_else(|| "not set".to_string(), |label| label.to_string());
        text.push_str(&format!("\n{}: {period}", slot.label()));
    }
    text.push('\n');
    for kind in MetricKind::ALL {
        let set = store
            .values(kind)
            .iter()
            .filter(|(_, value)| value.is_some())
            .count();
        text.push_str(&format!("\n{}: {set}/{} set", kind.label(), Branch::COUNT));
    }
    let saved = store.last_saved().map_or_else(
        || "never".to_string(),
        |at| at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    );
    text.push_str(&format!("\n\nLast saved: {saved}"));
    text
}

pub async fn post_command(
    State(state): State<AppState>,
    Json(payload): Json<CommandRequest>,
) -> Result<Reply, AppError> {
    let command = Command::parse(&payload.text)?
        .ok_or_else(|| AppError::bad_request("text must contain a command"))?;
    Ok(execute(&state, command).await?)
}

pub async fn get_snapshot(State(state): State<AppState>) -> Json<Snapshot> {
    Json(state.store.lock().await.snapshot())
}

pub async fn get_report(State(state): State<AppState>) -> Result<Reply, AppError> {
    let png = build_report_image(&state).await?;
    Ok(Reply::Photo {
        png,
        caption: REPORT_CAPTION.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PeriodLabel;

    fn test_state(dir: &tempfile::TempDir) -> AppState {
        AppState::new(dir.path().join("state.json"), MetricStore::new())
    }

    fn values(value: i64) -> String {
        vec![value.to_string(); Branch::COUNT].join(" ")
    }

    async fn text_reply(state: &AppState, text: &str) -> String {
        match handle_text(state, text).await {
            Some(Reply::Text(reply)) => reply,
            other => panic!("expected text reply for {text}, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn free_text_gets_no_reply() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);
        assert_eq!(handle_text(&state, "good morning").await, None);
    }

    #[tokio::test]
    async fn wrong_argument_count_leaves_store_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);
        text_reply(&state, &format!("/set_tgt {}", values(5))).await;
        let before = state.store.lock().await.snapshot();

        let reply = text_reply(&state, "/set_tgt 1 2 3").await;
        assert_eq!(reply, "❌ Usage: /set_tgt <10 values, one for each TELDA>");
        let reply = text_reply(&state, "/set_tgt 1 2 3 4 5 6 7 8 9 oops").await;
        assert_eq!(reply, "❌ 'oops' is not a valid integer for TOBA.");

        assert_eq!(state.store.lock().await.snapshot(), before);
    }

    #[tokio::test]
    async fn every_batch_setter_checks_argument_count() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);
        text_reply(&state, &format!("/set_baseline {}", values(3))).await;
        let before = state.store.lock().await.snapshot();

        for kind in MetricKind::ALL {
            for count in [Branch::COUNT - 1, Branch::COUNT + 1] {
                let text = format!("{} {}", kind.set_command(), vec!["1"; count].join(" "));
                let reply = text_reply(&state, &text).await;
                assert_eq!(
                    reply,
                    format!("❌ Usage: {} <10 values, one for each TELDA>", kind.set_command())
                );
            }
        }

        assert_eq!(state.store.lock().await.snapshot(), before);
    }

    #[tokio::test]
    async fn report_before_data_names_missing_field() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);
        text_reply(&state, "/set_mtd June 2025").await;
        text_reply(&state, &format!("/set_tgt {}", values(100))).await;

        let reply = text_reply(&state, "/print_table").await;
        assert_eq!(
            reply,
            "❌ REAL value for 'BINJAI' is not set. Use /set_real to set it."
        );
    }

    #[tokio::test]
    async fn report_replies_with_png() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);
        text_reply(&state, "/set_mtd June 2025").await;
        text_reply(&state, &format!("/set_tgt {}", values(100))).await;
        text_reply(&state, &format!("/set_real {}", values(45))).await;

        match handle_text(&state, "/print_table").await {
            Some(Reply::Photo { png, caption }) => {
                assert_eq!(caption, REPORT_CAPTION);
                assert_eq!(&png[..4], b"\x89PNG");
            }
            other => panic!("expected photo, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn list_and_status_show_stored_values() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);
        text_reply(&state, "/set tgt siantar 77").await;
        text_reply(&state, "/set_ytd Dec 2024").await;

        let list = text_reply(&state, "/list_tgt").await;
        assert!(list.starts_with("📋 TGT Values Status:"));
        assert!(list.contains("• SIANTAR: 77"));
        assert!(list.contains("• BINJAI: -"));

        let status = text_reply(&state, "/status").await;
        assert!(status.contains("MTD: not set"));
        assert!(status.contains("YTD: DEC 2024"));
        assert!(status.contains("TGT: 1/10 set"));
        assert!(status.contains("Last saved: never"));
    }

    #[tokio::test]
    async fn save_writes_snapshot_file() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);
        state.store.lock().await.set_period(
            PeriodSlot::Mtd,
            PeriodLabel {
                month: "June".into(),
                year: 2025,
            },
        );

        let reply = text_reply(&state, "/save").await;
        assert_eq!(reply, "✅ Successfully saved data");

        let restored = MetricStore::restore(&state.data_path).await;
        assert_eq!(restored.snapshot(), state.store.lock().await.snapshot());
    }

    #[tokio::test]
    async fn failed_save_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::new(dir.path().join("missing").join("state.json"), MetricStore::new());
        let reply = text_reply(&state, "/save").await;
        assert!(reply.starts_with("❌ Failed to save data:"));
    }
}
