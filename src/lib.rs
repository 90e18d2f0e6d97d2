pub mod app;
pub mod commands;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod render;
pub mod report;
pub mod state;
pub mod storage;
pub mod store;
pub mod telegram;

pub use app::router;
pub use config::Config;
pub use state::AppState;
pub use store::MetricStore;
pub use telegram::TelegramBot;
