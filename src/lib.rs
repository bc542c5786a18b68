pub mod app;
pub mod config;
pub mod errors;
pub mod guide;
pub mod handlers;
pub mod kpi;
pub mod models;
pub mod pages;
pub mod session;
pub mod spreadsheet;
pub mod state;
pub mod ui;

pub use app::router;
pub use config::ServerConfig;
pub use kpi::{evaluate_kpi, KpiResult, KpiStatus, SemanticColor};
pub use pages::{next_page, previous_page, PageError, PageList};
pub use state::AppState;
