//! Orchestrator: load, browse, edit, submit and delete records of one
//! object type

pub mod app;
pub mod state;

pub use app::RecordBrowser;
pub use state::{BrowserPhase, BrowserView, Intent};
