pub mod catalog;
pub mod config;
pub mod models;
pub mod orchestrator;
pub mod reconciliation;
pub mod sheets;
pub mod tracing;

pub mod util {
    pub mod env;
    pub mod retry;
    pub mod text;
}

pub use config::AppConfig;
pub use models::{CatalogEntry, CellUpdate, ConfigRow, PriceTarget, RunMode};
pub use reconciliation::{reconcile, CatalogSnapshot, NoteLanguage, ReconcileOutput};
