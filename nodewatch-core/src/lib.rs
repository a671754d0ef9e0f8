pub mod backend;
pub mod classify;
pub mod controller;
pub mod edit;
pub mod error;
pub mod export;
pub mod notice;
pub mod recheck;
pub mod reconcile;
pub mod settings;
pub mod state;
pub mod store;

pub use backend::{Backend, BackendResult};
pub use classify::{RiskClass, SharedClass, risk_class, shared_class};
pub use controller::{ConfirmCallback, Pumped, RECONNECT_DELAY, RunController};
pub use edit::EditSession;
pub use error::ControllerError;
pub use export::{ClipboardSink, ExportError, ExportSession};
pub use notice::{ERROR_DISPLAY_WINDOW, ErrorBanner, Notice, NoticeLevel, Notices};
pub use recheck::RECHECK_PLACEHOLDER;
pub use reconcile::{Disposition, StreamReconciler};
pub use settings::{DEFAULT_SETTINGS_PATH, DEFAULT_SERVER_URL, Settings, SettingsError, expand_path};
pub use state::{AppState, Progress, RunState, STOPPED_LABEL};
pub use store::{NodeStore, SelectionSet};
