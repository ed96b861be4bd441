pub mod canvas;
pub mod config;
pub mod editor;
pub mod error;
pub mod geometry;
pub mod input;
pub mod logging;
pub mod storage;
pub mod sync;

use std::path::PathBuf;

pub use error::{AppError, AppResult};

use editor::EditorSession;
use storage::CaptureStore;

/// Entrypoint used by host integrations: logging, config and font are set up
/// before the session is handed out.
pub fn open_session<S: CaptureStore>(store: S) -> EditorSession<S> {
    logging::init();
    let config = config::load_app_config();
    tracing::info!(
        tool = ?config.tool,
        debounce_ms = config.sync_debounce_ms,
        "starting snapink editor session"
    );
    EditorSession::new(store, &config)
}

/// Where `open_session` looks for `config.json`.
pub fn config_file_path() -> AppResult<PathBuf> {
    Ok(config::default_config_path()?)
}
