//! Editing session: tools, gestures, history and the session that ties them
//! to the canvas and the capture store.

pub mod gesture;
pub mod history;
mod session;
pub mod tools;

pub use gesture::{
    CommitKind, GestureController, GestureError, GestureEvent, GestureOutcome, GestureResult,
    GestureState, PointerButton, PointerEvent,
};
pub use history::{HistoryAction, HistoryManager, MAX_HISTORY};
pub use session::{EditorSession, LoadRequest};
pub use tools::{ToolKind, ToolState};
