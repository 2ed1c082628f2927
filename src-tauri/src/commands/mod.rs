//! Commands Layer
//!
//! Tauri command handlers that bridge the frontend to the list actor.

mod item_cmd;
mod log_cmd;
mod session_cmd;

pub use item_cmd::*;
pub use log_cmd::*;
pub use session_cmd::*;
