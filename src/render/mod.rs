// src/render/mod.rs
// Render module - turns the catalog into painted frames

mod coordinator;
mod debounce;
mod format;
mod frame;
mod token;

pub use coordinator::{RenderCoordinator, RenderOptions};
pub use format::compact_number;
pub use frame::{print_frame, FrameLog, TerminalPainter};
