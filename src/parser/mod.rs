//! Parser Module
//!
//! Streaming, path-addressed XML extraction. Handlers are registered against
//! full slash-delimited element paths and fire during a single forward pass,
//! so no document tree is ever built.

mod path;
mod state;
mod stream;

// Re-export public types
pub use path::PathTracker;
pub use state::ParseState;
pub use stream::{Element, EnterHandler, ExitHandler, StreamingRecordParser};
