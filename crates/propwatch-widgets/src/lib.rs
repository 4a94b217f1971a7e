#![forbid(unsafe_code)]

//! Rendering side of propwatch.
//!
//! - [`substrate`]: the immediate-mode UI contract the inspector draws into.
//! - [`value`]: per-kind value text, editors and type colors.
//! - [`tree_view`]: the recursive row traversal with bulk and inline modes.
//! - [`inspector`]: the three-tab window driving a pass.
//! - [`harness`]: a headless recording substrate for tests and snapshots.
//!
//! Drawing never writes to the host. See [`inspector::Inspector`] for how
//! edits are applied after a pass.

pub mod drag;
pub mod harness;
pub mod inspector;
pub mod substrate;
pub mod tree_view;
pub mod value;

pub use drag::DragPayload;
pub use inspector::{HELP_TEXT, Inspector, Tab, UpdateOutcome, ViewState};
pub use substrate::{NodeFlags, NodeResponse, Rgba, Substrate};
pub use tree_view::{InlineDepth, TreeNodeState, TreeOptions, TreeState};
pub use value::Editor;
