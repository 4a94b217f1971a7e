#![forbid(unsafe_code)]

//! Core of the propwatch inspector: the reflection contract, the item
//! model, search queries, member sections, watch paths and per-pass text
//! storage. Nothing here draws; see `propwatch-widgets` for traversal and
//! rendering.

pub mod arena;
pub mod config;
pub mod item;
pub mod logging;
pub mod reflect;
pub mod requests;
pub mod search;
pub mod sections;
pub mod settings;
pub mod watch;

#[cfg(any(test, feature = "test-helpers"))]
pub mod mock;

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{debug, debug_span, info, info_span, trace, warn};

pub use config::InspectorConfig;
pub use item::{ItemKind, PropertyItem, PropertyItemCategory, VisitedInfo};
pub use reflect::{ActorSource, FieldId, FieldKind, FunctionId, Reflection, StructId, Value, ValueAddr, WriteError};
pub use requests::PassRequests;
pub use search::{ColumnId, SearchQuery};
pub use watch::{MemberPath, WatchList};
