#![forbid(unsafe_code)]

//! propwatch public facade.
//!
//! Re-exports the item model, search and watch types from
//! `propwatch-core` and the inspector window from `propwatch-widgets`,
//! plus a small prelude. Hosts implement [`Reflection`] (and optionally
//! [`ActorSource`]) and [`Substrate`], then call [`Inspector::update`]
//! once per frame followed by [`Inspector::apply_requests`].

use std::fmt;

// --- Core re-exports -------------------------------------------------------

pub use propwatch_core::arena::{ArenaStats, TextArena};
pub use propwatch_core::config::InspectorConfig;
pub use propwatch_core::item::{ItemKind, PropertyItem, PropertyItemCategory};
pub use propwatch_core::reflect::{
    ActorSource, CollisionChannel, FieldId, FieldKind, FunctionId, Reflection, StructId, Value,
    ValueAddr, WriteError,
};
pub use propwatch_core::requests::PassRequests;
pub use propwatch_core::search::{ColumnId, SEARCH_HELP, SearchQuery};
pub use propwatch_core::settings::{SettingsError, VersionedState, ViewSettings};
pub use propwatch_core::watch::{MemberPath, WatchList};

// --- Widget re-exports -----------------------------------------------------

pub use propwatch_widgets::drag::DragPayload;
pub use propwatch_widgets::inspector::{HELP_TEXT, Inspector, Tab, UpdateOutcome, ViewState};
pub use propwatch_widgets::substrate::{NodeFlags, NodeResponse, Rgba, Substrate};
pub use propwatch_widgets::value::Editor;

// --- Errors ---------------------------------------------------------------

/// Top-level error type for propwatch hosts.
#[derive(Debug)]
pub enum Error {
    /// The host rejected a queued edit or call.
    Write(WriteError),
    /// Stored view settings could not be read or written.
    Settings(SettingsError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Write(err) => write!(f, "write failed: {err}"),
            Self::Settings(err) => write!(f, "settings: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Write(err) => Some(err),
            Self::Settings(err) => Some(err),
        }
    }
}

impl From<WriteError> for Error {
    fn from(err: WriteError) -> Self {
        Self::Write(err)
    }
}

impl From<SettingsError> for Error {
    fn from(err: SettingsError) -> Self {
        Self::Settings(err)
    }
}

/// Standard result type for propwatch APIs.
pub type Result<T> = std::result::Result<T, Error>;

/// Apply everything queued by earlier passes, failing on the first host
/// error. The remaining failures are still logged by the inspector.
pub fn apply_pending(inspector: &mut Inspector, host: &mut dyn Reflection) -> Result<()> {
    match inspector.apply_requests(host).into_iter().next() {
        Some(err) => Err(err.into()),
        None => Ok(()),
    }
}

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        ActorSource, DragPayload, Error, Inspector, InspectorConfig, PropertyItem,
        PropertyItemCategory, Reflection, Result, SearchQuery, Substrate, UpdateOutcome, Value,
        ValueAddr, ViewSettings, WatchList,
    };

    pub use crate::{core, widgets};
}

pub use propwatch_core as core;
pub use propwatch_widgets as widgets;
