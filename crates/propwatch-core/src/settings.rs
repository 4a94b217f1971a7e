#![forbid(unsafe_code)]

//! User-facing view settings and their persistence envelope.
//!
//! [`ViewSettings`] is the part of the inspector's state a user expects to
//! survive a restart: the search string, the filter and grouping toggles,
//! and the actor search options. Everything else (cached actor lists,
//! hover carry-over) is rebuilt at runtime.
//!
//! # Design Invariants
//!
//! 1. **Round-trip fidelity**: restoring a saved [`ViewSettings`] yields an
//!    equal value.
//! 2. **Graceful version mismatch**: a stored envelope whose version does
//!    not match [`ViewSettings::VERSION`] restores to the defaults instead
//!    of failing.
//! 3. **Clamping on restore**: the search radius is clamped to a positive
//!    range; stored data is not trusted.
//!
//! # Feature Gate
//!
//! JSON encoding requires the `state-persistence` feature. Without it the
//! envelope is still usable for in-memory versioning.

use core::fmt;

/// Persisted view toggles.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "state-persistence",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct ViewSettings {
    pub search: String,
    /// Hide rows that neither match the search nor can be opened.
    pub filter_active: bool,
    /// Section object members by declaring class.
    pub group_by_owner: bool,
    /// Add a "Functions" section to object rows.
    pub list_functions: bool,
    pub update_actors_every_frame: bool,
    pub search_around_player: bool,
    /// Radius of the proximity search, in meters.
    pub search_radius_m: f32,
    pub draw_search_sphere: bool,
    /// One flag per collision channel, in host order.
    pub channels: Vec<bool>,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            search: String::new(),
            filter_active: false,
            group_by_owner: true,
            list_functions: true,
            update_actors_every_frame: false,
            search_around_player: false,
            search_radius_m: 5.0,
            draw_search_sphere: false,
            channels: Vec::new(),
        }
    }
}

impl ViewSettings {
    /// Schema version of the persisted form.
    pub const VERSION: u32 = 1;

    /// Largest accepted proximity radius, in meters.
    pub const MAX_RADIUS_M: f32 = 10_000.0;

    /// Clamp values that may have been edited by hand.
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        self.search_radius_m = if self.search_radius_m.is_finite() {
            self.search_radius_m.clamp(0.0, Self::MAX_RADIUS_M)
        } else {
            Self::default().search_radius_m
        };
        self
    }

    /// Wrap in a versioned envelope.
    #[must_use]
    pub fn pack(&self) -> VersionedState<Self> {
        VersionedState::new(Self::VERSION, self.clone())
    }

    /// Unwrap an envelope, falling back to defaults on version mismatch.
    #[must_use]
    pub fn unpack(state: VersionedState<Self>) -> Self {
        if state.version == Self::VERSION {
            state.data.sanitized()
        } else {
            crate::warn!(
                target: "propwatch::settings",
                stored = state.version,
                expected = Self::VERSION,
                "discarding view settings with a different version"
            );
            Self::default()
        }
    }

    /// Encode as JSON.
    #[cfg(feature = "state-persistence")]
    pub fn to_json(&self) -> Result<String, SettingsError> {
        serde_json::to_string(&self.pack()).map_err(|e| SettingsError::Serialization(e.to_string()))
    }

    /// Decode from JSON. A version mismatch is not an error; it yields the
    /// defaults.
    #[cfg(feature = "state-persistence")]
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let state: VersionedState<Self> =
            serde_json::from_str(json).map_err(|e| SettingsError::Serialization(e.to_string()))?;
        Ok(Self::unpack(state))
    }
}

/// Version-tagged wrapper for persisted state.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "state-persistence",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct VersionedState<S> {
    pub version: u32,
    pub data: S,
}

impl<S> VersionedState<S> {
    #[must_use]
    pub fn new(version: u32, data: S) -> Self {
        Self { version, data }
    }
}

/// Errors from encoding or decoding settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    /// Malformed or mistyped stored data.
    Serialization(String),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Serialization(msg) => write!(f, "serialization error: {msg}"),
        }
    }
}

impl std::error::Error for SettingsError {}
