#![forbid(unsafe_code)]

//! Drag-and-drop payloads exchanged with the UI substrate.
//!
//! Two kinds of payload travel between rows:
//!
//! | Type                      | Data                    | Source              | Target                |
//! |---------------------------|-------------------------|---------------------|-----------------------|
//! | [`MEMBER_PATH`]           | dotted path, UTF-8      | any non-root row    | the inspector window  |
//! | [`WATCH_INDEX`]           | entry index, LE `u64`   | a watch root row    | another watch root    |
//!
//! Targets match payloads by type pattern, so a target can accept a family
//! of payloads with `propwatch/*`.
//!
//! # Failure Modes
//!
//! | Failure                  | Cause                      | Fallback        |
//! |--------------------------|----------------------------|-----------------|
//! | Type mismatch at target  | payload of another kind    | drop ignored    |
//! | Malformed data           | foreign payload, bad bytes | decode is None  |

/// Type of a payload carrying a member path.
pub const MEMBER_PATH: &str = "propwatch/member";
/// Type of a payload carrying a watch list index.
pub const WATCH_INDEX: &str = "propwatch/move-index";

/// Data carried during a drag.
///
/// ```
/// # use propwatch_widgets::drag::{DragPayload, MEMBER_PATH};
/// let payload = DragPayload::member("Player.Health");
/// assert_eq!(payload.drag_type, MEMBER_PATH);
/// assert_eq!(payload.as_path(), Some("Player.Health"));
/// assert!(payload.matches_type("propwatch/*"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DragPayload {
    /// MIME-like type identifier.
    pub drag_type: String,
    /// Raw serialized data.
    pub data: Vec<u8>,
    /// Text shown next to the cursor while dragging.
    pub display_text: Option<String>,
}

impl DragPayload {
    #[must_use]
    pub fn new(drag_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            drag_type: drag_type.into(),
            data,
            display_text: None,
        }
    }

    /// A member path, shown as the drag preview.
    #[must_use]
    pub fn member(path: impl Into<String>) -> Self {
        let path: String = path.into();
        Self {
            drag_type: MEMBER_PATH.to_owned(),
            data: path.as_bytes().to_vec(),
            display_text: Some(path),
        }
    }

    /// A watch list index.
    #[must_use]
    pub fn watch_index(index: usize) -> Self {
        Self::new(WATCH_INDEX, (index as u64).to_le_bytes().to_vec())
            .with_display_text(format!("Move entry {index}"))
    }

    #[must_use]
    pub fn with_display_text(mut self, text: impl Into<String>) -> Self {
        self.display_text = Some(text.into());
        self
    }

    /// The member path, if this is a member payload with UTF-8 data.
    #[must_use]
    pub fn as_path(&self) -> Option<&str> {
        if self.drag_type != MEMBER_PATH {
            return None;
        }
        std::str::from_utf8(&self.data).ok()
    }

    /// The watch index, if this is an index payload of the right length.
    #[must_use]
    pub fn as_watch_index(&self) -> Option<usize> {
        if self.drag_type != WATCH_INDEX {
            return None;
        }
        let bytes: [u8; 8] = self.data.as_slice().try_into().ok()?;
        usize::try_from(u64::from_le_bytes(bytes)).ok()
    }

    /// Exact type match, `*`, or a `prefix/*` wildcard.
    #[must_use]
    pub fn matches_type(&self, pattern: &str) -> bool {
        if pattern == "*" || pattern == "*/*" {
            return true;
        }
        if let Some(prefix) = pattern.strip_suffix("/*") {
            self.drag_type.starts_with(prefix)
                && self.drag_type.as_bytes().get(prefix.len()) == Some(&b'/')
        } else {
            self.drag_type == pattern
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn member_payload_carries_path() {
        let payload = DragPayload::member("A.B.[3]");
        assert_eq!(payload.as_path(), Some("A.B.[3]"));
        assert_eq!(payload.as_watch_index(), None);
        assert_eq!(payload.display_text.as_deref(), Some("A.B.[3]"));
    }

    #[test]
    fn watch_index_decodes() {
        let payload = DragPayload::watch_index(42);
        assert_eq!(payload.as_watch_index(), Some(42));
        assert_eq!(payload.as_path(), None);
    }

    #[test]
    fn malformed_index_is_rejected() {
        let payload = DragPayload::new(WATCH_INDEX, vec![1, 2, 3]);
        assert_eq!(payload.as_watch_index(), None);
    }

    #[test]
    fn type_patterns() {
        let payload = DragPayload::member("x");
        assert!(payload.matches_type(MEMBER_PATH));
        assert!(payload.matches_type("propwatch/*"));
        assert!(payload.matches_type("*"));
        assert!(!payload.matches_type(WATCH_INDEX));
        assert!(!payload.matches_type("prop/*"));
    }
}
