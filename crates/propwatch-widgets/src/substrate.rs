#![forbid(unsafe_code)]

//! The immediate-mode UI the inspector draws into.
//!
//! The inspector never owns widgets. Each pass it issues an ordered stream
//! of calls against a [`Substrate`]: table columns, tree nodes, text,
//! editors, drag sources and drop targets. The substrate answers
//! interaction queries (was this toggled, is that hovered) for the item it
//! drew last, ImGui style.
//!
//! # IDs and storage
//!
//! Tree-node open state and the per-node values in [`Substrate::storage_bool`]
//! and [`Substrate::storage_int`] are keyed by the current ID stack plus the
//! given key. Pushing the same IDs on the next pass reads the same values,
//! which is how inline marks survive between passes without the inspector
//! keeping any per-node state of its own.
//!
//! A tree node's open state lives in the same storage: `storage_bool(id)`
//! with the node's id reads whether it is open. Popups do not change the
//! ID stack.
//!
//! # Tables
//!
//! [`Substrate::next_column`] advances one cell and wraps to a new row after
//! the last column. A row that draws fewer cells calls
//! [`Substrate::skip_to_last_column`] so the next row starts cleanly.
//!
//! # Invariants
//!
//! 1. Every `push_id` is matched by a `pop_id`, every `tree_push` by a
//!    `tree_pop`, and every `indent` by an `unindent`, within one pass.
//! 2. A tree node drawn with [`NodeFlags::NO_TREE_PUSH_ON_OPEN`] never
//!    pushes; otherwise an open node pushes its id and the caller pops it.
//! 3. Interaction queries refer to the last widget drawn.

use bitflags::bitflags;

use crate::drag::DragPayload;
use crate::value::Editor;
use propwatch_core::Value;

/// 8-bit RGBA color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// From 0..=1 channels, rounded and clamped.
    #[must_use]
    pub fn from_unit(r: f32, g: f32, b: f32, a: f32) -> Self {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        Self::new(q(r), q(g), q(b), q(a))
    }
}

/// Highlight for rows matching the search, and for hovered addresses.
pub const HIGHLIGHT: Rgba = Rgba::new(255, 128, 0, 255);

/// Dimmed text used for section headers.
pub const SECTION_TEXT: Rgba = Rgba::new(255, 255, 255, 128);

bitflags! {
    /// Tree node behavior.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct NodeFlags: u8 {
        /// Open the first time the node is seen.
        const DEFAULT_OPEN = 1 << 0;
        /// Draw with a header frame.
        const FRAMED = 1 << 1;
        /// No expand arrow; the node never opens.
        const LEAF = 1 << 2;
        /// Do not push the node id when open.
        const NO_TREE_PUSH_ON_OPEN = 1 << 3;
        /// Left-arrow navigation from a child lands on this node.
        const NAV_LEFT_JUMPS_BACK = 1 << 4;
    }
}

/// One tree node call.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeRequest<'a> {
    /// Stable id, scoped by the ID stack.
    pub id: &'a str,
    pub label: &'a str,
    pub flags: NodeFlags,
    /// Force the stored open state before drawing.
    pub set_open: Option<bool>,
    /// Label color.
    pub color: Option<Rgba>,
    /// Draw the label disabled.
    pub disabled: bool,
}

impl<'a> NodeRequest<'a> {
    #[must_use]
    pub fn new(id: &'a str, label: &'a str) -> Self {
        Self {
            id,
            label,
            flags: NodeFlags::empty(),
            set_open: None,
            color: None,
            disabled: false,
        }
    }

    #[must_use]
    pub fn with_flags(mut self, flags: NodeFlags) -> Self {
        self.flags |= flags;
        self
    }

    #[must_use]
    pub fn with_set_open(mut self, open: Option<bool>) -> Self {
        self.set_open = open;
        self
    }

    #[must_use]
    pub fn with_color(mut self, color: Option<Rgba>) -> Self {
        self.color = color;
        self
    }

    #[must_use]
    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }
}

/// What happened to a tree node this pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NodeResponse {
    /// Open after this call.
    pub open: bool,
    /// The user toggled it this pass.
    pub toggled: bool,
    /// Set when the toggle happened with the bulk modifier held: the digit
    /// key held at the time, or `0` for none.
    pub bulk_digit: Option<u8>,
}

/// Column the user sorted by.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SortSpec {
    pub column: usize,
    pub ascending: bool,
}

/// A table column definition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColumnSetup {
    pub name: &'static str,
    /// Hidden until the user enables it.
    pub default_hidden: bool,
    pub sortable: bool,
    /// Disabled columns cannot be shown at all.
    pub disabled: bool,
}

impl ColumnSetup {
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            default_hidden: false,
            sortable: false,
            disabled: false,
        }
    }

    #[must_use]
    pub const fn hidden(mut self) -> Self {
        self.default_hidden = true;
        self
    }

    #[must_use]
    pub const fn sortable(mut self, sortable: bool) -> Self {
        self.sortable = sortable;
        self
    }

    #[must_use]
    pub const fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }
}

/// Immediate-mode drawing and interaction.
pub trait Substrate {
    // ------------------------------------------------------------------
    // Window and IDs
    // ------------------------------------------------------------------

    /// Begin the window. `false` means collapsed; still call `end_window`.
    fn begin_window(&mut self, title: &str) -> bool;
    fn end_window(&mut self);
    fn push_id(&mut self, id: &str);
    fn pop_id(&mut self);

    // ------------------------------------------------------------------
    // Tabs and tables
    // ------------------------------------------------------------------

    /// `true` when this tab is selected; then call `end_tab_item`.
    fn tab_item(&mut self, label: &str) -> bool;
    fn end_tab_item(&mut self);
    fn begin_table(&mut self, id: &str, columns: &[ColumnSetup]) -> bool;
    fn end_table(&mut self);
    /// The sort order, when the user changed it since the last call.
    fn sort_specs(&mut self) -> Option<SortSpec>;
    /// Advance one cell. Returns whether the cell is visible.
    fn next_column(&mut self) -> bool;
    fn skip_to_last_column(&mut self);
    fn set_row_tint(&mut self, tint: Rgba);

    // ------------------------------------------------------------------
    // Tree
    // ------------------------------------------------------------------

    fn tree_node(&mut self, request: &NodeRequest<'_>) -> NodeResponse;
    fn tree_push(&mut self, id: &str);
    fn tree_pop(&mut self);
    fn indent(&mut self);
    fn unindent(&mut self);

    // ------------------------------------------------------------------
    // Widgets
    // ------------------------------------------------------------------

    fn text(&mut self, text: &str);
    fn text_colored(&mut self, color: Rgba, text: &str);
    fn text_disabled(&mut self, text: &str);
    /// Small colored dot, used as a type swatch.
    fn bullet(&mut self, color: Rgba);
    /// Tooltip for the last widget, shown while it is hovered.
    fn tooltip(&mut self, text: &str);
    fn button(&mut self, label: &str, enabled: bool) -> bool;
    /// The new value when the user clicked it.
    fn checkbox(&mut self, label: &str, value: bool) -> Option<bool>;
    fn slider_int(&mut self, label: &str, value: i32, min: i32, max: i32, enabled: bool) -> Option<i32>;
    fn input_float(&mut self, label: &str, value: f32, enabled: bool) -> Option<f32>;
    /// The committed text when the user pressed enter.
    fn input_text(&mut self, id: &str, hint: &str, value: &str) -> Option<String>;
    /// Toggle-able entry inside a popup. Returns the new state when clicked.
    fn selectable(&mut self, label: &str, selected: bool) -> Option<bool>;
    /// Draw a value editor. Returns a committed edit.
    fn value_editor(&mut self, id: &str, editor: &Editor) -> Option<Value>;

    // ------------------------------------------------------------------
    // Last item state
    // ------------------------------------------------------------------

    fn is_item_visible(&self) -> bool;
    fn is_item_hovered(&self) -> bool;
    fn is_item_right_clicked(&self) -> bool;

    // ------------------------------------------------------------------
    // Popups
    // ------------------------------------------------------------------

    fn open_popup(&mut self, id: &str);
    /// `true` while the popup is shown; then call `end_popup`.
    fn begin_popup(&mut self, id: &str) -> bool;
    fn end_popup(&mut self);

    // ------------------------------------------------------------------
    // Drag and drop
    // ------------------------------------------------------------------

    /// Offer the last item as a drag source.
    fn drag_source(&mut self, payload: DragPayload);
    /// Accept a payload dropped on the last item.
    fn drop_target(&mut self, pattern: &str) -> Option<DragPayload>;
    /// Accept a payload dropped anywhere on the window.
    fn window_drop_target(&mut self, pattern: &str) -> Option<DragPayload>;

    // ------------------------------------------------------------------
    // Keyed storage
    // ------------------------------------------------------------------

    fn storage_bool(&self, key: &str, default: bool) -> bool;
    fn set_storage_bool(&mut self, key: &str, value: bool);
    fn storage_int(&self, key: &str, default: i32) -> i32;
    fn set_storage_int(&mut self, key: &str, value: i32);
}
