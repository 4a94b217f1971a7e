#![forbid(unsafe_code)]

//! Recursive row traversal.
//!
//! [`TreeState`] walks items depth first and emits one table row per
//! visible item. Children are re-derived from the host on every pass; the
//! only state that survives a pass lives in the substrate's keyed storage
//! (open flags, inline marks).
//!
//! # Node states
//!
//! | State     | Row emitted | Children drawn | Indented |
//! |-----------|-------------|----------------|----------|
//! | Collapsed | yes         | no             | -        |
//! | Open      | yes         | yes            | yes      |
//! | Inlined   | no          | yes            | no       |
//! | Skipped   | no          | no             | -        |
//!
//! A row is skipped when the filter is on, the row does not pass the query
//! and the row cannot be opened. Rows that can be opened are kept, since a
//! descendant might match.
//!
//! # Bulk modes
//!
//! Shift-toggling a node starts a bulk toggle that opens (or closes) every
//! node below it up to a depth limit. Marking a node inlined starts inline
//! mode, which merges the rows below it into its own level, again up to a
//! depth limit. Each mode is started by one row and ended by the same
//! row's [`TreeState::end_tree_node`], so modes nest with the recursion.
//!
//! # Invariants
//!
//! 1. While a bulk mode is active, every open row pushes its identity on
//!    the visited stack before drawing children and pops it after. The
//!    stack always mirrors the current path.
//! 2. A bulk toggle never opens a node whose identity is on the visited
//!    stack, and inline mode never inlines one. Cycles therefore end.
//! 3. Once [`TreeState::rows_drawn`] reaches the row ceiling the pass stops
//!    descending; [`TreeState::aborted`] reports it.
//! 4. Every text computed for a row lives in the pass arena and is
//!    released when the row finishes.

use propwatch_core::arena::{ArenaText, TextArena};
use propwatch_core::item::{ItemKind, PropertyItem, VisitedInfo};
use propwatch_core::reflect::{RefState, Reflection, ValueAddr};
use propwatch_core::requests::PassRequests;
use propwatch_core::search::{ColumnId, ColumnLookup, SearchQuery};
use propwatch_core::sections::SectionRuns;
use propwatch_core::settings::ViewSettings;
use propwatch_core::InspectorConfig;
use smallvec::SmallVec;

use crate::drag::{DragPayload, WATCH_INDEX};
use crate::substrate::{HIGHLIGHT, NodeFlags, NodeRequest, Rgba, SECTION_TEXT, Substrate};
use crate::value::{self, Editor};

/// Id of every item's tree node, scoped by the item's pushed id.
pub const NODE_ID: &str = "##Object";
/// Right-click popup of an item row.
pub const ITEM_POPUP: &str = "ItemPopup";
/// Storage key of the inline mark.
pub const KEY_INLINED: &str = "IsInlined";
/// Storage key of the inline depth.
pub const KEY_INLINE_DEPTH: &str = "InlinedStackDepth";
/// Label of the function call button.
pub const CALL_LABEL: &str = "Call Function";

const VALUE_ID: &str = "##Value";

// ---------------------------------------------------------------------------
// Inline depth
// ---------------------------------------------------------------------------

/// How many levels an inlined node merges into its own level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InlineDepth {
    Levels(u8),
    Unlimited,
}

impl Default for InlineDepth {
    fn default() -> Self {
        Self::Levels(1)
    }
}

impl InlineDepth {
    /// Stored value of [`InlineDepth::Unlimited`].
    pub const STORAGE_UNLIMITED: i32 = -1;

    /// Decode a stored depth. Anything but `-1` and `1..=255` reads as one
    /// level.
    #[must_use]
    pub fn from_storage(raw: i32) -> Self {
        match raw {
            Self::STORAGE_UNLIMITED => Self::Unlimited,
            n => u8::try_from(n)
                .ok()
                .filter(|&n| n > 0)
                .map_or_else(Self::default, Self::Levels),
        }
    }

    #[must_use]
    pub fn to_storage(self) -> i32 {
        match self {
            Self::Levels(n) => i32::from(n),
            Self::Unlimited => Self::STORAGE_UNLIMITED,
        }
    }

    /// Deepest inlined depth for a node marked at `depth`.
    #[must_use]
    pub fn limit_from(self, depth: usize) -> usize {
        match self {
            Self::Levels(n) => depth.saturating_add(usize::from(n)),
            Self::Unlimited => usize::MAX,
        }
    }
}

// ---------------------------------------------------------------------------
// Per-node and per-pass state
// ---------------------------------------------------------------------------

/// Inputs and results of one tree node.
#[derive(Clone, Debug, Default)]
pub struct TreeNodeState {
    has_branches: bool,
    identity: VisitedInfo,
    text_color: Option<Rgba>,
    disabled: bool,
    /// Depth used for the row tint, when it differs from the real depth.
    visual_depth: Option<usize>,
    no_tree_push: bool,

    open: bool,
    inlined: bool,
    tree_pushed: bool,
    activated_bulk: bool,
    inline_root: bool,
}

impl TreeNodeState {
    /// Node of an item row.
    #[must_use]
    pub fn for_item(has_branches: bool, identity: VisitedInfo) -> Self {
        Self {
            has_branches,
            identity,
            ..Self::default()
        }
    }

    /// Node of a section header.
    #[must_use]
    pub fn section() -> Self {
        Self {
            has_branches: true,
            text_color: Some(SECTION_TEXT),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_text_color(mut self, color: Option<Rgba>) -> Self {
        self.text_color = color;
        self
    }

    #[must_use]
    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    #[must_use]
    pub fn with_visual_depth(mut self, depth: usize) -> Self {
        self.visual_depth = Some(depth);
        self
    }

    /// Never push the node id, even when open.
    #[must_use]
    pub fn with_no_tree_push(mut self) -> Self {
        self.no_tree_push = true;
        self
    }

    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.open
    }

    #[must_use]
    pub const fn is_inlined(&self) -> bool {
        self.inlined
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct BulkToggle {
    open: bool,
    depth_limit: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct InlineMode {
    depth_limit: usize,
    /// Path segments hidden from inlined names.
    path_offset: usize,
}

/// Pass-wide switches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TreeOptions {
    pub filter_active: bool,
    pub group_by_owner: bool,
    pub list_functions: bool,
    pub max_rows: usize,
    pub default_bulk_depth: usize,
    pub inline_depth_max: u8,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self::new(&InspectorConfig::default(), &ViewSettings::default())
    }
}

impl TreeOptions {
    #[must_use]
    pub fn new(config: &InspectorConfig, settings: &ViewSettings) -> Self {
        Self {
            filter_active: settings.filter_active,
            group_by_owner: settings.group_by_owner,
            list_functions: settings.list_functions,
            max_rows: config.max_rows,
            default_bulk_depth: config.default_bulk_depth,
            inline_depth_max: config.inline_depth_max,
        }
    }
}

/// The top-level watch entry currently being drawn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WatchRow {
    pub index: usize,
    pub path: String,
}

/// Traversal state for one table in one pass.
pub struct TreeState<'a> {
    host: &'a dyn Reflection,
    query: &'a SearchQuery,
    options: TreeOptions,
    watch_row: Option<WatchRow>,

    bulk: Option<BulkToggle>,
    inline: Option<InlineMode>,
    visited: SmallVec<[VisitedInfo; 8]>,
    path: Vec<String>,

    rows_drawn: usize,
    aborted: bool,
    hovered_before: Option<ValueAddr>,
    hovered: Option<ValueAddr>,
    requests: PassRequests,
}

impl<'a> TreeState<'a> {
    #[must_use]
    pub fn new(host: &'a dyn Reflection, query: &'a SearchQuery, options: TreeOptions) -> Self {
        Self {
            host,
            query,
            options,
            watch_row: None,
            bulk: None,
            inline: None,
            visited: SmallVec::new(),
            path: Vec::new(),
            rows_drawn: 0,
            aborted: false,
            hovered_before: None,
            hovered: None,
            requests: PassRequests::default(),
        }
    }

    /// Address hovered in the previous pass; rows at it are highlighted.
    #[must_use]
    pub fn with_hovered(mut self, address: Option<ValueAddr>) -> Self {
        self.hovered_before = address;
        self
    }

    /// Treat the next top-level rows as this watch entry.
    pub fn set_watch_row(&mut self, row: Option<WatchRow>) {
        self.watch_row = row;
    }

    #[must_use]
    pub fn host(&self) -> &'a dyn Reflection {
        self.host
    }

    #[must_use]
    pub const fn rows_drawn(&self) -> usize {
        self.rows_drawn
    }

    #[must_use]
    pub const fn aborted(&self) -> bool {
        self.aborted
    }

    /// Address hovered during this pass.
    #[must_use]
    pub const fn hovered(&self) -> Option<ValueAddr> {
        self.hovered
    }

    #[must_use]
    pub fn requests(&self) -> &PassRequests {
        &self.requests
    }

    #[must_use]
    pub fn into_requests(self) -> PassRequests {
        self.requests
    }

    fn is_visited(&self, identity: &VisitedInfo) -> bool {
        self.visited.iter().any(|v| v == identity)
    }

    fn is_bulk_active(&self, depth: usize) -> bool {
        self.bulk.is_some_and(|b| depth <= b.depth_limit)
    }

    fn is_watch_root(&self, depth: usize) -> bool {
        depth == 0 && self.watch_row.is_some()
    }

    // -----------------------------------------------------------------------
    // Tree nodes
    // -----------------------------------------------------------------------

    /// Open a node: either an inlined node (no row, no indent) or a row
    /// with a tree node in its first cell. Returns whether children should
    /// be drawn. Always pair with [`end_tree_node`](Self::end_tree_node).
    pub fn begin_tree_node(
        &mut self,
        ui: &mut dyn Substrate,
        id: &str,
        label: &str,
        node: &mut TreeNodeState,
        depth: usize,
        extra: NodeFlags,
    ) -> bool {
        let inlined = node.has_branches
            && self.inline.is_some_and(|m| depth <= m.depth_limit)
            && !self.is_visited(&node.identity);
        if inlined {
            node.open = true;
            node.inlined = true;
            node.tree_pushed = true;
            ui.tree_push(id);
            ui.unindent();
            return true;
        }

        ui.next_column();
        if let Some(tint) = value::row_tint(node.visual_depth.unwrap_or(depth)) {
            ui.set_row_tint(tint);
        }

        let mut forced = false;
        let mut set_open = None;
        if let Some(bulk) = self.bulk.filter(|_| node.has_branches) {
            let stored = ui.storage_bool(id, false);
            if bulk.open != stored {
                let blocked = bulk.open
                    && ((!node.identity.addr.is_null() && self.is_visited(&node.identity))
                        || depth > bulk.depth_limit);
                if !blocked {
                    set_open = Some(bulk.open);
                    forced = true;
                }
            }
        }

        let mut flags = extra;
        flags |= if node.has_branches {
            NodeFlags::NAV_LEFT_JUMPS_BACK
        } else {
            NodeFlags::LEAF | NodeFlags::NO_TREE_PUSH_ON_OPEN
        };
        if node.no_tree_push {
            flags |= NodeFlags::NO_TREE_PUSH_ON_OPEN;
        }

        let request = NodeRequest::new(id, label)
            .with_flags(flags)
            .with_set_open(set_open)
            .with_color(node.text_color)
            .with_disabled(node.disabled);
        let response = ui.tree_node(&request);
        if node.has_branches {
            node.open = response.open;
            node.tree_pushed = response.open && !flags.contains(NodeFlags::NO_TREE_PUSH_ON_OPEN);
        }

        if response.toggled && self.bulk.is_none() {
            if let Some(digit) = response.bulk_digit {
                let levels = if digit == 0 {
                    self.options.default_bulk_depth
                } else {
                    usize::from(digit)
                };
                node.activated_bulk = true;
                self.bulk = Some(BulkToggle {
                    open: node.open,
                    depth_limit: depth.saturating_add(levels),
                });
                propwatch_core::debug!(
                    target: "propwatch::pass",
                    open = node.open,
                    depth,
                    levels,
                    "bulk toggle started"
                );
            }
        }

        // A node the bulk toggle just closed draws its children once more
        // so they get closed too.
        if self.is_bulk_active(depth) && (node.activated_bulk || forced) && !node.open {
            if !flags.contains(NodeFlags::NO_TREE_PUSH_ON_OPEN) {
                ui.tree_push(id);
                node.tree_pushed = true;
            }
            node.open = true;
        }

        node.open
    }

    /// Start inline mode at this node when it is marked and no inline mode
    /// is running.
    pub fn set_inline(
        &mut self,
        node: &mut TreeNodeState,
        path_len: usize,
        depth: usize,
        mark: Option<InlineDepth>,
    ) {
        let Some(levels) = mark else {
            return;
        };
        if self.inline.is_some() {
            return;
        }
        node.inline_root = true;
        self.inline = Some(InlineMode {
            depth_limit: levels.limit_from(depth),
            path_offset: path_len,
        });
        propwatch_core::debug!(target: "propwatch::pass", depth, ?levels, "inline mode started");
    }

    /// Close a node opened by [`begin_tree_node`](Self::begin_tree_node)
    /// and end the modes it started.
    pub fn end_tree_node(&mut self, ui: &mut dyn Substrate, node: &TreeNodeState) {
        if node.inlined {
            ui.tree_pop();
            ui.indent();
        } else if node.tree_pushed {
            ui.tree_pop();
        }
        if node.activated_bulk {
            self.bulk = None;
        }
        if node.inline_root {
            self.inline = None;
        }
    }

    /// A section header row: `(name)`, framed, tinted one level deeper.
    /// Nothing else is drawn in the row.
    pub fn begin_section(
        &mut self,
        ui: &mut dyn Substrate,
        name: &str,
        node: &mut TreeNodeState,
        depth: usize,
        extra: NodeFlags,
    ) -> bool {
        node.has_branches = true;
        node.visual_depth.get_or_insert(depth + 1);
        let label = format!("({name})");
        let open = self.begin_tree_node(ui, &label, &label, node, depth, extra | NodeFlags::FRAMED);
        if !node.inlined {
            ui.skip_to_last_column();
        }
        open
    }

    // -----------------------------------------------------------------------
    // Rows
    // -----------------------------------------------------------------------

    /// Draw `item` and, when open, everything below it.
    pub fn draw_item_row(
        &mut self,
        ui: &mut dyn Substrate,
        arena: &mut TextArena,
        item: &PropertyItem,
        depth: usize,
    ) {
        if self.aborted {
            return;
        }
        if self.rows_drawn >= self.options.max_rows {
            self.aborted = true;
            propwatch_core::warn!(
                target: "propwatch::pass",
                max_rows = self.options.max_rows,
                "row ceiling reached, pass aborted"
            );
            return;
        }
        let host = self.host;
        let mark = arena.checkpoint();

        let mut cells = RowCells::default();
        cells.ensure(self, arena, item, ColumnId::Name, depth);
        let referenced = self.query.referenced_columns();
        for column in ColumnId::ALL {
            if referenced.contains(column.mask()) {
                cells.ensure(self, arena, item, column, depth);
            }
        }
        let matched = !self.query.is_empty() && self.query.evaluate(&cells.lookup(arena));
        let passes = self.query.is_empty() || matched;
        if self.options.filter_active && !passes && !item.can_be_opened(host) {
            arena.rollback(mark);
            return;
        }

        self.rows_drawn += 1;
        let display_name = item.display_name(host);
        if depth == 0 {
            match item.id_override() {
                Some(id) => ui.push_id(id),
                // Null roots share an address; the row index keeps their
                // open states apart.
                None if item.addr().is_null() => {
                    ui.push_id(&format!("{display_name}#{}", self.rows_drawn));
                }
                None => ui.push_id(&item.addr().to_string()),
            }
        } else {
            ui.push_id(&display_name);
        }
        self.path.push(display_name);

        let mut node = TreeNodeState::for_item(item.can_be_opened(host), item.identity(host))
            .with_text_color(matched.then_some(HIGHLIGHT))
            .with_disabled(!item.is_valid());
        let label = cells.text(arena, ColumnId::Name);
        self.begin_tree_node(ui, NODE_ID, label, &mut node, depth, NodeFlags::empty());

        if !node.inlined {
            self.draw_row_decorations(ui, &mut node, item, depth);
            if ui.is_item_visible() {
                self.draw_columns(ui, arena, &mut cells, item, depth);
            } else {
                ui.skip_to_last_column();
            }
        }

        if node.open {
            let track = self.bulk.is_some() || self.inline.is_some();
            if track {
                self.visited.push(node.identity.clone());
            }
            self.draw_item_children(ui, arena, item, depth);
            if track {
                self.visited.pop();
            }
        }

        self.end_tree_node(ui, &node);
        ui.pop_id();
        self.path.pop();
        arena.rollback(mark);
    }

    /// Inline popup, drag sources and the watch-row path editor.
    fn draw_row_decorations(
        &mut self,
        ui: &mut dyn Substrate,
        node: &mut TreeNodeState,
        item: &PropertyItem,
        depth: usize,
    ) {
        // Storage keys sit under the node id whether or not it is open.
        let pushed = !node.tree_pushed;
        if pushed {
            ui.tree_push(NODE_ID);
        }
        let mut marked = ui.storage_bool(KEY_INLINED, false);
        let mut levels = InlineDepth::from_storage(ui.storage_int(KEY_INLINE_DEPTH, 1));
        self.set_inline(node, self.path.len(), depth, marked.then_some(levels));

        if ui.is_item_right_clicked() {
            ui.open_popup(ITEM_POPUP);
        }
        if ui.begin_popup(ITEM_POPUP) {
            if let Some(value) = ui.checkbox("Inlined", marked) {
                ui.set_storage_bool(KEY_INLINED, value);
                marked = value;
            }
            let unlimited = levels == InlineDepth::Unlimited;
            if let Some(value) = ui.checkbox("Unlimited", unlimited) {
                levels = if value {
                    InlineDepth::Unlimited
                } else {
                    InlineDepth::default()
                };
                ui.set_storage_int(KEY_INLINE_DEPTH, levels.to_storage());
            }
            let max = i32::from(self.options.inline_depth_max.max(1));
            let shown = match levels {
                InlineDepth::Levels(n) => i32::from(n).min(max),
                InlineDepth::Unlimited => max,
            };
            let enabled = marked && levels != InlineDepth::Unlimited;
            if let Some(n) = ui.slider_int("Stack Depth", shown, 1, max, enabled) {
                let n = u8::try_from(n.clamp(1, max)).unwrap_or(1);
                ui.set_storage_int(KEY_INLINE_DEPTH, InlineDepth::Levels(n).to_storage());
            }
            ui.end_popup();
        }
        if pushed {
            ui.tree_pop();
        }

        if depth > 0 && item.kind() != ItemKind::Function {
            ui.drag_source(DragPayload::member(self.path.join(".")));
        }

        if let Some(watch) = self.watch_row.as_ref().filter(|_| depth == 0) {
            let index = watch.index;
            ui.drag_source(DragPayload::watch_index(index));
            if let Some(from) = ui
                .drop_target(WATCH_INDEX)
                .and_then(|payload| payload.as_watch_index())
            {
                self.requests.request_swap(from, index);
            }
            let input_id = format!("##InputPathText {index}");
            if let Some(path) = ui.input_text(&input_id, "", &watch.path) {
                self.requests.request_rename(index, path);
            }
        }

        if marked {
            ui.text("*");
        }
    }

    fn draw_columns(
        &mut self,
        ui: &mut dyn Substrate,
        arena: &mut TextArena,
        cells: &mut RowCells,
        item: &PropertyItem,
        depth: usize,
    ) {
        let host = self.host;

        if ui.next_column() && item.is_valid() {
            let editor = value::editor_for(host, item);
            self.draw_value(ui, &editor, item);
        }

        if ui.next_column() && item.field_id().is_some() {
            let handle = cells.ensure(self, arena, item, ColumnId::Metadata, depth);
            let text = arena.get(handle).unwrap_or_default();
            if !text.is_empty() {
                ui.text_disabled("(?)");
                ui.tooltip(text);
            }
        }

        if ui.next_column() && item.is_valid() {
            ui.bullet(value::item_color(host, item).unwrap_or_default());
            let handle = cells.ensure(self, arena, item, ColumnId::Type, depth);
            ui.text(arena.get(handle).unwrap_or_default());
        }

        for column in [ColumnId::CppType, ColumnId::Class, ColumnId::Category] {
            if ui.next_column() {
                let handle = cells.ensure(self, arena, item, column, depth);
                ui.text(arena.get(handle).unwrap_or_default());
            }
        }

        if ui.next_column() {
            let handle = cells.ensure(self, arena, item, ColumnId::Address, depth);
            let text = arena.get(handle).unwrap_or_default();
            if self.hovered_before == Some(item.addr()) {
                ui.text_colored(HIGHLIGHT, text);
            } else {
                ui.text(text);
            }
            if ui.is_item_hovered() {
                self.hovered = Some(item.addr());
            }
        }

        if ui.next_column() {
            let handle = cells.ensure(self, arena, item, ColumnId::Size, depth);
            ui.text(arena.get(handle).unwrap_or_default());
        }

        if ui.next_column() && self.is_watch_root(depth) && ui.button("x", true) {
            if let Some(watch) = &self.watch_row {
                self.requests.request_delete(watch.index);
            }
        }
    }

    fn draw_value(&mut self, ui: &mut dyn Substrate, editor: &Editor, item: &PropertyItem) {
        match editor {
            Editor::CallButton => {
                if ui.button(CALL_LABEL, true) {
                    if let Some(function) = item.function_id() {
                        self.requests.request_call(item.addr(), function);
                    }
                }
            }
            Editor::DisabledButton(label) => {
                ui.button(label, false);
            }
            _ => {
                let Some(edited) = ui.value_editor(VALUE_ID, editor) else {
                    return;
                };
                match (editor.commit(edited), item.field_id()) {
                    (Some(value), Some(field)) => {
                        self.requests.request_edit(item.addr(), field, value);
                    }
                    _ => propwatch_core::debug!(
                        target: "propwatch::pass",
                        "dropped an edit that does not fit the field"
                    ),
                }
            }
        }
    }

    /// Draw the rows below an open item: its members, sectioned by owner
    /// for objects, then its functions.
    pub fn draw_item_children(
        &mut self,
        ui: &mut dyn Substrate,
        arena: &mut TextArena,
        item: &PropertyItem,
        depth: usize,
    ) {
        let host = self.host;
        if let Some(field) = item.field_id() {
            if host.field_kind(field).is_indirect_reference() {
                if let RefState::Live(object) = host.resolve_reference(item.addr(), field) {
                    let target = PropertyItem::object(object);
                    return self.draw_item_children(ui, arena, &target, depth + 1);
                }
            }
        }

        let object_like = item.is_object_like(host);
        let members = item.members(host);
        let runs = if self.options.group_by_owner && object_like {
            SectionRuns::from_tags(members.iter().map(|m| m.owner_name(host)))
        } else {
            SectionRuns::default()
        };
        self.draw_grouped(ui, arena, &members, &runs, depth);

        if !self.options.list_functions || !object_like || item.addr().is_null() {
            return;
        }
        let functions: Vec<PropertyItem> = host
            .object_functions(item.addr())
            .into_iter()
            .map(|f| PropertyItem::function(item.addr(), f))
            .collect();
        if functions.is_empty() || self.aborted {
            return;
        }
        let mut section = TreeNodeState::section();
        if self.begin_section(ui, "Functions", &mut section, depth, NodeFlags::empty()) {
            let runs = if self.options.group_by_owner {
                SectionRuns::from_tags(functions.iter().map(|f| f.owner_name(host)))
            } else {
                SectionRuns::default()
            };
            self.draw_grouped(ui, arena, &functions, &runs, depth);
        }
        self.end_tree_node(ui, &section);
    }

    fn draw_grouped(
        &mut self,
        ui: &mut dyn Substrate,
        arena: &mut TextArena,
        rows: &[PropertyItem],
        runs: &SectionRuns,
        depth: usize,
    ) {
        if !runs.is_enabled() {
            for row in rows {
                if self.aborted {
                    break;
                }
                self.draw_item_row(ui, arena, row, depth + 1);
            }
            return;
        }
        for (i, section) in runs.iter().enumerate() {
            if self.aborted {
                break;
            }
            let mut node = TreeNodeState::section().with_no_tree_push();
            let flags = if i == 0 {
                NodeFlags::DEFAULT_OPEN
            } else {
                NodeFlags::empty()
            };
            if self.begin_section(ui, section.name, &mut node, depth, flags) {
                for row in rows.get(section.range.clone()).unwrap_or_default() {
                    self.draw_item_row(ui, arena, row, depth + 1);
                }
            }
            self.end_tree_node(ui, &node);
        }
    }

    // -----------------------------------------------------------------------
    // Column texts
    // -----------------------------------------------------------------------

    fn cell_text(
        &self,
        arena: &mut TextArena,
        item: &PropertyItem,
        column: ColumnId,
        depth: usize,
    ) -> ArenaText {
        let host = self.host;
        match column {
            ColumnId::Name => {
                // The path editor shows the name of a watch root.
                if self.is_watch_root(depth) {
                    return arena.alloc("");
                }
                let name = item.display_name(host);
                match self.inline {
                    Some(mode) => {
                        let skip = mode.path_offset.min(self.path.len());
                        let parents = self.path[skip..].iter().map(String::as_str);
                        arena.alloc_join(parents.chain([name.as_str()]), ".")
                    }
                    None => arena.alloc(&name),
                }
            }
            ColumnId::Value => arena.alloc(&value::value_text(host, item)),
            ColumnId::Metadata => arena.alloc(&item.metadata_text(host)),
            ColumnId::Type => arena.alloc(&item.property_type(host)),
            ColumnId::CppType => arena.alloc(&item.cpp_type(host)),
            ColumnId::Class => arena.alloc(&item.owner_name(host)),
            ColumnId::Category => arena.alloc(&item.metadata_category(host)),
            ColumnId::Address => arena.alloc_fmt(format_args!("{}", item.addr())),
            ColumnId::Size => match item.size(host) {
                -1 => arena.alloc(""),
                n => arena.alloc_fmt(format_args!("{n} B")),
            },
        }
    }
}

/// Column texts of one row, computed on first use.
#[derive(Clone, Copy, Debug, Default)]
struct RowCells {
    cells: [Option<ArenaText>; ColumnId::COUNT],
}

impl RowCells {
    fn ensure(
        &mut self,
        state: &TreeState<'_>,
        arena: &mut TextArena,
        item: &PropertyItem,
        column: ColumnId,
        depth: usize,
    ) -> ArenaText {
        *self.cells[column.index()]
            .get_or_insert_with(|| state.cell_text(arena, item, column, depth))
    }

    fn text<'t>(&self, arena: &'t TextArena, column: ColumnId) -> &'t str {
        self.cells[column.index()]
            .and_then(|handle| arena.get(handle))
            .unwrap_or_default()
    }

    fn lookup<'t>(&'t self, arena: &'t TextArena) -> RowLookup<'t> {
        RowLookup { arena, cells: self }
    }
}

struct RowLookup<'t> {
    arena: &'t TextArena,
    cells: &'t RowCells,
}

impl ColumnLookup for RowLookup<'_> {
    fn column_text(&self, column: ColumnId) -> Option<&str> {
        self.cells.cells[column.index()].and_then(|handle| self.arena.get(handle))
    }
}
