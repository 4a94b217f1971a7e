#![forbid(unsafe_code)]

//! Headless [`Substrate`] that records what a pass drew.
//!
//! [`RecordingSubstrate`] keeps the ID stack, open state and keyed storage
//! the way an immediate-mode backend would, and turns table cells into
//! [`RecordedRow`]s. Interaction is scripted: queue a toggle, click or drop
//! by label, run a pass, and the matching widget reports it once.
//!
//! ```ignore
//! let mut ui = RecordingSubstrate::new(10);
//! ui.toggle("Pawn_0");
//! state.draw_item_row(&mut ui, &mut arena, &item, 0);
//! assert!(ui.find_row("Health").is_some());
//! ```
//!
//! Frames are cleared by [`RecordingSubstrate::clear_frame`] and by every
//! `begin_window`; storage, open state and popups persist.

use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use crate::drag::DragPayload;
use crate::substrate::{ColumnSetup, NodeFlags, NodeRequest, NodeResponse, Rgba, SortSpec, Substrate};
use crate::value::Editor;
use propwatch_core::Value;

/// Widest cell in [`RecordingSubstrate::render_to_string`], in columns.
pub const MAX_CELL_WIDTH: usize = 40;

const ELLIPSIS: &str = "…";

/// One table row as drawn.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedRow {
    /// Scoped id of the row's tree node.
    pub id: String,
    pub label: String,
    /// Indent level: tree pushes plus indents at the time the row was drawn.
    pub depth: usize,
    /// Text drawn into each column, joined by spaces.
    pub cells: Vec<String>,
    pub tint: Option<Rgba>,
    pub label_color: Option<Rgba>,
    pub flags: NodeFlags,
    pub open: bool,
    pub disabled: bool,
}

impl RecordedRow {
    /// Text of column `index`, empty when nothing was drawn there.
    #[must_use]
    pub fn cell(&self, index: usize) -> &str {
        self.cells.get(index).map_or("", String::as_str)
    }

    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.flags.contains(NodeFlags::LEAF)
    }
}

/// Recorded drag source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedDrag {
    /// Label of the row the source sits in.
    pub row: String,
    pub payload: DragPayload,
}

#[derive(Clone, Copy, Debug)]
struct ScriptedToggle {
    bulk_digit: Option<u8>,
}

/// Recording substrate with scripted input.
#[derive(Debug)]
pub struct RecordingSubstrate {
    columns: usize,
    column: Option<usize>,
    headers: Vec<ColumnSetup>,

    id_stack: Vec<String>,
    tree_depth: usize,
    indent: isize,
    popup_depth: usize,
    window_open: bool,
    table_open: bool,

    bools: HashMap<String, bool>,
    ints: HashMap<String, i32>,
    open_popups: HashSet<String>,
    selected_tab: Option<String>,

    rows: Vec<RecordedRow>,
    lines: Vec<String>,
    tooltips: Vec<String>,
    drags: Vec<RecordedDrag>,
    titles: Vec<String>,

    current_row: Option<String>,
    last_right_clicked: bool,
    hovered_row: Option<String>,

    toggles: Vec<(String, ScriptedToggle)>,
    right_clicks: Vec<String>,
    buttons: Vec<String>,
    checkboxes: Vec<(String, bool)>,
    selectables: Vec<String>,
    sliders: Vec<(String, i32)>,
    floats: Vec<(String, f32)>,
    inputs: Vec<(String, String)>,
    edits: Vec<(String, Value)>,
    drops: Vec<(String, DragPayload)>,
    window_drops: Vec<DragPayload>,
    sort: Option<SortSpec>,
}

impl Default for RecordingSubstrate {
    fn default() -> Self {
        Self::new(1)
    }
}

fn take<T>(queue: &mut Vec<(String, T)>, key: &str) -> Option<T> {
    let index = queue.iter().position(|(k, _)| k == key)?;
    Some(queue.remove(index).1)
}

impl RecordingSubstrate {
    /// A substrate whose tables have `columns` columns until `begin_table`
    /// says otherwise.
    #[must_use]
    pub fn new(columns: usize) -> Self {
        Self {
            columns: columns.max(1),
            column: None,
            headers: Vec::new(),
            id_stack: Vec::new(),
            tree_depth: 0,
            indent: 0,
            popup_depth: 0,
            window_open: false,
            table_open: false,
            bools: HashMap::new(),
            ints: HashMap::new(),
            open_popups: HashSet::new(),
            selected_tab: None,
            rows: Vec::new(),
            lines: Vec::new(),
            tooltips: Vec::new(),
            drags: Vec::new(),
            titles: Vec::new(),
            current_row: None,
            last_right_clicked: false,
            hovered_row: None,
            toggles: Vec::new(),
            right_clicks: Vec::new(),
            buttons: Vec::new(),
            checkboxes: Vec::new(),
            selectables: Vec::new(),
            sliders: Vec::new(),
            floats: Vec::new(),
            inputs: Vec::new(),
            edits: Vec::new(),
            drops: Vec::new(),
            window_drops: Vec::new(),
            sort: None,
        }
    }

    // ------------------------------------------------------------------
    // Scripting
    // ------------------------------------------------------------------

    /// Toggle the tree node labeled `label` on its next draw.
    pub fn toggle(&mut self, label: &str) {
        self.toggles
            .push((label.to_owned(), ScriptedToggle { bulk_digit: None }));
    }

    /// Toggle with the bulk modifier and `digit` held (`0` for none).
    pub fn toggle_bulk(&mut self, label: &str, digit: u8) {
        self.toggles.push((
            label.to_owned(),
            ScriptedToggle {
                bulk_digit: Some(digit.min(9)),
            },
        ));
    }

    pub fn right_click(&mut self, label: &str) {
        self.right_clicks.push(label.to_owned());
    }

    pub fn click_button(&mut self, label: &str) {
        self.buttons.push(label.to_owned());
    }

    pub fn set_checkbox(&mut self, label: &str, value: bool) {
        self.checkboxes.push((label.to_owned(), value));
    }

    pub fn click_selectable(&mut self, label: &str) {
        self.selectables.push(label.to_owned());
    }

    pub fn set_slider(&mut self, label: &str, value: i32) {
        self.sliders.push((label.to_owned(), value));
    }

    pub fn set_float(&mut self, label: &str, value: f32) {
        self.floats.push((label.to_owned(), value));
    }

    /// Commit `text` into the text input with id `id`.
    pub fn set_input(&mut self, id: &str, text: &str) {
        self.inputs.push((id.to_owned(), text.to_owned()));
    }

    /// Commit `value` into the value editor of the row labeled `row`.
    pub fn edit_value(&mut self, row: &str, value: Value) {
        self.edits.push((row.to_owned(), value));
    }

    /// Drop `payload` on the row labeled `row`.
    pub fn drop_on(&mut self, row: &str, payload: DragPayload) {
        self.drops.push((row.to_owned(), payload));
    }

    pub fn drop_on_window(&mut self, payload: DragPayload) {
        self.window_drops.push(payload);
    }

    /// Keep the row labeled `row` hovered until changed.
    pub fn hover(&mut self, row: Option<&str>) {
        self.hovered_row = row.map(str::to_owned);
    }

    pub fn select_tab(&mut self, label: &str) {
        self.selected_tab = Some(label.to_owned());
    }

    pub fn set_sort(&mut self, spec: SortSpec) {
        self.sort = Some(spec);
    }

    pub fn close_popups(&mut self) {
        self.open_popups.clear();
    }

    // ------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------

    /// Forget everything drawn so far. State and scripts are kept.
    pub fn clear_frame(&mut self) {
        self.rows.clear();
        self.lines.clear();
        self.tooltips.clear();
        self.drags.clear();
        self.titles.clear();
        self.column = None;
        self.current_row = None;
    }

    #[must_use]
    pub fn rows(&self) -> &[RecordedRow] {
        &self.rows
    }

    #[must_use]
    pub fn row_labels(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.label.as_str()).collect()
    }

    #[must_use]
    pub fn find_row(&self, label: &str) -> Option<&RecordedRow> {
        self.rows.iter().find(|r| r.label == label)
    }

    /// Text drawn outside table cells, one entry per widget.
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    #[must_use]
    pub fn has_line(&self, text: &str) -> bool {
        self.lines.iter().any(|l| l == text)
    }

    #[must_use]
    pub fn tooltips(&self) -> &[String] {
        &self.tooltips
    }

    #[must_use]
    pub fn drags(&self) -> &[RecordedDrag] {
        &self.drags
    }

    #[must_use]
    pub fn window_titles(&self) -> &[String] {
        &self.titles
    }

    #[must_use]
    pub fn headers(&self) -> &[ColumnSetup] {
        &self.headers
    }

    /// Whether a popup is open, by fully scoped key (`a/b/PopupId`).
    #[must_use]
    pub fn is_popup_open(&self, key: &str) -> bool {
        self.open_popups.contains(key)
    }

    /// Raw storage lookup by fully scoped key.
    #[must_use]
    pub fn stored_bool(&self, key: &str) -> Option<bool> {
        self.bools.get(key).copied()
    }

    #[must_use]
    pub fn stored_int(&self, key: &str) -> Option<i32> {
        self.ints.get(key).copied()
    }

    /// Every push was popped and every window, table and popup ended.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.id_stack.is_empty()
            && self.tree_depth == 0
            && self.indent == 0
            && self.popup_depth == 0
            && !self.window_open
            && !self.table_open
    }

    /// Rows as an indented, column-aligned text table.
    #[must_use]
    pub fn render_to_string(&self) -> String {
        let cells: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| {
                row.cells
                    .iter()
                    .enumerate()
                    .map(|(i, cell)| {
                        let cell = if i == 0 {
                            format!("{}{}", "  ".repeat(row.depth), cell)
                        } else {
                            cell.clone()
                        };
                        truncate(&cell, MAX_CELL_WIDTH)
                    })
                    .collect()
            })
            .collect();
        let mut widths = vec![0usize; self.columns];
        for row in &cells {
            for (i, cell) in row.iter().enumerate() {
                if let Some(w) = widths.get_mut(i) {
                    *w = (*w).max(cell.width());
                }
            }
        }
        let mut out = String::new();
        for row in &cells {
            let mut line = String::new();
            for (i, cell) in row.iter().enumerate() {
                if i > 0 {
                    line.push_str(" | ");
                }
                line.push_str(cell);
                let pad = widths.get(i).copied().unwrap_or(0).saturating_sub(cell.width());
                line.extend(std::iter::repeat_n(' ', pad));
            }
            let _ = writeln!(out, "{}", line.trim_end());
        }
        out
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn scoped(&self, key: &str) -> String {
        let mut scoped = self.id_stack.join("/");
        if !scoped.is_empty() {
            scoped.push('/');
        }
        scoped.push_str(key);
        scoped
    }

    /// A new widget was drawn; interaction state moves to it.
    fn touch(&mut self) {
        self.last_right_clicked = false;
    }

    fn emit(&mut self, text: String) {
        if let (Some(column), Some(row)) = (self.column, self.rows.last_mut()) {
            if let Some(cell) = row.cells.get_mut(column) {
                if !cell.is_empty() {
                    cell.push(' ');
                }
                cell.push_str(&text);
                return;
            }
        }
        self.lines.push(text);
    }

    fn current_row_is(&self, label: &str) -> bool {
        self.current_row.as_deref() == Some(label)
    }
}

/// Cut `text` to `max` display columns on a grapheme boundary.
fn truncate(text: &str, max: usize) -> String {
    if text.width() <= max {
        return text.to_owned();
    }
    let budget = max.saturating_sub(ELLIPSIS.width());
    let mut out = String::new();
    let mut used = 0;
    for grapheme in text.graphemes(true) {
        let w = grapheme.width();
        if used + w > budget {
            break;
        }
        used += w;
        out.push_str(grapheme);
    }
    out.push_str(ELLIPSIS);
    out
}

impl Substrate for RecordingSubstrate {
    fn begin_window(&mut self, title: &str) -> bool {
        self.clear_frame();
        self.titles.push(title.to_owned());
        self.window_open = true;
        true
    }

    fn end_window(&mut self) {
        self.window_open = false;
    }

    fn push_id(&mut self, id: &str) {
        self.id_stack.push(id.to_owned());
    }

    fn pop_id(&mut self) {
        self.id_stack.pop();
    }

    fn tab_item(&mut self, label: &str) -> bool {
        self.touch();
        let open = self.selected_tab.get_or_insert_with(|| label.to_owned()) == label;
        self.lines.push(if open {
            format!("<{label}>")
        } else {
            format!(" {label} ")
        });
        open
    }

    fn end_tab_item(&mut self) {}

    fn begin_table(&mut self, _id: &str, columns: &[ColumnSetup]) -> bool {
        self.columns = columns.len().max(1);
        self.headers = columns.to_vec();
        self.column = None;
        self.table_open = true;
        true
    }

    fn end_table(&mut self) {
        self.table_open = false;
        self.column = None;
    }

    fn sort_specs(&mut self) -> Option<SortSpec> {
        self.sort.take()
    }

    fn next_column(&mut self) -> bool {
        match self.column {
            Some(c) if c + 1 < self.columns => self.column = Some(c + 1),
            _ => {
                self.rows.push(RecordedRow {
                    id: String::new(),
                    label: String::new(),
                    depth: 0,
                    cells: vec![String::new(); self.columns],
                    tint: None,
                    label_color: None,
                    flags: NodeFlags::empty(),
                    open: false,
                    disabled: false,
                });
                self.column = Some(0);
            }
        }
        true
    }

    fn skip_to_last_column(&mut self) {
        if self.column.is_some() {
            self.column = Some(self.columns - 1);
        }
    }

    fn set_row_tint(&mut self, tint: Rgba) {
        if let Some(row) = self.rows.last_mut() {
            row.tint = Some(tint);
        }
    }

    fn tree_node(&mut self, request: &NodeRequest<'_>) -> NodeResponse {
        self.touch();
        let key = self.scoped(request.id);
        let leaf = request.flags.contains(NodeFlags::LEAF);
        let mut open = self
            .bools
            .get(&key)
            .copied()
            .unwrap_or(request.flags.contains(NodeFlags::DEFAULT_OPEN));
        if let Some(forced) = request.set_open {
            open = forced;
        }
        let mut response = NodeResponse::default();
        if !leaf {
            if let Some(script) = take(&mut self.toggles, request.label) {
                open = !open;
                response.toggled = true;
                response.bulk_digit = script.bulk_digit;
            }
        }
        let open = open && !leaf;
        self.bools.insert(key.clone(), open);
        response.open = open;

        if let Some(i) = self.right_clicks.iter().position(|l| l == request.label) {
            self.right_clicks.remove(i);
            self.last_right_clicked = true;
        }
        self.current_row = Some(request.label.to_owned());

        let depth = usize::try_from(self.tree_depth as isize + self.indent).unwrap_or(0);
        let in_row = self.column.is_some();
        if let Some(row) = self.rows.last_mut().filter(|_| in_row) {
            row.id = key.clone();
            row.label = request.label.to_owned();
            row.depth = depth;
            row.label_color = request.color;
            row.flags = request.flags;
            row.open = open;
            row.disabled = request.disabled;
        }
        self.emit(request.label.to_owned());

        if open && !request.flags.contains(NodeFlags::NO_TREE_PUSH_ON_OPEN) {
            self.id_stack.push(request.id.to_owned());
            self.tree_depth += 1;
        }
        response
    }

    fn tree_push(&mut self, id: &str) {
        self.id_stack.push(id.to_owned());
        self.tree_depth += 1;
    }

    fn tree_pop(&mut self) {
        self.id_stack.pop();
        self.tree_depth = self.tree_depth.saturating_sub(1);
    }

    fn indent(&mut self) {
        self.indent += 1;
    }

    fn unindent(&mut self) {
        self.indent -= 1;
    }

    fn text(&mut self, text: &str) {
        self.touch();
        self.emit(text.to_owned());
    }

    fn text_colored(&mut self, _color: Rgba, text: &str) {
        self.text(text);
    }

    fn text_disabled(&mut self, text: &str) {
        self.text(text);
    }

    fn bullet(&mut self, _color: Rgba) {}

    fn tooltip(&mut self, text: &str) {
        self.tooltips.push(text.to_owned());
    }

    fn button(&mut self, label: &str, enabled: bool) -> bool {
        self.touch();
        self.emit(format!("[{label}]"));
        enabled && take_label(&mut self.buttons, label)
    }

    fn checkbox(&mut self, label: &str, value: bool) -> Option<bool> {
        self.touch();
        let next = take(&mut self.checkboxes, label);
        let shown = next.unwrap_or(value);
        self.emit(format!("[{}] {label}", if shown { 'x' } else { ' ' }));
        next.filter(|&v| v != value)
    }

    fn slider_int(&mut self, label: &str, value: i32, min: i32, max: i32, enabled: bool) -> Option<i32> {
        self.touch();
        self.emit(format!("{label}: {value} ({min}..={max})"));
        if !enabled {
            return None;
        }
        take(&mut self.sliders, label).map(|v| v.clamp(min, max))
    }

    fn input_float(&mut self, label: &str, value: f32, enabled: bool) -> Option<f32> {
        self.touch();
        self.emit(format!("{label}: {value}"));
        if !enabled {
            return None;
        }
        take(&mut self.floats, label)
    }

    fn input_text(&mut self, id: &str, hint: &str, value: &str) -> Option<String> {
        self.touch();
        self.emit(if value.is_empty() { hint } else { value }.to_owned());
        take(&mut self.inputs, id)
    }

    fn selectable(&mut self, label: &str, selected: bool) -> Option<bool> {
        self.touch();
        self.emit(format!("({}) {label}", if selected { '*' } else { ' ' }));
        take_label(&mut self.selectables, label).then_some(!selected)
    }

    fn value_editor(&mut self, _id: &str, editor: &Editor) -> Option<Value> {
        self.touch();
        self.emit(editor.preview());
        let row = self.current_row.clone()?;
        take(&mut self.edits, &row)
    }

    fn is_item_visible(&self) -> bool {
        true
    }

    fn is_item_hovered(&self) -> bool {
        self.hovered_row
            .as_deref()
            .is_some_and(|row| self.current_row_is(row))
    }

    fn is_item_right_clicked(&self) -> bool {
        self.last_right_clicked
    }

    fn open_popup(&mut self, id: &str) {
        let key = self.scoped(id);
        self.open_popups.insert(key);
    }

    fn begin_popup(&mut self, id: &str) -> bool {
        let open = self.open_popups.contains(&self.scoped(id));
        if open {
            self.popup_depth += 1;
        }
        open
    }

    fn end_popup(&mut self) {
        self.popup_depth = self.popup_depth.saturating_sub(1);
    }

    fn drag_source(&mut self, payload: DragPayload) {
        self.drags.push(RecordedDrag {
            row: self.current_row.clone().unwrap_or_default(),
            payload,
        });
    }

    fn drop_target(&mut self, pattern: &str) -> Option<DragPayload> {
        let row = self.current_row.clone()?;
        let index = self
            .drops
            .iter()
            .position(|(r, p)| *r == row && p.matches_type(pattern))?;
        Some(self.drops.remove(index).1)
    }

    fn window_drop_target(&mut self, pattern: &str) -> Option<DragPayload> {
        let index = self.window_drops.iter().position(|p| p.matches_type(pattern))?;
        Some(self.window_drops.remove(index))
    }

    fn storage_bool(&self, key: &str, default: bool) -> bool {
        self.bools.get(&self.scoped(key)).copied().unwrap_or(default)
    }

    fn set_storage_bool(&mut self, key: &str, value: bool) {
        let key = self.scoped(key);
        self.bools.insert(key, value);
    }

    fn storage_int(&self, key: &str, default: i32) -> i32 {
        self.ints.get(&self.scoped(key)).copied().unwrap_or(default)
    }

    fn set_storage_int(&mut self, key: &str, value: i32) {
        let key = self.scoped(key);
        self.ints.insert(key, value);
    }
}

fn take_label(queue: &mut Vec<String>, label: &str) -> bool {
    match queue.iter().position(|l| l == label) {
        Some(index) => {
            queue.remove(index);
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_wrap_into_rows() {
        let mut ui = RecordingSubstrate::new(2);
        ui.begin_table("t", &[ColumnSetup::new("A"), ColumnSetup::new("B")]);
        for text in ["a1", "b1", "a2"] {
            ui.next_column();
            ui.text(text);
        }
        ui.skip_to_last_column();
        ui.end_table();
        assert_eq!(ui.rows().len(), 2);
        assert_eq!(ui.rows()[0].cells, vec!["a1", "b1"]);
        assert_eq!(ui.rows()[1].cell(1), "");
    }

    #[test]
    fn storage_is_scoped_by_id_stack() {
        let mut ui = RecordingSubstrate::new(1);
        ui.push_id("a");
        ui.set_storage_int("k", 3);
        ui.pop_id();
        ui.push_id("b");
        assert_eq!(ui.storage_int("k", 1), 1);
        ui.pop_id();
        assert_eq!(ui.stored_int("a/k"), Some(3));
    }

    #[test]
    fn scripted_toggle_fires_once() {
        let mut ui = RecordingSubstrate::new(1);
        ui.toggle("Node");
        let first = ui.tree_node(&NodeRequest::new("##n", "Node"));
        assert!(first.open && first.toggled);
        ui.tree_pop();
        let second = ui.tree_node(&NodeRequest::new("##n", "Node"));
        assert!(second.open && !second.toggled);
        ui.tree_pop();
        assert!(ui.is_balanced());
    }

    #[test]
    fn leaves_never_open() {
        let mut ui = RecordingSubstrate::new(1);
        ui.toggle("Leaf");
        let request = NodeRequest::new("##n", "Leaf")
            .with_flags(NodeFlags::LEAF | NodeFlags::NO_TREE_PUSH_ON_OPEN);
        assert!(!ui.tree_node(&request).open);
        assert!(ui.is_balanced());
    }

    #[test]
    fn truncation_respects_wide_graphemes() {
        let wide = "界".repeat(30);
        let cut = truncate(&wide, 10);
        assert!(cut.width() <= 10);
        assert!(cut.ends_with(ELLIPSIS));
        assert_eq!(truncate("short", 10), "short");
    }

    proptest::proptest! {
        #[test]
        fn truncation_fits_and_keeps_a_prefix(text in "[a-zA-Z0-9 _.界é]{0,60}", max in 2usize..48) {
            let cut = truncate(&text, max);
            proptest::prop_assert!(cut.width() <= max);
            let kept = cut.strip_suffix(ELLIPSIS).unwrap_or(&cut);
            proptest::prop_assert!(text.starts_with(kept));
        }
    }
}
