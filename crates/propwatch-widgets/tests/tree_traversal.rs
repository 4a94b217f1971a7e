#![forbid(unsafe_code)]

//! Traversal tests against the mock host and the recording substrate.
//!
//! Each test drives one or more passes of [`TreeState::draw_item_row`] and
//! checks the rows that came out:
//! - sections, filtering and highlighting
//! - bulk open/close with the cycle guard
//! - inline marks and merged names
//! - the row ceiling
//! - drag payloads, edits and calls queued as requests

use propwatch_core::arena::TextArena;
use propwatch_core::item::PropertyItem;
use propwatch_core::mock::{MockField, MockHost};
use propwatch_core::reflect::{FieldKind, Value, ValueAddr};
use propwatch_core::search::SearchQuery;
use propwatch_widgets::drag::DragPayload;
use propwatch_widgets::harness::RecordingSubstrate;
use propwatch_widgets::substrate::{HIGHLIGHT, NodeFlags};
use propwatch_widgets::tree_view::{TreeOptions, TreeState};

const COLUMNS: usize = 10;

fn flat() -> TreeOptions {
    TreeOptions {
        group_by_owner: false,
        ..TreeOptions::default()
    }
}

/// Run one pass over `roots` and return the rows drawn plus the state's
/// row counters.
fn pass(
    host: &MockHost,
    ui: &mut RecordingSubstrate,
    query: &SearchQuery,
    options: TreeOptions,
    roots: &[PropertyItem],
) -> (usize, bool) {
    ui.clear_frame();
    let mut arena = TextArena::new();
    let mut state = TreeState::new(host, query, options);
    for root in roots {
        state.draw_item_row(ui, &mut arena, root, 0);
    }
    assert!(ui.is_balanced(), "unbalanced pass:\n{}", ui.render_to_string());
    assert!(arena.is_empty(), "arena not released after the pass");
    (state.rows_drawn(), state.aborted())
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

struct Pawn {
    host: MockHost,
    pawn: ValueAddr,
}

/// `Pawn_0` with `Health` and `Target` declared on `Actor`, then `Armor`
/// declared on `Pawn`.
fn pawn() -> Pawn {
    let mut host = MockHost::new();
    let health = host.add_field(MockField::new("Health", FieldKind::Float).owner("Actor"));
    let target = host.add_field(MockField::new("Target", FieldKind::Object).owner("Actor"));
    let armor = host.add_field(MockField::new("Armor", FieldKind::Int32).owner("Pawn"));
    let class = host.add_class("Pawn", &[health, target, armor]);
    let pawn = host.spawn(class, "Pawn_0");
    host.set_value(pawn, health, Value::F32(50.0));
    Pawn { host, pawn }
}

struct Nested {
    host: MockHost,
    outer: ValueAddr,
}

/// `Outer_0.Inner` points at an object with `A` and `Deep`; `Deep` points
/// at an object with `X`.
fn nested() -> Nested {
    let mut host = MockHost::new();
    let x = host.add_field(MockField::new("X", FieldKind::Int32));
    let deep_class = host.add_class("DeepThing", &[x]);
    let a = host.add_field(MockField::new("A", FieldKind::Int32));
    let deep = host.add_field(MockField::new("Deep", FieldKind::Object));
    let inner_class = host.add_class("InnerThing", &[a, deep]);
    let inner = host.add_field(MockField::new("Inner", FieldKind::Object));
    let outer_class = host.add_class("OuterThing", &[inner]);

    let deep_obj = host.spawn(deep_class, "Deep_0");
    let inner_obj = host.spawn(inner_class, "Inner_0");
    let outer = host.spawn(outer_class, "Outer_0");
    host.set_object(inner_obj, deep, deep_obj);
    host.set_object(outer, inner, inner_obj);
    Nested { host, outer }
}

// ---------------------------------------------------------------------------
// Structure
// ---------------------------------------------------------------------------

#[test]
fn open_object_sections_members_by_owner() {
    let Pawn { host, pawn } = pawn();
    let roots = [PropertyItem::object(pawn)];
    let query = SearchQuery::default();
    let mut ui = RecordingSubstrate::new(COLUMNS);

    pass(&host, &mut ui, &query, TreeOptions::default(), &roots);
    assert_eq!(ui.row_labels(), ["Pawn_0"]);

    ui.toggle("Pawn_0");
    pass(&host, &mut ui, &query, TreeOptions::default(), &roots);
    assert_eq!(ui.row_labels(), ["Pawn_0", "(Actor)", "Health", "Target", "(Pawn)"]);

    let actor = ui.find_row("(Actor)").unwrap();
    assert!(actor.open, "first section starts open");
    assert!(actor.flags.contains(NodeFlags::FRAMED));
    assert!(!ui.find_row("(Pawn)").unwrap().open);

    // Sections do not push, so members sit one level below the object.
    assert_eq!(ui.find_row("Health").unwrap().depth, 1);
    assert!(ui.find_row("Target").unwrap().is_leaf(), "null object field");
}

#[test]
fn closed_sections_open_on_toggle() {
    let Pawn { host, pawn } = pawn();
    let roots = [PropertyItem::object(pawn)];
    let query = SearchQuery::default();
    let mut ui = RecordingSubstrate::new(COLUMNS);
    ui.toggle("Pawn_0");
    pass(&host, &mut ui, &query, TreeOptions::default(), &roots);

    ui.toggle("(Pawn)");
    pass(&host, &mut ui, &query, TreeOptions::default(), &roots);
    assert!(ui.find_row("Armor").is_some());
}

#[test]
fn flat_members_when_grouping_is_off() {
    let Pawn { host, pawn } = pawn();
    let roots = [PropertyItem::object(pawn)];
    let query = SearchQuery::default();
    let mut ui = RecordingSubstrate::new(COLUMNS);
    ui.toggle("Pawn_0");
    pass(&host, &mut ui, &query, flat(), &roots);
    assert_eq!(ui.row_labels(), ["Pawn_0", "Health", "Target", "Armor"]);

    let health = ui.find_row("Health").unwrap();
    assert_eq!(health.cell(4), "float");
    assert_eq!(health.cell(8), "4 B");
}

#[test]
fn functions_section_queues_calls() {
    let mut host = MockHost::new();
    let hp = host.add_field(MockField::new("Health", FieldKind::Float));
    let class = host.add_class("Pawn", &[hp]);
    let jump = host.add_function(class, "Jump", &[], None);
    let pawn = host.spawn(class, "Pawn_0");
    let roots = [PropertyItem::object(pawn)];
    let query = SearchQuery::default();
    let mut ui = RecordingSubstrate::new(COLUMNS);

    ui.toggle("Pawn_0");
    pass(&host, &mut ui, &query, TreeOptions::default(), &roots);
    assert_eq!(ui.row_labels(), ["Pawn_0", "Health", "(Functions)"]);
    assert!(!ui.find_row("(Functions)").unwrap().open);

    ui.toggle("(Functions)");
    ui.click_button("Call Function");
    ui.clear_frame();
    let mut arena = TextArena::new();
    let mut state = TreeState::new(&host, &query, TreeOptions::default());
    state.draw_item_row(&mut ui, &mut arena, &roots[0], 0);

    assert!(ui.find_row("Jump").unwrap().cell(1).contains("[Call Function]"));
    let calls = &state.requests().calls;
    assert_eq!(calls.len(), 1);
    assert_eq!((calls[0].object, calls[0].function), (pawn, jump));
    // Nothing reached the host yet.
    assert!(host.calls.is_empty());
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

#[test]
fn filter_keeps_matches_and_openable_rows() {
    let Pawn { host, pawn } = pawn();
    let roots = [PropertyItem::object(pawn)];
    let query = SearchQuery::parse("armor");
    let options = TreeOptions {
        filter_active: true,
        ..flat()
    };
    let mut ui = RecordingSubstrate::new(COLUMNS);
    ui.toggle("Pawn_0");
    pass(&host, &mut ui, &query, options, &roots);

    assert_eq!(ui.row_labels(), ["Pawn_0", "Armor"]);
    assert_eq!(ui.find_row("Pawn_0").unwrap().label_color, None);
    assert_eq!(ui.find_row("Armor").unwrap().label_color, Some(HIGHLIGHT));
}

#[test]
fn search_without_filter_only_highlights() {
    let Pawn { host, pawn } = pawn();
    let roots = [PropertyItem::object(pawn)];
    let query = SearchQuery::parse("value:>=50");
    let mut ui = RecordingSubstrate::new(COLUMNS);
    ui.toggle("Pawn_0");
    pass(&host, &mut ui, &query, flat(), &roots);

    assert_eq!(ui.rows().len(), 4);
    assert_eq!(ui.find_row("Health").unwrap().label_color, Some(HIGHLIGHT));
    assert_eq!(ui.find_row("Armor").unwrap().label_color, None);
}

// ---------------------------------------------------------------------------
// Bulk toggles
// ---------------------------------------------------------------------------

/// `Node_0.Next` points back at `Node_0`.
fn self_loop() -> (MockHost, ValueAddr) {
    let mut host = MockHost::new();
    let next = host.add_field(MockField::new("Next", FieldKind::Object));
    let class = host.add_class("Node", &[next]);
    let node = host.spawn(class, "Node_0");
    host.set_object(node, next, node);
    (host, node)
}

#[test]
fn bulk_open_terminates_on_cycles() {
    let (host, node) = self_loop();
    let roots = [PropertyItem::object(node)];
    let query = SearchQuery::default();
    let mut ui = RecordingSubstrate::new(COLUMNS);

    ui.toggle_bulk("Node_0", 0);
    let (rows, aborted) = pass(&host, &mut ui, &query, TreeOptions::default(), &roots);
    assert!(!aborted);
    // The object and the field view of it open once each; the next repeat
    // is on the visited stack and stays closed.
    assert_eq!(ui.row_labels(), ["Node_0", "Next", "Next"]);
    assert_eq!(rows, 3);
    assert!(!ui.rows()[2].open);

    // The bulk mode ends with the pass; the opened state persists.
    let (rows, _) = pass(&host, &mut ui, &query, TreeOptions::default(), &roots);
    assert_eq!(rows, 3);
}

#[test]
fn unlimited_inline_terminates_on_cycles() {
    let (host, node) = self_loop();
    let roots = [PropertyItem::object(node)];
    let query = SearchQuery::default();
    let options = TreeOptions {
        max_rows: 64,
        ..TreeOptions::default()
    };
    let mut ui = RecordingSubstrate::new(COLUMNS);
    ui.toggle("Node_0");
    pass(&host, &mut ui, &query, options, &roots);

    ui.right_click("Node_0");
    ui.set_checkbox("Inlined", true);
    ui.set_checkbox("Unlimited", true);
    pass(&host, &mut ui, &query, options, &roots);
    ui.close_popups();

    for _ in 0..2 {
        let (rows, aborted) = pass(&host, &mut ui, &query, options, &roots);
        assert!(!aborted, "inline pass hit the row ceiling");
        assert!(rows < options.max_rows);
        assert_eq!(ui.row_labels(), ["Node_0", "Next.Next"]);
    }
}

#[test]
fn bulk_close_closes_descendants() {
    let (host, node) = self_loop();
    let roots = [PropertyItem::object(node)];
    let query = SearchQuery::default();
    let mut ui = RecordingSubstrate::new(COLUMNS);
    ui.toggle_bulk("Node_0", 0);
    pass(&host, &mut ui, &query, TreeOptions::default(), &roots);

    ui.toggle_bulk("Node_0", 0);
    pass(&host, &mut ui, &query, TreeOptions::default(), &roots);
    pass(&host, &mut ui, &query, TreeOptions::default(), &roots);
    assert_eq!(ui.row_labels(), ["Node_0"]);

    // Reopening plainly shows the child closed again.
    ui.toggle("Node_0");
    pass(&host, &mut ui, &query, TreeOptions::default(), &roots);
    assert_eq!(ui.row_labels(), ["Node_0", "Next"]);
    assert!(!ui.rows()[1].open);
}

#[test]
fn bulk_digit_limits_depth() {
    let Nested { host, outer } = nested();
    let roots = [PropertyItem::object(outer)];
    let query = SearchQuery::default();
    let mut ui = RecordingSubstrate::new(COLUMNS);

    ui.toggle_bulk("Outer_0", 1);
    pass(&host, &mut ui, &query, TreeOptions::default(), &roots);
    assert_eq!(ui.row_labels(), ["Outer_0", "Inner", "A", "Deep"]);
    assert!(ui.find_row("Inner").unwrap().open);
    assert!(!ui.find_row("Deep").unwrap().open);
}

// ---------------------------------------------------------------------------
// Inline marks
// ---------------------------------------------------------------------------

#[test]
fn inline_mark_merges_children_into_parent_level() {
    let Nested { host, outer } = nested();
    let roots = [PropertyItem::object(outer)];
    let query = SearchQuery::default();
    let mut ui = RecordingSubstrate::new(COLUMNS);

    ui.toggle("Outer_0");
    pass(&host, &mut ui, &query, TreeOptions::default(), &roots);

    ui.toggle("Inner");
    ui.right_click("Inner");
    ui.set_checkbox("Inlined", true);
    pass(&host, &mut ui, &query, TreeOptions::default(), &roots);
    assert_eq!(ui.row_labels(), ["Outer_0", "Inner", "A", "Deep"]);

    ui.close_popups();
    pass(&host, &mut ui, &query, TreeOptions::default(), &roots);
    assert_eq!(ui.row_labels(), ["Outer_0", "Inner", "A", "Deep.X"]);
    assert_eq!(ui.find_row("Inner").unwrap().cell(0), "Inner *");
    let a = ui.find_row("A").unwrap().depth;
    assert_eq!(ui.find_row("Deep.X").unwrap().depth, a, "inlined rows share a level");
}

#[test]
fn inline_mark_survives_closing_the_node() {
    let Nested { host, outer } = nested();
    let roots = [PropertyItem::object(outer)];
    let query = SearchQuery::default();
    let mut ui = RecordingSubstrate::new(COLUMNS);
    ui.toggle("Outer_0");
    pass(&host, &mut ui, &query, TreeOptions::default(), &roots);
    ui.right_click("Inner");
    ui.set_checkbox("Inlined", true);
    pass(&host, &mut ui, &query, TreeOptions::default(), &roots);
    ui.close_popups();

    // Closed and marked: still a row, still starred.
    pass(&host, &mut ui, &query, TreeOptions::default(), &roots);
    assert_eq!(ui.find_row("Inner").unwrap().cell(0), "Inner *");

    ui.toggle("Inner");
    pass(&host, &mut ui, &query, TreeOptions::default(), &roots);
    assert!(ui.find_row("Deep.X").is_some());
}

// ---------------------------------------------------------------------------
// Limits and requests
// ---------------------------------------------------------------------------

#[test]
fn row_ceiling_stops_the_pass() {
    let Pawn { host, pawn } = pawn();
    let roots = [PropertyItem::object(pawn)];
    let query = SearchQuery::default();
    let options = TreeOptions {
        max_rows: 3,
        ..flat()
    };
    let mut ui = RecordingSubstrate::new(COLUMNS);
    ui.toggle("Pawn_0");
    let (rows, aborted) = pass(&host, &mut ui, &query, options, &roots);
    assert_eq!(rows, 3);
    assert!(aborted);
    assert_eq!(ui.row_labels(), ["Pawn_0", "Health", "Target"]);
}

#[test]
fn null_roots_get_distinct_ids() {
    let host = MockHost::new();
    let roots = [
        PropertyItem::object(ValueAddr::NULL).with_name_override("Missing"),
        PropertyItem::object(ValueAddr::NULL).with_name_override("Missing"),
        PropertyItem::object(ValueAddr::NULL).with_name_override("Gone"),
    ];
    let query = SearchQuery::default();
    let mut ui = RecordingSubstrate::new(COLUMNS);
    pass(&host, &mut ui, &query, flat(), &roots);
    let ids: Vec<_> = ui.rows().iter().map(|r| r.id.clone()).collect();
    assert_eq!(ids.len(), 3);
    assert_ne!(ids[0], ids[1]);
    assert_ne!(ids[1], ids[2]);
    assert_ne!(ids[0], ids[2]);

    pass(&host, &mut ui, &query, flat(), &roots);
    let again: Vec<_> = ui.rows().iter().map(|r| r.id.clone()).collect();
    assert_eq!(ids, again);
}

#[test]
fn member_rows_offer_dotted_paths() {
    let Nested { host, outer } = nested();
    let roots = [PropertyItem::object(outer)];
    let query = SearchQuery::default();
    let mut ui = RecordingSubstrate::new(COLUMNS);
    ui.toggle("Outer_0");
    ui.toggle("Inner");
    pass(&host, &mut ui, &query, TreeOptions::default(), &roots);

    let paths: Vec<_> = ui
        .drags()
        .iter()
        .filter_map(|d| d.payload.as_path().map(str::to_owned))
        .collect();
    assert_eq!(paths, ["Outer_0.Inner", "Outer_0.Inner.A", "Outer_0.Inner.Deep"]);
    assert_eq!(ui.drags()[0].payload, DragPayload::member("Outer_0.Inner"));
}

#[test]
fn value_edits_become_requests() {
    let Pawn { host, pawn } = pawn();
    let roots = [PropertyItem::object(pawn)];
    let query = SearchQuery::default();
    let mut ui = RecordingSubstrate::new(COLUMNS);
    ui.toggle("Pawn_0");
    ui.edit_value("Health", Value::F32(75.0));
    ui.edit_value("Armor", Value::Str("lots".into()));

    let mut arena = TextArena::new();
    let mut state = TreeState::new(&host, &query, flat());
    state.draw_item_row(&mut ui, &mut arena, &roots[0], 0);

    let edits = &state.requests().edits;
    assert_eq!(edits.len(), 1, "mismatched edit is dropped");
    assert_eq!(edits[0].value, Value::F32(75.0));
    assert!(host.writes.is_empty());
}

#[test]
fn hovered_address_is_reported() {
    let Pawn { host, pawn } = pawn();
    let roots = [PropertyItem::object(pawn)];
    let query = SearchQuery::default();
    let mut ui = RecordingSubstrate::new(COLUMNS);
    ui.hover(Some("Pawn_0"));
    let mut arena = TextArena::new();
    let mut state = TreeState::new(&host, &query, flat());
    state.draw_item_row(&mut ui, &mut arena, &roots[0], 0);
    assert_eq!(state.hovered(), Some(pawn));
}
