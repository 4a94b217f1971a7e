#![forbid(unsafe_code)]

//! The inspector window.
//!
//! [`Inspector::update`] draws one pass: the search bar, then three tabs
//! (Objects, Actors, Watch) sharing one ten-column table layout. Nothing
//! is written to the host while drawing. Value edits and function calls
//! queue up in the inspector and are applied by
//! [`Inspector::apply_requests`]; watch list changes are applied to the
//! caller's [`WatchList`] once the tabs are done.
//!
//! # State
//!
//! Everything that survives a pass and is not keyed by node id lives in
//! [`ViewState`], owned by the inspector and reset by
//! [`Inspector::reset_view`]: toggles, the search string, the actor list
//! and the address hovered last pass.
//!
//! # Failure Modes
//!
//! | Situation                    | Behavior                                  |
//! |------------------------------|-------------------------------------------|
//! | Row ceiling reached          | Pass stops descending, `aborted` is set   |
//! | Watch path does not resolve  | Entry stays, drawn as an empty row        |
//! | No actor source              | Actors tab shows a note, table is empty   |
//! | Host rejects a write or call | Logged, returned from `apply_requests`    |

use core::cmp::Ordering;

use propwatch_core::arena::TextArena;
use propwatch_core::config::InspectorConfig;
use propwatch_core::item::{PropertyItem, PropertyItemCategory};
use propwatch_core::reflect::{ActorSource, Reflection, ValueAddr, WriteError};
use propwatch_core::requests::PassRequests;
use propwatch_core::search::{SEARCH_HELP, SearchQuery};
use propwatch_core::settings::ViewSettings;
use propwatch_core::watch::WatchList;

use crate::drag::MEMBER_PATH;
use crate::substrate::{ColumnSetup, NodeFlags, SortSpec, Substrate};
use crate::tree_view::{TreeNodeState, TreeOptions, TreeState, WatchRow};

/// Text of the "Help" tooltip.
pub const HELP_TEXT: &str = "\
Drag an item somewhere to add it to the watch list.

Shift click on a node -> Open/Close all.
Shift click + digit on a node -> Specify how many layers to open.
  Useful since opening everything on an actor can open a whole lot of things.

Right click on an item to inline it.";

const SEARCH_ID: &str = "##SearchEdit";
const SEARCH_HINT: &str = "Search Properties (Ctrl+F)";
const TABLE_ID: &str = "table";
const CHANNELS_POPUP: &str = "SetChannelsPopup";
const TRACE_POPUP: &str = "PopupMouseTrace";

/// Table column indices.
pub mod column {
    pub const NAME: usize = 0;
    pub const VALUE: usize = 1;
    pub const METADATA: usize = 2;
    pub const TYPE: usize = 3;
    pub const CPP_TYPE: usize = 4;
    pub const CLASS: usize = 5;
    pub const CATEGORY: usize = 6;
    pub const ADDRESS: usize = 7;
    pub const SIZE: usize = 8;
    pub const REMOVE: usize = 9;
    pub const COUNT: usize = 10;
}

// ---------------------------------------------------------------------------
// Tabs
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tab {
    Objects,
    Actors,
    Watch,
}

impl Tab {
    pub const ALL: [Self; 3] = [Self::Objects, Self::Actors, Self::Watch];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Objects => "Objects",
            Self::Actors => "Actors",
            Self::Watch => "Watch",
        }
    }

    /// Column layout of this tab's table.
    #[must_use]
    pub fn columns(self) -> [ColumnSetup; column::COUNT] {
        let sortable = self == Self::Actors;
        [
            ColumnSetup::new("Property Name").sortable(sortable),
            ColumnSetup::new("Property Value"),
            ColumnSetup::new("Metadata").hidden(),
            ColumnSetup::new("Property Type").hidden(),
            ColumnSetup::new("CPP Type").sortable(sortable),
            ColumnSetup::new("Owner Class").hidden(),
            ColumnSetup::new("Category").hidden(),
            ColumnSetup::new("Address").hidden().sortable(sortable),
            ColumnSetup::new("Size").hidden().sortable(sortable),
            ColumnSetup::new("Remove").disabled(self != Self::Watch),
        ]
    }
}

// ---------------------------------------------------------------------------
// View state
// ---------------------------------------------------------------------------

/// Caller-visible state that persists across passes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ViewState {
    pub settings: ViewSettings,
    /// Roots of the Actors tab, refreshed on request.
    pub actor_items: Vec<PropertyItem>,
    /// Address hovered in the last pass; rows at it are highlighted.
    pub hovered_address: Option<ValueAddr>,
    /// Mouse trace popup was opened and is waiting to close.
    pub trace_armed: bool,
}

impl ViewState {
    #[must_use]
    pub fn new(settings: ViewSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    /// Drop everything tied to the previous session. Settings are kept.
    pub fn reset(&mut self) {
        self.actor_items.clear();
        self.hovered_address = None;
        self.trace_armed = false;
    }
}

/// What a pass reports back to the caller.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UpdateOutcome {
    /// The user asked to save the watch list.
    pub wants_save: bool,
    /// The user asked to load the watch list.
    pub wants_load: bool,
    pub rows_drawn: usize,
    /// The row ceiling cut the pass short.
    pub aborted: bool,
    /// Edits and calls waiting for [`Inspector::apply_requests`].
    pub pending_edits: usize,
}

// ---------------------------------------------------------------------------
// Inspector
// ---------------------------------------------------------------------------

/// The property inspector.
#[derive(Debug, Default)]
pub struct Inspector {
    config: InspectorConfig,
    view: ViewState,
    arena: TextArena,
    pending: PassRequests,
}

impl Inspector {
    #[must_use]
    pub fn new(config: InspectorConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_settings(mut self, settings: ViewSettings) -> Self {
        self.view.settings = settings.sanitized();
        self
    }

    #[must_use]
    pub fn config(&self) -> &InspectorConfig {
        &self.config
    }

    #[must_use]
    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut ViewState {
        &mut self.view
    }

    /// Start a new session: forget actors, hover and pending requests.
    pub fn reset_view(&mut self) {
        self.view.reset();
        self.pending = PassRequests::default();
    }

    /// Edits and calls queued by earlier passes.
    #[must_use]
    pub fn pending(&self) -> &PassRequests {
        &self.pending
    }

    /// Draw one pass.
    ///
    /// `categories` are the Objects tab roots; their items are also the
    /// roots watch paths resolve against. `actors` feeds the Actors tab.
    pub fn update(
        &mut self,
        host: &dyn Reflection,
        actors: Option<&dyn ActorSource>,
        ui: &mut dyn Substrate,
        window_name: &str,
        categories: &[PropertyItemCategory],
        watch: &mut WatchList,
    ) -> UpdateOutcome {
        let span = propwatch_core::debug_span!(
            target: "propwatch::pass",
            "update",
            window = window_name,
            watched = watch.len()
        );
        let _guard = span.enter();

        let mut outcome = UpdateOutcome::default();
        let title = format!("Property Watcher: {window_name}");
        if !ui.begin_window(&title) {
            ui.end_window();
            return outcome;
        }

        draw_top_bar(ui, &mut self.view.settings);

        let query = SearchQuery::parse(&self.view.settings.search);
        let options = TreeOptions::new(&self.config, &self.view.settings);
        let mut requests = PassRequests::default();
        let mut hovered = None;

        for tab in Tab::ALL {
            ui.push_id(tab.label());
            if ui.tab_item(tab.label()) {
                match tab {
                    Tab::Objects => {}
                    Tab::Actors => draw_actor_controls(ui, actors, &mut self.view),
                    Tab::Watch => draw_watch_controls(ui, &mut requests),
                }

                let mut state = TreeState::new(host, &query, options)
                    .with_hovered(self.view.hovered_address);
                if ui.begin_table(TABLE_ID, &tab.columns()) {
                    match tab {
                        Tab::Objects => {
                            for category in categories {
                                draw_category(&mut state, ui, &mut self.arena, category);
                            }
                        }
                        Tab::Actors => {
                            if let Some(spec) = ui.sort_specs() {
                                sort_actor_items(host, &mut self.view.actor_items, spec);
                            }
                            for item in &self.view.actor_items {
                                if state.aborted() {
                                    break;
                                }
                                state.draw_item_row(ui, &mut self.arena, item, 0);
                            }
                        }
                        Tab::Watch => {
                            let roots: Vec<PropertyItem> = categories
                                .iter()
                                .flat_map(|c| c.items.iter().cloned())
                                .collect();
                            draw_watch_rows(&mut state, ui, &mut self.arena, watch, &roots);
                        }
                    }
                    ui.end_table();
                }
                ui.text(&format!("Item count: {}", state.rows_drawn()));

                outcome.rows_drawn = state.rows_drawn();
                outcome.aborted = state.aborted();
                hovered = state.hovered();
                requests.merge(state.into_requests());
                ui.end_tab_item();
            }
            ui.pop_id();
        }

        if let Some(payload) = ui.window_drop_target(MEMBER_PATH) {
            if let Some(path) = payload.as_path() {
                requests.request_add(path);
            }
        }
        ui.end_window();

        if requests.touches_watch() {
            propwatch_core::debug!(
                target: "propwatch::watch",
                adds = requests.adds.len(),
                renames = requests.renames.len(),
                delete = ?requests.delete,
                swap = ?requests.swap,
                "applying watch requests"
            );
            watch.apply(&mut requests);
        }
        outcome.wants_save = requests.wants_save;
        outcome.wants_load = requests.wants_load;
        requests.wants_save = false;
        requests.wants_load = false;
        self.pending.merge(requests);
        outcome.pending_edits = self.pending.edits.len() + self.pending.calls.len();

        self.view.hovered_address = hovered;
        propwatch_core::trace!(
            target: "propwatch::pass",
            arena_bytes = self.arena.stats().high_water,
            rows = outcome.rows_drawn,
            "pass finished"
        );
        self.arena.reset();
        outcome
    }

    /// Apply queued edits and calls. Returns the failures, each already
    /// logged.
    pub fn apply_requests(&mut self, host: &mut dyn Reflection) -> Vec<WriteError> {
        let mut errors = Vec::new();
        for edit in self.pending.edits.drain(..) {
            if let Err(err) = host.write_value(edit.slot, edit.field, edit.value) {
                propwatch_core::warn!(
                    target: "propwatch::pass",
                    slot = %edit.slot,
                    error = %err,
                    "value write failed"
                );
                errors.push(err);
            }
        }
        for call in self.pending.calls.drain(..) {
            if let Err(err) = host.call_function(call.object, call.function) {
                propwatch_core::warn!(
                    target: "propwatch::pass",
                    object = %call.object,
                    error = %err,
                    "function call failed"
                );
                errors.push(err);
            }
        }
        errors
    }
}

// ---------------------------------------------------------------------------
// Pass sections
// ---------------------------------------------------------------------------

fn draw_top_bar(ui: &mut dyn Substrate, settings: &mut ViewSettings) {
    if let Some(search) = ui.input_text(SEARCH_ID, SEARCH_HINT, &settings.search) {
        settings.search = search;
    }
    ui.text_disabled("(?)");
    ui.tooltip(SEARCH_HELP);

    if let Some(v) = ui.checkbox("Filter", settings.filter_active) {
        settings.filter_active = v;
    }
    ui.tooltip("Enable filtering of rows that didn't pass the search in the search box.");
    if let Some(v) = ui.checkbox("Classes", settings.group_by_owner) {
        settings.group_by_owner = v;
    }
    ui.tooltip("Enable sorting of actor member variables by classes with subsections.");
    if let Some(v) = ui.checkbox("Functions", settings.list_functions) {
        settings.list_functions = v;
    }
    ui.tooltip("Show functions in actor items.");

    ui.text_disabled("Help");
    ui.tooltip(HELP_TEXT);
}

fn draw_watch_controls(ui: &mut dyn Substrate, requests: &mut PassRequests) {
    if ui.button("Clear All", true) {
        requests.request_clear_watch();
    }
    if ui.button("Save", true) {
        requests.wants_save = true;
    }
    if ui.button("Load", true) {
        requests.wants_load = true;
    }
}

fn draw_actor_controls(ui: &mut dyn Substrate, source: Option<&dyn ActorSource>, view: &mut ViewState) {
    let Some(source) = source else {
        ui.text_disabled("No actor source.");
        return;
    };
    let settings = &mut view.settings;

    ui.text(&format!("Current World: {}", source.world_name()));

    let every_frame = settings.update_actors_every_frame;
    let mut refresh = every_frame;
    if ui.button("Update Actors", !every_frame) {
        refresh = true;
    }
    if ui.button("x", !every_frame) {
        view.actor_items.clear();
    }
    if let Some(v) = ui.checkbox("Update actors every frame", every_frame) {
        settings.update_actors_every_frame = v;
    }
    if let Some(v) = ui.checkbox("Search around player", settings.search_around_player) {
        settings.search_around_player = v;
    }

    let channels = source.collision_channels();
    settings.channels.resize(channels.len(), false);

    let nearby = settings.search_around_player;
    let mut trace = false;
    if ui.button("Set Channels", nearby) {
        ui.open_popup(CHANNELS_POPUP);
    }
    if ui.begin_popup(CHANNELS_POPUP) {
        for (channel, active) in channels.iter().zip(settings.channels.iter_mut()) {
            if let Some(v) = ui.selectable(&channel.name, *active) {
                *active = v;
            }
        }
        if ui.button("Clear All", true) {
            settings.channels.fill(false);
        }
        ui.end_popup();
    }

    if ui.button("Do Mouse Trace", nearby) {
        ui.open_popup(TRACE_POPUP);
        view.trace_armed = true;
    }
    if ui.begin_popup(TRACE_POPUP) {
        ui.text("Click on screen to trace object.");
        ui.end_popup();
    } else if view.trace_armed {
        view.trace_armed = false;
        trace = true;
    }

    if let Some(radius) = ui.input_float("Search radius in meters", settings.search_radius_m, nearby) {
        settings.search_radius_m = radius.clamp(0.0, ViewSettings::MAX_RADIUS_M);
    }
    if let Some(v) = ui.checkbox("Draw Search sphere", settings.draw_search_sphere) {
        settings.draw_search_sphere = v;
    }

    if refresh {
        let found = if nearby {
            source.actors_near_player(settings.search_radius_m, &settings.channels)
        } else {
            source.level_actors()
        };
        view.actor_items = found.into_iter().map(PropertyItem::object).collect();
        propwatch_core::debug!(
            target: "propwatch::pass",
            actors = view.actor_items.len(),
            nearby,
            "actor list refreshed"
        );
    }
    if trace {
        if let Some(actor) = source.actor_under_cursor() {
            view.actor_items.push(PropertyItem::object(actor));
        }
    }
}

fn draw_category(
    state: &mut TreeState<'_>,
    ui: &mut dyn Substrate,
    arena: &mut TextArena,
    category: &PropertyItemCategory,
) {
    if state.aborted() {
        return;
    }
    if category.name.is_empty() {
        for item in &category.items {
            state.draw_item_row(ui, arena, item, 0);
        }
        return;
    }
    let mut node = TreeNodeState::section().with_visual_depth(0);
    if state.begin_section(ui, &category.name, &mut node, 0, NodeFlags::DEFAULT_OPEN) {
        for item in &category.items {
            state.draw_item_row(ui, arena, item, 0);
        }
    }
    state.end_tree_node(ui, &node);
}

fn draw_watch_rows(
    state: &mut TreeState<'_>,
    ui: &mut dyn Substrate,
    arena: &mut TextArena,
    watch: &mut WatchList,
    roots: &[PropertyItem],
) {
    let host = state.host();
    for (index, entry) in watch.iter_mut().enumerate() {
        if state.aborted() {
            break;
        }
        if !entry.update_cache(host, roots) {
            propwatch_core::debug!(target: "propwatch::watch", path = %entry.path, "watch path unresolved");
        }
        state.set_watch_row(Some(WatchRow {
            index,
            path: entry.path.clone(),
        }));
        let item = entry.cached.clone().with_id_override(format!("Watch{index}"));
        state.draw_item_row(ui, arena, &item, 0);
    }
    state.set_watch_row(None);
}

/// Sort Actors tab roots by a table column, then by address.
pub fn sort_actor_items(host: &dyn Reflection, items: &mut [PropertyItem], spec: SortSpec) {
    let key_order = |a: &PropertyItem, b: &PropertyItem| -> Ordering {
        match spec.column {
            column::NAME => a.display_name(host).cmp(&b.display_name(host)),
            column::CPP_TYPE => a.cpp_type(host).cmp(&b.cpp_type(host)),
            column::SIZE => a.size(host).cmp(&b.size(host)),
            _ => Ordering::Equal,
        }
    };
    items.sort_by(|a, b| {
        let order = key_order(a, b).then_with(|| a.addr().cmp(&b.addr()));
        if spec.ascending { order } else { order.reverse() }
    });
}
