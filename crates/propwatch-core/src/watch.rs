#![forbid(unsafe_code)]

//! Watch list: dotted member paths re-resolved every pass.
//!
//! A watch entry stores only its path text, e.g. `Player.Inventory.[2]`.
//! Each pass the path is walked from the current top-level items, matching
//! one segment per level against each candidate's authored name, so a
//! watch keeps working as objects come and go.
//!
//! # Persistence format
//!
//! The list is saved as one line of comma-separated paths. `\` escapes a
//! literal `,` or `\` inside a path. Empty entries are dropped on load.

use crate::item::PropertyItem;
use crate::reflect::Reflection;
use crate::requests::PassRequests;

/// One watched path and the item it resolved to on the last pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MemberPath {
    pub path: String,
    pub cached: PropertyItem,
    pub resolved: bool,
}

impl MemberPath {
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            cached: PropertyItem::default(),
            resolved: false,
        }
    }

    /// Re-resolve against `roots`. Updates `cached` either way; the cached
    /// item always shows the path as its name.
    pub fn update_cache(&mut self, host: &dyn Reflection, roots: &[PropertyItem]) -> bool {
        let (item, found) = resolve_path(host, &self.path, roots);
        self.cached = item;
        self.resolved = found;
        found
    }
}

/// Walk `path` one segment per level, taking the first candidate whose
/// authored name matches. Returns the item reached (a default item on
/// failure) with its name overridden to `path`, and whether every segment
/// matched.
///
/// An empty segment (`A..B`, a leading or trailing `.`) never matches.
#[must_use]
pub fn resolve_path(
    host: &dyn Reflection,
    path: &str,
    roots: &[PropertyItem],
) -> (PropertyItem, bool) {
    if path.split('.').any(str::is_empty) {
        crate::trace!(target: "propwatch::watch", path, "watch path has an empty segment");
        return (PropertyItem::default().with_name_override(path), false);
    }
    let mut segments = path.split('.').peekable();

    let mut candidates: Vec<PropertyItem> = roots.to_vec();
    let mut current: Option<PropertyItem> = None;
    while let Some(segment) = segments.next() {
        let Some(found) = candidates
            .iter()
            .find(|c| c.authored_name(host) == segment)
            .cloned()
        else {
            crate::trace!(target: "propwatch::watch", path, segment, "watch path did not resolve");
            return (PropertyItem::default().with_name_override(path), false);
        };
        if segments.peek().is_some() {
            candidates = found.members(host);
        }
        current = Some(found);
    }

    match current {
        Some(item) => (item.with_name_override(path), true),
        None => (PropertyItem::default().with_name_override(path), false),
    }
}

/// Ordered list of watched paths.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WatchList {
    entries: Vec<MemberPath>,
}

impl WatchList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn push(&mut self, path: impl Into<String>) {
        self.entries.push(MemberPath::new(path));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&MemberPath> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MemberPath> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut MemberPath> {
        self.entries.iter_mut()
    }

    #[must_use]
    pub fn paths(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.path.as_str()).collect()
    }

    /// Re-resolve every entry against the current roots.
    pub fn update_caches(&mut self, host: &dyn Reflection, roots: &[PropertyItem]) {
        for entry in &mut self.entries {
            entry.update_cache(host, roots);
        }
    }

    /// Apply structural requests collected during a pass.
    ///
    /// Renames and the swap use indices from the pass that produced them;
    /// a pending delete is remapped through the swap. Out-of-range indices
    /// are ignored.
    pub fn apply(&mut self, requests: &mut PassRequests) {
        if requests.clear_watch {
            self.entries.clear();
        }
        for (index, path) in requests.renames.drain(..) {
            if let Some(entry) = self.entries.get_mut(index) {
                entry.path = path;
            }
        }
        let mut delete = requests.delete.take();
        if let Some((from, to)) = requests.swap.take() {
            if from < self.entries.len() && to < self.entries.len() {
                self.entries.swap(from, to);
                delete = delete.map(|d| match d {
                    d if d == from => to,
                    d if d == to => from,
                    d => d,
                });
            }
        }
        if let Some(index) = delete.filter(|&d| d < self.entries.len()) {
            self.entries.remove(index);
        }
        for path in requests.adds.drain(..) {
            self.push(path);
        }
    }

    /// One line of comma-separated, escaped paths.
    #[must_use]
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            for ch in entry.path.chars() {
                if matches!(ch, ',' | '\\') {
                    out.push('\\');
                }
                out.push(ch);
            }
        }
        out
    }

    /// Inverse of [`serialize`](Self::serialize). Empty entries are dropped.
    /// A trailing lone `\` is kept literally.
    #[must_use]
    pub fn deserialize(line: &str) -> Self {
        let mut list = Self::new();
        let mut current = String::new();
        let mut chars = line.trim_end_matches(['\r', '\n']).chars();
        while let Some(ch) = chars.next() {
            match ch {
                '\\' => current.push(chars.next().unwrap_or('\\')),
                ',' => {
                    if !current.is_empty() {
                        list.push(core::mem::take(&mut current));
                    }
                }
                other => current.push(other),
            }
        }
        if !current.is_empty() {
            list.push(current);
        }
        crate::debug!(target: "propwatch::watch", entries = list.len(), "watch list loaded");
        list
    }
}

impl FromIterator<String> for WatchList {
    fn from_iter<T: IntoIterator<Item = String>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().map(MemberPath::new).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockField, MockHost};
    use crate::reflect::{FieldKind, ValueAddr};

    fn scene() -> (MockHost, Vec<PropertyItem>) {
        let mut host = MockHost::new();
        let health = host.add_field(MockField::new("Health", FieldKind::Float).owner("Pawn"));
        let target = host.add_field(MockField::new("Target", FieldKind::Object).owner("Pawn"));
        let class = host.add_class("Pawn", &[health, target]);
        let a = host.spawn(class, "A");
        let b = host.spawn(class, "B");
        host.set_object(a, target, b);
        let roots = vec![PropertyItem::object(a), PropertyItem::object(b)];
        (host, roots)
    }

    #[test]
    fn resolves_nested_path() {
        let (host, roots) = scene();
        let (item, found) = resolve_path(&host, "A.Target.Health", &roots);
        assert!(found);
        assert_eq!(item.authored_name(&host), "A.Target.Health");
        assert_eq!(item.descriptor_name(&host), "Health");
    }

    #[test]
    fn missing_segment_fails_with_name() {
        let (host, roots) = scene();
        let (item, found) = resolve_path(&host, "A.Missing", &roots);
        assert!(!found);
        assert_eq!(item.authored_name(&host), "A.Missing");
        assert_eq!(item.addr(), ValueAddr::NULL);
    }

    #[test]
    fn empty_path_fails() {
        let (host, roots) = scene();
        let (item, found) = resolve_path(&host, "", &roots);
        assert!(!found);
        assert_eq!(item.authored_name(&host), "");
    }

    #[test]
    fn empty_segments_fail() {
        let (host, roots) = scene();
        for path in ["A..Target.Health", ".A.Target", "A.Target.", "."] {
            let (item, found) = resolve_path(&host, path, &roots);
            assert!(!found, "{path:?} resolved");
            assert_eq!(item.authored_name(&host), path);
            assert_eq!(item.addr(), ValueAddr::NULL);
        }
    }

    #[test]
    fn first_match_wins() {
        let mut host = MockHost::new();
        let class = host.add_class("Pawn", &[]);
        let first = host.spawn(class, "Twin");
        let second = host.spawn(class, "Twin");
        let roots = vec![PropertyItem::object(first), PropertyItem::object(second)];
        let (item, found) = resolve_path(&host, "Twin", &roots);
        assert!(found);
        assert_eq!(item.addr(), first);
    }

    #[test]
    fn update_cache_tracks_resolution() {
        let (host, roots) = scene();
        let mut entry = MemberPath::new("B.Health");
        assert!(entry.update_cache(&host, &roots));
        assert!(entry.resolved);
        entry.path = "C".into();
        assert!(!entry.update_cache(&host, &roots));
        assert!(!entry.resolved);
    }

    #[test]
    fn serialization_escapes_separators() {
        let list: WatchList = ["a,b".to_owned(), "c\\d".to_owned(), "e".to_owned()]
            .into_iter()
            .collect();
        let line = list.serialize();
        assert_eq!(line, "a\\,b,c\\\\d,e");
        assert_eq!(WatchList::deserialize(&line).paths(), ["a,b", "c\\d", "e"]);
    }

    #[test]
    fn deserialize_drops_empty_entries() {
        assert_eq!(WatchList::deserialize(",,a,,b,\n").paths(), ["a", "b"]);
        assert!(WatchList::deserialize("").is_empty());
    }

    #[test]
    fn apply_remaps_delete_through_swap() {
        let mut list: WatchList = ["a", "b", "c"].iter().map(|s| (*s).to_owned()).collect();
        let mut requests = PassRequests::default();
        requests.request_swap(0, 2);
        requests.request_delete(0);
        list.apply(&mut requests);
        assert_eq!(list.paths(), ["c", "b"]);
        assert!(requests.is_empty());
    }

    #[test]
    fn apply_renames_then_adds() {
        let mut list: WatchList = ["a"].iter().map(|s| (*s).to_owned()).collect();
        let mut requests = PassRequests::default();
        requests.request_rename(0, "z");
        requests.request_add("A.Health");
        requests.request_delete(7);
        list.apply(&mut requests);
        assert_eq!(list.paths(), ["z", "A.Health"]);
    }

    #[test]
    fn clear_drops_existing_entries_only() {
        let mut list: WatchList = ["a", "b"].iter().map(|s| (*s).to_owned()).collect();
        let mut requests = PassRequests::default();
        requests.request_clear_watch();
        requests.request_add("c");
        list.apply(&mut requests);
        assert_eq!(list.paths(), ["c"]);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn serialized_lists_load_back(paths in proptest::collection::vec("[a-z,\\\\.\\[\\]0-9]{1,12}", 0..8)) {
                let list: WatchList = paths.iter().cloned().collect();
                let loaded = WatchList::deserialize(&list.serialize());
                prop_assert_eq!(loaded.paths(), list.paths());
            }
        }
    }
}
