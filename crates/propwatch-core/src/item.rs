#![forbid(unsafe_code)]

//! Uniform view of anything the inspector can show as a row.
//!
//! A [`PropertyItem`] pairs a value address with the descriptor that
//! explains it: a field, an object's class, a struct layout, or a function.
//! All queries (name, type strings, size, children) go through the
//! [`Reflection`] host passed in by the caller, so items are cheap plain
//! values that can be rebuilt every pass.
//!
//! # Invariants
//!
//! 1. An item is *valid* when its address is non-null or it carries a
//!    field descriptor. A null object reference field is valid (it still
//!    names a field) but has no members.
//! 2. Items with a null address have no members.
//! 3. Object members are only enumerated after the host confirms the
//!    object is live.
//! 4. The member count is memoized per item value. Any item rebuilt from
//!    the host starts with an empty memo.
//!
//! # Member production
//!
//! | Item                              | Members                                   |
//! |-----------------------------------|-------------------------------------------|
//! | object                            | one field item per class field            |
//! | struct value                      | one field item per layout field           |
//! | object field                      | the referenced object's fields            |
//! | weak / lazy / soft field          | resolved object's fields, or none          |
//! | array / set field                 | `[i]` element items                       |
//! | map field                         | `[i] Key` then `[i] Value` per entry      |
//! | delegate field                    | the bound function, when it resolves      |
//! | multicast delegate, function      | none                                      |

use core::cell::Cell;

use crate::reflect::{FieldId, FieldKind, FunctionId, InlineStruct, Reflection, StructId, ValueAddr};

/// What kind of thing an item describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ItemKind {
    Field,
    Object,
    Struct,
    ArrayElement,
    MapEntry,
    Function,
}

/// Which half of a map entry an item shows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MapSide {
    Key,
    Value,
}

/// Layout attached to items that are not described by a field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Composite {
    Struct(StructId),
    Function(FunctionId),
}

/// Identity used by the cycle guard: the same address viewed as a
/// different type is a different node.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct VisitedInfo {
    pub addr: ValueAddr,
    pub cpp_type: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Element {
    index: usize,
    side: Option<MapSide>,
}

/// A row the inspector can draw.
#[derive(Clone, Debug)]
pub struct PropertyItem {
    kind: ItemKind,
    addr: ValueAddr,
    field: Option<FieldId>,
    composite: Option<Composite>,
    element: Option<Element>,
    name_override: Option<String>,
    id_override: Option<String>,
    member_count: Cell<Option<usize>>,
}

impl PartialEq for PropertyItem {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.addr == other.addr
            && self.field == other.field
            && self.composite == other.composite
            && self.element == other.element
            && self.name_override == other.name_override
            && self.id_override == other.id_override
    }
}

impl Default for PropertyItem {
    fn default() -> Self {
        Self::new(ItemKind::Field, ValueAddr::NULL, None, None)
    }
}

impl PropertyItem {
    fn new(
        kind: ItemKind,
        addr: ValueAddr,
        field: Option<FieldId>,
        composite: Option<Composite>,
    ) -> Self {
        Self {
            kind,
            addr,
            field,
            composite,
            element: None,
            name_override: None,
            id_override: None,
            member_count: Cell::new(None),
        }
    }

    // ------------------------------------------------------------------
    // Constructors
    // ------------------------------------------------------------------

    /// A top-level object.
    #[must_use]
    pub fn object(addr: ValueAddr) -> Self {
        Self::new(ItemKind::Object, addr, None, None)
    }

    /// A struct value with a known layout.
    #[must_use]
    pub fn struct_value(addr: ValueAddr, layout: StructId) -> Self {
        Self::new(ItemKind::Struct, addr, None, Some(Composite::Struct(layout)))
    }

    /// A field whose value lives at `addr` (already resolved for object
    /// pointers).
    #[must_use]
    pub fn field(addr: ValueAddr, field: FieldId) -> Self {
        Self::new(ItemKind::Field, addr, Some(field), None)
    }

    /// A function bound to `object`.
    #[must_use]
    pub fn function(object: ValueAddr, function: FunctionId) -> Self {
        Self::new(ItemKind::Function, object, None, Some(Composite::Function(function)))
    }

    fn array_element(addr: ValueAddr, inner: FieldId, index: usize) -> Self {
        let mut item = Self::new(ItemKind::ArrayElement, addr, Some(inner), None);
        item.element = Some(Element { index, side: None });
        item
    }

    fn map_entry(addr: ValueAddr, field: FieldId, index: usize, side: MapSide) -> Self {
        let mut item = Self::new(ItemKind::MapEntry, addr, Some(field), None);
        item.element = Some(Element {
            index,
            side: Some(side),
        });
        item
    }

    /// Replace the displayed name.
    #[must_use]
    pub fn with_name_override(mut self, name: impl Into<String>) -> Self {
        self.name_override = Some(name.into());
        self
    }

    /// Replace the row identity used for top-level rows.
    #[must_use]
    pub fn with_id_override(mut self, id: impl Into<String>) -> Self {
        self.id_override = Some(id.into());
        self
    }

    pub fn set_name_override(&mut self, name: impl Into<String>) {
        self.name_override = Some(name.into());
    }

    // ------------------------------------------------------------------
    // Plain accessors
    // ------------------------------------------------------------------

    #[must_use]
    pub const fn kind(&self) -> ItemKind {
        self.kind
    }

    #[must_use]
    pub const fn addr(&self) -> ValueAddr {
        self.addr
    }

    #[must_use]
    pub const fn field_id(&self) -> Option<FieldId> {
        self.field
    }

    #[must_use]
    pub const fn composite(&self) -> Option<Composite> {
        self.composite
    }

    #[must_use]
    pub fn name_override(&self) -> Option<&str> {
        self.name_override.as_deref()
    }

    #[must_use]
    pub fn id_override(&self) -> Option<&str> {
        self.id_override.as_deref()
    }

    /// Index of an array element or map entry.
    #[must_use]
    pub fn element_index(&self) -> Option<usize> {
        self.element.map(|e| e.index)
    }

    #[must_use]
    pub fn map_side(&self) -> Option<MapSide> {
        self.element.and_then(|e| e.side)
    }

    /// Non-null address or a field descriptor.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        !self.addr.is_null() || self.field.is_some()
    }

    #[must_use]
    pub fn function_id(&self) -> Option<FunctionId> {
        match self.composite {
            Some(Composite::Function(f)) => Some(f),
            _ => None,
        }
    }

    /// Field kind, for field-backed items.
    #[must_use]
    pub fn field_kind(&self, host: &dyn Reflection) -> Option<FieldKind> {
        self.field.map(|f| host.field_kind(f))
    }

    /// Whether the row shows an object: a top-level object or an object
    /// pointer field.
    #[must_use]
    pub fn is_object_like(&self, host: &dyn Reflection) -> bool {
        self.kind == ItemKind::Object
            || self.field_kind(host).is_some_and(FieldKind::is_object_pointer)
    }

    // ------------------------------------------------------------------
    // Descriptor-derived text
    // ------------------------------------------------------------------

    /// Name from the descriptor alone, ignoring overrides and indices.
    #[must_use]
    pub fn descriptor_name(&self, host: &dyn Reflection) -> String {
        if let Some(field) = self.field {
            return host.field_name(field);
        }
        match (self.kind, self.composite) {
            (ItemKind::Object, _) if host.object_is_live(self.addr) => host.object_name(self.addr),
            (_, Some(Composite::Struct(s))) => host.struct_name(s),
            (_, Some(Composite::Function(f))) => host.function_name(f),
            _ => String::new(),
        }
    }

    /// Override if set, then `[i]`-style element labels, then the
    /// descriptor name.
    #[must_use]
    pub fn authored_name(&self, host: &dyn Reflection) -> String {
        if let Some(name) = &self.name_override {
            return name.clone();
        }
        match self.element {
            Some(Element { index, side: None }) => format!("[{index}]"),
            Some(Element {
                index,
                side: Some(MapSide::Key),
            }) => format!("[{index}] Key"),
            Some(Element {
                index,
                side: Some(MapSide::Value),
            }) => format!("[{index}] Value"),
            None => self.descriptor_name(host),
        }
    }

    /// Label shown in the name column.
    #[must_use]
    pub fn display_name(&self, host: &dyn Reflection) -> String {
        self.authored_name(host)
    }

    /// Native type spelling. Functions read `Ret (A, B)`.
    #[must_use]
    pub fn cpp_type(&self, host: &dyn Reflection) -> String {
        if let Some(field) = self.field {
            return host.field_cpp_type(field);
        }
        match (self.kind, self.composite) {
            (ItemKind::Object, _) => self
                .object_class(host)
                .map(|class| host.struct_name(class))
                .unwrap_or_default(),
            (_, Some(Composite::Struct(s))) => host.struct_cpp_name(s),
            (_, Some(Composite::Function(f))) => function_signature(host, f),
            _ => String::new(),
        }
    }

    /// Descriptor class name of field-backed items, e.g. `IntProperty`.
    #[must_use]
    pub fn property_type(&self, host: &dyn Reflection) -> String {
        self.field
            .map(|f| host.field_class_name(f))
            .unwrap_or_default()
    }

    /// Declaring class of a field or function.
    #[must_use]
    pub fn owner_name(&self, host: &dyn Reflection) -> String {
        if let Some(field) = self.field {
            return host.field_owner(field);
        }
        match self.composite {
            Some(Composite::Function(f)) => host.function_owner(f),
            _ => String::new(),
        }
    }

    /// Metadata rendered as `key:\n\tvalue` blocks separated by blank lines.
    #[must_use]
    pub fn metadata_text(&self, host: &dyn Reflection) -> String {
        let Some(field) = self.field else {
            return String::new();
        };
        host.field_metadata(field)
            .iter()
            .map(|(key, value)| format!("{key}:\n\t{value}"))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// The `Category` metadata value.
    #[must_use]
    pub fn metadata_category(&self, host: &dyn Reflection) -> String {
        let Some(field) = self.field else {
            return String::new();
        };
        host.field_metadata(field)
            .into_iter()
            .find(|(key, _)| key == "Category")
            .map(|(_, value)| value)
            .unwrap_or_default()
    }

    /// Size in bytes, or -1 when unknown.
    #[must_use]
    pub fn size(&self, host: &dyn Reflection) -> i32 {
        if let Some(field) = self.field {
            return host.field_size(field);
        }
        match (self.kind, self.composite) {
            (ItemKind::Object, _) => self
                .object_class(host)
                .map_or(-1, |class| host.struct_size(class)),
            (_, Some(Composite::Struct(s))) => host.struct_size(s),
            _ => -1,
        }
    }

    #[must_use]
    pub fn identity(&self, host: &dyn Reflection) -> VisitedInfo {
        VisitedInfo {
            addr: self.addr,
            cpp_type: self.cpp_type(host),
        }
    }

    fn object_class(&self, host: &dyn Reflection) -> Option<StructId> {
        if self.addr.is_null() || !host.object_is_live(self.addr) {
            return None;
        }
        host.object_class(self.addr)
    }

    // ------------------------------------------------------------------
    // Children
    // ------------------------------------------------------------------

    /// Whether the value's kind can have children at all.
    #[must_use]
    pub fn is_expandable(&self, host: &dyn Reflection) -> bool {
        if !self.is_valid() || self.addr.is_null() {
            return false;
        }
        match self.kind {
            ItemKind::Function => return false,
            ItemKind::Object | ItemKind::Struct if self.field.is_none() => return true,
            _ => {}
        }
        let Some(field) = self.field else {
            return false;
        };
        match host.field_kind(field) {
            FieldKind::Array
            | FieldKind::Map
            | FieldKind::Set
            | FieldKind::Object
            | FieldKind::Class
            | FieldKind::WeakObject
            | FieldKind::LazyObject
            | FieldKind::SoftObject
            | FieldKind::SoftClass
            | FieldKind::Delegate
            | FieldKind::MulticastDelegate
            | FieldKind::MulticastInlineDelegate
            | FieldKind::MulticastSparseDelegate => true,
            FieldKind::Struct => host.field_struct(field).is_some_and(|s| {
                InlineStruct::from_cpp_name(&host.struct_cpp_name(s))
                    .is_none_or(|inline| !inline.hides_members())
            }),
            _ => false,
        }
    }

    /// Number of children, memoized on this item.
    #[must_use]
    pub fn member_count(&self, host: &dyn Reflection) -> usize {
        if let Some(count) = self.member_count.get() {
            return count;
        }
        let count = self.collect_members(host, None);
        self.member_count.set(Some(count));
        count
    }

    /// Expandable and has at least one child.
    #[must_use]
    pub fn can_be_opened(&self, host: &dyn Reflection) -> bool {
        self.is_expandable(host) && self.member_count(host) > 0
    }

    /// Child items in display order.
    #[must_use]
    pub fn members(&self, host: &dyn Reflection) -> Vec<PropertyItem> {
        let mut out = Vec::new();
        let count = self.collect_members(host, Some(&mut out));
        self.member_count.set(Some(count));
        out
    }

    fn collect_members(&self, host: &dyn Reflection, mut out: Option<&mut Vec<PropertyItem>>) -> usize {
        if self.addr.is_null() {
            return 0;
        }
        match (self.kind, self.field) {
            (ItemKind::Function, _) => 0,
            (ItemKind::Object, None) => object_members(host, self.addr, out),
            (ItemKind::Struct, None) => match self.composite {
                Some(Composite::Struct(layout)) => struct_members(host, self.addr, layout, out),
                _ => 0,
            },
            (_, None) => 0,
            (_, Some(field)) => match host.field_kind(field) {
                FieldKind::Object | FieldKind::Class => object_members(host, self.addr, out),
                kind if kind.is_indirect_reference() => {
                    match host.resolve_reference(self.addr, field) {
                        crate::reflect::RefState::Live(object) => object_members(host, object, out),
                        _ => 0,
                    }
                }
                FieldKind::Struct => match host.field_struct(field) {
                    Some(layout) => struct_members(host, self.addr, layout, out),
                    None => 0,
                },
                FieldKind::Array | FieldKind::Set => {
                    let Some(inner) = host.field_inner(field) else {
                        return 0;
                    };
                    let slots = if host.field_kind(field) == FieldKind::Set {
                        host.set_slots(self.addr, field)
                    } else {
                        host.array_slots(self.addr, field)
                    };
                    if let Some(out) = out.as_deref_mut() {
                        out.extend(slots.iter().enumerate().map(|(i, &slot)| {
                            PropertyItem::array_element(value_address(host, inner, slot), inner, i)
                        }));
                    }
                    slots.len()
                }
                FieldKind::Map => {
                    let Some((key, value)) = host.field_key_value(field) else {
                        return 0;
                    };
                    let entries = host.map_slots(self.addr, field);
                    if let Some(out) = out.as_deref_mut() {
                        for (i, &(key_slot, value_slot)) in entries.iter().enumerate() {
                            out.push(PropertyItem::map_entry(
                                value_address(host, key, key_slot),
                                key,
                                i,
                                MapSide::Key,
                            ));
                            out.push(PropertyItem::map_entry(
                                value_address(host, value, value_slot),
                                value,
                                i,
                                MapSide::Value,
                            ));
                        }
                    }
                    entries.len() * 2
                }
                FieldKind::Delegate => {
                    let bound = host
                        .delegate_binding(self.addr, field)
                        .and_then(|b| b.function.map(|f| (b.object, f)))
                        .filter(|(object, _)| !object.is_null());
                    match bound {
                        Some((object, function)) => {
                            if let Some(out) = out.as_deref_mut() {
                                out.push(PropertyItem::function(object, function));
                            }
                            1
                        }
                        None => 0,
                    }
                }
                _ => 0,
            },
        }
    }
}

/// Address a field's value lives at, given the slot holding it. Object
/// pointers are loaded so the item addresses the referenced object.
#[must_use]
pub fn value_address(host: &dyn Reflection, field: FieldId, slot: ValueAddr) -> ValueAddr {
    if slot.is_null() {
        return slot;
    }
    if host.field_kind(field).is_object_pointer() {
        host.load_object(slot)
    } else {
        slot
    }
}

fn object_members(host: &dyn Reflection, object: ValueAddr, out: Option<&mut Vec<PropertyItem>>) -> usize {
    if object.is_null() || !host.object_is_live(object) {
        return 0;
    }
    match host.object_class(object) {
        Some(class) => struct_members(host, object, class, out),
        None => 0,
    }
}

fn struct_members(
    host: &dyn Reflection,
    container: ValueAddr,
    layout: StructId,
    out: Option<&mut Vec<PropertyItem>>,
) -> usize {
    let fields = host.struct_fields(layout);
    if let Some(out) = out {
        out.extend(fields.iter().map(|&field| {
            let slot = host.field_slot(container, field);
            PropertyItem::field(value_address(host, field, slot), field)
        }));
    }
    fields.len()
}

fn function_signature(host: &dyn Reflection, function: FunctionId) -> String {
    let ret = host
        .function_return(function)
        .map_or_else(|| "void".to_owned(), |f| host.field_cpp_type(f));
    let params = host
        .function_params(function)
        .into_iter()
        .map(|f| host.field_cpp_type(f))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{ret} ({params})")
}

/// A named group of top-level items for the Objects tab. An empty name
/// draws the items without a section header.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PropertyItemCategory {
    pub name: String,
    pub items: Vec<PropertyItem>,
}

impl PropertyItemCategory {
    #[must_use]
    pub fn new(name: impl Into<String>, items: Vec<PropertyItem>) -> Self {
        Self {
            name: name.into(),
            items,
        }
    }
}
