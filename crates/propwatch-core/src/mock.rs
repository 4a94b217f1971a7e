#![forbid(unsafe_code)]

//! In-memory reflection host for tests.
//!
//! [`MockHost`] keeps a small object graph: classes and structs built from
//! [`MockField`] descriptors, objects spawned from classes, and one memory
//! slot per field instance. Writes and calls are recorded so tests can
//! assert on what the inspector asked for.
//!
//! ```ignore
//! use propwatch_core::mock::{MockField, MockHost};
//! use propwatch_core::reflect::{FieldKind, Value};
//!
//! let mut host = MockHost::new();
//! let health = host.add_field(MockField::new("Health", FieldKind::Float).owner("Pawn"));
//! let pawn_class = host.add_class("Pawn", &[health]);
//! let pawn = host.spawn(pawn_class, "Pawn_0");
//! host.set_value(pawn, health, Value::F32(50.0));
//! ```

use std::collections::HashMap;

use crate::reflect::{
    ActorSource, CollisionChannel, DelegateBinding, FieldId, FieldKind, FunctionId, InlineStruct,
    RefState, Reflection, StructId, Value, ValueAddr, WriteError,
};

const ADDR_BASE: usize = 0x1000;
const ADDR_STRIDE: usize = 0x10;

/// Field descriptor builder.
#[derive(Clone, Debug)]
pub struct MockField {
    name: String,
    kind: FieldKind,
    cpp_type: Option<String>,
    size: Option<i32>,
    owner: String,
    metadata: Vec<(String, String)>,
    struct_id: Option<StructId>,
    inner: Option<Box<MockField>>,
    key_value: Option<(Box<MockField>, Box<MockField>)>,
    variants: Vec<String>,
    read_only: bool,
}

impl MockField {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            cpp_type: None,
            size: None,
            owner: String::new(),
            metadata: Vec::new(),
            struct_id: None,
            inner: None,
            key_value: None,
            variants: Vec::new(),
            read_only: false,
        }
    }

    #[must_use]
    pub fn owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = owner.into();
        self
    }

    #[must_use]
    pub fn cpp(mut self, cpp_type: impl Into<String>) -> Self {
        self.cpp_type = Some(cpp_type.into());
        self
    }

    #[must_use]
    pub fn size(mut self, size: i32) -> Self {
        self.size = Some(size);
        self
    }

    #[must_use]
    pub fn meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.push((key.into(), value.into()));
        self
    }

    #[must_use]
    pub fn struct_type(mut self, id: StructId) -> Self {
        self.struct_id = Some(id);
        self
    }

    /// Element descriptor for arrays and sets.
    #[must_use]
    pub fn inner(mut self, inner: MockField) -> Self {
        self.inner = Some(Box::new(inner));
        self
    }

    #[must_use]
    pub fn inner_kind(self, kind: FieldKind) -> Self {
        let name = self.name.clone();
        self.inner(MockField::new(name, kind))
    }

    #[must_use]
    pub fn key_value(mut self, key: MockField, value: MockField) -> Self {
        self.key_value = Some((Box::new(key), Box::new(value)));
        self
    }

    #[must_use]
    pub fn key_value_kinds(self, key: FieldKind, value: FieldKind) -> Self {
        let name = self.name.clone();
        self.key_value(
            MockField::new(format!("{name}_Key"), key),
            MockField::new(name, value),
        )
    }

    #[must_use]
    pub fn variants(mut self, variants: &[&str]) -> Self {
        self.variants = variants.iter().map(|v| (*v).to_owned()).collect();
        self
    }

    #[must_use]
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }
}

#[derive(Clone, Debug)]
struct FieldDesc {
    name: String,
    kind: FieldKind,
    cpp_type: String,
    size: i32,
    owner: String,
    metadata: Vec<(String, String)>,
    struct_id: Option<StructId>,
    inner: Option<FieldId>,
    key_value: Option<(FieldId, FieldId)>,
    variants: Vec<String>,
    read_only: bool,
}

#[derive(Clone, Debug)]
struct StructDesc {
    name: String,
    cpp_name: String,
    fields: Vec<FieldId>,
    size: i32,
    functions: Vec<FunctionId>,
}

#[derive(Clone, Debug)]
struct FunctionDesc {
    name: String,
    owner: String,
    params: Vec<FieldId>,
    ret: Option<FieldId>,
}

#[derive(Clone, Debug)]
struct ObjectDesc {
    name: String,
    class: StructId,
}

#[derive(Clone, Debug)]
enum Slot {
    Value(Value),
    Object(ValueAddr),
    Elements(Vec<ValueAddr>),
    Entries(Vec<(ValueAddr, ValueAddr)>),
    Reference { state: RefState, text: Option<String> },
    Delegate(Option<(ValueAddr, FunctionId)>),
    /// A class value; field slots point at it through `Slot::Object`.
    Class(String),
    Composite,
    Opaque,
}

/// A recorded call to [`Reflection::write_value`].
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedWrite {
    pub slot: ValueAddr,
    pub field: FieldId,
    pub value: Value,
}

/// An in-memory object graph implementing [`Reflection`] and [`ActorSource`].
#[derive(Debug, Default)]
pub struct MockHost {
    fields: Vec<FieldDesc>,
    structs: Vec<StructDesc>,
    functions: Vec<FunctionDesc>,
    objects: HashMap<ValueAddr, ObjectDesc>,
    memory: HashMap<ValueAddr, Slot>,
    layout: HashMap<(ValueAddr, FieldId), ValueAddr>,
    next_addr: usize,
    actors: Vec<ValueAddr>,
    nearby: Vec<ValueAddr>,
    under_cursor: Option<ValueAddr>,
    channels: Vec<String>,
    /// Writes that reached the host, in order.
    pub writes: Vec<RecordedWrite>,
    /// Function calls that reached the host, in order.
    pub calls: Vec<(ValueAddr, FunctionId)>,
}

impl MockHost {
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_addr: ADDR_BASE,
            ..Self::default()
        }
    }

    fn alloc(&mut self, slot: Slot) -> ValueAddr {
        self.next_addr = self.next_addr.max(ADDR_BASE);
        let addr = ValueAddr(self.next_addr);
        self.next_addr += ADDR_STRIDE;
        self.memory.insert(addr, slot);
        addr
    }

    // ------------------------------------------------------------------
    // Descriptors
    // ------------------------------------------------------------------

    /// Register a field descriptor, including its element descriptors.
    pub fn add_field(&mut self, spec: MockField) -> FieldId {
        let inner = spec.inner.map(|inner| {
            let inner = if inner.owner.is_empty() {
                inner.owner(spec.owner.clone())
            } else {
                *inner
            };
            self.add_field(inner)
        });
        let key_value = spec
            .key_value
            .map(|(key, value)| (self.add_field(*key), self.add_field(*value)));
        let cpp_type = spec
            .cpp_type
            .unwrap_or_else(|| self.default_cpp_type(spec.kind, spec.struct_id, inner, key_value));
        let size = spec.size.unwrap_or_else(|| match spec.struct_id {
            Some(s) if spec.kind == FieldKind::Struct => self.structs[s.0 as usize].size,
            _ => default_size(spec.kind),
        });
        let id = FieldId(self.fields.len() as u32);
        self.fields.push(FieldDesc {
            name: spec.name,
            kind: spec.kind,
            cpp_type,
            size,
            owner: spec.owner,
            metadata: spec.metadata,
            struct_id: spec.struct_id,
            inner,
            key_value,
            variants: spec.variants,
            read_only: spec.read_only,
        });
        id
    }

    fn default_cpp_type(
        &self,
        kind: FieldKind,
        struct_id: Option<StructId>,
        inner: Option<FieldId>,
        key_value: Option<(FieldId, FieldId)>,
    ) -> String {
        let cpp = |f: FieldId| self.fields[f.0 as usize].cpp_type.clone();
        match kind {
            FieldKind::Struct => struct_id
                .map(|s| self.structs[s.0 as usize].cpp_name.clone())
                .unwrap_or_default(),
            FieldKind::Array => format!("TArray<{}>", inner.map(cpp).unwrap_or_default()),
            FieldKind::Set => format!("TSet<{}>", inner.map(cpp).unwrap_or_default()),
            FieldKind::Map => match key_value {
                Some((k, v)) => format!("TMap<{}, {}>", cpp(k), cpp(v)),
                None => "TMap".to_owned(),
            },
            other => default_cpp_name(other).to_owned(),
        }
    }

    /// Register a class. Its size is the sum of its field sizes.
    pub fn add_class(&mut self, name: &str, fields: &[FieldId]) -> StructId {
        self.add_layout(name, name, fields)
    }

    /// Register a struct layout under its native name.
    pub fn add_struct(&mut self, cpp_name: &str, fields: &[FieldId]) -> StructId {
        let name = cpp_name.strip_prefix('F').unwrap_or(cpp_name);
        self.add_layout(name, cpp_name, fields)
    }

    fn add_layout(&mut self, name: &str, cpp_name: &str, fields: &[FieldId]) -> StructId {
        let size = fields
            .iter()
            .map(|f| self.fields[f.0 as usize].size.max(0))
            .sum();
        let id = StructId(self.structs.len() as u32);
        self.structs.push(StructDesc {
            name: name.to_owned(),
            cpp_name: cpp_name.to_owned(),
            fields: fields.to_vec(),
            size,
            functions: Vec::new(),
        });
        id
    }

    /// Declare a function on `class`.
    pub fn add_function(
        &mut self,
        class: StructId,
        name: &str,
        params: &[FieldId],
        ret: Option<FieldId>,
    ) -> FunctionId {
        let id = FunctionId(self.functions.len() as u32);
        let owner = self.structs[class.0 as usize].name.clone();
        self.functions.push(FunctionDesc {
            name: name.to_owned(),
            owner,
            params: params.to_vec(),
            ret,
        });
        self.structs[class.0 as usize].functions.push(id);
        id
    }

    /// Append an inherited function declared elsewhere to `class`.
    pub fn inherit_function(&mut self, class: StructId, function: FunctionId) {
        self.structs[class.0 as usize].functions.push(function);
    }

    // ------------------------------------------------------------------
    // Instances
    // ------------------------------------------------------------------

    /// Create an object of `class` with default field values.
    pub fn spawn(&mut self, class: StructId, name: &str) -> ValueAddr {
        let addr = self.alloc(Slot::Composite);
        self.objects.insert(
            addr,
            ObjectDesc {
                name: name.to_owned(),
                class,
            },
        );
        self.instantiate_fields(addr, class);
        addr
    }

    fn instantiate_fields(&mut self, container: ValueAddr, layout: StructId) {
        let fields = self.structs[layout.0 as usize].fields.clone();
        for field in fields {
            let slot = self.instantiate(field);
            self.layout.insert((container, field), slot);
        }
    }

    fn instantiate(&mut self, field: FieldId) -> ValueAddr {
        let desc = self.fields[field.0 as usize].clone();
        let slot = match desc.kind {
            FieldKind::Object | FieldKind::Class => Slot::Object(ValueAddr::NULL),
            FieldKind::Array | FieldKind::Set => Slot::Elements(Vec::new()),
            FieldKind::Map => Slot::Entries(Vec::new()),
            kind if kind.is_indirect_reference() => Slot::Reference {
                state: RefState::Null,
                text: None,
            },
            FieldKind::Delegate => Slot::Delegate(None),
            FieldKind::Struct => {
                let cpp = desc
                    .struct_id
                    .map(|s| self.structs[s.0 as usize].cpp_name.clone())
                    .unwrap_or_default();
                match InlineStruct::from_cpp_name(&cpp) {
                    Some(inline) => Slot::Value(default_inline(inline)),
                    None => Slot::Composite,
                }
            }
            kind => default_value(kind, &desc.variants).map_or(Slot::Opaque, Slot::Value),
        };
        let addr = self.alloc(slot);
        if desc.kind == FieldKind::Struct {
            if let Some(layout) = desc.struct_id {
                self.instantiate_fields(addr, layout);
            }
        }
        addr
    }

    /// Slot of `field` inside `container`.
    ///
    /// # Panics
    ///
    /// Panics if the field was not instantiated in the container.
    #[must_use]
    pub fn slot(&self, container: ValueAddr, field: FieldId) -> ValueAddr {
        self.layout[&(container, field)]
    }

    pub fn set_value(&mut self, container: ValueAddr, field: FieldId, value: Value) {
        let slot = self.slot(container, field);
        self.memory.insert(slot, Slot::Value(value));
    }

    pub fn set_slot_value(&mut self, slot: ValueAddr, value: Value) {
        self.memory.insert(slot, Slot::Value(value));
    }

    pub fn set_object(&mut self, container: ValueAddr, field: FieldId, target: ValueAddr) {
        let slot = self.slot(container, field);
        self.memory.insert(slot, Slot::Object(target));
    }

    /// Point a class-reference field at a class named `class`; returns the
    /// class value's address.
    pub fn set_class_value(&mut self, container: ValueAddr, field: FieldId, class: &str) -> ValueAddr {
        let slot = self.slot(container, field);
        let value = self.alloc(Slot::Class(class.to_owned()));
        self.memory.insert(slot, Slot::Object(value));
        value
    }

    pub fn set_reference(
        &mut self,
        container: ValueAddr,
        field: FieldId,
        state: RefState,
        text: Option<&str>,
    ) {
        let slot = self.slot(container, field);
        self.memory.insert(
            slot,
            Slot::Reference {
                state,
                text: text.map(str::to_owned),
            },
        );
    }

    pub fn bind_delegate(
        &mut self,
        container: ValueAddr,
        field: FieldId,
        object: ValueAddr,
        function: FunctionId,
    ) {
        let slot = self.slot(container, field);
        self.memory.insert(slot, Slot::Delegate(Some((object, function))));
    }

    /// Append a default element to an array or set field; returns its slot.
    pub fn push_element(&mut self, container: ValueAddr, field: FieldId) -> ValueAddr {
        let list = self.slot(container, field);
        self.push_element_at(list, field)
    }

    /// Append a default element to the array stored at `list`.
    pub fn push_element_at(&mut self, list: ValueAddr, field: FieldId) -> ValueAddr {
        let inner = self.fields[field.0 as usize].inner;
        let element = match inner {
            Some(inner) => self.instantiate(inner),
            None => self.alloc(Slot::Opaque),
        };
        if let Some(Slot::Elements(elements)) = self.memory.get_mut(&list) {
            elements.push(element);
        }
        element
    }

    /// Append an object reference to an array of objects.
    pub fn push_object(&mut self, container: ValueAddr, field: FieldId, object: ValueAddr) {
        let element = self.push_element(container, field);
        self.memory.insert(element, Slot::Object(object));
    }

    /// Add a default entry to a map field; returns `(key slot, value slot)`.
    pub fn insert_entry(&mut self, container: ValueAddr, field: FieldId) -> (ValueAddr, ValueAddr) {
        let map = self.slot(container, field);
        let Some((key, value)) = self.fields[field.0 as usize].key_value else {
            return (ValueAddr::NULL, ValueAddr::NULL);
        };
        let pair = (self.instantiate(key), self.instantiate(value));
        if let Some(Slot::Entries(entries)) = self.memory.get_mut(&map) {
            entries.push(pair);
        }
        pair
    }

    /// Destroy an object; its address stays allocated but is no longer live.
    pub fn destroy(&mut self, object: ValueAddr) {
        self.objects.remove(&object);
    }

    pub fn add_actor(&mut self, object: ValueAddr) {
        self.actors.push(object);
    }

    pub fn add_nearby_actor(&mut self, object: ValueAddr) {
        self.nearby.push(object);
    }

    pub fn set_actor_under_cursor(&mut self, object: Option<ValueAddr>) {
        self.under_cursor = object;
    }

    pub fn add_channel(&mut self, name: &str) {
        self.channels.push(name.to_owned());
    }

    fn desc(&self, field: FieldId) -> &FieldDesc {
        &self.fields[field.0 as usize]
    }
}

fn default_cpp_name(kind: FieldKind) -> &'static str {
    match kind {
        FieldKind::Bool => "bool",
        FieldKind::Int8 => "int8",
        FieldKind::Int16 => "int16",
        FieldKind::Int32 => "int32",
        FieldKind::Int64 => "int64",
        FieldKind::UInt8 => "uint8",
        FieldKind::UInt16 => "uint16",
        FieldKind::UInt32 => "uint32",
        FieldKind::UInt64 => "uint64",
        FieldKind::Float => "float",
        FieldKind::Double => "double",
        FieldKind::Enum => "EEnum",
        FieldKind::Str => "FString",
        FieldKind::Name => "FName",
        FieldKind::Text => "FText",
        FieldKind::Object => "UObject*",
        FieldKind::Class => "UClass*",
        FieldKind::ClassPtr => "TObjectPtr<UClass>",
        FieldKind::SoftClass => "TSoftClassPtr<UObject>",
        FieldKind::WeakObject => "TWeakObjectPtr<UObject>",
        FieldKind::LazyObject => "TLazyObjectPtr<UObject>",
        FieldKind::SoftObject => "TSoftObjectPtr<UObject>",
        FieldKind::Interface => "TScriptInterface<IInterface>",
        FieldKind::Delegate => "FScriptDelegate",
        FieldKind::MulticastDelegate => "FMulticastScriptDelegate",
        FieldKind::MulticastInlineDelegate => "FMulticastInlineDelegate",
        FieldKind::MulticastSparseDelegate => "FMulticastSparseDelegate",
        FieldKind::Struct | FieldKind::Array | FieldKind::Map | FieldKind::Set => "",
        FieldKind::Unknown => "unknown",
    }
}

fn descriptor_class_name(kind: FieldKind) -> &'static str {
    match kind {
        FieldKind::Bool => "BoolProperty",
        FieldKind::Int8 => "Int8Property",
        FieldKind::Int16 => "Int16Property",
        FieldKind::Int32 => "IntProperty",
        FieldKind::Int64 => "Int64Property",
        FieldKind::UInt8 => "ByteProperty",
        FieldKind::UInt16 => "UInt16Property",
        FieldKind::UInt32 => "UInt32Property",
        FieldKind::UInt64 => "UInt64Property",
        FieldKind::Float => "FloatProperty",
        FieldKind::Double => "DoubleProperty",
        FieldKind::Enum => "EnumProperty",
        FieldKind::Str => "StrProperty",
        FieldKind::Name => "NameProperty",
        FieldKind::Text => "TextProperty",
        FieldKind::Object => "ObjectProperty",
        FieldKind::Class => "ClassProperty",
        FieldKind::ClassPtr => "ClassPtrProperty",
        FieldKind::SoftClass => "SoftClassProperty",
        FieldKind::WeakObject => "WeakObjectProperty",
        FieldKind::LazyObject => "LazyObjectProperty",
        FieldKind::SoftObject => "SoftObjectProperty",
        FieldKind::Interface => "InterfaceProperty",
        FieldKind::Struct => "StructProperty",
        FieldKind::Array => "ArrayProperty",
        FieldKind::Map => "MapProperty",
        FieldKind::Set => "SetProperty",
        FieldKind::Delegate => "DelegateProperty",
        FieldKind::MulticastDelegate => "MulticastDelegateProperty",
        FieldKind::MulticastInlineDelegate => "MulticastInlineDelegateProperty",
        FieldKind::MulticastSparseDelegate => "MulticastSparseDelegateProperty",
        FieldKind::Unknown => "Property",
    }
}

fn default_size(kind: FieldKind) -> i32 {
    match kind {
        FieldKind::Bool | FieldKind::Int8 | FieldKind::UInt8 | FieldKind::Enum => 1,
        FieldKind::Int16 | FieldKind::UInt16 => 2,
        FieldKind::Int32 | FieldKind::UInt32 | FieldKind::Float => 4,
        FieldKind::Int64
        | FieldKind::UInt64
        | FieldKind::Double
        | FieldKind::Object
        | FieldKind::Class
        | FieldKind::ClassPtr
        | FieldKind::WeakObject => 8,
        FieldKind::Name => 12,
        FieldKind::Str | FieldKind::Text | FieldKind::Array | FieldKind::Delegate => 16,
        FieldKind::MulticastDelegate
        | FieldKind::MulticastInlineDelegate
        | FieldKind::Interface => 16,
        FieldKind::MulticastSparseDelegate => 1,
        FieldKind::LazyObject => 28,
        FieldKind::SoftClass | FieldKind::SoftObject => 40,
        FieldKind::Map | FieldKind::Set => 80,
        FieldKind::Struct | FieldKind::Unknown => -1,
    }
}

fn default_value(kind: FieldKind, variants: &[String]) -> Option<Value> {
    Some(match kind {
        FieldKind::Bool => Value::Bool(false),
        FieldKind::Int8 => Value::I8(0),
        FieldKind::Int16 => Value::I16(0),
        FieldKind::Int32 => Value::I32(0),
        FieldKind::Int64 => Value::I64(0),
        FieldKind::UInt8 => Value::U8(0),
        FieldKind::UInt16 => Value::U16(0),
        FieldKind::UInt32 => Value::U32(0),
        FieldKind::UInt64 => Value::U64(0),
        FieldKind::Float => Value::F32(0.0),
        FieldKind::Double => Value::F64(0.0),
        FieldKind::Enum if !variants.is_empty() => Value::Enum(0),
        FieldKind::Str => Value::Str(String::new()),
        FieldKind::Name => Value::Name("None".to_owned()),
        FieldKind::Text => Value::Text(String::new()),
        _ => return None,
    })
}

fn default_inline(inline: InlineStruct) -> Value {
    match inline {
        InlineStruct::Vector | InlineStruct::Rotator => Value::Floats(vec![0.0; 3]),
        InlineStruct::Vector2D => Value::Floats(vec![0.0; 2]),
        InlineStruct::IntVector => Value::Ints(vec![0; 3]),
        InlineStruct::IntVector2 | InlineStruct::IntPoint => Value::Ints(vec![0; 2]),
        InlineStruct::Timespan => Value::Timespan("00:00:00".to_owned()),
        InlineStruct::DateTime => Value::DateTime("0001.01.01-00.00.00".to_owned()),
        InlineStruct::Color | InlineStruct::LinearColor => Value::Color([0.0, 0.0, 0.0, 1.0]),
    }
}

impl Reflection for MockHost {
    fn field_name(&self, field: FieldId) -> String {
        self.desc(field).name.clone()
    }

    fn field_kind(&self, field: FieldId) -> FieldKind {
        self.desc(field).kind
    }

    fn field_cpp_type(&self, field: FieldId) -> String {
        self.desc(field).cpp_type.clone()
    }

    fn field_class_name(&self, field: FieldId) -> String {
        descriptor_class_name(self.desc(field).kind).to_owned()
    }

    fn field_size(&self, field: FieldId) -> i32 {
        self.desc(field).size
    }

    fn field_owner(&self, field: FieldId) -> String {
        self.desc(field).owner.clone()
    }

    fn field_metadata(&self, field: FieldId) -> Vec<(String, String)> {
        self.desc(field).metadata.clone()
    }

    fn field_struct(&self, field: FieldId) -> Option<StructId> {
        self.desc(field).struct_id
    }

    fn field_inner(&self, field: FieldId) -> Option<FieldId> {
        self.desc(field).inner
    }

    fn field_key_value(&self, field: FieldId) -> Option<(FieldId, FieldId)> {
        self.desc(field).key_value
    }

    fn enum_variants(&self, field: FieldId) -> Vec<String> {
        self.desc(field).variants.clone()
    }

    fn struct_name(&self, id: StructId) -> String {
        self.structs[id.0 as usize].name.clone()
    }

    fn struct_cpp_name(&self, id: StructId) -> String {
        self.structs[id.0 as usize].cpp_name.clone()
    }

    fn struct_fields(&self, id: StructId) -> Vec<FieldId> {
        self.structs[id.0 as usize].fields.clone()
    }

    fn struct_size(&self, id: StructId) -> i32 {
        self.structs[id.0 as usize].size
    }

    fn object_is_live(&self, object: ValueAddr) -> bool {
        self.objects.contains_key(&object)
    }

    fn object_name(&self, object: ValueAddr) -> String {
        self.objects
            .get(&object)
            .map(|o| o.name.clone())
            .unwrap_or_default()
    }

    fn object_class(&self, object: ValueAddr) -> Option<StructId> {
        self.objects.get(&object).map(|o| o.class)
    }

    fn object_functions(&self, object: ValueAddr) -> Vec<FunctionId> {
        self.objects
            .get(&object)
            .map(|o| self.structs[o.class.0 as usize].functions.clone())
            .unwrap_or_default()
    }

    fn field_slot(&self, container: ValueAddr, field: FieldId) -> ValueAddr {
        self.layout
            .get(&(container, field))
            .copied()
            .unwrap_or(ValueAddr::NULL)
    }

    fn load_object(&self, slot: ValueAddr) -> ValueAddr {
        match self.memory.get(&slot) {
            Some(Slot::Object(target)) => *target,
            _ => ValueAddr::NULL,
        }
    }

    fn array_slots(&self, slot: ValueAddr, _field: FieldId) -> Vec<ValueAddr> {
        match self.memory.get(&slot) {
            Some(Slot::Elements(elements)) => elements.clone(),
            _ => Vec::new(),
        }
    }

    fn map_slots(&self, slot: ValueAddr, _field: FieldId) -> Vec<(ValueAddr, ValueAddr)> {
        match self.memory.get(&slot) {
            Some(Slot::Entries(entries)) => entries.clone(),
            _ => Vec::new(),
        }
    }

    fn resolve_reference(&self, slot: ValueAddr, _field: FieldId) -> RefState {
        match self.memory.get(&slot) {
            Some(Slot::Reference {
                state: RefState::Live(target),
                ..
            }) if !self.object_is_live(*target) => RefState::Stale,
            Some(Slot::Reference { state, .. }) => *state,
            _ => RefState::Null,
        }
    }

    fn reference_text(&self, slot: ValueAddr, _field: FieldId) -> Option<String> {
        match self.memory.get(&slot) {
            Some(Slot::Reference { text, .. }) => text.clone(),
            _ => None,
        }
    }

    fn delegate_binding(&self, slot: ValueAddr, _field: FieldId) -> Option<DelegateBinding> {
        match self.memory.get(&slot) {
            Some(Slot::Delegate(Some((object, function)))) => Some(DelegateBinding {
                object: *object,
                function_name: self.functions[function.0 as usize].name.clone(),
                function: Some(*function),
            }),
            _ => None,
        }
    }

    fn class_value_name(&self, slot: ValueAddr, _field: FieldId) -> Option<String> {
        match self.memory.get(&slot) {
            Some(Slot::Class(name)) => Some(name.clone()),
            _ => None,
        }
    }

    fn function_name(&self, function: FunctionId) -> String {
        self.functions[function.0 as usize].name.clone()
    }

    fn function_owner(&self, function: FunctionId) -> String {
        self.functions[function.0 as usize].owner.clone()
    }

    fn function_params(&self, function: FunctionId) -> Vec<FieldId> {
        self.functions[function.0 as usize].params.clone()
    }

    fn function_return(&self, function: FunctionId) -> Option<FieldId> {
        self.functions[function.0 as usize].ret
    }

    fn read_value(&self, slot: ValueAddr, _field: FieldId) -> Option<Value> {
        match self.memory.get(&slot) {
            Some(Slot::Value(value)) => Some(value.clone()),
            _ => None,
        }
    }

    fn write_value(
        &mut self,
        slot: ValueAddr,
        field: FieldId,
        value: Value,
    ) -> Result<(), WriteError> {
        if self.desc(field).read_only {
            return Err(WriteError::ReadOnly);
        }
        let Some(Slot::Value(current)) = self.memory.get_mut(&slot) else {
            return Err(WriteError::Dangling(slot));
        };
        if !current.same_shape(&value) {
            return Err(WriteError::TypeMismatch {
                expected: current.type_name(),
                found: value.type_name(),
            });
        }
        *current = value.clone();
        self.writes.push(RecordedWrite { slot, field, value });
        Ok(())
    }

    fn call_function(&mut self, object: ValueAddr, function: FunctionId) -> Result<(), WriteError> {
        if !self.object_is_live(object) {
            return Err(WriteError::Dangling(object));
        }
        if !self.function_params(function).is_empty() {
            return Err(WriteError::Rejected(format!(
                "{} takes parameters",
                self.function_name(function)
            )));
        }
        self.calls.push((object, function));
        Ok(())
    }
}

impl ActorSource for MockHost {
    fn world_name(&self) -> String {
        "MockWorld".to_owned()
    }

    fn level_actors(&self) -> Vec<ValueAddr> {
        self.actors.clone()
    }

    fn collision_channels(&self) -> Vec<CollisionChannel> {
        self.channels
            .iter()
            .map(|name| CollisionChannel { name: name.clone() })
            .collect()
    }

    fn actors_near_player(&self, _radius_m: f32, channels: &[bool]) -> Vec<ValueAddr> {
        if channels.iter().any(|&on| on) || channels.is_empty() {
            self.nearby.clone()
        } else {
            Vec::new()
        }
    }

    fn actor_under_cursor(&self) -> Option<ValueAddr> {
        self.under_cursor
    }
}
