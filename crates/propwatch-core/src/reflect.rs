#![forbid(unsafe_code)]

//! The reflection contract between the inspector and its host.
//!
//! The inspector never touches host memory. Everything it knows about a
//! value comes through [`Reflection`]: field descriptors, struct layouts,
//! object liveness, container contents and value reads. Writes and function
//! calls go through the same trait but are only issued after a draw pass
//! has finished, so the read side can be borrowed immutably for the whole
//! traversal.
//!
//! # Addresses
//!
//! [`ValueAddr`] is an opaque token minted by the host. The inspector
//! compares addresses (cycle detection, hover highlight, sort tie-breaks)
//! and formats them, but never interprets them.
//!
//! # Invariants
//!
//! 1. [`ValueAddr::NULL`] never refers to a value. Hosts return it for null
//!    object references.
//! 2. A host must answer `object_is_live(addr) == false` for destroyed
//!    objects; the item model checks liveness before enumerating members.
//! 3. Container slots returned by `array_slots`, `map_slots` and
//!    `set_slots` are the raw element slots. Resolving an object-valued
//!    slot to the referenced object happens in [`crate::item`].

use core::fmt;

/// Opaque address of a value inside the host.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValueAddr(pub usize);

impl ValueAddr {
    /// The null address.
    pub const NULL: Self = Self(0);

    /// Whether this is the null address.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for ValueAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016X}", self.0)
    }
}

/// Handle to a field descriptor owned by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldId(pub u32);

/// Handle to a struct or class layout owned by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StructId(pub u32);

/// Handle to a reflected function owned by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FunctionId(pub u32);

/// What a field holds. This is a closed set: dispatch over it is exhaustive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float,
    Double,
    Enum,
    Str,
    Name,
    Text,
    /// Strong object pointer.
    Object,
    /// Class reference. Expands like an object.
    Class,
    ClassPtr,
    SoftClass,
    WeakObject,
    LazyObject,
    SoftObject,
    Interface,
    Struct,
    Array,
    Map,
    Set,
    Delegate,
    MulticastDelegate,
    MulticastInlineDelegate,
    MulticastSparseDelegate,
    Unknown,
}

impl FieldKind {
    /// Weak, lazy and soft references: resolved through the host before use.
    #[must_use]
    pub const fn is_indirect_reference(self) -> bool {
        matches!(
            self,
            Self::WeakObject | Self::LazyObject | Self::SoftObject | Self::SoftClass
        )
    }

    /// Fields whose slot stores an object pointer that must be loaded.
    #[must_use]
    pub const fn is_object_pointer(self) -> bool {
        matches!(self, Self::Object | Self::Class)
    }

    #[must_use]
    pub const fn is_multicast(self) -> bool {
        matches!(
            self,
            Self::MulticastDelegate | Self::MulticastInlineDelegate | Self::MulticastSparseDelegate
        )
    }

    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(
            self,
            Self::Int8
                | Self::Int16
                | Self::Int32
                | Self::Int64
                | Self::UInt8
                | Self::UInt16
                | Self::UInt32
                | Self::UInt64
                | Self::Float
                | Self::Double
        )
    }
}

/// Structs that get a dedicated value editor instead of member rows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InlineStruct {
    Vector,
    Rotator,
    Vector2D,
    IntVector2,
    IntVector,
    IntPoint,
    Timespan,
    DateTime,
    Color,
    LinearColor,
}

impl InlineStruct {
    /// Look up by the struct's native type name.
    #[must_use]
    pub fn from_cpp_name(name: &str) -> Option<Self> {
        Some(match name {
            "FVector" => Self::Vector,
            "FRotator" => Self::Rotator,
            "FVector2D" => Self::Vector2D,
            "FIntVector2" => Self::IntVector2,
            "FIntVector" => Self::IntVector,
            "FIntPoint" => Self::IntPoint,
            "FTimespan" => Self::Timespan,
            "FDateTime" => Self::DateTime,
            "FColor" => Self::Color,
            "FLinearColor" => Self::LinearColor,
            _ => return None,
        })
    }

    /// Whether rows of this struct are leaves. Points and colors keep their
    /// members expandable next to the editor.
    #[must_use]
    pub const fn hides_members(self) -> bool {
        !matches!(self, Self::IntPoint | Self::Color | Self::LinearColor)
    }
}

/// A value read from or written to the host.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    /// Index into the field's enum variants.
    Enum(u8),
    Str(String),
    Name(String),
    Text(String),
    /// Float vectors: vector, rotator, 2D vector.
    Floats(Vec<f64>),
    /// Integer vectors and points.
    Ints(Vec<i32>),
    /// RGBA in the 0..=1 range.
    Color([f32; 4]),
    Timespan(String),
    DateTime(String),
}

impl Value {
    /// Short name of the variant, used in mismatch errors.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::I8(_) => "int8",
            Self::I16(_) => "int16",
            Self::I32(_) => "int32",
            Self::I64(_) => "int64",
            Self::U8(_) => "uint8",
            Self::U16(_) => "uint16",
            Self::U32(_) => "uint32",
            Self::U64(_) => "uint64",
            Self::F32(_) => "float",
            Self::F64(_) => "double",
            Self::Enum(_) => "enum",
            Self::Str(_) => "string",
            Self::Name(_) => "name",
            Self::Text(_) => "text",
            Self::Floats(_) => "float vector",
            Self::Ints(_) => "int vector",
            Self::Color(_) => "color",
            Self::Timespan(_) => "timespan",
            Self::DateTime(_) => "datetime",
        }
    }

    /// Whether `other` can be written where `self` was read.
    #[must_use]
    pub fn same_shape(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Floats(a), Self::Floats(b)) => a.len() == b.len(),
            (Self::Ints(a), Self::Ints(b)) => a.len() == b.len(),
            _ => core::mem::discriminant(self) == core::mem::discriminant(other),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::I8(v) => write!(f, "{v}"),
            Self::I16(v) => write!(f, "{v}"),
            Self::I32(v) => write!(f, "{v}"),
            Self::I64(v) => write!(f, "{v}"),
            Self::U8(v) => write!(f, "{v}"),
            Self::U16(v) => write!(f, "{v}"),
            Self::U32(v) => write!(f, "{v}"),
            Self::U64(v) => write!(f, "{v}"),
            Self::F32(v) => write!(f, "{v}"),
            Self::F64(v) => write!(f, "{v}"),
            Self::Enum(v) => write!(f, "{v}"),
            Self::Str(s) | Self::Name(s) | Self::Text(s) | Self::Timespan(s) | Self::DateTime(s) => {
                f.write_str(s)
            }
            Self::Floats(v) => write_components(f, v),
            Self::Ints(v) => write_components(f, v),
            Self::Color(c) => write_components(f, c),
        }
    }
}

fn write_components<T: fmt::Display>(f: &mut fmt::Formatter<'_>, parts: &[T]) -> fmt::Result {
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            f.write_str(" ")?;
        }
        write!(f, "{part}")?;
    }
    Ok(())
}

/// Outcome of resolving a weak, lazy or soft reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefState {
    /// The reference is unset.
    Null,
    /// The reference was set but its target is gone.
    Stale,
    /// The target exists but is not loaded yet.
    Pending,
    /// Resolved to a live object.
    Live(ValueAddr),
}

/// What a single-cast delegate is bound to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DelegateBinding {
    pub object: ValueAddr,
    pub function_name: String,
    /// `None` when the bound name does not resolve on the object.
    pub function: Option<FunctionId>,
}

/// Errors from writing a value or calling a function on the host.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteError {
    /// The field cannot be written.
    ReadOnly,
    /// The target slot or object no longer exists.
    Dangling(ValueAddr),
    /// The written value does not match the field's type.
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    /// The host refused for its own reasons.
    Rejected(String),
}

impl fmt::Display for WriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadOnly => write!(f, "field is read-only"),
            Self::Dangling(addr) => write!(f, "target {addr} no longer exists"),
            Self::TypeMismatch { expected, found } => {
                write!(f, "type mismatch: expected {expected}, found {found}")
            }
            Self::Rejected(msg) => write!(f, "host rejected the write: {msg}"),
        }
    }
}

impl std::error::Error for WriteError {}

/// Read access (and deferred write access) to a host's reflected values.
///
/// Methods taking a `slot` receive an address previously returned by this
/// host: a field slot, a container element slot, or an object address.
pub trait Reflection {
    // ------------------------------------------------------------------
    // Field descriptors
    // ------------------------------------------------------------------

    fn field_name(&self, field: FieldId) -> String;
    fn field_kind(&self, field: FieldId) -> FieldKind;
    /// Native type spelling, e.g. `TArray<int32>`.
    fn field_cpp_type(&self, field: FieldId) -> String;
    /// Descriptor class name, e.g. `ArrayProperty`.
    fn field_class_name(&self, field: FieldId) -> String;
    /// Size in bytes, or -1 when unknown.
    fn field_size(&self, field: FieldId) -> i32;
    /// Name of the class or struct that declares the field.
    fn field_owner(&self, field: FieldId) -> String;
    fn field_metadata(&self, _field: FieldId) -> Vec<(String, String)> {
        Vec::new()
    }
    /// Layout of a struct-valued field.
    fn field_struct(&self, _field: FieldId) -> Option<StructId> {
        None
    }
    /// Element descriptor of an array or set field.
    fn field_inner(&self, _field: FieldId) -> Option<FieldId> {
        None
    }
    /// Key and value descriptors of a map field.
    fn field_key_value(&self, _field: FieldId) -> Option<(FieldId, FieldId)> {
        None
    }
    fn enum_variants(&self, _field: FieldId) -> Vec<String> {
        Vec::new()
    }

    // ------------------------------------------------------------------
    // Layouts and objects
    // ------------------------------------------------------------------

    fn struct_name(&self, id: StructId) -> String;
    fn struct_cpp_name(&self, id: StructId) -> String;
    /// Fields in declaration order, including inherited ones.
    fn struct_fields(&self, id: StructId) -> Vec<FieldId>;
    fn struct_size(&self, id: StructId) -> i32;

    fn object_is_live(&self, object: ValueAddr) -> bool;
    fn object_name(&self, object: ValueAddr) -> String;
    fn object_class(&self, object: ValueAddr) -> Option<StructId>;
    /// Reflected functions of the object's class, inherited ones included.
    fn object_functions(&self, _object: ValueAddr) -> Vec<FunctionId> {
        Vec::new()
    }

    // ------------------------------------------------------------------
    // Memory
    // ------------------------------------------------------------------

    /// Slot of `field` inside an object or struct instance.
    fn field_slot(&self, container: ValueAddr, field: FieldId) -> ValueAddr;
    /// Object pointer stored in an object-valued slot.
    fn load_object(&self, slot: ValueAddr) -> ValueAddr;
    fn array_slots(&self, slot: ValueAddr, field: FieldId) -> Vec<ValueAddr>;
    fn set_slots(&self, slot: ValueAddr, field: FieldId) -> Vec<ValueAddr> {
        self.array_slots(slot, field)
    }
    /// `(key slot, value slot)` pairs.
    fn map_slots(&self, slot: ValueAddr, field: FieldId) -> Vec<(ValueAddr, ValueAddr)>;
    fn resolve_reference(&self, slot: ValueAddr, field: FieldId) -> RefState;
    /// Soft path or lazy object id of an indirect reference.
    fn reference_text(&self, _slot: ValueAddr, _field: FieldId) -> Option<String> {
        None
    }
    fn delegate_binding(&self, _slot: ValueAddr, _field: FieldId) -> Option<DelegateBinding> {
        None
    }
    /// Name of the class a class-reference field points at. `value` is the
    /// loaded pointer, not the field slot.
    fn class_value_name(&self, _value: ValueAddr, _field: FieldId) -> Option<String> {
        None
    }

    // ------------------------------------------------------------------
    // Functions
    // ------------------------------------------------------------------

    fn function_name(&self, function: FunctionId) -> String;
    /// Class that declares the function.
    fn function_owner(&self, function: FunctionId) -> String;
    /// Parameters in order, excluding the return value.
    fn function_params(&self, function: FunctionId) -> Vec<FieldId>;
    fn function_return(&self, function: FunctionId) -> Option<FieldId>;

    // ------------------------------------------------------------------
    // Values
    // ------------------------------------------------------------------

    fn read_value(&self, slot: ValueAddr, field: FieldId) -> Option<Value>;

    /// Write a value. Only called between draw passes.
    fn write_value(&mut self, slot: ValueAddr, field: FieldId, value: Value)
    -> Result<(), WriteError>;

    /// Invoke a parameterless function. Only called between draw passes.
    fn call_function(&mut self, object: ValueAddr, function: FunctionId) -> Result<(), WriteError>;
}

/// A collision channel offered by the actor search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CollisionChannel {
    pub name: String,
}

/// Source of live actors for the Actors tab.
pub trait ActorSource {
    /// Name of the current world, shown above the actor list.
    fn world_name(&self) -> String {
        String::new()
    }
    /// All actors in the current level.
    fn level_actors(&self) -> Vec<ValueAddr>;
    /// Channels the proximity search can filter on.
    fn collision_channels(&self) -> Vec<CollisionChannel> {
        Vec::new()
    }
    /// Actors within `radius_m` meters of the player, on the enabled channels.
    fn actors_near_player(&self, _radius_m: f32, _channels: &[bool]) -> Vec<ValueAddr> {
        Vec::new()
    }
    /// Actor under the mouse cursor, if any.
    fn actor_under_cursor(&self) -> Option<ValueAddr> {
        None
    }
}
