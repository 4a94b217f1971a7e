#![forbid(unsafe_code)]

//! Value column: display text, editor selection and type colors.
//!
//! Every field kind maps to one [`Editor`]. The dispatch is a single
//! exhaustive `match` over [`FieldKind`], so a new kind does not compile
//! until it has a case here.
//!
//! | Kind                         | Editor                                   |
//! |------------------------------|------------------------------------------|
//! | null address                 | `<Null>`                                 |
//! | object, struct, plain struct | member count `{n}`                       |
//! | function                     | call button                              |
//! | bool                         | checkbox                                 |
//! | integers, floats             | scalar input (integers step 1 / 10 / 100)|
//! | enum                         | combo over the variant names             |
//! | string, name, text           | text input, committed on enter           |
//! | vector, rotator, int vectors | component inputs                         |
//! | timespan, datetime           | text input                               |
//! | color, linear color          | color editor (sRGB)                      |
//! | class                        | class name                               |
//! | weak, lazy, soft references  | target member count or path, `<Stale>`   |
//! | containers                   | element type and count                   |
//! | delegates                    | bound function name, or a disabled button|
//! | anything else                | `<UnknownType>` / `<NotImplemented>`     |
//!
//! # Failure Modes
//!
//! | Failure              | Cause                         | Fallback         |
//! |----------------------|-------------------------------|------------------|
//! | Unreadable value     | host returned no value        | `<UnknownType>`  |
//! | Wrong edit shape     | substrate returned other type | edit dropped     |

use propwatch_core::item::PropertyItem;
use propwatch_core::reflect::{FieldId, FieldKind, InlineStruct, RefState, Reflection, Value};
use propwatch_core::ItemKind;

use crate::substrate::Rgba;

pub const NULL_TEXT: &str = "<Null>";
pub const STALE_TEXT: &str = "<Stale>";
pub const PENDING_TEXT: &str = "<Pending>";
pub const UNKNOWN_TYPE_TEXT: &str = "<UnknownType>";
pub const NOT_IMPLEMENTED_TEXT: &str = "<NotImplemented>";
pub const NO_FUNCTION_TEXT: &str = "<No Function Bound>";

/// Step and fast step for integer inputs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Steps {
    pub step: i64,
    pub fast: i64,
}

/// The widget drawn in the value column.
#[derive(Clone, Debug, PartialEq)]
pub enum Editor {
    Null,
    MemberCount(usize),
    /// Read-only text.
    Label(String),
    Checkbox(bool),
    /// Numeric input. Floats have no steps.
    Scalar {
        value: Value,
        steps: Option<Steps>,
    },
    /// Component inputs for float and integer vectors.
    Vector(Value),
    /// RGBA color. Linear colors are edited in sRGB and converted back on
    /// commit.
    Color {
        rgba: [f32; 4],
        linear: bool,
    },
    /// Editable text committed on enter.
    Text(Value),
    /// Text field that cannot be written back (soft paths, lazy ids).
    ReadOnlyText(String),
    /// Lazy reference: target member count when resolved, plus its id.
    Reference {
        members: Option<usize>,
        id: String,
    },
    Combo {
        variants: Vec<String>,
        selected: u8,
    },
    CallButton,
    DisabledButton(&'static str),
    Placeholder(&'static str),
}

impl Editor {
    /// Plain-text rendering, for headless substrates and snapshots.
    #[must_use]
    pub fn preview(&self) -> String {
        match self {
            Self::Null => NULL_TEXT.to_owned(),
            Self::MemberCount(0) => "{}".to_owned(),
            Self::MemberCount(n) => format!("{{{n}}}"),
            Self::Label(text) | Self::ReadOnlyText(text) => text.clone(),
            Self::Checkbox(true) => "[x]".to_owned(),
            Self::Checkbox(false) => "[ ]".to_owned(),
            Self::Scalar { value, .. } | Self::Vector(value) | Self::Text(value) => value.to_string(),
            Self::Color { rgba, linear } => {
                let shown = if *linear { linear_to_srgb4(*rgba) } else { *rgba };
                let c = Rgba::from_unit(shown[0], shown[1], shown[2], shown[3]);
                format!("#{:02X}{:02X}{:02X}{:02X}", c.r, c.g, c.b, c.a)
            }
            Self::Reference { members, id } => {
                let head = members.map_or_else(|| NULL_TEXT.to_owned(), |n| format!("{{{n}}}"));
                if id.is_empty() { head } else { format!("{head} {id}") }
            }
            Self::Combo { variants, selected } => variants
                .get(usize::from(*selected))
                .cloned()
                .unwrap_or_else(|| selected.to_string()),
            Self::CallButton => "[Call Function]".to_owned(),
            Self::DisabledButton(label) => format!("[{label}]"),
            Self::Placeholder(text) => (*text).to_owned(),
        }
    }

    /// Whether edits from this editor can be written back.
    #[must_use]
    pub fn is_writable(&self) -> bool {
        matches!(
            self,
            Self::Checkbox(_)
                | Self::Scalar { .. }
                | Self::Vector(_)
                | Self::Color { .. }
                | Self::Text(_)
                | Self::Combo { .. }
        )
    }

    /// Turn a substrate edit into the value to write, or `None` when it
    /// does not fit this editor.
    #[must_use]
    pub fn commit(&self, edited: Value) -> Option<Value> {
        match (self, edited) {
            (Self::Checkbox(_), v @ Value::Bool(_)) => Some(v),
            (Self::Scalar { value, .. } | Self::Vector(value) | Self::Text(value), v)
                if value.same_shape(&v) =>
            {
                Some(v)
            }
            (Self::Color { linear, .. }, Value::Color(c)) => {
                Some(Value::Color(if *linear { srgb_to_linear4(c) } else { c }))
            }
            (Self::Combo { variants, .. }, Value::Enum(i)) if usize::from(i) < variants.len() => {
                Some(Value::Enum(i))
            }
            _ => None,
        }
    }
}

/// Text of the `value` search column.
#[must_use]
pub fn value_text(host: &dyn Reflection, item: &PropertyItem) -> String {
    if item.addr().is_null() {
        return "Null".to_owned();
    }
    let Some(field) = item.field_id() else {
        return String::new();
    };
    let kind = host.field_kind(field);
    let readable = kind.is_numeric()
        || matches!(
            kind,
            FieldKind::Bool | FieldKind::Enum | FieldKind::Str | FieldKind::Name | FieldKind::Text
        );
    if !readable {
        return String::new();
    }
    host.read_value(item.addr(), field)
        .map(|v| v.to_string())
        .unwrap_or_default()
}

/// Pick the value-column editor for `item`.
#[must_use]
pub fn editor_for(host: &dyn Reflection, item: &PropertyItem) -> Editor {
    let addr = item.addr();
    if addr.is_null() {
        return Editor::Null;
    }
    let Some(field) = item.field_id() else {
        return match item.kind() {
            ItemKind::Function => Editor::CallButton,
            _ => Editor::MemberCount(item.member_count(host)),
        };
    };
    let read = || host.read_value(addr, field);
    let object_count = |object| PropertyItem::object(object).member_count(host);
    let reference_path = || {
        host.reference_text(addr, field)
            .filter(|path| !path.is_empty())
            .map_or(Editor::Label(String::new()), Editor::ReadOnlyText)
    };

    match host.field_kind(field) {
        FieldKind::Class => Editor::Label(host.class_value_name(addr, field).unwrap_or_default()),
        FieldKind::ClassPtr => Editor::Placeholder(NOT_IMPLEMENTED_TEXT),
        FieldKind::SoftClass => match host.resolve_reference(addr, field) {
            RefState::Stale => Editor::Placeholder(STALE_TEXT),
            RefState::Pending => Editor::Placeholder(PENDING_TEXT),
            RefState::Null => Editor::Null,
            RefState::Live(_) => reference_path(),
        },
        FieldKind::WeakObject => match host.resolve_reference(addr, field) {
            RefState::Stale => Editor::Placeholder(STALE_TEXT),
            RefState::Live(object) => Editor::MemberCount(object_count(object)),
            RefState::Null | RefState::Pending => Editor::Null,
        },
        FieldKind::LazyObject => Editor::Reference {
            members: match host.resolve_reference(addr, field) {
                RefState::Live(object) => Some(object_count(object)),
                _ => None,
            },
            id: host.reference_text(addr, field).unwrap_or_default(),
        },
        FieldKind::SoftObject => match host.resolve_reference(addr, field) {
            RefState::Pending => Editor::Placeholder(PENDING_TEXT),
            RefState::Live(_) => reference_path(),
            RefState::Null | RefState::Stale => Editor::Null,
        },
        FieldKind::Object => Editor::MemberCount(item.member_count(host)),
        FieldKind::Enum => {
            let variants = host.enum_variants(field);
            match read() {
                Some(Value::Enum(selected)) if !variants.is_empty() => {
                    Editor::Combo { variants, selected }
                }
                _ => Editor::Placeholder(UNKNOWN_TYPE_TEXT),
            }
        }
        FieldKind::Bool => match read() {
            Some(Value::Bool(b)) => Editor::Checkbox(b),
            _ => Editor::Placeholder(UNKNOWN_TYPE_TEXT),
        },
        kind @ (FieldKind::Int8
        | FieldKind::UInt8
        | FieldKind::Int16
        | FieldKind::UInt16
        | FieldKind::Int32
        | FieldKind::UInt32
        | FieldKind::Int64
        | FieldKind::UInt64
        | FieldKind::Float
        | FieldKind::Double) => match read() {
            Some(value) => Editor::Scalar {
                value,
                steps: integer_steps(kind),
            },
            None => Editor::Placeholder(UNKNOWN_TYPE_TEXT),
        },
        FieldKind::Str | FieldKind::Name | FieldKind::Text => {
            read().map_or(Editor::Placeholder(UNKNOWN_TYPE_TEXT), Editor::Text)
        }
        FieldKind::Array => Editor::Label(format!(
            "{} [{}]",
            inner_cpp(host, field),
            host.array_slots(addr, field).len()
        )),
        FieldKind::Map => {
            let (key, value) = host
                .field_key_value(field)
                .map(|(k, v)| (host.field_cpp_type(k), host.field_cpp_type(v)))
                .unwrap_or_default();
            Editor::Label(format!(
                "<{key}, {value}> ({})",
                host.map_slots(addr, field).len()
            ))
        }
        FieldKind::Set => Editor::Label(format!(
            "<{}> {{{}}}",
            inner_cpp(host, field),
            host.set_slots(addr, field).len()
        )),
        FieldKind::MulticastDelegate => Editor::DisabledButton("Broadcast"),
        FieldKind::Delegate => Editor::Label(
            host.delegate_binding(addr, field)
                .map_or_else(|| NO_FUNCTION_TEXT.to_owned(), |b| b.function_name),
        ),
        FieldKind::MulticastInlineDelegate | FieldKind::MulticastSparseDelegate => {
            Editor::Placeholder(NOT_IMPLEMENTED_TEXT)
        }
        FieldKind::Struct => {
            let inline = host
                .field_struct(field)
                .and_then(|s| InlineStruct::from_cpp_name(&host.struct_cpp_name(s)));
            match (inline, read()) {
                (None, _) => Editor::MemberCount(item.member_count(host)),
                (Some(InlineStruct::Timespan | InlineStruct::DateTime), Some(value)) => {
                    Editor::Text(value)
                }
                (Some(InlineStruct::Color), Some(Value::Color(rgba))) => Editor::Color {
                    rgba,
                    linear: false,
                },
                (Some(InlineStruct::LinearColor), Some(Value::Color(rgba))) => Editor::Color {
                    rgba,
                    linear: true,
                },
                (Some(_), Some(value @ (Value::Floats(_) | Value::Ints(_)))) => {
                    Editor::Vector(value)
                }
                (Some(_), _) => Editor::Placeholder(UNKNOWN_TYPE_TEXT),
            }
        }
        FieldKind::Interface | FieldKind::Unknown => Editor::Placeholder(UNKNOWN_TYPE_TEXT),
    }
}

fn integer_steps(kind: FieldKind) -> Option<Steps> {
    match kind {
        FieldKind::Int8 | FieldKind::UInt8 => Some(Steps { step: 1, fast: 10 }),
        FieldKind::Float | FieldKind::Double => None,
        _ => Some(Steps { step: 1, fast: 100 }),
    }
}

fn inner_cpp(host: &dyn Reflection, field: FieldId) -> String {
    host.field_inner(field)
        .map(|inner| host.field_cpp_type(inner))
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Colors
// ---------------------------------------------------------------------------

/// Linear RGBA of the graph-editor pin color for a field kind.
fn pin_color(kind: FieldKind, struct_cpp_name: Option<&str>) -> Option<[f32; 4]> {
    Some(match kind {
        FieldKind::Bool => [0.3, 0.0, 0.0, 1.0],
        FieldKind::UInt8 | FieldKind::Enum => [0.0, 0.16, 0.131_27, 1.0],
        FieldKind::Class => [0.1, 0.0, 0.5, 1.0],
        FieldKind::Int32 => [0.013_575, 0.77, 0.429_609, 1.0],
        FieldKind::Int64 => [0.413_575, 0.77, 0.429_609, 1.0],
        FieldKind::Float => [0.357_667, 1.0, 0.06, 1.0],
        FieldKind::Double => [0.039_216, 0.666_667, 0.0, 1.0],
        FieldKind::Name => [0.607_717, 0.224_984, 1.0, 1.0],
        FieldKind::Delegate => [1.0, 0.04, 0.04, 1.0],
        FieldKind::Object => [0.0, 0.4, 0.91, 1.0],
        FieldKind::SoftObject => [0.3, 1.0, 1.0, 1.0],
        FieldKind::SoftClass => [1.0, 0.3, 1.0, 1.0],
        FieldKind::Interface => [0.8784, 1.0, 0.4, 1.0],
        FieldKind::Str => [1.0, 0.0, 0.660_537, 1.0],
        FieldKind::Text => [0.8, 0.2, 0.4, 1.0],
        FieldKind::Struct => match struct_cpp_name {
            Some("FVector") => [1.0, 0.591_255, 0.016_512, 1.0],
            Some("FRotator") => [0.353_393, 0.454_175, 1.0, 1.0],
            Some("FTransform") => [1.0, 0.172_585, 0.0, 1.0],
            _ => [0.0, 0.1, 0.6, 1.0],
        },
        _ => return None,
    })
}

/// Swatch color for the `type` column, in sRGB.
#[must_use]
pub fn type_color(kind: FieldKind, struct_cpp_name: Option<&str>) -> Option<Rgba> {
    let [r, g, b, a] = linear_to_srgb4(pin_color(kind, struct_cpp_name)?);
    Some(Rgba::from_unit(r, g, b, a))
}

/// Swatch color for an item; items without a field have none.
#[must_use]
pub fn item_color(host: &dyn Reflection, item: &PropertyItem) -> Option<Rgba> {
    let field = item.field_id()?;
    let kind = host.field_kind(field);
    let cpp = match kind {
        FieldKind::Struct => host.field_struct(field).map(|s| host.struct_cpp_name(s)),
        _ => None,
    };
    type_color(kind, cpp.as_deref())
}

/// Background tint for a row at `depth`: none at the top level, then a hue
/// cycle of four starting at orange.
#[must_use]
pub fn row_tint(depth: usize) -> Option<Rgba> {
    if depth == 0 {
        return None;
    }
    let hue = ((depth - 1) % 4) as f32 / 4.0 + 0.065;
    let [r, g, b] = hsv_to_rgb(hue, 1.0, 1.0);
    Some(Rgba::from_unit(r, g, b, 0.05))
}

fn hsv_to_rgb(h: f32, s: f32, v: f32) -> [f32; 3] {
    if s == 0.0 {
        return [v, v, v];
    }
    let h = (h.rem_euclid(1.0)) * 6.0;
    let sector = h.floor();
    let f = h - sector;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));
    match sector as u8 {
        0 => [v, t, p],
        1 => [q, v, p],
        2 => [p, v, t],
        3 => [p, q, v],
        4 => [t, p, v],
        _ => [v, p, q],
    }
}

fn linear_to_srgb(c: f32) -> f32 {
    let c = c.clamp(0.0, 1.0);
    if c <= 0.003_130_8 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

fn srgb_to_linear(c: f32) -> f32 {
    let c = c.clamp(0.0, 1.0);
    if c <= 0.040_45 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// Color channels to sRGB; alpha stays linear.
#[must_use]
pub fn linear_to_srgb4(c: [f32; 4]) -> [f32; 4] {
    [linear_to_srgb(c[0]), linear_to_srgb(c[1]), linear_to_srgb(c[2]), c[3]]
}

#[must_use]
pub fn srgb_to_linear4(c: [f32; 4]) -> [f32; 4] {
    [srgb_to_linear(c[0]), srgb_to_linear(c[1]), srgb_to_linear(c[2]), c[3]]
}

#[cfg(test)]
mod tests {
    use super::*;
    use propwatch_core::mock::{MockField, MockHost};
    use propwatch_core::ValueAddr;

    struct Fixture {
        host: MockHost,
        pawn: ValueAddr,
    }

    impl Fixture {
        fn new(fields: Vec<MockField>) -> Self {
            let mut host = MockHost::new();
            let ids: Vec<_> = fields
                .into_iter()
                .map(|f| host.add_field(f.owner("Pawn")))
                .collect();
            let class = host.add_class("Pawn", &ids);
            let pawn = host.spawn(class, "Pawn_0");
            Self { host, pawn }
        }

        fn member(&self, index: usize) -> PropertyItem {
            PropertyItem::object(self.pawn).members(&self.host).remove(index)
        }

        fn editor(&self, index: usize) -> Editor {
            editor_for(&self.host, &self.member(index))
        }
    }

    #[test]
    fn null_and_composites() {
        let fixture = Fixture::new(vec![
            MockField::new("Target", FieldKind::Object),
            MockField::new("Health", FieldKind::Float),
        ]);
        assert_eq!(fixture.editor(0), Editor::Null);
        assert_eq!(value_text(&fixture.host, &fixture.member(0)), "Null");
        let object = PropertyItem::object(fixture.pawn);
        assert_eq!(editor_for(&fixture.host, &object), Editor::MemberCount(2));
        assert_eq!(editor_for(&fixture.host, &object).preview(), "{2}");
        assert_eq!(value_text(&fixture.host, &object), "");
    }

    #[test]
    fn integer_steps_follow_width() {
        let fixture = Fixture::new(vec![
            MockField::new("Small", FieldKind::Int8),
            MockField::new("Big", FieldKind::Int64),
            MockField::new("Speed", FieldKind::Float),
        ]);
        assert_eq!(
            fixture.editor(0),
            Editor::Scalar {
                value: Value::I8(0),
                steps: Some(Steps { step: 1, fast: 10 })
            }
        );
        assert!(matches!(
            fixture.editor(1),
            Editor::Scalar { steps: Some(Steps { fast: 100, .. }), .. }
        ));
        assert!(matches!(fixture.editor(2), Editor::Scalar { steps: None, .. }));
    }

    #[test]
    fn value_text_reads_primitives() {
        let mut fixture = Fixture::new(vec![
            MockField::new("Health", FieldKind::Float),
            MockField::new("Alive", FieldKind::Bool),
            MockField::new("Title", FieldKind::Str),
            MockField::new("Tags", FieldKind::Array).inner_kind(FieldKind::Int32),
        ]);
        let ids: Vec<_> = (0..3)
            .map(|i| fixture.member(i).field_id().unwrap_or(FieldId(0)))
            .collect();
        fixture.host.set_value(fixture.pawn, ids[0], Value::F32(42.5));
        fixture.host.set_value(fixture.pawn, ids[1], Value::Bool(true));
        fixture.host.set_value(fixture.pawn, ids[2], Value::Str("Hero".into()));
        assert_eq!(value_text(&fixture.host, &fixture.member(0)), "42.5");
        assert_eq!(value_text(&fixture.host, &fixture.member(1)), "true");
        assert_eq!(value_text(&fixture.host, &fixture.member(2)), "Hero");
        assert_eq!(value_text(&fixture.host, &fixture.member(3)), "");
    }

    #[test]
    fn containers_summarize() {
        let mut fixture = Fixture::new(vec![
            MockField::new("Tags", FieldKind::Array)
                .cpp("TArray<int32>")
                .inner_kind(FieldKind::Int32),
            MockField::new("Scores", FieldKind::Map)
                .key_value_kinds(FieldKind::Name, FieldKind::Int32),
            MockField::new("Ids", FieldKind::Set).inner_kind(FieldKind::Int32),
        ]);
        let tags = fixture.member(0).field_id().unwrap_or(FieldId(0));
        let scores = fixture.member(1).field_id().unwrap_or(FieldId(0));
        fixture.host.push_element(fixture.pawn, tags);
        fixture.host.push_element(fixture.pawn, tags);
        fixture.host.insert_entry(fixture.pawn, scores);
        assert_eq!(fixture.editor(0), Editor::Label("int32 [2]".into()));
        assert_eq!(fixture.editor(1), Editor::Label("<FName, int32> (1)".into()));
        assert_eq!(fixture.editor(2), Editor::Label("<int32> {0}".into()));
    }

    #[test]
    fn delegates_and_placeholders() {
        let fixture = Fixture::new(vec![
            MockField::new("OnHit", FieldKind::Delegate),
            MockField::new("OnAny", FieldKind::MulticastDelegate),
            MockField::new("OnSparse", FieldKind::MulticastSparseDelegate),
            MockField::new("Iface", FieldKind::Interface),
        ]);
        assert_eq!(fixture.editor(0), Editor::Label(NO_FUNCTION_TEXT.into()));
        assert_eq!(fixture.editor(1), Editor::DisabledButton("Broadcast"));
        assert_eq!(fixture.editor(2), Editor::Placeholder(NOT_IMPLEMENTED_TEXT));
        assert_eq!(fixture.editor(3), Editor::Placeholder(UNKNOWN_TYPE_TEXT));
        assert!(!fixture.editor(1).is_writable());
    }

    #[test]
    fn references_report_state() {
        let mut fixture = Fixture::new(vec![
            MockField::new("Owner", FieldKind::WeakObject),
            MockField::new("Asset", FieldKind::SoftObject),
            MockField::new("Lazy", FieldKind::LazyObject),
        ]);
        let weak = fixture.member(0).field_id().unwrap_or(FieldId(0));
        let soft = fixture.member(1).field_id().unwrap_or(FieldId(0));
        let lazy = fixture.member(2).field_id().unwrap_or(FieldId(0));
        assert_eq!(fixture.editor(0), Editor::Null);

        let pawn = fixture.pawn;
        fixture.host.set_reference(pawn, weak, RefState::Stale, None);
        fixture.host.set_reference(pawn, soft, RefState::Pending, None);
        fixture.host.set_reference(pawn, lazy, RefState::Live(pawn), Some("LAZY-1"));
        assert_eq!(fixture.editor(0), Editor::Placeholder(STALE_TEXT));
        assert_eq!(fixture.editor(1), Editor::Placeholder(PENDING_TEXT));
        assert_eq!(
            fixture.editor(2),
            Editor::Reference {
                members: Some(3),
                id: "LAZY-1".into()
            }
        );

        fixture
            .host
            .set_reference(pawn, soft, RefState::Live(pawn), Some("/Game/Hero.Hero"));
        assert_eq!(fixture.editor(1), Editor::ReadOnlyText("/Game/Hero.Hero".into()));
    }

    #[test]
    fn class_field_shows_class_name() {
        let mut fixture = Fixture::new(vec![MockField::new("Spawns", FieldKind::Class)]);
        let field = fixture.member(0).field_id().unwrap_or(FieldId(0));
        let pawn = fixture.pawn;
        fixture.host.set_class_value(pawn, field, "BP_Enemy_C");
        assert_eq!(fixture.editor(0), Editor::Label("BP_Enemy_C".into()));
    }

    #[test]
    fn enum_combo_and_commit() {
        let fixture = Fixture::new(vec![
            MockField::new("Mode", FieldKind::Enum).variants(&["Idle", "Walk", "Run"]),
        ]);
        let editor = fixture.editor(0);
        assert_eq!(editor.preview(), "Idle");
        assert_eq!(editor.commit(Value::Enum(2)), Some(Value::Enum(2)));
        assert_eq!(editor.commit(Value::Enum(3)), None);
        assert_eq!(editor.commit(Value::I32(1)), None);
    }

    #[test]
    fn inline_structs_get_dedicated_editors() {
        let mut host = MockHost::new();
        let vector = host.add_struct("FVector", &[]);
        let color = host.add_struct("FLinearColor", &[]);
        let plain_x = host.add_field(MockField::new("X", FieldKind::Int32).owner("FPlain"));
        let plain = host.add_struct("FPlain", &[plain_x]);
        let fields = [
            host.add_field(MockField::new("Loc", FieldKind::Struct).owner("Pawn").struct_type(vector)),
            host.add_field(MockField::new("Tint", FieldKind::Struct).owner("Pawn").struct_type(color)),
            host.add_field(MockField::new("Data", FieldKind::Struct).owner("Pawn").struct_type(plain)),
        ];
        let class = host.add_class("Pawn", &fields);
        let pawn = host.spawn(class, "Pawn_0");
        let members = PropertyItem::object(pawn).members(&host);
        assert_eq!(
            editor_for(&host, &members[0]),
            Editor::Vector(Value::Floats(vec![0.0; 3]))
        );
        let tint = editor_for(&host, &members[1]);
        assert_eq!(tint, Editor::Color { rgba: [0.0, 0.0, 0.0, 1.0], linear: true });
        assert_eq!(tint.preview(), "#000000FF");
        assert_eq!(editor_for(&host, &members[2]), Editor::MemberCount(1));
    }

    #[test]
    fn linear_color_commit_converts_back() {
        let editor = Editor::Color { rgba: [0.0; 4], linear: true };
        let Some(Value::Color(c)) = editor.commit(Value::Color([1.0, 0.5, 0.0, 1.0])) else {
            panic!("color edit rejected");
        };
        assert!((c[0] - 1.0).abs() < 1e-6);
        assert!((c[1] - 0.214).abs() < 1e-3);
        assert_eq!(c[3], 1.0);
    }

    #[test]
    fn function_items_get_call_button() {
        let mut host = MockHost::new();
        let class = host.add_class("Pawn", &[]);
        let f = host.add_function(class, "Respawn", &[], None);
        let pawn = host.spawn(class, "Pawn_0");
        let editor = editor_for(&host, &PropertyItem::function(pawn, f));
        assert_eq!(editor, Editor::CallButton);
        assert_eq!(editor.preview(), "[Call Function]");
    }

    #[test]
    fn pin_colors() {
        assert_eq!(type_color(FieldKind::Object, None), Some(Rgba::new(0, 170, 245, 255)));
        assert_eq!(type_color(FieldKind::Bool, None), Some(Rgba::new(149, 0, 0, 255)));
        assert_ne!(
            type_color(FieldKind::Struct, Some("FVector")),
            type_color(FieldKind::Struct, Some("FHitResult"))
        );
        assert_eq!(type_color(FieldKind::Array, None), None);
    }

    #[test]
    fn row_tints_cycle() {
        assert_eq!(row_tint(0), None);
        let first = row_tint(1).unwrap_or_default();
        assert_eq!(first, Rgba::new(255, 99, 0, 13));
        assert_eq!(row_tint(5), row_tint(1));
        assert_ne!(row_tint(2), row_tint(1));
    }
}
