//! # Typed values
//!
//! [`TypedValue`] is the payload flowing through parameters, inlets and outlets. It is a
//! closed sum over the registered types listed by [`TypeKind`]; the concrete type of a value
//! never changes after creation. Reading a value as another type fails with
//! [`EngineError::TypeMismatch`], never by truncation.
//!
//! Values are replaced wholesale on update and handed out as copies, so they are never
//! shared mutably between threads.

mod convert;
mod options;

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

pub use convert::{ConversionRegistry, Converter};
pub use options::OptionSet;

/// Registered value types.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    Char,
    UChar,
    Short,
    UShort,
    Int,
    UInt,
    Long,
    ULong,
    Float,
    Double,
    Bool,
    String,
    List(Box<TypeKind>),
}

impl TypeKind {
    /// Stable type name used in metadata and persisted configs.
    pub fn name(&self) -> String {
        match self {
            TypeKind::Char => "char".into(),
            TypeKind::UChar => "unsigned char".into(),
            TypeKind::Short => "short".into(),
            TypeKind::UShort => "unsigned short".into(),
            TypeKind::Int => "int".into(),
            TypeKind::UInt => "unsigned int".into(),
            TypeKind::Long => "long".into(),
            TypeKind::ULong => "unsigned long".into(),
            TypeKind::Float => "float".into(),
            TypeKind::Double => "double".into(),
            TypeKind::Bool => "bool".into(),
            TypeKind::String => "string".into(),
            TypeKind::List(element) => format!("list<{}>", element.name()),
        }
    }

    pub fn parse(name: &str) -> Result<TypeKind> {
        let name = name.trim();
        if let Some(inner) = name
            .strip_prefix("list<")
            .and_then(|rest| rest.strip_suffix('>'))
        {
            return Ok(TypeKind::List(Box::new(TypeKind::parse(inner)?)));
        }
        let kind = match name {
            "char" => TypeKind::Char,
            "unsigned char" => TypeKind::UChar,
            "short" => TypeKind::Short,
            "unsigned short" => TypeKind::UShort,
            "int" => TypeKind::Int,
            "unsigned int" => TypeKind::UInt,
            "long" => TypeKind::Long,
            "unsigned long" => TypeKind::ULong,
            "float" => TypeKind::Float,
            "double" => TypeKind::Double,
            "bool" => TypeKind::Bool,
            "string" => TypeKind::String,
            other => return Err(EngineError::NotFound(format!("type {} not found", other))),
        };
        Ok(kind)
    }

    pub fn is_primitive(&self) -> bool {
        !matches!(self, TypeKind::List(_))
    }

    /// Zero value of this type.
    pub fn default_value(&self) -> TypedValue {
        match self {
            TypeKind::Char => TypedValue::Char(0),
            TypeKind::UChar => TypedValue::UChar(0),
            TypeKind::Short => TypedValue::Short(0),
            TypeKind::UShort => TypedValue::UShort(0),
            TypeKind::Int => TypedValue::Int(0),
            TypeKind::UInt => TypedValue::UInt(0),
            TypeKind::Long => TypedValue::Long(0),
            TypeKind::ULong => TypedValue::ULong(0),
            TypeKind::Float => TypedValue::Float(0.0),
            TypeKind::Double => TypedValue::Double(0.0),
            TypeKind::Bool => TypedValue::Bool(false),
            TypeKind::String => TypedValue::String(String::new()),
            TypeKind::List(element) => TypedValue::List {
                element: (**element).clone(),
                items: Vec::new(),
            },
        }
    }

    fn rank(&self) -> u8 {
        match self {
            TypeKind::Char => 0,
            TypeKind::UChar => 1,
            TypeKind::Short => 2,
            TypeKind::UShort => 3,
            TypeKind::Int => 4,
            TypeKind::UInt => 5,
            TypeKind::Long => 6,
            TypeKind::ULong => 7,
            TypeKind::Float => 8,
            TypeKind::Double => 9,
            TypeKind::Bool => 10,
            TypeKind::String => 11,
            TypeKind::List(_) => 12,
        }
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// One concrete datum of a registered type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum TypedValue {
    Char(i8),
    UChar(u8),
    Short(i16),
    UShort(u16),
    Int(i32),
    UInt(u32),
    Long(i64),
    ULong(u64),
    Float(f32),
    Double(f64),
    Bool(bool),
    String(String),
    List {
        element: TypeKind,
        items: Vec<TypedValue>,
    },
}

impl TypedValue {
    pub fn new<T: ValueType>(value: T) -> Self {
        value.into_value()
    }

    /// Build a list value; every item must be of `element` type.
    pub fn list(element: TypeKind, items: Vec<TypedValue>) -> Result<Self> {
        if let Some(bad) = items.iter().find(|item| item.kind() != element) {
            return Err(EngineError::TypeMismatch(format!(
                "list<{}> cannot hold a value of type {}",
                element,
                bad.kind()
            )));
        }
        Ok(TypedValue::List { element, items })
    }

    pub fn kind(&self) -> TypeKind {
        match self {
            TypedValue::Char(_) => TypeKind::Char,
            TypedValue::UChar(_) => TypeKind::UChar,
            TypedValue::Short(_) => TypeKind::Short,
            TypedValue::UShort(_) => TypeKind::UShort,
            TypedValue::Int(_) => TypeKind::Int,
            TypedValue::UInt(_) => TypeKind::UInt,
            TypedValue::Long(_) => TypeKind::Long,
            TypedValue::ULong(_) => TypeKind::ULong,
            TypedValue::Float(_) => TypeKind::Float,
            TypedValue::Double(_) => TypeKind::Double,
            TypedValue::Bool(_) => TypeKind::Bool,
            TypedValue::String(_) => TypeKind::String,
            TypedValue::List { element, .. } => TypeKind::List(Box::new(element.clone())),
        }
    }

    pub fn extract<T: ValueType>(&self) -> Result<T> {
        T::from_value(self).ok_or_else(|| {
            EngineError::TypeMismatch(format!(
                "value of type {} cannot be extracted as {}",
                self.kind(),
                T::kind()
            ))
        })
    }

    pub fn is<T: ValueType>(&self) -> bool {
        self.kind() == T::kind()
    }

    /// Fails with `TypeMismatch` unless `value` has the given type.
    pub fn expect_kind(&self, kind: &TypeKind, context: &str) -> Result<()> {
        if self.kind() == *kind {
            return Ok(());
        }
        Err(EngineError::TypeMismatch(format!(
            "{} expects {}, got {}",
            context,
            kind,
            self.kind()
        )))
    }

    /// Ordering between two values of the same type. Different types fail with `TypeMismatch`.
    pub fn try_cmp(&self, other: &TypedValue) -> Result<Ordering> {
        if self.kind() != other.kind() {
            return Err(EngineError::TypeMismatch(format!(
                "cannot compare {} with {}",
                self.kind(),
                other.kind()
            )));
        }
        Ok(self.cmp(other))
    }

    pub fn less_than(&self, other: &TypedValue) -> Result<bool> {
        Ok(self.try_cmp(other)? == Ordering::Less)
    }

    pub fn to_text(&self) -> String {
        match self {
            TypedValue::Char(v) => v.to_string(),
            TypedValue::UChar(v) => v.to_string(),
            TypedValue::Short(v) => v.to_string(),
            TypedValue::UShort(v) => v.to_string(),
            TypedValue::Int(v) => v.to_string(),
            TypedValue::UInt(v) => v.to_string(),
            TypedValue::Long(v) => v.to_string(),
            TypedValue::ULong(v) => v.to_string(),
            TypedValue::Float(v) => v.to_string(),
            TypedValue::Double(v) => v.to_string(),
            TypedValue::Bool(v) => v.to_string(),
            TypedValue::String(v) => v.clone(),
            TypedValue::List { items, .. } => serde_json::Value::Array(
                items
                    .iter()
                    .map(|item| serde_json::Value::String(item.to_text()))
                    .collect(),
            )
            .to_string(),
        }
    }

    pub fn from_text(kind: &TypeKind, text: &str) -> Result<TypedValue> {
        fn parse<T: std::str::FromStr>(kind: &TypeKind, text: &str) -> Result<T> {
            text.trim().parse::<T>().map_err(|_| {
                EngineError::TypeMismatch(format!("cannot parse '{}' as {}", text, kind))
            })
        }

        let value = match kind {
            TypeKind::Char => TypedValue::Char(parse(kind, text)?),
            TypeKind::UChar => TypedValue::UChar(parse(kind, text)?),
            TypeKind::Short => TypedValue::Short(parse(kind, text)?),
            TypeKind::UShort => TypedValue::UShort(parse(kind, text)?),
            TypeKind::Int => TypedValue::Int(parse(kind, text)?),
            TypeKind::UInt => TypedValue::UInt(parse(kind, text)?),
            TypeKind::Long => TypedValue::Long(parse(kind, text)?),
            TypeKind::ULong => TypedValue::ULong(parse(kind, text)?),
            TypeKind::Float => TypedValue::Float(parse(kind, text)?),
            TypeKind::Double => TypedValue::Double(parse(kind, text)?),
            TypeKind::Bool => TypedValue::Bool(parse(kind, text)?),
            TypeKind::String => TypedValue::String(text.to_string()),
            TypeKind::List(element) => {
                let raw: Vec<String> = serde_json::from_str(text).map_err(|e| {
                    EngineError::TypeMismatch(format!("cannot parse '{}' as {}: {}", text, kind, e))
                })?;
                let items = raw
                    .iter()
                    .map(|item| TypedValue::from_text(element, item))
                    .collect::<Result<Vec<_>>>()?;
                TypedValue::List {
                    element: (**element).clone(),
                    items,
                }
            }
        };
        Ok(value)
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

// Total order: by type first, then by value (floats via `total_cmp`). Lets values act as
// map/set keys; use `try_cmp` when mixing types must be an error.
impl Ord for TypedValue {
    fn cmp(&self, other: &Self) -> Ordering {
        use TypedValue as V;
        match (self, other) {
            (V::Char(a), V::Char(b)) => a.cmp(b),
            (V::UChar(a), V::UChar(b)) => a.cmp(b),
            (V::Short(a), V::Short(b)) => a.cmp(b),
            (V::UShort(a), V::UShort(b)) => a.cmp(b),
            (V::Int(a), V::Int(b)) => a.cmp(b),
            (V::UInt(a), V::UInt(b)) => a.cmp(b),
            (V::Long(a), V::Long(b)) => a.cmp(b),
            (V::ULong(a), V::ULong(b)) => a.cmp(b),
            (V::Float(a), V::Float(b)) => a.total_cmp(b),
            (V::Double(a), V::Double(b)) => a.total_cmp(b),
            (V::Bool(a), V::Bool(b)) => a.cmp(b),
            (V::String(a), V::String(b)) => a.cmp(b),
            (
                V::List {
                    element: ea,
                    items: ia,
                },
                V::List {
                    element: eb,
                    items: ib,
                },
            ) => ea.cmp(eb).then_with(|| ia.cmp(ib)),
            (a, b) => a.kind().rank().cmp(&b.kind().rank()),
        }
    }
}

impl PartialOrd for TypedValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for TypedValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for TypedValue {}

impl Hash for TypedValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind().rank().hash(state);
        match self {
            TypedValue::Char(v) => v.hash(state),
            TypedValue::UChar(v) => v.hash(state),
            TypedValue::Short(v) => v.hash(state),
            TypedValue::UShort(v) => v.hash(state),
            TypedValue::Int(v) => v.hash(state),
            TypedValue::UInt(v) => v.hash(state),
            TypedValue::Long(v) => v.hash(state),
            TypedValue::ULong(v) => v.hash(state),
            TypedValue::Float(v) => v.to_bits().hash(state),
            TypedValue::Double(v) => v.to_bits().hash(state),
            TypedValue::Bool(v) => v.hash(state),
            TypedValue::String(v) => v.hash(state),
            TypedValue::List { element, items } => {
                element.hash(state);
                items.hash(state);
            }
        }
    }
}

/// Rust types that map onto a registered [`TypeKind`].
pub trait ValueType: Sized + Clone + Send + 'static {
    fn kind() -> TypeKind;
    fn into_value(self) -> TypedValue;
    fn from_value(value: &TypedValue) -> Option<Self>;
}

macro_rules! primitive_value_type {
    ($ty:ty, $variant:ident) => {
        impl ValueType for $ty {
            fn kind() -> TypeKind {
                TypeKind::$variant
            }

            fn into_value(self) -> TypedValue {
                TypedValue::$variant(self)
            }

            fn from_value(value: &TypedValue) -> Option<Self> {
                match value {
                    TypedValue::$variant(v) => Some(v.clone()),
                    _ => None,
                }
            }
        }

        impl From<$ty> for TypedValue {
            fn from(value: $ty) -> Self {
                TypedValue::$variant(value)
            }
        }
    };
}

primitive_value_type!(i8, Char);
primitive_value_type!(u8, UChar);
primitive_value_type!(i16, Short);
primitive_value_type!(u16, UShort);
primitive_value_type!(i32, Int);
primitive_value_type!(u32, UInt);
primitive_value_type!(i64, Long);
primitive_value_type!(u64, ULong);
primitive_value_type!(f32, Float);
primitive_value_type!(f64, Double);
primitive_value_type!(bool, Bool);
primitive_value_type!(String, String);

impl From<&str> for TypedValue {
    fn from(value: &str) -> Self {
        TypedValue::String(value.to_string())
    }
}

impl<T: ValueType> ValueType for Vec<T> {
    fn kind() -> TypeKind {
        TypeKind::List(Box::new(T::kind()))
    }

    fn into_value(self) -> TypedValue {
        TypedValue::List {
            element: T::kind(),
            items: self.into_iter().map(ValueType::into_value).collect(),
        }
    }

    fn from_value(value: &TypedValue) -> Option<Self> {
        match value {
            TypedValue::List { element, items } if *element == T::kind() => {
                items.iter().map(T::from_value).collect()
            }
            _ => None,
        }
    }
}
