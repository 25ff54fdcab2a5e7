use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::{TypeKind, TypedValue};
use crate::error::Result;

/// Converts a value of one registered type into another.
pub type Converter = Arc<dyn Fn(&TypedValue) -> Result<TypedValue> + Send + Sync>;

/// Conversion functions keyed by `(from, to)`. Used by `link_with_conversion`.
#[derive(Clone, Default)]
pub struct ConversionRegistry {
    converters: HashMap<(TypeKind, TypeKind), Converter>,
}

impl fmt::Debug for ConversionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut pairs: Vec<String> = self
            .converters
            .keys()
            .map(|(from, to)| format!("{} -> {}", from, to))
            .collect();
        pairs.sort();
        f.debug_struct("ConversionRegistry")
            .field("converters", &pairs)
            .finish()
    }
}

/// Widening conversions that never lose information.
fn widening() -> Vec<(TypeKind, Vec<TypeKind>)> {
    vec![
        (
            TypeKind::Char,
            vec![TypeKind::Short, TypeKind::Int, TypeKind::Long, TypeKind::Float, TypeKind::Double],
        ),
        (
            TypeKind::UChar,
            vec![
                TypeKind::Short,
                TypeKind::UShort,
                TypeKind::Int,
                TypeKind::UInt,
                TypeKind::Long,
                TypeKind::ULong,
                TypeKind::Float,
                TypeKind::Double,
            ],
        ),
        (
            TypeKind::Short,
            vec![TypeKind::Int, TypeKind::Long, TypeKind::Float, TypeKind::Double],
        ),
        (
            TypeKind::UShort,
            vec![
                TypeKind::Int,
                TypeKind::UInt,
                TypeKind::Long,
                TypeKind::ULong,
                TypeKind::Float,
                TypeKind::Double,
            ],
        ),
        (TypeKind::Int, vec![TypeKind::Long, TypeKind::Double]),
        (
            TypeKind::UInt,
            vec![TypeKind::Long, TypeKind::ULong, TypeKind::Double],
        ),
        (TypeKind::Float, vec![TypeKind::Double]),
    ]
}

fn primitives() -> Vec<TypeKind> {
    vec![
        TypeKind::Char,
        TypeKind::UChar,
        TypeKind::Short,
        TypeKind::UShort,
        TypeKind::Int,
        TypeKind::UInt,
        TypeKind::Long,
        TypeKind::ULong,
        TypeKind::Float,
        TypeKind::Double,
        TypeKind::Bool,
    ]
}

impl ConversionRegistry {
    pub fn new() -> Self {
        Self {
            converters: HashMap::new(),
        }
    }

    /// Registry with numeric widening and primitive-to-string conversions registered.
    pub fn with_defaults() -> Self {
        let mut r = Self::new();
        for (from, targets) in widening() {
            for to in targets {
                let target = to.clone();
                r.register(from.clone(), to, move |value| {
                    TypedValue::from_text(&target, &value.to_text())
                });
            }
        }
        for from in primitives() {
            r.register(from, TypeKind::String, |value| {
                Ok(TypedValue::String(value.to_text()))
            });
        }
        r
    }

    /// Register (or replace) the converter for `from -> to`.
    pub fn register(
        &mut self,
        from: TypeKind,
        to: TypeKind,
        converter: impl Fn(&TypedValue) -> Result<TypedValue> + Send + Sync + 'static,
    ) {
        self.converters.insert((from, to), Arc::new(converter));
    }

    pub fn find(&self, from: &TypeKind, to: &TypeKind) -> Option<Converter> {
        self.converters.get(&(from.clone(), to.clone())).cloned()
    }

    pub fn can_convert(&self, from: &TypeKind, to: &TypeKind) -> bool {
        from == to || self.converters.contains_key(&(from.clone(), to.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_widen_int_to_double() {
        let r = ConversionRegistry::with_defaults();
        let f = r.find(&TypeKind::Int, &TypeKind::Double).unwrap();
        assert_eq!(f(&TypedValue::Int(7)).unwrap(), TypedValue::Double(7.0));
    }

    #[test]
    fn defaults_do_not_narrow() {
        let r = ConversionRegistry::with_defaults();
        assert!(r.find(&TypeKind::Double, &TypeKind::Int).is_none());
        assert!(r.find(&TypeKind::Long, &TypeKind::Int).is_none());
        assert!(!r.can_convert(&TypeKind::String, &TypeKind::Int));
    }

    #[test]
    fn anything_primitive_converts_to_string() {
        let r = ConversionRegistry::with_defaults();
        let f = r.find(&TypeKind::Bool, &TypeKind::String).unwrap();
        assert_eq!(f(&TypedValue::Bool(true)).unwrap(), TypedValue::from("true"));
    }

    #[test]
    fn custom_converter_replaces_missing_pair() {
        let mut r = ConversionRegistry::new();
        r.register(TypeKind::Double, TypeKind::Int, |v| {
            Ok(TypedValue::Int(v.extract::<f64>()?.round() as i32))
        });
        let f = r.find(&TypeKind::Double, &TypeKind::Int).unwrap();
        assert_eq!(f(&TypedValue::Double(2.6)).unwrap(), TypedValue::Int(3));
    }
}
