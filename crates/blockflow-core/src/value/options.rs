use serde::{Deserialize, Serialize};

use super::{TypeKind, TypedValue, ValueType};
use crate::error::{EngineError, Result};

/// Enumerated set of legal values (with descriptions) for a parameter or inlet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionSet {
    kind: TypeKind,
    options: Vec<(TypedValue, String)>,
}

impl OptionSet {
    pub fn new(kind: TypeKind) -> Self {
        Self {
            kind,
            options: Vec::new(),
        }
    }

    pub fn of<T: ValueType>() -> Self {
        Self::new(T::kind())
    }

    /// Add an option; a value already present keeps its first description.
    pub fn with<T: ValueType>(mut self, value: T, description: impl Into<String>) -> Self {
        let value = value.into_value();
        if value.kind() == self.kind && !self.contains(&value) {
            self.options.push((value, description.into()));
        }
        self
    }

    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }

    pub fn contains(&self, value: &TypedValue) -> bool {
        self.options.iter().any(|(v, _)| v == value)
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TypedValue, &str)> {
        self.options.iter().map(|(v, d)| (v, d.as_str()))
    }

    /// Typed view of the options.
    pub fn extract<T: ValueType>(&self) -> Result<Vec<(T, String)>> {
        self.options
            .iter()
            .map(|(v, d)| Ok((v.extract::<T>()?, d.clone())))
            .collect()
    }

    pub fn check(&self, value: &TypedValue, owner: &str) -> Result<()> {
        if self.contains(value) {
            return Ok(());
        }
        Err(EngineError::TypeMismatch(format!(
            "value {} is not a valid option for {}",
            value, owner
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_rejects_values_outside_the_set() {
        let set = OptionSet::of::<i32>().with(1, "one").with(2, "two").with(1, "dup");
        assert_eq!(set.iter().count(), 2);
        assert!(set.check(&TypedValue::Int(2), "mode").is_ok());
        let err = set.check(&TypedValue::Int(5), "mode").unwrap_err();
        assert!(err.to_string().contains("mode"));
        assert_eq!(set.extract::<i32>().unwrap()[0], (1, "one".to_string()));
    }
}
