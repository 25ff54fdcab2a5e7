use std::fmt;

use parking_lot::Mutex;

use crate::error::Result;
use crate::value::{OptionSet, TypeKind, TypedValue};

struct ParameterData {
    default: TypedValue,
    pending: Option<TypedValue>,
    current: TypedValue,
    options: Option<OptionSet>,
}

/// Setup parameter. Writes land in a pending slot and become visible to the block at the
/// next synchronization, before setup or update.
pub struct Parameter {
    name: String,
    owner: String,
    kind: TypeKind,
    data: Mutex<ParameterData>,
}

impl fmt::Debug for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parameter")
            .field("name", &self.name)
            .field("owner", &self.owner)
            .field("kind", &self.kind)
            .finish()
    }
}

impl Parameter {
    pub fn new(
        name: impl Into<String>,
        owner: impl Into<String>,
        default: TypedValue,
        options: Option<OptionSet>,
    ) -> Self {
        Self {
            name: name.into(),
            owner: owner.into(),
            kind: default.kind(),
            data: Mutex::new(ParameterData {
                current: default.clone(),
                default,
                pending: None,
                options,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }

    fn check(&self, value: &TypedValue, data: &ParameterData) -> Result<()> {
        let context = format!("parameter {} of {}", self.name, self.owner);
        value.expect_kind(&self.kind, &context)?;
        if let Some(options) = &data.options {
            options.check(value, &context)?;
        }
        Ok(())
    }

    pub fn set(&self, value: TypedValue) -> Result<()> {
        let mut data = self.data.lock();
        self.check(&value, &data)?;
        data.pending = Some(value);
        Ok(())
    }

    pub fn set_default(&self, value: TypedValue) -> Result<()> {
        let mut data = self.data.lock();
        self.check(&value, &data)?;
        data.default = value;
        Ok(())
    }

    /// Publish the pending value. Returns whether anything changed.
    pub fn synchronize(&self) -> bool {
        let mut data = self.data.lock();
        match data.pending.take() {
            Some(value) => {
                data.current = value;
                true
            }
            None => false,
        }
    }

    /// The block-visible value.
    pub fn value(&self) -> TypedValue {
        self.data.lock().current.clone()
    }

    /// Pending value if one was set since the last synchronization, else the visible one.
    pub fn latest(&self) -> TypedValue {
        let data = self.data.lock();
        data.pending.clone().unwrap_or_else(|| data.current.clone())
    }

    pub fn default_value(&self) -> TypedValue {
        self.data.lock().default.clone()
    }

    pub fn options(&self) -> Option<OptionSet> {
        self.data.lock().options.clone()
    }

    pub fn reset(&self) {
        let mut data = self.data.lock();
        data.pending = None;
        data.current = data.default.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_value_waits_for_synchronize() {
        let p = Parameter::new("step", "Counter # 0", TypedValue::Int(1), None);
        p.set(TypedValue::Int(3)).unwrap();
        assert_eq!(p.value(), TypedValue::Int(1));
        assert_eq!(p.latest(), TypedValue::Int(3));
        assert!(p.synchronize());
        assert_eq!(p.value(), TypedValue::Int(3));
        assert!(!p.synchronize());
    }

    #[test]
    fn option_set_restricts_values() {
        let options = OptionSet::of::<String>().with("fast".to_string(), "").with("slow".to_string(), "");
        let p = Parameter::new("mode", "Clock # 0", TypedValue::from("fast"), Some(options));
        assert!(p.set(TypedValue::from("slow")).is_ok());
        let err = p.set(TypedValue::from("medium")).unwrap_err();
        assert!(err.to_string().contains("mode"));
        assert!(p.set(TypedValue::Int(1)).is_err());
    }
}
