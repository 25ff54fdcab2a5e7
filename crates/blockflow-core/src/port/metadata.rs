//! Declarative descriptions of a block type's parameters, inlets and outlets, and the
//! serializable info views handed to applications.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::policy::InletPolicy;
use crate::value::{OptionSet, TypeKind, TypedValue, ValueType};

#[derive(Debug, Clone, PartialEq)]
pub struct InletMetadata {
    pub name: String,
    pub description: String,
    pub default: TypedValue,
    pub policy: Option<InletPolicy>,
    pub multi: bool,
    pub options: Option<OptionSet>,
    pub buffer_size: Option<usize>,
}

impl InletMetadata {
    pub fn new<T: ValueType>(name: impl Into<String>, default: T) -> Self {
        Self::with_value(name, default.into_value())
    }

    pub fn with_value(name: impl Into<String>, default: TypedValue) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            default,
            policy: None,
            multi: false,
            options: None,
            buffer_size: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn policy(mut self, policy: InletPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    pub fn multi(mut self) -> Self {
        self.multi = true;
        self
    }

    pub fn options(mut self, options: OptionSet) -> Self {
        self.options = Some(options);
        self
    }

    pub fn buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = Some(size.max(1));
        self
    }

    pub fn kind(&self) -> TypeKind {
        self.default.kind()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutletMetadata {
    pub name: String,
    pub description: String,
    pub initial: TypedValue,
}

impl OutletMetadata {
    pub fn new<T: ValueType>(name: impl Into<String>, initial: T) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            initial: initial.into_value(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn kind(&self) -> TypeKind {
        self.initial.kind()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterMetadata {
    pub name: String,
    pub description: String,
    pub default: TypedValue,
    pub options: Option<OptionSet>,
}

impl ParameterMetadata {
    pub fn new<T: ValueType>(name: impl Into<String>, default: T) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            default: default.into_value(),
            options: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn options(mut self, options: OptionSet) -> Self {
        self.options = Some(options);
        self
    }

    pub fn kind(&self) -> TypeKind {
        self.default.kind()
    }
}

/// Description of one block type offered by a bundle.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BlockMetadata {
    pub name: String,
    pub description: String,
    pub category: String,
    pub is_context: bool,
    pub inlets: Vec<InletMetadata>,
    pub outlets: Vec<OutletMetadata>,
    pub parameters: Vec<ParameterMetadata>,
}

fn same_name(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

impl BlockMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn context(mut self) -> Self {
        self.is_context = true;
        self
    }

    pub fn inlet(mut self, inlet: InletMetadata) -> Self {
        self.inlets.push(inlet);
        self
    }

    pub fn outlet(mut self, outlet: OutletMetadata) -> Self {
        self.outlets.push(outlet);
        self
    }

    pub fn parameter(mut self, parameter: ParameterMetadata) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Port names must be unique per kind (case-insensitive).
    pub fn validate(&self) -> Result<()> {
        fn check<'a>(kind: &str, block: &str, names: impl Iterator<Item = &'a str>) -> Result<()> {
            let mut seen: Vec<&str> = Vec::new();
            for name in names {
                if seen.iter().any(|s| same_name(s, name)) {
                    return Err(EngineError::AlreadyExists(format!(
                        "{} {} already exists in {}",
                        kind, name, block
                    )));
                }
                seen.push(name);
            }
            Ok(())
        }
        check("inlet", &self.name, self.inlets.iter().map(|i| i.name.as_str()))?;
        check("outlet", &self.name, self.outlets.iter().map(|o| o.name.as_str()))?;
        check(
            "parameter",
            &self.name,
            self.parameters.iter().map(|p| p.name.as_str()),
        )
    }

    pub fn find_inlet(&self, name: &str) -> Option<&InletMetadata> {
        self.inlets.iter().find(|i| same_name(&i.name, name))
    }

    pub fn find_outlet(&self, name: &str) -> Option<&OutletMetadata> {
        self.outlets.iter().find(|o| same_name(&o.name, name))
    }

    pub fn find_parameter(&self, name: &str) -> Option<&ParameterMetadata> {
        self.parameters.iter().find(|p| same_name(&p.name, name))
    }

    pub fn info(&self) -> BlockInfo {
        BlockInfo {
            name: self.name.clone(),
            description: self.description.clone(),
            category: self.category.clone(),
            is_context: self.is_context,
            inlets: self
                .inlets
                .iter()
                .map(|i| InletInfo {
                    name: i.name.clone(),
                    description: i.description.clone(),
                    type_name: i.kind().name(),
                    default_value: i.default.to_text(),
                    update_policy: i.policy.map(|p| p.name().to_string()),
                    is_multi_inlet: i.multi,
                    has_option_check: i.options.is_some(),
                    buffer_size: i.buffer_size,
                })
                .collect(),
            outlets: self
                .outlets
                .iter()
                .map(|o| OutletInfo {
                    name: o.name.clone(),
                    description: o.description.clone(),
                    type_name: o.kind().name(),
                    initial_value: o.initial.to_text(),
                })
                .collect(),
            parameters: self
                .parameters
                .iter()
                .map(|p| ParameterInfo {
                    name: p.name.clone(),
                    description: p.description.clone(),
                    type_name: p.kind().name(),
                    default_value: p.default.to_text(),
                    has_option_check: p.options.is_some(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InletInfo {
    pub name: String,
    pub description: String,
    pub type_name: String,
    pub default_value: String,
    pub update_policy: Option<String>,
    pub is_multi_inlet: bool,
    pub has_option_check: bool,
    pub buffer_size: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutletInfo {
    pub name: String,
    pub description: String,
    pub type_name: String,
    pub initial_value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterInfo {
    pub name: String,
    pub description: String,
    pub type_name: String,
    pub default_value: String,
    pub has_option_check: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockInfo {
    pub name: String,
    pub description: String,
    pub category: String,
    pub is_context: bool,
    pub inlets: Vec<InletInfo>,
    pub outlets: Vec<OutletInfo>,
    pub parameters: Vec<ParameterInfo>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_port_names_are_rejected() {
        let meta = BlockMetadata::new("Doubler")
            .inlet(InletMetadata::new("number", 0i32))
            .inlet(InletMetadata::new("Number", 1i32));
        assert!(matches!(meta.validate(), Err(EngineError::AlreadyExists(_))));
    }

    #[test]
    fn info_reports_multi_and_option_flags() {
        let meta = BlockMetadata::new("Accumulator")
            .inlet(InletMetadata::new("values", 0i32).multi())
            .parameter(
                ParameterMetadata::new("mode", "sum".to_string())
                    .options(OptionSet::of::<String>().with("sum".to_string(), "add all")),
            )
            .outlet(OutletMetadata::new("total", 0i32));
        let info = meta.info();
        assert!(info.inlets[0].is_multi_inlet);
        assert_eq!(info.inlets[0].type_name, "int");
        assert!(info.parameters[0].has_option_check);
        assert!(meta.find_outlet("TOTAL").is_some());
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["inlets"][0]["isMultiInlet"], true);
    }
}
