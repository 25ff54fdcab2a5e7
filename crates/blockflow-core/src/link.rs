//! Links: directed outlet → inlet wiring.
//!
//! A link is keyed by its `(inlet, outlet)` address pair. The [`LinkSet`] orders links by
//! that key, so the same pair can only be present once; a duplicate insert leaves the
//! existing link in place and drops the new one unactivated.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::port::{Inlet, Outlet};
use crate::registry::BlockId;
use crate::value::{ConversionRegistry, Converter};

/// A port on a specific block instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PortAddress {
    pub block: BlockId,
    pub port: String,
}

impl PortAddress {
    pub fn new(block: BlockId, port: impl Into<String>) -> Self {
        Self {
            block,
            port: port.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LinkKey {
    pub inlet: PortAddress,
    pub outlet: PortAddress,
}

impl LinkKey {
    pub fn touches(&self, block: &BlockId) -> bool {
        self.inlet.block == *block || self.outlet.block == *block
    }
}

/// Description of a live link, by block instance and port names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkInfo {
    pub outlet_block: String,
    pub outlet: String,
    pub inlet_block: String,
    pub inlet: String,
    pub with_conversion: bool,
}

impl fmt::Display for LinkInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{} -> {}.{}",
            self.outlet_block, self.outlet, self.inlet_block, self.inlet
        )
    }
}

pub struct Link {
    key: LinkKey,
    outlet: Arc<Outlet>,
    inlet: Arc<Inlet>,
    converter: Option<Converter>,
    active: bool,
}

impl fmt::Debug for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Link")
            .field("key", &self.key)
            .field("with_conversion", &self.converter.is_some())
            .field("active", &self.active)
            .finish()
    }
}

impl Link {
    /// Build a link after checking types. Without `conversions` the types must match exactly;
    /// with them, a registered converter for `outlet → inlet` also qualifies.
    pub fn new(
        key: LinkKey,
        outlet: Arc<Outlet>,
        inlet: Arc<Inlet>,
        conversions: Option<&ConversionRegistry>,
    ) -> Result<Self> {
        let converter = if outlet.kind() == inlet.kind() {
            None
        } else {
            let found = conversions.and_then(|c| c.find(outlet.kind(), inlet.kind()));
            match found {
                Some(converter) => Some(converter),
                None => {
                    return Err(EngineError::TypeMismatch(format!(
                        "cannot link outlet {} of {} ({}) to inlet {} of {} ({})",
                        outlet.name(),
                        outlet.owner(),
                        outlet.kind(),
                        inlet.name(),
                        inlet.owner(),
                        inlet.kind()
                    )));
                }
            }
        };
        Ok(Self {
            key,
            outlet,
            inlet,
            converter,
            active: false,
        })
    }

    pub fn key(&self) -> &LinkKey {
        &self.key
    }

    pub fn inlet(&self) -> &Arc<Inlet> {
        &self.inlet
    }

    pub fn outlet(&self) -> &Arc<Outlet> {
        &self.outlet
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn uses_conversion(&self) -> bool {
        self.converter.is_some()
    }

    pub fn activate(&mut self) {
        if !self.active {
            self.outlet
                .add_target(self.inlet.clone(), self.converter.clone());
            self.active = true;
        }
    }

    pub fn deactivate(&mut self) {
        if self.active {
            self.outlet.remove_target(&self.inlet);
            self.active = false;
        }
    }

    pub fn info(&self) -> LinkInfo {
        LinkInfo {
            outlet_block: self.outlet.owner().to_string(),
            outlet: self.outlet.name().to_string(),
            inlet_block: self.inlet.owner().to_string(),
            inlet: self.inlet.name().to_string(),
            with_conversion: self.uses_conversion(),
        }
    }
}

/// Live links ordered by key.
#[derive(Debug, Default)]
pub struct LinkSet {
    links: BTreeMap<LinkKey, Link>,
}

impl LinkSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Activate and store a link. A link with the same key already present wins; returns
    /// `false` in that case.
    pub fn insert(&mut self, mut link: Link) -> bool {
        if self.links.contains_key(&link.key) {
            return false;
        }
        link.activate();
        self.links.insert(link.key.clone(), link);
        true
    }

    pub fn contains(&self, key: &LinkKey) -> bool {
        self.links.contains_key(key)
    }

    /// Deactivate and remove. Unknown keys are a no-op.
    pub fn remove(&mut self, key: &LinkKey) -> Option<Link> {
        let mut link = self.links.remove(key)?;
        link.deactivate();
        Some(link)
    }

    /// The link feeding a given inlet, if any.
    pub fn upstream_of(&self, inlet: &PortAddress) -> Option<LinkKey> {
        self.links.keys().find(|k| k.inlet == *inlet).cloned()
    }

    pub fn keys_touching(&self, block: &BlockId) -> Vec<LinkKey> {
        self.links
            .keys()
            .filter(|k| k.touches(block))
            .cloned()
            .collect()
    }

    pub fn remove_touching(&mut self, block: &BlockId) -> Vec<Link> {
        self.keys_touching(block)
            .iter()
            .filter_map(|k| self.remove(k))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Link> {
        self.links.values()
    }

    pub fn clear(&mut self) {
        for link in self.links.values_mut() {
            link.deactivate();
        }
        self.links.clear();
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::TypedValue;

    fn ports() -> (BlockId, Arc<Outlet>, BlockId, Arc<Inlet>) {
        (
            BlockId::new(),
            Arc::new(Outlet::new("counter", "Counter # 0", TypedValue::Int(0))),
            BlockId::new(),
            Arc::new(Inlet::new("number", "Doubler # 0", TypedValue::Int(0), 8)),
        )
    }

    fn key(ob: BlockId, ib: BlockId) -> LinkKey {
        LinkKey {
            inlet: PortAddress::new(ib, "number"),
            outlet: PortAddress::new(ob, "counter"),
        }
    }

    #[test]
    fn duplicate_link_keeps_one_active_edge() {
        let (ob, outlet, ib, inlet) = ports();
        let mut set = LinkSet::new();
        let first = Link::new(key(ob, ib), outlet.clone(), inlet.clone(), None).unwrap();
        let second = Link::new(key(ob, ib), outlet.clone(), inlet.clone(), None).unwrap();
        assert!(set.insert(first));
        assert!(!set.insert(second));
        assert_eq!(set.len(), 1);
        assert_eq!(outlet.target_count(), 1);

        assert!(set.remove(&key(ob, ib)).is_some());
        assert!(set.remove(&key(ob, ib)).is_none());
        assert_eq!(outlet.target_count(), 0);
    }

    #[test]
    fn mismatched_types_need_a_conversion() {
        let outlet = Arc::new(Outlet::new("counter", "Counter # 0", TypedValue::Int(0)));
        let inlet = Arc::new(Inlet::new("x", "Scale # 0", TypedValue::Double(0.0), 8));
        let k = LinkKey {
            inlet: PortAddress::new(BlockId::new(), "x"),
            outlet: PortAddress::new(BlockId::new(), "counter"),
        };
        let err = Link::new(k.clone(), outlet.clone(), inlet.clone(), None).unwrap_err();
        assert!(matches!(err, EngineError::TypeMismatch(_)));
        let registry = ConversionRegistry::with_defaults();
        let link = Link::new(k, outlet, inlet, Some(&registry)).unwrap();
        assert!(link.uses_conversion());
    }

    #[test]
    fn removing_a_block_drops_its_links() {
        let (ob, outlet, ib, inlet) = ports();
        let mut set = LinkSet::new();
        set.insert(Link::new(key(ob, ib), outlet.clone(), inlet, None).unwrap());
        assert!(set.upstream_of(&PortAddress::new(ib, "number")).is_some());
        assert_eq!(set.remove_touching(&ib).len(), 1);
        assert!(set.is_empty());
        assert_eq!(outlet.target_count(), 0);
    }
}
