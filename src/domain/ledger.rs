use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// The three purchasable kinds of the marketplace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Module,
    Service,
    Package,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Module => "module",
            Self::Service => "service",
            Self::Package => "package",
        };
        f.write_str(s)
    }
}

impl FromStr for ItemKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "module" => Ok(Self::Module),
            "service" => Ok(Self::Service),
            "package" => Ok(Self::Package),
            other => Err(format!("unknown item kind '{other}'")),
        }
    }
}

/// Entitlements of one tenant/user session.
///
/// The three sets are disjoint by kind and only ever grow: there is no
/// removal operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnedItems {
    pub owned_modules: BTreeSet<String>,
    pub owned_services: BTreeSet<String>,
    pub owned_packages: BTreeSet<String>,
}

impl OwnedItems {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_modules<I, S>(modules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            owned_modules: modules.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn set(&self, kind: ItemKind) -> &BTreeSet<String> {
        match kind {
            ItemKind::Module => &self.owned_modules,
            ItemKind::Service => &self.owned_services,
            ItemKind::Package => &self.owned_packages,
        }
    }

    pub fn contains(&self, kind: ItemKind, id: &str) -> bool {
        self.set(kind).contains(id)
    }

    /// Inserts `id` into the set for `kind`. Returns `false` if it was already owned.
    pub fn insert(&mut self, kind: ItemKind, id: impl Into<String>) -> bool {
        let set = match kind {
            ItemKind::Module => &mut self.owned_modules,
            ItemKind::Service => &mut self.owned_services,
            ItemKind::Package => &mut self.owned_packages,
        };
        set.insert(id.into())
    }

    /// True if every id in `self` is also present in `other`.
    pub fn is_subset_of(&self, other: &OwnedItems) -> bool {
        self.owned_modules.is_subset(&other.owned_modules)
            && self.owned_services.is_subset(&other.owned_services)
            && self.owned_packages.is_subset(&other.owned_packages)
    }

    pub fn len(&self) -> usize {
        self.owned_modules.len() + self.owned_services.len() + self.owned_packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_is_idempotent() {
        let mut owned = OwnedItems::new();
        assert!(owned.insert(ItemKind::Module, "shrimp"));
        assert!(!owned.insert(ItemKind::Module, "shrimp"));
        assert_eq!(owned.owned_modules.len(), 1);
    }

    #[test]
    fn test_kinds_are_disjoint() {
        let mut owned = OwnedItems::new();
        owned.insert(ItemKind::Service, "genetics");
        assert!(owned.contains(ItemKind::Service, "genetics"));
        assert!(!owned.contains(ItemKind::Module, "genetics"));
        assert!(!owned.contains(ItemKind::Package, "genetics"));
    }

    #[test]
    fn test_subset_after_growth() {
        let before = OwnedItems::with_modules(["shrimp", "tilapia"]);
        let mut after = before.clone();
        after.insert(ItemKind::Package, "aquaculture-starter");
        assert!(before.is_subset_of(&after));
        assert!(!after.is_subset_of(&before));
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!("Service".parse::<ItemKind>().unwrap(), ItemKind::Service);
        assert!("bundle".parse::<ItemKind>().is_err());
    }

    #[test]
    fn test_serializes_with_ledger_field_names() {
        let owned = OwnedItems::with_modules(["shrimp"]);
        let json = serde_json::to_value(&owned).unwrap();
        assert_eq!(json["ownedModules"][0], "shrimp");
        assert!(json["ownedServices"].as_array().unwrap().is_empty());
    }
}
