use crate::domain::ledger::OwnedItems;
use crate::domain::ports::CatalogLookup;
use crate::error::{PortalError, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A non-negative list price.
///
/// Wraps `rust_decimal::Decimal` so catalog prices never carry float
/// rounding and can't go below zero.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    pub fn new(value: Decimal) -> Result<Self> {
        if value >= Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(PortalError::InternalError(
                format!("price must not be negative, got {value}").into(),
            ))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PortalError;

    fn try_from(value: Decimal) -> Result<Self> {
        Self::new(value)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = <Decimal as Deserialize>::deserialize(deserializer)?;
        Price::new(value).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Currency {
    #[serde(rename = "USD")]
    Usd,
    #[serde(rename = "PEN")]
    Pen,
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Usd => f.write_str("USD"),
            Self::Pen => f.write_str("PEN"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Industry {
    Aquaculture,
    Poultry,
    Livestock,
    Agriculture,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketplaceModule {
    pub id: String,
    pub name: String,
    pub industry: Industry,
    pub price: Price,
    pub currency: Currency,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub is_popular: bool,
    #[serde(default)]
    pub is_premium: bool,
    #[serde(default)]
    pub is_new: bool,
}

/// Add-on that can only be bought once `module_id` is owned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdditionalService {
    pub id: String,
    pub name: String,
    pub module_id: String,
    pub price: Price,
    pub currency: Currency,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub is_popular: bool,
    #[serde(default)]
    pub is_premium: bool,
    #[serde(default)]
    pub is_new: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketplacePackage {
    pub id: String,
    pub name: String,
    pub industry: Industry,
    pub price: Price,
    pub currency: Currency,
    /// Modules bundled by the package.
    #[serde(default)]
    pub module_ids: Vec<String>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub is_popular: bool,
    #[serde(default)]
    pub is_premium: bool,
    #[serde(default)]
    pub is_new: bool,
}

/// Static, read-only marketplace reference data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub modules: Vec<MarketplaceModule>,
    #[serde(default)]
    pub services: Vec<AdditionalService>,
    #[serde(default)]
    pub packages: Vec<MarketplacePackage>,
}

impl Catalog {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn services_for_module<'a>(
        &'a self,
        module_id: &'a str,
    ) -> impl Iterator<Item = &'a AdditionalService> + 'a {
        self.services.iter().filter(move |s| s.module_id == module_id)
    }

    /// Whether the module is usable: owned directly or through an owned package.
    ///
    /// The service gate in the purchase workflow only looks at direct ownership.
    pub fn has_module_access(&self, owned: &OwnedItems, module_id: &str) -> bool {
        owned.owned_modules.contains(module_id)
            || self
                .packages
                .iter()
                .filter(|p| owned.owned_packages.contains(&p.id))
                .any(|p| p.module_ids.iter().any(|m| m == module_id))
    }

    /// The default aquaculture marketplace.
    pub fn builtin() -> Self {
        let module = |id: &str, name: &str, industry: Industry, price: Decimal, features: &[&str]| {
            MarketplaceModule {
                id: id.to_string(),
                name: name.to_string(),
                industry,
                price: Price(price),
                currency: Currency::Usd,
                features: features.iter().map(|f| f.to_string()).collect(),
                is_popular: false,
                is_premium: false,
                is_new: false,
            }
        };
        let service = |id: &str, name: &str, module_id: &str, price: Decimal| AdditionalService {
            id: id.to_string(),
            name: name.to_string(),
            module_id: module_id.to_string(),
            price: Price(price),
            currency: Currency::Usd,
            features: Vec::new(),
            is_popular: false,
            is_premium: false,
            is_new: false,
        };

        let mut shrimp = module(
            "shrimp",
            "Shrimp Farming",
            Industry::Aquaculture,
            dec!(299.00),
            &["Pond monitoring", "Feeding schedules", "Harvest planning"],
        );
        shrimp.is_popular = true;
        let tilapia = module(
            "tilapia",
            "Tilapia Farming",
            Industry::Aquaculture,
            dec!(249.00),
            &["Cage management", "Growth tracking"],
        );
        let mut salmon = module(
            "salmon",
            "Salmon Farming",
            Industry::Aquaculture,
            dec!(399.00),
            &["Sea lice control", "Biomass estimation"],
        );
        salmon.is_premium = true;
        let mut poultry = module(
            "poultry",
            "Poultry Operations",
            Industry::Poultry,
            dec!(199.00),
            &["Flock health", "Egg production"],
        );
        poultry.is_new = true;

        let mut genetics = service("genetics", "Genetics Program", "shrimp", dec!(149.00));
        genetics.is_premium = true;

        Self {
            modules: vec![shrimp, tilapia, salmon, poultry],
            services: vec![
                genetics,
                service("water-quality", "Water Quality Lab", "shrimp", dec!(89.00)),
                service("feed-optimization", "Feed Optimization", "tilapia", dec!(79.00)),
            ],
            packages: vec![
                MarketplacePackage {
                    id: "aquaculture-starter".to_string(),
                    name: "Aquaculture Starter".to_string(),
                    industry: Industry::Aquaculture,
                    price: Price(dec!(499.00)),
                    currency: Currency::Usd,
                    module_ids: vec!["shrimp".to_string(), "tilapia".to_string()],
                    features: vec!["Two species modules".to_string()],
                    is_popular: true,
                    is_premium: false,
                    is_new: false,
                },
                MarketplacePackage {
                    id: "full-farm".to_string(),
                    name: "Full Farm".to_string(),
                    industry: Industry::Aquaculture,
                    price: Price(dec!(999.00)),
                    currency: Currency::Usd,
                    module_ids: vec![
                        "shrimp".to_string(),
                        "tilapia".to_string(),
                        "salmon".to_string(),
                        "poultry".to_string(),
                    ],
                    features: vec!["Every module".to_string(), "Priority support".to_string()],
                    is_popular: false,
                    is_premium: true,
                    is_new: false,
                },
            ],
        }
    }
}

impl CatalogLookup for Catalog {
    fn module_by_id(&self, id: &str) -> Option<&MarketplaceModule> {
        self.modules.iter().find(|m| m.id == id)
    }

    fn service_by_id(&self, id: &str) -> Option<&AdditionalService> {
        self.services.iter().find(|s| s.id == id)
    }

    fn package_by_id(&self, id: &str) -> Option<&MarketplacePackage> {
        self.packages.iter().find(|p| p.id == id)
    }

    fn available_modules_for_tenant(&self, owned: &OwnedItems) -> Vec<&MarketplaceModule> {
        self.modules
            .iter()
            .filter(|m| !owned.owned_modules.contains(&m.id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ledger::ItemKind;

    #[test]
    fn test_price_validation() {
        assert!(Price::new(dec!(0)).is_ok());
        assert!(Price::new(dec!(10.50)).is_ok());
        assert!(Price::new(dec!(-0.01)).is_err());
    }

    #[test]
    fn test_builtin_lookups() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.module_by_id("shrimp").unwrap().price.value(), dec!(299.00));
        assert_eq!(catalog.service_by_id("genetics").unwrap().module_id, "shrimp");
        assert!(catalog.package_by_id("aquaculture-starter").is_some());
        assert!(catalog.module_by_id("cattle").is_none());
    }

    #[test]
    fn test_available_modules_excludes_owned_and_keeps_order() {
        let catalog = Catalog::builtin();
        let owned = OwnedItems::with_modules(["shrimp", "salmon"]);
        let ids: Vec<&str> = catalog
            .available_modules_for_tenant(&owned)
            .into_iter()
            .map(|m| m.id.as_str())
            .collect();
        assert_eq!(ids, vec!["tilapia", "poultry"]);
    }

    #[test]
    fn test_services_for_module() {
        let catalog = Catalog::builtin();
        let ids: Vec<&str> = catalog
            .services_for_module("shrimp")
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(ids, vec!["genetics", "water-quality"]);
    }

    #[test]
    fn test_module_access_through_package() {
        let catalog = Catalog::builtin();
        let mut owned = OwnedItems::with_modules(["poultry"]);
        assert!(catalog.has_module_access(&owned, "poultry"));
        assert!(!catalog.has_module_access(&owned, "tilapia"));

        owned.insert(ItemKind::Package, "aquaculture-starter");
        assert!(catalog.has_module_access(&owned, "tilapia"));
        assert!(!owned.contains(ItemKind::Module, "tilapia"));
    }

    #[test]
    fn test_from_json_rejects_negative_price() {
        let json = r#"{"modules":[{"id":"x","name":"X","industry":"poultry","price":"-1","currency":"USD"}]}"#;
        assert!(Catalog::from_json(json).is_err());
    }

    #[test]
    fn test_from_json_reads_prices() {
        let json = r#"{"modules":[{"id":"x","name":"X","industry":"poultry","price":"12.50","currency":"USD"}],
            "packages":[{"id":"p","name":"P","industry":"aquaculture","price":40,"currency":"USD","moduleIds":["x"]}]}"#;
        let catalog = Catalog::from_json(json).unwrap();
        assert_eq!(catalog.modules[0].price.value(), dec!(12.50));
        assert_eq!(catalog.packages[0].price.value(), dec!(40));
        assert_eq!(catalog.packages[0].module_ids, vec!["x".to_string()]);
    }

    #[test]
    fn test_from_json_defaults() {
        let json = r#"{"services":[{"id":"s","name":"S","moduleId":"m","price":5,"currency":"PEN"}]}"#;
        let catalog = Catalog::from_json(json).unwrap();
        assert!(catalog.modules.is_empty());
        assert_eq!(catalog.services[0].currency, Currency::Pen);
        assert!(!catalog.services[0].is_new);
    }
}
