use chrono::{DateTime, Utc};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Declares a canonical integer id for one level of the hierarchy.
///
/// Ids arrive either as numbers or as numeric strings depending on the
/// source; both forms deserialize to the same value so comparisons inside
/// the core never deal with mixed representations.
macro_rules! hierarchy_id {
    ($name:ident, $label:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl $name {
            pub const LABEL: &'static str = $label;
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse().map(Self)
            }
        }

        impl From<u32> for $name {
            fn from(value: u32) -> Self {
                Self(value)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                deserializer.deserialize_any(IdVisitor).map(Self)
            }
        }
    };
}

hierarchy_id!(MenuId, "menu");
hierarchy_id!(SubmenuId, "submenu");
hierarchy_id!(ScreenId, "screen");

struct IdVisitor;

impl<'de> Visitor<'de> for IdVisitor {
    type Value = u32;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a non-negative integer id or its string form")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<u32, E> {
        u32::try_from(v).map_err(|_| E::custom(format!("id {v} out of range")))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<u32, E> {
        u32::try_from(v).map_err(|_| E::custom(format!("id {v} out of range")))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<u32, E> {
        v.trim()
            .parse()
            .map_err(|_| E::custom(format!("invalid id '{v}'")))
    }
}

/// Root of the navigation hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuEntity {
    pub id: MenuId,
    #[serde(rename = "nombre")]
    pub name: String,
    pub url: String,
    #[serde(rename = "descripcion")]
    pub description: String,
    #[serde(rename = "activo")]
    pub active: bool,
    #[serde(rename = "fechaCreacion")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "fechaActualizacion")]
    pub updated_at: DateTime<Utc>,
}

/// Second level, owned by a menu through `menu_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmenuEntity {
    pub id: SubmenuId,
    #[serde(rename = "nombre")]
    pub name: String,
    pub url: String,
    #[serde(rename = "descripcion")]
    pub description: String,
    #[serde(rename = "activo")]
    pub active: bool,
    #[serde(rename = "fechaCreacion")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "fechaActualizacion")]
    pub updated_at: DateTime<Utc>,
    #[serde(rename = "menuId")]
    pub menu_id: MenuId,
}

/// Leaf of the hierarchy ("pantalla").
///
/// `submenu_id` must point at a submenu whose own `menu_id` equals this
/// screen's `menu_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenEntity {
    pub id: ScreenId,
    #[serde(rename = "nombre")]
    pub name: String,
    pub url: String,
    #[serde(rename = "descripcion")]
    pub description: String,
    #[serde(rename = "activo")]
    pub active: bool,
    #[serde(rename = "fechaCreacion")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "fechaActualizacion")]
    pub updated_at: DateTime<Utc>,
    #[serde(rename = "menuId")]
    pub menu_id: MenuId,
    #[serde(rename = "submenuId")]
    pub submenu_id: SubmenuId,
}

/// Option shown in the menu dropdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuOption {
    pub id: MenuId,
    pub name: String,
}

/// Option shown in the submenu dropdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmenuOption {
    pub id: SubmenuId,
    pub name: String,
    pub menu_id: MenuId,
}

/// The (menu, submenu) pair currently selected in a screen form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HierarchySelection {
    pub menu_id: Option<MenuId>,
    pub submenu_id: Option<SubmenuId>,
}

impl HierarchySelection {
    pub fn new(menu_id: MenuId, submenu_id: SubmenuId) -> Self {
        Self {
            menu_id: Some(menu_id),
            submenu_id: Some(submenu_id),
        }
    }
}

/// The full per-tenant hierarchy, supplied in one piece.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HierarchyTables {
    pub menus: Vec<MenuEntity>,
    pub submenus: Vec<SubmenuEntity>,
    pub screens: Vec<ScreenEntity>,
}
