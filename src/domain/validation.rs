use crate::domain::hierarchy::{HierarchyTables, MenuId, SubmenuId};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

static URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/[a-z0-9\-/]*$").expect("valid url pattern"));

pub const NAME_MIN_LEN: usize = 3;
pub const NAME_MAX_LEN: usize = 100;
pub const DESCRIPTION_MAX_LEN: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "rule")]
pub enum FieldRule {
    Required,
    MinLength { min: usize },
    MaxLength { max: usize },
    Pattern,
    /// The submenu does not belong to the selected menu.
    ChainMismatch,
    /// The referenced parent no longer exists.
    UnknownReference,
}

/// A single failed rule on a single form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub rule: FieldRule,
}

impl FieldError {
    pub fn new(field: &'static str, rule: FieldRule) -> Self {
        Self { field, rule }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.rule {
            FieldRule::Required => write!(f, "{} is required", self.field),
            FieldRule::MinLength { min } => {
                write!(f, "{} must be at least {min} characters", self.field)
            }
            FieldRule::MaxLength { max } => {
                write!(f, "{} must be at most {max} characters", self.field)
            }
            FieldRule::Pattern => write!(f, "{} has an invalid format", self.field),
            FieldRule::ChainMismatch => {
                write!(f, "{} does not belong to the selected menu", self.field)
            }
            FieldRule::UnknownReference => write!(f, "{} does not exist", self.field),
        }
    }
}

/// Fields shared by the menu, submenu and screen forms.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDraft {
    #[serde(rename = "nombre")]
    pub name: String,
    pub url: String,
    #[serde(rename = "descripcion", default)]
    pub description: String,
    #[serde(rename = "activo", default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl EntityDraft {
    /// Checks every field and reports all failures, not just the first.
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();

        let name = self.name.trim();
        let name_len = name.chars().count();
        if name.is_empty() {
            errors.push(FieldError::new("nombre", FieldRule::Required));
        } else if name_len < NAME_MIN_LEN {
            errors.push(FieldError::new(
                "nombre",
                FieldRule::MinLength { min: NAME_MIN_LEN },
            ));
        } else if name_len > NAME_MAX_LEN {
            errors.push(FieldError::new(
                "nombre",
                FieldRule::MaxLength { max: NAME_MAX_LEN },
            ));
        }

        let url = self.url.trim();
        if url.is_empty() {
            errors.push(FieldError::new("url", FieldRule::Required));
        } else if !URL_PATTERN.is_match(url) {
            errors.push(FieldError::new("url", FieldRule::Pattern));
        }

        if self.description.chars().count() > DESCRIPTION_MAX_LEN {
            errors.push(FieldError::new(
                "descripcion",
                FieldRule::MaxLength {
                    max: DESCRIPTION_MAX_LEN,
                },
            ));
        }

        errors
    }
}

/// The screen form: common fields plus its place in the hierarchy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenDraft {
    #[serde(flatten)]
    pub entity: EntityDraft,
    #[serde(rename = "menuId")]
    pub menu_id: Option<MenuId>,
    #[serde(rename = "submenuId")]
    pub submenu_id: Option<SubmenuId>,
}

impl ScreenDraft {
    /// Validates the common fields and the menu/submenu chain against `tables`.
    pub fn validate(&self, tables: &HierarchyTables) -> Vec<FieldError> {
        let mut errors = self.entity.validate();

        let menu = match self.menu_id {
            None => {
                errors.push(FieldError::new("menuId", FieldRule::Required));
                None
            }
            Some(id) => {
                let menu = tables.menus.iter().find(|m| m.id == id);
                if menu.is_none() {
                    errors.push(FieldError::new("menuId", FieldRule::UnknownReference));
                }
                menu
            }
        };

        match self.submenu_id {
            None => errors.push(FieldError::new("submenuId", FieldRule::Required)),
            Some(id) => match tables.submenus.iter().find(|s| s.id == id) {
                None => errors.push(FieldError::new("submenuId", FieldRule::UnknownReference)),
                Some(submenu) => {
                    if let Some(menu) = menu
                        && submenu.menu_id != menu.id
                    {
                        errors.push(FieldError::new("submenuId", FieldRule::ChainMismatch));
                    }
                }
            },
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::hierarchy::{MenuEntity, SubmenuEntity};
    use chrono::Utc;

    fn draft(name: &str, url: &str) -> EntityDraft {
        EntityDraft {
            name: name.to_string(),
            url: url.to_string(),
            description: String::new(),
            active: true,
        }
    }

    fn tables() -> HierarchyTables {
        let now = Utc::now();
        let menu = |id: u32| MenuEntity {
            id: MenuId(id),
            name: format!("Menu {id}"),
            url: format!("/m{id}"),
            description: String::new(),
            active: true,
            created_at: now,
            updated_at: now,
        };
        let submenu = |id: u32, menu_id: u32| SubmenuEntity {
            id: SubmenuId(id),
            name: format!("Submenu {id}"),
            url: format!("/s{id}"),
            description: String::new(),
            active: true,
            created_at: now,
            updated_at: now,
            menu_id: MenuId(menu_id),
        };
        HierarchyTables {
            menus: vec![menu(1), menu(2)],
            submenus: vec![submenu(10, 1), submenu(20, 2)],
            screens: Vec::new(),
        }
    }

    #[test]
    fn test_valid_entity() {
        assert!(draft("Estanques", "/estanques/lista").validate().is_empty());
    }

    #[test]
    fn test_reports_every_failing_field() {
        let errors = draft("ab", "no-slash").validate();
        assert_eq!(
            errors,
            vec![
                FieldError::new("nombre", FieldRule::MinLength { min: 3 }),
                FieldError::new("url", FieldRule::Pattern),
            ]
        );
    }

    #[test]
    fn test_required_fields() {
        let errors = draft("   ", "").validate();
        assert!(errors.contains(&FieldError::new("nombre", FieldRule::Required)));
        assert!(errors.contains(&FieldError::new("url", FieldRule::Required)));
    }

    #[test]
    fn test_description_limit() {
        let mut d = draft("Estanques", "/estanques");
        d.description = "x".repeat(DESCRIPTION_MAX_LEN + 1);
        assert_eq!(d.validate().len(), 1);
    }

    #[test]
    fn test_screen_chain_mismatch_rejected() {
        let screen = ScreenDraft {
            entity: draft("Alimentacion", "/alimentacion"),
            menu_id: Some(MenuId(1)),
            submenu_id: Some(SubmenuId(20)),
        };
        assert_eq!(
            screen.validate(&tables()),
            vec![FieldError::new("submenuId", FieldRule::ChainMismatch)]
        );
    }

    #[test]
    fn test_screen_consistent_chain_accepted() {
        let screen = ScreenDraft {
            entity: draft("Alimentacion", "/alimentacion"),
            menu_id: Some(MenuId(2)),
            submenu_id: Some(SubmenuId(20)),
        };
        assert!(screen.validate(&tables()).is_empty());
    }

    #[test]
    fn test_screen_missing_and_unknown_parents() {
        let screen = ScreenDraft {
            entity: draft("Alimentacion", "/alimentacion"),
            menu_id: Some(MenuId(99)),
            submenu_id: None,
        };
        assert_eq!(
            screen.validate(&tables()),
            vec![
                FieldError::new("menuId", FieldRule::UnknownReference),
                FieldError::new("submenuId", FieldRule::Required),
            ]
        );
    }
}
