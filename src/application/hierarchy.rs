use crate::domain::hierarchy::{
    HierarchySelection, HierarchyTables, MenuEntity, MenuId, MenuOption, ScreenEntity, ScreenId,
    SubmenuEntity, SubmenuId, SubmenuOption,
};
use crate::domain::validation::{EntityDraft, FieldError, FieldRule, ScreenDraft};
use crate::error::{PortalError, Result};
use serde::Serialize;
use tracing::{debug, warn};

/// Filters and cross-checks the Menu -> Submenu -> Screen tables of a tenant.
///
/// Every query is a pure function of the tables. Empty results are valid
/// values, and unknown ids resolve to `PortalError::NotFound`.
#[derive(Debug, Clone, Default)]
pub struct HierarchyResolver {
    tables: HierarchyTables,
}

/// A screen together with its place in the effective-status report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScreenStatus {
    pub id: ScreenId,
    #[serde(rename = "nombre")]
    pub name: String,
    pub menu_id: MenuId,
    pub submenu_id: SubmenuId,
    #[serde(rename = "activo")]
    pub active: bool,
    pub effective: bool,
    /// Parent missing, or submenu attached to a different menu.
    pub orphan: bool,
}

impl HierarchyResolver {
    pub fn new(tables: HierarchyTables) -> Self {
        Self { tables }
    }

    pub fn tables(&self) -> &HierarchyTables {
        &self.tables
    }

    pub fn menu(&self, id: MenuId) -> Result<&MenuEntity> {
        self.tables
            .menus
            .iter()
            .find(|m| m.id == id)
            .ok_or_else(|| not_found(MenuId::LABEL, id))
    }

    pub fn submenu(&self, id: SubmenuId) -> Result<&SubmenuEntity> {
        self.tables
            .submenus
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| not_found(SubmenuId::LABEL, id))
    }

    pub fn screen(&self, id: ScreenId) -> Result<&ScreenEntity> {
        self.tables
            .screens
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| not_found(ScreenId::LABEL, id))
    }

    /// Active menus in table order.
    pub fn list_active_menus(&self) -> Vec<MenuOption> {
        self.tables
            .menus
            .iter()
            .filter(|m| m.active)
            .map(|m| MenuOption {
                id: m.id,
                name: m.name.clone(),
            })
            .collect()
    }

    /// Active submenus of an active menu, in table order.
    ///
    /// An unset, unknown or inactive menu yields no options.
    pub fn list_submenus_for_menu(&self, menu_id: Option<MenuId>) -> Vec<SubmenuOption> {
        let Some(menu_id) = menu_id else {
            return Vec::new();
        };
        if !self.menu(menu_id).is_ok_and(|m| m.active) {
            return Vec::new();
        }

        self.tables
            .submenus
            .iter()
            .filter(|s| s.active && s.menu_id == menu_id)
            .map(|s| SubmenuOption {
                id: s.id,
                name: s.name.clone(),
                menu_id: s.menu_id,
            })
            .collect()
    }

    /// Cascading reset: keeps `current` only if it is still an option under `new_menu`.
    pub fn on_menu_selection_change(
        &self,
        new_menu: Option<MenuId>,
        current: Option<SubmenuId>,
    ) -> Option<SubmenuId> {
        let current = current?;
        let keep = self
            .list_submenus_for_menu(new_menu)
            .iter()
            .any(|option| option.id == current);
        if keep {
            Some(current)
        } else {
            debug!(submenu = %current, menu = ?new_menu, "clearing submenu after menu change");
            None
        }
    }

    pub fn detect_hierarchy_change(
        original: HierarchySelection,
        current: HierarchySelection,
    ) -> bool {
        original.menu_id != current.menu_id || original.submenu_id != current.submenu_id
    }

    /// A screen is effectively active only if its whole ancestor chain is.
    pub fn compute_effective_status(
        screen: &ScreenEntity,
        submenu: &SubmenuEntity,
        menu: &MenuEntity,
    ) -> bool {
        screen.active && submenu.active && menu.active
    }

    /// Effective status of every screen, flagging orphans instead of failing.
    pub fn screen_statuses(&self) -> Vec<ScreenStatus> {
        self.tables
            .screens
            .iter()
            .map(|screen| {
                let parents = self
                    .submenu(screen.submenu_id)
                    .ok()
                    .zip(self.menu(screen.menu_id).ok())
                    .filter(|(submenu, menu)| submenu.menu_id == menu.id);

                let (effective, orphan) = match parents {
                    Some((submenu, menu)) => {
                        (Self::compute_effective_status(screen, submenu, menu), false)
                    }
                    None => {
                        warn!(screen = %screen.id, "screen has a broken menu/submenu chain");
                        (false, true)
                    }
                };

                ScreenStatus {
                    id: screen.id,
                    name: screen.name.clone(),
                    menu_id: screen.menu_id,
                    submenu_id: screen.submenu_id,
                    active: screen.active,
                    effective,
                    orphan,
                }
            })
            .collect()
    }

    pub fn orphan_screens(&self) -> Vec<ScreenId> {
        self.screen_statuses()
            .into_iter()
            .filter(|s| s.orphan)
            .map(|s| s.id)
            .collect()
    }
}

fn not_found(entity: &'static str, id: impl ToString) -> PortalError {
    PortalError::NotFound {
        entity,
        id: id.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormState {
    Uninitialized,
    LoadingParentOptions,
    Ready,
    SubmenuOptionsRecomputed,
    Submitted,
    Cancelled,
}

impl FormState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Submitted | Self::Cancelled)
    }
}

/// One create or edit session of the screen form.
///
/// `Uninitialized -> LoadingParentOptions -> Ready`, then every menu change
/// passes through `SubmenuOptionsRecomputed` back to `Ready`, until the form
/// is `Submitted` or `Cancelled`.
#[derive(Debug)]
pub struct FormSession<'a> {
    resolver: &'a HierarchyResolver,
    state: FormState,
    draft: ScreenDraft,
    original: Option<HierarchySelection>,
    menu_options: Vec<MenuOption>,
    submenu_options: Vec<SubmenuOption>,
}

impl<'a> FormSession<'a> {
    pub fn create(resolver: &'a HierarchyResolver) -> Self {
        Self {
            resolver,
            state: FormState::Uninitialized,
            draft: ScreenDraft::default(),
            original: None,
            menu_options: Vec::new(),
            submenu_options: Vec::new(),
        }
    }

    /// Opens an edit form prefilled from an existing screen.
    pub fn edit(resolver: &'a HierarchyResolver, screen_id: ScreenId) -> Result<Self> {
        let screen = resolver.screen(screen_id)?;
        let selection = HierarchySelection {
            menu_id: Some(screen.menu_id),
            submenu_id: Some(screen.submenu_id),
        };
        Ok(Self {
            resolver,
            state: FormState::Uninitialized,
            draft: ScreenDraft {
                entity: EntityDraft {
                    name: screen.name.clone(),
                    url: screen.url.clone(),
                    description: screen.description.clone(),
                    active: screen.active,
                },
                menu_id: selection.menu_id,
                submenu_id: selection.submenu_id,
            },
            original: Some(selection),
            menu_options: Vec::new(),
            submenu_options: Vec::new(),
        })
    }

    pub fn state(&self) -> FormState {
        self.state
    }

    pub fn draft(&self) -> &ScreenDraft {
        &self.draft
    }

    pub fn menu_options(&self) -> &[MenuOption] {
        &self.menu_options
    }

    pub fn submenu_options(&self) -> &[SubmenuOption] {
        &self.submenu_options
    }

    /// False when the tenant has no active menu to attach a screen to.
    pub fn has_menus(&self) -> bool {
        !self.menu_options.is_empty()
    }

    /// Loads the parent dropdowns and applies the cascading reset once.
    ///
    /// In edit mode a menu or submenu that no longer exists is reported as
    /// not found, and the form stays `Uninitialized`.
    pub fn load_options(&mut self) -> Result<()> {
        self.expect_state(FormState::Uninitialized, "load options")?;
        if let Some(menu_id) = self.draft.menu_id {
            self.resolver.menu(menu_id)?;
        }
        if let Some(submenu_id) = self.draft.submenu_id {
            self.resolver.submenu(submenu_id)?;
        }

        self.state = FormState::LoadingParentOptions;
        self.menu_options = self.resolver.list_active_menus();
        self.recompute_submenus();

        self.state = FormState::Ready;
        Ok(())
    }

    pub fn select_menu(&mut self, menu_id: Option<MenuId>) -> Result<()> {
        self.expect_state(FormState::Ready, "select menu")?;
        if let Some(id) = menu_id {
            self.resolver.menu(id)?;
        }

        self.state = FormState::SubmenuOptionsRecomputed;
        self.draft.menu_id = menu_id;
        self.recompute_submenus();
        self.state = FormState::Ready;
        Ok(())
    }

    /// Picks a submenu; only ids among the current options are accepted.
    pub fn select_submenu(&mut self, submenu_id: Option<SubmenuId>) -> Result<()> {
        self.expect_state(FormState::Ready, "select submenu")?;
        if let Some(id) = submenu_id {
            self.resolver.submenu(id)?;
            if !self.submenu_options.iter().any(|o| o.id == id) {
                return Err(PortalError::ValidationError(vec![FieldError::new(
                    "submenuId",
                    FieldRule::ChainMismatch,
                )]));
            }
        }
        self.draft.submenu_id = submenu_id;
        Ok(())
    }

    pub fn update_fields(&mut self, entity: EntityDraft) -> Result<()> {
        self.expect_state(FormState::Ready, "update fields")?;
        self.draft.entity = entity;
        Ok(())
    }

    /// True once an edit form's menu or submenu differs from the stored screen.
    pub fn hierarchy_changed(&self) -> bool {
        self.original.is_some_and(|original| {
            HierarchyResolver::detect_hierarchy_change(
                original,
                HierarchySelection {
                    menu_id: self.draft.menu_id,
                    submenu_id: self.draft.submenu_id,
                },
            )
        })
    }

    /// Validates the draft; on failure the form stays `Ready` for corrections.
    pub fn submit(&mut self) -> Result<ScreenDraft> {
        self.expect_state(FormState::Ready, "submit")?;
        let errors = self.draft.validate(self.resolver.tables());
        if !errors.is_empty() {
            return Err(PortalError::ValidationError(errors));
        }
        self.state = FormState::Submitted;
        Ok(self.draft.clone())
    }

    pub fn cancel(&mut self) -> Result<()> {
        if self.state.is_terminal() {
            return Err(PortalError::InvalidTransition(format!(
                "cannot cancel a form in state {:?}",
                self.state
            )));
        }
        self.state = FormState::Cancelled;
        Ok(())
    }

    fn recompute_submenus(&mut self) {
        self.submenu_options = self.resolver.list_submenus_for_menu(self.draft.menu_id);
        self.draft.submenu_id = self
            .resolver
            .on_menu_selection_change(self.draft.menu_id, self.draft.submenu_id);
    }

    fn expect_state(&self, expected: FormState, action: &str) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(PortalError::InvalidTransition(format!(
                "cannot {action} in state {:?}",
                self.state
            )))
        }
    }
}
