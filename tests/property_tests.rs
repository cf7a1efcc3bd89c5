use agroportal::application::entitlement::EntitlementWorkflow;
use agroportal::application::hierarchy::HierarchyResolver;
use agroportal::config::WorkflowConfig;
use agroportal::domain::catalog::Catalog;
use agroportal::domain::hierarchy::{
    HierarchyTables, MenuEntity, MenuId, SubmenuEntity, SubmenuId,
};
use agroportal::domain::ledger::ItemKind;
use agroportal::domain::ports::LedgerStore;
use agroportal::infrastructure::in_memory::{
    FailurePoint, InMemoryLedgerStore, RecordingNotificationSink, SimulatedPurchaseGateway,
};
use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use std::sync::Arc;
use std::time::Duration;

fn menu(id: u32, active: bool) -> MenuEntity {
    let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    MenuEntity {
        id: MenuId(id),
        name: format!("Menu {id}"),
        url: format!("/menu-{id}"),
        description: String::new(),
        active,
        created_at: at,
        updated_at: at,
    }
}

fn submenu(id: u32, menu_id: u32, active: bool) -> SubmenuEntity {
    let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    SubmenuEntity {
        id: SubmenuId(id),
        name: format!("Submenu {id}"),
        url: format!("/submenu-{id}"),
        description: String::new(),
        active,
        created_at: at,
        updated_at: at,
        menu_id: MenuId(menu_id),
    }
}

fn tables() -> impl Strategy<Value = HierarchyTables> {
    (
        prop::collection::vec(any::<bool>(), 1..6),
        prop::collection::vec((1u32..8, any::<bool>()), 0..20),
    )
        .prop_map(|(menus, submenus)| HierarchyTables {
            menus: menus
                .into_iter()
                .enumerate()
                .map(|(i, active)| menu(i as u32 + 1, active))
                .collect(),
            submenus: submenus
                .into_iter()
                .enumerate()
                .map(|(i, (menu_id, active))| submenu(i as u32 + 1, menu_id, active))
                .collect(),
            screens: Vec::new(),
        })
}

fn purchase_step() -> impl Strategy<Value = (ItemKind, &'static str, Option<FailurePoint>)> {
    let item = prop_oneof![
        Just((ItemKind::Module, "shrimp")),
        Just((ItemKind::Module, "tilapia")),
        Just((ItemKind::Service, "genetics")),
        Just((ItemKind::Service, "feed-optimization")),
        Just((ItemKind::Package, "full-farm")),
    ];
    let failure = prop_oneof![
        Just(None),
        Just(Some(FailurePoint::Purchase)),
        Just(Some(FailurePoint::Activation)),
    ];
    (item, failure).prop_map(|((kind, id), failure)| (kind, id, failure))
}

proptest! {
    #[test]
    fn test_menu_change_keeps_only_valid_submenu(
        tables in tables(),
        new_menu in prop::option::of(0u32..8),
        current in prop::option::of(0u32..22),
    ) {
        let resolver = HierarchyResolver::new(tables);
        let new_menu = new_menu.map(MenuId);
        let current = current.map(SubmenuId);

        let kept = resolver.on_menu_selection_change(new_menu, current);
        if let Some(kept) = kept {
            prop_assert_eq!(Some(kept), current);
            let option_ids: Vec<SubmenuId> = resolver
                .list_submenus_for_menu(new_menu)
                .into_iter()
                .map(|o| o.id)
                .collect();
            prop_assert!(option_ids.contains(&kept));
        }
    }

    #[test]
    fn test_submenu_options_belong_to_active_menu(tables in tables(), menu_id in 0u32..8) {
        let resolver = HierarchyResolver::new(tables);
        for option in resolver.list_submenus_for_menu(Some(MenuId(menu_id))) {
            prop_assert_eq!(option.menu_id, MenuId(menu_id));
            let parent = resolver.menu(option.menu_id).unwrap();
            prop_assert!(parent.active);
            prop_assert!(resolver.submenu(option.id).unwrap().active);
        }
    }

    #[test]
    fn test_ledger_never_shrinks(steps in prop::collection::vec(purchase_step(), 1..10)) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let ledger = Arc::new(InMemoryLedgerStore::new());
            let mut before = ledger.snapshot().await.unwrap();

            for (kind, id, failure) in steps {
                let mut gateway = SimulatedPurchaseGateway::new(Duration::ZERO, Duration::ZERO);
                if let Some(point) = failure {
                    gateway = gateway.failing_at(point);
                }
                let workflow = EntitlementWorkflow::new(
                    Arc::new(Catalog::builtin()),
                    ledger.clone(),
                    Arc::new(RecordingNotificationSink::new()),
                    Box::new(gateway),
                    WorkflowConfig::instant(),
                );

                let outcome = workflow.purchase(kind, id).await;
                let after = ledger.snapshot().await.unwrap();

                assert!(before.is_subset_of(&after));
                if outcome.is_ok() {
                    assert!(after.contains(kind, id));
                }
                if failure.is_some() {
                    assert_eq!(before, after);
                }
                before = after;
            }
        });
    }
}
