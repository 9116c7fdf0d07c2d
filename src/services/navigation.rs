// src/services/navigation.rs
// Menu por papel: funções puras, sem I/O.

use crate::models::{
    access::{Feature, FeaturePermissions, Role},
    navigation::NavigationTab,
};

struct TabDef {
    title: &'static str,
    path: &'static str,
    icon: &'static str,
    feature: Option<Feature>,
}

const fn tab(title: &'static str, path: &'static str, icon: &'static str, feature: Option<Feature>) -> TabDef {
    TabDef { title, path, icon, feature }
}

const ADMIN_TABS: &[TabDef] = &[
    tab("Dashboard", "/", "layout-dashboard", None),
    tab("Spaces", "/spaces", "building", Some(Feature::Spaces)),
    tab("Operations", "/operations", "wrench", Some(Feature::Operations)),
    tab("Occupants", "/occupants", "users", Some(Feature::Occupants)),
    tab("Inventory", "/inventory", "boxes", Some(Feature::Inventory)),
    tab("Supply Requests", "/admin/supply-requests", "package", Some(Feature::SupplyRequests)),
    tab("Supply Room", "/supply-room", "warehouse", Some(Feature::SupplyFulfillment)),
    tab("Tasks", "/tasks", "clipboard-list", Some(Feature::Tasks)),
    tab("Access Management", "/access-management", "shield", Some(Feature::Personnel)),
    tab("Admin Profile", "/admin-profile", "user-cog", None),
];

const STANDARD_TABS: &[TabDef] = &[
    tab("Dashboard", "/dashboard", "layout-dashboard", None),
    tab("My Supply Requests", "/my-supply-requests", "package", Some(Feature::SupplyRequests)),
    tab("Supply Room", "/supply-room", "warehouse", Some(Feature::SupplyFulfillment)),
    tab("Tasks", "/tasks", "clipboard-list", Some(Feature::Tasks)),
    tab("Inventory", "/inventory", "boxes", Some(Feature::Inventory)),
    tab("Profile", "/profile", "user", None),
];

fn tabs_for(is_admin: bool) -> &'static [TabDef] {
    if is_admin { ADMIN_TABS } else { STANDARD_TABS }
}

/// Abas visíveis para o papel. Abas de área sem permissão (null) ficam de fora;
/// Dashboard e Perfil aparecem sempre.
pub fn get_role_based_navigation(permissions: &FeaturePermissions, role: Role) -> Vec<NavigationTab> {
    tabs_for(role.is_admin())
        .iter()
        .filter(|def| def.feature.is_none_or(|feature| permissions.level(feature).is_some()))
        .map(|def| NavigationTab {
            title: def.title.to_string(),
            path: def.path.to_string(),
            icon: def.icon.to_string(),
            feature: def.feature,
        })
        .collect()
}

/// Rota do item de menu. Título desconhecido devolve `None`.
pub fn get_navigation_path(title: &str, is_admin: bool) -> Option<&'static str> {
    tabs_for(is_admin)
        .iter()
        .find(|def| def.title == title)
        .map(|def| def.path)
}

/// Página inicial do papel.
pub fn home_path(role: Role) -> &'static str {
    if role.is_admin() { "/" } else { "/dashboard" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::access::AccessLevel;

    fn titles(tabs: &[NavigationTab]) -> Vec<&str> {
        tabs.iter().map(|t| t.title.as_str()).collect()
    }

    #[test]
    fn dashboard_path_depends_on_role() {
        assert_eq!(get_navigation_path("Dashboard", true), Some("/"));
        assert_eq!(get_navigation_path("Dashboard", false), Some("/dashboard"));
    }

    #[test]
    fn unmapped_title_has_no_path() {
        assert_eq!(get_navigation_path("Reports", true), None);
        assert_eq!(get_navigation_path("Access Management", false), None);
    }

    #[test]
    fn admin_sees_every_tab_by_default() {
        let tabs = get_role_based_navigation(&FeaturePermissions::for_role(Role::Admin), Role::Admin);
        assert_eq!(tabs.len(), ADMIN_TABS.len());
        assert_eq!(tabs[0].path, "/");
    }

    #[test]
    fn revoked_feature_is_hidden_for_admin() {
        let mut perms = FeaturePermissions::for_role(Role::Admin);
        perms.set(Feature::Occupants, None);
        perms.set(Feature::SupplyFulfillment, None);

        let tabs = get_role_based_navigation(&perms, Role::Admin);
        let titles = titles(&tabs);
        assert!(!titles.contains(&"Occupants"));
        assert!(!titles.contains(&"Supply Room"));
        assert!(titles.contains(&"Dashboard"));
        assert!(titles.contains(&"Admin Profile"));
        assert!(tabs.iter().all(|t| t.feature.is_none_or(|f| perms.level(f).is_some())));
    }

    #[test]
    fn standard_defaults_hide_supply_room() {
        let tabs = get_role_based_navigation(&FeaturePermissions::for_role(Role::Standard), Role::Standard);
        assert_eq!(
            titles(&tabs),
            vec!["Dashboard", "My Supply Requests", "Tasks", "Inventory", "Profile"]
        );
    }

    #[test]
    fn granting_fulfillment_shows_supply_room() {
        let mut perms = FeaturePermissions::for_role(Role::Standard);
        perms.set(Feature::SupplyFulfillment, Some(AccessLevel::Read));
        let tabs = get_role_based_navigation(&perms, Role::Standard);
        assert!(titles(&tabs).contains(&"Supply Room"));
    }

    #[test]
    fn navigation_is_deterministic() {
        let perms = FeaturePermissions::for_role(Role::Admin);
        assert_eq!(
            get_role_based_navigation(&perms, Role::Admin),
            get_role_based_navigation(&perms, Role::Admin)
        );
    }
}
