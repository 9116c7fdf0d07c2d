// src/services/tours.rs
// Catálogo estático dos tours de boas-vindas, por rota.

use crate::models::preferences::{TourStep, TourView};

pub struct Tour {
    pub route: &'static str,
    pub steps: &'static [TourStep],
}

const fn step(target: &'static str, title: &'static str, content: &'static str) -> TourStep {
    TourStep { target, title, content }
}

pub static TOURS: &[Tour] = &[
    Tour {
        route: "/",
        steps: &[
            step("[data-tour='admin-stats']", "Overview", "Building occupancy, open issues and pending requests at a glance."),
            step("[data-tour='admin-notifications']", "Notifications", "New supply requests and users awaiting verification show up here."),
            step("[data-tour='sidebar']", "Navigation", "Every module you have access to is listed in the sidebar."),
        ],
    },
    Tour {
        route: "/dashboard",
        steps: &[
            step("[data-tour='my-requests']", "Your requests", "Track the supply requests you submitted."),
            step("[data-tour='my-tasks']", "Your tasks", "Tasks you claimed or were assigned appear here."),
        ],
    },
    Tour {
        route: "/spaces",
        steps: &[
            step("[data-tour='building-select']", "Buildings", "Pick a building to browse its floors."),
            step("[data-tour='floor-list']", "Floors", "Each floor lists its rooms, hallways and doors."),
            step("[data-tour='connections']", "Connections", "Link rooms to hallways and doors to map how spaces connect."),
        ],
    },
    Tour {
        route: "/tasks",
        steps: &[
            step("[data-tour='available-tasks']", "Available tasks", "Approved tasks nobody has claimed yet."),
            step("[data-tour='claim-button']", "Claim", "Claim a task to take ownership; only one person can hold it."),
            step("[data-tour='my-tasks']", "In progress", "Start and complete the tasks you hold."),
        ],
    },
    Tour {
        route: "/supply-room",
        steps: &[
            step("[data-tour='new-orders']", "New orders", "Submitted and received requests waiting to be picked."),
            step("[data-tour='in-progress']", "Picking", "Requests being gathered from the shelves."),
            step("[data-tour='ready']", "Ready for pickup", "Marking a request ready deducts its items from stock."),
        ],
    },
    Tour {
        route: "/my-supply-requests",
        steps: &[
            step("[data-tour='new-request']", "New request", "Choose items from inventory and set a priority."),
            step("[data-tour='request-status']", "Status", "Follow your request from submitted to completed."),
        ],
    },
    Tour {
        route: "/access-management",
        steps: &[
            step("[data-tour='pending-users']", "Pending users", "Verify new accounts before they can use the system."),
            step("[data-tour='role-select']", "Roles", "Promote users to admin or adjust per-feature permissions."),
        ],
    },
];

pub fn find_tour(route: &str) -> Option<&'static Tour> {
    TOURS.iter().find(|tour| tour.route == route)
}

/// Todos os tours, marcando os já concluídos.
pub fn tour_views(completed: &[String]) -> Vec<TourView> {
    TOURS
        .iter()
        .map(|tour| TourView {
            route: tour.route,
            steps: tour.steps.to_vec(),
            completed: completed.iter().any(|route| route == tour.route),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_routes_have_steps() {
        for route in ["/", "/dashboard", "/spaces", "/tasks", "/supply-room", "/my-supply-requests", "/access-management"] {
            let tour = find_tour(route).unwrap_or_else(|| panic!("sem tour para {route}"));
            assert!(!tour.steps.is_empty());
        }
    }

    #[test]
    fn unknown_route_has_no_tour() {
        assert!(find_tour("/nao-existe").is_none());
    }

    #[test]
    fn views_flag_completed_routes() {
        let views = tour_views(&["/spaces".to_string()]);
        assert_eq!(views.len(), TOURS.len());
        assert!(views.iter().find(|v| v.route == "/spaces").unwrap().completed);
        assert!(!views.iter().find(|v| v.route == "/tasks").unwrap().completed);
    }
}
