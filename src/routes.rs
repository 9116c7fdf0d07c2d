// src/routes.rs

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, patch, post, put},
    Router,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    config::AppState,
    docs::ApiDoc,
    handlers,
    middleware::auth::{auth_guard, verified_guard},
};

pub fn build_router(app_state: AppState) -> Router {
    // Rotas de autenticação (públicas)
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login));

    // Logado, mesmo sem verificação: perfil, menu, tours e preferências
    let user_routes = Router::new()
        .route("/users/me", get(handlers::auth::get_me))
        .route("/navigation", get(handlers::navigation::my_navigation))
        .route("/preferences", get(handlers::preferences::get_preferences))
        .route("/preferences/ui", patch(handlers::preferences::patch_ui_preferences))
        .route(
            "/tours",
            get(handlers::preferences::list_tours).delete(handlers::preferences::reset_tours),
        )
        .route("/tours/complete", post(handlers::preferences::complete_tour))
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    let space_routes = Router::new()
        .route(
            "/buildings",
            get(handlers::spaces::list_buildings).post(handlers::spaces::create_building),
        )
        .route("/buildings/{id}", delete(handlers::spaces::delete_building))
        .route(
            "/buildings/{id}/floors",
            get(handlers::spaces::list_floors).post(handlers::spaces::create_floor),
        )
        .route("/floors/{id}", delete(handlers::spaces::delete_floor))
        .route("/floors/{id}/rooms", get(handlers::spaces::list_rooms))
        .route("/rooms", post(handlers::spaces::create_room))
        .route(
            "/rooms/{id}",
            get(handlers::spaces::get_room)
                .patch(handlers::spaces::update_room)
                .delete(handlers::spaces::delete_room),
        )
        .route(
            "/connections",
            get(handlers::spaces::list_connections).post(handlers::spaces::create_connection),
        )
        .route("/connections/{id}", delete(handlers::spaces::delete_connection));

    let supply_routes = Router::new()
        .route("/inventory", get(handlers::supply::list_inventory))
        .route("/supply-requests", post(handlers::supply::create_supply_request))
        .route("/supply-requests/mine", get(handlers::supply::list_my_supply_requests))
        .route("/supply-requests/board", get(handlers::supply::get_fulfillment_board))
        .route("/supply-requests/{id}", get(handlers::supply::get_supply_request))
        .route("/supply-requests/{id}/receive", post(handlers::supply::receive_supply_request))
        .route("/supply-requests/{id}/start", post(handlers::supply::start_fulfillment))
        .route("/supply-requests/{id}/ready", post(handlers::supply::mark_ready))
        .route("/supply-requests/{id}/complete", post(handlers::supply::complete_supply_request))
        .route("/supply-requests/{id}/reject", post(handlers::supply::reject_supply_request));

    let task_routes = Router::new()
        .route("/tasks", get(handlers::tasks::list_tasks).post(handlers::tasks::create_task))
        .route("/tasks/available", get(handlers::tasks::list_available_tasks))
        .route("/tasks/{id}", get(handlers::tasks::get_task))
        .route("/tasks/{id}/claim", post(handlers::tasks::claim_task))
        .route("/tasks/{id}/unclaim", post(handlers::tasks::unclaim_task))
        .route("/tasks/{id}/assign", post(handlers::tasks::assign_task))
        .route("/tasks/{id}/start", post(handlers::tasks::start_task))
        .route("/tasks/{id}/complete", post(handlers::tasks::complete_task))
        .route("/tasks/{id}/cancel", post(handlers::tasks::cancel_task));

    let personnel_routes = Router::new()
        .route("/personnel", get(handlers::personnel::list_personnel))
        .route("/personnel/export", get(handlers::personnel::export_personnel_csv))
        .route("/personnel/import", post(handlers::personnel::import_personnel_csv))
        .route("/personnel/{id}", get(handlers::personnel::get_personnel));

    let admin_routes = Router::new()
        .route("/access/users", get(handlers::access::list_users))
        .route("/access/users/{id}/role", put(handlers::access::set_user_role))
        .route("/access/users/{id}/verification", put(handlers::access::set_user_verification))
        .route("/access/admins", post(handlers::access::add_admin_user))
        .route("/notifications", get(handlers::notifications::list_notifications))
        .route("/notifications/{id}/read", post(handlers::notifications::mark_notification_read));

    // Rotas de trabalho: token válido + cadastro verificado.
    // A última camada roda primeiro, então auth_guard precede verified_guard.
    let work_routes = Router::new()
        .merge(space_routes)
        .merge(supply_routes)
        .merge(task_routes)
        .merge(personnel_routes)
        .merge(admin_routes)
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), verified_guard))
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/session", get(handlers::session::get_session))
        .route("/api/navigation/path", get(handlers::navigation::navigation_path))
        .nest("/api/auth", auth_routes)
        .nest("/api", user_routes.merge(work_routes))
        .with_state(app_state)
}
