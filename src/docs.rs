// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,

        // --- Users / Session ---
        handlers::auth::get_me,
        handlers::session::get_session,

        // --- Navigation ---
        handlers::navigation::my_navigation,
        handlers::navigation::navigation_path,

        // --- Preferences ---
        handlers::preferences::get_preferences,
        handlers::preferences::patch_ui_preferences,
        handlers::preferences::list_tours,
        handlers::preferences::complete_tour,
        handlers::preferences::reset_tours,

        // --- Spaces ---
        handlers::spaces::list_buildings,
        handlers::spaces::create_building,
        handlers::spaces::delete_building,
        handlers::spaces::list_floors,
        handlers::spaces::create_floor,
        handlers::spaces::delete_floor,
        handlers::spaces::list_rooms,
        handlers::spaces::get_room,
        handlers::spaces::create_room,
        handlers::spaces::update_room,
        handlers::spaces::delete_room,
        handlers::spaces::list_connections,
        handlers::spaces::create_connection,
        handlers::spaces::delete_connection,

        // --- SUPPLY ---
        handlers::supply::list_inventory,
        handlers::supply::create_supply_request,
        handlers::supply::list_my_supply_requests,
        handlers::supply::get_supply_request,
        handlers::supply::get_fulfillment_board,
        handlers::supply::receive_supply_request,
        handlers::supply::start_fulfillment,
        handlers::supply::mark_ready,
        handlers::supply::complete_supply_request,
        handlers::supply::reject_supply_request,

        // --- TASKS ---
        handlers::tasks::create_task,
        handlers::tasks::list_tasks,
        handlers::tasks::list_available_tasks,
        handlers::tasks::get_task,
        handlers::tasks::claim_task,
        handlers::tasks::unclaim_task,
        handlers::tasks::assign_task,
        handlers::tasks::start_task,
        handlers::tasks::complete_task,
        handlers::tasks::cancel_task,

        // --- Personnel ---
        handlers::personnel::list_personnel,
        handlers::personnel::get_personnel,
        handlers::personnel::export_personnel_csv,
        handlers::personnel::import_personnel_csv,

        // --- Access ---
        handlers::access::list_users,
        handlers::access::set_user_role,
        handlers::access::set_user_verification,
        handlers::access::add_admin_user,

        // --- Notifications ---
        handlers::notifications::list_notifications,
        handlers::notifications::mark_notification_read,
    ),
    components(
        schemas(
            models::Priority,

            // --- Auth ---
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,

            // --- Access ---
            models::access::Role,
            models::access::VerificationStatus,
            models::access::Feature,
            models::access::AccessLevel,
            models::access::Profile,
            models::access::UserRoleRow,
            models::access::UserWithRole,
            models::access::MeResponse,
            models::access::SetRolePayload,
            models::access::SetVerificationPayload,
            models::access::AddAdminPayload,

            // --- Session / Navigation ---
            models::session::SessionStatus,
            models::session::SessionView,
            models::navigation::NavigationTab,
            models::navigation::NavigationPathResponse,

            // --- Preferences ---
            models::preferences::UserPreferences,
            models::preferences::CompleteTourPayload,
            models::preferences::PatchPreferencesPayload,
            models::preferences::TourStep,
            models::preferences::TourView,

            // --- Spaces ---
            models::spaces::RoomStatus,
            models::spaces::SpaceKind,
            models::spaces::ConnectionType,
            models::spaces::ConnectionStatus,
            models::spaces::Building,
            models::spaces::Floor,
            models::spaces::Room,
            models::spaces::SpaceRef,
            models::spaces::SpaceConnection,
            models::spaces::CreateBuildingPayload,
            models::spaces::CreateFloorPayload,
            models::spaces::CreateRoomPayload,
            models::spaces::UpdateRoomPayload,
            models::spaces::CreateConnectionPayload,

            // --- Supply ---
            models::supply::SupplyRequestStatus,
            models::supply::SupplyRequest,
            models::supply::SupplyRequestItem,
            models::supply::SupplyRequestDetail,
            models::supply::InventoryItem,
            models::supply::FulfillmentBoard,
            models::supply::SupplyItemInput,
            models::supply::CreateSupplyRequestPayload,
            models::supply::RejectSupplyRequestPayload,

            // --- Tasks ---
            models::tasks::TaskStatus,
            models::tasks::TaskType,
            models::tasks::StaffTask,
            models::tasks::CreateTaskPayload,
            models::tasks::AssignTaskPayload,

            // --- Personnel ---
            models::personnel::PersonnelProfile,
            models::personnel::PersonnelMinimal,
            models::personnel::ImportSummary,

            // --- Notifications ---
            models::notifications::AdminNotification,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação e Registro"),
        (name = "Users", description = "Dados do Usuário e Perfil"),
        (name = "Session", description = "Estado da sessão e redirecionamentos"),
        (name = "Navigation", description = "Menu por papel e permissões"),
        (name = "Preferences", description = "Tours guiados e preferências de tela"),
        (name = "Spaces", description = "Prédios, andares, salas e conexões"),
        (name = "Supply", description = "Pedidos de suprimento e almoxarifado"),
        (name = "Tasks", description = "Tarefas da equipe"),
        (name = "Personnel", description = "Cadastro de pessoal e CSV"),
        (name = "Access", description = "Gestão de acesso (somente admin)"),
        (name = "Notifications", description = "Notificações administrativas")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_the_workflow_routes() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;
        assert!(paths.contains_key("/api/tasks/{id}/claim"));
        assert!(paths.contains_key("/api/supply-requests/{id}/ready"));
        assert!(paths.contains_key("/api/session"));
    }
}
