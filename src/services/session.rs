// src/services/session.rs

//! Guarda de sessão: estado de autenticação do cliente e para onde ele deve
//! ser redirecionado. Tudo aqui é puro; o relógio entra como parâmetro.

use std::time::{Duration, Instant};

use crate::{
    models::{
        access::Role,
        session::{SessionStatus, SessionView},
    },
    services::navigation::home_path,
};

pub const LOGIN_PATH: &str = "/login";
pub const PENDING_PATH: &str = "/verification-pending";

const PUBLIC_PATHS: &[&str] = &["/login", "/signup", "/reset-password"];
const AUTH_PAGES: &[&str] = &["/login", "/signup", "/verification-pending"];
const ADMIN_ONLY_PREFIXES: &[&str] = &[
    "/admin",
    "/admin-profile",
    "/access-management",
    "/occupants",
    "/spaces",
    "/operations",
];

/// O que se sabe do usuário depois de validar o token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthSnapshot {
    pub role: Role,
    pub verified: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Loading,
    Unauthenticated,
    PendingVerification,
    Authenticated(Role),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    /// Resultado da checagem inicial (ou periódica) da sessão
    Polled(Option<AuthSnapshot>),
    SignedIn(AuthSnapshot),
    SignedOut,
    TokenRefreshed(AuthSnapshot),
}

impl SessionState {
    pub fn from_snapshot(snapshot: Option<AuthSnapshot>) -> Self {
        match snapshot {
            None => SessionState::Unauthenticated,
            Some(s) if s.verified => SessionState::Authenticated(s.role),
            Some(_) => SessionState::PendingVerification,
        }
    }

    pub fn apply(self, event: AuthEvent) -> Self {
        match event {
            AuthEvent::Polled(snapshot) => Self::from_snapshot(snapshot),
            AuthEvent::SignedIn(snapshot) | AuthEvent::TokenRefreshed(snapshot) => Self::from_snapshot(Some(snapshot)),
            AuthEvent::SignedOut => SessionState::Unauthenticated,
        }
    }

    pub fn status(self) -> SessionStatus {
        match self {
            SessionState::Loading => SessionStatus::Loading,
            SessionState::Unauthenticated => SessionStatus::Unauthenticated,
            SessionState::PendingVerification => SessionStatus::PendingVerification,
            SessionState::Authenticated(_) => SessionStatus::Authenticated,
        }
    }

    pub fn role(self) -> Option<Role> {
        match self {
            SessionState::Authenticated(role) => Some(role),
            _ => None,
        }
    }
}

fn matches_prefix(path: &str, prefix: &str) -> bool {
    path == prefix || path.strip_prefix(prefix).is_some_and(|rest| rest.starts_with('/'))
}

pub fn is_public(path: &str) -> bool {
    PUBLIC_PATHS.iter().any(|p| matches_prefix(path, p))
}

pub fn is_admin_only(path: &str) -> bool {
    ADMIN_ONLY_PREFIXES.iter().any(|p| matches_prefix(path, p))
}

/// Para onde mandar o cliente que está em `path`; `None` = pode ficar.
pub fn redirect_for(state: SessionState, path: &str) -> Option<&'static str> {
    match state {
        SessionState::Loading => None,
        SessionState::Unauthenticated if is_public(path) => None,
        SessionState::Unauthenticated => Some(LOGIN_PATH),
        SessionState::PendingVerification if path == PENDING_PATH => None,
        SessionState::PendingVerification => Some(PENDING_PATH),
        SessionState::Authenticated(role) => {
            if AUTH_PAGES.contains(&path) {
                Some(home_path(role))
            } else if !role.is_admin() && is_admin_only(path) {
                Some(home_path(Role::Standard))
            } else {
                None
            }
        }
    }
}

pub fn session_view(state: SessionState, path: Option<&str>, debounce: Duration) -> SessionView {
    SessionView {
        status: state.status(),
        role: state.role(),
        redirect: path.and_then(|p| redirect_for(state, p)).map(str::to_string),
        home: state.role().map(|role| home_path(role).to_string()),
        redirect_debounce_ms: debounce.as_millis() as u64,
    }
}

/// Janela de coalescência dos redirecionamentos, para o lado cliente.
///
/// O servidor não guarda estado de navegação: `GET /api/session` só anuncia a
/// janela em `redirectDebounceMs`, e quem consome a API (um cliente Rust, por
/// exemplo) monta o debouncer com `for_session`.
///
/// Dentro da janela, um pedido para o mesmo destino é descartado e um destino
/// diferente fica pendente até `poll` ser chamado depois da janela.
#[derive(Debug)]
pub struct RedirectDebouncer {
    window: Duration,
    last: Option<(String, Instant)>,
    pending: Option<String>,
}

impl RedirectDebouncer {
    pub fn new(window: Duration) -> Self {
        Self { window, last: None, pending: None }
    }

    pub fn for_session(view: &SessionView) -> Self {
        Self::new(Duration::from_millis(view.redirect_debounce_ms))
    }

    fn in_window(&self, now: Instant) -> bool {
        self.last
            .as_ref()
            .is_some_and(|(_, at)| now.saturating_duration_since(*at) < self.window)
    }

    fn emit(&mut self, target: String, now: Instant) -> Option<String> {
        self.pending = None;
        self.last = Some((target.clone(), now));
        Some(target)
    }

    /// Pede um redirecionamento. Devolve o destino se ele deve acontecer agora.
    pub fn request(&mut self, target: &str, now: Instant) -> Option<String> {
        if !self.in_window(now) {
            return self.emit(target.to_string(), now);
        }

        let same_as_last = self.last.as_ref().is_some_and(|(last, _)| last == target);
        if same_as_last {
            // o último pedido vence: volta ao destino já emitido
            self.pending = None;
        } else {
            self.pending = Some(target.to_string());
        }
        None
    }

    /// Emite o destino pendente quando a janela já passou.
    pub fn poll(&mut self, now: Instant) -> Option<String> {
        if self.in_window(now) {
            return None;
        }
        let target = self.pending.take()?;
        self.emit(target, now)
    }

    pub fn pending(&self) -> Option<&str> {
        self.pending.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(300);

    fn verified(role: Role) -> AuthSnapshot {
        AuthSnapshot { role, verified: true }
    }

    #[test]
    fn loading_never_redirects() {
        assert_eq!(redirect_for(SessionState::Loading, "/spaces"), None);
    }

    #[test]
    fn anonymous_users_go_to_login_except_on_public_pages() {
        let state = SessionState::Unauthenticated;
        assert_eq!(redirect_for(state, "/tasks"), Some("/login"));
        assert_eq!(redirect_for(state, "/login"), None);
        assert_eq!(redirect_for(state, "/signup"), None);
    }

    #[test]
    fn pending_users_are_held_on_the_pending_page() {
        let state = SessionState::PendingVerification;
        assert_eq!(redirect_for(state, "/dashboard"), Some("/verification-pending"));
        assert_eq!(redirect_for(state, "/verification-pending"), None);
    }

    #[test]
    fn signed_in_users_leave_auth_pages_for_their_home() {
        assert_eq!(redirect_for(SessionState::Authenticated(Role::Admin), "/login"), Some("/"));
        assert_eq!(redirect_for(SessionState::Authenticated(Role::Standard), "/signup"), Some("/dashboard"));
        assert_eq!(
            redirect_for(SessionState::Authenticated(Role::Standard), "/verification-pending"),
            Some("/dashboard")
        );
    }

    #[test]
    fn standard_users_are_kept_out_of_admin_pages() {
        let standard = SessionState::Authenticated(Role::Standard);
        assert_eq!(redirect_for(standard, "/admin/supply-requests"), Some("/dashboard"));
        assert_eq!(redirect_for(standard, "/spaces"), Some("/dashboard"));
        assert_eq!(redirect_for(standard, "/access-management"), Some("/dashboard"));
        assert_eq!(redirect_for(standard, "/tasks"), None);
        // prefixo só casa em fronteira de segmento
        assert_eq!(redirect_for(standard, "/spaces-guide"), None);

        let admin = SessionState::Authenticated(Role::Admin);
        assert_eq!(redirect_for(admin, "/admin/supply-requests"), None);
    }

    #[test]
    fn events_drive_the_state() {
        let state = SessionState::Loading.apply(AuthEvent::Polled(None));
        assert_eq!(state, SessionState::Unauthenticated);

        let state = state.apply(AuthEvent::SignedIn(AuthSnapshot { role: Role::Standard, verified: false }));
        assert_eq!(state, SessionState::PendingVerification);

        let state = state.apply(AuthEvent::TokenRefreshed(verified(Role::Standard)));
        assert_eq!(state, SessionState::Authenticated(Role::Standard));

        let state = state.apply(AuthEvent::SignedOut);
        assert_eq!(state, SessionState::Unauthenticated);
    }

    #[test]
    fn session_view_reports_redirect_and_home() {
        let view = session_view(SessionState::Authenticated(Role::Admin), Some("/login"), WINDOW);
        assert_eq!(view.status, SessionStatus::Authenticated);
        assert_eq!(view.redirect.as_deref(), Some("/"));
        assert_eq!(view.home.as_deref(), Some("/"));
        assert_eq!(view.redirect_debounce_ms, 300);

        let view = session_view(SessionState::Unauthenticated, None, WINDOW);
        assert_eq!(view.redirect, None);
        assert_eq!(view.home, None);
    }

    #[test]
    fn first_redirect_is_immediate() {
        let mut debouncer = RedirectDebouncer::new(WINDOW);
        assert_eq!(debouncer.request("/login", Instant::now()).as_deref(), Some("/login"));
    }

    #[test]
    fn same_target_inside_window_is_dropped() {
        let mut debouncer = RedirectDebouncer::new(WINDOW);
        let t0 = Instant::now();
        debouncer.request("/login", t0);

        assert_eq!(debouncer.request("/login", t0 + Duration::from_millis(100)), None);
        assert_eq!(debouncer.pending(), None);
        assert_eq!(debouncer.poll(t0 + Duration::from_millis(400)), None);
    }

    #[test]
    fn different_target_inside_window_waits_for_poll() {
        let mut debouncer = RedirectDebouncer::new(WINDOW);
        let t0 = Instant::now();
        debouncer.request("/login", t0);

        assert_eq!(debouncer.request("/dashboard", t0 + Duration::from_millis(50)), None);
        assert_eq!(debouncer.pending(), Some("/dashboard"));
        // ainda dentro da janela
        assert_eq!(debouncer.poll(t0 + Duration::from_millis(200)), None);
        assert_eq!(debouncer.poll(t0 + Duration::from_millis(300)).as_deref(), Some("/dashboard"));
        assert_eq!(debouncer.pending(), None);
    }

    #[test]
    fn latest_pending_target_wins() {
        let mut debouncer = RedirectDebouncer::new(WINDOW);
        let t0 = Instant::now();
        debouncer.request("/login", t0);
        debouncer.request("/dashboard", t0 + Duration::from_millis(10));
        debouncer.request("/verification-pending", t0 + Duration::from_millis(20));

        assert_eq!(
            debouncer.poll(t0 + Duration::from_millis(301)).as_deref(),
            Some("/verification-pending")
        );
    }

    #[test]
    fn debouncer_follows_the_announced_window() {
        let view = session_view(SessionState::Unauthenticated, Some("/tasks"), Duration::from_millis(150));
        let mut debouncer = RedirectDebouncer::for_session(&view);
        let t0 = Instant::now();

        let target = view.redirect.as_deref().unwrap();
        assert_eq!(debouncer.request(target, t0).as_deref(), Some("/login"));
        assert_eq!(debouncer.request("/dashboard", t0 + Duration::from_millis(100)), None);
        assert_eq!(debouncer.poll(t0 + Duration::from_millis(150)).as_deref(), Some("/dashboard"));
    }

    #[test]
    fn after_window_requests_go_through() {
        let mut debouncer = RedirectDebouncer::new(WINDOW);
        let t0 = Instant::now();
        debouncer.request("/login", t0);
        assert_eq!(
            debouncer.request("/login", t0 + Duration::from_millis(350)).as_deref(),
            Some("/login")
        );
    }
}
