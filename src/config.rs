// src/config.rs

use std::{env, str::FromStr, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    common::{cache::QueryCache, i18n::I18nStore},
    db::{
        AccessRepository, InventoryRepository, NotificationRepository, PersonnelRepository,
        PreferencesRepository, SpaceRepository, SupplyRepository, TaskRepository, UserRepository,
    },
    services::{
        access_service::AccessService, auth::AuthService,
        notification_service::NotificationService, personnel_service::PersonnelService,
        preference_service::PreferenceService, space_service::SpaceService,
        supply_service::SupplyService, task_service::TaskService,
    },
};

// Configuração lida do ambiente (.env em desenvolvimento)
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub db_max_connections: u32,
    pub db_acquire_timeout: Duration,
    pub token_ttl_days: i64,
    pub cache_ttl: Duration,
    pub cache_max_capacity: u64,
    pub redirect_debounce: Duration,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Monta a configuração a partir de qualquer fonte chave/valor.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let jwt_secret = lookup("JWT_SECRET").context("JWT_SECRET deve ser definido")?;
        if jwt_secret.len() < 16 {
            anyhow::bail!("JWT_SECRET deve ter pelo menos 16 caracteres");
        }

        Ok(Self {
            database_url,
            jwt_secret,
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 5)?,
            db_acquire_timeout: Duration::from_secs(parse_or(&lookup, "DB_ACQUIRE_TIMEOUT_SECS", 3)?),
            token_ttl_days: parse_or(&lookup, "TOKEN_TTL_DAYS", 7)?,
            cache_ttl: Duration::from_secs(parse_or(&lookup, "CACHE_TTL_SECS", 30)?),
            cache_max_capacity: parse_or(&lookup, "CACHE_MAX_CAPACITY", 1_000)?,
            redirect_debounce: Duration::from_millis(parse_or(&lookup, "REDIRECT_DEBOUNCE_MS", 300)?),
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("Valor inválido para {}: {} ({})", key, raw, e)),
        None => Ok(default),
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub config: Arc<AppConfig>,
    pub i18n_store: Arc<I18nStore>,
    pub cache: QueryCache,
    pub auth_service: AuthService,
    pub access_service: AccessService,
    pub notification_service: NotificationService,
    pub supply_service: SupplyService,
    pub task_service: TaskService,
    pub space_service: SpaceService,
    pub personnel_service: PersonnelService,
    pub preference_service: PreferenceService,
}

impl AppState {
    pub async fn new(config: AppConfig) -> anyhow::Result<Self> {
        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(config.db_acquire_timeout)
            .connect(&config.database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        Self::from_pool(db_pool, config)
    }

    // --- Monta o gráfico de dependências ---
    pub fn from_pool(db_pool: PgPool, config: AppConfig) -> anyhow::Result<Self> {
        let i18n_store = Arc::new(I18nStore::load_embedded()?);
        let cache = QueryCache::new(config.cache_max_capacity, config.cache_ttl);

        let notification_service =
            NotificationService::new(NotificationRepository::new(db_pool.clone()));

        let auth_service = AuthService::new(
            UserRepository::new(db_pool.clone()),
            AccessRepository::new(db_pool.clone()),
            NotificationRepository::new(db_pool.clone()),
            config.jwt_secret.clone(),
            config.token_ttl_days,
            db_pool.clone(),
        );

        let access_service = AccessService::new(
            AccessRepository::new(db_pool.clone()),
            NotificationRepository::new(db_pool.clone()),
        );

        let supply_service = SupplyService::new(
            SupplyRepository::new(),
            InventoryRepository::new(db_pool.clone()),
            NotificationRepository::new(db_pool.clone()),
            cache.clone(),
        );

        let task_service = TaskService::new(Arc::new(TaskRepository::new(db_pool.clone())));

        let space_service = SpaceService::new(SpaceRepository::new(db_pool.clone()), cache.clone());

        let personnel_service =
            PersonnelService::new(PersonnelRepository::new(db_pool.clone()), cache.clone());

        let preference_service = PreferenceService::new(PreferencesRepository::new());

        Ok(Self {
            db_pool,
            config: Arc::new(config),
            i18n_store,
            cache,
            auth_service,
            access_service,
            notification_service,
            supply_service,
            task_service,
            space_service,
            personnel_service,
            preference_service,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_optional_vars_are_missing() {
        let config = AppConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/facilities"),
            ("JWT_SECRET", "0123456789abcdef0123"),
        ]))
        .unwrap();

        assert_eq!(config.bind_addr, "0.0.0.0:3000");
        assert_eq!(config.db_max_connections, 5);
        assert_eq!(config.redirect_debounce, Duration::from_millis(300));
        assert_eq!(config.token_ttl_days, 7);
    }

    #[test]
    fn missing_database_url_is_an_error() {
        let err = AppConfig::from_lookup(lookup(&[("JWT_SECRET", "0123456789abcdef0123")]))
            .unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn short_jwt_secret_is_rejected() {
        let result = AppConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/facilities"),
            ("JWT_SECRET", "curto"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn malformed_numbers_are_reported() {
        let err = AppConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/facilities"),
            ("JWT_SECRET", "0123456789abcdef0123"),
            ("REDIRECT_DEBOUNCE_MS", "rápido"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("REDIRECT_DEBOUNCE_MS"));
    }
}
