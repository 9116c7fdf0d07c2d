// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{AccessRepository, NotificationRepository, UserRepository},
    models::{
        access::{AuthContext, FeaturePermissions, Role},
        auth::{Claims, RegisterUserPayload, User},
        notifications::NEW_USER_PENDING,
    },
};

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    access_repo: AccessRepository,
    notification_repo: NotificationRepository,
    jwt_secret: String,
    token_ttl_days: i64,
    pool: PgPool,
}

impl AuthService {
    pub fn new(
        user_repo: UserRepository,
        access_repo: AccessRepository,
        notification_repo: NotificationRepository,
        jwt_secret: String,
        token_ttl_days: i64,
        pool: PgPool,
    ) -> Self {
        Self { user_repo, access_repo, notification_repo, jwt_secret, token_ttl_days, pool }
    }

    pub async fn register_user(&self, payload: &RegisterUserPayload) -> Result<String, AppError> {
        // 1. Hashing (fora da transação, não toca no banco)
        let password_clone = payload.password.clone();
        let hashed_password = tokio::task::spawn_blocking(move || hash(&password_clone, bcrypt::DEFAULT_COST))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;

        // --- INÍCIO DA TRANSAÇÃO ---
        let mut tx = self.pool.begin().await?;

        // 2. Cria Usuário
        let new_user = self
            .user_repo
            .create_user(&mut *tx, &payload.email, &hashed_password)
            .await?;

        // 3. Perfil (aguardando verificação) e papel padrão
        let profile = self
            .access_repo
            .create_profile(
                &mut *tx,
                new_user.id,
                &new_user.email,
                &payload.first_name,
                &payload.last_name,
                payload.department.as_deref(),
            )
            .await?;

        self.access_repo
            .create_user_role(&mut *tx, new_user.id, Role::Standard)
            .await?;

        // 4. Avisa os administradores
        self.notification_repo
            .emit(
                &mut *tx,
                NEW_USER_PENDING,
                &format!("{} aguarda verificação", profile.full_name()),
                Some(new_user.id),
                json!({ "email": new_user.email, "department": profile.department }),
            )
            .await?;

        tx.commit().await?;
        // --- FIM DA TRANSAÇÃO ---

        tracing::info!(user_id = %new_user.id, "novo usuário registrado, aguardando verificação");

        // 5. Gera o token
        self.create_token(new_user.id)
    }

    pub async fn login_user(&self, email: &str, password: &str) -> Result<String, AppError> {
        let user = self
            .user_repo
            .find_by_email(email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let password_clone = password.to_owned();
        let password_hash_clone = user.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid =
            tokio::task::spawn_blocking(move || verify(&password_clone, &password_hash_clone))
                .await
                .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }

        self.create_token(user.id)
    }

    pub fn decode_claims(&self, token: &str) -> Result<Claims, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidToken)?;
        Ok(token_data.claims)
    }

    pub async fn validate_token(&self, token: &str) -> Result<User, AppError> {
        let claims = self.decode_claims(token)?;

        self.user_repo
            .find_by_id(claims.sub)
            .await?
            .ok_or(AppError::UserNotFound)
    }

    /// Usuário + perfil + papel + permissões efetivas.
    pub async fn load_context(&self, token: &str) -> Result<AuthContext, AppError> {
        let user = self.validate_token(token).await?;

        let profile = self
            .access_repo
            .find_profile(user.id)
            .await?
            .ok_or(AppError::UserNotFound)?;

        // Sem linha em user_roles = usuário padrão
        let (role, permissions) = match self.access_repo.find_role(user.id).await? {
            Some(row) => (row.role, row.effective_permissions()),
            None => (Role::Standard, FeaturePermissions::for_role(Role::Standard)),
        };

        Ok(AuthContext { user, profile, role, permissions })
    }

    pub fn create_token(&self, user_id: Uuid) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::days(self.token_ttl_days);

        let claims = Claims {
            sub: user_id,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    fn service(secret: &str) -> AuthService {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/facilities_test")
            .unwrap();
        AuthService::new(
            UserRepository::new(pool.clone()),
            AccessRepository::new(pool.clone()),
            NotificationRepository::new(pool.clone()),
            secret.to_string(),
            7,
            pool,
        )
    }

    #[tokio::test]
    async fn issued_token_decodes_to_same_subject() {
        let auth = service("segredo-de-teste-com-tamanho");
        let user_id = Uuid::new_v4();

        let token = auth.create_token(user_id).unwrap();
        let claims = auth.decode_claims(&token).unwrap();

        assert_eq!(claims.sub, user_id);
        let seven_days = 7 * 24 * 60 * 60;
        assert_eq!(claims.exp - claims.iat, seven_days);
    }

    #[tokio::test]
    async fn token_signed_with_other_secret_is_rejected() {
        let issuer = service("primeiro-segredo-0123456789");
        let verifier = service("segundo-segredo-0123456789");

        let token = issuer.create_token(Uuid::new_v4()).unwrap();
        assert!(matches!(verifier.decode_claims(&token), Err(AppError::InvalidToken)));
    }

    #[tokio::test]
    async fn garbage_token_is_rejected() {
        let auth = service("segredo-de-teste-com-tamanho");
        assert!(matches!(auth.decode_claims("nao.e.jwt"), Err(AppError::InvalidToken)));
    }
}
