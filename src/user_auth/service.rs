use std::collections::HashSet;
use std::sync::Arc;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::config::AuthConfig;
use crate::core_types::new_id;
use crate::error::{ServiceError, ServiceResult};
use crate::models::{Role, User};
use crate::store::UserRepository;

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // user id
    pub exp: usize,
    pub iat: usize,
}

/// User Registration Request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[serde(default)]
    #[schema(example = "Test User")]
    pub name: String,
    #[serde(default)]
    #[validate(email(message = "Invalid email address"))]
    #[schema(example = "testuser@example.com")]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    #[schema(example = "TestPass123!")]
    pub password: String,
    #[serde(default)]
    #[schema(example = "0412345678")]
    pub phone: Option<String>,
    #[serde(default)]
    #[schema(example = "Geelong")]
    pub suburb: Option<String>,
}

/// User Login Request
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    #[schema(example = "testuser@example.com")]
    pub email: String,
    #[serde(default)]
    #[schema(example = "TestPass123!")]
    pub password: String,
}

/// Auth Response (JWT)
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
}

pub struct UserAuthService {
    users: Arc<dyn UserRepository>,
    jwt_secret: String,
    token_ttl: Duration,
    bootstrap_admins: HashSet<String>,
}

impl UserAuthService {
    pub fn new(users: Arc<dyn UserRepository>, config: &AuthConfig) -> Self {
        Self {
            users,
            jwt_secret: config.jwt_secret.clone(),
            token_ttl: Duration::hours(config.token_ttl_hours.max(1)),
            bootstrap_admins: config
                .bootstrap_admins
                .iter()
                .map(|e| e.trim().to_lowercase())
                .collect(),
        }
    }

    /// Register a new user and issue a token
    pub async fn register(&self, req: RegisterRequest) -> ServiceResult<AuthResponse> {
        if req.name.trim().is_empty() || req.email.trim().is_empty() || req.password.is_empty() {
            return Err(ServiceError::validation("Name, email and password required"));
        }
        req.validate()?;

        let email = req.email.trim().to_lowercase();

        // 1. Hash password
        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(req.password.as_bytes(), &salt)
            .map_err(|e| ServiceError::Internal(format!("Hashing failed: {}", e)))?
            .to_string();

        let role = if self.bootstrap_admins.contains(&email) {
            Role::Admin
        } else {
            Role::Customer
        };

        let user = User {
            id: new_id(),
            name: req.name.trim().to_string(),
            email,
            password_hash,
            phone: req.phone.unwrap_or_default(),
            suburb: req.suburb.unwrap_or_default(),
            role,
            subscription: None,
            created_at: Utc::now(),
        };

        // 2. Insert; the store owns email uniqueness
        self.users.insert_user(user.clone()).await.map_err(|e| {
            if e.is_conflict() {
                ServiceError::Conflict("Email already registered".into())
            } else {
                e.into()
            }
        })?;

        let token = self.issue_token(user.id)?;
        Ok(AuthResponse { user, token })
    }

    /// Login user and issue JWT
    pub async fn login(&self, req: LoginRequest) -> ServiceResult<AuthResponse> {
        if req.email.trim().is_empty() || req.password.is_empty() {
            return Err(ServiceError::validation("Email and password required"));
        }

        let invalid = || ServiceError::Auth("Invalid credentials".into());

        let user = self
            .users
            .get_user_by_email(&req.email.trim().to_lowercase())
            .await?
            .ok_or_else(invalid)?;

        let parsed_hash = PasswordHash::new(&user.password_hash)
            .map_err(|e| ServiceError::Internal(format!("Invalid hash format: {}", e)))?;
        Argon2::default()
            .verify_password(req.password.as_bytes(), &parsed_hash)
            .map_err(|_| invalid())?;

        let token = self.issue_token(user.id)?;
        Ok(AuthResponse { user, token })
    }

    pub fn issue_token(&self, user_id: Uuid) -> ServiceResult<String> {
        let now = Utc::now();
        let expiration = now
            .checked_add_signed(self.token_ttl)
            .ok_or_else(|| ServiceError::Internal("token expiry overflow".into()))?;

        let claims = Claims {
            sub: user_id.to_string(),
            exp: expiration.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| ServiceError::Internal(format!("Failed to generate token: {}", e)))
    }

    /// Verify JWT token
    pub fn verify_token(&self, token: &str) -> ServiceResult<Claims> {
        let decoding_key = DecodingKey::from_secret(self.jwt_secret.as_bytes());
        let validation = Validation::new(Algorithm::HS256);
        decode::<Claims>(token, &decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|_| ServiceError::Auth("Invalid or expired token".into()))
    }

    /// Resolve a bearer token to the current user record.
    ///
    /// The role is read from the store, so a promotion applies to tokens
    /// issued before it.
    pub async fn authenticate(&self, token: &str) -> ServiceResult<User> {
        let claims = self.verify_token(token)?;
        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| ServiceError::Auth("Invalid or expired token".into()))?;
        self.users
            .get_user(user_id)
            .await?
            .ok_or_else(|| ServiceError::Auth("Unauthorized".into()))
    }

    /// Grant the admin role. Only an existing admin may do this.
    pub async fn make_admin(&self, caller: &User, email: &str) -> ServiceResult<User> {
        if !caller.is_admin() {
            return Err(ServiceError::Forbidden("Admin access required".into()));
        }
        let email = email.trim().to_lowercase();
        if email.is_empty() {
            return Err(ServiceError::validation("email is required"));
        }
        let mut user = self
            .users
            .get_user_by_email(&email)
            .await?
            .ok_or_else(|| ServiceError::not_found("User not found"))?;

        if !user.is_admin() {
            user.role = Role::Admin;
            self.users.update_user(user.clone()).await?;
        }
        tracing::info!(promoted = %user.email, by = %caller.email, "User promoted to admin");
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;

    fn service(bootstrap: &[&str]) -> UserAuthService {
        let config = AuthConfig {
            jwt_secret: "test-secret".into(),
            token_ttl_hours: 1,
            bootstrap_admins: bootstrap.iter().map(|s| s.to_string()).collect(),
        };
        UserAuthService::new(Arc::new(InMemoryStore::new()), &config)
    }

    fn register_req(email: &str) -> RegisterRequest {
        RegisterRequest {
            name: "Test User".into(),
            email: email.into(),
            password: "TestPass123!".into(),
            phone: Some("0412345678".into()),
            suburb: None,
        }
    }

    #[tokio::test]
    async fn test_register_login_roundtrip() {
        let svc = service(&[]);
        let reg = svc.register(register_req("Mixed.Case@Example.com")).await.unwrap();
        assert_eq!(reg.user.email, "mixed.case@example.com");
        assert_eq!(reg.user.role, Role::Customer);
        assert!(reg.user.password_hash.starts_with("$argon2"));

        let login = svc
            .login(LoginRequest {
                email: "MIXED.case@example.com".into(),
                password: "TestPass123!".into(),
            })
            .await
            .unwrap();
        assert_eq!(login.user.id, reg.user.id);

        let me = svc.authenticate(&login.token).await.unwrap();
        assert_eq!(me.id, reg.user.id);
    }

    #[tokio::test]
    async fn test_register_validation() {
        let svc = service(&[]);
        let mut req = register_req("a@example.com");
        req.name = String::new();
        assert!(matches!(svc.register(req).await, Err(ServiceError::Validation(_))));

        let mut req = register_req("a@example.com");
        req.password = "short".into();
        let err = svc.register(req).await.unwrap_err();
        assert_eq!(
            err,
            ServiceError::Validation("Password must be at least 8 characters".into())
        );

        let err = svc.register(register_req("not-an-email")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let svc = service(&[]);
        svc.register(register_req("dup@example.com")).await.unwrap();
        let err = svc.register(register_req("DUP@example.com")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_wrong_password_is_auth_error() {
        let svc = service(&[]);
        svc.register(register_req("pw@example.com")).await.unwrap();
        let err = svc
            .login(LoginRequest {
                email: "pw@example.com".into(),
                password: "WrongPass999".into(),
            })
            .await
            .unwrap_err();
        assert_eq!(err, ServiceError::Auth("Invalid credentials".into()));
    }

    #[tokio::test]
    async fn test_tampered_token_rejected() {
        let svc = service(&[]);
        let reg = svc.register(register_req("tok@example.com")).await.unwrap();
        let mut token = reg.token.clone();
        token.push('x');
        assert!(matches!(svc.authenticate(&token).await, Err(ServiceError::Auth(_))));
        assert!(svc.authenticate("garbage").await.is_err());
    }

    #[tokio::test]
    async fn test_make_admin_requires_admin_caller() {
        let svc = service(&["ops@freshfold.test"]);
        let admin = svc.register(register_req("OPS@freshfold.test")).await.unwrap().user;
        assert!(admin.is_admin());
        let customer = svc.register(register_req("cust@example.com")).await.unwrap().user;

        let err = svc.make_admin(&customer, "cust@example.com").await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));

        let promoted = svc.make_admin(&admin, "cust@example.com").await.unwrap();
        assert!(promoted.is_admin());

        let err = svc.make_admin(&admin, "ghost@example.com").await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }
}
