use crate::{
    config::Config,
    error::{AppError, Result},
    models::user::User,
    services::database::UserStore,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct AuthService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_lifetime: Duration,
    users: Arc<dyn UserStore>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    // 用户ID；兼容旧身份服务签发的 `userId` 字段
    #[serde(alias = "userId")]
    pub sub: String,
    pub exp: i64,
    #[serde(default)]
    pub iat: Option<i64>,
}

impl AuthService {
    pub fn new(config: &Config, users: Arc<dyn UserStore>) -> Result<Self> {
        if config.jwt_secret.is_empty() {
            return Err(AppError::internal("JWT secret is not configured"));
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            token_lifetime: Duration::hours(config.jwt_expiry_hours),
            users,
        })
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        let validation = Validation::new(Algorithm::HS256);

        match decode::<Claims>(token, &self.decoding_key, &validation) {
            Ok(token_data) => {
                debug!("JWT token verified for user: {}", token_data.claims.sub);
                Ok(token_data.claims)
            }
            Err(e) => {
                warn!("JWT verification failed: {}", e);
                Err(AppError::unauthorized("Token is not valid"))
            }
        }
    }

    /// Mints a token for `user_id`. Tokens are normally issued by the
    /// identity service; this exists for tooling and tests.
    pub fn issue_token(&self, user_id: &str) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            exp: (now + self.token_lifetime).timestamp(),
            iat: Some(now.timestamp()),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| {
            warn!("Failed to sign token for user {}: {}", user_id, e);
            AppError::internal("Failed to sign token")
        })
    }

    /// Verifies `token` and resolves its subject to a stored user.
    pub async fn authenticate(&self, token: &str) -> Result<User> {
        let claims = self.verify_token(token)?;

        match self.users.find_user(&claims.sub).await? {
            Some(user) => Ok(user),
            None => {
                warn!("Token subject {} does not match any user", claims.sub);
                Err(AppError::unauthorized("User not found"))
            }
        }
    }
}
