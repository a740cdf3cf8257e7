use crate::config::Config;
use crate::errors::ApiError;
use crate::schemas::UserId;
use actix_web::{http::header::HeaderValue, HttpRequest};
use argon2::{
    password_hash::{Error as PasswordHashError, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, Params,
};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::{error, warn};

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, PartialEq)]
pub enum AuthorizationLevel {
    Service,
    User(UserId),
}

impl AuthorizationLevel {
    /// The service token may act on any user, a user token only on itself.
    pub fn ensure_access(&self, user_id: &str) -> Result<(), ApiError> {
        match self {
            AuthorizationLevel::Service => Ok(()),
            AuthorizationLevel::User(id) if id == user_id => Ok(()),
            AuthorizationLevel::User(id) => {
                warn!(token_user = %id, requested = %user_id, "Cross-user access denied");
                Err(ApiError::Forbidden)
            }
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    exp: usize,
    iat: usize,
}

#[derive(Clone)]
pub struct Authenticator {
    secret: Vec<u8>,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    token_ttl: Duration,
    service_token: Option<String>,
    hasher: Argon2<'static>,
}

impl Authenticator {
    /// `hash_time_cost` is the argon2 iteration count for new hashes.
    /// Existing hashes are verified with the parameters they carry.
    pub fn new(
        secret: impl Into<Vec<u8>>,
        token_ttl: Duration,
        service_token: Option<String>,
        hash_time_cost: u32,
    ) -> Result<Self, argon2::Error> {
        let secret = secret.into();
        let params = Params::new(
            Params::DEFAULT_M_COST,
            hash_time_cost,
            Params::DEFAULT_P_COST,
            None,
        )?;
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);
        Ok(Authenticator {
            encoding_key: EncodingKey::from_secret(&secret),
            decoding_key: DecodingKey::from_secret(&secret),
            secret,
            validation,
            token_ttl,
            service_token,
            hasher: Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params),
        })
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self::new(
            config.token_secret.as_bytes(),
            Duration::seconds(config.token_ttl_secs),
            config.service_api_token.clone(),
            config.password_hash_time_cost,
        )?)
    }

    pub fn issue_token(&self, user_id: &str) -> Result<String, ApiError> {
        self.issue_token_at(user_id, Utc::now())
    }

    fn issue_token_at(&self, user_id: &str, now: DateTime<Utc>) -> Result<String, ApiError> {
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp() as usize,
            exp: (now + self.token_ttl).timestamp() as usize,
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| ApiError::Internal(format!("Failed to sign token: {e}")))
    }

    /// Returns the user the token was issued for, if the signature holds and
    /// the token has not expired.
    pub fn verify_token(&self, token: &str) -> Option<UserId> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .ok()
            .map(|data| data.claims.sub)
            .filter(|user_id| !user_id.is_empty())
    }

    // Both sides go through the MAC so the comparison runs in constant time.
    fn is_service_token(&self, token: &str) -> bool {
        let Some(service_token) = &self.service_token else {
            return false;
        };
        let mut expected = self.mac();
        expected.update(service_token.as_bytes());
        let expected = expected.finalize().into_bytes();

        let mut presented = self.mac();
        presented.update(token.as_bytes());
        presented.verify_slice(&expected).is_ok()
    }

    fn mac(&self) -> HmacSha256 {
        HmacSha256::new_from_slice(&self.secret).expect("HMAC can take a key of any size")
    }

    pub fn check_authorization_level(&self, request: &HttpRequest) -> Option<AuthorizationLevel> {
        let authorization = request
            .headers()
            .get(actix_web::http::header::AUTHORIZATION)
            .map(HeaderValue::to_str)?
            .ok()?;
        let token = authorization
            .strip_prefix("Bearer ")
            .unwrap_or(authorization)
            .trim();
        if self.is_service_token(token) {
            return Some(AuthorizationLevel::Service);
        }
        self.verify_token(token).map(AuthorizationLevel::User)
    }

    pub fn authorize(&self, request: &HttpRequest) -> Result<AuthorizationLevel, ApiError> {
        self.check_authorization_level(request).ok_or_else(|| {
            warn!(path = %request.path(), "Missing or invalid credentials");
            ApiError::Unauthorized("Authentication required".to_string())
        })
    }

    /// Authorizes the request and checks it may act on `user_id`.
    pub fn authorize_user(&self, request: &HttpRequest, user_id: &str) -> Result<(), ApiError> {
        self.authorize(request)?.ensure_access(user_id)
    }

    /// Argon2id hash in PHC string form, with a fresh random salt.
    pub fn hash_password(&self, password: &str) -> Result<String, ApiError> {
        let salt = SaltString::generate(&mut OsRng);
        self.hasher
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| ApiError::Internal(format!("Failed to hash password: {e}")))
    }

    /// `Ok(false)` on a wrong password; an unreadable stored hash is an error.
    pub fn verify_password(&self, password: &str, encoded: &str) -> Result<bool, ApiError> {
        let parsed = PasswordHash::new(encoded).map_err(|e| {
            error!("Stored password hash is unreadable: {e}");
            ApiError::Internal(format!("Invalid stored password hash: {e}"))
        })?;
        match self.hasher.verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(PasswordHashError::Password) => Ok(false),
            Err(other) => Err(ApiError::Internal(format!(
                "Password verification failed: {other}"
            ))),
        }
    }
}
