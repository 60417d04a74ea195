use chrono::Duration;
use chrono::Utc;
use hmac::{Hmac, Mac};
use jwt::SignWithKey;
use jwt::VerifyWithKey;
use serde::Deserialize;
use serde::Serialize;
use sha2::Sha256;

use crate::database::schema::User;
use crate::error::FoodgramError;
use crate::schema::UserRole;

use super::permissions::ActionType;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JwtSessionData {
    pub user_id: i32,
    pub role: UserRole,
    iat: i64,
    exp: i64,
}

impl JwtSessionData {
    pub fn new(id: i32, role: UserRole, lifetime: Duration) -> Self {
        let now = Utc::now();
        let iat = now.timestamp();
        let exp = (now + lifetime).timestamp();

        Self {
            user_id: id,
            role,
            iat,
            exp,
        }
    }
}

/// Authenticated actor resolved from a request token.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SessionData {
    pub user_id: i32,
    pub role: UserRole,
    pub is_admin: bool,
}

impl SessionData {
    pub fn authenticate(&self, action: ActionType) -> Result<(), FoodgramError> {
        if !action.authenticate(self) {
            return Err(FoodgramError::Forbidden);
        }
        Ok(())
    }
}

impl From<JwtSessionData> for SessionData {
    fn from(value: JwtSessionData) -> Self {
        SessionData {
            user_id: value.user_id,
            is_admin: value.role == UserRole::Admin,
            role: value.role,
        }
    }
}

#[derive(Clone)]
pub struct TokenIssuer {
    key: Hmac<Sha256>,
    lifetime: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &[u8], lifetime: Duration) -> Result<Self, FoodgramError> {
        let key: Hmac<Sha256> = Hmac::new_from_slice(secret)
            .map_err(|_| FoodgramError::validation("Invalid token secret"))?;

        Ok(Self { key, lifetime })
    }

    pub fn issue(&self, user: &User) -> Result<String, FoodgramError> {
        let claims = JwtSessionData::new(user.id, user.role.to_owned(), self.lifetime);
        self.sign(&claims)
    }

    fn sign(&self, claims: &JwtSessionData) -> Result<String, FoodgramError> {
        claims.sign_with_key(&self.key).map_err(|e| {
            log::error!("Failed to sign session token: {e}");
            FoodgramError::Unauthorized
        })
    }

    pub fn verify(&self, token: &str) -> Result<JwtSessionData, FoodgramError> {
        let session: JwtSessionData = token
            .verify_with_key(&self.key)
            .map_err(|_| FoodgramError::Unauthorized)?;

        let now = Utc::now().timestamp();
        if (session.exp - now).is_negative() {
            return Err(FoodgramError::Unauthorized);
        }

        Ok(session)
    }
}
