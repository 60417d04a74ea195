use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::error::FoodgramError;

/// Salted argon2 hash in PHC string form, ready for the `users.password` column.
pub fn hash_password(password: &str) -> Result<String, FoodgramError> {
    if password.is_empty() {
        return Err(FoodgramError::validation("Password is required"));
    }

    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            log::error!("Failed to hash password: {e}");
            FoodgramError::validation("Password could not be processed")
        })
}

/// False for a wrong password and for a stored hash that does not parse.
pub fn password_matches(password: &str, stored_hash: &str) -> bool {
    let parsed = match PasswordHash::new(stored_hash) {
        Ok(parsed) => parsed,
        Err(e) => {
            log::warn!("Stored password hash is malformed: {e}");
            return false;
        }
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}
