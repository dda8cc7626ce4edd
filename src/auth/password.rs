use bcrypt::BcryptError;
use tracing::warn;

use crate::config;

// Mirrors bcrypt's accepted cost range (its own constants are private).
const BCRYPT_MIN_COST: u32 = 4;
const BCRYPT_MAX_COST: u32 = 31;

fn cost() -> u32 {
    if cfg!(test) {
        BCRYPT_MIN_COST
    } else {
        config::config().security.password_hash_cost.clamp(BCRYPT_MIN_COST, BCRYPT_MAX_COST)
    }
}

/// Hash a password for storage. The salt is embedded in the result.
pub fn hash_password(password: &str) -> Result<String, BcryptError> {
    bcrypt::hash(password, cost())
}

/// Check `password` against a stored hash. A malformed hash never matches.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match bcrypt::verify(password, hash) {
        Ok(matches) => matches,
        Err(e) => {
            warn!("Stored password hash is unreadable: {}", e);
            false
        }
    }
}
