use anyhow::anyhow;
use argon2::{
    password_hash::{self, rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use tracing::error;

fn hasher() -> Argon2<'static> {
    Argon2::new(Algorithm::Argon2id, Version::V0x13, Params::default())
}

/// Hash `plain` with a fresh salt and return the PHC string that gets stored
/// in `users.password_hash`.
pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    match hasher().hash_password(plain.as_bytes(), &salt) {
        Ok(phc) => Ok(phc.to_string()),
        Err(e) => {
            error!(error = %e, "password hashing failed");
            Err(anyhow!("failed to hash password: {e}"))
        }
    }
}

/// `Ok(false)` only for a wrong password. A stored hash that does not parse,
/// or that names parameters argon2 refuses, is an error.
///
/// Algorithm and parameters come from the PHC string itself, and the digest
/// comparison inside `argon2` is constant-time.
pub fn verify_password(plain: &str, stored: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(stored).map_err(|e| {
        error!(error = %e, "stored password hash is malformed");
        anyhow!("malformed password hash: {e}")
    })?;
    match hasher().verify_password(plain.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => {
            error!(error = %e, "password verification failed");
            Err(anyhow!("failed to verify password: {e}"))
        }
    }
}
