use anyhow::{Context, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};

/// Hash a password with argon2id and a fresh random salt
///
/// Cost is argon2's default (argon2id, 19 MiB memory, 2 passes, 1 lane),
/// used in place of a bcrypt work factor.
///
/// Returns the PHC string (`$argon2id$v=19$...`), which embeds the salt and
/// parameters needed to verify it later.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("{}", e))
        .context("Failed to hash password")?;
    Ok(hash.to_string())
}

/// Hash off the async executor; argon2 is deliberately slow
pub async fn hash_password_blocking(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .context("Password hashing task failed")?
}

#[cfg(test)]
pub fn verify_password(password: &str, phc: &str) -> bool {
    use argon2::password_hash::{PasswordHash, PasswordVerifier};

    PasswordHash::new(phc)
        .map(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
        .unwrap_or(false)
}
