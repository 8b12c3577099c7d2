use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use rand_core::OsRng;

use super::policy::PasswordPolicy;
use super::strength::validate_password;
use crate::errors::AppError;

/// Validates against `policy`, then hashes with Argon2.
pub fn hash_password(password: &str, policy: &PasswordPolicy) -> Result<String, AppError> {
    let result = validate_password(password, policy);
    if !result.valid {
        return Err(AppError::bad_request(result.errors.join("; ")));
    }

    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| AppError::internal(format!("failed to hash password: {err}")))
}

pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, AppError> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|err| AppError::internal(format!("invalid password hash: {err}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify() {
        let hash = hash_password("Tr0ub4dor&3", &PasswordPolicy::default()).unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("Tr0ub4dor&3", &hash).unwrap());
        assert!(!verify_password("tr0ub4dor&3", &hash).unwrap());
    }

    #[test]
    fn weak_passwords_are_not_hashed() {
        let err = hash_password("short", &PasswordPolicy::default()).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn malformed_hash_is_an_error() {
        assert!(verify_password("anything", "not-a-hash").is_err());
    }
}
