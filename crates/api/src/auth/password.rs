use bcrypt::{hash, verify, DEFAULT_COST};

use crate::error::AppError;

const MIN_PASSWORD_LEN: usize = 8;

pub struct PasswordService;

impl PasswordService {
    pub fn hash_password(password: &str) -> Result<String, AppError> {
        hash(password, DEFAULT_COST)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
    }

    pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
        verify(password, hash)
            .map_err(|e| AppError::Internal(format!("Failed to verify password: {}", e)))
    }

    pub fn validate_password_strength(password: &str) -> Result<(), AppError> {
        if password.len() < MIN_PASSWORD_LEN {
            return Err(AppError::BadRequest(
                "Password must be at least 8 characters long".to_string(),
            ));
        }

        let has_letter = password.chars().any(|c| c.is_alphabetic());
        let has_digit = password.chars().any(|c| c.is_numeric());

        if !has_letter || !has_digit {
            return Err(AppError::BadRequest(
                "Password must contain at least one letter and one number".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_passwords_are_rejected() {
        assert!(PasswordService::validate_password_strength("ab1").is_err());
    }

    #[test]
    fn passwords_need_both_letters_and_digits() {
        assert!(PasswordService::validate_password_strength("abcdefgh").is_err());
        assert!(PasswordService::validate_password_strength("12345678").is_err());
        assert!(PasswordService::validate_password_strength("abcdefg1").is_ok());
    }

    #[test]
    fn hash_then_verify_roundtrips() {
        let hashed = PasswordService::hash_password("s3cret-enough").unwrap();
        assert!(PasswordService::verify_password("s3cret-enough", &hashed).unwrap());
        assert!(!PasswordService::verify_password("wrong-guess1", &hashed).unwrap());
    }
}
