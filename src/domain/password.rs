use validator::ValidationError;
use zxcvbn::zxcvbn;

const MIN_LENGTH: usize = 12;
const MIN_STRENGTH_SCORE: u8 = 3;

/// Strength check for the bootstrap admin password.
pub fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < MIN_LENGTH {
        let mut error = ValidationError::new("password_length");
        error.message = Some(format!("Must be at least {} characters", MIN_LENGTH).into());
        return Err(error);
    }

    let estimate = zxcvbn(password, &[]);
    let score = estimate.score() as u8;

    if score < MIN_STRENGTH_SCORE {
        let feedback = estimate
            .feedback()
            .and_then(|f| f.warning().map(|w| w.to_string()))
            .unwrap_or_else(|| "Password is too easy to guess".to_string());

        let mut error = ValidationError::new("password_strength");
        error.message = Some(feedback.into());
        return Err(error);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_and_common_passwords_fail() {
        assert!(validate_password_strength("Abc!1").is_err());
        assert!(validate_password_strength("password1234").is_err());
    }

    #[test]
    fn long_random_password_passes() {
        assert!(validate_password_strength("vX7#qL9!mZ2@wR4$").is_ok());
    }
}
