use uuid::Uuid;

use crate::errors::AppError;

/// Parses a path segment as a row id.
pub fn valid_uuid(id: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(id.trim()).map_err(|_| AppError::InvalidInput(format!("Invalid id: {}", id)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_or_rejects() {
        let id = Uuid::new_v4();
        assert_eq!(valid_uuid(&id.to_string()).unwrap(), id);
        assert!(matches!(valid_uuid("42"), Err(AppError::InvalidInput(_))));
    }
}
