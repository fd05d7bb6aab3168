//! Repository Errors
//!
//! Error types for persistence operations.

/// Errors that can occur while reading or writing internships
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Update targeted a row that no longer exists
    #[error("Internship vanished during write: {0}")]
    Missing(i64),

    /// Stored row could not be mapped back onto the domain type
    #[error("Invalid stored row: {0}")]
    InvalidRow(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_display() {
        let err = RepositoryError::Missing(12);
        assert_eq!(err.to_string(), "Internship vanished during write: 12");

        let err = RepositoryError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, RepositoryError::Database(_)));
    }
}
