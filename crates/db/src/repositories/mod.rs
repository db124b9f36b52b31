use thiserror::Error;

use laundryops_core::CollabError;

pub mod booking;
pub mod orders;

pub use booking::SqlBookingStore;
pub use orders::SqlOrderDirectory;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

/// Maps storage failures onto the engine's degradation taxonomy. A missing
/// table or column means the schema was never migrated, which the engine
/// reports as a setup problem rather than a transient one.
impl From<RepositoryError> for CollabError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::Database(db_error) => classify_sqlx(db_error),
            RepositoryError::Decode(detail) => CollabError::Setup { detail },
        }
    }
}

fn classify_sqlx(error: sqlx::Error) -> CollabError {
    match &error {
        sqlx::Error::Database(db) => {
            let message = db.message().to_ascii_lowercase();
            if message.contains("no such table")
                || message.contains("no such column")
                || message.contains("has no column named")
            {
                return CollabError::Setup { detail: db.message().to_string() };
            }
            CollabError::Integration(error.into())
        }
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            CollabError::Unavailable
        }
        _ => CollabError::Integration(error.into()),
    }
}

#[cfg(test)]
mod tests {
    use laundryops_core::CollabError;

    use crate::connect_with_settings;

    use super::RepositoryError;

    #[tokio::test]
    async fn missing_schema_maps_to_a_setup_error() {
        // No migrations run: the customers table does not exist.
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        let result = sqlx::query("SELECT id FROM customers").fetch_optional(&pool).await;
        let error = match result {
            Err(err) => RepositoryError::from(err),
            Ok(_) => panic!("table should be missing"),
        };

        match CollabError::from(error) {
            CollabError::Setup { detail } => assert!(detail.contains("customers")),
            other => panic!("expected setup error, got {other:?}"),
        }
    }

    #[test]
    fn decode_failures_map_to_setup() {
        let error = RepositoryError::Decode("rate_per_kg is not a decimal".to_string());
        assert!(matches!(CollabError::from(error), CollabError::Setup { .. }));
    }
}
