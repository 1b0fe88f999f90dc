use sqlx::PgPool;

use super::StorageError;

/// Key-value adapter backed by a single `kv_entries` table.
#[derive(Clone)]
pub struct PgEmailStore {
    pool: PgPool,
}

impl PgEmailStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(name = "Reading a key from storage", skip(self))]
    pub async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let value = sqlx::query_scalar::<_, String>("SELECT value FROM kv_entries WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(value)
    }

    #[tracing::instrument(name = "Writing a key to storage", skip(self, value))]
    pub async fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
        sqlx::query(
            "INSERT INTO kv_entries (key, value) VALUES ($1, $2) \
             ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = now()",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    #[tracing::instrument(name = "Conditionally writing a key to storage", skip(self, new))]
    pub async fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<&str>,
        new: &str,
    ) -> Result<bool, StorageError> {
        let result = match expected {
            None => {
                sqlx::query(
                    "INSERT INTO kv_entries (key, value) VALUES ($1, $2) \
                     ON CONFLICT (key) DO NOTHING",
                )
                .bind(key)
                .bind(new)
                .execute(&self.pool)
                .await?
            }
            Some(expected) => {
                sqlx::query(
                    "UPDATE kv_entries SET value = $2, updated_at = now() \
                     WHERE key = $1 AND value = $3",
                )
                .bind(key)
                .bind(new)
                .bind(expected)
                .execute(&self.pool)
                .await?
            }
        };
        Ok(result.rows_affected() == 1)
    }
}
