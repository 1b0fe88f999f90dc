//! Key-value storage adapter.
//!
//! The handlers only ever see `EmailStore`: string keys, string values, and
//! a compare-and-swap primitive for the one key that is mutated concurrently
//! (the index list). The Postgres backend is the production one; the
//! in-memory backend exists so the API tests run without external services.

mod memory;
mod postgres;

pub use memory::InMemoryStore;
pub use postgres::PgEmailStore;

/// Well-known key holding the JSON array of all subscribed addresses.
pub const EMAIL_LIST_KEY: &str = "email_list";

#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("database error")]
    Database(#[from] sqlx::Error),
}

#[derive(Clone)]
pub enum EmailStore {
    Postgres(PgEmailStore),
    InMemory(InMemoryStore),
}

impl EmailStore {
    pub fn postgres(pool: sqlx::PgPool) -> Self {
        Self::Postgres(PgEmailStore::new(pool))
    }

    pub fn in_memory() -> Self {
        Self::InMemory(InMemoryStore::new())
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match self {
            Self::Postgres(store) => store.get(key).await,
            Self::InMemory(store) => Ok(store.get(key)),
        }
    }

    pub async fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
        match self {
            Self::Postgres(store) => store.put(key, value).await,
            Self::InMemory(store) => {
                store.put(key, value);
                Ok(())
            }
        }
    }

    /// Write `new` under `key` only if the current value matches `expected`
    /// (`None` meaning the key must be absent). Returns whether the write
    /// took place.
    pub async fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<&str>,
        new: &str,
    ) -> Result<bool, StorageError> {
        match self {
            Self::Postgres(store) => store.compare_and_swap(key, expected, new).await,
            Self::InMemory(store) => Ok(store.compare_and_swap(key, expected, new)),
        }
    }
}
