use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

use crate::models::{NewRoute, NewUser, Route, User};

/// Failure reported by a persistence collaborator
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write
    #[error("document already exists")]
    Duplicate,
    /// The call did not finish before its deadline
    #[error("store call timed out after {0:?}")]
    Timeout(Duration),
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Document store holding the `users` and `routes` collections
#[async_trait]
pub trait Store: Send + Sync {
    /// Read at most `limit` users; used as a connectivity check
    async fn sample_users(&self, limit: usize) -> StoreResult<Vec<User>>;

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Insert a user, failing with [`StoreError::Duplicate`] if the email is taken
    async fn insert_user(&self, user: NewUser) -> StoreResult<User>;

    async fn insert_route(&self, route: NewRoute) -> StoreResult<Route>;

    /// All routes, most recently created first
    async fn list_routes(&self) -> StoreResult<Vec<Route>>;
}

/// Run a store call under a deadline, mapping expiry to [`StoreError::Timeout`]
pub async fn with_deadline<T, F>(deadline: Duration, call: F) -> StoreResult<T>
where
    F: Future<Output = StoreResult<T>>,
{
    match tokio::time::timeout(deadline, call).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout(deadline)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_deadline_passes_result_through() {
        let result = with_deadline(Duration::from_secs(1), async { Ok::<_, StoreError>(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_deadline_expires() {
        let result: StoreResult<()> = with_deadline(Duration::from_millis(50), async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        })
        .await;

        assert!(matches!(result, Err(StoreError::Timeout(d)) if d == Duration::from_millis(50)));
    }

    #[test]
    fn test_backend_error_keeps_context() {
        let err: StoreError = anyhow::anyhow!("connection refused")
            .context("Failed to query users")
            .into();
        assert_eq!(err.to_string(), "Failed to query users");
    }
}
