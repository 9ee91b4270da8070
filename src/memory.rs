use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{NewRoute, NewUser, Route, User};
use crate::store::{Store, StoreError, StoreResult};

#[derive(Default)]
struct Collections {
    /// Keyed by email, which doubles as the uniqueness constraint
    users: HashMap<String, User>,
    routes: Vec<Route>,
    last_created_at: Option<DateTime<Utc>>,
}

impl Collections {
    /// Creation timestamps are strictly increasing, like commit timestamps
    fn next_created_at(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let created_at = match self.last_created_at {
            Some(last) if now <= last => last + ChronoDuration::nanoseconds(1),
            _ => now,
        };
        self.last_created_at = Some(created_at);
        created_at
    }
}

/// In-process document store with the same semantics as the Spanner store
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn sample_users(&self, limit: usize) -> StoreResult<Vec<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.values().take(limit).cloned().collect())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.get(email).cloned())
    }

    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let mut inner = self.inner.write().await;
        if inner.users.contains_key(&user.email) {
            return Err(StoreError::Duplicate);
        }

        let stored = User {
            id: Uuid::new_v4(),
            email: user.email,
            password_hash: user.password_hash,
            created_at: inner.next_created_at(),
        };
        inner.users.insert(stored.email.clone(), stored.clone());

        tracing::debug!("Inserted user with id: {}", stored.id);
        Ok(stored)
    }

    async fn insert_route(&self, route: NewRoute) -> StoreResult<Route> {
        let mut inner = self.inner.write().await;
        let stored = Route {
            id: Uuid::new_v4(),
            coordinates: route.coordinates,
            comment: route.comment,
            created_at: inner.next_created_at(),
        };
        inner.routes.push(stored.clone());

        tracing::debug!("Inserted route with id: {}", stored.id);
        Ok(stored)
    }

    async fn list_routes(&self) -> StoreResult<Vec<Route>> {
        let inner = self.inner.read().await;
        let mut routes = inner.routes.clone();
        routes.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(routes)
    }
}
