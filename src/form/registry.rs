//! Form Session Registry
//!
//! Each visitor gets their own `PriceUpdateForm`, addressed by a session id.
//! Idle sessions are evicted when new ones are opened; dropping a form
//! cancels its pending status reset.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::time::Instant;
use uuid::Uuid;

use super::state::{FormConfig, PriceUpdateForm};
use crate::catalog::PriceCatalog;
use crate::store::PriceStore;

/// Unique identifier for a form session
pub type SessionId = Uuid;

/// Limits for the session registry
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Maximum number of concurrent sessions
    pub max_sessions: usize,
    /// Sessions untouched for this long are evicted
    pub idle_timeout: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_sessions: 500,
            idle_timeout: Duration::from_secs(3600),
        }
    }
}

struct Session {
    form: Arc<PriceUpdateForm>,
    last_seen: Instant,
}

/// Owns every open form session
pub struct FormRegistry {
    catalog: Arc<PriceCatalog>,
    store: Arc<dyn PriceStore>,
    form_config: FormConfig,
    config: RegistryConfig,
    sessions: RwLock<HashMap<SessionId, Session>>,
}

impl FormRegistry {
    pub fn new(
        catalog: Arc<PriceCatalog>,
        store: Arc<dyn PriceStore>,
        form_config: FormConfig,
        config: RegistryConfig,
    ) -> Self {
        Self {
            catalog,
            store,
            form_config,
            config,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn catalog(&self) -> &Arc<PriceCatalog> {
        &self.catalog
    }

    pub fn store(&self) -> &Arc<dyn PriceStore> {
        &self.store
    }

    pub fn form_config(&self) -> &FormConfig {
        &self.form_config
    }

    /// Open a new session with an empty form
    pub async fn open(&self) -> Result<(SessionId, Arc<PriceUpdateForm>), RegistryError> {
        let mut sessions = self.sessions.write().await;

        let now = Instant::now();
        let before = sessions.len();
        sessions.retain(|_, s| now.duration_since(s.last_seen) < self.config.idle_timeout);
        let evicted = before - sessions.len();
        if evicted > 0 {
            tracing::debug!(evicted, "Evicted idle form sessions");
        }

        if sessions.len() >= self.config.max_sessions {
            return Err(RegistryError::TooManySessions);
        }

        let id = Uuid::new_v4();
        let form = Arc::new(PriceUpdateForm::new(
            Arc::clone(&self.catalog),
            Arc::clone(&self.store),
            self.form_config.clone(),
        ));
        sessions.insert(
            id,
            Session {
                form: Arc::clone(&form),
                last_seen: now,
            },
        );

        tracing::debug!(session_id = %id, "Opened form session");
        Ok((id, form))
    }

    /// Look up a session and mark it as active
    pub async fn get(&self, id: &SessionId) -> Option<Arc<PriceUpdateForm>> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(id)?;
        session.last_seen = Instant::now();
        Some(Arc::clone(&session.form))
    }

    /// Close a session; returns false if it did not exist
    pub async fn close(&self, id: &SessionId) -> bool {
        let removed = self.sessions.write().await.remove(id).is_some();
        if removed {
            tracing::debug!(session_id = %id, "Closed form session");
        }
        removed
    }

    /// Number of open sessions
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

/// Errors from the session registry
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Too many open sessions")]
    TooManySessions,
}
