use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use axum::extract::FromRef;
use tokio::{sync::RwLock, task::JoinHandle, time::Instant};
use uuid::Uuid;

use crate::{
    config::{Config, MAX_SESSIONS},
    error::AppError,
    models::question::QuestionBank,
    session::ExamSession,
};

type SessionMap = HashMap<Uuid, ExamSession>;

/// In-memory registry of live exam sessions. Nothing survives a restart.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<SessionMap>>,
    capacity: usize,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(MAX_SESSIONS)
    }
}

impl SessionStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            capacity,
        }
    }

    pub async fn insert(&self, session: ExamSession) -> Result<(), AppError> {
        let mut sessions = self.sessions.write().await;
        if sessions.len() >= self.capacity {
            return Err(AppError::ServiceUnavailable(
                "Too many active exam sessions, try again later".to_string(),
            ));
        }
        sessions.insert(session.id(), session);
        Ok(())
    }

    pub async fn get(&self, id: Uuid) -> Result<ExamSession, AppError> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Session {} not found", id)))
    }

    pub async fn remove(&self, id: Uuid) -> Result<ExamSession, AppError> {
        self.sessions
            .write()
            .await
            .remove(&id)
            .ok_or_else(|| AppError::NotFound(format!("Session {} not found", id)))
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Removes idle and finished sessions, ending each so its ticker stops.
    /// Returns how many were evicted.
    pub async fn evict_stale(&self, idle_ttl: Duration, completed_ttl: Duration) -> usize {
        let now = Instant::now();
        let candidates: Vec<ExamSession> = self.sessions.read().await.values().cloned().collect();

        let mut stale = Vec::new();
        for session in candidates {
            if session.is_stale(now, idle_ttl, completed_ttl).await {
                stale.push(session.id());
            }
        }

        let evicted: Vec<ExamSession> = {
            let mut sessions = self.sessions.write().await;
            stale.iter().filter_map(|id| sessions.remove(id)).collect()
        };

        for session in &evicted {
            session.end().await;
            tracing::info!("Evicted stale exam session {}", session.id());
        }

        evicted.len()
    }

    /// Periodically evicts stale sessions. The task only holds a weak
    /// reference, so it exits once the store is dropped.
    pub fn spawn_sweeper(
        &self,
        period: Duration,
        idle_ttl: Duration,
        completed_ttl: Duration,
    ) -> JoinHandle<()> {
        let sessions: Weak<RwLock<SessionMap>> = Arc::downgrade(&self.sessions);
        let capacity = self.capacity;

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.tick().await;

            loop {
                interval.tick().await;

                let Some(sessions) = sessions.upgrade() else {
                    tracing::debug!("Session sweeper stopped: store dropped");
                    break;
                };
                let store = SessionStore { sessions, capacity };
                let evicted = store.evict_stale(idle_ttl, completed_ttl).await;
                if evicted > 0 {
                    tracing::info!(
                        "Session sweep evicted {} sessions, {} remain",
                        evicted,
                        store.len().await
                    );
                }
            }
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionStore,
    pub bank: Arc<QuestionBank>,
    pub config: Config,
}

impl AppState {
    pub fn new(bank: QuestionBank, config: Config) -> Self {
        Self {
            sessions: SessionStore::new(config.max_sessions),
            bank: Arc::new(bank),
            config,
        }
    }

    /// Starts the background eviction of idle and completed sessions.
    pub fn spawn_session_sweeper(&self) -> JoinHandle<()> {
        self.sessions.spawn_sweeper(
            self.config.session_sweep_interval,
            self.config.session_idle_ttl,
            self.config.completed_session_ttl,
        )
    }
}

impl FromRef<AppState> for SessionStore {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for Arc<QuestionBank> {
    fn from_ref(state: &AppState) -> Self {
        state.bank.clone()
    }
}
