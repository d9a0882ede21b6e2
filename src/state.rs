//! Application state: the persistence gateway shared by HTTP handlers and
//! WebSocket sessions.
//!
//! Startup:
//!   - load TOML config (optional, see `config`)
//!   - open the store, reloading its snapshot if configured
//!   - insert subject documents from config, then built-in seeds, when absent

use std::sync::Arc;

use tracing::{error, info, instrument, warn};

use crate::config::{load_app_config_from_env, SubjectCfg};
use crate::domain::{Subject, SubjectDoc};
use crate::error::Result;
use crate::seeds::seed_subjects;
use crate::store::{InMemoryStore, PersistenceGateway};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn PersistenceGateway>,
}

impl AppState {
    pub fn with_store(store: Arc<dyn PersistenceGateway>) -> Self {
        Self { store }
    }

    /// Build state from env: load config, open the store, seed subjects.
    #[instrument(level = "info", skip_all)]
    pub async fn from_env() -> Result<Self> {
        let cfg = load_app_config_from_env().unwrap_or_default();
        info!(
            target: "levelcraft",
            snapshot = ?cfg.store.snapshot_path,
            duplicate_subject = ?cfg.store.duplicate_subject,
            "Opening document store"
        );
        let store = InMemoryStore::open(&cfg.store).await?;
        let state = Self::with_store(Arc::new(store));
        state.seed_subjects(&cfg.subjects).await?;
        Ok(state)
    }

    /// Insert configured subjects, then built-in ones, skipping any that exist.
    /// Config entries naming an unknown subject are logged and skipped.
    #[instrument(level = "info", skip_all, fields(configured = configured.len()))]
    pub async fn seed_subjects(&self, configured: &[SubjectCfg]) -> Result<()> {
        let mut docs: Vec<(Subject, SubjectDoc)> = Vec::new();
        for sc in configured {
            match sc.id.parse::<Subject>() {
                Ok(subject) => docs.push((
                    subject,
                    SubjectDoc { name: sc.name.clone(), description: sc.description.clone() },
                )),
                Err(e) => {
                    error!(
                        target: "levelcraft",
                        id = %sc.id,
                        error = %e,
                        "Skipping configured subject"
                    );
                }
            }
        }
        docs.extend(seed_subjects());

        let mut inserted = 0usize;
        for (subject, doc) in docs {
            if self.store.get_subject(subject).await?.is_some() {
                continue;
            }
            self.store.create_subject(subject, doc).await?;
            inserted += 1;
        }

        let total = self.store.list_subjects().await?.len();
        if total < Subject::ALL.len() {
            warn!(target: "levelcraft", total, "Some subjects are missing from the store");
        }
        info!(target: "levelcraft", inserted, total, "Subject documents ready");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DuplicateSubjectPolicy;

    fn state() -> AppState {
        AppState::with_store(Arc::new(InMemoryStore::new(DuplicateSubjectPolicy::Reject)))
    }

    #[tokio::test]
    async fn configured_subjects_win_over_builtin_seeds() {
        let state = state();
        let configured = vec![
            SubjectCfg { id: "colors".into(), name: "Colours".into(), description: None },
            SubjectCfg { id: "music".into(), name: "Music".into(), description: None },
        ];
        state.seed_subjects(&configured).await.unwrap();

        let subjects = state.store.list_subjects().await.unwrap();
        assert_eq!(subjects.len(), 4);
        let colors = state.store.get_subject(Subject::Colors).await.unwrap().unwrap();
        assert_eq!(colors.name, "Colours");
    }

    #[tokio::test]
    async fn seeding_twice_keeps_existing_documents() {
        let state = state();
        state.seed_subjects(&[]).await.unwrap();
        let before = state.store.get_subject(Subject::Shapes).await.unwrap().unwrap();
        state.seed_subjects(&[]).await.unwrap();
        let after = state.store.get_subject(Subject::Shapes).await.unwrap().unwrap();
        assert_eq!(before, after);
    }
}
