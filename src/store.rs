//! Persistence gateway: the document-store abstraction the authoring core
//! talks to, plus the in-memory implementation the service runs on.
//!
//! The store mirrors a hierarchical document database:
//!   subjects/{subject}
//!   subjects/{subject}/sections/{section}
//!   subjects/{subject}/sections/{section}/levels/{level}
//!
//! Levels live in their own tree keyed by (subject, section) so deleting a
//! section document leaves its levels untouched; nothing cascades.
//!
//! When a snapshot path is configured, every write serializes the whole tree
//! to JSON (temp file + rename) before the change becomes visible.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

use crate::builder;
use crate::config::{DuplicateSubjectPolicy, StoreConfig};
use crate::domain::{
    Level, LevelPatch, NewLevel, NewSection, Section, SectionPatch, Subject, SubjectDoc,
    SubjectPatch, SubjectRecord,
};
use crate::error::{AuthoringError, Result};
use crate::sections;
use crate::util::non_empty;

/// Basic create/read/update/delete calls against the document store.
///
/// Every call may fail with `StoreUnavailable` or `NotFound`; callers log
/// and surface the failure, nothing retries.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    async fn list_subjects(&self) -> Result<Vec<SubjectRecord>>;
    async fn get_subject(&self, id: Subject) -> Result<Option<SubjectRecord>>;
    async fn create_subject(&self, id: Subject, doc: SubjectDoc) -> Result<()>;
    async fn update_subject(&self, id: Subject, patch: SubjectPatch) -> Result<()>;
    async fn delete_subject(&self, id: Subject) -> Result<()>;

    async fn list_sections(&self, subject: Subject) -> Result<Vec<Section>>;
    /// Highest section number ever written for `subject`, deleted ones included.
    async fn last_section_number(&self, subject: Subject) -> Result<u32>;
    async fn get_section(&self, subject: Subject, section_id: &str) -> Result<Option<Section>>;
    /// Write a section document under an already allocated id.
    async fn insert_section(
        &self,
        subject: Subject,
        section_id: &str,
        section: NewSection,
    ) -> Result<()>;
    async fn update_section(
        &self,
        subject: Subject,
        section_id: &str,
        patch: SectionPatch,
    ) -> Result<()>;
    async fn delete_section(&self, subject: Subject, section_id: &str) -> Result<()>;

    /// Levels of a section, ascending by `level_index`.
    async fn list_levels(&self, subject: Subject, section_id: &str) -> Result<Vec<Level>>;
    async fn get_level(
        &self,
        subject: Subject,
        section_id: &str,
        level_id: &str,
    ) -> Result<Option<Level>>;
    /// Write a level document with an already assigned index; returns the new level id.
    async fn insert_level(
        &self,
        subject: Subject,
        section_id: &str,
        level_index: u32,
        level: NewLevel,
    ) -> Result<String>;
    async fn update_level(
        &self,
        subject: Subject,
        section_id: &str,
        level_id: &str,
        patch: LevelPatch,
    ) -> Result<()>;
    async fn delete_level(&self, subject: Subject, section_id: &str, level_id: &str) -> Result<()>;

    /// Allocate `section<N>` and write the section. Not atomic.
    async fn create_section(&self, subject: Subject, section: NewSection) -> Result<String> {
        let existing = self.list_sections(subject).await?;
        let last_issued = self.last_section_number(subject).await?;
        let section_id = sections::next_section_id(&existing, last_issued);
        self.insert_section(subject, &section_id, section).await?;
        Ok(section_id)
    }

    /// Assign the next level index and write the level. Not atomic.
    async fn create_level(
        &self,
        subject: Subject,
        section_id: &str,
        level: NewLevel,
    ) -> Result<String> {
        let level_index = builder::allocate_level_index(self, subject, section_id).await?;
        self.insert_level(subject, section_id, level_index, level).await
    }
}

type SectionDocs = BTreeMap<String, Section>;
type LevelDocs = BTreeMap<String, Level>;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct Tree {
    #[serde(default)]
    subjects: BTreeMap<Subject, SubjectRecord>,
    #[serde(default)]
    sections: BTreeMap<Subject, SectionDocs>,
    #[serde(default)]
    levels: BTreeMap<Subject, BTreeMap<String, LevelDocs>>,
    #[serde(default)]
    section_counters: BTreeMap<Subject, u32>,
}

impl Tree {
    fn note_section_id(&mut self, subject: Subject, section_id: &str) {
        if let Some(number) = sections::section_number(section_id) {
            let counter = self.section_counters.entry(subject).or_default();
            *counter = (*counter).max(number);
        }
    }

    /// Snapshots written before counters existed: rebuild them from the
    /// section ids still present, including ids that only hold levels.
    fn restore_section_counters(&mut self) {
        let mut seen: Vec<(Subject, String)> = Vec::new();
        for (subject, docs) in &self.sections {
            seen.extend(docs.keys().map(|id| (*subject, id.clone())));
        }
        for (subject, by_section) in &self.levels {
            seen.extend(by_section.keys().map(|id| (*subject, id.clone())));
        }
        for (subject, id) in seen {
            self.note_section_id(subject, &id);
        }
    }
}

#[derive(Debug)]
pub struct InMemoryStore {
    tree: RwLock<Tree>,
    snapshot_path: Option<PathBuf>,
    duplicate_subject: DuplicateSubjectPolicy,
}

impl InMemoryStore {
    /// Empty store without a snapshot file.
    pub fn new(duplicate_subject: DuplicateSubjectPolicy) -> Self {
        Self { tree: RwLock::new(Tree::default()), snapshot_path: None, duplicate_subject }
    }

    /// Build the store from config, reloading the snapshot if one exists.
    #[instrument(level = "info", skip_all)]
    pub async fn open(config: &StoreConfig) -> Result<Self> {
        let tree = match &config.snapshot_path {
            Some(path) => load_snapshot(path).await?,
            None => Tree::default(),
        };
        Ok(Self {
            tree: RwLock::new(tree),
            snapshot_path: config.snapshot_path.clone(),
            duplicate_subject: config.duplicate_subject,
        })
    }

    /// Apply one mutation to a copy of the tree, persist it, then publish it.
    async fn mutate<T, F>(&self, op: F) -> Result<T>
    where
        T: Send,
        F: FnOnce(&mut Tree) -> Result<T> + Send,
    {
        let mut guard = self.tree.write().await;
        let mut next = guard.clone();
        let out = op(&mut next)?;
        if let Some(path) = &self.snapshot_path {
            write_snapshot(path, &next).await?;
        }
        *guard = next;
        Ok(out)
    }
}

async fn load_snapshot(path: &Path) -> Result<Tree> {
    match tokio::fs::read_to_string(path).await {
        Ok(raw) => {
            let mut tree: Tree = serde_json::from_str(&raw).map_err(|e| {
                error!(
                    target: "levelcraft",
                    path = %path.display(),
                    error = %e,
                    "Snapshot is not valid JSON"
                );
                let msg = format!("corrupt snapshot {}: {e}", path.display());
                AuthoringError::StoreUnavailable(msg)
            })?;
            tree.restore_section_counters();
            info!(
                target: "levelcraft",
                path = %path.display(),
                subjects = tree.subjects.len(),
                "Snapshot loaded"
            );
            Ok(tree)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!(target: "levelcraft", path = %path.display(), "No snapshot yet; starting empty");
            Ok(Tree::default())
        }
        Err(e) => Err(AuthoringError::StoreUnavailable(format!(
            "cannot read {}: {e}",
            path.display()
        ))),
    }
}

async fn write_snapshot(path: &Path, tree: &Tree) -> Result<()> {
    let body = serde_json::to_vec_pretty(tree)
        .map_err(|e| {
            AuthoringError::StoreUnavailable(format!("snapshot serialization failed: {e}"))
        })?;
    let mut tmp = path.as_os_str().to_os_string();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let io_err = |e: std::io::Error| {
        error!(target: "levelcraft", path = %path.display(), error = %e, "Snapshot write failed");
        AuthoringError::StoreUnavailable(format!("cannot write {}: {e}", path.display()))
    };
    tokio::fs::write(&tmp, &body).await.map_err(io_err)?;
    tokio::fs::rename(&tmp, path).await.map_err(io_err)?;
    debug!(target: "levelcraft", path = %path.display(), bytes = body.len(), "Snapshot written");
    Ok(())
}

#[async_trait]
impl PersistenceGateway for InMemoryStore {
    async fn list_subjects(&self) -> Result<Vec<SubjectRecord>> {
        Ok(self.tree.read().await.subjects.values().cloned().collect())
    }

    async fn get_subject(&self, id: Subject) -> Result<Option<SubjectRecord>> {
        Ok(self.tree.read().await.subjects.get(&id).cloned())
    }

    #[instrument(level = "debug", skip(self, doc))]
    async fn create_subject(&self, id: Subject, doc: SubjectDoc) -> Result<()> {
        let policy = self.duplicate_subject;
        self
            .mutate(move |tree| {
                if tree.subjects.contains_key(&id) && policy == DuplicateSubjectPolicy::Reject {
                    return Err(AuthoringError::AlreadyExists {
                        entity: "subject",
                        id: id.to_string(),
                    });
                }
                let now = Utc::now();
                tree.subjects.insert(
                    id,
                    SubjectRecord {
                        id,
                        name: doc.name,
                        description: non_empty(doc.description),
                        created_at: now,
                        updated_at: now,
                    },
                );
                Ok(())
            })
            .await
    }

    #[instrument(level = "debug", skip(self, patch))]
    async fn update_subject(&self, id: Subject, patch: SubjectPatch) -> Result<()> {
        self
            .mutate(move |tree| {
                let record = tree
                    .subjects
                    .get_mut(&id)
                    .ok_or_else(|| AuthoringError::not_found("subject", id.as_str()))?;
                if let Some(name) = patch.name {
                    record.name = name;
                }
                if patch.description.is_some() {
                    record.description = non_empty(patch.description);
                }
                record.updated_at = Utc::now();
                Ok(())
            })
            .await
    }

    #[instrument(level = "debug", skip(self))]
    async fn delete_subject(&self, id: Subject) -> Result<()> {
        self
            .mutate(move |tree| {
                tree
                    .subjects
                    .remove(&id)
                    .map(|_| ())
                    .ok_or_else(|| AuthoringError::not_found("subject", id.as_str()))
            })
            .await
    }

    async fn list_sections(&self, subject: Subject) -> Result<Vec<Section>> {
        let mut list: Vec<Section> = self
            .tree
            .read()
            .await
            .sections
            .get(&subject)
            .map(|docs| docs.values().cloned().collect())
            .unwrap_or_default();
        sections::sort_sections(&mut list);
        Ok(list)
    }

    async fn last_section_number(&self, subject: Subject) -> Result<u32> {
        Ok(self.tree.read().await.section_counters.get(&subject).copied().unwrap_or(0))
    }

    async fn get_section(&self, subject: Subject, section_id: &str) -> Result<Option<Section>> {
        let tree = self.tree.read().await;
        Ok(tree.sections.get(&subject).and_then(|docs| docs.get(section_id)).cloned())
    }

    #[instrument(level = "debug", skip(self, section))]
    async fn insert_section(
        &self,
        subject: Subject,
        section_id: &str,
        section: NewSection,
    ) -> Result<()> {
        let section_id = section_id.to_string();
        self
            .mutate(move |tree| {
                let docs = tree.sections.entry(subject).or_default();
                if docs.contains_key(&section_id) {
                    return Err(AuthoringError::AlreadyExists { entity: "section", id: section_id });
                }
                let now = Utc::now();
                docs.insert(
                    section_id.clone(),
                    Section {
                        id: section_id.clone(),
                        name: section.name,
                        title: section.title,
                        description: non_empty(section.description),
                        background_image: non_empty(section.background_image),
                        created_at: now,
                        updated_at: now,
                    },
                );
                tree.note_section_id(subject, &section_id);
                Ok(())
            })
            .await
    }

    #[instrument(level = "debug", skip(self, patch))]
    async fn update_section(
        &self,
        subject: Subject,
        section_id: &str,
        patch: SectionPatch,
    ) -> Result<()> {
        let section_id = section_id.to_string();
        self
            .mutate(move |tree| {
                let section = tree
                    .sections
                    .get_mut(&subject)
                    .and_then(|docs| docs.get_mut(&section_id))
                    .ok_or_else(|| AuthoringError::not_found("section", section_id.as_str()))?;
                if let Some(name) = patch.name {
                    section.name = name;
                }
                if let Some(title) = patch.title {
                    section.title = title;
                }
                if patch.description.is_some() {
                    section.description = non_empty(patch.description);
                }
                if patch.background_image.is_some() {
                    section.background_image = non_empty(patch.background_image);
                }
                section.updated_at = Utc::now();
                Ok(())
            })
            .await
    }

    #[instrument(level = "debug", skip(self))]
    async fn delete_section(&self, subject: Subject, section_id: &str) -> Result<()> {
        let section_id = section_id.to_string();
        self
            .mutate(move |tree| {
                tree
                    .sections
                    .get_mut(&subject)
                    .and_then(|docs| docs.remove(&section_id))
                    .map(|_| ())
                    .ok_or_else(|| AuthoringError::not_found("section", section_id.as_str()))
            })
            .await
    }

    async fn list_levels(&self, subject: Subject, section_id: &str) -> Result<Vec<Level>> {
        let mut list: Vec<Level> = self
            .tree
            .read()
            .await
            .levels
            .get(&subject)
            .and_then(|by_section| by_section.get(section_id))
            .map(|docs| docs.values().cloned().collect())
            .unwrap_or_default();
        list.sort_by(|a, b| {
            a.level_index
                .cmp(&b.level_index)
                .then(a.created_at.cmp(&b.created_at))
        });
        Ok(list)
    }

    async fn get_level(
        &self,
        subject: Subject,
        section_id: &str,
        level_id: &str,
    ) -> Result<Option<Level>> {
        let tree = self.tree.read().await;
        Ok(
            tree
                .levels
                .get(&subject)
                .and_then(|by_section| by_section.get(section_id))
                .and_then(|docs| docs.get(level_id))
                .cloned(),
        )
    }

    #[instrument(level = "debug", skip(self, level), fields(game_type = %level.game_type))]
    async fn insert_level(
        &self,
        subject: Subject,
        section_id: &str,
        level_index: u32,
        level: NewLevel,
    ) -> Result<String> {
        let section_id = section_id.to_string();
        self
            .mutate(move |tree| {
                let section_exists = tree
                    .sections
                    .get(&subject)
                    .is_some_and(|docs| docs.contains_key(&section_id));
                if !section_exists {
                    return Err(AuthoringError::not_found("section", section_id.as_str()));
                }
                let id = Uuid::new_v4().to_string();
                let now = Utc::now();
                tree.levels.entry(subject).or_default().entry(section_id).or_default().insert(
                    id.clone(),
                    Level {
                        id: id.clone(),
                        level_index,
                        name: level.name,
                        title: level.title,
                        icon: level.icon,
                        game_type: level.game_type,
                        stages: level.stages,
                        created_at: now,
                        updated_at: now,
                    },
                );
                Ok(id)
            })
            .await
    }

    #[instrument(level = "debug", skip(self, patch))]
    async fn update_level(
        &self,
        subject: Subject,
        section_id: &str,
        level_id: &str,
        patch: LevelPatch,
    ) -> Result<()> {
        let section_id = section_id.to_string();
        let level_id = level_id.to_string();
        self
            .mutate(move |tree| {
                let level = tree
                    .levels
                    .get_mut(&subject)
                    .and_then(|by_section| by_section.get_mut(&section_id))
                    .and_then(|docs| docs.get_mut(&level_id))
                    .ok_or_else(|| AuthoringError::not_found("level", level_id.as_str()))?;
                if let Some(name) = patch.name {
                    level.name = name;
                }
                if let Some(title) = patch.title {
                    level.title = title;
                }
                if let Some(icon) = patch.icon {
                    level.icon = icon;
                }
                if let Some(stages) = patch.stages {
                    level.stages = stages;
                }
                level.updated_at = Utc::now();
                Ok(())
            })
            .await
    }

    #[instrument(level = "debug", skip(self))]
    async fn delete_level(&self, subject: Subject, section_id: &str, level_id: &str) -> Result<()> {
        let section_id = section_id.to_string();
        let level_id = level_id.to_string();
        self
            .mutate(move |tree| {
                tree
                    .levels
                    .get_mut(&subject)
                    .and_then(|by_section| by_section.get_mut(&section_id))
                    .and_then(|docs| docs.remove(&level_id))
                    .map(|_| ())
                    .ok_or_else(|| AuthoringError::not_found("level", level_id.as_str()))
            })
            .await
    }
}
