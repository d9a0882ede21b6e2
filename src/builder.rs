//! Level assembly: the ordered stage draft, level-level checks, index
//! assignment and the hand-off to the persistence gateway.
//!
//! Index assignment lists the section's levels and takes `max + 1` (or 1)
//! before writing. Two authors saving at once can end up with the same
//! index; the tool is single-operator and accepts that.

use serde::Serialize;
use tracing::{info, instrument};

use crate::catalog;
use crate::domain::{GameType, Icon, Level, LevelPatch, NewLevel, StageData, Subject};
use crate::error::{AuthoringError, Result, Violation};
use crate::store::PersistenceGateway;
use crate::validator::validate_stage;

/// `max(existing) + 1`, or 1 for an empty section.
pub fn next_level_index(levels: &[Level]) -> u32 {
    levels.iter().map(|l| l.level_index).max().map_or(1, |max| max + 1)
}

pub async fn allocate_level_index<G>(gateway: &G, subject: Subject, section_id: &str) -> Result<u32>
where
    G: PersistenceGateway + ?Sized,
{
    let levels = gateway.list_levels(subject, section_id).await?;
    Ok(next_level_index(&levels))
}

/// Ordered list of validated stages for one level.
#[derive(Clone, Debug)]
pub struct StageList {
    subject: Subject,
    game_type: GameType,
    stages: Vec<StageData>,
}

impl StageList {
    pub fn new(subject: Subject, game_type: GameType) -> Result<Self> {
        catalog::lookup(subject, game_type)?;
        Ok(Self { subject, game_type, stages: Vec::new() })
    }

    /// Append a stage. The catching cap is checked before the candidate is
    /// even looked at.
    pub fn add(&mut self, candidate: &StageData) -> Result<&StageData> {
        if let Some(limit) = catalog::stage_limit(self.game_type) {
            if self.stages.len() >= limit {
                return Err(AuthoringError::TooManyStages { game_type: self.game_type, limit });
            }
        }
        let stage = validate_stage(self.subject, self.game_type, candidate)?;
        self.stages.push(stage);
        Ok(&self.stages[self.stages.len() - 1])
    }

    /// Re-author the stage at `index`. Allowed under the catching cap.
    pub fn replace(&mut self, index: usize, candidate: &StageData) -> Result<&StageData> {
        self.check_index(index)?;
        let stage = validate_stage(self.subject, self.game_type, candidate)?;
        self.stages[index] = stage;
        Ok(&self.stages[index])
    }

    pub fn remove(&mut self, index: usize) -> Result<StageData> {
        self.check_index(index)?;
        Ok(self.stages.remove(index))
    }

    pub fn stages(&self) -> &[StageData] {
        &self.stages
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.stages.len() {
            Ok(())
        } else {
            Err(AuthoringError::InvalidRequest(format!(
                "stage {index} does not exist (level has {} stages)",
                self.stages.len()
            )))
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum BuildMode {
    Create,
    Edit { level_id: String, level_index: u32 },
}

/// Result of a successful save.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedLevel {
    pub id: String,
    pub level_index: u32,
}

/// Collects basic info and stages for one level, then persists it.
#[derive(Clone, Debug)]
pub struct LevelBuilder {
    subject: Subject,
    section_id: String,
    mode: BuildMode,
    pub name: String,
    pub title: String,
    pub icon: Option<Icon>,
    stages: StageList,
}

impl LevelBuilder {
    pub fn create(
        subject: Subject,
        section_id: impl Into<String>,
        game_type: GameType,
    ) -> Result<Self> {
        Ok(Self {
            subject,
            section_id: section_id.into(),
            mode: BuildMode::Create,
            name: String::new(),
            title: String::new(),
            icon: None,
            stages: StageList::new(subject, game_type)?,
        })
    }

    /// Start from a stored level. Game type and index stay fixed; the stored
    /// stages are taken as the draft without re-validation.
    pub fn edit(subject: Subject, section_id: impl Into<String>, level: &Level) -> Result<Self> {
        let mut stages = StageList::new(subject, level.game_type)?;
        stages.stages = level.stages.clone();
        Ok(Self {
            subject,
            section_id: section_id.into(),
            mode: BuildMode::Edit { level_id: level.id.clone(), level_index: level.level_index },
            name: level.name.clone(),
            title: level.title.clone(),
            icon: Some(level.icon.clone()),
            stages,
        })
    }

    pub fn set_details(
        &mut self,
        name: impl Into<String>,
        title: impl Into<String>,
        icon: Option<Icon>,
    ) {
        self.name = name.into();
        self.title = title.into();
        self.icon = icon;
    }

    /// Drop the current draft and validate every candidate in order.
    ///
    /// All stages are checked before anything is reported; violations carry
    /// a `stages[i].` prefix so the caller can point at the offending stage.
    /// The draft is only replaced when every stage passes.
    pub fn replace_all_stages(&mut self, candidates: &[StageData]) -> Result<()> {
        let game_type = self.stages.game_type;
        if let Some(limit) = catalog::stage_limit(game_type) {
            if candidates.len() > limit {
                return Err(AuthoringError::TooManyStages { game_type, limit });
            }
        }
        let mut fresh = StageList::new(self.subject, game_type)?;
        let mut violations = Vec::new();
        for (i, candidate) in candidates.iter().enumerate() {
            match validate_stage(self.subject, game_type, candidate) {
                Ok(stage) => fresh.stages.push(stage),
                Err(AuthoringError::ValidationFailed { violations: found }) => {
                    violations.extend(found.into_iter().map(|v| Violation {
                        field: format!("stages[{i}].{}", v.field),
                        message: v.message,
                    }));
                }
                Err(e) => return Err(e),
            }
        }
        if !violations.is_empty() {
            return Err(AuthoringError::ValidationFailed { violations });
        }
        self.stages = fresh;
        Ok(())
    }

    pub fn stages(&self) -> &StageList {
        &self.stages
    }

    pub fn stages_mut(&mut self) -> &mut StageList {
        &mut self.stages
    }

    pub fn game_type(&self) -> GameType {
        self.stages.game_type
    }

    pub fn is_edit(&self) -> bool {
        matches!(self.mode, BuildMode::Edit { .. })
    }

    /// Index the stored level keeps, when editing.
    pub fn existing_index(&self) -> Option<u32> {
        match &self.mode {
            BuildMode::Edit { level_index, .. } => Some(*level_index),
            BuildMode::Create => None,
        }
    }

    /// Level-level checks: name, title, at least one stage.
    pub fn build(&self) -> Result<NewLevel> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(AuthoringError::MissingRequiredField { field: "name" });
        }
        let title = self.title.trim();
        if title.is_empty() {
            return Err(AuthoringError::MissingRequiredField { field: "title" });
        }
        if self.stages.is_empty() {
            return Err(AuthoringError::EmptyStageList);
        }
        Ok(NewLevel {
            name: name.to_string(),
            title: title.to_string(),
            icon: catalog::icon_for(self.subject, self.game_type(), self.icon.as_ref())?,
            game_type: self.game_type(),
            stages: self.stages.stages().to_vec(),
        })
    }

    /// Create mode writes a new level at the next index; edit mode replaces
    /// name, title, icon and stages of the stored level in one write.
    #[instrument(
        level = "info",
        skip(self, gateway),
        fields(subject = %self.subject, section = %self.section_id)
    )]
    pub async fn persist<G>(&self, gateway: &G) -> Result<PersistedLevel>
    where
        G: PersistenceGateway + ?Sized,
    {
        let level = self.build()?;
        let persisted = match &self.mode {
            BuildMode::Create => {
                let level_index =
                    allocate_level_index(gateway, self.subject, &self.section_id).await?;
                let id = gateway
                    .insert_level(self.subject, &self.section_id, level_index, level)
                    .await?;
                PersistedLevel { id, level_index }
            }
            BuildMode::Edit { level_id, level_index } => {
                let patch = LevelPatch {
                    name: Some(level.name),
                    title: Some(level.title),
                    icon: Some(level.icon),
                    stages: Some(level.stages),
                };
                gateway.update_level(self.subject, &self.section_id, level_id, patch).await?;
                PersistedLevel { id: level_id.clone(), level_index: *level_index }
            }
        };
        info!(
            target: "authoring",
            id = %persisted.id,
            level_index = persisted.level_index,
            edit = self.is_edit(),
            "Level saved"
        );
        Ok(persisted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DuplicateSubjectPolicy;
    use crate::domain::NewSection;
    use crate::store::InMemoryStore;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn stage(value: serde_json::Value) -> StageData {
        serde_json::from_value(value).unwrap()
    }

    fn phonics(letter: &str) -> StageData {
        stage(json!({ "correctLetter": letter, "choices": [letter, "Z"] }))
    }

    async fn store_with_section(subject: Subject) -> (InMemoryStore, String) {
        let store = InMemoryStore::new(DuplicateSubjectPolicy::Reject);
        let section = NewSection {
            name: "Basics".into(),
            title: "Basics".into(),
            ..Default::default()
        };
        let id = store.create_section(subject, section).await.unwrap();
        (store, id)
    }

    #[test]
    fn second_catching_stage_is_refused_before_validation() {
        let mut list = StageList::new(Subject::Numbers, GameType::Catching).unwrap();
        list.add(&stage(json!({ "correctNumber": "7" }))).unwrap();

        // Valid or not, the second add hits the cap.
        assert_matches!(
            list.add(&stage(json!({ "correctNumber": "8" }))),
            Err(AuthoringError::TooManyStages { game_type: GameType::Catching, limit: 1 })
        );
        assert_matches!(list.add(&StageData::default()), Err(AuthoringError::TooManyStages { .. }));

        // Editing the single stage stays possible.
        list.replace(0, &stage(json!({ "correctNumber": "8" }))).unwrap();
        assert_eq!(list.stages()[0].correct_number.as_deref(), Some("8"));
    }

    #[test]
    fn catching_cap_applies_to_every_subject() {
        for subject in Subject::ALL {
            let mut list = StageList::new(subject, GameType::Catching).unwrap();
            list.stages.push(StageData::default());
            assert_matches!(
                list.add(&StageData::default()),
                Err(AuthoringError::TooManyStages { .. })
            );
        }
    }

    #[test]
    fn stage_order_is_preserved_and_editable() {
        let mut list = StageList::new(Subject::Alphabet, GameType::Phonics).unwrap();
        for letter in ["A", "B", "C"] {
            list.add(&phonics(letter)).unwrap();
        }
        list.remove(1).unwrap();
        let letters: Vec<_> = list
            .stages()
            .iter()
            .map(|s| s.correct_letter.clone().unwrap())
            .collect();
        assert_eq!(letters, vec!["A", "C"]);
        assert_matches!(list.remove(5), Err(AuthoringError::InvalidRequest(_)));
    }

    #[test]
    fn build_checks_name_title_and_stages() {
        let mut builder =
            LevelBuilder::create(Subject::Alphabet, "section1", GameType::Phonics).unwrap();
        builder.set_details("  ", "Title", None);
        assert_matches!(
            builder.build(),
            Err(AuthoringError::MissingRequiredField { field: "name" })
        );

        builder.set_details("Name", "", None);
        assert_matches!(
            builder.build(),
            Err(AuthoringError::MissingRequiredField { field: "title" })
        );

        builder.set_details("Name", "Title", None);
        assert_matches!(builder.build(), Err(AuthoringError::EmptyStageList));

        builder.stages_mut().add(&phonics("A")).unwrap();
        let level = builder.build().unwrap();
        assert_eq!(level.icon, Icon::default());
        assert_eq!(level.stages[0].game_type, Some(GameType::Phonics));
    }

    #[test]
    fn empty_section_starts_at_one() {
        assert_eq!(next_level_index(&[]), 1);
    }

    #[tokio::test]
    async fn create_mode_assigns_sequential_indices() {
        let (store, section) = store_with_section(Subject::Alphabet).await;

        let mut saved = Vec::new();
        for name in ["one", "two"] {
            let mut builder =
                LevelBuilder::create(Subject::Alphabet, &section, GameType::Phonics).unwrap();
            builder.set_details(name, name, None);
            builder.stages_mut().add(&phonics("A")).unwrap();
            saved.push(builder.persist(&store).await.unwrap().level_index);
        }
        assert_eq!(saved, vec![1, 2]);
    }

    #[tokio::test]
    async fn create_mode_fills_gaps_from_the_max() {
        let (store, section) = store_with_section(Subject::Colors).await;
        let mut seed = LevelBuilder::create(Subject::Colors, &section, GameType::Rocket).unwrap();
        seed.set_details("seed", "seed", None);
        seed.stages_mut().add(&stage(json!({ "correctChoice": "red" }))).unwrap();
        let template = seed.build().unwrap();
        for index in [1, 2, 4] {
            store.insert_level(Subject::Colors, &section, index, template.clone()).await.unwrap();
        }

        let persisted = seed.persist(&store).await.unwrap();
        assert_eq!(persisted.level_index, 5);
    }

    #[tokio::test]
    async fn no_op_edit_keeps_index_and_stage_order() {
        let (store, section) = store_with_section(Subject::Alphabet).await;
        let mut builder =
            LevelBuilder::create(Subject::Alphabet, &section, GameType::Mixed).unwrap();
        let icon = Icon { set: "Ionicons".into(), name: "star".into() };
        builder.set_details("Mixed", "Mixed letters", Some(icon));
        builder
            .stages_mut()
            .add(&stage(json!({
                "gameType": "sound",
                "soundPairs": [{ "letter": "a" }, { "letter": "b" }]
            })))
            .unwrap();
        let nested =
            stage(json!({ "gameType": "phonics", "correctLetter": "c", "choices": ["C", "D"] }));
        builder.stages_mut().add(&nested).unwrap();
        let created = builder.persist(&store).await.unwrap();
        let before = store
            .get_level(Subject::Alphabet, &section, &created.id)
            .await
            .unwrap()
            .unwrap();

        // Re-submit exactly what was stored.
        let mut edit = LevelBuilder::edit(Subject::Alphabet, &section, &before).unwrap();
        edit.replace_all_stages(&before.stages).unwrap();
        let saved = edit.persist(&store).await.unwrap();

        let after = store
            .get_level(Subject::Alphabet, &section, &created.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(saved, created);
        assert_eq!(after.level_index, before.level_index);
        assert_eq!(after.stages, before.stages);
        assert_eq!(after.icon, before.icon);
        assert_eq!(store.list_levels(Subject::Alphabet, &section).await.unwrap().len(), 1);
    }

    #[test]
    fn every_invalid_stage_is_reported_with_its_position() {
        let mut builder =
            LevelBuilder::create(Subject::Numbers, "section1", GameType::Counting).unwrap();
        let valid =
            stage(json!({ "correctAnswer": "2", "imageCount": 2, "choices": ["1", "2", "3"] }));
        builder.stages_mut().add(&valid).unwrap();

        let err = builder
            .replace_all_stages(&[
                stage(json!({ "correctAnswer": "5", "choices": ["1", "2", "3"] })),
                stage(json!({ "choices": ["1"] })),
            ])
            .unwrap_err();
        let fields: Vec<String> = err.violations().iter().map(|v| v.field.clone()).collect();
        assert!(fields.contains(&"stages[0].choices".to_string()), "{fields:?}");
        for field in ["stages[1].correctAnswer", "stages[1].imageCount", "stages[1].choices"] {
            assert!(fields.contains(&field.to_string()), "{field} missing from {fields:?}");
        }
        assert!(fields.iter().all(|f| f.starts_with("stages[")));
        // The previous draft is left alone.
        assert_eq!(builder.stages().stages().len(), 1);
    }

    #[test]
    fn stage_cap_is_checked_before_any_stage() {
        let mut builder =
            LevelBuilder::create(Subject::Shapes, "section1", GameType::Catching).unwrap();
        assert_matches!(
            builder.replace_all_stages(&[StageData::default(), StageData::default()]),
            Err(AuthoringError::TooManyStages { limit: 1, .. })
        );
    }

    #[tokio::test]
    async fn edit_of_missing_level_reports_not_found() {
        let (store, section) = store_with_section(Subject::Shapes).await;
        let mut builder =
            LevelBuilder::create(Subject::Shapes, &section, GameType::Racing).unwrap();
        builder.set_details("Race", "Race", None);
        builder.stages_mut().add(&stage(json!({ "correctShape": "rhombus" }))).unwrap();
        let created = builder.persist(&store).await.unwrap();
        let level = store.get_level(Subject::Shapes, &section, &created.id).await.unwrap().unwrap();

        store.delete_level(Subject::Shapes, &section, &created.id).await.unwrap();
        let edit = LevelBuilder::edit(Subject::Shapes, &section, &level).unwrap();
        assert_matches!(
            edit.persist(&store).await,
            Err(AuthoringError::NotFound { entity: "level", .. })
        );
    }
}
