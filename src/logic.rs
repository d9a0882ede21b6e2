//! Core behaviors shared by the HTTP handlers and WebSocket sessions.
//!
//! Handlers parse path/body input and call into here; everything returns
//! `Result<_, AuthoringError>` so both transports render failures the same way.

use tracing::{info, instrument};

use crate::builder::{self, LevelBuilder};
use crate::catalog;
use crate::domain::{
    GameType, Level, NewSection, Section, SectionPatch, StageData, Subject, SubjectDoc,
    SubjectRecord,
};
use crate::error::{AuthoringError, Result};
use crate::protocol::{
    CatalogOut, GameTypeOut, LevelIn, LevelUpdateIn, OverviewOut, SectionOverview,
    SubjectCatalogOut, SubjectIn, ValidateStageIn,
};
use crate::sections::validate_new_section;
use crate::state::AppState;
use crate::util::non_empty;
use crate::validator;

pub fn parse_subject(raw: &str) -> Result<Subject> {
    raw.parse()
}

/// Everything a form needs to render its game type and option pickers.
pub fn catalog_out() -> CatalogOut {
    let subjects = Subject::ALL
        .into_iter()
        .map(|subject| SubjectCatalogOut {
            subject,
            icon_policy: catalog::icon_policy(subject),
            game_types: catalog::entries_for(subject)
                .map(|e| GameTypeOut {
                    game_type: e.game_type,
                    required_fields: e.required_fields,
                    icon: e.icon.to_icon(),
                    stage_limit: catalog::stage_limit(e.game_type),
                    mixed_subtypes: if e.game_type == GameType::Mixed {
                        catalog::mixed_subtypes(subject).to_vec()
                    } else {
                        Vec::new()
                    },
                })
                .collect(),
        })
        .collect();
    CatalogOut {
        subjects,
        colors: catalog::COLOR_LIBRARY,
        catch_colors: catalog::CATCH_COLORS,
        shapes: catalog::SHAPE_LIBRARY,
        catch_shapes: catalog::CATCH_SHAPES,
    }
}

#[instrument(level = "info", skip(state, body), fields(id = %body.id))]
pub async fn create_subject(state: &AppState, body: SubjectIn) -> Result<SubjectRecord> {
    let subject = parse_subject(&body.id)?;
    let name = non_empty(Some(body.name))
        .ok_or(AuthoringError::MissingRequiredField { field: "name" })?;
    state.store.create_subject(subject, SubjectDoc { name, description: body.description }).await?;
    get_subject(state, subject).await
}

pub async fn get_subject(state: &AppState, subject: Subject) -> Result<SubjectRecord> {
    state
        .store
        .get_subject(subject)
        .await?
        .ok_or_else(|| AuthoringError::not_found("subject", subject.as_str()))
}

#[instrument(level = "info", skip(state, section))]
pub async fn create_section(
    state: &AppState,
    subject: Subject,
    section: NewSection,
) -> Result<Section> {
    let section = validate_new_section(&section)?;
    let id = state.store.create_section(subject, section).await?;
    info!(target: "authoring", %subject, section = %id, "Section created");
    get_section(state, subject, &id).await
}

pub async fn get_section(state: &AppState, subject: Subject, section_id: &str) -> Result<Section> {
    state
        .store
        .get_section(subject, section_id)
        .await?
        .ok_or_else(|| AuthoringError::not_found("section", section_id))
}

/// Name and title may be changed but not blanked.
#[instrument(level = "info", skip(state, patch))]
pub async fn update_section(
    state: &AppState,
    subject: Subject,
    section_id: &str,
    patch: SectionPatch,
) -> Result<Section> {
    for (field, value) in [("name", &patch.name), ("title", &patch.title)] {
        if matches!(value.as_deref().map(str::trim), Some("")) {
            return Err(AuthoringError::MissingRequiredField { field });
        }
    }
    let patch = SectionPatch {
        name: non_empty(patch.name),
        title: non_empty(patch.title),
        ..patch
    };
    state.store.update_section(subject, section_id, patch).await?;
    get_section(state, subject, section_id).await
}

pub async fn get_level(
    state: &AppState,
    subject: Subject,
    section_id: &str,
    level_id: &str,
) -> Result<Level> {
    state
        .store
        .get_level(subject, section_id, level_id)
        .await?
        .ok_or_else(|| AuthoringError::not_found("level", level_id))
}

/// Validate every stage in order, then write the level at the next index.
#[instrument(
    level = "info",
    skip(state, body),
    fields(game_type = %body.game_type, stages = body.stages.len())
)]
pub async fn create_level(
    state: &AppState,
    subject: Subject,
    section_id: &str,
    body: LevelIn,
) -> Result<Level> {
    let game_type = catalog::resolve(subject, &body.game_type)?;
    let mut builder = LevelBuilder::create(subject, section_id, game_type)?;
    builder.set_details(body.name, body.title, body.icon);
    builder.replace_all_stages(&body.stages)?;
    let persisted = builder.persist(state.store.as_ref()).await?;
    get_level(state, subject, section_id, &persisted.id).await
}

/// Full replace of name, title, icon and stages; index and game type stay.
#[instrument(level = "info", skip(state, body), fields(stages = body.stages.len()))]
pub async fn update_level(
    state: &AppState,
    subject: Subject,
    section_id: &str,
    level_id: &str,
    body: LevelUpdateIn,
) -> Result<Level> {
    let existing = get_level(state, subject, section_id, level_id).await?;
    let mut builder = LevelBuilder::edit(subject, section_id, &existing)?;
    builder.set_details(body.name, body.title, body.icon);
    builder.replace_all_stages(&body.stages)?;
    builder.persist(state.store.as_ref()).await?;
    get_level(state, subject, section_id, level_id).await
}

pub fn validate_stage(body: &ValidateStageIn) -> Result<StageData> {
    let subject = parse_subject(&body.subject)?;
    let game_type = catalog::resolve(subject, &body.game_type)?;
    validator::validate_stage(subject, game_type, &body.stage)
}

/// Sections of a subject with their levels, both in display order.
#[instrument(level = "info", skip(state))]
pub async fn overview(state: &AppState, subject: Subject) -> Result<OverviewOut> {
    let mut sections = Vec::new();
    for section in state.store.list_sections(subject).await? {
        let levels = state.store.list_levels(subject, &section.id).await?;
        sections.push(SectionOverview { section, levels });
    }
    Ok(OverviewOut { subject, sections })
}

/// Index the next created level would get. A preview, not a reservation.
pub async fn next_level_index(state: &AppState, subject: Subject, section_id: &str) -> Result<u32> {
    get_section(state, subject, section_id).await?;
    builder::allocate_level_index(state.store.as_ref(), subject, section_id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::config::DuplicateSubjectPolicy;
    use crate::store::InMemoryStore;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn state() -> AppState {
        AppState::with_store(Arc::new(InMemoryStore::new(DuplicateSubjectPolicy::Reject)))
    }

    fn level_in(value: serde_json::Value) -> LevelIn {
        serde_json::from_value(value).unwrap()
    }

    async fn section(state: &AppState, subject: Subject) -> Section {
        let new = NewSection {
            name: "Basics".into(),
            title: "Basics".into(),
            ..Default::default()
        };
        create_section(state, subject, new).await.unwrap()
    }

    #[test]
    fn catalog_lists_every_subject_and_marks_catching_cap() {
        let out = catalog_out();
        assert_eq!(out.subjects.len(), 4);
        let numbers = out.subjects.iter().find(|s| s.subject == Subject::Numbers).unwrap();
        let catching = numbers
            .game_types
            .iter()
            .find(|g| g.game_type == GameType::Catching)
            .unwrap();
        assert_eq!(catching.stage_limit, Some(1));
        let alphabet = &out.subjects[0];
        let mixed = alphabet.game_types.iter().find(|g| g.game_type == GameType::Mixed).unwrap();
        assert_eq!(mixed.mixed_subtypes.len(), 4);
    }

    #[tokio::test]
    async fn colors_level_gets_fixed_icon() {
        let state = state();
        let section = section(&state, Subject::Colors).await;
        let body = level_in(json!({
            "name": "Rocket",
            "title": "Pick the red rocket",
            "icon": { "set": "MaterialIcons", "name": "face" },
            "gameType": "rocket",
            "stages": [{ "correctChoice": "Red" }]
        }));
        let level = create_level(&state, Subject::Colors, &section.id, body).await.unwrap();
        assert_eq!(level.level_index, 1);
        assert_eq!(level.icon.name, "rocket");
        assert_eq!(level.stages[0].correct_choice.as_deref(), Some("red"));
    }

    #[tokio::test]
    async fn invalid_stage_blocks_the_whole_level() {
        let state = state();
        let section = section(&state, Subject::Numbers).await;
        let body = level_in(json!({
            "name": "Count",
            "title": "Count",
            "gameType": "counting",
            "stages": [
                { "correctAnswer": "2", "imageCount": 2, "choices": ["1", "2", "3"] },
                { "correctAnswer": "5", "imageCount": 5, "choices": ["1", "2", "3"] }
            ]
        }));
        assert_matches!(
            create_level(&state, Subject::Numbers, &section.id, body).await,
            Err(AuthoringError::ValidationFailed { ref violations })
                if violations.len() == 1 && violations[0].field == "stages[1].choices"
        );
        assert!(state.store.list_levels(Subject::Numbers, &section.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn second_catching_stage_in_request_is_rejected() {
        let state = state();
        let section = section(&state, Subject::Shapes).await;
        let body = level_in(json!({
            "name": "Catch",
            "title": "Catch",
            "gameType": "catching",
            "stages": [{ "correctShape": "star" }, { "correctShape": "heart" }]
        }));
        assert_matches!(
            create_level(&state, Subject::Shapes, &section.id, body).await,
            Err(AuthoringError::TooManyStages { .. })
        );
    }

    #[tokio::test]
    async fn update_replaces_fields_but_keeps_index_and_type() {
        let state = state();
        let section = section(&state, Subject::Alphabet).await;
        let created = create_level(
            &state,
            Subject::Alphabet,
            &section.id,
            level_in(json!({
                "name": "Trace",
                "title": "Trace A",
                "gameType": "tracing",
                "stages": [{ "letter": "a", "strokeOrder": ["left", "right", "across"] }]
            })),
        )
        .await
        .unwrap();

        let body: LevelUpdateIn = serde_json::from_value(json!({
            "name": "Trace B",
            "title": "Trace B",
            "stages": [{ "letter": "b", "strokeOrder": ["down", "bump", "bump"] }]
        }))
        .unwrap();
        let updated = update_level(&state, Subject::Alphabet, &section.id, &created.id, body)
            .await
            .unwrap();

        assert_eq!(updated.level_index, created.level_index);
        assert_eq!(updated.game_type, GameType::Tracing);
        assert_eq!(updated.stages.len(), 1);
        assert_eq!(updated.stages[0].letter.as_deref(), Some("B"));
    }

    #[tokio::test]
    async fn next_index_preview_needs_a_section() {
        let state = state();
        assert_matches!(
            next_level_index(&state, Subject::Colors, "section1").await,
            Err(AuthoringError::NotFound { entity: "section", .. })
        );
        let section = section(&state, Subject::Colors).await;
        assert_eq!(next_level_index(&state, Subject::Colors, &section.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn section_title_cannot_be_blanked() {
        let state = state();
        let section = section(&state, Subject::Numbers).await;
        let patch = SectionPatch { title: Some(" ".into()), ..Default::default() };
        assert_matches!(
            update_section(&state, Subject::Numbers, &section.id, patch).await,
            Err(AuthoringError::MissingRequiredField { field: "title" })
        );
    }

    #[test]
    fn validate_stage_resolves_names() {
        let body: ValidateStageIn = serde_json::from_value(json!({
            "subject": "colors",
            "gameType": "tracing",
            "stage": {}
        }))
        .unwrap();
        assert_matches!(validate_stage(&body), Err(AuthoringError::UnknownGameType { .. }));
    }
}
