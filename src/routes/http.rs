//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented; failures render through `AuthoringError`.

use std::sync::Arc;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use tracing::{info, instrument};

use crate::domain::{Level, NewSection, Section, SectionPatch, SubjectPatch, SubjectRecord};
use crate::error::Result;
use crate::logic::{self, parse_subject};
use crate::protocol::*;
use crate::state::AppState;

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse {
    Json(HealthOut { ok: true })
}

#[instrument(level = "info")]
pub async fn http_get_catalog() -> impl IntoResponse {
    Json(logic::catalog_out())
}

#[instrument(level = "info", skip(state))]
pub async fn http_list_subjects(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<SubjectRecord>>> {
    Ok(Json(state.store.list_subjects().await?))
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_create_subject(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SubjectIn>,
) -> Result<(StatusCode, Json<SubjectRecord>)> {
    let record = logic::create_subject(&state, body).await?;
    info!(target: "levelcraft", id = %record.id, "HTTP subject created");
    Ok((StatusCode::CREATED, Json(record)))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_subject(
    State(state): State<Arc<AppState>>,
    Path(subject): Path<String>,
) -> Result<Json<SubjectRecord>> {
    let subject = parse_subject(&subject)?;
    Ok(Json(logic::get_subject(&state, subject).await?))
}

#[instrument(level = "info", skip(state, patch))]
pub async fn http_update_subject(
    State(state): State<Arc<AppState>>,
    Path(subject): Path<String>,
    Json(patch): Json<SubjectPatch>,
) -> Result<Json<SubjectRecord>> {
    let subject = parse_subject(&subject)?;
    state.store.update_subject(subject, patch).await?;
    Ok(Json(logic::get_subject(&state, subject).await?))
}

#[instrument(level = "info", skip(state))]
pub async fn http_delete_subject(
    State(state): State<Arc<AppState>>,
    Path(subject): Path<String>,
) -> Result<StatusCode> {
    let subject = parse_subject(&subject)?;
    state.store.delete_subject(subject).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(level = "info", skip(state))]
pub async fn http_overview(
    State(state): State<Arc<AppState>>,
    Path(subject): Path<String>,
) -> Result<Json<OverviewOut>> {
    let subject = parse_subject(&subject)?;
    Ok(Json(logic::overview(&state, subject).await?))
}

#[instrument(level = "info", skip(state))]
pub async fn http_list_sections(
    State(state): State<Arc<AppState>>,
    Path(subject): Path<String>,
) -> Result<Json<Vec<Section>>> {
    let subject = parse_subject(&subject)?;
    Ok(Json(state.store.list_sections(subject).await?))
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_create_section(
    State(state): State<Arc<AppState>>,
    Path(subject): Path<String>,
    Json(body): Json<NewSection>,
) -> Result<(StatusCode, Json<Section>)> {
    let subject = parse_subject(&subject)?;
    let section = logic::create_section(&state, subject, body).await?;
    info!(target: "levelcraft", %subject, id = %section.id, "HTTP section created");
    Ok((StatusCode::CREATED, Json(section)))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_section(
    State(state): State<Arc<AppState>>,
    Path((subject, section_id)): Path<(String, String)>,
) -> Result<Json<Section>> {
    let subject = parse_subject(&subject)?;
    Ok(Json(logic::get_section(&state, subject, &section_id).await?))
}

#[instrument(level = "info", skip(state, patch))]
pub async fn http_update_section(
    State(state): State<Arc<AppState>>,
    Path((subject, section_id)): Path<(String, String)>,
    Json(patch): Json<SectionPatch>,
) -> Result<Json<Section>> {
    let subject = parse_subject(&subject)?;
    Ok(Json(logic::update_section(&state, subject, &section_id, patch).await?))
}

/// Levels under the section are left in place.
#[instrument(level = "info", skip(state))]
pub async fn http_delete_section(
    State(state): State<Arc<AppState>>,
    Path((subject, section_id)): Path<(String, String)>,
) -> Result<StatusCode> {
    let subject = parse_subject(&subject)?;
    state.store.delete_section(subject, &section_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(level = "info", skip(state))]
pub async fn http_next_level_index(
    State(state): State<Arc<AppState>>,
    Path((subject, section_id)): Path<(String, String)>,
) -> Result<Json<NextIndexOut>> {
    let subject = parse_subject(&subject)?;
    let level_index = logic::next_level_index(&state, subject, &section_id).await?;
    Ok(Json(NextIndexOut { level_index }))
}

#[instrument(level = "info", skip(state))]
pub async fn http_list_levels(
    State(state): State<Arc<AppState>>,
    Path((subject, section_id)): Path<(String, String)>,
) -> Result<Json<Vec<Level>>> {
    let subject = parse_subject(&subject)?;
    Ok(Json(state.store.list_levels(subject, &section_id).await?))
}

#[instrument(level = "info", skip(state, body), fields(game_type = %body.game_type))]
pub async fn http_create_level(
    State(state): State<Arc<AppState>>,
    Path((subject, section_id)): Path<(String, String)>,
    Json(body): Json<LevelIn>,
) -> Result<(StatusCode, Json<Level>)> {
    let subject = parse_subject(&subject)?;
    let level = logic::create_level(&state, subject, &section_id, body).await?;
    info!(
        target: "levelcraft",
        %subject,
        section = %section_id,
        id = %level.id,
        level_index = level.level_index,
        "HTTP level created"
    );
    Ok((StatusCode::CREATED, Json(level)))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_level(
    State(state): State<Arc<AppState>>,
    Path((subject, section_id, level_id)): Path<(String, String, String)>,
) -> Result<Json<Level>> {
    let subject = parse_subject(&subject)?;
    Ok(Json(logic::get_level(&state, subject, &section_id, &level_id).await?))
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_update_level(
    State(state): State<Arc<AppState>>,
    Path((subject, section_id, level_id)): Path<(String, String, String)>,
    Json(body): Json<LevelUpdateIn>,
) -> Result<Json<Level>> {
    let subject = parse_subject(&subject)?;
    let level = logic::update_level(&state, subject, &section_id, &level_id, body).await?;
    info!(
        target: "levelcraft",
        %subject,
        section = %section_id,
        id = %level.id,
        "HTTP level updated"
    );
    Ok(Json(level))
}

#[instrument(level = "info", skip(state))]
pub async fn http_delete_level(
    State(state): State<Arc<AppState>>,
    Path((subject, section_id, level_id)): Path<(String, String, String)>,
) -> Result<StatusCode> {
    let subject = parse_subject(&subject)?;
    state.store.delete_level(subject, &section_id, &level_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(
    level = "info",
    skip(body),
    fields(subject = %body.subject, game_type = %body.game_type)
)]
pub async fn http_validate_stage(
    Json(body): Json<ValidateStageIn>,
) -> Result<Json<ValidateStageOut>> {
    let stage = logic::validate_stage(&body)?;
    Ok(Json(ValidateStageOut { stage }))
}
