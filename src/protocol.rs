//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Field names are camelCase to match the stored document shape.

use serde::{Deserialize, Serialize};

use crate::builder::PersistedLevel;
use crate::catalog::{self, IconPolicy};
use crate::domain::{GameType, Icon, Level, NewSection, Section, StageData, Subject};
use crate::error::{AuthoringError, Violation};
use crate::wizard::{Mode, Step, Wizard};

/// Messages the client can send over WebSocket. One socket drives one wizard.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    /// Reset the session, optionally switching between create and edit.
    Start {
        #[serde(default)]
        mode: Mode,
    },
    GetSession,
    ChooseSubject {
        subject: String,
    },
    ChooseSection {
        #[serde(rename = "sectionId")]
        section_id: String,
    },
    CreateSection {
        section: NewSection,
    },
    ChooseGameType {
        #[serde(rename = "gameType")]
        game_type: String,
    },
    ChooseLevel {
        #[serde(rename = "levelId")]
        level_id: String,
    },
    SetDetails {
        name: String,
        title: String,
        #[serde(default)]
        icon: Option<Icon>,
    },
    AddStage {
        stage: StageData,
    },
    ReplaceStage {
        index: usize,
        stage: StageData,
    },
    RemoveStage {
        index: usize,
    },
    Save,
    Back,
    Cancel,
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Session {
        session: SessionView,
    },
    Saved {
        level: PersistedLevel,
        session: SessionView,
    },
    Error {
        code: String,
        message: String,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        violations: Vec<Violation>,
    },
}

impl From<&AuthoringError> for ServerWsMessage {
    fn from(e: &AuthoringError) -> Self {
        ServerWsMessage::Error {
            code: e.code().to_string(),
            message: e.to_string(),
            violations: e.violations().to_vec(),
        }
    }
}

/// Snapshot of a wizard session sent after every accepted message.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub mode: Mode,
    pub step: Step,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<Subject>,
    pub sections: Vec<Section>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<Section>,
    pub levels: Vec<Level>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_level_index: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draft: Option<DraftView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persisted: Option<PersistedLevel>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftView {
    pub game_type: GameType,
    pub name: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<Icon>,
    pub stages: Vec<StageData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage_limit: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level_index: Option<u32>,
}

/// Convert the internal wizard to the public view.
pub fn to_view(w: &Wizard) -> SessionView {
    SessionView {
        mode: w.mode(),
        step: w.step(),
        subject: w.subject(),
        sections: w.sections().to_vec(),
        section: w.section().cloned(),
        levels: w.levels().to_vec(),
        next_level_index: w.next_level_index(),
        draft: w.builder().map(|b| DraftView {
            game_type: b.game_type(),
            name: b.name.clone(),
            title: b.title.clone(),
            icon: b.icon.clone(),
            stages: b.stages().stages().to_vec(),
            stage_limit: catalog::stage_limit(b.game_type()),
            level_index: b.existing_index(),
        }),
        persisted: w.persisted().cloned(),
    }
}

//
// HTTP request/response DTOs
//

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogOut {
    pub subjects: Vec<SubjectCatalogOut>,
    pub colors: &'static [&'static str],
    pub catch_colors: &'static [&'static str],
    pub shapes: &'static [&'static str],
    pub catch_shapes: &'static [&'static str],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectCatalogOut {
    pub subject: Subject,
    pub icon_policy: IconPolicy,
    pub game_types: Vec<GameTypeOut>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameTypeOut {
    pub game_type: GameType,
    pub required_fields: &'static [&'static str],
    pub icon: Icon,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage_limit: Option<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub mixed_subtypes: Vec<GameType>,
}

/// Body of `POST /subjects`.
#[derive(Debug, Deserialize)]
pub struct SubjectIn {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Body of `POST .../levels`. Missing name or title is reported by the
/// level checks, not by the JSON extractor.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelIn {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub icon: Option<Icon>,
    pub game_type: String,
    #[serde(default)]
    pub stages: Vec<StageData>,
}

/// Body of `PUT .../levels/{level}`: full replace, game type is fixed.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelUpdateIn {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub icon: Option<Icon>,
    #[serde(default)]
    pub stages: Vec<StageData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateStageIn {
    pub subject: String,
    pub game_type: String,
    pub stage: StageData,
}

#[derive(Debug, Serialize)]
pub struct ValidateStageOut {
    pub stage: StageData,
}

#[derive(Debug, Serialize)]
pub struct OverviewOut {
    pub subject: Subject,
    pub sections: Vec<SectionOverview>,
}

#[derive(Debug, Serialize)]
pub struct SectionOverview {
    #[serde(flatten)]
    pub section: Section,
    pub levels: Vec<Level>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NextIndexOut {
    pub level_index: u32,
}
