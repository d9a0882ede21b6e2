//! Domain models: subjects, sections, levels and the stage record shared by every game type.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::error::AuthoringError;

/// The closed set of subjects the game teaches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subject {
    Alphabet,
    Numbers,
    Colors,
    Shapes,
}

impl Subject {
    pub const ALL: [Subject; 4] = [
        Subject::Alphabet,
        Subject::Numbers,
        Subject::Colors,
        Subject::Shapes,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Subject::Alphabet => "alphabet",
            Subject::Numbers => "numbers",
            Subject::Colors => "colors",
            Subject::Shapes => "shapes",
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Subject {
    type Err = AuthoringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Subject::ALL
            .into_iter()
            .find(|subject| subject.as_str() == s.trim())
            .ok_or_else(|| AuthoringError::UnknownSubject(s.to_string()))
    }
}

/// Every game type known to the authoring tool. Which ones a subject
/// accepts is decided by the catalog, not by this enum.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GameType {
    Mixed,
    Phonics,
    Image,
    Catching,
    Tracing,
    Cards,
    Sound,
    Matching,
    Counting,
    Dragndrop,
    ColorMultipleChoice,
    Rocket,
    ShapesMultipleChoice,
    RocketShapes,
    Racing,
}

impl GameType {
    pub const ALL: [GameType; 15] = [
        GameType::Mixed,
        GameType::Phonics,
        GameType::Image,
        GameType::Catching,
        GameType::Tracing,
        GameType::Cards,
        GameType::Sound,
        GameType::Matching,
        GameType::Counting,
        GameType::Dragndrop,
        GameType::ColorMultipleChoice,
        GameType::Rocket,
        GameType::ShapesMultipleChoice,
        GameType::RocketShapes,
        GameType::Racing,
    ];

    /// Wire name, identical to the serde representation.
    pub fn as_str(self) -> &'static str {
        match self {
            GameType::Mixed => "mixed",
            GameType::Phonics => "phonics",
            GameType::Image => "image",
            GameType::Catching => "catching",
            GameType::Tracing => "tracing",
            GameType::Cards => "cards",
            GameType::Sound => "sound",
            GameType::Matching => "matching",
            GameType::Counting => "counting",
            GameType::Dragndrop => "dragndrop",
            GameType::ColorMultipleChoice => "colorMultipleChoice",
            GameType::Rocket => "rocket",
            GameType::ShapesMultipleChoice => "shapesMultipleChoice",
            GameType::RocketShapes => "rocketShapes",
            GameType::Racing => "racing",
        }
    }

    pub fn parse(s: &str) -> Option<GameType> {
        GameType::ALL.into_iter().find(|gt| gt.as_str() == s.trim())
    }
}

impl fmt::Display for GameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Icon reference understood by the mobile app (icon set + glyph name).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Icon {
    pub set: String,
    pub name: String,
}

impl Default for Icon {
    fn default() -> Self {
        Icon { set: "MaterialIcons".into(), name: "star".into() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardPair {
    #[serde(default)]
    pub letter: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_name: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoundPair {
    pub letter: String,
    /// Derived as `sound_<LETTER>` during normalization.
    #[serde(default)]
    pub sound_id: String,
}

/// A stage as authored: the union of every field any game type reads.
///
/// Candidates arrive partially filled; the validator decides which fields
/// matter for the (subject, game type) pair and returns a normalized copy
/// tagged with its concrete game type. Fields nobody validates (images,
/// audio paths, prompts) are kept verbatim in `extra`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_type: Option<GameType>,

    // alphabet
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_letter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_letters: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub letter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_order: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_pairs: Option<Vec<CardPair>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sound_pairs: Option<Vec<SoundPair>>,

    // numbers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_count: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_number: Option<String>,

    // colors
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_choice: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colors: Option<Vec<String>>,

    // shapes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_shape: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Subject document as stored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectRecord {
    pub id: Subject,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct SubjectDoc {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct SubjectPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    /// `section1`, `section2`, ...
    pub id: String,
    pub name: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSection {
    pub name: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub background_image: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub background_image: Option<String>,
}

/// Level document as stored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Level {
    pub id: String,
    pub level_index: u32,
    pub name: String,
    pub title: String,
    pub icon: Icon,
    pub game_type: GameType,
    pub stages: Vec<StageData>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A validated level without its index or identity.
#[derive(Clone, Debug, PartialEq)]
pub struct NewLevel {
    pub name: String,
    pub title: String,
    pub icon: Icon,
    pub game_type: GameType,
    pub stages: Vec<StageData>,
}

/// Replace-style update. `game_type` and `level_index` are deliberately absent.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LevelPatch {
    pub name: Option<String>,
    pub title: Option<String>,
    pub icon: Option<Icon>,
    pub stages: Option<Vec<StageData>>,
}
