//! Static game-type catalog: which game types each subject offers, the
//! fields their stages require, default icons and the option libraries
//! used by color and shape games.
//!
//! The tables are immutable and built once on first use.

use std::collections::HashMap;
use std::sync::LazyLock;

use serde::Serialize;

use crate::domain::{GameType, Icon, Subject};
use crate::error::{AuthoringError, Result};

/// Placeholder value of an unselected color slot in the matching form.
pub const UNSET_COLOR: &str = "-";

pub const COLOR_LIBRARY: &[&str] = &[
    "red", "orange", "yellow", "gray", "brown", "green", "white", "black", "pink", "violet", "blue",
];

/// Colors the catching game can render (no gray, brown or pink sprites).
pub const CATCH_COLORS: &[&str] = &[
    "black", "blue", "green", "orange", "red", "violet", "white", "yellow",
];

pub const SHAPE_LIBRARY: &[&str] = &[
    "circle", "square", "triangle", "star", "heart", "diamond", "rectangle", "oval", "crescent",
];

/// Shapes for catching and racing; rhombus replaces diamond.
pub const CATCH_SHAPES: &[&str] = &[
    "circle", "crescent", "heart", "oval", "rectangle", "rhombus", "square", "star", "triangle",
];

pub const VOWELS: &[&str] = &["A", "E", "I", "O", "U"];

/// Concrete game types a stage of an alphabet `mixed` level may declare.
pub const ALPHABET_MIXED_SUBTYPES: &[GameType] =
    &[GameType::Phonics, GameType::Image, GameType::Cards, GameType::Sound];

/// Whether the level icon comes from this table or from the author.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum IconPolicy {
    Fixed,
    UserChosen,
}

#[derive(Clone, Copy, Debug)]
pub struct IconDef {
    pub set: &'static str,
    pub name: &'static str,
}

impl IconDef {
    pub fn to_icon(self) -> Icon {
        Icon { set: self.set.to_string(), name: self.name.to_string() }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct CatalogEntry {
    pub subject: Subject,
    pub game_type: GameType,
    pub required_fields: &'static [&'static str],
    pub icon: IconDef,
}

const fn material(name: &'static str) -> IconDef {
    IconDef { set: "MaterialIcons", name }
}

const fn fa5(name: &'static str) -> IconDef {
    IconDef { set: "FontAwesome5", name }
}

const fn entry(
    subject: Subject,
    game_type: GameType,
    required_fields: &'static [&'static str],
    icon: IconDef,
) -> CatalogEntry {
    CatalogEntry { subject, game_type, required_fields, icon }
}

use GameType as G;
use Subject as S;

/// Listing order is the order game types are offered in the wizard.
const ENTRIES: &[CatalogEntry] = &[
    entry(S::Alphabet, G::Phonics, &["correctLetter", "choices"], material("volume-up")),
    entry(S::Alphabet, G::Image, &["correctLetter", "choices"], material("image")),
    entry(S::Alphabet, G::Catching, &["correctLetter", "choices"], material("shopping-basket")),
    entry(S::Alphabet, G::Tracing, &["letter", "strokeOrder"], material("create")),
    entry(S::Alphabet, G::Cards, &["cardPairs"], material("style")),
    entry(S::Alphabet, G::Sound, &["soundPairs"], material("volume-up")),
    entry(S::Alphabet, G::Matching, &["cardPairs"], material("extension")),
    entry(S::Alphabet, G::Mixed, &["gameType"], material("star")),
    entry(
        S::Numbers,
        G::Counting,
        &["correctAnswer", "imageCount", "choices"],
        material("filter-9-plus"),
    ),
    entry(S::Numbers, G::Dragndrop, &["correctCount"], material("touch-app")),
    entry(S::Numbers, G::Catching, &["correctNumber"], material("shopping-basket")),
    entry(S::Colors, G::ColorMultipleChoice, &["correctColor"], material("palette")),
    entry(S::Colors, G::Rocket, &["correctChoice"], fa5("rocket")),
    entry(S::Colors, G::Matching, &["colors"], material("extension")),
    entry(S::Colors, G::Catching, &["correctColor"], material("shopping-basket")),
    entry(S::Shapes, G::ShapesMultipleChoice, &["correctShape"], material("category")),
    entry(S::Shapes, G::RocketShapes, &["correctShape"], fa5("rocket")),
    entry(S::Shapes, G::Catching, &["correctShape"], material("shopping-basket")),
    entry(S::Shapes, G::Racing, &["correctShape"], fa5("car")),
];

static CATALOG: LazyLock<HashMap<(Subject, GameType), CatalogEntry>> =
    LazyLock::new(|| ENTRIES.iter().map(|e| ((e.subject, e.game_type), *e)).collect());

/// Look up the entry for a (subject, game type) pair.
pub fn lookup(subject: Subject, game_type: GameType) -> Result<&'static CatalogEntry> {
    CATALOG.get(&(subject, game_type)).ok_or_else(|| AuthoringError::UnknownGameType {
        subject,
        game_type: game_type.to_string(),
    })
}

/// Parse a raw game type name in the context of a subject.
pub fn resolve(subject: Subject, raw: &str) -> Result<GameType> {
    let unknown = || AuthoringError::UnknownGameType { subject, game_type: raw.to_string() };
    let game_type = GameType::parse(raw).ok_or_else(unknown)?;
    lookup(subject, game_type).map(|e| e.game_type)
}

pub fn entries_for(subject: Subject) -> impl Iterator<Item = &'static CatalogEntry> {
    ENTRIES.iter().filter(move |e| e.subject == subject)
}

pub fn icon_policy(subject: Subject) -> IconPolicy {
    match subject {
        Subject::Colors | Subject::Shapes => IconPolicy::Fixed,
        Subject::Alphabet | Subject::Numbers => IconPolicy::UserChosen,
    }
}

/// Resolve the icon a level will be stored with.
///
/// Colors and shapes always take the catalog icon. Alphabet and numbers keep
/// whatever the author typed (no existence check) and fall back to
/// `MaterialIcons/star` when nothing usable was given.
pub fn icon_for(subject: Subject, game_type: GameType, requested: Option<&Icon>) -> Result<Icon> {
    let entry = lookup(subject, game_type)?;
    let icon = match icon_policy(subject) {
        IconPolicy::Fixed => entry.icon.to_icon(),
        IconPolicy::UserChosen => match requested {
            Some(icon) if !icon.set.trim().is_empty() && !icon.name.trim().is_empty() => Icon {
                set: icon.set.trim().to_string(),
                name: icon.name.trim().to_string(),
            },
            _ => Icon::default(),
        },
    };
    Ok(icon)
}

/// Stage cap for a level of this game type, if any.
pub fn stage_limit(game_type: GameType) -> Option<usize> {
    match game_type {
        GameType::Catching => Some(1),
        _ => None,
    }
}

/// Concrete types a `mixed` stage of this subject may carry.
pub fn mixed_subtypes(subject: Subject) -> &'static [GameType] {
    match subject {
        Subject::Alphabet => ALPHABET_MIXED_SUBTYPES,
        _ => &[],
    }
}

pub fn color_options(game_type: GameType) -> &'static [&'static str] {
    match game_type {
        GameType::Catching => CATCH_COLORS,
        _ => COLOR_LIBRARY,
    }
}

pub fn shape_options(game_type: GameType) -> &'static [&'static str] {
    match game_type {
        GameType::Catching | GameType::Racing => CATCH_SHAPES,
        _ => SHAPE_LIBRARY,
    }
}
