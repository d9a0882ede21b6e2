//! Authoring wizard: one instance per session, walking
//! subject -> section -> game type (or existing level) -> stages -> persisted.
//!
//! Moves go forward one step per confirm, `back` returns exactly one step and
//! `cancel` resets without touching the store. The only writes are an
//! explicit section creation and the final save.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::builder::{self, LevelBuilder, PersistedLevel};
use crate::domain::{GameType, Level, NewSection, Section, Subject};
use crate::error::{AuthoringError, Result};
use crate::sections::validate_new_section;
use crate::store::PersistenceGateway;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Mode {
    #[default]
    Create,
    Edit,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Step {
    #[default]
    ChooseSubject,
    ChooseOrCreateSection,
    ChooseGameType,
    ChooseLevel,
    AuthorStages,
    Persisted,
}

impl Step {
    pub fn as_str(self) -> &'static str {
        match self {
            Step::ChooseSubject => "chooseSubject",
            Step::ChooseOrCreateSection => "chooseOrCreateSection",
            Step::ChooseGameType => "chooseGameType",
            Step::ChooseLevel => "chooseLevel",
            Step::AuthorStages => "authorStages",
            Step::Persisted => "persisted",
        }
    }
}

#[derive(Debug, Default)]
pub struct Wizard {
    mode: Mode,
    step: Step,
    subject: Option<Subject>,
    sections: Vec<Section>,
    section: Option<Section>,
    levels: Vec<Level>,
    next_level_index: Option<u32>,
    builder: Option<LevelBuilder>,
    persisted: Option<PersistedLevel>,
}

impl Wizard {
    pub fn new(mode: Mode) -> Self {
        Wizard { mode, ..Default::default() }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn subject(&self) -> Option<Subject> {
        self.subject
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn section(&self) -> Option<&Section> {
        self.section.as_ref()
    }

    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    /// Preview of the index a created level would get. Not a reservation.
    pub fn next_level_index(&self) -> Option<u32> {
        self.next_level_index
    }

    pub fn builder(&self) -> Option<&LevelBuilder> {
        self.builder.as_ref()
    }

    pub fn persisted(&self) -> Option<&PersistedLevel> {
        self.persisted.as_ref()
    }

    fn expect_step(&self, expected: Step, action: &'static str) -> Result<()> {
        if self.step() == expected {
            Ok(())
        } else {
            Err(self.refuse(action))
        }
    }

    fn refuse(&self, action: &'static str) -> AuthoringError {
        AuthoringError::InvalidTransition { step: self.step().as_str(), action }
    }

    fn advance(&mut self, to: Step) {
        info!(
            target: "authoring",
            mode = ?self.mode,
            from = self.step().as_str(),
            to = to.as_str(),
            "Wizard step"
        );
        self.step = to;
    }

    /// Confirm a subject and load its sections.
    pub async fn choose_subject<G>(&mut self, gateway: &G, subject: Subject) -> Result<()>
    where
        G: PersistenceGateway + ?Sized,
    {
        self.expect_step(Step::ChooseSubject, "choose a subject")?;
        self.sections = gateway.list_sections(subject).await?;
        self.subject = Some(subject);
        self.advance(Step::ChooseOrCreateSection);
        Ok(())
    }

    /// Confirm one of the loaded sections.
    pub async fn choose_section<G>(&mut self, gateway: &G, section_id: &str) -> Result<()>
    where
        G: PersistenceGateway + ?Sized,
    {
        self.expect_step(Step::ChooseOrCreateSection, "choose a section")?;
        let section = self
            .sections
            .iter()
            .find(|s| s.id == section_id)
            .cloned()
            .ok_or_else(|| AuthoringError::not_found("section", section_id))?;
        self.enter_section(gateway, section).await
    }

    /// Write a new section right away and continue with it.
    pub async fn create_section<G>(&mut self, gateway: &G, section: NewSection) -> Result<()>
    where
        G: PersistenceGateway + ?Sized,
    {
        self.expect_step(Step::ChooseOrCreateSection, "create a section")?;
        let subject = self.subject.ok_or_else(|| self.refuse("create a section"))?;
        let section = validate_new_section(&section)?;
        let id = gateway.create_section(subject, section).await?;
        let created = gateway
            .get_section(subject, &id)
            .await?
            .ok_or_else(|| AuthoringError::not_found("section", id.as_str()))?;
        info!(target: "authoring", %subject, section = %created.id, "Section created from wizard");
        self.sections.push(created.clone());
        self.enter_section(gateway, created).await
    }

    async fn enter_section<G>(&mut self, gateway: &G, section: Section) -> Result<()>
    where
        G: PersistenceGateway + ?Sized,
    {
        let subject = self.subject.ok_or_else(|| self.refuse("choose a section"))?;
        let levels = gateway.list_levels(subject, &section.id).await?;
        self.section = Some(section);
        match self.mode {
            Mode::Create => {
                self.next_level_index = Some(builder::next_level_index(&levels));
                self.advance(Step::ChooseGameType);
            }
            Mode::Edit => {
                self.levels = levels;
                self.advance(Step::ChooseLevel);
            }
        }
        Ok(())
    }

    /// Create mode: fix the game type and open an empty stage draft.
    pub fn choose_game_type(&mut self, game_type: GameType) -> Result<()> {
        self.expect_step(Step::ChooseGameType, "choose a game type")?;
        let (subject, section) = self.location("choose a game type")?;
        self.builder = Some(LevelBuilder::create(subject, section, game_type)?);
        self.advance(Step::AuthorStages);
        Ok(())
    }

    /// Edit mode: preload the draft from a stored level.
    pub fn choose_level(&mut self, level_id: &str) -> Result<()> {
        self.expect_step(Step::ChooseLevel, "choose a level")?;
        let (subject, section) = self.location("choose a level")?;
        let level = self
            .levels
            .iter()
            .find(|l| l.id == level_id)
            .ok_or_else(|| AuthoringError::not_found("level", level_id))?;
        self.builder = Some(LevelBuilder::edit(subject, section, level)?);
        self.advance(Step::AuthorStages);
        Ok(())
    }

    fn location(&self, action: &'static str) -> Result<(Subject, String)> {
        match (self.subject, &self.section) {
            (Some(subject), Some(section)) => Ok((subject, section.id.clone())),
            _ => Err(self.refuse(action)),
        }
    }

    /// The stage draft, available only while authoring stages.
    pub fn builder_mut(&mut self) -> Result<&mut LevelBuilder> {
        self.expect_step(Step::AuthorStages, "edit stages")?;
        let step = self.step().as_str();
        self
            .builder
            .as_mut()
            .ok_or(AuthoringError::InvalidTransition { step, action: "edit stages" })
    }

    /// Single write of the level. On failure the wizard stays in `AuthorStages`.
    pub async fn save<G>(&mut self, gateway: &G) -> Result<PersistedLevel>
    where
        G: PersistenceGateway + ?Sized,
    {
        self.expect_step(Step::AuthorStages, "save")?;
        let builder = self.builder.as_ref().ok_or_else(|| self.refuse("save"))?;
        let persisted = builder.persist(gateway).await?;
        self.persisted = Some(persisted.clone());
        self.advance(Step::Persisted);
        Ok(persisted)
    }

    /// Return exactly one step, dropping what the left step collected.
    pub fn back(&mut self) -> Result<()> {
        let to = match (self.step(), self.mode) {
            (Step::ChooseSubject | Step::Persisted, _) => return Err(self.refuse("go back")),
            (Step::ChooseOrCreateSection, _) => {
                self.subject = None;
                self.sections.clear();
                Step::ChooseSubject
            }
            (Step::ChooseGameType | Step::ChooseLevel, _) => {
                self.section = None;
                self.levels.clear();
                self.next_level_index = None;
                Step::ChooseOrCreateSection
            }
            (Step::AuthorStages, mode) => {
                self.builder = None;
                match mode {
                    Mode::Create => Step::ChooseGameType,
                    Mode::Edit => Step::ChooseLevel,
                }
            }
        };
        self.advance(to);
        Ok(())
    }

    /// Abort from any step. Nothing is written.
    pub fn cancel(&mut self) {
        info!(
            target: "authoring",
            mode = ?self.mode,
            step = self.step().as_str(),
            "Wizard cancelled"
        );
        *self = Wizard::new(self.mode);
    }
}
