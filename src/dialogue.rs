//! Conversation state and input validation for the profile and matching flows.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use teloxide::dispatching::dialogue::Dialogue;

use crate::matching::Criterion;
use crate::profile::{ProfileDraft, STATUS_OPTIONS, VALID_REGIONS};
use crate::session_store::SessionStore;

pub const MIN_AGE: i32 = 14;
pub const MAX_AGE: i32 = 60;
pub const MAX_NAME_LEN: usize = 255;
pub const MAX_PLACE_LEN: usize = 100;
pub const MAX_BIO_LEN: usize = 1000;

lazy_static! {
    static ref LETTER: Regex = Regex::new(r"[A-Za-zА-Яа-яЇїЄєІіҐґ]").unwrap();
}

/// Steps of the profile creation wizard
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CreationStep {
    Name,
    Nickname,
    Region { page: usize },
    LocationType,
    City,
    Village,
    Age,
    Status,
    Interests,
    Bio,
    Confirm,
}

/// Steps of a single-field profile edit. Location edits carry the region
/// picked so far; interest edits carry the working selection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditStep {
    Name,
    Nickname,
    Region { page: usize },
    LocationType { region: String },
    City { region: String },
    Village { region: String },
    Age,
    Status,
    Interests { selected: Vec<String> },
    Bio,
}

/// Represents the conversation state of one chat
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum BotDialogueState {
    #[default]
    Start,
    CreatingProfile {
        step: CreationStep,
        draft: ProfileDraft,
    },
    EditMenu,
    EditingProfile {
        step: EditStep,
    },
    ChoosingCriterion,
    Judging {
        candidate_id: i64,
        criterion: Criterion,
    },
}

impl BotDialogueState {
    /// First state of the creation wizard
    pub fn new_profile() -> Self {
        BotDialogueState::CreatingProfile {
            step: CreationStep::Name,
            draft: ProfileDraft::default(),
        }
    }
}

/// Type alias for the bot dialogue
pub type MatchDialogue = Dialogue<BotDialogueState, SessionStore<BotDialogueState>>;

/// Settlement kind picked before typing the settlement name
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LocationKind {
    City,
    Village,
}

/// Navigation and selection on the paginated region keyboard
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegionInput {
    Previous,
    Next,
    Cancel,
    Region(String),
}

/// Items of the edit menu keyboard, recognized by their leading emoji
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditMenuItem {
    Name,
    Nickname,
    Location,
    Age,
    Status,
    Interests,
    Bio,
    StartMatching,
}

impl EditMenuItem {
    pub const ALL: [EditMenuItem; 8] = [
        EditMenuItem::Name,
        EditMenuItem::Nickname,
        EditMenuItem::Location,
        EditMenuItem::Age,
        EditMenuItem::Status,
        EditMenuItem::Interests,
        EditMenuItem::Bio,
        EditMenuItem::StartMatching,
    ];

    pub fn emoji(&self) -> char {
        match self {
            EditMenuItem::Name => '👤',
            EditMenuItem::Nickname => '🏷',
            EditMenuItem::Location => '📍',
            EditMenuItem::Age => '🎂',
            EditMenuItem::Status => '👶',
            EditMenuItem::Interests => '💡',
            EditMenuItem::Bio => '📝',
            EditMenuItem::StartMatching => '💞',
        }
    }

    /// Localization key of the button label
    pub fn label_key(&self) -> &'static str {
        match self {
            EditMenuItem::Name => "edit-menu-name",
            EditMenuItem::Nickname => "edit-menu-nickname",
            EditMenuItem::Location => "edit-menu-location",
            EditMenuItem::Age => "edit-menu-age",
            EditMenuItem::Status => "edit-menu-status",
            EditMenuItem::Interests => "edit-menu-interests",
            EditMenuItem::Bio => "edit-menu-bio",
            EditMenuItem::StartMatching => "edit-menu-match",
        }
    }

    pub fn from_label(text: &str) -> Option<Self> {
        let first = text.trim_start().chars().next()?;
        Self::ALL.into_iter().find(|item| item.emoji() == first)
    }
}

/// Validates a display name
pub fn validate_name(input: &str) -> Result<String, &'static str> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err("error-name-empty");
    }

    if trimmed.chars().all(|c| c.is_ascii_digit()) {
        return Err("error-name-digits");
    }

    if !LETTER.is_match(trimmed) {
        return Err("error-name-no-letters");
    }

    let len = trimmed.chars().count();
    if len < 2 {
        return Err("error-name-too-short");
    }

    if len > MAX_NAME_LEN {
        return Err("error-name-too-long");
    }

    Ok(trimmed.to_string())
}

pub fn validate_nickname(input: &str) -> Result<String, &'static str> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err("error-nickname-empty");
    }

    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err("error-nickname-too-long");
    }

    Ok(trimmed.to_string())
}

/// Validates an age typed as digits only
pub fn validate_age(input: &str) -> Result<i32, &'static str> {
    let trimmed = input.trim();

    if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return Err("error-age-not-number");
    }

    let age: i32 = trimmed.parse().map_err(|_| "error-age-out-of-range")?;
    if !(MIN_AGE..=MAX_AGE).contains(&age) {
        return Err("error-age-out-of-range");
    }

    Ok(age)
}

pub fn validate_region(input: &str) -> Result<String, &'static str> {
    let trimmed = input.trim();
    VALID_REGIONS
        .iter()
        .find(|region| **region == trimmed)
        .map(|region| region.to_string())
        .ok_or("error-region-invalid")
}

pub fn validate_status(input: &str) -> Result<String, &'static str> {
    let trimmed = input.trim();
    STATUS_OPTIONS
        .iter()
        .find(|status| **status == trimmed)
        .map(|status| status.to_string())
        .ok_or("error-status-invalid")
}

/// Validates a city or village name
pub fn validate_place_name(input: &str) -> Result<String, &'static str> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err("error-place-empty");
    }

    if trimmed.chars().count() > MAX_PLACE_LEN {
        return Err("error-place-too-long");
    }

    Ok(trimmed.to_string())
}

pub fn validate_bio(input: &str) -> Result<String, &'static str> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err("error-bio-empty");
    }

    if trimmed.chars().count() > MAX_BIO_LEN {
        return Err("error-bio-too-long");
    }

    Ok(trimmed.to_string())
}

/// Accepts the keyboard buttons (🏙 / 🏡) as well as the bare words
pub fn parse_location_type(input: &str) -> Result<LocationKind, &'static str> {
    let trimmed = input.trim();
    match trimmed.chars().next() {
        Some('🏙') => return Ok(LocationKind::City),
        Some('🏡') => return Ok(LocationKind::Village),
        _ => {}
    }

    match trimmed.to_lowercase().as_str() {
        "місто" | "city" => Ok(LocationKind::City),
        "село" | "village" => Ok(LocationKind::Village),
        _ => Err("error-location-type-invalid"),
    }
}

pub fn parse_region_input(input: &str) -> Result<RegionInput, &'static str> {
    let trimmed = input.trim();
    match trimmed.chars().next() {
        Some('⬅') => Ok(RegionInput::Previous),
        Some('❌') => Ok(RegionInput::Cancel),
        _ if trimmed.ends_with('➡') || trimmed.ends_with("➡️") => Ok(RegionInput::Next),
        _ => validate_region(trimmed).map(RegionInput::Region),
    }
}
