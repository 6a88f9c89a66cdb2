//! Player identity and registry records

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::date::{parse_date, today};
use crate::error::{ClubError, Result};

/// Regex equivalent of the id rule, for presentation layers that validate input up front
pub const PLAYER_ID_PATTERN: &str = "^[A-Z]{2}[0-9]{5}$";

const ID_LETTERS: usize = 2;
const ID_DIGITS: usize = 5;

/// National player id: two uppercase letters followed by five digits ("AB01234")
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PlayerId(String);

impl PlayerId {
    /// Parse and validate an id. Surrounding whitespace is ignored, case is not.
    pub fn parse(raw: &str) -> Result<Self> {
        let id = raw.trim();
        let bytes = id.as_bytes();
        let well_formed = bytes.len() == ID_LETTERS + ID_DIGITS
            && bytes[..ID_LETTERS].iter().all(u8::is_ascii_uppercase)
            && bytes[ID_LETTERS..].iter().all(u8::is_ascii_digit);

        if !well_formed {
            return Err(ClubError::validation(
                "player id",
                format!("'{id}' does not match {PLAYER_ID_PATTERN}"),
            ));
        }
        Ok(Self(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for PlayerId {
    type Err = ClubError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PlayerId {
    type Error = ClubError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<PlayerId> for String {
    fn from(id: PlayerId) -> Self {
        id.0
    }
}

/// A registered chess player.
///
/// The canonical record lives in the player registry; tournaments keep a
/// copy in their roster which the sync bridge keeps up to date.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    pub last_name: String,
    pub first_name: String,
    pub birth_date: NaiveDate,
}

impl Player {
    /// Build a player from raw input, validating every field
    pub fn new(id: &str, last_name: &str, first_name: &str, birth_date: &str) -> Result<Self> {
        let id = PlayerId::parse(id)?;
        let birth_date = parse_birth_date(birth_date)?;
        Ok(Self {
            id,
            last_name: required_name("last name", last_name)?,
            first_name: required_name("first name", first_name)?,
            birth_date,
        })
    }

    /// "First Last", used in reports
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Partial update of a player's identity; `None` keeps the current value
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PlayerEdit {
    pub id: Option<String>,
    pub last_name: Option<String>,
    pub first_name: Option<String>,
    pub birth_date: Option<String>,
}

impl PlayerEdit {
    pub fn is_empty(&self) -> bool {
        self.id.is_none()
            && self.last_name.is_none()
            && self.first_name.is_none()
            && self.birth_date.is_none()
    }

    /// Produce the edited player, validating only the fields that change
    pub fn apply(&self, player: &Player) -> Result<Player> {
        let mut edited = player.clone();
        if let Some(id) = &self.id {
            edited.id = PlayerId::parse(id)?;
        }
        if let Some(last_name) = &self.last_name {
            edited.last_name = required_name("last name", last_name)?;
        }
        if let Some(first_name) = &self.first_name {
            edited.first_name = required_name("first name", first_name)?;
        }
        if let Some(birth_date) = &self.birth_date {
            edited.birth_date = parse_birth_date(birth_date)?;
        }
        Ok(edited)
    }
}

fn parse_birth_date(raw: &str) -> Result<NaiveDate> {
    let date = parse_date("birth date", raw)?;
    if date > today() {
        return Err(ClubError::validation(
            "birth date",
            format!("{date} is in the future"),
        ));
    }
    Ok(date)
}

pub(crate) fn required_name(field: &'static str, raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ClubError::validation(field, "must not be empty"));
    }
    Ok(trimmed.to_string())
}
