use std::fmt;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::{
        record::{ContentEntity, Dated, Stored},
        validation::{normalize_items, validate_image_ref, validate_non_blank_items},
    },
    errors::AppError,
    repositories::row_store::Table,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum HackathonResult {
    Winner,
    Finalist,
    #[default]
    Participant,
}

impl HackathonResult {
    /// Color used to highlight the result label.
    pub fn highlight(&self) -> &'static str {
        match self {
            HackathonResult::Winner => "green",
            HackathonResult::Finalist => "blue",
            HackathonResult::Participant => "gray",
        }
    }
}

impl fmt::Display for HackathonResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            HackathonResult::Winner => "Winner",
            HackathonResult::Finalist => "Finalist",
            HackathonResult::Participant => "Participant",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HackathonRow {
    pub id: Uuid,
    pub name: String,
    pub date: NaiveDate,
    pub role: String,
    pub result: HackathonResult,
    #[serde(default)]
    pub learnings: Vec<String>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Hackathon {
    #[validate(length(min = 1, max = 160, message = "Name cannot be empty"))]
    pub name: String,

    pub date: NaiveDate,

    #[validate(length(min = 1, max = 80, message = "Role cannot be empty"))]
    pub role: String,

    pub result: HackathonResult,

    #[validate(custom(function = "validate_non_blank_items"))]
    pub learnings: Vec<String>,

    #[validate(custom(function = "validate_image_ref"))]
    pub image: Option<String>,
}

impl Default for Hackathon {
    fn default() -> Self {
        Hackathon {
            name: String::new(),
            date: Utc::now().date_naive(),
            role: String::new(),
            result: HackathonResult::default(),
            learnings: vec![String::new()],
            image: None,
        }
    }
}

/// List entry with the label color resolved.
#[derive(Debug, Clone, Serialize)]
pub struct HackathonCard {
    #[serde(flatten)]
    pub hackathon: Stored<Hackathon>,
    pub result_label: String,
    pub highlight: &'static str,
}

impl From<Stored<Hackathon>> for HackathonCard {
    fn from(hackathon: Stored<Hackathon>) -> Self {
        let result = hackathon.entity.result;
        HackathonCard {
            hackathon,
            result_label: result.to_string(),
            highlight: result.highlight(),
        }
    }
}

impl Dated for Hackathon {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

impl ContentEntity for Hackathon {
    type Row = HackathonRow;

    const TABLE: Table = Table::Hackathons;
    const LABEL: &'static str = "hackathon";
    const CONFIRM_DELETE: bool = true;

    fn from_row(row: HackathonRow) -> Stored<Self> {
        Stored::new(row.id, Hackathon {
            name: row.name,
            date: row.date,
            role: row.role,
            result: row.result,
            learnings: row.learnings,
            image: row.image.filter(|u| !u.is_empty()),
        })
    }

    fn to_row(id: Uuid, entity: &Self) -> HackathonRow {
        HackathonRow {
            id,
            name: entity.name.clone(),
            date: entity.date,
            role: entity.role.clone(),
            result: entity.result,
            learnings: entity.learnings.clone(),
            image: entity.image.clone(),
        }
    }

    fn check(&self) -> Result<(), AppError> {
        self.validate().map_err(AppError::from)
    }

    fn prepare(&mut self) {
        self.name = self.name.trim().to_string();
        self.role = self.role.trim().to_string();
        normalize_items(&mut self.learnings);
        if self.image.as_deref().is_some_and(|v| v.trim().is_empty()) {
            self.image = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn hackday() -> Hackathon {
        Hackathon {
            name: "HackDay".into(),
            date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            role: "Lead".into(),
            result: HackathonResult::Winner,
            learnings: vec!["Teamwork".into()],
            image: None,
        }
    }

    #[test]
    fn result_serializes_capitalized() {
        assert_eq!(serde_json::to_value(HackathonResult::Winner).unwrap(), json!("Winner"));
    }

    #[test]
    fn winner_card_is_green() {
        let card = HackathonCard::from(Stored::new(Uuid::new_v4(), hackday()));
        assert_eq!(card.result_label, "Winner");
        assert_eq!(card.highlight, "green");
    }

    #[test]
    fn learnings_must_survive_trimming() {
        let mut hackathon = hackday();
        hackathon.learnings = vec!["   ".into(), "".into()];
        hackathon.prepare();
        assert!(hackathon.learnings.is_empty());
        assert!(hackathon.check().is_err());
    }
}
