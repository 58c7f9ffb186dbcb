use derive_more::Display;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::{
        record::{ContentEntity, Stored},
        validation::validate_username,
    },
    errors::AppError,
    repositories::row_store::Table,
};

/// Top-level keys the JSON editor requires.
pub const PLATFORM_KEYS: [&str; 3] = ["github", "leetcode", "hackerrank"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Github,
    Leetcode,
    Hackerrank,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct PlatformProfile {
    #[validate(
        length(max = 64, message = "Username is too long"),
        custom(function = "validate_username")
    )]
    pub username: String,
    #[serde(default = "default_display")]
    pub display: bool,
}

fn default_display() -> bool {
    true
}

impl Default for PlatformProfile {
    fn default() -> Self {
        PlatformProfile { username: String::new(), display: default_display() }
    }
}

impl PlatformProfile {
    /// Username to show, if the platform is enabled and configured.
    pub fn visible_username(&self) -> Option<&str> {
        let name = self.username.trim();
        (self.display && !name.is_empty()).then_some(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct SkillBadge {
    #[validate(length(min = 1, max = 60, message = "Badge name cannot be empty"))]
    pub name: String,

    #[validate(range(min = 1, max = 6, message = "Level must be between 1 and 6"))]
    pub level: u8,

    #[validate(range(min = 1, max = 5, message = "Stars must be between 1 and 5"))]
    pub stars: u8,

    #[serde(default)]
    pub color_class: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, Default)]
pub struct CodingProfileSettings {
    #[validate(nested)]
    pub github: PlatformProfile,
    #[validate(nested)]
    pub leetcode: PlatformProfile,
    #[validate(nested)]
    pub hackerrank: PlatformProfile,
    #[validate(nested)]
    #[serde(default)]
    pub skill_badges: Vec<SkillBadge>,
}

/// The three platform blocks edited through the raw JSON editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct PlatformBlocks {
    #[validate(nested)]
    pub github: PlatformProfile,
    #[validate(nested)]
    pub leetcode: PlatformProfile,
    #[validate(nested)]
    pub hackerrank: PlatformProfile,
}

#[derive(Debug, Display, Clone, PartialEq)]
pub enum BulkEditError {
    #[display("Invalid JSON: {_0}")]
    Parse(String),

    #[display("JSON must be an object")]
    NotAnObject,

    #[display("Missing required keys: {}", _0.join(", "))]
    MissingKeys(Vec<&'static str>),

    #[display("Invalid platform settings: {_0}")]
    Invalid(String),
}

impl PlatformBlocks {
    /// Parses the editor text. The caller keeps `raw` untouched on error.
    pub fn parse(raw: &str) -> Result<Self, BulkEditError> {
        let value: Value = serde_json::from_str(raw).map_err(|e| BulkEditError::Parse(e.to_string()))?;
        let object = value.as_object().ok_or(BulkEditError::NotAnObject)?;

        let missing: Vec<&'static str> = PLATFORM_KEYS
            .into_iter()
            .filter(|key| !object.contains_key(*key))
            .collect();
        if !missing.is_empty() {
            return Err(BulkEditError::MissingKeys(missing));
        }

        let blocks: PlatformBlocks =
            serde_json::from_value(value).map_err(|e| BulkEditError::Invalid(e.to_string()))?;
        blocks
            .validate()
            .map_err(|e| BulkEditError::Invalid(AppError::from(e).to_string()))?;
        Ok(blocks)
    }
}

impl CodingProfileSettings {
    pub fn platforms(&self) -> PlatformBlocks {
        PlatformBlocks {
            github: self.github.clone(),
            leetcode: self.leetcode.clone(),
            hackerrank: self.hackerrank.clone(),
        }
    }

    /// Replaces the platform blocks; skill badges are left as they are.
    pub fn apply_platforms(&mut self, blocks: PlatformBlocks) {
        self.github = blocks.github;
        self.leetcode = blocks.leetcode;
        self.hackerrank = blocks.hackerrank;
    }

    /// Applies the JSON editor text; on error nothing changes.
    pub fn apply_json(&mut self, raw: &str) -> Result<(), BulkEditError> {
        self.apply_platforms(PlatformBlocks::parse(raw)?);
        Ok(())
    }

    pub fn profile(&self, platform: Platform) -> &PlatformProfile {
        match platform {
            Platform::Github => &self.github,
            Platform::Leetcode => &self.leetcode,
            Platform::Hackerrank => &self.hackerrank,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CodingProfileRow {
    pub id: Uuid,
    pub github_username: Option<String>,
    #[serde(default = "default_display")]
    pub show_github: bool,
    pub leetcode_username: Option<String>,
    #[serde(default = "default_display")]
    pub show_leetcode: bool,
    pub hackerrank_username: Option<String>,
    #[serde(default = "default_display")]
    pub show_hackerrank: bool,
    #[serde(default)]
    pub hackerrank_badges: Option<Vec<SkillBadge>>,
}

impl ContentEntity for CodingProfileSettings {
    type Row = CodingProfileRow;

    const TABLE: Table = Table::CodingProfiles;
    const LABEL: &'static str = "coding profile settings";

    fn from_row(row: CodingProfileRow) -> Stored<Self> {
        Stored::new(row.id, CodingProfileSettings {
            github: PlatformProfile {
                username: row.github_username.unwrap_or_default(),
                display: row.show_github,
            },
            leetcode: PlatformProfile {
                username: row.leetcode_username.unwrap_or_default(),
                display: row.show_leetcode,
            },
            hackerrank: PlatformProfile {
                username: row.hackerrank_username.unwrap_or_default(),
                display: row.show_hackerrank,
            },
            skill_badges: row.hackerrank_badges.unwrap_or_default(),
        })
    }

    fn to_row(id: Uuid, entity: &Self) -> CodingProfileRow {
        CodingProfileRow {
            id,
            github_username: Some(entity.github.username.clone()),
            show_github: entity.github.display,
            leetcode_username: Some(entity.leetcode.username.clone()),
            show_leetcode: entity.leetcode.display,
            hackerrank_username: Some(entity.hackerrank.username.clone()),
            show_hackerrank: entity.hackerrank.display,
            hackerrank_badges: Some(entity.skill_badges.clone()),
        }
    }

    fn check(&self) -> Result<(), AppError> {
        self.validate().map_err(AppError::from)
    }

    fn prepare(&mut self) {
        for profile in [&mut self.github, &mut self.leetcode, &mut self.hackerrank] {
            profile.username = profile.username.trim().to_string();
        }
    }
}
