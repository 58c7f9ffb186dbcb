use std::{fmt, str::FromStr};

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::{
        record::{ContentEntity, Dated, Stored},
        validation::{normalize_items, validate_image_ref, validate_non_blank_items, validate_title, validate_url},
    },
    errors::AppError,
    repositories::row_store::Table,
};

/// Filter value that matches every category.
pub const CATEGORY_ALL: &str = "all";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProjectCategory {
    #[default]
    Web,
    Mobile,
    Backend,
    Ml,
    Other,
}

impl ProjectCategory {
    pub const ALL: [ProjectCategory; 5] = [
        ProjectCategory::Web,
        ProjectCategory::Mobile,
        ProjectCategory::Backend,
        ProjectCategory::Ml,
        ProjectCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectCategory::Web => "web",
            ProjectCategory::Mobile => "mobile",
            ProjectCategory::Backend => "backend",
            ProjectCategory::Ml => "ml",
            ProjectCategory::Other => "other",
        }
    }
}

impl fmt::Display for ProjectCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectCategory {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProjectCategory::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AppError::InvalidInput(format!("Unknown project category: {}", s)))
    }
}

// ───── Database Models ───────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct ProjectRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub image: Option<String>,
    pub date: NaiveDate,
    pub category: ProjectCategory,
    #[serde(default)]
    pub technologies: Vec<String>,
    #[serde(default)]
    pub featured: bool,
    pub demourl: Option<String>,
    pub githuburl: Option<String>,
    pub submissions: Option<i32>,
}

// ───── View Model ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Project {
    #[validate(
        length(min = 1, max = 120, message = "Title must be between 1 and 120 characters"),
        custom(function = "validate_title")
    )]
    pub title: String,

    #[validate(length(min = 1, max = 2000, message = "Description cannot be empty"))]
    pub description: String,

    #[validate(custom(function = "validate_image_ref"))]
    pub image_url: String,

    pub date: NaiveDate,

    pub category: ProjectCategory,

    #[validate(custom(function = "validate_non_blank_items"))]
    pub technologies: Vec<String>,

    #[serde(default)]
    pub featured: bool,

    #[validate(custom(function = "validate_url"))]
    pub demo_url: Option<String>,

    #[validate(custom(function = "validate_url"))]
    pub source_url: Option<String>,

    #[validate(range(min = 0, message = "Submissions cannot be negative"))]
    pub submissions: Option<i32>,
}

impl Default for Project {
    fn default() -> Self {
        Project {
            title: String::new(),
            description: String::new(),
            image_url: String::new(),
            date: Utc::now().date_naive(),
            category: ProjectCategory::default(),
            technologies: Vec::new(),
            featured: false,
            demo_url: None,
            source_url: None,
            submissions: None,
        }
    }
}

impl Dated for Project {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

impl ContentEntity for Project {
    type Row = ProjectRow;

    const TABLE: Table = Table::Projects;
    const LABEL: &'static str = "project";
    const CONFIRM_DELETE: bool = true;

    fn from_row(row: ProjectRow) -> Stored<Self> {
        Stored::new(row.id, Project {
            title: row.title,
            description: row.description,
            image_url: row.image.unwrap_or_default(),
            date: row.date,
            category: row.category,
            technologies: row.technologies,
            featured: row.featured,
            demo_url: row.demourl.filter(|u| !u.is_empty()),
            source_url: row.githuburl.filter(|u| !u.is_empty()),
            submissions: row.submissions,
        })
    }

    fn to_row(id: Uuid, entity: &Self) -> ProjectRow {
        ProjectRow {
            id,
            title: entity.title.clone(),
            description: entity.description.clone(),
            image: Some(entity.image_url.clone()),
            date: entity.date,
            category: entity.category,
            technologies: entity.technologies.clone(),
            featured: entity.featured,
            demourl: entity.demo_url.clone(),
            githuburl: entity.source_url.clone(),
            submissions: entity.submissions,
        }
    }

    fn check(&self) -> Result<(), AppError> {
        self.validate().map_err(AppError::from)
    }

    fn prepare(&mut self) {
        self.title = self.title.trim().to_string();
        normalize_items(&mut self.technologies);
        for url in [&mut self.demo_url, &mut self.source_url] {
            if url.as_deref().is_some_and(|u| u.trim().is_empty()) {
                *url = None;
            }
        }
    }
}
