use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::{
        record::{ContentEntity, Stored},
        validation::validate_url,
    },
    errors::AppError,
    repositories::row_store::Table,
};

#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileRow {
    pub id: Uuid,
    pub name: String,
    pub title: String,
    pub description: String,
    pub resumeurl: Option<String>,
    pub githuburl: Option<String>,
    pub linkedinurl: Option<String>,
    pub twitterurl: Option<String>,
    pub email: Option<String>,
    pub contactendpoint: Option<String>,
}

/// Site owner identity shown on the home, about and contact pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, Default)]
pub struct ProfileSettings {
    #[validate(length(min = 1, max = 100, message = "Display name cannot be empty"))]
    pub display_name: String,

    #[validate(length(max = 120))]
    pub title: String,

    #[validate(length(max = 4000))]
    pub bio: String,

    #[validate(custom(function = "validate_url"))]
    pub resume_url: Option<String>,

    #[validate(custom(function = "validate_url"))]
    pub github_url: Option<String>,

    #[validate(custom(function = "validate_url"))]
    pub linkedin_url: Option<String>,

    #[validate(custom(function = "validate_url"))]
    pub twitter_url: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    /// Form relay used when the contact insert fails.
    #[validate(custom(function = "validate_url"))]
    pub contact_endpoint: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl ContentEntity for ProfileSettings {
    type Row = ProfileRow;

    const TABLE: Table = Table::ProfileSettings;
    const LABEL: &'static str = "profile settings";

    fn from_row(row: ProfileRow) -> Stored<Self> {
        Stored::new(row.id, ProfileSettings {
            display_name: row.name,
            title: row.title,
            bio: row.description,
            resume_url: non_empty(row.resumeurl),
            github_url: non_empty(row.githuburl),
            linkedin_url: non_empty(row.linkedinurl),
            twitter_url: non_empty(row.twitterurl),
            email: non_empty(row.email),
            contact_endpoint: non_empty(row.contactendpoint),
        })
    }

    fn to_row(id: Uuid, entity: &Self) -> ProfileRow {
        ProfileRow {
            id,
            name: entity.display_name.clone(),
            title: entity.title.clone(),
            description: entity.bio.clone(),
            resumeurl: entity.resume_url.clone(),
            githuburl: entity.github_url.clone(),
            linkedinurl: entity.linkedin_url.clone(),
            twitterurl: entity.twitter_url.clone(),
            email: entity.email.clone(),
            contactendpoint: entity.contact_endpoint.clone(),
        }
    }

    fn check(&self) -> Result<(), AppError> {
        self.validate().map_err(AppError::from)
    }

    fn prepare(&mut self) {
        self.display_name = self.display_name.trim().to_string();
        for field in [
            &mut self.resume_url,
            &mut self.github_url,
            &mut self.linkedin_url,
            &mut self.twitter_url,
            &mut self.email,
            &mut self.contact_endpoint,
        ] {
            *field = non_empty(field.take()).map(|v| v.trim().to_string());
        }
    }
}
