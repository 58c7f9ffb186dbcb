use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::{
        record::{ContentEntity, Dated, Stored},
        validation::{validate_image_ref, validate_url},
    },
    errors::AppError,
    repositories::row_store::Table,
};

#[derive(Debug, Serialize, Deserialize)]
pub struct CertificateRow {
    pub id: Uuid,
    pub title: String,
    pub issuer: String,
    pub date: NaiveDate,
    pub credentialurl: Option<String>,
    pub image: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Certificate {
    #[validate(length(min = 1, max = 160, message = "Title cannot be empty"))]
    pub title: String,

    #[validate(length(min = 1, max = 120, message = "Issuer cannot be empty"))]
    pub issuer: String,

    pub date: NaiveDate,

    #[validate(custom(function = "validate_url"))]
    pub credential_url: Option<String>,

    #[validate(custom(function = "validate_image_ref"))]
    pub image: Option<String>,

    #[validate(length(max = 1000))]
    pub description: Option<String>,
}

impl Default for Certificate {
    fn default() -> Self {
        Certificate {
            title: String::new(),
            issuer: String::new(),
            date: Utc::now().date_naive(),
            credential_url: None,
            image: None,
            description: None,
        }
    }
}

impl Dated for Certificate {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

impl ContentEntity for Certificate {
    type Row = CertificateRow;

    const TABLE: Table = Table::Certificates;
    const LABEL: &'static str = "certificate";

    fn from_row(row: CertificateRow) -> Stored<Self> {
        Stored::new(row.id, Certificate {
            title: row.title,
            issuer: row.issuer,
            date: row.date,
            credential_url: row.credentialurl.filter(|u| !u.is_empty()),
            image: row.image.filter(|u| !u.is_empty()),
            description: row.description,
        })
    }

    fn to_row(id: Uuid, entity: &Self) -> CertificateRow {
        CertificateRow {
            id,
            title: entity.title.clone(),
            issuer: entity.issuer.clone(),
            date: entity.date,
            credentialurl: entity.credential_url.clone(),
            image: entity.image.clone(),
            description: entity.description.clone(),
        }
    }

    fn check(&self) -> Result<(), AppError> {
        self.validate().map_err(AppError::from)
    }

    fn prepare(&mut self) {
        for field in [&mut self.credential_url, &mut self.image, &mut self.description] {
            if field.as_deref().is_some_and(|v| v.trim().is_empty()) {
                *field = None;
            }
        }
    }
}
