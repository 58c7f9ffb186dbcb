use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ContactForm {
    #[validate(length(min = 2, max = 100, message = "Name must be between 2 and 100 characters"))]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, max = 150, message = "Subject must be between 1 and 150 characters"))]
    pub subject: String,

    #[validate(length(min = 5, max = 2000, message = "Message must be between 5 and 2000 characters"))]
    pub message: String,
}

impl ContactForm {
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.email = self.email.trim().to_lowercase();
        self.subject = self.subject.trim().to_string();
        self.message = self.message.trim().to_string();
        self
    }
}

/// Row of the write-only `contact_messages` table.
#[derive(Debug, Serialize, Deserialize)]
pub struct ContactMessageRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl ContactMessageRow {
    pub fn new(id: Uuid, form: &ContactForm) -> Self {
        ContactMessageRow {
            id,
            name: form.name.clone(),
            email: form.email.clone(),
            subject: form.subject.clone(),
            message: form.message.clone(),
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryChannel {
    Stored,
    Relay,
}

/// Acknowledgement shown to the visitor; identical for both delivery paths.
#[derive(Debug, Clone, Serialize)]
pub struct ContactReceipt {
    pub id: Uuid,
    pub message: String,
    #[serde(skip)]
    pub channel: DeliveryChannel,
    pub received_at: DateTime<Utc>,
}

impl ContactReceipt {
    pub fn new(id: Uuid, channel: DeliveryChannel) -> Self {
        ContactReceipt {
            id,
            message: "Thanks for reaching out! I'll get back to you soon.".to_string(),
            channel,
            received_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> ContactForm {
        ContactForm {
            name: "Grace".into(),
            email: "grace@example.com".into(),
            subject: "Hello".into(),
            message: "Loved the portfolio".into(),
        }
    }

    #[test]
    fn valid_form_passes() {
        assert!(form().validate().is_ok());
    }

    #[test]
    fn short_message_and_bad_email_fail() {
        let bad = ContactForm { email: "nope".into(), message: "hey".into(), ..form() };
        let errors = bad.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("email"));
        assert!(errors.field_errors().contains_key("message"));
    }

    #[test]
    fn receipt_hides_channel() {
        let receipt = ContactReceipt::new(Uuid::new_v4(), DeliveryChannel::Relay);
        let value = serde_json::to_value(&receipt).unwrap();
        assert!(value.get("channel").is_none());
    }
}
