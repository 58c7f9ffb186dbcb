use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client};

use crate::{
    entities::contact_message::ContactForm,
    infrastructure::http::stats_client::RemoteError,
    settings::AppConfig,
};

/// External form-relay service used when the contact insert fails.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FormRelay: Send + Sync {
    async fn submit(&self, endpoint: &str, form: &ContactForm) -> Result<(), RemoteError>;
}

pub struct HttpFormRelay {
    client: Client,
}

impl HttpFormRelay {
    pub fn new(config: &AppConfig) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()?;
        Ok(HttpFormRelay { client })
    }
}

#[async_trait]
impl FormRelay for HttpFormRelay {
    async fn submit(&self, endpoint: &str, form: &ContactForm) -> Result<(), RemoteError> {
        self.client
            .post(endpoint)
            .header(header::ACCEPT, "application/json")
            .form(form)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
