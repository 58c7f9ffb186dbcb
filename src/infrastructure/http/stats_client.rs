use std::time::Duration;

use async_trait::async_trait;
use derive_more::Display;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::settings::AppConfig;

#[derive(Debug, Display, Clone, PartialEq)]
pub enum RemoteError {
    #[display("Network error: {_0}")]
    Network(String),

    #[display("Upstream returned {_0}")]
    Status(u16),

    #[display("Unexpected response: {_0}")]
    Decode(String),

    #[display("{_0}")]
    Upstream(String),

    #[display("No endpoint configured")]
    NotConfigured,
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => RemoteError::Status(status.as_u16()),
            None if err.is_decode() => RemoteError::Decode(err.to_string()),
            None => RemoteError::Network(err.to_string()),
        }
    }
}

/// Solved-problem counts from the code-judge stats endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct LeetCodeStats {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub total_solved: u32,
    #[serde(default)]
    pub total_questions: u32,
    #[serde(default)]
    pub easy_solved: u32,
    #[serde(default)]
    pub total_easy: u32,
    #[serde(default)]
    pub medium_solved: u32,
    #[serde(default)]
    pub total_medium: u32,
    #[serde(default)]
    pub hard_solved: u32,
    #[serde(default)]
    pub total_hard: u32,
    #[serde(default)]
    pub acceptance_rate: f64,
    #[serde(default)]
    pub ranking: u64,
}

/// Public profile from the source-hosting user endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GithubUser {
    pub login: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar_url: String,
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub public_repos: u32,
    #[serde(default)]
    pub followers: u32,
    #[serde(default)]
    pub following: u32,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StatsClient: Send + Sync {
    async fn leetcode_stats(&self, username: &str) -> Result<LeetCodeStats, RemoteError>;
    async fn github_user(&self, username: &str) -> Result<GithubUser, RemoteError>;
}

pub struct HttpStatsClient {
    client: Client,
    leetcode_base: Url,
    github_base: Url,
}

/// Appends `segments` to `base`, each percent-encoded as one path segment so
/// a username can never step out of its endpoint.
pub fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, RemoteError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| RemoteError::Decode(format!("{} cannot take a path", base)))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

fn parse_base(raw: &str) -> Result<Url, RemoteError> {
    Url::parse(raw.trim()).map_err(|e| RemoteError::Decode(format!("invalid API base URL {}: {}", raw, e)))
}

impl HttpStatsClient {
    pub fn new(config: &AppConfig) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .user_agent(format!("{}/{}", config.name, env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(HttpStatsClient {
            client,
            leetcode_base: parse_base(&config.leetcode_api_url)?,
            github_base: parse_base(&config.github_api_url)?,
        })
    }
}

#[async_trait]
impl StatsClient for HttpStatsClient {
    async fn leetcode_stats(&self, username: &str) -> Result<LeetCodeStats, RemoteError> {
        let url = endpoint(&self.leetcode_base, &[username])?;
        let stats: LeetCodeStats = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        // The endpoint answers 200 with `status: "error"` for unknown users.
        if stats.status.eq_ignore_ascii_case("error") {
            return Err(RemoteError::Upstream(stats.message));
        }
        Ok(stats)
    }

    async fn github_user(&self, username: &str) -> Result<GithubUser, RemoteError> {
        let url = endpoint(&self.github_base, &["users", username])?;
        let user = self
            .client
            .get(url)
            .header(header::ACCEPT, "application/vnd.github+json")
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leetcode_payload_decodes() {
        let raw = r#"{"status":"success","message":"retrieved","totalSolved":120,"totalQuestions":3000,
            "easySolved":60,"totalEasy":800,"mediumSolved":50,"totalMedium":1600,"hardSolved":10,
            "totalHard":600,"acceptanceRate":61.5,"ranking":250000,"contributionPoints":10}"#;
        let stats: LeetCodeStats = serde_json::from_str(raw).unwrap();
        assert_eq!(stats.total_solved, 120);
        assert_eq!(stats.hard_solved, 10);
        assert_eq!(stats.ranking, 250000);
    }

    #[test]
    fn username_stays_a_single_path_segment() {
        let base = Url::parse("https://api.github.com").unwrap();
        let url = endpoint(&base, &["users", "x/../../repos/rust-lang/rust"]).unwrap();
        assert_eq!(url.as_str(), "https://api.github.com/users/x%2F..%2F..%2Frepos%2Frust-lang%2Frust");

        let base = Url::parse("https://stats.example.com/api/").unwrap();
        let url = endpoint(&base, &["octo cat"]).unwrap();
        assert_eq!(url.as_str(), "https://stats.example.com/api/octo%20cat");
    }

    #[test]
    fn github_payload_ignores_extra_fields() {
        let raw = r#"{"login":"octocat","id":1,"avatar_url":"https://a/b.png","public_repos":8,"followers":9000}"#;
        let user: GithubUser = serde_json::from_str(raw).unwrap();
        assert_eq!(user.login, "octocat");
        assert_eq!(user.following, 0);
    }
}
