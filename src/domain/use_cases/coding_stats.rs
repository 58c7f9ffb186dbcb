use std::{future::Future, sync::Arc};

use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::Serialize;
use tracing::warn;

use crate::{
    entities::coding_profile::{CodingProfileSettings, Platform, SkillBadge},
    infrastructure::http::stats_client::{GithubUser, LeetCodeStats, RemoteError, StatsClient},
    settings::AppConfig,
    use_cases::content::{ContentRenderer, PageState},
};

pub const CALENDAR_WEEKS: usize = 52;
const MAX_ACTIVITY_LEVEL: u8 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetStatus {
    Ready,
    Error,
    Hidden,
}

/// One stat panel. Panels load and fail independently of each other.
#[derive(Debug, Clone, Serialize)]
pub struct Widget<T> {
    pub status: WidgetStatus,
    pub username: Option<String>,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> Widget<T> {
    pub fn ready(username: &str, data: T) -> Self {
        Widget { status: WidgetStatus::Ready, username: Some(username.to_string()), data: Some(data), error: None }
    }

    pub fn failed(username: &str, error: impl Into<String>) -> Self {
        Widget { status: WidgetStatus::Error, username: Some(username.to_string()), data: None, error: Some(error.into()) }
    }

    pub fn hidden() -> Self {
        Widget { status: WidgetStatus::Hidden, username: None, data: None, error: None }
    }
}

/// Contribution grid. The values are generated from the username, not read
/// from any platform.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContributionCalendar {
    pub simulated: bool,
    pub weeks: Vec<[u8; 7]>,
    pub total: u32,
}

impl ContributionCalendar {
    pub fn simulated(username: &str) -> Self {
        let seed = username
            .bytes()
            .fold(0xcbf2_9ce4_8422_2325_u64, |hash, b| (hash ^ b as u64).wrapping_mul(0x0100_0000_01b3));
        let mut rng = StdRng::seed_from_u64(seed);

        let weeks: Vec<[u8; 7]> = (0..CALENDAR_WEEKS)
            .map(|_| {
                let mut week = [0u8; 7];
                for day in week.iter_mut() {
                    *day = rng.gen_range(0..=MAX_ACTIVITY_LEVEL);
                }
                week
            })
            .collect();
        let total = weeks.iter().flatten().map(|d| *d as u32).sum();
        ContributionCalendar { simulated: true, weeks, total }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CodingWidgets {
    pub leetcode: Widget<LeetCodeStats>,
    pub github: Widget<GithubUser>,
    pub hackerrank: Widget<Vec<SkillBadge>>,
    pub calendar: Widget<ContributionCalendar>,
    pub settings_state: PageState,
}

#[derive(Debug, Clone)]
pub struct DefaultUsernames {
    pub github: String,
    pub leetcode: String,
    pub hackerrank: String,
}

impl From<&AppConfig> for DefaultUsernames {
    fn from(config: &AppConfig) -> Self {
        DefaultUsernames {
            github: config.default_github_username.clone(),
            leetcode: config.default_leetcode_username.clone(),
            hackerrank: config.default_hackerrank_username.clone(),
        }
    }
}

impl DefaultUsernames {
    fn get(&self, platform: Platform) -> &str {
        match platform {
            Platform::Github => &self.github,
            Platform::Leetcode => &self.leetcode,
            Platform::Hackerrank => &self.hackerrank,
        }
    }
}

pub struct CodingProfileService {
    content: ContentRenderer,
    client: Arc<dyn StatsClient>,
    defaults: DefaultUsernames,
}

impl CodingProfileService {
    pub fn new(content: ContentRenderer, client: Arc<dyn StatsClient>, defaults: DefaultUsernames) -> Self {
        CodingProfileService { content, client, defaults }
    }

    /// Settings username when set and displayed, otherwise the default.
    pub fn username(&self, settings: &CodingProfileSettings, platform: Platform) -> Option<String> {
        settings
            .profile(platform)
            .visible_username()
            .map(str::to_string)
            .or_else(|| {
                let fallback = self.defaults.get(platform).trim();
                (!fallback.is_empty()).then(|| fallback.to_string())
            })
    }

    pub async fn widgets(&self) -> CodingWidgets {
        let settings = self.content.coding_profile().await;

        let leetcode_user = self.username(&settings.data, Platform::Leetcode);
        let github_user = self.username(&settings.data, Platform::Github);
        let hackerrank_user = self.username(&settings.data, Platform::Hackerrank);

        let (leetcode, github) = tokio::join!(
            fetch(Platform::Leetcode, leetcode_user.clone(), |u| async move {
                self.client.leetcode_stats(&u).await
            }),
            fetch(Platform::Github, github_user.clone(), |u| async move {
                self.client.github_user(&u).await
            }),
        );

        let hackerrank = match &hackerrank_user {
            Some(user) => Widget::ready(user, settings.data.skill_badges.clone()),
            None => Widget::hidden(),
        };
        let calendar = match &github_user {
            Some(user) => Widget::ready(user, ContributionCalendar::simulated(user)),
            None => Widget::hidden(),
        };

        CodingWidgets { leetcode, github, hackerrank, calendar, settings_state: settings.state }
    }
}

async fn fetch<T, F, Fut>(platform: Platform, username: Option<String>, call: F) -> Widget<T>
where
    F: FnOnce(String) -> Fut,
    Fut: Future<Output = Result<T, RemoteError>>,
{
    let Some(username) = username else {
        return Widget::hidden();
    };
    match call(username.clone()).await {
        Ok(data) => Widget::ready(&username, data),
        Err(e) => {
            warn!(?platform, %username, error = %e, "Stats fetch failed");
            Widget::failed(&username, e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        cache::content_cache::ContentCache,
        infrastructure::http::stats_client::MockStatsClient,
        repositories::{
            memory_store::{MemoryRowStore, StoreOp},
            row_store::Table,
        },
    };
    use mockall::predicate::eq;
    use serde_json::json;
    use std::time::Duration;
    use uuid::Uuid;

    fn defaults() -> DefaultUsernames {
        DefaultUsernames { github: "octocat".into(), leetcode: "lc-default".into(), hackerrank: "hr-default".into() }
    }

    fn service(store: Arc<MemoryRowStore>, client: MockStatsClient) -> CodingProfileService {
        let content = ContentRenderer::new(store, Arc::new(ContentCache::new(Duration::from_secs(60))));
        CodingProfileService::new(content, Arc::new(client), defaults())
    }

    fn github(login: &str) -> GithubUser {
        GithubUser {
            login: login.into(),
            name: None,
            avatar_url: String::new(),
            html_url: String::new(),
            public_repos: 3,
            followers: 1,
            following: 0,
        }
    }

    #[tokio::test]
    async fn one_failing_widget_does_not_blank_the_others() {
        let store = Arc::new(MemoryRowStore::new());
        store.seed(Table::CodingProfiles, vec![json!({
            "id": Uuid::new_v4(),
            "github_username": "ada",
            "show_github": true,
            "leetcode_username": "ada-lc",
            "show_leetcode": true,
            "hackerrank_username": "ada-hr",
            "show_hackerrank": true,
            "hackerrank_badges": [{"name": "Rust", "level": 2, "stars": 2, "color_class": "bronze"}]
        })]);

        let mut client = MockStatsClient::new();
        client
            .expect_leetcode_stats()
            .with(eq("ada-lc"))
            .returning(|_| Err(RemoteError::Status(503)));
        client
            .expect_github_user()
            .with(eq("ada"))
            .returning(|u| Ok(github(u)));

        let widgets = service(store, client).widgets().await;
        assert_eq!(widgets.leetcode.status, WidgetStatus::Error);
        assert_eq!(widgets.github.status, WidgetStatus::Ready);
        assert_eq!(widgets.github.data.unwrap().login, "ada");
        assert_eq!(widgets.hackerrank.data.unwrap()[0].name, "Rust");
        assert_eq!(widgets.settings_state, PageState::Rendered);
    }

    #[tokio::test]
    async fn hidden_platform_falls_back_to_default_username() {
        let store = Arc::new(MemoryRowStore::new());
        store.seed(Table::CodingProfiles, vec![json!({
            "id": Uuid::new_v4(),
            "github_username": "ada",
            "show_github": false,
            "leetcode_username": "",
            "show_leetcode": true,
            "hackerrank_username": "ada-hr",
            "show_hackerrank": true
        })]);

        let mut client = MockStatsClient::new();
        client.expect_leetcode_stats().with(eq("lc-default")).returning(|_| Ok(LeetCodeStats::default()));
        client.expect_github_user().with(eq("octocat")).returning(|u| Ok(github(u)));

        let widgets = service(store, client).widgets().await;
        assert_eq!(widgets.leetcode.username.as_deref(), Some("lc-default"));
        assert_eq!(widgets.github.username.as_deref(), Some("octocat"));
    }

    #[tokio::test]
    async fn unreadable_settings_still_render_widgets() {
        let store = Arc::new(MemoryRowStore::new());
        store.fail_on(Table::CodingProfiles, StoreOp::Query);

        let mut client = MockStatsClient::new();
        client.expect_leetcode_stats().returning(|_| Ok(LeetCodeStats::default()));
        client.expect_github_user().returning(|u| Ok(github(u)));

        let widgets = service(store, client).widgets().await;
        assert_eq!(widgets.settings_state, PageState::Fallback);
        assert_eq!(widgets.leetcode.status, WidgetStatus::Ready);
        assert!(!widgets.hackerrank.data.unwrap().is_empty());
    }

    #[test]
    fn simulated_calendar_is_flagged_and_stable_per_username() {
        let first = ContributionCalendar::simulated("ada");
        assert!(first.simulated);
        assert_eq!(first.weeks.len(), CALENDAR_WEEKS);
        assert!(first.weeks.iter().flatten().all(|d| *d <= MAX_ACTIVITY_LEVEL));
        assert_eq!(first, ContributionCalendar::simulated("ada"));
        assert_ne!(first.weeks, ContributionCalendar::simulated("grace").weeks);
    }
}
