use std::sync::Arc;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};
use uuid::Uuid;

use crate::{
    cache::content_cache::ContentCache,
    entities::{
        blog_post::{BlogPost, RenderedPost},
        certificate::Certificate,
        coding_profile::CodingProfileSettings,
        hackathon::{Hackathon, HackathonCard},
        profile::ProfileSettings,
        project::{Project, ProjectCategory, CATEGORY_ALL},
        record::{ContentEntity, Dated, Stored},
    },
    errors::{AppError, StoreError},
    repositories::{
        entity_repo::decode_rows,
        row_store::{Query, RowStore, Table},
    },
};

// ───── Bundled fallback content ─────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct FallbackContent {
    pub profile: ProfileSettings,
    pub coding_profile: CodingProfileSettings,
    pub projects: Vec<Stored<Project>>,
    pub blog_posts: Vec<Stored<BlogPost>>,
    pub certificates: Vec<Stored<Certificate>>,
    pub hackathons: Vec<Stored<Hackathon>>,
}

pub static FALLBACK: Lazy<FallbackContent> = Lazy::new(|| {
    serde_json::from_str(include_str!("../../../data/fallback.json")).unwrap_or_else(|e| {
        error!("Bundled fallback content is invalid: {}", e);
        FallbackContent::default()
    })
});

/// Dated content types that ship with bundled defaults.
pub trait FallbackSource: ContentEntity + Dated {
    fn fallback() -> Vec<Stored<Self>>;
}

impl FallbackSource for Project {
    fn fallback() -> Vec<Stored<Self>> {
        FALLBACK.projects.clone()
    }
}

impl FallbackSource for BlogPost {
    fn fallback() -> Vec<Stored<Self>> {
        FALLBACK.blog_posts.clone()
    }
}

impl FallbackSource for Certificate {
    fn fallback() -> Vec<Stored<Self>> {
        FALLBACK.certificates.clone()
    }
}

impl FallbackSource for Hackathon {
    fn fallback() -> Vec<Stored<Self>> {
        FALLBACK.hackathons.clone()
    }
}

// ───── View Models ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageState {
    Rendered,
    Fallback,
}

/// A rendered page. `Fallback` pages carry bundled data and the read error.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub state: PageState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub data: T,
}

impl<T> Page<T> {
    pub fn rendered(data: T) -> Self {
        Page { state: PageState::Rendered, error: None, data }
    }

    pub fn fallback(data: T, error: impl Into<String>) -> Self {
        Page { state: PageState::Fallback, error: Some(error.into()), data }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Page<U> {
        Page { state: self.state, error: self.error, data: f(self.data) }
    }

    pub fn is_fallback(&self) -> bool {
        self.state == PageState::Fallback
    }

    /// Combined state of a page assembled from several reads.
    fn merge_state<U>(&mut self, other: &Page<U>) {
        if other.is_fallback() {
            self.state = PageState::Fallback;
            if self.error.is_none() {
                self.error = other.error.clone();
            }
        }
    }
}

#[derive(Debug, Clone)]
pub enum Detail<T> {
    Found(Page<T>),
    NotFound,
}

/// Sorts newest first. The sort is stable, so equal dates keep their order.
pub fn sort_newest_first<E: Dated>(items: &mut [E]) {
    items.sort_by(|a, b| b.date().cmp(&a.date()));
}

fn take<T>(mut items: Vec<T>, limit: Option<usize>) -> Vec<T> {
    if let Some(limit) = limit {
        items.truncate(limit);
    }
    items
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectFilter {
    pub category: Option<String>,
    pub featured: Option<bool>,
    pub limit: Option<usize>,
}

impl ProjectFilter {
    /// `None` and `"all"` both match every category.
    pub fn category(&self) -> Result<Option<ProjectCategory>, AppError> {
        match self.category.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(c) if c.eq_ignore_ascii_case(CATEGORY_ALL) => Ok(None),
            Some(c) => c.parse().map(Some),
        }
    }

    pub fn apply(&self, items: Vec<Stored<Project>>) -> Result<Vec<Stored<Project>>, AppError> {
        let category = self.category()?;
        let narrowed = items
            .into_iter()
            .filter(|p| category.is_none_or(|c| p.entity.category == c))
            .filter(|p| self.featured.is_none_or(|f| p.entity.featured == f))
            .collect();
        Ok(take(narrowed, self.limit))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostFilter {
    pub tag: Option<String>,
    pub limit: Option<usize>,
}

impl PostFilter {
    pub fn apply(&self, items: Vec<Stored<BlogPost>>) -> Vec<Stored<BlogPost>> {
        let tag = self.tag.as_deref().map(str::trim).filter(|t| !t.is_empty());
        let narrowed = items
            .into_iter()
            .filter(|p| tag.is_none_or(|t| p.entity.has_tag(t)))
            .collect();
        take(narrowed, self.limit)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HomeView {
    pub profile: ProfileSettings,
    pub featured_projects: Vec<Stored<Project>>,
    pub recent_posts: Vec<Stored<BlogPost>>,
    pub certificates: Vec<Stored<Certificate>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AboutView {
    pub profile: ProfileSettings,
    pub hackathons: Vec<HackathonCard>,
    pub certificates: Vec<Stored<Certificate>>,
}

const HOME_FEATURED: usize = 3;
const HOME_RECENT_POSTS: usize = 3;
const HOME_CERTIFICATES: usize = 4;

// ───── Renderer ─────────────────────────────────────────────────────

/// Read side of the site: every list read goes through the content cache and
/// degrades to bundled content when the row store cannot be reached.
#[derive(Clone)]
pub struct ContentRenderer {
    store: Arc<dyn RowStore>,
    cache: Arc<ContentCache>,
}

impl ContentRenderer {
    pub fn new(store: Arc<dyn RowStore>, cache: Arc<ContentCache>) -> Self {
        ContentRenderer { store, cache }
    }

    async fn rows(&self, table: Table) -> Result<Arc<Vec<serde_json::Value>>, StoreError> {
        let store = self.store.clone();
        self.cache
            .get_or_fetch(table, || async move {
                match store.query(&Query::table(table).newest_first()).await {
                    Err(StoreError::NotFound) => Ok(Vec::new()),
                    other => other,
                }
            })
            .await
    }

    async fn list<E: FallbackSource>(&self) -> Page<Vec<Stored<E>>> {
        match self.rows(E::TABLE).await {
            Ok(rows) => {
                let mut items = decode_rows::<E>(&rows);
                sort_newest_first(&mut items);
                Page::rendered(items)
            }
            Err(e) => {
                warn!(table = %E::TABLE, error = %e, "Read failed, rendering bundled content");
                let mut items = E::fallback();
                sort_newest_first(&mut items);
                Page::fallback(items, e.to_string())
            }
        }
    }

    pub async fn projects(&self, filter: &ProjectFilter) -> Result<Page<Vec<Stored<Project>>>, AppError> {
        // Reject a bad filter before touching the store.
        filter.category()?;
        let page = self.list::<Project>().await;
        let data = filter.apply(page.data)?;
        Ok(Page { state: page.state, error: page.error, data })
    }

    pub async fn project(&self, id: Uuid) -> Detail<Stored<Project>> {
        let page = self.list::<Project>().await;
        match page.data.iter().position(|p| p.id == id) {
            Some(index) => Detail::Found(page.map(|mut items| items.swap_remove(index))),
            None => Detail::NotFound,
        }
    }

    pub async fn posts(&self, filter: &PostFilter) -> Page<Vec<Stored<BlogPost>>> {
        self.list::<BlogPost>().await.map(|items| filter.apply(items))
    }

    pub async fn post(&self, slug: &str) -> Detail<RenderedPost> {
        let page = self.list::<BlogPost>().await;
        match page.data.iter().position(|p| p.entity.slug == slug) {
            Some(index) => Detail::Found(page.map(|mut items| RenderedPost::from(items.swap_remove(index)))),
            None => Detail::NotFound,
        }
    }

    pub async fn certificates(&self, limit: Option<usize>) -> Page<Vec<Stored<Certificate>>> {
        self.list::<Certificate>().await.map(|items| take(items, limit))
    }

    pub async fn hackathons(&self, limit: Option<usize>) -> Page<Vec<HackathonCard>> {
        self.list::<Hackathon>()
            .await
            .map(|items| take(items, limit).into_iter().map(HackathonCard::from).collect())
    }

    /// Site-wide profile. A missing row renders the bundled profile without
    /// being treated as a failure.
    pub async fn profile(&self) -> Page<ProfileSettings> {
        match self.rows(Table::ProfileSettings).await {
            Ok(rows) => {
                let profile = decode_rows::<ProfileSettings>(&rows)
                    .into_iter()
                    .next()
                    .map(|p| p.entity)
                    .unwrap_or_else(|| FALLBACK.profile.clone());
                Page::rendered(profile)
            }
            Err(e) => {
                warn!(error = %e, "Profile read failed, rendering bundled profile");
                Page::fallback(FALLBACK.profile.clone(), e.to_string())
            }
        }
    }

    pub async fn coding_profile(&self) -> Page<CodingProfileSettings> {
        match self.rows(Table::CodingProfiles).await {
            Ok(rows) => Page::rendered(
                decode_rows::<CodingProfileSettings>(&rows)
                    .into_iter()
                    .next()
                    .map(|p| p.entity)
                    .unwrap_or_else(|| FALLBACK.coding_profile.clone()),
            ),
            Err(e) => {
                warn!(error = %e, "Coding profile read failed, using bundled settings");
                Page::fallback(FALLBACK.coding_profile.clone(), e.to_string())
            }
        }
    }

    pub async fn home(&self) -> Page<HomeView> {
        let (profile, projects, posts, certificates) = tokio::join!(
            self.profile(),
            self.list::<Project>(),
            self.list::<BlogPost>(),
            self.list::<Certificate>(),
        );

        let mut page = Page::rendered(());
        page.merge_state(&profile);
        page.merge_state(&projects);
        page.merge_state(&posts);
        page.merge_state(&certificates);

        page.map(|_| HomeView {
            profile: profile.data,
            featured_projects: take(
                projects.data.into_iter().filter(|p| p.entity.featured).collect(),
                Some(HOME_FEATURED),
            ),
            recent_posts: take(posts.data, Some(HOME_RECENT_POSTS)),
            certificates: take(certificates.data, Some(HOME_CERTIFICATES)),
        })
    }

    pub async fn about(&self) -> Page<AboutView> {
        let (profile, hackathons, certificates) =
            tokio::join!(self.profile(), self.hackathons(None), self.certificates(None));

        let mut page = Page::rendered(());
        page.merge_state(&profile);
        page.merge_state(&hackathons);
        page.merge_state(&certificates);

        page.map(|_| AboutView {
            profile: profile.data,
            hackathons: hackathons.data,
            certificates: certificates.data,
        })
    }

    /// Manual retry: the next read of `table` goes back to the store.
    pub fn refresh(&self, table: Table) {
        self.cache.invalidate(table);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        entities::hackathon::HackathonResult,
        repositories::{
            entity_repo::encode_row,
            memory_store::{MemoryRowStore, StoreOp},
        },
    };
    use chrono::NaiveDate;
    use std::time::Duration;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn project(title: &str, category: ProjectCategory, when: NaiveDate) -> (Uuid, Project) {
        (Uuid::new_v4(), Project {
            title: title.into(),
            description: "d".into(),
            image_url: "/img.png".into(),
            date: when,
            category,
            technologies: vec!["Rust".into()],
            featured: false,
            demo_url: None,
            source_url: None,
            submissions: None,
        })
    }

    fn seed<E: ContentEntity>(store: &MemoryRowStore, items: &[(Uuid, E)]) {
        let rows = items.iter().map(|(id, e)| encode_row(*id, e).unwrap()).collect();
        store.seed(E::TABLE, rows);
    }

    fn renderer(store: Arc<MemoryRowStore>) -> ContentRenderer {
        ContentRenderer::new(store, Arc::new(ContentCache::new(Duration::from_secs(60))))
    }

    #[test]
    fn bundled_content_parses() {
        assert!(!FALLBACK.projects.is_empty());
        assert!(!FALLBACK.blog_posts.is_empty());
        assert!(!FALLBACK.profile.display_name.is_empty());
    }

    #[tokio::test]
    async fn projects_are_sorted_and_filtered_by_category() {
        let store = Arc::new(MemoryRowStore::recording());
        seed(&store, &[
            project("Old web", ProjectCategory::Web, date(2022, 1, 1)),
            project("New web", ProjectCategory::Web, date(2024, 1, 1)),
            project("Mobile", ProjectCategory::Mobile, date(2023, 1, 1)),
        ]);
        let renderer = renderer(store);

        let all = renderer
            .projects(&ProjectFilter { category: Some("all".into()), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(all.state, PageState::Rendered);
        let titles: Vec<&str> = all.data.iter().map(|p| p.entity.title.as_str()).collect();
        assert_eq!(titles, vec!["New web", "Mobile", "Old web"]);

        let mut union = 0;
        for category in ProjectCategory::ALL {
            let page = renderer
                .projects(&ProjectFilter { category: Some(category.to_string()), ..Default::default() })
                .await
                .unwrap();
            assert!(page.data.iter().all(|p| p.entity.category == category));
            union += page.data.len();
        }
        assert_eq!(union, all.data.len());

        assert!(renderer
            .projects(&ProjectFilter { category: Some("desktop".into()), ..Default::default() })
            .await
            .is_err());
    }

    #[tokio::test]
    async fn failed_read_renders_fallback() {
        let store = Arc::new(MemoryRowStore::recording());
        store.fail_on(Table::Projects, StoreOp::Query);
        let renderer = renderer(store);

        let page = renderer
            .projects(&ProjectFilter { category: Some("ml".into()), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(page.state, PageState::Fallback);
        assert!(page.error.is_some());
        assert!(!page.data.is_empty());
        assert!(page.data.iter().all(|p| p.entity.category == ProjectCategory::Ml));
    }

    #[tokio::test]
    async fn detail_lookup_distinguishes_not_found() {
        let store = Arc::new(MemoryRowStore::recording());
        let item = project("Only", ProjectCategory::Backend, date(2024, 2, 2));
        seed(&store, &[item.clone()]);
        let renderer = renderer(store);

        assert!(matches!(renderer.project(item.0).await, Detail::Found(p) if p.data.entity.title == "Only"));
        assert!(matches!(renderer.project(Uuid::new_v4()).await, Detail::NotFound));
        assert!(matches!(renderer.post("missing-slug").await, Detail::NotFound));
    }

    #[tokio::test]
    async fn reads_are_cached_until_refresh() {
        let store = Arc::new(MemoryRowStore::recording());
        let renderer = renderer(store.clone());

        renderer.certificates(None).await;
        renderer.certificates(Some(1)).await;
        assert_eq!(store.call_count(StoreOp::Query, Table::Certificates), 1);

        renderer.refresh(Table::Certificates);
        renderer.certificates(None).await;
        assert_eq!(store.call_count(StoreOp::Query, Table::Certificates), 2);
    }

    #[tokio::test]
    async fn hackathon_cards_sort_and_highlight() {
        let store = Arc::new(MemoryRowStore::recording());
        let older = (Uuid::new_v4(), Hackathon {
            name: "Old Jam".into(),
            date: date(2024, 12, 31),
            role: "Dev".into(),
            result: HackathonResult::Participant,
            learnings: vec!["x".into()],
            image: None,
        });
        let hackday = (Uuid::new_v4(), Hackathon {
            name: "HackDay".into(),
            date: date(2025, 1, 1),
            role: "Lead".into(),
            result: HackathonResult::Winner,
            learnings: vec!["Teamwork".into()],
            image: None,
        });
        seed(&store, &[older, hackday]);

        let page = renderer(store).hackathons(None).await;
        assert_eq!(page.data[0].hackathon.entity.name, "HackDay");
        assert_eq!(page.data[0].highlight, "green");
        assert_eq!(page.data[1].highlight, "gray");
    }

    #[tokio::test]
    async fn home_is_fallback_when_any_section_falls_back() {
        let store = Arc::new(MemoryRowStore::recording());
        store.fail_on(Table::BlogPosts, StoreOp::Query);
        let page = renderer(store).home().await;
        assert_eq!(page.state, PageState::Fallback);
        assert!(!page.data.recent_posts.is_empty());
        assert_eq!(page.data.profile, FALLBACK.profile);
    }
}
