use chrono::{NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::{
        record::{ContentEntity, Dated, Stored},
        validation::{normalize_items, validate_image_ref, validate_slug, validate_tags, validate_title},
    },
    errors::AppError,
    repositories::row_store::Table,
    utils::markdown::safe_markdown_to_html,
};

// ───── Constants ──────────────────────────────────────────────────────
const MAX_TITLE_LENGTH: u64 = 120;
const MAX_SLUG_LENGTH: u64 = 80;
const MAX_DESCRIPTION_LENGTH: u64 = 300;
const WORDS_PER_MINUTE: usize = 200;

static NON_SLUG_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s-]").expect("valid slug regex"));
static WHITESPACE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));
static HYPHEN_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"-+").expect("valid hyphen regex"));

/// Derives a URL slug from a title.
///
/// Lowercases, drops letters that stay uppercase (no lowercase mapping) and
/// everything that is not a word character, whitespace or hyphen, turns whitespace into hyphens, collapses hyphen runs and trims
/// hyphens from both ends. `slugify(slugify(x)) == slugify(x)`.
pub fn slugify(input: &str) -> String {
    let lowered: String = input.to_lowercase().chars().filter(|c| !c.is_uppercase()).collect();
    let stripped = NON_SLUG_CHARS.replace_all(&lowered, "");
    let hyphenated = WHITESPACE_RUNS.replace_all(stripped.trim(), "-");
    let collapsed = HYPHEN_RUNS.replace_all(&hyphenated, "-");
    collapsed.trim_matches('-').to_string()
}

/// Whole minutes needed to read `markdown`, never less than one.
pub fn estimate_read_time(markdown: &str) -> u32 {
    let words = markdown.split_whitespace().count();
    words.div_ceil(WORDS_PER_MINUTE).max(1) as u32
}

// ───── Database Models ───────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct BlogPostRow {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub content: String,
    pub coverimage: Option<String>,
    pub date: NaiveDate,
    pub readtime: Option<i32>,
    #[serde(default)]
    pub tags: Vec<String>,
}

// ───── View Models ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct BlogPost {
    #[validate(
        length(min = 1, max = MAX_TITLE_LENGTH, message = "Title must be between 1 and 120 characters"),
        custom(function = "validate_title")
    )]
    pub title: String,

    #[validate(
        length(min = 1, max = MAX_SLUG_LENGTH, message = "Slug must be between 1 and 80 characters"),
        custom(function = "validate_slug")
    )]
    pub slug: String,

    #[validate(length(min = 1, max = MAX_DESCRIPTION_LENGTH, message = "Description must be between 1 and 300 characters"))]
    pub description: String,

    #[validate(length(min = 1, message = "Content cannot be empty"))]
    pub content_markdown: String,

    #[validate(custom(function = "validate_image_ref"))]
    pub cover_image: String,

    pub date: NaiveDate,

    #[validate(range(min = 1, max = 600, message = "Read time must be between 1 and 600 minutes"))]
    pub read_time_minutes: u32,

    #[validate(custom(function = "validate_tags"))]
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Default for BlogPost {
    fn default() -> Self {
        BlogPost {
            title: String::new(),
            slug: String::new(),
            description: String::new(),
            content_markdown: String::new(),
            cover_image: String::new(),
            date: Utc::now().date_naive(),
            read_time_minutes: 0,
            tags: Vec::new(),
        }
    }
}

/// Detail view of a post with its body rendered to sanitized HTML.
#[derive(Debug, Clone, Serialize)]
pub struct RenderedPost {
    #[serde(flatten)]
    pub post: Stored<BlogPost>,
    pub content_html: String,
}

impl From<Stored<BlogPost>> for RenderedPost {
    fn from(post: Stored<BlogPost>) -> Self {
        let content_html = safe_markdown_to_html(&post.entity.content_markdown);
        RenderedPost { post, content_html }
    }
}

impl BlogPost {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag.trim()))
    }
}

impl Dated for BlogPost {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

// ───── Conversions ──────────────────────────────────────────────────

impl ContentEntity for BlogPost {
    type Row = BlogPostRow;

    const TABLE: Table = Table::BlogPosts;
    const LABEL: &'static str = "blog post";

    fn from_row(row: BlogPostRow) -> Stored<Self> {
        Stored::new(row.id, BlogPost {
            title: row.title,
            slug: row.slug,
            description: row.description,
            read_time_minutes: row
                .readtime
                .filter(|m| *m > 0)
                .map(|m| m as u32)
                .unwrap_or_else(|| estimate_read_time(&row.content)),
            content_markdown: row.content,
            cover_image: row.coverimage.unwrap_or_default(),
            date: row.date,
            tags: row.tags,
        })
    }

    fn to_row(id: Uuid, entity: &Self) -> BlogPostRow {
        BlogPostRow {
            id,
            title: entity.title.clone(),
            slug: entity.slug.clone(),
            description: entity.description.clone(),
            content: entity.content_markdown.clone(),
            coverimage: Some(entity.cover_image.clone()),
            date: entity.date,
            readtime: Some(entity.read_time_minutes as i32),
            tags: entity.tags.clone(),
        }
    }

    fn check(&self) -> Result<(), AppError> {
        self.validate().map_err(AppError::from)
    }

    fn prepare(&mut self) {
        self.title = self.title.trim().to_string();
        if self.slug.trim().is_empty() {
            self.slug = slugify(&self.title);
        }
        if self.read_time_minutes == 0 {
            self.read_time_minutes = estimate_read_time(&self.content_markdown);
        }
        normalize_items(&mut self.tags);
    }

    fn after_edit(&mut self, field: &str, is_draft: bool, touched: &[String]) {
        let slug_edited = touched.iter().any(|f| f == "slug");
        if is_draft && field == "title" && !slug_edited {
            self.slug = slugify(&self.title);
        }
    }
}
