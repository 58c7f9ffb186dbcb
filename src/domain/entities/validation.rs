use std::borrow::Cow;

use validator::ValidationError;

pub const MAX_TAGS: usize = 10;
pub const MAX_TAG_LENGTH: usize = 30;

// ───── Validation Helpers ───────────────────────────────────────────

pub fn validate_url(url: &str) -> Result<(), ValidationError> {
    match url::Url::parse(url) {
        Ok(parsed) => {
            if parsed.scheme() == "http" || parsed.scheme() == "https" {
                Ok(())
            } else {
                Err(new_validation_error("invalid_url_scheme", "URL must start with http:// or https://"))
            }
        }
        Err(_) => Err(new_validation_error("invalid_url", "Invalid URL format")),
    }
}

/// Image fields accept absolute URLs or site-relative asset paths.
pub fn validate_image_ref(value: &str) -> Result<(), ValidationError> {
    if value.starts_with('/') && !value.starts_with("//") {
        return Ok(());
    }
    validate_url(value)
}

pub fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    if slug.is_empty() {
        return Err(new_validation_error("slug_empty", "Slug cannot be empty"));
    }
    if slug.chars().any(|c| c.is_whitespace() || c.is_uppercase()) {
        return Err(new_validation_error("slug_invalid_chars", "Slug must be lowercase without whitespace"));
    }
    if slug.starts_with('-') || slug.ends_with('-') {
        return Err(new_validation_error("slug_edge_hyphen", "Slug must not start or end with a hyphen"));
    }
    if slug.contains("--") {
        return Err(new_validation_error("slug_double_hyphen", "Slug must not contain consecutive hyphens"));
    }
    Ok(())
}

pub fn validate_tags(tags: &[String]) -> Result<(), ValidationError> {
    if tags.len() > MAX_TAGS {
        return Err(new_validation_error("too_many_tags", "Too many tags provided"));
    }
    for tag in tags {
        if tag.trim().is_empty() || tag.chars().count() > MAX_TAG_LENGTH {
            return Err(new_validation_error("invalid_tag_length", "Tag length must be within allowed range"));
        }
    }
    Ok(())
}

/// Platform handles: ASCII letters, digits, `-` and `_`. Blank means "not set".
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    let name = username.trim();
    if name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        Ok(())
    } else {
        Err(new_validation_error("username_chars", "Username may only contain letters, digits, '-' and '_'"))
    }
}

/// Lists such as technologies or learnings must hold at least one non-blank entry.
pub fn validate_non_blank_items(items: &[String]) -> Result<(), ValidationError> {
    if items.iter().all(|item| item.trim().is_empty()) {
        return Err(new_validation_error("empty_list", "At least one non-empty entry is required"));
    }
    Ok(())
}

pub fn validate_title(title: &str) -> Result<(), ValidationError> {
    if title.trim().len() != title.len() {
        return Err(new_validation_error("title_whitespace", "Title must not have leading or trailing whitespace"));
    }
    Ok(())
}

/// Trims every entry and drops the blank ones.
pub fn normalize_items(items: &mut Vec<String>) {
    *items = items
        .iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect();
}

pub fn new_validation_error(code: &'static str, msg: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(msg));
    err
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_must_be_http() {
        assert!(validate_url("https://example.com/a").is_ok());
        assert!(validate_url("ftp://example.com").is_err());
        assert!(validate_url("not a url").is_err());
    }

    #[test]
    fn image_refs_allow_site_paths() {
        assert!(validate_image_ref("/images/project.png").is_ok());
        assert!(validate_image_ref("//cdn.example.com/x.png").is_err());
    }

    #[test]
    fn slug_rules() {
        assert!(validate_slug("hello-world").is_ok());
        assert!(validate_slug("Hello").is_err());
        assert!(validate_slug("-edge").is_err());
        assert!(validate_slug("double--hyphen").is_err());
    }

    #[test]
    fn blank_lists_are_rejected() {
        assert!(validate_non_blank_items(&["  ".to_string()]).is_err());
        assert!(validate_non_blank_items(&[]).is_err());
        assert!(validate_non_blank_items(&[" Teamwork ".to_string()]).is_ok());
    }

    #[test]
    fn normalize_trims_and_drops_blanks() {
        let mut items = vec![" a ".to_string(), "   ".to_string(), "b".to_string()];
        normalize_items(&mut items);
        assert_eq!(items, vec!["a", "b"]);
    }
}
