//! Mention Resolver
//!
//! Extracts `@handle` tokens, resolves them against the user directory and
//! renders post text as safe markup. Text is always HTML-escaped before any
//! link is inserted; only resolved handles are turned into links.

use crate::directory::{ResolvedHandles, UserDirectory};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;

pub const MIN_HANDLE_CHARS: usize = 3;
pub const MAX_HANDLE_CHARS: usize = 30;

/// `@` preceded by start of text or a non-word character.
/// Group 1 is the boundary, group 2 the handle.
static MENTION_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(^|[^A-Za-z0-9_])@([A-Za-z0-9_]+)").expect("Invalid mention regex")
});

fn valid_handle(handle: &str) -> bool {
    (MIN_HANDLE_CHARS..=MAX_HANDLE_CHARS).contains(&handle.len())
}

/// Extract mentioned handles, lowercased and deduplicated in first-seen order
pub fn extract_handles(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    MENTION_REGEX
        .captures_iter(text)
        .filter_map(|cap| cap.get(2).map(|m| m.as_str()))
        .filter(|handle| valid_handle(handle))
        .map(|handle| handle.to_lowercase())
        .filter(|handle| seen.insert(handle.clone()))
        .collect()
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// Rendered post or comment body
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenderedContent {
    pub html: String,
    /// Canonical usernames that were linked, in order of first appearance
    pub mentions_used: Vec<String>,
}

pub struct MentionResolver {
    directory: Arc<dyn UserDirectory>,
    profile_url_prefix: String,
}

impl MentionResolver {
    pub fn new(directory: Arc<dyn UserDirectory>, profile_url_prefix: impl Into<String>) -> Self {
        Self {
            directory,
            profile_url_prefix: profile_url_prefix.into(),
        }
    }

    /// Resolve handles against the directory. Unknown handles are dropped.
    pub async fn resolve(&self, handles: &[String]) -> sqlx::Result<ResolvedHandles> {
        if handles.is_empty() {
            return Ok(ResolvedHandles::new());
        }
        let resolved = self.directory.find_users_by_handles(handles).await?;
        tracing::debug!(
            requested = handles.len(),
            resolved = resolved.len(),
            "Resolved mention handles"
        );
        Ok(resolved)
    }

    /// Extract, resolve and render in one step
    pub async fn render_text(&self, text: &str) -> sqlx::Result<RenderedContent> {
        let resolved = self.resolve(&extract_handles(text)).await?;
        Ok(self.render(text, &resolved))
    }

    pub fn render(&self, text: &str, resolved: &ResolvedHandles) -> RenderedContent {
        let escaped = escape_html(text);
        let mut mentions_used: Vec<String> = Vec::new();

        let linked = MENTION_REGEX.replace_all(&escaped, |cap: &Captures| {
            let boundary = &cap[1];
            let handle = &cap[2];
            let author = valid_handle(handle)
                .then(|| resolved.get(&handle.to_lowercase()))
                .flatten();

            match author {
                Some(author) => {
                    if !mentions_used.contains(&author.username) {
                        mentions_used.push(author.username.clone());
                    }
                    let badge = author
                        .badge
                        .as_deref()
                        .map(|b| format!(" data-badge=\"{}\"", escape_html(b)))
                        .unwrap_or_default();
                    format!(
                        "{}<a href=\"{}{}\" class=\"mention\"{}>@{}</a>",
                        boundary,
                        escape_html(&self.profile_url_prefix),
                        author.username,
                        badge,
                        author.username
                    )
                }
                None => cap[0].to_string(),
            }
        });

        let html = linked
            .replace("\r\n", "\n")
            .replace('\r', "\n")
            .replace('\n', "<br>\n");

        RenderedContent {
            html,
            mentions_used,
        }
    }
}
