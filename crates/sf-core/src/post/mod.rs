//! Post domain: published images with a caption, their hashtags and like state.

use std::collections::HashSet;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::ids::{PostId, UserId};

/// Storage bucket holding post media.
pub const POSTS_BUCKET: &str = "posts";

/// `#` followed by ASCII word characters or Hebrew letters.
const HASHTAG_PATTERN: &str = r"#[A-Za-z0-9_\x{0590}-\x{05FF}]+";

static HASHTAG: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(HASHTAG_PATTERN).ok());

/// Hashtags in `caption`, first occurrence order, duplicates dropped.
pub fn extract_hashtags(caption: &str) -> Vec<String> {
    let Some(pattern) = HASHTAG.as_ref() else {
        return Vec::new();
    };
    let mut seen = HashSet::new();
    pattern
        .find_iter(caption)
        .map(|m| m.as_str())
        .filter(|tag| seen.insert(*tag))
        .map(str::to_string)
        .collect()
}

/// Insert payload for the `posts` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewPost {
    pub user_id: UserId,
    pub content_url: String,
    pub caption: String,
    pub created_at: DateTime<Utc>,
    pub hashtags: Vec<String>,
}

impl NewPost {
    /// Trim the caption and collect its hashtags.
    pub fn new(
        user_id: UserId,
        content_url: impl Into<String>,
        caption: &str,
        created_at: DateTime<Utc>,
    ) -> Self {
        let caption = caption.trim();
        Self {
            user_id,
            content_url: content_url.into(),
            caption: caption.to_string(),
            created_at,
            hashtags: extract_hashtags(caption),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub user_id: UserId,
    pub content_url: String,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub hashtags: Vec<String>,
    #[serde(default)]
    pub likes_count: u32,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// What the viewer sees for one post: whether they like it, and the like count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeState {
    pub liked: bool,
    pub likes_count: u32,
}

impl LikeState {
    pub fn new(liked: bool, likes_count: u32) -> Self {
        Self { liked, likes_count }
    }

    /// The optimistic state after one tap: flipped, count adjusted, never below zero.
    pub fn toggled(self) -> Self {
        if self.liked {
            Self::new(false, self.likes_count.saturating_sub(1))
        } else {
            Self::new(true, self.likes_count.saturating_add(1))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashtags_are_unique_and_ordered() {
        let tags = extract_hashtags("Sunset #beach #Summer_24 at the #beach, #שלום!");
        assert_eq!(tags, vec!["#beach", "#Summer_24", "#שלום"]);
    }

    #[test]
    fn bare_hash_and_plain_text_yield_nothing() {
        assert!(extract_hashtags("no tags here # nor here").is_empty());
        assert!(extract_hashtags("").is_empty());
    }

    #[test]
    fn new_post_trims_caption_before_extracting() {
        let created_at = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let post = NewPost::new(UserId::new("u1"), "https://cdn/p.jpeg", "  hi #there  ", created_at);
        assert_eq!(post.caption, "hi #there");
        assert_eq!(post.hashtags, vec!["#there"]);

        let json = serde_json::to_value(&post).unwrap();
        assert_eq!(json["user_id"], "u1");
        assert_eq!(json["hashtags"][0], "#there");
    }

    #[test]
    fn like_toggle_adjusts_count_without_underflow() {
        assert_eq!(LikeState::new(false, 2).toggled(), LikeState::new(true, 3));
        assert_eq!(LikeState::new(true, 3).toggled(), LikeState::new(false, 2));
        assert_eq!(LikeState::new(true, 0).toggled(), LikeState::new(false, 0));
    }

    #[test]
    fn post_rows_tolerate_missing_counters() {
        let post: Post = serde_json::from_str(
            r#"{"id":"p1","user_id":"u1","content_url":"https://cdn/p.jpeg"}"#,
        )
        .unwrap();
        assert_eq!(post.likes_count, 0);
        assert!(post.hashtags.is_empty());
    }
}
