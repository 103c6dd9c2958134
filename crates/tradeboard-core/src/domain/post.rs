use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Who may read a published post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
    Premium,
}

impl Visibility {
    pub const ALL: [Visibility; 3] = [Visibility::Public, Visibility::Private, Visibility::Premium];

    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
            Visibility::Premium => "premium",
        }
    }
}

/// Kind of post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostType {
    Idea,
    Trade,
}

impl PostType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostType::Idea => "idea",
            PostType::Trade => "trade",
        }
    }
}

/// Publication status. Always derived, never taken from a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Draft,
    Scheduled,
    Published,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Scheduled => "scheduled",
            PostStatus::Published => "published",
        }
    }
}

macro_rules! impl_text_enum {
    ($ty:ty, $label:literal, [$($variant:expr),+]) => {
        impl FromStr for $ty {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim();
                [$($variant),+]
                    .into_iter()
                    .find(|v| v.as_str().eq_ignore_ascii_case(wanted))
                    .ok_or_else(|| DomainError::invalid(format!("unknown {} '{}'", $label, s)))
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

impl_text_enum!(Visibility, "visibility", [Visibility::Public, Visibility::Private, Visibility::Premium]);
impl_text_enum!(PostType, "post type", [PostType::Idea, PostType::Trade]);
impl_text_enum!(PostStatus, "status", [PostStatus::Draft, PostStatus::Scheduled, PostStatus::Published]);

/// The lifecycle fields of a post, kept together so the invariants hold:
/// `published_at` is set iff the status is published, and a `scheduled_at`
/// implies scheduled or published.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    pub status: PostStatus,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub published_at: Option<DateTime<Utc>>,
}

impl Schedule {
    /// Derive the lifecycle state from a publish intent evaluated at `now`.
    ///
    /// No intent yields a draft. An intent at or before `now` publishes
    /// immediately with `published_at = scheduled_at`. A future intent
    /// yields a scheduled post that the publisher promotes later.
    pub fn from_intent(scheduled_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Self {
        match scheduled_at {
            None => Self {
                status: PostStatus::Draft,
                scheduled_at: None,
                published_at: None,
            },
            Some(at) if at <= now => Self {
                status: PostStatus::Published,
                scheduled_at: Some(at),
                published_at: Some(at),
            },
            Some(at) => Self {
                status: PostStatus::Scheduled,
                scheduled_at: Some(at),
                published_at: None,
            },
        }
    }

    /// Whether the publisher should promote this schedule at `now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.status == PostStatus::Scheduled && self.scheduled_at.is_some_and(|at| at <= now)
    }
}

/// Post entity - a trading idea or trade write-up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub visibility: Visibility,
    #[serde(rename = "type")]
    pub post_type: PostType,
    pub status: PostStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub media_urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a post.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub visibility: Visibility,
    pub post_type: PostType,
    pub media_urls: Vec<String>,
    pub scheduled_at: Option<DateTime<Utc>>,
}

impl Post {
    /// Build a post for `author_id`, deriving its status at `now`.
    pub fn new(author_id: Uuid, input: NewPost, now: DateTime<Utc>) -> Result<Self, DomainError> {
        let title = validate_title(&input.title)?;
        let schedule = Schedule::from_intent(input.scheduled_at, now);

        Ok(Self {
            id: Uuid::new_v4(),
            author_id,
            title,
            content: input.content,
            tags: normalize_tags(input.tags),
            visibility: input.visibility,
            post_type: input.post_type,
            status: schedule.status,
            media_urls: input.media_urls,
            scheduled_at: schedule.scheduled_at,
            published_at: schedule.published_at,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn schedule(&self) -> Schedule {
        Schedule {
            status: self.status,
            scheduled_at: self.scheduled_at,
            published_at: self.published_at,
        }
    }

    /// Apply store-level changes in place.
    pub fn apply(&mut self, changes: &PostChanges) {
        if let Some(title) = &changes.title {
            self.title = title.clone();
        }
        if let Some(content) = &changes.content {
            self.content = content.clone();
        }
        if let Some(tags) = &changes.tags {
            self.tags = tags.clone();
        }
        if let Some(visibility) = changes.visibility {
            self.visibility = visibility;
        }
        if let Some(post_type) = changes.post_type {
            self.post_type = post_type;
        }
        if let Some(media_urls) = &changes.media_urls {
            self.media_urls = media_urls.clone();
        }
        if let Some(schedule) = changes.schedule {
            self.status = schedule.status;
            self.scheduled_at = schedule.scheduled_at;
            self.published_at = schedule.published_at;
        }
        self.updated_at = changes.updated_at;
    }

    /// Promote a due post. Returns false when the post is not due.
    pub fn promote(&mut self, now: DateTime<Utc>) -> bool {
        if !self.schedule().is_due(now) {
            return false;
        }
        self.status = PostStatus::Published;
        self.published_at = Some(now);
        self.updated_at = now;
        true
    }
}

/// Client-supplied partial update. Status is deliberately absent.
#[derive(Debug, Clone, Default)]
pub struct PostPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    pub visibility: Option<Visibility>,
    pub post_type: Option<PostType>,
    pub media_urls: Option<Vec<String>>,
    pub scheduled_at: Option<DateTime<Utc>>,
}

/// Fields written by a single store update. `None` leaves a field untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct PostChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    pub visibility: Option<Visibility>,
    pub post_type: Option<PostType>,
    pub media_urls: Option<Vec<String>>,
    pub schedule: Option<Schedule>,
    pub updated_at: DateTime<Utc>,
}

impl PostChanges {
    /// Validate the plain-field part of a patch. Scheduling is resolved by
    /// the caller, which knows the post's current status.
    pub fn from_patch(patch: PostPatch, now: DateTime<Utc>) -> Result<Self, DomainError> {
        let title = patch.title.as_deref().map(validate_title).transpose()?;

        Ok(Self {
            title,
            content: patch.content,
            tags: patch.tags.map(normalize_tags),
            visibility: patch.visibility,
            post_type: patch.post_type,
            media_urls: patch.media_urls,
            schedule: None,
            updated_at: now,
        })
    }
}

fn validate_title(title: &str) -> Result<String, DomainError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(DomainError::invalid("title must not be empty"));
    }
    Ok(title.to_string())
}

/// Tags form a set: trimmed, empties dropped, duplicates removed keeping the
/// first occurrence.
pub fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::*;

    fn input(scheduled_at: Option<DateTime<Utc>>) -> NewPost {
        NewPost {
            title: "BTC breakout".to_string(),
            content: "Watching 70k".to_string(),
            tags: vec!["btc".to_string()],
            visibility: Visibility::Public,
            post_type: PostType::Idea,
            media_urls: Vec::new(),
            scheduled_at,
        }
    }

    #[test]
    fn no_intent_is_draft() {
        let now = Utc::now();
        let post = Post::new(Uuid::new_v4(), input(None), now).unwrap();
        assert_eq!(post.status, PostStatus::Draft);
        assert_eq!(post.published_at, None);
        assert_eq!(post.scheduled_at, None);
    }

    #[test]
    fn past_intent_publishes_at_intent() {
        let now = Utc::now();
        let at = now - TimeDelta::hours(1);
        let post = Post::new(Uuid::new_v4(), input(Some(at)), now).unwrap();
        assert_eq!(post.status, PostStatus::Published);
        assert_eq!(post.published_at, Some(at));
    }

    #[test]
    fn present_intent_publishes() {
        let now = Utc::now();
        let schedule = Schedule::from_intent(Some(now), now);
        assert_eq!(schedule.status, PostStatus::Published);
        assert_eq!(schedule.published_at, Some(now));
    }

    #[test]
    fn future_intent_is_scheduled_then_promoted() {
        let now = Utc::now();
        let at = now + TimeDelta::hours(1);
        let mut post = Post::new(Uuid::new_v4(), input(Some(at)), now).unwrap();
        assert_eq!(post.status, PostStatus::Scheduled);
        assert_eq!(post.published_at, None);

        assert!(!post.promote(now));
        let later = at + TimeDelta::seconds(30);
        assert!(post.promote(later));
        assert_eq!(post.status, PostStatus::Published);
        assert!(post.published_at.unwrap() >= at);
        assert!(!post.promote(later));
    }

    #[test]
    fn blank_title_is_rejected() {
        let mut bad = input(None);
        bad.title = "   ".to_string();
        let err = Post::new(Uuid::new_v4(), bad, Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }

    #[test]
    fn tags_are_deduplicated_in_order() {
        let tags = normalize_tags(vec![
            " eth ".to_string(),
            "btc".to_string(),
            "eth".to_string(),
            "".to_string(),
        ]);
        assert_eq!(tags, vec!["eth".to_string(), "btc".to_string()]);
    }

    #[test]
    fn enums_parse_case_insensitively() {
        assert_eq!("Premium".parse::<Visibility>().unwrap(), Visibility::Premium);
        assert_eq!("TRADE".parse::<PostType>().unwrap(), PostType::Trade);
        assert!("archived".parse::<PostStatus>().is_err());
    }

    #[test]
    fn post_serializes_type_field() {
        let post = Post::new(Uuid::new_v4(), input(None), Utc::now()).unwrap();
        let json = serde_json::to_value(&post).unwrap();
        assert_eq!(json["type"], "idea");
        assert_eq!(json["status"], "draft");
        assert!(json.get("published_at").is_none());
    }
}
