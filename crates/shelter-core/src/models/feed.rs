//! Group activity feed: comment and announcement events merged into a
//! single time-ordered window.

use std::num::IntErrorKind;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ShelterError, ShelterResult};

/// Default number of feed items per page.
pub const DEFAULT_FEED_LIMIT: u64 = 20;
/// Upper bound on the page size a caller may request.
pub const MAX_FEED_LIMIT: u64 = 100;

/// Which sources contribute to the feed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeedFilter {
    #[default]
    All,
    Comments,
    Announcements,
}

impl FeedFilter {
    /// Parse a raw `type` query value. Absent or unrecognized values
    /// fall back to [`FeedFilter::All`].
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("comments") => FeedFilter::Comments,
            Some("announcements") | Some("updates") => FeedFilter::Announcements,
            _ => FeedFilter::All,
        }
    }

    pub fn includes_comments(&self) -> bool {
        matches!(self, FeedFilter::All | FeedFilter::Comments)
    }

    pub fn includes_announcements(&self) -> bool {
        matches!(self, FeedFilter::All | FeedFilter::Announcements)
    }
}

/// Offset/limit window applied after the merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedWindow {
    pub limit: u64,
    pub offset: u64,
}

impl Default for FeedWindow {
    fn default() -> Self {
        Self {
            limit: DEFAULT_FEED_LIMIT,
            offset: 0,
        }
    }
}

impl FeedWindow {
    /// Build a window from raw request values.
    ///
    /// Missing, non-numeric, zero or negative limits become
    /// `default_limit`; limits above `max_limit` are clamped. Missing,
    /// non-numeric or negative offsets become 0. Numbers too large to
    /// represent are rejected with a validation error.
    pub fn parse(
        limit: Option<&str>,
        offset: Option<&str>,
        default_limit: u64,
        max_limit: u64,
    ) -> ShelterResult<Self> {
        let limit = match parse_param("limit", limit)? {
            Some(n) if n > 0 => (n as u64).min(max_limit),
            _ => default_limit,
        };
        let offset = match parse_param("offset", offset)? {
            Some(n) if n >= 0 => n as u64,
            _ => 0,
        };
        Ok(Self { limit, offset })
    }

    /// Number of rows each source must supply so that the merged
    /// window is exact.
    pub fn fetch_size(&self) -> u64 {
        self.offset.saturating_add(self.limit)
    }
}

fn parse_param(name: &str, raw: Option<&str>) -> ShelterResult<Option<i64>> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    match raw.parse::<i64>() {
        Ok(n) => Ok(Some(n)),
        Err(e) => match e.kind() {
            IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => Err(
                ShelterError::validation(format!("{name} is out of range: {raw}")),
            ),
            _ => Ok(None),
        },
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedAuthor {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentEvent {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub author: FeedAuthor,
    pub animal_id: Uuid,
    pub animal_name: String,
    pub content: String,
    pub image_url: Option<String>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnouncementEvent {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub author: FeedAuthor,
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedKind {
    Comment,
    Announcement,
}

/// One entry of the merged feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeedItem {
    Comment(CommentEvent),
    Announcement(AnnouncementEvent),
}

impl FeedItem {
    pub fn kind(&self) -> FeedKind {
        match self {
            FeedItem::Comment(_) => FeedKind::Comment,
            FeedItem::Announcement(_) => FeedKind::Announcement,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            FeedItem::Comment(c) => c.id,
            FeedItem::Announcement(a) => a.id,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            FeedItem::Comment(c) => c.timestamp,
            FeedItem::Announcement(a) => a.timestamp,
        }
    }

    /// Newest first; on equal timestamps the larger (later-created)
    /// id comes first.
    fn sort_key(&self) -> (DateTime<Utc>, Uuid) {
        (self.timestamp(), self.id())
    }
}

/// Merge both sources into one ordering and cut the requested window.
///
/// Each input must hold at least `window.fetch_size()` of its newest
/// rows (or all of them) for the result to be exact.
pub fn merge_window(
    comments: Vec<CommentEvent>,
    announcements: Vec<AnnouncementEvent>,
    window: FeedWindow,
) -> Vec<FeedItem> {
    let mut items: Vec<FeedItem> = comments
        .into_iter()
        .map(FeedItem::Comment)
        .chain(announcements.into_iter().map(FeedItem::Announcement))
        .collect();

    items.sort_by(|a, b| b.sort_key().cmp(&a.sort_key()));

    let offset = usize::try_from(window.offset).unwrap_or(usize::MAX);
    let limit = usize::try_from(window.limit).unwrap_or(usize::MAX);
    items.into_iter().skip(offset).take(limit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn author() -> FeedAuthor {
        FeedAuthor {
            id: Uuid::nil(),
            name: "alice".into(),
        }
    }

    fn comment(id: u128, secs: i64) -> CommentEvent {
        CommentEvent {
            id: Uuid::from_u128(id),
            timestamp: at(secs),
            author: author(),
            animal_id: Uuid::from_u128(9_999),
            animal_name: "Biscuit".into(),
            content: format!("comment {id}"),
            image_url: None,
            tags: vec![],
        }
    }

    fn announcement(id: u128, secs: i64) -> AnnouncementEvent {
        AnnouncementEvent {
            id: Uuid::from_u128(id),
            timestamp: at(secs),
            author: author(),
            title: format!("update {id}"),
            content: String::new(),
        }
    }

    #[test]
    fn merges_sources_newest_first() {
        let items = merge_window(
            vec![comment(1, 10), comment(2, 20)],
            vec![announcement(3, 15)],
            FeedWindow {
                limit: 10,
                offset: 0,
            },
        );
        let ids: Vec<_> = items.iter().map(FeedItem::id).collect();
        assert_eq!(
            ids,
            vec![Uuid::from_u128(2), Uuid::from_u128(3), Uuid::from_u128(1)]
        );
        assert_eq!(items[1].kind(), FeedKind::Announcement);
    }

    #[test]
    fn equal_timestamps_break_ties_by_id_descending() {
        let items = merge_window(
            vec![comment(5, 10)],
            vec![announcement(7, 10)],
            FeedWindow::default(),
        );
        assert_eq!(items[0].id(), Uuid::from_u128(7));
        assert_eq!(items[1].id(), Uuid::from_u128(5));
    }

    #[test]
    fn window_applies_after_merge() {
        // Paginating each source separately would put both comments on
        // the first page.
        let items = merge_window(
            vec![comment(1, 1), comment(2, 2)],
            vec![announcement(3, 3), announcement(4, 4)],
            FeedWindow {
                limit: 2,
                offset: 1,
            },
        );
        let ids: Vec<_> = items.iter().map(FeedItem::id).collect();
        assert_eq!(ids, vec![Uuid::from_u128(3), Uuid::from_u128(2)]);
    }

    #[test]
    fn items_serialize_with_type_tag() {
        let json = serde_json::to_value(FeedItem::Comment(comment(1, 0))).unwrap();
        assert_eq!(json["type"], "comment");
        assert_eq!(json["animal_name"], "Biscuit");
        assert_eq!(json["author"]["name"], "alice");

        let json = serde_json::to_value(FeedItem::Announcement(announcement(2, 0))).unwrap();
        assert_eq!(json["type"], "announcement");
        assert_eq!(json["title"], "update 2");
    }

    #[test]
    fn filter_parsing_defaults_to_all() {
        assert_eq!(FeedFilter::parse(None), FeedFilter::All);
        assert_eq!(FeedFilter::parse(Some("bogus")), FeedFilter::All);
        assert_eq!(FeedFilter::parse(Some("Comments")), FeedFilter::Comments);
        assert_eq!(
            FeedFilter::parse(Some("announcements")),
            FeedFilter::Announcements
        );
    }

    #[test]
    fn window_parsing_falls_back_to_defaults() {
        let w = FeedWindow::parse(Some("-5"), Some("abc"), 20, 100).unwrap();
        assert_eq!(w, FeedWindow { limit: 20, offset: 0 });

        let w = FeedWindow::parse(Some("0"), Some("-1"), 20, 100).unwrap();
        assert_eq!(w, FeedWindow { limit: 20, offset: 0 });

        let w = FeedWindow::parse(Some("500"), Some("40"), 20, 100).unwrap();
        assert_eq!(w, FeedWindow { limit: 100, offset: 40 });
    }

    #[test]
    fn window_parsing_rejects_overflow() {
        let err = FeedWindow::parse(None, Some("99999999999999999999999"), 20, 100).unwrap_err();
        assert!(matches!(err, ShelterError::Validation { .. }));
    }

    proptest! {
        #[test]
        fn paging_reproduces_full_order(
            comment_times in proptest::collection::vec(0i64..50, 0..30),
            update_times in proptest::collection::vec(0i64..50, 0..30),
            step in 1u64..7,
        ) {
            let comments: Vec<_> = comment_times
                .iter()
                .enumerate()
                .map(|(i, t)| comment(i as u128 + 1, *t))
                .collect();
            let updates: Vec<_> = update_times
                .iter()
                .enumerate()
                .map(|(i, t)| announcement(i as u128 + 1_000, *t))
                .collect();
            let total = (comments.len() + updates.len()) as u64;

            let full = merge_window(
                comments.clone(),
                updates.clone(),
                FeedWindow { limit: u64::MAX, offset: 0 },
            );

            let mut paged = Vec::new();
            let mut offset = 0;
            while offset < total {
                let window = FeedWindow { limit: step, offset };
                // Each source supplies only its newest fetch_size rows,
                // as the store does.
                let take = window.fetch_size() as usize;
                let mut c = comments.clone();
                c.sort_by(|a, b| (b.timestamp, b.id).cmp(&(a.timestamp, a.id)));
                c.truncate(take);
                let mut u = updates.clone();
                u.sort_by(|a, b| (b.timestamp, b.id).cmp(&(a.timestamp, a.id)));
                u.truncate(take);
                paged.extend(merge_window(c, u, window));
                offset += step;
            }

            prop_assert_eq!(paged, full);
        }
    }
}
