//! Activity feed and comment posting against in-memory SurrealDB.

mod common;

use shelter_core::error::ShelterError;
use shelter_core::models::comment::CreateCommentTag;
use shelter_core::models::feed::{FeedFilter, FeedItem, FeedKind, FeedWindow};
use shelter_core::repository::CommentRepository;
use shelter_db::repository::{
    SurrealActivityRepository, SurrealAnimalRepository, SurrealAnnouncementRepository,
    SurrealCommentRepository, SurrealGroupRepository, SurrealUserRepository,
};
use shelter_service::notify::{EmailDispatcher, EmailSender, NotifyError};
use shelter_service::{
    ActivityFeed, AnnouncementService, CommentService, NewAnnouncement, NewComment,
    ServiceConfig,
};
use surrealdb::engine::local::Db;
use uuid::Uuid;

use common::{Fixture, setup};

struct NoEmail;

impl EmailSender for NoEmail {
    fn is_configured(&self) -> bool {
        false
    }

    async fn send_announcement_email(&self, _: &str, _: &str, _: &str) -> Result<(), NotifyError> {
        Ok(())
    }
}

type Feed = ActivityFeed<SurrealGroupRepository<Db>, SurrealActivityRepository<Db>>;
type Comments =
    CommentService<SurrealGroupRepository<Db>, SurrealAnimalRepository<Db>, SurrealCommentRepository<Db>>;

fn feed(fx: &Fixture) -> Feed {
    ActivityFeed::new(
        fx.access(),
        SurrealActivityRepository::new(fx.db.clone()),
        ServiceConfig::default(),
    )
}

fn comments(fx: &Fixture) -> Comments {
    CommentService::new(
        fx.access(),
        SurrealAnimalRepository::new(fx.db.clone()),
        SurrealCommentRepository::new(fx.db.clone()),
    )
}

fn note(animal_id: Uuid, content: &str, tag_ids: Vec<Uuid>) -> NewComment {
    NewComment {
        animal_id,
        content: content.into(),
        image_url: None,
        tag_ids,
    }
}

/// C1, then announcement D1, then C2.
async fn seed(fx: &Fixture) -> (Uuid, Uuid, Uuid) {
    let sys1 = SurrealCommentRepository::new(fx.db.clone())
        .create_tag(CreateCommentTag {
            name: "Medical".into(),
            is_system: true,
        })
        .await
        .unwrap();

    let svc = comments(fx);
    let c1 = svc
        .post_comment(&fx.member, note(fx.animal, "Limping a little", vec![sys1.id]))
        .await
        .unwrap();

    let (dispatcher, _worker) = EmailDispatcher::start(NoEmail, 1, 1);
    let announcements = AnnouncementService::new(
        fx.access(),
        SurrealAnnouncementRepository::new(fx.db.clone()),
        SurrealUserRepository::new(fx.db.clone()),
        dispatcher,
    );
    let d1 = announcements
        .post_announcement(
            &fx.group_admin,
            NewAnnouncement {
                group_id: Some(fx.group),
                title: "Vet visit Friday".into(),
                content: "Bring carriers".into(),
                send_email: false,
            },
        )
        .await
        .unwrap()
        .announcement;

    let c2 = svc
        .post_comment(&fx.member, note(fx.animal, "Walking fine now", vec![]))
        .await
        .unwrap();

    (c1.id, d1.id, c2.id)
}

#[tokio::test]
async fn member_sees_merged_feed_newest_first() {
    let fx = setup().await;
    let (c1, d1, c2) = seed(&fx).await;

    let items = feed(&fx)
        .get_feed(&fx.member, fx.group, FeedFilter::All, FeedWindow { limit: 10, offset: 0 })
        .await
        .unwrap();

    let ids: Vec<Uuid> = items.iter().map(FeedItem::id).collect();
    assert_eq!(ids, vec![c2, d1, c1]);

    let kinds: Vec<FeedKind> = items.iter().map(FeedItem::kind).collect();
    assert_eq!(kinds, vec![FeedKind::Comment, FeedKind::Announcement, FeedKind::Comment]);

    match &items[2] {
        FeedItem::Comment(c) => {
            assert_eq!(c.animal_name, "A1");
            assert_eq!(c.author.name, "U1");
            assert_eq!(c.tags, vec!["Medical".to_string()]);
        }
        other => panic!("expected a comment, got {other:?}"),
    }
}

#[tokio::test]
async fn non_member_is_denied_before_anything_is_read() {
    let fx = setup().await;
    seed(&fx).await;

    let result = feed(&fx)
        .get_feed(&fx.outsider, fx.group, FeedFilter::All, FeedWindow::default())
        .await;
    assert!(matches!(result, Err(ShelterError::AccessDenied)));

    let result = feed(&fx)
        .get_feed_from_query(&fx.outsider, fx.group, None, Some("99999999999999999999"), None)
        .await;
    assert!(matches!(result, Err(ShelterError::AccessDenied)));
}

#[tokio::test]
async fn site_admin_reads_any_group() {
    let fx = setup().await;
    seed(&fx).await;

    let items = feed(&fx)
        .get_feed(&fx.site_admin(), fx.group, FeedFilter::All, FeedWindow::default())
        .await
        .unwrap();
    assert_eq!(items.len(), 3);
}

#[tokio::test]
async fn filter_selects_one_source() {
    let fx = setup().await;
    let (c1, d1, c2) = seed(&fx).await;
    let feed = feed(&fx);

    let only_comments = feed
        .get_feed_from_query(&fx.member, fx.group, Some("comments"), None, None)
        .await
        .unwrap();
    let ids: Vec<Uuid> = only_comments.iter().map(FeedItem::id).collect();
    assert_eq!(ids, vec![c2, c1]);

    let only_updates = feed
        .get_feed_from_query(&fx.member, fx.group, Some("updates"), None, None)
        .await
        .unwrap();
    let ids: Vec<Uuid> = only_updates.iter().map(FeedItem::id).collect();
    assert_eq!(ids, vec![d1]);

    let unknown = feed
        .get_feed_from_query(&fx.member, fx.group, Some("photos"), None, None)
        .await
        .unwrap();
    assert_eq!(unknown.len(), 3);
}

#[tokio::test]
async fn pages_cover_the_merged_order_exactly() {
    let fx = setup().await;
    let (c1, d1, c2) = seed(&fx).await;
    let feed = feed(&fx);

    let mut paged = Vec::new();
    for offset in 0..4 {
        let page = feed
            .get_feed(&fx.member, fx.group, FeedFilter::All, FeedWindow { limit: 1, offset })
            .await
            .unwrap();
        paged.extend(page.iter().map(FeedItem::id));
    }
    assert_eq!(paged, vec![c2, d1, c1]);
}

#[tokio::test]
async fn malformed_window_falls_back_to_defaults() {
    let fx = setup().await;
    seed(&fx).await;
    let feed = feed(&fx);

    let items = feed
        .get_feed_from_query(&fx.member, fx.group, None, Some("-5"), Some("abc"))
        .await
        .unwrap();
    assert_eq!(items.len(), 3);

    let overflow = feed
        .get_feed_from_query(&fx.member, fx.group, None, None, Some("99999999999999999999"))
        .await;
    assert!(matches!(overflow, Err(ShelterError::Validation { .. })));
}

#[tokio::test]
async fn deleted_comment_leaves_the_feed() {
    let fx = setup().await;
    let (c1, d1, c2) = seed(&fx).await;

    comments(&fx).delete_comment(&fx.group_admin, c2).await.unwrap();

    let ids: Vec<Uuid> = feed(&fx)
        .get_feed(&fx.member, fx.group, FeedFilter::All, FeedWindow::default())
        .await
        .unwrap()
        .iter()
        .map(FeedItem::id)
        .collect();
    assert_eq!(ids, vec![d1, c1]);
}

#[tokio::test]
async fn posting_requires_membership_and_known_tags() {
    let fx = setup().await;
    let svc = comments(&fx);

    let denied = svc
        .post_comment(&fx.outsider, note(fx.animal, "Hello", vec![]))
        .await;
    assert!(matches!(denied, Err(ShelterError::AccessDenied)));

    let hidden = svc
        .post_comment(&fx.outsider, note(Uuid::now_v7(), "Hello", vec![]))
        .await;
    assert!(matches!(hidden, Err(ShelterError::AccessDenied)));

    let bad_tag = svc
        .post_comment(&fx.member, note(fx.animal, "Hello", vec![Uuid::now_v7()]))
        .await;
    assert!(matches!(bad_tag, Err(ShelterError::Validation { .. })));

    let empty = svc
        .post_comment(&fx.member, note(fx.animal, "   ", vec![]))
        .await;
    assert!(matches!(empty, Err(ShelterError::Validation { .. })));
}

#[tokio::test]
async fn only_author_or_admins_delete_comments() {
    let fx = setup().await;
    let svc = comments(&fx);

    let mine = svc
        .post_comment(&fx.group_admin, note(fx.animal, "Admin note", vec![]))
        .await
        .unwrap();
    let denied = svc.delete_comment(&fx.member, mine.id).await;
    assert!(matches!(denied, Err(ShelterError::AccessDenied)));

    let own = svc
        .post_comment(&fx.member, note(fx.animal, "My note", vec![]))
        .await
        .unwrap();
    svc.delete_comment(&fx.member, own.id).await.unwrap();
    svc.delete_comment(&fx.site_admin(), mine.id).await.unwrap();
}
