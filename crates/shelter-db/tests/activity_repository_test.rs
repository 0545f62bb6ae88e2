//! Integration tests for the feed sources using in-memory SurrealDB.

use shelter_core::models::animal::CreateAnimal;
use shelter_core::models::announcement::CreateAnnouncement;
use shelter_core::models::comment::{CreateComment, CreateCommentTag};
use shelter_core::models::group::CreateGroup;
use shelter_core::models::user::CreateUser;
use shelter_core::repository::{
    ActivityRepository, AnimalRepository, AnnouncementRepository, CommentRepository,
    GroupRepository, UserRepository,
};
use shelter_db::repository::{
    SurrealActivityRepository, SurrealAnimalRepository, SurrealAnnouncementRepository,
    SurrealCommentRepository, SurrealGroupRepository, SurrealUserRepository,
};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

struct Fixture {
    db: Surreal<Db>,
    author: Uuid,
    group: Uuid,
    other_group: Uuid,
    animal: Uuid,
}

async fn setup() -> Fixture {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    shelter_db::run_migrations(&db).await.unwrap();

    let author = SurrealUserRepository::new(db.clone())
        .create(CreateUser {
            username: "carol".into(),
            email: "carol@example.com".into(),
            display_name: "Carol".into(),
            is_admin: false,
        })
        .await
        .unwrap();

    let groups = SurrealGroupRepository::new(db.clone());
    let group = groups
        .create(CreateGroup {
            name: "Harbor Cats".into(),
            description: String::new(),
        })
        .await
        .unwrap();
    let other_group = groups
        .create(CreateGroup {
            name: "Hill Dogs".into(),
            description: String::new(),
        })
        .await
        .unwrap();

    let animal = SurrealAnimalRepository::new(db.clone())
        .create(CreateAnimal {
            group_id: group.id,
            name: "Miso".into(),
            species: "cat".into(),
            status: None,
            image_url: None,
        })
        .await
        .unwrap();

    Fixture {
        db,
        author: author.id,
        group: group.id,
        other_group: other_group.id,
        animal: animal.id,
    }
}

fn comment(fx: &Fixture, animal_id: Uuid, content: &str, tag_ids: Vec<Uuid>) -> CreateComment {
    CreateComment {
        animal_id,
        author_id: fx.author,
        content: content.into(),
        image_url: None,
        tag_ids,
    }
}

#[tokio::test]
async fn comments_come_newest_first_with_names_resolved() {
    let fx = setup().await;
    let comments = SurrealCommentRepository::new(fx.db.clone());
    let activity = SurrealActivityRepository::new(fx.db.clone());

    let vet = comments
        .create_tag(CreateCommentTag {
            name: "Vet visit".into(),
            is_system: false,
        })
        .await
        .unwrap();

    let first = comments
        .create(comment(&fx, fx.animal, "Ate well", vec![]))
        .await
        .unwrap();
    let second = comments
        .create(comment(&fx, fx.animal, "Checkup done", vec![vet.id, vet.id]))
        .await
        .unwrap();

    let events = activity.recent_comments(fx.group, 10).await.unwrap();
    let ids: Vec<Uuid> = events.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);

    assert_eq!(events[0].animal_name, "Miso");
    assert_eq!(events[0].author.name, "Carol");
    assert_eq!(events[0].tags, vec!["Vet visit".to_string()]);
    assert!(events[1].tags.is_empty());
}

#[tokio::test]
async fn comment_limit_is_respected() {
    let fx = setup().await;
    let comments = SurrealCommentRepository::new(fx.db.clone());
    let activity = SurrealActivityRepository::new(fx.db.clone());

    for n in 0..5 {
        comments
            .create(comment(&fx, fx.animal, &format!("note {n}"), vec![]))
            .await
            .unwrap();
    }

    assert_eq!(activity.recent_comments(fx.group, 3).await.unwrap().len(), 3);
    assert!(activity.recent_comments(fx.group, 0).await.unwrap().is_empty());
}

#[tokio::test]
async fn deleted_rows_and_other_groups_are_excluded() {
    let fx = setup().await;
    let animals = SurrealAnimalRepository::new(fx.db.clone());
    let comments = SurrealCommentRepository::new(fx.db.clone());
    let activity = SurrealActivityRepository::new(fx.db.clone());

    let elsewhere = animals
        .create(CreateAnimal {
            group_id: fx.other_group,
            name: "Rex".into(),
            species: "dog".into(),
            status: None,
            image_url: None,
        })
        .await
        .unwrap();
    let gone = animals
        .create(CreateAnimal {
            group_id: fx.group,
            name: "Pip".into(),
            species: "cat".into(),
            status: None,
            image_url: None,
        })
        .await
        .unwrap();

    let kept = comments
        .create(comment(&fx, fx.animal, "Visible", vec![]))
        .await
        .unwrap();
    let removed = comments
        .create(comment(&fx, fx.animal, "Removed", vec![]))
        .await
        .unwrap();
    comments
        .create(comment(&fx, elsewhere.id, "Other group", vec![]))
        .await
        .unwrap();
    comments
        .create(comment(&fx, gone.id, "Animal deleted", vec![]))
        .await
        .unwrap();

    comments.delete(removed.id).await.unwrap();
    animals.delete(gone.id).await.unwrap();

    let events = activity.recent_comments(fx.group, 10).await.unwrap();
    let ids: Vec<Uuid> = events.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![kept.id]);
}

#[tokio::test]
async fn group_with_no_animals_has_no_comments() {
    let fx = setup().await;
    let activity = SurrealActivityRepository::new(fx.db.clone());

    assert!(
        activity
            .recent_comments(fx.other_group, 10)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn announcements_are_group_scoped() {
    let fx = setup().await;
    let announcements = SurrealAnnouncementRepository::new(fx.db.clone());
    let activity = SurrealActivityRepository::new(fx.db.clone());

    let post = |group_id: Option<Uuid>, title: &str| CreateAnnouncement {
        group_id,
        author_id: fx.author,
        title: title.into(),
        content: "Details".into(),
        send_email: false,
    };

    let older = announcements
        .create(post(Some(fx.group), "Adoption day"))
        .await
        .unwrap();
    announcements
        .create(post(None, "Site maintenance"))
        .await
        .unwrap();
    announcements
        .create(post(Some(fx.other_group), "Not ours"))
        .await
        .unwrap();
    let newer = announcements
        .create(post(Some(fx.group), "Supply drive"))
        .await
        .unwrap();
    let retracted = announcements
        .create(post(Some(fx.group), "Typo"))
        .await
        .unwrap();
    announcements.delete(retracted.id).await.unwrap();

    let events = activity.recent_announcements(fx.group, 10).await.unwrap();
    let ids: Vec<Uuid> = events.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![newer.id, older.id]);
    assert_eq!(events[0].author.name, "Carol");
}
