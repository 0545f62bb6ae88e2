//! Integration tests for group membership using in-memory SurrealDB.

use shelter_core::error::ShelterError;
use shelter_core::models::group::{CreateGroup, MembershipRole};
use shelter_core::models::user::CreateUser;
use shelter_core::repository::{GroupRepository, Pagination, UserRepository};
use shelter_db::repository::{SurrealGroupRepository, SurrealUserRepository};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

async fn setup() -> (Surreal<Db>, Uuid, Uuid, Uuid) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    shelter_db::run_migrations(&db).await.unwrap();

    let users = SurrealUserRepository::new(db.clone());
    let alice = users
        .create(CreateUser {
            username: "alice".into(),
            email: "alice@example.com".into(),
            display_name: "Alice".into(),
            is_admin: false,
        })
        .await
        .unwrap();
    let bob = users
        .create(CreateUser {
            username: "bob".into(),
            email: "bob@example.com".into(),
            display_name: "Bob".into(),
            is_admin: false,
        })
        .await
        .unwrap();

    let groups = SurrealGroupRepository::new(db.clone());
    let group = groups
        .create(CreateGroup {
            name: "Northside Rescue".into(),
            description: "Cats and dogs".into(),
        })
        .await
        .unwrap();

    (db, group.id, alice.id, bob.id)
}

#[tokio::test]
async fn membership_lookup_reports_role() {
    let (db, group_id, alice, bob) = setup().await;
    let repo = SurrealGroupRepository::new(db);

    repo.add_member(group_id, alice, MembershipRole::Admin)
        .await
        .unwrap();
    repo.add_member(group_id, bob, MembershipRole::Member)
        .await
        .unwrap();

    assert_eq!(
        repo.get_membership(group_id, alice).await.unwrap(),
        Some(MembershipRole::Admin)
    );
    assert_eq!(
        repo.get_membership(group_id, bob).await.unwrap(),
        Some(MembershipRole::Member)
    );
}

#[tokio::test]
async fn non_member_has_no_membership() {
    let (db, group_id, alice, _) = setup().await;
    let repo = SurrealGroupRepository::new(db);

    assert_eq!(repo.get_membership(group_id, alice).await.unwrap(), None);
    assert_eq!(
        repo.get_membership(Uuid::now_v7(), alice).await.unwrap(),
        None
    );
}

#[tokio::test]
async fn re_adding_a_member_replaces_the_role() {
    let (db, group_id, alice, _) = setup().await;
    let repo = SurrealGroupRepository::new(db);

    repo.add_member(group_id, alice, MembershipRole::Member)
        .await
        .unwrap();
    repo.add_member(group_id, alice, MembershipRole::Admin)
        .await
        .unwrap();

    assert_eq!(
        repo.get_membership(group_id, alice).await.unwrap(),
        Some(MembershipRole::Admin)
    );

    let members = repo
        .get_members(group_id, Pagination::default())
        .await
        .unwrap();
    assert_eq!(members.total, 1);
    assert_eq!(members.items[0].role, MembershipRole::Admin);
}

#[tokio::test]
async fn removed_member_loses_membership() {
    let (db, group_id, alice, _) = setup().await;
    let repo = SurrealGroupRepository::new(db);

    repo.add_member(group_id, alice, MembershipRole::Member)
        .await
        .unwrap();
    repo.remove_member(group_id, alice).await.unwrap();

    assert_eq!(repo.get_membership(group_id, alice).await.unwrap(), None);
    assert!(repo.get_user_groups(alice).await.unwrap().is_empty());
}

#[tokio::test]
async fn deleted_group_grants_nothing() {
    let (db, group_id, alice, _) = setup().await;
    let repo = SurrealGroupRepository::new(db);

    repo.add_member(group_id, alice, MembershipRole::Admin)
        .await
        .unwrap();
    repo.delete(group_id).await.unwrap();

    assert_eq!(repo.get_membership(group_id, alice).await.unwrap(), None);
    assert!(matches!(
        repo.get_by_id(group_id).await,
        Err(ShelterError::NotFound { .. })
    ));
}

#[tokio::test]
async fn deleted_user_grants_nothing() {
    let (db, group_id, alice, bob) = setup().await;
    let repo = SurrealGroupRepository::new(db.clone());

    repo.add_member(group_id, alice, MembershipRole::Admin)
        .await
        .unwrap();
    repo.add_member(group_id, bob, MembershipRole::Member)
        .await
        .unwrap();
    SurrealUserRepository::new(db).delete(alice).await.unwrap();

    assert_eq!(repo.get_membership(group_id, alice).await.unwrap(), None);
    assert_eq!(
        repo.get_membership(group_id, bob).await.unwrap(),
        Some(MembershipRole::Member)
    );
}

#[tokio::test]
async fn adding_unknown_user_is_not_found() {
    let (db, group_id, _, _) = setup().await;
    let repo = SurrealGroupRepository::new(db);

    let err = repo
        .add_member(group_id, Uuid::now_v7(), MembershipRole::Member)
        .await
        .unwrap_err();
    assert!(matches!(err, ShelterError::NotFound { .. }));
}

#[tokio::test]
async fn member_emails_skip_deleted_users() {
    let (db, group_id, alice, bob) = setup().await;
    let repo = SurrealGroupRepository::new(db.clone());
    let users = SurrealUserRepository::new(db);

    repo.add_member(group_id, alice, MembershipRole::Member)
        .await
        .unwrap();
    repo.add_member(group_id, bob, MembershipRole::Member)
        .await
        .unwrap();
    users.delete(bob).await.unwrap();

    let emails = repo.member_emails(group_id).await.unwrap();
    assert_eq!(emails, vec!["alice@example.com".to_string()]);
}
