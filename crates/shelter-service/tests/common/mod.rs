//! Shared fixture: in-memory SurrealDB with one group, one animal and
//! three users (member, group admin, outsider).

#![allow(dead_code)]

use shelter_auth::{AccessEvaluator, Principal};
use shelter_core::models::animal::CreateAnimal;
use shelter_core::models::group::{CreateGroup, MembershipRole};
use shelter_core::models::user::CreateUser;
use shelter_core::repository::{AnimalRepository, GroupRepository, UserRepository};
use shelter_db::repository::{SurrealAnimalRepository, SurrealGroupRepository, SurrealUserRepository};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

pub struct Fixture {
    pub db: Surreal<Db>,
    pub group: Uuid,
    pub animal: Uuid,
    pub member: Principal,
    pub group_admin: Principal,
    pub outsider: Principal,
}

impl Fixture {
    pub fn access(&self) -> AccessEvaluator<SurrealGroupRepository<Db>> {
        AccessEvaluator::new(SurrealGroupRepository::new(self.db.clone()))
    }

    pub fn site_admin(&self) -> Principal {
        Principal::new(self.outsider.user_id, true)
    }

    pub async fn group(&self, name: &str) -> Uuid {
        SurrealGroupRepository::new(self.db.clone())
            .create(CreateGroup {
                name: name.into(),
                description: String::new(),
            })
            .await
            .unwrap()
            .id
    }
}

pub async fn user(db: &Surreal<Db>, name: &str) -> Uuid {
    SurrealUserRepository::new(db.clone())
        .create(CreateUser {
            username: name.into(),
            email: format!("{name}@example.com"),
            display_name: name.to_uppercase(),
            is_admin: false,
        })
        .await
        .unwrap()
        .id
}

pub async fn setup() -> Fixture {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    shelter_db::run_migrations(&db).await.unwrap();

    let u1 = user(&db, "u1").await;
    let u2 = user(&db, "u2").await;
    let u3 = user(&db, "u3").await;

    let groups = SurrealGroupRepository::new(db.clone());
    let group = groups
        .create(CreateGroup {
            name: "G1".into(),
            description: "Test group".into(),
        })
        .await
        .unwrap();
    groups
        .add_member(group.id, u1, MembershipRole::Member)
        .await
        .unwrap();
    groups
        .add_member(group.id, u2, MembershipRole::Admin)
        .await
        .unwrap();

    let animal = SurrealAnimalRepository::new(db.clone())
        .create(CreateAnimal {
            group_id: group.id,
            name: "A1".into(),
            species: "cat".into(),
            status: None,
            image_url: None,
        })
        .await
        .unwrap();

    Fixture {
        db,
        group: group.id,
        animal: animal.id,
        member: Principal::new(u1, false),
        group_admin: Principal::new(u2, false),
        outsider: Principal::new(u3, false),
    }
}
