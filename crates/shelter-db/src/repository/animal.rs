//! SurrealDB implementation of [`AnimalRepository`].

use chrono::{DateTime, Utc};
use shelter_core::error::ShelterResult;
use shelter_core::models::animal::{Animal, AnimalStatus, CreateAnimal};
use shelter_core::repository::AnimalRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;
use crate::rows::parse_uuid;

#[derive(Debug, SurrealValue)]
struct AnimalRow {
    group_id: String,
    name: String,
    species: String,
    status: String,
    image_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, SurrealValue)]
struct AnimalRowWithId {
    record_id: String,
    group_id: String,
    name: String,
    species: String,
    status: String,
    image_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

fn parse_status(s: &str) -> Result<AnimalStatus, DbError> {
    s.parse().map_err(DbError::Decode)
}

impl AnimalRow {
    fn into_animal(self, id: Uuid) -> Result<Animal, DbError> {
        Ok(Animal {
            id,
            group_id: parse_uuid(&self.group_id, "group")?,
            name: self.name,
            species: self.species,
            status: parse_status(&self.status)?,
            image_url: self.image_url,
            created_at: self.created_at,
            updated_at: self.updated_at,
            deleted_at: self.deleted_at,
        })
    }
}

impl AnimalRowWithId {
    fn try_into_animal(self) -> Result<Animal, DbError> {
        let id = parse_uuid(&self.record_id, "animal")?;
        AnimalRow {
            group_id: self.group_id,
            name: self.name,
            species: self.species,
            status: self.status,
            image_url: self.image_url,
            created_at: self.created_at,
            updated_at: self.updated_at,
            deleted_at: self.deleted_at,
        }
        .into_animal(id)
    }
}

/// SurrealDB implementation of the Animal repository.
#[derive(Clone)]
pub struct SurrealAnimalRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealAnimalRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> AnimalRepository for SurrealAnimalRepository<C> {
    async fn create(&self, input: CreateAnimal) -> ShelterResult<Animal> {
        let id = Uuid::now_v7();
        let id_str = id.to_string();
        let status = input.status.unwrap_or(AnimalStatus::Available);

        let result = self
            .db
            .query(
                "CREATE type::record('animal', $id) SET \
                 group_id = $group_id, name = $name, \
                 species = $species, status = $status, \
                 image_url = $image_url",
            )
            .bind(("id", id_str.clone()))
            .bind(("group_id", input.group_id.to_string()))
            .bind(("name", input.name))
            .bind(("species", input.species))
            .bind(("status", status.as_str().to_string()))
            .bind(("image_url", input.image_url))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<AnimalRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("animal", &id_str))?;

        Ok(row.into_animal(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> ShelterResult<Animal> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT * FROM type::record('animal', $id) \
                 WHERE deleted_at = NONE",
            )
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AnimalRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("animal", &id_str))?;

        Ok(row.into_animal(id)?)
    }

    async fn update_status(&self, id: Uuid, status: AnimalStatus) -> ShelterResult<Animal> {
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "UPDATE type::record('animal', $id) SET \
                 status = $status, updated_at = time::now() \
                 WHERE deleted_at = NONE",
            )
            .bind(("id", id_str.clone()))
            .bind(("status", status.as_str().to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<AnimalRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("animal", &id_str))?;

        Ok(row.into_animal(id)?)
    }

    async fn delete(&self, id: Uuid) -> ShelterResult<()> {
        self.db
            .query(
                "UPDATE type::record('animal', $id) SET \
                 deleted_at = time::now(), updated_at = time::now() \
                 WHERE deleted_at = NONE",
            )
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn list_by_group(&self, group_id: Uuid) -> ShelterResult<Vec<Animal>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM animal \
                 WHERE group_id = $group_id AND deleted_at = NONE \
                 ORDER BY name ASC",
            )
            .bind(("group_id", group_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AnimalRowWithId> = result.take(0).map_err(DbError::from)?;

        let animals = rows
            .into_iter()
            .map(|row| row.try_into_animal())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(animals)
    }
}
