//! Shelter schema and the versioned migration runner.
//!
//! Tables are SCHEMAFULL. Record keys are UUIDv7 strings, enum fields
//! are strings held in range by ASSERT, and soft deletion is an
//! optional `deleted_at` datetime.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// Migration tracking

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// Schema v1: initial table definitions

const SCHEMA_V1: &str = "\
-- Users
DEFINE TABLE user SCHEMAFULL;
DEFINE FIELD username ON TABLE user TYPE string;
DEFINE FIELD email ON TABLE user TYPE string;
DEFINE FIELD display_name ON TABLE user TYPE string;
DEFINE FIELD is_admin ON TABLE user TYPE bool DEFAULT false;
DEFINE FIELD created_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD deleted_at ON TABLE user TYPE option<datetime>;
DEFINE INDEX idx_user_username ON TABLE user COLUMNS username UNIQUE;
DEFINE INDEX idx_user_email ON TABLE user COLUMNS email UNIQUE;

-- Groups
DEFINE TABLE group SCHEMAFULL;
DEFINE FIELD name ON TABLE group TYPE string;
DEFINE FIELD description ON TABLE group TYPE string;
DEFINE FIELD created_at ON TABLE group TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE group TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD deleted_at ON TABLE group TYPE option<datetime>;
DEFINE INDEX idx_group_name ON TABLE group COLUMNS name UNIQUE;

-- Animals (group scope)
DEFINE TABLE animal SCHEMAFULL;
DEFINE FIELD group_id ON TABLE animal TYPE string;
DEFINE FIELD name ON TABLE animal TYPE string;
DEFINE FIELD species ON TABLE animal TYPE string;
DEFINE FIELD status ON TABLE animal TYPE string \
    ASSERT $value IN ['Available', 'Foster', 'Quarantine', 'Adopted', \
    'Archived'];
DEFINE FIELD image_url ON TABLE animal TYPE option<string>;
DEFINE FIELD created_at ON TABLE animal TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE animal TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD deleted_at ON TABLE animal TYPE option<datetime>;
DEFINE INDEX idx_animal_group ON TABLE animal COLUMNS group_id;

-- Comment tags (global, system tags pre-seeded)
DEFINE TABLE comment_tag SCHEMAFULL;
DEFINE FIELD name ON TABLE comment_tag TYPE string;
DEFINE FIELD is_system ON TABLE comment_tag TYPE bool DEFAULT false;
DEFINE FIELD created_at ON TABLE comment_tag TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_comment_tag_name ON TABLE comment_tag \
    COLUMNS name UNIQUE;

-- Animal comments (group scope through animal)
DEFINE TABLE animal_comment SCHEMAFULL;
DEFINE FIELD animal_id ON TABLE animal_comment TYPE string;
DEFINE FIELD author_id ON TABLE animal_comment TYPE string;
DEFINE FIELD content ON TABLE animal_comment TYPE string;
DEFINE FIELD image_url ON TABLE animal_comment TYPE option<string>;
DEFINE FIELD tag_ids ON TABLE animal_comment TYPE array DEFAULT [];
DEFINE FIELD tag_ids.* ON TABLE animal_comment TYPE string;
DEFINE FIELD created_at ON TABLE animal_comment TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD deleted_at ON TABLE animal_comment TYPE option<datetime>;
DEFINE INDEX idx_comment_animal ON TABLE animal_comment \
    COLUMNS animal_id;
DEFINE INDEX idx_comment_created ON TABLE animal_comment \
    COLUMNS created_at;

-- Announcements (group scope, or global when group_id is NONE)
DEFINE TABLE announcement SCHEMAFULL;
DEFINE FIELD group_id ON TABLE announcement TYPE option<string>;
DEFINE FIELD author_id ON TABLE announcement TYPE string;
DEFINE FIELD title ON TABLE announcement TYPE string;
DEFINE FIELD content ON TABLE announcement TYPE string;
DEFINE FIELD send_email ON TABLE announcement TYPE bool DEFAULT false;
DEFINE FIELD created_at ON TABLE announcement TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD deleted_at ON TABLE announcement TYPE option<datetime>;
DEFINE INDEX idx_announcement_group ON TABLE announcement \
    COLUMNS group_id;

-- Skill tags (group scope)
DEFINE TABLE skill_tag SCHEMAFULL;
DEFINE FIELD group_id ON TABLE skill_tag TYPE string;
DEFINE FIELD name ON TABLE skill_tag TYPE string;
DEFINE FIELD created_at ON TABLE skill_tag TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD deleted_at ON TABLE skill_tag TYPE option<datetime>;
DEFINE INDEX idx_skill_tag_group_name ON TABLE skill_tag \
    COLUMNS group_id, name UNIQUE;

-- Graph Edge Tables (relations)

-- User -> Group membership, carrying the membership role
DEFINE TABLE member_of TYPE RELATION SCHEMAFULL;
DEFINE FIELD role ON TABLE member_of TYPE string \
    ASSERT $value IN ['Member', 'Admin'];
DEFINE INDEX idx_member_of_pair ON TABLE member_of COLUMNS in, out UNIQUE;

-- User -> SkillTag assignment, tagged with the owning group
DEFINE TABLE has_skill TYPE RELATION SCHEMAFULL;
DEFINE FIELD group_id ON TABLE has_skill TYPE string;
DEFINE INDEX idx_has_skill_pair ON TABLE has_skill COLUMNS in, out UNIQUE;
";

/// Apply every migration newer than the recorded version.
///
/// The `_migration` table is created on first use. Each applied
/// version is recorded so reruns are no-ops.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(format!("tracking table: {e}")))?;

    let mut result = db
        .query("SELECT version FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let latest: Vec<MigrationRecord> = result.take(0)?;
    let applied = latest.first().map_or(0, |m| m.version);

    let pending = pending(MIGRATIONS, applied);
    if pending.is_empty() {
        info!(version = applied, "Schema up to date");
        return Ok(());
    }
    for migration in pending {
        apply(db, migration).await?;
    }
    Ok(())
}

fn pending(migrations: &[Migration], applied: u32) -> &[Migration] {
    let first = migrations.partition_point(|m| m.version <= applied);
    &migrations[first..]
}

async fn apply<C: Connection>(db: &Surreal<C>, migration: &Migration) -> Result<(), DbError> {
    let failed = |stage: &str, e: surrealdb::Error| {
        DbError::Migration(format!(
            "v{} {} ({stage}): {e}",
            migration.version, migration.name
        ))
    };

    info!(version = migration.version, name = migration.name, "Applying migration");
    db.query(migration.sql)
        .await?
        .check()
        .map_err(|e| failed("ddl", e))?;
    db.query("CREATE _migration SET version = $version, name = $name")
        .bind(("version", migration.version))
        .bind(("name", migration.name))
        .await?
        .check()
        .map_err(|e| failed("record", e))?;
    Ok(())
}

/// DDL of the first migration.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}
