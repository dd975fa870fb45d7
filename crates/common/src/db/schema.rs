//! Schema bootstrap
//!
//! Tables are created from the entity definitions, so unique columns,
//! composite primary keys and foreign keys (with their ON DELETE actions)
//! come straight from the models. Referenced tables are created first.

use super::models::*;
use crate::errors::Result;
use sea_orm::{ConnectionTrait, DatabaseConnection, EntityTrait, Schema};
use tracing::{debug, info};

async fn create_table<E: EntityTrait>(db: &DatabaseConnection, schema: &Schema, entity: E) -> Result<()> {
    let backend = db.get_database_backend();
    let mut stmt = schema.create_table_from_entity(entity);
    stmt.if_not_exists();
    db.execute(backend.build(&stmt)).await?;
    debug!(table = entity.table_name(), "Table ready");
    Ok(())
}

/// Create every missing table
pub async fn create_schema(db: &DatabaseConnection) -> Result<()> {
    let schema = Schema::new(db.get_database_backend());

    // Reference entities
    create_table(db, &schema, faculty::Entity).await?;
    create_table(db, &schema, department::Entity).await?;
    create_table(db, &schema, domain::Entity).await?;
    create_table(db, &schema, team::Entity).await?;
    create_table(db, &schema, function::Entity).await?;
    create_table(db, &schema, speciality::Entity).await?;
    create_table(db, &schema, publisher::Entity).await?;
    create_table(db, &schema, production_type::Entity).await?;
    create_table(db, &schema, category::Entity).await?;
    create_table(db, &schema, review_speciality::Entity).await?;

    // Core entities
    create_table(db, &schema, laboratory::Entity).await?;
    create_table(db, &schema, researcher::Entity).await?;
    create_table(db, &schema, doctoral_student::Entity).await?;
    create_table(db, &schema, equipment::Entity).await?;
    create_table(db, &schema, review::Entity).await?;
    create_table(db, &schema, publication::Entity).await?;
    create_table(db, &schema, communication::Entity).await?;

    // Assignment, supervision and link tables
    create_table(db, &schema, assign_researcher::Entity).await?;
    create_table(db, &schema, assign_doctoral_student::Entity).await?;
    create_table(db, &schema, supervise::Entity).await?;
    create_table(db, &schema, has_category::Entity).await?;
    create_table(db, &schema, has_speciality::Entity).await?;
    create_table(db, &schema, publish_researcher_pub::Entity).await?;
    create_table(db, &schema, publish_researcher_comm::Entity).await?;
    create_table(db, &schema, publish_doctoral_student_pub::Entity).await?;
    create_table(db, &schema, publish_doctoral_student_comm::Entity).await?;

    info!("Database schema ready");
    Ok(())
}
