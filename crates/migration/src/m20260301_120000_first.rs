use entity::{difficulties, maps, mod_log, users};
use sea_orm::EntityTrait;
use sea_orm_migration::{prelude::*, sea_orm::Schema};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_database_backend();
        let schema = Schema::new(db);

        create_entity_table(manager, &schema, users::Entity).await?;
        create_entity_table(manager, &schema, maps::Entity).await?;
        create_entity_table(manager, &schema, difficulties::Entity).await?;
        create_entity_table(manager, &schema, mod_log::Entity).await?;

        // Username lookups of the linking procedure
        manager
            .create_index(
                Index::create()
                    .name("idx-users-name")
                    .table(users::Entity)
                    .col(users::Column::Name)
                    .take(),
            )
            .await?;

        // Stats aggregates and ownership transfers
        manager
            .create_index(
                Index::create()
                    .name("idx-maps-uploader")
                    .table(maps::Entity)
                    .col(maps::Column::Uploader)
                    .col(maps::Column::DeletedAt)
                    .take(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-difficulties-map_id")
                    .table(difficulties::Entity)
                    .col(difficulties::Column::MapId)
                    .take(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-mod_log-map_id-op_at")
                    .table(mod_log::Entity)
                    .col(mod_log::Column::MapId)
                    .col(mod_log::Column::OpAt)
                    .take(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_database_backend();
        let schema = Schema::new(db);

        drop_entity_table(manager, &schema, mod_log::Entity).await?;
        drop_entity_table(manager, &schema, difficulties::Entity).await?;
        drop_entity_table(manager, &schema, maps::Entity).await?;
        drop_entity_table(manager, &schema, users::Entity).await?;

        Ok(())
    }
}

async fn create_entity_table<'a, E: EntityTrait>(
    manager: &'a SchemaManager<'a>,
    schema: &Schema,
    entity: E,
) -> Result<(), DbErr> {
    manager
        .create_table(schema.create_table_from_entity(entity))
        .await
}

async fn drop_entity_table<'a, E: EntityTrait>(
    manager: &'a SchemaManager<'a>,
    schema: &Schema,
    entity: E,
) -> Result<(), DbErr> {
    manager
        .drop_table(
            Table::drop()
                .table(
                    schema
                        .create_table_from_entity(entity)
                        .get_table_name()
                        .cloned()
                        .ok_or_else(|| DbErr::Custom("missing table name".to_owned()))?,
                )
                .take(),
        )
        .await
}
