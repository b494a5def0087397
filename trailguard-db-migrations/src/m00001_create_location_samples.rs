use sea_orm::Schema;
use sea_orm_migration::prelude::*;

pub mod location_sample {
    use chrono::{DateTime, Utc};
    use sea_orm::entity::prelude::*;
    use uuid::Uuid;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "location_samples")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        pub user_id: String,
        pub latitude: f64,
        pub longitude: f64,
        pub created_at: DateTime<Utc>,
        pub is_valid: bool,
        pub validation_reason: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m00001_create_location_samples"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let builder = manager.get_database_backend();
        let schema = Schema::new(builder);

        manager
            .create_table(schema.create_table_from_entity(location_sample::Entity))
            .await?;

        // "last N valid samples for a user, newest first"
        manager
            .create_index(
                Index::create()
                    .table(location_sample::Entity)
                    .name("idx_location_samples_user_valid_created")
                    .col(Alias::new("user_id"))
                    .col(Alias::new("is_valid"))
                    .col(Alias::new("created_at"))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .table(location_sample::Entity)
                    .name("idx_location_samples_user_valid_created")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(location_sample::Entity).to_owned())
            .await?;

        Ok(())
    }
}
