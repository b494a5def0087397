use sea_orm::Schema;
use sea_orm_migration::prelude::*;

pub mod rejected_request {
    use chrono::{DateTime, Utc};
    use sea_orm::entity::prelude::*;
    use uuid::Uuid;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "rejected_requests")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        pub address: String,
        pub status_code: i32,
        pub reason: String,
        pub subject: Option<String>,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m00002_create_rejected_requests"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let builder = manager.get_database_backend();
        let schema = Schema::new(builder);

        manager
            .create_table(schema.create_table_from_entity(rejected_request::Entity))
            .await?;

        // Rolling window count per address
        manager
            .create_index(
                Index::create()
                    .table(rejected_request::Entity)
                    .name("idx_rejected_requests_address_created")
                    .col(Alias::new("address"))
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
                    .table(rejected_request::Entity)
                    .name("idx_rejected_requests_address_created")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(rejected_request::Entity).to_owned())
            .await?;

        Ok(())
    }
}
