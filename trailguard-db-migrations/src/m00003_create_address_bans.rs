use sea_orm::Schema;
use sea_orm_migration::prelude::*;

pub mod address_ban {
    use chrono::{DateTime, Utc};
    use sea_orm::entity::prelude::*;
    use uuid::Uuid;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "address_bans")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        #[sea_orm(unique)]
        pub address: String,
        pub reason: String,
        pub last_banned_at: DateTime<Utc>,
        pub banned_until: DateTime<Utc>,
        pub banned_length: f64,
        pub banned_times: i32,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m00003_create_address_bans"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let builder = manager.get_database_backend();
        let schema = Schema::new(builder);

        manager
            .create_table(schema.create_table_from_entity(address_ban::Entity))
            .await?;

        manager
            .create_index(
                Index::create()
                    .table(address_ban::Entity)
                    .name("idx_address_bans_banned_until")
                    .col(Alias::new("banned_until"))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .table(address_ban::Entity)
                    .name("idx_address_bans_banned_until")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(address_ban::Entity).to_owned())
            .await?;

        Ok(())
    }
}
