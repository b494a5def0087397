use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::Serialize;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "address_bans")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(unique)]
    pub address: String,

    /// Reasons for every ban episode, oldest first, joined with " | "
    pub reason: String,

    /// Start of the current ban episode
    pub last_banned_at: DateTime<Utc>,

    pub banned_until: DateTime<Utc>,

    /// Length of the current ban step in hours
    pub banned_length: f64,

    /// Escalation counter, starts at 1
    pub banned_times: i32,
}

impl Model {
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.banned_until > now
    }
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        panic!("No relations defined")
    }
}

impl ActiveModelBehavior for ActiveModel {}
