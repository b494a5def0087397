pub mod ban_status;
pub mod check;
pub mod config_schema;
pub mod history;
pub mod migrate;
pub mod status;
