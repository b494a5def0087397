//! Storage operations over the three ledgers.
//!
//! Every function is generic over [`sea_orm::ConnectionTrait`] so callers can
//! compose them inside a transaction.

pub mod ban;
pub mod location;
pub mod rejection;
