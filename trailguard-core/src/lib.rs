pub mod abuse_protection;
pub mod db;
pub mod gate;
pub mod geo;
pub mod ledger;
pub mod location;
pub mod plausibility;
mod services;
pub use services::*;

#[cfg(test)]
pub(crate) mod test_helpers;
