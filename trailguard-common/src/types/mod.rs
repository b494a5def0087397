mod coordinates;
mod secret;

pub use coordinates::Coordinates;
pub use secret::Secret;
