mod validator;

pub use validator::{
    LocationVerdict, PlausibilityValidator, RejectionReason, TrackedLocation, MIN_HISTORY_LEN,
};
