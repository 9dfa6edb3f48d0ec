//! App rotation
//!
//! Sequence validation and the controller that cycles through it.

mod controller;
mod sequence;

pub use controller::{RotationController, RotationState, TickResult};
pub use sequence::{
    validate, validate_or_fallback, AppDescriptor, AppId, AppSequence, Validated, MAX_APPS,
    MAX_APP_ID_LEN,
};
