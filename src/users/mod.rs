pub mod commands;
pub mod model;
pub mod validation;

pub use commands::{UserService, VerificationOutcome};
pub use model::{DocumentType, NewUser, ProfilePatch, User};
