//! User/company registration and association workflow.

pub mod companies;
pub mod directory;
pub mod memberships;
pub mod pipeline;

pub use pipeline::{RegistrationOutcome, RegistrationRequest, Scenario, register};
