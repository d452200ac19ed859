//! Application settings domain model.

pub mod defaults;
pub mod model;

pub use model::{GeneralSettings, Settings, CURRENT_SCHEMA_VERSION};
