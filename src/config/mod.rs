//! Configuration and path management

pub mod paths;
pub mod settings;

pub use paths::ProjectPaths;
pub use settings::Settings;
