//! Configuration for the moodring sentiment pipeline.
//!
//! Process settings come from the environment ([`load_app_config`]); the set of
//! sentiment sources and their aggregation weights come from a YAML file
//! ([`load_sources`]).

pub mod app_config;
pub mod config;
pub mod error;
pub mod sources;

pub use app_config::{AppConfig, Environment, RedditCredentials};
pub use config::{load_app_config, load_app_config_from_env};
pub use error::ConfigError;
pub use sources::{load_sources, parse_sources, SourceConfig, SourceKind, SourcesFile};
