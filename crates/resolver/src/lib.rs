//! `climazone-resolver`: climate-zone resolution for Italian municipalities.
//!
//! Pure engine crate: receives pre-loaded registry and zone-source records,
//! returns one zone per municipality with the method that produced it.
//! CSV loaders and the cities projection live here too; no CLI dependencies.

pub mod cities;
pub mod config;
pub mod engine;
pub mod error;
pub mod index;
pub mod knn;
pub mod load;
pub mod matcher;
pub mod model;
pub mod normalize;
pub mod province;
pub mod report;

pub use config::{ResolverParams, RunConfig, StaticTables};
pub use engine::{run, ResolveInput, Resolver};
pub use error::ResolveError;
pub use model::{Municipality, Resolution, RunResult, ZoneLabel, ZoneSourceRecord};
pub use normalize::normalize;
