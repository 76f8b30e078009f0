pub mod connection;
pub mod fixtures;
pub mod memory;
pub mod migrations;
pub mod occupancy;
pub mod orders;
pub mod settings;

pub use connection::{connect, DbPool};
pub use fixtures::{seed_sample_data, SeedResult};
pub use memory::{InMemoryOccupancyStore, InMemoryOrderDirectory, StaticAdminSecret};
pub use occupancy::SqlOccupancyStore;
pub use orders::SqlOrderDirectory;
pub use settings::SqlSettingsRepository;
