//! Wall of fame state and logic.
//!
//! - `model`: persisted records (`ServerConfig`, `WallItem`)
//! - `store`: JSON files backing the server configs and the global wall
//! - `manager`: the per-server `wall_of_fame` channel
//! - `nomination`: reaction threshold evaluation
//! - `emoji`: emoji normalisation used when matching reactions

pub mod emoji;
pub mod manager;
pub mod model;
pub mod nomination;
pub mod store;

pub use manager::WallManager;
pub use model::{ServerDefaults, WallAuthor, WallItem};
pub use store::{ConfigStore, GlobalWall};
