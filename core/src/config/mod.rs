//! Configuration is split into:
//! - `types.rs` (data structures + defaults)
//! - `load.rs`  (IO: file lookup + env overrides)

pub mod load;
pub mod types;

pub use load::{load, load_default, load_from_path};
pub use types::*;
