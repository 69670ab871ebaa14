pub mod aggregation;
pub mod config;
pub mod dedup;
pub mod error;
pub mod error_recovery;
pub mod error_utils;
pub mod types;
pub mod video_id;

pub use aggregation::*;
pub use config::*;
pub use dedup::*;
pub use error::*;
pub use error_recovery::*;
pub use error_utils::*;
pub use types::*;
pub use video_id::*;
