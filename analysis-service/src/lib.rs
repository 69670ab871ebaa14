pub mod refresh;
pub mod session;

pub use refresh::{CycleReport, RefreshConfig, RefreshLoop};
pub use session::{AnalysisReport, AnalysisSession};
