pub mod session;

pub use session::{AnalysisOutcome, AnalysisSession};
