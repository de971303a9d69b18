use crate::error::AnalysisError;
use crate::models::{AnalysisResult, ImagePayload};

/// Trait for vision services that estimate the calories in a food photo
#[async_trait::async_trait]
pub trait FoodAnalyzer: Send + Sync {
    /// Single-shot: no retry, no cancellation. Content the service cannot parse
    /// is replaced by [`AnalysisResult::placeholder`], so only transport and
    /// HTTP status failures come back as errors.
    async fn analyze(&self, payload: &ImagePayload) -> Result<AnalysisResult, AnalysisError>;
}
