pub mod html;
pub mod terminal;

pub use html::HtmlShell;
pub use terminal::TerminalShell;

use crate::models::{AnalysisResult, CalorieTier, CategoryBuckets, FoodItem};

/// Presentation side of the analyzer. The core only talks to the page (or
/// terminal) through these calls.
pub trait UiShell: Send + Sync {
    fn show_preview(&self, image_src: &str);
    fn set_busy(&self, busy: bool);
    /// `items` may be empty; the shell then shows [`crate::models::EMPTY_CATEGORY_TEXT`].
    fn render_category(&self, tier: CalorieTier, items: &[FoodItem]);
    fn render_total(&self, total_text: &str);
    fn show_error(&self, message: &str);
}

/// Groups the foods and pushes every tier pane plus the total to the shell.
pub fn render_analysis(ui: &dyn UiShell, result: &AnalysisResult) {
    let buckets = CategoryBuckets::classify(result);

    for tier in CalorieTier::ALL {
        ui.render_category(tier, buckets.tier(tier));
    }

    ui.render_total(&result.total_calories);
}
