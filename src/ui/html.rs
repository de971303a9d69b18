use std::sync::Mutex;

use crate::models::{CalorieTier, FoodItem, EMPTY_CATEGORY_TEXT, TOTAL_CALORIES_LABEL};
use crate::ui::UiShell;

#[derive(Debug, Default)]
struct Fragment {
    preview: Option<String>,
    busy: bool,
    panes: Vec<(CalorieTier, String)>,
    total: Option<String>,
    error: Option<String>,
}

/// Collects shell calls into an HTML fragment the upload page swaps into its
/// result tabs. One shell per request.
#[derive(Debug, Default)]
pub struct HtmlShell {
    fragment: Mutex<Fragment>,
}

impl HtmlShell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(&self) -> String {
        let fragment = self.fragment.lock().unwrap_or_else(|e| e.into_inner());
        let mut html = String::from("<div class=\"analysis\"");
        if fragment.busy {
            html.push_str(" data-busy=\"true\"");
        }
        html.push_str(">\n");

        if let Some(src) = &fragment.preview {
            html.push_str(&format!(
                "<img class=\"preview-image\" alt=\"preview\" src=\"{}\">\n",
                escape_html(src)
            ));
        }

        if let Some(message) = &fragment.error {
            html.push_str(&format!("<div class=\"error\">{}</div>\n", escape_html(message)));
        }

        for (_, pane) in &fragment.panes {
            html.push_str(pane);
            html.push('\n');
        }

        if let Some(total) = &fragment.total {
            html.push_str(&total_pane(total));
            html.push('\n');
        }

        html.push_str("</div>");
        html
    }

    fn update(&self, f: impl FnOnce(&mut Fragment)) {
        let mut fragment = self.fragment.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut fragment);
    }
}

impl UiShell for HtmlShell {
    fn show_preview(&self, image_src: &str) {
        self.update(|f| f.preview = Some(image_src.to_string()));
    }

    fn set_busy(&self, busy: bool) {
        self.update(|f| f.busy = busy);
    }

    fn render_category(&self, tier: CalorieTier, items: &[FoodItem]) {
        let pane = category_pane(tier, items);
        self.update(|f| {
            f.panes.retain(|(t, _)| *t != tier);
            f.panes.push((tier, pane));
        });
    }

    fn render_total(&self, total_text: &str) {
        self.update(|f| f.total = Some(total_text.to_string()));
    }

    fn show_error(&self, message: &str) {
        self.update(|f| f.error = Some(message.to_string()));
    }
}

pub fn category_pane(tier: CalorieTier, items: &[FoodItem]) -> String {
    let body = if items.is_empty() {
        format!("<p class=\"placeholder\">{}</p>", EMPTY_CATEGORY_TEXT)
    } else {
        items
            .iter()
            .map(|food| {
                format!(
                    "<div class=\"food-item\"><span class=\"food-name\">{}</span><span class=\"food-calories {}\">{}</span></div>",
                    escape_html(&food.name),
                    tier.as_str(),
                    escape_html(&food.calories)
                )
            })
            .collect::<Vec<_>>()
            .join("")
    };

    format!(
        "<div class=\"tab-pane\" id=\"{}-calorie\">{}</div>",
        tier.as_str(),
        body
    )
}

fn total_pane(total: &str) -> String {
    format!(
        "<div class=\"tab-pane\" id=\"calories\"><div class=\"total-calories\"><div class=\"calories-number\">{}</div><div class=\"calories-label\">{}</div></div></div>",
        escape_html(total),
        TOTAL_CALORIES_LABEL
    )
}

/// Food names come straight from the model.
fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnalysisResult, FoodCategory};
    use crate::ui::render_analysis;

    fn food(name: &str, calories: &str, tier: CalorieTier) -> FoodItem {
        FoodItem {
            name: name.to_string(),
            calories: calories.to_string(),
            category: FoodCategory::Known(tier),
        }
    }

    #[test]
    fn test_empty_category_shows_placeholder() {
        let pane = category_pane(CalorieTier::Medium, &[]);
        assert_eq!(
            pane,
            "<div class=\"tab-pane\" id=\"medium-calorie\"><p class=\"placeholder\">暂无此类食物</p></div>"
        );
    }

    #[test]
    fn test_category_pane_items() {
        let pane = category_pane(
            CalorieTier::High,
            &[food("炸鸡腿", "350卡", CalorieTier::High), food("薯条", "280卡", CalorieTier::High)],
        );

        assert!(pane.starts_with("<div class=\"tab-pane\" id=\"high-calorie\">"));
        assert!(pane.contains("<span class=\"food-name\">炸鸡腿</span><span class=\"food-calories high\">350卡</span>"));
        assert!(pane.find("炸鸡腿").unwrap() < pane.find("薯条").unwrap());
        assert!(!pane.contains("placeholder"));
    }

    #[test]
    fn test_food_names_are_escaped() {
        let pane = category_pane(CalorieTier::Low, &[food("<script>alert(1)</script>", "1卡", CalorieTier::Low)]);
        assert!(!pane.contains("<script>"));
        assert!(pane.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_render_full_result() {
        let shell = HtmlShell::new();
        render_analysis(&shell, &AnalysisResult::placeholder());

        let html = shell.render();
        assert!(html.contains("id=\"high-calorie\""));
        assert!(html.contains("id=\"medium-calorie\""));
        assert!(html.contains("id=\"low-calorie\""));
        assert!(html.contains("<div class=\"calories-number\">795卡</div>"));
        assert!(html.contains("总热量"));
        assert!(!html.contains("暂无此类食物"));
    }

    #[test]
    fn test_render_error() {
        let shell = HtmlShell::new();
        shell.show_error("分析失败，请稍后重试！");

        let html = shell.render();
        assert!(html.contains("<div class=\"error\">分析失败，请稍后重试！</div>"));
        assert!(!html.contains("tab-pane"));
    }
}
