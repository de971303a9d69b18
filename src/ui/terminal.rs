use std::io::Write;
use std::sync::Mutex;

use crate::models::{CalorieTier, FoodItem, EMPTY_CATEGORY_TEXT, TOTAL_CALORIES_LABEL};
use crate::ui::UiShell;

/// Plain-text shell for the `analyze` command.
pub struct TerminalShell<W: Write + Send> {
    out: Mutex<W>,
}

impl<W: Write + Send> TerminalShell<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self, text: &str) {
        let mut out = self.out.lock().unwrap_or_else(|e| e.into_inner());
        if let Err(e) = writeln!(out, "{}", text) {
            log::error!("❌ Failed to write to terminal: {}", e);
        }
    }
}

impl<W: Write + Send> UiShell for TerminalShell<W> {
    fn show_preview(&self, image_src: &str) {
        let mime = image_src
            .strip_prefix("data:")
            .and_then(|rest| rest.split(';').next())
            .unwrap_or("image");
        self.write(&format!("🖼️  已载入图片 ({}, {} 字节)", mime, image_src.len()));
    }

    fn set_busy(&self, busy: bool) {
        if busy {
            self.write("⏳ 正在分析...");
        }
    }

    fn render_category(&self, tier: CalorieTier, items: &[FoodItem]) {
        let mut text = format!("【{}】", tier.label());
        if items.is_empty() {
            text.push_str(&format!("\n  {}", EMPTY_CATEGORY_TEXT));
        }
        for food in items {
            text.push_str(&format!("\n  {} / {}", food.name, food.calories));
        }
        self.write(&text);
    }

    fn render_total(&self, total_text: &str) {
        self.write(&format!("{}: {}", TOTAL_CALORIES_LABEL, total_text));
    }

    fn show_error(&self, message: &str) {
        self.write(&format!("❌ {}", message));
    }
}
