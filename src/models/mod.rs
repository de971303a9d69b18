use base64::{engine::general_purpose, Engine};
use serde::{Deserialize, Deserializer, Serialize};

/// Shown in a tier pane when no food of that tier was found.
pub const EMPTY_CATEGORY_TEXT: &str = "暂无此类食物";
pub const TOTAL_CALORIES_LABEL: &str = "总热量";

/// Encoded image ready to be inlined into a chat-completion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    mime_type: String,
    base64_data: String,
}

impl ImagePayload {
    pub fn encode(mime_type: &str, bytes: &[u8]) -> Self {
        Self {
            mime_type: mime_type.to_string(),
            base64_data: general_purpose::STANDARD.encode(bytes),
        }
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn encoded_len(&self) -> usize {
        self.base64_data.len()
    }

    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.base64_data)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CalorieTier {
    High,
    Medium,
    Low,
}

impl CalorieTier {
    /// Render order of the result panes.
    pub const ALL: [CalorieTier; 3] = [CalorieTier::High, CalorieTier::Medium, CalorieTier::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            CalorieTier::High => "high",
            CalorieTier::Medium => "medium",
            CalorieTier::Low => "low",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CalorieTier::High => "高热量",
            CalorieTier::Medium => "中热量",
            CalorieTier::Low => "低热量",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "high" => Some(CalorieTier::High),
            "medium" => Some(CalorieTier::Medium),
            "low" => Some(CalorieTier::Low),
            _ => None,
        }
    }
}

impl std::fmt::Display for CalorieTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Category tag as returned by the model. Tags outside the three tiers are
/// kept verbatim so classification can drop them explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FoodCategory {
    Known(CalorieTier),
    Unrecognized(String),
}

impl From<String> for FoodCategory {
    fn from(tag: String) -> Self {
        match CalorieTier::from_tag(&tag) {
            Some(tier) => FoodCategory::Known(tier),
            None => FoodCategory::Unrecognized(tag),
        }
    }
}

impl From<FoodCategory> for String {
    fn from(category: FoodCategory) -> Self {
        match category {
            FoodCategory::Known(tier) => tier.as_str().to_string(),
            FoodCategory::Unrecognized(tag) => tag,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoodItem {
    pub name: String,
    #[serde(deserialize_with = "display_text")]
    pub calories: String,
    pub category: FoodCategory,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub foods: Vec<FoodItem>,
    #[serde(deserialize_with = "display_text")]
    pub total_calories: String,
}

impl AnalysisResult {
    /// Substituted whenever the model's reply cannot be parsed.
    pub fn placeholder() -> Self {
        let food = |name: &str, calories: &str, tier| FoodItem {
            name: name.to_string(),
            calories: calories.to_string(),
            category: FoodCategory::Known(tier),
        };

        Self {
            foods: vec![
                food("炸鸡腿", "350卡", CalorieTier::High),
                food("薯条", "280卡", CalorieTier::High),
                food("可乐", "150卡", CalorieTier::Medium),
                food("生菜", "15卡", CalorieTier::Low),
            ],
            total_calories: "795卡".to_string(),
        }
    }
}

/// Models sometimes answer `"calories": 350` instead of `"350卡"`; both are
/// kept as display text.
fn display_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Text {
        Str(String),
        Num(serde_json::Number),
    }

    Ok(match Text::deserialize(deserializer)? {
        Text::Str(s) => s,
        Text::Num(n) => n.to_string(),
    })
}

/// Foods grouped per tier, in reply order. Derived on every render.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryBuckets {
    pub high: Vec<FoodItem>,
    pub medium: Vec<FoodItem>,
    pub low: Vec<FoodItem>,
    pub dropped: Vec<FoodItem>,
}

impl CategoryBuckets {
    pub fn classify(result: &AnalysisResult) -> Self {
        let mut buckets = Self::default();

        for food in &result.foods {
            match &food.category {
                FoodCategory::Known(CalorieTier::High) => buckets.high.push(food.clone()),
                FoodCategory::Known(CalorieTier::Medium) => buckets.medium.push(food.clone()),
                FoodCategory::Known(CalorieTier::Low) => buckets.low.push(food.clone()),
                FoodCategory::Unrecognized(tag) => {
                    log::warn!("⚠️ Dropping '{}' with unrecognized category '{}'", food.name, tag);
                    buckets.dropped.push(food.clone());
                }
            }
        }

        buckets
    }

    pub fn tier(&self, tier: CalorieTier) -> &[FoodItem] {
        match tier {
            CalorieTier::High => &self.high,
            CalorieTier::Medium => &self.medium,
            CalorieTier::Low => &self.low,
        }
    }
}
