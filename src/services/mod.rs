pub mod ai_service;
pub mod ark; // Volcengine Ark chat-completion client
pub mod intake;

pub use ai_service::FoodAnalyzer;
pub use ark::ArkService;
pub use intake::{ImageIntake, SelectedFile};
