use thiserror::Error;

#[derive(Error, Debug)]
pub enum IntakeError {
    #[error("not an image file: {name} ({content_type})")]
    InvalidInput { name: String, content_type: String },

    #[error("image too large: {size} bytes (limit {limit})")]
    TooLarge { size: usize, limit: usize },

    #[error("cannot read {name}: {source}")]
    Unreadable {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

impl IntakeError {
    /// Text shown to the user.
    pub fn user_message(&self) -> &'static str {
        match self {
            IntakeError::InvalidInput { .. } => "请选择图片文件！",
            IntakeError::TooLarge { .. } => TOO_LARGE_MESSAGE,
            IntakeError::Unreadable { .. } => "无法读取图片文件！",
        }
    }
}

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("API request failed: {0}")]
    RequestFailed(u16),

    #[error("network failure: {0}")]
    NetworkFailure(String),
}

impl From<reqwest::Error> for AnalysisError {
    fn from(err: reqwest::Error) -> Self {
        AnalysisError::NetworkFailure(err.to_string())
    }
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("no image selected")]
    NoImage,

    #[error("an analysis is already in progress")]
    Busy,

    #[error(transparent)]
    Intake(#[from] IntakeError),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

pub const NO_IMAGE_MESSAGE: &str = "请先上传图片！";
pub const ANALYSIS_FAILED_MESSAGE: &str = "分析失败，请稍后重试！";
pub const TOO_LARGE_MESSAGE: &str = "图片文件过大，请选择更小的图片！";
