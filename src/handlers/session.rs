use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{SessionError, ANALYSIS_FAILED_MESSAGE, NO_IMAGE_MESSAGE};
use crate::models::{AnalysisResult, ImagePayload};
use crate::services::{FoodAnalyzer, ImageIntake, SelectedFile};
use crate::ui::{render_analysis, UiShell};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisOutcome {
    Rendered(AnalysisResult),
    /// The image was replaced while the request was in flight; nothing rendered.
    Stale,
}

#[derive(Debug, Default)]
struct Slot {
    generation: u64,
    image: Option<ImagePayload>,
    in_flight: bool,
}

/// One user's page session: the current image (last selection wins) and at
/// most one analysis in flight.
pub struct AnalysisSession {
    analyzer: Arc<dyn FoodAnalyzer>,
    ui: Arc<dyn UiShell>,
    intake: ImageIntake,
    slot: Mutex<Slot>,
}

impl AnalysisSession {
    pub fn new(analyzer: Arc<dyn FoodAnalyzer>, ui: Arc<dyn UiShell>, intake: ImageIntake) -> Self {
        Self {
            analyzer,
            ui,
            intake,
            slot: Mutex::new(Slot::default()),
        }
    }

    fn slot(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn select_file(&self, file: &SelectedFile) -> Result<(), SessionError> {
        let payload = match self.intake.accept(file) {
            Ok(payload) => payload,
            Err(e) => {
                log::warn!("⚠️ {}", e);
                self.ui.show_error(e.user_message());
                return Err(e.into());
            }
        };

        let image_src = payload.data_url();
        {
            let mut slot = self.slot();
            slot.generation += 1;
            slot.image = Some(payload);
        }

        log::info!("🖼️ Image selected: {}", file.name);
        self.ui.show_preview(&image_src);
        Ok(())
    }

    pub async fn analyze(&self) -> Result<AnalysisOutcome, SessionError> {
        let claimed = {
            let mut slot = self.slot();
            match slot.image.clone() {
                None => Err(SessionError::NoImage),
                Some(_) if slot.in_flight => Err(SessionError::Busy),
                Some(image) => {
                    slot.in_flight = true;
                    Ok((slot.generation, image))
                }
            }
        };

        let (generation, payload) = match claimed {
            Ok(claimed) => claimed,
            Err(SessionError::NoImage) => {
                self.ui.show_error(NO_IMAGE_MESSAGE);
                return Err(SessionError::NoImage);
            }
            Err(e) => {
                log::warn!("⚠️ Analyze ignored: {}", e);
                return Err(e);
            }
        };

        let _busy = BusyGuard::enter(self);
        let result = self.analyzer.analyze(&payload).await;

        if self.slot().generation != generation {
            log::warn!("⚠️ Image changed during analysis, discarding result");
            return Ok(AnalysisOutcome::Stale);
        }

        match result {
            Ok(result) => {
                render_analysis(self.ui.as_ref(), &result);
                Ok(AnalysisOutcome::Rendered(result))
            }
            Err(e) => {
                log::error!("❌ Analysis failed: {}", e);
                self.ui.show_error(ANALYSIS_FAILED_MESSAGE);
                Err(e.into())
            }
        }
    }
}

/// Clears the busy indicator and the in-flight flag however `analyze` exits,
/// including when its future is dropped.
struct BusyGuard<'a> {
    session: &'a AnalysisSession,
}

impl<'a> BusyGuard<'a> {
    fn enter(session: &'a AnalysisSession) -> Self {
        session.ui.set_busy(true);
        Self { session }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.session.slot().in_flight = false;
        self.session.ui.set_busy(false);
    }
}
