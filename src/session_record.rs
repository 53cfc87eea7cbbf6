use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Best height across runs, owned by whoever drives the runs.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    #[serde(rename = "bestHeight")]
    pub best_height: f32,
    pub runs: u32,
    #[serde(rename = "bestRecordedAt")]
    pub best_recorded_at: Option<String>,
}

impl SessionRecord {
    /// Counts a finished run; returns true when `height` beats the best.
    pub fn finish_run(&mut self, height: f32) -> bool {
        self.runs = self.runs.saturating_add(1);
        if !height.is_finite() || height <= self.best_height {
            return false;
        }
        self.best_height = height;
        self.best_recorded_at = Some(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true));
        true
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
