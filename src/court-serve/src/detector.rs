use log::debug;

use crate::classifier::{Classification, Label, ScoreTable};
use crate::error::{DetectError, Result};
use crate::provider::LabelSource;
use crate::request::decode_base64_image;
use crate::timer::Timer;

/// How many detected labels are echoed back in the response.
const MAX_REPORTED_LABELS: usize = 10;

/// Ties a label source to a score table and produces full classifications.
pub struct SurfaceDetector<S: LabelSource> {
    source: S,
    table: ScoreTable,
}

impl<S: LabelSource> SurfaceDetector<S> {
    /// Detector with the default multilingual score table.
    pub fn new(source: S) -> Self {
        SurfaceDetector {
            source,
            table: ScoreTable::default(),
        }
    }

    pub fn with_table(source: S, table: ScoreTable) -> Self {
        SurfaceDetector { source, table }
    }

    /// Classify raw image bytes.
    pub fn detect_from_raw(&self, data: &[u8]) -> Result<Classification> {
        let mut t = Timer::new_start("Detecting labels");
        let labels = self.source.detect_labels(data)?;
        let time_label_detect = t.stop_ms();

        debug!("provider returned {} labels", labels.len());

        let verdict = self.table.classify(&labels);

        Ok(Classification {
            surface: verdict.surface,
            confidence: verdict.confidence,
            labels: labels
                .iter()
                .take(MAX_REPORTED_LABELS)
                .map(Label::formatted)
                .collect(),
            time_image_fetch: 0,
            time_label_detect,
        })
    }

    /// Classify a base64-encoded image.
    pub fn detect_from_base64(&self, encoded: &str) -> Result<Classification> {
        let data = decode_base64_image(encoded)?;
        self.detect_from_raw(&data)
    }

    /// Fetch an image over HTTP and classify it.
    pub fn detect_from_url(&self, url: &str) -> Result<Classification> {
        let mut t = Timer::new_start(&format!("Fetching image from {}", url));

        let data = reqwest::blocking::get(url)
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.bytes())
            .map_err(|err| {
                DetectError::InvalidInput(format!("não foi possível buscar a imagem: {}", err))
            })?;

        let time_image_fetch = t.stop_ms();

        let mut classification = self.detect_from_raw(&data)?;
        classification.time_image_fetch = time_image_fetch;

        Ok(classification)
    }
}
