pub mod decode;
pub mod features;
pub mod keywords;
pub mod scoring;
pub mod verdict;

use crate::fingerprint::{fingerprint, SeenFingerprints};
use keywords::FilenameHint;
use verdict::Verdict;

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("Could not decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("{0}")]
    MissingInput(&'static str),
    #[error("Upload of {size} bytes exceeds the {limit} byte limit")]
    PayloadTooLarge { size: usize, limit: usize },
}

/// One upload as handed over by the HTTP layer. Never stored.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub bytes: Vec<u8>,
    pub filename: String,
}

#[derive(Clone)]
pub struct Analyzer {
    seen: SeenFingerprints,
    max_upload_bytes: usize,
}

impl Analyzer {
    pub fn new(seen: SeenFingerprints, max_upload_bytes: usize) -> Self {
        Self {
            seen,
            max_upload_bytes,
        }
    }

    pub fn seen(&self) -> &SeenFingerprints {
        &self.seen
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }

    /// Runs decode, scoring and formatting for one upload. The seen
    /// fingerprints are only touched once a verdict exists.
    pub fn analyze(&self, upload: &UploadedImage) -> Result<Verdict, AnalysisError> {
        let verdict = self.evaluate(upload)?;
        self.seen.record(verdict.label, &verdict.fingerprint);
        Ok(verdict)
    }

    /// Same as [`Analyzer::analyze`] without recording the fingerprint.
    pub fn evaluate(&self, upload: &UploadedImage) -> Result<Verdict, AnalysisError> {
        if upload.filename.is_empty() {
            return Err(AnalysisError::MissingInput("Empty filename"));
        }
        if upload.bytes.len() > self.max_upload_bytes {
            return Err(AnalysisError::PayloadTooLarge {
                size: upload.bytes.len(),
                limit: self.max_upload_bytes,
            });
        }

        let fingerprint = fingerprint(&upload.bytes);
        let image = decode::decode(&upload.bytes)?;

        let score = match FilenameHint::classify(&upload.filename) {
            Some(hint) => {
                log::warn!(
                    "Filename {:?} overrides image evidence ({:?})",
                    upload.filename,
                    hint
                );
                hint.score()
            }
            None => {
                let features = features::extract(&image);
                log::debug!(
                    "Features for {}: mean={:.2} std={:.2} edges={:.4} texture={:.2} blobs={} max_blob_area={:.1}",
                    verdict::prefix(&fingerprint, 16),
                    features.mean_intensity,
                    features.intensity_std_dev,
                    features.edge_density,
                    features.texture_variance,
                    features.nodular_blob_count,
                    features.max_blob_area
                );
                scoring::score(&features)
            }
        };

        Ok(Verdict::from_score(score, fingerprint))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use shared::Label;
    use std::io::Cursor;

    const LIMIT: usize = 50 * 1024 * 1024;

    fn png(img: RgbImage) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img).write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    fn blank_gray() -> Vec<u8> {
        png(RgbImage::from_pixel(96, 96, Rgb([128, 128, 128])))
    }

    fn upload(bytes: Vec<u8>, filename: &str) -> UploadedImage {
        UploadedImage {
            bytes,
            filename: filename.to_string(),
        }
    }

    #[test]
    fn cancer_filename_short_circuits() {
        let analyzer = Analyzer::new(SeenFingerprints::new(), LIMIT);
        let verdict = analyzer.analyze(&upload(blank_gray(), "tumor_scan.jpg")).unwrap();
        assert_eq!(verdict.probability, 0.95);
        assert_eq!(verdict.label, Label::Cancerous);
        assert_eq!(verdict.indicators, vec!["Filename indicates cancerous scan."]);
    }

    #[test]
    fn mixed_keywords_classify_positive() {
        let analyzer = Analyzer::new(SeenFingerprints::new(), LIMIT);
        let verdict = analyzer
            .analyze(&upload(blank_gray(), "normal_vs_cancer.png"))
            .unwrap();
        assert!(verdict.is_positive);
    }

    #[test]
    fn blank_image_without_keywords_stays_at_baseline() {
        let analyzer = Analyzer::new(SeenFingerprints::new(), LIMIT);
        let verdict = analyzer.analyze(&upload(blank_gray(), "xyz123.jpg")).unwrap();
        assert_eq!(verdict.probability, scoring::BASELINE);
        assert_eq!(verdict.label, Label::Normal);
        assert_eq!(verdict.confidence_percent, 80.0);
        assert!(
            verdict
                .indicators
                .iter()
                .any(|i| i == "No significant nodules detected.")
        );
    }

    #[test]
    fn identical_uploads_give_identical_verdicts() {
        let analyzer = Analyzer::new(SeenFingerprints::new(), LIMIT);
        let mut img = RgbImage::from_pixel(224, 224, Rgb([30, 30, 30]));
        for y in 90..112 {
            for x in 90..112 {
                img.put_pixel(x, y, Rgb([240, 240, 240]));
            }
        }
        let bytes = png(img);
        let first = analyzer.evaluate(&upload(bytes.clone(), "scan.png")).unwrap();
        let second = analyzer.evaluate(&upload(bytes, "scan.png")).unwrap();
        assert_eq!(first, second);
        assert!((0.0..=1.0).contains(&first.probability));
        assert!((0.0..=100.0).contains(&first.confidence_percent));
    }

    #[test]
    fn verdicts_are_recorded_once_per_fingerprint() {
        let seen = SeenFingerprints::new();
        let analyzer = Analyzer::new(seen.clone(), LIMIT);
        analyzer.analyze(&upload(blank_gray(), "xyz.png")).unwrap();
        analyzer.analyze(&upload(blank_gray(), "xyz.png")).unwrap();
        analyzer.analyze(&upload(blank_gray(), "malignant.png")).unwrap();
        assert_eq!(seen.counts(), (1, 1));
    }

    #[test]
    fn truncated_upload_fails_without_touching_state() {
        let seen = SeenFingerprints::new();
        let analyzer = Analyzer::new(seen.clone(), LIMIT);
        let bytes = blank_gray();
        let truncated = bytes[..bytes.len() / 2].to_vec();

        let err = analyzer.analyze(&upload(truncated, "tumor.png")).unwrap_err();
        assert!(matches!(err, AnalysisError::Decode(_)));
        assert_eq!(seen.counts(), (0, 0));
    }

    #[test]
    fn image_without_pixels_fails_without_touching_state() {
        let seen = SeenFingerprints::new();
        let analyzer = Analyzer::new(seen.clone(), LIMIT);

        let err = analyzer
            .analyze(&upload(b"P6\n0 0\n255\n".to_vec(), "xyz123.ppm"))
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Decode(_)));
        assert_eq!(seen.counts(), (0, 0));
    }

    #[test]
    fn empty_filename_and_oversized_uploads_are_rejected_before_decoding() {
        let analyzer = Analyzer::new(SeenFingerprints::new(), 16);
        assert!(matches!(
            analyzer.analyze(&upload(blank_gray(), "")),
            Err(AnalysisError::MissingInput(_))
        ));
        assert!(matches!(
            analyzer.analyze(&upload(vec![0; 17], "big.png")),
            Err(AnalysisError::PayloadTooLarge { size: 17, limit: 16 })
        ));
        assert_eq!(analyzer.seen().counts(), (0, 0));
    }
}
