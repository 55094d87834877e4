use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Face bounding box in capture-frame pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Region {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Emotion analysis for one detected face
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceDetection {
    pub region: Region,

    /// Confidence per emotion label, each in [0, 100]; not required to sum to 100
    pub emotion_scores: BTreeMap<String, f32>,

    /// Label with the highest score
    pub dominant_emotion: String,
}

impl FaceDetection {
    /// Build a detection, deriving the dominant emotion from the scores
    pub fn new(region: Region, emotion_scores: BTreeMap<String, f32>) -> Self {
        let emotion_scores = clamp_scores(emotion_scores);
        let dominant_emotion = dominant_label(&emotion_scores).unwrap_or_default();

        Self {
            region,
            emotion_scores,
            dominant_emotion,
        }
    }

    /// Build a detection with a dominant label already chosen by the classifier
    ///
    /// Falls back to the highest score when the label is blank.
    pub fn with_dominant(
        region: Region,
        emotion_scores: BTreeMap<String, f32>,
        dominant_emotion: impl Into<String>,
    ) -> Self {
        let dominant_emotion = dominant_emotion.into();
        if dominant_emotion.trim().is_empty() {
            return Self::new(region, emotion_scores);
        }

        Self {
            region,
            emotion_scores: clamp_scores(emotion_scores),
            dominant_emotion,
        }
    }

    /// Highest score across all emotions (0 when there are none)
    pub fn confidence(&self) -> f32 {
        self.emotion_scores
            .values()
            .copied()
            .fold(0.0_f32, f32::max)
    }
}

/// Faces found in one frame, in classifier order; empty when no face was found
pub type DetectionResult = Vec<FaceDetection>;

fn clamp_scores(scores: BTreeMap<String, f32>) -> BTreeMap<String, f32> {
    scores
        .into_iter()
        .map(|(label, score)| {
            let score = if score.is_nan() { 0.0 } else { score.clamp(0.0, 100.0) };
            (label, score)
        })
        .collect()
}

fn dominant_label(scores: &BTreeMap<String, f32>) -> Option<String> {
    scores
        .iter()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(label, _)| label.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(pairs: &[(&str, f32)]) -> BTreeMap<String, f32> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_dominant_is_max_score() {
        let face = FaceDetection::new(
            Region::new(0, 0, 10, 10),
            scores(&[("happy", 12.0), ("sad", 70.5), ("neutral", 17.5)]),
        );
        assert_eq!(face.dominant_emotion, "sad");
        assert_eq!(face.confidence(), 70.5);
    }

    #[test]
    fn test_scores_are_clamped() {
        let face = FaceDetection::new(
            Region::new(0, 0, 10, 10),
            scores(&[("happy", 140.0), ("sad", -3.0)]),
        );
        assert_eq!(face.emotion_scores["happy"], 100.0);
        assert_eq!(face.emotion_scores["sad"], 0.0);
    }

    #[test]
    fn test_blank_dominant_falls_back() {
        let face = FaceDetection::with_dominant(
            Region::new(0, 0, 10, 10),
            scores(&[("angry", 55.0), ("fear", 5.0)]),
            "",
        );
        assert_eq!(face.dominant_emotion, "angry");
    }

    #[test]
    fn test_classifier_dominant_is_kept() {
        let face = FaceDetection::with_dominant(
            Region::new(0, 0, 10, 10),
            scores(&[("angry", 55.0), ("fear", 5.0)]),
            "fear",
        );
        assert_eq!(face.dominant_emotion, "fear");
    }

    #[test]
    fn test_no_scores() {
        let face = FaceDetection::new(Region::new(0, 0, 1, 1), BTreeMap::new());
        assert_eq!(face.dominant_emotion, "");
        assert_eq!(face.confidence(), 0.0);
    }
}
