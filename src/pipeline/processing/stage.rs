use serde::Serialize;
use std::fmt;

/// Coarse phase of an EEG preprocessing pipeline, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Stage {
    RawData,
    SignalCleaning,
    DataPreprocessing,
    Ica,
    PostIca,
    Outcome,
}

impl Stage {
    pub const ALL: [Stage; 6] = [
        Stage::RawData,
        Stage::SignalCleaning,
        Stage::DataPreprocessing,
        Stage::Ica,
        Stage::PostIca,
        Stage::Outcome,
    ];

    /// Map a step or outcome keyword to its stage. Unknown keywords are raw data.
    pub fn classify(keyword: &str) -> Stage {
        let keyword = keyword.trim();
        Stage::ALL
            .into_iter()
            .find(|stage| {
                stage
                    .keywords()
                    .iter()
                    .any(|k| k.eq_ignore_ascii_case(keyword))
            })
            .unwrap_or(Stage::RawData)
    }

    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            Stage::RawData => &["Raw data"],
            Stage::SignalCleaning => &[
                "Channel removal",
                "High-pass filter",
                "Low-pass filter",
                "Bandpass filter",
                "Notch filter",
                "Downsample",
            ],
            Stage::DataPreprocessing => &[
                "Artifact Rejection",
                "Bad channel detection",
                "Re-reference",
                "Epoching",
            ],
            Stage::Ica => &["IC decomposition", "IC rejection"],
            Stage::PostIca => &[
                "Clustering",
                "Baseline correction",
                "Dipole fitting",
                "Normalization",
                "Despiking",
            ],
            Stage::Outcome => &["PSD", "ERD/ERS", "ERSP", "CMC"],
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Stage::RawData => "Raw data",
            Stage::SignalCleaning => "Pre ICA - Signal Cleaning",
            Stage::DataPreprocessing => "Pre ICA - Data Preprocessing",
            Stage::Ica => "ICA",
            Stage::PostIca => "Post ICA",
            Stage::Outcome => "Outcome",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Stage::RawData => "#A9A9A9",
            Stage::SignalCleaning => "#FF8C42",
            Stage::DataPreprocessing => "#20B2AA",
            Stage::Ica => "#9370DB",
            Stage::PostIca => "#D9534F",
            Stage::Outcome => "#3CB371",
        }
    }

    /// Position in the display order, 0 for raw data.
    pub fn order(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
