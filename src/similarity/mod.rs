//! String similarity measures shared by the matchers.
//!
//! [`isub`] is the default measure for names. Levenshtein and trigram
//! measures are available for lexicons where ISub's substring model fits
//! poorly, such as codes and formulas.

pub mod edit;
pub mod isub;
pub mod words;

use serde::{Deserialize, Serialize};

pub use edit::{levenshtein, levenshtein_distance, qgram};
pub use isub::isub;
pub use words::{is_stop_word, words};

/// Selectable string measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StringMeasure {
    #[default]
    Isub,
    Levenshtein,
    QGram,
}

impl StringMeasure {
    /// Similarity of two names in [0, 1].
    pub fn compare(self, a: &str, b: &str) -> f64 {
        match self {
            StringMeasure::Isub => isub(a, b),
            StringMeasure::Levenshtein => levenshtein(a, b),
            StringMeasure::QGram => qgram(a, b),
        }
    }
}
