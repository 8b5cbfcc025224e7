mod analyzer;
mod lexicon;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use analyzer::LexiconSentimentAnalyzer;

/// Five-way mood bucket derived from a polarity score.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Category {
    VeryPositive,
    Positive,
    Neutral,
    Negative,
    VeryNegative,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::VeryPositive,
        Category::Positive,
        Category::Neutral,
        Category::Negative,
        Category::VeryNegative,
    ];

    /// Thresholds: `(0.5, 1]`, `(0.1, 0.5]`, `[-0.1, 0.1]`, `(-0.5, -0.1)`, `[-1, -0.5]`.
    pub fn from_polarity(polarity: f64) -> Self {
        let p = if polarity.is_nan() { 0.0 } else { polarity };
        if p > 0.5 {
            Category::VeryPositive
        } else if p > 0.1 {
            Category::Positive
        } else if p >= -0.1 {
            Category::Neutral
        } else if p > -0.5 {
            Category::Negative
        } else {
            Category::VeryNegative
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::VeryPositive => "Very Positive",
            Category::Positive => "Positive",
            Category::Neutral => "Neutral",
            Category::Negative => "Negative",
            Category::VeryNegative => "Very Negative",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown sentiment category: {0:?}")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();
        Category::ALL
            .into_iter()
            .find(|c| c.label().replace(' ', "").to_lowercase() == key)
            .ok_or_else(|| UnknownCategory(s.to_owned()))
    }
}

pub trait SentimentAnalyzer: Send + Sync {
    /// Polarity in `[-1, 1]`.
    fn polarity(&self, text: &str) -> f64;

    fn classify(&self, text: &str) -> (Category, f64) {
        let polarity = self.polarity(text);
        (Category::from_polarity(polarity), polarity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_match_documented_buckets() {
        let cases = [
            (1.0, Category::VeryPositive),
            (0.51, Category::VeryPositive),
            (0.5, Category::Positive),
            (0.3, Category::Positive),
            (0.1000001, Category::Positive),
            (0.1, Category::Neutral),
            (0.0, Category::Neutral),
            (-0.1, Category::Neutral),
            (-0.1000001, Category::Negative),
            (-0.3, Category::Negative),
            (-0.4999999, Category::Negative),
            (-0.5, Category::VeryNegative),
            (-1.0, Category::VeryNegative),
        ];
        for (p, expected) in cases {
            assert_eq!(Category::from_polarity(p), expected, "polarity {p}");
        }
    }

    #[test]
    fn nan_polarity_is_neutral() {
        assert_eq!(Category::from_polarity(f64::NAN), Category::Neutral);
    }

    #[test]
    fn labels_round_trip_through_from_str() {
        for c in Category::ALL {
            assert_eq!(c.label().parse::<Category>(), Ok(c));
        }
        assert_eq!("very_negative".parse::<Category>(), Ok(Category::VeryNegative));
        assert!("Ecstatic".parse::<Category>().is_err());
    }

    struct Fixed(f64);

    impl SentimentAnalyzer for Fixed {
        fn polarity(&self, _text: &str) -> f64 {
            self.0
        }
    }

    #[test]
    fn classify_returns_bucket_and_raw_score() {
        assert_eq!(Fixed(-0.25).classify("x"), (Category::Negative, -0.25));
    }
}
