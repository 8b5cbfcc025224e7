use crate::sentiment::{lexicon, SentimentAnalyzer};

const NEGATION_FACTOR: f64 = -0.5;
const EXCLAMATION_BOOST: f64 = 1.25;

/// Rule-based polarity scorer over a fixed word lexicon.
///
/// Every lexicon hit becomes an assessment. Intensifiers scale the next hit,
/// a negation earlier in the same sentence flips and halves it, and each
/// trailing `!` boosts the latest assessment of the sentence. The polarity is
/// the mean of all assessments.
#[derive(Clone, Copy, Debug, Default)]
pub struct LexiconSentimentAnalyzer;

impl LexiconSentimentAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

struct Token {
    word: String,
    exclamations: usize,
    ends_sentence: bool,
}

fn tokenize(text: &str) -> impl Iterator<Item = Token> + '_ {
    text.split_whitespace().map(|raw| {
        let raw = raw.replace('\u{2019}', "'");
        let body_len = raw.trim_end_matches(|c: char| !c.is_alphanumeric()).len();
        let tail = &raw[body_len..];
        Token {
            word: raw
                .trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase(),
            exclamations: tail.matches('!').count(),
            ends_sentence: tail.contains(['.', '!', '?']),
        }
    })
}

impl SentimentAnalyzer for LexiconSentimentAnalyzer {
    fn polarity(&self, text: &str) -> f64 {
        let mut assessments: Vec<f64> = Vec::new();
        let mut sentence_start = 0;
        let mut multiplier = 1.0;
        let mut negated = false;

        for token in tokenize(text) {
            if lexicon::is_negation(&token.word) {
                negated = true;
            } else if let Some(m) = lexicon::intensity(&token.word) {
                multiplier *= m;
            } else if let Some(p) = lexicon::polarity(&token.word) {
                let mut score = p * multiplier;
                if negated {
                    score *= NEGATION_FACTOR;
                }
                assessments.push(score.clamp(-1.0, 1.0));
                multiplier = 1.0;
                negated = false;
            } else if !token.word.is_empty() {
                // intensifiers only reach the word right after them
                multiplier = 1.0;
            }

            if assessments.len() > sentence_start {
                if let Some(last) = assessments.last_mut() {
                    for _ in 0..token.exclamations {
                        *last = (*last * EXCLAMATION_BOOST).clamp(-1.0, 1.0);
                    }
                }
            }

            if token.ends_sentence {
                sentence_start = assessments.len();
                multiplier = 1.0;
                negated = false;
            }
        }

        if assessments.is_empty() {
            return 0.0;
        }
        let mean = assessments.iter().sum::<f64>() / assessments.len() as f64;
        mean.clamp(-1.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sentiment::Category;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn exclamation_lifts_love_into_very_positive() {
        let analyzer = LexiconSentimentAnalyzer::new();
        assert_close(analyzer.polarity("I love this"), 0.5);

        let (category, polarity) = analyzer.classify("I love this!");
        assert_close(polarity, 0.625);
        assert_eq!(category, Category::VeryPositive);
    }

    #[test]
    fn negation_flips_and_halves() {
        let analyzer = LexiconSentimentAnalyzer::new();
        assert_close(analyzer.polarity("I am not happy"), -0.4);
        assert_close(analyzer.polarity("I don\u{2019}t feel happy"), -0.4);
        assert_eq!(analyzer.classify("I am not happy").0, Category::Negative);
    }

    #[test]
    fn negation_stops_at_sentence_end() {
        let analyzer = LexiconSentimentAnalyzer::new();
        assert_close(analyzer.polarity("I did not sleep. I feel good"), 0.7);
    }

    #[test]
    fn intensifiers_and_downtoners_scale_next_word() {
        let analyzer = LexiconSentimentAnalyzer::new();
        assert_close(analyzer.polarity("I am very sad"), -0.65);
        assert_close(analyzer.polarity("I'm slightly worried"), -0.2);
        assert_close(analyzer.polarity("really happy"), 1.0);
        // "very" does not carry past an unscored word
        assert_close(analyzer.polarity("very much sad"), -0.5);
    }

    #[test]
    fn mixed_sentence_averages_assessments() {
        let analyzer = LexiconSentimentAnalyzer::new();
        assert_close(analyzer.polarity("good but tired"), 0.15);
        assert_eq!(analyzer.classify("good but tired").0, Category::Positive);
    }

    #[test]
    fn strong_negative_and_neutral_text() {
        let analyzer = LexiconSentimentAnalyzer::new();
        assert_eq!(
            analyzer.classify("I feel terrible.").0,
            Category::VeryNegative
        );
        assert_eq!(
            analyzer.classify("The meeting is at noon.").0,
            Category::Neutral
        );
        assert_close(analyzer.polarity(""), 0.0);
        assert_close(analyzer.polarity("!!!"), 0.0);
    }

    #[test]
    fn repeated_exclamations_are_clamped() {
        let analyzer = LexiconSentimentAnalyzer::new();
        assert_close(analyzer.polarity("This is awesome!!!"), 1.0);
        assert_close(analyzer.polarity("awful!!"), -1.0);
    }
}
