use crate::session::MoodEntry;
use serde::Serialize;

const AXIS: char = '|';
const BAR: char = '#';

/// Snapshot of the mood history, oldest first.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MoodSummary {
    entries: Vec<MoodEntry>,
}

impl MoodSummary {
    pub fn new(entries: Vec<MoodEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[MoodEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `"<n>. <message> - Sentiment: <label> (Polarity: <p>)"`, numbered from 1.
    pub fn lines(&self) -> Vec<String> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, e)| {
                format!(
                    "{}. {} - Sentiment: {} (Polarity: {:?})",
                    i + 1,
                    e.message,
                    e.category.label(),
                    e.polarity
                )
            })
            .collect()
    }

    /// One horizontal bar per entry around a zero axis. `width` is the total
    /// bar area; each side gets half of it.
    pub fn chart(&self, width: usize) -> Vec<String> {
        let half = (width / 2).max(1);
        self.entries
            .iter()
            .enumerate()
            .map(|(i, e)| format!("{:>3} {} {:+.2}", i + 1, bar(e.polarity, half), e.polarity))
            .collect()
    }
}

fn bar(polarity: f64, half: usize) -> String {
    let p = if polarity.is_nan() {
        0.0
    } else {
        polarity.clamp(-1.0, 1.0)
    };
    let filled = ((p.abs() * half as f64).round() as usize).min(half);

    let mut s = String::with_capacity(half * 2 + 1);
    if p < 0.0 {
        s.extend(std::iter::repeat(' ').take(half - filled));
        s.extend(std::iter::repeat(BAR).take(filled));
    } else {
        s.extend(std::iter::repeat(' ').take(half));
    }
    s.push(AXIS);
    if p > 0.0 {
        s.extend(std::iter::repeat(BAR).take(filled));
        s.extend(std::iter::repeat(' ').take(half - filled));
    } else {
        s.extend(std::iter::repeat(' ').take(half));
    }
    s
}
