use crate::sentiment::Category;

pub const DEFAULT_STRATEGY: &str = "Keep going, you're doing great!";

pub fn strategy_for(category: Category) -> &'static str {
    match category {
        Category::VeryPositive => {
            "Keep up the positive vibes! Consider sharing your good mood with others."
        }
        Category::Positive => {
            "It's great to see you're feeling positive. Keep doing what you're doing!"
        }
        Category::Neutral => {
            "It's alright to feeling this way. We're with you every step of the way."
        }
        Category::Negative => {
            "It seems you're feeling down. Try to take a break and do something relaxing."
        }
        Category::VeryNegative => {
            "I'm sorry to hear that you're feeling very negative. Consider talking to a friend or seeking professional help."
        }
    }
}

/// Looks a strategy up by category label, e.g. `"Very Negative"`.
/// Unknown labels get [`DEFAULT_STRATEGY`].
pub fn strategy_for_label(label: &str) -> &'static str {
    label
        .parse::<Category>()
        .map(strategy_for)
        .unwrap_or(DEFAULT_STRATEGY)
}
