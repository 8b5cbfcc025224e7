//! Word tables for the lexicon scorer.
//!
//! Polarities follow the adjective-centred scale of the pattern/TextBlob
//! lexicon: `1.0` is the strongest praise, `-1.0` the strongest condemnation.

pub(crate) fn polarity(word: &str) -> Option<f64> {
    let p = match word {
        "perfect" | "excellent" | "awesome" | "wonderful" | "best" => 1.0,
        "brilliant" | "outstanding" | "superb" => 0.9,
        "beautiful" => 0.85,
        "great" | "happy" | "proud" | "joyful" | "joy" | "thrilled" => 0.8,
        "good" | "loved" | "delighted" | "fabulous" => 0.7,
        "amazing" | "nice" | "loving" | "kind" => 0.6,
        "love" | "lovely" | "glad" | "better" | "okay" | "ok" | "pleased" | "grateful"
        | "thankful" | "hopeful" | "optimistic" | "confident" | "cheerful" | "blessed"
        | "motivated" | "safe" | "healthy" => 0.5,
        "fine" | "relaxed" | "enjoy" | "enjoyed" | "enjoying" | "content" | "fantastic"
        | "strong" | "energetic" => 0.4,
        "excited" | "cool" | "fun" | "calm" | "smile" | "laugh" | "supported" | "relieved" => 0.3,
        "peaceful" | "positive" | "interesting" => 0.25,
        "hope" => 0.2,
        "empty" => -0.1,
        "lost" | "alone" => -0.2,
        "hard" | "nervous" | "cry" | "confused" => -0.3,
        "tired" | "exhausted" | "worse" | "worried" | "anxious" | "poor" | "broken"
        | "crying" | "annoyed" | "stress" | "fear" => -0.4,
        "sad" | "angry" | "lonely" | "upset" | "stressed" | "anxiety" | "bored" | "hurt"
        | "pain" | "difficult" | "wrong" | "fail" | "failed" | "overwhelmed" | "guilty"
        | "ill" | "scared" => -0.5,
        "unhappy" | "depressed" | "depressing" | "mad" | "helpless" | "afraid" | "frightened"
        | "frustrated" | "frustrating" | "failure" | "ashamed" | "disappointing" => -0.6,
        "bad" | "painful" | "sick" | "ugly" => -0.7,
        "disappointed" => -0.75,
        "hate" | "hopeless" | "worthless" | "furious" | "stupid" => -0.8,
        "hated" | "dreadful" => -0.9,
        "terrible" | "awful" | "horrible" | "worst" | "miserable" | "boring" | "disgusting"
        | "suicidal" => -1.0,
        _ => return None,
    };
    Some(p)
}

/// Multiplier applied to the next scored word.
pub(crate) fn intensity(word: &str) -> Option<f64> {
    let m = match word {
        "extremely" | "utterly" => 1.5,
        "incredibly" | "absolutely" => 1.4,
        "very" | "really" | "so" | "totally" | "completely" | "deeply" | "highly" => 1.3,
        "too" | "truly" => 1.2,
        "quite" | "pretty" => 1.1,
        "rather" | "fairly" => 0.8,
        "somewhat" | "kinda" => 0.7,
        "slightly" => 0.5,
        _ => return None,
    };
    Some(m)
}

pub(crate) fn is_negation(word: &str) -> bool {
    matches!(
        word,
        "not" | "no" | "never" | "cannot" | "nor" | "neither" | "dont" | "doesnt" | "didnt"
            | "isnt" | "wasnt" | "arent" | "werent" | "cant" | "wont" | "couldnt" | "shouldnt"
            | "wouldnt" | "havent" | "hasnt" | "aint"
    ) || word.ends_with("n't")
}
