//! Fixed texts shown around the conversation.

pub const APP_TITLE: &str = "AI-Therapist";
pub const WELCOME_TITLE: &str = "Hi, I’m your AI-Therapist";
pub const WELCOME_PROMPT: &str = "How are you feeling today? I am here to listen!";

pub const PRIVACY_TITLE: &str = "Data Privacy Disclaimer";
pub const PRIVACY_DISCLAIMER: &str = "This application stores your session data, including your \
    messages and sentiment analysis results, in temporary storage during your session. This data \
    is not stored permanently and is used solely to improve your interaction with the chatbot. \
    Please avoid sharing personal or sensitive information during your conversation.";

pub const RESOURCES_INTRO: &str =
    "If you need immediate help, please contact one of the following resources:";
pub const MORE_RESOURCES_URL: &str = "https://telemanas.mohfw.gov.in/home";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Hotline {
    pub name: &'static str,
    pub phone: &'static str,
}

pub const HOTLINES: [Hotline; 3] = [
    Hotline {
        name: "1Life, Crisis Support, Suicide Prevention",
        phone: "78930-78930",
    },
    Hotline {
        name: "Lifeline Foundation",
        phone: "90888030303",
    },
    Hotline {
        name: "Aasra",
        phone: "9820466726",
    },
];

/// Numbered hotline list followed by the link to more resources.
pub fn hotline_lines() -> Vec<String> {
    HOTLINES
        .iter()
        .enumerate()
        .map(|(i, h)| format!("{}. {}: {}", i + 1, h.name, h.phone))
        .chain(std::iter::once(format!("More Resources: {MORE_RESOURCES_URL}")))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hotlines_are_numbered_and_end_with_the_link() {
        let lines = hotline_lines();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "1. 1Life, Crisis Support, Suicide Prevention: 78930-78930");
        assert_eq!(lines[2], "3. Aasra: 9820466726");
        assert!(lines[3].ends_with(MORE_RESOURCES_URL));
    }

    #[test]
    fn disclaimer_is_one_paragraph() {
        assert!(!PRIVACY_DISCLAIMER.contains('\n'));
        assert!(!PRIVACY_DISCLAIMER.contains("  "));
    }
}
