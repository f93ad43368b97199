//! A single transient keystroke event fed into the composition.

/// One physically-adjacent key the user may actually have struck, with the
/// decoder's probability estimate. Attached by the upstream key-event layer
/// when typing-correction data is available for the keystroke.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbableKeyEvent {
    pub key_code: char,
    pub probability: f64,
}

/// A keystroke as seen by the composition and the typing corrector: the raw
/// key text, an optional already-resolved conversion (bypassing table
/// lookup, e.g. literal key-string input), a flag marking the start of a
/// fresh chunk, and optional probable-key alternatives.
#[derive(Debug, Clone, Default)]
pub struct CompositionInput {
    raw: String,
    conversion: Option<String>,
    is_new_input: bool,
    probable_key_events: Vec<ProbableKeyEvent>,
}

impl CompositionInput {
    pub fn from_raw(raw: impl Into<String>) -> Self {
        CompositionInput {
            raw: raw.into(),
            ..Default::default()
        }
    }

    pub fn with_conversion(raw: impl Into<String>, conversion: impl Into<String>) -> Self {
        CompositionInput {
            raw: raw.into(),
            conversion: Some(conversion.into()),
            ..Default::default()
        }
    }

    pub fn with_probable_key_events(mut self, events: Vec<ProbableKeyEvent>) -> Self {
        self.probable_key_events = events;
        self
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub(crate) fn raw_mut(&mut self) -> &mut String {
        &mut self.raw
    }

    pub fn conversion(&self) -> Option<&str> {
        self.conversion.as_deref()
    }

    pub fn has_conversion(&self) -> bool {
        self.conversion.is_some()
    }

    /// Split borrow for consuming both strings during chunk absorption.
    /// Only meaningful when a conversion is present.
    pub(crate) fn raw_and_conversion_mut(&mut self) -> (&mut String, &mut String) {
        let conversion = self.conversion.get_or_insert_with(String::new);
        (&mut self.raw, conversion)
    }

    pub fn is_new_input(&self) -> bool {
        self.is_new_input
    }

    pub fn set_is_new_input(&mut self, is_new_input: bool) {
        self.is_new_input = is_new_input;
    }

    pub fn probable_key_events(&self) -> &[ProbableKeyEvent] {
        &self.probable_key_events
    }

    /// The text this keystroke resolves to without table help: the attached
    /// conversion when present, the raw key text otherwise.
    pub fn resolved_text(&self) -> &str {
        self.conversion.as_deref().unwrap_or(&self.raw)
    }

    /// Fully consumed: nothing left for another chunk to absorb.
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty() && self.conversion.as_deref().map_or(true, str::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_states() {
        assert!(CompositionInput::default().is_empty());
        assert!(!CompositionInput::from_raw("a").is_empty());
        assert!(!CompositionInput::with_conversion("", "あ").is_empty());
        assert!(CompositionInput::with_conversion("", "").is_empty());
    }

    #[test]
    fn resolved_text_prefers_conversion() {
        assert_eq!(CompositionInput::from_raw("ka").resolved_text(), "ka");
        assert_eq!(
            CompositionInput::with_conversion("ka", "か").resolved_text(),
            "か"
        );
    }
}
