//! Settings parsed from TOML, with defaults embedded at compile time.
//!
//! Unlike a process-wide config handler, the parsed [`Settings`] value is
//! owned by the caller (typically one per session context) and passed by
//! reference into the table manager and typing corrector.

use serde::Deserialize;

pub const DEFAULT_SETTINGS_TOML: &str = include_str!("default_settings.toml");

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("TOML parse error: {0}")]
    Parse(String),
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub typing_correction: TypingCorrectionSettings,
    pub table: TableSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TypingCorrectionSettings {
    pub enabled: bool,
    /// Beam width of the correction search.
    pub max_correction_query_candidates: usize,
    /// Cap on the number of corrected queries returned per request.
    pub max_correction_query_results: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TableSettings {
    pub punctuation: PunctuationStyle,
    pub symbol: SymbolStyle,
    /// Overrides the auto-derived case sensitivity when set.
    #[serde(default)]
    pub case_sensitive: Option<bool>,
    /// Custom ruleset text (same TSV format as the built-in tables).
    /// When non-empty it replaces the requested built-in ruleset.
    #[serde(default)]
    pub custom_table: Option<String>,
}

/// How `,` and `.` render by default when the ruleset leaves them unbound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PunctuationStyle {
    KutenTouten,
    CommaPeriod,
    KutenPeriod,
    CommaTouten,
}

/// How `/`, `[`, `]` render by default when the ruleset leaves them unbound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SymbolStyle {
    CornerBracketMiddleDot,
    SquareBracketSlash,
    CornerBracketSlash,
    SquareBracketMiddleDot,
}

impl Default for Settings {
    fn default() -> Self {
        parse_settings_toml(DEFAULT_SETTINGS_TOML).expect("embedded settings TOML must be valid")
    }
}

pub fn parse_settings_toml(toml_str: &str) -> Result<Settings, SettingsError> {
    let s: Settings = toml::from_str(toml_str).map_err(|e| SettingsError::Parse(e.to_string()))?;
    validate(&s)?;
    Ok(s)
}

fn validate(s: &Settings) -> Result<(), SettingsError> {
    if s.typing_correction.max_correction_query_candidates == 0 {
        return Err(SettingsError::InvalidValue {
            field: "typing_correction.max_correction_query_candidates".to_string(),
            reason: "must be positive".to_string(),
        });
    }
    if s.typing_correction.max_correction_query_results == 0 {
        return Err(SettingsError::InvalidValue {
            field: "typing_correction.max_correction_query_results".to_string(),
            reason: "must be positive".to_string(),
        });
    }
    Ok(())
}
