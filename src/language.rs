use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{BatchdubError, Result};

/// Closed set of languages the engine accepts. `Auto` is only valid as a
/// source language; the job builder rejects it as a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageCode {
    Auto,
    En,
    Es,
    Fr,
    De,
    It,
    Pt,
    Ru,
    Zh,
    Ja,
    Ko,
    Ar,
    Hi,
    Bn,
    Pa,
    Te,
    Tr,
    Vi,
    Th,
    Id,
}

impl LanguageCode {
    /// All codes selectable as a translation target, in catalog order.
    pub fn targets() -> &'static [LanguageCode] {
        use LanguageCode::*;
        &[
            En, Es, Fr, De, It, Pt, Ru, Zh, Ja, Ko, Ar, Hi, Bn, Pa, Te, Tr, Vi, Th, Id,
        ]
    }

    pub fn is_source_only(&self) -> bool {
        matches!(self, LanguageCode::Auto)
    }

    /// Wire representation of the code (lowercase ISO-639-1, or "auto").
    pub fn as_str(&self) -> &'static str {
        use LanguageCode::*;
        match self {
            Auto => "auto",
            En => "en",
            Es => "es",
            Fr => "fr",
            De => "de",
            It => "it",
            Pt => "pt",
            Ru => "ru",
            Zh => "zh",
            Ja => "ja",
            Ko => "ko",
            Ar => "ar",
            Hi => "hi",
            Bn => "bn",
            Pa => "pa",
            Te => "te",
            Tr => "tr",
            Vi => "vi",
            Th => "th",
            Id => "id",
        }
    }

    /// Human-readable name shown to users.
    pub fn display_name(&self) -> &'static str {
        use LanguageCode::*;
        match self {
            Auto => "Auto Detect",
            En => "English",
            Es => "Spanish",
            Fr => "French",
            De => "German",
            It => "Italian",
            Pt => "Portuguese",
            Ru => "Russian",
            Zh => "Chinese",
            Ja => "Japanese",
            Ko => "Korean",
            Ar => "Arabic",
            Hi => "Hindi",
            Bn => "Bengali",
            Pa => "Punjabi",
            Te => "Telugu",
            Tr => "Turkish",
            Vi => "Vietnamese",
            Th => "Thai",
            Id => "Indonesian",
        }
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LanguageCode {
    type Err = BatchdubError;

    fn from_str(s: &str) -> Result<Self> {
        use LanguageCode::*;
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(Auto),
            "en" => Ok(En),
            "es" => Ok(Es),
            "fr" => Ok(Fr),
            "de" => Ok(De),
            "it" => Ok(It),
            "pt" => Ok(Pt),
            "ru" => Ok(Ru),
            "zh" => Ok(Zh),
            "ja" => Ok(Ja),
            "ko" => Ok(Ko),
            "ar" => Ok(Ar),
            "hi" => Ok(Hi),
            "bn" => Ok(Bn),
            "pa" => Ok(Pa),
            "te" => Ok(Te),
            "tr" => Ok(Tr),
            "vi" => Ok(Vi),
            "th" => Ok(Th),
            "id" => Ok(Id),
            other => Err(BatchdubError::UnsupportedFormat(format!(
                "unknown language code: {}",
                other
            ))),
        }
    }
}

/// Resolve an engine-reported language code to its display name. Codes
/// outside the catalog fall back to the raw code string; an unknown code
/// is never fatal.
pub fn resolve_display_name(code: &str) -> String {
    match code.parse::<LanguageCode>() {
        Ok(known) => known.display_name().to_string(),
        Err(_) => code.to_string(),
    }
}

/// Parse a comma-separated list of target language codes, deduplicating
/// while preserving first-seen order.
pub fn parse_target_list(raw: &str) -> Result<Vec<LanguageCode>> {
    let mut targets = Vec::new();
    for part in raw.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let code = part.parse::<LanguageCode>()?;
        if !targets.contains(&code) {
            targets.push(code);
        }
    }
    Ok(targets)
}
