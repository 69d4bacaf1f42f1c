use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::str::FromStr;
use unic_langid::{langid, LanguageIdentifier};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SupportedLanguage {
    #[default]
    #[serde(rename = "ar")]
    Arabic,
    #[serde(rename = "en")]
    English,
}

impl SupportedLanguage {
    pub fn all() -> &'static [SupportedLanguage] {
        &[SupportedLanguage::Arabic, SupportedLanguage::English]
    }

    pub fn code(&self) -> &'static str {
        match self {
            SupportedLanguage::Arabic => "ar",
            SupportedLanguage::English => "en",
        }
    }

    /// Get the language identifier for Fluent
    pub fn lang_id(&self) -> LanguageIdentifier {
        match self {
            SupportedLanguage::Arabic => langid!("ar"),
            SupportedLanguage::English => langid!("en-US"),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SupportedLanguage::Arabic => "العربية",
            SupportedLanguage::English => "English",
        }
    }

    /// First supported language in an Accept-Language header, in header order.
    pub fn from_accept_language(accept_language: &str) -> Option<Self> {
        accept_language.split(',').find_map(|part| {
            let tag = part.trim().split(';').next().unwrap_or("").to_lowercase();
            if tag.starts_with("ar") {
                Some(SupportedLanguage::Arabic)
            } else if tag.starts_with("en") {
                Some(SupportedLanguage::English)
            } else {
                None
            }
        })
    }
}

impl Display for SupportedLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for SupportedLanguage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ar" | "arabic" | "ar-sa" | "العربية" => Ok(SupportedLanguage::Arabic),
            "en" | "english" | "en-us" | "en-gb" => Ok(SupportedLanguage::English),
            _ => Err(format!("Unsupported language: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accept_language_respects_header_order() {
        assert_eq!(
            SupportedLanguage::from_accept_language("fr-FR, en-US;q=0.8, ar;q=0.5"),
            Some(SupportedLanguage::English)
        );
        assert_eq!(
            SupportedLanguage::from_accept_language("ar-SA,en;q=0.9"),
            Some(SupportedLanguage::Arabic)
        );
        assert_eq!(SupportedLanguage::from_accept_language("de, fr"), None);
    }

    #[test]
    fn test_parse_codes_and_names() {
        assert_eq!("EN".parse::<SupportedLanguage>(), Ok(SupportedLanguage::English));
        assert_eq!("arabic".parse::<SupportedLanguage>(), Ok(SupportedLanguage::Arabic));
        assert!("tr".parse::<SupportedLanguage>().is_err());
    }

    #[test]
    fn test_default_is_arabic() {
        assert_eq!(SupportedLanguage::default().code(), "ar");
    }
}
