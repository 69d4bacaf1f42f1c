use axum::extract::rejection::QueryRejection;
use axum::{
    extract::{Query, State},
    response::Json,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::app_state::AppState;
use crate::error::AppResult;
use crate::i18n::{extract_translations_for_client, I18n, SupportedLanguage};
use crate::modules::extractors::extract_query;

/// Keys sent when the client does not ask for specific ones.
const DEFAULT_CLIENT_KEYS: &[&str] = &[
    "app-name",
    "status-pending",
    "status-approved",
    "status-rejected",
    "status-submitted",
    "final-status-draft",
    "final-status-approved",
    "final-status-rejected",
    "final-status-submitted",
    "role-admin",
    "role-hr",
    "role-manager",
    "role-entry",
    "role-employee",
    "stage-manager-review",
    "stage-hr-review",
    "stage-entry-review",
];

#[derive(Debug, Deserialize)]
pub struct TranslationQuery {
    pub keys: Option<String>, // Comma-separated list of keys
    pub language: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LanguageInfo {
    pub code: String,
    pub name: String,
    pub is_default: bool,
}

#[derive(Debug, Serialize)]
pub struct SupportedLanguagesResponse {
    pub languages: Vec<LanguageInfo>,
    pub default_language: String,
    pub current_language: String,
}

#[derive(Debug, Serialize)]
pub struct TranslationsResponse {
    pub translations: HashMap<String, String>,
    pub language: String,
    pub requested_keys: Vec<String>,
}

/// Get all supported languages
pub async fn get_supported_languages(
    State(state): State<AppState>,
    i18n: I18n,
) -> Json<SupportedLanguagesResponse> {
    let default_language = state.localizer.default_language();
    let languages = SupportedLanguage::all()
        .iter()
        .map(|lang| LanguageInfo {
            code: lang.code().to_string(),
            name: lang.name().to_string(),
            is_default: *lang == default_language,
        })
        .collect();

    Json(SupportedLanguagesResponse {
        languages,
        default_language: default_language.code().to_string(),
        current_language: i18n.language().code().to_string(),
    })
}

/// Get translations for specific keys
pub async fn get_translations(
    State(state): State<AppState>,
    i18n: I18n,
    query: Result<Query<TranslationQuery>, QueryRejection>,
) -> AppResult<Json<TranslationsResponse>> {
    let query = extract_query(query)?;
    // An explicit language parameter overrides the detected one.
    let language = query
        .language
        .and_then(|lang| lang.parse::<SupportedLanguage>().ok())
        .unwrap_or(i18n.language());

    let keys: Vec<String> = match query.keys {
        Some(keys) => keys
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        None => DEFAULT_CLIENT_KEYS.iter().map(|s| s.to_string()).collect(),
    };

    let key_refs: Vec<&str> = keys.iter().map(|s| s.as_str()).collect();
    let translations = extract_translations_for_client(&state.localizer, language, &key_refs);

    Ok(Json(TranslationsResponse {
        translations,
        language: language.code().to_string(),
        requested_keys: keys,
    }))
}
