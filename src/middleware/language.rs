use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use crate::app_state::AppState;
use crate::error::ErrorReport;
use crate::i18n::SupportedLanguage;

/// Detects the request language, stores it in the request extensions and
/// localizes the message of error responses.
pub async fn language_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let language = detect_language_from_headers(request.headers())
        .unwrap_or_else(|| state.localizer.default_language());

    request.extensions_mut().insert(language);

    let response = next.run(request).await;

    let Some(report) = response.extensions().get::<ErrorReport>().cloned() else {
        return response;
    };

    let key = report.kind.message_key();
    let message = if state.localizer.has_message(&language, &key) {
        state.localizer.get_string_for_language(&language, &key)
    } else {
        report.kind.default_message().to_string()
    };

    let status = response.status();
    let mut localized = (status, Json(report.body(&message))).into_response();
    localized
        .headers_mut()
        .insert(header::CONTENT_LANGUAGE, HeaderValue::from_static(language.code()));
    localized.extensions_mut().insert(report);
    localized
}

/// Detect language from various HTTP headers
fn detect_language_from_headers(headers: &HeaderMap) -> Option<SupportedLanguage> {
    // Priority order for language detection:
    // 1. X-Language header (explicit language setting)
    // 2. Accept-Language header (browser preference)

    if let Some(language) = headers
        .get("X-Language")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<SupportedLanguage>().ok())
    {
        return Some(language);
    }

    headers
        .get("Accept-Language")
        .and_then(|value| value.to_str().ok())
        .and_then(SupportedLanguage::from_accept_language)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_header_wins_over_accept_language() {
        let mut headers = HeaderMap::new();
        headers.insert("X-Language", "en".parse().unwrap());
        headers.insert("Accept-Language", "ar-SA,ar;q=0.9".parse().unwrap());
        assert_eq!(
            detect_language_from_headers(&headers),
            Some(SupportedLanguage::English)
        );
    }

    #[test]
    fn test_accept_language_used_when_explicit_header_invalid() {
        let mut headers = HeaderMap::new();
        headers.insert("X-Language", "tlh".parse().unwrap());
        headers.insert("Accept-Language", "ar-EG".parse().unwrap());
        assert_eq!(
            detect_language_from_headers(&headers),
            Some(SupportedLanguage::Arabic)
        );
    }

    #[test]
    fn test_no_headers_yields_none() {
        assert_eq!(detect_language_from_headers(&HeaderMap::new()), None);
    }
}
