use axum::{extract::FromRequestParts, http::request::Parts};
use fluent_bundle::FluentValue;
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;

use crate::app_state::AppState;
use crate::db::{FinalStatus, LogStatus, NominationStatus, UserRole};
use crate::i18n::{Localizer, SupportedLanguage};
use crate::workflow::Stage;

/// Extractor for getting localized messages in handlers
pub struct I18n {
    pub localizer: Arc<Localizer>,
    pub language: SupportedLanguage,
}

impl I18n {
    pub fn get(&self, key: &str) -> String {
        self.localizer.get_string_for_language(&self.language, key)
    }

    pub fn get_with_args(&self, key: &str, args: &HashMap<String, FluentValue>) -> String {
        self.localizer
            .get_string_with_args(&self.language, key, args)
    }

    pub fn language(&self) -> SupportedLanguage {
        self.language
    }

    pub fn status(&self, status: NominationStatus) -> String {
        self.get(&format!("status-{}", status.as_str()))
    }

    pub fn final_status(&self, final_status: FinalStatus) -> String {
        self.get(&format!("final-status-{}", final_status.as_str()))
    }

    pub fn log_status(&self, status: LogStatus) -> String {
        self.get(&format!("status-{}", status.as_str()))
    }

    pub fn role(&self, role: UserRole) -> String {
        self.get(&format!("role-{}", role.as_str()))
    }

    pub fn stage(&self, stage: Stage) -> String {
        self.get(&format!("stage-{}", stage.as_str().replace('_', "-")))
    }
}

impl FromRequestParts<AppState> for I18n {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let language = parts
            .extensions
            .get::<SupportedLanguage>()
            .copied()
            .unwrap_or_else(|| state.localizer.default_language());

        Ok(I18n {
            localizer: state.localizer.clone(),
            language,
        })
    }
}

/// Helper macro for creating FluentValue arguments easily
#[macro_export]
macro_rules! i18n_args {
    ($($key:expr => $value:expr),* $(,)?) => {{
        let mut args = std::collections::HashMap::new();
        $(
            args.insert($key.to_string(), fluent_bundle::FluentValue::from($value));
        )*
        args
    }};
}
