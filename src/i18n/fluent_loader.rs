use anyhow::{anyhow, Context, Result};
use fluent_bundle::{concurrent::FluentBundle, FluentResource};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::i18n::language::SupportedLanguage;

pub type Bundle = FluentBundle<FluentResource>;

pub const DEFAULT_LOCALES_DIR: &str = "locales";

/// Loads and manages Fluent translation resources
pub struct FluentLoader {
    locales_dir: PathBuf,
    bundles: HashMap<SupportedLanguage, Bundle>,
}

impl FluentLoader {
    pub fn new() -> Self {
        Self::with_dir(DEFAULT_LOCALES_DIR)
    }

    pub fn with_dir(locales_dir: impl Into<PathBuf>) -> Self {
        Self {
            locales_dir: locales_dir.into(),
            bundles: HashMap::new(),
        }
    }

    /// Load all FTL files for a locale, falling back to the resources compiled
    /// into the binary when the locale directory has none.
    pub fn load_locale(&mut self, language: SupportedLanguage) -> Result<()> {
        let mut bundle = FluentBundle::new_concurrent(vec![language.lang_id()]);
        // Responses are JSON, not bidi-rendered text.
        bundle.set_use_isolating(false);

        let locale_dir = self.locales_dir.join(language.code());
        let mut loaded_files = 0;
        if locale_dir.is_dir() {
            for path in ftl_files(&locale_dir)? {
                let content = fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read file: {:?}", path))?;
                add_resource(&mut bundle, content)
                    .with_context(|| format!("Failed to load FTL file {:?}", path))?;
                loaded_files += 1;
            }
        }

        if loaded_files == 0 {
            add_resource(&mut bundle, embedded_resource(language).to_string())
                .context("Failed to load embedded FTL resource")?;
            tracing::info!("Loaded embedded translations for locale {}", language.code());
        } else {
            tracing::info!(
                "Loaded {} FTL files for locale {}",
                loaded_files,
                language.code()
            );
        }

        self.bundles.insert(language, bundle);
        Ok(())
    }

    /// Get a bundle for a specific language
    pub fn get_bundle(&self, language: &SupportedLanguage) -> Option<&Bundle> {
        self.bundles.get(language)
    }
}

impl Default for FluentLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn ftl_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)
        .with_context(|| format!("Failed to read locale directory: {:?}", dir))?
    {
        let path = entry?.path();
        if path.extension().and_then(|s| s.to_str()) == Some("ftl") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn add_resource(bundle: &mut Bundle, content: String) -> Result<()> {
    let resource = FluentResource::try_new(content)
        .map_err(|(_, errors)| anyhow!("Failed to parse FTL: {:?}", errors))?;
    bundle
        .add_resource(resource)
        .map_err(|errors| anyhow!("Failed to add resource to bundle: {:?}", errors))
}

fn embedded_resource(language: SupportedLanguage) -> &'static str {
    match language {
        SupportedLanguage::Arabic => include_str!("../../locales/ar/main.ftl"),
        SupportedLanguage::English => include_str!("../../locales/en/main.ftl"),
    }
}
