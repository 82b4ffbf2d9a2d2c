//! Localized message templates backed by Fluent bundles.
//!
//! Bundles are loaded from `<locales_dir>/<lang>/main.ftl`. Rows of the
//! `message_templates` table can override individual messages at startup.

use anyhow::Result;
use fluent_bundle::concurrent::FluentBundle;
use fluent_bundle::{FluentArgs, FluentResource, FluentValue};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;
use tracing::{debug, warn};
use unic_langid::LanguageIdentifier;

use crate::db::MessageTemplate;

/// Language used when the user's language is unknown or unsupported
pub const DEFAULT_LANGUAGE: &str = "uk";

/// Languages that ship a bundle
pub const SUPPORTED_LANGUAGES: &[&str] = &["uk", "en"];

pub const DEFAULT_LOCALES_DIR: &str = "./locales";

/// Localization manager for the bot
pub struct LocalizationManager {
    bundles: HashMap<String, FluentBundle<FluentResource>>,
}

impl LocalizationManager {
    /// Create a manager from the default locales directory
    pub fn new() -> Result<Self> {
        Self::from_dir(DEFAULT_LOCALES_DIR)
    }

    /// Create a manager reading `main.ftl` for every supported language
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let mut bundles = HashMap::new();

        for lang in SUPPORTED_LANGUAGES {
            let locale: LanguageIdentifier = lang.parse()?;
            let bundle = Self::create_bundle(dir.as_ref(), &locale)?;
            bundles.insert(lang.to_string(), bundle);
        }

        Ok(Self { bundles })
    }

    /// Create a fluent bundle for a specific locale
    fn create_bundle(dir: &Path, locale: &LanguageIdentifier) -> Result<FluentBundle<FluentResource>> {
        let mut bundle = FluentBundle::new_concurrent(vec![locale.clone()]);
        // Unicode isolation marks would end up inside @usernames and links
        bundle.set_use_isolating(false);

        let resource_path = dir.join(locale.to_string()).join("main.ftl");
        match fs::read_to_string(&resource_path) {
            Ok(content) => match FluentResource::try_new(content) {
                Ok(resource) => {
                    if let Err(errors) = bundle.add_resource(resource) {
                        warn!(locale = %locale, errors = ?errors, "Duplicate messages in bundle");
                    }
                }
                Err((resource, errors)) => {
                    warn!(locale = %locale, errors = ?errors, "Parse errors in bundle, keeping valid entries");
                    let _ = bundle.add_resource(resource);
                }
            },
            Err(e) => {
                warn!(path = %resource_path.display(), error = %e, "Locale file not found");
            }
        }

        Ok(bundle)
    }

    /// Replace bundle messages with templates stored in the database.
    ///
    /// Template bodies use Fluent placeables (`{ $name }`). Rows for an
    /// unsupported language or with an unparsable body are skipped.
    pub fn apply_overrides(&mut self, templates: &[MessageTemplate]) -> usize {
        let mut applied = 0;

        for template in templates {
            let Some(bundle) = self.bundles.get_mut(template.lang.as_str()) else {
                debug!(key = %template.key, lang = %template.lang, "Skipping template for unsupported language");
                continue;
            };

            let source = format!(
                "{} =\n    {}\n",
                template.key,
                template.body.trim().replace('\n', "\n    ")
            );
            match FluentResource::try_new(source) {
                Ok(resource) => {
                    bundle.add_resource_overriding(resource);
                    applied += 1;
                }
                Err((_, errors)) => {
                    warn!(key = %template.key, lang = %template.lang, errors = ?errors, "Invalid template body");
                }
            }
        }

        applied
    }

    /// Get a localized message, falling back to the default language.
    ///
    /// A missing key degrades to a visible placeholder instead of failing.
    pub fn get_message_in_language(
        &self,
        key: &str,
        lang: &str,
        args: Option<&HashMap<&str, &str>>,
    ) -> String {
        let bundle = match self
            .bundles
            .get(lang)
            .filter(|bundle| bundle.has_message(key))
            .or_else(|| self.bundles.get(DEFAULT_LANGUAGE))
        {
            Some(bundle) => bundle,
            None => return format!("Missing translation: {key}"),
        };

        let Some(msg) = bundle.get_message(key) else {
            return format!("Missing translation: {key}");
        };

        let Some(pattern) = msg.value() else {
            return format!("Missing value for key: {key}");
        };

        let fluent_args = args.map(|args| {
            let mut fluent_args = FluentArgs::new();
            for (k, v) in args {
                fluent_args.set(*k, FluentValue::from(*v));
            }
            fluent_args
        });

        let mut errors = vec![];
        let value = bundle.format_pattern(pattern, fluent_args.as_ref(), &mut errors);
        if !errors.is_empty() {
            debug!(key, lang, errors = ?errors, "Template formatted with errors");
        }

        value.into_owned()
    }

    /// Get a localized message with simple string arguments
    pub fn get_message_with_args(&self, key: &str, lang: &str, args: &[(&str, &str)]) -> String {
        let args_map: HashMap<&str, &str> = args.iter().cloned().collect();
        self.get_message_in_language(key, lang, Some(&args_map))
    }
}

/// Global localization instance
static LOCALIZATION_MANAGER: OnceLock<LocalizationManager> = OnceLock::new();

/// Initialize the global localization manager with database overrides.
///
/// Only the first initialization takes effect.
pub fn init_localization_with(dir: impl AsRef<Path>, overrides: &[MessageTemplate]) -> Result<()> {
    let mut manager = LocalizationManager::from_dir(dir)?;
    let applied = manager.apply_overrides(overrides);
    debug!(applied, "Message template overrides applied");
    let _ = LOCALIZATION_MANAGER.set(manager);
    Ok(())
}

/// Get the global localization manager, loading defaults on first use
pub fn get_localization_manager() -> &'static LocalizationManager {
    LOCALIZATION_MANAGER.get_or_init(|| {
        LocalizationManager::new().unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load locales, messages will be placeholders");
            LocalizationManager {
                bundles: HashMap::new(),
            }
        })
    })
}

/// Map a Telegram language code (`uk`, `en-US`, ...) to a supported language
pub fn detect_language(language_code: Option<&str>) -> &'static str {
    let Some(code) = language_code else {
        return DEFAULT_LANGUAGE;
    };
    let primary = code
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_lowercase();

    SUPPORTED_LANGUAGES
        .iter()
        .find(|lang| **lang == primary)
        .copied()
        .unwrap_or(DEFAULT_LANGUAGE)
}

/// Localized message in the user's language
pub fn t_lang(key: &str, language_code: Option<&str>) -> String {
    get_localization_manager().get_message_in_language(key, detect_language(language_code), None)
}

/// Localized message with arguments in the user's language
pub fn t_args_lang(key: &str, args: &[(&str, &str)], language_code: Option<&str>) -> String {
    get_localization_manager().get_message_with_args(key, detect_language(language_code), args)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_language_variants() {
        assert_eq!(detect_language(Some("uk")), "uk");
        assert_eq!(detect_language(Some("uk-UA")), "uk");
        assert_eq!(detect_language(Some("en_GB")), "en");
        assert_eq!(detect_language(Some("EN")), "en");
        assert_eq!(detect_language(Some("de")), DEFAULT_LANGUAGE);
        assert_eq!(detect_language(Some("")), DEFAULT_LANGUAGE);
        assert_eq!(detect_language(None), DEFAULT_LANGUAGE);
    }

    #[test]
    fn test_overrides_replace_bundle_messages() {
        let mut manager = LocalizationManager::new().expect("Failed to create localization manager");
        let templates = vec![
            MessageTemplate {
                key: "ask-age".to_string(),
                lang: "en".to_string(),
                body: "How old are you, { $name }?".to_string(),
            },
            MessageTemplate {
                key: "ask-age".to_string(),
                lang: "pl".to_string(),
                body: "Ile masz lat?".to_string(),
            },
        ];

        assert_eq!(manager.apply_overrides(&templates), 1);
        let message = manager.get_message_with_args("ask-age", "en", &[("name", "Ann")]);
        assert_eq!(message, "How old are you, Ann?");
    }

    #[test]
    fn test_missing_key_placeholder() {
        let manager = LocalizationManager {
            bundles: HashMap::new(),
        };
        assert_eq!(
            manager.get_message_in_language("anything", "uk", None),
            "Missing translation: anything"
        );
    }
}
