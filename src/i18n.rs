use std::collections::HashMap;

use fluent_templates::{
    fluent_bundle::{FluentArgs, FluentValue},
    static_loader, Loader,
};
use once_cell::sync::Lazy;
use unic_langid::LanguageIdentifier;

static_loader! {
    static LOCALES = {
        locales: "./locales",
        fallback_language: "ru",
        // No bidi isolation marks around placeables: Telegram renders the
        // invisible characters as tofu on some clients.
        customise: |bundle| bundle.set_use_isolating(false),
    };
}

/// Supported languages (code, human-readable name).
pub static SUPPORTED_LANGS: &[(&str, &str)] = &[("ru", "Русский"), ("en", "English")];

/// Default language identifier used as a fallback.
static DEFAULT_LANG: Lazy<LanguageIdentifier> = Lazy::new(|| "ru".parse().unwrap());

/// Normalizes a language code into a LanguageIdentifier (falls back to default).
pub fn lang_from_code(code: &str) -> LanguageIdentifier {
    let normalized = code.split('-').next().unwrap_or(code).to_lowercase();
    normalized.parse().unwrap_or_else(|_| DEFAULT_LANG.clone())
}

/// Checks if a language code is supported by the bot.
/// Returns the normalized language code if supported, None otherwise.
pub fn is_language_supported(code: &str) -> Option<&'static str> {
    let normalized = code.split('-').next().unwrap_or(code).to_lowercase();

    SUPPORTED_LANGS
        .iter()
        .find(|(c, _)| c.eq_ignore_ascii_case(&normalized))
        .map(|(c, _)| *c)
}

/// Resolves the language for a user from their Telegram locale code.
/// Unsupported or missing locales fall back to the default language.
pub fn user_lang(telegram_lang_code: Option<&str>) -> LanguageIdentifier {
    telegram_lang_code
        .and_then(is_language_supported)
        .map(lang_from_code)
        .unwrap_or_else(|| DEFAULT_LANG.clone())
}

/// Returns a localized string for the given key.
/// Converts literal `\n` sequences to actual newlines for proper Telegram formatting.
pub fn t(lang: &LanguageIdentifier, key: &str) -> String {
    let text = LOCALES
        .lookup(lang, key)
        .unwrap_or_else(|| LOCALES.lookup(&DEFAULT_LANG, key).unwrap_or_else(|| key.to_string()));
    text.replace("\\n", "\n")
}

/// Returns a localized string with arguments for interpolation.
/// Converts literal `\n` sequences to actual newlines for proper Telegram formatting.
pub fn t_args(lang: &LanguageIdentifier, key: &str, args: &FluentArgs) -> String {
    let args_map: HashMap<String, FluentValue> = args.iter().map(|(k, v)| (k.to_string(), v.clone())).collect();

    let text = LOCALES.lookup_with_args(lang, key, &args_map).unwrap_or_else(|| {
        LOCALES
            .lookup_with_args(&DEFAULT_LANG, key, &args_map)
            .unwrap_or_else(|| key.to_string())
    });
    text.replace("\\n", "\n")
}

/// Whether `text` equals the translation of `key` in any supported locale.
///
/// Reply-keyboard buttons echo their label back as a plain message, so
/// matching has to consider every locale the label could have been
/// rendered in.
pub fn matches_any_locale(text: &str, key: &str) -> bool {
    SUPPORTED_LANGS
        .iter()
        .any(|(code, _)| t(&lang_from_code(code), key) == text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_known_translation() {
        let ru = lang_from_code("ru");
        let en = lang_from_code("en");

        assert_eq!(t(&ru, "menu.vote_button"), "🗳️ Проголосовать");
        assert_eq!(t(&en, "menu.vote_button"), "🗳️ Vote");
    }

    #[test]
    fn converts_newlines() {
        let ru = lang_from_code("ru");
        let text = t(&ru, "start.welcome");

        assert!(text.contains('\n'));
        assert!(!text.contains("\\n"));
    }

    #[test]
    fn unsupported_locale_falls_back_to_default() {
        let lang = user_lang(Some("ja"));
        assert_eq!(t(&lang, "menu.vote_button"), "🗳️ Проголосовать");
    }

    #[test]
    fn language_variants_normalize() {
        assert_eq!(is_language_supported("en-US"), Some("en"));
        assert_eq!(is_language_supported("ru-RU"), Some("ru"));
        assert_eq!(is_language_supported("es"), None);
    }

    #[test]
    fn button_text_matches_either_locale() {
        assert!(matches_any_locale("🏠 Главная", "menu.home_button"));
        assert!(matches_any_locale("🏠 Home", "menu.home_button"));
        assert!(!matches_any_locale("nonsense", "menu.home_button"));
    }
}
