//! Translation lookup.
//!
//! View derivation never reaches for a global catalog: every function that
//! produces user-facing text takes a `&dyn Translate`. The app passes its
//! [`Catalog`]; tests can pass a plain closure.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tracing::warn;

const EN_CATALOG: &str = include_str!("../locales/en.json");
const HI_CATALOG: &str = include_str!("../locales/hi.json");

pub trait Translate {
    /// Resolves a dotted key. Total: an unresolved key comes back unchanged.
    fn translate(&self, key: &str) -> String;

    /// Resolves a key and substitutes `{name}` placeholders.
    fn translate_with(&self, key: &str, args: &[(&str, &str)]) -> String {
        interpolate(&self.translate(key), args)
    }
}

impl<F> Translate for F
where
    F: Fn(&str) -> String,
{
    fn translate(&self, key: &str) -> String {
        self(key)
    }
}

#[must_use]
pub fn interpolate(template: &str, args: &[(&str, &str)]) -> String {
    args.iter().fold(template.to_string(), |acc, (name, value)| {
        acc.replace(&format!("{{{name}}}"), value)
    })
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Hi,
}

impl Locale {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Hi => "hi",
        }
    }
}

/// Nested dictionaries, one per locale, plus the active locale.
#[derive(Clone, Debug)]
pub struct Catalog {
    locale: Locale,
    dictionaries: HashMap<Locale, Value>,
}

impl Default for Catalog {
    fn default() -> Self {
        let mut catalog = Self {
            locale: Locale::En,
            dictionaries: HashMap::new(),
        };
        catalog.load(Locale::En, EN_CATALOG);
        catalog.load(Locale::Hi, HI_CATALOG);
        catalog
    }
}

impl Catalog {
    #[must_use]
    pub fn empty(locale: Locale) -> Self {
        Self {
            locale,
            dictionaries: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_dictionary(mut self, locale: Locale, dictionary: Value) -> Self {
        self.dictionaries.insert(locale, dictionary);
        self
    }

    fn load(&mut self, locale: Locale, source: &str) {
        match serde_json::from_str::<Value>(source) {
            Ok(dictionary) => {
                self.dictionaries.insert(locale, dictionary);
            }
            Err(e) => warn!(locale = locale.as_str(), error = %e, "catalog failed to parse"),
        }
    }

    #[must_use]
    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn set_locale(&mut self, locale: Locale) {
        self.locale = locale;
    }

    fn lookup(&self, key: &str) -> Option<&str> {
        let mut node = self.dictionaries.get(&self.locale)?;
        for segment in key.split('.') {
            node = node.as_object()?.get(segment)?;
        }
        node.as_str()
    }
}

impl Translate for Catalog {
    fn translate(&self, key: &str) -> String {
        self.lookup(key).map_or_else(|| key.to_string(), str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resolves_nested_keys() {
        let catalog = Catalog::default();
        assert_eq!(catalog.translate("track.status.under_review"), "Under Review");
        assert_eq!(catalog.translate("admin.anonymous"), "Anonymous");
    }

    #[test]
    fn missing_key_falls_back_to_key() {
        let catalog = Catalog::default();
        assert_eq!(catalog.translate("track.status.archived"), "track.status.archived");
        assert_eq!(catalog.translate(""), "");
    }

    #[test]
    fn non_leaf_key_falls_back_to_key() {
        let catalog = Catalog::default();
        assert_eq!(catalog.translate("track.status"), "track.status");
    }

    #[test]
    fn switching_locale_changes_text() {
        let mut catalog = Catalog::default();
        catalog.set_locale(Locale::Hi);
        assert_ne!(catalog.translate("admin.anonymous"), "Anonymous");
        assert_ne!(catalog.translate("admin.anonymous"), "admin.anonymous");
    }

    #[test]
    fn locale_without_dictionary_returns_keys() {
        let catalog = Catalog::empty(Locale::Hi)
            .with_dictionary(Locale::En, json!({"a": {"b": "text"}}));
        assert_eq!(catalog.translate("a.b"), "a.b");
    }

    #[test]
    fn interpolation_replaces_every_placeholder() {
        let catalog = Catalog::empty(Locale::En)
            .with_dictionary(Locale::En, json!({"msg": "{n} of {max}, again {n}"}));
        assert_eq!(
            catalog.translate_with("msg", &[("n", "2"), ("max", "5")]),
            "2 of 5, again 2"
        );
    }

    #[test]
    fn closures_are_translators() {
        let upper = |key: &str| key.to_uppercase();
        assert_eq!(upper.translate("abc"), "ABC");
        assert_eq!(upper.translate_with("x{v}", &[("v", "y")]), "X{V}");
    }
}
