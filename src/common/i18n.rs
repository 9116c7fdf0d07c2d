// src/common/i18n.rs

use std::{collections::HashMap, sync::LazyLock};

// Catálogos embutidos no binário: idioma -> (chave -> mensagem)
const CATALOGS: &[(&str, &str)] = &[
    ("en", include_str!("../../locales/en.json")),
    ("pt", include_str!("../../locales/pt.json")),
];

const DEFAULT_LANG: &str = "en";

static FALLBACK: LazyLock<I18nStore> =
    LazyLock::new(|| I18nStore::load_embedded().unwrap_or_default());

#[derive(Debug, Clone, Default)]
pub struct I18nStore {
    messages: HashMap<String, HashMap<String, String>>,
}

impl I18nStore {
    pub fn load_embedded() -> anyhow::Result<Self> {
        let mut messages = HashMap::new();
        for (lang, raw) in CATALOGS {
            let catalog: HashMap<String, String> = serde_json::from_str(raw)
                .map_err(|e| anyhow::anyhow!("Catálogo '{}' inválido: {}", lang, e))?;
            messages.insert(lang.to_string(), catalog);
        }
        Ok(Self { messages })
    }

    /// Instância global usada quando o estado da aplicação não está acessível.
    pub fn fallback() -> &'static I18nStore {
        &FALLBACK
    }

    pub fn supports(&self, lang: &str) -> bool {
        self.messages.contains_key(lang)
    }

    // Idioma pedido -> inglês -> a própria chave
    pub fn translate(&self, lang: &str, key: &str) -> String {
        self.messages
            .get(lang)
            .and_then(|catalog| catalog.get(key))
            .or_else(|| self.messages.get(DEFAULT_LANG).and_then(|c| c.get(key)))
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }

    /// Traduz e substitui `{detail}` pelo detalhe do erro, quando houver.
    pub fn format(&self, lang: &str, key: &str, detail: Option<&str>) -> String {
        let template = self.translate(lang, key);
        match detail {
            Some(detail) => template.replace("{detail}", detail),
            None => template.replace(" ({detail})", "").replace("{detail}", ""),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_key_exists_in_every_catalog() {
        let store = I18nStore::load_embedded().unwrap();
        let en = &store.messages["en"];
        let pt = &store.messages["pt"];
        for key in en.keys() {
            assert!(pt.contains_key(key), "chave ausente em pt: {key}");
        }
        for key in pt.keys() {
            assert!(en.contains_key(key), "chave ausente em en: {key}");
        }
    }

    #[test]
    fn unknown_language_falls_back_to_english() {
        let store = I18nStore::load_embedded().unwrap();
        assert_eq!(
            store.translate("de", "error.invalid_credentials"),
            store.translate("en", "error.invalid_credentials")
        );
        assert!(!store.supports("de"));
    }

    #[test]
    fn unknown_key_is_returned_verbatim() {
        let store = I18nStore::load_embedded().unwrap();
        assert_eq!(store.translate("pt", "validation.nope"), "validation.nope");
    }

    #[test]
    fn detail_is_interpolated() {
        let store = I18nStore::load_embedded().unwrap();
        let msg = store.format("en", "error.not_found", Some("task 42"));
        assert!(msg.contains("task 42"));
        let bare = store.format("en", "error.not_found", None);
        assert!(!bare.contains("{detail}"));
    }
}
