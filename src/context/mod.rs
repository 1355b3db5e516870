use crate::devices::DeviceCatalog;
use crate::errors::ConfigError;
use crate::locale::{Catalog, MessageKey};
use crate::wire::{Direction, Language, Theme};

/// Per-session presentation settings plus the string tables they select.
/// Language and theme change only through the setters below.
#[derive(Debug, Clone)]
pub struct AppContext {
    language: Language,
    theme: Theme,
    ar: Catalog,
    en: Catalog,
    devices: DeviceCatalog,
}

impl AppContext {
    /// Loads and validates every bundled table; fails before any prompt is shown.
    pub fn load(language: Language, theme: Theme) -> Result<Self, ConfigError> {
        Ok(Self {
            language,
            theme,
            ar: Catalog::load(Language::Ar)?,
            en: Catalog::load(Language::En)?,
            devices: DeviceCatalog::load()?,
        })
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn direction(&self) -> Direction {
        self.language.direction()
    }

    pub fn catalog(&self) -> &Catalog {
        self.catalog_for(self.language)
    }

    pub fn catalog_for(&self, language: Language) -> &Catalog {
        match language {
            Language::Ar => &self.ar,
            Language::En => &self.en,
        }
    }

    pub fn devices(&self) -> &DeviceCatalog {
        &self.devices
    }

    pub fn t(&self, key: MessageKey) -> &str {
        self.catalog().text(key)
    }

    pub fn set_language(&mut self, language: Language) {
        self.language = language;
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_follows_language() {
        let mut ctx = AppContext::load(Language::Ar, Theme::Light).unwrap();
        assert_eq!(ctx.t(MessageKey::ButtonBack), "السابق");
        assert_eq!(ctx.direction(), Direction::Rtl);
        ctx.set_language(Language::En);
        assert_eq!(ctx.t(MessageKey::ButtonBack), "Back");
        assert_eq!(ctx.direction(), Direction::Ltr);
        ctx.set_theme(Theme::Dark);
        assert_eq!(ctx.theme(), Theme::Dark);
    }
}
