use strum::{EnumIter, IntoEnumIterator};
use unic_langid::LanguageIdentifier;

use crate::i18n;

/// Voting categories (nominations) of the contest.
///
/// Stored in the database by numeric id; ids are part of the persisted data
/// and of callback payloads, so variants keep their ids forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum Category {
    /// Недельная номинация
    Weekly,
    /// Месячная номинация
    Monthly,
}

impl Category {
    /// Numeric id used in the database and in callback data.
    pub fn id(self) -> i64 {
        match self {
            Category::Weekly => 1,
            Category::Monthly => 2,
        }
    }

    /// Resolves a persisted numeric id back to a category.
    pub fn from_id(id: i64) -> Option<Self> {
        Category::iter().find(|c| c.id() == id)
    }

    /// All categories in menu order.
    pub fn all() -> impl Iterator<Item = Category> {
        Category::iter()
    }

    fn i18n_key(self) -> &'static str {
        match self {
            Category::Weekly => "category.weekly",
            Category::Monthly => "category.monthly",
        }
    }

    /// Localized display name.
    pub fn name(self, lang: &LanguageIdentifier) -> String {
        i18n::t(lang, self.i18n_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_roundtrip() {
        for category in Category::all() {
            assert_eq!(Category::from_id(category.id()), Some(category));
        }
    }

    #[test]
    fn unknown_id_is_none() {
        assert_eq!(Category::from_id(0), None);
        assert_eq!(Category::from_id(99), None);
    }

    #[test]
    fn names_are_localized() {
        let ru = i18n::lang_from_code("ru");
        let en = i18n::lang_from_code("en");
        assert_eq!(Category::Weekly.name(&ru), "Недельная номинация");
        assert_eq!(Category::Weekly.name(&en), "Weekly nomination");
    }
}
