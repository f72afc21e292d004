//! Inline and reply keyboard builders
//!
//! Callback data uses the `prefix:arg` format; the router in
//! `handlers::callbacks` is the other side of this vocabulary.

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup};
use unic_langid::LanguageIdentifier;

use super::cb;
use crate::i18n;
use crate::storage::db::Contestant;
use crate::voting::Category;

/// Main menu: the single "vote" entry point that runs the subscription gate.
pub fn main_menu(lang: &LanguageIdentifier) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![cb(i18n::t(lang, "menu.vote_button"), "check_sub")]])
}

/// One button per category.
pub fn category_select(lang: &LanguageIdentifier) -> InlineKeyboardMarkup {
    let rows: Vec<Vec<InlineKeyboardButton>> = Category::all()
        .map(|c| vec![cb(c.name(lang), format!("cat:{}", c.id()))])
        .collect();
    InlineKeyboardMarkup::new(rows)
}

/// Per-category menu: rating, vote, back to start.
pub fn category_menu(lang: &LanguageIdentifier) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![cb(i18n::t(lang, "menu.rating_button"), "rating")],
        vec![cb(i18n::t(lang, "menu.vote_button"), "vote")],
        vec![cb(i18n::t(lang, "menu.back_button"), "back:start")],
    ])
}

pub fn back_to_category(lang: &LanguageIdentifier) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![cb(i18n::t(lang, "menu.back_button"), "back:category")]])
}

/// Shown to a user who already has a live vote.
pub fn cancel_vote(lang: &LanguageIdentifier) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![cb(i18n::t(lang, "vote.unvote_button"), "unvote")],
        vec![cb(i18n::t(lang, "menu.back_button"), "back:category")],
    ])
}

/// One vote button per contestant plus a back row.
pub fn vote_keyboard(lang: &LanguageIdentifier, contestants: &[Contestant]) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = contestants
        .iter()
        .map(|c| vec![cb(format!("🗳️ {}", c.name), format!("vote_for:{}", c.id))])
        .collect();
    rows.push(vec![cb(i18n::t(lang, "menu.back_button"), "back:category")]);
    InlineKeyboardMarkup::new(rows)
}

/// Admin panel entry menu.
pub fn admin_menu(lang: &LanguageIdentifier) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![cb(i18n::t(lang, "admin.add_button"), "admin:add")],
        vec![cb(i18n::t(lang, "admin.delete_button"), "admin:delete")],
        vec![cb(i18n::t(lang, "admin.stats_button"), "admin:stats")],
        vec![cb(i18n::t(lang, "admin.bind_button"), "admin:bind")],
        vec![cb(i18n::t(lang, "menu.back_button"), "back:start")],
    ])
}

/// Category pick inside an admin flow; `action` is `addcat` or `delcat`,
/// `cancel_data` the matching cancel callback.
pub fn admin_categories(lang: &LanguageIdentifier, action: &str, cancel_data: &str) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = Category::all()
        .map(|c| vec![cb(c.name(lang), format!("{}:{}", action, c.id()))])
        .collect();
    rows.push(vec![cb(i18n::t(lang, "admin.cancel_button"), cancel_data.to_string())]);
    rows.push(vec![cb(i18n::t(lang, "menu.back_to_admin_button"), "admin:back")]);
    InlineKeyboardMarkup::new(rows)
}

/// Cancel/return keyboard for the add-contestant conversation.
pub fn cancel_add(lang: &LanguageIdentifier) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![cb(i18n::t(lang, "admin.cancel_add_button"), "cancel:add")],
        vec![cb(i18n::t(lang, "menu.back_to_admin_button"), "admin:back")],
    ])
}

/// One page of the delete flow: a delete button per contestant, pagination
/// arrows when there is more than one page, and a cancel row.
pub fn delete_page(
    lang: &LanguageIdentifier,
    category: Category,
    page: i64,
    pages: i64,
    contestants: &[Contestant],
) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = contestants
        .iter()
        .map(|c| vec![cb(format!("❌ {}", c.name), format!("confirm_del:{}", c.id))])
        .collect();

    let mut pagination = Vec::new();
    if page > 0 {
        pagination.push(cb("⬅️", format!("delpage:{}:{}", category.id(), page - 1)));
    }
    if page < pages - 1 {
        pagination.push(cb("➡️", format!("delpage:{}:{}", category.id(), page + 1)));
    }
    if !pagination.is_empty() {
        rows.push(pagination);
    }

    rows.push(vec![cb(i18n::t(lang, "admin.cancel_button"), "cancel:delete")]);
    InlineKeyboardMarkup::new(rows)
}

/// Yes/no confirmation before an actual delete.
pub fn confirm_delete(lang: &LanguageIdentifier, id: i64) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![cb(i18n::t(lang, "admin.delete_yes_button"), format!("do_del:{}", id))],
        vec![cb(i18n::t(lang, "admin.delete_no_button"), "cancel:delete")],
    ])
}

/// Single "back to admin panel" button.
pub fn admin_back(lang: &LanguageIdentifier) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![cb(i18n::t(lang, "menu.back_to_admin_button"), "admin:back")]])
}

/// "Go to channel" (when a link is known) plus a re-check button.
pub fn subscribe_prompt(lang: &LanguageIdentifier, link: Option<&str>) -> InlineKeyboardMarkup {
    let mut rows = Vec::new();
    if let Some(parsed) = link.and_then(|l| url::Url::parse(l).ok()) {
        rows.push(vec![InlineKeyboardButton::url(i18n::t(lang, "channel.go_button"), parsed)]);
    }
    rows.push(vec![cb(i18n::t(lang, "channel.check_button"), "check_sub")]);
    InlineKeyboardMarkup::new(rows)
}

/// Persistent reply keyboard: home + rating.
pub fn main_reply_keyboard(lang: &LanguageIdentifier) -> KeyboardMarkup {
    KeyboardMarkup::new(vec![vec![
        KeyboardButton::new(i18n::t(lang, "menu.home_button")),
        KeyboardButton::new(i18n::t(lang, "menu.rating_button")),
    ]])
    .resize_keyboard()
}

/// Reply keyboard shown while browsing a category.
pub fn category_reply_keyboard(lang: &LanguageIdentifier) -> KeyboardMarkup {
    KeyboardMarkup::new(vec![
        vec![
            KeyboardButton::new(i18n::t(lang, "menu.rating_button")),
            KeyboardButton::new(i18n::t(lang, "menu.vote_button")),
        ],
        vec![KeyboardButton::new(i18n::t(lang, "menu.home_button"))],
    ])
    .resize_keyboard()
}

/// Reply keyboard for an authorized admin.
pub fn admin_reply_keyboard(lang: &LanguageIdentifier) -> KeyboardMarkup {
    KeyboardMarkup::new(vec![
        vec![
            KeyboardButton::new(i18n::t(lang, "admin.kb_add_button")),
            KeyboardButton::new(i18n::t(lang, "admin.kb_delete_button")),
        ],
        vec![KeyboardButton::new(i18n::t(lang, "menu.home_button"))],
    ])
    .resize_keyboard()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn callback_data(kb: &InlineKeyboardMarkup) -> Vec<String> {
        use teloxide::types::InlineKeyboardButtonKind;
        kb.inline_keyboard
            .iter()
            .flatten()
            .filter_map(|b| match &b.kind {
                InlineKeyboardButtonKind::CallbackData(d) => Some(d.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn category_select_has_one_row_per_category() {
        let lang = crate::i18n::lang_from_code("ru");
        let kb = category_select(&lang);
        assert_eq!(kb.inline_keyboard.len(), Category::all().count());
        assert_eq!(callback_data(&kb), vec!["cat:1", "cat:2"]);
    }

    #[test]
    fn delete_page_pagination_rows() {
        let lang = crate::i18n::lang_from_code("ru");

        // Single page: no arrows
        let kb = delete_page(&lang, Category::Weekly, 0, 1, &[]);
        assert!(!callback_data(&kb).iter().any(|d| d.starts_with("delpage:")));

        // Middle page: both arrows
        let kb = delete_page(&lang, Category::Weekly, 1, 3, &[]);
        let data = callback_data(&kb);
        assert!(data.contains(&"delpage:1:0".to_string()));
        assert!(data.contains(&"delpage:1:2".to_string()));
    }

    #[test]
    fn subscribe_prompt_skips_unparsable_link() {
        let lang = crate::i18n::lang_from_code("ru");
        let kb = subscribe_prompt(&lang, Some("not a url"));
        assert_eq!(kb.inline_keyboard.len(), 1);

        let kb = subscribe_prompt(&lang, Some("https://t.me/channel"));
        assert_eq!(kb.inline_keyboard.len(), 2);
    }
}
