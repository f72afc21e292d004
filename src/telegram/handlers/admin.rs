//! Admin panel handlers
//!
//! Password gate, the add/delete contestant conversations, contest
//! statistics and channel binding. Everything here assumes the
//! authorization check already happened (password for messages, the
//! session flag for callbacks) and delegates the actual record work to
//! `voting::curation`.

use fluent_templates::fluent_bundle::FluentArgs;
use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::{MessageId, MessageOrigin};
use unic_langid::LanguageIdentifier;

use super::{helpers, HandlerDeps};
use crate::core::config;
use crate::core::error::{AppError, AppResult};
use crate::i18n;
use crate::storage::db::{self, ContestStats};
use crate::storage::blob::{photo_key, BlobStore};
use crate::telegram::state::AdminState;
use crate::telegram::{keyboards, subscription};
use crate::voting::{curation, query, Category};

/// Password message in the `AwaitingPassword` state.
pub async fn check_password(bot: &Bot, msg: &Message, deps: &HandlerDeps, lang: &LanguageIdentifier) -> AppResult<()> {
    let chat_id = msg.chat.id;
    if config::admin::password_matches(msg.text().unwrap_or("")) {
        deps.sessions.update(chat_id.0, |s| {
            s.admin_authorized = true;
            s.admin_state = None;
        });
        log::info!("Admin {} entered the panel", chat_id.0);
        bot.send_message(chat_id, i18n::t(lang, "admin.access_granted"))
            .reply_markup(keyboards::admin_reply_keyboard(lang))
            .await?;
        bot.send_message(chat_id, i18n::t(lang, "admin.panel_title"))
            .reply_markup(keyboards::admin_menu(lang))
            .await?;
    } else {
        deps.sessions.update(chat_id.0, |s| s.admin_state = None);
        log::warn!("Failed admin login attempt from {}", chat_id.0);
        bot.send_message(chat_id, i18n::t(lang, "admin.wrong_password")).await?;
    }
    Ok(())
}

/// Photo message in the `AwaitingPhoto` state: download it into the blob
/// store and advance to the name step.
pub async fn accept_photo(
    bot: &Bot,
    msg: &Message,
    deps: &HandlerDeps,
    lang: &LanguageIdentifier,
    category: Category,
) -> AppResult<()> {
    let chat_id = msg.chat.id;
    let Some(photo) = msg.photo().and_then(|sizes| sizes.last()) else {
        bot.send_message(chat_id, i18n::t(lang, "admin.photo_invalid"))
            .reply_markup(keyboards::cancel_add(lang))
            .await?;
        return Ok(());
    };

    match store_photo(bot, msg, deps, photo).await {
        Ok(photo_ref) => {
            log::info!("Photo stored: {}", photo_ref);
            deps.sessions.update(chat_id.0, |s| {
                s.admin_state = Some(AdminState::AwaitingName { category, photo_ref });
            });
            bot.send_message(chat_id, i18n::t(lang, "admin.send_name"))
                .reply_markup(keyboards::cancel_add(lang))
                .await?;
        }
        Err(e) => {
            log::error!("Failed to store photo: {}", e);
            bot.send_message(chat_id, i18n::t(lang, "admin.photo_failed"))
                .reply_markup(keyboards::cancel_add(lang))
                .await?;
        }
    }
    Ok(())
}

async fn store_photo(
    bot: &Bot,
    msg: &Message,
    deps: &HandlerDeps,
    photo: &teloxide::types::PhotoSize,
) -> AppResult<String> {
    let file = bot.get_file(photo.file.id.clone()).await?;

    let extension = file
        .path
        .rsplit('.')
        .next()
        .filter(|ext| !ext.contains('/') && !ext.is_empty())
        .unwrap_or("jpg");

    let mut bytes: Vec<u8> = Vec::new();
    bot.download_file(&file.path, &mut bytes)
        .await
        .map_err(|e| AppError::Download(e.to_string()))?;

    let uploader = msg.from.as_ref().map(|u| u.id.0 as i64).unwrap_or(msg.chat.id.0);
    let key = photo_key(uploader, extension);
    deps.blob.store(&key, &bytes)?;
    Ok(key)
}

/// Name message in the `AwaitingName` state: create the record.
pub async fn accept_name(
    bot: &Bot,
    msg: &Message,
    deps: &HandlerDeps,
    lang: &LanguageIdentifier,
    category: Category,
    photo_ref: &str,
) -> AppResult<()> {
    let chat_id = msg.chat.id;
    let name = msg.text().map(str::trim).unwrap_or("");
    if name.is_empty() {
        bot.send_message(chat_id, i18n::t(lang, "admin.name_invalid"))
            .reply_markup(keyboards::cancel_add(lang))
            .await?;
        return Ok(());
    }

    match curation::add_contestant(&deps.db_pool, name, category, photo_ref) {
        Ok(_) => {
            deps.sessions.update(chat_id.0, |s| s.admin_state = None);
            let mut args = FluentArgs::new();
            args.set("name", name.to_string());
            args.set("category", category.name(lang));
            bot.send_message(chat_id, i18n::t_args(lang, "admin.added", &args))
                .reply_markup(keyboards::admin_menu(lang))
                .await?;
        }
        Err(AppError::Validation(reason)) => {
            log::warn!("Contestant name rejected: {}", reason);
            bot.send_message(chat_id, i18n::t(lang, "admin.name_invalid"))
                .reply_markup(keyboards::cancel_add(lang))
                .await?;
        }
        Err(e) => {
            log::error!("Failed to add contestant: {}", e);
            deps.sessions.update(chat_id.0, |s| s.admin_state = None);
            bot.send_message(chat_id, i18n::t(lang, "admin.error")).await?;
        }
    }
    Ok(())
}

/// Forwarded message in the `AwaitingChannelForward` state.
pub async fn bind_from_forward(
    bot: &Bot,
    msg: &Message,
    deps: &HandlerDeps,
    lang: &LanguageIdentifier,
) -> AppResult<()> {
    let chat_id = msg.chat.id;
    let Some(MessageOrigin::Channel { chat, .. }) = msg.forward_origin() else {
        bot.send_message(chat_id, i18n::t(lang, "channel.bind_detect_failed"))
            .reply_markup(keyboards::admin_menu(lang))
            .await?;
        return Ok(());
    };

    let channel_id = chat.id;
    let username = chat.username().map(|u| u.to_string());
    deps.sessions.update(chat_id.0, |s| s.admin_state = None);
    bind_and_report(bot, chat_id, deps, lang, channel_id, username.as_deref()).await
}

/// Binds the channel and reports the outcome (with the resolved link) back
/// to the admin. Shared by the forward flow and /set_channel_id.
pub async fn bind_and_report(
    bot: &Bot,
    chat_id: ChatId,
    deps: &HandlerDeps,
    lang: &LanguageIdentifier,
    channel: ChatId,
    username: Option<&str>,
) -> AppResult<()> {
    match subscription::bind_channel(bot, &deps.db_pool, channel, username).await {
        Ok(link) => {
            let mut args = FluentArgs::new();
            args.set("id", channel.0.to_string());
            let mut text = i18n::t_args(lang, "channel.bound", &args);
            text.push('\n');
            match link {
                Some(link) => {
                    let mut link_args = FluentArgs::new();
                    link_args.set("link", link);
                    text.push_str(&i18n::t_args(lang, "channel.bound_link", &link_args));
                }
                None => text.push_str(&i18n::t(lang, "channel.bound_no_link")),
            }
            bot.send_message(chat_id, text)
                .reply_markup(keyboards::admin_menu(lang))
                .await?;
        }
        Err(e) => {
            log::error!("Failed to bind channel {}: {}", channel.0, e);
            bot.send_message(chat_id, i18n::t(lang, "channel.save_failed")).await?;
        }
    }
    Ok(())
}

/// Router for the admin-panel callback vocabulary.
pub async fn handle_admin_callback(
    bot: &Bot,
    q: &CallbackQuery,
    chat_id: ChatId,
    message_id: Option<MessageId>,
    data: &str,
    deps: &HandlerDeps,
    lang: &LanguageIdentifier,
) -> AppResult<()> {
    bot.answer_callback_query(q.id.clone()).await?;

    if !deps.sessions.get(chat_id.0).admin_authorized {
        log::warn!("Unauthorized admin callback {:?} from chat {}", data, chat_id.0);
        return Ok(());
    }

    match data {
        "admin:back" => {
            deps.sessions.update(chat_id.0, |s| s.admin_state = None);
            helpers::edit_or_send(
                bot,
                chat_id,
                message_id,
                &i18n::t(lang, "admin.panel_title"),
                keyboards::admin_menu(lang),
            )
            .await?;
        }
        "admin:add" => {
            deps.sessions
                .update(chat_id.0, |s| s.admin_state = Some(AdminState::ChoosingCategoryForAdd));
            helpers::edit_or_send(
                bot,
                chat_id,
                message_id,
                &i18n::t(lang, "admin.add_category_prompt"),
                keyboards::admin_categories(lang, "addcat", "cancel:add"),
            )
            .await?;
        }
        "admin:delete" => {
            deps.sessions
                .update(chat_id.0, |s| s.admin_state = Some(AdminState::ChoosingCategoryForDelete));
            helpers::edit_or_send(
                bot,
                chat_id,
                message_id,
                &i18n::t(lang, "admin.delete_category_prompt"),
                keyboards::admin_categories(lang, "delcat", "cancel:delete"),
            )
            .await?;
        }
        "admin:stats" => {
            let conn = db::get_connection(&deps.db_pool)?;
            match db::contest_stats(&conn) {
                Ok(stats) => {
                    helpers::edit_or_send(
                        bot,
                        chat_id,
                        message_id,
                        &stats_text(lang, &stats),
                        keyboards::admin_back(lang),
                    )
                    .await?;
                }
                Err(e) => {
                    log::error!("Failed to load contest stats: {}", e);
                    helpers::edit_or_send(
                        bot,
                        chat_id,
                        message_id,
                        &i18n::t(lang, "stats.failed"),
                        keyboards::admin_back(lang),
                    )
                    .await?;
                }
            }
        }
        "admin:bind" => {
            deps.sessions
                .update(chat_id.0, |s| s.admin_state = Some(AdminState::AwaitingChannelForward));
            helpers::edit_or_send(
                bot,
                chat_id,
                message_id,
                &i18n::t(lang, "channel.bind_prompt"),
                keyboards::admin_back(lang),
            )
            .await?;
        }
        "cancel:add" => {
            deps.sessions.update(chat_id.0, |s| s.admin_state = None);
            log::info!("Admin {} cancelled adding a contestant", chat_id.0);
            helpers::edit_or_send(
                bot,
                chat_id,
                message_id,
                &i18n::t(lang, "admin.add_cancelled"),
                keyboards::admin_menu(lang),
            )
            .await?;
        }
        "cancel:delete" => {
            deps.sessions.update(chat_id.0, |s| s.admin_state = None);
            log::info!("Admin {} cancelled deletion", chat_id.0);
            helpers::edit_or_send(
                bot,
                chat_id,
                message_id,
                &i18n::t(lang, "admin.delete_cancelled"),
                keyboards::admin_menu(lang),
            )
            .await?;
        }
        _ if data.starts_with("addcat:") => {
            let Some(category) = parse_category(data, "addcat:") else {
                return Ok(());
            };
            deps.sessions
                .update(chat_id.0, |s| s.admin_state = Some(AdminState::AwaitingPhoto { category }));
            helpers::edit_or_send(
                bot,
                chat_id,
                message_id,
                &i18n::t(lang, "admin.send_photo"),
                keyboards::cancel_add(lang),
            )
            .await?;
        }
        _ if data.starts_with("delcat:") => {
            let Some(category) = parse_category(data, "delcat:") else {
                return Ok(());
            };
            show_delete_page(bot, chat_id, message_id, deps, lang, category, 0).await?;
        }
        _ if data.starts_with("delpage:") => {
            let mut parts = data.splitn(3, ':').skip(1);
            let category = parts.next().and_then(|s| s.parse().ok()).and_then(Category::from_id);
            let page = parts.next().and_then(|s| s.parse::<i64>().ok());
            let (Some(category), Some(page)) = (category, page) else {
                log::warn!("Malformed pagination callback {:?}", data);
                return Ok(());
            };
            show_delete_page(bot, chat_id, message_id, deps, lang, category, page.max(0)).await?;
        }
        _ if data.starts_with("confirm_del:") => {
            let Some(id) = data.strip_prefix("confirm_del:").and_then(|s| s.parse::<i64>().ok()) else {
                return Ok(());
            };
            helpers::edit_or_send(
                bot,
                chat_id,
                message_id,
                &i18n::t(lang, "admin.delete_confirm"),
                keyboards::confirm_delete(lang, id),
            )
            .await?;
        }
        _ if data.starts_with("do_del:") => {
            let Some(id) = data.strip_prefix("do_del:").and_then(|s| s.parse::<i64>().ok()) else {
                return Ok(());
            };
            deps.sessions.update(chat_id.0, |s| s.admin_state = None);
            let key = if curation::remove_contestant(&deps.db_pool, deps.blob.as_ref(), id)? {
                "admin.deleted"
            } else {
                "admin.delete_failed"
            };
            helpers::edit_or_send(bot, chat_id, message_id, &i18n::t(lang, key), keyboards::admin_menu(lang)).await?;
        }
        _ => {
            log::warn!("Unknown admin callback data {:?}", data);
        }
    }
    Ok(())
}

fn parse_category(data: &str, prefix: &str) -> Option<Category> {
    let category = data.strip_prefix(prefix).and_then(|s| s.parse().ok()).and_then(Category::from_id);
    if category.is_none() {
        log::warn!("Unknown category in callback data {:?}", data);
    }
    category
}

/// One page of the delete flow. An empty category still renders as
/// "page 1/1" with just the cancel button.
async fn show_delete_page(
    bot: &Bot,
    chat_id: ChatId,
    message_id: Option<MessageId>,
    deps: &HandlerDeps,
    lang: &LanguageIdentifier,
    category: Category,
    page: i64,
) -> AppResult<()> {
    let page_size = config::voting::PAGE_SIZE;
    let contestants = query::page(&deps.db_pool, category, page as usize, page_size)?;
    let total = query::count(&deps.db_pool, category)?;
    let pages = query::total_pages(total, page_size);

    let mut args = FluentArgs::new();
    args.set("category", category.name(lang));
    args.set("page", page + 1);
    args.set("pages", pages);
    helpers::edit_or_send(
        bot,
        chat_id,
        message_id,
        &i18n::t_args(lang, "admin.delete_page_title", &args),
        keyboards::delete_page(lang, category, page, pages, &contestants),
    )
    .await
}

/// Renders the statistics panel text.
fn stats_text(lang: &LanguageIdentifier, stats: &ContestStats) -> String {
    let mut text = i18n::t(lang, "stats.header");
    text.push_str("\n\n");

    let mut args = FluentArgs::new();
    args.set("n", stats.total_contestants);
    text.push_str(&i18n::t_args(lang, "stats.total_contestants", &args));
    text.push('\n');

    let mut args = FluentArgs::new();
    args.set("n", stats.total_votes);
    text.push_str(&i18n::t_args(lang, "stats.total_votes", &args));

    if !stats.per_category.is_empty() {
        text.push_str("\n\n");
        text.push_str(&i18n::t(lang, "stats.by_category"));
        for (category, count) in &stats.per_category {
            let mut args = FluentArgs::new();
            args.set("category", category.name(lang));
            args.set("n", *count);
            text.push('\n');
            text.push_str(&i18n::t_args(lang, "stats.category_line", &args));
        }
    }

    if !stats.top.is_empty() {
        text.push_str("\n\n");
        text.push_str(&i18n::t(lang, "stats.top_header"));
        for (idx, (name, votes, category)) in stats.top.iter().enumerate() {
            let mut args = FluentArgs::new();
            args.set("idx", (idx + 1) as i64);
            args.set("name", name.clone());
            args.set("category", category.name(lang));
            args.set("votes", *votes);
            text.push('\n');
            text.push_str(&i18n::t_args(lang, "stats.top_line", &args));
        }
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_text_lists_all_sections() {
        let lang = i18n::lang_from_code("en");
        let stats = ContestStats {
            total_contestants: 4,
            total_votes: 7,
            per_category: vec![(Category::Weekly, 3), (Category::Monthly, 1)],
            top: vec![("Alice".to_string(), 5, Category::Weekly)],
        };

        let text = stats_text(&lang, &stats);
        assert!(text.contains("Total contestants: 4"));
        assert!(text.contains("Total votes: 7"));
        assert!(text.contains("Weekly nomination: 3"));
        assert!(text.contains("Alice"));
    }

    #[test]
    fn stats_text_skips_empty_sections() {
        let lang = i18n::lang_from_code("en");
        let stats = ContestStats {
            total_contestants: 0,
            total_votes: 0,
            per_category: vec![],
            top: vec![],
        };

        let text = stats_text(&lang, &stats);
        assert!(!text.contains("Top-5"));
        assert!(!text.contains("By category"));
    }

    #[test]
    fn parse_category_handles_garbage() {
        assert_eq!(parse_category("addcat:1", "addcat:"), Some(Category::Weekly));
        assert_eq!(parse_category("addcat:99", "addcat:"), None);
        assert_eq!(parse_category("addcat:x", "addcat:"), None);
    }
}
