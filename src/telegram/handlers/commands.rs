//! Command and plain-message handlers
//!
//! Plain messages carry the admin conversation steps (password, photo,
//! name, forwarded post) and the reply-keyboard buttons, dispatched off the
//! per-chat session state.

use teloxide::prelude::*;
use teloxide::types::ChatKind;

use super::{admin, helpers, HandlerDeps};
use crate::core::config;
use crate::core::error::AppResult;
use crate::i18n;
use crate::telegram::bot::Command;
use crate::telegram::state::AdminState;
use crate::telegram::{keyboards, subscription};

fn lang_of(msg: &Message) -> unic_langid::LanguageIdentifier {
    i18n::user_lang(msg.from.as_ref().and_then(|u| u.language_code.as_deref()))
}

pub async fn handle_command(bot: &Bot, msg: &Message, cmd: Command, deps: &HandlerDeps) -> AppResult<()> {
    let chat_id = msg.chat.id;
    let lang = lang_of(msg);

    match cmd {
        Command::Start => {
            log::info!("User {} started the bot", chat_id.0);
            helpers::cleanup_tracked(bot, chat_id, deps).await;
            deps.sessions.clear_flow(chat_id.0);

            bot.send_message(chat_id, i18n::t(&lang, "start.welcome"))
                .reply_markup(keyboards::main_menu(&lang))
                .await?;

            // Nudge the admin while no channel is bound yet
            if subscription::bound_channel(&deps.db_pool)?.is_none() {
                bot.send_message(chat_id, i18n::t(&lang, "channel.not_bound_hint")).await?;
            }
        }
        Command::Admin => {
            if !matches!(msg.chat.kind, ChatKind::Private(_)) {
                bot.send_message(chat_id, i18n::t(&lang, "admin.private_only")).await?;
                return Ok(());
            }
            if config::admin::ADMIN_PASSWORD.is_empty() {
                bot.send_message(chat_id, i18n::t(&lang, "admin.disabled")).await?;
                return Ok(());
            }
            deps.sessions
                .update(chat_id.0, |s| s.admin_state = Some(AdminState::AwaitingPassword));
            bot.send_message(chat_id, i18n::t(&lang, "admin.enter_password")).await?;
        }
        Command::SetChannelId(arg) => {
            if !deps.sessions.get(chat_id.0).admin_authorized {
                bot.send_message(chat_id, i18n::t(&lang, "admin.enter_password")).await?;
                return Ok(());
            }
            let arg = arg.trim();
            if arg.is_empty() {
                bot.send_message(chat_id, i18n::t(&lang, "channel.usage")).await?;
                return Ok(());
            }
            let Ok(raw_id) = arg.parse::<i64>() else {
                bot.send_message(chat_id, i18n::t(&lang, "channel.bad_id")).await?;
                return Ok(());
            };
            admin::bind_and_report(bot, chat_id, deps, &lang, ChatId(raw_id), None).await?;
        }
    }
    Ok(())
}

pub async fn handle_message(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> AppResult<()> {
    let chat_id = msg.chat.id;
    let lang = lang_of(msg);
    let session = deps.sessions.get(chat_id.0);

    // Admin conversation steps take priority over everything else
    match session.admin_state {
        Some(AdminState::AwaitingPassword) => {
            return admin::check_password(bot, msg, deps, &lang).await;
        }
        Some(AdminState::AwaitingPhoto { category }) => {
            return admin::accept_photo(bot, msg, deps, &lang, category).await;
        }
        Some(AdminState::AwaitingName { category, photo_ref }) => {
            return admin::accept_name(bot, msg, deps, &lang, category, &photo_ref).await;
        }
        Some(AdminState::AwaitingChannelForward) => {
            return admin::bind_from_forward(bot, msg, deps, &lang).await;
        }
        _ => {}
    }

    let Some(text) = msg.text() else {
        return Ok(());
    };

    if i18n::matches_any_locale(text, "menu.home_button") {
        helpers::cleanup_tracked(bot, chat_id, deps).await;
        deps.sessions.clear_flow(chat_id.0);
        bot.send_message(chat_id, i18n::t(&lang, "start.choose_category"))
            .reply_markup(keyboards::main_menu(&lang))
            .await?;
        return Ok(());
    }

    if i18n::matches_any_locale(text, "menu.rating_button") {
        deps.sessions.update(chat_id.0, |s| s.rating_mode = true);
        bot.send_message(chat_id, i18n::t(&lang, "rating.choose_category"))
            .reply_markup(keyboards::category_select(&lang))
            .await?;
        return Ok(());
    }

    if i18n::matches_any_locale(text, "menu.vote_button") {
        let Some(category) = session.category else {
            bot.send_message(chat_id, i18n::t(&lang, "vote.choose_category_first")).await?;
            return Ok(());
        };
        let user_id = msg.from.as_ref().map(|u| u.id.0 as i64).unwrap_or(chat_id.0);
        return helpers::show_vote_flow(bot, chat_id, user_id, deps, &lang, category).await;
    }

    if session.admin_authorized && i18n::matches_any_locale(text, "admin.kb_add_button") {
        deps.sessions
            .update(chat_id.0, |s| s.admin_state = Some(AdminState::ChoosingCategoryForAdd));
        bot.send_message(chat_id, i18n::t(&lang, "admin.add_category_prompt"))
            .reply_markup(keyboards::admin_categories(&lang, "addcat", "cancel:add"))
            .await?;
        return Ok(());
    }

    if session.admin_authorized && i18n::matches_any_locale(text, "admin.kb_delete_button") {
        deps.sessions
            .update(chat_id.0, |s| s.admin_state = Some(AdminState::ChoosingCategoryForDelete));
        bot.send_message(chat_id, i18n::t(&lang, "admin.delete_category_prompt"))
            .reply_markup(keyboards::admin_categories(&lang, "delcat", "cancel:delete"))
            .await?;
        return Ok(());
    }

    log::info!("Ignoring message from {}: {:?}", chat_id.0, text);
    Ok(())
}
