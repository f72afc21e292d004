//! Callback query router for the user-facing flows
//!
//! Callback data format is `prefix:arg` (see `keyboards`). Admin-panel
//! callbacks are delegated to `handlers::admin`.

use teloxide::prelude::*;
use teloxide::types::MessageId;
use unic_langid::LanguageIdentifier;

use super::{admin, helpers, HandlerDeps};
use crate::core::error::AppResult;
use crate::i18n;
use crate::storage::db;
use crate::telegram::{keyboards, subscription};
use crate::voting::{tally, Category, VoteError};

pub async fn handle_callback(bot: &Bot, q: &CallbackQuery, deps: &HandlerDeps) -> AppResult<()> {
    let Some(data) = q.data.clone() else {
        bot.answer_callback_query(q.id.clone()).await?;
        return Ok(());
    };
    let chat_id = q.message.as_ref().map(|m| m.chat().id);
    let message_id = q.message.as_ref().map(|m| m.id());
    let Some(chat_id) = chat_id else {
        bot.answer_callback_query(q.id.clone()).await?;
        return Ok(());
    };

    let lang = i18n::user_lang(q.from.language_code.as_deref());
    let user_id = q.from.id.0 as i64;

    // Admin-panel vocabulary goes through the authorization check in one place
    if data.starts_with("admin:")
        || data.starts_with("addcat:")
        || data.starts_with("delcat:")
        || data.starts_with("delpage:")
        || data.starts_with("confirm_del:")
        || data.starts_with("do_del:")
        || data.starts_with("cancel:")
    {
        return admin::handle_admin_callback(bot, q, chat_id, message_id, &data, deps, &lang).await;
    }

    match data.as_str() {
        "check_sub" => {
            bot.answer_callback_query(q.id.clone()).await?;
            check_subscription(bot, chat_id, message_id, user_id, deps, &lang).await?;
        }
        "rating" => {
            bot.answer_callback_query(q.id.clone()).await?;
            match deps.sessions.get(chat_id.0).category {
                Some(category) => helpers::show_rating(bot, chat_id, deps, &lang, category).await?,
                None => {
                    helpers::edit_or_send(
                        bot,
                        chat_id,
                        message_id,
                        &i18n::t(&lang, "start.choose_category"),
                        keyboards::main_menu(&lang),
                    )
                    .await?;
                }
            }
        }
        "vote" => {
            bot.answer_callback_query(q.id.clone()).await?;
            match deps.sessions.get(chat_id.0).category {
                Some(category) => {
                    helpers::show_vote_flow(bot, chat_id, user_id, deps, &lang, category).await?;
                }
                None => {
                    deps.sessions.clear_flow(chat_id.0);
                    helpers::edit_or_send(
                        bot,
                        chat_id,
                        message_id,
                        &i18n::t(&lang, "vote.session_expired"),
                        keyboards::main_menu(&lang),
                    )
                    .await?;
                }
            }
        }
        "unvote" => {
            bot.answer_callback_query(q.id.clone()).await?;
            retract_vote(bot, chat_id, message_id, user_id, deps, &lang).await?;
        }
        "back:start" => {
            bot.answer_callback_query(q.id.clone()).await?;
            helpers::cleanup_tracked(bot, chat_id, deps).await;
            deps.sessions.clear_flow(chat_id.0);
            helpers::edit_or_send(
                bot,
                chat_id,
                message_id,
                &i18n::t(&lang, "start.choose_category"),
                keyboards::main_menu(&lang),
            )
            .await?;
        }
        "back:category" => {
            bot.answer_callback_query(q.id.clone()).await?;
            helpers::cleanup_tracked(bot, chat_id, deps).await;
            match deps.sessions.get(chat_id.0).category {
                Some(category) => {
                    let mut args = fluent_templates::fluent_bundle::FluentArgs::new();
                    args.set("category", category.name(&lang));
                    helpers::edit_or_send(
                        bot,
                        chat_id,
                        message_id,
                        &i18n::t_args(&lang, "menu.category_prompt", &args),
                        keyboards::category_menu(&lang),
                    )
                    .await?;
                }
                None => {
                    deps.sessions.clear_flow(chat_id.0);
                    helpers::edit_or_send(
                        bot,
                        chat_id,
                        message_id,
                        &i18n::t(&lang, "start.choose_category"),
                        keyboards::main_menu(&lang),
                    )
                    .await?;
                }
            }
        }
        _ if data.starts_with("cat:") => {
            bot.answer_callback_query(q.id.clone()).await?;
            let category = data.strip_prefix("cat:").and_then(|s| s.parse().ok()).and_then(Category::from_id);
            let Some(category) = category else {
                log::warn!("Unknown category in callback data {:?}", data);
                return Ok(());
            };
            category_selected(bot, chat_id, message_id, deps, &lang, category).await?;
        }
        _ if data.starts_with("vote_for:") => {
            let contestant_id = data.strip_prefix("vote_for:").and_then(|s| s.parse::<i64>().ok());
            let Some(contestant_id) = contestant_id else {
                bot.answer_callback_query(q.id.clone()).await?;
                return Ok(());
            };
            vote_for(bot, q, chat_id, message_id, user_id, contestant_id, deps, &lang).await?;
        }
        _ => {
            log::warn!("Unknown callback data {:?}", data);
            bot.answer_callback_query(q.id.clone()).await?;
        }
    }
    Ok(())
}

/// The subscription gate in front of the category menu.
async fn check_subscription(
    bot: &Bot,
    chat_id: ChatId,
    message_id: Option<MessageId>,
    user_id: i64,
    deps: &HandlerDeps,
    lang: &LanguageIdentifier,
) -> AppResult<()> {
    let Some(channel) = subscription::bound_channel(&deps.db_pool)? else {
        helpers::edit_or_send(
            bot,
            chat_id,
            message_id,
            &i18n::t(lang, "channel.not_bound"),
            keyboards::main_menu(lang),
        )
        .await?;
        return Ok(());
    };

    let subscribed = match subscription::is_subscribed(bot, channel, teloxide::types::UserId(user_id as u64)).await {
        Ok(subscribed) => subscribed,
        Err(e) => {
            // Bot not an admin in the channel, or the channel is gone
            log::error!("Subscription check failed for user {}: {}", user_id, e);
            false
        }
    };

    if subscribed {
        helpers::edit_or_send(
            bot,
            chat_id,
            message_id,
            &i18n::t(lang, "channel.subscribed"),
            keyboards::category_select(lang),
        )
        .await?;
    } else {
        let link = subscription::bound_channel_link(&deps.db_pool);
        helpers::edit_or_send(
            bot,
            chat_id,
            message_id,
            &i18n::t(lang, "channel.not_subscribed"),
            keyboards::subscribe_prompt(lang, link.as_deref()),
        )
        .await?;
    }
    Ok(())
}

/// A category was picked: either open its rating (rating mode) or its menu.
async fn category_selected(
    bot: &Bot,
    chat_id: ChatId,
    message_id: Option<MessageId>,
    deps: &HandlerDeps,
    lang: &LanguageIdentifier,
    category: Category,
) -> AppResult<()> {
    let rating_mode = deps.sessions.get(chat_id.0).rating_mode;
    if rating_mode {
        deps.sessions.update(chat_id.0, |s| s.rating_mode = false);
        return helpers::show_rating(bot, chat_id, deps, lang, category).await;
    }

    deps.sessions.update(chat_id.0, |s| s.category = Some(category));
    let mut args = fluent_templates::fluent_bundle::FluentArgs::new();
    args.set("category", category.name(lang));
    helpers::edit_or_send(
        bot,
        chat_id,
        message_id,
        &i18n::t_args(lang, "menu.category_prompt", &args),
        keyboards::category_menu(lang),
    )
    .await
}

#[allow(clippy::too_many_arguments)]
async fn vote_for(
    bot: &Bot,
    q: &CallbackQuery,
    chat_id: ChatId,
    message_id: Option<MessageId>,
    user_id: i64,
    contestant_id: i64,
    deps: &HandlerDeps,
    lang: &LanguageIdentifier,
) -> AppResult<()> {
    match tally::cast_vote(&deps.db_pool, user_id, contestant_id) {
        Ok(()) => {
            bot.answer_callback_query(q.id.clone()).await?;

            // Drop the gallery and the button message before confirming
            helpers::cleanup_tracked(bot, chat_id, deps).await;

            let conn = db::get_connection(&deps.db_pool)?;
            let name = db::get_contestant(&conn, contestant_id)?
                .map(|c| c.name)
                .unwrap_or_default();
            let mut args = fluent_templates::fluent_bundle::FluentArgs::new();
            args.set("name", name);
            bot.send_message(chat_id, i18n::t_args(lang, "vote.success", &args))
                .reply_markup(keyboards::cancel_vote(lang))
                .await?;
        }
        Err(VoteError::AlreadyVoted) => {
            bot.answer_callback_query(q.id.clone())
                .text(i18n::t(lang, "vote.already_alert"))
                .show_alert(true)
                .await?;
        }
        Err(VoteError::ContestantNotFound(_)) => {
            bot.answer_callback_query(q.id.clone()).await?;
            helpers::edit_or_send(
                bot,
                chat_id,
                message_id,
                &i18n::t(lang, "vote.contestant_gone"),
                keyboards::back_to_category(lang),
            )
            .await?;
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

async fn retract_vote(
    bot: &Bot,
    chat_id: ChatId,
    message_id: Option<MessageId>,
    user_id: i64,
    deps: &HandlerDeps,
    lang: &LanguageIdentifier,
) -> AppResult<()> {
    match tally::retract_vote(&deps.db_pool, user_id) {
        Ok(()) => {
            bot.send_message(chat_id, i18n::t(lang, "vote.retracted"))
                .reply_markup(keyboards::category_menu(lang))
                .await?;
            if let Some(message_id) = message_id {
                if let Err(e) = bot.delete_message(chat_id, message_id).await {
                    log::warn!("Failed to delete message after unvote: {}", e);
                }
            }
        }
        Err(VoteError::NotVoted) => {
            helpers::edit_or_send(
                bot,
                chat_id,
                message_id,
                &i18n::t(lang, "vote.retract_failed"),
                keyboards::back_to_category(lang),
            )
            .await?;
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}
