//! Shared pieces of the user-facing flows
//!
//! The rating and vote screens are reachable both from inline callbacks and
//! from reply-keyboard buttons, so their rendering lives here.

use fluent_templates::fluent_bundle::FluentArgs;
use teloxide::prelude::*;
use teloxide::types::{InputFile, InputMedia, InputMediaPhoto, MessageId};
use unic_langid::LanguageIdentifier;

use super::HandlerDeps;
use crate::core::config;
use crate::core::error::AppResult;
use crate::i18n;
use crate::storage::db::Contestant;
use crate::telegram::keyboards;
use crate::voting::{query, tally, Category};

// Telegram caps media groups at 10 items
const MEDIA_GROUP_LIMIT: usize = 10;

/// Edits the message when possible, otherwise sends the text as a new
/// message (the original may carry a photo or be too old to edit).
pub async fn edit_or_send(
    bot: &Bot,
    chat_id: ChatId,
    message_id: Option<MessageId>,
    text: &str,
    keyboard: teloxide::types::InlineKeyboardMarkup,
) -> AppResult<()> {
    if let Some(message_id) = message_id {
        if bot
            .edit_message_text(chat_id, message_id, text)
            .reply_markup(keyboard.clone())
            .await
            .is_ok()
        {
            return Ok(());
        }
    }
    bot.send_message(chat_id, text).reply_markup(keyboard).await?;
    Ok(())
}

/// Deletes the photo-gallery and vote messages tracked for this chat.
pub async fn cleanup_tracked(bot: &Bot, chat_id: ChatId, deps: &HandlerDeps) {
    for msg_id in deps.sessions.take_tracked_messages(chat_id.0) {
        if let Err(e) = bot.delete_message(chat_id, msg_id).await {
            log::warn!("Failed to delete tracked message {}: {}", msg_id.0, e);
        }
    }
}

/// Sends contestant photos as media groups (chunked to the API limit),
/// captioned via `caption_key`. Contestants whose blob is missing are
/// skipped. Returns the sent message ids for later cleanup.
pub async fn send_gallery(
    bot: &Bot,
    chat_id: ChatId,
    deps: &HandlerDeps,
    lang: &LanguageIdentifier,
    contestants: &[Contestant],
    caption_key: &str,
) -> AppResult<Vec<MessageId>> {
    let entries: Vec<(std::path::PathBuf, String)> = contestants
        .iter()
        .filter_map(|c| {
            let path = deps.blob.path_for(&c.photo_ref);
            if !path.exists() {
                log::warn!("Photo blob {} for contestant {} is missing", c.photo_ref, c.id);
                return None;
            }
            let mut args = FluentArgs::new();
            args.set("name", c.name.clone());
            args.set("votes", c.votes);
            Some((path, i18n::t_args(lang, caption_key, &args)))
        })
        .collect();

    let mut sent_ids = Vec::new();
    for chunk in entries.chunks(MEDIA_GROUP_LIMIT) {
        if chunk.len() == 1 {
            let (path, caption) = &chunk[0];
            let msg = bot
                .send_photo(chat_id, InputFile::file(path))
                .caption(caption.as_str())
                .await?;
            sent_ids.push(msg.id);
        } else {
            let media: Vec<InputMedia> = chunk
                .iter()
                .map(|(path, caption)| {
                    InputMedia::Photo(InputMediaPhoto::new(InputFile::file(path)).caption(caption.as_str()))
                })
                .collect();
            let sent = bot.send_media_group(chat_id, media).await?;
            sent_ids.extend(sent.iter().map(|m| m.id));
        }
    }
    Ok(sent_ids)
}

/// Renders the top-N leaderboard of a category: photo gallery plus a text
/// list with a back button.
pub async fn show_rating(
    bot: &Bot,
    chat_id: ChatId,
    deps: &HandlerDeps,
    lang: &LanguageIdentifier,
    category: Category,
) -> AppResult<()> {
    let top = query::top_n(&deps.db_pool, category, config::voting::LEADERBOARD_SIZE)?;
    if top.is_empty() {
        bot.send_message(chat_id, i18n::t(lang, "rating.empty"))
            .reply_markup(keyboards::back_to_category(lang))
            .await?;
        return Ok(());
    }

    let gallery_ids = send_gallery(bot, chat_id, deps, lang, &top, "rating.caption").await?;

    let mut title_args = FluentArgs::new();
    title_args.set("n", top.len() as i64);
    title_args.set("category", category.name(lang));
    let mut text = i18n::t_args(lang, "rating.title", &title_args);
    text.push('\n');
    for (idx, contestant) in top.iter().enumerate() {
        let mut args = FluentArgs::new();
        args.set("idx", (idx + 1) as i64);
        args.set("name", contestant.name.clone());
        args.set("votes", contestant.votes);
        text.push('\n');
        text.push_str(&i18n::t_args(lang, "rating.entry", &args));
    }

    bot.send_message(chat_id, text)
        .reply_markup(keyboards::back_to_category(lang))
        .await?;

    deps.sessions
        .update(chat_id.0, |s| s.gallery_msg_ids.extend(gallery_ids));
    Ok(())
}

/// Opens the vote screen for a category: if the user already has a live
/// vote, shows the retract prompt; otherwise a photo gallery and a button
/// per contestant.
pub async fn show_vote_flow(
    bot: &Bot,
    chat_id: ChatId,
    user_id: i64,
    deps: &HandlerDeps,
    lang: &LanguageIdentifier,
    category: Category,
) -> AppResult<()> {
    let contestants = query::list(&deps.db_pool, category)?;
    if contestants.is_empty() {
        bot.send_message(chat_id, i18n::t(lang, "vote.empty"))
            .reply_markup(keyboards::back_to_category(lang))
            .await?;
        return Ok(());
    }

    if let Some(voted_id) = tally::user_vote(&deps.db_pool, user_id)? {
        let text = match contestants.iter().find(|c| c.id == voted_id) {
            Some(voted) => {
                let mut args = FluentArgs::new();
                args.set("name", voted.name.clone());
                i18n::t_args(lang, "vote.already", &args)
            }
            // The vote points at another category or a stale record
            None => i18n::t(lang, "vote.already_generic"),
        };
        bot.send_message(chat_id, text)
            .reply_markup(keyboards::cancel_vote(lang))
            .await?;
        return Ok(());
    }

    let gallery_ids = send_gallery(bot, chat_id, deps, lang, &contestants, "vote.caption").await?;
    let vote_msg = bot
        .send_message(chat_id, i18n::t(lang, "vote.choose"))
        .reply_markup(keyboards::vote_keyboard(lang, &contestants))
        .await?;

    deps.sessions.update(chat_id.0, |s| {
        s.gallery_msg_ids.extend(gallery_ids);
        s.vote_msg_id = Some(vote_msg.id);
    });
    Ok(())
}
