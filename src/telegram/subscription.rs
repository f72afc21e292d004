//! Channel binding and the must-be-subscribed gate
//!
//! The bound channel lives in the `settings` table (not in files or
//! process globals), so every handler sees the same binding through the
//! pool and a restart changes nothing.

use teloxide::prelude::*;
use teloxide::types::UserId;

use crate::core::error::AppResult;
use crate::storage::db::{self, DbPool};

const CHANNEL_ID_KEY: &str = "channel_id";
const CHANNEL_LINK_KEY: &str = "channel_link";

/// Channel currently bound for the subscription check, if any.
pub fn bound_channel(pool: &DbPool) -> AppResult<Option<ChatId>> {
    let conn = db::get_connection(pool)?;
    let Some(raw) = db::get_setting(&conn, CHANNEL_ID_KEY)? else {
        return Ok(None);
    };
    match raw.trim().parse::<i64>() {
        Ok(id) => Ok(Some(ChatId(id))),
        Err(e) => {
            log::error!("Stored channel_id {:?} is not a number: {}", raw, e);
            Ok(None)
        }
    }
}

/// Invite/public link of the bound channel, if one was resolved at bind time.
pub fn bound_channel_link(pool: &DbPool) -> Option<String> {
    let conn = db::get_connection(pool).ok()?;
    db::get_setting(&conn, CHANNEL_LINK_KEY)
        .ok()
        .flatten()
        .filter(|link| !link.is_empty())
}

/// Binds `channel` for the subscription gate and stores the best link we
/// can produce for it. Returns the link (None when neither a public
/// username nor invite-link rights are available).
pub async fn bind_channel(
    bot: &Bot,
    pool: &DbPool,
    channel: ChatId,
    username: Option<&str>,
) -> AppResult<Option<String>> {
    let link = resolve_channel_link(bot, channel, username).await;

    let conn = db::get_connection(pool)?;
    db::set_setting(&conn, CHANNEL_ID_KEY, &channel.0.to_string())?;
    db::set_setting(&conn, CHANNEL_LINK_KEY, link.as_deref().unwrap_or(""))?;
    log::info!("Channel bound: {} (link: {:?})", channel.0, link);
    Ok(link)
}

async fn resolve_channel_link(bot: &Bot, channel: ChatId, username: Option<&str>) -> Option<String> {
    if let Some(username) = username {
        return Some(format!("https://t.me/{username}"));
    }
    // Private channel: an invite link needs admin rights in the channel
    match bot.create_chat_invite_link(channel).name("Voting bot link").await {
        Ok(invite) => Some(invite.invite_link),
        Err(e) => {
            log::error!("Failed to create invite link for {}: {}", channel.0, e);
            None
        }
    }
}

/// Whether `user` is currently present in `channel` (member, admin or
/// owner; restricted-but-member counts too).
pub async fn is_subscribed(bot: &Bot, channel: ChatId, user: UserId) -> Result<bool, teloxide::RequestError> {
    let member = bot.get_chat_member(channel, user).await?;
    Ok(member.kind.is_present())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::db::{create_pool, get_connection, set_setting};
    use tempfile::TempDir;

    fn test_pool() -> (TempDir, DbPool) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.sqlite");
        let pool = create_pool(path.to_str().unwrap()).unwrap();
        (dir, pool)
    }

    #[test]
    fn unbound_channel_is_none() {
        let (_dir, pool) = test_pool();
        assert!(bound_channel(&pool).unwrap().is_none());
        assert!(bound_channel_link(&pool).is_none());
    }

    #[test]
    fn bound_channel_roundtrips() {
        let (_dir, pool) = test_pool();
        let conn = get_connection(&pool).unwrap();
        set_setting(&conn, "channel_id", "-1001234567890").unwrap();
        set_setting(&conn, "channel_link", "https://t.me/somechannel").unwrap();

        assert_eq!(bound_channel(&pool).unwrap(), Some(ChatId(-1001234567890)));
        assert_eq!(
            bound_channel_link(&pool).as_deref(),
            Some("https://t.me/somechannel")
        );
    }

    #[test]
    fn garbage_channel_id_reads_as_unbound() {
        let (_dir, pool) = test_pool();
        let conn = get_connection(&pool).unwrap();
        set_setting(&conn, "channel_id", "not-a-number").unwrap();
        set_setting(&conn, "channel_link", "").unwrap();

        assert!(bound_channel(&pool).unwrap().is_none());
        assert!(bound_channel_link(&pool).is_none());
    }
}
