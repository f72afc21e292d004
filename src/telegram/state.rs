//! Per-chat conversation state
//!
//! The admin "add/delete contestant" conversation is a finite state machine
//! with explicit named states; the per-chat context lives in a shared map
//! owned by `HandlerDeps`, never in module-level globals. The voting core
//! knows nothing about any of this.

use dashmap::DashMap;
use teloxide::types::MessageId;

use crate::voting::Category;

/// Steps of the admin conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminState {
    /// /admin was issued, waiting for the password message
    AwaitingPassword,
    /// "Add contestant" pressed, waiting for a category pick
    ChoosingCategoryForAdd,
    /// Category picked, waiting for the photo
    AwaitingPhoto { category: Category },
    /// Photo stored, waiting for the name
    AwaitingName { category: Category, photo_ref: String },
    /// "Delete contestant" pressed, waiting for a category pick
    ChoosingCategoryForDelete,
    /// "Bind channel" pressed, waiting for a forwarded channel post
    AwaitingChannelForward,
}

/// Everything the bot remembers about one chat between updates.
#[derive(Debug, Clone, Default)]
pub struct Session {
    /// Password gate passed in this chat
    pub admin_authorized: bool,
    /// Current admin conversation step, if any
    pub admin_state: Option<AdminState>,
    /// Category the user is browsing
    pub category: Option<Category>,
    /// Next category pick opens the rating view instead of the menu
    pub rating_mode: bool,
    /// Photo-gallery messages to clean up on navigation
    pub gallery_msg_ids: Vec<MessageId>,
    /// The "choose a contestant" message to clean up after a vote
    pub vote_msg_id: Option<MessageId>,
}

/// Shared map of chat id -> session.
#[derive(Default)]
pub struct SessionStore {
    sessions: DashMap<i64, Session>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the chat's session (default when none exists yet).
    pub fn get(&self, chat_id: i64) -> Session {
        self.sessions.get(&chat_id).map(|s| s.clone()).unwrap_or_default()
    }

    /// Applies `f` to the chat's session, creating it when missing.
    pub fn update(&self, chat_id: i64, f: impl FnOnce(&mut Session)) {
        let mut entry = self.sessions.entry(chat_id).or_default();
        f(&mut entry);
    }

    /// Resets the conversation (state, category, tracked messages) but keeps
    /// the admin authorization, so the panel does not re-ask the password
    /// after every completed flow.
    pub fn clear_flow(&self, chat_id: i64) {
        self.update(chat_id, |s| {
            s.admin_state = None;
            s.category = None;
            s.rating_mode = false;
            s.gallery_msg_ids.clear();
            s.vote_msg_id = None;
        });
    }

    /// Removes the gallery/vote message ids, returning them for deletion.
    pub fn take_tracked_messages(&self, chat_id: i64) -> Vec<MessageId> {
        let mut out = Vec::new();
        self.update(chat_id, |s| {
            out.append(&mut s.gallery_msg_ids);
            if let Some(id) = s.vote_msg_id.take() {
                out.push(id);
            }
        });
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_session_is_default() {
        let store = SessionStore::new();
        let session = store.get(1);
        assert!(!session.admin_authorized);
        assert!(session.admin_state.is_none());
    }

    #[test]
    fn clear_flow_keeps_authorization() {
        let store = SessionStore::new();
        store.update(1, |s| {
            s.admin_authorized = true;
            s.admin_state = Some(AdminState::ChoosingCategoryForAdd);
            s.category = Some(Category::Weekly);
            s.rating_mode = true;
        });

        store.clear_flow(1);
        let session = store.get(1);
        assert!(session.admin_authorized);
        assert!(session.admin_state.is_none());
        assert!(session.category.is_none());
        assert!(!session.rating_mode);
    }

    #[test]
    fn take_tracked_messages_drains() {
        let store = SessionStore::new();
        store.update(7, |s| {
            s.gallery_msg_ids = vec![MessageId(10), MessageId(11)];
            s.vote_msg_id = Some(MessageId(12));
        });

        let taken = store.take_tracked_messages(7);
        assert_eq!(taken, vec![MessageId(10), MessageId(11), MessageId(12)]);
        assert!(store.take_tracked_messages(7).is_empty());
    }
}
