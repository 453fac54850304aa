//! Consumer-side models fed by [`SessionEvent`]s

use crate::session::SessionEvent;
use chat_common::ChatMessage;

/// Feedback a message view gives for a newly appended message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feedback {
    /// The local user's message came back from the store
    Sent,
    /// Somebody else's message arrived
    Received,
}

/// Ordered messages of the conversation currently followed
#[derive(Debug, Default)]
pub struct MessageList {
    local_user: Option<String>,
    general_room: bool,
    messages: Vec<ChatMessage>,
}

impl MessageList {
    pub fn new() -> Self {
        Self::default()
    }

    /// User the list is displayed for; drives sender labels
    pub fn set_local_user(&mut self, identifier: Option<&str>) {
        self.local_user = identifier.map(str::to_string);
    }

    /// Whether the list shows the general room; drives sender labels
    pub fn set_general_room(&mut self, general: bool) {
        self.general_room = general;
    }

    /// Apply a session event. Returns feedback for appended messages.
    pub fn apply(&mut self, event: &SessionEvent) -> Option<Feedback> {
        match event {
            SessionEvent::ConversationChanged { .. } => {
                self.messages.clear();
                None
            }
            SessionEvent::Message(message) => {
                self.messages.push(message.clone());
                Some(if message.is_echo {
                    Feedback::Sent
                } else {
                    Feedback::Received
                })
            }
            SessionEvent::UserAdded { .. } => None,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Whether the sender name is shown above message `index`.
    ///
    /// Only in the general room, only for other users, and only when the
    /// previous message came from someone else.
    pub fn shows_sender_label(&self, index: usize) -> bool {
        let Some(message) = self.messages.get(index) else {
            return false;
        };
        let previous = index
            .checked_sub(1)
            .and_then(|previous| self.messages.get(previous))
            .map(|previous| previous.sender_identifier.as_str());

        self.general_room
            && self.local_user.as_deref() != Some(message.sender_identifier.as_str())
            && previous != Some(message.sender_identifier.as_str())
    }
}

/// Users of the users collection in arrival order
#[derive(Debug, Default)]
pub struct UserDirectory {
    identifiers: Vec<String>,
}

impl UserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a session event; returns the row index of an added user
    pub fn apply(&mut self, event: &SessionEvent) -> Option<usize> {
        match event {
            SessionEvent::UserAdded { identifier } => {
                self.identifiers.push(identifier.clone());
                Some(self.identifiers.len() - 1)
            }
            _ => None,
        }
    }

    pub fn identifiers(&self) -> &[String] {
        &self.identifiers
    }

    /// Users a private room can be opened with
    pub fn peers_of<'a>(&'a self, local_user: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.identifiers
            .iter()
            .map(String::as_str)
            .filter(move |identifier| *identifier != local_user)
    }

    pub fn clear(&mut self) {
        self.identifiers.clear();
    }
}
