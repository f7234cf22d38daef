//! Message types for generation requests.

use crate::Role;
use serde::{Deserialize, Serialize};

/// A single text message in a generation request.
///
/// # Examples
///
/// ```
/// use deepbook_core::{Message, Role};
///
/// let message = Message::user("Write a title for a story about a turtle.");
/// assert_eq!(*message.role(), Role::User);
///
/// let built = Message::builder()
///     .role(Role::System)
///     .content("You write children's books.")
///     .build()
///     .unwrap();
/// assert_eq!(built.content(), "You write children's books.");
/// ```
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    derive_getters::Getters,
    derive_builder::Builder,
)]
#[builder(setter(into))]
pub struct Message {
    /// The role of the message author
    role: Role,
    /// The message text
    content: String,
}

impl Message {
    /// Creates a new builder for `Message`.
    pub fn builder() -> MessageBuilder {
        MessageBuilder::default()
    }

    /// Create a message with the given role and text.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }
}
