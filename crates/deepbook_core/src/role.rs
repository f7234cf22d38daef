//! Role types for conversation participants.

use serde::{Deserialize, Serialize};

/// Who authored a message in a generation request.
///
/// # Examples
///
/// ```
/// use deepbook_core::Role;
///
/// assert_ne!(Role::User, Role::Assistant);
/// assert_eq!(format!("{}", Role::System), "system");
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    /// Standing instructions for the model
    System,
    /// Prompt text written by the application
    User,
    /// Text previously produced by the model
    Assistant,
}
