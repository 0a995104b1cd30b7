pub mod contact;
pub mod error;
pub mod mailbox;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use contact::{Contact, ContactAddress, ContactEmail, ContactFilter, ContactPhone};
pub use error::{CorrelationError, JmapError, Result};
pub use mailbox::{Mailbox, MailboxFilter, MailboxRights};

/// Capability every JMAP request must declare
pub const CORE_CAPABILITY: &str = "urn:ietf:params:jmap:core";

/// Identifier of one invocation, unique within its request batch
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallId(String);

impl CallId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CallId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for CallId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for CallId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
