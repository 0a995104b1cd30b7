use serde::{Deserialize, Serialize};

use crate::catalog::Entity;

/// Represents a JMAP Mailbox (RFC 8621 §2)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Mailbox {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub name: String,

    /// Parent mailbox id, or a creation id reference such as `#new1`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,

    /// Special-use role ("inbox", "sent", "trash", ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    pub sort_order: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_emails: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub unread_emails: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub my_rights: Option<MailboxRights>,

    pub is_subscribed: bool,
}

/// Access rights of the current user on a mailbox
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MailboxRights {
    pub may_read_items: bool,
    pub may_add_items: bool,
    pub may_remove_items: bool,
    pub may_set_seen: bool,
    pub may_set_keywords: bool,
    pub may_create_child: bool,
    pub may_rename: bool,
    pub may_delete: bool,
    pub may_submit: bool,
}

/// Filter condition for `Mailbox/query`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MailboxFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_any_role: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_subscribed: Option<bool>,
}

impl Entity for Mailbox {
    const NAME: &'static str = "Mailbox";
    type Filter = MailboxFilter;
}

impl Mailbox {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Nest this mailbox under a parent, given by id or creation id reference
    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }
}
