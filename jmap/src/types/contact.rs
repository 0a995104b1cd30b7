use serde::{Deserialize, Serialize};

use crate::catalog::Entity;

/// Represents a JMAP Contact
///
/// Every field defaults so that `Contact/get` calls restricted to a subset
/// of `properties` still decode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Contact {
    /// Server-assigned identifier, absent on objects being created
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Address books this contact belongs to
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub address_book_ids: Vec<String>,

    /// Full display name
    pub full_name: String,

    /// Given name (first name)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,

    /// Family name (last name)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub emails: Vec<ContactEmail>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub phones: Vec<ContactPhone>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub addresses: Vec<ContactAddress>,

    /// Organization name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,

    /// Job title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Birthday (ISO date string)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birthday: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Contact email with type label
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContactEmail {
    pub email: String,
    /// Type (e.g., "work", "home", "other")
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub email_type: Option<String>,
    /// Whether this is the preferred email
    pub is_default: bool,
}

/// Contact phone number with type label
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContactPhone {
    pub number: String,
    /// Type (e.g., "work", "home", "mobile", "fax")
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub phone_type: Option<String>,
    pub is_default: bool,
}

/// Physical address
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContactAddress {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub address_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postcode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    pub is_default: bool,
}

/// Filter condition for `Contact/query`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContactFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_address_book: Option<String>,
    /// Matches any email address of the contact
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Matches name fields
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Matches any text property
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Entity for Contact {
    const NAME: &'static str = "Contact";
    type Filter = ContactFilter;
}

impl Contact {
    pub fn new(full_name: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
            ..Default::default()
        }
    }

    /// Get the preferred email address
    pub fn primary_email(&self) -> Option<&str> {
        self.emails
            .iter()
            .find(|e| e.is_default)
            .or_else(|| self.emails.first())
            .map(|e| e.email.as_str())
    }

    /// Get the preferred phone number
    pub fn primary_phone(&self) -> Option<&str> {
        self.phones
            .iter()
            .find(|p| p.is_default)
            .or_else(|| self.phones.first())
            .map(|p| p.number.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_contact_decodes() {
        let contact: Contact =
            serde_json::from_value(serde_json::json!({"id": "k1", "fullName": "Ada"})).unwrap();
        assert_eq!(contact.id.as_deref(), Some("k1"));
        assert_eq!(contact.full_name, "Ada");
        assert!(contact.emails.is_empty());
    }

    #[test]
    fn test_new_contact_omits_id() {
        let json = serde_json::to_value(Contact::new("Ada Lovelace")).unwrap();
        assert!(json.get("id").is_none());
        assert_eq!(json["fullName"], "Ada Lovelace");
    }

    #[test]
    fn test_primary_email_prefers_default() {
        let mut contact = Contact::new("Ada");
        contact.emails = vec![
            ContactEmail {
                email: "ada@work.example".to_string(),
                ..Default::default()
            },
            ContactEmail {
                email: "ada@home.example".to_string(),
                is_default: true,
                ..Default::default()
            },
        ];
        assert_eq!(contact.primary_email(), Some("ada@home.example"));
        assert_eq!(contact.primary_phone(), None);
    }
}
