// dbinventory — Inventory data models
//
// SECURITY: the stored credential columns of a `Host` are private and never
// appear in Debug output. They hold ciphertext when a passphrase was active
// at write time, and the caller-supplied value otherwise.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::StoreError;

/// How an editor presents the tags of a group: pick one, or pick many.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionType {
    #[default]
    Select,
    Multiselect,
}

impl SelectionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Select => "select",
            Self::Multiselect => "multiselect",
        }
    }
}

impl FromStr for SelectionType {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "select" => Ok(Self::Select),
            "multiselect" => Ok(Self::Multiselect),
            other => Err(StoreError::InvalidField(format!(
                "unknown selection type `{}` (expected `select` or `multiselect`)",
                other
            ))),
        }
    }
}

impl fmt::Display for SelectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named category of tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagGroup {
    pub id: i64,
    pub name: String,
    pub selection_type: SelectionType,
}

/// A label belonging to exactly one tag group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub id: i64,
    pub group_id: i64,
    /// Name of the owning group, joined in at read time.
    pub group: String,
    pub name: String,
}

/// A managed host as stored in the database.
#[derive(Clone, PartialEq, Eq)]
pub struct Host {
    pub id: i64,
    pub host: String,
    pub host_name: Option<String>,
    pub ssh_user: Option<String>,
    pub ssh_port: Option<i64>,
    ssh_pass: Option<String>,
    sudo_pass: Option<String>,
}

impl Host {
    pub fn new(
        id: i64,
        host: String,
        host_name: Option<String>,
        ssh_user: Option<String>,
        ssh_port: Option<i64>,
        ssh_pass: Option<String>,
        sudo_pass: Option<String>,
    ) -> Self {
        Self {
            id,
            host,
            host_name,
            ssh_user,
            ssh_port,
            ssh_pass,
            sudo_pass,
        }
    }

    /// The `ssh_pass` column exactly as stored (sealed or verbatim).
    pub fn stored_ssh_pass(&self) -> Option<&str> {
        self.ssh_pass.as_deref()
    }

    /// The `sudo_pass` column exactly as stored (sealed or verbatim).
    pub fn stored_sudo_pass(&self) -> Option<&str> {
        self.sudo_pass.as_deref()
    }
}

impl fmt::Debug for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Host")
            .field("id", &self.id)
            .field("host", &self.host)
            .field("host_name", &self.host_name)
            .field("ssh_user", &self.ssh_user)
            .field("ssh_port", &self.ssh_port)
            .field("ssh_pass", &self.ssh_pass.as_ref().map(|_| "[REDACTED]"))
            .field("sudo_pass", &self.sudo_pass.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Scalar host fields for inserts and field-level updates.
///
/// `None` means "leave untouched" on update and "unset" on insert. The two
/// credential fields carry plaintext; the store seals them on write.
#[derive(Clone, Default)]
pub struct HostFields {
    pub host_name: Option<String>,
    pub ssh_user: Option<String>,
    pub ssh_port: Option<i64>,
    pub ssh_pass: Option<String>,
    pub sudo_pass: Option<String>,
}

impl HostFields {
    pub fn has_credentials(&self) -> bool {
        self.ssh_pass.is_some() || self.sudo_pass.is_some()
    }

    /// True when a non-empty credential is given and must be sealed.
    pub fn sets_credentials(&self) -> bool {
        [&self.ssh_pass, &self.sudo_pass]
            .into_iter()
            .any(|p| p.as_deref().is_some_and(|p| !p.is_empty()))
    }

    pub fn is_empty(&self) -> bool {
        self.host_name.is_none()
            && self.ssh_user.is_none()
            && self.ssh_port.is_none()
            && !self.has_credentials()
    }
}

impl fmt::Debug for HostFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostFields")
            .field("host_name", &self.host_name)
            .field("ssh_user", &self.ssh_user)
            .field("ssh_port", &self.ssh_port)
            .field("ssh_pass", &self.ssh_pass.as_ref().map(|_| "[REDACTED]"))
            .field("sudo_pass", &self.sudo_pass.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_debug_redacts_credentials() {
        let host = Host::new(
            1,
            "web01".to_string(),
            Some("10.0.0.1".to_string()),
            Some("deploy".to_string()),
            Some(22),
            Some("hunter2".to_string()),
            Some("sudo-hunter2".to_string()),
        );

        let debug_output = format!("{:?}", host);
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("hunter2"), "Debug output must not contain credentials");
        assert!(debug_output.contains("web01"));
    }

    #[test]
    fn test_host_fields_debug_redacts_credentials() {
        let fields = HostFields {
            ssh_pass: Some("p@ss".to_string()),
            ..Default::default()
        };
        assert!(!format!("{:?}", fields).contains("p@ss"));
        assert!(fields.has_credentials());
        assert!(fields.sets_credentials());
        assert!(!fields.is_empty());
        assert!(HostFields::default().is_empty());

        let clearing = HostFields {
            sudo_pass: Some(String::new()),
            ..Default::default()
        };
        assert!(!clearing.sets_credentials());
        assert!(!clearing.is_empty());
    }

    #[test]
    fn test_selection_type_parse_and_display() {
        assert_eq!("select".parse::<SelectionType>().unwrap(), SelectionType::Select);
        assert_eq!(
            "multiselect".parse::<SelectionType>().unwrap(),
            SelectionType::Multiselect
        );
        assert!("checkbox".parse::<SelectionType>().is_err());
        assert_eq!(SelectionType::Multiselect.to_string(), "multiselect");
    }

    #[test]
    fn test_selection_type_serde_lowercase() {
        let json = serde_json::to_string(&SelectionType::Multiselect).unwrap();
        assert_eq!(json, "\"multiselect\"");
        let parsed: SelectionType = serde_json::from_str("\"select\"").unwrap();
        assert_eq!(parsed, SelectionType::Select);
    }
}
