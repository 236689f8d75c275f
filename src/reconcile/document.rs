// dbinventory — Import/Export Document
//
// The JSON shape shared by `import` and `export`:
//
//   { "groups": [ {"name": .., "type": "select"|"multiselect"} ],
//     "tags":   [ {"name": .., "group": ..} ],
//     "hosts":  [ {"host": .., "host_name"?: .., "ssh_user"?: .., "ssh_port"?: .., "tags"?: [..]} ] }
//
// Credential fields are not part of the document in either direction.

use serde::{Deserialize, Deserializer, Serialize};

use crate::store::SelectionType;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub groups: Vec<GroupRecord>,
    #[serde(default)]
    pub tags: Vec<TagRecord>,
    #[serde(default)]
    pub hosts: Vec<HostRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRecord {
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub selection_type: Option<SelectionType>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRecord {
    pub name: String,
    pub group: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostRecord {
    pub host: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_user: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_port"
    )]
    pub ssh_port: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

/// One entry of a document, tagged by kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Group(GroupRecord),
    Tag(TagRecord),
    Host(HostRecord),
}

impl Document {
    /// Records in application order: every group, then every tag, then
    /// every host. Tags refer to groups and hosts refer to tags.
    pub fn into_records(self) -> impl Iterator<Item = Record> {
        self.groups
            .into_iter()
            .map(Record::Group)
            .chain(self.tags.into_iter().map(Record::Tag))
            .chain(self.hosts.into_iter().map(Record::Host))
    }
}

/// Ports written by older editors may be quoted strings.
fn deserialize_port<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Port {
        Number(i64),
        Text(String),
    }

    match Option::<Port>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Port::Number(n)) => Ok(Some(n)),
        Some(Port::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(Port::Text(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid ssh_port `{}`", s))),
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_sections_default_to_empty() {
        let doc: Document = serde_json::from_str(r#"{"tags": []}"#).unwrap();
        assert!(doc.groups.is_empty());
        assert!(doc.hosts.is_empty());
    }

    #[test]
    fn test_records_are_ordered_groups_tags_hosts() {
        // Sections appear out of order in the source text on purpose.
        let doc: Document = serde_json::from_str(
            r#"{
                "hosts":  [{"host": "web01", "tags": ["web"]}],
                "tags":   [{"name": "web", "group": "role"}],
                "groups": [{"name": "role", "type": "multiselect"}]
            }"#,
        )
        .unwrap();

        let kinds: Vec<&str> = doc
            .into_records()
            .map(|r| match r {
                Record::Group(_) => "group",
                Record::Tag(_) => "tag",
                Record::Host(_) => "host",
            })
            .collect();
        assert_eq!(kinds, vec!["group", "tag", "host"]);
    }

    #[test]
    fn test_host_optional_fields_and_nulls() {
        let doc: Document = serde_json::from_str(
            r#"{"hosts": [
                {"host": "a"},
                {"host": "b", "host_name": null, "ssh_port": null, "tags": []},
                {"host": "c", "ssh_port": "2222"}
            ]}"#,
        )
        .unwrap();

        assert_eq!(doc.hosts[0].tags, None);
        assert_eq!(doc.hosts[1].host_name, None);
        assert_eq!(doc.hosts[1].tags, Some(vec![]));
        assert_eq!(doc.hosts[2].ssh_port, Some(2222));
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let result: Result<Document, _> =
            serde_json::from_str(r#"{"hosts": [{"host": "a", "ssh_port": "ssh"}]}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_serialization_omits_unset_fields() {
        let doc = Document {
            groups: vec![GroupRecord {
                name: "env".to_string(),
                selection_type: Some(SelectionType::Select),
            }],
            tags: vec![],
            hosts: vec![HostRecord {
                host: "web01".to_string(),
                tags: Some(vec![]),
                ..Default::default()
            }],
        };

        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["groups"][0]["type"], "select");
        assert_eq!(value["hosts"][0], serde_json::json!({"host": "web01", "tags": []}));
    }
}
