// dbinventory — Reconciler
//
// Upserts a document into the store by natural key and produces the export
// document. Each record commits on its own: a failing record aborts the
// import, but everything applied before it stays.

use std::fmt;

use super::document::{Document, GroupRecord, HostRecord, Record, TagRecord};
use crate::store::{HostFields, InventoryStore, StoreError};

/// Created/updated counts for one record kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts {
    pub created: usize,
    pub updated: usize,
}

impl Counts {
    fn record(&mut self, created: bool) {
        if created {
            self.created += 1;
        } else {
            self.updated += 1;
        }
    }
}

/// What an import did, per record kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub groups: Counts,
    pub tags: Counts,
    pub hosts: Counts,
}

impl fmt::Display for ImportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "groups: {} created, {} updated; tags: {} created, {} updated; hosts: {} created, {} updated",
            self.groups.created,
            self.groups.updated,
            self.tags.created,
            self.tags.updated,
            self.hosts.created,
            self.hosts.updated,
        )
    }
}

pub struct Reconciler<'a, S: InventoryStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: InventoryStore + ?Sized> Reconciler<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Apply every record of `document` in group, tag, host order.
    pub fn import(&self, document: Document) -> Result<ImportSummary, StoreError> {
        let mut summary = ImportSummary::default();

        for record in document.into_records() {
            match record {
                Record::Group(group) => summary.groups.record(self.apply_group(&group)?),
                Record::Tag(tag) => summary.tags.record(self.apply_tag(&tag)?),
                Record::Host(host) => summary.hosts.record(self.apply_host(&host)?),
            }
        }

        tracing::info!(%summary, "Import finished");
        Ok(summary)
    }

    /// Returns `true` when the group was created.
    fn apply_group(&self, record: &GroupRecord) -> Result<bool, StoreError> {
        match self.store.get_group(&record.name)? {
            Some(existing) => {
                if let Some(selection_type) = record.selection_type {
                    if selection_type != existing.selection_type {
                        self.store.update_group(existing.id, selection_type)?;
                    }
                }
                Ok(false)
            }
            None => {
                self.store
                    .insert_group(&record.name, record.selection_type.unwrap_or_default())?;
                Ok(true)
            }
        }
    }

    fn apply_tag(&self, record: &TagRecord) -> Result<bool, StoreError> {
        if self.store.get_group(&record.group)?.is_none() {
            return Err(StoreError::UnknownGroup {
                tag: record.name.clone(),
                group: record.group.clone(),
            });
        }

        match self.store.get_tag(&record.name)? {
            Some(existing) => {
                if existing.group != record.group {
                    self.store.update_tag(existing.id, &record.group)?;
                }
                Ok(false)
            }
            None => {
                self.store.insert_tag(&record.name, &record.group)?;
                Ok(true)
            }
        }
    }

    fn apply_host(&self, record: &HostRecord) -> Result<bool, StoreError> {
        let fields = HostFields {
            host_name: record.host_name.clone(),
            ssh_user: record.ssh_user.clone(),
            ssh_port: record.ssh_port,
            ..Default::default()
        };

        match self.store.get_host(&record.host)? {
            Some(existing) => {
                if !fields.is_empty() {
                    self.store.update_host(existing.id, &fields, None)?;
                }
                if let Some(tags) = &record.tags {
                    self.store.set_host_tags(existing.id, tags)?;
                }
                Ok(false)
            }
            None => {
                let tags = record.tags.as_deref().unwrap_or_default();
                self.store.insert_host(&record.host, &fields, tags, None)?;
                Ok(true)
            }
        }
    }

    /// Snapshot the store as a document. Credentials are never included.
    pub fn export(&self) -> Result<Document, StoreError> {
        let groups = self
            .store
            .list_groups()?
            .into_iter()
            .map(|g| GroupRecord {
                name: g.name,
                selection_type: Some(g.selection_type),
            })
            .collect();

        let tags = self
            .store
            .list_tags()?
            .into_iter()
            .map(|t| TagRecord {
                name: t.name,
                group: t.group,
            })
            .collect();

        let mut hosts = Vec::new();
        for host in self.store.list_hosts()? {
            let tags = self
                .store
                .tags_for_host(host.id)?
                .into_iter()
                .map(|t| t.name)
                .collect();

            hosts.push(HostRecord {
                host: host.host,
                host_name: host.host_name,
                ssh_user: host.ssh_user,
                ssh_port: host.ssh_port,
                tags: Some(tags),
            });
        }

        Ok(Document { groups, tags, hosts })
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Database, SelectionType, SqliteInventoryStore};
    use crate::vault::Vault;

    fn sample_document() -> Document {
        serde_json::from_str(
            r#"{
                "groups": [
                    {"name": "env", "type": "select"},
                    {"name": "role", "type": "multiselect"}
                ],
                "tags": [
                    {"name": "prod", "group": "env"},
                    {"name": "web", "group": "role"},
                    {"name": "db", "group": "role"}
                ],
                "hosts": [
                    {"host": "web01", "host_name": "10.0.0.1", "ssh_user": "deploy",
                     "ssh_port": 22, "tags": ["web", "prod"]},
                    {"host": "db01", "host_name": "10.0.0.2", "tags": ["db", "unknown"]},
                    {"host": "bastion"}
                ]
            }"#,
        )
        .unwrap()
    }

    fn snapshot(db: &Database) -> Document {
        Reconciler::new(&SqliteInventoryStore::new(db)).export().unwrap()
    }

    #[test]
    fn test_import_into_empty_store() {
        let db = Database::open_in_memory().unwrap();
        let store = SqliteInventoryStore::new(&db);

        let summary = Reconciler::new(&store).import(sample_document()).unwrap();
        assert_eq!(summary.groups, Counts { created: 2, updated: 0 });
        assert_eq!(summary.tags, Counts { created: 3, updated: 0 });
        assert_eq!(summary.hosts, Counts { created: 3, updated: 0 });

        let db01 = store.get_host("db01").unwrap().unwrap();
        let tags: Vec<String> = store.tags_for_host(db01.id).unwrap().into_iter().map(|t| t.name).collect();
        assert_eq!(tags, vec!["db"], "unknown tag names are dropped");

        let bastion = store.get_host("bastion").unwrap().unwrap();
        assert!(store.tags_for_host(bastion.id).unwrap().is_empty());
    }

    #[test]
    fn test_reimport_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        let store = SqliteInventoryStore::new(&db);
        let reconciler = Reconciler::new(&store);

        reconciler.import(sample_document()).unwrap();
        let once = snapshot(&db);

        let summary = reconciler.import(sample_document()).unwrap();
        assert_eq!(summary.hosts, Counts { created: 0, updated: 3 });
        assert_eq!(snapshot(&db), once);
    }

    #[test]
    fn test_export_then_import_reconstructs_store() {
        let source = Database::open_in_memory().unwrap();
        Reconciler::new(&SqliteInventoryStore::new(&source))
            .import(sample_document())
            .unwrap();
        let exported = snapshot(&source);

        // Through JSON text, as the CLI does it.
        let text = serde_json::to_string(&exported).unwrap();
        let target = Database::open_in_memory().unwrap();
        Reconciler::new(&SqliteInventoryStore::new(&target))
            .import(serde_json::from_str(&text).unwrap())
            .unwrap();

        assert_eq!(snapshot(&target), exported);
    }

    #[test]
    fn test_export_never_contains_credentials() {
        let db = Database::open_in_memory().unwrap();
        let store = SqliteInventoryStore::new(&db);
        let vault = Vault::from_passphrase("pw", b"0123456789abcdef");

        let fields = HostFields {
            ssh_pass: Some("hunter2".to_string()),
            sudo_pass: Some("sudo-hunter2".to_string()),
            ..Default::default()
        };
        store.insert_host("web01", &fields, &[], Some(&vault)).unwrap();
        let sealed = store.get_host("web01").unwrap().unwrap().stored_ssh_pass().unwrap().to_string();

        let json = serde_json::to_string(&Reconciler::new(&store).export().unwrap()).unwrap();
        assert!(!json.contains("hunter2"));
        assert!(!json.contains(&sealed));
        assert!(!json.contains("pass"));
    }

    #[test]
    fn test_upsert_is_partial_except_tags() {
        let db = Database::open_in_memory().unwrap();
        let store = SqliteInventoryStore::new(&db);
        let reconciler = Reconciler::new(&store);
        reconciler.import(sample_document()).unwrap();

        let patch: Document = serde_json::from_str(
            r#"{"hosts": [{"host": "web01", "ssh_port": 2222, "tags": ["db"]}]}"#,
        )
        .unwrap();
        reconciler.import(patch).unwrap();

        let web01 = store.get_host("web01").unwrap().unwrap();
        assert_eq!(web01.host_name.as_deref(), Some("10.0.0.1"), "absent fields untouched");
        assert_eq!(web01.ssh_user.as_deref(), Some("deploy"));
        assert_eq!(web01.ssh_port, Some(2222));

        let tags: Vec<String> = store.tags_for_host(web01.id).unwrap().into_iter().map(|t| t.name).collect();
        assert_eq!(tags, vec!["db"], "tags are replaced wholesale");

        // Without a `tags` key membership stays as it is.
        let patch: Document =
            serde_json::from_str(r#"{"hosts": [{"host": "web01", "ssh_user": "root"}]}"#).unwrap();
        reconciler.import(patch).unwrap();
        assert_eq!(store.tags_for_host(web01.id).unwrap().len(), 1);
    }

    #[test]
    fn test_group_type_is_updated_and_defaults_to_select() {
        let db = Database::open_in_memory().unwrap();
        let store = SqliteInventoryStore::new(&db);
        let reconciler = Reconciler::new(&store);

        let doc: Document = serde_json::from_str(r#"{"groups": [{"name": "env"}]}"#).unwrap();
        reconciler.import(doc).unwrap();
        assert_eq!(store.get_group("env").unwrap().unwrap().selection_type, SelectionType::Select);

        let doc: Document =
            serde_json::from_str(r#"{"groups": [{"name": "env", "type": "multiselect"}]}"#).unwrap();
        reconciler.import(doc).unwrap();
        assert_eq!(
            store.get_group("env").unwrap().unwrap().selection_type,
            SelectionType::Multiselect
        );
    }

    #[test]
    fn test_tag_moves_between_groups() {
        let db = Database::open_in_memory().unwrap();
        let store = SqliteInventoryStore::new(&db);
        let reconciler = Reconciler::new(&store);
        reconciler.import(sample_document()).unwrap();

        let doc: Document =
            serde_json::from_str(r#"{"tags": [{"name": "web", "group": "env"}]}"#).unwrap();
        let summary = reconciler.import(doc).unwrap();
        assert_eq!(summary.tags, Counts { created: 0, updated: 1 });
        assert_eq!(store.get_tag("web").unwrap().unwrap().group, "env");
    }

    #[test]
    fn test_unknown_group_aborts_without_rollback() {
        let db = Database::open_in_memory().unwrap();
        let store = SqliteInventoryStore::new(&db);

        let doc: Document = serde_json::from_str(
            r#"{
                "groups": [{"name": "env", "type": "select"}],
                "tags": [
                    {"name": "prod", "group": "env"},
                    {"name": "eu", "group": "region"},
                    {"name": "staging", "group": "env"}
                ],
                "hosts": [{"host": "web01"}]
            }"#,
        )
        .unwrap();

        match Reconciler::new(&store).import(doc) {
            Err(StoreError::UnknownGroup { tag, group }) => {
                assert_eq!(tag, "eu");
                assert_eq!(group, "region");
            }
            other => panic!("Expected UnknownGroup error, got {:?}", other),
        }

        assert!(store.get_group("env").unwrap().is_some(), "earlier records stay committed");
        assert!(store.get_tag("prod").unwrap().is_some());
        assert!(store.get_tag("eu").unwrap().is_none());
        assert!(store.get_tag("staging").unwrap().is_none(), "later records are not applied");
        assert!(store.get_host("web01").unwrap().is_none());
    }
}
