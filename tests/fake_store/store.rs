//! Fake store, folders and builder.
//!
//! ```ignore
//! let store = FakeStoreBuilder::new()
//!     .namespace("")
//!     .folder("INBOX")
//!     .folder("Backup")
//!     .extra_copies("INBOX", &["Backup"])
//!     .build();
//! ```
//!
//! The store is a cheap `Clone` handle; every clone sees the same
//! folders. Per-folder configuration files live in a temporary
//! directory removed when the last handle is dropped.

use extra_copies::{
    CommitChanges, Error, Flags, MailStore, Mailbox, Message, Result, StorageKind, SyncFlags,
    Transaction, TransactionFlags, Uid, UidSet,
};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use tempfile::TempDir;

/// A message persisted in a fake folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMessage {
    pub uid: Uid,
    pub flags: Flags,
    pub body: Vec<u8>,
    /// Stand-in for the internal date a real copy keeps.
    pub received: u64,
}

/// One `save_copy` that reached a destination, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyRecord {
    pub from: String,
    pub uid: u32,
    pub to: String,
}

#[derive(Debug, Default)]
struct FakeFolder {
    next_uid: u32,
    messages: Vec<StoredMessage>,
}

#[derive(Debug, Default)]
struct State {
    namespaces: Vec<String>,
    folders: BTreeMap<String, FakeFolder>,
    refuse_open: HashSet<String>,
    fail_copies: HashSet<String>,
    fail_commits: HashSet<String>,
    fail_sync: bool,
    fail_search: bool,
    copies: Vec<CopyRecord>,
    commits: Vec<String>,
    syncs: usize,
    opens: usize,
    closes: usize,
}

/// A handle to the shared fake store.
#[derive(Clone)]
pub struct FakeStore {
    state: Arc<Mutex<State>>,
    root: Arc<TempDir>,
    kind: StorageKind,
}

impl FakeStore {
    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    fn dir_for(&self, name: &str, kind: StorageKind) -> PathBuf {
        let area = match kind {
            StorageKind::MailboxFile => "control",
            StorageKind::Directory => "mail",
        };
        self.root.path().join(area).join(name)
    }

    /// Open `name` as the host would, before any plugin is attached.
    pub fn open(&self, name: &str) -> FakeMailbox {
        let namespace = FakeNamespace(String::new());
        self.open_mailbox(&namespace, name).unwrap()
    }

    pub fn messages(&self, name: &str) -> Vec<StoredMessage> {
        self.state()
            .folders
            .get(name)
            .map(|f| f.messages.clone())
            .unwrap_or_default()
    }

    pub fn copies(&self) -> Vec<CopyRecord> {
        self.state().copies.clone()
    }

    /// Folder names of every successful commit, in order.
    pub fn commits(&self) -> Vec<String> {
        self.state().commits.clone()
    }

    pub fn syncs(&self) -> usize {
        self.state().syncs
    }

    pub fn opens(&self) -> usize {
        self.state().opens
    }

    pub fn closes(&self) -> usize {
        self.state().closes
    }

    pub fn refuse_open(&self, name: &str) {
        self.state().refuse_open.insert(name.to_string());
    }

    pub fn fail_copies_into(&self, name: &str) {
        self.state().fail_copies.insert(name.to_string());
    }

    pub fn fail_commits_in(&self, name: &str) {
        self.state().fail_commits.insert(name.to_string());
    }

    pub fn fail_sync(&self) {
        self.state().fail_sync = true;
    }

    pub fn fail_search(&self) {
        self.state().fail_search = true;
    }
}

#[derive(Debug, Clone)]
pub struct FakeNamespace(pub String);

impl MailStore for FakeStore {
    type Namespace = FakeNamespace;
    type Mailbox = FakeMailbox;

    fn find_namespace(&self, name: &str) -> Option<FakeNamespace> {
        self.state()
            .namespaces
            .iter()
            .filter(|prefix| name.starts_with(prefix.as_str()))
            .max_by_key(|prefix| prefix.len())
            .map(|prefix| FakeNamespace(prefix.clone()))
    }

    fn open_mailbox(&self, _namespace: &FakeNamespace, name: &str) -> Result<FakeMailbox> {
        let mut state = self.state();
        if state.refuse_open.contains(name) {
            return Err(Error::Storage(format!("{name} is locked")));
        }
        if !state.folders.contains_key(name) {
            return Err(Error::Storage(format!("Mailbox doesn't exist: {name}")));
        }
        state.opens += 1;
        drop(state);

        Ok(FakeMailbox {
            store: self.clone(),
            name: name.to_string(),
            closed: false,
        })
    }
}

/// A message handle returned by a search.
#[derive(Debug, Clone)]
pub struct FakeMessage {
    folder: String,
    stored: StoredMessage,
}

impl Message for FakeMessage {
    fn uid(&self) -> Uid {
        self.stored.uid
    }

    fn flags(&self) -> &Flags {
        &self.stored.flags
    }
}

#[derive(Debug, Clone)]
struct PendingSave {
    flags: Flags,
    body: Vec<u8>,
    received: u64,
}

/// A write transaction. Nothing it holds is visible before commit.
#[derive(Debug)]
pub struct FakeTransaction {
    flags: TransactionFlags,
    saves: Vec<PendingSave>,
}

impl FakeTransaction {
    /// Append (or deliver) a new message.
    pub fn append(&mut self, flags: Flags, body: &[u8]) {
        self.saves.push(PendingSave {
            flags,
            body: body.to_vec(),
            received: 1_700_000_000 + self.saves.len() as u64,
        });
    }
}

impl Transaction for FakeTransaction {
    fn flags(&self) -> TransactionFlags {
        self.flags
    }
}

/// An open fake folder.
pub struct FakeMailbox {
    store: FakeStore,
    name: String,
    closed: bool,
}

impl FakeMailbox {
    pub const fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Mailbox for FakeMailbox {
    type Message = FakeMessage;
    type Transaction = FakeTransaction;
    type Search = std::vec::IntoIter<Result<FakeMessage>>;

    fn name(&self) -> &str {
        &self.name
    }

    fn storage_kind(&self) -> StorageKind {
        self.store.kind
    }

    fn control_dir(&self) -> Option<PathBuf> {
        Some(self.store.dir_for(&self.name, StorageKind::MailboxFile))
    }

    fn mailbox_dir(&self) -> Option<PathBuf> {
        Some(self.store.dir_for(&self.name, StorageKind::Directory))
    }

    fn begin_transaction(&mut self, flags: TransactionFlags) -> Result<FakeTransaction> {
        Ok(FakeTransaction {
            flags,
            saves: Vec::new(),
        })
    }

    fn save_copy(&mut self, tx: &mut FakeTransaction, message: &FakeMessage) -> Result<()> {
        let mut state = self.store.state();
        if state.fail_copies.contains(&self.name) {
            return Err(Error::Storage(format!("{} is over quota", self.name)));
        }
        state.copies.push(CopyRecord {
            from: message.folder.clone(),
            uid: message.stored.uid.get(),
            to: self.name.clone(),
        });
        tx.saves.push(PendingSave {
            flags: message.stored.flags.clone(),
            body: message.stored.body.clone(),
            received: message.stored.received,
        });
        Ok(())
    }

    fn commit(&mut self, tx: FakeTransaction) -> Result<CommitChanges> {
        let mut state = self.store.state();
        if state.fail_commits.contains(&self.name) {
            return Err(Error::Storage(format!("cannot commit to {}", self.name)));
        }

        let folder = state
            .folders
            .get_mut(&self.name)
            .ok_or_else(|| Error::Storage(format!("Mailbox doesn't exist: {}", self.name)))?;
        let mut saved_uids = UidSet::new();
        for save in tx.saves {
            folder.next_uid += 1;
            let uid = Uid::new(folder.next_uid).unwrap();
            folder.messages.push(StoredMessage {
                uid,
                flags: save.flags,
                body: save.body,
                received: save.received,
            });
            saved_uids.insert(uid);
        }
        state.commits.push(self.name.clone());

        Ok(CommitChanges { saved_uids })
    }

    fn rollback(&mut self, tx: FakeTransaction) {
        drop(tx);
    }

    fn sync(&mut self, _flags: SyncFlags) -> Result<()> {
        let mut state = self.store.state();
        state.syncs += 1;
        if state.fail_sync {
            return Err(Error::Storage("sync busy".to_string()));
        }
        Ok(())
    }

    fn search(&mut self, _tx: &FakeTransaction, uids: &UidSet) -> Result<Self::Search> {
        let state = self.store.state();
        if state.fail_search {
            return Err(Error::Storage("search index unavailable".to_string()));
        }
        let folder = state
            .folders
            .get(&self.name)
            .ok_or_else(|| Error::Storage(format!("Mailbox doesn't exist: {}", self.name)))?;

        let mut found: Vec<StoredMessage> = folder
            .messages
            .iter()
            .filter(|m| uids.contains(m.uid))
            .cloned()
            .collect();
        found.sort_by_key(|m| m.uid);

        let results: Vec<Result<FakeMessage>> = found
            .into_iter()
            .map(|stored| {
                Ok(FakeMessage {
                    folder: self.name.clone(),
                    stored,
                })
            })
            .collect();
        Ok(results.into_iter())
    }

    fn close(&mut self) {
        assert!(!self.closed, "{} closed twice", self.name);
        self.closed = true;
        self.store.state().closes += 1;
    }
}

/// Builder for a `FakeStore`.
pub struct FakeStoreBuilder {
    namespaces: Vec<String>,
    folders: Vec<String>,
    configs: Vec<(String, String)>,
    kind: StorageKind,
}

impl FakeStoreBuilder {
    pub fn new() -> Self {
        Self {
            namespaces: Vec::new(),
            folders: Vec::new(),
            configs: Vec::new(),
            kind: StorageKind::Directory,
        }
    }

    /// Add a namespace. Folder names starting with `prefix` resolve to
    /// it; the empty prefix resolves everything.
    pub fn namespace(mut self, prefix: &str) -> Self {
        self.namespaces.push(prefix.to_string());
        self
    }

    pub fn folder(mut self, name: &str) -> Self {
        self.folders.push(name.to_string());
        self
    }

    /// Write a destination list for `folder`, one entry per line.
    pub fn extra_copies(self, folder: &str, destinations: &[&str]) -> Self {
        let mut contents = destinations.join("\n");
        contents.push('\n');
        self.extra_copies_raw(folder, &contents)
    }

    pub fn extra_copies_raw(mut self, folder: &str, contents: &str) -> Self {
        self.configs.push((folder.to_string(), contents.to_string()));
        self
    }

    /// Keep configuration files in the control directory, as a
    /// one-file-per-mailbox storage would.
    pub const fn mailbox_files(mut self) -> Self {
        self.kind = StorageKind::MailboxFile;
        self
    }

    pub fn build(self) -> FakeStore {
        let root = TempDir::new().unwrap();
        let mut state = State {
            namespaces: self.namespaces,
            ..State::default()
        };
        for name in self.folders {
            for area in ["control", "mail"] {
                fs::create_dir_all(root.path().join(area).join(&name)).unwrap();
            }
            state.folders.insert(name, FakeFolder::default());
        }

        let store = FakeStore {
            state: Arc::new(Mutex::new(state)),
            root: Arc::new(root),
            kind: self.kind,
        };
        for (folder, contents) in self.configs {
            let dir = store.dir_for(&folder, self.kind);
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join("extra-copies"), contents).unwrap();
        }
        store
    }
}
