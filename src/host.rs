//! Host mail store interface
//!
//! The plugin does not store anything itself. It drives the host's
//! folders through these traits: open a destination, copy into it,
//! search the source folder for freshly saved UIDs. A [`Mailbox`] is
//! the folder's operation table; the commit interceptor is another
//! `Mailbox` wrapping the host's one.

use crate::error::Result;
use crate::flag::Flags;
use crate::uid::{Uid, UidSet};
use std::path::PathBuf;

/// Transaction flags passed to [`Mailbox::begin_transaction`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TransactionFlags {
    /// The change was not requested by the user (e.g. made by a
    /// plugin) and must not be reported as a user action.
    pub external: bool,
    /// The transaction saves copies made by this plugin. Committing it
    /// never starts another round of copies.
    pub extra_copy: bool,
}

impl TransactionFlags {
    pub const NONE: Self = Self {
        external: false,
        extra_copy: false,
    };
    pub const EXTERNAL: Self = Self {
        external: true,
        extra_copy: false,
    };
    /// Flags of every transaction the copy executor opens.
    pub const EXTRA_COPY: Self = Self {
        external: true,
        extra_copy: true,
    };
}

/// Flags passed to [`Mailbox::sync`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SyncFlags {
    /// Refresh the folder view completely, so that every saved UID
    /// can be searched.
    pub full_read: bool,
}

impl SyncFlags {
    pub const FULL_READ: Self = Self { full_read: true };
}

/// How a storage backend lays out a mailbox on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKind {
    /// The whole mailbox is a single file (mbox-like); per-folder files
    /// live in the control directory.
    MailboxFile,
    /// The mailbox is a directory (maildir-like).
    Directory,
}

/// What a successful commit persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitChanges {
    /// UIDs assigned to messages saved (appended, delivered or copied)
    /// by the transaction.
    pub saved_uids: UidSet,
}

/// A readable message, as returned by a search.
pub trait Message {
    fn uid(&self) -> Uid;
    fn flags(&self) -> &Flags;
}

pub trait Transaction {
    fn flags(&self) -> TransactionFlags;
}

/// One folder of the host store.
pub trait Mailbox {
    type Message: Message;
    type Transaction: Transaction;
    /// Lazy search results, in ascending UID order.
    type Search: Iterator<Item = Result<Self::Message>>;

    fn name(&self) -> &str;

    fn storage_kind(&self) -> StorageKind;

    /// Directory holding the folder's control files, if any.
    fn control_dir(&self) -> Option<PathBuf>;

    /// Directory holding the folder's messages, if any.
    fn mailbox_dir(&self) -> Option<PathBuf>;

    /// # Errors
    ///
    /// Returns an error if the store cannot start a transaction.
    fn begin_transaction(&mut self, flags: TransactionFlags) -> Result<Self::Transaction>;

    /// Copy `message` into this folder as part of `tx`, keeping its
    /// flags and internal metadata.
    ///
    /// # Errors
    ///
    /// Returns an error if the message cannot be read or saved.
    fn save_copy(&mut self, tx: &mut Self::Transaction, message: &Self::Message) -> Result<()>;

    /// # Errors
    ///
    /// Returns an error if the transaction cannot be committed; nothing
    /// it contained is persisted then.
    fn commit(&mut self, tx: Self::Transaction) -> Result<CommitChanges>;

    fn rollback(&mut self, tx: Self::Transaction);

    /// # Errors
    ///
    /// Returns an error if the folder view cannot be refreshed.
    fn sync(&mut self, flags: SyncFlags) -> Result<()>;

    /// Find the messages of `uids` visible to `tx`.
    ///
    /// # Errors
    ///
    /// Returns an error if the search cannot be started.
    fn search(&mut self, tx: &Self::Transaction, uids: &UidSet) -> Result<Self::Search>;

    /// Release the folder. Called once; the handle is unusable after.
    fn close(&mut self);
}

/// The user's mail store: every namespace and folder the user can reach.
pub trait MailStore {
    type Namespace;
    type Mailbox: Mailbox;

    /// Namespace the folder `name` belongs to.
    fn find_namespace(&self, name: &str) -> Option<Self::Namespace>;

    /// Open the folder `name` of `namespace`.
    ///
    /// # Errors
    ///
    /// Returns an error if the folder does not exist or cannot be
    /// opened.
    fn open_mailbox(&self, namespace: &Self::Namespace, name: &str) -> Result<Self::Mailbox>;
}
