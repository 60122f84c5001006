//! Attachment hook
//!
//! The host calls [`ExtraCopiesPlugin::mailbox_allocated`] for every
//! folder it opens and keeps using the returned [`HookedMailbox`] in
//! place of its own handle.

use crate::config::ExtraCopiesConfig;
use crate::error::Result;
use crate::host::{CommitChanges, MailStore, Mailbox, StorageKind, SyncFlags, TransactionFlags};
use crate::interceptor::ExtraCopiesMailbox;
use crate::registry::DestinationRegistry;
use crate::uid::UidSet;
use std::path::PathBuf;
use tracing::{debug, error};

/// The extra-copies plugin
#[derive(Debug, Clone, Default)]
pub struct ExtraCopiesPlugin {
    config: ExtraCopiesConfig,
}

impl ExtraCopiesPlugin {
    #[must_use]
    pub const fn new(config: ExtraCopiesConfig) -> Self {
        Self { config }
    }

    /// Create the plugin from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn from_env() -> Result<Self> {
        ExtraCopiesConfig::from_env().map(Self::new)
    }

    #[must_use]
    pub const fn config(&self) -> &ExtraCopiesConfig {
        &self.config
    }

    /// Attach to a freshly allocated folder.
    ///
    /// Only a folder whose destination list exists and names at least
    /// one destination gets the commit interceptor; every other folder
    /// is handed back untouched.
    pub fn mailbox_allocated<S>(&self, store: &S, mailbox: S::Mailbox) -> HookedMailbox<S>
    where
        S: MailStore + Clone,
    {
        match self.load_destinations(&mailbox) {
            Some(registry) if !registry.is_empty() => {
                debug!(
                    "extra copies: {} has {} destination(s), policy {}",
                    mailbox.name(),
                    registry.len(),
                    self.config.policy
                );
                HookedMailbox::ExtraCopies(ExtraCopiesMailbox::new(
                    mailbox,
                    store.clone(),
                    registry,
                    self.config.policy,
                ))
            }
            _ => HookedMailbox::Plain(mailbox),
        }
    }

    fn load_destinations<M: Mailbox>(&self, mailbox: &M) -> Option<DestinationRegistry> {
        if mailbox.name().is_empty() {
            return None;
        }

        let dir = match mailbox.storage_kind() {
            StorageKind::MailboxFile => mailbox.control_dir(),
            StorageKind::Directory => mailbox.mailbox_dir(),
        }?;

        match DestinationRegistry::load(&dir, &self.config.file_name) {
            Ok(registry) => registry,
            Err(e) => {
                error!(
                    "extra copies: open({}) failed: {}",
                    dir.join(&self.config.file_name).display(),
                    e
                );
                None
            }
        }
    }
}

/// A host folder as returned by the attachment hook.
pub enum HookedMailbox<S: MailStore> {
    /// No destinations configured; every call goes straight to the host.
    Plain(S::Mailbox),
    ExtraCopies(ExtraCopiesMailbox<S>),
}

impl<S: MailStore> HookedMailbox<S> {
    /// Whether commits on this folder are copied anywhere.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::ExtraCopies(_))
    }

    #[must_use]
    pub const fn destinations(&self) -> Option<&DestinationRegistry> {
        match self {
            Self::Plain(_) => None,
            Self::ExtraCopies(mailbox) => Some(mailbox.destinations()),
        }
    }
}

macro_rules! delegate {
    ($self:ident, $mailbox:ident => $call:expr) => {
        match $self {
            HookedMailbox::Plain($mailbox) => $call,
            HookedMailbox::ExtraCopies($mailbox) => $call,
        }
    };
}

impl<S: MailStore> Mailbox for HookedMailbox<S> {
    type Message = <S::Mailbox as Mailbox>::Message;
    type Transaction = <S::Mailbox as Mailbox>::Transaction;
    type Search = <S::Mailbox as Mailbox>::Search;

    fn name(&self) -> &str {
        delegate!(self, m => m.name())
    }

    fn storage_kind(&self) -> StorageKind {
        delegate!(self, m => m.storage_kind())
    }

    fn control_dir(&self) -> Option<PathBuf> {
        delegate!(self, m => m.control_dir())
    }

    fn mailbox_dir(&self) -> Option<PathBuf> {
        delegate!(self, m => m.mailbox_dir())
    }

    fn begin_transaction(&mut self, flags: TransactionFlags) -> Result<Self::Transaction> {
        delegate!(self, m => m.begin_transaction(flags))
    }

    fn save_copy(&mut self, tx: &mut Self::Transaction, message: &Self::Message) -> Result<()> {
        delegate!(self, m => m.save_copy(tx, message))
    }

    fn commit(&mut self, tx: Self::Transaction) -> Result<CommitChanges> {
        delegate!(self, m => m.commit(tx))
    }

    fn rollback(&mut self, tx: Self::Transaction) {
        delegate!(self, m => m.rollback(tx));
    }

    fn sync(&mut self, flags: SyncFlags) -> Result<()> {
        delegate!(self, m => m.sync(flags))
    }

    fn search(&mut self, tx: &Self::Transaction, uids: &UidSet) -> Result<Self::Search> {
        delegate!(self, m => m.search(tx, uids))
    }

    fn close(&mut self) {
        delegate!(self, m => m.close());
    }
}
