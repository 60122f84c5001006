//! Commit interceptor
//!
//! [`ExtraCopiesMailbox`] wraps a host folder and forwards every
//! operation to it. After the host's own commit succeeds, the UIDs the
//! commit saved are resolved through a search and each message is
//! copied into every destination, in ascending UID order and, per
//! message, in destination-list order.
//!
//! With [`CommitPolicy::PerCommit`] this happens inside every commit.
//! With [`CommitPolicy::Deferred`] the UIDs are collected and copied in
//! one pass when the folder is closed (or dropped).
//!
//! Copies are written in transactions flagged
//! [`TransactionFlags::EXTRA_COPY`], and commits of such transactions
//! never fan out. A destination that is itself wrapped (including the
//! source folder, when it lists itself) therefore cannot start another
//! round of copies. Other external changes, such as deliveries, are
//! copied like any user append.

use crate::config::CommitPolicy;
use crate::copy::{CopyOutcome, copy_message};
use crate::error::Result;
use crate::folder::Destination;
use crate::host::{
    CommitChanges, MailStore, Mailbox, Message, StorageKind, SyncFlags, Transaction,
    TransactionFlags,
};
use crate::registry::DestinationRegistry;
use crate::uid::{Uid, UidSet};
use std::path::PathBuf;
use tracing::{debug, error, warn};

type MessageOf<S> = <<S as MailStore>::Mailbox as Mailbox>::Message;
type TransactionOf<S> = <<S as MailStore>::Mailbox as Mailbox>::Transaction;
type SearchOf<S> = <<S as MailStore>::Mailbox as Mailbox>::Search;

/// One copy attempt of a fan-out pass.
#[derive(Debug)]
pub struct FanOutEntry {
    pub uid: Uid,
    pub destination: Destination,
    pub outcome: CopyOutcome,
}

/// Every copy attempted by one fan-out pass, in attempt order.
#[derive(Debug, Default)]
pub struct FanOutReport {
    entries: Vec<FanOutEntry>,
}

impl FanOutReport {
    fn push(&mut self, uid: Uid, destination: Destination, outcome: CopyOutcome) {
        self.entries.push(FanOutEntry {
            uid,
            destination,
            outcome,
        });
    }

    #[must_use]
    pub fn entries(&self) -> &[FanOutEntry] {
        &self.entries
    }

    #[must_use]
    pub fn attempts(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn copied(&self) -> usize {
        self.entries.iter().filter(|e| e.outcome.is_copied()).count()
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.attempts() - self.copied()
    }
}

/// A host folder with extra copies enabled.
pub struct ExtraCopiesMailbox<S: MailStore> {
    inner: S::Mailbox,
    store: S,
    registry: DestinationRegistry,
    policy: CommitPolicy,
    pending: UidSet,
    closed: bool,
}

impl<S: MailStore> ExtraCopiesMailbox<S> {
    #[must_use]
    pub const fn new(
        inner: S::Mailbox,
        store: S,
        registry: DestinationRegistry,
        policy: CommitPolicy,
    ) -> Self {
        Self {
            inner,
            store,
            registry,
            policy,
            pending: UidSet::new(),
            closed: false,
        }
    }

    #[must_use]
    pub const fn destinations(&self) -> &DestinationRegistry {
        &self.registry
    }

    #[must_use]
    pub const fn policy(&self) -> CommitPolicy {
        self.policy
    }

    /// UIDs saved since the last fan-out. Always empty with
    /// [`CommitPolicy::PerCommit`].
    #[must_use]
    pub const fn pending(&self) -> &UidSet {
        &self.pending
    }

    /// The wrapped host folder.
    #[must_use]
    pub const fn inner(&self) -> &S::Mailbox {
        &self.inner
    }

    /// Copy the messages of `uids` into every destination.
    ///
    /// Never fails: every problem is logged and the pass goes on with
    /// whatever is still reachable.
    pub fn fan_out(&mut self, uids: &UidSet) -> FanOutReport {
        let mut report = FanOutReport::default();
        if uids.is_empty() || self.registry.is_empty() {
            return report;
        }

        // A stale view only costs search hits; copy whatever is found.
        if let Err(e) = self.inner.sync(SyncFlags::FULL_READ) {
            warn!("extra copies: cannot sync {}: {}", self.inner.name(), e);
        }

        let tx = match self.inner.begin_transaction(TransactionFlags::NONE) {
            Ok(tx) => tx,
            Err(e) => {
                error!(
                    "extra copies: cannot begin transaction in {}: {}",
                    self.inner.name(),
                    e
                );
                return report;
            }
        };

        match self.inner.search(&tx, uids) {
            Ok(search) => self.copy_all(search, &mut report),
            Err(e) => error!(
                "extra copies: cannot search uids {} in {}: {}",
                uids,
                self.inner.name(),
                e
            ),
        }

        if let Err(e) = self.inner.commit(tx) {
            warn!("extra copies: cannot close search in {}: {}", self.inner.name(), e);
        }

        self.log_report(&report);
        report
    }

    fn copy_all(&self, search: SearchOf<S>, report: &mut FanOutReport) {
        for found in search {
            let message: MessageOf<S> = match found {
                Ok(message) => message,
                Err(e) => {
                    error!("extra copies: cannot read saved mail: {}", e);
                    continue;
                }
            };

            debug!("extra copies: will copy newly saved uid {}", message.uid());
            for destination in &self.registry {
                if destination.refers_to(self.inner.name()) {
                    debug!(
                        "extra copies: {} lists itself, copying uid {} into it",
                        self.inner.name(),
                        message.uid()
                    );
                }
                let outcome = copy_message(&self.store, &message, destination);
                report.push(message.uid(), destination.clone(), outcome);
            }
        }
    }

    fn log_report(&self, report: &FanOutReport) {
        if report.failed() > 0 {
            warn!(
                "extra copies: {} of {} copies from {} failed",
                report.failed(),
                report.attempts(),
                self.inner.name()
            );
        } else {
            debug!(
                "extra copies: made {} copies from {}",
                report.copied(),
                self.inner.name()
            );
        }
    }

    fn flush_pending(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let uids = self.pending.take();
        self.fan_out(&uids);
    }
}

impl<S: MailStore> Mailbox for ExtraCopiesMailbox<S> {
    type Message = MessageOf<S>;
    type Transaction = TransactionOf<S>;
    type Search = SearchOf<S>;

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn storage_kind(&self) -> StorageKind {
        self.inner.storage_kind()
    }

    fn control_dir(&self) -> Option<PathBuf> {
        self.inner.control_dir()
    }

    fn mailbox_dir(&self) -> Option<PathBuf> {
        self.inner.mailbox_dir()
    }

    fn begin_transaction(&mut self, flags: TransactionFlags) -> Result<Self::Transaction> {
        self.inner.begin_transaction(flags)
    }

    fn save_copy(&mut self, tx: &mut Self::Transaction, message: &Self::Message) -> Result<()> {
        self.inner.save_copy(tx, message)
    }

    fn commit(&mut self, tx: Self::Transaction) -> Result<CommitChanges> {
        let extra_copy = tx.flags().extra_copy;
        let changes = self.inner.commit(tx)?;

        if changes.saved_uids.is_empty() {
            return Ok(changes);
        }
        if extra_copy {
            debug!(
                "extra copies: not copying uids {} again, they are extra copies",
                changes.saved_uids
            );
            return Ok(changes);
        }

        match self.policy {
            CommitPolicy::PerCommit => {
                self.fan_out(&changes.saved_uids);
            }
            CommitPolicy::Deferred => self.pending.merge(&changes.saved_uids),
        }
        Ok(changes)
    }

    fn rollback(&mut self, tx: Self::Transaction) {
        self.inner.rollback(tx);
    }

    fn sync(&mut self, flags: SyncFlags) -> Result<()> {
        self.inner.sync(flags)
    }

    fn search(&mut self, tx: &Self::Transaction, uids: &UidSet) -> Result<Self::Search> {
        self.inner.search(tx, uids)
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.flush_pending();
        self.closed = true;
        self.inner.close();
    }
}

impl<S: MailStore> Drop for ExtraCopiesMailbox<S> {
    fn drop(&mut self) {
        if !self.closed && !self.pending.is_empty() {
            warn!(
                "extra copies: {} dropped without close, copying pending uids {}",
                self.inner.name(),
                self.pending
            );
            self.flush_pending();
        }
    }
}
