//! Copy one message into one destination folder
//!
//! Each call is isolated: its own folder handle, its own transaction.
//! A failure is logged and returned as a [`CopyOutcome`]; it never
//! reaches the caller whose commit triggered the copy.

use crate::error::CopyError;
use crate::folder::Destination;
use crate::host::{MailStore, Mailbox, Message, TransactionFlags};
use std::ops::{Deref, DerefMut};
use tracing::{debug, error};

/// Result of copying one message into one destination.
#[derive(Debug)]
pub enum CopyOutcome {
    Copied,
    Failed(CopyError),
}

impl CopyOutcome {
    #[must_use]
    pub const fn is_copied(&self) -> bool {
        matches!(self, Self::Copied)
    }
}

/// Closes the wrapped folder when dropped.
struct OpenMailbox<M: Mailbox>(M);

impl<M: Mailbox> Deref for OpenMailbox<M> {
    type Target = M;

    fn deref(&self) -> &M {
        &self.0
    }
}

impl<M: Mailbox> DerefMut for OpenMailbox<M> {
    fn deref_mut(&mut self) -> &mut M {
        &mut self.0
    }
}

impl<M: Mailbox> Drop for OpenMailbox<M> {
    fn drop(&mut self) {
        self.0.close();
    }
}

/// Copy `message` into `destination`, keeping its flags.
///
/// The destination is looked up among the namespaces of `store`, opened,
/// and written in a transaction flagged [`TransactionFlags::EXTRA_COPY`],
/// which is rolled back if the copy fails.
pub fn copy_message<S: MailStore>(
    store: &S,
    message: &<S::Mailbox as Mailbox>::Message,
    destination: &Destination,
) -> CopyOutcome {
    match try_copy(store, message, destination) {
        Ok(()) => {
            debug!(
                "extra copies: made an extra copy of uid {} ({}) in {}",
                message.uid(),
                message.flags(),
                destination
            );
            CopyOutcome::Copied
        }
        Err(e) => {
            error!("extra copies: {}", e);
            CopyOutcome::Failed(e)
        }
    }
}

fn try_copy<S: MailStore>(
    store: &S,
    message: &<S::Mailbox as Mailbox>::Message,
    destination: &Destination,
) -> Result<(), CopyError> {
    let name = destination.as_str();
    let namespace = store
        .find_namespace(name)
        .ok_or_else(|| CopyError::DestinationNotFound(name.to_string()))?;

    let mut mailbox = store
        .open_mailbox(&namespace, name)
        .map(OpenMailbox)
        .map_err(|source| CopyError::Open {
            destination: name.to_string(),
            source,
        })?;

    let mut tx = mailbox
        .begin_transaction(TransactionFlags::EXTRA_COPY)
        .map_err(|source| CopyError::Begin {
            destination: name.to_string(),
            source,
        })?;

    if let Err(source) = mailbox.save_copy(&mut tx, message) {
        mailbox.rollback(tx);
        return Err(CopyError::Copy {
            destination: name.to_string(),
            source,
        });
    }

    mailbox
        .commit(tx)
        .map(|_| ())
        .map_err(|source| CopyError::Commit {
            destination: name.to_string(),
            source,
        })
}
