//! Extra copies of newly added mail
//!
//! Makes additional copies of messages in other folders whenever a
//! message is added (appended, delivered or copied) to a given folder.
//! A folder opts in with an `extra-copies` file in its directory,
//! listing one destination folder per line.
//!
//! The host store calls [`ExtraCopiesPlugin::mailbox_allocated`] when
//! it opens a folder. Folders with destinations come back wrapped in an
//! [`ExtraCopiesMailbox`], which copies every message a commit saved
//! into each destination once the host's commit has succeeded. Copy
//! failures are logged through [`tracing`] and never change what the
//! original commit returns.

mod config;
mod copy;
mod error;
mod flag;
mod folder;
mod hook;
mod host;
mod interceptor;
mod registry;
mod uid;

pub use config::{CommitPolicy, DEFAULT_FILE_NAME, ExtraCopiesConfig};
pub use copy::{CopyOutcome, copy_message};
pub use error::{CopyError, Error, Result};
pub use flag::{Flag, Flags};
pub use folder::Destination;
pub use hook::{ExtraCopiesPlugin, HookedMailbox};
pub use host::{
    CommitChanges, MailStore, Mailbox, Message, StorageKind, SyncFlags, Transaction,
    TransactionFlags,
};
pub use interceptor::{ExtraCopiesMailbox, FanOutEntry, FanOutReport};
pub use registry::DestinationRegistry;
pub use uid::{Uid, UidSet};
