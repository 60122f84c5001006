//! Destination folder identifiers

use std::fmt;

/// A folder that receives extra copies.
///
/// Holds the name exactly as configured; resolving it to a namespace
/// and a mailbox is up to the host store.
///
/// # Examples
///
/// ```
/// use extra_copies::Destination;
///
/// let dest = Destination::new("Archive/All").unwrap();
/// assert_eq!(dest.as_str(), "Archive/All");
/// assert!(Destination::new("").is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Destination(String);

impl Destination {
    /// Returns `None` for an empty name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        if name.is_empty() { None } else { Some(Self(name)) }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this destination names `mailbox`. `INBOX` is
    /// case-insensitive, every other name is compared exactly.
    #[must_use]
    pub fn refers_to(&self, mailbox: &str) -> bool {
        if self.0.eq_ignore_ascii_case("inbox") {
            mailbox.eq_ignore_ascii_case("inbox")
        } else {
            self.0 == mailbox
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Destination {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
