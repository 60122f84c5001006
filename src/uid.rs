//! Message UIDs and UID sets
//!
//! A [`UidSet`] is what a commit reports as newly saved and what the
//! deferred policy accumulates over a folder session. It stores
//! inclusive ranges, so a long run of appends costs one entry.

use std::collections::BTreeMap;
use std::fmt;
use std::num::NonZeroU32;
use std::ops::Bound::{Excluded, Included, Unbounded};

/// A folder-scoped message identifier, assigned once the message is
/// persisted. Never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Uid(NonZeroU32);

impl Uid {
    /// Returns `None` for zero.
    #[must_use]
    pub const fn new(uid: u32) -> Option<Self> {
        match NonZeroU32::new(uid) {
            Some(uid) => Some(Self(uid)),
            None => None,
        }
    }

    #[must_use]
    pub const fn get(self) -> u32 {
        self.0.get()
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An ordered set of UIDs.
///
/// Keys of the map are range starts, values are inclusive range ends.
/// Ranges never overlap nor touch.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct UidSet {
    parts: BTreeMap<u32, u32>,
}

impl UidSet {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            parts: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, uid: Uid) {
        self.insert_raw(uid.get(), uid.get());
    }

    /// Union `other` into this set.
    pub fn merge(&mut self, other: &Self) {
        for (&start, &end) in &other.parts {
            self.insert_raw(start, end);
        }
    }

    fn insert_raw(&mut self, start: u32, mut end: u32) {
        // Swallow every following range that overlaps or touches.
        loop {
            let following = self
                .parts
                .range((Excluded(start), Unbounded))
                .next()
                .map(|(&s, &e)| (s, e));
            match following {
                Some((next_start, next_end)) if next_start - 1 <= end => {
                    end = end.max(next_end);
                    self.parts.remove(&next_start);
                }
                _ => break,
            }
        }

        let preceding = self
            .parts
            .range((Unbounded, Included(start)))
            .next_back()
            .map(|(&s, &e)| (s, e));
        if let Some((prev_start, prev_end)) = preceding
            && prev_end.saturating_add(1) >= start
        {
            self.parts.insert(prev_start, prev_end.max(end));
            return;
        }

        self.parts.insert(start, end);
    }

    #[must_use]
    pub fn contains(&self, uid: Uid) -> bool {
        let uid = uid.get();
        self.parts
            .range(..=uid)
            .next_back()
            .is_some_and(|(_, &end)| end >= uid)
    }

    /// Number of UIDs in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.parts
            .iter()
            .map(|(&start, &end)| (end - start) as usize + 1)
            .sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Empty the set, returning what it held.
    pub fn take(&mut self) -> Self {
        std::mem::take(self)
    }

    /// UIDs in strictly ascending order.
    pub fn iter(&self) -> impl Iterator<Item = Uid> + '_ {
        self.parts
            .iter()
            .flat_map(|(&start, &end)| start..=end)
            .filter_map(Uid::new)
    }
}

impl FromIterator<Uid> for UidSet {
    fn from_iter<I: IntoIterator<Item = Uid>>(iter: I) -> Self {
        let mut set = Self::new();
        for uid in iter {
            set.insert(uid);
        }
        set
    }
}

/// IMAP sequence-set syntax, e.g. `1:3,7`.
impl fmt::Display for UidSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (ix, (&start, &end)) in self.parts.iter().enumerate() {
            let delim = if ix == 0 { "" } else { "," };
            if start == end {
                write!(f, "{delim}{start}")?;
            } else {
                write!(f, "{delim}{start}:{end}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for UidSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UidSet[{self}]")
    }
}
