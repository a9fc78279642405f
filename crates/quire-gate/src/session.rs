use std::collections::HashSet;

use quire_types::PublicationId;

/// Identifiers a reader's session has unlocked.
///
/// The set only grows: once a session unlocks a publication it stays
/// unlocked for the life of the session, even if the password changes.
/// Only [`crate::AccessGateway`] adds to it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UnlockSession {
    unlocked: HashSet<PublicationId>,
}

impl UnlockSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_unlocked(&self, id: &PublicationId) -> bool {
        self.unlocked.contains(id)
    }

    pub(crate) fn unlock(&mut self, id: PublicationId) -> bool {
        self.unlocked.insert(id)
    }

    /// Take over every unlock held by `other`.
    ///
    /// Lets a caller verify against a snapshot and fold the result back into
    /// the live session without ever removing an unlock.
    pub fn absorb(&mut self, other: UnlockSession) {
        self.unlocked.extend(other.unlocked);
    }

    pub fn len(&self) -> usize {
        self.unlocked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.unlocked.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PublicationId> {
        self.unlocked.iter()
    }
}
