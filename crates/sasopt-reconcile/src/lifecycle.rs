//! Edit-session tokens
//!
//! An editor keeps its in-progress state for as long as its token stays the
//! same. A new token tells the editor to discard that state and reload from
//! the table it is handed.

use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Opaque editor reset token
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EditToken(pub Ulid);

impl std::fmt::Display for EditToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One token per configuration index
///
/// Tokens are strictly increasing across the lifetime of the value, so a
/// reissued token never equals any earlier one.
#[derive(Debug, Clone)]
pub struct EditSessions {
    tokens: Vec<EditToken>,
    last: Ulid,
    issued: u64,
}

impl Default for EditSessions {
    fn default() -> Self {
        Self::new()
    }
}

impl EditSessions {
    /// Create without tokens
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            tokens: Vec::new(),
            last: Ulid::nil(),
            issued: 0,
        }
    }

    /// Discard all tokens and issue fresh ones for `len` indices
    pub fn reset_all(&mut self, len: usize) {
        let tokens = (0..len).map(|_| self.issue()).collect();
        self.tokens = tokens;
        tracing::debug!("Reset edit sessions for {} configurations", len);
    }

    /// Issue a new token for `index`
    ///
    /// Returns `None` (issuing nothing) if `index` has no session.
    pub fn refresh(&mut self, index: usize) -> Option<EditToken> {
        if index >= self.tokens.len() {
            return None;
        }
        let token = self.issue();
        self.tokens[index] = token;
        tracing::debug!("Refreshed edit session {} -> {}", index, token);
        Some(token)
    }

    /// Current token of `index`
    #[inline]
    #[must_use]
    pub fn token(&self, index: usize) -> Option<EditToken> {
        self.tokens.get(index).copied()
    }

    /// Current tokens in index order
    #[inline]
    #[must_use]
    pub fn tokens(&self) -> &[EditToken] {
        &self.tokens
    }

    /// Number of sessions
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Check if there are no sessions
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Total tokens issued so far
    #[inline]
    #[must_use]
    pub fn issued(&self) -> u64 {
        self.issued
    }

    fn issue(&mut self) -> EditToken {
        let fresh = Ulid::new();
        let next = if fresh > self.last {
            fresh
        } else {
            self.last.increment().unwrap_or(fresh)
        };
        self.last = next;
        self.issued += 1;
        EditToken(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn reset_all_issues_distinct_tokens() {
        let mut sessions = EditSessions::new();
        sessions.reset_all(3);

        assert_eq!(sessions.len(), 3);
        let unique: HashSet<_> = sessions.tokens().iter().collect();
        assert_eq!(unique.len(), 3);
        assert_eq!(sessions.issued(), 3);
    }

    #[test]
    fn reset_all_replaces_every_token() {
        let mut sessions = EditSessions::new();
        sessions.reset_all(2);
        let before = sessions.tokens().to_vec();

        sessions.reset_all(2);
        for (old, new) in before.iter().zip(sessions.tokens()) {
            assert_ne!(old, new);
        }
    }

    #[test]
    fn consecutive_refreshes_differ() {
        let mut sessions = EditSessions::new();
        sessions.reset_all(1);

        let mut previous = sessions.token(0).unwrap();
        for _ in 0..1000 {
            let next = sessions.refresh(0).unwrap();
            assert!(next > previous);
            previous = next;
        }
    }

    #[test]
    fn refresh_touches_only_its_index() {
        let mut sessions = EditSessions::new();
        sessions.reset_all(3);
        let before = sessions.tokens().to_vec();

        sessions.refresh(1);
        assert_eq!(sessions.token(0), Some(before[0]));
        assert_ne!(sessions.token(1), Some(before[1]));
        assert_eq!(sessions.token(2), Some(before[2]));
    }

    #[test]
    fn refresh_out_of_range_issues_nothing() {
        let mut sessions = EditSessions::new();
        sessions.reset_all(1);
        assert_eq!(sessions.refresh(5), None);
        assert_eq!(sessions.issued(), 1);
    }
}
