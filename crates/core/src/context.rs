//! Fixed-window conversation trimming.
//!
//! Keeps the first user turn (it usually names the starting point and
//! city of the route) plus the most recent `keep_last` turns.

use crate::message::{Message, Role};

/// Number of trailing turns kept when the caller does not say otherwise.
pub const DEFAULT_KEEP_LAST: usize = 8;

/// Trim a conversation to `[first user turn] + last keep_last turns`.
///
/// Histories of at most `keep_last + 1` turns come back unchanged. The
/// first user turn is not deduplicated against the tail: when it is also
/// one of the last `keep_last` turns it appears twice.
pub fn trim_context(history: &[Message], keep_last: usize) -> Vec<Message> {
    if history.len() <= keep_last.saturating_add(1) {
        return history.to_vec();
    }

    let first_user = history.iter().find(|m| m.role == Role::User);
    let tail = &history[history.len() - keep_last..];

    first_user.into_iter().chain(tail).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Alternating user/assistant history, numbered from 0.
    fn dialogue(len: usize) -> Vec<Message> {
        (0..len)
            .map(|i| {
                if i % 2 == 0 {
                    Message::user(format!("u{i}"))
                } else {
                    Message::assistant(format!("a{i}"))
                }
            })
            .collect()
    }

    #[test]
    fn short_history_unchanged() {
        for len in 0..=9 {
            let h = dialogue(len);
            assert_eq!(trim_context(&h, 8), h, "len {len}");
        }
    }

    #[test]
    fn keeps_first_user_and_tail() {
        let h = dialogue(12);
        let trimmed = trim_context(&h, 8);

        assert_eq!(trimmed.len(), 9);
        assert_eq!(trimmed[0], Message::user("u0"));
        assert_eq!(&trimmed[1..], &h[4..]);
    }

    #[test]
    fn no_user_turn_keeps_only_tail() {
        let h: Vec<Message> = (0..12).map(|i| Message::assistant(format!("a{i}"))).collect();
        let trimmed = trim_context(&h, 8);

        assert_eq!(trimmed.len(), 8);
        assert_eq!(&trimmed[..], &h[4..]);
    }

    #[test]
    fn first_user_turn_in_tail_is_duplicated() {
        // The only user turn is the very last one.
        let mut h: Vec<Message> = (0..4).map(|i| Message::assistant(format!("a{i}"))).collect();
        h.push(Message::user("late"));

        let trimmed = trim_context(&h, 2);
        assert_eq!(
            trimmed,
            vec![
                Message::user("late"),
                Message::assistant("a3"),
                Message::user("late"),
            ]
        );
    }

    #[test]
    fn zero_keep_last_keeps_first_user_only() {
        let h = dialogue(5);
        assert_eq!(trim_context(&h, 0), vec![Message::user("u0")]);
    }

    #[test]
    fn system_turns_are_not_treated_as_user() {
        let mut h = vec![Message::system("persona")];
        h.extend(dialogue(6));

        let trimmed = trim_context(&h, 3);
        assert_eq!(trimmed[0], Message::user("u0"));
        assert_eq!(&trimmed[1..], &h[4..]);
    }

    #[test]
    fn trimming_is_idempotent() {
        for len in 0..20 {
            for k in 0..10 {
                let h = dialogue(len);
                let once = trim_context(&h, k);
                assert_eq!(trim_context(&once, k), once, "len {len}, k {k}");
            }
        }
    }

    #[test]
    fn trimmed_shape_matches_tail() {
        for len in 0..20 {
            for k in 0..10 {
                let h = dialogue(len);
                if len <= k + 1 {
                    continue;
                }
                let out = trim_context(&h, k);
                assert!(out.len() == k || out.len() == k + 1, "len {len}, k {k}");
                assert_eq!(&out[out.len() - k..], &h[len - k..]);
            }
        }
    }
}
