use std::time::{Duration, Instant};

pub const SEQUENCE_TIMEOUT: Duration = Duration::from_millis(1000);

/// Result of feeding one key to a [`KeySequence`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Step {
    /// The key started a sequence; nothing to do yet.
    Pending,
    /// Two keys completed a sequence, e.g. `"gg"`, `"zA"`.
    Sequence(String),
    /// A plain key, to be handled on its own.
    Key(String),
}

/// Recognizes the two-key bindings `gg`, `dd` and `z?`. A key that does not
/// complete the pending prefix, or arrives after the timeout, discards the
/// prefix and is handled as a fresh key.
#[derive(Clone, Debug)]
pub struct KeySequence {
    pending: Option<(String, Instant)>,
    timeout: Duration,
}

impl Default for KeySequence {
    fn default() -> Self {
        Self::new(SEQUENCE_TIMEOUT)
    }
}

impl KeySequence {
    pub fn new(timeout: Duration) -> Self {
        Self {
            pending: None,
            timeout,
        }
    }

    pub fn pending(&self) -> Option<&str> {
        self.pending.as_ref().map(|(prefix, _)| prefix.as_str())
    }

    pub fn reset(&mut self) {
        self.pending = None;
    }

    pub fn feed(&mut self, key: &str) -> Step {
        self.feed_at(key, Instant::now())
    }

    pub fn feed_at(&mut self, key: &str, now: Instant) -> Step {
        if let Some((prefix, started)) = self.pending.take() {
            let fresh = now.saturating_duration_since(started) <= self.timeout;
            if fresh && completes(&prefix, key) {
                return Step::Sequence(format!("{prefix}{key}"));
            }
        }
        if is_prefix(key) {
            self.pending = Some((key.to_string(), now));
            return Step::Pending;
        }
        Step::Key(key.to_string())
    }
}

fn is_prefix(key: &str) -> bool {
    matches!(key, "g" | "d" | "z")
}

fn completes(prefix: &str, key: &str) -> bool {
    match prefix {
        "g" => key == "g",
        "d" => key == "d",
        "z" => matches!(key, "a" | "A" | "o" | "O" | "c" | "C" | "M" | "R"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_pairs() {
        let mut seq = KeySequence::default();
        assert_eq!(seq.feed("g"), Step::Pending);
        assert_eq!(seq.feed("g"), Step::Sequence("gg".to_string()));
        assert_eq!(seq.feed("z"), Step::Pending);
        assert_eq!(seq.feed("M"), Step::Sequence("zM".to_string()));
    }

    #[test]
    fn unrelated_key_resets_and_passes_through() {
        let mut seq = KeySequence::default();
        assert_eq!(seq.feed("g"), Step::Pending);
        assert_eq!(seq.feed("j"), Step::Key("j".to_string()));
        assert_eq!(seq.pending(), None);
        assert_eq!(seq.feed("g"), Step::Pending);
        assert_eq!(seq.feed("d"), Step::Pending);
        assert_eq!(seq.pending(), Some("d"));
    }

    #[test]
    fn expired_prefix_starts_over() {
        let mut seq = KeySequence::new(Duration::from_millis(10));
        let start = Instant::now();
        assert_eq!(seq.feed_at("g", start), Step::Pending);
        let later = start + Duration::from_millis(50);
        assert_eq!(seq.feed_at("g", later), Step::Pending);
        assert_eq!(
            seq.feed_at("g", later + Duration::from_millis(1)),
            Step::Sequence("gg".to_string())
        );
    }
}
