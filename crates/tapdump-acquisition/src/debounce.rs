//! Duplicate-tap suppression.
//!
//! Readers re-announce a tag for as long as it stays in the field. A
//! detection is dropped when it carries the same UID as the last accepted
//! one and arrives within the debounce window.

use std::time::Duration;
use tokio::time::Instant;

/// Last accepted detection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DebounceState {
    last_uid: Option<Vec<u8>>,
    last_seen: Option<Instant>,
}

impl DebounceState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide whether a detection of `uid` at `now` is new.
    ///
    /// Accepted detections become the new reference; dropped ones leave the
    /// state untouched, so the window is measured from the last accepted
    /// detection.
    pub fn accept(&mut self, uid: &[u8], now: Instant, window: Duration) -> bool {
        if self.is_duplicate(uid, now, window) {
            return false;
        }
        self.last_uid = Some(uid.to_vec());
        self.last_seen = Some(now);
        true
    }

    fn is_duplicate(&self, uid: &[u8], now: Instant, window: Duration) -> bool {
        match (&self.last_uid, self.last_seen) {
            (Some(last), Some(seen)) => {
                last.as_slice() == uid && now.saturating_duration_since(seen) < window
            }
            _ => false,
        }
    }

    /// Forget the last accepted detection.
    pub fn clear(&mut self) {
        self.last_uid = None;
        self.last_seen = None;
    }

    /// UID of the last accepted detection.
    pub fn last_uid(&self) -> Option<&[u8]> {
        self.last_uid.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const WINDOW: Duration = Duration::from_millis(2000);
    const UID: &[u8] = &[0x04, 0xA2, 0x5F, 0x11];
    const OTHER: &[u8] = &[0x04, 0xA2, 0x5F, 0x12];

    #[rstest]
    #[case(0, false)]
    #[case(1999, false)]
    #[case(2000, true)]
    #[case(5000, true)]
    fn test_same_uid(#[case] elapsed_ms: u64, #[case] accepted: bool) {
        let start = Instant::now();
        let mut state = DebounceState::new();

        assert!(state.accept(UID, start, WINDOW));
        assert_eq!(
            state.accept(UID, start + Duration::from_millis(elapsed_ms), WINDOW),
            accepted
        );
    }

    #[test]
    fn test_different_uid_always_accepted() {
        let start = Instant::now();
        let mut state = DebounceState::new();

        assert!(state.accept(UID, start, WINDOW));
        assert!(state.accept(OTHER, start, WINDOW));
        assert!(state.accept(UID, start, WINDOW));
        assert_eq!(state.last_uid(), Some(UID));
    }

    #[test]
    fn test_dropped_detection_does_not_extend_window() {
        let start = Instant::now();
        let mut state = DebounceState::new();

        assert!(state.accept(UID, start, WINDOW));
        assert!(!state.accept(UID, start + Duration::from_millis(1500), WINDOW));
        assert!(state.accept(UID, start + Duration::from_millis(2000), WINDOW));
    }

    #[test]
    fn test_clear() {
        let start = Instant::now();
        let mut state = DebounceState::new();

        assert!(state.accept(UID, start, WINDOW));
        state.clear();
        assert_eq!(state, DebounceState::default());
        assert!(state.accept(UID, start, WINDOW));
    }
}
