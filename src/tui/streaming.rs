// Streaming indicator state for the title bar
//
//   [Idle] ──submit──▶ [Waiting] ──fragment──▶ [Streaming]
//     ▲                    │                        │
//     └──────finished / failed / cancelled──────────┘
//
// Waiting covers the gap between sending the request and the first token,
// which is where a slow backend spends most of its time.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StreamingState {
    #[default]
    Idle,
    Waiting,
    Streaming,
}

#[derive(Debug, Default)]
pub struct StreamingStateMachine {
    state: StreamingState,
    started: Option<Instant>,
    fragments: usize,
}

impl StreamingStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> StreamingState {
        self.state
    }

    pub fn on_submit(&mut self, now: Instant) {
        self.state = StreamingState::Waiting;
        self.started = Some(now);
        self.fragments = 0;
    }

    pub fn on_fragment(&mut self) {
        if self.state != StreamingState::Idle {
            self.state = StreamingState::Streaming;
            self.fragments += 1;
        }
    }

    pub fn on_end(&mut self) {
        self.state = StreamingState::Idle;
    }

    /// Time since the current (or last) request was sent
    pub fn elapsed(&self, now: Instant) -> Option<Duration> {
        self.started.map(|at| now.saturating_duration_since(at))
    }

    pub fn fragments(&self) -> usize {
        self.fragments
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_is_idle() {
        let sm = StreamingStateMachine::new();
        assert_eq!(sm.state(), StreamingState::Idle);
        assert_eq!(sm.elapsed(Instant::now()), None);
    }

    #[test]
    fn test_full_cycle() {
        let mut sm = StreamingStateMachine::new();
        let start = Instant::now();

        sm.on_submit(start);
        assert_eq!(sm.state(), StreamingState::Waiting);

        sm.on_fragment();
        sm.on_fragment();
        assert_eq!(sm.state(), StreamingState::Streaming);
        assert_eq!(sm.fragments(), 2);

        sm.on_end();
        assert_eq!(sm.state(), StreamingState::Idle);
        assert_eq!(
            sm.elapsed(start + Duration::from_millis(40)),
            Some(Duration::from_millis(40))
        );
    }

    #[test]
    fn test_stray_fragment_after_end_is_ignored() {
        let mut sm = StreamingStateMachine::new();
        sm.on_submit(Instant::now());
        sm.on_end();
        sm.on_fragment();
        assert_eq!(sm.state(), StreamingState::Idle);
        assert_eq!(sm.fragments(), 0);
    }
}
