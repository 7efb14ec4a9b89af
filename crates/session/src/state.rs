use crate::slots::SlotKey;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::time::{Duration, Instant};

/// Session tuning. Defaults carry the reference constants; all of them are
/// configuration, not load-bearing values.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Rolling history bound (turns, user + assistant combined).
    pub max_history: usize,
    /// Clarifying questions allowed per session, total.
    pub max_asks: u32,
    /// Minimum gap between two clarifying questions.
    #[serde(with = "secs")]
    pub ask_cooldown: Duration,
    /// Idle time after which the sweep evicts a session.
    #[serde(with = "secs")]
    pub idle_ttl: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_history: 6,
            max_asks: 2,
            ask_cooldown: Duration::from_secs(90),
            idle_ttl: Duration::from_secs(3600),
        }
    }
}

mod secs {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(d)?))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryTurn {
    pub role: Role,
    pub content: String,
}

/// Per-user state. All mutation goes through methods so the invariants
/// (bounded history, capped monotonic ask count, first-writer-wins slots)
/// hold everywhere.
#[derive(Debug, Clone)]
pub struct SessionState {
    slots: BTreeMap<SlotKey, String>,
    asked: BTreeMap<SlotKey, bool>,
    ask_count: u32,
    last_asked_at: Option<Instant>,
    history: VecDeque<HistoryTurn>,
    last_turn_at: Instant,
}

impl SessionState {
    #[must_use]
    pub fn new(now: Instant) -> Self {
        Self {
            slots: BTreeMap::new(),
            asked: BTreeMap::new(),
            ask_count: 0,
            last_asked_at: None,
            history: VecDeque::new(),
            last_turn_at: now,
        }
    }

    #[must_use]
    pub fn slot(&self, key: SlotKey) -> Option<&str> {
        self.slots.get(&key).map(String::as_str)
    }

    /// Fill a slot only if currently empty (first-writer-wins). A filled
    /// slot is implicitly marked as asked so it is never asked again.
    pub fn fill_slot(&mut self, key: SlotKey, value: String) -> bool {
        if self.slots.contains_key(&key) {
            return false;
        }
        self.slots.insert(key, value);
        self.asked.insert(key, true);
        true
    }

    #[must_use]
    pub fn was_asked(&self, key: SlotKey) -> bool {
        self.asked.get(&key).copied().unwrap_or(false)
    }

    /// Whether the policy may pose a clarifying question now.
    #[must_use]
    pub fn can_ask(&self, now: Instant, config: &SessionConfig) -> bool {
        if self.ask_count >= config.max_asks {
            return false;
        }
        match self.last_asked_at {
            Some(at) => now.duration_since(at) >= config.ask_cooldown,
            None => true,
        }
    }

    /// Record that a clarifying question for `key` was asked.
    pub fn mark_asked(&mut self, key: SlotKey, now: Instant) {
        self.asked.insert(key, true);
        self.ask_count = self.ask_count.saturating_add(1);
        self.last_asked_at = Some(now);
    }

    #[must_use]
    pub fn ask_count(&self) -> u32 {
        self.ask_count
    }

    /// Append a turn, evicting the oldest when the bound is reached.
    pub fn push_history(&mut self, role: Role, content: String, config: &SessionConfig) {
        while self.history.len() >= config.max_history {
            self.history.pop_front();
        }
        self.history.push_back(HistoryTurn { role, content });
    }

    #[must_use]
    pub fn history(&self) -> impl Iterator<Item = &HistoryTurn> {
        self.history.iter()
    }

    #[must_use]
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn touch(&mut self, now: Instant) {
        self.last_turn_at = now;
    }

    #[must_use]
    pub fn idle_since(&self, now: Instant) -> Duration {
        now.duration_since(self.last_turn_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn config() -> SessionConfig {
        SessionConfig::default()
    }

    #[test]
    fn slot_first_writer_wins() {
        let mut state = SessionState::new(Instant::now());
        assert!(state.fill_slot(SlotKey::Age, "5".to_string()));
        assert!(!state.fill_slot(SlotKey::Age, "9".to_string()));
        assert_eq!(state.slot(SlotKey::Age), Some("5"));
    }

    #[test]
    fn filled_slot_is_marked_asked() {
        let mut state = SessionState::new(Instant::now());
        state.fill_slot(SlotKey::HairType, "curly".to_string());
        assert!(state.was_asked(SlotKey::HairType));
    }

    #[test]
    fn history_is_fifo_bounded() {
        let config = config();
        let mut state = SessionState::new(Instant::now());
        for i in 0..config.max_history + 3 {
            state.push_history(Role::User, format!("turn {i}"), &config);
        }
        assert_eq!(state.history_len(), config.max_history);
        let first = state.history().next().unwrap();
        assert_eq!(first.content, "turn 3");
    }

    #[test]
    fn ask_budget_is_capped() {
        let config = SessionConfig {
            ask_cooldown: Duration::ZERO,
            ..config()
        };
        let mut state = SessionState::new(Instant::now());
        let now = Instant::now();
        assert!(state.can_ask(now, &config));
        state.mark_asked(SlotKey::Age, now);
        assert!(state.can_ask(now, &config));
        state.mark_asked(SlotKey::HairType, now);
        assert!(!state.can_ask(now, &config));
        assert_eq!(state.ask_count(), 2);
    }

    #[test]
    fn ask_cooldown_blocks_back_to_back_questions() {
        let config = config();
        let mut state = SessionState::new(Instant::now());
        let now = Instant::now();
        state.mark_asked(SlotKey::Age, now);
        assert!(!state.can_ask(now, &config));
        assert!(state.can_ask(now + config.ask_cooldown, &config));
    }
}
