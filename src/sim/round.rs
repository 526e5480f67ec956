/// Round bookkeeping: match count, countdown and the set-once outcome.
///
/// The outcome field is the single authority for "is the round over".
/// Whichever of win (match target reached) or loss (countdown hit zero)
/// lands first is kept; the other writer sees `conclude` return false.

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Outcome {
    InProgress,
    Won,
    Lost,
}

impl Outcome {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Outcome::InProgress)
    }
}

/// What one countdown tick did.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TickResult {
    /// Round already over; nothing changed.
    Stopped,
    /// Decremented; seconds left.
    Counted(u32),
    /// Reached zero; the caller should conclude the round as lost.
    Expired,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoundState {
    pub match_count: u32,
    pub pairs: u32,
    pub time_remaining: u32,
    outcome: Outcome,
}

impl RoundState {
    pub fn new(pairs: u32, countdown_secs: u32) -> Self {
        RoundState {
            match_count: 0,
            pairs,
            time_remaining: countdown_secs,
            outcome: Outcome::InProgress,
        }
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn is_over(&self) -> bool {
        self.outcome.is_terminal()
    }

    /// Set a terminal outcome once. Returns false if one was already set.
    pub fn conclude(&mut self, outcome: Outcome) -> bool {
        if self.is_over() || !outcome.is_terminal() {
            return false;
        }
        self.outcome = outcome;
        true
    }

    /// Count one match. Returns true when this match reaches the target.
    pub fn record_match(&mut self) -> bool {
        if self.is_over() || self.match_count >= self.pairs {
            return false;
        }
        self.match_count += 1;
        self.match_count == self.pairs
    }

    pub fn tick(&mut self) -> TickResult {
        if self.is_over() {
            return TickResult::Stopped;
        }
        self.time_remaining = self.time_remaining.saturating_sub(1);
        if self.time_remaining == 0 {
            TickResult::Expired
        } else {
            TickResult::Counted(self.time_remaining)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn countdown_expires_exactly_at_zero() {
        let mut r = RoundState::new(7, 3);
        assert_eq!(r.tick(), TickResult::Counted(2));
        assert_eq!(r.tick(), TickResult::Counted(1));
        assert_eq!(r.tick(), TickResult::Expired);
        assert_eq!(r.time_remaining, 0);
    }

    #[test]
    fn ticks_after_outcome_are_noops() {
        let mut r = RoundState::new(1, 10);
        assert!(r.record_match());
        assert!(r.conclude(Outcome::Won));
        assert_eq!(r.tick(), TickResult::Stopped);
        assert_eq!(r.time_remaining, 10);
    }

    #[test]
    fn outcome_is_set_once() {
        let mut r = RoundState::new(2, 5);
        assert!(r.conclude(Outcome::Lost));
        assert!(!r.conclude(Outcome::Won));
        assert!(!r.conclude(Outcome::Lost));
        assert_eq!(r.outcome(), Outcome::Lost);
    }

    #[test]
    fn in_progress_is_not_a_conclusion() {
        let mut r = RoundState::new(2, 5);
        assert!(!r.conclude(Outcome::InProgress));
        assert!(!r.is_over());
    }

    #[test]
    fn match_count_stops_at_target_and_after_outcome() {
        let mut r = RoundState::new(2, 5);
        assert!(!r.record_match());
        assert!(r.record_match());
        assert!(!r.record_match());
        assert_eq!(r.match_count, 2);

        let mut lost = RoundState::new(2, 5);
        lost.conclude(Outcome::Lost);
        assert!(!lost.record_match());
        assert_eq!(lost.match_count, 0);
    }
}
