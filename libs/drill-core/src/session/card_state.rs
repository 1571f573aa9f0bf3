//! Session-scoped progress of one card through its mode queue.
//!
//! `CardStudyState` is a value: applying an answer returns a new state and
//! leaves the old one untouched.

use crate::error::{DrillError, Result};
use crate::modes::ExerciseMode;
use crate::rating::{self, ModeAttempts, RatingBreakdown};
use crate::types::{CardId, CardStatus};

/// What an accepted answer did to a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Mode passed, more modes remain.
    Passed,
    /// Mode failed and is queued for a retry.
    Failed,
    /// Last outstanding mode passed.
    Completed,
    /// A mode ran out of attempts; the card is finalised as Again.
    Exhausted,
}

impl Transition {
    pub fn is_final(self) -> bool {
        matches!(self, Self::Completed | Self::Exhausted)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CardStudyState<V> {
    card_id: CardId,
    vocabulary: V,
    original_state: CardStatus,
    mode_queue: Vec<ExerciseMode>,
    current_mode_index: usize,
    retry_queue: Vec<ExerciseMode>,
    mode_attempts: ModeAttempts,
    used_hint: bool,
    is_complete: bool,
    exhausted: bool,
}

impl<V: Clone> CardStudyState<V> {
    /// A card with an empty mode queue starts out complete.
    pub fn new(card_id: CardId, vocabulary: V, original_state: CardStatus, mode_queue: Vec<ExerciseMode>) -> Self {
        let is_complete = mode_queue.is_empty();
        Self {
            card_id,
            vocabulary,
            original_state,
            mode_queue,
            current_mode_index: 0,
            retry_queue: Vec::new(),
            mode_attempts: ModeAttempts::new(),
            used_hint: false,
            is_complete,
            exhausted: false,
        }
    }

    pub fn card_id(&self) -> CardId {
        self.card_id
    }

    pub fn vocabulary(&self) -> &V {
        &self.vocabulary
    }

    pub fn original_state(&self) -> CardStatus {
        self.original_state
    }

    pub fn mode_queue(&self) -> &[ExerciseMode] {
        &self.mode_queue
    }

    pub fn current_mode_index(&self) -> usize {
        self.current_mode_index
    }

    pub fn retry_queue(&self) -> &[ExerciseMode] {
        &self.retry_queue
    }

    pub fn mode_attempts(&self) -> &ModeAttempts {
        &self.mode_attempts
    }

    pub fn used_hint(&self) -> bool {
        self.used_hint
    }

    pub fn is_complete(&self) -> bool {
        self.is_complete
    }

    /// Whether the card has cleared the given round's barrier.
    pub fn is_past_round(&self, round: usize) -> bool {
        self.is_complete || self.current_mode_index > round
    }

    /// The mode to show for this card in `round`, if any.
    ///
    /// A card that has run ahead of the round only gets its failed modes;
    /// otherwise it gets its next scheduled mode once the round allows it.
    pub fn current_mode(&self, round: usize) -> Option<ExerciseMode> {
        if self.is_complete {
            return None;
        }
        let retry = self.retry_queue.first().copied();
        let exhausted = self.current_mode_index >= self.mode_queue.len();

        if retry.is_some() && self.current_mode_index > round {
            retry
        } else if self.current_mode_index <= round && !exhausted {
            Some(self.mode_queue[self.current_mode_index])
        } else if exhausted {
            retry
        } else {
            None
        }
    }

    /// Composite rating, available once the card is complete.
    ///
    /// A card with no exercises has no failures and rates as a clean run.
    pub fn rating(&self) -> Option<RatingBreakdown> {
        if !self.is_complete {
            return None;
        }
        if self.exhausted {
            Some(rating::exhausted(&self.mode_attempts, self.used_hint))
        } else {
            Some(rating::breakdown(&self.mode_attempts, self.used_hint))
        }
    }

    /// Apply one answer for `mode` in `round`.
    ///
    /// Answers for anything other than the currently resolved mode are
    /// rejected without producing a new state.
    pub fn apply(
        &self,
        mode: ExerciseMode,
        passed: bool,
        used_hint: bool,
        round: usize,
        max_attempts: Option<u32>,
    ) -> Result<(Self, Transition)> {
        if self.is_complete {
            return Err(DrillError::CardComplete(self.card_id));
        }
        let expected = self.current_mode(round);
        if expected != Some(mode) {
            return Err(DrillError::StaleAnswer {
                card_id: self.card_id,
                expected,
                got: mode,
            });
        }

        let mut next = self.clone();
        next.used_hint |= used_hint;
        let attempts = next.mode_attempts.entry(mode).or_insert(0);
        *attempts += 1;
        let attempts = *attempts;

        if passed {
            next.retry_queue.retain(|queued| *queued != mode);
            if !next.retry_queue.is_empty() {
                return Ok((next, Transition::Passed));
            }
            if next.current_mode_index + 1 >= next.mode_queue.len() {
                next.current_mode_index = next.mode_queue.len();
                next.is_complete = true;
                return Ok((next, Transition::Completed));
            }
            next.current_mode_index += 1;
            return Ok((next, Transition::Passed));
        }

        if !next.retry_queue.contains(&mode) {
            next.retry_queue.push(mode);
        }
        if max_attempts.is_some_and(|cap| attempts >= cap) {
            next.retry_queue.clear();
            next.current_mode_index = next.mode_queue.len();
            next.is_complete = true;
            next.exhausted = true;
            return Ok((next, Transition::Exhausted));
        }
        Ok((next, Transition::Failed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Rating;
    use pretty_assertions::assert_eq;
    use ExerciseMode::*;

    fn state(modes: Vec<ExerciseMode>) -> CardStudyState<&'static str> {
        CardStudyState::new(1, "perro", CardStatus::New, modes)
    }

    fn pass(s: &CardStudyState<&'static str>, mode: ExerciseMode, round: usize) -> CardStudyState<&'static str> {
        s.apply(mode, true, false, round, None).unwrap().0
    }

    fn fail(s: &CardStudyState<&'static str>, mode: ExerciseMode, round: usize) -> CardStudyState<&'static str> {
        s.apply(mode, false, false, round, None).unwrap().0
    }

    #[test]
    fn empty_queue_is_complete() {
        let s = state(vec![]);
        assert!(s.is_complete());
        assert_eq!(s.current_mode(0), None);
        assert_eq!(s.rating().unwrap().rating, Rating::Easy);
    }

    #[test]
    fn completes_after_one_pass_per_mode() {
        let s = state(vec![Reading, Typing, Cloze]);
        let s = pass(&s, Reading, 0);
        assert_eq!(s.current_mode_index(), 1);
        let s = pass(&s, Typing, 1);
        assert!(!s.is_complete());
        let (s, transition) = s.apply(Cloze, true, false, 2, None).unwrap();
        assert_eq!(transition, Transition::Completed);
        assert!(s.is_complete());
        assert_eq!(s.current_mode_index(), 3);
        assert_eq!(s.rating().unwrap().rating, Rating::Easy);
    }

    #[test]
    fn next_mode_waits_for_round() {
        let s = pass(&state(vec![Reading, Typing]), Reading, 0);
        assert_eq!(s.current_mode(0), None);
        assert_eq!(s.current_mode(1), Some(Typing));
        assert!(s.is_past_round(0));
        assert!(!s.is_past_round(1));
    }

    #[test]
    fn failed_mode_is_retried_once() {
        let s = state(vec![Typing, Cloze]);
        let s = fail(&s, Typing, 0);
        let s = fail(&s, Typing, 0);
        assert_eq!(s.retry_queue(), &[Typing]);
        assert_eq!(s.mode_attempts()[&Typing], 2);
        assert_eq!(s.current_mode_index(), 0);
        assert_eq!(s.current_mode(0), Some(Typing));

        let s = pass(&s, Typing, 0);
        assert!(s.retry_queue().is_empty());
        assert_eq!(s.mode_attempts()[&Typing], 3);
        assert_eq!(s.current_mode_index(), 1);
    }

    #[test]
    fn attempts_count_failures_plus_pass() {
        let s = state(vec![Cloze]);
        let s = fail(&s, Cloze, 0);
        let s = pass(&s, Cloze, 0);
        let rating = s.rating().unwrap();
        assert_eq!(rating.total_fails, 1);
        assert_eq!(rating.rating, Rating::Good);
    }

    #[test]
    fn stale_mode_rejected_without_change() {
        let s = state(vec![Reading, Typing]);
        let err = s.apply(Typing, true, false, 0, None).unwrap_err();
        assert!(matches!(
            err,
            DrillError::StaleAnswer {
                expected: Some(Reading),
                got: Typing,
                ..
            }
        ));
        assert_eq!(s.current_mode_index(), 0);
        assert!(s.mode_attempts().is_empty());
    }

    #[test]
    fn complete_card_rejects_answers() {
        let s = pass(&state(vec![Reading]), Reading, 0);
        assert!(matches!(
            s.apply(Reading, true, false, 1, None),
            Err(DrillError::CardComplete(1))
        ));
    }

    #[test]
    fn apply_leaves_original_untouched() {
        let s = state(vec![Reading, Typing]);
        let (next, _) = s.apply(Reading, false, true, 0, None).unwrap();
        assert!(s.mode_attempts().is_empty());
        assert!(!s.used_hint());
        assert!(next.used_hint());
        assert_eq!(next.retry_queue(), &[Reading]);
    }

    #[test]
    fn hint_sticks_for_the_session() {
        let s = state(vec![Reading, Typing]);
        let (s, _) = s.apply(Reading, true, true, 0, None).unwrap();
        let s = pass(&s, Typing, 1);
        assert!(s.used_hint());
        assert_eq!(s.rating().unwrap().rating, Rating::Good);
    }

    #[test]
    fn retry_cap_finalises_as_again() {
        let s = state(vec![Spelling, Cloze]);
        let (s, transition) = s.apply(Spelling, false, false, 0, Some(2)).unwrap();
        assert_eq!(transition, Transition::Failed);
        let (s, transition) = s.apply(Spelling, false, false, 0, Some(2)).unwrap();
        assert_eq!(transition, Transition::Exhausted);
        assert!(s.is_complete());
        assert!(s.retry_queue().is_empty());
        assert_eq!(s.current_mode(0), None);
        assert_eq!(s.rating().unwrap().rating, Rating::Again);
    }
}
