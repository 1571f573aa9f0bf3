//! Exercise modes and the maturity-to-modes assignment policy.
//!
//! Every card in a session gets a fixed mode queue drawn once when the
//! session starts. New and relearning cards open with an introductory mode
//! followed by active-recall modes; mature cards get fewer, harder modes.

use std::collections::HashSet;
use std::fmt;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{DrillError, Result};
use crate::types::CardStatus;

/// One interactive exercise type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseMode {
    Reading,
    Typing,
    Listening,
    MultipleChoice,
    Cloze,
    Spelling,
    AudioChoice,
}

impl ExerciseMode {
    pub const ALL: [ExerciseMode; 7] = [
        ExerciseMode::Reading,
        ExerciseMode::Typing,
        ExerciseMode::Listening,
        ExerciseMode::MultipleChoice,
        ExerciseMode::Cloze,
        ExerciseMode::Spelling,
        ExerciseMode::AudioChoice,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reading => "reading",
            Self::Typing => "typing",
            Self::Listening => "listening",
            Self::MultipleChoice => "multiple_choice",
            Self::Cloze => "cloze",
            Self::Spelling => "spelling",
            Self::AudioChoice => "audio_choice",
        }
    }

    /// Parse from string.
    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|mode| mode.as_str() == s)
    }

    /// Production-recall modes whose repeated failure marks a card as forgotten.
    pub fn is_hard(self) -> bool {
        match self {
            Self::Spelling | Self::Typing | Self::Listening => true,
            Self::Reading | Self::MultipleChoice | Self::Cloze | Self::AudioChoice => false,
        }
    }
}

impl fmt::Display for ExerciseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mode pool for one maturity state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModePool {
    /// Fixed mode always placed first, outside the shuffle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intro: Option<ExerciseMode>,
    /// Candidates for the shuffled part of the queue.
    pub pool: Vec<ExerciseMode>,
    /// How many candidates to draw from `pool`.
    pub pick: usize,
}

impl ModePool {
    /// Length of every queue drawn from this pool.
    pub fn queue_len(&self) -> usize {
        usize::from(self.intro.is_some()) + self.pick
    }

    fn validate(&self, state: CardStatus) -> Result<()> {
        let mut seen = HashSet::new();
        for mode in &self.pool {
            if !seen.insert(*mode) {
                return Err(DrillError::InvalidPolicy(format!(
                    "{} pool lists {} twice",
                    state.as_str(),
                    mode
                )));
            }
        }
        if let Some(intro) = self.intro {
            if seen.contains(&intro) {
                return Err(DrillError::InvalidPolicy(format!(
                    "{} intro mode {} is also in the pool",
                    state.as_str(),
                    intro
                )));
            }
        }
        if self.pick > self.pool.len() {
            return Err(DrillError::InvalidPolicy(format!(
                "{} pool has {} modes, cannot pick {}",
                state.as_str(),
                self.pool.len(),
                self.pick
            )));
        }
        Ok(())
    }

    fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<ExerciseMode> {
        let mut picks = self.pool.clone();
        picks.shuffle(rng);
        picks.truncate(self.pick);
        self.intro.into_iter().chain(picks).collect()
    }
}

/// Maturity state to mode pool mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModePolicy {
    pub new: ModePool,
    pub learning: ModePool,
    pub review: ModePool,
    pub relearning: ModePool,
}

impl Default for ModePolicy {
    fn default() -> Self {
        use ExerciseMode::*;

        Self {
            new: ModePool {
                intro: Some(Reading),
                pool: vec![MultipleChoice, Cloze, Typing, Listening, AudioChoice, Spelling],
                pick: 3,
            },
            learning: ModePool {
                intro: None,
                pool: vec![MultipleChoice, Cloze, Typing, Listening, AudioChoice],
                pick: 3,
            },
            review: ModePool {
                intro: None,
                pool: vec![Typing, Listening, Spelling, Cloze],
                pick: 2,
            },
            relearning: ModePool {
                intro: Some(Reading),
                pool: vec![MultipleChoice, Typing, Listening, AudioChoice],
                pick: 2,
            },
        }
    }
}

impl ModePolicy {
    pub fn pool(&self, state: CardStatus) -> &ModePool {
        match state {
            CardStatus::New => &self.new,
            CardStatus::Learning => &self.learning,
            CardStatus::Review => &self.review,
            CardStatus::Relearning => &self.relearning,
        }
    }

    /// Check that no pool can produce a queue with a repeated mode.
    pub fn validate(&self) -> Result<()> {
        for state in CardStatus::PRIORITY {
            self.pool(state).validate(state)?;
        }
        Ok(())
    }

    /// Draw the mode queue for a card in the given maturity state.
    ///
    /// One shuffle per call; the caller draws once per card per session.
    pub fn modes_for<R: Rng + ?Sized>(&self, state: CardStatus, rng: &mut R) -> Vec<ExerciseMode> {
        self.pool(state).draw(rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn default_queue_lengths() {
        let policy = ModePolicy::default();
        let mut rng = rng();
        assert_eq!(policy.modes_for(CardStatus::New, &mut rng).len(), 4);
        assert_eq!(policy.modes_for(CardStatus::Learning, &mut rng).len(), 3);
        assert_eq!(policy.modes_for(CardStatus::Review, &mut rng).len(), 2);
        assert_eq!(policy.modes_for(CardStatus::Relearning, &mut rng).len(), 3);
    }

    #[test]
    fn intro_mode_comes_first() {
        let policy = ModePolicy::default();
        let mut rng = rng();
        for _ in 0..20 {
            let modes = policy.modes_for(CardStatus::New, &mut rng);
            assert_eq!(modes[0], ExerciseMode::Reading);
            let modes = policy.modes_for(CardStatus::Relearning, &mut rng);
            assert_eq!(modes[0], ExerciseMode::Reading);
        }
    }

    #[test]
    fn queues_never_repeat_a_mode() {
        let policy = ModePolicy::default();
        let mut rng = rng();
        for _ in 0..50 {
            for state in CardStatus::PRIORITY {
                let modes = policy.modes_for(state, &mut rng);
                let unique: HashSet<_> = modes.iter().collect();
                assert_eq!(unique.len(), modes.len());
            }
        }
    }

    #[test]
    fn same_seed_same_queue() {
        let policy = ModePolicy::default();
        let a = policy.modes_for(CardStatus::Learning, &mut StdRng::seed_from_u64(99));
        let b = policy.modes_for(CardStatus::Learning, &mut StdRng::seed_from_u64(99));
        assert_eq!(a, b);
    }

    #[test]
    fn default_policy_is_valid() {
        assert!(ModePolicy::default().validate().is_ok());
    }

    #[test]
    fn duplicate_pool_entry_rejected() {
        let mut policy = ModePolicy::default();
        policy.review.pool = vec![ExerciseMode::Typing, ExerciseMode::Typing];
        assert!(matches!(policy.validate(), Err(DrillError::InvalidPolicy(_))));
    }

    #[test]
    fn intro_in_pool_rejected() {
        let mut policy = ModePolicy::default();
        policy.new.pool.push(ExerciseMode::Reading);
        assert!(matches!(policy.validate(), Err(DrillError::InvalidPolicy(_))));
    }

    #[test]
    fn oversized_pick_rejected() {
        let mut policy = ModePolicy::default();
        policy.review.pick = 9;
        assert!(matches!(policy.validate(), Err(DrillError::InvalidPolicy(_))));
    }

    #[test]
    fn empty_pool_gives_empty_queue() {
        let mut policy = ModePolicy::default();
        policy.review = ModePool {
            intro: None,
            pool: vec![],
            pick: 0,
        };
        assert!(policy.modes_for(CardStatus::Review, &mut rng()).is_empty());
    }

    #[test]
    fn hard_modes() {
        let hard: Vec<_> = ExerciseMode::ALL.into_iter().filter(|m| m.is_hard()).collect();
        assert_eq!(
            hard,
            vec![ExerciseMode::Typing, ExerciseMode::Listening, ExerciseMode::Spelling]
        );
    }

    #[test]
    fn parse_mode_names() {
        assert_eq!(ExerciseMode::from_str("audio_choice"), Some(ExerciseMode::AudioChoice));
        assert_eq!(ExerciseMode::from_str("dictation"), None);
    }
}
