//! FSRS (Free Spaced Repetition Scheduler) algorithm.
//!
//! Modern algorithm based on memory research using DSR model:
//! - Difficulty (D): Card difficulty 1-10
//! - Stability (S): Days until retention drops to target
//! - Retrievability (R): Probability of recall

use super::{ReviewLog, Scheduler, SchedulingResult};
use crate::error::Result;
use crate::types::{Card, CardStatus, Rating};
use chrono::{DateTime, Duration, Utc};

const SECONDS_PER_DAY: f64 = 86400.0;

/// FSRS algorithm with configurable parameters.
#[derive(Debug, Clone)]
pub struct Fsrs {
    pub request_retention: f64,
    pub maximum_interval: f64,
    /// FSRS-4.5 parameters (17 weights).
    pub w: [f64; 17],
}

impl Default for Fsrs {
    fn default() -> Self {
        Self {
            request_retention: 0.9,
            maximum_interval: 36500.0,
            w: [
                0.4, 0.6, 2.4, 5.8, // w[0-3]: initial stability for Again, Hard, Good, Easy
                4.93,  // w[4]: initial difficulty base
                0.94,  // w[5]: initial difficulty modifier
                0.86,  // w[6]: difficulty decay
                0.01,  // w[7]: mean reversion weight
                1.49,  // w[8]: stability exp base
                0.14,  // w[9]: stability decay
                0.94,  // w[10]: retrievability effect
                2.18,  // w[11]: forget stability base
                0.05,  // w[12]: difficulty on forget
                0.34,  // w[13]: stability on forget
                1.26,  // w[14]: retrievability on forget
                0.29,  // w[15]: hard penalty
                2.61,  // w[16]: easy bonus
            ],
        }
    }
}

impl Scheduler for Fsrs {
    fn name(&self) -> &'static str {
        "fsrs"
    }

    fn schedule(&self, card: &Card, rating: Rating, now: DateTime<Utc>) -> Result<SchedulingResult> {
        let rating_value = rating.to_value();
        let elapsed = Self::elapsed_days(card, now);

        let (stability, difficulty, lapses) = if Self::is_first_review(card) {
            (
                self.initial_stability(rating_value),
                self.initial_difficulty(rating_value),
                card.lapses,
            )
        } else {
            self.next_memory_state(card, rating_value, elapsed)
        };
        let state = Self::determine_status(card.state, rating_value);

        let interval = match state {
            CardStatus::Learning | CardStatus::Relearning => self.short_term_interval(stability),
            CardStatus::Review | CardStatus::New => self.interval_from_stability(stability),
        };
        let due = now + Duration::seconds((interval * SECONDS_PER_DAY) as i64);

        let log = ReviewLog {
            card_id: card.id,
            rating,
            state: card.state,
            due: card.due,
            stability: card.stability,
            difficulty: card.difficulty,
            elapsed_days: elapsed,
            scheduled_days: card.scheduled_days,
            reviewed_at: now,
        };

        let card = Card {
            state,
            due,
            stability,
            difficulty,
            elapsed_days: elapsed,
            scheduled_days: interval,
            reps: card.reps + 1,
            lapses,
            last_review: Some(now),
            ..card.clone()
        };

        Ok(SchedulingResult { card, log })
    }
}

impl Fsrs {
    fn is_first_review(card: &Card) -> bool {
        card.reps == 0 || card.stability <= 0.0 || card.difficulty <= 0.0
    }

    /// Calculate initial stability for a new card based on first rating.
    /// S0(G) = w[G-1] where G is rating 1-4
    fn initial_stability(&self, rating: u8) -> f64 {
        let index = (rating.saturating_sub(1)) as usize;
        self.w[index.min(3)].max(0.1)
    }

    /// Calculate initial difficulty for a new card based on first rating.
    /// D0(G) = w[4] - w[5] * (G - 3)
    fn initial_difficulty(&self, rating: u8) -> f64 {
        let d0 = self.w[4] - self.w[5] * (rating as f64 - 3.0);
        d0.clamp(1.0, 10.0)
    }

    /// Calculate next difficulty using mean reversion.
    /// D' = w[7] * D0(G) + (1 - w[7]) * D
    /// Apply decay: D'' = D' - w[6] * (G - 3)
    fn next_difficulty(&self, current_d: f64, rating: u8) -> f64 {
        let d0 = self.initial_difficulty(rating);
        let d_new = self.w[7] * d0 + (1.0 - self.w[7]) * current_d;
        let d_decayed = d_new - self.w[6] * (rating as f64 - 3.0);
        d_decayed.clamp(1.0, 10.0)
    }

    /// Calculate retrievability (probability of recall).
    /// R = (1 + t / (9 * S))^(-1)
    fn retrievability(&self, elapsed_days: f64, stability: f64) -> f64 {
        if stability <= 0.0 {
            return 0.0;
        }
        let factor = 1.0 + elapsed_days / (9.0 * stability);
        factor.powf(-1.0)
    }

    /// Calculate next stability after successful recall.
    /// S' = S * (e^(w[8]) * (11 - D) * S^(-w[9]) * (e^(w[10]*(1-R)) - 1) + 1) * modifier
    fn next_stability_recall(
        &self,
        stability: f64,
        difficulty: f64,
        retrievability: f64,
        rating: u8,
    ) -> f64 {
        let exp_w8 = self.w[8].exp();
        let d_factor = (11.0 - difficulty).max(0.1);
        let s_decay = stability.powf(-self.w[9]);
        let r_factor = (self.w[10] * (1.0 - retrievability)).exp() - 1.0;

        let growth = exp_w8 * d_factor * s_decay * r_factor + 1.0;

        let modifier = match rating {
            2 => self.w[15],
            4 => self.w[16],
            _ => 1.0,
        };

        let new_s = stability * growth * modifier;
        new_s.max(0.1).min(self.maximum_interval)
    }

    /// Calculate next stability after forgetting (lapse).
    /// S' = w[11] * D^(-w[12]) * ((S+1)^w[13] - 1) * e^(w[14]*(1-R))
    fn next_stability_forget(&self, stability: f64, difficulty: f64, retrievability: f64) -> f64 {
        let d_factor = difficulty.max(1.0).powf(-self.w[12]);
        let s_factor = (stability + 1.0).powf(self.w[13]) - 1.0;
        let r_factor = (self.w[14] * (1.0 - retrievability)).exp();

        let new_s = self.w[11] * d_factor * s_factor * r_factor;
        // Never exceed previous stability on lapse
        new_s.max(0.1).min(stability)
    }

    /// Calculate optimal interval from stability.
    /// I = 9 * S * (1/R - 1) where R = request_retention
    fn interval_from_stability(&self, stability: f64) -> f64 {
        if self.request_retention <= 0.0 || self.request_retention >= 1.0 {
            return stability;
        }
        let interval = 9.0 * stability * (1.0 / self.request_retention - 1.0);
        interval.max(1.0).min(self.maximum_interval)
    }

    /// Short-term interval for learning/relearning states, 10 minutes to 1 day.
    fn short_term_interval(&self, stability: f64) -> f64 {
        let minutes = (stability * 60.0).max(10.0).min(1440.0);
        minutes / 1440.0
    }

    /// Days since the last review (0 for a card never reviewed).
    fn elapsed_days(card: &Card, now: DateTime<Utc>) -> f64 {
        match card.last_review {
            Some(last) => {
                let elapsed = now.signed_duration_since(last);
                (elapsed.num_seconds() as f64 / SECONDS_PER_DAY).max(0.0)
            }
            None => 0.0,
        }
    }

    /// Determine new status based on current status and rating.
    fn determine_status(current: CardStatus, rating: u8) -> CardStatus {
        match (current, rating) {
            (CardStatus::New, 1) => CardStatus::Learning,
            (CardStatus::New, _) => CardStatus::Review,
            (CardStatus::Learning, 1) => CardStatus::Learning,
            (CardStatus::Learning, _) => CardStatus::Review,
            (CardStatus::Review, 1) => CardStatus::Relearning,
            (CardStatus::Review, _) => CardStatus::Review,
            (CardStatus::Relearning, 1) => CardStatus::Relearning,
            (CardStatus::Relearning, _) => CardStatus::Review,
        }
    }

    /// Update stability, difficulty and lapses for a card with history.
    fn next_memory_state(&self, card: &Card, rating: u8, elapsed: f64) -> (f64, f64, u32) {
        let r = self.retrievability(elapsed, card.stability);
        let difficulty = self.next_difficulty(card.difficulty, rating);

        if rating == 1 {
            let stability = self.next_stability_forget(card.stability, card.difficulty, r);
            let lapses = match card.state {
                CardStatus::Review => card.lapses + 1,
                _ => card.lapses,
            };
            (stability, difficulty, lapses)
        } else {
            let stability = self.next_stability_recall(card.stability, card.difficulty, r, rating);
            (stability, difficulty, card.lapses)
        }
    }
}
