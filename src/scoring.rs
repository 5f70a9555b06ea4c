//! Point computation for all play modes.
//!
//! One engine, parameterized by [`ScoringRules`]. Multiplayer rooms use the
//! flat room formula; solo play and gamble matches use the streak formula.
//! The tables can be overridden through the JSON config file.

use serde::{Deserialize, Serialize};

use crate::state::room::Difficulty;

/// How a player's turn on one question resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Picked the correct option with `time_left` seconds remaining.
    Correct {
        /// Seconds left on the question clock at submission.
        time_left: u32,
    },
    /// Picked a wrong option.
    Wrong,
    /// Let the clock run out without picking.
    Timeout,
}

/// Result of scoring one streak-mode answer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Award {
    /// Whole points earned on this question.
    pub points: i64,
    /// Fractional running-score penalty (timeouts only, kept as `f64`).
    pub penalty: f64,
    /// Streak value to carry into the next question.
    pub next_streak: u32,
}

/// All scoring constants in one place.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoringRules {
    /// Flat base for a correct room-mode answer.
    pub room_base: i64,
    /// Seconds of remaining time per room-mode bonus point.
    pub room_seconds_per_bonus: u32,
    /// Cap on the room-mode time bonus.
    pub room_bonus_cap: i64,
    /// Streak-mode base for easy questions.
    pub base_easy: i64,
    /// Streak-mode base for medium questions.
    pub base_medium: i64,
    /// Streak-mode base for hard questions.
    pub base_hard: i64,
    /// Maximum streak-mode speed bonus (scaled by fraction of time left).
    pub speed_bonus_max: i64,
    /// Points per consecutive correct answer.
    pub streak_step: i64,
    /// Running-score penalty applied on a timeout.
    pub timeout_penalty: f64,
    /// Aggregate multiplier for easy quizzes.
    pub multiplier_easy: f64,
    /// Aggregate multiplier for medium quizzes.
    pub multiplier_medium: f64,
    /// Aggregate multiplier for hard quizzes.
    pub multiplier_hard: f64,
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self {
            room_base: 10,
            room_seconds_per_bonus: 6,
            room_bonus_cap: 5,
            base_easy: 10,
            base_medium: 15,
            base_hard: 20,
            speed_bonus_max: 10,
            streak_step: 5,
            timeout_penalty: 0.5,
            multiplier_easy: 1.0,
            multiplier_medium: 1.2,
            multiplier_hard: 1.5,
        }
    }
}

impl ScoringRules {
    fn base(&self, difficulty: Difficulty) -> i64 {
        match difficulty {
            Difficulty::Easy => self.base_easy,
            Difficulty::Medium => self.base_medium,
            Difficulty::Hard => self.base_hard,
        }
    }

    fn multiplier(&self, difficulty: Difficulty) -> f64 {
        match difficulty {
            Difficulty::Easy => self.multiplier_easy,
            Difficulty::Medium => self.multiplier_medium,
            Difficulty::Hard => self.multiplier_hard,
        }
    }

    /// Room mode: flat base plus a capped time bonus, nothing for misses.
    pub fn room_points(&self, outcome: Outcome) -> i64 {
        match outcome {
            Outcome::Correct { time_left } => {
                let bonus =
                    i64::from(time_left / self.room_seconds_per_bonus).min(self.room_bonus_cap);
                self.room_base + bonus
            }
            Outcome::Wrong | Outcome::Timeout => 0,
        }
    }

    /// Streak mode (solo and gamble): difficulty base, speed bonus scaled by
    /// the fraction of time left, and a bonus for the streak carried into
    /// this question. Misses and timeouts score zero and reset the streak;
    /// timeouts additionally charge the fractional penalty.
    pub fn streak_award(
        &self,
        difficulty: Difficulty,
        question_duration: u32,
        streak: u32,
        outcome: Outcome,
    ) -> Award {
        match outcome {
            Outcome::Correct { time_left } => {
                let duration = question_duration.max(1);
                let speed = (u64::from(time_left) * self.speed_bonus_max as u64
                    / u64::from(duration)) as i64;
                Award {
                    points: self.base(difficulty) + speed + i64::from(streak) * self.streak_step,
                    penalty: 0.0,
                    next_streak: streak + 1,
                }
            }
            Outcome::Wrong => Award {
                points: 0,
                penalty: 0.0,
                next_streak: 0,
            },
            Outcome::Timeout => Award {
                points: 0,
                penalty: self.timeout_penalty,
                next_streak: 0,
            },
        }
    }

    /// Post-quiz aggregate persisted for solo history.
    pub fn aggregate_points(&self, correct_count: u32, difficulty: Difficulty) -> i64 {
        (f64::from(correct_count) * 10.0 * self.multiplier(difficulty)).round() as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_points_cap_the_time_bonus() {
        let rules = ScoringRules::default();
        assert_eq!(rules.room_points(Outcome::Correct { time_left: 30 }), 15);
        assert_eq!(rules.room_points(Outcome::Correct { time_left: 60 }), 15);
        assert_eq!(rules.room_points(Outcome::Correct { time_left: 11 }), 11);
        assert_eq!(rules.room_points(Outcome::Correct { time_left: 0 }), 10);
    }

    #[test]
    fn room_misses_score_zero() {
        let rules = ScoringRules::default();
        assert_eq!(rules.room_points(Outcome::Wrong), 0);
        assert_eq!(rules.room_points(Outcome::Timeout), 0);
    }

    #[test]
    fn hard_answer_with_full_clock_and_streak_two() {
        let rules = ScoringRules::default();
        let award = rules.streak_award(
            Difficulty::Hard,
            30,
            2,
            Outcome::Correct { time_left: 30 },
        );
        assert_eq!(award.points, 40);
        assert_eq!(award.next_streak, 3);
        assert_eq!(award.penalty, 0.0);
    }

    #[test]
    fn speed_bonus_scales_with_time_left() {
        let rules = ScoringRules::default();
        let award = rules.streak_award(
            Difficulty::Easy,
            30,
            0,
            Outcome::Correct { time_left: 15 },
        );
        assert_eq!(award.points, 15);

        let award = rules.streak_award(
            Difficulty::Medium,
            60,
            1,
            Outcome::Correct { time_left: 0 },
        );
        assert_eq!(award.points, 20);
    }

    #[test]
    fn wrong_answer_resets_streak_without_penalty() {
        let rules = ScoringRules::default();
        let award = rules.streak_award(Difficulty::Hard, 30, 4, Outcome::Wrong);
        assert_eq!(award.points, 0);
        assert_eq!(award.next_streak, 0);
        assert_eq!(award.penalty, 0.0);
    }

    #[test]
    fn timeout_resets_streak_and_charges_half_point() {
        let rules = ScoringRules::default();
        let award = rules.streak_award(Difficulty::Medium, 30, 3, Outcome::Timeout);
        assert_eq!(award.points, 0);
        assert_eq!(award.next_streak, 0);
        assert_eq!(award.penalty, 0.5);
    }

    #[test]
    fn aggregate_rounds_after_multiplier() {
        let rules = ScoringRules::default();
        assert_eq!(rules.aggregate_points(8, Difficulty::Hard), 120);
        assert_eq!(rules.aggregate_points(7, Difficulty::Medium), 84);
        assert_eq!(rules.aggregate_points(9, Difficulty::Easy), 90);
        assert_eq!(rules.aggregate_points(3, Difficulty::Hard), 45);
        assert_eq!(rules.aggregate_points(0, Difficulty::Hard), 0);
    }

    #[test]
    fn zero_duration_does_not_divide_by_zero() {
        let rules = ScoringRules::default();
        let award =
            rules.streak_award(Difficulty::Easy, 0, 0, Outcome::Correct { time_left: 0 });
        assert_eq!(award.points, 10);
    }
}
