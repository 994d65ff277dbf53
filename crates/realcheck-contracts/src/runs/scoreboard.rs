use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scoreboard {
    pub rounds: u64,
    pub correct: u64,
    pub streak: u64,
    pub best_streak: u64,
}

impl Scoreboard {
    pub fn record(&mut self, correct: bool) {
        self.rounds += 1;
        if correct {
            self.correct += 1;
            self.streak += 1;
            self.best_streak = self.best_streak.max(self.streak);
        } else {
            self.streak = 0;
        }
    }

    /// Share of correct guesses in `0.0..=1.0`; zero before the first round.
    pub fn accuracy(&self) -> f64 {
        if self.rounds == 0 {
            return 0.0;
        }
        self.correct as f64 / self.rounds as f64
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::Scoreboard;

    #[test]
    fn streak_resets_on_miss_and_best_is_kept() {
        let mut score = Scoreboard::default();
        for correct in [true, true, true, false, true] {
            score.record(correct);
        }
        assert_eq!(score.rounds, 5);
        assert_eq!(score.correct, 4);
        assert_eq!(score.streak, 1);
        assert_eq!(score.best_streak, 3);
        assert!((score.accuracy() - 0.8).abs() < f64::EPSILON);
    }

    #[test]
    fn accuracy_is_zero_without_rounds() {
        assert_eq!(Scoreboard::default().accuracy(), 0.0);
    }
}
