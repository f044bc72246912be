//! Scoring rules for line clears
//!
//! Rows cleared in one lock are split into runs of adjacent indexes. Inside
//! a run every further row is worth 0.2x more than the one before it, so
//! stacked clears beat the same number of scattered rows.

use crate::error::EngineError;

/// Points for a single cleared row with no streak
pub const ROW_POINTS: u64 = 100;

/// Points per row when the lock was a special move
pub const SPECIAL_ROW_POINTS: u64 = 500;

/// Streak multiplier is kept in tenths to stay in integer math
const STREAK_BASE: u64 = 10;
const STREAK_STEP: u64 = 2;

/// Result of scoring a normal clear
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NormalClear {
    pub points: u64,
    /// Length of the longest run of adjacent rows
    pub largest_run: usize,
}

/// Score the sorted row indexes of a normal clear
pub fn normal_clear(indexes: &[usize]) -> NormalClear {
    let mut clear = NormalClear::default();
    let mut run = 0;

    for (i, &row) in indexes.iter().enumerate() {
        clear.points += ROW_POINTS * (STREAK_BASE + STREAK_STEP * run as u64) / STREAK_BASE;
        run += 1;

        let continues = indexes.get(i + 1).is_some_and(|&next| next == row + 1);
        if !continues {
            clear.largest_run = clear.largest_run.max(run);
            run = 0;
        }
    }

    clear
}

/// Flat bonus for a special-move clear of `rows` rows
pub fn special_clear(rows: usize) -> u64 {
    SPECIAL_ROW_POINTS * rows as u64
}

/// Feedback label shown while cleared rows animate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearLabel {
    Good,
    Double,
    Triple,
    Tetris,
    TSpin,
}

impl ClearLabel {
    /// Label for the largest run of a normal clear
    pub fn from_run(run: usize) -> Result<ClearLabel, EngineError> {
        match run {
            1 => Ok(ClearLabel::Good),
            2 => Ok(ClearLabel::Double),
            3 => Ok(ClearLabel::Triple),
            4 => Ok(ClearLabel::Tetris),
            other => Err(EngineError::InvalidClearLabel(other)),
        }
    }

    pub fn text(&self) -> &'static str {
        match self {
            ClearLabel::Good => "Good",
            ClearLabel::Double => "Double!",
            ClearLabel::Triple => "Triple!!!",
            ClearLabel::Tetris => "Tetris!!!!",
            ClearLabel::TSpin => "T-Spin!",
        }
    }
}

/// Running totals for one game
#[derive(Debug, Clone, Default)]
pub struct Score {
    /// Current score
    pub points: u64,
    /// Total rows cleared
    pub lines: u32,
    /// Largest run of the most recent normal clear
    pub last_clear_count: usize,
}

impl Score {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a normal clear and return what it was worth
    pub fn add_normal(&mut self, indexes: &[usize]) -> NormalClear {
        let clear = normal_clear(indexes);
        self.points += clear.points;
        self.lines += indexes.len() as u32;
        self.last_clear_count = clear.largest_run;
        clear
    }

    /// Add a special-move clear and return the bonus
    pub fn add_special(&mut self, indexes: &[usize]) -> u64 {
        let bonus = special_clear(indexes.len());
        self.points += bonus;
        self.lines += indexes.len() as u32;
        bonus
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_clear_scores_nothing() {
        assert_eq!(normal_clear(&[]), NormalClear { points: 0, largest_run: 0 });
    }

    #[test]
    fn test_single_clear() {
        let clear = normal_clear(&[19]);
        assert_eq!(clear.points, ROW_POINTS);
        assert_eq!(clear.largest_run, 1);
    }

    #[test]
    fn test_tetris_streak() {
        // 100 + 120 + 140 + 160
        let clear = normal_clear(&[16, 17, 18, 19]);
        assert_eq!(clear.points, 520);
        assert_eq!(clear.largest_run, 4);
    }

    #[test]
    fn test_streak_resets_between_runs() {
        // Run [10, 11] = 220, run [15] = 100, run [17, 18, 19] = 360
        let clear = normal_clear(&[10, 11, 15, 17, 18, 19]);
        assert_eq!(clear.points, 680);
        assert_eq!(clear.largest_run, 3);
    }

    #[test]
    fn test_adjacent_rows_beat_scattered_rows() {
        for k in 2..=4 {
            let adjacent: Vec<usize> = (0..k).collect();
            let scattered: Vec<usize> = (0..k).map(|i| i * 2).collect();
            assert!(normal_clear(&adjacent).points > normal_clear(&scattered).points);
        }
    }

    #[test]
    fn test_special_clear_is_per_row() {
        assert_eq!(special_clear(0), 0);
        assert_eq!(special_clear(2), 2 * SPECIAL_ROW_POINTS);
    }

    #[test]
    fn test_labels() {
        assert_eq!(ClearLabel::from_run(1).unwrap().text(), "Good");
        assert_eq!(ClearLabel::from_run(2).unwrap().text(), "Double!");
        assert_eq!(ClearLabel::from_run(3).unwrap().text(), "Triple!!!");
        assert_eq!(ClearLabel::from_run(4).unwrap().text(), "Tetris!!!!");
        assert_eq!(ClearLabel::from_run(0), Err(EngineError::InvalidClearLabel(0)));
        assert_eq!(ClearLabel::from_run(5), Err(EngineError::InvalidClearLabel(5)));
    }

    #[test]
    fn test_score_accumulates() {
        let mut score = Score::new();
        score.add_normal(&[18, 19]);
        assert_eq!(score.points, 220);
        assert_eq!(score.last_clear_count, 2);
        score.add_special(&[19]);
        assert_eq!(score.points, 220 + SPECIAL_ROW_POINTS);
        assert_eq!(score.lines, 3);
    }
}
