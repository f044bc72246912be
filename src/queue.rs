//! Random piece selection and the lookahead queue
//!
//! Each upcoming piece is drawn independently from the seven playable types.
//! The source is injectable so scenarios can be replayed from a seed or a
//! fixed script.

use crate::tetromino::TetrominoType;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::VecDeque;

/// Default number of upcoming pieces kept in the queue
pub const DEFAULT_PREVIEW: usize = 3;

/// Anything that can pick the next piece type
pub trait PieceSource {
    fn draw(&mut self) -> TetrominoType;
}

/// Uniform random selection from a seedable generator
#[derive(Debug, Clone)]
pub struct RandomSource {
    rng: ChaCha8Rng,
}

impl RandomSource {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl PieceSource for RandomSource {
    fn draw(&mut self) -> TetrominoType {
        let types = TetrominoType::all();
        types[self.rng.gen_range(0..types.len())]
    }
}

/// Replays a fixed sequence, looping when it runs out
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    script: Vec<TetrominoType>,
    next: usize,
}

impl ScriptedSource {
    /// An empty script falls back to `T` pieces
    pub fn new(script: Vec<TetrominoType>) -> Self {
        Self { script, next: 0 }
    }
}

impl PieceSource for ScriptedSource {
    fn draw(&mut self) -> TetrominoType {
        let Some(&piece_type) = self.script.get(self.next % self.script.len().max(1)) else {
            return TetrominoType::T;
        };
        self.next += 1;
        piece_type
    }
}

/// Preview queue kept at a minimum depth
pub struct PieceQueue {
    source: Box<dyn PieceSource>,
    queue: VecDeque<TetrominoType>,
    depth: usize,
}

impl std::fmt::Debug for PieceQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PieceQueue")
            .field("queue", &self.queue)
            .field("depth", &self.depth)
            .finish_non_exhaustive()
    }
}

impl PieceQueue {
    /// Create a queue and fill it to `depth`
    pub fn new(source: Box<dyn PieceSource>, depth: usize) -> Self {
        let mut queue = Self {
            source,
            queue: VecDeque::with_capacity(depth + 1),
            depth,
        };
        queue.refill();
        queue
    }

    /// Seeded random queue
    pub fn with_seed(seed: u64, depth: usize) -> Self {
        Self::new(Box::new(RandomSource::with_seed(seed)), depth)
    }

    /// Take the next piece type, topping the queue back up
    pub fn next(&mut self) -> TetrominoType {
        if self.queue.is_empty() {
            self.queue.push_back(self.source.draw());
        }
        let next = self.queue.pop_front().unwrap_or(TetrominoType::T);
        self.refill();
        next
    }

    /// Upcoming piece types, nearest first
    pub fn preview(&self) -> Vec<TetrominoType> {
        self.queue.iter().copied().collect()
    }

    fn refill(&mut self) {
        while self.queue.len() < self.depth {
            self.queue.push_back(self.source.draw());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_queue_keeps_depth() {
        let mut queue = PieceQueue::with_seed(7, 5);
        assert_eq!(queue.preview().len(), 5);
        for _ in 0..20 {
            queue.next();
            assert_eq!(queue.preview().len(), 5);
        }
    }

    #[test]
    fn test_preview_predicts_next() {
        let mut queue = PieceQueue::with_seed(42, 3);
        for _ in 0..20 {
            let expected = queue.preview()[0];
            assert_eq!(queue.next(), expected);
        }
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = PieceQueue::with_seed(1234, 3);
        let mut b = PieceQueue::with_seed(1234, 3);
        let first: Vec<_> = (0..50).map(|_| a.next()).collect();
        let second: Vec<_> = (0..50).map(|_| b.next()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_random_source_only_draws_playable_types() {
        let mut source = RandomSource::with_seed(99);
        let drawn: HashSet<_> = (0..500).map(|_| source.draw()).collect();
        assert!(drawn.iter().all(|t| t.is_playable()));
        assert_eq!(drawn.len(), 7);
    }

    #[test]
    fn test_zero_depth_still_yields_pieces() {
        let script = vec![TetrominoType::I, TetrominoType::O];
        let mut queue = PieceQueue::new(Box::new(ScriptedSource::new(script)), 0);
        assert!(queue.preview().is_empty());
        assert_eq!(queue.next(), TetrominoType::I);
        assert_eq!(queue.next(), TetrominoType::O);
        assert_eq!(queue.next(), TetrominoType::I);
    }

    #[test]
    fn test_empty_script_falls_back() {
        let mut source = ScriptedSource::new(Vec::new());
        assert_eq!(source.draw(), TetrominoType::T);
    }
}
