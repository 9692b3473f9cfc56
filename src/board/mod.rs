//! The shared resource workers mutate
//!
//! An 8x8 board of opaque piece tokens. The only mutation is a relocation of
//! one token to an empty cell, so the number of occupied cells never changes.
//! Cell selection goes through a [`SelectionPolicy`] so tests can seed it.

use std::fmt;
use std::sync::{Arc, Mutex};
use rand::{rngs::SmallRng, Rng, SeedableRng};
use crate::{ChessBenchError, Result};

/// Board side length
pub const BOARD_SIZE: usize = 8;

/// An opaque board token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Piece(pub char);

/// A cell coordinate, `(row, column)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Square {
    pub row: usize,
    pub col: usize,
}

impl Square {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// A relocation that has been applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Move {
    pub piece: Piece,
    pub from: Square,
    pub to: Square,
}

/// 8x8 grid of optional tokens
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    cells: [[Option<Piece>; BOARD_SIZE]; BOARD_SIZE],
}

impl Board {
    /// A board with no tokens
    pub fn empty() -> Self {
        Self {
            cells: [[None; BOARD_SIZE]; BOARD_SIZE],
        }
    }

    /// The usual chess start: back rank and pawns on both sides
    pub fn starting_position() -> Self {
        let mut board = Self::empty();
        let rows = [
            (0, "RNBQKBNR"),
            (1, "PPPPPPPP"),
            (6, "pppppppp"),
            (7, "rnbqkbnr"),
        ];
        for (row, tokens) in rows {
            for (col, token) in tokens.chars().enumerate() {
                board.cells[row][col] = Some(Piece(token));
            }
        }
        board
    }

    pub fn get(&self, square: Square) -> Option<Piece> {
        self.cells[square.row][square.col]
    }

    pub fn set(&mut self, square: Square, piece: Option<Piece>) {
        self.cells[square.row][square.col] = piece;
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.iter().flatten().filter(|c| c.is_some()).count()
    }

    /// Squares holding a token, in row-major order
    pub fn occupied_squares(&self) -> Vec<Square> {
        self.squares_where(|cell| cell.is_some())
    }

    /// Squares with no token, in row-major order
    pub fn empty_squares(&self) -> Vec<Square> {
        self.squares_where(|cell| cell.is_none())
    }

    fn squares_where(&self, keep: impl Fn(&Option<Piece>) -> bool) -> Vec<Square> {
        let mut squares = Vec::new();
        for (row, cells) in self.cells.iter().enumerate() {
            for (col, cell) in cells.iter().enumerate() {
                if keep(cell) {
                    squares.push(Square::new(row, col));
                }
            }
        }
        squares
    }

    /// Move the token on `from` to the empty square `to`
    pub fn relocate(&mut self, from: Square, to: Square) -> Result<Move> {
        let piece = self.get(from).ok_or_else(|| {
            ChessBenchError::Precondition(format!("no piece on {:?}", from))
        })?;
        if self.get(to).is_some() {
            return Err(ChessBenchError::Precondition(format!(
                "target {:?} is occupied",
                to
            )));
        }
        self.set(to, Some(piece));
        self.set(from, None);
        Ok(Move { piece, from, to })
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::starting_position()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for cells in &self.cells {
            let line: String = cells.iter().map(|c| c.map_or('.', |p| p.0)).collect();
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

/// Chooses one index out of `len` candidates
pub trait SelectionPolicy: Send {
    /// `len` is always greater than zero
    fn pick(&mut self, len: usize) -> usize;
}

/// Uniform random selection backed by a small, seedable RNG
#[derive(Debug, Clone)]
pub struct RandomPolicy {
    rng: SmallRng,
}

impl RandomPolicy {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: SmallRng::from_entropy(),
        }
    }

    /// Seeded when a seed is given, entropy otherwise
    pub fn from_seed_option(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::from_entropy, Self::seeded)
    }
}

impl SelectionPolicy for RandomPolicy {
    fn pick(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }
}

/// A board plus the policy that picks its relocations.
///
/// The process-mode coordinator owns one of these directly as the single
/// writer; thread mode wraps it in a [`SharedBoard`].
pub struct SharedResource {
    board: Board,
    policy: Box<dyn SelectionPolicy>,
}

impl SharedResource {
    /// Fresh starting position with the given selection policy
    pub fn new(policy: impl SelectionPolicy + 'static) -> Self {
        Self::with_board(Board::starting_position(), policy)
    }

    pub fn with_board(board: Board, policy: impl SelectionPolicy + 'static) -> Self {
        Self {
            board,
            policy: Box::new(policy),
        }
    }

    /// Relocate a randomly chosen token to a randomly chosen empty square
    pub fn mutate(&mut self) -> Result<Move> {
        let occupied = self.board.occupied_squares();
        if occupied.is_empty() {
            return Err(ChessBenchError::Precondition(
                "no occupied cell to move from".to_string(),
            ));
        }
        let from = occupied[self.policy.pick(occupied.len())];

        let empty = self.board.empty_squares();
        if empty.is_empty() {
            return Err(ChessBenchError::Precondition(
                "no empty cell to move to".to_string(),
            ));
        }
        let to = empty[self.policy.pick(empty.len())];

        self.board.relocate(from, to)
    }

    pub fn occupied_count(&self) -> usize {
        self.board.occupied_count()
    }

    /// Read-only view of the board
    pub fn board(&self) -> &Board {
        &self.board
    }
}

impl fmt::Debug for SharedResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedResource")
            .field("board", &self.board)
            .finish_non_exhaustive()
    }
}

/// Cloneable handle that serialises mutations from concurrent workers
#[derive(Debug, Clone)]
pub struct SharedBoard {
    inner: Arc<Mutex<SharedResource>>,
}

impl SharedBoard {
    pub fn new(resource: SharedResource) -> Self {
        Self {
            inner: Arc::new(Mutex::new(resource)),
        }
    }

    /// Select and apply one relocation atomically with respect to other callers
    pub fn mutate(&self) -> Result<Move> {
        self.inner
            .lock()
            .map_err(|_| ChessBenchError::Worker("board lock poisoned".to_string()))?
            .mutate()
    }

    pub fn occupied_count(&self) -> Result<usize> {
        Ok(self
            .inner
            .lock()
            .map_err(|_| ChessBenchError::Worker("board lock poisoned".to_string()))?
            .occupied_count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    /// Always picks the first candidate
    struct FirstPolicy;

    impl SelectionPolicy for FirstPolicy {
        fn pick(&mut self, _len: usize) -> usize {
            0
        }
    }

    #[test]
    fn test_starting_position() {
        let board = Board::starting_position();
        assert_eq!(board.occupied_count(), 32);
        assert_eq!(board.empty_squares().len(), 32);
        assert_eq!(board.get(Square::new(0, 4)), Some(Piece('K')));
        assert_eq!(board.get(Square::new(7, 3)), Some(Piece('q')));
        assert_eq!(board.get(Square::new(3, 3)), None);
    }

    #[test]
    fn test_mutate_with_deterministic_policy() {
        let mut resource = SharedResource::new(FirstPolicy);
        let mv = resource.mutate().unwrap();
        assert_eq!(mv.piece, Piece('R'));
        assert_eq!(mv.from, Square::new(0, 0));
        assert_eq!(mv.to, Square::new(2, 0));
        assert_eq!(resource.board().get(Square::new(0, 0)), None);
        assert_eq!(resource.board().get(Square::new(2, 0)), Some(Piece('R')));
        assert_eq!(resource.occupied_count(), 32);
    }

    #[test]
    fn test_seeded_policy_is_reproducible() {
        let mut a = SharedResource::new(RandomPolicy::seeded(11));
        let mut b = SharedResource::new(RandomPolicy::seeded(11));
        for _ in 0..50 {
            assert_eq!(a.mutate().unwrap(), b.mutate().unwrap());
        }
        assert_eq!(a.board(), b.board());
        assert_eq!(a.occupied_count(), 32);
    }

    #[test]
    fn test_mutate_fails_without_pieces() {
        let mut resource = SharedResource::with_board(Board::empty(), FirstPolicy);
        match resource.mutate() {
            Err(ChessBenchError::Precondition(msg)) => assert!(msg.contains("occupied")),
            other => panic!("expected precondition error, got {:?}", other),
        }
    }

    #[test]
    fn test_mutate_fails_on_full_board() {
        let mut board = Board::empty();
        for row in 0..BOARD_SIZE {
            for col in 0..BOARD_SIZE {
                board.set(Square::new(row, col), Some(Piece('x')));
            }
        }
        let mut resource = SharedResource::with_board(board, FirstPolicy);
        match resource.mutate() {
            Err(ChessBenchError::Precondition(msg)) => assert!(msg.contains("empty")),
            other => panic!("expected precondition error, got {:?}", other),
        }
    }

    #[test]
    fn test_relocate_rejects_occupied_target() {
        let mut board = Board::starting_position();
        assert!(board.relocate(Square::new(0, 0), Square::new(1, 0)).is_err());
        assert!(board.relocate(Square::new(3, 0), Square::new(4, 0)).is_err());
    }

    #[test]
    fn test_concurrent_mutations_preserve_count() {
        let shared = SharedBoard::new(SharedResource::new(RandomPolicy::seeded(5)));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let shared = shared.clone();
                thread::spawn(move || {
                    for _ in 0..500 {
                        shared.mutate().unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(shared.occupied_count().unwrap(), 32);
    }

    #[test]
    fn test_display() {
        let rendered = Board::starting_position().to_string();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "RNBQKBNR");
        assert_eq!(lines[3], "........");
        assert_eq!(lines[7], "rnbqkbnr");
    }
}
