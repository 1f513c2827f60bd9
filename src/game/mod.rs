//! Game model for infinity tic-tac-toe

pub mod state;

pub use state::{GameState, MoveOutcome, BOARD_SIZE, MAX_MARKS_PER_SIDE};
