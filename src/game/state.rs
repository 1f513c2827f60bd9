//! Sliding-window board model for a single room
//!
//! Each side keeps at most [`MAX_MARKS_PER_SIDE`] marks on the board. Placing
//! one more evicts that side's oldest mark, strictly first-in first-out.

use crate::error::{RoomError, RoomResult};
use crate::types::Mark;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Number of cells on the board
pub const BOARD_SIZE: usize = 9;

/// Marks a side may have live at once
pub const MAX_MARKS_PER_SIDE: usize = 3;

const WINNING_LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// Result of applying a single move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveOutcome {
    /// Mark that was placed
    pub mark: Mark,
    /// Cell the mark was placed on
    pub index: usize,
    /// Cell cleared by the sliding window, if any
    pub evicted: Option<usize>,
}

/// Board state for one match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub board: [Option<Mark>; BOARD_SIZE],
    pub x_moves: VecDeque<usize>,
    pub o_moves: VecDeque<usize>,
    pub is_x_next: bool,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState {
    /// Fresh board with X to move
    pub fn new() -> Self {
        Self {
            board: [None; BOARD_SIZE],
            x_moves: VecDeque::with_capacity(MAX_MARKS_PER_SIDE + 1),
            o_moves: VecDeque::with_capacity(MAX_MARKS_PER_SIDE + 1),
            is_x_next: true,
        }
    }

    /// Mark whose turn it is
    pub fn next_mark(&self) -> Mark {
        if self.is_x_next {
            Mark::X
        } else {
            Mark::O
        }
    }

    /// Live move queue for a mark, oldest first
    pub fn moves_for(&self, mark: Mark) -> &VecDeque<usize> {
        match mark {
            Mark::X => &self.x_moves,
            Mark::O => &self.o_moves,
        }
    }

    fn moves_for_mut(&mut self, mark: Mark) -> &mut VecDeque<usize> {
        match mark {
            Mark::X => &mut self.x_moves,
            Mark::O => &mut self.o_moves,
        }
    }

    /// Place the next mark at `index`, evicting that side's oldest mark when
    /// it would exceed the window.
    ///
    /// Only structural checks are made here (range and vacancy); whether the
    /// game is already won is left to the clients.
    pub fn apply_move(&mut self, index: usize) -> RoomResult<MoveOutcome> {
        let cell = self
            .board
            .get(index)
            .ok_or_else(|| RoomError::InvalidMove {
                index,
                reason: format!("index must be below {}", BOARD_SIZE),
            })?;
        if let Some(occupant) = cell {
            return Err(RoomError::InvalidMove {
                index,
                reason: format!("cell already holds {}", occupant),
            });
        }

        let mark = self.next_mark();
        let moves = self.moves_for_mut(mark);
        moves.push_back(index);
        let evicted = if moves.len() > MAX_MARKS_PER_SIDE {
            moves.pop_front()
        } else {
            None
        };

        self.board[index] = Some(mark);
        if let Some(oldest) = evicted {
            self.board[oldest] = None;
        }
        self.is_x_next = !self.is_x_next;

        Ok(MoveOutcome {
            mark,
            index,
            evicted,
        })
    }

    /// Mark holding a complete line, if any
    pub fn winner(&self) -> Option<Mark> {
        WINNING_LINES.iter().find_map(|&[a, b, c]| {
            let mark = self.board[a]?;
            (self.board[b] == Some(mark) && self.board[c] == Some(mark)).then_some(mark)
        })
    }

    /// Cell that vanishes on the next move of the side to move
    pub fn fading_index(&self) -> Option<usize> {
        let moves = self.moves_for(self.next_mark());
        if moves.len() == MAX_MARKS_PER_SIDE {
            moves.front().copied()
        } else {
            None
        }
    }

    /// Number of marks currently on the board
    pub fn occupied_cells(&self) -> usize {
        self.board.iter().filter(|cell| cell.is_some()).count()
    }

    /// Check the queue/board consistency rules
    pub fn is_consistent(&self) -> bool {
        if self.x_moves.len() > MAX_MARKS_PER_SIDE || self.o_moves.len() > MAX_MARKS_PER_SIDE {
            return false;
        }
        let queued_match = [Mark::X, Mark::O].iter().all(|&mark| {
            self.moves_for(mark)
                .iter()
                .all(|&i| self.board.get(i).copied().flatten() == Some(mark))
        });
        queued_match && self.occupied_cells() == self.x_moves.len() + self.o_moves.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_fresh_state() {
        let state = GameState::new();
        assert!(state.board.iter().all(Option::is_none));
        assert!(state.x_moves.is_empty());
        assert!(state.o_moves.is_empty());
        assert!(state.is_x_next);
        assert_eq!(state, GameState::default());
    }

    #[test]
    fn test_moves_alternate() {
        let mut state = GameState::new();
        let first = state.apply_move(4).unwrap();
        assert_eq!(first.mark, Mark::X);
        assert_eq!(first.evicted, None);
        assert!(!state.is_x_next);

        let second = state.apply_move(0).unwrap();
        assert_eq!(second.mark, Mark::O);
        assert_eq!(state.board[4], Some(Mark::X));
        assert_eq!(state.board[0], Some(Mark::O));
        assert!(state.is_x_next);
    }

    #[test]
    fn test_fourth_mark_evicts_oldest() {
        let mut state = GameState::new();
        // X plays 0, 1, 2, 3 while O plays 6, 7, 8
        for (x, o) in [(0, 6), (1, 7), (2, 8)] {
            state.apply_move(x).unwrap();
            state.apply_move(o).unwrap();
        }
        let outcome = state.apply_move(3).unwrap();

        assert_eq!(outcome.evicted, Some(0));
        assert_eq!(state.board[0], None);
        assert_eq!(state.board[1], Some(Mark::X));
        assert_eq!(state.board[2], Some(Mark::X));
        assert_eq!(state.board[3], Some(Mark::X));
        assert_eq!(state.x_moves, VecDeque::from(vec![1, 2, 3]));
        assert_eq!(state.o_moves, VecDeque::from(vec![6, 7, 8]));
        assert!(state.is_consistent());
    }

    #[test]
    fn test_evicted_cell_can_be_reused() {
        let mut state = GameState::new();
        for i in [0, 6, 1, 7, 2, 8, 3] {
            state.apply_move(i).unwrap();
        }
        // O's oldest is 6; O plays on the freshly cleared 0
        let outcome = state.apply_move(0).unwrap();
        assert_eq!(outcome.mark, Mark::O);
        assert_eq!(outcome.evicted, Some(6));
        assert_eq!(state.board[6], None);
        assert_eq!(state.o_moves, VecDeque::from(vec![7, 8, 0]));
    }

    #[test]
    fn test_rejects_out_of_range_and_occupied() {
        let mut state = GameState::new();
        assert!(matches!(
            state.apply_move(9),
            Err(RoomError::InvalidMove { index: 9, .. })
        ));
        state.apply_move(4).unwrap();
        let before = state.clone();
        assert!(state.apply_move(4).is_err());
        assert_eq!(state, before);
    }

    #[test]
    fn test_winner_detection() {
        let mut state = GameState::new();
        assert_eq!(state.winner(), None);
        for i in [0, 3, 1, 4, 2] {
            state.apply_move(i).unwrap();
        }
        assert_eq!(state.winner(), Some(Mark::X));
    }

    #[test]
    fn test_fading_index() {
        let mut state = GameState::new();
        for i in [0, 3, 1, 4] {
            state.apply_move(i).unwrap();
        }
        assert_eq!(state.fading_index(), None);
        state.apply_move(8).unwrap();
        state.apply_move(5).unwrap();
        // X to move with three marks, 0 goes next
        assert_eq!(state.fading_index(), Some(0));
    }

    #[test]
    fn test_wire_format() {
        let mut state = GameState::new();
        state.apply_move(2).unwrap();
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["board"][2], "X");
        assert!(json["board"][0].is_null());
        assert_eq!(json["xMoves"], serde_json::json!([2]));
        assert_eq!(json["oMoves"], serde_json::json!([]));
        assert_eq!(json["isXNext"], false);
    }

    proptest! {
        #[test]
        fn prop_window_never_exceeds_three(indices in proptest::collection::vec(0usize..9, 0..64)) {
            let mut state = GameState::new();
            for index in indices {
                // occupied cells are rejected and must leave the state valid too
                let _ = state.apply_move(index);
                prop_assert!(state.x_moves.len() <= MAX_MARKS_PER_SIDE);
                prop_assert!(state.o_moves.len() <= MAX_MARKS_PER_SIDE);
                prop_assert!(state.is_consistent());
            }
        }
    }
}
