use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Invalid coordinates")]
    InvalidCoords,
    #[error("Board must have at least one row and one column")]
    EmptyBoard,
    #[error("Too many mines")]
    TooManyMines,
    #[error("Unexpected feedback value {0} from host")]
    InvalidFeedback(i32),
    #[error("Cell is not covered")]
    NotCovered,
    #[error("Game already ended, no new moves are accepted")]
    AlreadyEnded,
}

pub type Result<T> = std::result::Result<T, EngineError>;
