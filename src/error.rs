//! Centralized error types for the simulation core.
//!
//! This module defines all error types used throughout the crate,
//! providing a consistent error handling approach.

use std::io;

/// Main error type for the simulation.
///
/// This is the primary error type that should be used in public APIs.
/// It can represent any error that can occur while building or running
/// the simulation.
#[derive(thiserror::Error, Debug)]
pub enum GameError {
    #[error("Board parsing error: {0}")]
    Parse(#[from] ParseError),

    #[error("High score persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid state: {0}")]
    InvalidState(String),
}

/// Error type for board parsing operations.
#[derive(thiserror::Error, Debug)]
pub enum ParseError {
    #[error("Unknown character in board: {0}")]
    UnknownCharacter(char),

    #[error("Board row {row} has width {width}, expected {expected}")]
    InvalidRowWidth { row: usize, width: usize, expected: usize },

    #[error("Board has {0} rows, expected {1}")]
    InvalidRowCount(usize, usize),

    #[error("House door must have exactly 2 positions, found {0}")]
    InvalidHouseDoorCount(usize),

    #[error("Board must declare exactly one Pac starting position")]
    MissingPacStart,

    #[error("Board declares more than one Pac starting position")]
    DuplicatePacStart,

    #[error("Board must declare exactly 2 tunnel portals, found {0}")]
    InvalidPortalCount(usize),
}

/// Errors related to the persisted high-score record.
#[derive(thiserror::Error, Debug)]
pub enum PersistenceError {
    #[error("Failed to read high score file: {0}")]
    Read(io::Error),

    #[error("Failed to write high score file: {0}")]
    Write(io::Error),

    #[error("Malformed high score record: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Result type for simulation operations.
pub type GameResult<T> = Result<T, GameError>;
