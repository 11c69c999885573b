//! Crate-level error used by the commands and the binary.

use crate::bed::BedError;
use crate::interval::IntervalError;
use crate::reads::ReadError;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Bed(#[from] BedError),

    #[error(transparent)]
    Interval(#[from] IntervalError),

    #[error(transparent)]
    Reads(#[from] ReadError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("{0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, Error>;
