//! Blunders Engine error type.

use std::error;
use std::fmt::{self, Display};
use std::result;

/// Blunders Engine generic result type.
pub type Result<T> = result::Result<T, Error>;

/// A list specifying general errors for Blunders engine.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Square parse string malformed.
    ParseSquareMalformed,
    /// File parse string malformed.
    ParseFileMalformed,
    /// Rank parse string malformed.
    ParseRankMalformed,
    /// Color parse string malformed.
    ParseColorMalformed,
    /// Piece parse string malformed.
    ParsePieceMalformed,
    /// Piece parse string malformed.
    ParseCastlingMalformed,

    /// Fen placement field malformed.
    FenPlacementMalformed,
    /// Fen active-color field malformed.
    FenColorMalformed,
    /// Fen castling field malformed.
    FenCastlingMalformed,
    /// Fen en-passant field malformed.
    FenEnPassantMalformed,
    /// Fen halfmove-clock field malformed.
    FenHalfmoveMalformed,
    /// Fen fullmove-number field malformed.
    FenFullmoveMalformed,
    /// Fen string is missing one or more of its six fields.
    FenFieldMissing,

    /// Xboard received an unknown command.
    XboardUnknownCommand,
    /// Xboard received a move that could not be parsed.
    XboardMalformedMove,

    /// Time Management Mode cannot be created, missing fields.
    ModeNotSatisfied,

    /// The engine can only play games with a finite static number of moves.
    /// That limit has been exceeded.
    MoveHistoryExceeded,

    // An illegal move was provided, and could not be applied to some base position.
    GameIllegalMove,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ParseSquareMalformed => "parse square malformed",
            ErrorKind::ParseFileMalformed => "parse file malformed",
            ErrorKind::ParseRankMalformed => "parse rank malformed",
            ErrorKind::ParseColorMalformed => "parse color malformed",
            ErrorKind::ParsePieceMalformed => "parse piece malformed",
            ErrorKind::ParseCastlingMalformed => "parse castling malformed",

            ErrorKind::FenPlacementMalformed => "fen placement malformed",
            ErrorKind::FenColorMalformed => "fen active color malformed",
            ErrorKind::FenCastlingMalformed => "fen castling malformed",
            ErrorKind::FenEnPassantMalformed => "fen en-passant malformed",
            ErrorKind::FenHalfmoveMalformed => "fen halfmove clock malformed",
            ErrorKind::FenFullmoveMalformed => "fen fullmove number malformed",
            ErrorKind::FenFieldMissing => "fen missing field",

            ErrorKind::XboardUnknownCommand => "xboard unknown command",
            ErrorKind::XboardMalformedMove => "xboard malformed move",

            ErrorKind::ModeNotSatisfied => "mode not satisfied",

            ErrorKind::MoveHistoryExceeded => "move history exceeded",

            ErrorKind::GameIllegalMove => "position history illegal move",
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The primary and general error type for the Blunders Engine.
#[derive(Debug)]
pub enum Error {
    Simple(ErrorKind),
    Message(ErrorKind, String),
    Custom(ErrorKind, Box<dyn error::Error + Send + Sync>),
}

impl Error {
    pub fn new<E>(error_kind: ErrorKind, inner_error: E) -> Self
    where
        E: Into<Box<dyn error::Error + Send + Sync>>,
    {
        Self::Custom(error_kind, inner_error.into())
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Simple(error_kind) => {
                write!(f, "{error_kind}")
            }
            Error::Message(error_kind, string) => {
                write!(f, "{error_kind}: {string}")
            }
            Error::Custom(error_kind, ref box_error) => {
                write!(f, "{error_kind}, error: {}", *box_error)
            }
        }
    }
}

impl error::Error for Error {}

impl From<ErrorKind> for Error {
    fn from(error_kind: ErrorKind) -> Self {
        Self::Simple(error_kind)
    }
}

impl<S: ToString> From<(ErrorKind, S)> for Error {
    fn from((error_kind, stringable): (ErrorKind, S)) -> Self {
        Self::Message(error_kind, stringable.to_string())
    }
}
