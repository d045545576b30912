use std;
use std::convert::From;

/// The error taxonomy for the whole crate.
///
/// Errors surface to the `add_document`/`close` caller; there is no
/// auto-retry. A failed `add_document` leaves the writer's segment list
/// untouched.
#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    CorruptFormat(String),
    TermOutOfOrder,
    FreqPtrOutOfOrder,
    PrxPtrOutOfOrder,
    UnknownField(String),
    Logic(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            Error::Io(ref io) => io.fmt(f),
            Error::CorruptFormat(ref msg) => write!(f, "corrupt format: {}", msg),
            Error::TermOutOfOrder => write!(f, "term out of order"),
            Error::FreqPtrOutOfOrder => write!(f, "freq pointer out of order"),
            Error::PrxPtrOutOfOrder => write!(f, "prox pointer out of order"),
            Error::UnknownField(ref name) => write!(f, "unknown field: {}", name),
            Error::Logic(ref msg) => write!(f, "logic error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            Error::Io(ref io) => Some(io),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
