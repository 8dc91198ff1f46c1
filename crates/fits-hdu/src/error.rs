use thiserror::Error;

/// All errors that can occur while reading a FITS file.
#[derive(Error, Debug)]
pub enum Error {
    /// An I/O error from the underlying reader.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream does not start with a `SIMPLE` card.
    #[error("not a FITS file: first card is not SIMPLE")]
    NotFits,

    /// Malformed header block or card.
    #[error("invalid FITS header: {0}")]
    InvalidHeader(&'static str),

    /// Premature end of data while reading.
    #[error("unexpected end of file")]
    UnexpectedEof,

    /// Unrecognized BITPIX value.
    #[error("invalid BITPIX value: {0}")]
    InvalidBitpix(i64),

    /// A structural keyword the HDU layout depends on is absent.
    #[error("missing required keyword: {0}")]
    MissingKeyword(&'static str),

    /// A keyword requested by the caller is absent from the current header.
    #[error("keyword not found: {0}")]
    KeyNotFound(String),

    /// A keyword exists but its value is not a character string.
    #[error("keyword {0} does not hold a string value")]
    NotAString(String),

    /// A string value does not fit the caller's capacity.
    #[error("value of {keyword} is {len} characters, capacity is {capacity}")]
    ValueTooLong {
        keyword: String,
        len: usize,
        capacity: usize,
    },

    /// Absolute HDU index outside `1..=count`.
    #[error("HDU {index} out of range (file has {count})")]
    BadHduNumber { index: usize, count: usize },

    /// An image operation was attempted on a table HDU.
    #[error("HDU {0} is not an image")]
    NotAnImage(usize),

    /// A pixel coordinate or strip length falls outside the image.
    #[error("pixel range out of bounds: {0}")]
    PixelOutOfRange(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Short status text for user-facing error surfaces.
    ///
    /// Never longer than 30 characters.
    pub fn status_text(&self) -> &'static str {
        match self {
            Error::Io(e) if e.kind() == std::io::ErrorKind::NotFound => {
                "could not open the named file"
            }
            Error::Io(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                "tried to move past end of file"
            }
            Error::Io(_) => "error reading from FITS file",
            Error::NotFits => "not a FITS file",
            Error::InvalidHeader(_) => "illegal header format",
            Error::UnexpectedEof => "tried to move past end of file",
            Error::InvalidBitpix(_) => "illegal BITPIX keyword value",
            Error::MissingKeyword(_) => "required keyword missing",
            Error::KeyNotFound(_) => "keyword not found in header",
            Error::NotAString(_) => "keyword value is not a string",
            Error::ValueTooLong { .. } => "keyword value is too long",
            Error::BadHduNumber { .. } => "illegal HDU number",
            Error::NotAnImage(_) => "HDU is not an image",
            Error::PixelOutOfRange(_) => "bad first pixel number",
        }
    }
}
