use std::path::PathBuf;

use thiserror::Error;

use crate::channel::Channel;

/// Errors that stop a reader from being built or a channel from being read.
#[derive(Error, Debug)]
pub enum ReaderError {
    /// The file could not be opened or is not a FITS file.
    #[error("Error reading file {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: fits_hdu::Error,
    },

    /// The number of HDUs could not be determined.
    #[error("Error getting number of HDUs: {0}")]
    HduCount(#[source] fits_hdu::Error),

    /// No 2-D image extension survived cataloguing.
    #[error("No image data found")]
    NoImageData,

    /// The channel is not in the catalog.
    #[error("Unknown channel {0}")]
    UnknownChannel(Channel),

    /// Decoding a channel's pixels failed.
    #[error("Error reading pixels of {channel}: {source}")]
    Read {
        channel: Channel,
        #[source]
        source: fits_hdu::Error,
    },
}

impl ReaderError {
    /// Short text suitable for a host's one-line error display.
    pub fn status_text(&self) -> &'static str {
        match self {
            ReaderError::Open { source, .. }
            | ReaderError::HduCount(source)
            | ReaderError::Read { source, .. } => source.status_text(),
            ReaderError::NoImageData => "no image data found",
            ReaderError::UnknownChannel(_) => "unknown channel",
        }
    }
}
