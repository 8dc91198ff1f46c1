//! Read-only access to FITS files: header cards, HDU discovery, and
//! decoding of pixel strips into `f32` buffers.
//!
//! A [`FitsFile`] keeps a cursor on the current HDU. Header and pixel calls
//! act on that HDU, so callers reposition with [`FitsFile::move_to`] first.

pub mod block;
pub mod error;
pub mod file;
pub mod hdu;
pub mod header;
pub mod image;
pub mod value;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;

pub use block::{BLOCK_SIZE, CARDS_PER_BLOCK, CARD_SIZE, MAGIC};
pub use error::{Error, Result};
pub use file::FitsFile;
pub use hdu::{Hdu, HduType};
pub use image::ImageParams;
