//! Multi-extension FITS files read as a single image.
//!
//! Every 2-D image extension with an `EXTNAME` becomes one float channel
//! named `<EXTNAME>.r`. The first such extension fixes the image size.
//! Rows are decoded on demand, one channel at a time, and may be requested
//! from several threads: a [`SharedHandle`] serializes positioning and
//! reading of the underlying file.
//!
//! ```no_run
//! use fits_reader::{FitsReader, ReaderOptions, Row};
//!
//! let reader = FitsReader::open("image.fits", &ReaderOptions::default(), None)?;
//! let info = reader.info();
//! let mut row = Row::new(0, info.width);
//! reader.engine(0, 0, info.width, &info.channels, &mut row);
//! # Ok::<(), fits_reader::ReaderError>(())
//! ```

pub mod catalog;
pub mod channel;
pub mod decoder;
pub mod descriptor;
pub mod error;
pub mod handle;
pub mod options;
pub mod reader;
pub mod row;
pub mod sink;
pub mod source;

pub use catalog::{ExtensionCatalog, ExtensionInfo, MAX_AXES};
pub use channel::{Channel, ChannelSet};
pub use decoder::{RowDecoder, BLANK_VALUE};
pub use descriptor::{sniff, ColorSpace, Format, ImageDescriptor, FORMAT};
pub use error::ReaderError;
pub use handle::SharedHandle;
pub use options::{DuplicatePolicy, PrimarySelection, ReaderOptions, UnnamedPolicy};
pub use reader::FitsReader;
pub use row::Row;
pub use sink::{CollectingSink, ErrorSink, Reporter};
pub use source::FitsSource;
