//! Per-row, per-channel pixel decoding.

use crate::catalog::ExtensionCatalog;
use crate::channel::{Channel, ChannelSet};
use crate::error::ReaderError;
use crate::handle::SharedHandle;
use crate::row::Row;
use crate::sink::Reporter;
use crate::source::FitsSource;

/// Value written for undefined pixels.
pub const BLANK_VALUE: f32 = f32::NAN;

/// Serves rows of catalogued channels from a shared source.
pub struct RowDecoder<'a, S> {
    catalog: &'a ExtensionCatalog,
    handle: &'a SharedHandle<S>,
    reporter: Reporter<'a>,
}

impl<'a, S: FitsSource> RowDecoder<'a, S> {
    pub fn new(
        catalog: &'a ExtensionCatalog,
        handle: &'a SharedHandle<S>,
        reporter: Reporter<'a>,
    ) -> Self {
        RowDecoder {
            catalog,
            handle,
            reporter,
        }
    }

    /// Decode `out.len()` samples of `channel` at row `y` from column `x`
    /// (both 0-based). Returns `true` if any sample was undefined.
    ///
    /// On failure `out` may be partially written.
    pub fn decode_channel(
        &self,
        channel: &Channel,
        y: usize,
        x: usize,
        out: &mut [f32],
    ) -> Result<bool, ReaderError> {
        let info = self
            .catalog
            .get(channel)
            .ok_or_else(|| ReaderError::UnknownChannel(channel.clone()))?;
        let read = |source: fits_hdu::Error| ReaderError::Read {
            channel: channel.clone(),
            source,
        };
        let (Some(column), Some(line)) = (x.checked_add(1), y.checked_add(1)) else {
            return Err(read(fits_hdu::Error::PixelOutOfRange(format!(
                "pixel ({x}, {y}) has no 1-based coordinate"
            ))));
        };
        self.handle
            .with_extension(info.index, |source| {
                source.read_pixels(&[column, line], out, BLANK_VALUE)
            })
            .map_err(read)
    }

    /// Fill `row` for columns `[x, r)` of row `y` with every requested
    /// channel.
    ///
    /// Channels are decoded independently: a failure is reported and the
    /// remaining channels are still read. Channels missing from the catalog
    /// are left untouched.
    pub fn engine(&self, y: usize, x: usize, r: usize, channels: &ChannelSet, row: &mut Row) {
        if x < row.x() || r > row.r() || x > r {
            log::warn!(
                "Span [{x}, {r}) is outside row buffer [{}, {})",
                row.x(),
                row.r()
            );
            return;
        }
        let (start, end) = (x - row.x(), r - row.x());

        for channel in channels {
            if !self.catalog.contains(channel) {
                log::warn!("Channel {channel} is not in this file, skipping");
                continue;
            }
            let out = &mut row.writable(channel)[start..end];
            match self.decode_channel(channel, y, x, out) {
                Ok(_) => {}
                Err(ReaderError::Read { channel, source }) => {
                    self.reporter
                        .report(&format!("Error reading image pixels of {channel}"), &source);
                }
                Err(e) => log::error!("{e}"),
            }
        }
    }
}
