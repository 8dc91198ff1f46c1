use std::io::{Read, Seek};

use fits_hdu::{FitsFile, HduType, ImageParams};

/// The FITS operations the reader relies on.
///
/// Every call acts on the source's current HDU, which [`move_to`] changes.
///
/// [`move_to`]: FitsSource::move_to
pub trait FitsSource: Send {
    /// Human-readable name of the source for diagnostics.
    fn label(&self) -> &str;

    fn num_hdus(&mut self) -> fits_hdu::Result<usize>;

    /// Make HDU `index` (1-based) current.
    fn move_to(&mut self, index: usize) -> fits_hdu::Result<HduType>;

    fn read_key_string(&mut self, keyword: &str, capacity: usize) -> fits_hdu::Result<String>;

    fn image_params(&mut self, maxdim: usize) -> fits_hdu::Result<ImageParams>;

    /// Decode `out.len()` pixels from 1-based coordinate `first`.
    fn read_pixels(
        &mut self,
        first: &[usize],
        out: &mut [f32],
        null_value: f32,
    ) -> fits_hdu::Result<bool>;
}

impl<R: Read + Seek + Send> FitsSource for FitsFile<R> {
    fn label(&self) -> &str {
        FitsFile::label(self)
    }

    fn num_hdus(&mut self) -> fits_hdu::Result<usize> {
        Ok(FitsFile::num_hdus(self))
    }

    fn move_to(&mut self, index: usize) -> fits_hdu::Result<HduType> {
        FitsFile::move_to(self, index)
    }

    fn read_key_string(&mut self, keyword: &str, capacity: usize) -> fits_hdu::Result<String> {
        FitsFile::read_key_string(self, keyword, capacity)
    }

    fn image_params(&mut self, maxdim: usize) -> fits_hdu::Result<ImageParams> {
        FitsFile::image_params(self, maxdim)
    }

    fn read_pixels(
        &mut self,
        first: &[usize],
        out: &mut [f32],
        null_value: f32,
    ) -> fits_hdu::Result<bool> {
        FitsFile::read_pixels(self, first, out, null_value)
    }
}
