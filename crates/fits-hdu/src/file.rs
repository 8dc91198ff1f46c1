use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use crate::error::{Error, Result};
use crate::hdu::{scan_hdus, Hdu, HduType};
use crate::image::{bytes_per_pixel, decode_strip, flat_index, ImageParams};

/// An open, read-only FITS file with a current-HDU cursor.
///
/// HDUs are discovered once when the file is opened; data segments are
/// read on demand. Header and pixel calls act on the current HDU, which
/// starts at the primary (index 1).
#[derive(Debug)]
pub struct FitsFile<R = BufReader<File>> {
    reader: R,
    label: String,
    hdus: Vec<Hdu>,
    current: usize,
}

impl FitsFile {
    /// Open an existing FITS file in read-only mode.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file), path.display().to_string())
    }
}

impl<R: Read + Seek> FitsFile<R> {
    /// Wrap any seekable byte source. `label` names it in log messages.
    pub fn from_reader(mut reader: R, label: impl Into<String>) -> Result<Self> {
        let label = label.into();
        let hdus = scan_hdus(&mut reader)?;
        log::debug!("Opened FITS file {}: {} HDUs", label, hdus.len());
        Ok(FitsFile {
            reader,
            label,
            hdus,
            current: 1,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Return the number of HDUs in this file.
    pub fn num_hdus(&self) -> usize {
        self.hdus.len()
    }

    /// 1-based index of the current HDU.
    pub fn current(&self) -> usize {
        self.current
    }

    /// Make HDU `index` (1-based) current and return its type.
    pub fn move_to(&mut self, index: usize) -> Result<HduType> {
        if index == 0 || index > self.hdus.len() {
            return Err(Error::BadHduNumber {
                index,
                count: self.hdus.len(),
            });
        }
        self.current = index;
        Ok(self.hdus[index - 1].hdu_type)
    }

    pub fn current_hdu(&self) -> &Hdu {
        &self.hdus[self.current - 1]
    }

    /// Read a string keyword from the current header.
    ///
    /// Values longer than `capacity` characters are an error rather than
    /// being truncated.
    pub fn read_key_string(&self, keyword: &str, capacity: usize) -> Result<String> {
        let value = self
            .current_hdu()
            .header
            .string(keyword)?
            .ok_or_else(|| Error::KeyNotFound(keyword.to_string()))?;
        let len = value.chars().count();
        if len > capacity {
            return Err(Error::ValueTooLong {
                keyword: keyword.to_string(),
                len,
                capacity,
            });
        }
        Ok(value)
    }

    /// Shape of the current HDU, which must be an image.
    pub fn image_params(&self, maxdim: usize) -> Result<ImageParams> {
        let hdu = self.current_hdu();
        if hdu.hdu_type != HduType::Image {
            return Err(Error::NotAnImage(hdu.index));
        }
        Ok(ImageParams::of(hdu, maxdim))
    }

    /// Read `out.len()` consecutive pixels of the current image starting at
    /// the 1-based coordinate `first`, converting them to `f32`.
    ///
    /// Undefined pixels are written as `null_value`. Returns `true` if any
    /// were found.
    pub fn read_pixels(
        &mut self,
        first: &[usize],
        out: &mut [f32],
        null_value: f32,
    ) -> Result<bool> {
        let hdu = &self.hdus[self.current - 1];
        if hdu.hdu_type != HduType::Image {
            return Err(Error::NotAnImage(hdu.index));
        }
        if out.is_empty() {
            return Ok(false);
        }

        let start = flat_index(&hdu.naxes, first)?;
        let total = hdu.pixel_count();
        if start + out.len() > total {
            return Err(Error::PixelOutOfRange(format!(
                "{} pixels from offset {start} exceed image of {total}",
                out.len()
            )));
        }

        let bpp = bytes_per_pixel(hdu.bitpix)?;
        let mut raw = vec![0u8; out.len() * bpp];
        self.reader
            .seek(SeekFrom::Start(hdu.data_start + (start * bpp) as u64))?;
        self.reader.read_exact(&mut raw).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                Error::UnexpectedEof
            } else {
                Error::Io(e)
            }
        })?;

        decode_strip(&raw, hdu.bitpix, &hdu.scaling, null_value, out)
    }
}

impl<R> Drop for FitsFile<R> {
    fn drop(&mut self) {
        log::debug!("Closed FITS file {}", self.label);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{FitsBuilder, ImageSpec};
    use std::io::Cursor;

    fn ramp(width: usize, height: usize) -> Vec<f64> {
        (0..width * height).map(|i| i as f64).collect()
    }

    fn sample() -> FitsFile<Cursor<Vec<u8>>> {
        let bytes = FitsBuilder::new()
            .empty_primary()
            .image(ImageSpec::new(-32, &[4, 3]).named("SCI").pixels(&ramp(4, 3)))
            .bintable("TBL", 8, 2)
            .image(ImageSpec::new(16, &[4, 3]).named("ERR").constant(7.0))
            .finish();
        FitsFile::from_reader(Cursor::new(bytes), "sample").unwrap()
    }

    #[test]
    fn open_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.fits");
        FitsBuilder::new()
            .primary(ImageSpec::new(8, &[2, 2]))
            .write_to(&path)
            .unwrap();
        let f = FitsFile::open(&path).unwrap();
        assert_eq!(f.num_hdus(), 1);
        assert_eq!(f.current(), 1);
    }

    #[test]
    fn open_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = FitsFile::open(dir.path().join("nope.fits")).unwrap_err();
        assert_eq!(err.status_text(), "could not open the named file");
    }

    #[test]
    fn move_to_reports_type() {
        let mut f = sample();
        assert_eq!(f.num_hdus(), 4);
        assert_eq!(f.move_to(2).unwrap(), HduType::Image);
        assert_eq!(f.move_to(3).unwrap(), HduType::BinaryTable);
        assert_eq!(f.current(), 3);
        assert!(matches!(
            f.move_to(5),
            Err(Error::BadHduNumber { index: 5, count: 4 })
        ));
        assert!(f.move_to(0).is_err());
        assert_eq!(f.current(), 3);
    }

    #[test]
    fn read_key_string_bounds() {
        let mut f = sample();
        f.move_to(2).unwrap();
        assert_eq!(f.read_key_string("EXTNAME", 68).unwrap(), "SCI");
        assert!(matches!(
            f.read_key_string("EXTNAME", 2),
            Err(Error::ValueTooLong { len: 3, capacity: 2, .. })
        ));
        assert!(matches!(
            f.read_key_string("OBJECT", 68),
            Err(Error::KeyNotFound(_))
        ));
        f.move_to(1).unwrap();
        assert!(f.read_key_string("EXTNAME", 68).is_err());
    }

    #[test]
    fn image_params_limits_axes() {
        let mut f = sample();
        f.move_to(2).unwrap();
        let p = f.image_params(1).unwrap();
        assert_eq!(p.bitpix, -32);
        assert_eq!(p.naxis, 2);
        assert_eq!(p.naxes, vec![4]);
        f.move_to(3).unwrap();
        assert!(matches!(f.image_params(3), Err(Error::NotAnImage(3))));
    }

    #[test]
    fn read_pixels_row() {
        let mut f = sample();
        f.move_to(2).unwrap();
        let mut row = [0.0f32; 4];
        let nulls = f.read_pixels(&[1, 2], &mut row, f32::NAN).unwrap();
        assert!(!nulls);
        assert_eq!(row, [4.0, 5.0, 6.0, 7.0]);

        let mut part = [0.0f32; 2];
        f.read_pixels(&[3, 3], &mut part, f32::NAN).unwrap();
        assert_eq!(part, [10.0, 11.0]);
    }

    #[test]
    fn read_pixels_follows_cursor() {
        let mut f = sample();
        let mut row = [0.0f32; 4];
        f.move_to(4).unwrap();
        f.read_pixels(&[1, 1], &mut row, f32::NAN).unwrap();
        assert_eq!(row, [7.0; 4]);
        f.move_to(2).unwrap();
        f.read_pixels(&[1, 1], &mut row, f32::NAN).unwrap();
        assert_eq!(row, [0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn read_pixels_out_of_range() {
        let mut f = sample();
        f.move_to(2).unwrap();
        let mut row = [0.0f32; 4];
        assert!(matches!(
            f.read_pixels(&[2, 3], &mut row, f32::NAN),
            Err(Error::PixelOutOfRange(_))
        ));
        assert!(f.read_pixels(&[1, 4], &mut row, f32::NAN).is_err());
    }

    #[test]
    fn read_pixels_rejects_tables() {
        let mut f = sample();
        f.move_to(3).unwrap();
        let mut row = [0.0f32; 1];
        assert!(matches!(
            f.read_pixels(&[1, 1], &mut row, f32::NAN),
            Err(Error::NotAnImage(3))
        ));
    }

    #[test]
    fn truncated_data_fails_on_read() {
        let mut bytes = FitsBuilder::new()
            .primary(ImageSpec::new(-32, &[100, 100]).constant(1.0))
            .finish();
        bytes.truncate(2880 + 400);
        let mut f = FitsFile::from_reader(Cursor::new(bytes), "short").unwrap();
        let mut row = [0.0f32; 100];
        f.read_pixels(&[1, 1], &mut row, f32::NAN).unwrap();
        assert!(matches!(
            f.read_pixels(&[1, 50], &mut row, f32::NAN),
            Err(Error::UnexpectedEof)
        ));
    }
}
