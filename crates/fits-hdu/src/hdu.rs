use std::io::{Read, Seek, SeekFrom};

use crate::block::{has_magic, padded_byte_len, MAGIC};
use crate::error::{Error, Result};
use crate::header::{read_header, Header};

/// Kind of data held by an HDU.
///
/// The primary array counts as an image, as does `XTENSION = 'IMAGE'`.
/// Tile-compressed images are stored as binary tables and reported as such.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HduType {
    Image,
    AsciiTable,
    BinaryTable,
    /// Extension of an unrecognised `XTENSION` type. Its data segment is
    /// sized from the standard keywords and skipped.
    Other,
}

/// Linear calibration and null marker of an image HDU.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scaling {
    pub bscale: f64,
    pub bzero: f64,
    /// Raw integer value marking undefined pixels (integer BITPIX only).
    pub blank: Option<i64>,
}

impl Default for Scaling {
    fn default() -> Self {
        Scaling {
            bscale: 1.0,
            bzero: 0.0,
            blank: None,
        }
    }
}

/// Location and shape of one Header Data Unit.
#[derive(Debug, Clone)]
pub struct Hdu {
    /// 1-based position in the file.
    pub index: usize,
    pub hdu_type: HduType,
    pub header: Header,
    /// Byte offset where the header begins.
    pub header_start: u64,
    /// Byte offset where the data segment begins.
    pub data_start: u64,
    /// Length of the data segment in bytes, without padding.
    pub data_len: u64,
    pub bitpix: i64,
    /// Axis sizes, NAXIS1 first.
    pub naxes: Vec<usize>,
    pub scaling: Scaling,
}

impl Hdu {
    /// Number of pixels in the data array.
    pub fn pixel_count(&self) -> usize {
        if self.naxes.is_empty() {
            0
        } else {
            self.naxes.iter().product()
        }
    }
}

/// Walk every HDU in `reader`, skipping over data segments.
///
/// The first header must start with `SIMPLE`. After the primary HDU, a
/// header that cannot be read or described ends the scan with a warning and
/// the HDUs found so far are returned, so junk after the last HDU is
/// tolerated.
pub fn scan_hdus<R: Read + Seek>(reader: &mut R) -> Result<Vec<Hdu>> {
    let mut magic = [0u8; MAGIC.len()];
    reader.seek(SeekFrom::Start(0))?;
    if reader.read_exact(&mut magic).is_err() || !has_magic(&magic) {
        return Err(Error::NotFits);
    }

    let mut hdus: Vec<Hdu> = Vec::new();
    let mut offset = reader.seek(SeekFrom::Start(0))?;

    loop {
        let read = match read_header(reader) {
            Ok(read) => read,
            Err(e) if !hdus.is_empty() => {
                log::warn!("HDU scan stopped after HDU {}: {e}", hdus.len());
                break;
            }
            Err(e) => return Err(e),
        };
        let Some((header, header_len)) = read else {
            break;
        };

        let is_primary = hdus.is_empty();
        if is_primary && header.cards().first().map(|c| c.keyword.as_str()) != Some("SIMPLE") {
            return Err(Error::NotFits);
        }

        let hdu = match describe(&header, is_primary) {
            Ok((hdu_type, bitpix, naxes, data_len)) => {
                let data_start = offset + header_len as u64;
                Hdu {
                    index: hdus.len() + 1,
                    hdu_type,
                    scaling: scaling_of(&header),
                    header,
                    header_start: offset,
                    data_start,
                    data_len,
                    bitpix,
                    naxes,
                }
            }
            Err(e) if !is_primary => {
                log::warn!("HDU scan stopped after HDU {}: {e}", hdus.len());
                break;
            }
            Err(e) => return Err(e),
        };

        offset = hdu.data_start + padded_byte_len(hdu.data_len as usize) as u64;
        log::trace!(
            "HDU {}: {:?} bitpix={} naxes={:?}",
            hdu.index,
            hdu.hdu_type,
            hdu.bitpix,
            hdu.naxes
        );
        hdus.push(hdu);
        reader.seek(SeekFrom::Start(offset))?;
    }

    Ok(hdus)
}

fn describe(header: &Header, is_primary: bool) -> Result<(HduType, i64, Vec<usize>, u64)> {
    let bitpix = header
        .integer("BITPIX")
        .ok_or(Error::MissingKeyword("BITPIX"))?;
    if !matches!(bitpix, 8 | 16 | 32 | 64 | -32 | -64) {
        return Err(Error::InvalidBitpix(bitpix));
    }
    let naxis = header.integer("NAXIS").ok_or(Error::MissingKeyword("NAXIS"))?;
    if !(0..=999).contains(&naxis) {
        return Err(Error::InvalidHeader("NAXIS out of range"));
    }

    let mut naxes = Vec::with_capacity(naxis as usize);
    for i in 1..=naxis {
        let dim = header
            .integer(&format!("NAXIS{i}"))
            .ok_or(Error::MissingKeyword("NAXISn"))?;
        let dim = usize::try_from(dim).map_err(|_| Error::InvalidHeader("negative axis size"))?;
        naxes.push(dim);
    }

    let hdu_type = if is_primary {
        HduType::Image
    } else {
        let xtension = header
            .string("XTENSION")?
            .ok_or(Error::MissingKeyword("XTENSION"))?;
        match xtension.trim() {
            "IMAGE" | "IUEIMAGE" => HduType::Image,
            "TABLE" => HduType::AsciiTable,
            "BINTABLE" | "A3DTABLE" => HduType::BinaryTable,
            other => {
                log::warn!("Unknown extension type {other:?}, skipping its data");
                HduType::Other
            }
        }
    };

    let pixels: u64 = if naxes.is_empty() {
        0
    } else {
        naxes.iter().try_fold(1u64, |acc, &d| acc.checked_mul(d as u64))
            .ok_or(Error::InvalidHeader("data size overflow"))?
    };
    let (pcount, gcount) = if is_primary {
        (0, 1)
    } else {
        (
            header.integer("PCOUNT").unwrap_or(0).max(0) as u64,
            header.integer("GCOUNT").unwrap_or(1).max(1) as u64,
        )
    };
    let bytes_per_value = bitpix.unsigned_abs() / 8;
    let data_len = pixels
        .checked_add(pcount)
        .and_then(|n| n.checked_mul(gcount))
        .and_then(|n| n.checked_mul(bytes_per_value))
        .ok_or(Error::InvalidHeader("data size overflow"))?;

    Ok((hdu_type, bitpix, naxes, data_len))
}

fn scaling_of(header: &Header) -> Scaling {
    Scaling {
        bscale: header.float("BSCALE").unwrap_or(1.0),
        bzero: header.float("BZERO").unwrap_or(0.0),
        blank: header.integer("BLANK"),
    }
}
