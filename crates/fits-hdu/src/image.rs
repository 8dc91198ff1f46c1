//! Image parameters and decoding of pixel strips into `f32`.

use bytemuck::pod_collect_to_vec;

use crate::error::{Error, Result};
use crate::hdu::{Hdu, Scaling};

/// Shape of an image HDU as reported to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageParams {
    /// BITPIX value (8, 16, 32, 64, -32, -64).
    pub bitpix: i64,
    /// Total number of axes in the HDU.
    pub naxis: usize,
    /// Sizes of at most the first `maxdim` axes that were asked for.
    pub naxes: Vec<usize>,
}

impl ImageParams {
    pub fn of(hdu: &Hdu, maxdim: usize) -> Self {
        ImageParams {
            bitpix: hdu.bitpix,
            naxis: hdu.naxes.len(),
            naxes: hdu.naxes.iter().copied().take(maxdim).collect(),
        }
    }
}

/// Returns the number of bytes per pixel for a given BITPIX value.
pub fn bytes_per_pixel(bitpix: i64) -> Result<usize> {
    match bitpix {
        8 | 16 | 32 | 64 | -32 | -64 => Ok((bitpix.unsigned_abs() / 8) as usize),
        _ => Err(Error::InvalidBitpix(bitpix)),
    }
}

/// Convert 1-based pixel coordinates into a 0-based flat pixel index.
///
/// Missing trailing coordinates are taken as 1. Every coordinate must lie
/// within its axis.
pub fn flat_index(naxes: &[usize], first: &[usize]) -> Result<usize> {
    if first.len() > naxes.len() {
        return Err(Error::PixelOutOfRange(format!(
            "{} coordinates for a {}-axis image",
            first.len(),
            naxes.len()
        )));
    }
    let mut index = 0;
    let mut stride = 1;
    for (axis, &dim) in naxes.iter().enumerate() {
        let coord = first.get(axis).copied().unwrap_or(1);
        if coord == 0 || coord > dim {
            return Err(Error::PixelOutOfRange(format!(
                "coordinate {coord} on axis {} of size {dim}",
                axis + 1
            )));
        }
        index += (coord - 1) * stride;
        stride *= dim;
    }
    Ok(index)
}

/// Decode a strip of big-endian samples into `out`.
///
/// `raw` must hold exactly `out.len()` samples of `bitpix`. Physical values
/// are `bzero + bscale * raw`. Integer samples equal to `BLANK` and NaN
/// floating samples are written as `null_value`. Returns `true` if any
/// sample was undefined.
pub fn decode_strip(
    raw: &[u8],
    bitpix: i64,
    scaling: &Scaling,
    null_value: f32,
    out: &mut [f32],
) -> Result<bool> {
    let bpp = bytes_per_pixel(bitpix)?;
    if raw.len() != out.len() * bpp {
        return Err(Error::UnexpectedEof);
    }

    let Scaling {
        bscale,
        bzero,
        blank,
    } = *scaling;
    let identity = bscale == 1.0 && bzero == 0.0;
    let physical = |v: f64| -> f32 {
        if identity {
            v as f32
        } else {
            (bzero + bscale * v) as f32
        }
    };

    let mut any_null = false;
    let mut put_int = |out: &mut f32, v: i64| {
        if blank == Some(v) {
            any_null = true;
            *out = null_value;
        } else {
            *out = physical(v as f64);
        }
    };

    match bitpix {
        8 => {
            for (o, &v) in out.iter_mut().zip(raw) {
                put_int(o, v as i64);
            }
        }
        16 => {
            let samples: Vec<i16> = pod_collect_to_vec(raw);
            for (o, v) in out.iter_mut().zip(samples) {
                put_int(o, i16::from_be(v) as i64);
            }
        }
        32 => {
            let samples: Vec<i32> = pod_collect_to_vec(raw);
            for (o, v) in out.iter_mut().zip(samples) {
                put_int(o, i32::from_be(v) as i64);
            }
        }
        64 => {
            let samples: Vec<i64> = pod_collect_to_vec(raw);
            for (o, v) in out.iter_mut().zip(samples) {
                put_int(o, i64::from_be(v));
            }
        }
        -32 => {
            let samples: Vec<u32> = pod_collect_to_vec(raw);
            for (o, v) in out.iter_mut().zip(samples) {
                let v = f32::from_bits(u32::from_be(v));
                if v.is_nan() {
                    any_null = true;
                    *o = null_value;
                } else if identity {
                    *o = v;
                } else {
                    *o = physical(v as f64);
                }
            }
        }
        -64 => {
            let samples: Vec<u64> = pod_collect_to_vec(raw);
            for (o, v) in out.iter_mut().zip(samples) {
                let v = f64::from_bits(u64::from_be(v));
                if v.is_nan() {
                    any_null = true;
                    *o = null_value;
                } else {
                    *o = physical(v);
                }
            }
        }
        other => return Err(Error::InvalidBitpix(other)),
    }
    Ok(any_null)
}
