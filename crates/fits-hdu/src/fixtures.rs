//! Builders for small FITS byte streams used by tests.

use std::path::Path;

use crate::block::{padded_byte_len, CARD_SIZE};

/// Longest string payload a single card can carry between its quotes.
const MAX_CARD_STRING: usize = 68;

/// Shape, naming and content of one image HDU.
#[derive(Debug, Clone)]
pub struct ImageSpec {
    bitpix: i64,
    naxes: Vec<usize>,
    name: Option<String>,
    scaling: Option<(f64, f64)>,
    blank: Option<i64>,
    pixels: Option<Vec<f64>>,
    extra: Vec<(String, String)>,
}

impl ImageSpec {
    pub fn new(bitpix: i64, naxes: &[usize]) -> Self {
        ImageSpec {
            bitpix,
            naxes: naxes.to_vec(),
            name: None,
            scaling: None,
            blank: None,
            pixels: None,
            extra: Vec::new(),
        }
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn scaled(mut self, bscale: f64, bzero: f64) -> Self {
        self.scaling = Some((bscale, bzero));
        self
    }

    pub fn blank(mut self, blank: i64) -> Self {
        self.blank = Some(blank);
        self
    }

    /// Raw stored values in FITS order (NAXIS1 fastest).
    pub fn pixels(mut self, pixels: &[f64]) -> Self {
        self.pixels = Some(pixels.to_vec());
        self
    }

    pub fn constant(self, value: f64) -> Self {
        let count = self.pixel_count();
        self.pixels(&vec![value; count])
    }

    /// Adds a card whose value field is written verbatim.
    pub fn card(mut self, keyword: &str, value: &str) -> Self {
        self.extra.push((keyword.to_string(), value.to_string()));
        self
    }

    fn pixel_count(&self) -> usize {
        if self.naxes.is_empty() {
            0
        } else {
            self.naxes.iter().product()
        }
    }

    fn data(&self) -> Vec<u8> {
        let count = self.pixel_count();
        let mut out = Vec::with_capacity(count * (self.bitpix.unsigned_abs() as usize / 8));
        for i in 0..count {
            let v = self.pixels.as_ref().map_or(0.0, |p| p[i]);
            match self.bitpix {
                8 => out.push(v as u8),
                16 => out.extend_from_slice(&(v as i16).to_be_bytes()),
                32 => out.extend_from_slice(&(v as i32).to_be_bytes()),
                64 => out.extend_from_slice(&(v as i64).to_be_bytes()),
                -32 => out.extend_from_slice(&(v as f32).to_be_bytes()),
                -64 => out.extend_from_slice(&v.to_be_bytes()),
                other => panic!("fixture BITPIX {other} not supported"),
            }
        }
        out
    }
}

/// Accumulates HDUs into a complete FITS byte stream.
#[derive(Debug, Default)]
pub struct FitsBuilder {
    bytes: Vec<u8>,
}

impl FitsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Primary HDU with `NAXIS = 0`.
    pub fn empty_primary(self) -> Self {
        self.primary(ImageSpec::new(8, &[]))
    }

    pub fn primary(mut self, spec: ImageSpec) -> Self {
        let mut cards = vec![logical_card("SIMPLE", true)];
        cards.extend(shape_cards(&spec));
        cards.push(logical_card("EXTEND", true));
        cards.extend(named_cards(&spec));
        self.push_hdu(cards, spec.data());
        self
    }

    pub fn image(mut self, spec: ImageSpec) -> Self {
        let mut cards = vec![string_cards("XTENSION", "IMAGE").remove(0)];
        cards.extend(shape_cards(&spec));
        cards.push(number_card("PCOUNT", "0"));
        cards.push(number_card("GCOUNT", "1"));
        cards.extend(named_cards(&spec));
        self.push_hdu(cards, spec.data());
        self
    }

    /// Binary table with one `naxis1`-byte column of zeros.
    pub fn bintable(mut self, name: &str, naxis1: usize, naxis2: usize) -> Self {
        let mut cards = vec![string_cards("XTENSION", "BINTABLE").remove(0)];
        cards.push(number_card("BITPIX", "8"));
        cards.push(number_card("NAXIS", "2"));
        cards.push(number_card("NAXIS1", &naxis1.to_string()));
        cards.push(number_card("NAXIS2", &naxis2.to_string()));
        cards.push(number_card("PCOUNT", "0"));
        cards.push(number_card("GCOUNT", "1"));
        cards.push(number_card("TFIELDS", "1"));
        cards.extend(string_cards("TFORM1", &format!("{naxis1}B")));
        cards.extend(string_cards("EXTNAME", name));
        self.push_hdu(cards, vec![0u8; naxis1 * naxis2]);
        self
    }

    /// A lone primary header made from literal card images.
    pub fn raw_primary(self, lines: &[&str]) -> Vec<u8> {
        let mut cards = Vec::new();
        for line in lines {
            let mut c = [b' '; CARD_SIZE];
            c[..line.len()].copy_from_slice(line.as_bytes());
            cards.push(c);
        }
        let mut b = self;
        b.push_hdu(cards, Vec::new());
        b.bytes
    }

    pub fn finish(self) -> Vec<u8> {
        self.bytes
    }

    pub fn write_to<P: AsRef<Path>>(self, path: P) -> std::io::Result<()> {
        std::fs::write(path, self.bytes)
    }

    fn push_hdu(&mut self, mut cards: Vec<[u8; CARD_SIZE]>, data: Vec<u8>) {
        let mut end = [b' '; CARD_SIZE];
        end[..3].copy_from_slice(b"END");
        cards.push(end);

        let header_start = self.bytes.len();
        for c in &cards {
            self.bytes.extend_from_slice(c);
        }
        let header_len = padded_byte_len(cards.len() * CARD_SIZE);
        self.bytes.resize(header_start + header_len, b' ');

        let data_start = self.bytes.len();
        self.bytes.extend_from_slice(&data);
        self.bytes.resize(data_start + padded_byte_len(data.len()), 0);
    }
}

fn shape_cards(spec: &ImageSpec) -> Vec<[u8; CARD_SIZE]> {
    let mut cards = vec![
        number_card("BITPIX", &spec.bitpix.to_string()),
        number_card("NAXIS", &spec.naxes.len().to_string()),
    ];
    for (i, d) in spec.naxes.iter().enumerate() {
        cards.push(number_card(&format!("NAXIS{}", i + 1), &d.to_string()));
    }
    cards
}

fn named_cards(spec: &ImageSpec) -> Vec<[u8; CARD_SIZE]> {
    let mut cards = Vec::new();
    if let Some((bscale, bzero)) = spec.scaling {
        cards.push(number_card("BSCALE", &format!("{bscale:.1}")));
        cards.push(number_card("BZERO", &format!("{bzero:.1}")));
    }
    if let Some(blank) = spec.blank {
        cards.push(number_card("BLANK", &blank.to_string()));
    }
    if let Some(name) = &spec.name {
        cards.extend(string_cards("EXTNAME", name));
    }
    for (keyword, value) in &spec.extra {
        cards.push(number_card(keyword, value));
    }
    cards
}

fn keyword_prefix(keyword: &str) -> [u8; CARD_SIZE] {
    let mut c = [b' '; CARD_SIZE];
    c[..keyword.len()].copy_from_slice(keyword.as_bytes());
    c[8] = b'=';
    c
}

fn number_card(keyword: &str, value: &str) -> [u8; CARD_SIZE] {
    let mut c = keyword_prefix(keyword);
    let text = format!("{value:>20}");
    c[10..10 + text.len()].copy_from_slice(text.as_bytes());
    c
}

fn logical_card(keyword: &str, value: bool) -> [u8; CARD_SIZE] {
    number_card(keyword, if value { "T" } else { "F" })
}

/// A string card, split across `CONTINUE` cards when it does not fit.
fn string_cards(keyword: &str, value: &str) -> Vec<[u8; CARD_SIZE]> {
    let escaped = value.replace('\'', "''");
    let mut cards = Vec::new();
    let mut rest = escaped.as_str();
    let mut first = true;
    loop {
        let (chunk, more) = if rest.len() > MAX_CARD_STRING {
            rest.split_at(MAX_CARD_STRING - 1)
        } else {
            (rest, "")
        };
        let text = if more.is_empty() {
            format!("'{chunk:<8}'")
        } else {
            format!("'{chunk}&'")
        };
        let mut c = if first {
            keyword_prefix(keyword)
        } else {
            let mut c = [b' '; CARD_SIZE];
            c[..8].copy_from_slice(b"CONTINUE");
            c
        };
        c[10..10 + text.len()].copy_from_slice(text.as_bytes());
        cards.push(c);
        if more.is_empty() {
            return cards;
        }
        rest = more;
        first = false;
    }
}
