//! FITS header cards and keyword lookup.

use std::io::Read;

use crate::block::{BLOCK_SIZE, CARDS_PER_BLOCK, CARD_SIZE};
use crate::error::{Error, Result};
use crate::value::{parse_value, Value};

/// A parsed FITS header card (one 80-byte keyword record).
#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    /// The keyword, trimmed of padding.
    pub keyword: String,
    /// The parsed value, if this card has a value indicator.
    pub value: Option<Value>,
    /// An optional comment string.
    pub comment: Option<String>,
}

impl Card {
    /// Returns `true` if this card is the END keyword.
    pub fn is_end(&self) -> bool {
        self.keyword == "END"
    }
}

/// Parse a single 80-byte FITS header card.
///
/// `COMMENT`, `HISTORY`, blank and `CONTINUE` keywords carry no value
/// indicator; their text is kept as the comment, except `CONTINUE` whose
/// string is parsed as a value.
///
/// Keywords with characters outside `A-Z 0-9 - _` are kept verbatim with a
/// warning. Lookups are exact, so such a card never stands in for its
/// standard spelling.
pub fn parse_card(bytes: &[u8; CARD_SIZE]) -> Card {
    let raw_keyword = &bytes[..8];
    let keyword = String::from_utf8_lossy(raw_keyword).trim_end().to_string();
    if !raw_keyword
        .iter()
        .all(|&b| matches!(b, b'A'..=b'Z' | b'0'..=b'9' | b' ' | b'-' | b'_'))
    {
        log::warn!("Non-standard header keyword {keyword:?}");
    }

    let (value, comment) = match keyword.as_str() {
        "END" => (None, None),
        "CONTINUE" => split_value(&bytes[8..]),
        "COMMENT" | "HISTORY" | "" => (None, free_text(&bytes[8..])),
        _ if &bytes[8..10] == b"= " => split_value(&bytes[10..]),
        _ => (None, free_text(&bytes[8..])),
    };

    Card {
        keyword,
        value,
        comment,
    }
}

fn split_value(field: &[u8]) -> (Option<Value>, Option<String>) {
    match parse_value(field) {
        Some((value, comment)) => (Some(value), comment),
        None => (None, None),
    }
}

fn free_text(bytes: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(bytes);
    let text = text.trim_end();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// The ordered cards of one HDU header, END excluded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Header {
    cards: Vec<Card>,
}

impl Header {
    pub fn new(cards: Vec<Card>) -> Self {
        Header { cards }
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// Returns the first card with the given keyword.
    pub fn find(&self, keyword: &str) -> Option<&Card> {
        self.cards.iter().find(|c| c.keyword == keyword)
    }

    pub fn value(&self, keyword: &str) -> Option<&Value> {
        self.find(keyword).and_then(|c| c.value.as_ref())
    }

    pub fn integer(&self, keyword: &str) -> Option<i64> {
        match self.value(keyword)? {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Float lookup; integer values are accepted and promoted.
    pub fn float(&self, keyword: &str) -> Option<f64> {
        self.value(keyword)?.as_f64()
    }

    pub fn logical(&self, keyword: &str) -> Option<bool> {
        match self.value(keyword)? {
            Value::Logical(b) => Some(*b),
            _ => None,
        }
    }

    /// String lookup following the long-string `CONTINUE` convention.
    ///
    /// A value ending in `&` is continued by the string of the next card
    /// when that card is a `CONTINUE`. Returns `Err(NotAString)` when the
    /// keyword holds a non-string value.
    pub fn string(&self, keyword: &str) -> Result<Option<String>> {
        let Some(pos) = self.cards.iter().position(|c| c.keyword == keyword) else {
            return Ok(None);
        };
        let mut text = match &self.cards[pos].value {
            Some(Value::String(s)) => s.clone(),
            _ => return Err(Error::NotAString(keyword.to_string())),
        };
        for card in &self.cards[pos + 1..] {
            if !text.ends_with('&') || card.keyword != "CONTINUE" {
                break;
            }
            text.pop();
            if let Some(Value::String(more)) = &card.value {
                text.push_str(more);
            }
        }
        Ok(Some(text))
    }
}

/// Read header blocks from `reader` until the END card.
///
/// Returns the header and the number of bytes consumed (a whole number of
/// blocks). Returns `Ok(None)` if the reader is exhausted before the first
/// byte, which marks the end of the HDU sequence.
pub fn read_header<R: Read>(reader: &mut R) -> Result<Option<(Header, usize)>> {
    let mut cards = Vec::new();
    let mut block = [0u8; BLOCK_SIZE];
    let mut consumed = 0;

    loop {
        let filled = read_full(reader, &mut block)?;
        if filled == 0 && consumed == 0 {
            return Ok(None);
        }
        if filled < BLOCK_SIZE {
            return Err(Error::UnexpectedEof);
        }
        consumed += BLOCK_SIZE;

        for i in 0..CARDS_PER_BLOCK {
            let start = i * CARD_SIZE;
            let bytes: &[u8; CARD_SIZE] = block[start..start + CARD_SIZE]
                .try_into()
                .map_err(|_| Error::InvalidHeader("short card"))?;
            let card = parse_card(bytes);
            if card.is_end() {
                return Ok(Some((Header::new(cards), consumed)));
            }
            cards.push(card);
        }
    }
}

/// Like `read_exact`, but reports how much was read instead of failing on
/// a short read.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}
