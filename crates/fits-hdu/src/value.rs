//! Parsing of the value field (bytes 10..80) of a header card.

/// A parsed FITS header value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// FITS logical value (`T` or `F`).
    Logical(bool),
    /// FITS integer value.
    Integer(i64),
    /// FITS floating-point value.
    Float(f64),
    /// FITS character string, without quotes and trailing blanks.
    String(String),
}

impl Value {
    /// Numeric view of the value; integers are promoted.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(n) => Some(*n as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }
}

/// Parse the value field of a card into a value and an optional comment.
///
/// Returns `None` when the field holds no value (blank or undefined).
pub fn parse_value(field: &[u8]) -> Option<(Value, Option<String>)> {
    let start = field.iter().position(|&b| b != b' ')?;
    let field = &field[start..];

    if field[0] == b'\'' {
        let (text, rest) = parse_quoted(field);
        return Some((Value::String(text), comment_after(rest)));
    }

    let (raw, comment) = match field.iter().position(|&b| b == b'/') {
        Some(slash) => (&field[..slash], comment_after(&field[slash..])),
        None => (field, None),
    };
    let text = std::str::from_utf8(raw).ok()?.trim();

    let value = match text {
        "" => return None,
        "T" => Value::Logical(true),
        "F" => Value::Logical(false),
        _ => parse_number(text)?,
    };
    Some((value, comment))
}

/// Scan a quoted string starting at `field[0] == '\''`.
///
/// Returns the unquoted text and the bytes after the closing quote. An
/// unterminated string takes the rest of the field.
fn parse_quoted(field: &[u8]) -> (String, &[u8]) {
    let mut text = String::new();
    let mut i = 1;
    while i < field.len() {
        if field[i] == b'\'' {
            if field.get(i + 1) == Some(&b'\'') {
                text.push('\'');
                i += 2;
                continue;
            }
            i += 1;
            break;
        }
        text.push(field[i] as char);
        i += 1;
    }
    let trimmed = text.trim_end().len();
    text.truncate(trimmed);
    (text, &field[i.min(field.len())..])
}

fn comment_after(rest: &[u8]) -> Option<String> {
    let slash = rest.iter().position(|&b| b == b'/')?;
    let text = std::str::from_utf8(&rest[slash + 1..]).ok()?.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

fn parse_number(text: &str) -> Option<Value> {
    let is_float = text.bytes().any(|b| matches!(b, b'.' | b'E' | b'e' | b'D' | b'd'));
    if !is_float {
        if let Ok(n) = text.parse::<i64>() {
            return Some(Value::Integer(n));
        }
    }
    text.replace(['D', 'd'], "E").parse::<f64>().ok().map(Value::Float)
}
