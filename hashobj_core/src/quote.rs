//! C-style unquoting for batch path lines.

use crate::error::{Error, Result};
use std::borrow::Cow;

/// Decode one batch line.
///
/// Lines starting with `"` are C-style quoted: the usual single-character
/// escapes plus three-digit octal (`\302\240`). Anything after the closing
/// quote is ignored. Other lines are returned unchanged.
pub fn unquote_line(line: &[u8]) -> Result<Cow<'_, [u8]>> {
    match line.first() {
        Some(b'"') => unquote_c_style(&line[1..])
            .map(Cow::Owned)
            .ok_or_else(|| Error::quote(String::from_utf8_lossy(line))),
        _ => Ok(Cow::Borrowed(line)),
    }
}

/// Decode the body of a quoted string (after the opening quote).
fn unquote_c_style(body: &[u8]) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(body.len());
    let mut bytes = body.iter().copied();

    loop {
        match bytes.next()? {
            b'"' => return Some(out),
            b'\\' => {
                let c = bytes.next()?;
                let decoded = match c {
                    b'a' => 0x07,
                    b'b' => 0x08,
                    b'f' => 0x0c,
                    b'n' => b'\n',
                    b'r' => b'\r',
                    b't' => b'\t',
                    b'v' => 0x0b,
                    b'\\' | b'"' => c,
                    b'0'..=b'3' => {
                        let mid = octal_digit(bytes.next()?)?;
                        let low = octal_digit(bytes.next()?)?;
                        ((c - b'0') << 6) | (mid << 3) | low
                    }
                    _ => return None,
                };
                out.push(decoded);
            }
            c => out.push(c),
        }
    }
}

fn octal_digit(c: u8) -> Option<u8> {
    matches!(c, b'0'..=b'7').then(|| c - b'0')
}
