use std::fmt::Display;

/// Lowercase hexadecimal rendering of borrowed binary data.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub struct Hex<'a>(pub &'a [u8]);

fn hex_digit(b: u8) -> char {
    match b {
        0..=9 => (b + b'0') as char,
        10..=15 => (b - 10 + b'a') as char,
        _ => unreachable!("nibble out of range"),
    }
}

fn unhex_digit(h: u8) -> Option<u8> {
    match h {
        b'0'..=b'9' => Some(h - b'0'),
        b'a'..=b'f' => Some(h - b'a' + 10),
        b'A'..=b'F' => Some(h - b'A' + 10),
        _ => None,
    }
}

impl Display for Hex<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for &b in self.0 {
            write!(f, "{}{}", hex_digit(b >> 4), hex_digit(b & 0b00001111))?;
        }
        Ok(())
    }
}

/// Decodes an even-length hexadecimal string, returning `None` on any
/// malformed input.
pub fn decode(s: &str) -> Option<Vec<u8>> {
    let s = s.as_bytes();
    if s.len() % 2 != 0 {
        return None;
    }
    s.chunks(2)
        .map(|pair| Some((unhex_digit(pair[0])? << 4) | unhex_digit(pair[1])?))
        .collect()
}

/// Whether `s` consists only of hexadecimal digits.
pub fn is_hex(s: &str) -> bool {
    s.bytes().all(|b| unhex_digit(b).is_some())
}

#[test]
fn test_hex_round_trip() {
    let example: &[u8] = b"hello, world";
    let encoded = format!("{}", Hex(example));
    assert_eq!(encoded, "68656c6c6f2c20776f726c64");
    assert_eq!(decode(&encoded).as_deref(), Some(example));
}

#[test]
fn test_decode_rejects_malformed() {
    assert_eq!(decode("abc"), None);
    assert_eq!(decode("zz"), None);
    assert!(is_hex("09afAF"));
    assert!(!is_hex("09ag"));
}
