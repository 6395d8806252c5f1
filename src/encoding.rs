use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Character encoding of an input file.
///
/// UTF-8 covers modern tool output; Latin-1 shows up in legacy XML reports
/// that declare ISO-8859-1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Encoding {
    #[default]
    Utf8,
    Latin1,
}

/// The bytes of an input cannot be decoded with the declared encoding.
#[derive(Debug, Error)]
#[error("input is not valid {encoding}")]
pub struct EncodingMismatch {
    encoding: Encoding,
}

impl Encoding {
    /// Resolve an encoding name as declared in an XML header or a config file.
    pub fn parse(name: &str) -> Option<Encoding> {
        match name.trim().to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Some(Encoding::Utf8),
            "iso-8859-1" | "iso8859-1" | "latin-1" | "latin1" => Some(Encoding::Latin1),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Encoding::Utf8 => "UTF-8",
            Encoding::Latin1 => "ISO-8859-1",
        }
    }

    /// Decode raw bytes, skipping a UTF-8 byte-order mark if present.
    pub fn decode(&self, bytes: &[u8]) -> Result<String, EncodingMismatch> {
        let bytes = strip_bom(bytes);
        match self {
            Encoding::Utf8 => std::str::from_utf8(bytes)
                .map(str::to_owned)
                .map_err(|_| EncodingMismatch { encoding: *self }),
            // Every Latin-1 byte maps to the code point of the same value.
            Encoding::Latin1 => Ok(bytes.iter().map(|&b| b as char).collect()),
        }
    }
}

impl std::fmt::Display for Encoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn strip_bom(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_names() {
        assert_eq!(Encoding::parse("UTF-8"), Some(Encoding::Utf8));
        assert_eq!(Encoding::parse("iso-8859-1"), Some(Encoding::Latin1));
        assert_eq!(Encoding::parse("utf-16"), None);
    }

    #[test]
    fn decodes_latin1_bytes_that_are_not_utf8() {
        let bytes = [b'f', 0xE4, b'h', b'r', b't'];
        assert!(Encoding::Utf8.decode(&bytes).is_err());
        assert_eq!(Encoding::Latin1.decode(&bytes).unwrap(), "fährt");
    }

    #[test]
    fn skips_byte_order_mark() {
        let bytes = [0xEF, 0xBB, 0xBF, b'<', b'a', b'/', b'>'];
        assert_eq!(Encoding::Utf8.decode(&bytes).unwrap(), "<a/>");
    }
}
