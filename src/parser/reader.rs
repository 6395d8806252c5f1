use std::fs;
use std::io::{self, Read};
use std::path::Path;

use tracing::debug;

use super::ParsingError;
use crate::encoding::Encoding;

/// Access to one piece of tool output.
///
/// Adapters receive decoded text plus the identity and encoding of the
/// source, so the same adapter runs against files, strings, or anything
/// else that can produce text.
pub trait ReaderFactory: Send + Sync {
    /// Identifier of the source, with forward-slash separators.
    fn id(&self) -> &str;

    /// Encoding used to decode the raw bytes.
    fn encoding(&self) -> Encoding;

    /// The complete decoded content.
    fn read_string(&self) -> Result<String, ParsingError>;

    /// The decoded content split into lines.
    fn read_lines(&self) -> Result<Vec<String>, ParsingError> {
        Ok(self.read_string()?.lines().map(str::to_owned).collect())
    }
}

/// Reads tool output from a file on disk.
pub struct FileReaderFactory {
    file_name: String,
    encoding: Encoding,
}

impl FileReaderFactory {
    /// Open `path`, detecting the encoding from an XML declaration when
    /// there is one. Defaults to UTF-8.
    pub fn new(path: &Path) -> Self {
        let encoding = detect_encoding(path).unwrap_or_default();
        Self::with_encoding(path, encoding)
    }

    /// Open `path` with an explicit encoding.
    pub fn with_encoding(path: &Path, encoding: Encoding) -> Self {
        FileReaderFactory {
            file_name: path.to_string_lossy().replace('\\', "/"),
            encoding,
        }
    }
}

impl ReaderFactory for FileReaderFactory {
    fn id(&self) -> &str {
        &self.file_name
    }

    fn encoding(&self) -> Encoding {
        self.encoding
    }

    fn read_string(&self) -> Result<String, ParsingError> {
        let bytes = fs::read(&self.file_name).map_err(|error| match error.kind() {
            io::ErrorKind::NotFound => {
                ParsingError::file_access(&self.file_name, "file not found")
            }
            _ => ParsingError::file_access(&self.file_name, error.to_string()),
        })?;
        self.encoding
            .decode(&bytes)
            .map_err(|error| ParsingError::file_access(&self.file_name, error.to_string()))
    }
}

/// Serves in-memory content, for tests and embedded input.
pub struct StringReaderFactory {
    id: String,
    content: String,
}

impl StringReaderFactory {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        StringReaderFactory {
            id: id.into(),
            content: content.into(),
        }
    }
}

impl ReaderFactory for StringReaderFactory {
    fn id(&self) -> &str {
        &self.id
    }

    fn encoding(&self) -> Encoding {
        Encoding::Utf8
    }

    fn read_string(&self) -> Result<String, ParsingError> {
        Ok(self.content.clone())
    }
}

/// Look for `encoding="..."` in an XML declaration within the first bytes
/// of the file. The header is ASCII in every encoding we support, so a
/// byte-as-char view is enough to find it.
fn detect_encoding(path: &Path) -> Option<Encoding> {
    let mut head = [0u8; 256];
    let mut file = fs::File::open(path).ok()?;
    let read = file.read(&mut head).ok()?;
    let head: String = head[..read].iter().map(|&b| b as char).collect();

    let declaration = &head[head.find("<?xml")?..];
    let declaration = &declaration[..declaration.find("?>")?];
    let value = declaration.split("encoding=").nth(1)?;
    let quote = value.chars().next()?;
    if quote != '"' && quote != '\'' {
        return None;
    }
    let value = &value[1..];
    let name = &value[..value.find(quote)?];

    let encoding = Encoding::parse(name);
    if encoding.is_none() {
        debug!("Unsupported encoding '{name}' declared in {}", path.display());
    }
    encoding
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn detects_latin1_from_the_xml_declaration() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.xml");
        let mut bytes =
            b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\n<message text=\"".to_vec();
        bytes.push(0xE4); // ä in Latin-1, invalid on its own in UTF-8
        bytes.extend_from_slice(b"\"/>");
        fs::write(&path, bytes).unwrap();

        let factory = FileReaderFactory::new(&path);
        assert_eq!(factory.encoding(), Encoding::Latin1);
        assert!(factory.read_string().unwrap().contains('ä'));
    }

    #[test]
    fn defaults_to_utf8_without_a_declaration() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.txt");
        fs::write(&path, "warning: something\n").unwrap();

        let factory = FileReaderFactory::new(&path);
        assert_eq!(factory.encoding(), Encoding::Utf8);
        assert_eq!(factory.read_string().unwrap(), "warning: something\n");
    }

    #[test]
    fn skips_a_leading_byte_order_mark() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bom.xml");
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(b"<?xml version=\"1.0\"?><r/>");
        fs::write(&path, bytes).unwrap();

        let factory = FileReaderFactory::new(&path);
        assert!(factory.read_string().unwrap().starts_with("<?xml"));
    }

    #[test]
    fn missing_file_is_a_file_access_error() {
        let factory = FileReaderFactory::new(Path::new("/does/not/exist.xml"));
        let error = factory.read_string().unwrap_err();
        assert!(matches!(error, ParsingError::FileAccess { .. }));
    }

    #[test]
    fn undecodable_bytes_are_a_file_access_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("binary.txt");
        fs::write(&path, [0xFF, 0xFE, 0x00, 0x41]).unwrap();

        let factory = FileReaderFactory::with_encoding(&path, Encoding::Utf8);
        assert!(factory.read_string().is_err());
    }

    #[test]
    fn normalizes_the_source_identifier() {
        let factory =
            FileReaderFactory::with_encoding(Path::new("C:\\logs\\pmd.xml"), Encoding::Utf8);
        assert_eq!(factory.id(), "C:/logs/pmd.xml");
    }

    #[test]
    fn string_factory_round_trips() {
        let factory = StringReaderFactory::new("inline", "a\nb\n");
        assert_eq!(factory.read_lines().unwrap(), ["a", "b"]);
    }
}
