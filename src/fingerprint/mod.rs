pub mod full_text;
pub mod generator;

pub use full_text::{FileReadError, FileSystem, FullTextFingerprint, OsFileSystem};
pub use generator::FingerprintGenerator;
