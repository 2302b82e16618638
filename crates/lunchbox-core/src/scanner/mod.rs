pub mod checksum;
pub mod file_scanner;

pub use checksum::Checksums;
pub use file_scanner::{RomFile, RomScanner, ScanProgress};
