//! ZIP containers for KMZ and zipped shapefiles.
//!
//! Members are located from the end of the file: the End of Central
//! Directory record (ZIP64 when the classic fields overflow) points at the
//! Central Directory, and each directory entry points at a Local File Header.
//! Listing therefore reads only the tail of the archive, and reading a member
//! touches only that member's bytes, which matters when the source is an
//! [`HttpRangeReader`](crate::io::HttpRangeReader).
//!
//! Only STORED and DEFLATE members can be read, every extracted member is
//! checked against its CRC-32, and encrypted or multi-disk archives are
//! rejected.

mod archive;
mod parser;
mod structures;

pub use archive::{Archive, ZipArchive, find_member_by_extension};
pub use parser::ZipParser;
pub use structures::*;
