//! Fixed-size container header and length-prefixed section reads.

use super::ProjectError;
use byteorder::{LittleEndian, ReadBytesExt};
use log::debug;
use std::io::{self, Cursor, Read};

/// The four bytes every fSpy project starts with.
pub const MAGIC_WORD: &[u8; 4] = b"fspy";
/// The only container version this crate reads.
pub const FILE_VERSION: u32 = 1;
/// Magic word, version and the two section lengths.
pub const HEADER_SIZE: usize = 16;

/// Decoded header fields following the magic word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerHeader {
    pub version: u32,
    pub metadata_len: u32,
    pub image_len: u32,
}

/// Sequential reader over an in-memory project buffer.
pub(crate) struct ContainerReader<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl<'a> ContainerReader<'a> {
    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        ContainerReader {
            cursor: Cursor::new(bytes),
        }
    }

    /// Reads and checks the magic word, version and section lengths.
    ///
    /// The checks run in file order: a bad magic word wins over a bad
    /// version, and a bad version wins over an empty image section.
    pub(crate) fn read_header(&mut self) -> Result<ContainerHeader, ProjectError> {
        let mut magic = [0u8; 4];
        if self.cursor.read_exact(&mut magic).is_err() || &magic != MAGIC_WORD {
            return Err(ProjectError::InvalidFormat(
                "Not an fSpy project file".to_string(),
            ));
        }

        let version = self.read_header_u32()?;
        if version != FILE_VERSION {
            return Err(ProjectError::UnsupportedVersion(version));
        }

        let metadata_len = self.read_header_u32()?;
        let image_len = self.read_header_u32()?;
        debug!(
            "fSpy header: version {}, metadata {} bytes, image {} bytes",
            version, metadata_len, image_len
        );

        if image_len == 0 {
            return Err(ProjectError::MissingImageData);
        }

        Ok(ContainerHeader {
            version,
            metadata_len,
            image_len,
        })
    }

    /// Borrows the next `len` bytes as the named section.
    pub(crate) fn read_section(
        &mut self,
        section: &'static str,
        len: u32,
    ) -> Result<&'a [u8], ProjectError> {
        let data: &'a [u8] = *self.cursor.get_ref();
        let start = (self.cursor.position() as usize).min(data.len());
        let expected = len as usize;
        let available = data.len() - start;

        if available < expected {
            return Err(ProjectError::TruncatedData {
                section,
                expected,
                available,
            });
        }

        let end = start + expected;
        self.cursor.set_position(end as u64);
        Ok(&data[start..end])
    }

    fn read_header_u32(&mut self) -> Result<u32, ProjectError> {
        let available = self.cursor.get_ref().len();
        self.cursor
            .read_u32::<LittleEndian>()
            .map_err(|e| match e.kind() {
                io::ErrorKind::UnexpectedEof => ProjectError::TruncatedData {
                    section: "header",
                    expected: HEADER_SIZE,
                    available,
                },
                _ => ProjectError::IOError(e.to_string()),
            })
    }
}
