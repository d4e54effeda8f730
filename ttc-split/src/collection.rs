//! The [TTC header] and per-font [table directory].
//!
//! [TTC header]: https://learn.microsoft.com/en-us/typography/opentype/spec/otff#ttc-header
//! [table directory]: https://learn.microsoft.com/en-us/typography/opentype/spec/otff#table-directory

use std::io::{self, Read, Seek, Write};

use font_types::{MajorMinor, Tag, TTC_HEADER_TAG};

use crate::{
    error::SplitError,
    stream::{write_be, BeReader},
};

/// The header of a font collection file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TtcHeader {
    pub version: MajorMinor,
    /// Absolute offsets of each font's table directory.
    pub table_directory_offsets: Vec<u32>,
}

impl TtcHeader {
    /// Read the header from the start of the stream.
    ///
    /// Fails with [`SplitError::InvalidFileFormat`] if the stream does not
    /// begin with the `ttcf` tag (including when it is shorter than the tag),
    /// and with [`SplitError::InvalidNumFonts`] if the collection claims to be
    /// empty.
    pub fn read<R: Read + Seek>(reader: &mut BeReader<R>) -> Result<Self, SplitError> {
        reader
            .seek_to(0)
            .map_err(SplitError::io("failed to read the collection header"))?;
        let tag: Tag = match reader.read() {
            Ok(tag) => tag,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                return Err(SplitError::InvalidFileFormat)
            }
            Err(e) => return Err(SplitError::io("failed to read the collection header")(e)),
        };
        if tag != TTC_HEADER_TAG {
            return Err(SplitError::InvalidFileFormat);
        }
        Self::read_after_tag(reader).map_err(|e| match e {
            HeaderError::Empty => SplitError::InvalidNumFonts,
            HeaderError::Io(e) => SplitError::io("failed to read the collection header")(e),
        })
    }

    fn read_after_tag<R: Read + Seek>(reader: &mut BeReader<R>) -> Result<Self, HeaderError> {
        let major: u16 = reader.read()?;
        let minor: u16 = reader.read()?;
        let num_fonts: u32 = reader.read()?;
        if num_fonts == 0 {
            return Err(HeaderError::Empty);
        }
        // don't trust num_fonts for the allocation; a bogus count runs out of
        // data long before it runs out of memory.
        let mut table_directory_offsets = Vec::new();
        for _ in 0..num_fonts {
            let offset: u32 = reader.read()?;
            table_directory_offsets.push(offset);
        }
        Ok(TtcHeader {
            version: MajorMinor::new(major, minor),
            table_directory_offsets,
        })
    }

    /// The number of fonts in the collection.
    pub fn num_fonts(&self) -> u32 {
        self.table_directory_offsets.len() as u32
    }

    /// Iterate over `(font_index, offset)` pairs, where the index is 1-based.
    pub fn fonts(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.table_directory_offsets
            .iter()
            .enumerate()
            .map(|(i, offset)| (i as u32 + 1, *offset))
    }
}

enum HeaderError {
    Empty,
    Io(io::Error),
}

impl From<io::Error> for HeaderError {
    fn from(value: io::Error) -> Self {
        HeaderError::Io(value)
    }
}

/// The fixed 12-byte header at the start of a table directory.
///
/// The binary search fields are carried through untouched; we never
/// recompute them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SfntHeader {
    pub sfnt_version: u32,
    pub num_tables: u16,
    pub search_range: u16,
    pub entry_selector: u16,
    pub range_shift: u16,
}

impl SfntHeader {
    /// The encoded size of the header.
    pub const RAW_BYTE_LEN: usize = 12;

    fn read<R: Read + Seek>(reader: &mut BeReader<R>) -> io::Result<Self> {
        Ok(SfntHeader {
            sfnt_version: reader.read()?,
            num_tables: reader.read()?,
            search_range: reader.read()?,
            entry_selector: reader.read()?,
            range_shift: reader.read()?,
        })
    }

    pub fn write_into<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        write_be(writer, self.sfnt_version)?;
        write_be(writer, self.num_tables)?;
        write_be(writer, self.search_range)?;
        write_be(writer, self.entry_selector)?;
        write_be(writer, self.range_shift)
    }
}

/// A record in a table directory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TableRecord {
    /// Table identifier; compared byte for byte, never case folded.
    pub tag: Tag,
    pub checksum: u32,
    /// Absolute offset of the table data in the file this record was read from.
    pub offset: u32,
    pub length: u32,
}

impl TableRecord {
    /// The encoded size of a record.
    pub const RAW_BYTE_LEN: usize = 16;

    fn read<R: Read + Seek>(reader: &mut BeReader<R>) -> io::Result<Self> {
        Ok(TableRecord {
            tag: reader.read()?,
            checksum: reader.read()?,
            offset: reader.read()?,
            length: reader.read()?,
        })
    }

    pub fn write_into<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        write_be(writer, self.tag)?;
        write_be(writer, self.checksum)?;
        write_be(writer, self.offset)?;
        write_be(writer, self.length)
    }
}

/// The table directory of a single font.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableDirectory {
    pub header: SfntHeader,
    /// Records in the order they appear in the file.
    pub table_records: Vec<TableRecord>,
}

impl TableDirectory {
    /// Read a table directory at an absolute offset.
    ///
    /// Exactly `num_tables` records are read, in file order.
    pub fn read_at<R: Read + Seek>(reader: &mut BeReader<R>, offset: u32) -> io::Result<Self> {
        reader.seek_to(offset as u64)?;
        let header = SfntHeader::read(reader)?;
        let table_records = (0..header.num_tables)
            .map(|_| TableRecord::read(reader))
            .collect::<Result<_, _>>()?;
        Ok(TableDirectory {
            header,
            table_records,
        })
    }

    /// Returns the first record with this tag, if any.
    pub fn find(&self, tag: Tag) -> Option<&TableRecord> {
        self.table_records.iter().find(|record| record.tag == tag)
    }

    /// The encoded size of a directory with `num_tables` records.
    pub fn encoded_len(num_tables: usize) -> usize {
        SfntHeader::RAW_BYTE_LEN + num_tables * TableRecord::RAW_BYTE_LEN
    }
}
