//! Writing a standalone font from one member of a collection.
//!
//! Table data is copied verbatim, so checksums are copied verbatim as well;
//! only offsets change. `head.checkSumAdjustment` is not updated and will
//! generally be stale in the output.

use std::{
    fs::File,
    io::{self, BufWriter, Read, Seek, SeekFrom, Write},
    path::PathBuf,
};

use font_types::Tag;

use crate::{
    collection::{SfntHeader, TableDirectory, TableRecord},
    error::SplitError,
    stream::{write_zeros, BeReader},
};

/// The tables kept when filtering: the tables registered in the OpenType
/// specification that can appear in a standalone font.
pub static KNOWN_TABLE_TAGS: &[Tag] = &[
    Tag::new(b"avar"),
    Tag::new(b"BASE"),
    Tag::new(b"CBDT"),
    Tag::new(b"CBLC"),
    Tag::new(b"CFF "),
    Tag::new(b"CFF2"),
    Tag::new(b"cmap"),
    Tag::new(b"COLR"),
    Tag::new(b"CPAL"),
    Tag::new(b"cvar"),
    Tag::new(b"cvt "),
    Tag::new(b"DSIG"),
    Tag::new(b"EBDT"),
    Tag::new(b"EBLC"),
    Tag::new(b"EBSC"),
    Tag::new(b"fpgm"),
    Tag::new(b"fvar"),
    Tag::new(b"gasp"),
    Tag::new(b"GDEF"),
    Tag::new(b"glyf"),
    Tag::new(b"GPOS"),
    Tag::new(b"GSUB"),
    Tag::new(b"gvar"),
    Tag::new(b"hdmx"),
    Tag::new(b"head"),
    Tag::new(b"hhea"),
    Tag::new(b"hmtx"),
    Tag::new(b"HVAR"),
    Tag::new(b"JSTF"),
    Tag::new(b"kern"),
    Tag::new(b"loca"),
    Tag::new(b"LTSH"),
    Tag::new(b"MATH"),
    Tag::new(b"maxp"),
    Tag::new(b"MERG"),
    Tag::new(b"meta"),
    Tag::new(b"MVAR"),
    Tag::new(b"name"),
    Tag::new(b"OS/2"),
    Tag::new(b"PCLT"),
    Tag::new(b"post"),
    Tag::new(b"prep"),
    Tag::new(b"sbix"),
    Tag::new(b"STAT"),
    Tag::new(b"SVG "),
    Tag::new(b"VDMX"),
    Tag::new(b"vhea"),
    Tag::new(b"vmtx"),
    Tag::new(b"VORG"),
    Tag::new(b"VVAR"),
];

/// Which tables are copied into the output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TableFilter {
    /// Only tables listed in [`KNOWN_TABLE_TAGS`].
    KnownTables,
    /// Every table in the source directory.
    AllTables,
}

impl TableFilter {
    pub fn includes(self, tag: Tag) -> bool {
        match self {
            TableFilter::KnownTables => KNOWN_TABLE_TAGS.contains(&tag),
            TableFilter::AllTables => true,
        }
    }
}

/// How many zero bytes follow each table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TablePadding {
    /// `length % 4` bytes.
    ///
    /// Kept for byte-compatible output with existing split fonts. Tables only
    /// stay aligned when the length is a multiple of four or leaves two
    /// bytes over.
    #[default]
    Legacy,
    /// Pad each table to a four byte boundary, as OpenType requires.
    Aligned,
}

impl TablePadding {
    /// The number of zero bytes written after a table of this length.
    pub fn padding_for(self, length: u32) -> usize {
        let rem = (length % 4) as usize;
        match self {
            TablePadding::Legacy => rem,
            TablePadding::Aligned => (4 - rem) % 4,
        }
    }
}

/// The file name for a font: `"{font_index}-{family_name}.ttf"`.
pub fn output_file_name(font_index: u32, family_name: &str) -> String {
    format!("{font_index}-{family_name}.ttf")
}

/// Write a standalone font containing the tables of `directory` that pass
/// `filter`.
///
/// `sink` should be empty; the font is written from position zero. A
/// zeroed placeholder is reserved for the table directory, the table data is
/// appended in directory order, and the directory is filled in last.
///
/// The sfnt header is copied from the source, except that `num_tables` is
/// the number of tables actually written. The binary search fields are left
/// as they were. Returns the directory that was written.
pub fn write_font<R, W>(
    reader: &mut BeReader<R>,
    directory: &TableDirectory,
    filter: TableFilter,
    padding: TablePadding,
    sink: &mut W,
) -> Result<TableDirectory, SplitError>
where
    R: Read + Seek,
    W: Write + Seek,
{
    let included: Vec<&TableRecord> = directory
        .table_records
        .iter()
        .filter(|record| {
            let keep = filter.includes(record.tag);
            if !keep {
                log::debug!("dropping unrecognized table '{}'", record.tag);
            }
            keep
        })
        .collect();

    let num_tables = u16::try_from(included.len()).map_err(|_| SplitError::Io {
        context: "failed to write the table directory".into(),
        source: io::Error::other("too many tables"),
    })?;
    reserve_directory(sink, included.len())
        .map_err(SplitError::io("failed to reserve the table directory"))?;

    let mut table_records = Vec::with_capacity(included.len());
    for record in included {
        let context = || format!("failed to copy table '{}'", record.tag);
        let position = sink.stream_position().map_err(SplitError::io(context()))?;
        let offset = u32::try_from(position).map_err(|_| SplitError::Io {
            context: context(),
            source: io::Error::other("output exceeds the 4GB offset limit"),
        })?;
        copy_table(reader, record, padding, sink).map_err(SplitError::io(context()))?;
        table_records.push(TableRecord { offset, ..*record });
    }

    let written = TableDirectory {
        header: SfntHeader {
            num_tables,
            ..directory.header
        },
        table_records,
    };
    write_directory(&written, sink)
        .map_err(SplitError::io("failed to write the table directory"))?;
    Ok(written)
}

fn reserve_directory<W: Write + Seek>(sink: &mut W, num_tables: usize) -> io::Result<()> {
    sink.seek(SeekFrom::Start(0))?;
    write_zeros(sink, TableDirectory::encoded_len(num_tables))
}

fn copy_table<R, W>(
    reader: &mut BeReader<R>,
    record: &TableRecord,
    padding: TablePadding,
    sink: &mut W,
) -> io::Result<()>
where
    R: Read + Seek,
    W: Write,
{
    reader.seek_to(record.offset as u64)?;
    reader.copy_to(record.length as u64, sink)?;
    write_zeros(sink, padding.padding_for(record.length))
}

fn write_directory<W: Write + Seek>(directory: &TableDirectory, sink: &mut W) -> io::Result<()> {
    sink.seek(SeekFrom::Start(0))?;
    directory.header.write_into(sink)?;
    for record in &directory.table_records {
        record.write_into(sink)?;
    }
    sink.seek(SeekFrom::End(0))?;
    Ok(())
}

/// Writes fonts as files in an output directory.
#[derive(Clone, Debug)]
pub struct FontWriter {
    output_dir: PathBuf,
    filter: TableFilter,
    padding: TablePadding,
}

impl FontWriter {
    pub fn new(output_dir: impl Into<PathBuf>, filter: TableFilter, padding: TablePadding) -> Self {
        FontWriter {
            output_dir: output_dir.into(),
            filter,
            padding,
        }
    }

    /// Write one font, returning the path of the new file.
    ///
    /// Fails with [`SplitError::OutputDirectoryNotExist`] before touching the
    /// filesystem if the output directory is missing. An existing file with
    /// the same name is overwritten.
    pub fn write<R: Read + Seek>(
        &self,
        reader: &mut BeReader<R>,
        directory: &TableDirectory,
        font_index: u32,
        family_name: &str,
    ) -> Result<PathBuf, SplitError> {
        if !self.output_dir.is_dir() {
            return Err(SplitError::OutputDirectoryNotExist(self.output_dir.clone()));
        }
        let path = self
            .output_dir
            .join(output_file_name(font_index, family_name));
        let file = File::create(&path)
            .map_err(SplitError::io(format!("failed to create '{}'", path.display())))?;
        let mut sink = BufWriter::new(file);
        let written = write_font(reader, directory, self.filter, self.padding, &mut sink)?;
        sink.flush()
            .map_err(SplitError::io(format!("failed to write '{}'", path.display())))?;
        log::info!(
            "font {font_index}: wrote {} of {} tables to '{}'",
            written.table_records.len(),
            directory.table_records.len(),
            path.display()
        );
        Ok(path)
    }
}
