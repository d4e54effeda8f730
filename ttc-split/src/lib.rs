//! Split a [TrueType collection] into standalone font files.
//!
//! A collection bundles several fonts into one file, each with its own
//! [table directory]. For each font, this crate looks up a family name in the
//! `name` table, and writes the font's tables to a new file named
//! `"{index}-{family name}.ttf"`, with the table offsets recomputed for the
//! new layout.
//!
//! # Example
//!
//! ```no_run
//! use ttc_split::{SplitMode, SplitOptions, TtcSplitter};
//!
//! // Windows platform, Japanese family names
//! let options = SplitOptions::new(3, 0x0411);
//! let splitter = TtcSplitter::new("msgothic.ttc", "out", options);
//! let report = splitter.run(SplitMode::Filtered);
//! if !report.success {
//!     eprintln!("{}", report.message);
//! }
//! ```
//!
//! [TrueType collection]: https://learn.microsoft.com/en-us/typography/opentype/spec/otff#font-collections
//! [table directory]: https://learn.microsoft.com/en-us/typography/opentype/spec/otff#table-directory

#![forbid(unsafe_code)]

pub mod collection;
mod error;
pub mod font_writer;
pub mod name;
pub mod stream;

use std::{
    fs::File,
    io::{BufReader, Read, Seek},
    path::{Path, PathBuf},
};

use font_types::MajorMinor;

use collection::{TableDirectory, TtcHeader};
use font_writer::{FontWriter, TableFilter};
use name::NameQuery;
use stream::BeReader;

pub use error::{ErrorKind, SplitError};
pub use font_writer::TablePadding;

/// Public re-export of the font-types crate.
pub extern crate font_types as types;

/// Caller configuration for a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SplitOptions {
    /// Platform of the name record used for file names.
    pub platform_id: u16,
    /// Language of the name record used for file names.
    pub language_id: u16,
    pub padding: TablePadding,
}

impl SplitOptions {
    pub fn new(platform_id: u16, language_id: u16) -> Self {
        SplitOptions {
            platform_id,
            language_id,
            padding: TablePadding::default(),
        }
    }

    pub fn with_padding(mut self, padding: TablePadding) -> Self {
        self.padding = padding;
        self
    }

    fn name_query(&self) -> NameQuery {
        NameQuery::family_name(self.platform_id, self.language_id)
    }
}

/// Which tables each output font receives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SplitMode {
    /// Only registered OpenType tables; see [`font_writer::KNOWN_TABLE_TAGS`].
    Filtered,
    /// Every table in the source font.
    Full,
}

impl SplitMode {
    pub fn table_filter(self) -> TableFilter {
        match self {
            SplitMode::Filtered => TableFilter::KnownTables,
            SplitMode::Full => TableFilter::AllTables,
        }
    }
}

/// The outcome of a successful run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SplitSummary {
    /// The collection's header version.
    pub version: MajorMinor,
    /// Files written, in font order.
    pub written: Vec<PathBuf>,
    /// 1-based indices of fonts that had no usable family name.
    pub skipped: Vec<u32>,
}

/// A structured report of a run, whatever its outcome.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SplitReport {
    pub success: bool,
    pub kind: ErrorKind,
    /// Empty on success.
    pub message: String,
    /// The collection's header version; only set on success.
    pub version: Option<MajorMinor>,
}

impl From<Result<SplitSummary, SplitError>> for SplitReport {
    fn from(result: Result<SplitSummary, SplitError>) -> Self {
        match result {
            Ok(summary) => SplitReport {
                success: true,
                kind: ErrorKind::NoError,
                message: String::new(),
                version: Some(summary.version),
            },
            Err(error) => SplitReport::from(&error),
        }
    }
}

impl From<&SplitError> for SplitReport {
    fn from(error: &SplitError) -> Self {
        SplitReport {
            success: false,
            kind: error.kind(),
            message: error.message(),
            version: None,
        }
    }
}

/// Splits one collection file into a directory.
#[derive(Clone, Debug)]
pub struct TtcSplitter {
    input: PathBuf,
    output_dir: PathBuf,
    options: SplitOptions,
}

impl TtcSplitter {
    pub fn new(
        input: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        options: SplitOptions,
    ) -> Self {
        TtcSplitter {
            input: input.into(),
            output_dir: output_dir.into(),
            options,
        }
    }

    /// Run, converting any failure into the returned report.
    pub fn run(&self, mode: SplitMode) -> SplitReport {
        self.split(mode).into()
    }

    /// Split the input file.
    pub fn split(&self, mode: SplitMode) -> Result<SplitSummary, SplitError> {
        self.split_reader(open_input(&self.input)?, mode)
    }

    /// Split a collection read from any seekable source.
    ///
    /// Fonts are processed in order. A font without a usable family name is
    /// skipped; any other failure ends the run, leaving files written for
    /// earlier fonts in place.
    pub fn split_reader<R: Read + Seek>(
        &self,
        reader: R,
        mode: SplitMode,
    ) -> Result<SplitSummary, SplitError> {
        let mut reader = BeReader::new(reader);
        let header = TtcHeader::read(&mut reader)?;
        log::debug!(
            "collection version {}.{} with {} fonts",
            header.version.major,
            header.version.minor,
            header.num_fonts()
        );
        let query = self.options.name_query();
        let writer = FontWriter::new(&self.output_dir, mode.table_filter(), self.options.padding);

        let mut written = Vec::new();
        let mut skipped = Vec::new();
        for (font_index, offset) in header.fonts() {
            let directory = TableDirectory::read_at(&mut reader, offset).map_err(SplitError::io(
                format!("failed to read the table directory of font {font_index}"),
            ))?;
            let family_name = name::resolve_family_name(&mut reader, &directory, &query)
                .map_err(SplitError::io(format!(
                    "failed to read the 'name' table of font {font_index}"
                )))?;
            let Some(family_name) = family_name else {
                log::info!("font {font_index}: no matching family name, skipping");
                skipped.push(font_index);
                continue;
            };
            written.push(writer.write(&mut reader, &directory, font_index, &family_name)?);
        }

        if written.is_empty() {
            return Err(SplitError::NoOutputFile);
        }
        Ok(SplitSummary {
            version: header.version,
            written,
            skipped,
        })
    }
}

/// Open a collection file for reading.
///
/// Fails with [`SplitError::FileDoesNotExist`] unless `path` names an
/// existing regular file.
pub fn open_input(path: &Path) -> Result<BufReader<File>, SplitError> {
    if !path.is_file() {
        return Err(SplitError::FileDoesNotExist(path.to_owned()));
    }
    let file = File::open(path)
        .map_err(SplitError::io(format!("failed to open '{}'", path.display())))?;
    Ok(BufReader::new(file))
}

/// What we know about one font in a collection, without writing anything.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FontInfo {
    /// 1-based position in the collection.
    pub index: u32,
    /// Absolute offset of the font's table directory.
    pub offset: u32,
    pub directory: TableDirectory,
    pub family_name: Option<String>,
    /// Language tags of a version 1 naming table.
    pub lang_tags: Vec<String>,
}

/// Decode the header, every table directory and every family name in a
/// collection.
pub fn inspect<R: Read + Seek>(
    reader: R,
    query: &NameQuery,
) -> Result<(TtcHeader, Vec<FontInfo>), SplitError> {
    let mut reader = BeReader::new(reader);
    let header = TtcHeader::read(&mut reader)?;
    let fonts = header
        .fonts()
        .map(|(index, offset)| -> Result<FontInfo, SplitError> {
            let directory = TableDirectory::read_at(&mut reader, offset).map_err(
                SplitError::io(format!("failed to read the table directory of font {index}")),
            )?;
            let name_context = || format!("failed to read the 'name' table of font {index}");
            let family_name = name::resolve_family_name(&mut reader, &directory, query)
                .map_err(SplitError::io(name_context()))?;
            let lang_tags = name::resolve_lang_tags(&mut reader, &directory)
                .map_err(SplitError::io(name_context()))?;
            Ok(FontInfo {
                index,
                offset,
                directory,
                family_name,
                lang_tags,
            })
        })
        .collect::<Result<_, _>>()?;
    Ok((header, fonts))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use font_test_data::{
        be_buffer,
        ttc::{self, NameEntry, TestFont},
    };
    use font_types::Tag;
    use pretty_assertions::assert_eq;

    use super::*;

    fn options() -> SplitOptions {
        SplitOptions::new(ttc::WINDOWS_PLATFORM_ID, ttc::JAPANESE_LANGUAGE_ID)
    }

    #[test]
    fn report_success() {
        let report = SplitReport::from(Ok(SplitSummary {
            version: MajorMinor::new(2, 0),
            written: vec!["1-A.ttf".into()],
            skipped: vec![],
        }));
        assert_eq!(
            report,
            SplitReport {
                success: true,
                kind: ErrorKind::NoError,
                message: String::new(),
                version: Some(MajorMinor::new(2, 0)),
            }
        );
    }

    #[test]
    fn report_failure() {
        let report = SplitReport::from(Err(SplitError::InvalidNumFonts));
        assert!(!report.success);
        assert_eq!(report.kind, ErrorKind::InvalidNumFonts);
        assert_eq!(report.message, "Invalid file format: numFonts is 0.");
        assert_eq!(report.version, None);
    }

    #[test]
    fn missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let splitter = TtcSplitter::new(dir.path().join("nope.ttc"), dir.path(), options());
        let report = splitter.run(SplitMode::Full);
        assert_eq!(report.kind, ErrorKind::FileDoesNotExist);
        assert_eq!(report.message, "File does not exist.");

        // a directory is not a font file
        let splitter = TtcSplitter::new(dir.path(), dir.path(), options());
        assert_eq!(
            splitter.run(SplitMode::Full).kind,
            ErrorKind::FileDoesNotExist
        );
    }

    #[test]
    fn bad_magic_reported_before_output_dir() {
        let data = be_buffer! { (Tag::new(b"ttcX")), 1u16, 0u16, 1u32, 16u32 };
        let splitter = TtcSplitter::new("unused.ttc", "/definitely/not/here", options());
        let err = splitter
            .split_reader(Cursor::new(data.into_vec()), SplitMode::Filtered)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidFileFormat);
    }

    #[test]
    fn split_in_memory_source() {
        let dir = tempfile::tempdir().unwrap();
        let splitter = TtcSplitter::new("unused.ttc", dir.path(), options());
        let data = ttc::collection(&[ttc::nameless_font(), ttc::example_font()]);
        let summary = splitter
            .split_reader(Cursor::new(data), SplitMode::Filtered)
            .unwrap();
        assert_eq!(summary.version, MajorMinor::new(1, 0));
        assert_eq!(summary.skipped, vec![1]);
        assert_eq!(
            summary.written,
            vec![dir.path().join(format!("2-{}.ttf", ttc::EXAMPLE_FAMILY_NAME))]
        );
    }

    #[test]
    fn open_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let err = open_input(&dir.path().join("nope.ttc")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FileDoesNotExist);
        let err = open_input(dir.path()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FileDoesNotExist);
    }

    #[test]
    fn name_table_without_lang_tags_still_splits() {
        // version 1, but the table ends at its string storage
        let name = be_buffer! {
            1u16, 1u16, 18u16,
            3u16, 1u16, 0x0411u16, 1u16, 2u16, 0u16,
            [0u8, b'A']
        };
        let font = TestFont::new()
            .filler_table(Tag::new(b"head"), 54)
            .table(Tag::new(b"name"), name.into_vec());
        let dir = tempfile::tempdir().unwrap();
        let splitter = TtcSplitter::new("unused.ttc", dir.path(), options());
        let summary = splitter
            .split_reader(Cursor::new(ttc::collection(&[font])), SplitMode::Full)
            .unwrap();
        assert_eq!(summary.written, vec![dir.path().join("1-A.ttf")]);
    }

    #[test]
    fn inspect_lang_tags() {
        let font = TestFont::new().table(
            Tag::new(b"name"),
            ttc::name_table_with_lang_tags(
                &[NameEntry::windows(0x8000, 1, "Tagged")],
                Some(&["ja-JP", "en"]),
            ),
        );
        let data = ttc::collection(&[font]);
        let query = NameQuery::family_name(ttc::WINDOWS_PLATFORM_ID, 0x8000);
        let (_, fonts) = inspect(Cursor::new(data), &query).unwrap();
        assert_eq!(fonts[0].family_name.as_deref(), Some("Tagged"));
        assert_eq!(fonts[0].lang_tags, vec!["ja-JP", "en"]);
    }

    #[test]
    fn inspect_collection() {
        let data = ttc::collection(&[ttc::example_font(), ttc::nameless_font()]);
        let (header, fonts) = inspect(Cursor::new(data), &options().name_query()).unwrap();
        assert_eq!(header.num_fonts(), 2);
        assert_eq!(fonts.len(), 2);
        assert_eq!(fonts[0].index, 1);
        assert_eq!(
            fonts[0].family_name.as_deref(),
            Some(ttc::EXAMPLE_FAMILY_NAME)
        );
        assert_eq!(fonts[1].index, 2);
        assert_eq!(fonts[1].family_name, None);
        assert!(fonts[0].lang_tags.is_empty());
        assert_eq!(
            fonts[1].directory.table_records.len(),
            ttc::nameless_font().tables.len()
        );
    }

    #[test]
    fn modes_map_to_filters() {
        assert_eq!(SplitMode::Filtered.table_filter(), TableFilter::KnownTables);
        assert_eq!(SplitMode::Full.table_filter(), TableFilter::AllTables);
    }
}
