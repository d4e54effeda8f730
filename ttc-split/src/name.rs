//! Resolving a font's family name from the [name (Naming)] table
//!
//! [name (Naming)]: https://docs.microsoft.com/en-us/typography/opentype/spec/name

use std::io::{self, Read, Seek};

use font_types::{NameId, Tag};

use crate::{collection::TableDirectory, stream::BeReader};

pub const NAME_TAG: Tag = Tag::new(b"name");

/// Which name record to look for.
///
/// There is deliberately no default: which platform and language make a good
/// file name is up to the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NameQuery {
    pub platform_id: u16,
    pub language_id: u16,
    pub name_id: NameId,
}

impl NameQuery {
    /// Query for the family name (name id 1) on a platform and language.
    pub fn family_name(platform_id: u16, language_id: u16) -> Self {
        NameQuery {
            platform_id,
            language_id,
            name_id: NameId::FAMILY_NAME,
        }
    }

    fn matches(&self, record: &NameRecord) -> bool {
        record.name_id == self.name_id
            && record.platform_id == self.platform_id
            && record.language_id == self.language_id
    }
}

/// A record in the naming table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NameRecord {
    pub platform_id: u16,
    pub encoding_id: u16,
    pub language_id: u16,
    pub name_id: NameId,
    /// String length, in bytes.
    pub length: u16,
    /// Offset of the string from the start of storage.
    pub string_offset: u16,
}

impl NameRecord {
    fn read<R: Read + Seek>(reader: &mut BeReader<R>) -> io::Result<Self> {
        Ok(NameRecord {
            platform_id: reader.read()?,
            encoding_id: reader.read()?,
            language_id: reader.read()?,
            name_id: NameId::new(reader.read()?),
            length: reader.read()?,
            string_offset: reader.read()?,
        })
    }
}

/// A language-tag record, present in version 1 naming tables.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LangTagRecord {
    pub length: u16,
    pub lang_tag_offset: u16,
}

/// The decoded header and name records of a naming table.
///
/// String data is not loaded; see [`NamingTable::read_string`]. Language tag
/// records of version 1 tables are only read on request, so a damaged tail
/// never gets in the way of name lookup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NamingTable {
    /// Absolute offset of the table in the source file.
    pub offset: u32,
    pub version: u16,
    /// Offset of string storage, from the start of the table.
    pub storage_offset: u16,
    pub name_records: Vec<NameRecord>,
}

impl NamingTable {
    const HEADER_LEN: u64 = 6;
    const NAME_RECORD_LEN: u64 = 12;

    /// Read the naming table header and name records at an absolute offset.
    pub fn read_at<R: Read + Seek>(reader: &mut BeReader<R>, offset: u32) -> io::Result<Self> {
        reader.seek_to(offset as u64)?;
        let version: u16 = reader.read()?;
        let count: u16 = reader.read()?;
        let storage_offset: u16 = reader.read()?;
        let name_records = (0..count)
            .map(|_| NameRecord::read(reader))
            .collect::<Result<_, _>>()?;
        Ok(NamingTable {
            offset,
            version,
            storage_offset,
            name_records,
        })
    }

    /// Read the language tag records that follow the name records.
    ///
    /// Version 0 tables have none.
    pub fn read_lang_tag_records<R: Read + Seek>(
        &self,
        reader: &mut BeReader<R>,
    ) -> io::Result<Vec<LangTagRecord>> {
        if self.version < 1 {
            return Ok(Vec::new());
        }
        let records_len = self.name_records.len() as u64 * Self::NAME_RECORD_LEN;
        reader.seek_to(self.offset as u64 + Self::HEADER_LEN + records_len)?;
        let lang_tag_count: u16 = reader.read()?;
        (0..lang_tag_count)
            .map(|_| -> io::Result<_> {
                Ok(LangTagRecord {
                    length: reader.read()?,
                    lang_tag_offset: reader.read()?,
                })
            })
            .collect()
    }

    /// Returns the last record matching the query.
    ///
    /// When a font carries duplicate records, later ones win.
    pub fn find_last(&self, query: &NameQuery) -> Option<&NameRecord> {
        self.name_records
            .iter()
            .rev()
            .find(|record| query.matches(record))
    }

    fn storage_position(&self, offset: u16) -> u64 {
        self.offset as u64 + self.storage_offset as u64 + offset as u64
    }

    /// Load and decode the string for a record as UTF-16BE.
    pub fn read_string<R: Read + Seek>(
        &self,
        reader: &mut BeReader<R>,
        record: &NameRecord,
    ) -> io::Result<String> {
        reader.seek_to(self.storage_position(record.string_offset))?;
        let bytes = reader.read_bytes(record.length as usize)?;
        Ok(decode_utf16be(&bytes))
    }

    /// Load and decode a language tag.
    pub fn read_lang_tag<R: Read + Seek>(
        &self,
        reader: &mut BeReader<R>,
        record: &LangTagRecord,
    ) -> io::Result<String> {
        reader.seek_to(self.storage_position(record.lang_tag_offset))?;
        let bytes = reader.read_bytes(record.length as usize)?;
        Ok(decode_utf16be(&bytes))
    }
}

/// Find the string a font should be named after.
///
/// Returns `Ok(None)` if the font has no `name` table, or if no record
/// matches the query; neither is an error, the font is simply not named.
pub fn resolve_family_name<R: Read + Seek>(
    reader: &mut BeReader<R>,
    directory: &TableDirectory,
    query: &NameQuery,
) -> io::Result<Option<String>> {
    let Some(record) = directory.find(NAME_TAG) else {
        return Ok(None);
    };
    let table = NamingTable::read_at(reader, record.offset)?;
    match table.find_last(query) {
        Some(name_record) => table.read_string(reader, name_record).map(Some),
        None => Ok(None),
    }
}

/// Decode every language tag of a font's naming table.
///
/// Empty if the font has no `name` table or the table is version 0.
pub fn resolve_lang_tags<R: Read + Seek>(
    reader: &mut BeReader<R>,
    directory: &TableDirectory,
) -> io::Result<Vec<String>> {
    let Some(record) = directory.find(NAME_TAG) else {
        return Ok(Vec::new());
    };
    let table = NamingTable::read_at(reader, record.offset)?;
    let records = table.read_lang_tag_records(reader)?;
    records
        .iter()
        .map(|lang_tag| table.read_lang_tag(reader, lang_tag))
        .collect()
}

/// Decode big-endian UTF-16.
///
/// Unpaired surrogates and a trailing odd byte decode to U+FFFD.
pub fn decode_utf16be(bytes: &[u8]) -> String {
    let units = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]));
    let mut decoded: String = char::decode_utf16(units)
        .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect();
    if bytes.len() % 2 == 1 {
        decoded.push(char::REPLACEMENT_CHARACTER);
    }
    decoded
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use font_test_data::{
        be_buffer,
        ttc::{self, NameEntry, TestFont},
    };
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::collection::TtcHeader;

    const JA: u16 = ttc::JAPANESE_LANGUAGE_ID;
    const EN: u16 = ttc::ENGLISH_US_LANGUAGE_ID;

    fn resolve(font: TestFont, query: NameQuery) -> Option<String> {
        let data = ttc::collection(&[font]);
        let mut reader = BeReader::new(Cursor::new(data));
        let header = TtcHeader::read(&mut reader).unwrap();
        let directory =
            TableDirectory::read_at(&mut reader, header.table_directory_offsets[0]).unwrap();
        resolve_family_name(&mut reader, &directory, &query).unwrap()
    }

    fn font_with_names(entries: &[NameEntry]) -> TestFont {
        TestFont::new()
            .filler_table(Tag::new(b"head"), 54)
            .table(NAME_TAG, ttc::name_table(entries))
    }

    #[test]
    fn resolves_configured_language() {
        let query = NameQuery::family_name(ttc::WINDOWS_PLATFORM_ID, JA);
        assert_eq!(
            resolve(ttc::example_font(), query).as_deref(),
            Some(ttc::EXAMPLE_FAMILY_NAME)
        );
        let query = NameQuery::family_name(ttc::WINDOWS_PLATFORM_ID, EN);
        assert_eq!(
            resolve(ttc::example_font(), query).as_deref(),
            Some("English Family")
        );
    }

    #[test]
    fn last_match_wins() {
        let font = font_with_names(&[
            NameEntry::windows(JA, 1, "First"),
            NameEntry::windows(JA, 2, "Bold"),
            NameEntry::windows(JA, 1, "Second"),
            NameEntry::windows(EN, 1, "Third"),
        ]);
        let query = NameQuery::family_name(ttc::WINDOWS_PLATFORM_ID, JA);
        assert_eq!(resolve(font, query).as_deref(), Some("Second"));
    }

    #[test]
    fn platform_must_match() {
        let font = font_with_names(&[NameEntry {
            platform_id: ttc::MAC_PLATFORM_ID,
            encoding_id: 0,
            language_id: JA,
            name_id: 1,
            value: "Mac".into(),
        }]);
        let query = NameQuery::family_name(ttc::WINDOWS_PLATFORM_ID, JA);
        assert_eq!(resolve(font, query), None);
    }

    #[test]
    fn no_name_table() {
        let query = NameQuery::family_name(ttc::WINDOWS_PLATFORM_ID, JA);
        assert_eq!(resolve(ttc::nameless_font(), query), None);
    }

    #[test]
    fn no_matching_record() {
        let font = font_with_names(&[NameEntry::windows(EN, 1, "English only")]);
        let query = NameQuery::family_name(ttc::WINDOWS_PLATFORM_ID, JA);
        assert_eq!(resolve(font, query), None);
    }

    #[test]
    fn non_ascii_family_name() {
        let font = font_with_names(&[NameEntry::windows(JA, 1, "ＭＳ ゴシック")]);
        let query = NameQuery::family_name(ttc::WINDOWS_PLATFORM_ID, JA);
        assert_eq!(resolve(font, query).as_deref(), Some("ＭＳ ゴシック"));
    }

    #[test]
    fn version_one_lang_tags() {
        let data = ttc::name_table_with_lang_tags(
            &[NameEntry::windows(0x8000, 1, "Tagged")],
            Some(&["ja-JP", "en"]),
        );
        let mut reader = BeReader::new(Cursor::new(data));
        let table = NamingTable::read_at(&mut reader, 0).unwrap();
        assert_eq!(table.version, 1);
        let records = table.read_lang_tag_records(&mut reader).unwrap();
        assert_eq!(records.len(), 2);
        let tags: Vec<_> = records
            .iter()
            .map(|rec| table.read_lang_tag(&mut reader, rec).unwrap())
            .collect();
        assert_eq!(tags, vec!["ja-JP", "en"]);

        let query = NameQuery::family_name(ttc::WINDOWS_PLATFORM_ID, 0x8000);
        let record = table.find_last(&query).unwrap();
        assert_eq!(table.read_string(&mut reader, record).unwrap(), "Tagged");
    }

    #[test]
    fn resolve_lang_tags_for_font() {
        let font = TestFont::new().table(
            NAME_TAG,
            ttc::name_table_with_lang_tags(
                &[NameEntry::windows(JA, 1, "Tagged")],
                Some(&["ja-JP"]),
            ),
        );
        let data = ttc::collection(&[font, ttc::example_font(), ttc::nameless_font()]);
        let mut reader = BeReader::new(Cursor::new(data));
        let header = TtcHeader::read(&mut reader).unwrap();
        let tags: Vec<_> = header
            .fonts()
            .map(|(_, offset)| {
                let directory = TableDirectory::read_at(&mut reader, offset).unwrap();
                resolve_lang_tags(&mut reader, &directory).unwrap()
            })
            .collect();
        assert_eq!(
            tags,
            vec![vec!["ja-JP".to_string()], Vec::new(), Vec::new()]
        );
    }

    #[test]
    fn version_one_without_lang_tag_count() {
        // version 1, but string storage starts right after the name records
        // and the table is last in the file, so no language tag records fit
        let name = be_buffer! {
            1u16, 1u16, 18u16,
            3u16, 1u16, 0x0411u16, 1u16, 2u16, 0u16,
            [0u8, b'A']
        };
        let font = TestFont::new()
            .filler_table(Tag::new(b"head"), 54)
            .table(NAME_TAG, name.into_vec());
        let data = ttc::collection(&[font]);
        let mut reader = BeReader::new(Cursor::new(data));
        let header = TtcHeader::read(&mut reader).unwrap();
        let directory =
            TableDirectory::read_at(&mut reader, header.table_directory_offsets[0]).unwrap();
        let query = NameQuery::family_name(ttc::WINDOWS_PLATFORM_ID, JA);
        assert_eq!(
            resolve_family_name(&mut reader, &directory, &query)
                .unwrap()
                .as_deref(),
            Some("A")
        );
        assert!(resolve_lang_tags(&mut reader, &directory).is_err());
    }

    #[test]
    fn string_offsets_are_relative_to_storage() {
        // the table lives at offset 4 in the stream; storage starts 18 bytes in
        let data = be_buffer! {
            [0xFFu8, 0xFF, 0xFF, 0xFF],
            0u16, 1u16, 18u16,
            3u16, 1u16, 0x0411u16, 1u16, 4u16, 2u16,
            [0u8, 0, 0, b'O', 0, b'K']
        };
        let mut reader = BeReader::new(Cursor::new(data.into_vec()));
        let table = NamingTable::read_at(&mut reader, 4).unwrap();
        let record = table.name_records[0];
        assert_eq!(table.read_string(&mut reader, &record).unwrap(), "OK");
    }

    #[test]
    fn truncated_string_is_an_error() {
        let data = be_buffer! {
            0u16, 1u16, 18u16,
            3u16, 1u16, 0x0411u16, 1u16, 40u16, 0u16,
            [0u8, b'O']
        };
        let mut reader = BeReader::new(Cursor::new(data.into_vec()));
        let table = NamingTable::read_at(&mut reader, 0).unwrap();
        let record = table.name_records[0];
        assert!(table.read_string(&mut reader, &record).is_err());
    }

    #[test]
    fn decode_surrogates() {
        // U+1F600, then 'a'
        assert_eq!(decode_utf16be(&[0xD8, 0x3D, 0xDE, 0x00, 0x00, 0x61]), "😀a");
        // unpaired high surrogate
        assert_eq!(decode_utf16be(&[0xD8, 0x3D, 0x00, 0x61]), "\u{FFFD}a");
        // odd trailing byte
        assert_eq!(decode_utf16be(&[0x00, 0x61, 0x00]), "a\u{FFFD}");
        assert_eq!(decode_utf16be(&[]), "");
    }
}
