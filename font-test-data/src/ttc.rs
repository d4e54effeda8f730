//! Synthetic font collections.
//!
//! Real collections are large and carry licensing baggage, so tests build
//! small ones from scratch. Table payloads are filler bytes except for the
//! `name` table, which is a real naming table.

use font_types::Tag;

use crate::be_buffer;

/// The sfnt version for fonts containing TrueType outlines.
pub const TT_SFNT_VERSION: u32 = 0x00010000;

pub const MAC_PLATFORM_ID: u16 = 1;
pub const WINDOWS_PLATFORM_ID: u16 = 3;

pub const WINDOWS_UNICODE_BMP_ENCODING_ID: u16 = 1;

pub const ENGLISH_US_LANGUAGE_ID: u16 = 0x0409;
pub const JAPANESE_LANGUAGE_ID: u16 = 0x0411;

pub const FAMILY_NAME_ID: u16 = 1;
pub const SUBFAMILY_NAME_ID: u16 = 2;

/// The family name carried by [`example_font`].
pub const EXAMPLE_FAMILY_NAME: &str = "Example Font";

const TTC_HEADER_LEN: usize = 12;
const SFNT_HEADER_LEN: usize = 12;
const TABLE_RECORD_LEN: usize = 16;

/// One entry in a naming table.
#[derive(Clone, Debug)]
pub struct NameEntry {
    pub platform_id: u16,
    pub encoding_id: u16,
    pub language_id: u16,
    pub name_id: u16,
    pub value: String,
}

impl NameEntry {
    /// A Windows, Unicode BMP entry.
    pub fn windows(language_id: u16, name_id: u16, value: &str) -> Self {
        NameEntry {
            platform_id: WINDOWS_PLATFORM_ID,
            encoding_id: WINDOWS_UNICODE_BMP_ENCODING_ID,
            language_id,
            name_id,
            value: value.to_owned(),
        }
    }
}

/// Compile a version 0 naming table. Strings are encoded as UTF-16BE.
pub fn name_table(entries: &[NameEntry]) -> Vec<u8> {
    name_table_with_lang_tags(entries, None)
}

/// Compile a naming table; passing `Some` lang tags produces version 1.
pub fn name_table_with_lang_tags(entries: &[NameEntry], lang_tags: Option<&[&str]>) -> Vec<u8> {
    let header_len = 6
        + entries.len() * 12
        + lang_tags.map(|tags| 2 + tags.len() * 4).unwrap_or_default();

    let mut storage = Vec::new();
    let mut buf = be_buffer! {
        (lang_tags.is_some() as u16),
        (entries.len() as u16),
        (header_len as u16)
    };
    for entry in entries {
        let offset = storage.len();
        storage.extend(entry.value.encode_utf16().flat_map(u16::to_be_bytes));
        buf = buf
            .push(entry.platform_id)
            .push(entry.encoding_id)
            .push(entry.language_id)
            .push(entry.name_id)
            .push((storage.len() - offset) as u16)
            .push(offset as u16);
    }
    if let Some(tags) = lang_tags {
        buf = buf.push(tags.len() as u16);
        for tag in tags {
            let offset = storage.len();
            storage.extend(tag.encode_utf16().flat_map(u16::to_be_bytes));
            buf = buf
                .push((storage.len() - offset) as u16)
                .push(offset as u16);
        }
    }
    buf.extend_bytes(&storage).into_vec()
}

/// Deterministic filler data for a table that is not interpreted.
pub fn filler(tag: Tag, len: usize) -> Vec<u8> {
    let seed = tag.to_be_bytes();
    (0..len)
        .map(|i| seed[i % 4].wrapping_add(i as u8))
        .collect()
}

/// Compute the OpenType checksum of some table data.
pub fn checksum(data: &[u8]) -> u32 {
    data.chunks(4)
        .map(|chunk| {
            let mut word = [0u8; 4];
            word[..chunk.len()].copy_from_slice(chunk);
            u32::from_be_bytes(word)
        })
        .fold(0u32, u32::wrapping_add)
}

/// A font to be placed in a synthetic collection.
#[derive(Clone, Debug)]
pub struct TestFont {
    pub sfnt_version: u32,
    pub tables: Vec<(Tag, Vec<u8>)>,
}

impl Default for TestFont {
    fn default() -> Self {
        TestFont {
            sfnt_version: TT_SFNT_VERSION,
            tables: Vec::new(),
        }
    }
}

impl TestFont {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table; tables keep the order they are added in.
    pub fn table(mut self, tag: Tag, data: impl Into<Vec<u8>>) -> Self {
        self.tables.push((tag, data.into()));
        self
    }

    /// Add a table of filler bytes.
    pub fn filler_table(self, tag: Tag, len: usize) -> Self {
        self.table(tag, filler(tag, len))
    }

    fn directory_len(&self) -> usize {
        SFNT_HEADER_LEN + self.tables.len() * TABLE_RECORD_LEN
    }

    /// The 12 byte sfnt header this font is written with.
    pub fn sfnt_header(&self) -> Vec<u8> {
        let num_tables = self.tables.len() as u16;
        let (search_range, entry_selector, range_shift) = search_range(num_tables);
        let header = be_buffer! {
            (self.sfnt_version),
            num_tables,
            search_range,
            entry_selector,
            range_shift
        };
        header.into_vec()
    }
}

/// The binary search assists for a table directory with `num_tables` entries.
///
/// See <https://learn.microsoft.com/en-us/typography/opentype/spec/otff#table-directory>
pub fn search_range(num_tables: u16) -> (u16, u16, u16) {
    if num_tables == 0 {
        return (0, 0, 0);
    }
    let entry_selector = (u16::BITS - 1 - num_tables.leading_zeros()) as u16;
    let search_range = (1u16 << entry_selector) * TABLE_RECORD_LEN as u16;
    let range_shift = num_tables * TABLE_RECORD_LEN as u16 - search_range;
    (search_range, entry_selector, range_shift)
}

fn round4(sz: usize) -> usize {
    (sz + 3) & !3
}

/// Assemble a version 1.0 collection.
///
/// The layout is the TTC header, then each font's table directory, then the
/// data of every table in font order, each table starting on a 4-byte
/// boundary.
pub fn collection(fonts: &[TestFont]) -> Vec<u8> {
    let header_len = TTC_HEADER_LEN + fonts.len() * 4;
    let mut directory_offsets = Vec::with_capacity(fonts.len());
    let mut position = header_len;
    for font in fonts {
        directory_offsets.push(position as u32);
        position += font.directory_len();
    }

    let mut buf = be_buffer! {
        (Tag::new(b"ttcf")),
        1u16,
        0u16,
        (fonts.len() as u32)
    }
    .extend(directory_offsets);

    let mut table_data = Vec::new();
    for font in fonts {
        buf = buf.extend_bytes(&font.sfnt_header());
        for (tag, data) in &font.tables {
            let offset = position + table_data.len();
            buf = buf
                .push(*tag)
                .push(checksum(data))
                .push(offset as u32)
                .push(data.len() as u32);
            table_data.extend_from_slice(data);
            table_data.resize(round4(table_data.len()), 0);
        }
    }
    buf.extend_bytes(&table_data).into_vec()
}

/// A small TrueType font whose family name is [`EXAMPLE_FAMILY_NAME`] for
/// Windows/Japanese, with an English family name as well.
///
/// Besides the usual tables it carries an `FFTM` table, which is not a
/// registered OpenType table, and tables whose lengths are not multiples of
/// four.
pub fn example_font() -> TestFont {
    named_font(EXAMPLE_FAMILY_NAME)
}

/// Like [`example_font`], with a different Windows/Japanese family name.
pub fn named_font(family_name: &str) -> TestFont {
    let name = name_table(&[
        NameEntry::windows(ENGLISH_US_LANGUAGE_ID, FAMILY_NAME_ID, "English Family"),
        NameEntry::windows(JAPANESE_LANGUAGE_ID, FAMILY_NAME_ID, family_name),
        NameEntry::windows(JAPANESE_LANGUAGE_ID, SUBFAMILY_NAME_ID, "Regular"),
    ]);
    TestFont::new()
        .filler_table(Tag::new(b"FFTM"), 28)
        .filler_table(Tag::new(b"OS/2"), 96)
        .filler_table(Tag::new(b"cmap"), 30)
        .filler_table(Tag::new(b"cvt "), 7)
        .filler_table(Tag::new(b"glyf"), 45)
        .filler_table(Tag::new(b"head"), 54)
        .filler_table(Tag::new(b"hhea"), 36)
        .filler_table(Tag::new(b"hmtx"), 12)
        .filler_table(Tag::new(b"loca"), 10)
        .filler_table(Tag::new(b"maxp"), 32)
        .table(Tag::new(b"name"), name)
        .filler_table(Tag::new(b"post"), 32)
}

/// A font with the usual tables but no `name` table.
pub fn nameless_font() -> TestFont {
    TestFont::new()
        .filler_table(Tag::new(b"OS/2"), 96)
        .filler_table(Tag::new(b"cmap"), 30)
        .filler_table(Tag::new(b"head"), 54)
        .filler_table(Tag::new(b"maxp"), 32)
}

/// A collection containing only [`example_font`].
pub fn example_collection() -> Vec<u8> {
    collection(&[example_font()])
}
