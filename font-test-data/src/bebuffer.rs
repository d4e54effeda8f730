//! A helper for hand-writing big-endian test data

use std::collections::HashMap;

use font_types::Scalar;

/// A growable buffer of big-endian data.
///
/// Locations in the buffer can be labeled with [`BeBuffer::push_with_tag`]
/// and patched later with [`BeBuffer::write_at`], which is handy for offsets
/// that are only known once the data they point at has been written.
#[derive(Debug, Default, Clone)]
pub struct BeBuffer {
    data: Vec<u8>,
    tagged_locations: HashMap<String, usize>,
}

impl BeBuffer {
    pub fn new() -> Self {
        Default::default()
    }

    /// The current length of the buffer in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the buffer contains zero bytes.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Return a reference to the contents of the buffer
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Consume the buffer, returning the underlying bytes.
    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    /// Write any scalar to this buffer.
    pub fn push(mut self, item: impl Scalar) -> Self {
        self.data.extend(item.to_raw().as_ref());
        self
    }

    pub fn push_with_tag(mut self, item: impl Scalar, tag: &str) -> Self {
        self.tagged_locations
            .insert(tag.to_string(), self.data.len());
        self.data.extend(item.to_raw().as_ref());
        self
    }

    /// Write multiple scalars into the buffer
    pub fn extend<T: Scalar>(mut self, iter: impl IntoIterator<Item = T>) -> Self {
        for item in iter {
            self.data.extend(item.to_raw().as_ref());
        }
        self
    }

    /// Append raw bytes, without any interpretation.
    pub fn extend_bytes(mut self, bytes: &[u8]) -> Self {
        self.data.extend_from_slice(bytes);
        self
    }

    pub fn offset_for(&self, tag: &str) -> usize {
        // panic on unrecognized tags
        self.tagged_locations.get(tag).copied().unwrap()
    }

    /// Overwrite the bytes at a location previously marked with `push_with_tag`.
    pub fn write_at(&mut self, tag: &str, item: impl Scalar) {
        let offset = self.offset_for(tag);
        let raw = item.to_raw();
        let new_data: &[u8] = raw.as_ref();
        let data = &mut self.data[offset..];

        if data.len() < new_data.len() {
            panic!("not enough room left in buffer for the requested write.");
        }

        for (left, right) in data.iter_mut().zip(new_data) {
            *left = *right
        }
    }
}

impl std::ops::Deref for BeBuffer {
    type Target = [u8];
    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

impl From<BeBuffer> for Vec<u8> {
    fn from(value: BeBuffer) -> Self {
        value.data
    }
}

/// Build a [`BeBuffer`] from a list of scalars.
///
/// Each item is one of:
///
/// - an expression implementing [`Scalar`], e.g. `1u16` or `(Tag::new(b"name"))`
/// - an array of scalars, e.g. `[1u16, 2, 3]`
/// - a tagged scalar, `{0u32: "offset"}`, whose location can later be
///   patched with [`BeBuffer::write_at`]
#[macro_export]
macro_rules! be_buffer {
    ( $( $items:tt )* ) => {{
        let buffer = $crate::bebuffer::BeBuffer::new();
        $crate::be_buffer_add!(buffer, $( $items )*)
    }};
}

#[doc(hidden)]
#[macro_export]
macro_rules! be_buffer_add {
    ($buffer:ident, ) => {
        $buffer
    };
    ($buffer:ident, [ $( $item:expr ),* $(,)? ] $(, $( $rest:tt )* )? ) => {{
        let $buffer = $buffer.extend([ $( $item ),* ]);
        $crate::be_buffer_add!($buffer, $( $( $rest )* )?)
    }};
    ($buffer:ident, { $item:tt : $tag:literal } $(, $( $rest:tt )* )? ) => {{
        let $buffer = $buffer.push_with_tag($item, $tag);
        $crate::be_buffer_add!($buffer, $( $( $rest )* )?)
    }};
    ($buffer:ident, $item:expr $(, $( $rest:tt )* )? ) => {{
        let $buffer = $buffer.push($item);
        $crate::be_buffer_add!($buffer, $( $( $rest )* )?)
    }};
}
