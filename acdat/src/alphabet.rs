//! Front ends that split texts into transition labels.

/// Rule for splitting a text into the labels consumed by the automata.
///
/// Every offset handled by the matchers is a byte offset into the text, regardless of
/// how many bytes a single label occupies.
pub trait Alphabet {
    /// Text type accepted as patterns and haystacks.
    type Text: ?Sized + AsRef<[u8]>;

    /// Labels below this value are addressed densely by the double array.
    /// Larger labels go to the overflow side table.
    const DENSE_LIMIT: u32;

    /// Decodes the label starting at `pos`.
    ///
    /// `bytes` must come from a valid [`Self::Text`] and `pos` must be a label boundary.
    ///
    /// # Returns
    ///
    /// The label and its width in bytes.
    fn decode(bytes: &[u8], pos: usize) -> (u32, usize);
}

/// Byte-oriented front end. Every byte is a label.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Bytewise;

impl Alphabet for Bytewise {
    type Text = [u8];

    const DENSE_LIMIT: u32 = 0x100;

    #[inline(always)]
    fn decode(bytes: &[u8], pos: usize) -> (u32, usize) {
        (u32::from(bytes[pos]), 1)
    }
}

/// UTF-8 front end. Every Unicode code point is a label.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Charwise;

impl Alphabet for Charwise {
    type Text = str;

    const DENSE_LIMIT: u32 = 0x10000;

    #[inline(always)]
    fn decode(bytes: &[u8], pos: usize) -> (u32, usize) {
        let b0 = u32::from(bytes[pos]);
        if b0 < 0x80 {
            return (b0, 1);
        }
        let cont = |i: usize| u32::from(bytes[pos + i]) & 0x3F;
        if b0 < 0xE0 {
            (((b0 & 0x1F) << 6) | cont(1), 2)
        } else if b0 < 0xF0 {
            (((b0 & 0x0F) << 12) | (cont(1) << 6) | cont(2), 3)
        } else {
            (
                ((b0 & 0x07) << 18) | (cont(1) << 12) | (cont(2) << 6) | cont(3),
                4,
            )
        }
    }
}

/// Iterates over the labels of a whole text.
#[cfg(test)]
fn labels<A>(bytes: &[u8]) -> impl Iterator<Item = u32> + '_
where
    A: Alphabet,
{
    let mut pos = 0;
    core::iter::from_fn(move || {
        if pos < bytes.len() {
            let (label, width) = A::decode(bytes, pos);
            pos += width;
            Some(label)
        } else {
            None
        }
    })
}
