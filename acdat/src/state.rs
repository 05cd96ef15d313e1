//! Bit-packed words stored in automaton states.

/// Permanently invalid dummy state.
pub const INVALID_STATE_ID: u32 = 0;

/// The root state.
pub const ROOT_STATE_ID: u32 = 1;

/// Largest pattern ID accepted by [`AcTrie`](crate::AcTrie).
pub const MAX_PATTERN_ID: u32 = 0x7FFF_FFFF;

/// Largest pattern ID accepted by [`DoubleArrayAhoCorasick`](crate::DoubleArrayAhoCorasick).
pub const MAX_DAT_PATTERN_ID: u32 = 0x3FFF_FFFF;

/// Pattern word of a trie state: 31-bit pattern ID and a final flag in the top bit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Identifier(u32);

impl Identifier {
    const PATTERN_ID_MASK: u32 = MAX_PATTERN_ID;
    const IS_FINAL_MASK: u32 = 0x8000_0000;

    /// A final word. `pattern_id` is masked to 31 bits.
    #[inline(always)]
    pub const fn finalized(pattern_id: u32) -> Self {
        Self((pattern_id & Self::PATTERN_ID_MASK) | Self::IS_FINAL_MASK)
    }

    #[inline(always)]
    pub const fn is_final(self) -> bool {
        self.0 & Self::IS_FINAL_MASK != 0
    }

    #[inline(always)]
    pub const fn pattern_id(self) -> u32 {
        self.0 & Self::PATTERN_ID_MASK
    }

    /// Returns the pattern ID if the word is final.
    #[inline(always)]
    pub const fn output(self) -> Option<u32> {
        if self.is_final() {
            Some(self.pattern_id())
        } else {
            None
        }
    }
}

/// Pattern word of a double-array state: 30-bit pattern ID, a has-child flag in bit 30
/// and a final flag in bit 31.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DatIdentifier(u32);

impl DatIdentifier {
    const PATTERN_ID_MASK: u32 = MAX_DAT_PATTERN_ID;
    const HAS_CHILD_MASK: u32 = 0x4000_0000;
    const IS_FINAL_MASK: u32 = 0x8000_0000;

    /// Repacks a trie word. Returns `None` if the pattern ID does not fit in 30 bits.
    #[inline(always)]
    pub const fn new(ident: Identifier, has_child: bool) -> Option<Self> {
        let mut word = 0;
        if ident.is_final() {
            if ident.pattern_id() > MAX_DAT_PATTERN_ID {
                return None;
            }
            word = ident.pattern_id() | Self::IS_FINAL_MASK;
        }
        if has_child {
            word |= Self::HAS_CHILD_MASK;
        }
        Some(Self(word))
    }

    #[inline(always)]
    pub const fn is_final(self) -> bool {
        self.0 & Self::IS_FINAL_MASK != 0
    }

    #[inline(always)]
    pub const fn has_child(self) -> bool {
        self.0 & Self::HAS_CHILD_MASK != 0
    }

    #[inline(always)]
    pub const fn pattern_id(self) -> u32 {
        self.0 & Self::PATTERN_ID_MASK
    }

    #[inline(always)]
    pub const fn output(self) -> Option<u32> {
        if self.is_final() {
            Some(self.pattern_id())
        } else {
            None
        }
    }
}

/// Auxiliary word of a double-array state: 31-bit byte depth and a flag in the top bit
/// telling that the slot was claimed through the overflow side table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DatExtra(u32);

impl DatExtra {
    const DEPTH_MASK: u32 = 0x7FFF_FFFF;
    const IS_OVERFLOW_MASK: u32 = 0x8000_0000;

    /// Returns `None` if `depth` does not fit in 31 bits.
    #[inline(always)]
    pub const fn new(depth: u32, is_overflow: bool) -> Option<Self> {
        if depth > Self::DEPTH_MASK {
            return None;
        }
        if is_overflow {
            Some(Self(depth | Self::IS_OVERFLOW_MASK))
        } else {
            Some(Self(depth))
        }
    }

    #[inline(always)]
    pub const fn depth(self) -> u32 {
        self.0 & Self::DEPTH_MASK
    }

    #[inline(always)]
    pub const fn is_overflow(self) -> bool {
        self.0 & Self::IS_OVERFLOW_MASK != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_default_is_not_final() {
        let ident = Identifier::default();
        assert!(!ident.is_final());
        assert_eq!(None, ident.output());
    }

    #[test]
    fn test_identifier_finalized() {
        let ident = Identifier::finalized(MAX_PATTERN_ID);
        assert!(ident.is_final());
        assert_eq!(Some(MAX_PATTERN_ID), ident.output());

        let ident = Identifier::finalized(0);
        assert!(ident.is_final());
        assert_eq!(Some(0), ident.output());
    }

    #[test]
    fn test_dat_identifier_flags() {
        let ident = DatIdentifier::new(Identifier::finalized(7), true).unwrap();
        assert!(ident.is_final());
        assert!(ident.has_child());
        assert_eq!(Some(7), ident.output());

        let ident = DatIdentifier::new(Identifier::default(), false).unwrap();
        assert!(!ident.is_final());
        assert!(!ident.has_child());
        assert_eq!(None, ident.output());
    }

    #[test]
    fn test_dat_identifier_pattern_id_range() {
        let ident = DatIdentifier::new(Identifier::finalized(MAX_DAT_PATTERN_ID), true).unwrap();
        assert_eq!(MAX_DAT_PATTERN_ID, ident.pattern_id());
        assert!(ident.has_child());
        assert_eq!(
            None,
            DatIdentifier::new(Identifier::finalized(MAX_DAT_PATTERN_ID + 1), false)
        );
    }

    #[test]
    fn test_dat_extra() {
        let extra = DatExtra::new(12, true).unwrap();
        assert_eq!(12, extra.depth());
        assert!(extra.is_overflow());
        let extra = DatExtra::new(0x7FFF_FFFF, false).unwrap();
        assert_eq!(0x7FFF_FFFF, extra.depth());
        assert!(!extra.is_overflow());
        assert_eq!(None, DatExtra::new(0x8000_0000, false));
    }
}
