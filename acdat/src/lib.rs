#![cfg_attr(docsrs, feature(doc_cfg))]

//! # acdat
//!
//! Multi-pattern longest-match search with an Aho-Corasick automaton compacted into a
//! double-array trie.
//!
//! Patterns are first collected into an [`AcTrie`], whose failure links are computed by
//! a breadth-first traversal. [`DoubleArrayAhoCorasick`] flattens that trie into
//! `base`/`check` arrays for fast lookups. Both search a haystack from left to right and
//! report non-overlapping matches, preferring the longest pattern at each position.
//!
//! Texts are split into labels by an [`Alphabet`]: [`Bytewise`] uses raw bytes and
//! [`Charwise`] uses Unicode code points. All reported offsets are byte offsets.
//!
//! ## Examples
//!
//! ```
//! use acdat::CharwiseDoubleArrayAhoCorasick;
//!
//! let patterns = vec!["東京", "東京都", "京都"];
//! let pma = CharwiseDoubleArrayAhoCorasick::from_patterns(patterns).unwrap();
//!
//! let matches: Vec<_> = pma
//!     .find_iter("東京都と京都")
//!     .map(|m| (m.start(), m.end(), m.pattern()))
//!     .collect();
//! assert_eq!(vec![(0, 9, 1), (12, 18, 2)], matches);
//! ```
//!
//! Dictionary-driven replacement is provided by [`Replacer`].

mod ac_trie;
mod alphabet;
mod da_ahocorasick;
mod errors;
mod matcher;
mod replace;
mod state;
mod utils;

pub use ac_trie::{AcTrie, CharwiseAcTrie};
pub use alphabet::{Alphabet, Bytewise, Charwise};
pub use da_ahocorasick::{CharwiseDoubleArrayAhoCorasick, DoubleArrayAhoCorasick};
pub use errors::{AcdatError, InvalidArgumentError, Result};
pub use matcher::{Automaton, FindIterator, FindWithIterator, Match, MatchInfo};
pub use replace::Replacer;
pub use state::{MAX_DAT_PATTERN_ID, MAX_PATTERN_ID};
