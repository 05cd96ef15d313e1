//! Aho-Corasick automaton over a sparse trie.

use std::collections::VecDeque;
use std::marker::PhantomData;

use crate::alphabet::{Alphabet, Bytewise, Charwise};
use crate::errors::{AcdatError, Result};
use crate::matcher::{self, Automaton, FindIterator, MatchInfo};
use crate::state::{Identifier, INVALID_STATE_ID, MAX_PATTERN_ID, ROOT_STATE_ID};

#[derive(Clone, Debug, Default)]
pub(crate) struct State {
    pub(crate) fail: u32,
    pub(crate) ident: Identifier,
    pub(crate) depth: u32,

    // Sorted by label.
    pub(crate) children: Vec<(u32, u32)>,
}

impl State {
    #[inline(always)]
    fn get(&self, label: u32) -> Option<u32> {
        self.children
            .binary_search_by_key(&label, |&(c, _)| c)
            .ok()
            .map(|i| self.children[i].1)
    }
}

/// Aho-Corasick automaton that keeps its transitions in per-state child lists.
///
/// Patterns are added with [`AcTrie::insert()`], then [`AcTrie::build()`] computes the
/// failure links. The automaton is searchable only after it is built.
///
/// # Examples
///
/// ```
/// use acdat::{AcTrie, Bytewise};
///
/// let mut pma = AcTrie::<Bytewise>::new();
/// pma.insert_all(&["he", "she", "his", "hers"]).unwrap();
/// pma.build();
///
/// let mut it = pma.find_iter("ahishers");
///
/// let m = it.next().unwrap();
/// assert_eq!((1, 4, 2), (m.start(), m.end(), m.pattern()));
///
/// let m = it.next().unwrap();
/// assert_eq!((4, 8, 3), (m.start(), m.end(), m.pattern()));
///
/// assert_eq!(None, it.next());
/// ```
#[derive(Clone, Debug)]
pub struct AcTrie<A = Bytewise>
where
    A: Alphabet,
{
    states: Vec<State>,
    has_overflow_labels: bool,
    built: bool,
    _alphabet: PhantomData<A>,
}

/// [`AcTrie`] whose labels are Unicode code points.
pub type CharwiseAcTrie = AcTrie<Charwise>;

impl<A> Default for AcTrie<A>
where
    A: Alphabet,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<A> AcTrie<A>
where
    A: Alphabet,
{
    /// Creates an empty automaton holding the dummy state and the root.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty automaton with room for `capacity` states.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut states = Vec::with_capacity(capacity.max(2));
        states.push(State::default());
        states.push(State::default());
        Self {
            states,
            has_overflow_labels: false,
            built: false,
            _alphabet: PhantomData,
        }
    }

    /// Removes all patterns.
    pub fn clear(&mut self) {
        self.states.truncate(2);
        self.states[INVALID_STATE_ID as usize] = State::default();
        self.states[ROOT_STATE_ID as usize] = State::default();
        self.has_overflow_labels = false;
        self.built = false;
    }

    /// Adds a pattern.
    ///
    /// # Arguments
    ///
    /// * `pattern` - A non-empty pattern.
    /// * `pattern_id` - Identifier reported when the pattern matches. It must not exceed
    ///   [`MAX_PATTERN_ID`](crate::MAX_PATTERN_ID).
    ///
    /// # Returns
    ///
    /// `false` if the pattern was already added. The old identifier is kept in that case.
    ///
    /// # Errors
    ///
    /// [`AcdatError`] is returned when the pattern is empty or `pattern_id` is out of range.
    pub fn insert<P>(&mut self, pattern: P, pattern_id: u32) -> Result<bool>
    where
        P: AsRef<A::Text>,
    {
        let pattern: &[u8] = pattern.as_ref().as_ref();
        if pattern.is_empty() {
            return Err(AcdatError::invalid_argument(
                "pattern",
                "must not be empty",
            ));
        }
        if pattern_id > MAX_PATTERN_ID {
            return Err(AcdatError::invalid_argument(
                "pattern_id",
                format!("must be at most {}, but got {}", MAX_PATTERN_ID, pattern_id),
            ));
        }
        u32::try_from(pattern.len())?;

        let mut state_id = ROOT_STATE_ID;
        let mut pos = 0;
        while pos < pattern.len() {
            let (label, width) = A::decode(pattern, pos);
            pos += width;
            if label >= A::DENSE_LIMIT {
                self.has_overflow_labels = true;
            }
            let state = &self.states[state_id as usize];
            state_id = match state.children.binary_search_by_key(&label, |&(c, _)| c) {
                Ok(i) => state.children[i].1,
                Err(i) => {
                    let child_id = u32::try_from(self.states.len())?;
                    self.states[state_id as usize]
                        .children
                        .insert(i, (label, child_id));
                    self.states.push(State {
                        depth: pos as u32,
                        ..State::default()
                    });
                    child_id
                }
            };
        }

        let leaf = &mut self.states[state_id as usize];
        if leaf.ident.is_final() {
            return Ok(false);
        }
        leaf.ident = Identifier::finalized(pattern_id);
        self.built = false;
        Ok(true)
    }

    /// Clears the automaton and adds `patterns`, assigning each its position in the list as
    /// its identifier. Duplicates keep the identifier of their first occurrence.
    ///
    /// # Errors
    ///
    /// [`AcdatError`] is returned when a pattern is empty or the list is too long.
    pub fn insert_all<I, P>(&mut self, patterns: I) -> Result<()>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<A::Text>,
    {
        self.clear();
        for (i, pattern) in patterns.into_iter().enumerate() {
            self.insert(pattern, u32::try_from(i)?)?;
        }
        Ok(())
    }

    /// Computes the failure links in breadth-first order.
    pub fn build(&mut self) {
        let mut queue = VecDeque::with_capacity(self.states.len());
        queue.push_back(ROOT_STATE_ID);
        while let Some(state_id) = queue.pop_front() {
            for i in 0..self.states[state_id as usize].children.len() {
                let (label, child_id) = self.states[state_id as usize].children[i];
                let fail_id = if state_id == ROOT_STATE_ID {
                    ROOT_STATE_ID
                } else {
                    self.find_fail(self.states[state_id as usize].fail, label)
                };
                self.states[child_id as usize].fail = fail_id;
                queue.push_back(child_id);
            }
        }
        self.built = true;
        tracing::debug!(
            num_states = self.num_states(),
            has_overflow_labels = self.has_overflow_labels,
            "built failure links"
        );
    }

    fn find_fail(&self, mut node_id: u32, label: u32) -> u32 {
        loop {
            if node_id == INVALID_STATE_ID {
                return ROOT_STATE_ID;
            }
            let node = &self.states[node_id as usize];
            if let Some(child_id) = node.get(label) {
                return child_id;
            }
            node_id = node.fail;
        }
    }

    /// Finds the first match in `haystack`, preferring the longest pattern ending there.
    ///
    /// # Panics
    ///
    /// The automaton must be built.
    pub fn match_one<P>(&self, haystack: P) -> Option<MatchInfo>
    where
        P: AsRef<A::Text>,
    {
        assert!(self.built, "the automaton must be built before matching");
        matcher::match_one(self, haystack.as_ref().as_ref())
    }

    /// Returns an iterator of non-overlapping longest matches.
    ///
    /// # Panics
    ///
    /// The automaton must be built.
    pub fn find_iter<P>(&self, haystack: P) -> FindIterator<'_, Self, P>
    where
        P: AsRef<A::Text>,
    {
        assert!(self.built, "the automaton must be built before matching");
        FindIterator {
            pma: self,
            haystack,
            pos: 0,
        }
    }

    /// Returns the number of states including the root.
    pub fn num_states(&self) -> usize {
        self.states.len() - 1
    }

    /// Returns `true` if a pattern contains a label at or above the dense limit.
    pub const fn has_overflow_labels(&self) -> bool {
        self.has_overflow_labels
    }

    /// Returns `true` if the failure links are up to date.
    pub const fn is_built(&self) -> bool {
        self.built
    }

    pub(crate) fn states(&self) -> &[State] {
        &self.states
    }
}

impl<A> Automaton for AcTrie<A>
where
    A: Alphabet,
{
    type Alphabet = A;

    #[inline(always)]
    fn child(&self, state_id: u32, label: u32) -> Option<u32> {
        self.states[state_id as usize].get(label)
    }

    #[inline(always)]
    fn fail(&self, state_id: u32) -> u32 {
        self.states[state_id as usize].fail
    }

    #[inline(always)]
    fn output(&self, state_id: u32) -> Option<u32> {
        self.states[state_id as usize].ident.output()
    }

    #[inline(always)]
    fn has_child(&self, state_id: u32) -> bool {
        !self.states[state_id as usize].children.is_empty()
    }

    #[inline(always)]
    fn depth(&self, state_id: u32) -> u32 {
        self.states[state_id as usize].depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find_all<A, P>(pma: &AcTrie<A>, haystack: P) -> Vec<(usize, usize, u32)>
    where
        A: Alphabet,
        P: AsRef<A::Text>,
    {
        pma.find_iter(haystack)
            .map(|m| (m.start(), m.end(), m.pattern()))
            .collect()
    }

    fn state_of(pma: &AcTrie, pattern: &str) -> u32 {
        let mut state_id = ROOT_STATE_ID;
        for &c in pattern.as_bytes() {
            state_id = pma.child(state_id, u32::from(c)).unwrap();
        }
        state_id
    }

    #[test]
    fn test_insert_duplicate() {
        let mut pma = AcTrie::<Bytewise>::new();
        assert!(pma.insert("abc", 0).unwrap());
        assert!(pma.insert("ab", 1).unwrap());
        assert!(!pma.insert("abc", 2).unwrap());
        pma.build();
        assert_eq!(vec![(0, 3, 0)], find_all(&pma, "abc"));
    }

    #[test]
    fn test_insert_shares_prefixes() {
        let mut pma = AcTrie::<Bytewise>::new();
        pma.insert("abcd", 0).unwrap();
        assert_eq!(5, pma.num_states());
        pma.insert("abef", 1).unwrap();
        assert_eq!(7, pma.num_states());
    }

    #[test]
    fn test_insert_empty() {
        let mut pma = AcTrie::<Bytewise>::new();
        let e = pma.insert("", 0).unwrap_err();
        assert_eq!("InvalidArgumentError: pattern: must not be empty", e.to_string());
    }

    #[test]
    fn test_insert_pattern_id_out_of_range() {
        let mut pma = AcTrie::<Bytewise>::new();
        assert!(pma.insert("a", MAX_PATTERN_ID).unwrap());
        assert!(pma.insert("b", MAX_PATTERN_ID + 1).is_err());
    }

    #[test]
    fn test_insert_all_resets() {
        let mut pma = AcTrie::<Bytewise>::new();
        pma.insert_all(["foo", "bar"]).unwrap();
        pma.insert_all(["baz"]).unwrap();
        pma.build();
        assert_eq!(Vec::<(usize, usize, u32)>::new(), find_all(&pma, "foobar"));
        assert_eq!(vec![(0, 3, 0)], find_all(&pma, "baz"));
    }

    #[test]
    fn test_fail_links() {
        let mut pma = AcTrie::<Bytewise>::new();
        pma.insert_all(["he", "she", "his", "hers"]).unwrap();
        pma.build();
        assert_eq!(INVALID_STATE_ID, pma.fail(ROOT_STATE_ID));
        assert_eq!(ROOT_STATE_ID, pma.fail(state_of(&pma, "h")));
        assert_eq!(ROOT_STATE_ID, pma.fail(state_of(&pma, "s")));
        assert_eq!(state_of(&pma, "h"), pma.fail(state_of(&pma, "sh")));
        assert_eq!(state_of(&pma, "he"), pma.fail(state_of(&pma, "she")));
        assert_eq!(state_of(&pma, "s"), pma.fail(state_of(&pma, "his")));
        assert_eq!(state_of(&pma, "s"), pma.fail(state_of(&pma, "hers")));
    }

    #[test]
    fn test_fail_chains_end_at_root() {
        let mut pma = AcTrie::<Bytewise>::new();
        pma.insert_all(["aaaa", "aab", "abab", "b", "ba"]).unwrap();
        pma.build();
        for state_id in ROOT_STATE_ID + 1..=pma.num_states() as u32 {
            let mut node_id = state_id;
            let mut steps = 0;
            while node_id != ROOT_STATE_ID {
                let fail_id = pma.fail(node_id);
                assert!(pma.depth(fail_id) < pma.depth(node_id));
                node_id = fail_id;
                steps += 1;
            }
            assert!(steps <= 4);
        }
    }

    #[test]
    fn test_round_trip() {
        let patterns = ["abcd", "abef", "ghjsdasf", "Hello", "Hello World", "test"];
        let mut pma = AcTrie::<Bytewise>::new();
        pma.insert_all(patterns).unwrap();
        pma.build();
        for (i, pattern) in patterns.iter().enumerate() {
            assert_eq!(
                vec![(0, pattern.len(), i as u32)],
                find_all(&pma, pattern)
            );
        }
    }

    #[test]
    fn test_longest_match() {
        let mut pma = AcTrie::<Bytewise>::new();
        pma.insert_all(["ab", "abc"]).unwrap();
        pma.build();
        assert_eq!(vec![(0, 3, 1)], find_all(&pma, "abc"));
        assert_eq!(vec![(0, 2, 0)], find_all(&pma, "abd"));
    }

    #[test]
    fn test_non_overlapping() {
        let mut pma = AcTrie::<Bytewise>::new();
        pma.insert_all(["aa"]).unwrap();
        pma.build();
        assert_eq!(vec![(0, 2, 0), (2, 4, 0)], find_all(&pma, "aaaa"));
        assert_eq!(vec![(0, 2, 0)], find_all(&pma, "aaa"));
    }

    #[test]
    fn test_no_match() {
        let mut pma = AcTrie::<Bytewise>::new();
        pma.insert_all(["foo", "bar"]).unwrap();
        pma.build();
        assert_eq!(None, pma.match_one("fobaz ofo"));
        assert_eq!(Vec::<(usize, usize, u32)>::new(), find_all(&pma, "fobaz ofo"));
        assert_eq!(None, pma.match_one(""));
    }

    #[test]
    fn test_textbook_example() {
        let mut pma = AcTrie::<Bytewise>::new();
        pma.insert_all(["he", "she", "his", "hers"]).unwrap();
        pma.build();
        assert_eq!(vec![(1, 4, 2), (4, 8, 3)], find_all(&pma, "ahishers"));

        let m = pma.match_one("ahishers").unwrap();
        assert_eq!(4, m.end());
        assert_eq!(2, m.pattern_id());
        assert_eq!(3, m.pattern_len());
    }

    #[test]
    fn test_match_after_fail_link() {
        let mut pma = AcTrie::<Bytewise>::new();
        pma.insert_all(["abd", "bc"]).unwrap();
        pma.build();
        assert_eq!(vec![(1, 3, 1)], find_all(&pma, "abc"));
    }

    #[test]
    fn test_full_prefix_continuation() {
        let mut pma = AcTrie::<Bytewise>::new();
        pma.insert_all(["abcde", "bc"]).unwrap();
        pma.build();
        assert_eq!(vec![(0, 5, 0)], find_all(&pma, "abcde"));
        assert_eq!(vec![(1, 3, 1)], find_all(&pma, "abcdx"));
    }

    #[test]
    fn test_full_prefix_continuation_wins() {
        let mut pma = AcTrie::<Bytewise>::new();
        pma.insert_all(["abcd", "bc", "bcdef"]).unwrap();
        pma.build();
        assert_eq!(vec![(0, 4, 0)], find_all(&pma, "abcdef"));
    }

    #[test]
    fn test_tail_keeps_last_final() {
        let mut pma = AcTrie::<Bytewise>::new();
        pma.insert_all(["a", "abc", "abcde"]).unwrap();
        pma.build();
        assert_eq!(vec![(0, 3, 1), (5, 6, 0)], find_all(&pma, "abcdXa"));
        assert_eq!(vec![(0, 5, 2)], find_all(&pma, "abcde"));
    }

    #[test]
    fn test_charwise() {
        let mut pma = CharwiseAcTrie::new();
        pma.insert_all(["全世界", "世界", "に"]).unwrap();
        pma.build();
        assert!(!pma.has_overflow_labels());
        assert_eq!(vec![(0, 9, 0), (12, 15, 2)], find_all(&pma, "全世界中に"));
        assert_eq!(vec![(6, 12, 1)], find_all(&pma, "全体世界"));
    }

    #[test]
    fn test_charwise_overflow_flag() {
        let mut pma = CharwiseAcTrie::new();
        pma.insert("\u{ffff}", 0).unwrap();
        assert!(!pma.has_overflow_labels());
        pma.insert("a\u{10000}", 1).unwrap();
        assert!(pma.has_overflow_labels());
        pma.build();
        assert_eq!(
            vec![(1, 4, 0), (4, 9, 1)],
            find_all(&pma, "x\u{ffff}a\u{10000}")
        );
        pma.clear();
        assert!(!pma.has_overflow_labels());
    }

    #[test]
    fn test_bytewise_multibyte() {
        let mut pma = AcTrie::<Bytewise>::new();
        pma.insert("\u{3042}".as_bytes(), 0).unwrap();
        pma.insert(&[0xFF, 0x00][..], 1).unwrap();
        pma.build();
        assert!(!pma.has_overflow_labels());
        let haystack = [0x00, 0xE3, 0x81, 0x82, 0xFF, 0x00];
        assert_eq!(vec![(1, 4, 0), (4, 6, 1)], find_all(&pma, &haystack[..]));
    }

    #[test]
    fn test_insert_after_build() {
        let mut pma = AcTrie::<Bytewise>::new();
        pma.insert("ab", 0).unwrap();
        pma.build();
        assert!(pma.is_built());
        pma.insert("b", 1).unwrap();
        assert!(!pma.is_built());
        pma.build();
        assert_eq!(vec![(0, 2, 0), (3, 4, 1)], find_all(&pma, "abcb"));
    }

    #[test]
    #[should_panic(expected = "must be built")]
    fn test_match_before_build() {
        let mut pma = AcTrie::<Bytewise>::new();
        pma.insert("ab", 0).unwrap();
        pma.match_one("ab");
    }
}
