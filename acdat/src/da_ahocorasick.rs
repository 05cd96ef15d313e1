//! Aho-Corasick algorithm using Double-Array Trie.

use std::collections::VecDeque;

use crate::ac_trie::AcTrie;
use crate::alphabet::{Alphabet, Bytewise, Charwise};
use crate::errors::{AcdatError, Result};
use crate::matcher::{self, Automaton, FindIterator, FindWithIterator, MatchInfo};
use crate::state::{
    DatExtra, DatIdentifier, Identifier, INVALID_STATE_ID, MAX_DAT_PATTERN_ID, ROOT_STATE_ID,
};
use crate::utils::{overflow_key, OverflowTable};

const FIRST_FREE_STATE_ID: u32 = 2;

#[derive(Clone, Copy, Debug, Default)]
struct State {
    base: u32,
    check: u32,
    fail: u32,
    ident: DatIdentifier,
    extra: DatExtra,
}

impl State {
    #[inline(always)]
    const fn is_free(&self) -> bool {
        self.base == 0 && self.check == 0
    }
}

/// Aho-Corasick automaton compacted into a double array.
///
/// Patterns are collected in an internal [`AcTrie`]. [`build()`](Self::build) computes its
/// failure links and flattens it into `base`/`check` arrays: the child of state `s` under
/// a label `c` is `base[s] + c` if that slot's `check` equals `s`. Labels at or above
/// [`Alphabet::DENSE_LIMIT`] are kept in a side table instead.
///
/// Once built, the internal trie can be released with
/// [`clear_ac_trie()`](Self::clear_ac_trie).
///
/// # Examples
///
/// ```
/// use acdat::{Bytewise, DoubleArrayAhoCorasick};
///
/// let pma = DoubleArrayAhoCorasick::<Bytewise>::from_patterns(&["ab", "abc", "bcd"]).unwrap();
///
/// let mut it = pma.find_iter("abcd abx");
///
/// let m = it.next().unwrap();
/// assert_eq!((0, 3, 1), (m.start(), m.end(), m.pattern()));
///
/// let m = it.next().unwrap();
/// assert_eq!((5, 7, 0), (m.start(), m.end(), m.pattern()));
///
/// assert_eq!(None, it.next());
/// ```
#[derive(Clone, Debug)]
pub struct DoubleArrayAhoCorasick<A = Bytewise>
where
    A: Alphabet,
{
    states: Vec<State>,
    overflow_labels: OverflowTable,
    first_free_id: u32,
    ac_trie: AcTrie<A>,
    ac_trie_released: bool,
    built: bool,
}

/// [`DoubleArrayAhoCorasick`] whose labels are Unicode code points.
///
/// # Examples
///
/// ```
/// use acdat::CharwiseDoubleArrayAhoCorasick;
///
/// let patterns = vec!["全世界", "世界", "に", "\u{1f600}"];
/// let pma = CharwiseDoubleArrayAhoCorasick::from_patterns(patterns).unwrap();
/// assert!(pma.has_overflow_labels());
///
/// let mut it = pma.find_iter("全世界中に\u{1f600}");
///
/// let m = it.next().unwrap();
/// assert_eq!((0, 9, 0), (m.start(), m.end(), m.pattern()));
///
/// let m = it.next().unwrap();
/// assert_eq!((12, 15, 2), (m.start(), m.end(), m.pattern()));
///
/// let m = it.next().unwrap();
/// assert_eq!((15, 19, 3), (m.start(), m.end(), m.pattern()));
///
/// assert_eq!(None, it.next());
/// ```
pub type CharwiseDoubleArrayAhoCorasick = DoubleArrayAhoCorasick<Charwise>;

impl<A> Default for DoubleArrayAhoCorasick<A>
where
    A: Alphabet,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<A> DoubleArrayAhoCorasick<A>
where
    A: Alphabet,
{
    /// Creates an empty automaton.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty automaton whose internal trie has room for `capacity` states.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut pma = Self {
            states: vec![],
            overflow_labels: OverflowTable::default(),
            first_free_id: FIRST_FREE_STATE_ID,
            ac_trie: AcTrie::with_capacity(capacity),
            ac_trie_released: false,
            built: false,
        };
        pma.clear_trie(2);
        pma
    }

    /// Builds an automaton from `patterns`, assigning each its position in the list as its
    /// identifier. The internal trie is released afterwards.
    ///
    /// # Errors
    ///
    /// [`AcdatError`] is returned when a pattern is empty or the scale of the patterns
    /// exceeds the expected one.
    pub fn from_patterns<I, P>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<A::Text>,
    {
        let mut pma = Self::new();
        pma.insert_all(patterns)?;
        pma.build()?;
        pma.clear_ac_trie();
        Ok(pma)
    }

    /// Adds a pattern to the internal trie. See [`AcTrie::insert()`].
    ///
    /// Patterns can no longer be added once the internal trie is released by
    /// [`clear_ac_trie()`](Self::clear_ac_trie) or [`from_patterns()`](Self::from_patterns),
    /// since the next build would drop every pattern added before. Start over with
    /// [`clear()`](Self::clear) or [`insert_all()`](Self::insert_all) instead.
    ///
    /// # Errors
    ///
    /// [`AcdatError`] is returned when the pattern is empty, `pattern_id` is out of range or
    /// the internal trie has been released.
    pub fn insert<P>(&mut self, pattern: P, pattern_id: u32) -> Result<bool>
    where
        P: AsRef<A::Text>,
    {
        if self.ac_trie_released {
            return Err(AcdatError::invalid_argument(
                "pattern",
                "cannot be added after the internal trie is released",
            ));
        }
        let inserted = self.ac_trie.insert(pattern, pattern_id)?;
        if inserted {
            self.built = false;
        }
        Ok(inserted)
    }

    /// Clears the automaton and adds `patterns` with positional identifiers.
    /// See [`AcTrie::insert_all()`].
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
        self.ac_trie.insert_all(patterns)
    }

    /// Builds the double array, using the side table only if a pattern needs it.
    ///
    /// # Errors
    ///
    /// [`AcdatError`] is returned when a pattern ID exceeds
    /// [`MAX_DAT_PATTERN_ID`](crate::MAX_DAT_PATTERN_ID) or the array outgrows `u32` indices.
    /// The automaton must be discarded in that case. An error is also returned when the
    /// internal trie has been released and the double array was removed since.
    pub fn build(&mut self) -> Result<()> {
        if self.ac_trie.has_overflow_labels() {
            self.build_overflow()
        } else {
            self.build_no_overflow()
        }
    }

    /// Builds the double array placing every label densely.
    ///
    /// # Errors
    ///
    /// In addition to the errors of [`build()`](Self::build), [`AcdatError`] is returned
    /// when a pattern contains a label at or above the dense limit.
    pub fn build_no_overflow(&mut self) -> Result<()> {
        if self.ac_trie.has_overflow_labels() {
            return Err(AcdatError::invalid_argument(
                "patterns",
                format!("contain labels at or above {:#x}", A::DENSE_LIMIT),
            ));
        }
        self.build_with(false)
    }

    /// Builds the double array, sending labels at or above the dense limit to the side
    /// table.
    ///
    /// # Errors
    ///
    /// See [`build()`](Self::build).
    pub fn build_overflow(&mut self) -> Result<()> {
        self.build_with(true)
    }

    fn build_with(&mut self, overflow: bool) -> Result<()> {
        if self.ac_trie_released {
            if self.built {
                return Ok(());
            }
            return Err(AcdatError::invalid_argument(
                "patterns",
                "the internal trie has been released",
            ));
        }
        if !self.ac_trie.is_built() {
            self.ac_trie.build();
        }
        let ac_trie = std::mem::take(&mut self.ac_trie);
        let result = self.compact(&ac_trie, overflow);
        self.ac_trie = ac_trie;
        result?;
        self.built = true;
        tracing::debug!(
            num_states = self.num_states(),
            num_elements = self.num_elements(),
            num_overflow_labels = self.num_overflow_labels(),
            "built double array"
        );
        Ok(())
    }

    fn compact(&mut self, ac_trie: &AcTrie<A>, overflow: bool) -> Result<()> {
        let ac_states = ac_trie.states();
        let capacity = (ac_states.len() + ac_states.len() / 10)
            .max(FIRST_FREE_STATE_ID as usize + A::DENSE_LIMIT as usize);
        self.clear_trie(capacity);
        self.states.resize(ac_states.len(), State::default());

        let mut state_id_map = vec![INVALID_STATE_ID; ac_states.len()];
        state_id_map[ROOT_STATE_ID as usize] = ROOT_STATE_ID;
        let ac_root = &ac_states[ROOT_STATE_ID as usize];
        self.states[ROOT_STATE_ID as usize].ident =
            Self::dat_identifier(ac_root.ident, !ac_root.children.is_empty())?;

        let mut queue = VecDeque::with_capacity(ac_states.len());
        queue.push_back(ROOT_STATE_ID);
        let mut n_visited = 0;
        let mut first_children = None;
        let mut dense_labels = vec![];
        while let Some(ac_state_id) = queue.pop_front() {
            n_visited += 1;
            let ac_state = &ac_states[ac_state_id as usize];
            if ac_state.children.is_empty() {
                continue;
            }
            if n_visited == 1 {
                first_children = Some(ac_state.children.len());
            }
            let state_id = state_id_map[ac_state_id as usize];

            dense_labels.clear();
            dense_labels.extend(
                ac_state
                    .children
                    .iter()
                    .map(|&(c, _)| c)
                    .filter(|&c| c < A::DENSE_LIMIT),
            );
            assert!(
                overflow || dense_labels.len() == ac_state.children.len(),
                "labels at or above the dense limit require the overflow table"
            );
            if !dense_labels.is_empty() {
                let base = self.find_base(&dense_labels, n_visited, &mut first_children)?;
                self.states[state_id as usize].base = base;
            }

            for &(c, ac_child_id) in &ac_state.children {
                let is_overflow = c >= A::DENSE_LIMIT;
                let child_id = if is_overflow {
                    let child_id = self.claim_free_state()?;
                    let prev = self
                        .overflow_labels
                        .insert(overflow_key(state_id, c), child_id);
                    assert!(prev.is_none(), "overflow label registered twice");
                    child_id
                } else {
                    self.states[state_id as usize].base + c
                };

                let ac_child = &ac_states[ac_child_id as usize];
                let child = &mut self.states[child_id as usize];
                assert!(child.is_free(), "state {} is already allocated", child_id);
                child.check = state_id;
                child.ident = Self::dat_identifier(ac_child.ident, !ac_child.children.is_empty())?;
                child.extra = DatExtra::new(ac_child.depth, is_overflow).ok_or_else(|| {
                    AcdatError::invalid_argument("pattern", "too long for the double array")
                })?;
                state_id_map[ac_child_id as usize] = child_id;
                queue.push_back(ac_child_id);
            }
        }

        for (ac_state_id, ac_state) in ac_states.iter().enumerate().skip(1) {
            let state_id = state_id_map[ac_state_id];
            self.states[state_id as usize].fail = if ac_state.fail == INVALID_STATE_ID {
                INVALID_STATE_ID
            } else {
                state_id_map[ac_state.fail as usize]
            };
        }

        let len = self
            .states
            .iter()
            .rposition(|state| !state.is_free())
            .map_or(0, |i| i + 1)
            .max(FIRST_FREE_STATE_ID as usize);
        self.states.truncate(len);
        Ok(())
    }

    fn dat_identifier(ident: Identifier, has_child: bool) -> Result<DatIdentifier> {
        DatIdentifier::new(ident, has_child).ok_or_else(|| {
            AcdatError::invalid_argument(
                "pattern_id",
                format!(
                    "must be at most {}, but got {}",
                    MAX_DAT_PATTERN_ID,
                    ident.pattern_id()
                ),
            )
        })
    }

    /// Searches a base such that `base + c` is free for every label `c` in `labels`.
    ///
    /// `labels` must be sorted and below the dense limit.
    fn find_base(
        &mut self,
        labels: &[u32],
        n_visited: usize,
        first_children: &mut Option<usize>,
    ) -> Result<u32> {
        let min_c = labels[0];
        let max_c = labels[labels.len() - 1];
        let mut free_id = self.find_first_free_state();
        if matches!(free_id, Some(id) if id < FIRST_FREE_STATE_ID + min_c) {
            free_id = self.find_next_free_state(FIRST_FREE_STATE_ID + min_c);
        }
        loop {
            let Some(id) = free_id else {
                let len = u32::try_from(self.states.len())?;
                let base = len.max(FIRST_FREE_STATE_ID + min_c) - min_c;
                self.extend_states(base as usize + A::DENSE_LIMIT as usize)?;
                return Ok(base);
            };
            let base = id - min_c;
            if base as usize + max_c as usize >= self.states.len() {
                self.extend_states(base as usize + A::DENSE_LIMIT as usize)?;
            }
            if labels
                .iter()
                .all(|&c| self.states[(base + c) as usize].is_free())
            {
                return Ok(base);
            }
            free_id = self.find_next_free_state(id + 1);

            // Once the root's children are placed, skip the scanned prefix for good.
            if let Some(n) = *first_children {
                if n_visited > n + 1 {
                    if let Some(id) = free_id {
                        self.first_free_id = id;
                    }
                    *first_children = None;
                }
            }
        }
    }

    /// Takes the first free slot for a child reached through the side table.
    fn claim_free_state(&mut self) -> Result<u32> {
        if let Some(id) = self.find_first_free_state() {
            return Ok(id);
        }
        let len = self.states.len();
        self.extend_states(len + A::DENSE_LIMIT as usize)?;
        Ok(u32::try_from(len)?)
    }

    fn find_first_free_state(&mut self) -> Option<u32> {
        let id = self.find_next_free_state(self.first_free_id)?;
        self.first_free_id = id;
        Some(id)
    }

    fn find_next_free_state(&self, first: u32) -> Option<u32> {
        let first = (first as usize).min(self.states.len());
        self.states[first..]
            .iter()
            .position(State::is_free)
            .map(|i| (first + i) as u32)
    }

    fn extend_states(&mut self, min_len: usize) -> Result<()> {
        if min_len > self.states.len() {
            u32::try_from(min_len)?;
            self.states.resize(min_len, State::default());
        }
        Ok(())
    }

    /// Removes all patterns and the double array.
    pub fn clear(&mut self) {
        self.ac_trie = AcTrie::new();
        self.ac_trie_released = false;
        self.clear_trie(2);
    }

    /// Releases the internal trie. Matching keeps working on the double array, but no
    /// pattern can be added until [`clear()`](Self::clear).
    pub fn clear_ac_trie(&mut self) {
        self.ac_trie = AcTrie::new();
        self.ac_trie_released = true;
    }

    /// Removes the double array, reserving room for `capacity` states.
    pub fn clear_trie(&mut self, capacity: usize) {
        self.states.clear();
        self.states.reserve(capacity.max(2));
        self.states.push(State::default());
        self.states.push(State::default());
        self.overflow_labels.clear();
        self.first_free_id = FIRST_FREE_STATE_ID;
        self.built = false;
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

    /// Returns an iterator of non-overlapping longest matches whose start offsets are
    /// computed from the pattern lengths returned by `on_hit`.
    ///
    /// # Panics
    ///
    /// The automaton must be built.
    ///
    /// # Examples
    ///
    /// ```
    /// use acdat::{Bytewise, DoubleArrayAhoCorasick};
    ///
    /// let patterns = ["foo", "barbaz"];
    /// let pma = DoubleArrayAhoCorasick::<Bytewise>::from_patterns(&patterns).unwrap();
    ///
    /// let matches: Vec<_> = pma
    ///     .find_iter_with("a foo barbaz", |id| patterns[id as usize].len())
    ///     .map(|m| (m.start(), m.end(), m.pattern()))
    ///     .collect();
    /// assert_eq!(vec![(2, 5, 0), (6, 12, 1)], matches);
    /// ```
    pub fn find_iter_with<P, F>(
        &self,
        haystack: P,
        on_hit: F,
    ) -> FindWithIterator<'_, Self, P, F>
    where
        P: AsRef<A::Text>,
        F: FnMut(u32) -> usize,
    {
        assert!(self.built, "the automaton must be built before matching");
        FindWithIterator {
            pma: self,
            haystack,
            pos: 0,
            on_hit,
        }
    }

    /// Returns the number of allocated states including the root.
    pub fn num_states(&self) -> usize {
        self.states[FIRST_FREE_STATE_ID as usize..]
            .iter()
            .filter(|state| !state.is_free())
            .count()
            + 1
    }

    /// Returns the length of the double array including free slots.
    pub fn num_elements(&self) -> usize {
        self.states.len()
    }

    /// Returns the number of transitions stored in the side table.
    pub fn num_overflow_labels(&self) -> usize {
        self.overflow_labels.len()
    }

    /// Returns `true` if a pattern needs the side table.
    pub fn has_overflow_labels(&self) -> bool {
        self.ac_trie.has_overflow_labels() || !self.overflow_labels.is_empty()
    }

    /// Returns `true` if the double array reflects every inserted pattern.
    pub const fn is_built(&self) -> bool {
        self.built
    }
}

impl<A> Automaton for DoubleArrayAhoCorasick<A>
where
    A: Alphabet,
{
    type Alphabet = A;

    #[inline(always)]
    fn child(&self, state_id: u32, label: u32) -> Option<u32> {
        if label >= A::DENSE_LIMIT {
            return self
                .overflow_labels
                .get(&overflow_key(state_id, label))
                .copied();
        }
        let base = self.states[state_id as usize].base;
        if base == 0 {
            return None;
        }
        let child_id = base.checked_add(label)?;
        let child = self.states.get(child_id as usize)?;
        if child.check == state_id && !child.extra.is_overflow() {
            Some(child_id)
        } else {
            None
        }
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
        self.states[state_id as usize].ident.has_child()
    }

    #[inline(always)]
    fn depth(&self, state_id: u32) -> u32 {
        self.states[state_id as usize].extra.depth()
    }
}
