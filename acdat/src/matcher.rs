//! Streaming longest-match search shared by both automaton representations.

use crate::alphabet::Alphabet;
use crate::state::ROOT_STATE_ID;

/// Read-only view of a built Aho-Corasick automaton.
///
/// State `0` is invalid and state `1` is the root.
pub trait Automaton {
    /// Front end splitting texts into labels.
    type Alphabet: Alphabet;

    /// Returns the child of `state_id` reached with `label`.
    fn child(&self, state_id: u32, label: u32) -> Option<u32>;

    /// Returns the failure link of `state_id`.
    fn fail(&self, state_id: u32) -> u32;

    /// Returns the pattern ID if `state_id` is final.
    fn output(&self, state_id: u32) -> Option<u32>;

    /// Returns `true` if `state_id` has at least one child.
    fn has_child(&self, state_id: u32) -> bool;

    /// Returns the byte length of the prefix represented by `state_id`.
    fn depth(&self, state_id: u32) -> u32;
}

/// The end of a match and the pattern that matched.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MatchInfo {
    end: usize,
    pattern_id: u32,
    len: usize,
}

impl MatchInfo {
    /// Byte offset just past the match.
    pub const fn end(&self) -> usize {
        self.end
    }

    /// Pattern ID given on insertion.
    pub const fn pattern_id(&self) -> u32 {
        self.pattern_id
    }

    /// Byte length of the matched pattern.
    pub const fn pattern_len(&self) -> usize {
        self.len
    }
}

/// A match found in a haystack.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Match {
    start: usize,
    end: usize,
    pattern: u32,
}

impl Match {
    pub const fn start(&self) -> usize {
        self.start
    }

    pub const fn end(&self) -> usize {
        self.end
    }

    pub const fn pattern(&self) -> u32 {
        self.pattern
    }
}

#[inline(always)]
fn get_next_state_id<M>(pma: &M, mut state_id: u32, label: u32) -> Option<u32>
where
    M: Automaton + ?Sized,
{
    loop {
        if let Some(child_id) = pma.child(state_id, label) {
            return Some(child_id);
        }
        if state_id == ROOT_STATE_ID {
            return None;
        }
        state_id = pma.fail(state_id);
    }
}

/// Follows child edges from `start_id` over `haystack[pos..]` without failure links.
///
/// Returns the last final state passed on the way, if any.
pub(crate) fn match_tail<M>(
    pma: &M,
    start_id: u32,
    haystack: &[u8],
    mut pos: usize,
) -> Option<MatchInfo>
where
    M: Automaton + ?Sized,
{
    let mut state_id = start_id;
    let mut last = None;
    while pos < haystack.len() {
        let (label, width) = <M::Alphabet as Alphabet>::decode(haystack, pos);
        match pma.child(state_id, label) {
            Some(child_id) => {
                state_id = child_id;
                pos += width;
                if let Some(pattern_id) = pma.output(state_id) {
                    last = Some(MatchInfo {
                        end: pos,
                        pattern_id,
                        len: pma.depth(state_id) as usize,
                    });
                }
            }
            None => break,
        }
    }
    last
}

/// Finds the leftmost match end in `haystack`, extended to the longest pattern reachable
/// from the state where the first final state was found.
///
/// If the first final state was reached through a failure link, a continuation of the
/// full prefix wins as soon as it reaches any final state. Otherwise, if the final state
/// has children, its own continuation replaces it when that continuation reaches a
/// final state.
pub(crate) fn match_one<M>(pma: &M, haystack: &[u8]) -> Option<MatchInfo>
where
    M: Automaton + ?Sized,
{
    let mut state_id = ROOT_STATE_ID;
    let mut pos = 0;
    while pos < haystack.len() {
        let (label, width) = <M::Alphabet as Alphabet>::decode(haystack, pos);
        pos += width;
        state_id = match get_next_state_id(pma, state_id, label) {
            Some(next_id) => next_id,
            None => {
                state_id = ROOT_STATE_ID;
                continue;
            }
        };

        let mut node_id = state_id;
        while node_id != ROOT_STATE_ID {
            if let Some(pattern_id) = pma.output(node_id) {
                if node_id != state_id {
                    if let Some(m) = match_tail(pma, state_id, haystack, pos) {
                        return Some(m);
                    }
                }
                if pma.has_child(node_id) {
                    if let Some(m) = match_tail(pma, node_id, haystack, pos) {
                        return Some(m);
                    }
                }
                return Some(MatchInfo {
                    end: pos,
                    pattern_id,
                    len: pma.depth(node_id) as usize,
                });
            }
            node_id = pma.fail(node_id);
        }
    }
    None
}

/// Iterator created by `find_iter()`.
///
/// Yields non-overlapping matches from left to right. After each match, scanning restarts
/// from the root just past the matched span.
pub struct FindIterator<'a, M, P>
where
    M: ?Sized,
{
    pub(crate) pma: &'a M,
    pub(crate) haystack: P,
    pub(crate) pos: usize,
}

impl<'a, M, P> Iterator for FindIterator<'a, M, P>
where
    M: Automaton + ?Sized,
    P: AsRef<<M::Alphabet as Alphabet>::Text>,
{
    type Item = Match;

    fn next(&mut self) -> Option<Self::Item> {
        let haystack: &[u8] = self.haystack.as_ref().as_ref();
        if self.pos >= haystack.len() {
            return None;
        }
        let Some(m) = match_one(self.pma, &haystack[self.pos..]) else {
            self.pos = haystack.len();
            return None;
        };
        let end = self.pos + m.end;
        let start = end - m.len;
        self.pos = end;
        Some(Match {
            start,
            end,
            pattern: m.pattern_id,
        })
    }
}

/// Iterator created by `find_iter_with()`.
///
/// Same as [`FindIterator`], but the start of each match is `end - on_hit(pattern)`,
/// never before the point where scanning for that match began.
pub struct FindWithIterator<'a, M, P, F>
where
    M: ?Sized,
{
    pub(crate) pma: &'a M,
    pub(crate) haystack: P,
    pub(crate) pos: usize,
    pub(crate) on_hit: F,
}

impl<'a, M, P, F> Iterator for FindWithIterator<'a, M, P, F>
where
    M: Automaton + ?Sized,
    P: AsRef<<M::Alphabet as Alphabet>::Text>,
    F: FnMut(u32) -> usize,
{
    type Item = Match;

    fn next(&mut self) -> Option<Self::Item> {
        let haystack: &[u8] = self.haystack.as_ref().as_ref();
        if self.pos >= haystack.len() {
            return None;
        }
        let Some(m) = match_one(self.pma, &haystack[self.pos..]) else {
            self.pos = haystack.len();
            return None;
        };
        let end = self.pos + m.end;
        let len = (self.on_hit)(m.pattern_id);
        let start = end.saturating_sub(len).max(self.pos);
        self.pos = end;
        Some(Match {
            start,
            end,
            pattern: m.pattern_id,
        })
    }
}
