//! Dictionary-driven text replacement.

use crate::alphabet::{Alphabet, Bytewise, Charwise};
use crate::da_ahocorasick::DoubleArrayAhoCorasick;
use crate::errors::Result;

/// Replaces every non-overlapping longest match of the dictionary keys with its value.
///
/// # Examples
///
/// ```
/// use acdat::{Charwise, Replacer};
///
/// let dict = [("東京", "Tokyo"), ("東京都", "Tokyo Metropolis")];
/// let replacer = Replacer::<Charwise>::new(dict).unwrap();
/// assert_eq!("Tokyo Metropolis and Tokyo", replacer.replace("東京都 and 東京"));
/// ```
#[derive(Clone, Debug)]
pub struct Replacer<A = Charwise>
where
    A: Alphabet,
{
    pma: DoubleArrayAhoCorasick<A>,
    values: Vec<Option<String>>,
    n_entries: usize,
}

impl<A> Replacer<A>
where
    A: Alphabet,
{
    /// Creates a new replacer.
    ///
    /// # Arguments
    ///
    /// * `dict` - Pairs of a non-empty key and its replacement. The position of a pair in
    ///   `dict` is its pattern ID. If a key appears more than once, the first value is used.
    ///
    /// # Errors
    ///
    /// [`AcdatError`](crate::AcdatError) is returned when a key is empty or the dictionary
    /// is too large.
    pub fn new<I, K, V>(dict: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<A::Text>,
        V: Into<String>,
    {
        let mut pma = DoubleArrayAhoCorasick::new();
        let mut values = vec![];
        let mut n_entries = 0;
        for (i, (key, value)) in dict.into_iter().enumerate() {
            let pattern_id = u32::try_from(i)?;
            if pma.insert(key, pattern_id)? {
                values.push(Some(value.into()));
                n_entries += 1;
            } else {
                values.push(None);
            }
        }
        pma.build()?;
        pma.clear_ac_trie();
        tracing::debug!(
            num_entries = n_entries,
            num_duplicates = values.len() - n_entries,
            "built replacer"
        );
        Ok(Self {
            pma,
            values,
            n_entries,
        })
    }

    /// Appends `haystack` to `buf` with every match replaced.
    pub fn replace_into<P>(&self, haystack: P, buf: &mut Vec<u8>)
    where
        P: AsRef<A::Text>,
    {
        let bytes: &[u8] = haystack.as_ref().as_ref();
        let mut last = 0;
        for m in self.pma.find_iter(&haystack) {
            buf.extend_from_slice(&bytes[last..m.start()]);
            buf.extend_from_slice(self.replacement(m.pattern()).as_bytes());
            last = m.end();
        }
        buf.extend_from_slice(&bytes[last..]);
    }

    /// Returns the replacement registered for `pattern_id`, the position of the pair in the
    /// dictionary. `None` is returned for a duplicate key.
    pub fn value(&self, pattern_id: u32) -> Option<&str> {
        self.values.get(pattern_id as usize)?.as_deref()
    }

    /// Returns the number of distinct keys.
    pub const fn num_entries(&self) -> usize {
        self.n_entries
    }

    // Every reported pattern ID was inserted, so the value is always present.
    #[inline(always)]
    fn replacement(&self, pattern_id: u32) -> &str {
        self.value(pattern_id).unwrap_or_default()
    }
}

impl Replacer<Charwise> {
    /// Returns `haystack` with every match replaced.
    pub fn replace(&self, haystack: &str) -> String {
        let mut result = String::with_capacity(haystack.len());
        let mut last = 0;
        for m in self.pma.find_iter(haystack) {
            result.push_str(&haystack[last..m.start()]);
            result.push_str(self.replacement(m.pattern()));
            last = m.end();
        }
        result.push_str(&haystack[last..]);
        result
    }
}

impl Replacer<Bytewise> {
    /// Returns `haystack` with every match replaced.
    pub fn replace(&self, haystack: &[u8]) -> Vec<u8> {
        let mut result = Vec::with_capacity(haystack.len());
        self.replace_into(haystack, &mut result);
        result
    }
}
