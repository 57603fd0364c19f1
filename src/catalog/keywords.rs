//! Search keywords covering the 3-digit course-code prefix space.
//!
//! Every course code contains some 3-digit run, so sweeping `000`..=`998` reaches
//! every section (with overlap, e.g. `3140` matches both `314` and `140`). `999`
//! is skipped. Prefixes whose results are known to exceed the platform cap are
//! replaced by the ten 4-digit keywords `0xxx`..`9xxx`.

use std::collections::BTreeSet;

/// Last 3-digit prefix included in the sweep.
pub const LAST_PREFIX: u16 = 998;

/// Produces the keyword sweep. Cheap to clone; each call to [`keywords`](Self::keywords)
/// starts a fresh pass over the sequence.
#[derive(Debug, Clone, Default)]
pub struct KeywordEnumerator {
    expanded: BTreeSet<u16>,
}

impl KeywordEnumerator {
    /// Build an enumerator expanding the given prefixes. Entries that are not
    /// 3-digit numbers are ignored here; config validation rejects them up front.
    pub fn new<I, S>(truncating_prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let expanded = truncating_prefixes
            .into_iter()
            .filter_map(|p| parse_prefix(p.as_ref()))
            .collect();
        Self { expanded }
    }

    pub fn is_expanded(&self, prefix: u16) -> bool {
        self.expanded.contains(&prefix)
    }

    pub fn keywords(&self) -> Keywords<'_> {
        Keywords {
            enumerator: self,
            prefix: 0,
            digit: 0,
        }
    }

    /// Total number of keywords one sweep yields.
    pub fn len(&self) -> usize {
        let expanded = self
            .expanded
            .iter()
            .filter(|p| **p <= LAST_PREFIX)
            .count();
        (LAST_PREFIX as usize + 1) + expanded * 9
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Parse a 3-digit keyword prefix such as `"042"`.
pub fn parse_prefix(raw: &str) -> Option<u16> {
    if raw.len() == 3 && raw.bytes().all(|b| b.is_ascii_digit()) {
        raw.parse().ok()
    } else {
        None
    }
}

/// Lazy iterator over one keyword sweep.
#[derive(Debug, Clone)]
pub struct Keywords<'a> {
    enumerator: &'a KeywordEnumerator,
    prefix: u16,
    /// Next leading digit to emit while inside an expanded prefix.
    digit: u8,
}

impl Iterator for Keywords<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.prefix > LAST_PREFIX {
            return None;
        }

        let prefix = self.prefix;
        if !self.enumerator.is_expanded(prefix) {
            self.prefix += 1;
            return Some(format!("{prefix:03}"));
        }

        let keyword = format!("{}{prefix:03}", self.digit);
        if self.digit == 9 {
            self.digit = 0;
            self.prefix += 1;
        } else {
            self.digit += 1;
        }
        Some(keyword)
    }
}
