//! A sorted-set primitive backing every `idx:*` and cache/temp sorted key.
//!
//! Scores are ordered by `(f64, member)` so ties break lexicographically by
//! member id, matching the deterministic-pagination requirement.

use std::collections::BTreeMap;

/// Wraps an `f64` with a total order (`NaN` never occurs in this engine's
/// scores), mirroring the `OrderedFloat`-shaped key used for score indexing
/// elsewhere in this codebase's sorted structures.
#[derive(Debug, Clone, Copy, PartialEq)]
struct OrderedScore(f64);

impl Eq for OrderedScore {}
impl PartialOrd for OrderedScore {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for OrderedScore {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.partial_cmp(&other.0).unwrap_or(std::cmp::Ordering::Equal)
    }
}

/// An in-memory sorted set: member -> score, with an ordered index for range
/// scans, and a reverse map for O(1) score lookup by member.
#[derive(Debug, Clone, Default)]
pub struct SortedSet {
    by_score: BTreeMap<(OrderedScore, String), ()>,
    scores: std::collections::HashMap<String, f64>,
}

impl SortedSet {
    /// A new, empty sorted set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or update `member`'s score.
    pub fn add(&mut self, member: impl Into<String>, score: f64) {
        let member = member.into();
        if let Some(&old) = self.scores.get(&member) {
            self.by_score.remove(&(OrderedScore(old), member.clone()));
        }
        self.by_score.insert((OrderedScore(score), member.clone()), ());
        self.scores.insert(member, score);
    }

    /// Remove `member`, returning its prior score if present.
    pub fn remove(&mut self, member: &str) -> Option<f64> {
        let old = self.scores.remove(member)?;
        self.by_score.remove(&(OrderedScore(old), member.to_string()));
        Some(old)
    }

    /// Current score for `member`, if present.
    pub fn score(&self, member: &str) -> Option<f64> {
        self.scores.get(member).copied()
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// All members, in ascending score order.
    pub fn members_ascending(&self) -> Vec<String> {
        self.by_score.keys().map(|(_, m)| m.clone()).collect()
    }

    /// All members, in descending score order.
    pub fn members_descending(&self) -> Vec<String> {
        let mut v = self.members_ascending();
        v.reverse();
        v
    }

    /// Members within `[start, stop]` rank indices, ascending.
    pub fn range_ascending(&self, start: i64, stop: i64) -> Vec<String> {
        slice_range(&self.members_ascending(), start, stop)
    }

    /// Members within `[start, stop]` rank indices, descending.
    pub fn range_descending(&self, start: i64, stop: i64) -> Vec<String> {
        slice_range(&self.members_descending(), start, stop)
    }

    /// Members (with scores) whose score lies in `[min, max]`, ascending.
    pub fn range_by_score(&self, min: f64, max: f64) -> Vec<(String, f64)> {
        self.by_score
            .keys()
            .filter(|(s, _)| s.0 >= min && s.0 <= max)
            .map(|(s, m)| (m.clone(), s.0))
            .collect()
    }

    /// Remove all members whose score lies in `[min, max]`, returning how many were removed.
    pub fn remove_range_by_score(&mut self, min: f64, max: f64) -> usize {
        let victims: Vec<String> = self
            .by_score
            .keys()
            .filter(|(s, _)| s.0 >= min && s.0 <= max)
            .map(|(_, m)| m.clone())
            .collect();
        for m in &victims {
            self.remove(m);
        }
        victims.len()
    }
}

/// Negative rank indices (Redis-style `-1` = last) are not used by this
/// engine's callers (pagination only ever uses non-negative ranks), so
/// indices are clamped to `[0, len)`.
fn slice_range(members: &[String], start: i64, stop: i64) -> Vec<String> {
    if members.is_empty() || stop < 0 || start < 0 {
        return vec![];
    }
    let len = members.len() as i64;
    let start = start.min(len);
    let stop = (stop + 1).min(len);
    if start >= stop {
        return vec![];
    }
    members[start as usize..stop as usize].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascending_and_descending_order() {
        let mut s = SortedSet::new();
        s.add("a", 3.0);
        s.add("b", 1.0);
        s.add("c", 2.0);
        assert_eq!(s.members_ascending(), vec!["b", "c", "a"]);
        assert_eq!(s.members_descending(), vec!["a", "c", "b"]);
    }

    #[test]
    fn re_adding_a_member_moves_it() {
        let mut s = SortedSet::new();
        s.add("a", 1.0);
        s.add("a", 5.0);
        assert_eq!(s.score("a"), Some(5.0));
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn range_ascending_is_inclusive() {
        let mut s = SortedSet::new();
        for (m, sc) in [("a", 1.0), ("b", 2.0), ("c", 3.0), ("d", 4.0)] {
            s.add(m, sc);
        }
        assert_eq!(s.range_ascending(1, 2), vec!["b", "c"]);
    }

    #[test]
    fn range_by_score_filters_inclusive_bounds() {
        let mut s = SortedSet::new();
        for (m, sc) in [("a", 1.0), ("b", 2.0), ("c", 3.0)] {
            s.add(m, sc);
        }
        let r = s.range_by_score(2.0, 3.0);
        assert_eq!(r.len(), 2);
    }

    #[test]
    fn remove_range_by_score_removes_matching_members() {
        let mut s = SortedSet::new();
        for (m, sc) in [("a", 1.0), ("b", 2.0), ("c", 3.0)] {
            s.add(m, sc);
        }
        let n = s.remove_range_by_score(2.0, 10.0);
        assert_eq!(n, 2);
        assert_eq!(s.len(), 1);
    }
}
