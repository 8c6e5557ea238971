//! Match expressions evaluated against a single flattened path.
//!
//! Every expression yields a mask over the path's positions (its anchors).
//! A path satisfies an expression when at least one anchor is set. Node-level
//! combinators (`and`, `or`, `not`) work position by position, while the
//! positional ones (`sequence`, `connected`, `after`, `before`) relate the
//! anchors of several expressions along the path.

use crate::engine::TagListEntry;
use std::fmt;
use std::sync::Arc;

pub type Predicate<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

#[derive(Clone)]
pub enum TagTreeMatch<T> {
    /// Positions whose data satisfies the predicate
    Match(Predicate<T>),
    /// Positions matched by every sub-expression
    And(Vec<TagTreeMatch<T>>),
    /// Positions matched by any sub-expression
    Or(Vec<TagTreeMatch<T>>),
    /// Positions not matched by the sub-expression
    Not(Box<TagTreeMatch<T>>),
    /// Final positions of an ordered chain of matches
    Sequence(Vec<TagTreeMatch<T>>),
    /// Final positions of a chain of matches on consecutive positions
    Connected(Vec<TagTreeMatch<T>>),
    /// Positions of the first expression strictly after some anchor of the second
    After(Box<TagTreeMatch<T>>, Box<TagTreeMatch<T>>),
    /// Positions of the first expression strictly before some anchor of the second
    Before(Box<TagTreeMatch<T>>, Box<TagTreeMatch<T>>),
}

impl<T> TagTreeMatch<T> {
    pub fn predicate(f: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        Self::Match(Arc::new(f))
    }

    pub fn exact(value: T) -> Self
    where
        T: PartialEq + Send + Sync + 'static,
    {
        Self::predicate(move |data| *data == value)
    }

    /// Matches every position
    pub fn any() -> Self {
        Self::And(Vec::new())
    }

    pub fn and(list: Vec<TagTreeMatch<T>>) -> Self {
        Self::And(list)
    }

    pub fn or(list: Vec<TagTreeMatch<T>>) -> Self {
        Self::Or(list)
    }

    pub fn not(expr: TagTreeMatch<T>) -> Self {
        Self::Not(Box::new(expr))
    }

    pub fn sequence(list: Vec<TagTreeMatch<T>>) -> Self {
        Self::Sequence(list)
    }

    pub fn connected(list: Vec<TagTreeMatch<T>>) -> Self {
        Self::Connected(list)
    }

    pub fn after(self, anchor: TagTreeMatch<T>) -> Self {
        Self::After(Box::new(self), Box::new(anchor))
    }

    pub fn before(self, anchor: TagTreeMatch<T>) -> Self {
        Self::Before(Box::new(self), Box::new(anchor))
    }

    /// Whether any position of the path matches
    pub fn matches(&self, path: &[TagListEntry<T>]) -> bool {
        self.anchors(path).into_iter().any(|hit| hit)
    }

    /// Per-position match mask
    pub fn anchors(&self, path: &[TagListEntry<T>]) -> Vec<bool> {
        let len = path.len();
        match self {
            Self::Match(predicate) => path.iter().map(|entry| predicate(&entry.data)).collect(),

            Self::And(list) => {
                let mut mask = vec![true; len];
                for expr in list {
                    for (slot, hit) in mask.iter_mut().zip(expr.anchors(path)) {
                        *slot &= hit;
                    }
                }
                mask
            }

            Self::Or(list) => {
                let mut mask = vec![false; len];
                for expr in list {
                    for (slot, hit) in mask.iter_mut().zip(expr.anchors(path)) {
                        *slot |= hit;
                    }
                }
                mask
            }

            Self::Not(expr) => expr.anchors(path).into_iter().map(|hit| !hit).collect(),

            Self::Sequence(list) => chain(list, path, |previous, index| {
                previous[..index].iter().any(|hit| *hit)
            }),

            Self::Connected(list) => chain(list, path, |previous, index| {
                index > 0 && previous[index - 1]
            }),

            Self::After(expr, anchor) => {
                let anchors = anchor.anchors(path);
                let first = anchors.iter().position(|hit| *hit);
                expr.anchors(path)
                    .into_iter()
                    .enumerate()
                    .map(|(index, hit)| hit && first.is_some_and(|first| first < index))
                    .collect()
            }

            Self::Before(expr, anchor) => {
                let anchors = anchor.anchors(path);
                let last = anchors.iter().rposition(|hit| *hit);
                expr.anchors(path)
                    .into_iter()
                    .enumerate()
                    .map(|(index, hit)| hit && last.is_some_and(|last| index < last))
                    .collect()
            }
        }
    }
}

fn chain<T>(
    list: &[TagTreeMatch<T>],
    path: &[TagListEntry<T>],
    linked: impl Fn(&[bool], usize) -> bool,
) -> Vec<bool> {
    let mut iter = list.iter();
    let Some(first) = iter.next() else {
        return vec![false; path.len()];
    };

    let mut reach = first.anchors(path);
    for expr in iter {
        let hits = expr.anchors(path);
        reach = hits
            .iter()
            .enumerate()
            .map(|(index, hit)| *hit && linked(&reach, index))
            .collect();
    }
    reach
}

impl<T> fmt::Debug for TagTreeMatch<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Match(_) => f.write_str("Match(<predicate>)"),
            Self::And(list) => f.debug_tuple("And").field(list).finish(),
            Self::Or(list) => f.debug_tuple("Or").field(list).finish(),
            Self::Not(expr) => f.debug_tuple("Not").field(expr).finish(),
            Self::Sequence(list) => f.debug_tuple("Sequence").field(list).finish(),
            Self::Connected(list) => f.debug_tuple("Connected").field(list).finish(),
            Self::After(expr, anchor) => f.debug_tuple("After").field(expr).field(anchor).finish(),
            Self::Before(expr, anchor) => f.debug_tuple("Before").field(expr).field(anchor).finish(),
        }
    }
}
