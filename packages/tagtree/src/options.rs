use crate::engine::TagListEntry;
use crate::matcher::Predicate;
use crate::tree::NodeExtra;
use std::fmt;
use std::sync::Arc;

pub type Classify<T, C> = Arc<dyn Fn(&T) -> C + Send + Sync>;
pub type Compare<T> = Arc<dyn Fn(&T, &T) -> bool + Send + Sync>;
pub type MergeFn<T> = Arc<dyn Fn(&TagListEntry<T>, &TagListEntry<T>) -> (T, NodeExtra) + Send + Sync>;

/// Construction parameters of a [`TagTree`](crate::TagTree)
///
/// `C` is the category label returned by `classify`. Categories drive the
/// fold-back: a search for an identical sibling only continues past siblings
/// whose category shares an `order_independence` group with the incoming
/// node, and `order_sort` ranks categories when a new sibling is inserted.
#[derive(Clone)]
pub struct TagTreeOptions<T, C> {
    pub(crate) classify: Classify<T, C>,
    pub(crate) compare: Compare<T>,
    pub(crate) merge: MergeFn<T>,
    pub(crate) is_wrapper: Predicate<T>,
    pub(crate) order_independence: Vec<Vec<C>>,
    pub(crate) order_sort: Vec<C>,
}

impl<T, C> TagTreeOptions<T, C>
where
    T: Clone + PartialEq + Send + Sync + 'static,
    C: Copy + PartialEq,
{
    pub fn new(classify: impl Fn(&T) -> C + Send + Sync + 'static) -> Self {
        Self {
            classify: Arc::new(classify),
            compare: Arc::new(|a: &T, b: &T| a == b),
            merge: Arc::new(right_biased_merge::<T>),
            is_wrapper: Arc::new(|_: &T| false),
            order_independence: Vec::new(),
            order_sort: Vec::new(),
        }
    }
}

impl<T, C: Copy + PartialEq> TagTreeOptions<T, C> {
    pub fn with_compare(mut self, compare: impl Fn(&T, &T) -> bool + Send + Sync + 'static) -> Self {
        self.compare = Arc::new(compare);
        self
    }

    pub fn with_merge(
        mut self,
        merge: impl Fn(&TagListEntry<T>, &TagListEntry<T>) -> (T, NodeExtra) + Send + Sync + 'static,
    ) -> Self {
        self.merge = Arc::new(merge);
        self
    }

    pub fn with_wrappers(mut self, is_wrapper: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        self.is_wrapper = Arc::new(is_wrapper);
        self
    }

    pub fn with_order_independence(mut self, groups: Vec<Vec<C>>) -> Self {
        self.order_independence = groups;
        self
    }

    pub fn with_order_sort(mut self, order: Vec<C>) -> Self {
        self.order_sort = order;
        self
    }

    pub fn classify(&self, data: &T) -> C {
        (self.classify)(data)
    }

    pub fn compare(&self, a: &T, b: &T) -> bool {
        (self.compare)(a, b)
    }

    pub fn is_wrapper(&self, data: &T) -> bool {
        (self.is_wrapper)(data)
    }

    pub(crate) fn merge_entries(&self, existing: &TagListEntry<T>, incoming: &TagListEntry<T>) -> (T, NodeExtra) {
        (self.merge)(existing, incoming)
    }

    /// Whether two categories may be interleaved without blocking a merge
    pub fn independent(&self, a: C, b: C) -> bool {
        self.order_independence
            .iter()
            .any(|group| group.contains(&a) && group.contains(&b))
    }

    pub(crate) fn sort_rank(&self, category: C) -> Option<usize> {
        self.order_sort.iter().position(|c| *c == category)
    }
}

/// Incoming data wins; the extra payload keeps whichever id is present
pub fn right_biased_merge<T: Clone>(existing: &TagListEntry<T>, incoming: &TagListEntry<T>) -> (T, NodeExtra) {
    let extra = NodeExtra {
        id: incoming.extra.id.clone().or_else(|| existing.extra.id.clone()),
        inherited: incoming.extra.inherited,
    };
    (incoming.data.clone(), extra)
}

impl<T, C: fmt::Debug> fmt::Debug for TagTreeOptions<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TagTreeOptions")
            .field("order_independence", &self.order_independence)
            .field("order_sort", &self.order_sort)
            .finish_non_exhaustive()
    }
}
