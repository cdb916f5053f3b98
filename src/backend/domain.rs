use im::OrdSet;

/// The set of solver integers a backend variable may still take.
///
/// Backed by a persistent ordered set, so cloning a domain (and therefore a
/// whole [`Space`](crate::backend::space::Space)) is cheap and pruning
/// produces a new domain instead of mutating the old one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Domain(OrdSet<i64>);

impl Domain {
    /// The contiguous domain `lower..=upper`; empty when `lower > upper`.
    pub fn range(lower: i64, upper: i64) -> Self {
        Self((lower..=upper).collect())
    }

    pub fn from_values(values: impl IntoIterator<Item = i64>) -> Self {
        Self(values.into_iter().collect())
    }

    pub fn singleton(value: i64) -> Self {
        Self(OrdSet::unit(value))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_singleton(&self) -> bool {
        self.0.len() == 1
    }

    /// If the domain is a singleton, returns the single value.
    pub fn singleton_value(&self) -> Option<i64> {
        if self.is_singleton() {
            self.0.get_min().copied()
        } else {
            None
        }
    }

    pub fn min(&self) -> Option<i64> {
        self.0.get_min().copied()
    }

    pub fn max(&self) -> Option<i64> {
        self.0.get_max().copied()
    }

    pub fn contains(&self, value: i64) -> bool {
        self.0.contains(&value)
    }

    pub fn iter(&self) -> impl Iterator<Item = i64> + '_ {
        self.0.iter().copied()
    }

    /// A new domain keeping only the values that satisfy the predicate.
    pub fn retain(&self, keep: impl Fn(i64) -> bool) -> Self {
        Self(self.0.iter().copied().filter(|&v| keep(v)).collect())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn range_is_inclusive() {
        let domain = Domain::range(3, 5);
        assert_eq!(domain.iter().collect::<Vec<_>>(), vec![3, 4, 5]);
        assert_eq!(domain.min(), Some(3));
        assert_eq!(domain.max(), Some(5));
    }

    #[test]
    fn inverted_range_is_empty() {
        assert!(Domain::range(5, 3).is_empty());
    }

    #[test]
    fn singleton_value_requires_exactly_one_element() {
        assert_eq!(Domain::singleton(7).singleton_value(), Some(7));
        assert_eq!(Domain::range(1, 2).singleton_value(), None);
    }

    #[test]
    fn retain_filters_without_mutating() {
        let domain = Domain::range(1, 6);
        let evens = domain.retain(|v| v % 2 == 0);
        assert_eq!(evens.iter().collect::<Vec<_>>(), vec![2, 4, 6]);
        assert_eq!(domain.len(), 6);
    }
}
