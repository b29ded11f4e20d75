//! `DataSet<T>` — a lazy, possibly-partitioned sequence.
//!
//! QR (`numopt_math::qr`) and Levenberg–Marquardt
//! (`numopt_math::levenberg_marquardt`) are specified in terms of folding
//! over rows of data rather than over a concrete `Vec`, so that the same
//! reduction can run over an in-memory sequence or a partitioned backend
//! without changing the numerical kernel. This module defines that
//! contract and the single-partition, `Vec`-backed implementation every
//! solver in this crate is tested against.
//!
//! `aggregate`'s `comb_op` must be associative and commutative over
//! partition results, and the closures passed to `map`/`filter`/
//! `aggregate` must be pure — neither is enforced by the type system, only
//! documented as a precondition, the way `numopt_core::ensure!` documents
//! preconditions that are checked rather than encoded in types.

/// A lazy, possibly-partitioned sequence of `T`.
///
/// Implementors only need to guarantee that iteration order within a
/// single partition is deterministic; partitioning across workers is the
/// implementor's choice. No mutable state may be shared between
/// iterations or across aggregations.
pub trait DataSet<T> {
    /// Apply `f` to every element, returning a new data set.
    fn map<U, F: Fn(&T) -> U>(&self, f: F) -> VecDataSet<U>;

    /// Keep only elements for which `pred` returns `true`.
    fn filter<F: Fn(&T) -> bool>(&self, pred: F) -> VecDataSet<T>
    where
        T: Clone;

    /// Pair every element with its position, in a stable order.
    fn zip_with_index(&self) -> VecDataSet<(T, i64)>
    where
        T: Clone;

    /// Fold over the data set: `seq_op` accumulates within a partition,
    /// `comb_op` merges partition accumulators. `comb_op` must be
    /// associative and commutative for the result to be independent of
    /// how the data set happens to be partitioned.
    fn aggregate<A, S, C>(&self, zero: A, seq_op: S, comb_op: C) -> A
    where
        A: Clone,
        S: Fn(A, &T) -> A,
        C: Fn(A, A) -> A;

    /// Fold over the data set with a single associative operator.
    fn reduce<F: Fn(T, T) -> T>(&self, op: F) -> Option<T>
    where
        T: Clone;

    /// Materialize the data set as a `Vec`, preserving order.
    fn collect(&self) -> Vec<T>
    where
        T: Clone;

    /// Number of elements.
    fn size(&self) -> usize;

    /// Concatenate `self` with `other`, preserving the index ordering of
    /// `self` followed by `other` (`++`).
    fn concat(&self, other: &Self) -> VecDataSet<T>
    where
        T: Clone;
}

/// A single-partition, `Vec`-backed `DataSet`.
///
/// Satisfies the `DataSet` contract trivially: there is exactly one
/// partition, so `comb_op` is never actually invoked to merge anything,
/// and iteration order is just `Vec` order.
#[derive(Debug, Clone, Default)]
pub struct VecDataSet<T>(Vec<T>);

impl<T> VecDataSet<T> {
    /// Wrap a `Vec` as a single-partition data set.
    pub fn new(data: Vec<T>) -> Self {
        Self(data)
    }

    /// Borrow the underlying elements.
    pub fn as_slice(&self) -> &[T] {
        &self.0
    }

    /// Iterate over the underlying elements.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.0.iter()
    }
}

impl<T> From<Vec<T>> for VecDataSet<T> {
    fn from(data: Vec<T>) -> Self {
        Self(data)
    }
}

impl<T> DataSet<T> for VecDataSet<T> {
    fn map<U, F: Fn(&T) -> U>(&self, f: F) -> VecDataSet<U> {
        VecDataSet(self.0.iter().map(f).collect())
    }

    fn filter<F: Fn(&T) -> bool>(&self, pred: F) -> VecDataSet<T>
    where
        T: Clone,
    {
        VecDataSet(self.0.iter().filter(|t| pred(t)).cloned().collect())
    }

    fn zip_with_index(&self) -> VecDataSet<(T, i64)>
    where
        T: Clone,
    {
        VecDataSet(
            self.0
                .iter()
                .enumerate()
                .map(|(i, t)| (t.clone(), i as i64))
                .collect(),
        )
    }

    fn aggregate<A, S, C>(&self, zero: A, seq_op: S, _comb_op: C) -> A
    where
        A: Clone,
        S: Fn(A, &T) -> A,
        C: Fn(A, A) -> A,
    {
        // Single partition: seq_op folds the whole vector, comb_op never
        // needs to merge across partitions.
        self.0.iter().fold(zero, seq_op)
    }

    fn reduce<F: Fn(T, T) -> T>(&self, op: F) -> Option<T>
    where
        T: Clone,
    {
        let mut iter = self.0.iter().cloned();
        let first = iter.next()?;
        Some(iter.fold(first, op))
    }

    fn collect(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.0.clone()
    }

    fn size(&self) -> usize {
        self.0.len()
    }

    fn concat(&self, other: &Self) -> VecDataSet<T>
    where
        T: Clone,
    {
        let mut data = self.0.clone();
        data.extend(other.0.iter().cloned());
        VecDataSet(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_filter_collect() {
        let ds = VecDataSet::new(vec![1, 2, 3, 4, 5]);
        let doubled = ds.map(|x| x * 2);
        assert_eq!(doubled.collect(), vec![2, 4, 6, 8, 10]);

        let evens = ds.filter(|x| x % 2 == 0);
        assert_eq!(evens.collect(), vec![2, 4]);
    }

    #[test]
    fn zip_with_index_is_stable() {
        let ds = VecDataSet::new(vec!["a", "b", "c"]);
        assert_eq!(
            ds.zip_with_index().collect(),
            vec![("a", 0), ("b", 1), ("c", 2)]
        );
    }

    #[test]
    fn aggregate_sums() {
        let ds = VecDataSet::new(vec![1.0, 2.0, 3.0, 4.0]);
        let sum = ds.aggregate(0.0, |acc, x| acc + x, |a, b| a + b);
        assert_eq!(sum, 10.0);
    }

    #[test]
    fn reduce_and_size() {
        let ds = VecDataSet::new(vec![1, 2, 3]);
        assert_eq!(ds.reduce(|a, b| a + b), Some(6));
        assert_eq!(ds.size(), 3);
        assert_eq!(VecDataSet::<i32>::new(vec![]).reduce(|a, b| a + b), None);
    }

    #[test]
    fn concat_preserves_order() {
        let a = VecDataSet::new(vec![1, 2]);
        let b = VecDataSet::new(vec![3, 4]);
        assert_eq!(a.concat(&b).collect(), vec![1, 2, 3, 4]);
    }
}
