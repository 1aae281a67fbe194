//! Integer partitions, compositions and multiset permutations.
//!
//! The derivative engine asks for the same enumerations over and over while
//! building one high-order term, so every generator is memoized in a
//! thread-local cache and hands out shared `Rc` slices.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tracing::trace;

type Cache<K> = RefCell<HashMap<K, Rc<Vec<Vec<usize>>>>>;

thread_local! {
    static PARTITIONS: Cache<usize> = RefCell::new(HashMap::new());
    static COMPOSITIONS: Cache<(usize, usize)> = RefCell::new(HashMap::new());
    static PERMUTATIONS: Cache<Vec<usize>> = RefCell::new(HashMap::new());
}

fn memoized<K, F>(
    cache: &'static std::thread::LocalKey<Cache<K>>,
    key: K,
    build: F,
) -> Rc<Vec<Vec<usize>>>
where
    K: std::hash::Hash + Eq + Clone + std::fmt::Debug,
    F: FnOnce(&K) -> Vec<Vec<usize>>,
{
    if let Some(hit) = cache.with(|c| c.borrow().get(&key).cloned()) {
        return hit;
    }
    trace!(?key, "enumeration cache miss");
    let value = Rc::new(build(&key));
    cache.with(|c| c.borrow_mut().insert(key, Rc::clone(&value)));
    value
}

/// Partitions of `n` into positive parts.
///
/// Parts are non-increasing; partitions are grouped by length (fewest parts
/// first) and ordered lexicographically descending within a length. `n = 0`
/// has no partitions with positive parts.
///
/// # Examples
///
/// ```
/// use ndtaylor::combinatorics::integer_partitions;
///
/// let parts = integer_partitions(4);
/// assert_eq!(
///     *parts,
///     vec![vec![4], vec![3, 1], vec![2, 2], vec![2, 1, 1], vec![1, 1, 1, 1]]
/// );
/// ```
pub fn integer_partitions(n: usize) -> Rc<Vec<Vec<usize>>> {
    memoized(&PARTITIONS, n, |&n| {
        let mut out = Vec::new();
        for len in 1..=n {
            let mut current = Vec::with_capacity(len);
            partitions_of_len(n, len, n, &mut current, &mut out);
        }
        out
    })
}

fn partitions_of_len(
    remaining: usize,
    len: usize,
    max_part: usize,
    current: &mut Vec<usize>,
    out: &mut Vec<Vec<usize>>,
) {
    if len == 0 {
        if remaining == 0 {
            out.push(current.clone());
        }
        return;
    }
    // Leave at least one unit for each of the remaining parts.
    let hi = max_part.min(remaining + 1 - len.min(remaining + 1));
    for part in (1..=hi).rev() {
        if part * len < remaining {
            break;
        }
        current.push(part);
        partitions_of_len(remaining - part, len - 1, part, current, out);
        current.pop();
    }
}

/// Ordered tuples of `parts` non-negative integers summing to `total`.
///
/// Tuples appear in lexicographically descending order.
///
/// # Examples
///
/// ```
/// use ndtaylor::combinatorics::compositions;
///
/// assert_eq!(*compositions(2, 2), vec![vec![2, 0], vec![1, 1], vec![0, 2]]);
/// assert_eq!(compositions(3, 3).len(), 10);
/// ```
pub fn compositions(total: usize, parts: usize) -> Rc<Vec<Vec<usize>>> {
    memoized(&COMPOSITIONS, (total, parts), |&(total, parts)| {
        let mut out = Vec::new();
        if parts > 0 {
            let mut current = Vec::with_capacity(parts);
            compositions_into(total, parts, &mut current, &mut out);
        }
        out
    })
}

fn compositions_into(
    remaining: usize,
    parts: usize,
    current: &mut Vec<usize>,
    out: &mut Vec<Vec<usize>>,
) {
    if parts == 1 {
        current.push(remaining);
        out.push(current.clone());
        current.pop();
        return;
    }
    for first in (0..=remaining).rev() {
        current.push(first);
        compositions_into(remaining - first, parts - 1, current, out);
        current.pop();
    }
}

/// Distinct permutations of a multiset of labels, in lexicographic order.
///
/// # Examples
///
/// ```
/// use ndtaylor::combinatorics::unique_permutations;
///
/// let perms = unique_permutations(&[1, 0, 0]);
/// assert_eq!(*perms, vec![vec![0, 0, 1], vec![0, 1, 0], vec![1, 0, 0]]);
/// ```
pub fn unique_permutations(labels: &[usize]) -> Rc<Vec<Vec<usize>>> {
    let mut key = labels.to_vec();
    key.sort_unstable();
    memoized(&PERMUTATIONS, key, |sorted| {
        let mut out = Vec::new();
        let mut current = sorted.clone();
        loop {
            out.push(current.clone());
            if !next_permutation(&mut current) {
                break;
            }
        }
        out
    })
}

/// Advance to the next lexicographic permutation; false once exhausted.
fn next_permutation(v: &mut [usize]) -> bool {
    let Some(i) = (1..v.len()).rev().find(|&i| v[i - 1] < v[i]) else {
        return false;
    };
    let pivot = i - 1;
    let Some(j) = (i..v.len()).rev().find(|&j| v[j] > v[pivot]) else {
        return false;
    };
    v.swap(pivot, j);
    v[i..].reverse();
    true
}

/// Number of distinct permutations of a multiset with the given class counts.
pub fn multiset_permutation_count(counts: &[usize]) -> f64 {
    let n: usize = counts.iter().sum();
    let mut value = 1.0;
    let mut k = 0;
    // Build n! / prod(c!) as a running product of binomials.
    for &c in counts {
        for i in 1..=c {
            k += 1;
            value *= k as f64 / i as f64;
        }
    }
    debug_assert_eq!(k, n);
    value
}
