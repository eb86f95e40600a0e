//! Longest common subsequence by Myers' O((N+M)·D) algorithm.
//!
//! Uses the linear-space divide-and-conquer variant: find the middle snake
//! of the edit graph by searching from both ends, then recurse on the two
//! halves. Common prefixes and suffixes are stripped at every level.
//!
//! Paths are kept inside the edit graph, so a diagonal that cannot be
//! reached with `d` edits is marked [`UNREACHED`].

use std::ops::{Index, IndexMut, Range};

const UNREACHED: isize = -1;

/// Matched `(old_index, new_index)` pairs of a longest common subsequence,
/// in ascending order on both sides.
///
/// `eq(i, j)` decides whether `old[i]` and `new[j]` match.
pub(crate) fn common_pairs<F>(old_len: usize, new_len: usize, eq: F) -> Vec<(usize, usize)>
where
    F: Fn(usize, usize) -> bool,
{
    let max_d = (old_len + new_len).div_ceil(2) + 1;
    let mut forward = V::new(max_d);
    let mut backward = V::new(max_d);
    let mut pairs = Vec::new();
    conquer(
        &eq,
        0..old_len,
        0..new_len,
        &mut forward,
        &mut backward,
        &mut pairs,
    );
    pairs
}

/// Furthest-reaching x per diagonal `k = x - y`.
struct V {
    offset: isize,
    values: Vec<isize>,
}

impl V {
    fn new(max_d: usize) -> Self {
        Self {
            offset: max_d as isize + 1,
            values: vec![UNREACHED; 2 * max_d + 3],
        }
    }
}

impl Index<isize> for V {
    type Output = isize;

    fn index(&self, k: isize) -> &isize {
        &self.values[(k + self.offset) as usize]
    }
}

impl IndexMut<isize> for V {
    fn index_mut(&mut self, k: isize) -> &mut isize {
        &mut self.values[(k + self.offset) as usize]
    }
}

fn conquer<F>(
    eq: &F,
    mut old: Range<usize>,
    mut new: Range<usize>,
    forward: &mut V,
    backward: &mut V,
    pairs: &mut Vec<(usize, usize)>,
) where
    F: Fn(usize, usize) -> bool,
{
    let prefix = common_prefix_len(eq, old.clone(), new.clone());
    pairs.extend((0..prefix).map(|i| (old.start + i, new.start + i)));
    old.start += prefix;
    new.start += prefix;

    let suffix = common_suffix_len(eq, old.clone(), new.clone());
    old.end -= suffix;
    new.end -= suffix;

    if !old.is_empty() && !new.is_empty() {
        if let Some((x, y)) = find_middle_snake(eq, old.clone(), new.clone(), forward, backward) {
            let degenerate = (x == old.start && y == new.start) || (x == old.end && y == new.end);
            if !degenerate {
                conquer(eq, old.start..x, new.start..y, forward, backward, pairs);
                conquer(eq, x..old.end, y..new.end, forward, backward, pairs);
            }
        }
    }

    pairs.extend((0..suffix).map(|i| (old.end + i, new.end + i)));
}

/// Find the start of the middle snake, in absolute coordinates.
fn find_middle_snake<F>(
    eq: &F,
    old: Range<usize>,
    new: Range<usize>,
    forward: &mut V,
    backward: &mut V,
) -> Option<(usize, usize)>
where
    F: Fn(usize, usize) -> bool,
{
    let n = old.len() as isize;
    let m = new.len() as isize;
    let delta = n - m;
    let odd = delta & 1 == 1;
    let d_max = (n + m + 1) / 2;

    for d in 0..=d_max {
        for k in (-d..=d).step_by(2) {
            let Some(mut x) = next_x(forward, k, d, n, m) else {
                forward[k] = UNREACHED;
                continue;
            };
            let (x0, y0) = (x, x - k);
            x += common_prefix_len(
                eq,
                old.start + x0 as usize..old.end,
                new.start + y0 as usize..new.end,
            ) as isize;
            forward[k] = x;

            if odd && (delta - k).abs() < d {
                let reverse_x = backward[delta - k];
                if reverse_x != UNREACHED && x + reverse_x >= n {
                    return Some((old.start + x0 as usize, new.start + y0 as usize));
                }
            }
        }

        // Backward search runs on the reversed sequences.
        for k in (-d..=d).step_by(2) {
            let Some(mut x) = next_x(backward, k, d, n, m) else {
                backward[k] = UNREACHED;
                continue;
            };
            let mut y = x - k;
            let slide = common_suffix_len(
                eq,
                old.start..old.start + (n - x) as usize,
                new.start..new.start + (m - y) as usize,
            ) as isize;
            x += slide;
            y += slide;
            backward[k] = x;

            if !odd && (delta - k).abs() <= d {
                let forward_x = forward[delta - k];
                if forward_x != UNREACHED && x + forward_x >= n {
                    return Some((old.start + (n - x) as usize, new.start + (m - y) as usize));
                }
            }
        }
    }
    None
}

/// The x reached on diagonal `k` after one more edit, staying inside an
/// `n` by `m` edit graph.
fn next_x(v: &V, k: isize, d: isize, n: isize, m: isize) -> Option<isize> {
    if d == 0 {
        return Some(0);
    }
    // Down from diagonal k + 1 keeps x and adds one to y.
    let down = if k < d {
        let x = v[k + 1];
        (x != UNREACHED && x - (k + 1) < m).then_some(x)
    } else {
        None
    };
    // Right from diagonal k - 1 adds one to x.
    let right = if k > -d {
        let x = v[k - 1];
        (x != UNREACHED && x < n).then_some(x + 1)
    } else {
        None
    };
    down.max(right)
}

fn common_prefix_len<F>(eq: &F, old: Range<usize>, new: Range<usize>) -> usize
where
    F: Fn(usize, usize) -> bool,
{
    old.zip(new).take_while(|&(i, j)| eq(i, j)).count()
}

fn common_suffix_len<F>(eq: &F, old: Range<usize>, new: Range<usize>) -> usize
where
    F: Fn(usize, usize) -> bool,
{
    old.rev().zip(new.rev()).take_while(|&(i, j)| eq(i, j)).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lcs(a: &str, b: &str) -> Vec<(usize, usize)> {
        let a: Vec<char> = a.chars().collect();
        let b: Vec<char> = b.chars().collect();
        common_pairs(a.len(), b.len(), |i, j| a[i] == b[j])
    }

    fn lcs_len_by_table(a: &[char], b: &[char]) -> usize {
        let mut table = vec![vec![0usize; b.len() + 1]; a.len() + 1];
        for i in (0..a.len()).rev() {
            for j in (0..b.len()).rev() {
                table[i][j] = if a[i] == b[j] {
                    table[i + 1][j + 1] + 1
                } else {
                    table[i + 1][j].max(table[i][j + 1])
                };
            }
        }
        table[0][0]
    }

    fn assert_valid_and_longest(a: &str, b: &str) {
        let pairs = lcs(a, b);
        let ac: Vec<char> = a.chars().collect();
        let bc: Vec<char> = b.chars().collect();

        for window in pairs.windows(2) {
            assert!(window[0].0 < window[1].0 && window[0].1 < window[1].1);
        }
        for &(i, j) in &pairs {
            assert_eq!(ac[i], bc[j]);
        }
        assert_eq!(pairs.len(), lcs_len_by_table(&ac, &bc), "{a:?} vs {b:?}");
    }

    #[test]
    fn test_empty_inputs() {
        assert!(lcs("", "").is_empty());
        assert!(lcs("abc", "").is_empty());
        assert!(lcs("", "abc").is_empty());
    }

    #[test]
    fn test_identical() {
        assert_eq!(lcs("abc", "abc"), vec![(0, 0), (1, 1), (2, 2)]);
    }

    #[test]
    fn test_single_edit() {
        assert_eq!(lcs("abc", "ac"), vec![(0, 0), (2, 1)]);
        assert_eq!(lcs("ac", "abc"), vec![(0, 0), (1, 2)]);
    }

    #[test]
    fn test_rotation() {
        assert_eq!(lcs("abc", "cab"), vec![(0, 1), (1, 2)]);
    }

    #[test]
    fn test_longest_against_table() {
        let cases = [
            ("abcabba", "cbabac"),
            ("xyz", "abc"),
            ("aaaa", "aa"),
            ("abcdefg", "gfedcba"),
            ("a", "b"),
            ("ab", "ba"),
            ("abcde", "xaxbxcxdxex"),
            ("kitten", "sitting"),
            ("mississippi", "misisipi"),
            ("acbdeacbed", "acebdabbabed"),
        ];
        for (a, b) in cases {
            assert_valid_and_longest(a, b);
            assert_valid_and_longest(b, a);
        }
    }
}
