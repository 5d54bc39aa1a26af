//! Maximum bipartite matching (Hopcroft–Karp).
//!
//! # Algorithm
//!
//! 1. BFS from every free santa builds a layered graph of shortest
//!    alternating paths
//! 2. DFS finds a maximal set of vertex-disjoint augmenting paths
//!    along those layers and flips them
//! 3. Repeat until no augmenting path exists
//!
//! Runs in `O(E * sqrt(V))`.
//!
//! # Reference
//!
//! Hopcroft, J. E. & Karp, R. M. (1973). "An n^{5/2} Algorithm for Maximum
//! Matchings in Bipartite Graphs", *SIAM Journal on Computing* 2(4), 225-231.

use std::collections::VecDeque;

const NIL: usize = usize::MAX;
const INF: usize = usize::MAX;

/// A matching between santa-roles (left) and recipient-roles (right).
///
/// Both sides are indexed `0..n` by participant index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matching {
    santa_to_recipient: Vec<Option<usize>>,
    recipient_to_santa: Vec<Option<usize>>,
    size: usize,
}

impl Matching {
    /// Number of matched pairs.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Whether every participant gives and receives.
    pub fn is_perfect(&self) -> bool {
        self.size == self.santa_to_recipient.len()
    }

    pub fn recipient_of(&self, santa: usize) -> Option<usize> {
        self.santa_to_recipient[santa]
    }

    pub fn santa_of(&self, recipient: usize) -> Option<usize> {
        self.recipient_to_santa[recipient]
    }

    /// Santas left without a recipient.
    pub fn unmatched_santas(&self) -> impl Iterator<Item = usize> + '_ {
        self.santa_to_recipient
            .iter()
            .enumerate()
            .filter_map(|(s, r)| r.is_none().then_some(s))
    }

    /// `perm[santa] = recipient`, if the matching is perfect.
    pub fn to_permutation(&self) -> Option<Vec<usize>> {
        self.santa_to_recipient.iter().copied().collect()
    }
}

/// Computes a maximum matching over the given santas.
///
/// `n` is the number of participants (size of each side). Only santas in
/// `santas` take part; everyone on the right side is available. Neighbors
/// are visited in the order `neighbors` returns them, so the result is
/// deterministic for a fixed adjacency order.
pub fn maximum_matching<'a, F>(n: usize, santas: &[usize], neighbors: F) -> Matching
where
    F: Fn(usize) -> &'a [usize],
{
    let mut hk = HopcroftKarp {
        neighbors,
        pair_santa: vec![NIL; n],
        pair_recipient: vec![NIL; n],
        dist: vec![INF; n],
    };

    let mut size = 0;
    while hk.layer(santas) {
        for &s in santas {
            if hk.pair_santa[s] == NIL && hk.augment(s) {
                size += 1;
            }
        }
    }

    let wrap = |v: usize| (v != NIL).then_some(v);
    Matching {
        santa_to_recipient: hk.pair_santa.into_iter().map(wrap).collect(),
        recipient_to_santa: hk.pair_recipient.into_iter().map(wrap).collect(),
        size,
    }
}

struct HopcroftKarp<F> {
    neighbors: F,
    pair_santa: Vec<usize>,
    pair_recipient: Vec<usize>,
    dist: Vec<usize>,
}

impl<'a, F> HopcroftKarp<F>
where
    F: Fn(usize) -> &'a [usize],
{
    /// Builds BFS layers. Returns true if some free recipient is reachable.
    fn layer(&mut self, santas: &[usize]) -> bool {
        let mut queue = VecDeque::new();
        for d in self.dist.iter_mut() {
            *d = INF;
        }
        for &s in santas {
            if self.pair_santa[s] == NIL {
                self.dist[s] = 0;
                queue.push_back(s);
            }
        }

        let mut found = false;
        while let Some(s) = queue.pop_front() {
            for &r in (self.neighbors)(s) {
                let next = self.pair_recipient[r];
                if next == NIL {
                    found = true;
                } else if self.dist[next] == INF {
                    self.dist[next] = self.dist[s] + 1;
                    queue.push_back(next);
                }
            }
        }
        found
    }

    fn augment(&mut self, s: usize) -> bool {
        for &r in (self.neighbors)(s) {
            let next = self.pair_recipient[r];
            let extends = next == NIL
                || (self.dist[next] == self.dist[s].wrapping_add(1) && self.augment(next));
            if extends {
                self.pair_santa[s] = r;
                self.pair_recipient[r] = s;
                return true;
            }
        }
        self.dist[s] = INF;
        false
    }
}
