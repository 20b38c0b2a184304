//! Splits the crossing polytope of a hypercube into tetrahedra.
//!
//! The boundary of the polytope is a closed polyhedral surface whose faces
//! lie in the eight 3-cube facets of the hypercube. It is triangulated and
//! every triangle is closed into a tetrahedron by the centroid of the cuts.
//!
//! Corners of the polytope with exactly three neighbours are cut off first,
//! giving the three triangles around them. What is left open in each facet is
//! closed by clipping ears off the ring of open pairs. The search depends on
//! the order in which cuts are visited, so it is retried with rotated,
//! reversed and shuffled orders before a permissive pass takes whatever it
//! finds.

use rand::{rngs::SmallRng, seq::SliceRandom, SeedableRng};

use super::{
    adjacency::{facets, relation, Relation, EDGES},
    cuts::Cut,
};

const SHUFFLES: usize = 5;

/// At most one cut per edge.
const MAX_CUTS: usize = EDGES.len();

/// Slot of the triangles lying in no single facet.
const NO_FACET: usize = 8;

type PairCount = [[u8; MAX_CUTS]; MAX_CUTS];

/// Triangle of cut indices, closed by the centroid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tetrahedron {
    pub cuts: [usize; 3],
}

#[derive(Clone, Debug)]
pub struct TetraOutcome {
    pub tetrahedra: Vec<Tetrahedron>,
    /// Every facet was closed without relaxing the matching rules.
    pub closed: bool,
    /// Pairs of cuts bordering a single tetrahedron.
    pub single_edges: usize,
}

/// Tetrahedron counts of a well-formed crossing with `n` cuts.
pub fn canonical_counts(n: usize) -> Option<&'static [usize]> {
    match n {
        6 => Some(&[8]),
        8 => Some(&[12]),
        10 => Some(&[15, 16]),
        12 => Some(&[19, 20, 21]),
        _ => None,
    }
}

/// Deterministic generator for the retries of cell (ix, iy, ieta).
pub fn cell_rng(ix: usize, iy: usize, ieta: usize) -> SmallRng {
    let seed = (ix as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15)
        ^ (iy as u64).wrapping_mul(0xc2b2_ae3d_27d4_eb4f)
        ^ (ieta as u64).wrapping_mul(0x1656_67b1_9e37_79f9);
    SmallRng::seed_from_u64(seed)
}

fn pair(a: usize, b: usize) -> (usize, usize) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

/// One attempt over a fixed visiting order.
struct Pass<'a> {
    edges: Vec<usize>,
    order: &'a [usize],
    permissive: bool,
    usage: [PairCount; 9], // per facet, then NO_FACET
    total: PairCount,
    tetrahedra: Vec<Tetrahedron>,
}

impl<'a> Pass<'a> {
    fn new(cuts: &[Cut], order: &'a [usize], permissive: bool) -> Pass<'a> {
        Pass {
            edges: cuts.iter().map(|c| c.edge).collect(),
            order,
            permissive,
            usage: [[[0; MAX_CUTS]; MAX_CUTS]; 9],
            total: [[0; MAX_CUTS]; MAX_CUTS],
            tetrahedra: vec![],
        }
    }

    fn relation(&self, i: usize, j: usize) -> Relation {
        relation(self.edges[i], self.edges[j])
    }

    /// Lowest facet containing all three cuts.
    fn common_facet(&self, tri: [usize; 3]) -> Option<usize> {
        let mask = tri.iter().fold(0xffu8, |m, &i| m & facets(self.edges[i]));
        if mask == 0 {
            None
        } else {
            Some(mask.trailing_zeros() as usize)
        }
    }

    fn emit(&mut self, tri: [usize; 3], facet: Option<usize>) {
        let [a, b, c] = tri;
        let slot = facet.unwrap_or(NO_FACET);
        for (i, j) in [pair(a, b), pair(b, c), pair(a, c)] {
            self.usage[slot][i][j] += 1;
            self.total[i][j] += 1;
        }
        self.tetrahedra.push(Tetrahedron { cuts: tri });
    }

    fn used(&self, facet: usize, (i, j): (usize, usize)) -> u8 {
        self.usage[facet][i][j]
    }

    fn total(&self, (i, j): (usize, usize)) -> u8 {
        self.total[i][j]
    }

    /// Cuts with exactly three polytope neighbours are closed by the three
    /// triangles around them.
    fn cut_corners(&mut self) {
        let n = self.edges.len();
        let mut blocked = vec![false; n];
        for &i in self.order {
            let mut neighbours: Vec<usize> = self
                .order
                .iter()
                .copied()
                .filter(|&j| self.relation(i, j) == Relation::SharedFace)
                .collect();
            neighbours.extend(
                self.order
                    .iter()
                    .copied()
                    .filter(|&j| self.relation(i, j) == Relation::OppositeOnFace),
            );
            if neighbours.len() != 3 || blocked[i] {
                continue;
            }
            let [a, b, c] = [neighbours[0], neighbours[1], neighbours[2]];
            for k in [i, a, b, c] {
                blocked[k] = true;
            }
            for tri in [[i, a, b], [i, a, c], [i, b, c]] {
                let facet = self.common_facet(tri);
                self.emit(tri, facet);
            }
        }
    }

    /// Clips ears off the open pairs of every facet. False when a facet is
    /// left open.
    fn close_facets(&mut self) -> bool {
        let n = self.edges.len();
        for facet in 0..8 {
            let members: Vec<usize> = self
                .order
                .iter()
                .copied()
                .filter(|&i| facets(self.edges[i]) & (1 << facet) != 0)
                .collect();
            loop {
                let mut open: Vec<Vec<usize>> = vec![vec![]; n];
                for (p, &i) in members.iter().enumerate() {
                    for &j in members[p + 1..].iter() {
                        let side = self.relation(i, j).is_neighbor() as u8;
                        if side + self.used(facet, pair(i, j)) == 1 {
                            open[i].push(j);
                            open[j].push(i);
                        }
                    }
                }
                if open.iter().all(|o| o.is_empty()) {
                    break;
                }
                match self.find_ear(&members, &open) {
                    Some(tri) => self.emit(tri, Some(facet)),
                    None => return false,
                }
            }
        }
        true
    }

    fn find_ear(&self, members: &[usize], open: &[Vec<usize>]) -> Option<[usize; 3]> {
        members.iter().find_map(|&b| {
            let degree = open[b].len();
            if degree < 2 || (degree > 2 && !self.permissive) {
                return None;
            }
            let (a, c) = (open[b][0], open[b][1]);
            let linked = self.relation(a, c) != Relation::Unrelated || self.permissive;
            let saturated = [pair(a, b), pair(b, c), pair(a, c)]
                .iter()
                .any(|&p| self.total(p) >= 2);
            if linked && !saturated {
                Some([a, b, c])
            } else {
                None
            }
        })
    }

    fn single_edges(&self) -> usize {
        let n = self.edges.len();
        (0..n)
            .flat_map(|i| (i + 1..n).map(move |j| (i, j)))
            .filter(|&(i, j)| self.total[i][j] == 1)
            .count()
    }
}

fn attempt(cuts: &[Cut], order: &[usize], permissive: bool) -> (TetraOutcome, bool) {
    let mut pass = Pass::new(cuts, order, permissive);
    pass.cut_corners();
    let closed = pass.close_facets();
    let single_edges = pass.single_edges();
    let outcome = TetraOutcome {
        tetrahedra: pass.tetrahedra,
        closed: closed && !permissive,
        single_edges,
    };
    (outcome, closed)
}

/// Triangulates the boundary of the crossing described by `cuts`.
///
/// Never fails: a configuration no order can close yields the partial result
/// of the permissive pass with `closed == false`. Fewer than three cuts, or
/// more than one per edge, give no tetrahedra.
pub fn tetrahedralize(cuts: &[Cut], rng: &mut SmallRng) -> TetraOutcome {
    let n = cuts.len();
    if n < 3 || n > MAX_CUTS {
        return TetraOutcome {
            tetrahedra: vec![],
            closed: false,
            single_edges: 0,
        };
    }

    for a in 0..2 * n {
        let mut order: Vec<usize> = (0..n).map(|m| (m + a % n) % n).collect();
        if a >= n {
            order.reverse();
        }
        let (outcome, closed) = attempt(cuts, &order, false);
        if closed {
            return outcome;
        }
    }

    for _ in 0..SHUFFLES {
        let mut order: Vec<usize> = (0..n).collect();
        order.shuffle(rng);
        let (outcome, closed) = attempt(cuts, &order, false);
        if closed {
            return outcome;
        }
    }

    let order: Vec<usize> = (0..n).collect();
    attempt(cuts, &order, true).0
}
