use core::iter::FromIterator;
use serde::{Deserialize, Serialize};
use crate::index_box::IndexBox;
use crate::index_type::IndexType;
use crate::int_vect::IntVect;




/**
 * An ordered sequence of boxes sharing one index type. This is the plain
 * aggregate from which a `BoxArray` is built; it has no spatial index, so
 * its geometric queries are brute force.
 */
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoxList<const D: usize> {
    boxes: Vec<IndexBox<D>>,
    typ: IndexType<D>,
}




// ============================================================================
impl<const D: usize> BoxList<D> {


    pub fn new() -> Self {
        Self::with_type(IndexType::cell())
    }


    pub fn with_type(typ: IndexType<D>) -> Self {
        Self { boxes: Vec::new(), typ }
    }


    pub fn ix_type(&self) -> IndexType<D> {
        self.typ
    }


    pub fn len(&self) -> usize {
        self.boxes.len()
    }


    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }


    /**
     * Append a box. The first box pushed onto an empty list sets the list's
     * index type.
     */
    pub fn push(&mut self, b: IndexBox<D>) {
        if self.boxes.is_empty() {
            self.typ = b.ix_type()
        }
        self.boxes.push(b)
    }


    pub fn append(&mut self, other: Self) {
        for b in other {
            self.push(b)
        }
    }


    pub fn iter(&self) -> impl Iterator<Item = &IndexBox<D>> + '_ {
        self.boxes.iter()
    }


    pub fn as_slice(&self) -> &[IndexBox<D>] {
        &self.boxes
    }


    pub fn into_vec(self) -> Vec<IndexBox<D>> {
        self.boxes
    }


    /**
     * Return the total number of indexes in all the boxes, counting overlaps
     * more than once.
     */
    pub fn num_pts(&self) -> i64 {
        self.boxes.iter().map(IndexBox::num_pts).sum()
    }


    /**
     * Return the smallest box containing every non-empty box in the list, or
     * `None` if there is none.
     */
    pub fn minimal_box(&self) -> Option<IndexBox<D>> {
        self.boxes
            .iter()
            .filter(|b| !b.is_empty())
            .fold(None, |acc: Option<IndexBox<D>>, b| {
                Some(acc.map_or(*b, |a| a.bounding(b)))
            })
    }


    /**
     * Determine whether no two boxes in the list overlap. This is a pairwise
     * scan; `BoxArray::is_disjoint` is the indexed version.
     */
    pub fn is_disjoint(&self) -> bool {
        self.boxes
            .iter()
            .enumerate()
            .all(|(i, a)| self.boxes[i + 1..].iter().all(|b| !a.intersects(b)))
    }


    /**
     * Remove empty boxes, keeping the order of the others.
     */
    pub fn remove_empty(&mut self) {
        self.boxes.retain(|b| !b.is_empty())
    }


    /**
     * Return the part of `domain` not covered by any box in this list.
     */
    pub fn complement_in(&self, domain: &IndexBox<D>) -> Self {
        let mut leftover = Self::with_type(domain.ix_type());

        if !domain.is_empty() {
            leftover.push(*domain);
        }
        for b in &self.boxes {
            if leftover.is_empty() {
                break;
            }
            let mut next = Self::with_type(domain.ix_type());
            next.extend(leftover.into_iter().flat_map(|l| l.difference(b)));
            leftover = next;
        }
        leftover
    }


    /**
     * Split boxes until none of them is longer than `block` on any axis. A
     * box that is too long is bisected along its longest offending axis, at
     * a position which keeps both halves splittable into full-size blocks
     * where possible, and the halves are split recursively. The pieces of
     * each box replace it in place, so the list order is preserved.
     */
    pub fn max_size(&mut self, block: IntVect<D>) {
        debug_assert!(block.all_ge(&IntVect::unit()), "block size must be positive");

        let mut pieces = Vec::with_capacity(self.boxes.len());

        for b in &self.boxes {
            split_into_blocks(*b, block, &mut pieces)
        }
        self.boxes = pieces;
    }


    /**
     * Merge pairs of boxes that abut along one axis and have identical
     * extents on the others, until no such pair remains. Returns the number
     * of merges done. The covered index set is unchanged.
     */
    pub fn simplify(&mut self) -> usize {
        let mut merged = 0;

        loop {
            let before = merged;
            let mut i = 0;

            while i < self.boxes.len() {
                let mut j = i + 1;

                while j < self.boxes.len() {
                    if let Some(joined) = join(&self.boxes[i], &self.boxes[j]) {
                        self.boxes[i] = joined;
                        self.boxes.remove(j);
                        merged += 1;
                        j = i + 1;
                    } else {
                        j += 1;
                    }
                }
                i += 1;
            }
            if merged == before {
                return merged;
            }
        }
    }
}




/**
 * Return the union of two boxes if it is itself a box: they share the same
 * cross-section and touch end-to-end on exactly one axis.
 */
fn join<const D: usize>(a: &IndexBox<D>, b: &IndexBox<D>) -> Option<IndexBox<D>> {
    if a.ix_type() != b.ix_type() || a.is_empty() || b.is_empty() {
        return None;
    }
    let (alo, ahi) = (a.small_end(), a.big_end());
    let (blo, bhi) = (b.small_end(), b.big_end());
    let mut axis = None;

    for d in 0..D {
        if alo[d] == blo[d] && ahi[d] == bhi[d] {
            continue;
        }
        if axis.is_some() {
            return None;
        }
        axis = Some(d);
    }
    let d = match axis {
        Some(d) => d,
        None => return Some(*a),
    };
    let gap = if a.ix_type().node_centered(d) { 0 } else { 1 };

    if ahi[d] + gap == blo[d] {
        Some(IndexBox::from_corners(alo, bhi, a.ix_type()))
    } else if bhi[d] + gap == alo[d] {
        Some(IndexBox::from_corners(blo, ahi, a.ix_type()))
    } else {
        None
    }
}




fn split_into_blocks<const D: usize>(b: IndexBox<D>, block: IntVect<D>, out: &mut Vec<IndexBox<D>>) {
    let cells = b.enclosed_cells().length();
    let mut axis = None;

    for d in 0..D {
        if cells[d] > block[d] && axis.map_or(true, |a: usize| cells[d] > cells[a]) {
            axis = Some(d)
        }
    }

    match axis {
        None => out.push(b),
        Some(d) => {
            let num_blocks = (cells[d] + block[d] - 1) / block[d];
            let lower_cells = cells[d] * (num_blocks / 2) / num_blocks;
            let (lower, upper) = b.chop(d, b.small_end()[d] + lower_cells);
            split_into_blocks(lower, block, out);
            split_into_blocks(upper, block, out);
        }
    }
}




// ============================================================================
impl<const D: usize> Default for BoxList<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const D: usize> From<Vec<IndexBox<D>>> for BoxList<D> {
    fn from(boxes: Vec<IndexBox<D>>) -> Self {
        boxes.into_iter().collect()
    }
}

impl<const D: usize> IntoIterator for BoxList<D> {
    type Item = IndexBox<D>;
    type IntoIter = std::vec::IntoIter<IndexBox<D>>;

    fn into_iter(self) -> Self::IntoIter {
        self.boxes.into_iter()
    }
}

impl<'a, const D: usize> IntoIterator for &'a BoxList<D> {
    type Item = &'a IndexBox<D>;
    type IntoIter = core::slice::Iter<'a, IndexBox<D>>;

    fn into_iter(self) -> Self::IntoIter {
        self.boxes.iter()
    }
}

impl<const D: usize> FromIterator<IndexBox<D>> for BoxList<D> {
    fn from_iter<I: IntoIterator<Item = IndexBox<D>>>(iter: I) -> Self {
        let mut result = Self::new();

        for b in iter {
            result.push(b);
        }
        result
    }
}

impl<const D: usize> Extend<IndexBox<D>> for BoxList<D> {
    fn extend<I: IntoIterator<Item = IndexBox<D>>>(&mut self, iter: I) {
        for b in iter {
            self.push(b)
        }
    }
}




// ============================================================================
#[cfg(test)]
mod test {

    use super::BoxList;
    use crate::index_box::IndexBox;
    use crate::int_vect::IntVect;

    #[test]
    fn max_size_splits_into_a_disjoint_cover() {
        let mut list: BoxList<2> = vec![IndexBox::new([0, 0], [5, 5])].into();
        list.max_size(IntVect::splat(2));
        assert_eq!(list.len(), 9);
        assert_eq!(list.num_pts(), 36);
        assert!(list.is_disjoint());
        assert!(list.iter().all(|b| b.length().all_le(&IntVect::splat(2))));
    }

    #[test]
    fn max_size_handles_uneven_lengths() {
        let mut list: BoxList<2> = vec![IndexBox::new([0, 0], [6, 2]), IndexBox::new([10, 10], [11, 11])].into();
        list.max_size(IntVect::new([3, 3]));
        assert_eq!(list.len(), 4);
        assert_eq!(list.num_pts(), 25);
        assert!(list.is_disjoint());
        assert!(list.iter().all(|b| b.length().all_le(&IntVect::splat(3))));
        assert_eq!(list.as_slice()[3], IndexBox::new([10, 10], [11, 11]));
    }

    #[test]
    fn simplify_merges_adjacent_boxes() {
        let mut list: BoxList<2> = vec![
            IndexBox::new([0, 0], [1, 3]),
            IndexBox::new([4, 0], [5, 3]),
            IndexBox::new([2, 0], [3, 3]),
            IndexBox::new([0, 5], [5, 6]),
        ].into();
        assert_eq!(list.simplify(), 2);
        assert_eq!(list.len(), 2);
        assert_eq!(list.as_slice()[0], IndexBox::new([0, 0], [5, 3]));
        assert_eq!(list.simplify(), 0);
    }

    #[test]
    fn simplify_joins_nodes_sharing_a_face() {
        let a = IndexBox::new([0, 0], [1, 1]).surrounding_nodes();
        let b = IndexBox::new([2, 0], [3, 1]).surrounding_nodes();
        let mut list: BoxList<2> = vec![a, b].into();
        assert_eq!(list.simplify(), 1);
        assert_eq!(list.as_slice()[0], IndexBox::new([0, 0], [3, 1]).surrounding_nodes());
    }

    #[test]
    fn complement_in_a_domain() {
        let list: BoxList<2> = vec![IndexBox::new([0, 0], [3, 3]), IndexBox::new([2, 2], [5, 5])].into();
        let rest = list.complement_in(&IndexBox::new([0, 0], [5, 5]));
        assert_eq!(rest.num_pts(), 36 - 28);
        assert!(rest.is_disjoint());
        assert!(list.complement_in(&IndexBox::new([1, 1], [2, 2])).is_empty());
        assert_eq!(list.minimal_box(), Some(IndexBox::new([0, 0], [5, 5])));
        assert_eq!(BoxList::<2>::new().minimal_box(), None);
    }
}
