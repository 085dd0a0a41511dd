use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};
use crate::box_list::BoxList;
use crate::error::Error;
use crate::index_type::{Centering, IndexType};
use crate::int_vect::{IntVect, IntVectRange};




/**
 * Represents a rectangular region in a discrete index space. Both corners are
 * inclusive, so the box `(0,0)-(5,5)` spans six indexes on each axis. The
 * box carries an index type saying whether its indexes address cells or
 * nodes on each axis. A box whose big end is below its small end on any axis
 * is empty.
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexBox<const D: usize> {
    small: IntVect<D>,
    big: IntVect<D>,
    typ: IndexType<D>,
}




// ============================================================================
impl<const D: usize> IndexBox<D> {


    /**
     * Make a cell-centered box from its (inclusive) corners.
     */
    pub fn new(lo: [i64; D], hi: [i64; D]) -> Self {
        Self::from_corners(IntVect::new(lo), IntVect::new(hi), IndexType::cell())
    }


    pub fn from_corners(small: IntVect<D>, big: IntVect<D>, typ: IndexType<D>) -> Self {
        Self { small, big, typ }
    }


    /**
     * Return a cell-centered box that contains no indexes.
     */
    pub fn empty() -> Self {
        Self::empty_of(IndexType::cell())
    }


    pub fn empty_of(typ: IndexType<D>) -> Self {
        Self::from_corners(IntVect::zero(), IntVect::splat(-1), typ)
    }


    pub fn small_end(&self) -> IntVect<D> {
        self.small
    }


    pub fn big_end(&self) -> IntVect<D> {
        self.big
    }


    pub fn ix_type(&self) -> IndexType<D> {
        self.typ
    }


    pub fn is_empty(&self) -> bool {
        !self.small.all_le(&self.big)
    }


    /**
     * Return the number of indexes on each axis.
     */
    pub fn length(&self) -> IntVect<D> {
        self.big - self.small + IntVect::unit()
    }


    /**
     * Return the number of indexes in this box.
     */
    pub fn num_pts(&self) -> i64 {
        if self.is_empty() {
            0
        } else {
            self.length().product()
        }
    }


    /**
     * Determine whether this box contains the given index.
     */
    pub fn contains_point(&self, index: &IntVect<D>) -> bool {
        self.small.all_le(index) && index.all_le(&self.big)
    }


    /**
     * Determine whether another (non-empty) box is a subset of this one. The
     * index types are not compared.
     */
    pub fn contains(&self, other: &Self) -> bool {
        !other.is_empty() && self.contains_point(&other.small) && self.contains_point(&other.big)
    }


    pub fn intersects(&self, other: &Self) -> bool {
        self.small.max(other.small).all_le(&self.big.min(other.big))
    }


    /**
     * Return the overlap of two boxes, or `None` if they do not intersect. The
     * result has this box's index type.
     */
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        let small = self.small.max(other.small);
        let big = self.big.min(other.big);

        if small.all_le(&big) {
            Some(Self::from_corners(small, big, self.typ))
        } else {
            None
        }
    }


    /**
     * Return the smallest box containing both boxes. An empty box does not
     * contribute.
     */
    pub fn bounding(&self, other: &Self) -> Self {
        if self.is_empty() {
            *other
        } else if other.is_empty() {
            *self
        } else {
            Self::from_corners(self.small.min(other.small), self.big.max(other.big), self.typ)
        }
    }


    /**
     * Return this box mapped to an index space which is finer by the given
     * ratio. Each cell becomes `ratio` cells; each node maps onto a node.
     */
    pub fn refine(&self, ratio: IntVect<D>) -> Self {
        let mut big = self.big * ratio;

        for d in 0..D {
            if !self.typ.node_centered(d) {
                big[d] += ratio[d] - 1
            }
        }
        Self::from_corners(self.small * ratio, big, self.typ)
    }


    /**
     * Return this box mapped to an index space which is coarser by the given
     * ratio. Cells round toward negative infinity. A node big end which does
     * not fall on a coarse node rounds up, so the coarse box still covers it.
     */
    pub fn coarsen(&self, ratio: IntVect<D>) -> Self {
        let mut big = self.big.coarsen(ratio);

        for d in 0..D {
            if self.typ.node_centered(d) && self.big[d].rem_euclid(ratio[d]) != 0 {
                big[d] += 1
            }
        }
        Self::from_corners(self.small.coarsen(ratio), big, self.typ)
    }


    /**
     * Determine whether coarsening by the given ratio is exact (refining the
     * result gives this box back) and leaves at least `min_width` cells on
     * every axis.
     */
    pub fn coarsenable(&self, ratio: IntVect<D>, min_width: i64) -> bool {
        let coarse = self.coarsen(ratio);
        coarse.refine(ratio) == *self
            && coarse.enclosed_cells().length().all_ge(&IntVect::splat(min_width))
    }


    /**
     * Return this box with its index type changed. Converting a cell axis to
     * a node axis adds the node on the high side; the reverse drops it.
     */
    pub fn convert(&self, typ: IndexType<D>) -> Self {
        let mut big = self.big;

        for d in 0..D {
            match (self.typ.centering(d), typ.centering(d)) {
                (Centering::Cell, Centering::Node) => big[d] += 1,
                (Centering::Node, Centering::Cell) => big[d] -= 1,
                _ => (),
            }
        }
        Self::from_corners(self.small, big, typ)
    }


    pub fn surrounding_nodes(&self) -> Self {
        self.convert(IndexType::node())
    }


    pub fn surrounding_nodes_dir(&self, dir: usize) -> Self {
        self.convert(self.typ.with(dir, Centering::Node))
    }


    pub fn enclosed_cells(&self) -> Self {
        self.convert(IndexType::cell())
    }


    pub fn enclosed_cells_dir(&self, dir: usize) -> Self {
        self.convert(self.typ.with(dir, Centering::Cell))
    }


    pub fn shift(&self, delta: IntVect<D>) -> Self {
        Self::from_corners(self.small + delta, self.big + delta, self.typ)
    }


    pub fn shift_dir(&self, dir: usize, amount: i64) -> Self {
        self.shift(IntVect::basis(dir, amount))
    }


    /**
     * Expand this box by the given number of indexes on both sides of each
     * axis. Negative amounts shrink it.
     */
    pub fn grow(&self, delta: IntVect<D>) -> Self {
        Self::from_corners(self.small - delta, self.big + delta, self.typ)
    }


    pub fn grow_dir(&self, dir: usize, amount: i64) -> Self {
        self.grow(IntVect::basis(dir, amount))
    }


    pub fn grow_lo(&self, dir: usize, amount: i64) -> Self {
        let mut small = self.small;
        small[dir] -= amount;
        Self::from_corners(small, self.big, self.typ)
    }


    pub fn grow_hi(&self, dir: usize, amount: i64) -> Self {
        let mut big = self.big;
        big[dir] += amount;
        Self::from_corners(self.small, big, self.typ)
    }


    /**
     * Split this box in two along the given axis, at the index `pos`, which
     * must satisfy `small < pos <= big` on that axis. The second box starts
     * at `pos`. Node-centered boxes share the node at `pos`.
     */
    pub fn chop(&self, dir: usize, pos: i64) -> (Self, Self) {
        debug_assert!(
            self.small[dir] < pos && pos <= self.big[dir],
            "chop position outside the box");

        let mut lower = *self;
        let mut upper = *self;

        lower.big[dir] = if self.typ.node_centered(dir) { pos } else { pos - 1 };
        upper.small[dir] = pos;
        (lower, upper)
    }


    /**
     * Return the part of this box outside of `other`, as a list of disjoint
     * boxes. The pieces are slabs peeled off the low and high sides of each
     * axis in turn.
     */
    pub fn difference(&self, other: &Self) -> BoxList<D> {
        let mut pieces = BoxList::with_type(self.typ);

        let isect = match self.intersection(other) {
            Some(isect) => isect,
            None => {
                if !self.is_empty() {
                    pieces.push(*self)
                }
                return pieces;
            }
        };
        let mut rest = *self;

        for d in 0..D {
            if rest.small[d] < isect.small[d] {
                let mut slab = rest;
                slab.big[d] = isect.small[d] - 1;
                rest.small[d] = isect.small[d];
                pieces.push(slab);
            }
            if rest.big[d] > isect.big[d] {
                let mut slab = rest;
                slab.small[d] = isect.big[d] + 1;
                rest.big[d] = isect.big[d];
                pieces.push(slab);
            }
        }
        pieces
    }


    /**
     * Return an iterator over the indexes in this box, the first axis varying
     * fastest.
     */
    pub fn iter(&self) -> IntVectRange<D> {
        IntVect::iter_between(self.small, self.big)
    }
}




// ============================================================================
impl<const D: usize> fmt::Display for IndexBox<D> {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "({} {} {})", self.small, self.big, self.typ)
    }
}

impl<const D: usize> FromStr for IndexBox<D> {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let inner = s
            .trim()
            .strip_prefix('(')
            .and_then(|s| s.strip_suffix(')'))
            .ok_or_else(|| Error::Parse(format!("expected a parenthesized box, got '{}'", s)))?;

        let mut groups = Vec::new();
        let mut rest = inner;

        while let Some(start) = rest.find('(') {
            let end = rest[start..]
                .find(')')
                .ok_or_else(|| Error::Parse(format!("unbalanced parentheses in '{}'", s)))?;
            groups.push(&rest[start..start + end + 1]);
            rest = &rest[start + end + 1..];
        }
        if groups.len() != 3 || !rest.trim().is_empty() {
            return Err(Error::Parse(format!("expected '((lo) (hi) (type))', got '{}'", s)));
        }

        let small: IntVect<D> = groups[0].parse()?;
        let big: IntVect<D> = groups[1].parse()?;
        let ix: IntVect<D> = groups[2].parse()?;
        let typ = IndexType::from_int_vect(ix)
            .ok_or_else(|| Error::Parse(format!("invalid index type {}", ix)))?;

        Ok(Self::from_corners(small, big, typ))
    }
}
