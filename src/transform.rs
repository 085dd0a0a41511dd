use core::fmt;
use std::sync::Arc;
use crate::index_box::IndexBox;
use crate::index_type::IndexType;
use crate::int_vect::IntVect;




/**
 * Identifier for the low or high side of an axis
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    Low,
    High,
}




/**
 * One face of a box: an axis, and a side of that axis.
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Orientation {
    pub dir: usize,
    pub side: Side,
}

impl Orientation {
    pub fn new(dir: usize, side: Side) -> Self {
        Self { dir, side }
    }
}




/**
 * A user-supplied rule mapping stored boxes to the boxes a `BoxArray`
 * presents. The mapping receives each stored box already coarsened by the
 * array's coarsening ratio (so it is cell-centered), and must return a box
 * of the given index type.
 *
 * The domain of influence must bound how far the result can extend beyond
 * the coarse box: no index of the result may lie below `coarse.small_end() -
 * doi_lo()` or above `coarse.big_end() + doi_hi()`. Spatial queries rely on
 * this bound to select candidates, so a mapping which violates it will make
 * queries miss boxes.
 */
pub trait BoxMap<const D: usize>: fmt::Debug + Send + Sync {
    fn apply(&self, coarse: &IndexBox<D>, typ: IndexType<D>) -> IndexBox<D>;

    fn doi_lo(&self) -> IntVect<D>;

    fn doi_hi(&self) -> IntVect<D>;
}




/**
 * The kinds of box transform. `Simple` is the common case and is handled
 * without dispatch.
 */
#[derive(Clone, Debug)]
pub enum TransformKind<const D: usize> {
    /// Coarsen, then convert to the index type.
    Simple,

    /// Take a slab on one face of each coarsened box: `in_rad` cells inside
    /// the box and `out_rad` outside, grown by `extent_rad` on the other
    /// axes, then convert to the index type.
    Boundary {
        face: Orientation,
        in_rad: i64,
        out_rad: i64,
        extent_rad: i64,
    },

    /// Apply a user rule to each coarsened box.
    Custom(Arc<dyn BoxMap<D>>),
}




/**
 * Maps the boxes held in a store to the boxes a `BoxArray` presents. Several
 * arrays can share one store and present it differently (at another index
 * type or resolution) by carrying different transforms.
 */
#[derive(Clone, Debug)]
pub struct BoxTransform<const D: usize> {
    typ: IndexType<D>,
    crse_ratio: IntVect<D>,
    kind: TransformKind<D>,
}




// ============================================================================
impl<const D: usize> BoxTransform<D> {


    pub fn simple(typ: IndexType<D>, crse_ratio: IntVect<D>) -> Self {
        Self { typ, crse_ratio, kind: TransformKind::Simple }
    }


    pub fn boundary(
        typ: IndexType<D>,
        crse_ratio: IntVect<D>,
        face: Orientation,
        in_rad: i64,
        out_rad: i64,
        extent_rad: i64) -> Self
    {
        Self {
            typ,
            crse_ratio,
            kind: TransformKind::Boundary { face, in_rad, out_rad, extent_rad },
        }
    }


    pub fn custom(typ: IndexType<D>, crse_ratio: IntVect<D>, map: Arc<dyn BoxMap<D>>) -> Self {
        Self { typ, crse_ratio, kind: TransformKind::Custom(map) }
    }


    pub fn ix_type(&self) -> IndexType<D> {
        self.typ
    }


    pub fn crse_ratio(&self) -> IntVect<D> {
        self.crse_ratio
    }


    pub fn kind(&self) -> &TransformKind<D> {
        &self.kind
    }


    /**
     * Whether this is a plain coarsen-and-convert. Callers may then apply
     * the closed form directly instead of calling `present`.
     */
    pub fn is_simple(&self) -> bool {
        matches!(self.kind, TransformKind::Simple)
    }


    pub(crate) fn set_ix_type(&mut self, typ: IndexType<D>) {
        self.typ = typ
    }


    /**
     * Map a stored box to the box presented to callers.
     */
    pub fn present(&self, stored: &IndexBox<D>) -> IndexBox<D> {
        let coarse = if self.crse_ratio.is_unit() {
            *stored
        } else {
            stored.coarsen(self.crse_ratio)
        };

        match &self.kind {
            TransformKind::Simple => {
                coarse.convert(self.typ)
            }
            TransformKind::Boundary { face, in_rad, out_rad, extent_rad } => {
                face_slab(&coarse, *face, *in_rad, *out_rad, *extent_rad).convert(self.typ)
            }
            TransformKind::Custom(map) => {
                map.apply(&coarse, self.typ)
            }
        }
    }


    /**
     * Return how far below the coarsened stored box a presented box can
     * reach, on each axis.
     */
    pub fn doi_lo(&self) -> IntVect<D> {
        match &self.kind {
            TransformKind::Simple => IntVect::zero(),
            TransformKind::Boundary { face, in_rad, out_rad, extent_rad } => {
                let mut doi = IntVect::splat((*extent_rad).max(0));
                doi[face.dir] = match face.side {
                    Side::Low => (*out_rad).max(0),
                    Side::High => (in_rad - 1).max(0),
                };
                doi
            }
            TransformKind::Custom(map) => map.doi_lo(),
        }
    }


    /**
     * Return how far above the coarsened stored box a presented box can
     * reach, on each axis. This includes the extra node of node-centered
     * axes.
     */
    pub fn doi_hi(&self) -> IntVect<D> {
        match &self.kind {
            TransformKind::Simple => self.typ.ix_type(),
            TransformKind::Boundary { face, in_rad, out_rad, extent_rad } => {
                let mut doi = IntVect::splat((*extent_rad).max(0));
                doi[face.dir] = match face.side {
                    Side::Low => (in_rad - 1).max(0),
                    Side::High => (*out_rad).max(0),
                };
                doi + self.typ.ix_type()
            }
            TransformKind::Custom(map) => map.doi_hi(),
        }
    }
}




fn face_slab<const D: usize>(
    coarse: &IndexBox<D>,
    face: Orientation,
    in_rad: i64,
    out_rad: i64,
    extent_rad: i64) -> IndexBox<D>
{
    let d = face.dir;
    let mut lo = coarse.small_end() - IntVect::splat(extent_rad);
    let mut hi = coarse.big_end() + IntVect::splat(extent_rad);

    match face.side {
        Side::Low => {
            lo[d] = coarse.small_end()[d] - out_rad;
            hi[d] = coarse.small_end()[d] + in_rad - 1;
        }
        Side::High => {
            lo[d] = coarse.big_end()[d] - in_rad + 1;
            hi[d] = coarse.big_end()[d] + out_rad;
        }
    }
    IndexBox::from_corners(lo, hi, coarse.ix_type())
}




// ============================================================================
impl<const D: usize> PartialEq for TransformKind<D> {
    fn eq(&self, other: &Self) -> bool {
        use TransformKind::*;

        match (self, other) {
            (Simple, Simple) => true,
            (Boundary { face: f0, in_rad: i0, out_rad: o0, extent_rad: e0 },
             Boundary { face: f1, in_rad: i1, out_rad: o1, extent_rad: e1 }) => {
                f0 == f1 && i0 == i1 && o0 == o1 && e0 == e1
            }
            (Custom(m0), Custom(m1)) => {
                Arc::as_ptr(m0) as *const () == Arc::as_ptr(m1) as *const ()
            }
            _ => false,
        }
    }
}

impl<const D: usize> PartialEq for BoxTransform<D> {
    fn eq(&self, other: &Self) -> bool {
        self.typ == other.typ && self.crse_ratio == other.crse_ratio && self.kind == other.kind
    }
}

impl<const D: usize> Default for BoxTransform<D> {
    fn default() -> Self {
        Self::simple(IndexType::cell(), IntVect::unit())
    }
}
