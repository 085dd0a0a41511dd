use std::sync::Arc;
use log::{debug, trace};
use rayon::prelude::*;
use crate::box_list::BoxList;
use crate::error::{Error, Result};
use crate::index_box::IndexBox;
use crate::index_type::{Centering, IndexType};
use crate::int_vect::IntVect;
use crate::store::BoxStore;
use crate::transform::{BoxTransform, Orientation, TransformKind};




/**
 * Identity of the store behind a `BoxArray`. Two arrays with equal ids share
 * their boxes.
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RefId(usize);




/**
 * The boxes of one grid level: an indexed collection of patches, which is
 * cheap to copy and to re-interpret, and which answers spatial queries
 * through a lazily built hash.
 *
 * Copies share one `BoxStore` holding the boxes at their finest, cell
 * centered. Each array presents the stored boxes through a `BoxTransform`,
 * so views at another index type, a coarser resolution, or on a boundary
 * face cost no box copies. Mutation copies the store first if it is shared,
 * so a change to one array is never seen through another.
 *
 * An array is either undefined (no store) or defined. Every operation on
 * boxes fails with `Error::NotDefined` on an undefined array.
 */
#[derive(Clone, Debug)]
pub struct BoxArray<const D: usize> {
    store: Option<Arc<BoxStore<D>>>,
    transform: BoxTransform<D>,
    typ: IndexType<D>,
    crse_ratio: IntVect<D>,
    simple: bool,
}




// ============================================================================
impl<const D: usize> BoxArray<D> {


    /**
     * Make an undefined array.
     */
    pub fn new() -> Self {
        let transform = BoxTransform::default();
        Self {
            store: None,
            typ: transform.ix_type(),
            crse_ratio: transform.crse_ratio(),
            simple: true,
            transform,
        }
    }


    /**
     * Make an array holding a single box.
     */
    pub fn from_box(b: IndexBox<D>) -> Self {
        let mut result = Self::new();
        result.set_store(b.ix_type(), vec![b.enclosed_cells()]);
        result
    }


    /**
     * Make an array from a list of boxes, which must share one index type.
     * The list order becomes the index order.
     */
    pub fn from_list(list: BoxList<D>) -> Result<Self> {
        let mut result = Self::new();
        result.define(list)?;
        Ok(result)
    }


    pub fn from_boxes(boxes: Vec<IndexBox<D>>) -> Result<Self> {
        Self::from_list(boxes.into())
    }


    /**
     * Make an array which shares the boxes of `source` and presents them
     * through the given transform. The transform replaces the one on
     * `source`; it applies to the stored boxes, which are at the finest
     * resolution and cell-centered. The coarsening ratio must be positive.
     */
    pub fn with_transform(source: &Self, transform: BoxTransform<D>) -> Result<Self> {
        check_ratio(transform.crse_ratio())?;

        if let TransformKind::Boundary { face, .. } = transform.kind() {
            check_dir::<D>(face.dir)?;
        }
        let store = source.store()?.clone();
        let mut result = Self::new();
        result.store = Some(store);
        result.set_transform(transform);
        Ok(result)
    }


    /**
     * Initialize the array from a list of boxes. It is an error if the array
     * is already defined.
     */
    pub fn define(&mut self, list: BoxList<D>) -> Result<()> {
        if self.store.is_some() {
            return Err(Error::Redefinition);
        }
        let typ = list.ix_type();

        if let Some(b) = list.iter().find(|b| b.ix_type() != typ) {
            return Err(mismatch(typ, b.ix_type()));
        }
        let cells = list.into_iter().map(|b| b.enclosed_cells()).collect::<Vec<_>>();
        trace!("defining box array with {} boxes of type {}", cells.len(), typ);
        self.set_store(typ, cells);
        Ok(())
    }


    pub fn define_box(&mut self, b: IndexBox<D>) -> Result<()> {
        let mut list = BoxList::with_type(b.ix_type());
        list.push(b);
        self.define(list)
    }


    /**
     * Detach from the store, making the array undefined.
     */
    pub fn clear(&mut self) {
        *self = Self::new()
    }


    pub fn is_defined(&self) -> bool {
        self.store.is_some()
    }




    // ========================================================================
    pub fn ix_type(&self) -> IndexType<D> {
        self.typ
    }


    pub fn crse_ratio(&self) -> IntVect<D> {
        self.crse_ratio
    }


    pub fn transform(&self) -> &BoxTransform<D> {
        &self.transform
    }


    /**
     * Whether two arrays share the same store. This is much weaker than
     * equality: arrays sharing a store may present it differently.
     */
    pub fn same_refs(lhs: &Self, rhs: &Self) -> bool {
        match (&lhs.store, &rhs.store) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }


    pub fn ref_id(&self) -> Result<RefId> {
        Ok(RefId(Arc::as_ptr(self.store()?) as *const () as usize))
    }


    /**
     * Return the number of arrays sharing this array's store (zero when
     * undefined).
     */
    pub fn ref_count(&self) -> usize {
        self.store.as_ref().map_or(0, Arc::strong_count)
    }


    /**
     * Whether the spatial hash of the store is currently built.
     */
    pub fn hash_built(&self) -> bool {
        self.store.as_ref().map_or(false, |s| s.has_hash())
    }




    // ========================================================================
    pub fn len(&self) -> Result<usize> {
        Ok(self.store()?.len())
    }


    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.store()?.is_empty())
    }


    /**
     * Return the box at the given index, as presented by this array.
     */
    pub fn get(&self, index: usize) -> Result<IndexBox<D>> {
        let store = self.store()?;
        store
            .boxes()
            .get(index)
            .map(|b| self.present(b))
            .ok_or(Error::OutOfRange { index, len: store.len() })
    }


    /**
     * Return the stored box at the given index coarsened by the coarsening
     * ratio, without the index type conversion or any other transform. This
     * is a canonical cell-centered key for the patch.
     */
    pub fn cell_centered_box(&self, index: usize) -> Result<IndexBox<D>> {
        let store = self.store()?;
        store
            .boxes()
            .get(index)
            .map(|b| if b.is_empty() { *b } else { b.coarsen(self.crse_ratio) })
            .ok_or(Error::OutOfRange { index, len: store.len() })
    }


    /**
     * Return an iterator over the presented boxes in index order.
     */
    pub fn iter(&self) -> Result<impl Iterator<Item = IndexBox<D>> + '_> {
        let store = self.store()?;
        Ok(store.boxes().iter().map(move |b| self.present(b)))
    }


    pub fn box_list(&self) -> Result<BoxList<D>> {
        let mut list = BoxList::with_type(self.typ);
        list.extend(self.iter()?);
        Ok(list)
    }


    /**
     * Return the number of indexes in all boxes, counting overlaps more than
     * once.
     */
    pub fn num_pts(&self) -> Result<i64> {
        Ok(self.iter()?.map(|b| b.num_pts()).sum())
    }


    /**
     * Whether no box in the array is empty.
     */
    pub fn ok(&self) -> Result<bool> {
        Ok(self.iter()?.all(|b| !b.is_empty()))
    }


    /**
     * Whether every box can be coarsened exactly by the given ratio, leaving
     * at least `min_width` cells on each axis.
     */
    pub fn coarsenable(&self, ratio: IntVect<D>, min_width: i64) -> Result<bool> {
        check_ratio(ratio)?;
        Ok(self
            .iter()?
            .filter(|b| !b.is_empty())
            .all(|b| b.enclosed_cells().coarsenable(ratio, min_width)))
    }


    /**
     * Whether the two arrays hold the same boxes once both are converted to
     * cell-centered.
     */
    pub fn cell_equal(&self, other: &Self) -> Result<bool> {
        if Self::same_refs(self, other) && self.transform == other.transform {
            return Ok(true);
        }
        if self.len()? != other.len()? {
            return Ok(false);
        }
        Ok(self
            .iter()?
            .zip(other.iter()?)
            .all(|(a, b)| a.enclosed_cells() == b.enclosed_cells()))
    }


    /**
     * Return the smallest box containing every (non-empty) box.
     */
    pub fn minimal_box(&self) -> Result<IndexBox<D>> {
        self.iter()?
            .filter(|b| !b.is_empty())
            .fold(None, |acc: Option<IndexBox<D>>, b| Some(acc.map_or(b, |a| a.bounding(&b))))
            .ok_or(Error::EmptyCollection("minimal_box"))
    }


    /**
     * Return the minimal box together with the mean number of indexes per
     * non-empty box, rounded down.
     */
    pub fn minimal_box_with_avg(&self) -> Result<(IndexBox<D>, i64)> {
        let (count, total) = self
            .iter()?
            .filter(|b| !b.is_empty())
            .fold((0, 0), |(count, total), b| (count + 1, total + b.num_pts()));

        if count == 0 {
            return Err(Error::EmptyCollection("minimal_box_with_avg"));
        }
        Ok((self.minimal_box()?, total / count))
    }


    /**
     * Whether the index lies in any box.
     */
    pub fn contains_point(&self, index: &IntVect<D>) -> Result<bool> {
        let store = self.store()?;
        let point = IndexBox::from_corners(*index, *index, self.typ);
        Ok(!self.collect_intersections(store, &point, true, IntVect::zero()).is_empty())
    }


    /**
     * Whether the box is covered by the union of the boxes in this array.
     * With `assume_disjoint`, the covered index count is compared instead of
     * computing the uncovered remainder, which is only correct if no two
     * boxes in this array overlap.
     */
    pub fn contains_box(&self, b: &IndexBox<D>, assume_disjoint: bool) -> Result<bool> {
        let store = self.store()?;
        self.check_type(b)?;

        if b.is_empty() || store.is_empty() {
            return Ok(false);
        }
        let hits = self.collect_intersections(store, b, false, IntVect::zero());

        if assume_disjoint {
            return Ok(hits.iter().map(|(_, isect)| isect.num_pts()).sum::<i64>() == b.num_pts());
        }
        let mut leftover = BoxList::with_type(self.typ);
        leftover.push(*b);

        for (_, isect) in hits {
            leftover = leftover
                .into_iter()
                .flat_map(|l| l.difference(&isect))
                .collect();
            if leftover.is_empty() {
                break;
            }
        }
        Ok(leftover.is_empty())
    }


    /**
     * Whether every (non-empty) box of `other` is covered by this array.
     * The boxes of `other` are checked in parallel.
     */
    pub fn contains_array(&self, other: &Self, assume_disjoint: bool) -> Result<bool> {
        let store = self.store()?;

        if other.ix_type() != self.typ {
            return Err(mismatch(self.typ, other.ix_type()));
        }
        let boxes: Vec<_> = other.iter()?.filter(|b| !b.is_empty()).collect();
        store.hash();

        let covered = boxes
            .par_iter()
            .map(|b| self.contains_box(b, assume_disjoint))
            .collect::<Result<Vec<_>>>()?;

        Ok(covered.into_iter().all(|c| c))
    }


    /**
     * Whether the box intersects any box of this array grown by `ng`.
     */
    pub fn intersects(&self, b: &IndexBox<D>, ng: IntVect<D>) -> Result<bool> {
        Ok(!self.intersections(b, true, ng)?.is_empty())
    }


    /**
     * Return the index of each box of this array which, grown by `ng`,
     * intersects `b`, paired with that intersection. The pairs are in
     * ascending index order; with `first_only` just the first one is
     * returned. The result does not depend on how the hash bins the boxes.
     */
    pub fn intersections(&self, b: &IndexBox<D>, first_only: bool, ng: IntVect<D>) -> Result<Vec<(usize, IndexBox<D>)>> {
        let store = self.store()?;
        self.check_type(b)?;
        Ok(self.collect_intersections(store, b, first_only, ng))
    }


    /**
     * Return the part of `domain` not covered by any box of this array.
     */
    pub fn complement_in(&self, domain: &IndexBox<D>) -> Result<BoxList<D>> {
        let store = self.store()?;
        self.check_type(domain)?;

        let mut leftover = BoxList::with_type(self.typ);

        if domain.is_empty() {
            return Ok(leftover);
        }
        leftover.push(*domain);

        for (_, isect) in self.collect_intersections(store, domain, false, IntVect::zero()) {
            let mut next = BoxList::with_type(self.typ);
            next.extend(leftover.into_iter().flat_map(|l| l.difference(&isect)));
            leftover = next;

            if leftover.is_empty() {
                break;
            }
        }
        Ok(leftover)
    }


    /**
     * Whether no two boxes intersect. Each box is tested only against the
     * hash candidates near it, with the boxes spread over the rayon pool.
     */
    pub fn is_disjoint(&self) -> Result<bool> {
        let store = self.store()?;
        store.hash();

        Ok((0..store.len()).into_par_iter().all(|i| {
            let b = self.present(&store.boxes()[i]);
            b.is_empty() || self
                .collect_intersections(store, &b, false, IntVect::zero())
                .iter()
                .all(|(j, _)| *j == i)
        }))
    }




    // ========================================================================
    /**
     * Return an array sharing this array's store, presented at another index
     * type.
     */
    pub fn converted(&self, typ: IndexType<D>) -> Result<Self> {
        self.store()?;
        let mut transform = self.transform.clone();
        transform.set_ix_type(typ);
        let mut result = self.clone();
        result.set_transform(transform);
        Ok(result)
    }


    /**
     * Return an array presenting this array's boxes coarsened by the given
     * ratio. The store is shared when this array's transform is simple. It
     * is an error if the boxes are not coarsenable by the ratio.
     */
    pub fn coarsened(&self, ratio: IntVect<D>) -> Result<Self> {
        if !self.coarsenable(ratio, 1)? {
            return Err(Error::NotCoarsenable { ratio: ratio.to_string() });
        }
        let mut result = self.clone();
        result.materialize_non_simple()?;
        let transform = BoxTransform::simple(result.typ, result.crse_ratio * ratio);
        result.set_transform(transform);
        Ok(result)
    }


    /**
     * Return an array sharing this array's store which presents, for each
     * box, the slab on the given face: `in_rad` cells inside the box and
     * `out_rad` cells outside, grown by `extent_rad` cells along the other
     * axes.
     */
    pub fn boundary(&self, face: Orientation, in_rad: i64, out_rad: i64, extent_rad: i64) -> Result<Self> {
        check_dir::<D>(face.dir)?;
        let mut result = self.clone();
        result.materialize_non_simple()?;
        let transform = BoxTransform::boundary(result.typ, result.crse_ratio, face, in_rad, out_rad, extent_rad);
        result.set_transform(transform);
        Ok(result)
    }




    // ========================================================================
    /**
     * Make sure this array is the only one using its store, copying the
     * store if it is shared.
     */
    pub fn uniqify(&mut self) -> Result<()> {
        let store = self.store.as_mut().ok_or(Error::NotDefined)?;
        let count = Arc::strong_count(store);

        if count > 1 {
            debug!("copy-on-write: duplicating a box store shared by {} arrays", count);
            let copy = BoxStore::clone(&**store);
            *store = Arc::new(copy);
        }
        Ok(())
    }


    /**
     * Replace the box at the given index. The box must have this array's
     * index type.
     */
    pub fn set(&mut self, index: usize, b: IndexBox<D>) -> Result<&mut Self> {
        let len = self.len()?;
        self.check_type(&b)?;

        if index >= len {
            return Err(Error::OutOfRange { index, len });
        }
        self.materialize()?;
        self.store_mut()?.boxes_mut()[index] = b.enclosed_cells();
        Ok(self)
    }


    /**
     * Grow the array with empty boxes, or truncate it.
     */
    pub fn resize(&mut self, len: usize) -> Result<&mut Self> {
        self.store_mut()?.resize(len);
        Ok(self)
    }


    /**
     * Split boxes until each spans at most `block` cells on every axis. The
     * covered index set is unchanged, and the pieces of a box take its place
     * in the index order.
     */
    pub fn max_size(&mut self, block: IntVect<D>) -> Result<&mut Self> {
        if !block.all_ge(&IntVect::unit()) {
            return Err(Error::InvalidArgument(format!("block size {} must be positive", block)));
        }
        self.materialize()?;
        let mut list: BoxList<D> = self.store()?.boxes().to_vec().into();
        list.max_size(block);
        self.replace_boxes(list.into_vec());
        Ok(self)
    }


    pub fn refine(&mut self, ratio: IntVect<D>) -> Result<&mut Self> {
        check_ratio(ratio)?;
        self.map_boxes(|b| b.refine(ratio))
    }


    /**
     * Coarsen every box by the given ratio. It is an error if any box is not
     * coarsenable by it; boxes are never rounded.
     */
    pub fn coarsen(&mut self, ratio: IntVect<D>) -> Result<&mut Self> {
        if !self.coarsenable(ratio, 1)? {
            return Err(Error::NotCoarsenable { ratio: ratio.to_string() });
        }
        self.map_boxes(|b| b.coarsen(ratio))
    }


    /**
     * Grow every box, then coarsen it, rounding outward.
     */
    pub fn grow_coarsen(&mut self, ngrow: IntVect<D>, ratio: IntVect<D>) -> Result<&mut Self> {
        check_ratio(ratio)?;
        self.map_boxes(|b| b.grow(ngrow).coarsen(ratio))
    }


    pub fn grow(&mut self, delta: IntVect<D>) -> Result<&mut Self> {
        self.map_boxes(|b| b.grow(delta))
    }


    pub fn grow_dir(&mut self, dir: usize, amount: i64) -> Result<&mut Self> {
        check_dir::<D>(dir)?;
        self.map_boxes(|b| b.grow_dir(dir, amount))
    }


    pub fn grow_lo(&mut self, dir: usize, amount: i64) -> Result<&mut Self> {
        check_dir::<D>(dir)?;
        self.map_boxes(|b| b.grow_lo(dir, amount))
    }


    pub fn grow_hi(&mut self, dir: usize, amount: i64) -> Result<&mut Self> {
        check_dir::<D>(dir)?;
        self.map_boxes(|b| b.grow_hi(dir, amount))
    }


    pub fn shift(&mut self, delta: IntVect<D>) -> Result<&mut Self> {
        self.map_boxes(|b| b.shift(delta))
    }


    pub fn shift_dir(&mut self, dir: usize, amount: i64) -> Result<&mut Self> {
        check_dir::<D>(dir)?;
        self.map_boxes(|b| b.shift_dir(dir, amount))
    }


    /**
     * Change the index type. The stored boxes are unaffected, so the store
     * is not copied and its hash stays valid.
     */
    pub fn convert(&mut self, typ: IndexType<D>) -> Result<&mut Self> {
        self.store()?;
        self.materialize_non_simple()?;
        self.set_transform(BoxTransform::simple(typ, self.crse_ratio));
        Ok(self)
    }


    pub fn surrounding_nodes(&mut self) -> Result<&mut Self> {
        self.convert(IndexType::node())
    }


    pub fn surrounding_nodes_dir(&mut self, dir: usize) -> Result<&mut Self> {
        check_dir::<D>(dir)?;
        self.convert(self.typ.with(dir, Centering::Node))
    }


    pub fn enclosed_cells(&mut self) -> Result<&mut Self> {
        self.convert(IndexType::cell())
    }


    pub fn enclosed_cells_dir(&mut self, dir: usize) -> Result<&mut Self> {
        check_dir::<D>(dir)?;
        self.convert(self.typ.with(dir, Centering::Cell))
    }


    /**
     * Replace every non-empty box by the result of applying `f` to it. The
     * results must share one index type, which becomes the array's.
     */
    pub fn convert_with<F>(&mut self, f: F) -> Result<&mut Self>
    where
        F: Fn(&IndexBox<D>) -> IndexBox<D>
    {
        let mapped: Vec<_> = self
            .iter()?
            .map(|b| if b.is_empty() { None } else { Some(f(&b)) })
            .collect();
        let typ = mapped.iter().flatten().next().map_or(self.typ, |b| b.ix_type());

        if let Some(b) = mapped.iter().flatten().find(|b| b.ix_type() != typ) {
            return Err(mismatch(typ, b.ix_type()));
        }
        self.materialize()?;
        let store = self.store_mut()?;

        for (stored, b) in store.boxes_mut().iter_mut().zip(mapped) {
            if let Some(b) = b {
                *stored = b.enclosed_cells()
            }
        }
        self.set_transform(BoxTransform::simple(typ, IntVect::unit()));
        Ok(self)
    }


    /**
     * Replace the boxes with a disjoint set covering the same indexes: each
     * box keeps only its part outside the boxes before it. With `simplify`,
     * boxes which together form a larger box are then merged. Only
     * cell-centered arrays are supported.
     */
    pub fn remove_overlap(&mut self, simplify: bool) -> Result<&mut Self> {
        let store = self.store()?;

        if !self.typ.is_cell_centered() {
            return Err(Error::InvalidArgument(format!("remove_overlap on index type {}", self.typ)));
        }
        let mut list = BoxList::with_type(self.typ);

        for (i, stored) in store.boxes().iter().enumerate() {
            let b = self.present(stored);

            if b.is_empty() {
                continue;
            }
            let mut pieces = BoxList::with_type(self.typ);
            pieces.push(b);

            for (j, _) in self.collect_intersections(store, &b, false, IntVect::zero()) {
                if j >= i || pieces.is_empty() {
                    break;
                }
                let earlier = self.present(&store.boxes()[j]);
                let mut next = BoxList::with_type(self.typ);
                next.extend(pieces.into_iter().flat_map(|p| p.difference(&earlier)));
                pieces = next;
            }
            list.append(pieces);
        }
        if simplify {
            let merged = list.simplify();
            trace!("remove_overlap merged {} boxes", merged);
        }
        let cells = list.into_iter().map(|b| b.enclosed_cells()).collect();
        self.replace_boxes(cells);
        Ok(self)
    }




    // ========================================================================
    /**
     * Return the index type, coarsening ratio, and boxes from which this
     * array can be rebuilt with `from_parts`. For a simple transform the
     * boxes are the stored (fine) boxes converted to the index type, so the
     * ratio survives; otherwise they are the presented boxes, with ratio 1.
     */
    pub(crate) fn to_parts(&self) -> Result<(IndexType<D>, IntVect<D>, Vec<IndexBox<D>>)> {
        let store = self.store()?;

        if !self.simple {
            return Ok((self.typ, IntVect::unit(), self.iter()?.collect()));
        }
        let boxes = store
            .boxes()
            .iter()
            .map(|b| if b.is_empty() { IndexBox::empty_of(self.typ) } else { b.convert(self.typ) })
            .collect();
        Ok((self.typ, self.crse_ratio, boxes))
    }


    pub(crate) fn from_parts(typ: IndexType<D>, crse_ratio: IntVect<D>, boxes: Vec<IndexBox<D>>) -> Result<Self> {
        check_ratio(crse_ratio)?;

        if let Some(b) = boxes.iter().find(|b| !b.is_empty() && b.ix_type() != typ) {
            return Err(mismatch(typ, b.ix_type()));
        }
        let cells = boxes
            .into_iter()
            .map(|b| if b.is_empty() { IndexBox::empty() } else { b.enclosed_cells() })
            .collect();
        let mut result = Self::new();
        result.store = Some(Arc::new(BoxStore::new(cells)));
        result.set_transform(BoxTransform::simple(typ, crse_ratio));
        Ok(result)
    }




    // ========================================================================
    fn store(&self) -> Result<&Arc<BoxStore<D>>> {
        self.store.as_ref().ok_or(Error::NotDefined)
    }


    /**
     * Return the store for modification, copying it first if it is shared.
     * The hash is dropped on either path.
     */
    fn store_mut(&mut self) -> Result<&mut BoxStore<D>> {
        self.uniqify()?;
        let store = Arc::make_mut(self.store.as_mut().ok_or(Error::NotDefined)?);
        store.clear_hash();
        Ok(store)
    }


    fn set_store(&mut self, typ: IndexType<D>, cells: Vec<IndexBox<D>>) {
        self.store = Some(Arc::new(BoxStore::new(cells)));
        self.set_transform(BoxTransform::simple(typ, IntVect::unit()));
    }


    /**
     * Install new cell-centered boxes, presented as-is at this array's index
     * type. The store is overwritten in place if it is not shared.
     */
    fn replace_boxes(&mut self, cells: Vec<IndexBox<D>>) {
        match self.store.as_mut().and_then(Arc::get_mut) {
            Some(store) => *store.boxes_mut() = cells,
            None => self.store = Some(Arc::new(BoxStore::new(cells))),
        }
        self.set_transform(BoxTransform::simple(self.typ, IntVect::unit()));
    }


    fn set_transform(&mut self, transform: BoxTransform<D>) {
        self.typ = transform.ix_type();
        self.crse_ratio = transform.crse_ratio();
        self.simple = transform.is_simple();
        self.transform = transform;
    }


    /**
     * Bake the transform into the stored boxes, so that stored boxes and
     * presented boxes differ only by index type. Needed before any change to
     * the stored boxes.
     */
    fn materialize(&mut self) -> Result<()> {
        if self.simple && self.crse_ratio.is_unit() {
            return Ok(());
        }
        let cells: Vec<_> = self.iter()?.map(|b| b.enclosed_cells()).collect();
        debug!("materializing box array transform over {} boxes", cells.len());
        self.replace_boxes(cells);
        Ok(())
    }


    fn materialize_non_simple(&mut self) -> Result<()> {
        if self.simple {
            Ok(())
        } else {
            self.materialize()
        }
    }


    fn map_boxes<F>(&mut self, f: F) -> Result<&mut Self>
    where
        F: Fn(&IndexBox<D>) -> IndexBox<D>
    {
        self.materialize()?;

        for b in self.store_mut()?.boxes_mut().iter_mut().filter(|b| !b.is_empty()) {
            *b = f(&*b)
        }
        Ok(self)
    }


    fn present(&self, stored: &IndexBox<D>) -> IndexBox<D> {
        if stored.is_empty() {
            IndexBox::empty_of(self.typ)
        } else if !self.simple {
            self.transform.present(stored)
        } else if self.crse_ratio.is_unit() {
            stored.convert(self.typ)
        } else {
            stored.coarsen(self.crse_ratio).convert(self.typ)
        }
    }


    fn check_type(&self, b: &IndexBox<D>) -> Result<()> {
        if b.ix_type() == self.typ {
            Ok(())
        } else {
            Err(mismatch(self.typ, b.ix_type()))
        }
    }


    /**
     * Return the cell-centered region of the stored index space in which a
     * stored box must lie for its presented box, grown by `ng`, to reach
     * `query`. A negative `ng` only shrinks boxes, so it searches as zero.
     */
    fn search_region(&self, query: &IndexBox<D>, ng: IntVect<D>) -> IndexBox<D> {
        let ng = ng.max(IntVect::zero());
        let lo = query.small_end() - ng - self.transform.doi_hi();
        let hi = query.big_end() + ng + self.transform.doi_lo();
        IndexBox::from_corners(lo, hi, IndexType::cell()).refine(self.crse_ratio)
    }


    fn collect_intersections(
        &self,
        store: &BoxStore<D>,
        query: &IndexBox<D>,
        first_only: bool,
        ng: IntVect<D>) -> Vec<(usize, IndexBox<D>)>
    {
        let mut hits = Vec::new();

        if query.is_empty() {
            return hits;
        }
        for i in store.hash().candidates(&self.search_region(query, ng)) {
            let b = self.present(&store.boxes()[i]).grow(ng);

            if let Some(isect) = query.intersection(&b) {
                hits.push((i, isect));
                if first_only {
                    break;
                }
            }
        }
        hits
    }
}




fn mismatch<const D: usize>(expected: IndexType<D>, found: IndexType<D>) -> Error {
    Error::InconsistentIndexType {
        expected: expected.to_string(),
        found: found.to_string(),
    }
}

fn check_ratio<const D: usize>(ratio: IntVect<D>) -> Result<()> {
    if ratio.all_ge(&IntVect::unit()) {
        Ok(())
    } else {
        Err(Error::InvalidArgument(format!("ratio {} must be positive", ratio)))
    }
}

fn check_dir<const D: usize>(dir: usize) -> Result<()> {
    if dir < D {
        Ok(())
    } else {
        Err(Error::InvalidArgument(format!("no axis {} in {} dimensions", dir, D)))
    }
}




// ============================================================================
impl<const D: usize> Default for BoxArray<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const D: usize> PartialEq for BoxArray<D> {

    /**
     * Two arrays are equal if both are undefined, or if they present the
     * same boxes in the same order at the same index type.
     */
    fn eq(&self, other: &Self) -> bool {
        match (&self.store, &other.store) {
            (None, None) => true,
            (Some(a), Some(b)) => {
                if self.typ != other.typ || a.len() != b.len() {
                    false
                } else if Arc::ptr_eq(a, b) && self.transform == other.transform {
                    true
                } else {
                    a.boxes()
                        .iter()
                        .zip(b.boxes())
                        .all(|(x, y)| self.present(x) == other.present(y))
                }
            }
            _ => false,
        }
    }
}
