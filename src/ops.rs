use crate::box_array::BoxArray;
use crate::box_list::BoxList;
use crate::error::{Error, Result};
use crate::index_box::IndexBox;
use crate::index_type::IndexType;
use crate::int_vect::IntVect;




/**
 * Make an array from the part of `b1` outside `b2`.
 */
pub fn box_complement<const D: usize>(b1: &IndexBox<D>, b2: &IndexBox<D>) -> Result<BoxArray<D>> {
    if b1.ix_type() != b2.ix_type() {
        return Err(Error::InconsistentIndexType {
            expected: b1.ix_type().to_string(),
            found: b2.ix_type().to_string(),
        });
    }
    BoxArray::from_list(b1.difference(b2))
}




/**
 * Make an array from the part of `b` not covered by `ba`.
 */
pub fn complement_in<const D: usize>(b: &IndexBox<D>, ba: &BoxArray<D>) -> Result<BoxArray<D>> {
    BoxArray::from_list(ba.complement_in(b)?)
}




/**
 * Make an array from the overlaps of `b` with the boxes of `ba` grown by
 * `ng`, in the index order of `ba`.
 */
pub fn intersect<const D: usize>(ba: &BoxArray<D>, b: &IndexBox<D>, ng: IntVect<D>) -> Result<BoxArray<D>> {
    let mut list = BoxList::with_type(ba.ix_type());
    list.extend(ba.intersections(b, false, ng)?.into_iter().map(|(_, isect)| isect));
    BoxArray::from_list(list)
}




/**
 * Make an array from the pairwise overlaps of two arrays: for each box of
 * `lhs` in turn, its overlaps with the boxes of `rhs`.
 */
pub fn intersect_arrays<const D: usize>(lhs: &BoxArray<D>, rhs: &BoxArray<D>) -> Result<BoxArray<D>> {
    BoxArray::from_list(intersect_list(rhs, &lhs.box_list()?)?)
}




/**
 * Return the overlaps of each box of `bl` with the boxes of `ba`.
 */
pub fn intersect_list<const D: usize>(ba: &BoxArray<D>, bl: &BoxList<D>) -> Result<BoxList<D>> {
    let mut list = BoxList::with_type(ba.ix_type());

    for b in bl {
        if b.is_empty() {
            continue;
        }
        list.extend(ba.intersections(b, false, IntVect::zero())?.into_iter().map(|(_, isect)| isect));
    }
    Ok(list)
}




/**
 * Return a copy of `ba` at another index type. The copy shares the store.
 */
pub fn convert<const D: usize>(ba: &BoxArray<D>, typ: IndexType<D>) -> Result<BoxArray<D>> {
    let mut result = ba.clone();
    result.convert(typ)?;
    Ok(result)
}




/**
 * Return a copy of `ba` coarsened by the given ratio.
 */
pub fn coarsen<const D: usize>(ba: &BoxArray<D>, ratio: IntVect<D>) -> Result<BoxArray<D>> {
    let mut result = ba.clone();
    result.coarsen(ratio)?;
    Ok(result)
}




/**
 * Return the ghost cells of a level: the cells within `ngrow` of some box
 * of `ba` which no box of `ba` covers, as disjoint boxes of the array's
 * index type.
 */
pub fn bndry_cells<const D: usize>(ba: &BoxArray<D>, ngrow: i64) -> Result<BoxList<D>> {
    let typ = ba.ix_type();
    let cells = ba.converted(IndexType::cell())?;
    let mut ghosts = BoxList::new();

    for b in cells.iter()?.filter(|b| !b.is_empty()) {
        ghosts.append(cells.complement_in(&b.grow(IntVect::splat(ngrow)))?);
    }
    let mut ghosts = BoxArray::from_list(ghosts)?;
    ghosts.remove_overlap(true)?;

    let mut result = BoxList::with_type(typ);
    result.extend(ghosts.iter()?.map(|b| b.convert(typ)));
    Ok(result)
}




/**
 * Whether two arrays present the same boxes in the same order at the same
 * index type. Arrays which match need not share a store or a transform.
 */
pub fn matches<const D: usize>(x: &BoxArray<D>, y: &BoxArray<D>) -> Result<bool> {
    if x.len()? != y.len()? || x.ix_type() != y.ix_type() {
        return Ok(false);
    }
    Ok(x.iter()?.zip(y.iter()?).all(|(a, b)| a == b))
}
