use std::collections::HashMap;
use log::debug;
use crate::index_box::IndexBox;
use crate::int_vect::IntVect;




/**
 * A uniform-grid spatial hash over a slice of boxes. The index space is cut
 * into bins of a fixed size; each bin lists (in ascending order) the
 * positions of the boxes touching it. A query returns every box touching a
 * bin that the query region touches, so it may include boxes which do not
 * actually intersect the region, but never misses one that does.
 */
#[derive(Clone, Debug)]
pub struct SpatialHash<const D: usize> {
    bin_size: IntVect<D>,
    bounds: Option<IndexBox<D>>,
    bins: HashMap<IntVect<D>, Vec<usize>>,
}




// ============================================================================
impl<const D: usize> SpatialHash<D> {


    /**
     * Build a hash over the given boxes, which are taken to be
     * cell-centered. Empty boxes are not entered. The bin size depends only
     * on the boxes: on each axis it is the larger of the mean box length and
     * the bounding box length divided by `ceil(n^(1/D))`, so that bins grow
     * with the domain and a typical box touches at most `2^D` bins.
     */
    pub fn build(boxes: &[IndexBox<D>]) -> Self {
        let occupied: Vec<_> = boxes
            .iter()
            .enumerate()
            .filter(|(_, b)| !b.is_empty())
            .collect();

        let bounds = occupied
            .iter()
            .fold(None, |acc: Option<IndexBox<D>>, (_, b)| Some(acc.map_or(**b, |a| a.bounding(b))));

        let bounds = match bounds {
            Some(bounds) => bounds,
            None => {
                return Self {
                    bin_size: IntVect::unit(),
                    bounds: None,
                    bins: HashMap::new(),
                }
            }
        };

        let count = occupied.len() as i64;
        let bins_per_axis = (count as f64).powf(1.0 / D as f64).ceil().max(1.0) as i64;
        let total_length = occupied
            .iter()
            .fold(IntVect::zero(), |acc, (_, b)| acc + b.length());
        let extent = bounds.length();
        let mut bin_size = IntVect::unit();

        for d in 0..D {
            let spread = (extent[d] + bins_per_axis - 1) / bins_per_axis;
            let mean = total_length[d] / count;
            bin_size[d] = spread.max(mean).max(1);
        }

        let mut bins: HashMap<IntVect<D>, Vec<usize>> = HashMap::new();

        for (i, b) in &occupied {
            let lo = b.small_end().coarsen(bin_size);
            let hi = b.big_end().coarsen(bin_size);

            for key in IntVect::iter_between(lo, hi) {
                bins.entry(key).or_default().push(*i)
            }
        }

        debug!(
            "built spatial hash over {} boxes: {} bins of size {}",
            count,
            bins.len(),
            bin_size);

        Self {
            bin_size,
            bounds: Some(bounds),
            bins,
        }
    }


    pub fn bin_size(&self) -> IntVect<D> {
        self.bin_size
    }


    pub fn num_bins(&self) -> usize {
        self.bins.len()
    }


    /**
     * Return the bounding box of the hashed boxes, if any were non-empty.
     */
    pub fn bounds(&self) -> Option<IndexBox<D>> {
        self.bounds
    }


    /**
     * Return the sorted, de-duplicated positions of the boxes which may
     * intersect the given region.
     */
    pub fn candidates(&self, region: &IndexBox<D>) -> Vec<usize> {
        let region = match self.bounds.and_then(|b| b.intersection(region)) {
            Some(region) => region,
            None => return Vec::new(),
        };
        let lo = region.small_end().coarsen(self.bin_size);
        let hi = region.big_end().coarsen(self.bin_size);
        let mut found = Vec::new();

        for key in IntVect::iter_between(lo, hi) {
            if let Some(bin) = self.bins.get(&key) {
                found.extend_from_slice(bin)
            }
        }
        found.sort_unstable();
        found.dedup();
        found
    }
}
