use std::sync::atomic::{AtomicUsize, Ordering};
use log::trace;
use once_cell::sync::OnceCell;
use crate::hash::SpatialHash;
use crate::index_box::IndexBox;




static LIVE_STORES: AtomicUsize = AtomicUsize::new(0);
static STORES_HIGH_WATER_MARK: AtomicUsize = AtomicUsize::new(0);




/**
 * Process-wide counts of box stores.
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StoreStats {
    pub live: usize,
    pub high_water_mark: usize,
}




/**
 * Return the number of box stores currently alive, and the most that have
 * been alive at once.
 */
pub fn stats() -> StoreStats {
    StoreStats {
        live: LIVE_STORES.load(Ordering::Relaxed),
        high_water_mark: STORES_HIGH_WATER_MARK.load(Ordering::Relaxed),
    }
}

fn register_store() {
    let live = LIVE_STORES.fetch_add(1, Ordering::Relaxed) + 1;
    STORES_HIGH_WATER_MARK.fetch_max(live, Ordering::Relaxed);
}




/**
 * The canonical, shared storage behind one or more `BoxArray` facades: the
 * cell-centered boxes, in the order which defines their indexes, and a
 * spatial hash over them which is built on first use.
 *
 * The hash lives in a `OnceCell`, so concurrent readers which find it
 * missing race safely: one of them builds it while the others wait, and the
 * result is published with release/acquire ordering. Any mutable access to
 * the boxes drops the hash first, so a present hash always describes the
 * current boxes.
 */
#[derive(Debug)]
pub struct BoxStore<const D: usize> {
    boxes: Vec<IndexBox<D>>,
    hash: OnceCell<SpatialHash<D>>,
}




// ============================================================================
impl<const D: usize> BoxStore<D> {


    pub fn new(boxes: Vec<IndexBox<D>>) -> Self {
        register_store();
        trace!("new box store with {} boxes", boxes.len());
        Self { boxes, hash: OnceCell::new() }
    }


    pub fn len(&self) -> usize {
        self.boxes.len()
    }


    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }


    pub fn boxes(&self) -> &[IndexBox<D>] {
        &self.boxes
    }


    /**
     * Return the boxes for modification. The spatial hash is dropped first.
     */
    pub fn boxes_mut(&mut self) -> &mut Vec<IndexBox<D>> {
        self.clear_hash();
        &mut self.boxes
    }


    /**
     * Grow the store with empty boxes, or truncate it, to the given length.
     */
    pub fn resize(&mut self, len: usize) {
        self.boxes_mut().resize(len, IndexBox::empty())
    }


    /**
     * Return the spatial hash, building it if needed. Building is idempotent:
     * once the hash is present this is a plain load.
     */
    pub fn hash(&self) -> &SpatialHash<D> {
        self.hash.get_or_init(|| SpatialHash::build(&self.boxes))
    }


    pub fn has_hash(&self) -> bool {
        self.hash.get().is_some()
    }


    pub fn clear_hash(&mut self) {
        self.hash.take();
    }
}




// ============================================================================
impl<const D: usize> Clone for BoxStore<D> {

    /**
     * Deep-copy the boxes. The copy starts without a hash.
     */
    fn clone(&self) -> Self {
        Self::new(self.boxes.clone())
    }
}

impl<const D: usize> Drop for BoxStore<D> {
    fn drop(&mut self) {
        LIVE_STORES.fetch_sub(1, Ordering::Relaxed);
    }
}




// ============================================================================
#[cfg(test)]
mod test {

    use super::{stats, BoxStore};
    use crate::index_box::IndexBox;

    #[test]
    fn hash_is_built_once_and_dropped_on_mutation() {
        let mut store = BoxStore::new(vec![IndexBox::new([0, 0], [3, 3]), IndexBox::new([4, 0], [7, 3])]);
        assert!(!store.has_hash());

        let bins = store.hash().num_bins();
        assert!(store.has_hash());
        assert_eq!(store.hash().num_bins(), bins);

        store.boxes_mut()[1] = IndexBox::new([8, 8], [9, 9]);
        assert!(!store.has_hash());
        assert_eq!(store.hash().candidates(&IndexBox::new([8, 8], [8, 8])), vec![1]);
    }

    #[test]
    fn clone_is_deep_and_unhashed() {
        let store = BoxStore::new(vec![IndexBox::new([0, 0], [3, 3])]);
        store.hash();
        let mut copy = store.clone();
        assert!(!copy.has_hash());
        copy.resize(3);
        assert_eq!(copy.len(), 3);
        assert_eq!(store.len(), 1);
        assert!(copy.boxes()[2].is_empty());
    }

    #[test]
    fn stats_count_live_stores() {
        let store = BoxStore::new(vec![IndexBox::new([0, 0], [1, 1])]);
        let s = stats();
        assert!(s.live >= 1);
        assert!(s.high_water_mark >= 1);
        drop(store);
    }
}
