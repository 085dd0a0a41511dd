use std::sync::Arc;
use proptest::prelude::*;
use rayon::prelude::*;
use gridbox::io::{read_box_array, read_cbor, write_box_array, write_cbor};
use gridbox::{BoxArray, BoxMap, BoxTransform, IndexBox, IndexType, IntVect, Orientation, Side};




fn arb_box() -> impl Strategy<Value = IndexBox<2>> {
    (-20i64..20, -20i64..20, 0i64..8, 0i64..8)
        .prop_map(|(x, y, w, h)| IndexBox::new([x, y], [x + w, y + h]))
}

fn arb_array() -> impl Strategy<Value = BoxArray<2>> {
    prop::collection::vec(arb_box(), 1..24).prop_map(|boxes| BoxArray::from_boxes(boxes).unwrap())
}

fn brute_force(ba: &BoxArray<2>, q: &IndexBox<2>, ng: IntVect<2>) -> Vec<(usize, IndexBox<2>)> {
    ba.iter()
        .unwrap()
        .enumerate()
        .filter_map(|(i, b)| q.intersection(&b.grow(ng)).map(|isect| (i, isect)))
        .collect()
}

fn covers(ba: &BoxArray<2>, p: &IntVect<2>) -> bool {
    ba.iter().unwrap().any(|b| b.contains_point(p))
}




#[derive(Debug)]
struct Mirror;

impl BoxMap<2> for Mirror {
    fn apply(&self, coarse: &IndexBox<2>, typ: IndexType<2>) -> IndexBox<2> {
        let lo = coarse.small_end();
        let hi = coarse.big_end();
        IndexBox::new([lo[0], lo[1]], [hi[0] + 2, hi[1]]).convert(typ)
    }
    fn doi_lo(&self) -> IntVect<2> {
        IntVect::zero()
    }
    fn doi_hi(&self) -> IntVect<2> {
        IntVect::new([3, 1])
    }
}




proptest! {
    #[test]
    fn hashed_intersections_match_brute_force(ba in arb_array(), q in arb_box(), g in 0i64..3) {
        let ng = IntVect::splat(g);
        prop_assert_eq!(ba.intersections(&q, false, ng).unwrap(), brute_force(&ba, &q, ng));
        prop_assert_eq!(ba.intersects(&q, ng).unwrap(), !brute_force(&ba, &q, ng).is_empty());

        let first = ba.intersections(&q, true, ng).unwrap();
        let expected = brute_force(&ba, &q, ng);
        prop_assert_eq!(first.first(), expected.first());
    }

    #[test]
    fn views_answer_queries_like_their_boxes(ba in arb_array(), q in arb_box(), g in -1i64..3) {
        let ng = IntVect::splat(g);
        for view in [
            ba.converted(IndexType::node()).unwrap(),
            ba.converted(IndexType::face(1)).unwrap(),
            BoxArray::with_transform(&ba, BoxTransform::custom(IndexType::cell(), IntVect::unit(), Arc::new(Mirror))).unwrap(),
            BoxArray::with_transform(&ba, BoxTransform::simple(IndexType::cell(), IntVect::splat(2))).unwrap(),
            BoxArray::with_transform(&ba, BoxTransform::simple(IndexType::node(), IntVect::new([3, 1]))).unwrap(),
            ba.boundary(Orientation::new(0, Side::High), 1, 1, 1).unwrap(),
            ba.boundary(Orientation::new(1, Side::Low), 2, 0, 0).unwrap(),
        ] {
            let q = q.convert(view.ix_type());
            prop_assert!(BoxArray::same_refs(&ba, &view));
            prop_assert_eq!(view.intersections(&q, false, ng).unwrap(), brute_force(&view, &q, ng));
            prop_assert_eq!(view.contains_point(&q.small_end()).unwrap(), covers(&view, &q.small_end()));
        }
    }

    #[test]
    fn point_queries_match_brute_force(ba in arb_array(), x in -25i64..30, y in -25i64..30) {
        let p = IntVect::new([x, y]);
        prop_assert_eq!(ba.contains_point(&p).unwrap(), covers(&ba, &p));
    }

    #[test]
    fn copies_never_see_mutations(ba in arb_array(), shift in -5i64..5, i in 0usize..24) {
        let before: Vec<_> = ba.iter().unwrap().collect();
        let mut copy = ba.clone();
        copy.shift(IntVect::new([shift, 1])).unwrap();
        let i = i % before.len();
        copy.set(i, IndexBox::new([100, 100], [101, 101])).unwrap();

        prop_assert_eq!(ba.iter().unwrap().collect::<Vec<_>>(), before);
        prop_assert!(!BoxArray::same_refs(&ba, &copy));
        prop_assert_eq!(copy.get(i).unwrap(), IndexBox::new([100, 100], [101, 101]));
    }

    #[test]
    fn remove_overlap_keeps_the_covered_cells(ba in arb_array(), simplify in any::<bool>()) {
        let mut disjoint = ba.clone();
        disjoint.remove_overlap(simplify).unwrap();
        prop_assert!(disjoint.is_disjoint().unwrap());

        let domain = ba.minimal_box().unwrap();
        for p in domain.iter() {
            prop_assert_eq!(covers(&ba, &p), covers(&disjoint, &p));
        }
        let again = {
            let mut again = disjoint.clone();
            again.remove_overlap(simplify).unwrap();
            again
        };
        prop_assert_eq!(again.num_pts().unwrap(), disjoint.num_pts().unwrap());
        prop_assert!(disjoint.contains_array(&ba, true).unwrap());
        prop_assert!(ba.contains_array(&disjoint, false).unwrap());
    }

    #[test]
    fn max_size_keeps_the_covered_cells(ba in arb_array(), bx in 1i64..5, by in 1i64..5) {
        let block = IntVect::new([bx, by]);
        let mut split = ba.clone();
        split.max_size(block).unwrap();

        prop_assert_eq!(split.num_pts().unwrap(), ba.num_pts().unwrap());
        prop_assert!(split.iter().unwrap().all(|b| b.length().all_le(&block)));
    }

    #[test]
    fn refine_then_coarsen_is_the_identity(ba in arb_array(), r in 1i64..5) {
        let ratio = IntVect::splat(r);
        let mut fine = ba.clone();
        fine.refine(ratio).unwrap();
        prop_assert!(fine.coarsenable(ratio, 1).unwrap());

        let view = fine.coarsened(ratio).unwrap();
        prop_assert_eq!(&view, &ba);

        fine.coarsen(ratio).unwrap();
        prop_assert_eq!(&fine, &ba);
    }

    #[test]
    fn checkpoints_round_trip(ba in arb_array(), r in 1i64..4, node in any::<bool>()) {
        let mut fine = ba.clone();
        fine.refine(IntVect::splat(r)).unwrap();
        let mut view = fine.coarsened(IntVect::splat(r)).unwrap();

        if node {
            view.surrounding_nodes().unwrap();
        }
        let mut text = Vec::new();
        write_box_array(&view, &mut text).unwrap();
        let from_text: BoxArray<2> = read_box_array(text.as_slice()).unwrap();
        prop_assert_eq!(&from_text, &view);
        prop_assert_eq!(from_text.crse_ratio(), view.crse_ratio());

        let mut cbor = Vec::new();
        write_cbor(&view, &mut cbor).unwrap();
        let from_cbor: BoxArray<2> = read_cbor(cbor.as_slice()).unwrap();
        prop_assert_eq!(&from_cbor, &view);
    }
}




#[test]
fn concurrent_first_queries_agree_with_a_serial_scan() {
    let mut ba = BoxArray::from_box(IndexBox::new([0, 0], [127, 127]));
    ba.max_size(IntVect::splat(8)).unwrap();
    ba.grow(IntVect::splat(1)).unwrap();
    assert!(!ba.hash_built());

    let queries: Vec<_> = (0..512)
        .map(|n| {
            let x = (n * 37) % 140 - 6;
            let y = (n * 59) % 140 - 6;
            IndexBox::new([x, y], [x + n % 5, y + n % 3])
        })
        .collect();

    let parallel: Vec<_> = queries
        .par_iter()
        .map(|q| ba.intersections(q, false, IntVect::zero()).unwrap())
        .collect();

    assert!(ba.hash_built());

    for (q, found) in queries.iter().zip(parallel) {
        assert_eq!(found, brute_force(&ba, q, IntVect::zero()));
    }
}

#[test]
fn views_share_one_hash() {
    let mut ba = BoxArray::from_box(IndexBox::new([0, 0], [63, 63]));
    ba.max_size(IntVect::splat(16)).unwrap();
    let nodes = ba.converted(IndexType::node()).unwrap();
    let coarse = ba.coarsened(IntVect::splat(4)).unwrap();

    assert!(!ba.hash_built());
    nodes.contains_point(&IntVect::new([16, 16])).unwrap();
    assert!(ba.hash_built());
    assert!(coarse.hash_built());
    assert_eq!(ba.ref_count(), 3);
}
