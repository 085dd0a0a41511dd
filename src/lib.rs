//! Gridbox is the domain-decomposition index of a block-structured adaptive
//! mesh refinement (AMR) code. A grid level is described by a `BoxArray`: an
//! indexed collection of rectangular patches in a discrete index space.
//! Copies of an array share one store of boxes, and views of it at another
//! index type or a coarser resolution are made without copying any boxes.
//! Spatial queries (point containment, box intersection, complement) go
//! through a uniform-grid hash which is built on first use and shared by all
//! the views of a store.
//!
//! Every geometric type is generic over the spatial dimension `D`, which is
//! usually inferred from array literals:
//!
//! ```
//! use gridbox::{BoxArray, IndexBox, IntVect};
//!
//! let mut level = BoxArray::from_box(IndexBox::new([0, 0], [63, 63]));
//! level.max_size(IntVect::splat(16)).unwrap();
//! assert_eq!(level.len().unwrap(), 16);
//!
//! let hits = level.intersections(&IndexBox::new([15, 15], [16, 16]), false, IntVect::zero()).unwrap();
//! assert_eq!(hits.len(), 4);
//! ```

pub mod box_array;
pub mod box_list;
pub mod error;
pub mod hash;
pub mod index_box;
pub mod index_type;
pub mod int_vect;
pub mod io;
pub mod ops;
pub mod store;
pub mod transform;

pub use box_array::{BoxArray, RefId};
pub use box_list::BoxList;
pub use error::{Error, Result};
pub use index_box::IndexBox;
pub use index_type::{Centering, IndexType};
pub use int_vect::IntVect;
pub use transform::{BoxMap, BoxTransform, Orientation, Side, TransformKind};
