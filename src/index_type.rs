use core::fmt;
use serde::de::{self, Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};
use crate::int_vect::IntVect;




/**
 * Identifier for where an index addresses a zone along one axis
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Centering {
    Cell,
    Node,
}




/**
 * The centering of a box along each axis. A box which is node-centered on
 * one axis and cell-centered on the others addresses the faces normal to
 * that axis.
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct IndexType<const D: usize>([Centering; D]);




// ============================================================================
impl<const D: usize> IndexType<D> {


    pub const fn cell() -> Self {
        Self([Centering::Cell; D])
    }


    pub const fn node() -> Self {
        Self([Centering::Node; D])
    }


    pub const fn new(centering: [Centering; D]) -> Self {
        Self(centering)
    }


    /**
     * Return the index type which is node-centered on the given axis only.
     */
    pub fn face(dir: usize) -> Self {
        Self::cell().with(dir, Centering::Node)
    }


    /**
     * Build an index type from a vector of zeros (cell) and ones (node).
     */
    pub fn from_int_vect(iv: IntVect<D>) -> Option<Self> {
        let mut centering = [Centering::Cell; D];

        for (d, c) in centering.iter_mut().enumerate() {
            *c = match iv[d] {
                0 => Centering::Cell,
                1 => Centering::Node,
                _ => return None,
            }
        }
        Some(Self(centering))
    }


    pub fn centering(&self, dir: usize) -> Centering {
        self.0[dir]
    }


    pub fn node_centered(&self, dir: usize) -> bool {
        self.0[dir] == Centering::Node
    }


    pub fn is_cell_centered(&self) -> bool {
        self.0.iter().all(|&c| c == Centering::Cell)
    }


    pub fn is_node_centered(&self) -> bool {
        self.0.iter().all(|&c| c == Centering::Node)
    }


    /**
     * Return a copy of this index type with the centering changed on one
     * axis.
     */
    pub fn with(mut self, dir: usize, centering: Centering) -> Self {
        self.0[dir] = centering;
        self
    }


    /**
     * Return a vector with 1 on the node-centered axes and 0 elsewhere.
     */
    pub fn ix_type(&self) -> IntVect<D> {
        let mut iv = IntVect::zero();

        for d in 0..D {
            if self.node_centered(d) {
                iv[d] = 1
            }
        }
        iv
    }
}

impl<const D: usize> Default for IndexType<D> {
    fn default() -> Self {
        Self::cell()
    }
}




// ============================================================================
impl<const D: usize> fmt::Display for IndexType<D> {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "{}", self.ix_type())
    }
}

impl<const D: usize> Serialize for IndexType<D> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.ix_type().serialize(serializer)
    }
}

impl<'de, const D: usize> Deserialize<'de> for IndexType<D> {
    fn deserialize<De: Deserializer<'de>>(deserializer: De) -> Result<Self, De::Error> {
        let iv = IntVect::<D>::deserialize(deserializer)?;
        Self::from_int_vect(iv)
            .ok_or_else(|| de::Error::custom(format!("invalid index type {}", iv)))
    }
}




// ============================================================================
#[cfg(test)]
mod test {

    use super::{Centering, IndexType};
    use crate::int_vect::IntVect;

    #[test]
    fn face_type_is_node_centered_on_one_axis() {
        let t = IndexType::<3>::face(1);
        assert!(!t.node_centered(0));
        assert!(t.node_centered(1));
        assert!(!t.is_cell_centered());
        assert!(!t.is_node_centered());
        assert_eq!(t.ix_type(), IntVect::new([0, 1, 0]));
        assert_eq!(t.with(1, Centering::Cell), IndexType::cell());
    }

    #[test]
    fn int_vect_conversion_rejects_other_values() {
        assert_eq!(IndexType::from_int_vect(IntVect::new([1, 1])), Some(IndexType::node()));
        assert_eq!(IndexType::from_int_vect(IntVect::new([0, 2])), None);
    }
}
