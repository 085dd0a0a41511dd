use core::fmt;
use core::ops::{Add, Index, IndexMut, Mul, Neg, Sub};
use core::str::FromStr;
use serde::de::{self, Deserialize, Deserializer, SeqAccess, Visitor};
use serde::ser::{Serialize, SerializeTuple, Serializer};
use crate::error::Error;




/**
 * A point in a D-dimensional integer index space. Arithmetic is component
 * wise; a scalar on the right-hand side of `*` multiplies every component.
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IntVect<const D: usize>([i64; D]);




// ============================================================================
impl<const D: usize> IntVect<D> {


    pub const fn new(data: [i64; D]) -> Self {
        Self(data)
    }


    pub const fn zero() -> Self {
        Self([0; D])
    }


    pub const fn unit() -> Self {
        Self([1; D])
    }


    /**
     * Return a vector with every component equal to `value`.
     */
    pub const fn splat(value: i64) -> Self {
        Self([value; D])
    }


    /**
     * Return a vector which is zero, except for `value` on the given axis.
     */
    pub fn basis(dir: usize, value: i64) -> Self {
        let mut data = [0; D];
        data[dir] = value;
        Self(data)
    }


    pub fn as_array(&self) -> &[i64; D] {
        &self.0
    }


    pub fn min(self, other: Self) -> Self {
        self.zip_with(other, i64::min)
    }


    pub fn max(self, other: Self) -> Self {
        self.zip_with(other, i64::max)
    }


    /**
     * Return the product of the components.
     */
    pub fn product(&self) -> i64 {
        self.0.iter().product()
    }


    /**
     * Determine whether every component is less than or equal to the
     * corresponding component of `other`.
     */
    pub fn all_le(&self, other: &Self) -> bool {
        self.0.iter().zip(other.0.iter()).all(|(a, b)| a <= b)
    }


    /**
     * Determine whether every component is greater than or equal to the
     * corresponding component of `other`.
     */
    pub fn all_ge(&self, other: &Self) -> bool {
        other.all_le(self)
    }


    pub fn is_unit(&self) -> bool {
        self.0.iter().all(|&a| a == 1)
    }


    /**
     * Divide by a ratio, rounding toward negative infinity. The ratio must be
     * positive on every axis.
     */
    pub fn coarsen(self, ratio: Self) -> Self {
        self.zip_with(ratio, |a, r| a.div_euclid(r))
    }


    /**
     * Return an iterator over the points of the closed range `lo..=hi`, the
     * first axis varying fastest. The iterator is empty if `hi` is below `lo`
     * on any axis.
     */
    pub fn iter_between(lo: Self, hi: Self) -> IntVectRange<D> {
        IntVectRange {
            lo,
            hi,
            next: if lo.all_le(&hi) { Some(lo) } else { None },
        }
    }


    fn zip_with<F: Fn(i64, i64) -> i64>(self, other: Self, f: F) -> Self {
        let mut data = self.0;

        for (x, y) in data.iter_mut().zip(other.0.iter()) {
            *x = f(*x, *y)
        }
        Self(data)
    }
}




// ============================================================================
impl<const D: usize> Add for IntVect<D> {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        self.zip_with(other, |a, b| a + b)
    }
}

impl<const D: usize> Sub for IntVect<D> {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        self.zip_with(other, |a, b| a - b)
    }
}

impl<const D: usize> Mul for IntVect<D> {
    type Output = Self;

    fn mul(self, other: Self) -> Self {
        self.zip_with(other, |a, b| a * b)
    }
}

impl<const D: usize> Mul<i64> for IntVect<D> {
    type Output = Self;

    fn mul(self, other: i64) -> Self {
        self.zip_with(Self::splat(other), |a, b| a * b)
    }
}

impl<const D: usize> Neg for IntVect<D> {
    type Output = Self;

    fn neg(self) -> Self {
        Self::zero() - self
    }
}

impl<const D: usize> Index<usize> for IntVect<D> {
    type Output = i64;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl<const D: usize> IndexMut<usize> for IntVect<D> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.0[index]
    }
}

impl<const D: usize> From<[i64; D]> for IntVect<D> {
    fn from(data: [i64; D]) -> Self {
        Self(data)
    }
}




// ============================================================================
impl<const D: usize> fmt::Display for IntVect<D> {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "(")?;
        for (n, x) in self.0.iter().enumerate() {
            if n > 0 {
                write!(fmt, ",")?;
            }
            write!(fmt, "{}", x)?;
        }
        write!(fmt, ")")
    }
}

impl<const D: usize> FromStr for IntVect<D> {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let inner = s
            .trim()
            .strip_prefix('(')
            .and_then(|s| s.strip_suffix(')'))
            .ok_or_else(|| Error::Parse(format!("expected a parenthesized vector, got '{}'", s)))?;

        let mut data = [0; D];
        let mut count = 0;

        for item in inner.split(',') {
            if count == D {
                return Err(Error::Parse(format!("too many components in '{}'", s)));
            }
            data[count] = item
                .trim()
                .parse()
                .map_err(|e| Error::Parse(format!("bad component '{}': {}", item, e)))?;
            count += 1;
        }
        if count != D {
            return Err(Error::Parse(format!("expected {} components in '{}'", D, s)));
        }
        Ok(Self(data))
    }
}

impl<const D: usize> Serialize for IntVect<D> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(D)?;
        for x in &self.0 {
            tuple.serialize_element(x)?;
        }
        tuple.end()
    }
}

impl<'de, const D: usize> Deserialize<'de> for IntVect<D> {
    fn deserialize<De: Deserializer<'de>>(deserializer: De) -> Result<Self, De::Error> {
        struct ComponentVisitor<const N: usize>;

        impl<'de, const N: usize> Visitor<'de> for ComponentVisitor<N> {
            type Value = IntVect<N>;

            fn expecting(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(fmt, "a sequence of {} integers", N)
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let mut data = [0; N];
                for (n, x) in data.iter_mut().enumerate() {
                    *x = seq
                        .next_element()?
                        .ok_or_else(|| de::Error::invalid_length(n, &self))?;
                }
                Ok(IntVect(data))
            }
        }
        deserializer.deserialize_tuple(D, ComponentVisitor::<D>)
    }
}




/**
 * Iterator over the points of a closed rectangular range of `IntVect`.
 */
#[derive(Clone, Debug)]
pub struct IntVectRange<const D: usize> {
    lo: IntVect<D>,
    hi: IntVect<D>,
    next: Option<IntVect<D>>,
}

impl<const D: usize> Iterator for IntVectRange<D> {
    type Item = IntVect<D>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        let mut following = current;

        self.next = None;

        for d in 0..D {
            if following[d] < self.hi[d] {
                following[d] += 1;
                self.next = Some(following);
                break;
            }
            following[d] = self.lo[d];
        }
        Some(current)
    }
}




// ============================================================================
#[cfg(test)]
mod test {

    use super::IntVect;

    #[test]
    fn arithmetic_is_component_wise() {
        let a = IntVect::new([1, 2]);
        let b = IntVect::new([3, -4]);
        assert_eq!(a + b, IntVect::new([4, -2]));
        assert_eq!(a - b, IntVect::new([-2, 6]));
        assert_eq!(a * b, IntVect::new([3, -8]));
        assert_eq!(a * 3, IntVect::new([3, 6]));
        assert_eq!(-a, IntVect::new([-1, -2]));
        assert_eq!(a.min(b), IntVect::new([1, -4]));
        assert_eq!(a.max(b), IntVect::new([3, 2]));
    }

    #[test]
    fn coarsening_rounds_toward_negative_infinity() {
        let r = IntVect::splat(2);
        assert_eq!(IntVect::new([5, -1]).coarsen(r), IntVect::new([2, -1]));
        assert_eq!(IntVect::new([-4, -3]).coarsen(r), IntVect::new([-2, -2]));
    }

    #[test]
    fn range_iteration_covers_every_point_once() {
        let points: Vec<_> = IntVect::iter_between(IntVect::new([0, 0]), IntVect::new([2, 1])).collect();
        assert_eq!(points.len(), 6);
        assert_eq!(points[0], IntVect::new([0, 0]));
        assert_eq!(points[1], IntVect::new([1, 0]));
        assert_eq!(points[5], IntVect::new([2, 1]));
        assert_eq!(IntVect::iter_between(IntVect::new([1, 0]), IntVect::new([0, 3])).count(), 0);
    }

    #[test]
    fn can_parse_display_output() {
        let a = IntVect::new([-3, 7, 12]);
        assert_eq!(a.to_string(), "(-3,7,12)");
        assert_eq!(a.to_string().parse::<IntVect<3>>().unwrap(), a);
        assert!("(1,2)".parse::<IntVect<3>>().is_err());
        assert!("1,2,3".parse::<IntVect<3>>().is_err());
    }
}
