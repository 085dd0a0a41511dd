use core::fmt;
use core::str::FromStr;
use std::io::{BufRead, Read, Write};
use serde::{de, ser, Deserialize, Deserializer, Serialize, Serializer};
use crate::box_array::BoxArray;
use crate::error::{Error, Result};
use crate::index_box::IndexBox;
use crate::index_type::IndexType;
use crate::int_vect::IntVect;




/**
 * The serialized form of a box array. The boxes are in the index space of
 * the array's finest resolution; the coarsening ratio maps them to the boxes
 * the array presents.
 */
#[derive(Serialize, Deserialize)]
struct BoxArrayRecord<const D: usize> {
    ix_type: IndexType<D>,
    crse_ratio: IntVect<D>,
    boxes: Vec<IndexBox<D>>,
}




/**
 * Write a box array in the text checkpoint format:
 *
 * ```text
 * (<count> <ix_type> <crse_ratio>
 * ((lo) (hi) (typ))
 * ...
 * )
 * ```
 *
 * with one box per line, in index order.
 */
pub fn write_box_array<const D: usize, W: Write>(ba: &BoxArray<D>, mut writer: W) -> Result<()> {
    let (typ, crse_ratio, boxes) = ba.to_parts()?;

    writeln!(writer, "({} {} {}", boxes.len(), typ, crse_ratio)?;

    for b in &boxes {
        writeln!(writer, "{}", b)?;
    }
    writeln!(writer, ")")?;
    Ok(())
}




/**
 * Read a box array written by `write_box_array`. The result reproduces the
 * length, index type, coarsening ratio, and every box of the array that was
 * written.
 */
pub fn read_box_array<const D: usize, R: BufRead>(reader: R) -> Result<BoxArray<D>> {
    let mut lines = reader.lines();

    let header = loop {
        match lines.next() {
            Some(line) => {
                let line = line?;
                if !line.trim().is_empty() {
                    break line;
                }
            }
            None => return Err(Error::Parse("missing box array header".to_string())),
        }
    };

    let fields = header
        .trim()
        .strip_prefix('(')
        .ok_or_else(|| Error::Parse(format!("bad box array header '{}'", header)))?
        .split_whitespace()
        .collect::<Vec<_>>();

    if fields.len() != 3 {
        return Err(Error::Parse(format!("expected count, index type and ratio in '{}'", header)));
    }
    let count: usize = fields[0]
        .parse()
        .map_err(|e| Error::Parse(format!("bad box count '{}': {}", fields[0], e)))?;
    let typ = parse_ix_type(fields[1])?;
    let crse_ratio: IntVect<D> = fields[2].parse()?;
    let mut boxes = Vec::with_capacity(count.min(1024));

    for _ in 0..count {
        let line = lines
            .next()
            .ok_or_else(|| Error::Parse(format!("expected {} boxes, found {}", count, boxes.len())))??;
        boxes.push(line.parse()?);
    }

    let closing = lines.next().transpose()?;

    if closing.as_deref().map(str::trim) != Some(")") {
        return Err(Error::Parse("missing closing parenthesis".to_string()));
    }
    BoxArray::from_parts(typ, crse_ratio, boxes)
}




/**
 * Write a box array as CBOR.
 */
pub fn write_cbor<const D: usize, W: Write>(ba: &BoxArray<D>, writer: W) -> Result<()> {
    ciborium::ser::into_writer(ba, writer).map_err(|e| match e {
        ciborium::ser::Error::Io(e) => Error::Io(e),
        e => Error::Cbor(e.to_string()),
    })
}




/**
 * Read a box array written by `write_cbor`.
 */
pub fn read_cbor<const D: usize, R: Read>(reader: R) -> Result<BoxArray<D>> {
    ciborium::de::from_reader(reader).map_err(|e| match e {
        ciborium::de::Error::Io(e) => Error::Io(e),
        e => Error::Cbor(e.to_string()),
    })
}




fn parse_ix_type<const D: usize>(s: &str) -> Result<IndexType<D>> {
    let iv: IntVect<D> = s.parse()?;
    IndexType::from_int_vect(iv).ok_or_else(|| Error::Parse(format!("invalid index type '{}'", s)))
}




// ============================================================================
impl<const D: usize> fmt::Display for BoxArray<D> {

    /**
     * Format in the text checkpoint format. An undefined array is written
     * as `()`.
     */
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (typ, crse_ratio, boxes) = match self.to_parts() {
            Ok(parts) => parts,
            Err(_) => return write!(fmt, "()"),
        };
        writeln!(fmt, "({} {} {}", boxes.len(), typ, crse_ratio)?;

        for b in &boxes {
            writeln!(fmt, "{}", b)?;
        }
        write!(fmt, ")")
    }
}

impl<const D: usize> FromStr for BoxArray<D> {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim() == "()" {
            Ok(Self::new())
        } else {
            read_box_array(s.as_bytes())
        }
    }
}

impl<const D: usize> Serialize for BoxArray<D> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let (ix_type, crse_ratio, boxes) = self.to_parts().map_err(<S::Error as ser::Error>::custom)?;
        BoxArrayRecord { ix_type, crse_ratio, boxes }.serialize(serializer)
    }
}

impl<'de, const D: usize> Deserialize<'de> for BoxArray<D> {
    fn deserialize<De: Deserializer<'de>>(deserializer: De) -> std::result::Result<Self, De::Error> {
        let record = BoxArrayRecord::<D>::deserialize(deserializer)?;
        BoxArray::from_parts(record.ix_type, record.crse_ratio, record.boxes).map_err(<De::Error as de::Error>::custom)
    }
}




// ============================================================================
#[cfg(test)]
mod test {

    use super::{read_box_array, read_cbor, write_box_array, write_cbor};
    use crate::box_array::BoxArray;
    use crate::error::Error;
    use crate::index_box::IndexBox;
    use crate::index_type::IndexType;
    use crate::int_vect::IntVect;
    use crate::transform::{Orientation, Side};

    fn sample() -> BoxArray<2> {
        BoxArray::from_boxes(vec![IndexBox::new([0, 0], [7, 7]), IndexBox::new([8, -4], [11, 3])]).unwrap()
    }

    #[test]
    fn text_format_matches_the_checkpoint_layout() {
        let mut buffer = Vec::new();
        write_box_array(&sample(), &mut buffer).unwrap();
        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            "(2 (0,0) (1,1)\n((0,0) (7,7) (0,0))\n((8,-4) (11,3) (0,0))\n)\n");
    }

    #[test]
    fn text_round_trip_keeps_ratio_and_type() {
        let ba = sample().coarsened(IntVect::splat(4)).unwrap().converted(IndexType::face(0)).unwrap();
        let text = ba.to_string();
        assert!(text.starts_with("(2 (1,0) (4,4)\n((0,0) (8,7) (1,0))"));

        let back: BoxArray<2> = text.parse().unwrap();
        assert_eq!(back, ba);
        assert_eq!(back.crse_ratio(), IntVect::splat(4));
        assert_eq!(back.get(1).unwrap(), ba.get(1).unwrap());
    }

    #[test]
    fn boundary_views_are_written_as_presented_boxes() {
        let ba = sample().boundary(Orientation::new(1, Side::Low), 1, 1, 0).unwrap();
        let back: BoxArray<2> = ba.to_string().parse().unwrap();
        assert!(back.transform().is_simple());
        assert_eq!(back, ba);
    }

    #[test]
    fn empty_boxes_survive_a_round_trip() {
        let mut ba = sample();
        ba.resize(3).unwrap();
        ba.surrounding_nodes().unwrap();
        let back: BoxArray<2> = ba.to_string().parse().unwrap();
        assert_eq!(back.len().unwrap(), 3);
        assert!(back.get(2).unwrap().is_empty());
        assert_eq!(back, ba);
    }

    #[test]
    fn undefined_arrays_are_written_as_empty_parentheses() {
        let ba = BoxArray::<2>::new();
        assert_eq!(ba.to_string(), "()");
        assert_eq!("()".parse::<BoxArray<2>>().unwrap(), ba);
        assert!(matches!(write_box_array(&ba, Vec::new()), Err(Error::NotDefined)));
    }

    #[test]
    fn malformed_text_is_rejected() {
        for text in [
            "",
            "(2 (0,0) (1,1)\n((0,0) (7,7) (0,0))\n)\n",
            "(1 (0,2) (1,1)\n((0,0) (7,7) (0,0))\n)\n",
            "(1 (0,0) (1,1)\n((0,0) (7,7) (0,0))\n",
            "(1 (0,0)\n((0,0) (7,7) (0,0))\n)\n",
            "(1 (0,0) (0,1)\n((0,0) (7,7) (0,0))\n)\n",
            "(1 (0,0) (1,1)\n((0,0) (7,7) (1,1))\n)\n",
            "(18446744073709551615 (0,0) (1,1)\n((0,0) (1,1) (0,0))\n)\n",
        ] {
            assert!(read_box_array::<2, _>(text.as_bytes()).is_err(), "accepted '{}'", text);
        }
    }

    #[test]
    fn cbor_round_trip() {
        let ba = sample().coarsened(IntVect::splat(2)).unwrap();
        let mut buffer = Vec::new();
        write_cbor(&ba, &mut buffer).unwrap();
        let back: BoxArray<2> = read_cbor(buffer.as_slice()).unwrap();
        assert_eq!(back, ba);
        assert_eq!(back.crse_ratio(), IntVect::splat(2));
    }

    #[test]
    fn cbor_of_an_undefined_array_fails() {
        assert!(matches!(write_cbor(&BoxArray::<2>::new(), Vec::new()), Err(Error::Cbor(_))));
        assert!(read_cbor::<2, _>(&b"\xff"[..]).is_err());
    }
}
