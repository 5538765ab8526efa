// crates/nvmsafe-rs/src/value.rs
// Typed NVM element values and their byte encoding.

use crate::error::ModelError;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::convert::TryInto;
use core::fmt;
use core::str::FromStr;

/// Byte order of all multi-byte values inside one data pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Endianness {
    #[default]
    Little,
    Big,
}

impl Endianness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Endianness::Little => "little",
            Endianness::Big => "big",
        }
    }
}

impl FromStr for Endianness {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "little" => Ok(Endianness::Little),
            "big" => Ok(Endianness::Big),
            _ => Err(()),
        }
    }
}

/// The declared scalar type of an element (or of each entry of an array element).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ElementType {
    Unsigned8,
    Unsigned16,
    Unsigned32,
    Unsigned64,
    Signed8,
    Signed16,
    Signed32,
    Signed64,
    Real32,
    Real64,
}

impl ElementType {
    /// Encoded size of one scalar of this type.
    pub const fn size(&self) -> usize {
        match self {
            ElementType::Unsigned8 | ElementType::Signed8 => 1,
            ElementType::Unsigned16 | ElementType::Signed16 => 2,
            ElementType::Unsigned32 | ElementType::Signed32 | ElementType::Real32 => 4,
            ElementType::Unsigned64 | ElementType::Signed64 | ElementType::Real64 => 8,
        }
    }

    /// Name used in parameter-set files.
    pub const fn name(&self) -> &'static str {
        match self {
            ElementType::Unsigned8 => "uint8",
            ElementType::Unsigned16 => "uint16",
            ElementType::Unsigned32 => "uint32",
            ElementType::Unsigned64 => "uint64",
            ElementType::Signed8 => "sint8",
            ElementType::Signed16 => "sint16",
            ElementType::Signed32 => "sint32",
            ElementType::Signed64 => "sint64",
            ElementType::Real32 => "float32",
            ElementType::Real64 => "float64",
        }
    }

    /// The all-zero value of this type.
    pub const fn zero(&self) -> Scalar {
        match self {
            ElementType::Unsigned8 => Scalar::Unsigned8(0),
            ElementType::Unsigned16 => Scalar::Unsigned16(0),
            ElementType::Unsigned32 => Scalar::Unsigned32(0),
            ElementType::Unsigned64 => Scalar::Unsigned64(0),
            ElementType::Signed8 => Scalar::Signed8(0),
            ElementType::Signed16 => Scalar::Signed16(0),
            ElementType::Signed32 => Scalar::Signed32(0),
            ElementType::Signed64 => Scalar::Signed64(0),
            ElementType::Real32 => Scalar::Real32(0.0),
            ElementType::Real64 => Scalar::Real64(0.0),
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ElementType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "uint8" => Ok(ElementType::Unsigned8),
            "uint16" => Ok(ElementType::Unsigned16),
            "uint32" => Ok(ElementType::Unsigned32),
            "uint64" => Ok(ElementType::Unsigned64),
            "sint8" => Ok(ElementType::Signed8),
            "sint16" => Ok(ElementType::Signed16),
            "sint32" => Ok(ElementType::Signed32),
            "sint64" => Ok(ElementType::Signed64),
            "float32" => Ok(ElementType::Real32),
            "float64" => Ok(ElementType::Real64),
            other => Err(ModelError::UnknownTypeName(other.to_string())),
        }
    }
}

/// A single typed number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    Unsigned8(u8),
    Unsigned16(u16),
    Unsigned32(u32),
    Unsigned64(u64),
    Signed8(i8),
    Signed16(i16),
    Signed32(i32),
    Signed64(i64),
    Real32(f32),
    Real64(f64),
}

impl Scalar {
    pub const fn element_type(&self) -> ElementType {
        match self {
            Scalar::Unsigned8(_) => ElementType::Unsigned8,
            Scalar::Unsigned16(_) => ElementType::Unsigned16,
            Scalar::Unsigned32(_) => ElementType::Unsigned32,
            Scalar::Unsigned64(_) => ElementType::Unsigned64,
            Scalar::Signed8(_) => ElementType::Signed8,
            Scalar::Signed16(_) => ElementType::Signed16,
            Scalar::Signed32(_) => ElementType::Signed32,
            Scalar::Signed64(_) => ElementType::Signed64,
            Scalar::Real32(_) => ElementType::Real32,
            Scalar::Real64(_) => ElementType::Real64,
        }
    }

    /// Appends the encoded bytes of this value to `out`.
    pub fn serialize_into(&self, endianness: Endianness, out: &mut Vec<u8>) {
        macro_rules! put {
            ($v:expr) => {
                match endianness {
                    Endianness::Little => out.extend_from_slice(&$v.to_le_bytes()),
                    Endianness::Big => out.extend_from_slice(&$v.to_be_bytes()),
                }
            };
        }

        match self {
            Scalar::Unsigned8(v) => put!(v),
            Scalar::Unsigned16(v) => put!(v),
            Scalar::Unsigned32(v) => put!(v),
            Scalar::Unsigned64(v) => put!(v),
            Scalar::Signed8(v) => put!(v),
            Scalar::Signed16(v) => put!(v),
            Scalar::Signed32(v) => put!(v),
            Scalar::Signed64(v) => put!(v),
            Scalar::Real32(v) => put!(v),
            Scalar::Real64(v) => put!(v),
        }
    }

    /// Decodes exactly `ty.size()` bytes into a value of type `ty`.
    pub fn deserialize(
        data: &[u8],
        ty: ElementType,
        endianness: Endianness,
    ) -> Result<Scalar, ModelError> {
        if data.len() != ty.size() {
            return Err(ModelError::BufferLength {
                ty,
                expected: ty.size(),
                actual: data.len(),
            });
        }

        // Helper macro for fixed-size decoding; the length was checked above.
        macro_rules! get {
            ($variant:path, $type:ty) => {{
                let bytes: [u8; core::mem::size_of::<$type>()] =
                    data.try_into().map_err(|_| ModelError::BufferLength {
                        ty,
                        expected: ty.size(),
                        actual: data.len(),
                    })?;
                Ok($variant(match endianness {
                    Endianness::Little => <$type>::from_le_bytes(bytes),
                    Endianness::Big => <$type>::from_be_bytes(bytes),
                }))
            }};
        }

        match ty {
            ElementType::Unsigned8 => get!(Scalar::Unsigned8, u8),
            ElementType::Unsigned16 => get!(Scalar::Unsigned16, u16),
            ElementType::Unsigned32 => get!(Scalar::Unsigned32, u32),
            ElementType::Unsigned64 => get!(Scalar::Unsigned64, u64),
            ElementType::Signed8 => get!(Scalar::Signed8, i8),
            ElementType::Signed16 => get!(Scalar::Signed16, i16),
            ElementType::Signed32 => get!(Scalar::Signed32, i32),
            ElementType::Signed64 => get!(Scalar::Signed64, i64),
            ElementType::Real32 => get!(Scalar::Real32, f32),
            ElementType::Real64 => get!(Scalar::Real64, f64),
        }
    }

    /// Parses the file text form of a value of type `ty`.
    pub fn parse(text: &str, ty: ElementType) -> Result<Scalar, ModelError> {
        let text = text.trim();
        let invalid = || ModelError::InvalidValueText {
            ty,
            text: text.to_string(),
        };
        let value = match ty {
            ElementType::Unsigned8 => Scalar::Unsigned8(text.parse().map_err(|_| invalid())?),
            ElementType::Unsigned16 => Scalar::Unsigned16(text.parse().map_err(|_| invalid())?),
            ElementType::Unsigned32 => Scalar::Unsigned32(text.parse().map_err(|_| invalid())?),
            ElementType::Unsigned64 => Scalar::Unsigned64(text.parse().map_err(|_| invalid())?),
            ElementType::Signed8 => Scalar::Signed8(text.parse().map_err(|_| invalid())?),
            ElementType::Signed16 => Scalar::Signed16(text.parse().map_err(|_| invalid())?),
            ElementType::Signed32 => Scalar::Signed32(text.parse().map_err(|_| invalid())?),
            ElementType::Signed64 => Scalar::Signed64(text.parse().map_err(|_| invalid())?),
            ElementType::Real32 => match nan_bits(text) {
                Some(digits) => Scalar::Real32(f32::from_bits(
                    u32::from_str_radix(digits, 16).map_err(|_| invalid())?,
                )),
                None => Scalar::Real32(text.parse().map_err(|_| invalid())?),
            },
            ElementType::Real64 => match nan_bits(text) {
                Some(digits) => Scalar::Real64(f64::from_bits(
                    u64::from_str_radix(digits, 16).map_err(|_| invalid())?,
                )),
                None => Scalar::Real64(text.parse().map_err(|_| invalid())?),
            },
        };
        Ok(value)
    }

    /// Compares two values bit for bit, so `NaN` equals itself and `0.0`
    /// differs from `-0.0`. This is the comparison used to decide whether a
    /// device write is needed.
    pub fn same_bits(&self, other: &Scalar) -> bool {
        match (self, other) {
            (Scalar::Real32(a), Scalar::Real32(b)) => a.to_bits() == b.to_bits(),
            (Scalar::Real64(a), Scalar::Real64(b)) => a.to_bits() == b.to_bits(),
            _ => self == other,
        }
    }
}

/// Hex digits of a NaN written as raw bits (`0x7FC00001`).
fn nan_bits(text: &str) -> Option<&str> {
    text.strip_prefix("0x").or_else(|| text.strip_prefix("0X"))
}

/// Shortest text that parses back to the same value. NaN is written as its
/// raw bits so sign and payload survive.
impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Unsigned8(v) => write!(f, "{v}"),
            Scalar::Unsigned16(v) => write!(f, "{v}"),
            Scalar::Unsigned32(v) => write!(f, "{v}"),
            Scalar::Unsigned64(v) => write!(f, "{v}"),
            Scalar::Signed8(v) => write!(f, "{v}"),
            Scalar::Signed16(v) => write!(f, "{v}"),
            Scalar::Signed32(v) => write!(f, "{v}"),
            Scalar::Signed64(v) => write!(f, "{v}"),
            Scalar::Real32(v) if v.is_nan() => write!(f, "0x{:08X}", v.to_bits()),
            Scalar::Real64(v) if v.is_nan() => write!(f, "0x{:016X}", v.to_bits()),
            Scalar::Real32(v) => write!(f, "{v}"),
            Scalar::Real64(v) => write!(f, "{v}"),
        }
    }
}

/// The value of one list element: either a single scalar or a fixed-length
/// array of scalars sharing one type.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementValue {
    Scalar(Scalar),
    Array(Vec<Scalar>),
}

impl ElementValue {
    /// Declared scalar type, or `None` for an empty array.
    pub fn element_type(&self) -> Option<ElementType> {
        match self {
            ElementValue::Scalar(s) => Some(s.element_type()),
            ElementValue::Array(values) => values.first().map(Scalar::element_type),
        }
    }

    /// Number of scalars held (1 for a scalar).
    pub fn count(&self) -> usize {
        match self {
            ElementValue::Scalar(_) => 1,
            ElementValue::Array(values) => values.len(),
        }
    }

    pub fn scalars(&self) -> &[Scalar] {
        match self {
            ElementValue::Scalar(s) => core::slice::from_ref(s),
            ElementValue::Array(values) => values,
        }
    }

    /// Encoded size in bytes.
    pub fn encoded_len(&self) -> usize {
        self.scalars()
            .iter()
            .map(|s| s.element_type().size())
            .sum()
    }

    /// Serializes the value into a freshly allocated byte vector.
    pub fn serialize(&self, endianness: Endianness) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        self.serialize_into(endianness, &mut out);
        out
    }

    pub fn serialize_into(&self, endianness: Endianness, out: &mut Vec<u8>) {
        for scalar in self.scalars() {
            scalar.serialize_into(endianness, out);
        }
    }

    /// Decodes `data` as a scalar (`array_len == None`) or an array of
    /// `array_len` entries of type `ty`. The length must match exactly.
    pub fn deserialize(
        data: &[u8],
        ty: ElementType,
        array_len: Option<usize>,
        endianness: Endianness,
    ) -> Result<ElementValue, ModelError> {
        match array_len {
            None => Ok(ElementValue::Scalar(Scalar::deserialize(data, ty, endianness)?)),
            Some(len) => {
                let expected = ty.size() * len;
                if data.len() != expected {
                    return Err(ModelError::BufferLength {
                        ty,
                        expected,
                        actual: data.len(),
                    });
                }
                let values = data
                    .chunks_exact(ty.size())
                    .map(|chunk| Scalar::deserialize(chunk, ty, endianness))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(ElementValue::Array(values))
            }
        }
    }

    /// Bitwise comparison (see [`Scalar::same_bits`]).
    pub fn same_bits(&self, other: &ElementValue) -> bool {
        match (self, other) {
            (ElementValue::Scalar(a), ElementValue::Scalar(b)) => a.same_bits(b),
            (ElementValue::Array(a), ElementValue::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.same_bits(y))
            }
            _ => false,
        }
    }

    /// Text forms of all scalars, in order.
    pub fn to_text(&self) -> Vec<String> {
        self.scalars().iter().map(ToString::to_string).collect()
    }
}

impl From<Scalar> for ElementValue {
    fn from(value: Scalar) -> Self {
        ElementValue::Scalar(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    const ALL_TYPES: [ElementType; 10] = [
        ElementType::Unsigned8,
        ElementType::Unsigned16,
        ElementType::Unsigned32,
        ElementType::Unsigned64,
        ElementType::Signed8,
        ElementType::Signed16,
        ElementType::Signed32,
        ElementType::Signed64,
        ElementType::Real32,
        ElementType::Real64,
    ];

    #[test]
    fn test_basic_types_roundtrip() {
        let samples = [
            Scalar::Unsigned8(0xAA),
            Scalar::Unsigned16(0xAABB),
            Scalar::Unsigned32(0xAABB_CCDD),
            Scalar::Unsigned64(0x0102_0304_0506_0708),
            Scalar::Signed8(-5),
            Scalar::Signed16(-1234),
            Scalar::Signed32(-123_456),
            Scalar::Signed64(i64::MIN),
            Scalar::Real32(1.5),
            Scalar::Real64(-2.25e-10),
        ];
        for endianness in [Endianness::Little, Endianness::Big] {
            for sample in samples {
                let value = ElementValue::Scalar(sample);
                let bytes = value.serialize(endianness);
                assert_eq!(bytes.len(), sample.element_type().size());
                let back =
                    ElementValue::deserialize(&bytes, sample.element_type(), None, endianness)
                        .unwrap();
                assert_eq!(back, value);
            }
        }
    }

    #[test]
    fn test_endianness_byte_order() {
        let value = ElementValue::Scalar(Scalar::Unsigned32(0x1122_3344));
        assert_eq!(value.serialize(Endianness::Little), vec![0x44, 0x33, 0x22, 0x11]);
        assert_eq!(value.serialize(Endianness::Big), vec![0x11, 0x22, 0x33, 0x44]);
    }

    #[test]
    fn test_array_roundtrip() {
        let value = ElementValue::Array(vec![
            Scalar::Signed16(-1),
            Scalar::Signed16(2),
            Scalar::Signed16(i16::MAX),
        ]);
        let bytes = value.serialize(Endianness::Big);
        assert_eq!(bytes.len(), 6);
        let back =
            ElementValue::deserialize(&bytes, ElementType::Signed16, Some(3), Endianness::Big)
                .unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn test_deserialize_rejects_wrong_length() {
        let result =
            ElementValue::deserialize(&[0xAA, 0xBB, 0xCC], ElementType::Unsigned32, None, Endianness::Little);
        assert_eq!(
            result,
            Err(ModelError::BufferLength {
                ty: ElementType::Unsigned32,
                expected: 4,
                actual: 3
            })
        );

        let result =
            ElementValue::deserialize(&[0; 5], ElementType::Unsigned16, Some(2), Endianness::Little);
        assert!(matches!(result, Err(ModelError::BufferLength { expected: 4, actual: 5, .. })));
    }

    #[test]
    fn test_text_roundtrip_all_types() {
        for ty in ALL_TYPES {
            let zero = ty.zero();
            assert_eq!(Scalar::parse(&zero.to_string(), ty).unwrap(), zero);
            assert_eq!(ty.name().parse::<ElementType>().unwrap(), ty);
        }
        let awkward = Scalar::Real64(0.1 + 0.2);
        assert_eq!(Scalar::parse(&awkward.to_string(), ElementType::Real64).unwrap(), awkward);
        let small = Scalar::Real32(f32::MIN_POSITIVE);
        assert_eq!(Scalar::parse(&small.to_string(), ElementType::Real32).unwrap(), small);
    }

    #[test]
    fn test_parse_rejects_out_of_range() {
        assert!(matches!(
            Scalar::parse("256", ElementType::Unsigned8),
            Err(ModelError::InvalidValueText { .. })
        ));
        assert!(matches!(
            "int7".parse::<ElementType>(),
            Err(ModelError::UnknownTypeName(_))
        ));
    }

    #[test]
    fn test_nan_text_keeps_bits() {
        let quiet = Scalar::Real32(f32::from_bits(0xFFC0_0001));
        assert_eq!(quiet.to_string(), "0xFFC00001");
        let back = Scalar::parse(&quiet.to_string(), ElementType::Real32).unwrap();
        assert!(back.same_bits(&quiet));

        let wide = Scalar::Real64(f64::from_bits(0x7FF0_0000_0000_0ABC));
        let back = Scalar::parse(&wide.to_string(), ElementType::Real64).unwrap();
        assert!(back.same_bits(&wide));

        // Ordinary floats keep their decimal form.
        assert_eq!(Scalar::Real32(-2.5).to_string(), "-2.5");
        assert!(matches!(
            Scalar::parse("0xZZ", ElementType::Real32),
            Err(ModelError::InvalidValueText { .. })
        ));
    }

    #[test]
    fn test_same_bits_treats_nan_as_equal() {
        let a = ElementValue::Scalar(Scalar::Real32(f32::NAN));
        assert!(a.same_bits(&a.clone()));
        let z = ElementValue::Scalar(Scalar::Real64(0.0));
        let nz = ElementValue::Scalar(Scalar::Real64(-0.0));
        assert!(!z.same_bits(&nz));
    }
}
