// Type-directed binary codec.
//
// Encoding rules:
// - fixed-width scalars: raw native-width bytes, no padding
// - bool: one byte, 0 or 1
// - String: i32 byte count, then the raw bytes (no terminator)
// - sequence and associative containers: i64 element count, then elements
//   in iteration order
// - tuples: components in declared order

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::hash::Hash;
use std::io::{self, Read, Write};

use bytemuck::Zeroable;
use hashbrown::{HashMap, HashSet};

/// Upper bound on speculative pre-allocation when reading a count prefix.
/// Larger containers still load; they just grow incrementally.
const MAX_PREALLOC: usize = 1 << 16;

/// Error raised when a value cannot be read or written.
///
/// Every read either yields a complete value or one of these errors; callers
/// never observe a partially decoded value.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("unexpected end of input while reading {what}")]
    Truncated { what: &'static str },
    #[error("invalid boolean byte {0:#04x}")]
    InvalidBool(u8),
    #[error("negative length prefix {0}")]
    NegativeLength(i64),
    #[error("invalid UTF-8 in string")]
    InvalidUtf8,
    #[error("{0}")]
    Malformed(String),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// A value with a stable binary representation.
pub trait Codec: Sized {
    fn write_to<W: Write + ?Sized>(&self, writer: &mut W) -> Result<(), CodecError>;

    fn read_from<R: Read + ?Sized>(reader: &mut R) -> Result<Self, CodecError>;
}

/// Serialize a value into a fresh byte vector.
pub fn to_bytes<T: Codec>(value: &T) -> Result<Vec<u8>, CodecError> {
    let mut buf = Vec::new();
    value.write_to(&mut buf)?;
    Ok(buf)
}

/// Deserialize a value from the front of `bytes`.
pub fn from_bytes<T: Codec>(mut bytes: &[u8]) -> Result<T, CodecError> {
    T::read_from(&mut bytes)
}

/// `read_exact` that reports a short read as [`CodecError::Truncated`].
pub fn read_exact<R: Read + ?Sized>(
    reader: &mut R,
    buf: &mut [u8],
    what: &'static str,
) -> Result<(), CodecError> {
    reader.read_exact(buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => CodecError::Truncated { what },
        _ => CodecError::Io(e),
    })
}

macro_rules! pod_codec {
    ($($t:ty),* $(,)?) => {
        $(
            impl Codec for $t {
                #[inline]
                fn write_to<W: Write + ?Sized>(&self, writer: &mut W) -> Result<(), CodecError> {
                    writer.write_all(bytemuck::bytes_of(self))?;
                    Ok(())
                }

                #[inline]
                fn read_from<R: Read + ?Sized>(reader: &mut R) -> Result<Self, CodecError> {
                    let mut value = <$t>::zeroed();
                    read_exact(reader, bytemuck::bytes_of_mut(&mut value), stringify!($t))?;
                    Ok(value)
                }
            }
        )*
    };
}

pod_codec!(i8, u8, i16, u16, i32, u32, i64, u64, f32, f64);

impl Codec for bool {
    fn write_to<W: Write + ?Sized>(&self, writer: &mut W) -> Result<(), CodecError> {
        (*self as u8).write_to(writer)
    }

    fn read_from<R: Read + ?Sized>(reader: &mut R) -> Result<Self, CodecError> {
        match u8::read_from(reader)? {
            0 => Ok(false),
            1 => Ok(true),
            b => Err(CodecError::InvalidBool(b)),
        }
    }
}

impl Codec for String {
    fn write_to<W: Write + ?Sized>(&self, writer: &mut W) -> Result<(), CodecError> {
        let len = i32::try_from(self.len())
            .map_err(|_| CodecError::Malformed(format!("string of {} bytes", self.len())))?;
        len.write_to(writer)?;
        writer.write_all(self.as_bytes())?;
        Ok(())
    }

    fn read_from<R: Read + ?Sized>(reader: &mut R) -> Result<Self, CodecError> {
        let len = i32::read_from(reader)?;
        if len < 0 {
            return Err(CodecError::NegativeLength(len as i64));
        }
        let mut bytes = Vec::with_capacity((len as usize).min(MAX_PREALLOC));
        Read::take(&mut *reader, len as u64).read_to_end(&mut bytes)?;
        if bytes.len() != len as usize {
            return Err(CodecError::Truncated { what: "string" });
        }
        String::from_utf8(bytes).map_err(|_| CodecError::InvalidUtf8)
    }
}

fn write_count<W: Write + ?Sized>(writer: &mut W, n: usize) -> Result<(), CodecError> {
    (n as i64).write_to(writer)
}

fn read_count<R: Read + ?Sized>(reader: &mut R) -> Result<usize, CodecError> {
    let n = i64::read_from(reader)?;
    if n < 0 {
        return Err(CodecError::NegativeLength(n));
    }
    usize::try_from(n).map_err(|_| CodecError::Malformed(format!("count {n} exceeds address space")))
}

impl<T: Codec> Codec for Vec<T> {
    fn write_to<W: Write + ?Sized>(&self, writer: &mut W) -> Result<(), CodecError> {
        write_count(writer, self.len())?;
        self.iter().try_for_each(|v| v.write_to(writer))
    }

    fn read_from<R: Read + ?Sized>(reader: &mut R) -> Result<Self, CodecError> {
        let n = read_count(reader)?;
        let mut out = Vec::with_capacity(n.min(MAX_PREALLOC));
        for _ in 0..n {
            out.push(T::read_from(reader)?);
        }
        Ok(out)
    }
}

impl<T: Codec> Codec for VecDeque<T> {
    fn write_to<W: Write + ?Sized>(&self, writer: &mut W) -> Result<(), CodecError> {
        write_count(writer, self.len())?;
        self.iter().try_for_each(|v| v.write_to(writer))
    }

    fn read_from<R: Read + ?Sized>(reader: &mut R) -> Result<Self, CodecError> {
        let n = read_count(reader)?;
        let mut out = VecDeque::with_capacity(n.min(MAX_PREALLOC));
        for _ in 0..n {
            out.push_back(T::read_from(reader)?);
        }
        Ok(out)
    }
}

impl<T: Codec + Ord> Codec for BTreeSet<T> {
    fn write_to<W: Write + ?Sized>(&self, writer: &mut W) -> Result<(), CodecError> {
        write_count(writer, self.len())?;
        self.iter().try_for_each(|v| v.write_to(writer))
    }

    fn read_from<R: Read + ?Sized>(reader: &mut R) -> Result<Self, CodecError> {
        let n = read_count(reader)?;
        let mut out = BTreeSet::new();
        for _ in 0..n {
            out.insert(T::read_from(reader)?);
        }
        Ok(out)
    }
}

impl<T: Codec + Hash + Eq> Codec for HashSet<T> {
    fn write_to<W: Write + ?Sized>(&self, writer: &mut W) -> Result<(), CodecError> {
        write_count(writer, self.len())?;
        self.iter().try_for_each(|v| v.write_to(writer))
    }

    fn read_from<R: Read + ?Sized>(reader: &mut R) -> Result<Self, CodecError> {
        let n = read_count(reader)?;
        let mut out = HashSet::with_capacity(n.min(MAX_PREALLOC));
        for _ in 0..n {
            out.insert(T::read_from(reader)?);
        }
        Ok(out)
    }
}

impl<K: Codec + Ord, V: Codec> Codec for BTreeMap<K, V> {
    fn write_to<W: Write + ?Sized>(&self, writer: &mut W) -> Result<(), CodecError> {
        write_count(writer, self.len())?;
        for (k, v) in self {
            k.write_to(writer)?;
            v.write_to(writer)?;
        }
        Ok(())
    }

    fn read_from<R: Read + ?Sized>(reader: &mut R) -> Result<Self, CodecError> {
        let n = read_count(reader)?;
        let mut out = BTreeMap::new();
        for _ in 0..n {
            let (k, v) = <(K, V)>::read_from(reader)?;
            out.insert(k, v);
        }
        Ok(out)
    }
}

impl<K: Codec + Hash + Eq, V: Codec> Codec for HashMap<K, V> {
    fn write_to<W: Write + ?Sized>(&self, writer: &mut W) -> Result<(), CodecError> {
        write_count(writer, self.len())?;
        for (k, v) in self {
            k.write_to(writer)?;
            v.write_to(writer)?;
        }
        Ok(())
    }

    fn read_from<R: Read + ?Sized>(reader: &mut R) -> Result<Self, CodecError> {
        let n = read_count(reader)?;
        let mut out = HashMap::with_capacity(n.min(MAX_PREALLOC));
        for _ in 0..n {
            let (k, v) = <(K, V)>::read_from(reader)?;
            out.insert(k, v);
        }
        Ok(out)
    }
}

impl<A: Codec, B: Codec> Codec for (A, B) {
    fn write_to<W: Write + ?Sized>(&self, writer: &mut W) -> Result<(), CodecError> {
        self.0.write_to(writer)?;
        self.1.write_to(writer)
    }

    fn read_from<R: Read + ?Sized>(reader: &mut R) -> Result<Self, CodecError> {
        let a = A::read_from(reader)?;
        let b = B::read_from(reader)?;
        Ok((a, b))
    }
}

impl<A: Codec, B: Codec, C: Codec> Codec for (A, B, C) {
    fn write_to<W: Write + ?Sized>(&self, writer: &mut W) -> Result<(), CodecError> {
        self.0.write_to(writer)?;
        self.1.write_to(writer)?;
        self.2.write_to(writer)
    }

    fn read_from<R: Read + ?Sized>(reader: &mut R) -> Result<Self, CodecError> {
        let a = A::read_from(reader)?;
        let b = B::read_from(reader)?;
        let c = C::read_from(reader)?;
        Ok((a, b, c))
    }
}
