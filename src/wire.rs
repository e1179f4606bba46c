//! Wire primitives
//!
//! The three byte-level building blocks of the protocol's wire format, all
//! big-endian:
//!
//! - **Fixed-width unsigned integers** [`Byte`] / [`Short`] / [`Int`]
//!   (1 / 2 / 4 bytes), produced by one macro so the encode/decode logic has a
//!   single definition site.
//! - **MPI**: a 4-byte length prefix followed by the minimal-length magnitude
//!   of a non-negative integer. Zero carries the single magnitude byte `0x00`.
//! - **TLV**: a 2-byte type, a 2-byte length, and exactly `length` value
//!   bytes.
//!
//! Decoding distinguishes two failure classes: malformed already-received
//! bytes ([`SmpError::Malformed`]) and a byte source that yielded fewer bytes
//! than requested ([`SmpError::ShortRead`], raised only by
//! [`Tlv::read_from`]). The distinction matters to transports: the former is
//! corrupt or hostile input, the latter just means the stream has not
//! delivered enough yet.

#![forbid(unsafe_code)]
#![allow(missing_docs)]

use std::io::Read;

use num_bigint::{BigInt, Sign};
use num_traits::Signed;

use crate::error::SmpError;

macro_rules! fixed_uint {
    ($(#[$meta:meta])* $name:ident, $inner:ty, $width:expr) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Debug, PartialEq, Eq)]
        pub struct $name(pub $inner);

        impl $name {
            /// Encoded width in bytes.
            pub const WIDTH: usize = $width;

            /// Build from a host-sized value, failing when it does not fit.
            pub fn checked(value: usize) -> Result<Self, SmpError> {
                <$inner>::try_from(value).map(Self).map_err(|_| {
                    SmpError::OutOfRange(format!(
                        concat!(stringify!($name), " cannot represent {} (max {})"),
                        value,
                        <$inner>::MAX,
                    ))
                })
            }

            /// Big-endian encoding, exactly [`Self::WIDTH`] bytes.
            #[inline]
            pub fn to_bytes(self) -> [u8; $width] {
                self.0.to_be_bytes()
            }

            /// Decode from a slice of exactly [`Self::WIDTH`] bytes.
            pub fn from_bytes(bytes: &[u8]) -> Result<Self, SmpError> {
                let arr: [u8; $width] = bytes.try_into().map_err(|_| {
                    SmpError::Malformed(concat!(
                        stringify!($name),
                        " requires exactly its fixed width of bytes"
                    ))
                })?;
                Ok(Self(<$inner>::from_be_bytes(arr)))
            }
        }
    };
}

fixed_uint!(
    /// One-byte unsigned integer.
    Byte, u8, 1
);
fixed_uint!(
    /// Two-byte unsigned big-endian integer (TLV type and length fields).
    Short, u16, 2
);
fixed_uint!(
    /// Four-byte unsigned big-endian integer (MPI lengths and counts).
    Int, u32, 4
);

/// A length-prefixed, minimally-encoded non-negative integer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mpi {
    value: BigInt,
}

impl Mpi {
    /// Width of the length prefix in bytes.
    pub const LENGTH_WIDTH: usize = Int::WIDTH;

    /// Wrap a non-negative integer; negative values are a range error.
    pub fn new(value: BigInt) -> Result<Self, SmpError> {
        if value.is_negative() {
            return Err(SmpError::OutOfRange(format!(
                "MPI requires a non-negative value, got {value}"
            )));
        }
        Ok(Self { value })
    }

    /// Borrow the wrapped integer.
    #[inline]
    pub fn value(&self) -> &BigInt {
        &self.value
    }

    /// Unwrap the integer.
    #[inline]
    pub fn into_value(self) -> BigInt {
        self.value
    }

    /// Serialize as `length:u32 || magnitude`, where the magnitude is the
    /// minimal big-endian encoding (a single `0x00` for zero).
    pub fn to_bytes(&self) -> Vec<u8> {
        let (_, magnitude) = self.value.to_bytes_be();
        let len = Int::checked(magnitude.len()).expect("MPI magnitude length fits four bytes");
        let mut out = Vec::with_capacity(Self::LENGTH_WIDTH + magnitude.len());
        out.extend_from_slice(&len.to_bytes());
        out.extend_from_slice(&magnitude);
        out
    }

    /// Parse one MPI off the front of `bytes`, returning it together with
    /// the unconsumed remainder. Used to walk the MPI sequence inside a TLV
    /// payload.
    pub fn consume(bytes: &[u8]) -> Result<(Self, &[u8]), SmpError> {
        if bytes.len() < Self::LENGTH_WIDTH {
            return Err(SmpError::Malformed("MPI is missing its length prefix"));
        }
        let len = Int::from_bytes(&bytes[..Self::LENGTH_WIDTH])?.0 as usize;
        let rest = &bytes[Self::LENGTH_WIDTH..];
        if rest.len() < len {
            return Err(SmpError::Malformed(
                "MPI length prefix exceeds the available bytes",
            ));
        }
        let value = BigInt::from_bytes_be(Sign::Plus, &rest[..len]);
        Ok((Self { value }, &rest[len..]))
    }

    /// Parse a buffer that must contain exactly one MPI and nothing else.
    pub fn from_bytes_exact(bytes: &[u8]) -> Result<Self, SmpError> {
        let (mpi, rest) = Self::consume(bytes)?;
        if !rest.is_empty() {
            return Err(SmpError::Malformed("trailing bytes after an exact MPI decode"));
        }
        Ok(mpi)
    }
}

/// A type-length-value framed binary record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tlv {
    typ: Short,
    value: Vec<u8>,
}

impl Tlv {
    /// Frame `value` under `typ`; fails when the value cannot be described
    /// by the two-byte length field.
    pub fn new(typ: Short, value: Vec<u8>) -> Result<Self, SmpError> {
        Short::checked(value.len())?;
        Ok(Self { typ, value })
    }

    /// The record's type code.
    #[inline]
    pub fn typ(&self) -> Short {
        self.typ
    }

    /// The record's payload.
    #[inline]
    pub fn value(&self) -> &[u8] {
        &self.value
    }

    /// Serialize as `type:u16 || length:u16 || value`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let len = Short::checked(self.value.len()).expect("TLV length was checked at construction");
        let mut out = Vec::with_capacity(Short::WIDTH * 2 + self.value.len());
        out.extend_from_slice(&self.typ.to_bytes());
        out.extend_from_slice(&len.to_bytes());
        out.extend_from_slice(&self.value);
        out
    }

    /// Decode a TLV from an in-memory buffer, which must hold at least
    /// `4 + length` bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SmpError> {
        if bytes.len() < Short::WIDTH * 2 {
            return Err(SmpError::Malformed("TLV is missing its type/length header"));
        }
        let typ = Short::from_bytes(&bytes[..Short::WIDTH])?;
        let length = Short::from_bytes(&bytes[Short::WIDTH..Short::WIDTH * 2])?.0 as usize;
        let total = Short::WIDTH * 2 + length;
        if bytes.len() < total {
            return Err(SmpError::Malformed(
                "TLV length field exceeds the available bytes",
            ));
        }
        Ok(Self {
            typ,
            value: bytes[Short::WIDTH * 2..total].to_vec(),
        })
    }

    /// Read one TLV from a byte stream: type, then length, then exactly
    /// `length` value bytes. A source that yields fewer bytes than requested
    /// at any step surfaces as [`SmpError::ShortRead`], never as a format
    /// error.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self, SmpError> {
        let mut head = [0u8; Short::WIDTH];
        reader.read_exact(&mut head)?;
        let typ = Short(u16::from_be_bytes(head));
        reader.read_exact(&mut head)?;
        let length = u16::from_be_bytes(head) as usize;
        let mut value = vec![0u8; length];
        reader.read_exact(&mut value)?;
        Ok(Self { typ, value })
    }
}
