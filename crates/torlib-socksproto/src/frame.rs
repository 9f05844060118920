//! Byte-level reading and writing for SOCKS4a frames.
//!
//! SOCKS4a is a fixed-layout binary protocol: big-endian integers,
//! raw IPv4 addresses, and NUL-terminated text fields.  [`Writer`]
//! appends those to a growable buffer; [`Reader`] takes them back off
//! a slice.  Neither one does any IO.

use crate::{Error, Result};
use arrayref::array_ref;
use std::net::Ipv4Addr;

/// A byte-oriented trait for building SOCKS messages in memory.
///
/// Unlike std::io::Write, this trait's methods are not allowed to
/// fail.  Anything that could make a frame invalid has to be ruled
/// out before it reaches the writer.
///
/// # Examples
///
/// ```
/// use torlib_socksproto::Writer;
/// let mut w: Vec<u8> = Vec::new();
/// w.write_u8(4);
/// w.write_u16(443);
/// w.write_nul_terminated(b"");
/// assert_eq!(w, &[0x04, 0x01, 0xBB, 0x00]);
/// ```
pub trait Writer {
    /// Append a slice to the end of this writer.
    fn write_all(&mut self, b: &[u8]);

    /// Append a single u8 to this writer.
    fn write_u8(&mut self, x: u8) {
        self.write_all(&[x])
    }
    /// Append a single u16 to this writer, encoded in big-endian order.
    fn write_u16(&mut self, x: u16) {
        self.write_all(&x.to_be_bytes())
    }
    /// Append `b` followed by a single NUL delimiter.
    ///
    /// The caller is responsible for making sure that `b` has no NUL
    /// of its own; otherwise the peer will see the field end early.
    fn write_nul_terminated(&mut self, b: &[u8]) {
        debug_assert!(!b.contains(&0));
        self.write_all(b);
        self.write_u8(0);
    }
    /// Encode a Writeable object onto this writer, using its
    /// write_onto method.
    fn write<E: Writeable + ?Sized>(&mut self, e: &E) {
        e.write_onto(self)
    }
}

impl Writer for Vec<u8> {
    fn write_all(&mut self, b: &[u8]) {
        self.extend_from_slice(b);
    }
}

/// An object that can be encoded onto a [`Writer`].
pub trait Writeable {
    /// Encode this object into the writer `w`.
    fn write_onto<W: Writer + ?Sized>(&self, w: &mut W);
}

/// An object that can be decoded from a [`Reader`].
pub trait Readable: Sized {
    /// Try to extract an object of this type from a Reader.
    ///
    /// Implementations should generally try to be efficient: this is
    /// not the right place to check signatures or perform expensive
    /// operations.
    fn take_from(r: &mut Reader<'_>) -> Result<Self>;
}

impl Writeable for [u8] {
    fn write_onto<W: Writer + ?Sized>(&self, w: &mut W) {
        w.write_all(self)
    }
}

impl Writeable for Ipv4Addr {
    fn write_onto<W: Writer + ?Sized>(&self, w: &mut W) {
        w.write_all(&self.octets()[..])
    }
}

impl Readable for Ipv4Addr {
    fn take_from(r: &mut Reader<'_>) -> Result<Self> {
        Ok(r.take_u32()?.into())
    }
}

/// A type for reading SOCKS messages from a slice of bytes.
///
/// The methods in [`Reader`] never panic.  Running out of bytes gives
/// [`Error::Truncated`].
///
/// # Examples
///
/// ```
/// use torlib_socksproto::{Reader, Result};
/// let msg = [0x00, 0x5A, 0x01, 0xBB, 0x7f, 0x00, 0x00, 0x01];
/// let mut r = Reader::from_slice(&msg[..]);
/// assert_eq!(r.take_u8()?, 0);
/// assert_eq!(r.take_u8()?, 90);
/// assert_eq!(r.take_u16()?, 443);
/// assert_eq!(r.take_u32()?, 0x7f00_0001);
/// r.should_be_exhausted()?;
/// # Result::Ok(())
/// ```
pub struct Reader<'a> {
    /// The underlying slice that we're reading from
    b: &'a [u8],
    /// The next position in the slice that we intend to read from.
    off: usize,
}

impl<'a> Reader<'a> {
    /// Construct a new Reader from a slice of bytes.
    pub fn from_slice(slice: &'a [u8]) -> Self {
        Reader { b: slice, off: 0 }
    }
    /// Return the total number of bytes in this reader that have not
    /// yet been read.
    pub fn remaining(&self) -> usize {
        self.b.len() - self.off
    }
    /// Check whether this reader is exhausted (out of bytes).
    ///
    /// Return Ok if it is, and Err(Error::ExtraneousBytes)
    /// if there were extra bytes.
    pub fn should_be_exhausted(&self) -> Result<()> {
        if self.remaining() != 0 {
            return Err(Error::ExtraneousBytes);
        }
        Ok(())
    }
    /// Try to consume and return a slice of `n` bytes from this reader.
    ///
    /// If there are fewer than n bytes, returns Err(Error::Truncated)
    /// and consumes nothing.
    pub fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(Error::Truncated);
        }
        let b = &self.b[self.off..(self.off + n)];
        self.off += n;
        Ok(b)
    }
    /// Try to consume and return a u8 from this reader.
    pub fn take_u8(&mut self) -> Result<u8> {
        let b = self.take(1)?;
        Ok(b[0])
    }
    /// Try to consume and return a big-endian u16 from this reader.
    pub fn take_u16(&mut self) -> Result<u16> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes(*array_ref![b, 0, 2]))
    }
    /// Try to consume and return a big-endian u32 from this reader.
    pub fn take_u32(&mut self) -> Result<u32> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes(*array_ref![b, 0, 4]))
    }
    /// Try to decode and remove a Readable from this reader, using its
    /// take_from() method.
    ///
    /// On failure, consumes nothing.
    pub fn extract<E: Readable>(&mut self) -> Result<E> {
        let off_orig = self.off;
        let result = E::take_from(self);
        if result.is_err() {
            self.off = off_orig;
        }
        result
    }
}
