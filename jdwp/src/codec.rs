use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Error, ErrorKind, Read, Write};

pub use jdwp_macros::{JdwpReadable, JdwpWritable};

/// Sizes of the variably-sized identifiers used by one target VM connection.
///
/// JDWP does not fix the width of object/method/field/frame/reference-type
/// ids; a compliant debugger negotiates them once via the `IDSizes` command
/// right after the handshake and then uses them for the rest of the session.
/// Defaults to 8 bytes everywhere, which is what every VM in practice reports,
/// so a [`JdwpClient`](crate::client::JdwpClient) has sane sizes to read the
/// very first reply (the `IDSizes` reply itself) with.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct IdSizes {
    pub field_id_size: u8,
    pub method_id_size: u8,
    pub object_id_size: u8,
    pub reference_type_id_size: u8,
    pub frame_id_size: u8,
}

impl Default for IdSizes {
    fn default() -> Self {
        IdSizes {
            field_id_size: 8,
            method_id_size: 8,
            object_id_size: 8,
            reference_type_id_size: 8,
            frame_id_size: 8,
        }
    }
}

/// A [`Read`] wrapper that carries the [`IdSizes`] negotiated for the
/// connection a packet was read from, so that variable-width ids can decode
/// themselves without threading the sizes through every call.
pub struct JdwpReader<R> {
    inner: R,
    pub(crate) id_sizes: IdSizes,
}

impl<R: Read> JdwpReader<R> {
    pub fn new(inner: R, id_sizes: IdSizes) -> Self {
        JdwpReader { inner, id_sizes }
    }
}

impl<R: Read> Read for JdwpReader<R> {
    #[inline]
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

/// The write-side counterpart of [`JdwpReader`].
pub struct JdwpWriter<W> {
    inner: W,
    pub(crate) id_sizes: IdSizes,
}

impl<W: Write> JdwpWriter<W> {
    pub fn new(inner: W, id_sizes: IdSizes) -> Self {
        JdwpWriter { inner, id_sizes }
    }
}

impl<W: Write> Write for JdwpWriter<W> {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    #[inline]
    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

pub trait JdwpReadable: Sized {
    fn read<R: Read>(read: &mut JdwpReader<R>) -> io::Result<Self>;
}

pub trait JdwpWritable {
    fn write<W: Write>(&self, write: &mut JdwpWriter<W>) -> io::Result<()>;
}

impl JdwpReadable for () {
    #[inline]
    fn read<R: Read>(_: &mut JdwpReader<R>) -> io::Result<Self> {
        Ok(())
    }
}

impl JdwpWritable for () {
    #[inline]
    fn write<W: Write>(&self, _: &mut JdwpWriter<W>) -> io::Result<()> {
        Ok(())
    }
}

impl JdwpReadable for bool {
    #[inline]
    fn read<R: Read>(read: &mut JdwpReader<R>) -> io::Result<Self> {
        read.read_u8().map(|n| n != 0)
    }
}

impl JdwpWritable for bool {
    #[inline]
    fn write<W: Write>(&self, write: &mut JdwpWriter<W>) -> io::Result<()> {
        write.write_u8(if *self { 1 } else { 0 })
    }
}

impl JdwpReadable for u8 {
    #[inline]
    fn read<R: Read>(read: &mut JdwpReader<R>) -> io::Result<Self> {
        read.read_u8()
    }
}

impl JdwpWritable for u8 {
    #[inline]
    fn write<W: Write>(&self, write: &mut JdwpWriter<W>) -> io::Result<()> {
        write.write_u8(*self)
    }
}

impl JdwpReadable for i8 {
    #[inline]
    fn read<R: Read>(read: &mut JdwpReader<R>) -> io::Result<Self> {
        read.read_i8()
    }
}

impl JdwpWritable for i8 {
    #[inline]
    fn write<W: Write>(&self, write: &mut JdwpWriter<W>) -> io::Result<()> {
        write.write_i8(*self)
    }
}

impl JdwpReadable for u16 {
    #[inline]
    fn read<R: Read>(read: &mut JdwpReader<R>) -> io::Result<Self> {
        read.read_u16::<BigEndian>()
    }
}

impl JdwpWritable for u16 {
    #[inline]
    fn write<W: Write>(&self, write: &mut JdwpWriter<W>) -> io::Result<()> {
        write.write_u16::<BigEndian>(*self)
    }
}

impl JdwpReadable for i16 {
    #[inline]
    fn read<R: Read>(read: &mut JdwpReader<R>) -> io::Result<Self> {
        read.read_i16::<BigEndian>()
    }
}

impl JdwpWritable for i16 {
    #[inline]
    fn write<W: Write>(&self, write: &mut JdwpWriter<W>) -> io::Result<()> {
        write.write_i16::<BigEndian>(*self)
    }
}

impl JdwpReadable for u32 {
    #[inline]
    fn read<R: Read>(read: &mut JdwpReader<R>) -> io::Result<Self> {
        read.read_u32::<BigEndian>()
    }
}

impl JdwpWritable for u32 {
    #[inline]
    fn write<W: Write>(&self, write: &mut JdwpWriter<W>) -> io::Result<()> {
        write.write_u32::<BigEndian>(*self)
    }
}

impl JdwpReadable for i32 {
    #[inline]
    fn read<R: Read>(read: &mut JdwpReader<R>) -> io::Result<Self> {
        read.read_i32::<BigEndian>()
    }
}

impl JdwpWritable for i32 {
    #[inline]
    fn write<W: Write>(&self, write: &mut JdwpWriter<W>) -> io::Result<()> {
        write.write_i32::<BigEndian>(*self)
    }
}

impl JdwpReadable for u64 {
    #[inline]
    fn read<R: Read>(read: &mut JdwpReader<R>) -> io::Result<Self> {
        read.read_u64::<BigEndian>()
    }
}

impl JdwpWritable for u64 {
    #[inline]
    fn write<W: Write>(&self, write: &mut JdwpWriter<W>) -> io::Result<()> {
        write.write_u64::<BigEndian>(*self)
    }
}

impl JdwpReadable for i64 {
    #[inline]
    fn read<R: Read>(read: &mut JdwpReader<R>) -> io::Result<Self> {
        read.read_i64::<BigEndian>()
    }
}

impl JdwpWritable for i64 {
    #[inline]
    fn write<W: Write>(&self, write: &mut JdwpWriter<W>) -> io::Result<()> {
        write.write_i64::<BigEndian>(*self)
    }
}

impl JdwpReadable for f32 {
    #[inline]
    fn read<R: Read>(read: &mut JdwpReader<R>) -> io::Result<Self> {
        read.read_f32::<BigEndian>()
    }
}

impl JdwpWritable for f32 {
    #[inline]
    fn write<W: Write>(&self, write: &mut JdwpWriter<W>) -> io::Result<()> {
        write.write_f32::<BigEndian>(*self)
    }
}

impl JdwpReadable for f64 {
    #[inline]
    fn read<R: Read>(read: &mut JdwpReader<R>) -> io::Result<Self> {
        read.read_f64::<BigEndian>()
    }
}

impl JdwpWritable for f64 {
    #[inline]
    fn write<W: Write>(&self, write: &mut JdwpWriter<W>) -> io::Result<()> {
        write.write_f64::<BigEndian>(*self)
    }
}

impl JdwpReadable for String {
    #[inline]
    fn read<R: Read>(read: &mut JdwpReader<R>) -> io::Result<Self> {
        let mut bytes = vec![0; u32::read(read)? as usize];
        read.read_exact(&mut bytes)?;
        String::from_utf8(bytes).map_err(|_| Error::from(ErrorKind::InvalidData))
    }
}

impl JdwpWritable for String {
    fn write<W: Write>(&self, write: &mut JdwpWriter<W>) -> io::Result<()> {
        (self.len() as u32).write(write)?;
        write.write_all(self.as_bytes())
    }
}

impl<T: JdwpReadable> JdwpReadable for Vec<T> {
    fn read<R: Read>(read: &mut JdwpReader<R>) -> io::Result<Self> {
        let len = u32::read(read)?;
        let mut res = Vec::with_capacity(len as usize);
        for _ in 0..len {
            res.push(T::read(read)?);
        }
        Ok(res)
    }
}

impl<T: JdwpWritable> JdwpWritable for Vec<T> {
    fn write<W: Write>(&self, write: &mut JdwpWriter<W>) -> io::Result<()> {
        (self.len() as u32).write(write)?;
        for item in self {
            item.write(write)?;
        }
        Ok(())
    }
}

impl<T: JdwpReadable, const N: usize> JdwpReadable for [T; N] {
    fn read<R: Read>(read: &mut JdwpReader<R>) -> io::Result<Self> {
        let len = u32::read(read)?;
        if len as usize != N {
            return Err(Error::from(ErrorKind::InvalidData));
        }
        let mut items = Vec::with_capacity(N);
        for _ in 0..N {
            items.push(T::read(read)?);
        }
        items
            .try_into()
            .map_err(|_| Error::from(ErrorKind::InvalidData))
    }
}

impl<T: JdwpWritable, const N: usize> JdwpWritable for [T; N] {
    fn write<W: Write>(&self, write: &mut JdwpWriter<W>) -> io::Result<()> {
        (N as u32).write(write)?;
        for item in self {
            item.write(write)?;
        }
        Ok(())
    }
}
