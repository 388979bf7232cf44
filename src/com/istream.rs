use core::{ffi::c_void, ops::Deref, ptr::null_mut};

use windows_core::{GUID, HRESULT, IUnknown, IUnknown_Vtbl, Interface};

use crate::com::{ComVtable, InterfaceExt, STATSTG, StatFlag, StreamSeek};
use crate::error::{Error, Result};
use crate::hresult::HResultExt;

/// `IID_ISequentialStream`: `0c733a30-2a1c-11ce-ade5-00aa0044773d`.
pub const IID_ISEQUENTIALSTREAM: GUID = GUID::from_u128(0x0c733a30_2a1c_11ce_ade5_00aa0044773d);

/// `IID_IStream`: `0000000c-0000-0000-C000-000000000046`.
pub const IID_ISTREAM: GUID = GUID::from_u128(0x0000000c_0000_0000_c000_000000000046);

/// This struct represents the COM `IStream` interface.
#[repr(transparent)]
#[derive(Clone, Debug)]
pub struct IStream(IUnknown);

impl IStream {
    /// Reads into `buf`, returning the number of bytes read. Zero means end of stream.
    pub fn Read(&self, buf: &mut [u8]) -> Result<u32> {
        let mut read = 0;
        unsafe {
            (Interface::vtable(self).base__.Read)(
                Interface::as_raw(self),
                buf.as_mut_ptr().cast(),
                buf.len() as u32,
                &mut read,
            )
        }
        .ok_for("Read")?;
        Ok(read)
    }

    pub fn Write(&self, buf: &[u8]) -> Result<u32> {
        let mut written = 0;
        unsafe {
            (Interface::vtable(self).base__.Write)(
                Interface::as_raw(self),
                buf.as_ptr().cast(),
                buf.len() as u32,
                &mut written,
            )
        }
        .ok_for("Write")?;
        Ok(written)
    }

    /// Moves the seek pointer and returns its new absolute position.
    pub fn Seek(&self, offset: i64, origin: StreamSeek) -> Result<u64> {
        let mut position = 0;
        unsafe {
            (Interface::vtable(self).Seek)(
                Interface::as_raw(self),
                offset,
                origin as u32,
                &mut position,
            )
        }
        .ok_for("Seek")?;
        Ok(position)
    }

    pub fn SetSize(&self, size: u64) -> Result<()> {
        unsafe { (Interface::vtable(self).SetSize)(Interface::as_raw(self), size) }
            .ok_for("SetSize")
    }

    /// Copies up to `cb` bytes into `target`, returning `(read, written)`.
    pub fn CopyTo(&self, target: &IStream, cb: u64) -> Result<(u64, u64)> {
        let (mut read, mut written) = (0, 0);
        unsafe {
            (Interface::vtable(self).CopyTo)(
                Interface::as_raw(self),
                target.as_raw(),
                cb,
                &mut read,
                &mut written,
            )
        }
        .ok_for("CopyTo")?;
        Ok((read, written))
    }

    pub fn Commit(&self, flags: u32) -> Result<()> {
        unsafe { (Interface::vtable(self).Commit)(Interface::as_raw(self), flags) }
            .ok_for("Commit")
    }

    pub fn Revert(&self) -> Result<()> {
        unsafe { (Interface::vtable(self).Revert)(Interface::as_raw(self)) }.ok_for("Revert")
    }

    pub fn LockRegion(&self, offset: u64, cb: u64, lock_type: u32) -> Result<()> {
        unsafe {
            (Interface::vtable(self).LockRegion)(Interface::as_raw(self), offset, cb, lock_type)
        }
        .ok_for("LockRegion")
    }

    pub fn UnlockRegion(&self, offset: u64, cb: u64, lock_type: u32) -> Result<()> {
        unsafe {
            (Interface::vtable(self).UnlockRegion)(Interface::as_raw(self), offset, cb, lock_type)
        }
        .ok_for("UnlockRegion")
    }

    /// Retrieves stream statistics.
    ///
    /// Unless `flag` is [`StatFlag::NoName`], a non-null `pwcsName` is owned by
    /// the caller and must be freed with `CoTaskMemFree`.
    pub fn Stat(&self, flag: StatFlag) -> Result<STATSTG> {
        let mut stat = STATSTG::default();
        unsafe { (Interface::vtable(self).Stat)(Interface::as_raw(self), &mut stat, flag as u32) }
            .ok_for("Stat")?;
        Ok(stat)
    }

    /// Creates a new stream over the same bytes with its own seek pointer.
    pub fn Clone(&self) -> Result<IStream> {
        let mut result = null_mut();
        unsafe { (Interface::vtable(self).Clone)(Interface::as_raw(self), &mut result) }
            .ok_for("Clone")?;
        unsafe { IStream::from_raw_opt(result) }.ok_or(Error::NullPointerError("Clone"))
    }

    /// Size of the stream in bytes.
    pub fn len(&self) -> Result<u64> {
        Ok(self.Stat(StatFlag::NoName)?.cbSize)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

#[cfg(feature = "std")]
impl std::io::Read for IStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        Ok(IStream::Read(self, buf)? as usize)
    }
}

#[cfg(feature = "std")]
impl std::io::Write for IStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        Ok(IStream::Write(self, buf)? as usize)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(self.Commit(0)?)
    }
}

#[cfg(feature = "std")]
impl std::io::Seek for IStream {
    fn seek(&mut self, pos: std::io::SeekFrom) -> std::io::Result<u64> {
        let (offset, origin) = match pos {
            std::io::SeekFrom::Start(offset) => (offset as i64, StreamSeek::Set),
            std::io::SeekFrom::Current(offset) => (offset, StreamSeek::Current),
            std::io::SeekFrom::End(offset) => (offset, StreamSeek::End),
        };
        Ok(IStream::Seek(self, offset, origin)?)
    }
}

unsafe impl Interface for IStream {
    type Vtable = IStream_Vtbl;
    const IID: GUID = IID_ISTREAM;
}

impl Deref for IStream {
    type Target = IUnknown;

    fn deref(&self) -> &Self::Target {
        unsafe { core::mem::transmute(self) }
    }
}

unsafe impl ComVtable for IStream_Vtbl {
    const INTERFACES: &'static [GUID] = &[IID_ISEQUENTIALSTREAM, IID_ISTREAM];
}

#[repr(C)]
pub struct ISequentialStream_Vtbl {
    pub base__: IUnknown_Vtbl,
    pub Read: unsafe extern "system" fn(
        this: *mut c_void,
        pv: *mut c_void,
        cb: u32,
        pcbread: *mut u32,
    ) -> HRESULT,
    pub Write: unsafe extern "system" fn(
        this: *mut c_void,
        pv: *const c_void,
        cb: u32,
        pcbwritten: *mut u32,
    ) -> HRESULT,
}

#[repr(C)]
pub struct IStream_Vtbl {
    pub base__: ISequentialStream_Vtbl,
    pub Seek: unsafe extern "system" fn(
        this: *mut c_void,
        dlibmove: i64,
        dworigin: u32,
        plibnewposition: *mut u64,
    ) -> HRESULT,
    pub SetSize: unsafe extern "system" fn(this: *mut c_void, libnewsize: u64) -> HRESULT,
    pub CopyTo: unsafe extern "system" fn(
        this: *mut c_void,
        pstm: *mut c_void,
        cb: u64,
        pcbread: *mut u64,
        pcbwritten: *mut u64,
    ) -> HRESULT,
    pub Commit: unsafe extern "system" fn(this: *mut c_void, grfcommitflags: u32) -> HRESULT,
    pub Revert: unsafe extern "system" fn(this: *mut c_void) -> HRESULT,
    pub LockRegion: unsafe extern "system" fn(
        this: *mut c_void,
        liboffset: u64,
        cb: u64,
        dwlocktype: u32,
    ) -> HRESULT,
    pub UnlockRegion: unsafe extern "system" fn(
        this: *mut c_void,
        liboffset: u64,
        cb: u64,
        dwlocktype: u32,
    ) -> HRESULT,
    pub Stat: unsafe extern "system" fn(
        this: *mut c_void,
        pstatstg: *mut STATSTG,
        grfstatflag: u32,
    ) -> HRESULT,
    pub Clone: unsafe extern "system" fn(this: *mut c_void, ppstm: *mut *mut c_void) -> HRESULT,
}
