//! `IStream` callable wrapper over Rust I/O objects.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::ffi::c_void;
use core::ptr::null_mut;
use std::fs::File;
use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};

use spin::Mutex;
use windows_core::{HRESULT, Interface};

use crate::ccw::Lifetime;
use crate::com::{
    IStream, IStream_Vtbl, InterfaceExt, STATSTG, StatFlag, StorageMode, StorageType, StreamSeek,
};
use crate::error::io_hresult;
use crate::hresult;

const COPY_CHUNK: usize = 4096;

/// A seekable byte source that can back an [`IStream`].
pub trait StreamSource: Read + Write + Seek + Send {
    /// Truncates or extends the source.
    fn set_len(&mut self, _size: u64) -> io::Result<()> {
        Err(io::ErrorKind::Unsupported.into())
    }

    /// Name reported by `Stat`.
    fn name(&self) -> Option<String> {
        None
    }

    /// Access mode reported by `Stat`.
    fn mode(&self) -> StorageMode {
        StorageMode::READWRITE
    }
}

impl StreamSource for Cursor<Vec<u8>> {
    fn set_len(&mut self, size: u64) -> io::Result<()> {
        let size = usize::try_from(size).map_err(|_| io::ErrorKind::OutOfMemory)?;
        self.get_mut().resize(size, 0);
        Ok(())
    }
}

impl StreamSource for File {
    fn set_len(&mut self, size: u64) -> io::Result<()> {
        File::set_len(self, size)
    }
}

/// A source shared between clones, each with its own seek pointer.
struct StreamState {
    source: Arc<Mutex<Box<dyn StreamSource>>>,
    position: Mutex<u64>,
}

impl StreamState {
    /// Runs `f` with the source positioned at this stream's seek pointer.
    fn with_source<R>(
        &self,
        f: impl FnOnce(&mut dyn StreamSource) -> io::Result<R>,
    ) -> io::Result<R> {
        let mut position = self.position.lock();
        let mut source = self.source.lock();
        source.seek(SeekFrom::Start(*position))?;
        let result = f(&mut **source);
        *position = source.stream_position()?;
        result
    }

    fn len(&self) -> io::Result<u64> {
        self.source.lock().seek(SeekFrom::End(0))
    }
}

type StreamWrapper = Lifetime<IStream_Vtbl, StreamState>;

static STREAM_VTBL: IStream_Vtbl = IStream_Vtbl {
    base__: crate::com::ISequentialStream_Vtbl {
        base__: StreamWrapper::unknown_vtbl(),
        Read,
        Write,
    },
    Seek,
    SetSize,
    CopyTo,
    Commit,
    Revert,
    LockRegion,
    UnlockRegion,
    Stat,
    Clone,
};

impl IStream {
    /// Exposes `source` to native code as an `IStream` positioned at zero.
    pub fn from_source(source: impl StreamSource + 'static) -> Self {
        let source: Box<dyn StreamSource> = Box::new(source);
        Self::from_state(Arc::new(Mutex::new(source)), 0)
    }

    /// An in-memory stream over a copy of `bytes`.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self::from_source(Cursor::new(bytes.to_vec()))
    }

    fn from_state(source: Arc<Mutex<Box<dyn StreamSource>>>, position: u64) -> Self {
        let state = StreamState {
            source,
            position: Mutex::new(position),
        };
        unsafe { Self::from_raw(StreamWrapper::allocate(state, &STREAM_VTBL)) }
    }
}

fn failure(api: &'static str, err: io::Error) -> HRESULT {
    log::trace!("IStream::{api} failed: {err}");
    io_hresult(&err)
}

#[inline]
unsafe fn state<'a>(this: *mut c_void) -> &'a StreamState {
    unsafe { StreamWrapper::object(this) }
}

unsafe extern "system" fn Read(
    this: *mut c_void,
    pv: *mut c_void,
    cb: u32,
    pcbread: *mut u32,
) -> HRESULT {
    if !pcbread.is_null() {
        unsafe { *pcbread = 0 };
    }
    if pv.is_null() && cb > 0 {
        return hresult::STG_E_INVALIDPOINTER;
    }

    let buf: &mut [u8] = if cb == 0 {
        &mut []
    } else {
        unsafe { core::slice::from_raw_parts_mut(pv as *mut u8, cb as usize) }
    };

    let result = unsafe { state(this) }.with_source(|source| {
        let mut filled = 0;
        while filled < buf.len() {
            match source.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(read) => filled += read,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(err) => return Err(err),
            }
        }
        Ok(filled)
    });

    match result {
        Ok(filled) => {
            if !pcbread.is_null() {
                unsafe { *pcbread = filled as u32 };
            }
            hresult::S_OK
        }
        Err(err) => failure("Read", err),
    }
}

unsafe extern "system" fn Write(
    this: *mut c_void,
    pv: *const c_void,
    cb: u32,
    pcbwritten: *mut u32,
) -> HRESULT {
    if !pcbwritten.is_null() {
        unsafe { *pcbwritten = 0 };
    }
    if pv.is_null() && cb > 0 {
        return hresult::STG_E_INVALIDPOINTER;
    }

    let buf: &[u8] = if cb == 0 {
        &[]
    } else {
        unsafe { core::slice::from_raw_parts(pv as *const u8, cb as usize) }
    };

    match unsafe { state(this) }.with_source(|source| source.write_all(buf)) {
        Ok(()) => {
            if !pcbwritten.is_null() {
                unsafe { *pcbwritten = cb };
            }
            hresult::S_OK
        }
        Err(err) => failure("Write", err),
    }
}

unsafe extern "system" fn Seek(
    this: *mut c_void,
    dlibmove: i64,
    dworigin: u32,
    plibnewposition: *mut u64,
) -> HRESULT {
    let state = unsafe { state(this) };
    let Some(origin) = StreamSeek::from_raw(dworigin) else {
        return hresult::STG_E_INVALIDFUNCTION;
    };

    let base = match origin {
        StreamSeek::Set => 0,
        StreamSeek::Current => *state.position.lock(),
        StreamSeek::End => match state.len() {
            Ok(len) => len,
            Err(err) => return failure("Seek", err),
        },
    };

    let Some(target) = base.checked_add_signed(dlibmove) else {
        return hresult::STG_E_INVALIDFUNCTION;
    };

    *state.position.lock() = target;
    if !plibnewposition.is_null() {
        unsafe { *plibnewposition = target };
    }
    hresult::S_OK
}

unsafe extern "system" fn SetSize(this: *mut c_void, libnewsize: u64) -> HRESULT {
    let state = unsafe { state(this) };
    match state.source.lock().set_len(libnewsize) {
        Ok(()) => hresult::S_OK,
        Err(err) => failure("SetSize", err),
    }
}

unsafe extern "system" fn CopyTo(
    this: *mut c_void,
    pstm: *mut c_void,
    cb: u64,
    pcbread: *mut u64,
    pcbwritten: *mut u64,
) -> HRESULT {
    let Some(target) = (unsafe { IStream::from_raw_cloned(pstm) }) else {
        return hresult::STG_E_INVALIDPOINTER;
    };

    let state = unsafe { state(this) };
    let (mut total_read, mut total_written) = (0u64, 0u64);
    let mut chunk = [0u8; COPY_CHUNK];

    let hr = loop {
        let wanted = (cb - total_read).min(COPY_CHUNK as u64) as usize;
        if wanted == 0 {
            break hresult::S_OK;
        }

        // The source lock is released before writing so a clone of this
        // stream can be the target.
        let read = match state.with_source(|source| source.read(&mut chunk[..wanted])) {
            Ok(0) => break hresult::S_OK,
            Ok(read) => read,
            Err(err) => break failure("CopyTo", err),
        };
        total_read += read as u64;

        match target.Write(&chunk[..read]) {
            Ok(written) => {
                total_written += u64::from(written);
                if (written as usize) < read {
                    break hresult::STG_E_MEDIUMFULL;
                }
            }
            Err(err) => break err.hresult(),
        }
    };

    if !pcbread.is_null() {
        unsafe { *pcbread = total_read };
    }
    if !pcbwritten.is_null() {
        unsafe { *pcbwritten = total_written };
    }
    hr
}

unsafe extern "system" fn Commit(this: *mut c_void, _grfcommitflags: u32) -> HRESULT {
    let state = unsafe { state(this) };
    match state.source.lock().flush() {
        Ok(()) => hresult::S_OK,
        Err(err) => failure("Commit", err),
    }
}

unsafe extern "system" fn Revert(_this: *mut c_void) -> HRESULT {
    hresult::S_OK
}

unsafe extern "system" fn LockRegion(
    _this: *mut c_void,
    _offset: u64,
    _cb: u64,
    _locktype: u32,
) -> HRESULT {
    hresult::STG_E_INVALIDFUNCTION
}

unsafe extern "system" fn UnlockRegion(
    _this: *mut c_void,
    _offset: u64,
    _cb: u64,
    _locktype: u32,
) -> HRESULT {
    hresult::STG_E_INVALIDFUNCTION
}

unsafe extern "system" fn Stat(
    this: *mut c_void,
    pstatstg: *mut STATSTG,
    grfstatflag: u32,
) -> HRESULT {
    if pstatstg.is_null() {
        return hresult::STG_E_INVALIDPOINTER;
    }

    let state = unsafe { state(this) };
    let size = match state.len() {
        Ok(size) => size,
        Err(err) => return failure("Stat", err),
    };

    let (name, mode) = {
        let source = state.source.lock();
        let name = if grfstatflag & StatFlag::NoName as u32 != 0 {
            null_mut()
        } else {
            source.name().map_or(null_mut(), |name| task_mem_wide(&name))
        };
        (name, source.mode())
    };

    unsafe {
        *pstatstg = STATSTG {
            pwcsName: name,
            r#type: StorageType::Stream as u32,
            cbSize: size,
            grfMode: mode.bits(),
            ..STATSTG::default()
        };
    }
    hresult::S_OK
}

unsafe extern "system" fn Clone(this: *mut c_void, ppstm: *mut *mut c_void) -> HRESULT {
    if ppstm.is_null() {
        return hresult::STG_E_INVALIDPOINTER;
    }

    let state = unsafe { state(this) };
    let position = *state.position.lock();
    let clone = IStream::from_state(state.source.clone(), position);
    unsafe { *ppstm = clone.into_raw() };
    hresult::S_OK
}

/// Copies `name` into `CoTaskMemAlloc` memory, which the `Stat` caller frees.
#[cfg(windows)]
fn task_mem_wide(name: &str) -> *mut u16 {
    use crate::string::WideStr;
    use windows_sys::Win32::System::Com::CoTaskMemAlloc;

    let wide = name.to_wide();
    let buffer = unsafe { CoTaskMemAlloc(wide.len() * 2) } as *mut u16;
    if !buffer.is_null() {
        unsafe { core::ptr::copy_nonoverlapping(wide.as_ptr(), buffer, wide.len()) };
    }
    buffer
}

#[cfg(not(windows))]
fn task_mem_wide(_name: &str) -> *mut u16 {
    null_mut()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read as _, Seek as _, Write as _};

    #[test]
    fn test_read_write_seek() {
        let mut stream = IStream::from_source(Cursor::new(Vec::new()));
        stream.write_all(b"hello world").unwrap();
        assert_eq!(stream.len().unwrap(), 11);

        assert_eq!(stream.seek(SeekFrom::Start(6)).unwrap(), 6);
        let mut word = String::new();
        stream.read_to_string(&mut word).unwrap();
        assert_eq!(word, "world");

        assert_eq!(stream.Seek(-5, StreamSeek::End).unwrap(), 6);
        assert_eq!(stream.Seek(-6, StreamSeek::Current).unwrap(), 0);
        assert!(matches!(
            stream.Seek(-1, StreamSeek::Set),
            Err(crate::Error::ApiError(_, hresult::STG_E_INVALIDFUNCTION))
        ));
    }

    #[test]
    fn test_invalid_origin_and_locks() {
        let stream = IStream::from_bytes(b"abc");
        let vtable = stream.vtable();
        unsafe {
            assert_eq!(
                (vtable.Seek)(stream.as_raw(), 0, 9, null_mut()),
                hresult::STG_E_INVALIDFUNCTION
            );
            assert_eq!(
                (vtable.base__.Read)(stream.as_raw(), null_mut(), 4, null_mut()),
                hresult::STG_E_INVALIDPOINTER
            );
        }
        assert!(stream.LockRegion(0, 1, 0).is_err());
        assert!(stream.UnlockRegion(0, 1, 0).is_err());
        assert!(stream.Revert().is_ok());
        assert!(stream.Commit(0).is_ok());
    }

    #[test]
    fn test_set_size() {
        let stream = IStream::from_bytes(b"abcdef");
        stream.SetSize(3).unwrap();
        assert_eq!(stream.len().unwrap(), 3);
        stream.SetSize(5).unwrap();
        assert_eq!(stream.len().unwrap(), 5);

        struct ReadOnly(Cursor<Vec<u8>>);

        impl Read for ReadOnly {
            fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                self.0.read(buf)
            }
        }

        impl Write for ReadOnly {
            fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
                Err(io::ErrorKind::PermissionDenied.into())
            }

            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        impl Seek for ReadOnly {
            fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
                self.0.seek(pos)
            }
        }

        impl StreamSource for ReadOnly {}

        let stream = IStream::from_source(ReadOnly(Cursor::new(b"xyz".to_vec())));
        assert!(matches!(
            stream.SetSize(1),
            Err(crate::Error::ApiError(_, hresult::STG_E_INVALIDFUNCTION))
        ));
        assert!(matches!(
            stream.Write(b"q"),
            Err(crate::Error::ApiError(_, hresult::STG_E_ACCESSDENIED))
        ));
    }

    #[test]
    fn test_stat() {
        let stream = IStream::from_bytes(&[0u8; 42]);
        let stat = stream.Stat(StatFlag::NoName).unwrap();
        assert_eq!(stat.cbSize, 42);
        assert_eq!(stat.r#type, StorageType::Stream as u32);
        assert!(stat.pwcsName.is_null());
        assert_eq!(stat.grfMode, StorageMode::READWRITE.bits());

        struct ReadOnlyBytes(Cursor<Vec<u8>>);

        impl Read for ReadOnlyBytes {
            fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                self.0.read(buf)
            }
        }

        impl Write for ReadOnlyBytes {
            fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
                Err(io::ErrorKind::PermissionDenied.into())
            }

            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        impl Seek for ReadOnlyBytes {
            fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
                self.0.seek(pos)
            }
        }

        impl StreamSource for ReadOnlyBytes {
            fn mode(&self) -> StorageMode {
                StorageMode::READ | StorageMode::SHARE_DENY_WRITE
            }
        }

        let stream = IStream::from_source(ReadOnlyBytes(Cursor::new(b"abc".to_vec())));
        let stat = stream.Stat(StatFlag::NoName).unwrap();
        assert_eq!(stat.cbSize, 3);
        assert_eq!(stat.grfMode, (StorageMode::READ | StorageMode::SHARE_DENY_WRITE).bits());
        assert_eq!(stream.Clone().unwrap().Stat(StatFlag::NoName).unwrap().grfMode, stat.grfMode);
    }

    #[test]
    fn test_clone_has_own_position() {
        let stream = IStream::from_bytes(b"0123456789");
        stream.Seek(4, StreamSeek::Set).unwrap();

        let clone = stream.Clone().unwrap();
        let mut buf = [0u8; 3];
        assert_eq!(clone.Read(&mut buf).unwrap(), 3);
        assert_eq!(&buf, b"456");

        assert_eq!(stream.Seek(0, StreamSeek::Current).unwrap(), 4);
        assert_eq!(clone.Seek(0, StreamSeek::Current).unwrap(), 7);

        // Both see the same bytes.
        clone.Write(b"X").unwrap();
        stream.Seek(7, StreamSeek::Set).unwrap();
        assert_eq!(stream.Read(&mut buf[..1]).unwrap(), 1);
        assert_eq!(buf[0], b'X');
    }

    #[test]
    fn test_copy_to_clone_of_itself() {
        let stream = IStream::from_bytes(&[7u8; COPY_CHUNK + 100]);
        let target = IStream::from_source(Cursor::new(Vec::new()));

        let (read, written) = stream.CopyTo(&target, u64::MAX).unwrap();
        assert_eq!(read, (COPY_CHUNK + 100) as u64);
        assert_eq!(written, read);
        assert_eq!(target.len().unwrap(), read);

        // Copy the first 10 bytes to the end of the same source.
        let source = IStream::from_bytes(b"0123456789");
        let tail = source.Clone().unwrap();
        tail.Seek(0, StreamSeek::End).unwrap();
        source.Seek(0, StreamSeek::Set).unwrap();
        assert_eq!(source.CopyTo(&tail, 10).unwrap(), (10, 10));
        assert_eq!(source.len().unwrap(), 20);
    }

    #[test]
    fn test_read_past_end() {
        let stream = IStream::from_bytes(b"ab");
        stream.Seek(10, StreamSeek::Set).unwrap();
        let mut buf = [0u8; 4];
        assert_eq!(stream.Read(&mut buf).unwrap(), 0);
    }
}
