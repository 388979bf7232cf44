//! Owned STGMEDIUM wrapper.

use alloc::vec::Vec;
use core::mem::ManuallyDrop;

use windows_core::Interface;

use crate::com::{IStream, InterfaceExt, STGMEDIUM, STGMEDIUM_0, Tymed};
#[cfg(not(windows))]
use crate::com::IUnknown;
use crate::error::{Error, Result};
use crate::hresult;

/// Owned `STGMEDIUM` released on drop with `ReleaseStgMedium` semantics:
/// `pUnkForRelease` is released when present, otherwise the medium itself.
pub struct StgMedium(STGMEDIUM);

// A medium moves between apartments only through marshaled OLE calls.
unsafe impl Send for StgMedium {}

impl StgMedium {
    /// `TYMED_NULL`
    pub const fn null() -> Self {
        Self(STGMEDIUM::null())
    }

    /// Takes ownership of a medium.
    ///
    /// # Safety
    ///
    /// `raw` must be a medium the caller owns and nobody else releases.
    #[inline]
    pub unsafe fn from_raw(raw: STGMEDIUM) -> Self {
        Self(raw)
    }

    /// Consumes self and returns the medium, preventing Drop.
    #[inline]
    pub fn into_raw(self) -> STGMEDIUM {
        ManuallyDrop::new(self).0
    }

    #[inline]
    pub fn as_raw(&self) -> &STGMEDIUM {
        &self.0
    }

    #[inline]
    pub fn media(&self) -> Tymed {
        self.0.media()
    }

    /// A `TYMED_ISTREAM` medium owning `stream`.
    pub fn from_stream(stream: IStream) -> Self {
        Self(STGMEDIUM {
            tymed: Tymed::ISTREAM.bits(),
            u: STGMEDIUM_0 {
                pstm: stream.into_raw(),
            },
            pUnkForRelease: core::ptr::null_mut(),
        })
    }

    /// A `TYMED_HGLOBAL` medium owning `memory`.
    #[cfg(windows)]
    pub fn from_global(memory: crate::wrappers::GlobalMemory) -> Self {
        Self(STGMEDIUM {
            tymed: Tymed::HGLOBAL.bits(),
            u: STGMEDIUM_0 {
                hGlobal: memory.into_raw(),
            },
            pUnkForRelease: core::ptr::null_mut(),
        })
    }

    /// A new reference to the stream, for `TYMED_ISTREAM` media.
    pub fn stream(&self) -> Option<IStream> {
        if self.media() != Tymed::ISTREAM {
            return None;
        }
        unsafe { IStream::from_raw_cloned(self.0.u.pstm) }
    }

    /// Reads the payload of an `HGLOBAL` or `ISTREAM` medium.
    ///
    /// Streams are read from their current seek position to the end through a
    /// clone, so the medium's own seek pointer does not move.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        medium_bytes(&self.0)
    }
}

/// Reads the payload of a medium the caller does not own.
pub(crate) fn medium_bytes(medium: &STGMEDIUM) -> Result<Vec<u8>> {
    match medium.media() {
        Tymed::ISTREAM => {
            let stream = unsafe { IStream::from_raw_borrowed(&medium.u.pstm) }
                .ok_or(Error::NullPointerError("STGMEDIUM"))?
                .Clone()?;
            let mut bytes = Vec::new();
            let mut chunk = [0u8; 4096];
            loop {
                let read = stream.Read(&mut chunk)? as usize;
                if read == 0 {
                    return Ok(bytes);
                }
                bytes.extend_from_slice(&chunk[..read.min(chunk.len())]);
            }
        }
        #[cfg(windows)]
        Tymed::HGLOBAL => unsafe {
            crate::wrappers::GlobalMemory::copy_from_handle(medium.u.hGlobal)
        },
        _ => Err(Error::ApiError("STGMEDIUM", hresult::DV_E_TYMED)),
    }
}

impl Default for StgMedium {
    fn default() -> Self {
        Self::null()
    }
}

impl core::fmt::Debug for StgMedium {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("StgMedium").field(&self.0).finish()
    }
}

impl Drop for StgMedium {
    #[cfg(windows)]
    fn drop(&mut self) {
        use windows_sys::Win32::System::Ole::ReleaseStgMedium;

        if self.0.tymed != 0 || !self.0.pUnkForRelease.is_null() {
            unsafe { ReleaseStgMedium((&mut self.0 as *mut STGMEDIUM).cast()) };
        }
    }

    #[cfg(not(windows))]
    fn drop(&mut self) {
        let medium = &mut self.0;
        let owner = if !medium.pUnkForRelease.is_null() {
            medium.pUnkForRelease
        } else if matches!(medium.media(), Tymed::ISTREAM | Tymed::ISTORAGE) {
            medium.payload()
        } else {
            core::ptr::null_mut()
        };

        drop(unsafe { IUnknown::from_raw_opt(owner) });
        *medium = STGMEDIUM::null();
    }
}
