//! Owned HGLOBAL wrapper with automatic cleanup.

use alloc::vec::Vec;
use core::ffi::c_void;
use core::ops::{Deref, DerefMut};

use windows::Win32::Foundation::{GlobalFree, HGLOBAL};
use windows::Win32::System::Memory::{
    GMEM_MOVEABLE, GlobalAlloc, GlobalLock, GlobalSize, GlobalUnlock,
};

use crate::error::{Error, Result};

/// Owned movable global memory block that calls `GlobalFree` on drop.
///
/// The handle is never null.
pub struct GlobalMemory(HGLOBAL);

impl GlobalMemory {
    /// Allocates `size` bytes of movable memory.
    pub fn alloc(size: usize) -> Result<Self> {
        unsafe { GlobalAlloc(GMEM_MOVEABLE, size) }
            .map(Self)
            .map_err(|err| Error::from_hresult(err.code(), "GlobalAlloc"))
    }

    /// Allocates a block holding a copy of `bytes`.
    ///
    /// Zero-length movable blocks cannot be locked, so empty input gets one byte.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let memory = Self::alloc(bytes.len().max(1))?;
        memory.lock()?[..bytes.len()].copy_from_slice(bytes);
        Ok(memory)
    }

    /// Takes ownership of an HGLOBAL.
    /// Returns None if null.
    #[inline]
    pub fn from_ptr(handle: *mut c_void) -> Option<Self> {
        (!handle.is_null()).then_some(Self(HGLOBAL(handle)))
    }

    #[inline]
    pub fn as_ptr(&self) -> *mut c_void {
        self.0.0
    }

    /// Consumes self and returns the handle, preventing Drop.
    /// Caller takes ownership and must call `GlobalFree`.
    #[inline]
    pub fn into_raw(self) -> *mut c_void {
        let handle = self.as_ptr();
        core::mem::forget(self);
        handle
    }

    /// Size of the block, which may exceed the requested size.
    pub fn len(&self) -> usize {
        unsafe { GlobalSize(self.0) }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Locks the block for access.
    pub fn lock(&self) -> Result<GlobalLockGuard<'_>> {
        let data = unsafe { GlobalLock(self.0) } as *mut u8;
        if data.is_null() {
            return Err(Error::last_os_error("GlobalLock"));
        }

        Ok(GlobalLockGuard {
            memory: self,
            data,
            len: self.len(),
        })
    }

    /// Copies the block's contents.
    pub fn to_vec(&self) -> Result<Vec<u8>> {
        Ok(self.lock()?.to_vec())
    }

    /// Copies the contents of a handle owned by someone else.
    ///
    /// # Safety
    ///
    /// `handle` must be a valid HGLOBAL for the duration of the call.
    pub unsafe fn copy_from_handle(handle: *mut c_void) -> Result<Vec<u8>> {
        let borrowed = core::mem::ManuallyDrop::new(
            Self::from_ptr(handle).ok_or(Error::NullPointerError("GlobalLock"))?,
        );
        borrowed.to_vec()
    }
}

impl Drop for GlobalMemory {
    fn drop(&mut self) {
        // Success returns a null handle, which the binding reports as an error.
        let _ = unsafe { GlobalFree(Some(self.0)) };
    }
}

/// RAII accessor for a locked block. Unlocks automatically on drop.
pub struct GlobalLockGuard<'a> {
    memory: &'a GlobalMemory,
    data: *mut u8,
    len: usize,
}

impl Deref for GlobalLockGuard<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        unsafe { core::slice::from_raw_parts(self.data, self.len) }
    }
}

impl DerefMut for GlobalLockGuard<'_> {
    fn deref_mut(&mut self) -> &mut [u8] {
        unsafe { core::slice::from_raw_parts_mut(self.data, self.len) }
    }
}

impl Drop for GlobalLockGuard<'_> {
    fn drop(&mut self) {
        // Reaching a lock count of zero is reported as a failure.
        let _ = unsafe { GlobalUnlock(self.memory.0) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_bytes() {
        let memory = GlobalMemory::from_bytes(b"hello").unwrap();
        assert!(memory.len() >= 5);
        assert_eq!(&memory.to_vec().unwrap()[..5], b"hello");

        let handle = memory.into_raw();
        let copy = unsafe { GlobalMemory::copy_from_handle(handle) }.unwrap();
        assert_eq!(&copy[..5], b"hello");
        drop(GlobalMemory::from_ptr(handle));
    }
}
