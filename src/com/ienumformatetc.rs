use alloc::vec::Vec;
use core::{ffi::c_void, ops::Deref, ptr::null_mut};

use windows_core::{GUID, HRESULT, IUnknown, IUnknown_Vtbl, Interface};

use crate::com::{ComVtable, FORMATETC, InterfaceExt};
use crate::error::{Error, Result};
use crate::hresult::{self, HResultExt};

/// `IID_IEnumFORMATETC`: `00000103-0000-0000-C000-000000000046`.
pub const IID_IENUMFORMATETC: GUID = GUID::from_u128(0x00000103_0000_0000_c000_000000000046);

/// This struct represents the COM `IEnumFORMATETC` interface.
#[repr(transparent)]
#[derive(Clone, Debug)]
pub struct IEnumFORMATETC(IUnknown);

impl IEnumFORMATETC {
    /// Fetches up to `rgelt.len()` formats, returning how many were written.
    pub fn Next(&self, rgelt: &mut [FORMATETC]) -> Result<u32> {
        let mut fetched = 0;
        unsafe {
            (Interface::vtable(self).Next)(
                Interface::as_raw(self),
                rgelt.len() as u32,
                rgelt.as_mut_ptr(),
                &mut fetched,
            )
        }
        .ok_for("Next")?;
        Ok(fetched)
    }

    /// Skips `celt` elements. Returns `false` when the sequence ended first.
    pub fn Skip(&self, celt: u32) -> Result<bool> {
        let hr = unsafe { (Interface::vtable(self).Skip)(Interface::as_raw(self), celt) };
        hr.ok_for("Skip")?;
        Ok(hr == hresult::S_OK)
    }

    /// Resets the enumeration sequence to the beginning.
    pub fn Reset(&self) -> Result<()> {
        unsafe { (Interface::vtable(self).Reset)(Interface::as_raw(self)) }.ok_for("Reset")
    }

    /// Creates a new enumerator with the same position as this one.
    pub fn Clone(&self) -> Result<IEnumFORMATETC> {
        let mut result = null_mut();
        unsafe { (Interface::vtable(self).Clone)(Interface::as_raw(self), &mut result) }
            .ok_for("Clone")?;
        unsafe { IEnumFORMATETC::from_raw_opt(result) }.ok_or(Error::NullPointerError("Clone"))
    }

    /// Drains the remaining formats.
    pub fn formats(&self) -> Result<Vec<FORMATETC>> {
        let mut formats = Vec::new();
        let mut batch = [FORMATETC::default(); 8];
        loop {
            let fetched = self.Next(&mut batch)? as usize;
            formats.extend_from_slice(&batch[..fetched.min(batch.len())]);
            if fetched < batch.len() {
                return Ok(formats);
            }
        }
    }
}

unsafe impl Interface for IEnumFORMATETC {
    type Vtable = IEnumFORMATETC_Vtbl;
    const IID: GUID = IID_IENUMFORMATETC;
}

impl Deref for IEnumFORMATETC {
    type Target = IUnknown;

    fn deref(&self) -> &Self::Target {
        unsafe { core::mem::transmute(self) }
    }
}

unsafe impl ComVtable for IEnumFORMATETC_Vtbl {
    const INTERFACES: &'static [GUID] = &[IID_IENUMFORMATETC];
}

#[repr(C)]
pub struct IEnumFORMATETC_Vtbl {
    pub base__: IUnknown_Vtbl,
    pub Next: unsafe extern "system" fn(
        this: *mut c_void,
        celt: u32,
        rgelt: *mut FORMATETC,
        pceltFetched: *mut u32,
    ) -> HRESULT,
    pub Skip: unsafe extern "system" fn(this: *mut c_void, celt: u32) -> HRESULT,
    pub Reset: unsafe extern "system" fn(this: *mut c_void) -> HRESULT,
    pub Clone: unsafe extern "system" fn(this: *mut c_void, ppenum: *mut *mut c_void) -> HRESULT,
}
