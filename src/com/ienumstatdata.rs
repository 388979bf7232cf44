use core::{ffi::c_void, ops::Deref, ptr::null_mut};

use windows_core::{GUID, HRESULT, IUnknown, IUnknown_Vtbl, Interface};

use crate::com::{InterfaceExt, STATDATA};
use crate::error::{Error, Result};
use crate::hresult::{self, HResultExt};

/// `IID_IEnumSTATDATA`: `00000105-0000-0000-C000-000000000046`.
pub const IID_IENUMSTATDATA: GUID = GUID::from_u128(0x00000105_0000_0000_c000_000000000046);

/// This struct represents the COM `IEnumSTATDATA` interface.
#[repr(transparent)]
#[derive(Clone, Debug)]
pub struct IEnumSTATDATA(IUnknown);

impl IEnumSTATDATA {
    /// Fetches up to `rgelt.len()` connections, returning how many were written.
    ///
    /// Each returned `pAdvSink` carries a reference the caller must release.
    pub fn Next(&self, rgelt: &mut [STATDATA]) -> Result<u32> {
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

    pub fn Skip(&self, celt: u32) -> Result<bool> {
        let hr = unsafe { (Interface::vtable(self).Skip)(Interface::as_raw(self), celt) };
        hr.ok_for("Skip")?;
        Ok(hr == hresult::S_OK)
    }

    pub fn Reset(&self) -> Result<()> {
        unsafe { (Interface::vtable(self).Reset)(Interface::as_raw(self)) }.ok_for("Reset")
    }

    pub fn Clone(&self) -> Result<IEnumSTATDATA> {
        let mut result = null_mut();
        unsafe { (Interface::vtable(self).Clone)(Interface::as_raw(self), &mut result) }
            .ok_for("Clone")?;
        unsafe { IEnumSTATDATA::from_raw_opt(result) }.ok_or(Error::NullPointerError("Clone"))
    }
}

unsafe impl Interface for IEnumSTATDATA {
    type Vtable = IEnumSTATDATA_Vtbl;
    const IID: GUID = IID_IENUMSTATDATA;
}

impl Deref for IEnumSTATDATA {
    type Target = IUnknown;

    fn deref(&self) -> &Self::Target {
        unsafe { core::mem::transmute(self) }
    }
}

#[repr(C)]
pub struct IEnumSTATDATA_Vtbl {
    pub base__: IUnknown_Vtbl,
    pub Next: unsafe extern "system" fn(
        this: *mut c_void,
        celt: u32,
        rgelt: *mut STATDATA,
        pceltFetched: *mut u32,
    ) -> HRESULT,
    pub Skip: unsafe extern "system" fn(this: *mut c_void, celt: u32) -> HRESULT,
    pub Reset: unsafe extern "system" fn(this: *mut c_void) -> HRESULT,
    pub Clone: unsafe extern "system" fn(this: *mut c_void, ppenum: *mut *mut c_void) -> HRESULT,
}
