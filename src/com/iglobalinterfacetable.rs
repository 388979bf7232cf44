use core::{ffi::c_void, ops::Deref, ptr::null_mut};

use windows_core::{GUID, HRESULT, IUnknown, IUnknown_Vtbl, Interface};

use crate::com::InterfaceExt;
use crate::error::{Error, Result};
use crate::hresult::HResultExt;

/// `IID_IGlobalInterfaceTable`: `00000146-0000-0000-C000-000000000046`.
pub const IID_IGLOBALINTERFACETABLE: GUID =
    GUID::from_u128(0x00000146_0000_0000_c000_000000000046);

/// `CLSID_StdGlobalInterfaceTable`: `00000323-0000-0000-C000-000000000046`.
pub const CLSID_STDGLOBALINTERFACETABLE: GUID =
    GUID::from_u128(0x00000323_0000_0000_c000_000000000046);

/// This struct represents the COM `IGlobalInterfaceTable` interface.
#[repr(transparent)]
#[derive(Clone, Debug)]
pub struct IGlobalInterfaceTable(IUnknown);

impl IGlobalInterfaceTable {
    /// Registers `object` under its interface, returning the table cookie.
    pub fn RegisterInterfaceInGlobal<T: Interface>(&self, object: &T) -> Result<u32> {
        let mut cookie = 0;
        unsafe {
            (Interface::vtable(self).RegisterInterfaceInGlobal)(
                Interface::as_raw(self),
                object.as_raw(),
                &T::IID,
                &mut cookie,
            )
        }
        .ok_for("RegisterInterfaceInGlobal")?;
        Ok(cookie)
    }

    pub fn RevokeInterfaceFromGlobal(&self, cookie: u32) -> Result<()> {
        unsafe {
            (Interface::vtable(self).RevokeInterfaceFromGlobal)(Interface::as_raw(self), cookie)
        }
        .ok_for("RevokeInterfaceFromGlobal")
    }

    /// Unmarshals the registered interface into the calling apartment.
    pub fn GetInterfaceFromGlobal<T: Interface>(&self, cookie: u32) -> Result<T> {
        let mut result = null_mut();
        unsafe {
            (Interface::vtable(self).GetInterfaceFromGlobal)(
                Interface::as_raw(self),
                cookie,
                &T::IID,
                &mut result,
            )
        }
        .ok_for("GetInterfaceFromGlobal")?;
        unsafe { T::from_raw_opt(result) }.ok_or(Error::NullPointerError("GetInterfaceFromGlobal"))
    }
}

unsafe impl Interface for IGlobalInterfaceTable {
    type Vtable = IGlobalInterfaceTable_Vtbl;
    const IID: GUID = IID_IGLOBALINTERFACETABLE;
}

impl Deref for IGlobalInterfaceTable {
    type Target = IUnknown;

    fn deref(&self) -> &Self::Target {
        unsafe { core::mem::transmute(self) }
    }
}

#[repr(C)]
pub struct IGlobalInterfaceTable_Vtbl {
    pub base__: IUnknown_Vtbl,
    pub RegisterInterfaceInGlobal: unsafe extern "system" fn(
        this: *mut c_void,
        punk: *mut c_void,
        riid: *const GUID,
        pdwcookie: *mut u32,
    ) -> HRESULT,
    pub RevokeInterfaceFromGlobal:
        unsafe extern "system" fn(this: *mut c_void, dwcookie: u32) -> HRESULT,
    pub GetInterfaceFromGlobal: unsafe extern "system" fn(
        this: *mut c_void,
        dwcookie: u32,
        riid: *const GUID,
        ppv: *mut *mut c_void,
    ) -> HRESULT,
}
