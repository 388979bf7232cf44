use core::{ffi::c_void, ops::Deref, ptr::null_mut};

use windows_core::{GUID, HRESULT, IUnknown, IUnknown_Vtbl, Interface};

use crate::com::InterfaceExt;
use crate::error::{Error, Result};
use crate::hresult::HResultExt;

/// `IID_IAgileReference`: `c03f6a43-65a4-9818-987e-e0b810d2a6f2`.
pub const IID_IAGILEREFERENCE: GUID = GUID::from_u128(0xc03f6a43_65a4_9818_987e_e0b810d2a6f2);

/// This struct represents the COM `IAgileReference` interface.
#[repr(transparent)]
#[derive(Clone, Debug)]
pub struct IAgileReference(IUnknown);

impl IAgileReference {
    /// Returns a proxy for `T` that is valid in the calling apartment.
    pub fn Resolve<T: Interface>(&self) -> Result<T> {
        let mut result = null_mut();
        unsafe { (Interface::vtable(self).Resolve)(Interface::as_raw(self), &T::IID, &mut result) }
            .ok_for("Resolve")?;
        unsafe { T::from_raw_opt(result) }.ok_or(Error::NullPointerError("Resolve"))
    }
}

unsafe impl Interface for IAgileReference {
    type Vtable = IAgileReference_Vtbl;
    const IID: GUID = IID_IAGILEREFERENCE;
}

impl Deref for IAgileReference {
    type Target = IUnknown;

    fn deref(&self) -> &Self::Target {
        unsafe { core::mem::transmute(self) }
    }
}

#[repr(C)]
pub struct IAgileReference_Vtbl {
    pub base__: IUnknown_Vtbl,
    pub Resolve: unsafe extern "system" fn(
        this: *mut c_void,
        riid: *const GUID,
        ppvobjectreference: *mut *mut c_void,
    ) -> HRESULT,
}
