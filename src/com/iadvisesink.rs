use core::{ffi::c_void, ops::Deref};

use windows_core::{GUID, IUnknown, IUnknown_Vtbl, Interface};

use crate::com::{DvAspect, FORMATETC, STGMEDIUM};

/// `IID_IAdviseSink`: `0000010f-0000-0000-C000-000000000046`.
pub const IID_IADVISESINK: GUID = GUID::from_u128(0x0000010f_0000_0000_c000_000000000046);

/// This struct represents the COM `IAdviseSink` interface.
///
/// Notifications are one-way; none of the methods report a status.
#[repr(transparent)]
#[derive(Clone, Debug)]
pub struct IAdviseSink(IUnknown);

impl IAdviseSink {
    pub fn OnDataChange(&self, format: &FORMATETC, medium: &STGMEDIUM) {
        unsafe { (Interface::vtable(self).OnDataChange)(Interface::as_raw(self), format, medium) }
    }

    pub fn OnViewChange(&self, aspect: DvAspect, lindex: i32) {
        unsafe {
            (Interface::vtable(self).OnViewChange)(Interface::as_raw(self), aspect.bits(), lindex)
        }
    }

    /// `moniker` is the object's new full moniker.
    pub fn OnRename(&self, moniker: &IUnknown) {
        unsafe { (Interface::vtable(self).OnRename)(Interface::as_raw(self), moniker.as_raw()) }
    }

    pub fn OnSave(&self) {
        unsafe { (Interface::vtable(self).OnSave)(Interface::as_raw(self)) }
    }

    pub fn OnClose(&self) {
        unsafe { (Interface::vtable(self).OnClose)(Interface::as_raw(self)) }
    }
}

unsafe impl Interface for IAdviseSink {
    type Vtable = IAdviseSink_Vtbl;
    const IID: GUID = IID_IADVISESINK;
}

impl Deref for IAdviseSink {
    type Target = IUnknown;

    fn deref(&self) -> &Self::Target {
        unsafe { core::mem::transmute(self) }
    }
}

#[repr(C)]
pub struct IAdviseSink_Vtbl {
    pub base__: IUnknown_Vtbl,
    pub OnDataChange: unsafe extern "system" fn(
        this: *mut c_void,
        pformatetc: *const FORMATETC,
        pstgmed: *const STGMEDIUM,
    ),
    pub OnViewChange: unsafe extern "system" fn(this: *mut c_void, dwaspect: u32, lindex: i32),
    pub OnRename: unsafe extern "system" fn(this: *mut c_void, pmk: *mut c_void),
    pub OnSave: unsafe extern "system" fn(this: *mut c_void),
    pub OnClose: unsafe extern "system" fn(this: *mut c_void),
}
