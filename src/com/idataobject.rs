use core::{ffi::c_void, ops::Deref, ptr::null_mut};

use windows_core::{GUID, HRESULT, IUnknown, IUnknown_Vtbl, Interface};

use crate::com::{
    Advf, ComVtable, DataDirection, FORMATETC, IAdviseSink, IEnumFORMATETC, IEnumSTATDATA,
    InterfaceExt, STGMEDIUM,
};
use crate::error::{Error, Result};
use crate::hresult::{self, HResultExt};
use crate::wrappers::StgMedium;

/// `IID_IDataObject`: `0000010e-0000-0000-C000-000000000046`.
pub const IID_IDATAOBJECT: GUID = GUID::from_u128(0x0000010e_0000_0000_c000_000000000046);

/// This struct represents the COM `IDataObject` interface.
#[repr(transparent)]
#[derive(Clone, Debug)]
pub struct IDataObject(IUnknown);

impl IDataObject {
    /// Renders the data described by `format` into a new medium owned by the caller.
    pub fn GetData(&self, format: &FORMATETC) -> Result<StgMedium> {
        let mut medium = STGMEDIUM::null();
        unsafe { (Interface::vtable(self).GetData)(Interface::as_raw(self), format, &mut medium) }
            .ok_for("GetData")?;
        Ok(unsafe { StgMedium::from_raw(medium) })
    }

    /// Renders into a medium allocated by the caller.
    pub fn GetDataHere(&self, format: &FORMATETC, medium: &mut STGMEDIUM) -> Result<()> {
        unsafe { (Interface::vtable(self).GetDataHere)(Interface::as_raw(self), format, medium) }
            .ok_for("GetDataHere")
    }

    /// Succeeds when a `GetData` call with `format` would succeed.
    pub fn QueryGetData(&self, format: &FORMATETC) -> Result<()> {
        let hr =
            unsafe { (Interface::vtable(self).QueryGetData)(Interface::as_raw(self), format) };
        match hr {
            hresult::S_OK => Ok(()),
            hr if hr.is_err() => Err(Error::from_hresult(hr, "QueryGetData")),
            _ => Err(Error::ApiError("QueryGetData", hresult::DV_E_FORMATETC)),
        }
    }

    /// Returns the canonical equivalent of `format`, or `None` when it is
    /// already canonical (`DATA_S_SAMEFORMATETC`).
    pub fn GetCanonicalFormatEtc(&self, format: &FORMATETC) -> Result<Option<FORMATETC>> {
        let mut canonical = FORMATETC::default();
        let hr = unsafe {
            (Interface::vtable(self).GetCanonicalFormatEtc)(
                Interface::as_raw(self),
                format,
                &mut canonical,
            )
        };
        hr.ok_for("GetCanonicalFormatEtc")?;
        if hr == hresult::DATA_S_SAMEFORMATETC {
            Ok(None)
        } else {
            Ok(Some(canonical))
        }
    }

    /// Hands `medium` to the object (`fRelease = TRUE`).
    ///
    /// Ownership transfers only on success; a rejected medium is released here.
    pub fn SetData(&self, format: &FORMATETC, medium: StgMedium) -> Result<()> {
        let mut raw = medium.into_raw();
        let hr = unsafe {
            (Interface::vtable(self).SetData)(Interface::as_raw(self), format, &mut raw, 1)
        };
        if hr.is_err() {
            drop(unsafe { StgMedium::from_raw(raw) });
            return Err(Error::from_hresult(hr, "SetData"));
        }
        Ok(())
    }

    /// Passes `medium` without transferring ownership (`fRelease = FALSE`).
    pub fn SetDataRef(&self, format: &FORMATETC, medium: &STGMEDIUM) -> Result<()> {
        let mut copy = *medium;
        unsafe { (Interface::vtable(self).SetData)(Interface::as_raw(self), format, &mut copy, 0) }
            .ok_for("SetData")
    }

    /// Enumerates the formats available for `direction`.
    pub fn EnumFormatEtc(&self, direction: DataDirection) -> Result<IEnumFORMATETC> {
        let mut result = null_mut();
        unsafe {
            (Interface::vtable(self).EnumFormatEtc)(
                Interface::as_raw(self),
                direction as u32,
                &mut result,
            )
        }
        .ok_for("EnumFormatEtc")?;
        unsafe { IEnumFORMATETC::from_raw_opt(result) }
            .ok_or(Error::NullPointerError("EnumFormatEtc"))
    }

    /// Creates an advisory connection, returning its cookie.
    pub fn DAdvise(&self, format: &FORMATETC, advf: Advf, sink: &IAdviseSink) -> Result<u32> {
        let mut connection = 0;
        unsafe {
            (Interface::vtable(self).DAdvise)(
                Interface::as_raw(self),
                format,
                advf.bits(),
                sink.as_raw(),
                &mut connection,
            )
        }
        .ok_for("DAdvise")?;
        Ok(connection)
    }

    /// Removes an advisory connection.
    pub fn DUnadvise(&self, connection: u32) -> Result<()> {
        unsafe { (Interface::vtable(self).DUnadvise)(Interface::as_raw(self), connection) }
            .ok_for("DUnadvise")
    }

    /// Enumerates advisory connections; `None` when the object has none to report.
    pub fn EnumDAdvise(&self) -> Result<Option<IEnumSTATDATA>> {
        let mut result = null_mut();
        unsafe { (Interface::vtable(self).EnumDAdvise)(Interface::as_raw(self), &mut result) }
            .ok_for("EnumDAdvise")?;
        Ok(unsafe { IEnumSTATDATA::from_raw_opt(result) })
    }
}

unsafe impl Interface for IDataObject {
    type Vtable = IDataObject_Vtbl;
    const IID: GUID = IID_IDATAOBJECT;
}

impl Deref for IDataObject {
    type Target = IUnknown;

    fn deref(&self) -> &Self::Target {
        unsafe { core::mem::transmute(self) }
    }
}

impl IDataObject_Vtbl {
    /// Verifies if a given interface ID matches `IDataObject`.
    pub fn matches(iid: &GUID) -> bool {
        iid == &IID_IDATAOBJECT
    }
}

unsafe impl ComVtable for IDataObject_Vtbl {
    const INTERFACES: &'static [GUID] = &[IID_IDATAOBJECT];
}

/// Raw COM vtable for the `IDataObject` interface.
#[repr(C)]
pub struct IDataObject_Vtbl {
    pub base__: IUnknown_Vtbl,
    pub GetData: unsafe extern "system" fn(
        this: *mut c_void,
        pformatetcin: *const FORMATETC,
        pmedium: *mut STGMEDIUM,
    ) -> HRESULT,
    pub GetDataHere: unsafe extern "system" fn(
        this: *mut c_void,
        pformatetc: *const FORMATETC,
        pmedium: *mut STGMEDIUM,
    ) -> HRESULT,
    pub QueryGetData:
        unsafe extern "system" fn(this: *mut c_void, pformatetc: *const FORMATETC) -> HRESULT,
    pub GetCanonicalFormatEtc: unsafe extern "system" fn(
        this: *mut c_void,
        pformatectin: *const FORMATETC,
        pformatetcout: *mut FORMATETC,
    ) -> HRESULT,
    pub SetData: unsafe extern "system" fn(
        this: *mut c_void,
        pformatetc: *const FORMATETC,
        pmedium: *mut STGMEDIUM,
        frelease: i32,
    ) -> HRESULT,
    pub EnumFormatEtc: unsafe extern "system" fn(
        this: *mut c_void,
        dwdirection: u32,
        ppenumformatetc: *mut *mut c_void,
    ) -> HRESULT,
    pub DAdvise: unsafe extern "system" fn(
        this: *mut c_void,
        pformatetc: *const FORMATETC,
        advf: u32,
        padvsink: *mut c_void,
        pdwconnection: *mut u32,
    ) -> HRESULT,
    pub DUnadvise: unsafe extern "system" fn(this: *mut c_void, dwconnection: u32) -> HRESULT,
    pub EnumDAdvise:
        unsafe extern "system" fn(this: *mut c_void, ppenumadvise: *mut *mut c_void) -> HRESULT,
}
