use alloc::sync::Arc;
use alloc::vec::Vec;
use core::ffi::c_void;
use core::ptr::null_mut;

use windows_core::{HRESULT, Interface};

use crate::ccw::Lifetime;
use crate::com::{
    Advf, DataDirection, FORMATETC, IAdviseSink, IDataObject, IDataObject_Vtbl, IEnumFORMATETC,
    IEnumSTATDATA, InterfaceExt, STGMEDIUM,
};
use crate::error::{Error, Result};
use crate::hresult;
use crate::wrappers::StgMedium;

/// Trait representing the implementation of the `IDataObject` interface.
///
/// Provided methods answer the way OLE expects from an object that does not
/// support the operation.
pub trait IDataObject_Impl: Send + Sync {
    /// Renders `format` into a new medium handed to the caller.
    fn GetData(&self, format: &FORMATETC) -> Result<StgMedium>;

    fn GetDataHere(&self, _format: &FORMATETC, _medium: &mut STGMEDIUM) -> Result<()> {
        Err(Error::NotImplemented)
    }

    /// `Ok(())` when `GetData` would succeed for `format`.
    fn QueryGetData(&self, format: &FORMATETC) -> Result<()>;

    /// `Ok(None)` reports `DATA_S_SAMEFORMATETC`.
    fn GetCanonicalFormatEtc(&self, _format: &FORMATETC) -> Result<Option<FORMATETC>> {
        Ok(None)
    }

    /// Stores data from `medium`.
    ///
    /// The medium is borrowed; when the caller transferred ownership the
    /// wrapper releases it after this returns `Ok`.
    fn SetData(&self, _format: &FORMATETC, _medium: &STGMEDIUM) -> Result<()> {
        Err(Error::NotImplemented)
    }

    fn EnumFormatEtc(&self, direction: DataDirection) -> Result<Vec<FORMATETC>>;

    fn DAdvise(&self, _format: &FORMATETC, _advf: Advf, _sink: &IAdviseSink) -> Result<u32> {
        Err(Error::ApiError("DAdvise", hresult::OLE_E_ADVISENOTSUPPORTED))
    }

    fn DUnadvise(&self, _connection: u32) -> Result<()> {
        Err(Error::ApiError("DUnadvise", hresult::OLE_E_ADVISENOTSUPPORTED))
    }

    fn EnumDAdvise(&self) -> Result<Option<IEnumSTATDATA>> {
        Err(Error::ApiError("EnumDAdvise", hresult::OLE_E_ADVISENOTSUPPORTED))
    }

    /// The native object this implementation forwards to, if any.
    fn as_native(&self) -> Option<IDataObject> {
        None
    }
}

type DataObjectWrapper = Lifetime<IDataObject_Vtbl, Arc<dyn IDataObject_Impl>>;

static DATA_OBJECT_VTBL: IDataObject_Vtbl = IDataObject_Vtbl {
    base__: DataObjectWrapper::unknown_vtbl(),
    GetData,
    GetDataHere,
    QueryGetData,
    GetCanonicalFormatEtc,
    SetData,
    EnumFormatEtc,
    DAdvise,
    DUnadvise,
    EnumDAdvise,
};

impl IDataObject {
    /// Exposes `object` to native code through a new callable wrapper.
    pub fn from_impl(object: Arc<dyn IDataObject_Impl>) -> Self {
        unsafe { Self::from_raw(DataObjectWrapper::allocate(object, &DATA_OBJECT_VTBL)) }
    }

    /// The Rust object behind this pointer, if it is one of our wrappers.
    pub fn as_impl(&self) -> Option<Arc<dyn IDataObject_Impl>> {
        unsafe { DataObjectWrapper::try_object(self.as_raw(), &DATA_OBJECT_VTBL) }.cloned()
    }
}

impl<T: IDataObject_Impl + 'static> From<T> for IDataObject {
    fn from(object: T) -> Self {
        IDataObject::from_impl(Arc::new(object))
    }
}

#[inline]
unsafe fn implementation<'a>(this: *mut c_void) -> &'a dyn IDataObject_Impl {
    unsafe { &**DataObjectWrapper::object(this) }
}

fn failure(api: &'static str, err: Error) -> HRESULT {
    let hr = err.hresult();
    log::trace!("IDataObject::{api} failed: {err}");
    hr
}

unsafe extern "system" fn GetData(
    this: *mut c_void,
    pformatetcin: *const FORMATETC,
    pmedium: *mut STGMEDIUM,
) -> HRESULT {
    if pmedium.is_null() {
        return hresult::E_POINTER;
    }
    unsafe { *pmedium = STGMEDIUM::null() };
    if pformatetcin.is_null() {
        return hresult::E_INVALIDARG;
    }

    match unsafe { implementation(this).GetData(&*pformatetcin) } {
        Ok(medium) => {
            unsafe { *pmedium = medium.into_raw() };
            hresult::S_OK
        }
        Err(err) => failure("GetData", err),
    }
}

unsafe extern "system" fn GetDataHere(
    this: *mut c_void,
    pformatetc: *const FORMATETC,
    pmedium: *mut STGMEDIUM,
) -> HRESULT {
    if pformatetc.is_null() || pmedium.is_null() {
        return hresult::E_INVALIDARG;
    }

    match unsafe { implementation(this).GetDataHere(&*pformatetc, &mut *pmedium) } {
        Ok(()) => hresult::S_OK,
        Err(err) => failure("GetDataHere", err),
    }
}

unsafe extern "system" fn QueryGetData(this: *mut c_void, pformatetc: *const FORMATETC) -> HRESULT {
    if pformatetc.is_null() {
        return hresult::E_INVALIDARG;
    }

    match unsafe { implementation(this).QueryGetData(&*pformatetc) } {
        Ok(()) => hresult::S_OK,
        Err(err) => err.hresult(),
    }
}

unsafe extern "system" fn GetCanonicalFormatEtc(
    this: *mut c_void,
    pformatectin: *const FORMATETC,
    pformatetcout: *mut FORMATETC,
) -> HRESULT {
    if pformatetcout.is_null() {
        return hresult::E_POINTER;
    }
    if pformatectin.is_null() {
        return hresult::E_INVALIDARG;
    }

    let format = unsafe { &*pformatectin };
    match unsafe { implementation(this).GetCanonicalFormatEtc(format) } {
        Ok(Some(canonical)) => {
            unsafe { *pformatetcout = canonical };
            hresult::S_OK
        }
        Ok(None) => {
            unsafe {
                *pformatetcout = FORMATETC {
                    ptd: null_mut(),
                    ..*format
                }
            };
            hresult::DATA_S_SAMEFORMATETC
        }
        Err(err) => failure("GetCanonicalFormatEtc", err),
    }
}

unsafe extern "system" fn SetData(
    this: *mut c_void,
    pformatetc: *const FORMATETC,
    pmedium: *mut STGMEDIUM,
    frelease: i32,
) -> HRESULT {
    if pformatetc.is_null() || pmedium.is_null() {
        return hresult::E_INVALIDARG;
    }

    match unsafe { implementation(this).SetData(&*pformatetc, &*pmedium) } {
        Ok(()) => {
            if frelease != 0 {
                drop(unsafe { StgMedium::from_raw(*pmedium) });
            }
            hresult::S_OK
        }
        Err(err) => failure("SetData", err),
    }
}

unsafe extern "system" fn EnumFormatEtc(
    this: *mut c_void,
    dwdirection: u32,
    ppenumformatetc: *mut *mut c_void,
) -> HRESULT {
    if ppenumformatetc.is_null() {
        return hresult::E_POINTER;
    }
    unsafe { *ppenumformatetc = null_mut() };

    let Some(direction) = DataDirection::from_raw(dwdirection) else {
        return hresult::E_INVALIDARG;
    };

    match unsafe { implementation(this).EnumFormatEtc(direction) } {
        Ok(formats) => {
            unsafe { *ppenumformatetc = IEnumFORMATETC::from_formats(formats).into_raw() };
            hresult::S_OK
        }
        Err(err) => failure("EnumFormatEtc", err),
    }
}

unsafe extern "system" fn DAdvise(
    this: *mut c_void,
    pformatetc: *const FORMATETC,
    advf: u32,
    padvsink: *mut c_void,
    pdwconnection: *mut u32,
) -> HRESULT {
    if pdwconnection.is_null() {
        return hresult::E_POINTER;
    }
    unsafe { *pdwconnection = 0 };

    let Some(sink) = (unsafe { IAdviseSink::from_raw_cloned(padvsink) }) else {
        return hresult::E_INVALIDARG;
    };
    if pformatetc.is_null() {
        return hresult::E_INVALIDARG;
    }

    let advf = Advf::from_bits_retain(advf);
    match unsafe { implementation(this).DAdvise(&*pformatetc, advf, &sink) } {
        Ok(connection) => {
            unsafe { *pdwconnection = connection };
            hresult::S_OK
        }
        Err(err) => err.hresult(),
    }
}

unsafe extern "system" fn DUnadvise(this: *mut c_void, dwconnection: u32) -> HRESULT {
    match unsafe { implementation(this).DUnadvise(dwconnection) } {
        Ok(()) => hresult::S_OK,
        Err(err) => err.hresult(),
    }
}

unsafe extern "system" fn EnumDAdvise(
    this: *mut c_void,
    ppenumadvise: *mut *mut c_void,
) -> HRESULT {
    if ppenumadvise.is_null() {
        return hresult::E_POINTER;
    }
    unsafe { *ppenumadvise = null_mut() };

    match unsafe { implementation(this).EnumDAdvise() } {
        Ok(Some(enumerator)) => {
            unsafe { *ppenumadvise = enumerator.into_raw() };
            hresult::S_OK
        }
        Ok(None) => hresult::S_OK,
        Err(err) => err.hresult(),
    }
}
