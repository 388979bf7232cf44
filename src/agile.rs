//! Apartment-agile references to COM objects.
//!
//! `RoGetAgileReference` is resolved from `ole32.dll` at runtime. On systems
//! without it the Global Interface Table provides the same service.

use alloc::vec::Vec;
use core::ffi::c_void;
use core::marker::PhantomData;
use core::ptr::null_mut;

use windows_core::{GUID, HRESULT, Interface};
use windows_sys::Win32::System::Com::{CLSCTX_INPROC_SERVER, CoCreateInstance};
use windows_sys::Win32::System::LibraryLoader::{GetProcAddress, LoadLibraryW};

use crate::ccw::IDataObject_Impl;
use crate::com::{
    Advf, CLSID_STDGLOBALINTERFACETABLE, DataDirection, FORMATETC, IAdviseSink, IAgileReference,
    IDataObject, IEnumSTATDATA, IGlobalInterfaceTable, InterfaceExt, STGMEDIUM,
};
use crate::error::{Error, Result};
use crate::hresult::HResultExt;
use crate::string::WideStr;
use crate::wrappers::StgMedium;

type RoGetAgileReferenceType = unsafe extern "system" fn(
    options: u32,
    riid: *const GUID,
    punk: *mut c_void,
    ppagilereference: *mut *mut c_void,
) -> HRESULT;

/// Caches the address of `RoGetAgileReference` on first use.
static RO_GET_AGILE_REFERENCE: spin::Once<Option<RoGetAgileReferenceType>> = spin::Once::new();

fn ro_get_agile_reference() -> Option<RoGetAgileReferenceType> {
    *RO_GET_AGILE_REFERENCE.call_once(|| {
        let module = unsafe { LoadLibraryW("ole32.dll".to_wide().as_ptr()) };
        if module.is_null() {
            log::warn!("ole32.dll could not be loaded; agile references use the GIT");
            return None;
        }

        match unsafe { GetProcAddress(module, c"RoGetAgileReference".as_ptr().cast()) } {
            Some(address) => Some(unsafe {
                core::mem::transmute::<
                    unsafe extern "system" fn() -> isize,
                    RoGetAgileReferenceType,
                >(address)
            }),
            None => {
                log::warn!("RoGetAgileReference is unavailable; agile references use the GIT");
                None
            }
        }
    })
}

/// Creates the process-wide Global Interface Table.
fn global_interface_table() -> Result<IGlobalInterfaceTable> {
    let mut result = null_mut();
    let hr = HRESULT(unsafe {
        CoCreateInstance(
            (&CLSID_STDGLOBALINTERFACETABLE as *const GUID).cast(),
            null_mut(),
            CLSCTX_INPROC_SERVER,
            (&IGlobalInterfaceTable::IID as *const GUID).cast(),
            &mut result,
        )
    });
    hr.ok_for("CoCreateInstance")?;
    unsafe { IGlobalInterfaceTable::from_raw_opt(result) }
        .ok_or(Error::NullPointerError("CoCreateInstance"))
}

/// `AGILEREFERENCE_OPTIONS`
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AgileReferenceOptions {
    /// Marshal when the reference is created.
    #[default]
    Default = 0,
    /// Marshal on the first `resolve`.
    DelayedMarshal = 1,
}

enum Backing {
    Agile(IAgileReference),
    Git {
        table: IGlobalInterfaceTable,
        cookie: u32,
    },
}

/// A reference to `T` that any apartment can resolve.
pub struct AgileReference<T: Interface> {
    backing: Backing,
    _marker: PhantomData<T>,
}

// Both backings marshal on resolve and are free-threaded themselves.
unsafe impl<T: Interface> Send for AgileReference<T> {}
unsafe impl<T: Interface> Sync for AgileReference<T> {}

impl<T: Interface> AgileReference<T> {
    pub fn new(object: &T) -> Result<Self> {
        Self::with_options(object, AgileReferenceOptions::Default)
    }

    pub fn with_options(object: &T, options: AgileReferenceOptions) -> Result<Self> {
        let backing = match ro_get_agile_reference() {
            Some(create) => {
                let mut result = null_mut();
                unsafe { create(options as u32, &T::IID, object.as_raw(), &mut result) }
                    .ok_for("RoGetAgileReference")?;
                let reference = unsafe { IAgileReference::from_raw_opt(result) }
                    .ok_or(Error::NullPointerError("RoGetAgileReference"))?;
                Backing::Agile(reference)
            }
            None => {
                let table = global_interface_table()?;
                let cookie = table.RegisterInterfaceInGlobal(object)?;
                log::debug!("registered {:?} in the GIT as cookie {cookie}", T::IID);
                Backing::Git { table, cookie }
            }
        };

        Ok(Self {
            backing,
            _marker: PhantomData,
        })
    }

    /// Returns a pointer usable from the calling apartment.
    pub fn resolve(&self) -> Result<T> {
        match &self.backing {
            Backing::Agile(reference) => reference.Resolve::<T>(),
            Backing::Git { table, cookie } => table.GetInterfaceFromGlobal::<T>(*cookie),
        }
    }
}

impl<T: Interface> Drop for AgileReference<T> {
    fn drop(&mut self) {
        if let Backing::Git { table, cookie } = &self.backing {
            if let Err(err) = table.RevokeInterfaceFromGlobal(*cookie) {
                log::debug!("failed to revoke GIT cookie {cookie}: {err}");
            }
        }
    }
}

impl<T: Interface> core::fmt::Debug for AgileReference<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let kind = match self.backing {
            Backing::Agile(_) => "agile",
            Backing::Git { .. } => "git",
        };
        f.debug_struct("AgileReference")
            .field("iid", &T::IID)
            .field("backing", &kind)
            .finish()
    }
}

/// A native data object usable from any thread.
///
/// Every call resolves the agile reference in the caller's apartment.
#[derive(Debug)]
pub struct AgileDataObject {
    reference: AgileReference<IDataObject>,
}

impl AgileDataObject {
    pub fn new(object: &IDataObject) -> Result<Self> {
        Ok(Self {
            reference: AgileReference::new(object)?,
        })
    }

    pub fn resolve(&self) -> Result<IDataObject> {
        self.reference.resolve()
    }
}

impl IDataObject_Impl for AgileDataObject {
    fn GetData(&self, format: &FORMATETC) -> Result<StgMedium> {
        self.resolve()?.GetData(format)
    }

    fn GetDataHere(&self, format: &FORMATETC, medium: &mut STGMEDIUM) -> Result<()> {
        self.resolve()?.GetDataHere(format, medium)
    }

    fn QueryGetData(&self, format: &FORMATETC) -> Result<()> {
        self.resolve()?.QueryGetData(format)
    }

    fn GetCanonicalFormatEtc(&self, format: &FORMATETC) -> Result<Option<FORMATETC>> {
        self.resolve()?.GetCanonicalFormatEtc(format)
    }

    fn SetData(&self, format: &FORMATETC, medium: &STGMEDIUM) -> Result<()> {
        self.resolve()?.SetDataRef(format, medium)
    }

    fn EnumFormatEtc(&self, direction: DataDirection) -> Result<Vec<FORMATETC>> {
        self.resolve()?.EnumFormatEtc(direction)?.formats()
    }

    fn DAdvise(&self, format: &FORMATETC, advf: Advf, sink: &IAdviseSink) -> Result<u32> {
        self.resolve()?.DAdvise(format, advf, sink)
    }

    fn DUnadvise(&self, connection: u32) -> Result<()> {
        self.resolve()?.DUnadvise(connection)
    }

    fn EnumDAdvise(&self) -> Result<Option<IEnumSTATDATA>> {
        self.resolve()?.EnumDAdvise()
    }

    fn as_native(&self) -> Option<IDataObject> {
        self.resolve().ok()
    }
}
