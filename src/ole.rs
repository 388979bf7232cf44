//! OLE initialization, apartment queries and drag and drop.

use core::marker::PhantomData;

use windows::Win32::System::Com::{
    APTTYPE, APTTYPE_MAINSTA, APTTYPE_MTA, APTTYPE_NA, APTTYPE_STA, APTTYPEQUALIFIER,
    CoGetApartmentType,
};
use windows::Win32::System::Ole::{OleInitialize, OleUninitialize};
use windows_core::{HRESULT, Interface};
use windows_sys::Win32::System::Ole::DoDragDrop;

use crate::com::{DropEffect, IDataObject, IDropSource};
use crate::error::{Error, Result};
use crate::hresult;

/// Keeps OLE initialized on the current thread; uninitializes on drop.
///
/// Initialization puts the thread in a single-threaded apartment.
#[derive(Debug)]
pub struct OleSession {
    _thread_bound: PhantomData<*mut ()>,
}

impl OleSession {
    /// Calls `OleInitialize`. `S_FALSE` (already initialized) counts as success
    /// and is balanced by the drop like any other call.
    pub fn new() -> Result<Self> {
        unsafe { OleInitialize(None) }
            .map_err(|err| Error::from_hresult(err.code(), "OleInitialize"))?;
        log::debug!("OLE initialized on current thread");
        Ok(Self {
            _thread_bound: PhantomData,
        })
    }
}

impl Drop for OleSession {
    fn drop(&mut self) {
        unsafe { OleUninitialize() };
    }
}

/// COM apartment of the calling thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Apartment {
    /// COM is not initialized on this thread.
    None,
    Sta,
    MainSta,
    Mta,
    Neutral,
}

impl Apartment {
    /// Queries `CoGetApartmentType`.
    pub fn current() -> Result<Self> {
        let mut kind = APTTYPE::default();
        let mut qualifier = APTTYPEQUALIFIER::default();
        match unsafe { CoGetApartmentType(&mut kind, &mut qualifier) } {
            Ok(()) => {}
            Err(err) if err.code() == hresult::CO_E_NOTINITIALIZED => return Ok(Apartment::None),
            Err(err) => return Err(Error::from_hresult(err.code(), "CoGetApartmentType")),
        }

        Ok(match kind {
            APTTYPE_STA => Apartment::Sta,
            APTTYPE_MTA => Apartment::Mta,
            APTTYPE_NA => Apartment::Neutral,
            APTTYPE_MAINSTA => Apartment::MainSta,
            _ => Apartment::None,
        })
    }

    #[inline]
    pub fn is_sta(self) -> bool {
        matches!(self, Apartment::Sta | Apartment::MainSta)
    }
}

/// Fails with [`Error::WrongApartment`] unless the caller is in an STA.
pub fn ensure_sta() -> Result<()> {
    if Apartment::current()?.is_sta() {
        Ok(())
    } else {
        Err(Error::WrongApartment)
    }
}

/// Runs the modal OLE drag loop.
///
/// Returns the effect the target performed, or an empty effect when the drag
/// was cancelled.
pub fn do_drag_drop(
    data: &IDataObject,
    source: &IDropSource,
    allowed: DropEffect,
) -> Result<DropEffect> {
    ensure_sta()?;

    let mut effect = 0;
    let hr = HRESULT(unsafe {
        DoDragDrop(data.as_raw(), source.as_raw(), allowed.bits(), &mut effect)
    });
    match hr {
        hresult::DRAGDROP_S_DROP => Ok(DropEffect::from_bits_retain(effect)),
        hresult::DRAGDROP_S_CANCEL => Ok(DropEffect::empty()),
        hr => Err(Error::from_hresult(hr, "DoDragDrop")),
    }
}
