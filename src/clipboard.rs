//! OLE clipboard access.
//!
//! Data placed on the clipboard by this process stays a Rust object: reading
//! it back returns the same `Arc`. Foreign data objects are wrapped in an
//! [`AgileDataObject`] so the result can move between threads.

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;
use core::ptr::null_mut;

use windows::Win32::System::DataExchange::{
    GetClipboardFormatNameW, GetUpdatedClipboardFormats, IsClipboardFormatAvailable,
    RegisterClipboardFormatW,
};
use windows::core::PCWSTR;
use windows_core::{HRESULT, Interface};
use windows_sys::Win32::Foundation::ERROR_INSUFFICIENT_BUFFER;
use windows_sys::Win32::System::Ole::{
    OleFlushClipboard, OleGetClipboard, OleIsCurrentClipboard, OleSetClipboard,
};

use crate::agile::AgileDataObject;
use crate::ccw::IDataObject_Impl;
use crate::com::{IDataObject, InterfaceExt};
use crate::error::{Error, Result};
use crate::hresult::{self, HResultExt};
use crate::ole::{OleSession, ensure_sta};
use crate::string::WideStr;

/// Initializes OLE on the calling thread, which clipboard access requires.
pub fn initialize() -> Result<OleSession> {
    OleSession::new()
}

/// Retrieves the clipboard's data object.
pub fn get() -> Result<Arc<dyn IDataObject_Impl>> {
    ensure_sta()?;

    let mut result = null_mut();
    HRESULT(unsafe { OleGetClipboard(&mut result) }).ok_for("OleGetClipboard")?;
    let object = unsafe { IDataObject::from_raw_opt(result) }
        .ok_or(Error::NullPointerError("OleGetClipboard"))?;

    if let Some(own) = object.as_impl() {
        log::debug!("clipboard holds one of our data objects");
        return Ok(own);
    }

    // `object` is released on return whether or not this succeeds.
    let agile = AgileDataObject::new(&object)?;
    log::debug!("wrapped foreign clipboard object in an agile reference");
    Ok(Arc::new(agile))
}

/// Places `data` on the clipboard, or empties it for `None`.
///
/// Objects that forward to a native data object are passed through as is.
pub fn set(data: Option<Arc<dyn IDataObject_Impl>>) -> Result<()> {
    let object =
        data.map(|data| data.as_native().unwrap_or_else(|| IDataObject::from_impl(data)));
    set_object(object.as_ref())
}

/// Places a native data object on the clipboard, or empties it for `None`.
pub fn set_object(object: Option<&IDataObject>) -> Result<()> {
    ensure_sta()?;
    let raw = object.map_or(null_mut(), Interface::as_raw);
    HRESULT(unsafe { OleSetClipboard(raw) }).ok_for("OleSetClipboard")
}

/// Renders all formats and detaches the clipboard from this process.
pub fn flush() -> Result<()> {
    HRESULT(unsafe { OleFlushClipboard() }).ok_for("OleFlushClipboard")
}

/// Whether `object` is the data object currently on the clipboard.
pub fn is_current(object: &IDataObject) -> Result<bool> {
    let hr = HRESULT(unsafe { OleIsCurrentClipboard(object.as_raw()) });
    hr.ok_for("OleIsCurrentClipboard")?;
    Ok(hr == hresult::S_OK)
}

/// Registers a named clipboard format, returning its identifier.
pub fn register_format(name: &str) -> Result<u16> {
    let wide = name.to_wide();
    let format = unsafe { RegisterClipboardFormatW(PCWSTR::from_raw(wide.as_ptr())) };
    if format == 0 {
        return Err(Error::last_os_error("RegisterClipboardFormatW"));
    }
    Ok(format as u16)
}

/// Name of a registered format. Predefined formats have no name and fail.
pub fn format_name(format: u16) -> Result<String> {
    let mut buffer = vec![0u16; 64];
    loop {
        let count = unsafe { GetClipboardFormatNameW(u32::from(format), &mut buffer) };

        if count == 0 {
            let err = Error::last_os_error("GetClipboardFormatNameW");
            if matches!(err, Error::Win32Error(_, ERROR_INSUFFICIENT_BUFFER)) {
                buffer.resize(buffer.len() + 50, 0);
                continue;
            }
            return Err(err);
        }

        let count = count as usize;
        if count + 1 >= buffer.len() {
            // Possibly truncated.
            buffer.resize(buffer.len() * 2, 0);
            continue;
        }
        return Ok(String::from_utf16_lossy(&buffer[..count]));
    }
}

/// Whether the clipboard currently offers `format`.
pub fn is_format_available(format: u16) -> bool {
    unsafe { IsClipboardFormatAvailable(u32::from(format)) }.is_ok()
}

/// Formats currently on the clipboard.
pub fn available_formats() -> Result<Vec<u16>> {
    let mut formats = vec![0u32; 8];
    loop {
        let mut count = 0;
        if let Err(err) = unsafe { GetUpdatedClipboardFormats(&mut formats, &mut count) } {
            let err = Error::from_hresult(err.code(), "GetUpdatedClipboardFormats");
            if matches!(err, Error::Win32Error(_, ERROR_INSUFFICIENT_BUFFER)) {
                formats.resize((count as usize).max(formats.len() * 2), 0);
                continue;
            }
            return Err(err);
        }

        formats.truncate(count as usize);
        return Ok(formats.into_iter().map(|format| format as u16).collect());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DataStore;
    use crate::com::{CF_TEXT, FORMATETC, Tymed};

    #[test]
    fn test_register_format_name() {
        let id = register_format("comwrap.test.format").unwrap();
        assert!(id >= 0xC000);
        assert_eq!(register_format("comwrap.test.format").unwrap(), id);
        assert_eq!(format_name(id).unwrap(), "comwrap.test.format");
        assert!(format_name(CF_TEXT).is_err());
    }

    #[test]
    fn test_requires_sta() {
        std::thread::spawn(|| {
            assert!(matches!(get(), Err(Error::WrongApartment)));
            assert!(matches!(set(None), Err(Error::WrongApartment)));
        })
        .join()
        .unwrap();
    }

    #[test]
    #[ignore = "replaces the system clipboard contents"]
    fn test_round_trip_own_object() {
        std::thread::spawn(|| {
            let _session = initialize().unwrap();

            let store = Arc::new(DataStore::new());
            store.insert(CF_TEXT, b"clip\0".to_vec());
            let data: Arc<dyn IDataObject_Impl> = store.clone();
            set(Some(data.clone())).unwrap();

            let current = get().unwrap();
            assert!(current.QueryGetData(&FORMATETC::new(CF_TEXT, Tymed::HGLOBAL)).is_ok());
            assert!(is_format_available(CF_TEXT));
            assert!(available_formats().unwrap().contains(&CF_TEXT));

            flush().unwrap();
            set(None).unwrap();
        })
        .join()
        .unwrap();
    }
}
