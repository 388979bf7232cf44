//! `HRESULT` codes and Win32 error helpers.
//!
//! The status type itself is [`windows_core::HRESULT`]. Codes are taken from
//! `windows-sys` and retyped here so they can be matched against directly.
//! Bit layouts follow [MS-ERREF]: bit 31 is the severity, bits 16..=28 the
//! facility and the low word the code.

use windows_core::HRESULT;
use windows_sys::Win32::Foundation as codes;

use crate::error::{Error, Result};

pub use windows_sys::Win32::Foundation::WIN32_ERROR;

pub const S_OK: HRESULT = HRESULT(codes::S_OK);
pub const S_FALSE: HRESULT = HRESULT(codes::S_FALSE);

pub const E_NOTIMPL: HRESULT = HRESULT(codes::E_NOTIMPL);
pub const E_NOINTERFACE: HRESULT = HRESULT(codes::E_NOINTERFACE);
pub const E_POINTER: HRESULT = HRESULT(codes::E_POINTER);
pub const E_ABORT: HRESULT = HRESULT(codes::E_ABORT);
pub const E_FAIL: HRESULT = HRESULT(codes::E_FAIL);
pub const E_UNEXPECTED: HRESULT = HRESULT(codes::E_UNEXPECTED);
pub const E_ACCESSDENIED: HRESULT = HRESULT(codes::E_ACCESSDENIED);
pub const E_HANDLE: HRESULT = HRESULT(codes::E_HANDLE);
pub const E_OUTOFMEMORY: HRESULT = HRESULT(codes::E_OUTOFMEMORY);
pub const E_INVALIDARG: HRESULT = HRESULT(codes::E_INVALIDARG);

// OLE data transfer
pub const OLE_E_ADVISENOTSUPPORTED: HRESULT = HRESULT(codes::OLE_E_ADVISENOTSUPPORTED);
pub const DV_E_FORMATETC: HRESULT = HRESULT(codes::DV_E_FORMATETC);
pub const DV_E_DVTARGETDEVICE: HRESULT = HRESULT(codes::DV_E_DVTARGETDEVICE);
pub const DV_E_STGMEDIUM: HRESULT = HRESULT(codes::DV_E_STGMEDIUM);
pub const DV_E_LINDEX: HRESULT = HRESULT(codes::DV_E_LINDEX);
pub const DV_E_TYMED: HRESULT = HRESULT(codes::DV_E_TYMED);
pub const DV_E_DVASPECT: HRESULT = HRESULT(codes::DV_E_DVASPECT);
pub const DATA_S_SAMEFORMATETC: HRESULT = HRESULT(codes::DATA_S_SAMEFORMATETC);

// Drag and drop
pub const DRAGDROP_S_DROP: HRESULT = HRESULT(codes::DRAGDROP_S_DROP);
pub const DRAGDROP_S_CANCEL: HRESULT = HRESULT(codes::DRAGDROP_S_CANCEL);
pub const DRAGDROP_S_USEDEFAULTCURSORS: HRESULT = HRESULT(codes::DRAGDROP_S_USEDEFAULTCURSORS);

// Clipboard and apartments
pub const CLIPBRD_E_CANT_OPEN: HRESULT = HRESULT(codes::CLIPBRD_E_CANT_OPEN);
pub const CLIPBRD_E_CANT_SET: HRESULT = HRESULT(codes::CLIPBRD_E_CANT_SET);
pub const CO_E_NOTINITIALIZED: HRESULT = HRESULT(codes::CO_E_NOTINITIALIZED);
pub const RPC_E_CHANGED_MODE: HRESULT = HRESULT(codes::RPC_E_CHANGED_MODE);
pub const RPC_E_WRONG_THREAD: HRESULT = HRESULT(codes::RPC_E_WRONG_THREAD);

// Structured storage
pub const STG_E_INVALIDFUNCTION: HRESULT = HRESULT(codes::STG_E_INVALIDFUNCTION);
pub const STG_E_FILENOTFOUND: HRESULT = HRESULT(codes::STG_E_FILENOTFOUND);
pub const STG_E_ACCESSDENIED: HRESULT = HRESULT(codes::STG_E_ACCESSDENIED);
pub const STG_E_INVALIDPOINTER: HRESULT = HRESULT(codes::STG_E_INVALIDPOINTER);
pub const STG_E_WRITEFAULT: HRESULT = HRESULT(codes::STG_E_WRITEFAULT);
pub const STG_E_READFAULT: HRESULT = HRESULT(codes::STG_E_READFAULT);
pub const STG_E_MEDIUMFULL: HRESULT = HRESULT(codes::STG_E_MEDIUMFULL);

/// `ObjectDisposedException`, reported when a wrapper outlives its object.
pub const COR_E_OBJECTDISPOSED: HRESULT = HRESULT(0x8013_1622_u32 as i32);

/// Common facility values.
pub mod facility {
    pub const NULL: u16 = 0;
    pub const RPC: u16 = 1;
    pub const DISPATCH: u16 = 2;
    pub const STORAGE: u16 = 3;
    pub const ITF: u16 = 4;
    pub const WIN32: u16 = 7;
    pub const WINDOWS: u16 = 8;
    pub const CONTROL: u16 = 10;
    pub const URT: u16 = 19;
}

/// Field accessors and error conversion for [`HRESULT`].
pub trait HResultExt: Copy {
    /// `HRESULT_CODE(hr)`
    fn code(self) -> u16;

    /// `HRESULT_FACILITY(hr)`
    fn facility(self) -> u16;

    /// `HRESULT_SEVERITY(hr)`
    fn severity(self) -> u8;

    /// `Ok(())` for success codes, otherwise the [`Error`] mapped from the
    /// code with `api` named as its source.
    fn ok_for(self, api: &'static str) -> Result<()>;
}

impl HResultExt for HRESULT {
    #[inline]
    fn code(self) -> u16 {
        (self.0 & 0xFFFF) as u16
    }

    #[inline]
    fn facility(self) -> u16 {
        ((self.0 >> 16) & 0x1FFF) as u16
    }

    #[inline]
    fn severity(self) -> u8 {
        ((self.0 >> 31) & 0x1) as u8
    }

    #[inline]
    fn ok_for(self, api: &'static str) -> Result<()> {
        if self.is_ok() {
            Ok(())
        } else {
            Err(Error::from_hresult(self, api))
        }
    }
}

/// `Ok(())` for `ERROR_SUCCESS`, otherwise an [`Error::Win32Error`].
pub fn win32_ok(code: WIN32_ERROR, api: &'static str) -> Result<()> {
    if code == codes::ERROR_SUCCESS {
        Ok(())
    } else {
        Err(Error::Win32Error(api, code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::format;
    use windows_sys::Win32::Foundation::{
        ERROR_ACCESS_DENIED, ERROR_INVALID_HANDLE, ERROR_INVALID_PARAMETER,
        ERROR_NOT_ENOUGH_MEMORY, ERROR_OUTOFMEMORY, ERROR_SUCCESS,
    };

    #[test]
    fn test_success_and_failure() {
        assert!(S_OK.is_ok());
        assert!(S_FALSE.is_ok());
        assert!(DRAGDROP_S_DROP.is_ok());
        assert!(E_FAIL.is_err());
        assert!(DV_E_FORMATETC.is_err());
    }

    #[test]
    fn test_decompose() {
        assert_eq!(E_ACCESSDENIED.facility(), facility::WIN32);
        assert_eq!(E_ACCESSDENIED.code(), 5);
        assert_eq!(E_ACCESSDENIED.severity(), 1);

        assert_eq!(DV_E_FORMATETC.facility(), facility::ITF);
        assert_eq!(STG_E_INVALIDFUNCTION.facility(), facility::STORAGE);
        assert_eq!(COR_E_OBJECTDISPOSED.facility(), facility::URT);
        assert_eq!(S_FALSE.severity(), 0);
    }

    #[test]
    fn test_from_win32() {
        assert_eq!(HRESULT::from_win32(ERROR_SUCCESS), S_OK);
        assert_eq!(HRESULT::from_win32(ERROR_ACCESS_DENIED), E_ACCESSDENIED);
        assert_eq!(HRESULT::from_win32(ERROR_INVALID_PARAMETER), E_INVALIDARG);
        assert_eq!(HRESULT::from_win32(ERROR_OUTOFMEMORY), E_OUTOFMEMORY);
        assert_eq!(HRESULT::from_win32(ERROR_INVALID_HANDLE), E_HANDLE);
    }

    #[test]
    fn test_ok_maps_errors() {
        assert!(S_FALSE.ok_for("COM call").is_ok());
        assert!(matches!(E_ACCESSDENIED.ok_for("Open"), Err(Error::AccessDenied(_))));
        assert!(matches!(
            DV_E_TYMED.ok_for("GetData"),
            Err(Error::ApiError("GetData", DV_E_TYMED))
        ));
    }

    #[test]
    fn test_win32_ok() {
        assert!(win32_ok(ERROR_SUCCESS, "GlobalAlloc").is_ok());
        assert!(matches!(
            win32_ok(ERROR_NOT_ENOUGH_MEMORY, "GlobalAlloc"),
            Err(Error::Win32Error("GlobalAlloc", ERROR_NOT_ENOUGH_MEMORY))
        ));
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", E_NOINTERFACE), "0x80004002");
        assert_eq!(format!("{:?}", S_FALSE), "HRESULT(0x00000001)");
    }
}
