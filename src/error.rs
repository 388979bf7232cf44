//! Error definitions for COM and Win32 interaction.

use alloc::string::String;
use thiserror::Error;
use windows_core::{GUID, HRESULT};
use windows_sys::Win32::Foundation as win32;

use crate::hresult::{self, HResultExt, WIN32_ERROR, facility};

/// Result alias for COM-related operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Represents all possible errors surfaced at the binding boundary.
#[derive(Debug, Error)]
pub enum Error {
    /// API call failed with HRESULT.
    #[error("{0} failed with HRESULT: {1}")]
    ApiError(&'static str, HRESULT),

    /// API call failed with a Win32 error code.
    #[error("{0} failed with Win32 error: {1}")]
    Win32Error(&'static str, WIN32_ERROR),

    /// `E_ACCESSDENIED`.
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// `E_INVALIDARG` or malformed input.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// `E_NOINTERFACE`; carries the requested IID when known.
    #[error("no such interface: {0:?}")]
    NoInterface(GUID),

    /// `E_NOTIMPL`.
    #[error("not implemented")]
    NotImplemented,

    /// The object behind a wrapper is gone.
    #[error("object has been released")]
    ObjectDisposed,

    /// Null pointer passed to an API expecting a valid reference.
    #[error("null pointer passed to {0} API")]
    NullPointerError(&'static str),

    /// The calling thread is not in a single-threaded apartment.
    #[error("operation requires a single-threaded apartment")]
    WrongApartment,

    /// I/O failure from a Rust stream behind a wrapper.
    #[cfg(feature = "std")]
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Maps a failed HRESULT onto the closest error variant.
    pub fn from_hresult(hr: HRESULT, api: &'static str) -> Self {
        match hr {
            hresult::E_ACCESSDENIED => Error::AccessDenied(String::from(api)),
            hresult::E_INVALIDARG => Error::InvalidArgument(String::from(api)),
            hresult::E_NOTIMPL => Error::NotImplemented,
            hresult::E_NOINTERFACE => Error::NoInterface(GUID::zeroed()),
            hresult::E_POINTER => Error::NullPointerError(api),
            hresult::COR_E_OBJECTDISPOSED => Error::ObjectDisposed,
            hresult::RPC_E_WRONG_THREAD => Error::WrongApartment,
            _ if hr.facility() == facility::WIN32 => Error::Win32Error(api, u32::from(hr.code())),
            _ => Error::ApiError(api, hr),
        }
    }

    /// The HRESULT reported to native callers for this error.
    pub fn hresult(&self) -> HRESULT {
        match self {
            Error::ApiError(_, hr) => *hr,
            Error::Win32Error(_, code) => HRESULT::from_win32(*code),
            Error::AccessDenied(_) => hresult::E_ACCESSDENIED,
            Error::InvalidArgument(_) => hresult::E_INVALIDARG,
            Error::NoInterface(_) => hresult::E_NOINTERFACE,
            Error::NotImplemented => hresult::E_NOTIMPL,
            Error::ObjectDisposed => hresult::COR_E_OBJECTDISPOSED,
            Error::NullPointerError(_) => hresult::E_POINTER,
            Error::WrongApartment => hresult::RPC_E_WRONG_THREAD,
            #[cfg(feature = "std")]
            Error::Io(err) => io_hresult(err),
        }
    }

    /// Builds an error from the calling thread's last Win32 error.
    #[cfg(windows)]
    pub fn last_os_error(api: &'static str) -> Self {
        let code = unsafe { windows::Win32::Foundation::GetLastError() };
        Error::Win32Error(api, code.0)
    }
}

impl From<HRESULT> for Error {
    fn from(hr: HRESULT) -> Self {
        Error::from_hresult(hr, "COM call")
    }
}

impl From<windows_core::Error> for Error {
    fn from(err: windows_core::Error) -> Self {
        Error::from(err.code())
    }
}

/// HRESULT for an I/O failure raised by a stream behind a wrapper.
#[cfg(feature = "std")]
pub(crate) fn io_hresult(err: &std::io::Error) -> HRESULT {
    use std::io::ErrorKind;

    // Only Windows reports Win32 codes here; elsewhere they are errno values.
    #[cfg(windows)]
    if let Some(code) = err.raw_os_error() {
        if let Ok(code) = u32::try_from(code) {
            return HRESULT::from_win32(code);
        }
    }

    if let Some(inner) = err.get_ref().and_then(|inner| inner.downcast_ref::<Error>()) {
        return inner.hresult();
    }

    match err.kind() {
        ErrorKind::NotFound => hresult::STG_E_FILENOTFOUND,
        ErrorKind::PermissionDenied => hresult::STG_E_ACCESSDENIED,
        ErrorKind::InvalidInput => hresult::STG_E_INVALIDFUNCTION,
        ErrorKind::Unsupported => hresult::STG_E_INVALIDFUNCTION,
        ErrorKind::WriteZero | ErrorKind::StorageFull => hresult::STG_E_MEDIUMFULL,
        ErrorKind::UnexpectedEof => hresult::STG_E_READFAULT,
        ErrorKind::OutOfMemory => hresult::E_OUTOFMEMORY,
        _ => hresult::E_FAIL,
    }
}

#[cfg(feature = "std")]
impl From<Error> for std::io::Error {
    fn from(err: Error) -> Self {
        use std::io::ErrorKind;

        let kind = match &err {
            Error::Io(io) => io.kind(),
            Error::AccessDenied(_) => ErrorKind::PermissionDenied,
            Error::InvalidArgument(_) | Error::NullPointerError(_) => ErrorKind::InvalidInput,
            Error::NotImplemented => ErrorKind::Unsupported,
            Error::Win32Error(_, code) => match *code {
                win32::ERROR_FILE_NOT_FOUND | win32::ERROR_PATH_NOT_FOUND => ErrorKind::NotFound,
                win32::ERROR_ACCESS_DENIED | win32::ERROR_SHARING_VIOLATION => {
                    ErrorKind::PermissionDenied
                }
                win32::ERROR_FILE_EXISTS | win32::ERROR_ALREADY_EXISTS => ErrorKind::AlreadyExists,
                win32::ERROR_INVALID_PARAMETER => ErrorKind::InvalidInput,
                win32::ERROR_NOT_ENOUGH_MEMORY | win32::ERROR_OUTOFMEMORY => {
                    ErrorKind::OutOfMemory
                }
                win32::ERROR_HANDLE_EOF => ErrorKind::UnexpectedEof,
                win32::ERROR_NOT_SUPPORTED => ErrorKind::Unsupported,
                win32::ERROR_DISK_FULL | win32::ERROR_HANDLE_DISK_FULL => ErrorKind::StorageFull,
                _ => ErrorKind::Other,
            },
            _ => ErrorKind::Other,
        };

        match err {
            Error::Io(io) => io,
            other => std::io::Error::new(kind, other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hresult::*;
    use std::format;

    #[test]
    fn test_from_hresult_mapping() {
        assert!(matches!(Error::from(E_ACCESSDENIED), Error::AccessDenied(_)));
        assert!(matches!(Error::from(E_INVALIDARG), Error::InvalidArgument(_)));
        assert!(matches!(Error::from(E_NOTIMPL), Error::NotImplemented));
        assert!(matches!(Error::from(COR_E_OBJECTDISPOSED), Error::ObjectDisposed));
        assert!(matches!(
            Error::from_hresult(HRESULT::from_win32(win32::ERROR_FILE_NOT_FOUND), "Open"),
            Error::Win32Error("Open", win32::ERROR_FILE_NOT_FOUND)
        ));
        assert!(matches!(
            Error::from_hresult(DV_E_FORMATETC, "GetData"),
            Error::ApiError("GetData", DV_E_FORMATETC)
        ));
    }

    #[test]
    fn test_hresult_round_trip_for_codes() {
        for hr in [
            E_ACCESSDENIED,
            E_INVALIDARG,
            E_NOTIMPL,
            E_NOINTERFACE,
            E_POINTER,
            DV_E_TYMED,
            COR_E_OBJECTDISPOSED,
            HRESULT::from_win32(win32::ERROR_SHARING_VIOLATION),
        ] {
            assert_eq!(Error::from(hr).hresult(), hr, "{hr}");
        }
    }

    #[test]
    fn test_every_variant_reports_failure() {
        // No wildcard arm: a new variant must be added here and given an HRESULT.
        fn name(err: &Error) -> &'static str {
            match err {
                Error::ApiError(..) => "ApiError",
                Error::Win32Error(..) => "Win32Error",
                Error::AccessDenied(_) => "AccessDenied",
                Error::InvalidArgument(_) => "InvalidArgument",
                Error::NoInterface(_) => "NoInterface",
                Error::NotImplemented => "NotImplemented",
                Error::ObjectDisposed => "ObjectDisposed",
                Error::NullPointerError(_) => "NullPointerError",
                Error::WrongApartment => "WrongApartment",
                #[cfg(feature = "std")]
                Error::Io(_) => "Io",
            }
        }

        let errors = [
            Error::ApiError("GetData", DV_E_TYMED),
            Error::Win32Error("Open", win32::ERROR_FILE_NOT_FOUND),
            Error::AccessDenied("Open".into()),
            Error::InvalidArgument("Seek".into()),
            Error::NoInterface(GUID::zeroed()),
            Error::NotImplemented,
            Error::ObjectDisposed,
            Error::NullPointerError("Read"),
            Error::WrongApartment,
        ];
        for err in &errors {
            assert!(err.hresult().is_err(), "{}", name(err));
        }
    }

    #[test]
    fn test_from_windows_core_error() {
        let err = Error::from(windows_core::Error::from_hresult(CLIPBRD_E_CANT_SET));
        assert!(matches!(err, Error::ApiError(_, CLIPBRD_E_CANT_SET)));
        assert_eq!(err.hresult(), CLIPBRD_E_CANT_SET);
    }

    #[test]
    fn test_messages() {
        let err = Error::ApiError("OleSetClipboard", CLIPBRD_E_CANT_OPEN);
        assert_eq!(format!("{err}"), "OleSetClipboard failed with HRESULT: 0x800401D0");
        let err = Error::NullPointerError("Read");
        assert_eq!(format!("{err}"), "null pointer passed to Read API");
    }

    #[cfg(feature = "std")]
    #[test]
    fn test_io_conversions() {
        use std::io::{self, ErrorKind};

        let io: io::Error = Error::Win32Error("CreateFile", win32::ERROR_FILE_NOT_FOUND).into();
        assert_eq!(io.kind(), ErrorKind::NotFound);

        let io: io::Error = Error::AccessDenied("x".into()).into();
        assert_eq!(io.kind(), ErrorKind::PermissionDenied);
        assert_eq!(io_hresult(&io), E_ACCESSDENIED);

        let err = io::Error::new(ErrorKind::Unsupported, "no locking");
        assert_eq!(Error::from(err).hresult(), STG_E_INVALIDFUNCTION);

        let err = io::Error::new(ErrorKind::StorageFull, "disk full");
        assert_eq!(io_hresult(&err), STG_E_MEDIUMFULL);
    }

    #[cfg(all(feature = "std", windows))]
    #[test]
    fn test_raw_os_error_is_win32() {
        let err = std::io::Error::from_raw_os_error(5);
        assert_eq!(io_hresult(&err), E_ACCESSDENIED);
    }

    #[cfg(all(feature = "std", unix))]
    #[test]
    fn test_raw_os_error_is_errno() {
        // ENOSPC shares its value with ERROR_OUT_OF_PAPER.
        let err = std::io::Error::from_raw_os_error(28);
        assert_ne!(io_hresult(&err), HRESULT(0x8007_001C_u32 as i32));
        assert_eq!(io_hresult(&err), STG_E_MEDIUMFULL);

        // EACCES
        let err = std::io::Error::from_raw_os_error(13);
        assert_eq!(io_hresult(&err), STG_E_ACCESSDENIED);
    }
}
