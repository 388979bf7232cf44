//! Raw COM interface bindings and the owning wrappers used to call them.
//!
//! Every interface is a `#[repr(transparent)]` wrapper over [`IUnknown`], which
//! holds exactly one reference: `Clone` calls `AddRef` and `Drop` calls `Release`.
//! The first pointer-sized field of the object behind it is the vtable pointer,
//! and every vtable begins with `QueryInterface`, `AddRef` and `Release`.

use core::ffi::c_void;

use crate::error::{Error, Result};

pub use windows_core::{GUID, IUnknown, IUnknown_Vtbl, Interface};

mod iadvisesink;
mod iagilereference;
mod idataobject;
mod idropsource;
mod ienumformatetc;
mod ienumstatdata;
mod iglobalinterfacetable;
mod istream;
mod types;

pub use iadvisesink::*;
pub use iagilereference::*;
pub use idataobject::*;
pub use idropsource::*;
pub use ienumformatetc::*;
pub use ienumstatdata::*;
pub use iglobalinterfacetable::*;
pub use istream::*;
pub use types::*;

/// `IID_IUnknown`: `00000000-0000-0000-C000-000000000046`.
pub const IID_IUNKNOWN: GUID = IUnknown::IID;

/// Constructors and diagnostics shared by every interface wrapper.
pub trait InterfaceExt: Interface {
    /// Takes ownership of one reference, or `None` for null.
    ///
    /// # Safety
    ///
    /// `raw` must be null or an owned pointer to this interface.
    #[inline]
    unsafe fn from_raw_opt(raw: *mut c_void) -> Option<Self> {
        if raw.is_null() {
            None
        } else {
            Some(unsafe { Self::from_raw(raw) })
        }
    }

    /// Adds a reference to a borrowed pointer and returns the owning wrapper.
    ///
    /// # Safety
    ///
    /// `raw` must be null or a valid pointer to this interface.
    #[inline]
    unsafe fn from_raw_cloned(raw: *mut c_void) -> Option<Self> {
        unsafe { Self::from_raw_borrowed(&raw) }.cloned()
    }

    /// `QueryInterface` for `T`, reporting `E_NOINTERFACE` with `T`'s IID.
    fn try_cast<T: Interface>(&self) -> Result<T> {
        self.cast::<T>().map_err(|err| match Error::from_hresult(err.code(), "QueryInterface") {
            Error::NoInterface(_) => Error::NoInterface(T::IID),
            other => other,
        })
    }

    /// Reads the current reference count by pairing `AddRef` with `Release`.
    ///
    /// Only meaningful for diagnostics: other threads may change it at any time.
    fn ref_count_hint(&self) -> u32 {
        let raw = self.as_raw();
        unsafe {
            let vtable = &**(raw as *const *const IUnknown_Vtbl);
            (vtable.AddRef)(raw);
            (vtable.Release)(raw)
        }
    }
}

impl<T: Interface> InterfaceExt for T {}

/// A vtable layout that a callable wrapper can expose.
///
/// # Safety
///
/// `INTERFACES` must only list interfaces whose vtables are prefixes of `Self`.
pub unsafe trait ComVtable: Sync + 'static {
    /// Interfaces answered by `QueryInterface`, in addition to `IUnknown`.
    const INTERFACES: &'static [GUID];
}
