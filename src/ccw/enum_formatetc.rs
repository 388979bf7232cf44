use alloc::sync::Arc;
use core::ffi::c_void;
use core::ptr::{self, null_mut};

use spin::Mutex;
use windows_core::{HRESULT, Interface};

use crate::ccw::Lifetime;
use crate::com::{FORMATETC, IEnumFORMATETC, IEnumFORMATETC_Vtbl};
use crate::hresult;

/// Shared format list plus this enumerator's position.
struct FormatCursor {
    formats: Arc<[FORMATETC]>,
    position: Mutex<usize>,
}

type FormatEnumerator = Lifetime<IEnumFORMATETC_Vtbl, FormatCursor>;

static ENUM_FORMATETC_VTBL: IEnumFORMATETC_Vtbl = IEnumFORMATETC_Vtbl {
    base__: FormatEnumerator::unknown_vtbl(),
    Next,
    Skip,
    Reset,
    Clone,
};

impl IEnumFORMATETC {
    /// Creates an enumerator CCW over `formats`.
    ///
    /// Target devices are not carried: every enumerated `ptd` is null.
    pub fn from_formats(formats: impl IntoIterator<Item = FORMATETC>) -> Self {
        let formats: Arc<[FORMATETC]> = formats
            .into_iter()
            .map(|format| FORMATETC {
                ptd: null_mut(),
                ..format
            })
            .collect();
        Self::from_cursor(formats, 0)
    }

    fn from_cursor(formats: Arc<[FORMATETC]>, position: usize) -> Self {
        let cursor = FormatCursor {
            formats,
            position: Mutex::new(position),
        };
        unsafe { Self::from_raw(FormatEnumerator::allocate(cursor, &ENUM_FORMATETC_VTBL)) }
    }
}

unsafe extern "system" fn Next(
    this: *mut c_void,
    celt: u32,
    rgelt: *mut FORMATETC,
    pceltfetched: *mut u32,
) -> HRESULT {
    if pceltfetched.is_null() && celt != 1 {
        return hresult::E_INVALIDARG;
    }
    if rgelt.is_null() && celt > 0 {
        return hresult::E_POINTER;
    }

    let cursor = unsafe { FormatEnumerator::object(this) };
    let mut position = cursor.position.lock();
    let remaining = &cursor.formats[*position..];
    let count = remaining.len().min(celt as usize);

    unsafe { ptr::copy_nonoverlapping(remaining.as_ptr(), rgelt, count) };
    *position += count;

    if !pceltfetched.is_null() {
        unsafe { *pceltfetched = count as u32 };
    }

    if count == celt as usize {
        hresult::S_OK
    } else {
        hresult::S_FALSE
    }
}

unsafe extern "system" fn Skip(this: *mut c_void, celt: u32) -> HRESULT {
    let cursor = unsafe { FormatEnumerator::object(this) };
    let mut position = cursor.position.lock();
    let count = (cursor.formats.len() - *position).min(celt as usize);
    *position += count;

    if count == celt as usize {
        hresult::S_OK
    } else {
        hresult::S_FALSE
    }
}

unsafe extern "system" fn Reset(this: *mut c_void) -> HRESULT {
    let cursor = unsafe { FormatEnumerator::object(this) };
    *cursor.position.lock() = 0;
    hresult::S_OK
}

unsafe extern "system" fn Clone(this: *mut c_void, ppenum: *mut *mut c_void) -> HRESULT {
    if ppenum.is_null() {
        return hresult::E_POINTER;
    }

    let cursor = unsafe { FormatEnumerator::object(this) };
    let position = *cursor.position.lock();
    let clone = IEnumFORMATETC::from_cursor(cursor.formats.clone(), position);
    unsafe { *ppenum = clone.into_raw() };
    hresult::S_OK
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::com::{
        CF_HDROP, CF_TEXT, CF_UNICODETEXT, IDataObject, IID_IDATAOBJECT, IUnknown, InterfaceExt,
        Tymed,
    };
    use alloc::vec;

    fn sample() -> IEnumFORMATETC {
        IEnumFORMATETC::from_formats(vec![
            FORMATETC::new(CF_TEXT, Tymed::HGLOBAL),
            FORMATETC::new(CF_UNICODETEXT, Tymed::HGLOBAL),
            FORMATETC::new(CF_HDROP, Tymed::HGLOBAL),
        ])
    }

    #[test]
    fn test_next_partial_batch() {
        let formats = sample();
        let mut batch = [FORMATETC::default(); 2];

        assert_eq!(formats.Next(&mut batch).unwrap(), 2);
        assert_eq!(batch[0].cfFormat, CF_TEXT);
        assert_eq!(batch[1].cfFormat, CF_UNICODETEXT);

        // One left: S_FALSE is still a success with a short count.
        assert_eq!(formats.Next(&mut batch).unwrap(), 1);
        assert_eq!(batch[0].cfFormat, CF_HDROP);
        assert_eq!(formats.Next(&mut batch).unwrap(), 0);
    }

    #[test]
    fn test_next_fetched_pointer_rules() {
        let formats = sample();
        let vtable = formats.vtable();
        let mut batch = [FORMATETC::default(); 2];

        unsafe {
            assert_eq!(
                (vtable.Next)(formats.as_raw(), 2, batch.as_mut_ptr(), null_mut()),
                hresult::E_INVALIDARG
            );
            assert_eq!(
                (vtable.Next)(formats.as_raw(), 1, batch.as_mut_ptr(), null_mut()),
                hresult::S_OK
            );
        }
        assert_eq!(batch[0].cfFormat, CF_TEXT);
    }

    #[test]
    fn test_skip_reset_and_clone() {
        let formats = sample();

        assert!(formats.Skip(1).unwrap());
        let clone = formats.Clone().unwrap();
        assert!(!formats.Skip(5).unwrap());
        assert!(formats.formats().unwrap().is_empty());

        let rest = clone.formats().unwrap();
        assert_eq!(rest.len(), 2);
        assert_eq!(rest[0].cfFormat, CF_UNICODETEXT);

        formats.Reset().unwrap();
        assert_eq!(formats.formats().unwrap().len(), 3);
    }

    #[test]
    fn test_enumerator_lifetime() {
        let formats = sample();
        assert_eq!(formats.ref_count_hint(), 1);

        let unknown = formats.cast::<IUnknown>().unwrap();
        assert_eq!(formats.ref_count_hint(), 2);
        drop(unknown);
        assert_eq!(formats.ref_count_hint(), 1);

        assert_eq!(formats.cast::<IDataObject>().unwrap_err().code(), hresult::E_NOINTERFACE);
        assert!(matches!(
            formats.try_cast::<IDataObject>(),
            Err(crate::Error::NoInterface(iid)) if iid == IID_IDATAOBJECT
        ));
    }
}
