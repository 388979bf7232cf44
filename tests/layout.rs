use core::mem::{align_of, offset_of, size_of};

use comwrap::GUID;
use comwrap::com::{
    FORMATETC, IDataObject_Vtbl, IDropSource_Vtbl, IEnumFORMATETC_Vtbl, IStream_Vtbl,
    IUnknown_Vtbl, STATDATA, STATSTG, STGMEDIUM,
};

const PTR: usize = size_of::<usize>();

#[test]
fn guid_layout() {
    assert_eq!(size_of::<GUID>(), 16);
    assert_eq!(align_of::<GUID>(), 4);
}

#[test]
#[cfg(target_pointer_width = "64")]
fn data_transfer_structs() {
    assert_eq!(size_of::<FORMATETC>(), 32);
    assert_eq!(offset_of!(FORMATETC, ptd), 8);
    assert_eq!(offset_of!(FORMATETC, tymed), 24);

    assert_eq!(size_of::<STGMEDIUM>(), 24);
    assert_eq!(offset_of!(STGMEDIUM, u), 8);
    assert_eq!(offset_of!(STGMEDIUM, pUnkForRelease), 16);

    assert_eq!(size_of::<STATDATA>(), 56);
}

#[test]
#[cfg(target_pointer_width = "64")]
fn statstg_layout() {
    assert_eq!(size_of::<STATSTG>(), 80);
    assert_eq!(offset_of!(STATSTG, cbSize), 16);
    assert_eq!(offset_of!(STATSTG, grfMode), 48);
    assert_eq!(offset_of!(STATSTG, clsid), 56);
}

#[test]
fn vtable_slot_counts() {
    assert_eq!(size_of::<IUnknown_Vtbl>(), 3 * PTR);
    assert_eq!(size_of::<IDataObject_Vtbl>(), 12 * PTR);
    assert_eq!(size_of::<IEnumFORMATETC_Vtbl>(), 7 * PTR);
    assert_eq!(size_of::<IDropSource_Vtbl>(), 5 * PTR);
    assert_eq!(size_of::<IStream_Vtbl>(), 14 * PTR);
}
