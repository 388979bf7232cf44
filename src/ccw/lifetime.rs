use alloc::boxed::Box;
use core::ffi::c_void;
use core::ptr::{self, null_mut};
use core::sync::atomic::{AtomicU32, Ordering, fence};

use windows_core::{GUID, HRESULT, IUnknown_Vtbl};

use crate::com::{ComVtable, IID_IUNKNOWN};
use crate::hresult;

/// Reference-counted block backing a COM callable wrapper.
///
/// The pointer handed to native code is the address of this block. Its first
/// field is the vtable pointer, so the block is a valid COM object for any
/// interface whose vtable is `V`.
#[repr(C)]
pub struct Lifetime<V: ComVtable, T> {
    vtable: &'static V,
    ref_count: AtomicU32,
    object: T,
}

impl<V: ComVtable, T> Lifetime<V, T> {
    /// Moves `object` into a new block with a reference count of one.
    pub fn allocate(object: T, vtable: &'static V) -> *mut c_void {
        let block = Box::new(Self {
            vtable,
            ref_count: AtomicU32::new(1),
            object,
        });

        let raw = Box::into_raw(block) as *mut c_void;
        log::trace!("allocated {} wrapper at {raw:p}", core::any::type_name::<T>());
        raw
    }

    /// Borrows the object behind a wrapper pointer.
    ///
    /// # Safety
    ///
    /// `this` must have been returned by [`Lifetime::allocate`] with the same
    /// `V` and `T`, and must still hold a reference for the lifetime `'a`.
    #[inline(always)]
    pub unsafe fn object<'a>(this: *mut c_void) -> &'a T {
        unsafe { &(*(this as *const Self)).object }
    }

    /// Borrows the object if `this` is a wrapper built with `vtable`.
    ///
    /// Only the leading vtable pointer is read before the check, which every
    /// COM object has, so foreign pointers are safe to pass.
    ///
    /// # Safety
    ///
    /// `this` must be null or a live COM interface pointer.
    pub unsafe fn try_object<'a>(this: *mut c_void, vtable: &'static V) -> Option<&'a T> {
        if this.is_null() {
            return None;
        }

        let actual = unsafe { *(this as *const *const V) };
        if ptr::eq(actual, vtable) {
            Some(unsafe { Self::object(this) })
        } else {
            None
        }
    }

    pub unsafe extern "system" fn QueryInterface(
        this: *mut c_void,
        riid: *const GUID,
        ppv: *mut *mut c_void,
    ) -> HRESULT {
        if ppv.is_null() {
            return hresult::E_POINTER;
        }

        if this.is_null() || riid.is_null() {
            unsafe { *ppv = null_mut() };
            return hresult::E_POINTER;
        }

        let riid = unsafe { &*riid };
        if *riid == IID_IUNKNOWN || V::INTERFACES.contains(riid) {
            unsafe {
                Self::AddRef(this);
                *ppv = this;
            }
            return hresult::S_OK;
        }

        unsafe { *ppv = null_mut() };
        hresult::E_NOINTERFACE
    }

    pub unsafe extern "system" fn AddRef(this: *mut c_void) -> u32 {
        let block = unsafe { &*(this as *const Self) };
        block.ref_count.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub unsafe extern "system" fn Release(this: *mut c_void) -> u32 {
        let block = unsafe { &*(this as *const Self) };
        let count = block.ref_count.fetch_sub(1, Ordering::Release).saturating_sub(1);

        if count == 0 {
            fence(Ordering::Acquire);
            log::trace!("destroying {} wrapper at {this:p}", core::any::type_name::<T>());
            drop(unsafe { Box::from_raw(this as *mut Self) });
        }

        count
    }

    /// The `IUnknown` part of a vtable built on this block.
    pub const fn unknown_vtbl() -> IUnknown_Vtbl {
        IUnknown_Vtbl {
            QueryInterface: Self::QueryInterface,
            AddRef: Self::AddRef,
            Release: Self::Release,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use alloc::sync::Arc;
    use alloc::vec::Vec;
    use core::sync::atomic::AtomicUsize;

    const IID_ITEST: GUID = GUID::from_u128(0x6d5140c1_7436_11ce_8034_00aa006009fa);

    #[repr(C)]
    struct ITest_Vtbl {
        base__: IUnknown_Vtbl,
    }

    unsafe impl ComVtable for ITest_Vtbl {
        const INTERFACES: &'static [GUID] = &[IID_ITEST];
    }

    struct Tracked(Arc<AtomicUsize>);

    impl Drop for Tracked {
        fn drop(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    type TestWrapper = Lifetime<ITest_Vtbl, Tracked>;

    static TEST_VTBL: ITest_Vtbl = ITest_Vtbl {
        base__: TestWrapper::unknown_vtbl(),
    };

    static OTHER_VTBL: ITest_Vtbl = ITest_Vtbl {
        base__: TestWrapper::unknown_vtbl(),
    };

    fn allocate() -> (*mut c_void, Arc<AtomicUsize>) {
        let drops = Arc::new(AtomicUsize::new(0));
        (TestWrapper::allocate(Tracked(drops.clone()), &TEST_VTBL), drops)
    }

    #[test]
    fn test_add_ref_release_drops_once() {
        let (ptr, drops) = allocate();

        unsafe {
            assert_eq!(TestWrapper::AddRef(ptr), 2);
            assert_eq!(TestWrapper::Release(ptr), 1);
            assert_eq!(drops.load(Ordering::SeqCst), 0);
            assert_eq!(TestWrapper::Release(ptr), 0);
        }

        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_query_interface() {
        let (ptr, drops) = allocate();
        let mut out = null_mut();

        unsafe {
            assert_eq!(TestWrapper::QueryInterface(ptr, &IID_IUNKNOWN, &mut out), hresult::S_OK);
            assert_eq!(out, ptr);
            assert_eq!(TestWrapper::QueryInterface(ptr, &IID_ITEST, &mut out), hresult::S_OK);
            assert_eq!(out, ptr);

            let unknown_iid = GUID::from_u128(0x12345678_0000_0000_0000_000000000000);
            assert_eq!(
                TestWrapper::QueryInterface(ptr, &unknown_iid, &mut out),
                hresult::E_NOINTERFACE
            );
            assert!(out.is_null());

            assert_eq!(
                TestWrapper::QueryInterface(ptr, &IID_ITEST, null_mut()),
                hresult::E_POINTER
            );

            // Two successful queries added two references.
            assert_eq!(TestWrapper::Release(ptr), 2);
            assert_eq!(TestWrapper::Release(ptr), 1);
            assert_eq!(TestWrapper::Release(ptr), 0);
        }

        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_try_object_checks_vtable_identity() {
        let (ptr, _drops) = allocate();

        unsafe {
            assert!(TestWrapper::try_object(ptr, &TEST_VTBL).is_some());
            assert!(TestWrapper::try_object(ptr, &OTHER_VTBL).is_none());
            assert!(TestWrapper::try_object(null_mut(), &TEST_VTBL).is_none());
            TestWrapper::Release(ptr);
        }
    }

    #[test]
    fn test_concurrent_reference_counting() {
        let (ptr, drops) = allocate();
        let address = ptr as usize;

        let threads: Vec<_> = (0..8)
            .map(|_| {
                std::thread::spawn(move || {
                    let ptr = address as *mut c_void;
                    for _ in 0..1000 {
                        unsafe {
                            TestWrapper::AddRef(ptr);
                            TestWrapper::Release(ptr);
                        }
                    }
                })
            })
            .collect();

        for thread in threads {
            thread.join().unwrap();
        }

        assert_eq!(drops.load(Ordering::SeqCst), 0);
        assert_eq!(unsafe { TestWrapper::Release(ptr) }, 0);
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }
}
