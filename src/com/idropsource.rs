use core::{ffi::c_void, ops::Deref};

use windows_core::{GUID, HRESULT, IUnknown, IUnknown_Vtbl, Interface};

use crate::com::{ComVtable, DropEffect, ModifierKeys};
use crate::error::{Error, Result};
use crate::hresult::{self, HResultExt};

/// `IID_IDropSource`: `00000121-0000-0000-C000-000000000046`.
pub const IID_IDROPSOURCE: GUID = GUID::from_u128(0x00000121_0000_0000_c000_000000000046);

/// Decision returned from `QueryContinueDrag`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragAction {
    /// `S_OK`
    Continue,
    /// `DRAGDROP_S_DROP`
    Drop,
    /// `DRAGDROP_S_CANCEL`
    Cancel,
}

impl DragAction {
    pub const fn hresult(self) -> HRESULT {
        match self {
            DragAction::Continue => hresult::S_OK,
            DragAction::Drop => hresult::DRAGDROP_S_DROP,
            DragAction::Cancel => hresult::DRAGDROP_S_CANCEL,
        }
    }

    pub fn from_hresult(hr: HRESULT) -> Result<Self> {
        match hr {
            hresult::S_OK => Ok(DragAction::Continue),
            hresult::DRAGDROP_S_DROP => Ok(DragAction::Drop),
            hresult::DRAGDROP_S_CANCEL => Ok(DragAction::Cancel),
            hr => Err(Error::from_hresult(
                if hr.is_err() { hr } else { hresult::E_UNEXPECTED },
                "QueryContinueDrag",
            )),
        }
    }
}

/// Result of `GiveFeedback`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feedback {
    /// The source set the cursor itself (`S_OK`).
    Handled,
    /// `DRAGDROP_S_USEDEFAULTCURSORS`
    UseDefaultCursors,
}

impl Feedback {
    pub const fn hresult(self) -> HRESULT {
        match self {
            Feedback::Handled => hresult::S_OK,
            Feedback::UseDefaultCursors => hresult::DRAGDROP_S_USEDEFAULTCURSORS,
        }
    }
}

/// This struct represents the COM `IDropSource` interface.
#[repr(transparent)]
#[derive(Clone, Debug)]
pub struct IDropSource(IUnknown);

impl IDropSource {
    /// Asks the source whether the drag should continue, drop or cancel.
    pub fn QueryContinueDrag(
        &self,
        escape_pressed: bool,
        keys: ModifierKeys,
    ) -> Result<DragAction> {
        let hr = unsafe {
            (Interface::vtable(self).QueryContinueDrag)(
                Interface::as_raw(self),
                escape_pressed as i32,
                keys.bits(),
            )
        };
        DragAction::from_hresult(hr)
    }

    /// Lets the source update the cursor for `effect`.
    pub fn GiveFeedback(&self, effect: DropEffect) -> Result<Feedback> {
        let hr = unsafe {
            (Interface::vtable(self).GiveFeedback)(Interface::as_raw(self), effect.bits())
        };
        hr.ok_for("GiveFeedback")?;
        Ok(if hr == hresult::DRAGDROP_S_USEDEFAULTCURSORS {
            Feedback::UseDefaultCursors
        } else {
            Feedback::Handled
        })
    }
}

unsafe impl Interface for IDropSource {
    type Vtable = IDropSource_Vtbl;
    const IID: GUID = IID_IDROPSOURCE;
}

impl Deref for IDropSource {
    type Target = IUnknown;

    fn deref(&self) -> &Self::Target {
        unsafe { core::mem::transmute(self) }
    }
}

unsafe impl ComVtable for IDropSource_Vtbl {
    const INTERFACES: &'static [GUID] = &[IID_IDROPSOURCE];
}

#[repr(C)]
pub struct IDropSource_Vtbl {
    pub base__: IUnknown_Vtbl,
    pub QueryContinueDrag: unsafe extern "system" fn(
        this: *mut c_void,
        fescapepressed: i32,
        grfkeystate: u32,
    ) -> HRESULT,
    pub GiveFeedback: unsafe extern "system" fn(this: *mut c_void, dweffect: u32) -> HRESULT,
}
