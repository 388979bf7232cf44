use alloc::boxed::Box;
use core::ffi::c_void;

use windows_core::{HRESULT, Interface};

use crate::ccw::Lifetime;
use crate::com::{DragAction, DropEffect, Feedback, IDropSource, IDropSource_Vtbl, ModifierKeys};

/// Trait representing the implementation of the `IDropSource` interface.
pub trait IDropSource_Impl: Send + Sync {
    /// Called while the drag loop runs whenever the keyboard or mouse state changes.
    fn QueryContinueDrag(&self, escape_pressed: bool, keys: ModifierKeys) -> DragAction;

    fn GiveFeedback(&self, _effect: DropEffect) -> Feedback {
        Feedback::UseDefaultCursors
    }
}

/// Standard drag policy: escape cancels, releasing the drag button drops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultDropSource {
    button: ModifierKeys,
}

impl DefaultDropSource {
    /// A source for drags started with the left mouse button.
    pub const fn new() -> Self {
        Self {
            button: ModifierKeys::LBUTTON,
        }
    }

    /// A source for drags started with `button`.
    pub const fn with_button(button: ModifierKeys) -> Self {
        Self { button }
    }
}

impl Default for DefaultDropSource {
    fn default() -> Self {
        Self::new()
    }
}

impl IDropSource_Impl for DefaultDropSource {
    fn QueryContinueDrag(&self, escape_pressed: bool, keys: ModifierKeys) -> DragAction {
        if escape_pressed {
            DragAction::Cancel
        } else if !keys.intersects(self.button) {
            DragAction::Drop
        } else {
            DragAction::Continue
        }
    }
}

type DropSourceWrapper = Lifetime<IDropSource_Vtbl, Box<dyn IDropSource_Impl>>;

static DROP_SOURCE_VTBL: IDropSource_Vtbl = IDropSource_Vtbl {
    base__: DropSourceWrapper::unknown_vtbl(),
    QueryContinueDrag,
    GiveFeedback,
};

impl IDropSource {
    /// Exposes `source` to native code through a new callable wrapper.
    pub fn from_impl(source: impl IDropSource_Impl + 'static) -> Self {
        let source: Box<dyn IDropSource_Impl> = Box::new(source);
        unsafe { Self::from_raw(DropSourceWrapper::allocate(source, &DROP_SOURCE_VTBL)) }
    }
}

unsafe extern "system" fn QueryContinueDrag(
    this: *mut c_void,
    fescapepressed: i32,
    grfkeystate: u32,
) -> HRESULT {
    let source = unsafe { DropSourceWrapper::object(this) };
    source
        .QueryContinueDrag(fescapepressed != 0, ModifierKeys::from_bits_retain(grfkeystate))
        .hresult()
}

unsafe extern "system" fn GiveFeedback(this: *mut c_void, dweffect: u32) -> HRESULT {
    let source = unsafe { DropSourceWrapper::object(this) };
    source.GiveFeedback(DropEffect::from_bits_retain(dweffect)).hresult()
}
