//! COM callable wrappers: Rust objects handed to native code as interface pointers.
//!
//! Each wrapper is a [`Lifetime`] block whose vtable is a single `static`, so a
//! pointer coming back from native code can be recognised by its vtable address.

mod data_object;
mod drop_source;
mod enum_formatetc;
mod lifetime;

#[cfg(feature = "std")]
mod stream;

pub use data_object::IDataObject_Impl;
pub use drop_source::{DefaultDropSource, IDropSource_Impl};
pub use lifetime::Lifetime;

#[cfg(feature = "std")]
pub use stream::StreamSource;
