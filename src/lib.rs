#![no_std]
#![doc = include_str!("../README.md")]
#![allow(non_snake_case, non_camel_case_types)]
#![allow(clippy::not_unsafe_ptr_arg_deref, clippy::missing_safety_doc)]

extern crate alloc;

#[cfg(any(test, feature = "std"))]
extern crate std;

pub mod ccw;
pub mod com;
pub mod error;
pub mod guid;
pub mod hresult;
pub mod string;
pub mod wrappers;

#[cfg(feature = "std")]
pub mod store;

#[cfg(windows)]
pub mod agile;
#[cfg(windows)]
pub mod clipboard;
#[cfg(windows)]
pub mod ole;

pub use ccw::Lifetime;
pub use error::{Error, Result};
pub use hresult::HResultExt;
pub use windows_core::{GUID, HRESULT};
pub use wrappers::StgMedium;

#[cfg(feature = "std")]
pub use store::DataStore;
