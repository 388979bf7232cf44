//! RAII wrappers for OLE resources (STGMEDIUM, HGLOBAL).

mod medium;

#[cfg(windows)]
mod hglobal;

pub use medium::StgMedium;
pub(crate) use medium::medium_bytes;

#[cfg(windows)]
pub use hglobal::{GlobalLockGuard, GlobalMemory};
