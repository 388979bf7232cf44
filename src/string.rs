//! Defines the `WideStr` trait for converting between Rust strings and UTF-16.

use alloc::string::String;
use alloc::vec::Vec;

/// Conversions between Rust strings and null-terminated UTF-16 buffers.
pub trait WideStr {
    /// Encodes as UTF-16 with a trailing null.
    fn to_wide(&self) -> Vec<u16>;
}

impl WideStr for str {
    fn to_wide(&self) -> Vec<u16> {
        self.encode_utf16().chain(Some(0)).collect()
    }
}

impl WideStr for String {
    fn to_wide(&self) -> Vec<u16> {
        self.as_str().to_wide()
    }
}

/// Length of a null-terminated UTF-16 string, in code units.
///
/// # Safety
///
/// `ptr` must be null or point to a null-terminated UTF-16 string.
pub unsafe fn wide_len(ptr: *const u16) -> usize {
    if ptr.is_null() {
        return 0;
    }
    let mut len = 0;
    unsafe {
        while *ptr.add(len) != 0 {
            len += 1;
        }
    }
    len
}

/// Reads a null-terminated UTF-16 string (lossy).
///
/// # Safety
///
/// `ptr` must be null or point to a null-terminated UTF-16 string.
pub unsafe fn from_wide_ptr(ptr: *const u16) -> String {
    if ptr.is_null() {
        return String::new();
    }
    let slice = unsafe { core::slice::from_raw_parts(ptr, wide_len(ptr)) };
    String::from_utf16_lossy(slice)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_wide_appends_null() {
        let wide = "abc".to_wide();
        assert_eq!(wide, [b'a' as u16, b'b' as u16, b'c' as u16, 0]);
        assert_eq!(String::from("").to_wide(), [0]);
    }

    #[test]
    fn test_from_wide_ptr() {
        let wide = "Clipboard \u{1F4CB}".to_wide();
        unsafe {
            assert_eq!(wide_len(wide.as_ptr()), wide.len() - 1);
            assert_eq!(from_wide_ptr(wide.as_ptr()), "Clipboard \u{1F4CB}");
            assert_eq!(from_wide_ptr(core::ptr::null()), "");
        }
    }
}
