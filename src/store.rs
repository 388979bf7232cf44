//! An in-memory [`IDataObject_Impl`] keyed by clipboard format.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

use spin::Mutex;

use crate::ccw::IDataObject_Impl;
use crate::com::{CF_UNICODETEXT, DataDirection, FORMATETC, IStream, STGMEDIUM, Tymed};
use crate::error::{Error, Result};
use crate::hresult;
use crate::wrappers::{StgMedium, medium_bytes};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct FormatKey {
    format: u16,
    aspect: u32,
    lindex: i32,
}

impl From<&FORMATETC> for FormatKey {
    fn from(format: &FORMATETC) -> Self {
        Self {
            format: format.cfFormat,
            aspect: format.dwAspect,
            lindex: format.lindex,
        }
    }
}

/// Thread-safe bag of format payloads served through `IDataObject`.
///
/// Payloads are handed out as `TYMED_HGLOBAL` on Windows and as
/// `TYMED_ISTREAM` everywhere; each `GetData` gets its own copy.
#[derive(Debug)]
pub struct DataStore {
    entries: Mutex<BTreeMap<FormatKey, Vec<u8>>>,
    media: Tymed,
}

impl DataStore {
    /// Media this platform can produce.
    pub const fn supported_media() -> Tymed {
        if cfg!(windows) {
            Tymed::HGLOBAL.union(Tymed::ISTREAM)
        } else {
            Tymed::ISTREAM
        }
    }

    pub fn new() -> Self {
        Self {
            entries: Mutex::new(BTreeMap::new()),
            media: Self::supported_media(),
        }
    }

    /// Restricts the media offered to requesters.
    pub fn with_media(mut self, media: Tymed) -> Self {
        self.media = media & Self::supported_media();
        self
    }

    pub fn media(&self) -> Tymed {
        self.media
    }

    /// Stores `bytes` for `format` with content aspect and all pages.
    pub fn insert(&self, format: u16, bytes: impl Into<Vec<u8>>) -> Option<Vec<u8>> {
        self.insert_for(&FORMATETC::new(format, Tymed::empty()), bytes)
    }

    /// Stores `bytes` for the format, aspect and page of `format`.
    pub fn insert_for(&self, format: &FORMATETC, bytes: impl Into<Vec<u8>>) -> Option<Vec<u8>> {
        self.entries.lock().insert(FormatKey::from(format), bytes.into())
    }

    /// Payload stored for `format` with content aspect and all pages.
    pub fn get(&self, format: u16) -> Option<Vec<u8>> {
        let key = FormatKey::from(&FORMATETC::new(format, Tymed::empty()));
        self.entries.lock().get(&key).cloned()
    }

    pub fn remove(&self, format: u16) -> Option<Vec<u8>> {
        let key = FormatKey::from(&FORMATETC::new(format, Tymed::empty()));
        self.entries.lock().remove(&key)
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Stores `text` as null-terminated UTF-16 (`CF_UNICODETEXT`).
    pub fn set_text(&self, text: &str) {
        let bytes: Vec<u8> = text
            .encode_utf16()
            .chain(Some(0))
            .flat_map(u16::to_le_bytes)
            .collect();
        self.insert(CF_UNICODETEXT, bytes);
    }

    /// Reads back `CF_UNICODETEXT`, stopping at the first null.
    pub fn text(&self) -> Option<String> {
        let bytes = self.get(CF_UNICODETEXT)?;
        let units: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .take_while(|&unit| unit != 0)
            .collect();
        Some(String::from_utf16_lossy(&units))
    }

    /// Finds the payload for `format`, reporting the first mismatching field.
    fn lookup(&self, format: &FORMATETC) -> Result<Vec<u8>> {
        let entries = self.entries.lock();
        let key = FormatKey::from(format);

        if let Some(bytes) = entries.get(&key) {
            if format.media().intersects(self.media) {
                return Ok(bytes.clone());
            }
            return Err(Error::ApiError("GetData", hresult::DV_E_TYMED));
        }

        let mut same_format = entries.keys().filter(|k| k.format == key.format).peekable();
        let hr = if same_format.peek().is_none() {
            hresult::DV_E_FORMATETC
        } else if !same_format.any(|k| k.aspect == key.aspect) {
            hresult::DV_E_DVASPECT
        } else {
            hresult::DV_E_LINDEX
        };
        Err(Error::ApiError("GetData", hr))
    }
}

impl Default for DataStore {
    fn default() -> Self {
        Self::new()
    }
}

impl IDataObject_Impl for DataStore {
    fn GetData(&self, format: &FORMATETC) -> Result<StgMedium> {
        let bytes = self.lookup(format)?;
        let requested = format.media() & self.media;

        #[cfg(windows)]
        {
            if requested.contains(Tymed::HGLOBAL) {
                let memory = crate::wrappers::GlobalMemory::from_bytes(&bytes)?;
                return Ok(StgMedium::from_global(memory));
            }
        }

        if requested.contains(Tymed::ISTREAM) {
            return Ok(StgMedium::from_stream(IStream::from_bytes(&bytes)));
        }

        Err(Error::ApiError("GetData", hresult::DV_E_TYMED))
    }

    fn QueryGetData(&self, format: &FORMATETC) -> Result<()> {
        self.lookup(format).map(drop)
    }

    fn SetData(&self, format: &FORMATETC, medium: &STGMEDIUM) -> Result<()> {
        if !medium.media().intersects(Self::supported_media()) {
            return Err(Error::ApiError("SetData", hresult::DV_E_TYMED));
        }

        let bytes = medium_bytes(medium)?;
        log::trace!("storing {} bytes for format {}", bytes.len(), format.cfFormat);
        self.insert_for(format, bytes);
        Ok(())
    }

    fn EnumFormatEtc(&self, direction: DataDirection) -> Result<Vec<FORMATETC>> {
        match direction {
            DataDirection::Get => Ok(self
                .entries
                .lock()
                .keys()
                .map(|key| FORMATETC {
                    dwAspect: key.aspect,
                    lindex: key.lindex,
                    ..FORMATETC::new(key.format, self.media)
                })
                .collect()),
            DataDirection::Set => Err(Error::NotImplemented),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::com::{CF_HDROP, CF_TEXT, DvAspect, IDataObject, StreamSeek};
    use alloc::sync::Arc;

    #[test]
    fn test_query_get_data_codes() {
        let store = DataStore::new();
        store.insert(CF_TEXT, b"abc".to_vec());
        store.insert_for(&FORMATETC::new(CF_HDROP, Tymed::empty()).with_lindex(0), b"x".to_vec());

        let code = |format: FORMATETC| match store.QueryGetData(&format) {
            Ok(()) => hresult::S_OK,
            Err(err) => err.hresult(),
        };

        assert_eq!(code(FORMATETC::new(CF_TEXT, Tymed::ISTREAM)), hresult::S_OK);
        assert_eq!(code(FORMATETC::new(CF_UNICODETEXT, Tymed::ISTREAM)), hresult::DV_E_FORMATETC);
        assert_eq!(
            code(FORMATETC::new(CF_TEXT, Tymed::ISTREAM).with_aspect(DvAspect::ICON)),
            hresult::DV_E_DVASPECT
        );
        assert_eq!(code(FORMATETC::new(CF_HDROP, Tymed::ISTREAM)), hresult::DV_E_LINDEX);
        assert_eq!(code(FORMATETC::new(CF_TEXT, Tymed::GDI)), hresult::DV_E_TYMED);
    }

    #[test]
    fn test_get_data_through_stream() {
        let store = Arc::new(DataStore::new().with_media(Tymed::ISTREAM));
        store.insert(CF_TEXT, b"payload".to_vec());
        let object = IDataObject::from_impl(store.clone());

        let medium = object
            .GetData(&FORMATETC::new(CF_TEXT, Tymed::HGLOBAL | Tymed::ISTREAM))
            .unwrap();
        assert_eq!(medium.media(), Tymed::ISTREAM);
        assert_eq!(medium.to_bytes().unwrap(), b"payload");

        // Each request gets an independent copy.
        let again = object.GetData(&FORMATETC::new(CF_TEXT, Tymed::ISTREAM)).unwrap();
        assert_eq!(again.to_bytes().unwrap(), b"payload");
    }

    #[test]
    fn test_set_data_from_stream() {
        let store = Arc::new(DataStore::new());
        let object = IDataObject::from_impl(store.clone());

        let format = FORMATETC::new(CF_HDROP, Tymed::ISTREAM);
        object
            .SetData(&format, StgMedium::from_stream(IStream::from_bytes(b"files")))
            .unwrap();
        assert_eq!(store.get(CF_HDROP).unwrap(), b"files");

        assert!(matches!(
            object.SetData(&format, StgMedium::null()),
            Err(Error::ApiError(_, hresult::DV_E_TYMED))
        ));
    }

    #[test]
    fn test_set_data_leaves_stream_position() {
        let store = Arc::new(DataStore::new());
        let object = IDataObject::from_impl(store.clone());
        let medium = StgMedium::from_stream(IStream::from_bytes(b"shared"));
        let stream = medium.stream().unwrap();

        object
            .SetDataRef(&FORMATETC::new(CF_TEXT, Tymed::ISTREAM), medium.as_raw())
            .unwrap();
        object
            .SetDataRef(&FORMATETC::new(CF_HDROP, Tymed::ISTREAM), medium.as_raw())
            .unwrap();

        assert_eq!(store.get(CF_TEXT).unwrap(), b"shared");
        assert_eq!(store.get(CF_HDROP).unwrap(), b"shared");
        assert_eq!(stream.Seek(0, StreamSeek::Current).unwrap(), 0);
        assert_eq!(medium.to_bytes().unwrap(), b"shared");
    }

    #[test]
    fn test_enum_formats() {
        let store = DataStore::new().with_media(Tymed::ISTREAM);
        store.insert(CF_TEXT, b"a".to_vec());
        store.set_text("b");

        let formats = store.EnumFormatEtc(DataDirection::Get).unwrap();
        assert_eq!(formats.len(), 2);
        assert!(formats.iter().all(|f| f.media() == Tymed::ISTREAM && f.lindex == -1));
        assert!(formats.iter().any(|f| f.cfFormat == CF_UNICODETEXT));
        assert!(store.EnumFormatEtc(DataDirection::Set).is_err());
    }

    #[test]
    fn test_text() {
        let store = DataStore::new();
        assert_eq!(store.text(), None);
        store.set_text("héllo");
        assert_eq!(store.text().as_deref(), Some("héllo"));
        assert_eq!(store.get(CF_UNICODETEXT).unwrap().len(), 12);
        assert_eq!(store.remove(CF_UNICODETEXT).map(|b| b.len()), Some(12));
        assert!(store.is_empty());
    }
}
