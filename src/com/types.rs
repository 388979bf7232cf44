//! Fixed-layout OLE data transfer and storage structures.

use core::ffi::c_void;
use core::ptr::null_mut;

use bitflags::bitflags;
use windows_core::GUID;


/// Standard clipboard format identifiers.
pub const CF_TEXT: u16 = 1;
pub const CF_BITMAP: u16 = 2;
pub const CF_METAFILEPICT: u16 = 3;
pub const CF_OEMTEXT: u16 = 7;
pub const CF_DIB: u16 = 8;
pub const CF_PALETTE: u16 = 9;
pub const CF_WAVE: u16 = 12;
pub const CF_UNICODETEXT: u16 = 13;
pub const CF_ENHMETAFILE: u16 = 14;
pub const CF_HDROP: u16 = 15;
pub const CF_LOCALE: u16 = 16;
pub const CF_DIBV5: u16 = 17;

bitflags! {
    /// `TYMED`: storage medium kinds.
    #[repr(transparent)]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Tymed: u32 {
        const HGLOBAL = 1;
        const FILE = 2;
        const ISTREAM = 4;
        const ISTORAGE = 8;
        const GDI = 16;
        const MFPICT = 32;
        const ENHMF = 64;
    }
}

bitflags! {
    /// `DVASPECT`
    #[repr(transparent)]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DvAspect: u32 {
        const CONTENT = 1;
        const THUMBNAIL = 2;
        const ICON = 4;
        const DOCPRINT = 8;
    }
}

bitflags! {
    /// `ADVF`: advisory connection flags.
    #[repr(transparent)]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Advf: u32 {
        const NODATA = 1;
        const PRIMEFIRST = 2;
        const ONLYONCE = 4;
        const CACHE_NOHANDLER = 8;
        const CACHE_FORCEBUILTIN = 16;
        const CACHE_ONSAVE = 32;
        const DATAONSTOP = 64;
    }
}

bitflags! {
    /// `DROPEFFECT`
    #[repr(transparent)]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DropEffect: u32 {
        const COPY = 1;
        const MOVE = 2;
        const LINK = 4;
        const SCROLL = 0x8000_0000;
    }
}

bitflags! {
    /// Key and mouse button state reported during drag and drop (`MK_*`).
    #[repr(transparent)]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ModifierKeys: u32 {
        const LBUTTON = 0x0001;
        const RBUTTON = 0x0002;
        const SHIFT = 0x0004;
        const CONTROL = 0x0008;
        const MBUTTON = 0x0010;
        const ALT = 0x0020;
    }
}

bitflags! {
    /// `STGM`: storage access modes.
    #[repr(transparent)]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct StorageMode: u32 {
        const READ = 0x0000_0000;
        const WRITE = 0x0000_0001;
        const READWRITE = 0x0000_0002;
        const SHARE_DENY_NONE = 0x0000_0040;
        const SHARE_DENY_READ = 0x0000_0030;
        const SHARE_DENY_WRITE = 0x0000_0020;
        const SHARE_EXCLUSIVE = 0x0000_0010;
        const CREATE = 0x0000_1000;
        const TRANSACTED = 0x0001_0000;
        const SIMPLE = 0x0800_0000;
    }
}

/// `DATADIR`: direction for `EnumFormatEtc`.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataDirection {
    Get = 1,
    Set = 2,
}

impl DataDirection {
    pub fn from_raw(value: u32) -> Option<Self> {
        match value {
            1 => Some(Self::Get),
            2 => Some(Self::Set),
            _ => None,
        }
    }
}

/// `STREAM_SEEK`
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamSeek {
    Set = 0,
    Current = 1,
    End = 2,
}

impl StreamSeek {
    pub fn from_raw(value: u32) -> Option<Self> {
        match value {
            0 => Some(Self::Set),
            1 => Some(Self::Current),
            2 => Some(Self::End),
            _ => None,
        }
    }
}

/// `STATFLAG`
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatFlag {
    Default = 0,
    NoName = 1,
    NoOpen = 2,
}

/// `STGTY`
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageType {
    Storage = 1,
    Stream = 2,
    LockBytes = 3,
    Property = 4,
}

/// Opaque, variable-length target device description.
#[repr(C)]
pub struct DVTARGETDEVICE {
    _private: [u8; 0],
}

/// `FORMATETC`: a clipboard format plus target device, aspect and medium.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FORMATETC {
    pub cfFormat: u16,
    pub ptd: *mut DVTARGETDEVICE,
    pub dwAspect: u32,
    pub lindex: i32,
    pub tymed: u32,
}

impl FORMATETC {
    /// Content aspect, all pages (`lindex == -1`), no target device.
    pub const fn new(format: u16, media: Tymed) -> Self {
        Self {
            cfFormat: format,
            ptd: null_mut(),
            dwAspect: DvAspect::CONTENT.bits(),
            lindex: -1,
            tymed: media.bits(),
        }
    }

    pub const fn with_aspect(mut self, aspect: DvAspect) -> Self {
        self.dwAspect = aspect.bits();
        self
    }

    pub const fn with_lindex(mut self, lindex: i32) -> Self {
        self.lindex = lindex;
        self
    }

    #[inline]
    pub fn aspect(&self) -> DvAspect {
        DvAspect::from_bits_retain(self.dwAspect)
    }

    #[inline]
    pub fn media(&self) -> Tymed {
        Tymed::from_bits_retain(self.tymed)
    }
}

impl Default for FORMATETC {
    fn default() -> Self {
        Self::new(0, Tymed::empty())
    }
}

/// Pointer payload of a `STGMEDIUM`; the active member is selected by `tymed`.
#[repr(C)]
#[derive(Clone, Copy)]
pub union STGMEDIUM_0 {
    pub hBitmap: *mut c_void,
    pub hMetaFilePict: *mut c_void,
    pub hEnhMetaFile: *mut c_void,
    pub hGlobal: *mut c_void,
    pub lpszFileName: *mut u16,
    pub pstm: *mut c_void,
    pub pstg: *mut c_void,
}

/// `STGMEDIUM` in its blittable form: every member is a raw pointer.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct STGMEDIUM {
    pub tymed: u32,
    pub u: STGMEDIUM_0,
    pub pUnkForRelease: *mut c_void,
}

impl STGMEDIUM {
    /// `TYMED_NULL` medium with no payload.
    pub const fn null() -> Self {
        Self {
            tymed: 0,
            u: STGMEDIUM_0 { hGlobal: null_mut() },
            pUnkForRelease: null_mut(),
        }
    }

    #[inline]
    pub fn media(&self) -> Tymed {
        Tymed::from_bits_retain(self.tymed)
    }

    /// The payload pointer, whichever member is active.
    #[inline]
    pub fn payload(&self) -> *mut c_void {
        unsafe { self.u.hGlobal }
    }
}

impl Default for STGMEDIUM {
    fn default() -> Self {
        Self::null()
    }
}

impl core::fmt::Debug for STGMEDIUM {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("STGMEDIUM")
            .field("tymed", &self.media())
            .field("payload", &self.payload())
            .field("pUnkForRelease", &self.pUnkForRelease)
            .finish()
    }
}

/// `STATDATA`: one advisory connection.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct STATDATA {
    pub formatetc: FORMATETC,
    pub advf: u32,
    pub pAdvSink: *mut c_void,
    pub dwConnection: u32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FILETIME {
    pub dwLowDateTime: u32,
    pub dwHighDateTime: u32,
}

/// `STATSTG`: storage or stream statistics.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct STATSTG {
    pub pwcsName: *mut u16,
    pub r#type: u32,
    pub cbSize: u64,
    pub mtime: FILETIME,
    pub ctime: FILETIME,
    pub atime: FILETIME,
    pub grfMode: u32,
    pub grfLocksSupported: u32,
    pub clsid: GUID,
    pub grfStateBits: u32,
    pub reserved: u32,
}

impl Default for STATSTG {
    fn default() -> Self {
        Self {
            pwcsName: null_mut(),
            r#type: 0,
            cbSize: 0,
            mtime: FILETIME::default(),
            ctime: FILETIME::default(),
            atime: FILETIME::default(),
            grfMode: 0,
            grfLocksSupported: 0,
            clsid: GUID::zeroed(),
            grfStateBits: 0,
            reserved: 0,
        }
    }
}
