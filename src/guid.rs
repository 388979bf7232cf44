//! `GUID` parsing and formatting.
//!
//! The structure itself is [`windows_core::GUID`]; textual forms go through
//! `uuid`, which accepts more spellings than `GUID::try_from(&str)`.

use uuid::Uuid;

use crate::error::{Error, Result};

pub use windows_core::GUID;

/// Parses the hyphenated, braced or simple textual forms.
pub fn parse(text: &str) -> Result<GUID> {
    Uuid::parse_str(text)
        .map(from_uuid)
        .map_err(|_| Error::InvalidArgument(alloc::format!("malformed GUID '{text}'")))
}

/// Field-preserving conversion from a [`Uuid`].
pub fn from_uuid(value: Uuid) -> GUID {
    let (data1, data2, data3, data4) = value.as_fields();
    GUID::from_values(data1, data2, data3, *data4)
}

/// Field-preserving conversion to a [`Uuid`].
pub fn to_uuid(guid: &GUID) -> Uuid {
    Uuid::from_fields(guid.data1, guid.data2, guid.data3, &guid.data4)
}

/// Lowercase hyphenated form, e.g. `0000010e-0000-0000-c000-000000000046`.
pub fn hyphenated(guid: &GUID) -> uuid::fmt::Hyphenated {
    to_uuid(guid).hyphenated()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::format;

    const IID_IDATAOBJECT: GUID = GUID::from_u128(0x0000010e_0000_0000_c000_000000000046);

    #[test]
    fn test_from_u128_fields() {
        assert_eq!(IID_IDATAOBJECT.data1, 0x0000010e);
        assert_eq!(IID_IDATAOBJECT.data2, 0);
        assert_eq!(IID_IDATAOBJECT.data3, 0);
        assert_eq!(IID_IDATAOBJECT.data4, [0xc0, 0, 0, 0, 0, 0, 0, 0x46]);
        assert_eq!(IID_IDATAOBJECT.to_u128(), 0x0000010e_0000_0000_c000_000000000046);
    }

    #[test]
    fn test_parse_forms() -> Result<()> {
        assert_eq!(parse("0000010e-0000-0000-C000-000000000046")?, IID_IDATAOBJECT);
        assert_eq!(parse("{0000010E-0000-0000-C000-000000000046}")?, IID_IDATAOBJECT);
        assert_eq!(parse("0000010e00000000c000000000000046")?, IID_IDATAOBJECT);
        Ok(())
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(parse("not-a-guid"), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_formatting() {
        let guid = GUID::from_u128(0xc03f6a43_65a4_9818_987e_e0b810d2a6f2);
        assert_eq!(format!("{}", hyphenated(&guid)), "c03f6a43-65a4-9818-987e-e0b810d2a6f2");
        assert_eq!(format!("{guid:?}"), "C03F6A43-65A4-9818-987E-E0B810D2A6F2");
    }

    #[test]
    fn test_uuid_conversion_keeps_fields() {
        let uuid = to_uuid(&IID_IDATAOBJECT);
        assert_eq!(from_uuid(uuid), IID_IDATAOBJECT);
        assert_eq!(uuid.as_u128(), IID_IDATAOBJECT.to_u128());
    }
}
