//! Mix-format classification for WAVEFORMATEX / WAVEFORMATEXTENSIBLE headers.
//!
//! Kept free of `windows` types so the checks run on every platform.

use crate::error::WasapiError;

pub const WAVE_FORMAT_PCM: u16 = 0x0001;
pub const WAVE_FORMAT_IEEE_FLOAT: u16 = 0x0003;
pub const WAVE_FORMAT_EXTENSIBLE: u16 = 0xFFFE;

/// `KSDATAFORMAT_SUBTYPE_IEEE_FLOAT` as a `u128` (`GUID::to_u128` layout).
pub const SUBTYPE_IEEE_FLOAT: u128 = 0x00000003_0000_0010_8000_00aa00389b71;

/// `KSDATAFORMAT_SUBTYPE_PCM` as a `u128`.
pub const SUBTYPE_PCM: u128 = 0x00000001_0000_0010_8000_00aa00389b71;

/// Extra bytes a WAVEFORMATEXTENSIBLE carries after the WAVEFORMATEX header.
pub const EXTENSIBLE_CB_SIZE: u16 = 22;

/// Accept only 32-bit IEEE float mix formats.
///
/// `sub_format` is the extensible header's `SubFormat`, or `None` when the
/// header is plain WAVEFORMATEX. An extensible tag without a sub-format is
/// rejected.
pub fn ensure_float32(tag: u16, bits: u16, sub_format: Option<u128>) -> Result<(), WasapiError> {
    let float = match tag {
        WAVE_FORMAT_IEEE_FLOAT => true,
        WAVE_FORMAT_EXTENSIBLE => sub_format == Some(SUBTYPE_IEEE_FLOAT),
        _ => false,
    };
    if float && bits == 32 {
        Ok(())
    } else {
        Err(WasapiError::UnsupportedFormat { bits, tag })
    }
}

/// Describe a WAVEFORMATEX tag for diagnostics.
pub fn format_name(tag: u16, bits: u16) -> String {
    match tag {
        WAVE_FORMAT_PCM => format!("pcm-s{}", bits),
        WAVE_FORMAT_IEEE_FLOAT => format!("ieee-float{}", bits),
        WAVE_FORMAT_EXTENSIBLE => format!("extensible-{}bit", bits),
        other => format!("format-{:#06x}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float32_accepted() {
        assert!(ensure_float32(WAVE_FORMAT_IEEE_FLOAT, 32, None).is_ok());
        assert!(ensure_float32(WAVE_FORMAT_EXTENSIBLE, 32, Some(SUBTYPE_IEEE_FLOAT)).is_ok());
    }

    #[test]
    fn integer_pcm_rejected_at_any_width() {
        assert_eq!(
            ensure_float32(WAVE_FORMAT_PCM, 32, None),
            Err(WasapiError::UnsupportedFormat { bits: 32, tag: WAVE_FORMAT_PCM })
        );
        assert!(ensure_float32(WAVE_FORMAT_PCM, 16, None).is_err());
        assert!(ensure_float32(WAVE_FORMAT_EXTENSIBLE, 32, Some(SUBTYPE_PCM)).is_err());
    }

    #[test]
    fn extensible_needs_sub_format() {
        assert!(ensure_float32(WAVE_FORMAT_EXTENSIBLE, 32, None).is_err());
    }

    #[test]
    fn float_of_wrong_width_rejected() {
        assert!(ensure_float32(WAVE_FORMAT_IEEE_FLOAT, 64, None).is_err());
        assert!(ensure_float32(WAVE_FORMAT_EXTENSIBLE, 24, Some(SUBTYPE_IEEE_FLOAT)).is_err());
    }

    #[test]
    fn format_names() {
        assert_eq!(format_name(WAVE_FORMAT_IEEE_FLOAT, 32), "ieee-float32");
        assert_eq!(format_name(WAVE_FORMAT_PCM, 16), "pcm-s16");
        assert_eq!(format_name(0x0055, 0), "format-0x0055");
    }
}
