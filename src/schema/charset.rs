use encoding_rs::Encoding;

use crate::error::ParseError;

/// Resolves a schema charset label to an encoding.
///
/// The GDPdU description names code pages by the Windows-era aliases ANSI,
/// Macintosh, OEM, UTF-7, UTF-8 and UTF-16; anything else is tried as a
/// WHATWG encoding label (so "windows-1252", "cp1252", "utf-16le", "latin1"
/// etc. all work).
pub fn resolve_charset(label: &str) -> Result<&'static Encoding, ParseError> {
    let normalized = label.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "ansi" => Ok(encoding_rs::WINDOWS_1252),
        "macintosh" => Ok(encoding_rs::MACINTOSH),
        // UTF-16 without a BOM is little-endian on the systems producing
        // these exports.
        "utf16" | "utf-16" => Ok(encoding_rs::UTF_16LE),
        "utf8" | "utf-8" => Ok(encoding_rs::UTF_8),
        // IBM-PC-ASCII (cp437/cp850) and UTF-7 have no decoder here.
        "oem" | "utf7" | "utf-7" => Err(ParseError::Config(format!(
            "charset [{label}] is not supported"
        ))),
        _ => Encoding::for_label(normalized.as_bytes())
            .ok_or_else(|| ParseError::Config(format!("unknown charset [{label}]"))),
    }
}
