use std::fs;
use std::path::Path;
use tracing::{debug, info, instrument};

use crate::error::{PipelineError, Result};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Text encodings the line reader knows how to try
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    /// Strict UTF-8; refuses input starting with a byte-order mark
    Utf8,
    /// UTF-8 with an optional leading byte-order mark
    Utf8Sig,
    /// ISO-8859-1, every byte maps to the code point of the same value
    Latin1,
    /// Windows code page 1252
    Windows1252,
}

impl TextEncoding {
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "utf-8" | "utf8" => Some(Self::Utf8),
            "utf-8-sig" | "utf8-sig" => Some(Self::Utf8Sig),
            "latin-1" | "latin1" | "iso-8859-1" => Some(Self::Latin1),
            "cp1252" | "windows-1252" => Some(Self::Windows1252),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Utf8 => "utf-8",
            Self::Utf8Sig => "utf-8-sig",
            Self::Latin1 => "latin-1",
            Self::Windows1252 => "cp1252",
        }
    }

    /// Decode the whole buffer or nothing
    pub fn decode(&self, bytes: &[u8]) -> Option<String> {
        match self {
            Self::Utf8 => {
                if bytes.starts_with(UTF8_BOM) {
                    return None;
                }
                std::str::from_utf8(bytes).ok().map(str::to_owned)
            }
            Self::Utf8Sig => {
                let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
                std::str::from_utf8(body).ok().map(str::to_owned)
            }
            Self::Latin1 => Some(bytes.iter().map(|&b| b as char).collect()),
            Self::Windows1252 => encoding_rs::WINDOWS_1252
                .decode_without_bom_handling_and_without_replacement(bytes)
                .map(|text| text.into_owned()),
        }
    }
}

/// Try each encoding in order and return the first full decode
pub fn decode_bytes(bytes: &[u8], encodings: &[TextEncoding]) -> Option<(TextEncoding, String)> {
    encodings.iter().find_map(|encoding| {
        let decoded = encoding.decode(bytes);
        if decoded.is_none() {
            debug!("Decoding with {} failed", encoding.label());
        }
        decoded.map(|text| (*encoding, text))
    })
}

/// Split text into lines, dropping `\n`, `\r\n` and lone `\r` terminators
pub fn split_lines(text: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut rest = text;
    while !rest.is_empty() {
        match rest.find(['\n', '\r']) {
            Some(idx) => {
                lines.push(rest[..idx].to_string());
                let skip = if rest[idx..].starts_with("\r\n") { 2 } else { 1 };
                rest = &rest[idx + skip..];
            }
            None => {
                lines.push(rest.to_string());
                break;
            }
        }
    }
    lines
}

/// Read a sales file of unknown encoding into lines, in file order
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn read_sales_file(path: impl AsRef<Path>, encodings: &[TextEncoding]) -> Result<Vec<String>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(PipelineError::FileNotFound(path.display().to_string()));
    }

    let bytes = fs::read(path)?;
    match decode_bytes(&bytes, encodings) {
        Some((encoding, text)) => {
            let lines = split_lines(&text);
            info!("Decoded {} as {} ({} lines)", path.display(), encoding.label(), lines.len());
            Ok(lines)
        }
        None => Err(PipelineError::Decode {
            path: path.display().to_string(),
            tried: encodings.iter().map(|e| e.label()).collect::<Vec<_>>().join(", "),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const ALL: [TextEncoding; 4] = [
        TextEncoding::Utf8,
        TextEncoding::Utf8Sig,
        TextEncoding::Latin1,
        TextEncoding::Windows1252,
    ];

    fn temp_file(bytes: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(bytes).unwrap();
        file
    }

    #[test]
    fn missing_file_is_file_not_found() {
        let err = read_sales_file("/definitely/not/here.txt", &ALL).unwrap_err();
        assert!(matches!(err, PipelineError::FileNotFound(_)));
    }

    #[test]
    fn plain_utf8_is_read_in_order() {
        let file = temp_file("a|b\r\nc|d\n\ne|f".as_bytes());
        let lines = read_sales_file(file.path(), &ALL).unwrap();
        assert_eq!(lines, vec!["a|b", "c|d", "", "e|f"]);
    }

    #[test]
    fn bom_is_stripped_by_sig_variant() {
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice(b"TransactionID|Date");
        let (encoding, text) = decode_bytes(&bytes, &ALL).unwrap();
        assert_eq!(encoding, TextEncoding::Utf8Sig);
        assert_eq!(text, "TransactionID|Date");
    }

    #[test]
    fn invalid_utf8_falls_back_to_latin1() {
        // "Café" in latin-1
        let bytes = b"Caf\xe9";
        let (encoding, text) = decode_bytes(bytes, &ALL).unwrap();
        assert_eq!(encoding, TextEncoding::Latin1);
        assert_eq!(text, "Café");
    }

    #[test]
    fn windows_1252_maps_smart_quotes() {
        let text = TextEncoding::Windows1252.decode(b"\x93hi\x94").unwrap();
        assert_eq!(text, "\u{201c}hi\u{201d}");
    }

    #[test]
    fn exhausting_candidates_is_decode_error() {
        let file = temp_file(b"\xff\xfe broken");
        let err = read_sales_file(file.path(), &[TextEncoding::Utf8, TextEncoding::Utf8Sig]).unwrap_err();
        match err {
            PipelineError::Decode { tried, .. } => assert_eq!(tried, "utf-8, utf-8-sig"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn split_lines_handles_lone_carriage_return() {
        assert_eq!(split_lines("a\rb\r\nc\n"), vec!["a", "b", "c"]);
        assert!(split_lines("").is_empty());
    }

    #[test]
    fn labels_round_trip() {
        for encoding in ALL {
            assert_eq!(TextEncoding::from_label(encoding.label()), Some(encoding));
        }
        assert_eq!(TextEncoding::from_label("Windows_1252"), Some(TextEncoding::Windows1252));
    }
}
