use encoding_rs::EUC_KR;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::error::LoadError;
use crate::services::ingest::normalizer::RawTable;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const UTF16_LE_BOM: &[u8] = &[0xFF, 0xFE];
const UTF16_BE_BOM: &[u8] = &[0xFE, 0xFF];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    Utf16Le,
    Utf16Be,
    /// CP949, the Windows superset of EUC-KR used by Korean spreadsheet exports.
    Cp949,
    Latin1,
}

/// Decodes a spreadsheet export: UTF-8 (BOM optional), UTF-16 when a BOM
/// says so, then CP949 when the bytes are well-formed for it, otherwise
/// Latin-1, which accepts any byte sequence.
pub fn decode_text(bytes: &[u8]) -> Option<(String, TextEncoding)> {
    if let Some(rest) = bytes.strip_prefix(UTF8_BOM) {
        return Some((String::from_utf8_lossy(rest).into_owned(), TextEncoding::Utf8));
    }
    if let Some(rest) = bytes.strip_prefix(UTF16_LE_BOM) {
        return decode_utf16(rest, u16::from_le_bytes).map(|s| (s, TextEncoding::Utf16Le));
    }
    if let Some(rest) = bytes.strip_prefix(UTF16_BE_BOM) {
        return decode_utf16(rest, u16::from_be_bytes).map(|s| (s, TextEncoding::Utf16Be));
    }
    if let Ok(text) = std::str::from_utf8(bytes) {
        return Some((text.to_string(), TextEncoding::Utf8));
    }
    if let Some(text) = EUC_KR.decode_without_bom_handling_and_without_replacement(bytes) {
        return Some((text.into_owned(), TextEncoding::Cp949));
    }
    Some((bytes.iter().map(|&b| b as char).collect(), TextEncoding::Latin1))
}

fn decode_utf16(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> Option<String> {
    if bytes.len() % 2 != 0 {
        return None;
    }
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| unit([pair[0], pair[1]]))
        .collect();
    String::from_utf16(&units).ok()
}

pub async fn read_csv_table(path: &Path) -> Result<RawTable, LoadError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| LoadError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;

    let (text, encoding) = decode_text(&bytes).ok_or_else(|| LoadError::Decode {
        path: path.to_path_buf(),
    })?;
    debug!(path = %path.display(), ?encoding, bytes = bytes.len(), "Decoded file");

    RawTable::from_csv_str(&text).map_err(|source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    })
}

/// Every `*.csv` directly inside `dir`, sorted by name.
pub async fn list_csv_files(dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
    let read_dir_error = |source| LoadError::ReadDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = tokio::fs::read_dir(dir).await.map_err(read_dir_error)?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(read_dir_error)? {
        let path = entry.path();
        let is_csv = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if is_csv && path.is_file() {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}
