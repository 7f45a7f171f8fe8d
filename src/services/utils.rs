use bytes::Bytes;
use crate::error::IngestError;

const SIZE_UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Renders a byte count the way the file panel shows it: `0 Bytes`, `1 KB`, `1.5 KB`.
/// Units stop at GB; anything larger is expressed in GB.
pub fn format_size_label(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut unit = 0;
    let mut scale: u64 = 1;
    while unit + 1 < SIZE_UNITS.len() && bytes >= scale * 1024 {
        scale *= 1024;
        unit += 1;
    }

    // Ties round up (1.125 -> 1.13), not to even as `{:.2}` alone would.
    let value = (bytes as f64 / scale as f64 * 100.0).round() / 100.0;
    let rounded = format!("{:.2}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, SIZE_UNITS[unit])
}

/// Decodes uploaded bytes as UTF-8, dropping a leading byte-order mark. Invalid
/// sequences become U+FFFD, so Latin-1 exports still preview.
pub fn decode_text(bytes: &Bytes) -> String {
    let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(&bytes[..]);
    String::from_utf8_lossy(body).into_owned()
}

pub async fn decode_text_async(bytes: Bytes) -> Result<String, IngestError> {
    tokio::task::spawn_blocking(move || decode_text(&bytes))
        .await
        .map_err(|e| IngestError::ParseFailure(format!("decoding task failed: {}", e)))
}
