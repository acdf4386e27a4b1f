//! Little-endian wire helpers for the fixed-layout metadata blobs.
//!
//! All persisted integers are little-endian; strings are a `u32` length
//! prefix followed by UTF-8 bytes. The getters return `None` on a short or
//! malformed buffer so each codec can map that to its own error kind.

pub(crate) fn put_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

pub(crate) fn put_u64(buf: &mut Vec<u8>, v: u64) {
    buf.extend_from_slice(&v.to_le_bytes());
}

pub(crate) fn put_string(buf: &mut Vec<u8>, s: &str) {
    put_u32(buf, s.len() as u32);
    buf.extend_from_slice(s.as_bytes());
}

/// Serialized size of a length-prefixed string.
pub(crate) fn string_size(s: &str) -> usize {
    4 + s.len()
}

pub(crate) fn get_u32(bytes: &[u8], offset: &mut usize) -> Option<u32> {
    let end = offset.checked_add(4)?;
    let arr: [u8; 4] = bytes.get(*offset..end)?.try_into().ok()?;
    *offset = end;
    Some(u32::from_le_bytes(arr))
}

pub(crate) fn get_u64(bytes: &[u8], offset: &mut usize) -> Option<u64> {
    let end = offset.checked_add(8)?;
    let arr: [u8; 8] = bytes.get(*offset..end)?.try_into().ok()?;
    *offset = end;
    Some(u64::from_le_bytes(arr))
}

pub(crate) fn get_string(bytes: &[u8], offset: &mut usize) -> Option<String> {
    let len = get_u32(bytes, offset)? as usize;
    let end = offset.checked_add(len)?;
    let raw = bytes.get(*offset..end)?;
    let s = std::str::from_utf8(raw).ok()?.to_string();
    *offset = end;
    Some(s)
}
