//! Text helpers shared by the ranker and the assembler.
//!
//! Both transforms are plain ordered string substitutions. The order of the
//! steps is significant and must not be rearranged.

/// Reverse the entity encodings found in rendered post excerpts.
///
/// `&amp;` collapses first so that double-encoded ampersands (`&amp;amp;`)
/// end up as a bare `amp;` which the malformed-link step then removes.
/// `&#038;` is undone last so that an encoded `&lt;` literal is not turned
/// into a `<`.
///
/// The last three steps make `decode` the inverse of [`encode`]. They also mean
/// a WordPress `&#038;` in an excerpt comes out as a bare `&`, which the CDATA
/// description carries unchanged.
pub fn decode(text: &str) -> String {
    text.replace("&amp;", "&")
        .replace("&nbsp;", "")
        .replace("amp;", "")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&#038;", "&")
}

/// Escape text for use inside an XML attribute or element.
///
/// Ampersands are escaped before anything else so the entities produced by
/// later steps are not escaped twice.
pub fn encode(text: &str) -> String {
    text.replace('&', "&#038;")
        .replace("amp;", "")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Like [`decode`], treating an absent value as empty.
pub fn decode_opt(text: Option<&str>) -> String {
    decode(text.unwrap_or_default())
}

/// Like [`encode`], treating an absent value as empty.
pub fn encode_opt(text: Option<&str>) -> String {
    encode(text.unwrap_or_default())
}

/// Render a record id in lowercase base 36, as used for item guids.
pub fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}
