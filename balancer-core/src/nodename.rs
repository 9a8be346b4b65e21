//! Canonical node-identifier handling.
//!
//! Leader identifiers reported per queue come back as Erlang process ids
//! (`<rabbit@host.3.123.0>`) while the running-node list reports plain
//! node names (`rabbit@host`). Both forms must compare equal, so raw ids
//! are reduced to the canonical node name before any counting.

/// Strips process-id decoration from a raw leader identifier.
///
/// Removes the enclosing `<` `>` markers and any trailing dot-separated
/// all-digit instance-id segments. Already-canonical names pass through
/// unchanged, so the function is idempotent. Hostname segments that
/// contain non-digits are never stripped (`rabbit@host.example.com`
/// stays intact).
pub fn normalize(raw: &str) -> String {
    let mut s = raw.trim();
    s = s.strip_prefix('<').unwrap_or(s);
    s = s.strip_suffix('>').unwrap_or(s);

    while let Some((head, tail)) = s.rsplit_once('.') {
        if !tail.is_empty() && tail.bytes().all(|b| b.is_ascii_digit()) {
            s = head;
        } else {
            break;
        }
    }
    s.to_string()
}
