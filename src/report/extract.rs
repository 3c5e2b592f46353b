const BOLD: &str = "**";

/// Returns the text following `**{heading}**` up to the next bold marker or
/// the end of the completion, trimmed.
///
/// This is a substring heuristic, not a markdown parser: the first occurrence
/// of the marked heading wins, and a missing heading yields an empty string.
/// A colon after the heading (`**Introduction**: ...` or `**Introduction** : ...`)
/// is dropped.
pub fn extract_section(content: &str, heading: &str) -> String {
    let marker = format!("{BOLD}{heading}{BOLD}");
    let Some(start) = content.find(&marker) else {
        return String::new();
    };

    let rest = &content[start + marker.len()..];
    let body = match rest.find(BOLD) {
        Some(end) => &rest[..end],
        None => rest,
    };

    let body = body.trim_start();
    let body = body.strip_prefix(':').unwrap_or(body);
    body.trim().to_string()
}
