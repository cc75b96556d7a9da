/// Pulls the truss id out of a scanned payload.
///
/// Labels encode `{base_url}/{id}`; the scan page may also have wrapped such
/// a URL in a `qr=` query parameter. A bare number is taken as the id.
pub fn truss_id_from_payload(payload: &str) -> Option<String> {
    let trimmed = payload.trim();
    if is_numeric(trimmed) {
        return Some(trimmed.to_string());
    }

    let without_fragment = trimmed.split('#').next().unwrap_or_default();
    let (path, query) = match without_fragment.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (without_fragment, None),
    };

    if let Some(query) = query {
        for pair in query.split('&') {
            if let Some(value) = pair.strip_prefix("qr=") {
                let decoded = urlencoding::decode(value).ok()?;
                if decoded.len() < trimmed.len() {
                    if let Some(id) = truss_id_from_payload(&decoded) {
                        return Some(id);
                    }
                }
            }
        }
    }

    path.split('/')
        .rev()
        .find(|segment| !segment.is_empty())
        .filter(|segment| is_numeric(segment))
        .map(str::to_string)
}

fn is_numeric(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::truss_id_from_payload;

    #[test]
    fn label_urls_yield_the_trailing_id() {
        assert_eq!(
            truss_id_from_payload("https://yard.example/truss/118/").as_deref(),
            Some("118")
        );
        assert_eq!(
            truss_id_from_payload("https://yard.example/truss/118?src=label#top").as_deref(),
            Some("118")
        );
    }

    #[test]
    fn bare_numbers_are_ids() {
        assert_eq!(truss_id_from_payload(" 42 ").as_deref(), Some("42"));
    }

    #[test]
    fn wrapped_scan_targets_are_unwrapped() {
        assert_eq!(
            truss_id_from_payload("/truss/generic/?qr=https%3A%2F%2Fyard.example%2Ftruss%2F9%2F")
                .as_deref(),
            Some("9")
        );
    }

    #[test]
    fn non_numeric_payloads_have_no_id() {
        assert_eq!(truss_id_from_payload("ABC 123"), None);
        assert_eq!(truss_id_from_payload("https://yard.example"), None);
        assert_eq!(truss_id_from_payload(""), None);
    }
}
