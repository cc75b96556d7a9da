use std::sync::Mutex;

use log::info;

use crate::models::DecodedPayload;

/// Performs the page change once a payload is accepted. A browser host sets
/// `location.href`; other hosts record or print the target.
pub trait Navigator: Send + Sync {
    fn navigate(&self, target: &str);
}

/// `{base}?qr={payload}`, or `{base}&qr={payload}` if the base already has a
/// query string. The payload is percent-encoded.
pub fn build_navigation_target(base_path: &str, payload: &DecodedPayload) -> String {
    let separator = if base_path.contains('?') { '&' } else { '?' };
    format!(
        "{base_path}{separator}qr={}",
        urlencoding::encode(payload.as_str())
    )
}

/// Logs navigation targets instead of following them.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn navigate(&self, target: &str) {
        info!("navigate -> {target}");
    }
}

/// Keeps every target it is asked to navigate to.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    targets: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn targets(&self) -> Vec<String> {
        match self.targets.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn last(&self) -> Option<String> {
        self.targets().pop()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, target: &str) {
        let mut guard = match self.targets.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.push(target.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(raw: &str) -> DecodedPayload {
        DecodedPayload::new(raw).unwrap()
    }

    #[test]
    fn spaces_are_percent_encoded() {
        assert_eq!(
            build_navigation_target("/truss/generic/", &payload("ABC 123")),
            "/truss/generic/?qr=ABC%20123"
        );
    }

    #[test]
    fn url_payloads_are_encoded_whole() {
        assert_eq!(
            build_navigation_target("/truss/generic/", &payload("https://x.test/truss/7/?a=1&b=2")),
            "/truss/generic/?qr=https%3A%2F%2Fx.test%2Ftruss%2F7%2F%3Fa%3D1%26b%3D2"
        );
    }

    #[test]
    fn existing_query_gets_an_ampersand() {
        assert_eq!(
            build_navigation_target("/truss/generic/?from=scan", &payload("42")),
            "/truss/generic/?from=scan&qr=42"
        );
    }

    #[test]
    fn recording_navigator_keeps_order() {
        let nav = RecordingNavigator::new();
        nav.navigate("/a");
        nav.navigate("/b");
        assert_eq!(nav.targets(), vec!["/a", "/b"]);
        assert_eq!(nav.last().as_deref(), Some("/b"));
    }
}
