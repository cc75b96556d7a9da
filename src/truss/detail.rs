use log::error;
use serde::{Deserialize, Serialize};

use super::{TrussRecord, TrussSource};

const PLACEHOLDER: &str = "-";
const DEFAULT_STATUS_TEXT: &str = "Truss Ongoing";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BadgeKind {
    Ongoing,
    Completed,
}

/// The status button on the detail page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusBadge {
    pub kind: BadgeKind,
    pub text: String,
}

impl Default for StatusBadge {
    fn default() -> Self {
        Self::from_status(None)
    }
}

impl StatusBadge {
    /// `instalado` and `completed` (any case) are done; anything else,
    /// including no status at all, is ongoing.
    pub fn from_status(status: Option<&str>) -> Self {
        let text = status.map(str::trim).unwrap_or_default();
        let lowered = text.to_lowercase();
        let kind = if lowered == "instalado" || lowered == "completed" {
            BadgeKind::Completed
        } else {
            BadgeKind::Ongoing
        };
        let text = if text.is_empty() {
            DEFAULT_STATUS_TEXT.to_string()
        } else {
            text.to_string()
        };
        Self { kind, text }
    }

    /// Local toggle only; nothing is written back.
    pub fn toggle(&mut self) {
        *self = match self.kind {
            BadgeKind::Ongoing => Self::from_status(Some("Completed")),
            BadgeKind::Completed => Self::from_status(Some(DEFAULT_STATUS_TEXT)),
        };
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrussDetailView {
    pub truss_id: Option<String>,
    pub title: String,
    pub job: String,
    pub tipo: String,
    pub quantidade: String,
    pub endereco: String,
    pub tamanho: String,
    pub description: String,
    pub status: StatusBadge,
    pub loaded: bool,
}

impl TrussDetailView {
    fn blank(truss_id: Option<&str>, title: String) -> Self {
        Self {
            truss_id: truss_id.map(str::to_string),
            title,
            job: PLACEHOLDER.into(),
            tipo: PLACEHOLDER.into(),
            quantidade: PLACEHOLDER.into(),
            endereco: PLACEHOLDER.into(),
            tamanho: PLACEHOLDER.into(),
            description: String::new(),
            status: StatusBadge::default(),
            loaded: false,
        }
    }

    pub fn not_found() -> Self {
        Self::blank(None, "Truss not found".into())
    }

    /// What the page shows when the record could not be fetched.
    pub fn unavailable(truss_id: &str) -> Self {
        let mut view = Self::blank(Some(truss_id), format!("Truss {truss_id}"));
        view.status = StatusBadge::from_status(Some("Unknown"));
        view.description = "Could not load truss data.".into();
        view
    }

    pub fn from_record(truss_id: &str, record: &TrussRecord) -> Self {
        let or_dash = |value: Option<String>| value.unwrap_or_else(|| PLACEHOLDER.to_string());

        let number = record.truss_number();
        let job = or_dash(record.job_number());
        let tipo = or_dash(record.tipo());
        let quantidade = or_dash(record.quantidade());

        let description = format!(
            "Details for truss {}. Job: {job}. Type: {tipo}. Qty: {quantidade}.",
            number.as_deref().unwrap_or(truss_id)
        );

        Self {
            truss_id: Some(truss_id.to_string()),
            title: number.unwrap_or_else(|| format!("#{truss_id}")),
            job,
            tipo,
            quantidade,
            endereco: or_dash(record.endereco()),
            tamanho: or_dash(record.tamanho()),
            description,
            status: StatusBadge::from_status(record.status().as_deref()),
            loaded: true,
        }
    }

    /// Loads the view for `truss_id`. Never fails: a missing id or a failed
    /// fetch yield the fallback views.
    pub async fn load(source: &dyn TrussSource, truss_id: Option<&str>) -> Self {
        let Some(truss_id) = truss_id.map(str::trim).filter(|id| !id.is_empty()) else {
            return Self::not_found();
        };

        match source.fetch(truss_id).await {
            Ok(record) => Self::from_record(truss_id, &record),
            Err(err) => {
                error!("Failed to load truss json for {truss_id}: {err:#}");
                Self::unavailable(truss_id)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use serde_json::json;

    struct FixedSource(Option<TrussRecord>);

    #[async_trait]
    impl TrussSource for FixedSource {
        async fn fetch(&self, _id: &str) -> Result<TrussRecord> {
            self.0.clone().ok_or_else(|| anyhow!("HTTP 404"))
        }
    }

    fn record(value: serde_json::Value) -> TrussRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn installed_and_completed_are_done() {
        assert_eq!(StatusBadge::from_status(Some("Instalado")).kind, BadgeKind::Completed);
        assert_eq!(StatusBadge::from_status(Some("COMPLETED")).kind, BadgeKind::Completed);
        assert_eq!(StatusBadge::from_status(Some("Em produção")).kind, BadgeKind::Ongoing);

        let empty = StatusBadge::from_status(None);
        assert_eq!(empty.kind, BadgeKind::Ongoing);
        assert_eq!(empty.text, "Truss Ongoing");
    }

    #[test]
    fn toggle_flips_between_states() {
        let mut badge = StatusBadge::from_status(Some("Fabricando"));
        badge.toggle();
        assert_eq!(badge.kind, BadgeKind::Completed);
        assert_eq!(badge.text, "Completed");
        badge.toggle();
        assert_eq!(badge.kind, BadgeKind::Ongoing);
        assert_eq!(badge.text, "Truss Ongoing");
    }

    #[tokio::test]
    async fn loaded_record_fills_the_view() {
        let source = FixedSource(Some(record(json!({
            "truss_number": "T-12",
            "job_number": "J-900",
            "tipo": "Common",
            "quantidade": 4,
            "status": "instalado"
        }))));

        let view = TrussDetailView::load(&source, Some("12")).await;
        assert!(view.loaded);
        assert_eq!(view.title, "T-12");
        assert_eq!(view.endereco, "-");
        assert_eq!(
            view.description,
            "Details for truss T-12. Job: J-900. Type: Common. Qty: 4."
        );
        assert_eq!(view.status.kind, BadgeKind::Completed);
        assert_eq!(view.status.text, "instalado");
    }

    #[tokio::test]
    async fn missing_truss_number_uses_the_id() {
        let source = FixedSource(Some(TrussRecord::default()));
        let view = TrussDetailView::load(&source, Some("33")).await;
        assert_eq!(view.title, "#33");
        assert_eq!(
            view.description,
            "Details for truss 33. Job: -. Type: -. Qty: -."
        );
    }

    #[tokio::test]
    async fn failed_fetch_shows_fallback() {
        let view = TrussDetailView::load(&FixedSource(None), Some("5")).await;
        assert!(!view.loaded);
        assert_eq!(view.title, "Truss 5");
        assert_eq!(view.status.text, "Unknown");
        assert_eq!(view.status.kind, BadgeKind::Ongoing);
        assert_eq!(view.description, "Could not load truss data.");
    }

    #[tokio::test]
    async fn no_id_means_not_found() {
        let view = TrussDetailView::load(&FixedSource(None), Some("  ")).await;
        assert_eq!(view.title, "Truss not found");
        assert!(view.truss_id.is_none());
    }
}
