use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::CACHE_CONTROL;

use super::TrussRecord;

/// Where truss records come from.
#[async_trait]
pub trait TrussSource: Send + Sync {
    async fn fetch(&self, id: &str) -> Result<TrussRecord>;
}

/// Ids end up in file paths and URLs, so only plain tokens are allowed.
fn validate_id(id: &str) -> Result<()> {
    if id.is_empty()
        || !id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        bail!("invalid truss id '{id}'");
    }
    Ok(())
}

/// `{origin}/static/truss-data/{id}.json?ts={epoch ms}`; the timestamp
/// defeats intermediate caches.
pub fn truss_data_url(origin: &str, id: &str, at: DateTime<Utc>) -> String {
    format!(
        "{}/static/truss-data/{id}.json?ts={}",
        origin.trim_end_matches('/'),
        at.timestamp_millis()
    )
}

/// Reads `{root}/truss-data/{id}.json` from disk.
pub struct StaticDirSource {
    root: PathBuf,
}

impl StaticDirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, id: &str) -> PathBuf {
        self.root.join("truss-data").join(format!("{id}.json"))
    }
}

#[async_trait]
impl TrussSource for StaticDirSource {
    async fn fetch(&self, id: &str) -> Result<TrussRecord> {
        validate_id(id)?;
        let path = self.path_for(id);
        let contents = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("invalid truss json in {}", path.display()))
    }
}

/// Fetches records from the static file server over HTTP, bypassing caches.
pub struct HttpTrussSource {
    client: reqwest::Client,
    origin: String,
}

impl HttpTrussSource {
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            origin: origin.into(),
        }
    }
}

#[async_trait]
impl TrussSource for HttpTrussSource {
    async fn fetch(&self, id: &str) -> Result<TrussRecord> {
        validate_id(id)?;
        let url = truss_data_url(&self.origin, id, Utc::now());
        let response = self
            .client
            .get(&url)
            .header(CACHE_CONTROL, "no-store")
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?;

        let status = response.status();
        if !status.is_success() {
            bail!("HTTP {} for {url}", status.as_u16());
        }

        response
            .json::<TrussRecord>()
            .await
            .with_context(|| format!("invalid truss json from {url}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn url_carries_cache_busting_timestamp() {
        let at = Utc.timestamp_millis_opt(1_758_560_000_123).unwrap();
        assert_eq!(
            truss_data_url("https://yard.example/", "42", at),
            "https://yard.example/static/truss-data/42.json?ts=1758560000123"
        );
    }

    #[test]
    fn path_like_ids_are_rejected() {
        assert!(validate_id("42").is_ok());
        assert!(validate_id("T-42_b").is_ok());
        assert!(validate_id("").is_err());
        assert!(validate_id("../secrets").is_err());
        assert!(validate_id("4 2").is_err());
    }

    #[tokio::test]
    async fn static_dir_reads_record() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("truss-data");
        std::fs::create_dir_all(&data_dir).unwrap();
        std::fs::write(
            data_dir.join("7.json"),
            r#"{"truss_number":"T-7","status":"Instalado"}"#,
        )
        .unwrap();

        let source = StaticDirSource::new(dir.path());
        let record = source.fetch("7").await.unwrap();
        assert_eq!(record.truss_number().as_deref(), Some("T-7"));

        assert!(source.fetch("8").await.is_err());
        assert!(source.fetch("../7").await.is_err());
    }
}
