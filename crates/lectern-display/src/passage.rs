//! Passage lookup for verse overrides.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::error::{DisplayError, Result};

/// Default passage service.
pub const DEFAULT_PASSAGE_URL: &str = "https://bible-api.com/";

/// A passage ready to render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Passage {
    pub title: String,
    pub lines: Vec<String>,
    /// Translation or source shown under the text.
    pub source_label: String,
}

impl Passage {
    /// Number of pages at `per_page` lines each (at least one).
    pub fn page_count(&self, per_page: usize) -> usize {
        self.lines.len().div_ceil(per_page.max(1)).max(1)
    }

    /// Lines shown on `page` (zero-based).
    pub fn page(&self, page: usize, per_page: usize) -> &[String] {
        let per_page = per_page.max(1);
        let start = (page * per_page).min(self.lines.len());
        let end = (start + per_page).min(self.lines.len());
        &self.lines[start..end]
    }
}

/// Looks up passage text by reference.
#[async_trait]
pub trait PassageLookup: Send + Sync {
    /// Fetches `reference`, trying `translations` in order.
    ///
    /// `Ok(None)` means no translation had the passage.
    async fn passage_text(&self, reference: &str, translations: &[String]) -> Result<Option<Passage>>;
}

#[derive(Debug, Deserialize)]
struct ApiVerse {
    verse: u32,
    text: String,
}

#[derive(Debug, Deserialize)]
struct ApiPassage {
    reference: String,
    #[serde(default)]
    verses: Vec<ApiVerse>,
    #[serde(default)]
    translation_name: Option<String>,
}

/// Passage lookup against a bible-api.com style HTTP service.
pub struct HttpPassageLookup {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpPassageLookup {
    /// Creates a lookup against the default service.
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_PASSAGE_URL)
    }

    /// Creates a lookup against another service root.
    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            base_url: Url::parse(base_url)?,
        })
    }

    fn lookup_url(&self, reference: &str, translation: Option<&str>) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| DisplayError::Lookup(format!("{} cannot be a base url", self.base_url)))?
            .pop_if_empty()
            .push(reference.trim());
        if let Some(translation) = translation {
            url.query_pairs_mut().append_pair("translation", translation);
        }
        Ok(url)
    }

    async fn fetch(&self, reference: &str, translation: Option<&str>) -> Result<Option<Passage>> {
        let url = self.lookup_url(reference, translation)?;
        debug!(%url, "fetching passage");

        let response = self.client.get(url).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body: ApiPassage = response.error_for_status()?.json().await?;
        Ok(into_passage(body))
    }
}

fn into_passage(body: ApiPassage) -> Option<Passage> {
    if body.verses.is_empty() {
        return None;
    }
    Some(Passage {
        title: body.reference,
        lines: body
            .verses
            .iter()
            .map(|v| format!("{} {}", v.verse, v.text.trim()))
            .collect(),
        source_label: body.translation_name.unwrap_or_default(),
    })
}

#[async_trait]
impl PassageLookup for HttpPassageLookup {
    async fn passage_text(&self, reference: &str, translations: &[String]) -> Result<Option<Passage>> {
        if translations.is_empty() {
            return self.fetch(reference, None).await;
        }
        let mut failures = 0;
        let mut last_error = None;
        for translation in translations {
            match self.fetch(reference, Some(translation)).await {
                Ok(Some(passage)) => return Ok(Some(passage)),
                Ok(None) => {
                    debug!(reference, translation = %translation, "passage not found, trying next translation");
                }
                Err(e) => {
                    warn!(reference, translation = %translation, error = %e, "passage lookup failed, trying next translation");
                    failures += 1;
                    last_error = Some(e);
                }
            }
        }
        match last_error {
            Some(e) if failures == translations.len() => Err(e),
            // At least one translation answered, it just lacked the passage
            _ => Ok(None),
        }
    }
}

/// In-memory passages keyed by reference (case-insensitive).
#[derive(Debug, Clone, Default)]
pub struct StaticPassageLookup {
    passages: HashMap<String, Passage>,
}

impl StaticPassageLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a passage.
    pub fn with_passage(mut self, reference: &str, passage: Passage) -> Self {
        self.passages.insert(reference.trim().to_lowercase(), passage);
        self
    }
}

#[async_trait]
impl PassageLookup for StaticPassageLookup {
    async fn passage_text(&self, reference: &str, _translations: &[String]) -> Result<Option<Passage>> {
        Ok(self.passages.get(&reference.trim().to_lowercase()).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passage(lines: usize) -> Passage {
        Passage {
            title: "Psalm 23".to_string(),
            lines: (1..=lines).map(|i| format!("{} line", i)).collect(),
            source_label: "WEB".to_string(),
        }
    }

    #[test]
    fn test_paging() {
        let p = passage(6);
        assert_eq!(p.page_count(4), 2);
        assert_eq!(p.page(0, 4).len(), 4);
        assert_eq!(p.page(1, 4), &p.lines[4..6]);
        assert!(p.page(5, 4).is_empty());
        assert_eq!(passage(0).page_count(4), 1);
    }

    #[test]
    fn test_lookup_url() {
        let lookup = HttpPassageLookup::with_base_url("https://bible-api.com/").unwrap();

        let url = lookup.lookup_url("John 3:16", Some("kjv")).unwrap();
        assert_eq!(url.as_str(), "https://bible-api.com/John%203:16?translation=kjv");

        let url = lookup.lookup_url("Psalm 23", None).unwrap();
        assert_eq!(url.as_str(), "https://bible-api.com/Psalm%2023");
    }

    #[test]
    fn test_parse_response() {
        let body: ApiPassage = serde_json::from_value(serde_json::json!({
            "reference": "John 3:16-17",
            "verses": [
                { "book_name": "John", "chapter": 3, "verse": 16, "text": "For God so loved the world...\n" },
                { "book_name": "John", "chapter": 3, "verse": 17, "text": "For God didn't send his Son..." }
            ],
            "translation_name": "World English Bible"
        }))
        .unwrap();

        let passage = into_passage(body).unwrap();
        assert_eq!(passage.title, "John 3:16-17");
        assert_eq!(passage.lines[0], "16 For God so loved the world...");
        assert_eq!(passage.source_label, "World English Bible");
    }

    #[test]
    fn test_empty_response_is_none() {
        let body: ApiPassage =
            serde_json::from_value(serde_json::json!({ "reference": "Nope 1:1" })).unwrap();
        assert!(into_passage(body).is_none());
    }

    /// Serves one canned HTTP response per connection: 500 for the
    /// `broken` translation, 404 for `missing`, a passage otherwise.
    async fn spawn_passage_server() -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    break;
                };
                tokio::spawn(async move {
                    let mut request = Vec::new();
                    let mut buf = [0u8; 1024];
                    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                        match socket.read(&mut buf).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => request.extend_from_slice(&buf[..n]),
                        }
                    }
                    let request = String::from_utf8_lossy(&request);
                    let (status, body) = if request.contains("translation=broken") {
                        ("500 Internal Server Error", "{}".to_string())
                    } else if request.contains("translation=missing") {
                        ("404 Not Found", "{}".to_string())
                    } else {
                        (
                            "200 OK",
                            serde_json::json!({
                                "reference": "Psalm 23:1",
                                "verses": [{ "verse": 1, "text": "The LORD is my shepherd" }],
                                "translation_name": "King James Version"
                            })
                            .to_string(),
                        )
                    };
                    let response = format!(
                        "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                        status,
                        body.len(),
                        body
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                });
            }
        });
        format!("http://{}/", addr)
    }

    #[tokio::test]
    async fn test_failed_translation_falls_through() {
        let lookup = HttpPassageLookup::with_base_url(&spawn_passage_server().await).unwrap();
        let translations = vec!["broken".to_string(), "missing".to_string(), "kjv".to_string()];

        let passage = lookup
            .passage_text("Psalm 23:1", &translations)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(passage.lines, vec!["1 The LORD is my shepherd".to_string()]);
        assert_eq!(passage.source_label, "King James Version");
    }

    #[tokio::test]
    async fn test_lookup_errors_only_when_every_translation_fails() {
        let lookup = HttpPassageLookup::with_base_url(&spawn_passage_server().await).unwrap();

        let broken = vec!["broken".to_string(), "broken".to_string()];
        assert!(lookup.passage_text("Psalm 23:1", &broken).await.is_err());

        let mixed = vec!["broken".to_string(), "missing".to_string()];
        assert!(lookup.passage_text("Psalm 23:1", &mixed).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_static_lookup() {
        let lookup = StaticPassageLookup::new().with_passage("Psalm 23", passage(2));

        assert!(lookup.passage_text("psalm 23 ", &[]).await.unwrap().is_some());
        assert!(lookup.passage_text("Psalm 24", &[]).await.unwrap().is_none());
    }
}
