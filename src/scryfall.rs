//! Scryfall API client module.
//!
//! Provides the card search and image endpoints used for fetching card artwork.
//!
//! Documentation:
//! <https://scryfall.com/docs/api>

use anyhow::{Context, Result, bail};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::deck::Face;

/// Default Scryfall API address.
pub const DEFAULT_API_URL: &str = "https://api.scryfall.com";

/// Image version used for printing.
const IMAGE_VERSION: &str = "border_crop";

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Source of card data and card images.
///
/// Implemented by [`ScryfallClient`] and by in-memory fakes in tests.
#[allow(async_fn_in_trait)]
pub trait CardSource {
    /// Run a full-text card search. No matches gives an empty list.
    async fn search(&self, query: &str) -> Result<Vec<Card>>;

    /// Fetch the border-crop image of a card by exact name from a specific set.
    async fn named_image(&self, name: &str, set: &str, face: Face) -> Result<Vec<u8>>;

    /// Download binary content from the given URL.
    async fn download(&self, url: &str) -> Result<Vec<u8>>;
}

/// Scryfall API client.
#[derive(Debug)]
pub struct ScryfallClient {
    client: Client,
    base_url: String,
}

/// Card object from the search endpoint, limited to the fields used here.
#[derive(Debug, Clone, Deserialize)]
pub struct Card {
    /// Card name. Double-faced cards use `Front // Back`.
    pub name: String,
    /// Set code of this printing.
    #[serde(default)]
    pub set: String,
    /// Collector number of this printing.
    #[serde(default)]
    pub collector_number: String,
    /// Images for single-faced cards.
    #[serde(default)]
    pub image_uris: Option<ImageUris>,
    /// Faces for double-faced cards, each with their own images.
    #[serde(default)]
    pub card_faces: Vec<CardFace>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CardFace {
    pub name: String,
    #[serde(default)]
    pub image_uris: Option<ImageUris>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImageUris {
    #[serde(default)]
    pub border_crop: Option<String>,
}

/// List object returned by the search endpoint.
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<Card>,
}

impl Card {
    /// Border-crop image URL for the requested name.
    ///
    /// Uses the card image when present,
    /// otherwise the image of the face whose name matches exactly.
    #[must_use]
    pub fn border_crop_url(&self, requested_name: &str) -> Option<&str> {
        if let Some(url) = self.image_uris.as_ref().and_then(|uris| uris.border_crop.as_deref()) {
            return Some(url);
        }
        self.card_faces
            .iter()
            .filter(|face| face.name == requested_name)
            .find_map(|face| face.image_uris.as_ref().and_then(|uris| uris.border_crop.as_deref()))
    }
}

impl ScryfallClient {
    /// Create a new client for the given API address.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json;q=0.9,*/*;q=0.8"));

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn build_url(&self, endpoint: &str) -> String {
        format!("{}/{endpoint}", self.base_url)
    }
}

impl CardSource for ScryfallClient {
    async fn search(&self, query: &str) -> Result<Vec<Card>> {
        let url = self.build_url("cards/search");

        let response = self
            .client
            .get(&url)
            .query(&[("format", "json"), ("q", query)])
            .send()
            .await
            .context("Failed to send search request")?;

        let status = response.status();
        match status {
            StatusCode::OK => {
                let result: SearchResponse = response.json().await.context("Failed to parse search response")?;
                Ok(result.data)
            }
            // Scryfall answers a search without matches with 404
            StatusCode::NOT_FOUND => Ok(Vec::new()),
            _ => {
                let body = response.text().await.unwrap_or_default();
                bail!("Search failed: HTTP {status} - {body}")
            }
        }
    }

    async fn named_image(&self, name: &str, set: &str, face: Face) -> Result<Vec<u8>> {
        let url = self.build_url("cards/named");

        let mut params = vec![
            ("format", "image"),
            ("version", IMAGE_VERSION),
            ("exact", name),
            ("set", set),
        ];
        if face == Face::Back {
            params.push(("face", "back"));
        }

        let response = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .context("Failed to send named card request")?;

        let status = response.status();
        if status != StatusCode::OK {
            bail!("Failed to get image for {name} ({set}): HTTP {status}");
        }

        let bytes = response.bytes().await.context("Failed to read image data")?;
        Ok(bytes.to_vec())
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to download {url}"))?;

        let status = response.status();
        if status != StatusCode::OK {
            bail!("Failed to download {url}: HTTP {status}");
        }

        let bytes = response.bytes().await.context("Failed to read image data")?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod test_card {
    use super::*;

    const SEARCH_RESPONSE: &str = r#"{
        "object": "list",
        "total_cards": 2,
        "has_more": false,
        "data": [
            {
                "object": "card",
                "name": "Lightning Bolt",
                "set": "lea",
                "collector_number": "161",
                "image_uris": {
                    "small": "https://cards.scryfall.io/small/front/bolt.jpg",
                    "border_crop": "https://cards.scryfall.io/border_crop/front/bolt.jpg"
                }
            },
            {
                "object": "card",
                "name": "Delver of Secrets // Insectile Aberration",
                "set": "isd",
                "collector_number": "51",
                "card_faces": [
                    {
                        "name": "Delver of Secrets",
                        "image_uris": { "border_crop": "https://cards.scryfall.io/border_crop/front/delver.jpg" }
                    },
                    {
                        "name": "Insectile Aberration",
                        "image_uris": { "border_crop": "https://cards.scryfall.io/border_crop/back/delver.jpg" }
                    }
                ]
            }
        ]
    }"#;

    fn parse_cards() -> Vec<Card> {
        serde_json::from_str::<SearchResponse>(SEARCH_RESPONSE)
            .expect("should parse search response")
            .data
    }

    #[test]
    fn parses_search_response() {
        let cards = parse_cards();
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].set, "lea");
        assert_eq!(cards[0].collector_number, "161");
        assert_eq!(cards[1].card_faces.len(), 2);
    }

    #[test]
    fn single_faced_card_url() {
        let cards = parse_cards();
        assert_eq!(
            cards[0].border_crop_url("Lightning Bolt"),
            Some("https://cards.scryfall.io/border_crop/front/bolt.jpg")
        );
    }

    #[test]
    fn double_faced_card_url_matches_face_name() {
        let cards = parse_cards();
        assert_eq!(
            cards[1].border_crop_url("Delver of Secrets"),
            Some("https://cards.scryfall.io/border_crop/front/delver.jpg")
        );
        assert_eq!(
            cards[1].border_crop_url("Insectile Aberration"),
            Some("https://cards.scryfall.io/border_crop/back/delver.jpg")
        );
        assert_eq!(cards[1].border_crop_url("Delver"), None);
    }

    #[test]
    fn empty_list_without_data() {
        let result: SearchResponse = serde_json::from_str(r#"{"object": "list"}"#).expect("should parse");
        assert!(result.data.is_empty());
    }

    #[test]
    fn client_trims_trailing_slash() {
        let client = ScryfallClient::new("https://example.com/").expect("should build client");
        assert_eq!(client.build_url("cards/search"), "https://example.com/cards/search");
    }
}
