//! Address lookup adapter over the PDOK Locatieserver.
//!
//! Resolves a postcode + house number to a structured address and
//! serves autocomplete suggestions, both backed by the free Dutch
//! government geocoder. Results are cached (24 h for lookups, 1 h for
//! suggestions) purely as an optimization: a cache miss always falls
//! through to the live service, and failures are non-fatal for the
//! caller.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use groenmarkt_core::{Postcode, PostcodeError};

/// Lookup request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// How long resolved addresses stay cached.
const LOOKUP_CACHE_TTL: Duration = Duration::from_secs(60 * 60 * 24);

/// How long suggestion lists stay cached.
const SUGGEST_CACHE_TTL: Duration = Duration::from_secs(60 * 60);

/// Suggestions only fire from this query length.
const MIN_SUGGEST_QUERY: usize = 3;

/// Errors from the address lookup boundary. Each maps to a distinct
/// user-facing message; none is fatal to the caller.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    /// The postcode does not match the Dutch format.
    #[error("invalid postcode: {0}")]
    InvalidPostcode(#[from] PostcodeError),

    /// The house number is missing.
    #[error("house number is required")]
    MissingHouseNumber,

    /// The directory has no address at this postcode + number.
    #[error("address not found")]
    NotFound,

    /// The directory service did not answer in time.
    #[error("address service timed out")]
    Timeout,

    /// Transport-level failure.
    #[error("address service unreachable: {0}")]
    Network(reqwest::Error),

    /// The directory answered with a non-success status.
    #[error("address service error ({0})")]
    ServiceError(u16),
}

impl From<reqwest::Error> for LookupError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::Network(e)
        }
    }
}

/// A fully resolved Dutch address.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedAddress {
    pub street: String,
    pub house_number: String,
    pub house_number_addition: String,
    pub postal_code: String,
    pub city: String,
    pub province: String,
    pub country: String,
    pub formatted_address: String,
}

/// One autocomplete suggestion.
#[derive(Debug, Clone, Serialize)]
pub struct Suggestion {
    pub formatted_address: String,
    pub street: String,
    pub house_number: String,
    pub house_number_addition: String,
    pub postal_code: String,
    pub city: String,
    pub province: String,
}

#[derive(Debug, Deserialize)]
struct PdokEnvelope {
    response: PdokResponse,
}

#[derive(Debug, Deserialize)]
struct PdokResponse {
    #[serde(default, rename = "numFound")]
    num_found: u32,
    #[serde(default)]
    docs: Vec<PdokDoc>,
}

#[derive(Debug, Default, Deserialize)]
struct PdokDoc {
    #[serde(default)]
    straatnaam: Option<String>,
    #[serde(default)]
    huisnummer: Option<i64>,
    #[serde(default)]
    huisnummer_toevoeging: Option<String>,
    #[serde(default)]
    postcode: Option<String>,
    #[serde(default)]
    woonplaatsnaam: Option<String>,
    #[serde(default)]
    provincienaam: Option<String>,
    #[serde(default)]
    weergavenaam: Option<String>,
}

/// Client for the PDOK Locatieserver.
#[derive(Clone)]
pub struct AddressLookup {
    inner: Arc<AddressLookupInner>,
}

struct AddressLookupInner {
    client: reqwest::Client,
    lookup_url: String,
    suggest_url: String,
    lookup_cache: Cache<(String, String, String), ResolvedAddress>,
    suggest_cache: Cache<String, Vec<Suggestion>>,
}

impl AddressLookup {
    /// Create a new lookup client against the given endpoints.
    ///
    /// # Errors
    ///
    /// Returns `LookupError::Network` if the HTTP client cannot be
    /// built.
    pub fn new(lookup_url: &str, suggest_url: &str) -> Result<Self, LookupError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent("groenmarkt/0.1")
            .build()?;

        Ok(Self {
            inner: Arc::new(AddressLookupInner {
                client,
                lookup_url: lookup_url.to_owned(),
                suggest_url: suggest_url.to_owned(),
                lookup_cache: Cache::builder()
                    .max_capacity(10_000)
                    .time_to_live(LOOKUP_CACHE_TTL)
                    .build(),
                suggest_cache: Cache::builder()
                    .max_capacity(10_000)
                    .time_to_live(SUGGEST_CACHE_TTL)
                    .build(),
            }),
        })
    }

    /// Resolve a postcode + house number (+ optional addition) to a
    /// structured address.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPostcode`/`MissingHouseNumber` for bad input,
    /// `NotFound` when the directory has no match, and
    /// `Timeout`/`Network`/`ServiceError` for upstream trouble.
    #[instrument(skip(self))]
    pub async fn lookup(
        &self,
        postcode: &str,
        house_number: &str,
        addition: &str,
    ) -> Result<ResolvedAddress, LookupError> {
        let postcode = Postcode::parse(postcode)?;
        let house_number = house_number.trim();
        if house_number.is_empty() {
            return Err(LookupError::MissingHouseNumber);
        }
        let addition = addition.trim();

        let cache_key = (
            postcode.compact(),
            house_number.to_owned(),
            addition.to_owned(),
        );
        if let Some(hit) = self.inner.lookup_cache.get(&cache_key).await {
            tracing::debug!(postcode = %postcode, house_number, "address lookup cache hit");
            return Ok(hit);
        }

        let mut fq = format!(
            "postcode:{} AND huisnummer:{house_number}",
            postcode.compact()
        );
        if !addition.is_empty() {
            fq.push_str(&format!(" AND huisnummer_toevoeging:{addition}"));
        }

        let response = self
            .inner
            .client
            .get(&self.inner.lookup_url)
            .query(&[
                ("fq", fq.as_str()),
                ("rows", "1"),
                (
                    "fl",
                    "straatnaam,huisnummer,huisnummer_toevoeging,postcode,woonplaatsnaam,provincienaam",
                ),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!(status = %status, "address lookup upstream error");
            return Err(LookupError::ServiceError(status.as_u16()));
        }

        let envelope: PdokEnvelope = response.json().await?;
        if envelope.response.num_found == 0 {
            return Err(LookupError::NotFound);
        }
        let doc = envelope
            .response
            .docs
            .into_iter()
            .next()
            .ok_or(LookupError::NotFound)?;

        let resolved = resolve_doc(&doc, &postcode);
        self.inner
            .lookup_cache
            .insert(cache_key, resolved.clone())
            .await;
        tracing::info!(address = %resolved.formatted_address, "address resolved");
        Ok(resolved)
    }

    /// Autocomplete suggestions for a partial address.
    ///
    /// Queries under three characters return an empty list without
    /// calling out, and upstream trouble degrades to an empty list as
    /// well: suggestions are best-effort.
    #[instrument(skip(self))]
    pub async fn suggest(&self, query: &str) -> Vec<Suggestion> {
        let query = query.trim();
        if query.len() < MIN_SUGGEST_QUERY {
            return Vec::new();
        }

        let cache_key = query.to_lowercase();
        if let Some(hit) = self.inner.suggest_cache.get(&cache_key).await {
            return hit;
        }

        match self.fetch_suggestions(query).await {
            Ok(suggestions) => {
                self.inner
                    .suggest_cache
                    .insert(cache_key, suggestions.clone())
                    .await;
                suggestions
            }
            Err(e) => {
                tracing::warn!(error = %e, "address suggestions unavailable");
                Vec::new()
            }
        }
    }

    async fn fetch_suggestions(&self, query: &str) -> Result<Vec<Suggestion>, LookupError> {
        let response = self
            .inner
            .client
            .get(&self.inner.suggest_url)
            .query(&[
                ("q", query),
                ("rows", "10"),
                ("fq", "type:adres"),
                (
                    "fl",
                    "weergavenaam,straatnaam,huisnummer,huisnummer_toevoeging,postcode,woonplaatsnaam,provincienaam",
                ),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::ServiceError(status.as_u16()));
        }

        let envelope: PdokEnvelope = response.json().await?;
        Ok(envelope
            .response
            .docs
            .iter()
            .map(|doc| Suggestion {
                formatted_address: doc.weergavenaam.clone().unwrap_or_default(),
                street: doc.straatnaam.clone().unwrap_or_default(),
                house_number: doc.huisnummer.map(|n| n.to_string()).unwrap_or_default(),
                house_number_addition: doc.huisnummer_toevoeging.clone().unwrap_or_default(),
                postal_code: canonical_postcode(doc.postcode.as_deref()),
                city: doc.woonplaatsnaam.clone().unwrap_or_default(),
                province: doc.provincienaam.clone().unwrap_or_default(),
            })
            .collect())
    }
}

/// Build a resolved address from a directory document, preferring the
/// validated request postcode when the document omits one.
fn resolve_doc(doc: &PdokDoc, requested: &Postcode) -> ResolvedAddress {
    let street = doc.straatnaam.clone().unwrap_or_default();
    let house_number = doc.huisnummer.map(|n| n.to_string()).unwrap_or_default();
    let addition = doc.huisnummer_toevoeging.clone().unwrap_or_default();
    let postal_code = doc
        .postcode
        .as_deref()
        .and_then(|p| Postcode::parse(p).ok())
        .unwrap_or_else(|| requested.clone())
        .to_string();
    let city = doc.woonplaatsnaam.clone().unwrap_or_default();

    let mut street_line = format!("{street} {house_number}");
    if !addition.is_empty() {
        street_line.push(' ');
        street_line.push_str(&addition);
    }
    let formatted_address = format!("{street_line}, {postal_code} {city}");

    ResolvedAddress {
        street,
        house_number,
        house_number_addition: addition,
        postal_code,
        city,
        province: doc.provincienaam.clone().unwrap_or_default(),
        country: "Nederland".to_owned(),
        formatted_address,
    }
}

fn canonical_postcode(raw: Option<&str>) -> String {
    raw.and_then(|p| Postcode::parse(p).ok())
        .map(|p| p.to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> PdokDoc {
        PdokDoc {
            straatnaam: Some("Keizersgracht".to_owned()),
            huisnummer: Some(12),
            huisnummer_toevoeging: Some("B".to_owned()),
            postcode: Some("1015CR".to_owned()),
            woonplaatsnaam: Some("Amsterdam".to_owned()),
            provincienaam: Some("Noord-Holland".to_owned()),
            weergavenaam: None,
        }
    }

    #[test]
    fn resolves_a_directory_document() {
        let requested = Postcode::parse("1015 CR").unwrap();
        let resolved = resolve_doc(&doc(), &requested);
        assert_eq!(resolved.street, "Keizersgracht");
        assert_eq!(resolved.house_number, "12");
        assert_eq!(resolved.postal_code, "1015 CR");
        assert_eq!(
            resolved.formatted_address,
            "Keizersgracht 12 B, 1015 CR Amsterdam"
        );
        assert_eq!(resolved.country, "Nederland");
    }

    #[test]
    fn falls_back_to_the_requested_postcode() {
        let mut d = doc();
        d.postcode = None;
        let requested = Postcode::parse("1015cr").unwrap();
        assert_eq!(resolve_doc(&d, &requested).postal_code, "1015 CR");
    }

    #[test]
    fn envelope_parses_pdok_shape() {
        let json = r#"{
            "response": {
                "numFound": 1,
                "docs": [{
                    "straatnaam": "Keizersgracht",
                    "huisnummer": 12,
                    "postcode": "1015CR",
                    "woonplaatsnaam": "Amsterdam",
                    "provincienaam": "Noord-Holland"
                }]
            }
        }"#;
        let envelope: PdokEnvelope = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.response.num_found, 1);
        assert_eq!(envelope.response.docs.len(), 1);
    }

    #[test]
    fn zero_results_parse_too() {
        let json = r#"{ "response": { "numFound": 0, "docs": [] } }"#;
        let envelope: PdokEnvelope = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.response.num_found, 0);
    }
}
