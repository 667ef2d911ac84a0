//! HTTP client for the third-party catalog API.
//!
//! Only two endpoints are used: the paginated public listing and the
//! per-slug detail lookup. Responses are wrapped in a `{"data": ...}` envelope.

mod types;

use std::time::Duration;

use reqwest::{Client, StatusCode, Url};
use thiserror::Error;

use crate::domain::value_objects::ItemKind;

pub(crate) use types::whole_price;
pub use types::{
    BundleGroup, BundleVariant, ImageRef, PageMeta, ProductBundle, ProductCategory, PublicPage,
    PublicQuery, VariantProduct,
};

#[derive(Debug, Error)]
pub enum CatalogApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("catalog API returned status {0}")]
    Status(u16),

    #[error("invalid catalog API base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone)]
pub struct CatalogApiClient {
    client: Client,
    base_url: Url,
}

impl CatalogApiClient {
    /// # Errors
    ///
    /// Returns [`CatalogApiError::Http`] if the `reqwest` client cannot be
    /// built, or [`CatalogApiError::InvalidBaseUrl`] for an unparsable URL.
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, CatalogApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("storefront-api/0.1")
            .build()?;

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| CatalogApiError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self { client, base_url })
    }

    /// Fetches one page of active items.
    ///
    /// # Errors
    ///
    /// Transport failures, non-2xx statuses and unexpected bodies.
    pub async fn list_public(&self, query: &PublicQuery) -> Result<PublicPage, CatalogApiError> {
        let mut url = self.endpoint("api/products/public")?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("page", &query.page.to_string());
            pairs.append_pair("limit", &query.limit.to_string());
            pairs.append_pair("is_active", "true");
            if let Some(category_id) = query.category_id {
                pairs.append_pair("categoryId", &category_id.to_string());
            }
        }

        let body = self.get_json(url).await?.ok_or(CatalogApiError::Status(404))?;
        let envelope: types::PublicListEnvelope =
            serde_json::from_value(body).map_err(|source| CatalogApiError::Deserialize {
                context: format!("products/public(page={})", query.page),
                source,
            })?;
        Ok(envelope.data)
    }

    /// Fetches the unfiltered public listing (first page, upstream defaults).
    ///
    /// # Errors
    ///
    /// Same as [`Self::list_public`].
    pub async fn list_all_public(&self) -> Result<Vec<ProductBundle>, CatalogApiError> {
        let url = self.endpoint("api/products/public")?;
        let body = self.get_json(url).await?.ok_or(CatalogApiError::Status(404))?;
        let envelope: types::PublicListEnvelope =
            serde_json::from_value(body).map_err(|source| CatalogApiError::Deserialize {
                context: "products/public".to_string(),
                source,
            })?;
        Ok(envelope.data.data)
    }

    /// Looks up a product or bundle by slug. `Ok(None)` when the upstream
    /// answers 404 or an empty envelope.
    ///
    /// # Errors
    ///
    /// Transport failures, other non-2xx statuses and unexpected bodies.
    pub async fn find_by_slug(
        &self,
        kind: ItemKind,
        slug: &str,
    ) -> Result<Option<ProductBundle>, CatalogApiError> {
        let mut url = self.endpoint("api/")?;
        url.path_segments_mut()
            .map_err(|()| CatalogApiError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: "cannot be a base".to_string(),
            })?
            .pop_if_empty()
            .push(&format!("{kind}s"))
            .push("slug")
            .push(slug);

        let Some(body) = self.get_json(url).await? else {
            return Ok(None);
        };
        let envelope: types::SingleEnvelope =
            serde_json::from_value(body).map_err(|source| CatalogApiError::Deserialize {
                context: format!("{kind}s/slug/{slug}"),
                source,
            })?;
        Ok(envelope.data)
    }

    fn endpoint(&self, path: &str) -> Result<Url, CatalogApiError> {
        self.base_url
            .join(path)
            .map_err(|e| CatalogApiError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })
    }

    /// GETs a JSON body; `None` on 404.
    async fn get_json(&self, url: Url) -> Result<Option<serde_json::Value>, CatalogApiError> {
        tracing::debug!(%url, "catalog API request");
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(CatalogApiError::Status(status.as_u16()));
        }
        Ok(Some(response.json().await?))
    }
}
