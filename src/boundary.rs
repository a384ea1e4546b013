//! Process-lifetime cache over the district boundary dataset.
//!
//! The feature collection is fetched at most once, guarded so concurrent
//! district selections share a single in-flight load. A failed fetch or
//! parse caches "no boundary layer" and every later highlight degrades to
//! `None` without retrying.

use crate::normalize::normalize;
use async_trait::async_trait;
use geojson::{Feature, FeatureCollection, GeoJson};
use std::path::PathBuf;
use thiserror::Error;
use tokio::sync::OnceCell;

/// Feature properties inspected, in order, for a district name.
const NAME_PROPERTIES: &[&str] = &["NAME_2", "NAME_1", "DISTRICT", "district", "name"];

#[derive(Debug, Error)]
pub enum BoundaryError {
    #[error("boundary fetch failed: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("boundary fetch returned HTTP {0}")]
    Status(u16),

    #[error("boundary file unreadable: {0}")]
    Io(#[from] std::io::Error),

    #[error("boundary dataset is not valid GeoJSON: {0}")]
    Parse(#[from] geojson::Error),

    #[error("boundary dataset is not a feature collection")]
    NotACollection,

    #[error("boundary layer disabled")]
    Disabled,
}

/// Where the boundary dataset comes from.
#[async_trait]
pub trait BoundaryLoader: Send + Sync {
    async fn load(&self) -> Result<FeatureCollection, BoundaryError>;
}

/// HTTP-served dataset.
pub struct HttpBoundaryLoader {
    client: reqwest::Client,
    url: String,
}

impl HttpBoundaryLoader {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self { client, url: url.into() }
    }
}

#[async_trait]
impl BoundaryLoader for HttpBoundaryLoader {
    async fn load(&self) -> Result<FeatureCollection, BoundaryError> {
        let resp = self.client.get(&self.url).send().await?;
        if !resp.status().is_success() {
            return Err(BoundaryError::Status(resp.status().as_u16()));
        }
        let text = resp.text().await?;
        parse_collection(&text)
    }
}

/// Dataset shipped as a static file next to the deployment.
pub struct FileBoundaryLoader {
    path: PathBuf,
}

impl FileBoundaryLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl BoundaryLoader for FileBoundaryLoader {
    async fn load(&self) -> Result<FeatureCollection, BoundaryError> {
        let text = tokio::fs::read_to_string(&self.path).await?;
        parse_collection(&text)
    }
}

/// Loader used when the boundary layer is turned off entirely.
pub struct DisabledBoundaryLoader;

#[async_trait]
impl BoundaryLoader for DisabledBoundaryLoader {
    async fn load(&self) -> Result<FeatureCollection, BoundaryError> {
        Err(BoundaryError::Disabled)
    }
}

fn parse_collection(text: &str) -> Result<FeatureCollection, BoundaryError> {
    match text.parse::<GeoJson>()? {
        GeoJson::FeatureCollection(fc) => Ok(fc),
        _ => Err(BoundaryError::NotACollection),
    }
}

/// The write-once cache itself. Constructed once at engine start; no
/// ambient globals.
pub struct BoundaryCache {
    loader: Box<dyn BoundaryLoader>,
    features: OnceCell<Option<Vec<Feature>>>,
}

impl BoundaryCache {
    pub fn new(loader: Box<dyn BoundaryLoader>) -> Self {
        Self {
            loader,
            features: OnceCell::new(),
        }
    }

    /// Whether a successfully loaded layer is present. False both before
    /// the first fetch and after a failed one.
    pub fn layer_available(&self) -> bool {
        matches!(self.features.get(), Some(Some(_)))
    }

    /// True once a load attempt (successful or not) has completed.
    pub fn load_attempted(&self) -> bool {
        self.features.get().is_some()
    }

    /// Find the boundary feature for a district, fetching the dataset on
    /// first need. `None` means no highlight — never an error.
    pub async fn highlight(&self, district: &str) -> Option<Feature> {
        let features = self
            .features
            .get_or_init(|| async {
                match self.loader.load().await {
                    Ok(fc) => {
                        tracing::debug!("boundary dataset loaded: {} features", fc.features.len());
                        Some(fc.features)
                    }
                    Err(e) => {
                        tracing::warn!("boundary dataset unavailable: {e}");
                        None
                    }
                }
            })
            .await;

        let features = features.as_ref()?;
        let target = normalize(district);
        features
            .iter()
            .find(|feature| candidate_names(feature).any(|name| normalize(name) == target))
            .cloned()
    }
}

/// Candidate name properties on a feature, in precedence order.
fn candidate_names<'a>(feature: &'a Feature) -> impl Iterator<Item = &'a str> + 'a {
    NAME_PROPERTIES.iter().filter_map(|key| {
        feature
            .properties
            .as_ref()
            .and_then(|props| props.get(*key))
            .and_then(|value| value.as_str())
    })
}
