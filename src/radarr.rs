//! Radarr v3 HTTP client.
//!
//! Implements the `Catalog` capability plus the setup-time calls (status,
//! root folders, quality profiles). All calls are blocking; the import loop is
//! strictly sequential so nothing here needs to be shared across threads.
use crate::catalog::{AddOptions, CandidateMovie, Catalog, LibrarySnapshot};
use crate::error::CatalogError;
use crate::util::truncate_string;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::time::{Duration, Instant};
use ureq::http::Response;
use ureq::{Agent, Body};

const API_KEY_HEADER: &str = "X-Api-Key";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
/// Large libraries return tens of megabytes from `/api/v3/movie`.
const MAX_BODY_BYTES: u64 = 512 * 1024 * 1024;
const ERROR_BODY_PREVIEW_BYTES: usize = 200;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemStatus {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub os_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RootFolder {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub free_space: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QualityProfile {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LibraryMovie {
    #[serde(default)]
    tmdb_id: Option<u64>,
}

pub struct RadarrClient {
    agent: Agent,
    base_url: String,
    api_key: String,
}

impl RadarrClient {
    /// `base_url` is expected to be normalized (no trailing slash).
    pub fn new(base_url: &str, api_key: &str) -> Self {
        let config = Agent::config_builder()
            .timeout_global(Some(REQUEST_TIMEOUT))
            .http_status_as_error(false)
            .build();
        Self {
            agent: Agent::new_with_config(config),
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
        }
    }

    pub fn system_status(&self) -> Result<SystemStatus, CatalogError> {
        self.get_json("/api/v3/system/status", &[])
    }

    /// Root folders sorted by path.
    pub fn root_folders(&self) -> Result<Vec<RootFolder>, CatalogError> {
        let mut roots: Vec<RootFolder> = self.get_json("/api/v3/rootfolder", &[])?;
        roots.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(roots)
    }

    /// Quality profiles sorted by name.
    pub fn quality_profiles(&self) -> Result<Vec<QualityProfile>, CatalogError> {
        let mut profiles: Vec<QualityProfile> = self.get_json("/api/v3/qualityprofile", &[])?;
        profiles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(profiles)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, CatalogError> {
        let start = Instant::now();
        let mut request = self
            .agent
            .get(&self.url(path))
            .header(API_KEY_HEADER, self.api_key.as_str());
        for (key, value) in query {
            request = request.query(*key, *value);
        }
        let mut response = request.call().map_err(transport_error)?;
        let status = check_status(&mut response)?;
        let parsed = response
            .body_mut()
            .with_config()
            .limit(MAX_BODY_BYTES)
            .read_json::<T>()
            .map_err(|err| CatalogError::Decode(err.to_string()))?;
        tracing::debug!(
            path,
            status,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "radarr request complete"
        );
        Ok(parsed)
    }
}

impl Catalog for RadarrClient {
    fn lookup(&self, title: &str) -> Result<Vec<CandidateMovie>, CatalogError> {
        let results: Vec<Value> = self.get_json("/api/v3/movie/lookup", &[("term", title)])?;
        let total = results.len();
        let candidates: Vec<CandidateMovie> = results
            .into_iter()
            .filter_map(CandidateMovie::from_lookup)
            .collect();
        if candidates.len() < total {
            tracing::debug!(
                title,
                dropped = total - candidates.len(),
                "lookup results missing tmdbId"
            );
        }
        Ok(candidates)
    }

    fn library_snapshot(&self) -> Result<LibrarySnapshot, CatalogError> {
        let movies: Vec<LibraryMovie> = self.get_json("/api/v3/movie", &[])?;
        Ok(movies
            .into_iter()
            .filter_map(|movie| movie.tmdb_id)
            .filter(|id| *id > 0)
            .collect())
    }

    fn add_movie(
        &self,
        candidate: &CandidateMovie,
        options: &AddOptions,
    ) -> Result<(), CatalogError> {
        let payload = add_payload(candidate, options);
        let mut response = self
            .agent
            .post(&self.url("/api/v3/movie"))
            .header(API_KEY_HEADER, self.api_key.as_str())
            .send_json(&payload)
            .map_err(transport_error)?;
        let status = response.status().as_u16();
        match status {
            200 | 201 => Ok(()),
            401 => Err(CatalogError::Unauthorized),
            _ => Err(CatalogError::Status {
                status,
                body: body_preview(&mut response),
            }),
        }
    }
}

/// Lookup record plus placement options, as Radarr expects on `POST /movie`.
fn add_payload(candidate: &CandidateMovie, options: &AddOptions) -> Value {
    let mut payload = match &candidate.raw {
        Value::Object(map) => map.clone(),
        _ => {
            let mut map = Map::new();
            map.insert("title".to_string(), json!(candidate.title));
            map.insert("year".to_string(), json!(candidate.year));
            map.insert("tmdbId".to_string(), json!(candidate.catalog_id));
            map
        }
    };
    payload.insert(
        "qualityProfileId".to_string(),
        json!(options.quality_profile_id),
    );
    payload.insert("rootFolderPath".to_string(), json!(options.root_folder));
    payload.insert("monitored".to_string(), json!(options.monitored));
    payload.insert(
        "addOptions".to_string(),
        json!({ "searchForMovie": options.search_on_add }),
    );
    Value::Object(payload)
}

fn check_status(response: &mut Response<Body>) -> Result<u16, CatalogError> {
    let status = response.status().as_u16();
    if status == 401 {
        return Err(CatalogError::Unauthorized);
    }
    if !response.status().is_success() {
        return Err(CatalogError::Status {
            status,
            body: body_preview(response),
        });
    }
    Ok(status)
}

fn body_preview(response: &mut Response<Body>) -> String {
    let text = response.body_mut().read_to_string().unwrap_or_default();
    truncate_string(text.trim(), ERROR_BODY_PREVIEW_BYTES)
}

fn transport_error(err: ureq::Error) -> CatalogError {
    CatalogError::Transport(err.to_string())
}
