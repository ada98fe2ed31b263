use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use kachow_core::{KachowError, MetricsConfig, MetricsRecord, MetricsSource, ProjectMetrics, QualityGate};
use serde::Deserialize;
use tracing::debug;

/// Measures requested for a single file.
pub const FILE_METRIC_KEYS: &[&str] = &[
    "bugs",
    "vulnerabilities",
    "code_smells",
    "coverage",
    "security_hotspots_reviewed",
    "duplicated_lines_density",
];

/// Measures requested for the whole project.
pub const PROJECT_METRIC_KEYS: &[&str] = &[
    "bugs",
    "vulnerabilities",
    "code_smells",
    "coverage",
    "alert_status",
    "security_rating",
    "reliability_rating",
    "sqale_rating",
    "security_hotspots",
    "duplicated_lines_density",
];

#[derive(Debug, Deserialize)]
struct MeasuresResponse {
    #[serde(default)]
    component: Option<Component>,
}

#[derive(Debug, Deserialize)]
struct Component {
    #[serde(default)]
    measures: Vec<Measure>,
}

#[derive(Debug, Deserialize)]
struct Measure {
    metric: String,
    #[serde(default)]
    value: Option<String>,
}

impl Measures {
    fn from_response(response: MeasuresResponse) -> Self {
        let measures = response
            .component
            .map(|c| c.measures)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|m| m.value.map(|v| (m.metric, v)))
            .collect();
        Self(measures)
    }
}

/// Raw measure values keyed by metric name, as returned by
/// `/api/measures/component`.
///
/// Values arrive as strings. Accessors parse them and fall back to a default
/// when a measure is missing or malformed, so callers always get a complete
/// record.
///
/// # Examples
///
/// ```
/// use kachow_metrics::sonar::Measures;
///
/// let body = r#"{"component":{"measures":[
///     {"metric":"bugs","value":"2"},
///     {"metric":"coverage","value":"81.5"}
/// ]}}"#;
/// let measures = Measures::from_json(body).unwrap();
/// assert_eq!(measures.count("bugs"), 2);
/// assert_eq!(measures.ratio("coverage", 100.0), 81.5);
/// assert_eq!(measures.count("vulnerabilities"), 0);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Measures(HashMap<String, String>);

impl Measures {
    /// Parse a measures response body.
    ///
    /// # Errors
    ///
    /// Returns [`KachowError::Metrics`] if the body is not a measures document.
    pub fn from_json(body: &str) -> Result<Self, KachowError> {
        let response: MeasuresResponse = serde_json::from_str(body)
            .map_err(|e| KachowError::Metrics(format!("failed to parse measures: {e}")))?;
        Ok(Self::from_response(response))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// An integer counter, 0 when absent. Fractional values are truncated.
    pub fn count(&self, key: &str) -> u32 {
        self.get(key)
            .and_then(|v| {
                v.parse::<u32>()
                    .ok()
                    .or_else(|| v.parse::<f64>().ok().map(|f| f.max(0.0) as u32))
            })
            .unwrap_or(0)
    }

    /// A floating-point measure, `default` when absent or malformed.
    pub fn ratio(&self, key: &str, default: f64) -> f64 {
        self.get(key)
            .and_then(|v| v.parse::<f64>().ok())
            .unwrap_or(default)
    }

    /// Per-file record; the quality gate is derived locally from the counters.
    pub fn file_record(&self) -> MetricsRecord {
        MetricsRecord::from_counts(
            self.count("bugs"),
            self.count("vulnerabilities"),
            self.count("code_smells"),
            self.ratio("coverage", 100.0),
            self.ratio("security_hotspots_reviewed", 100.0),
            self.ratio("duplicated_lines_density", 0.0),
        )
    }

    /// Project record; the quality gate comes from the server's `alert_status`.
    pub fn project_record(&self) -> ProjectMetrics {
        let quality_gate = self
            .get("alert_status")
            .and_then(|s| s.parse::<QualityGate>().ok())
            .unwrap_or_default();

        ProjectMetrics {
            bugs: self.count("bugs"),
            vulnerabilities: self.count("vulnerabilities"),
            code_smells: self.count("code_smells"),
            coverage: self.ratio("coverage", 100.0),
            duplicated_lines_density: self.ratio("duplicated_lines_density", 0.0),
            security_rating: self.ratio("security_rating", 1.0),
            reliability_rating: self.ratio("reliability_rating", 1.0),
            maintainability_rating: self.ratio("sqale_rating", 1.0),
            security_hotspots: self.count("security_hotspots"),
            quality_gate,
        }
    }
}

/// SonarQube web API client.
///
/// Reads measures from `{base_url}/api/measures/component`. Files are
/// addressed as `"{project_key}:{relative_path}"`. The user token, if any,
/// is sent as the basic-auth user name with an empty password.
///
/// # Examples
///
/// ```
/// use kachow_core::MetricsConfig;
/// use kachow_metrics::sonar::SonarClient;
///
/// let config = MetricsConfig {
///     base_url: "http://sonar.internal:9000/".into(),
///     ..MetricsConfig::default()
/// };
/// let client = SonarClient::new(&config).unwrap();
/// assert_eq!(client.base_url(), "http://sonar.internal:9000");
/// ```
pub struct SonarClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl SonarClient {
    /// Create a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`KachowError::Metrics`] if the HTTP client cannot be built.
    pub fn new(config: &MetricsConfig) -> Result<Self, KachowError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| KachowError::Metrics(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone().filter(|t| !t.is_empty()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the given measures for one component.
    ///
    /// # Errors
    ///
    /// Returns [`KachowError::Metrics`] on transport errors, non-success
    /// statuses and unparseable bodies.
    pub async fn measures(&self, component: &str, keys: &[&str]) -> Result<Measures, KachowError> {
        let url = format!("{}/api/measures/component", self.base_url);
        let metric_keys = keys.join(",");

        let mut request = self
            .client
            .get(&url)
            .query(&[("component", component), ("metricKeys", metric_keys.as_str())]);
        if let Some(token) = &self.token {
            request = request.basic_auth(token, Some(""));
        }

        let response = request
            .send()
            .await
            .map_err(|e| KachowError::Metrics(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(KachowError::Metrics(format!(
                "sonar API error {status} for {component}: {body_text}"
            )));
        }

        let response = response
            .json::<MeasuresResponse>()
            .await
            .map_err(|e| KachowError::Metrics(format!("failed to parse measures: {e}")))?;
        let measures = Measures::from_response(response);
        debug!(component, measures = measures.0.len(), "fetched sonar measures");
        Ok(measures)
    }
}

#[async_trait]
impl MetricsSource for SonarClient {
    fn name(&self) -> &'static str {
        "sonar"
    }

    async fn file_metrics(
        &self,
        relative_path: &str,
        project_key: &str,
    ) -> Result<MetricsRecord, KachowError> {
        let component = format!("{project_key}:{relative_path}");
        let measures = self.measures(&component, FILE_METRIC_KEYS).await?;
        Ok(measures.file_record())
    }

    async fn project_metrics(&self, project_key: &str) -> Result<ProjectMetrics, KachowError> {
        let measures = self.measures(project_key, PROJECT_METRIC_KEYS).await?;
        Ok(measures.project_record())
    }
}
