use std::env;
use std::time::Duration;

use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::classifier::Label;
use crate::error::{DetectError, Result};
use crate::model::{ModelProbe, ModelStatus, ModelVersion};

/// Something that turns raw image bytes into detection labels. The real
/// implementation talks to the managed recognition service; tests script it.
pub trait LabelSource {
    fn detect_labels(&self, image: &[u8]) -> Result<Vec<Label>>;
}

/// Client configuration, usually read from the environment.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Base URL of the recognition endpoint
    pub endpoint: String,

    /// Custom-model identifier; falls back to generic label detection when unset
    pub model_arn: Option<String>,

    pub max_labels: u32,
    pub min_confidence: f64,
}

pub const ENDPOINT_VAR: &str = "COURT_DETECT_ENDPOINT";
pub const MODEL_ARN_VAR: &str = "COURT_MODEL_ARN";

impl ProviderConfig {
    pub fn new(endpoint: &str) -> Self {
        ProviderConfig {
            endpoint: endpoint.trim_end_matches('/').to_owned(),
            model_arn: None,
            max_labels: 50,
            min_confidence: 40.0,
        }
    }

    pub fn with_model_arn(mut self, arn: &str) -> Self {
        self.model_arn = Some(arn.to_owned());
        self
    }

    /// Read `COURT_DETECT_ENDPOINT` (required) and `COURT_MODEL_ARN`
    /// (optional) from the environment.
    pub fn from_env() -> Result<Self> {
        let endpoint = env::var(ENDPOINT_VAR).map_err(|_| {
            DetectError::ProviderUnavailable(format!("variável {} não configurada", ENDPOINT_VAR))
        })?;

        let mut config = ProviderConfig::new(&endpoint);
        if let Ok(arn) = env::var(MODEL_ARN_VAR) {
            config.model_arn = Some(arn);
        }

        Ok(config)
    }
}

/// Blocking REST client for a Rekognition-style recognition service.
pub struct RekognitionClient {
    http: reqwest::blocking::Client,
    config: ProviderConfig,
}

#[derive(Serialize)]
struct ImagePayload {
    #[serde(rename = "Bytes")]
    bytes: String,
}

#[derive(Serialize)]
struct DetectLabelsRequest {
    #[serde(rename = "Image")]
    image: ImagePayload,
    #[serde(rename = "MaxLabels")]
    max_labels: u32,
    #[serde(rename = "MinConfidence")]
    min_confidence: f64,
}

#[derive(Serialize)]
struct DetectCustomLabelsRequest {
    #[serde(rename = "ProjectVersionArn")]
    project_version_arn: String,
    #[serde(rename = "Image")]
    image: ImagePayload,
    #[serde(rename = "MinConfidence")]
    min_confidence: f64,
}

#[derive(Deserialize)]
struct DetectLabelsResponse {
    #[serde(rename = "Labels", default)]
    labels: Vec<WireLabel>,
    #[serde(rename = "CustomLabels", default)]
    custom_labels: Vec<WireLabel>,
}

#[derive(Deserialize)]
struct WireLabel {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Confidence")]
    confidence: f64,
}

#[derive(Serialize)]
struct DescribeVersionsRequest {
    #[serde(rename = "ProjectArn")]
    project_arn: String,
}

#[derive(Deserialize)]
struct DescribeVersionsResponse {
    #[serde(rename = "ProjectVersionDescriptions", default)]
    versions: Vec<WireVersion>,
}

#[derive(Deserialize)]
struct WireVersion {
    #[serde(rename = "ProjectVersionArn")]
    arn: String,
    #[serde(rename = "Status")]
    status: ModelStatus,
}

#[derive(Serialize)]
struct StartVersionRequest {
    #[serde(rename = "ProjectVersionArn")]
    project_version_arn: String,
    #[serde(rename = "MinInferenceUnits")]
    min_inference_units: u32,
}

/// The project identifier is the model identifier up to its version part.
fn project_arn(model_arn: &str) -> &str {
    match model_arn.find("/version/") {
        Some(idx) => &model_arn[..idx],
        None => model_arn,
    }
}

impl RekognitionClient {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(RekognitionClient { http, config })
    }

    pub fn from_env() -> Result<Self> {
        RekognitionClient::new(ProviderConfig::from_env()?)
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn post<B: Serialize, R: DeserializeOwned>(&self, action: &str, body: &B) -> Result<R> {
        let url = format!("{}/{}", self.config.endpoint, action);
        debug!("POST {}", url);

        let resp = self.http.post(&url).json(body).send()?;
        let status = resp.status();

        if !status.is_success() {
            let text = resp.text().unwrap_or_default();
            if text.contains("ResourceNotReadyException") {
                return Err(DetectError::ModelNotReady(text));
            }
            return Err(DetectError::ProviderUnavailable(format!(
                "{}: {}",
                status, text
            )));
        }

        Ok(resp.json()?)
    }

    /// List every version of the configured model's project.
    pub fn describe_versions(&self) -> Result<Vec<ModelVersion>> {
        let arn = self.require_model_arn()?;
        let request = DescribeVersionsRequest {
            project_arn: project_arn(arn).to_owned(),
        };

        let response: DescribeVersionsResponse =
            self.post("describe-project-versions", &request)?;

        Ok(response
            .versions
            .into_iter()
            .map(|v| ModelVersion {
                arn: v.arn,
                status: v.status,
            })
            .collect())
    }

    fn require_model_arn(&self) -> Result<&String> {
        self.config.model_arn.as_ref().ok_or_else(|| {
            DetectError::ModelNotReady("nenhum modelo customizado configurado".to_owned())
        })
    }
}

impl LabelSource for RekognitionClient {
    fn detect_labels(&self, image: &[u8]) -> Result<Vec<Label>> {
        let payload = ImagePayload {
            bytes: base64::encode(image),
        };

        let response: DetectLabelsResponse = match &self.config.model_arn {
            Some(arn) => self.post(
                "detect-custom-labels",
                &DetectCustomLabelsRequest {
                    project_version_arn: arn.clone(),
                    image: payload,
                    min_confidence: self.config.min_confidence,
                },
            )?,
            None => self.post(
                "detect-labels",
                &DetectLabelsRequest {
                    image: payload,
                    max_labels: self.config.max_labels,
                    min_confidence: self.config.min_confidence,
                },
            )?,
        };

        let wire = if response.custom_labels.is_empty() {
            response.labels
        } else {
            response.custom_labels
        };

        Ok(wire
            .into_iter()
            .map(|l| Label {
                name: l.name,
                confidence: l.confidence,
            })
            .collect())
    }
}

impl ModelProbe for RekognitionClient {
    fn status(&self) -> Result<ModelStatus> {
        let arn = self.require_model_arn()?.clone();
        let versions = self.describe_versions()?;

        versions
            .into_iter()
            .find(|v| v.arn == arn)
            .map(|v| v.status)
            .ok_or_else(|| DetectError::ModelNotReady("versão do modelo não encontrada".to_owned()))
    }

    fn start(&self) -> Result<()> {
        let arn = self.require_model_arn()?.clone();
        let request = StartVersionRequest {
            project_version_arn: arn,
            min_inference_units: 1,
        };

        let _: serde_json::Value = self.post("start-project-version", &request)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_request_uses_the_provider_field_names() {
        let request = DetectLabelsRequest {
            image: ImagePayload {
                bytes: "aGk=".to_owned(),
            },
            max_labels: 50,
            min_confidence: 40.0,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["Image"]["Bytes"], "aGk=");
        assert_eq!(json["MaxLabels"], 50);
        assert_eq!(json["MinConfidence"], 40.0);
    }

    #[test]
    fn response_parses_generic_labels() {
        let raw = r#"{"Labels":[{"Name":"Grass","Confidence":93.4}]}"#;
        let response: DetectLabelsResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(response.labels.len(), 1);
        assert_eq!(response.labels[0].name, "Grass");
        assert!(response.custom_labels.is_empty());
    }

    #[test]
    fn response_parses_custom_labels() {
        let raw = r#"{"CustomLabels":[{"Name":"saibro","Confidence":71.2}]}"#;
        let response: DetectLabelsResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(response.custom_labels.len(), 1);
        assert_eq!(response.custom_labels[0].confidence, 71.2);
    }

    #[test]
    fn project_arn_strips_the_version_suffix() {
        let arn = "arn:aws:rekognition:us-east-1:1:project/courts/version/courts.1/123";
        assert_eq!(
            project_arn(arn),
            "arn:aws:rekognition:us-east-1:1:project/courts"
        );
        assert_eq!(project_arn("no-version-here"), "no-version-here");
    }

    #[test]
    fn config_normalizes_the_endpoint() {
        let config = ProviderConfig::new("https://api.example.com/");
        assert_eq!(config.endpoint, "https://api.example.com");
        assert_eq!(config.max_labels, 50);
        assert_eq!(config.min_confidence, 40.0);
    }
}
