use super::diagnostics::DiagnosticsLog;
use super::error::{ClientError, ClientResult};
use super::transport::{is_mutating, BasicAuth, Method, Request, Transport};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
/// Floor for mutating requests; LedFx can take a while to swap effects.
pub const DEFAULT_POST_TIMEOUT_SECS: u64 = 60;

/// How a decoded response body proves the call succeeded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Validation {
    /// `"status": "success"`
    Status,
    /// At least one of the listed keys is present.
    AnyOf(&'static [&'static str]),
}

impl Validation {
    pub fn check(&self, data: &Value) -> bool {
        let Some(object) = data.as_object() else {
            return false;
        };

        match self {
            Validation::Status => object.get("status").and_then(Value::as_str) == Some("success"),
            Validation::AnyOf(keys) => keys.iter().any(|key| object.contains_key(*key)),
        }
    }
}

/// Read endpoints polled by the updater.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Config,
    Info,
    Colors,
    Schema,
    Devices,
    Virtuals,
    AudioDevices,
    Scenes,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Config => "config",
            Endpoint::Info => "info",
            Endpoint::Colors => "colors",
            Endpoint::Schema => "schema",
            Endpoint::Devices => "devices",
            Endpoint::Virtuals => "virtuals",
            Endpoint::AudioDevices => "audio/devices",
            Endpoint::Scenes => "scenes",
        }
    }

    pub fn validation(&self) -> Validation {
        match self {
            Endpoint::Config => Validation::AnyOf(&["config", "configuration_version"]),
            Endpoint::Info => Validation::AnyOf(&["url"]),
            Endpoint::Colors => Validation::AnyOf(&["colors"]),
            Endpoint::Schema | Endpoint::AudioDevices => Validation::AnyOf(&["devices"]),
            Endpoint::Devices | Endpoint::Virtuals | Endpoint::Scenes => Validation::Status,
        }
    }
}

fn target(is_virtual: bool) -> &'static str {
    if is_virtual {
        "virtuals"
    } else {
        "devices"
    }
}

#[derive(Debug, Clone)]
pub struct LedFxClient {
    transport: Arc<dyn Transport>,
    base_url: Url,
    host: String,
    port: u16,
    auth: Option<BasicAuth>,
    timeout: Duration,
    diagnostics: Arc<DiagnosticsLog>,
}

impl LedFxClient {
    pub fn new(
        transport: Arc<dyn Transport>,
        host: &str,
        port: u16,
        auth: Option<BasicAuth>,
        timeout: Duration,
    ) -> ClientResult<Self> {
        let host = host.trim_end_matches('/').to_string();
        let base_url = Url::parse(&format!("http://{}:{}/api/", host, port))?;

        tracing::debug!("LedFx client for {}", base_url);

        Ok(Self {
            transport,
            base_url,
            host,
            port,
            auth,
            timeout,
            diagnostics: Arc::new(DiagnosticsLog::new()),
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn diagnostics(&self) -> &DiagnosticsLog {
        &self.diagnostics
    }

    fn timeout_for(&self, method: &Method) -> Duration {
        if is_mutating(method) {
            self.timeout.max(Duration::from_secs(DEFAULT_POST_TIMEOUT_SECS))
        } else {
            self.timeout
        }
    }

    pub async fn request(
        &self,
        path: &str,
        method: Method,
        body: Option<Value>,
        validation: Validation,
    ) -> ClientResult<Value> {
        let url = self.base_url.join(path)?;
        let request = Request {
            method: method.clone(),
            url: url.clone(),
            body,
            timeout: self.timeout_for(&method),
            auth: self.auth.clone(),
        };

        let raw = match self.transport.send(request).await {
            Ok(raw) => raw,
            Err(err) => {
                tracing::debug!("Connection error ({} {}): {}", method, url, err);
                self.diagnostics.record(path, "Connection error", &err.to_string());
                return Err(ClientError::Connection(err.to_string()));
            }
        };

        let data: Value = match serde_json::from_str(&raw) {
            Ok(data) => data,
            Err(err) => {
                tracing::debug!("Invalid JSON ({} {}): {}", method, url, err);
                self.diagnostics.record(path, "Connection error", &raw);
                return Err(ClientError::Connection(format!("invalid JSON from {}: {}", path, err)));
            }
        };

        if !validation.check(&data) {
            let message = match validation {
                Validation::Status => "Invalid status received",
                Validation::AnyOf(_) => "Invalid response received",
            };
            tracing::debug!("{} ({} {}): {}", message, method, url, raw);
            self.diagnostics.record(path, message, &raw);
            return Err(ClientError::Request(format!("{} from {}", message.to_lowercase(), path)));
        }

        tracing::debug!("Successful request ({} {})", method, url);
        self.diagnostics.record(path, "Successful request", &raw);

        Ok(data)
    }

    pub async fn fetch(&self, endpoint: Endpoint) -> ClientResult<Value> {
        self.request(endpoint.path(), Method::GET, None, endpoint.validation()).await
    }

    pub async fn info(&self) -> ClientResult<Value> {
        self.fetch(Endpoint::Info).await
    }

    pub async fn devices(&self) -> ClientResult<Value> {
        self.fetch(Endpoint::Devices).await
    }

    pub async fn virtuals(&self) -> ClientResult<Value> {
        self.fetch(Endpoint::Virtuals).await
    }

    pub async fn scenes(&self) -> ClientResult<Value> {
        self.fetch(Endpoint::Scenes).await
    }

    pub async fn audio_devices(&self) -> ClientResult<Value> {
        self.fetch(Endpoint::AudioDevices).await
    }

    pub async fn schema(&self) -> ClientResult<Value> {
        self.fetch(Endpoint::Schema).await
    }

    pub async fn config(&self) -> ClientResult<Value> {
        self.fetch(Endpoint::Config).await
    }

    pub async fn colors(&self) -> ClientResult<Value> {
        self.fetch(Endpoint::Colors).await
    }

    pub async fn device_on(&self, device_code: &str, effect: &str, is_virtual: bool) -> ClientResult<Value> {
        self.request(
            &format!("{}/{}/effects", target(is_virtual), device_code),
            Method::POST,
            Some(json!({"config": {"active": true}, "type": effect})),
            Validation::Status,
        )
        .await
    }

    pub async fn device_off(&self, device_code: &str, is_virtual: bool) -> ClientResult<Value> {
        self.request(
            &format!("{}/{}/effects", target(is_virtual), device_code),
            Method::DELETE,
            None,
            Validation::Status,
        )
        .await
    }

    pub async fn preset(
        &self,
        device_code: &str,
        category: &str,
        effect: &str,
        preset: &str,
        is_virtual: bool,
    ) -> ClientResult<Value> {
        self.request(
            &format!("{}/{}/presets", target(is_virtual), device_code),
            Method::PUT,
            Some(json!({"category": category, "effect_id": effect, "preset_id": preset})),
            Validation::Status,
        )
        .await
    }

    pub async fn effect(
        &self,
        device_code: &str,
        effect: &str,
        config: &Map<String, Value>,
        is_virtual: bool,
    ) -> ClientResult<Value> {
        self.request(
            &format!("{}/{}/effects", target(is_virtual), device_code),
            Method::PUT,
            Some(json!({"config": config, "type": effect})),
            Validation::Status,
        )
        .await
    }

    /// V1 selects through `audio/devices`, V2 writes the audio section of `config`.
    pub async fn set_audio_device(&self, index: i64, is_v2: bool) -> ClientResult<Value> {
        if is_v2 {
            return self
                .request(
                    "config",
                    Method::PUT,
                    Some(json!({"audio": {"audio_device": index}})),
                    Validation::Status,
                )
                .await;
        }

        self.request("audio/devices", Method::PUT, Some(json!({"index": index})), Validation::Status)
            .await
    }

    pub async fn run_scene(&self, scene_id: &str) -> ClientResult<Value> {
        self.request(
            "scenes",
            Method::PUT,
            Some(json!({"action": "activate", "id": scene_id})),
            Validation::Status,
        )
        .await
    }

    pub async fn toggle_play_pause(&self) -> ClientResult<Value> {
        self.request("virtuals", Method::PUT, Some(json!({})), Validation::Status)
            .await
    }
}
