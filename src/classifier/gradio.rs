use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use serde::Deserialize;
use serde_json::{json, Value};

use super::sse::{SseDecoder, SseEvent};
use super::{ClassifyError, Classifier, ImagePayload};
use crate::config::ServiceConfig;

#[derive(Deserialize)]
struct AppConfig {
    #[serde(default)]
    api_prefix: Option<String>,
}

#[derive(Deserialize)]
struct QueuedCall {
    event_id: String,
}

/// Client for a Gradio app exposing an image -> label route.
pub struct GradioClient {
    http: reqwest::Client,
    root: String,
    route: String,
    token: Option<String>,
}

/// `owner/name` -> `https://owner-name.hf.space`
pub fn space_root(space: &str) -> String {
    let host: String = space
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if matches!(c, '/' | '_' | '.') { '-' } else { c })
        .collect();
    format!("https://{host}.hf.space")
}

impl GradioClient {
    pub fn new(
        service: &ServiceConfig,
        timeout: Option<Duration>,
    ) -> Result<Self, ClassifyError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let root = match &service.base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => space_root(&service.space),
        };
        let route = format!("/{}", service.route.trim_start_matches('/'));
        log::info!("Classification endpoint: {root} route {route}");

        Ok(Self {
            http: builder.build()?,
            root,
            route,
            token: service.token().map(str::to_string),
        })
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn api_prefix(&self) -> Result<String, ClassifyError> {
        let resp = self
            .authorize(self.http.get(format!("{}/config", self.root)))
            .send()
            .await?;
        let config: AppConfig = check(resp).await?.json().await?;
        Ok(config.api_prefix.unwrap_or_default())
    }

    async fn upload(&self, api: &str, image: &ImagePayload) -> Result<String, ClassifyError> {
        let part = reqwest::multipart::Part::bytes(image.bytes.clone())
            .file_name(image.file_name.clone())
            .mime_str(&image.mime_type)?;
        let form = reqwest::multipart::Form::new().part("files", part);

        let resp = self
            .authorize(self.http.post(format!("{api}/upload")))
            .multipart(form)
            .send()
            .await?;
        let paths: Vec<String> = check(resp).await?.json().await?;
        paths
            .into_iter()
            .next()
            .ok_or_else(|| ClassifyError::Malformed("upload returned no file path".into()))
    }

    async fn queue(
        &self,
        api: &str,
        path: String,
        image: &ImagePayload,
    ) -> Result<String, ClassifyError> {
        let body = json!({
            "data": [{
                "path": path,
                "orig_name": image.file_name,
                "mime_type": image.mime_type,
                "meta": { "_type": "gradio.FileData" },
            }]
        });
        let resp = self
            .authorize(self.http.post(format!("{api}/call{}", self.route)))
            .json(&body)
            .send()
            .await?;
        let call: QueuedCall = check(resp).await?.json().await?;
        Ok(call.event_id)
    }

    async fn await_result(&self, api: &str, event_id: &str) -> Result<Vec<Value>, ClassifyError> {
        let resp = self
            .authorize(
                self.http
                    .get(format!("{api}/call{}/{event_id}", self.route)),
            )
            .send()
            .await?;
        let mut stream = check(resp).await?.bytes_stream();
        let mut decoder = SseDecoder::new();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            for event in decoder.push(&chunk) {
                if let Some(result) = interpret(event) {
                    return result;
                }
            }
        }
        if let Some(result) = decoder.finish().and_then(interpret) {
            return result;
        }
        Err(ClassifyError::Malformed(
            "event stream ended without a result".into(),
        ))
    }
}

#[async_trait]
impl Classifier for GradioClient {
    async fn classify(&self, image: &ImagePayload) -> Result<Vec<Value>, ClassifyError> {
        let prefix = self.api_prefix().await?;
        let api = format!("{}{}", self.root, prefix.trim_end_matches('/'));

        let path = self.upload(&api, image).await?;
        log::debug!("Uploaded {} as {path}", image.file_name);
        let event_id = self.queue(&api, path, image).await?;
        log::debug!("Queued prediction {event_id}");
        self.await_result(&api, &event_id).await
    }
}

/// Reject non-2xx responses, keeping the body text for the message.
async fn check(resp: reqwest::Response) -> Result<reqwest::Response, ClassifyError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let url = resp.url().clone();
    let text = resp.text().await.unwrap_or_default();
    Err(ClassifyError::Transport(format!(
        "{url} returned {status}: {text}"
    )))
}

/// Map a stream event to a final outcome; `None` means keep reading.
fn interpret(event: SseEvent) -> Option<Result<Vec<Value>, ClassifyError>> {
    match event.event.as_str() {
        "complete" => Some(
            serde_json::from_str::<Vec<Value>>(&event.data).map_err(ClassifyError::from),
        ),
        "error" => Some(Err(ClassifyError::Transport(format!(
            "service reported an error: {}",
            event.data
        )))),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_space_root_from_space_id() {
        assert_eq!(
            space_root("srijonashraf/maize-leaf-disease-detection"),
            "https://srijonashraf-maize-leaf-disease-detection.hf.space"
        );
        assert_eq!(space_root("Some_User/my.App"), "https://some-user-my-app.hf.space");
    }

    #[test]
    fn test_client_normalises_root_and_route() {
        let service = ServiceConfig {
            base_url: Some("http://localhost:7860/".into()),
            route: "predict".into(),
            ..ServiceConfig::default()
        };
        let client = GradioClient::new(&service, None).unwrap();
        assert_eq!(client.root, "http://localhost:7860");
        assert_eq!(client.route, "/predict");
        assert!(client.token.is_none());
    }

    #[test]
    fn test_client_falls_back_to_environment_token() {
        let service = ServiceConfig {
            env_token: Some("hf_env".into()),
            ..ServiceConfig::default()
        };
        let client = GradioClient::new(&service, None).unwrap();
        assert_eq!(client.token.as_deref(), Some("hf_env"));
    }

    #[test]
    fn test_complete_event_yields_predictions() {
        let event = SseEvent {
            event: "complete".into(),
            data: r#"[{"label": "Corn___Common_Rust", "confidences": []}]"#.into(),
        };
        let predictions = interpret(event).unwrap().unwrap();
        assert_eq!(predictions[0]["label"], "Corn___Common_Rust");
    }

    #[test]
    fn test_error_and_garbage_events() {
        let error = SseEvent {
            event: "error".into(),
            data: "null".into(),
        };
        assert!(matches!(
            interpret(error),
            Some(Err(ClassifyError::Transport(_)))
        ));

        let garbage = SseEvent {
            event: "complete".into(),
            data: "not json".into(),
        };
        assert!(matches!(
            interpret(garbage),
            Some(Err(ClassifyError::Malformed(_)))
        ));

        let heartbeat = SseEvent {
            event: "heartbeat".into(),
            data: "null".into(),
        };
        assert!(interpret(heartbeat).is_none());
    }

    #[tokio::test]
    async fn test_unreachable_service_is_transport_error() {
        // Bind a loopback port, then close it so nothing is listening there.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let service = ServiceConfig {
            base_url: Some(format!("http://{addr}")),
            ..ServiceConfig::default()
        };
        let client = GradioClient::new(&service, Some(Duration::from_secs(5))).unwrap();
        let image = ImagePayload {
            bytes: vec![1, 2, 3],
            mime_type: "image/png".into(),
            file_name: "leaf.png".into(),
        };
        let err = client.classify(&image).await.unwrap_err();
        assert!(matches!(err, ClassifyError::Transport(_)));
    }
}
