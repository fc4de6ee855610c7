use super::{Driver, Keyboard, NodeRef, Robot, Supervisor};
use crate::drive::{DriveCommand, NO_KEY};
use crate::error::{ControllerError, Result};
use crate::math::Vec3;
use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::VecDeque;

/// World backed by a simulator that serves its controller API over HTTP.
///
/// | request                          | reply          |
/// |----------------------------------|----------------|
/// | `POST /step` (ms)                | step result    |
/// | `GET /basic-time-step`           | ms             |
/// | `GET /keyboard`                  | `[code, ...]`  |
/// | `POST /driver` (targets)         |                |
/// | `GET /self/position`             | `[x, y, z]`    |
/// | `GET /def/{name}`                | 404 if absent  |
/// | `GET /def/{name}/translation`    | `[x, y, z]`    |
///
/// DEF names travel as a single percent-encoded path segment.
pub struct BridgeWorld {
    base: Url,
    client: reqwest::Client,
    targets: DriverTargets,
    pending_keys: VecDeque<i32>,
    keys_polled: bool,
}

/// Body of `POST /driver`.
#[derive(Debug, Clone, Copy, Serialize)]
struct DriverTargets {
    cruising_speed: f64,
    steering_angle: f64,
}

impl BridgeWorld {
    pub fn new(url: &str) -> Result<BridgeWorld> {
        let base = Url::parse(url).map_err(|err| ControllerError::BridgeUrl {
            url: url.to_owned(),
            reason: err.to_string(),
        })?;
        if base.cannot_be_a_base() {
            return Err(ControllerError::BridgeUrl {
                url: url.to_owned(),
                reason: "not a base URL".to_owned(),
            });
        }

        Ok(BridgeWorld {
            base,
            client: reqwest::Client::new(),
            targets: DriverTargets {
                cruising_speed: 0.0,
                steering_angle: 0.0,
            },
            pending_keys: VecDeque::new(),
            keys_polled: false,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T> {
        let url = self.endpoint(segments);
        let response = self.client.get(url.clone()).send().await?;
        let text = expect_success(&url, response).await?;
        Ok(serde_json::from_str(&text)?)
    }

    async fn post<B: Serialize + ?Sized>(&self, segments: &[&str], body: &B) -> Result<String> {
        let url = self.endpoint(segments);
        let response = self
            .client
            .post(url.clone())
            .body(serde_json::to_string(body)?)
            .send()
            .await?;
        expect_success(&url, response).await
    }

    async fn send_targets(&self) -> Result<()> {
        self.post(&["driver"], &self.targets).await?;
        Ok(())
    }
}

async fn expect_success(url: &Url, response: reqwest::Response) -> Result<String> {
    let status = response.status();
    if !status.is_success() {
        return Err(ControllerError::BridgeStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    Ok(response.text().await?)
}

#[async_trait]
impl Robot for BridgeWorld {
    async fn step(&mut self, time_step_ms: u32) -> Result<i32> {
        let text = self.post(&["step"], &time_step_ms).await?;
        self.pending_keys.clear();
        self.keys_polled = false;
        Ok(serde_json::from_str(&text)?)
    }

    async fn basic_time_step(&mut self) -> Result<u32> {
        self.get(&["basic-time-step"]).await
    }
}

#[async_trait]
impl Keyboard for BridgeWorld {
    async fn get_key(&mut self) -> Result<i32> {
        if !self.keys_polled {
            let codes: Vec<i32> = self.get(&["keyboard"]).await?;
            self.pending_keys.extend(codes);
            self.keys_polled = true;
        }
        Ok(self.pending_keys.pop_front().unwrap_or(NO_KEY))
    }
}

#[async_trait]
impl Driver for BridgeWorld {
    async fn set_cruising_speed(&mut self, speed: f64) -> Result<()> {
        self.targets.cruising_speed = speed;
        self.send_targets().await
    }

    async fn set_steering_angle(&mut self, angle: f64) -> Result<()> {
        self.targets.steering_angle = angle;
        self.send_targets().await
    }

    async fn apply(&mut self, command: DriveCommand) -> Result<()> {
        self.targets = DriverTargets {
            cruising_speed: command.speed,
            steering_angle: command.steering,
        };
        self.send_targets().await
    }

    async fn self_position(&mut self) -> Result<Vec3> {
        self.get(&["self", "position"]).await
    }
}

#[async_trait]
impl Supervisor for BridgeWorld {
    async fn node_from_def(&mut self, def: &str) -> Result<Option<NodeRef>> {
        let url = self.endpoint(&["def", def]);
        let response = self.client.get(url.clone()).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        expect_success(&url, response).await?;
        Ok(Some(NodeRef::new(def)))
    }

    async fn translation(&mut self, node: &NodeRef) -> Result<Vec3> {
        self.get(&["def", node.def(), "translation"]).await
    }
}
