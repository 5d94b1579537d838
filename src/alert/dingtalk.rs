// DingTalk robot webhook. Signed requests carry `timestamp` (ms) and `sign` query parameters,
// where sign = base64(HMAC-SHA256(secret, "{timestamp}\n{secret}")).

use super::{DeliveryError, Notifier};
use crate::models::Alert;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::json;
use sha2::Sha256;
use std::time::Duration;
use tracing::warn;

type HmacSha256 = Hmac<Sha256>;

/// Max bytes of a rejected response body kept in the error.
const ERROR_BODY_LIMIT: usize = 512;

pub struct DingTalkNotifier {
    webhook_url: String,
    secret: Option<String>,
    client: reqwest::Client,
}

/// Robot API reply; `errcode` 0 means accepted.
#[derive(Debug, Deserialize)]
struct RobotReply {
    #[serde(default)]
    errcode: i64,
    #[serde(default)]
    errmsg: String,
}

impl DingTalkNotifier {
    pub fn new(
        webhook_url: String,
        secret: Option<String>,
        timeout: Duration,
    ) -> Result<Self, DeliveryError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(DeliveryError::Transport)?;
        Ok(Self {
            webhook_url,
            secret: secret.filter(|s| !s.is_empty()),
            client,
        })
    }

    pub fn webhook_url(&self) -> &str {
        &self.webhook_url
    }
}

impl Notifier for DingTalkNotifier {
    async fn notify(&self, alert: &Alert) -> Result<(), DeliveryError> {
        let payload = json!({
            "msgtype": "text",
            "text": { "content": &alert.message },
        });

        let mut request = self.client.post(&self.webhook_url).json(&payload);
        if let Some(secret) = &self.secret {
            let timestamp = alert.timestamp.timestamp_millis();
            let signature = sign(secret, timestamp)?;
            request = request.query(&[("timestamp", timestamp.to_string()), ("sign", signature)]);
        }

        let response = request.send().await.map_err(DeliveryError::Transport)?;
        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            // errcode cannot be checked without the body
            Err(e) if status.is_success() => return Err(DeliveryError::Transport(e)),
            Err(e) => {
                warn!(error = %e, status = status.as_u16(), "failed to read webhook error body");
                String::new()
            }
        };
        if !status.is_success() {
            return Err(DeliveryError::Status {
                status: status.as_u16(),
                body: truncate(body),
            });
        }
        if let Ok(reply) = serde_json::from_str::<RobotReply>(&body)
            && reply.errcode != 0
        {
            return Err(DeliveryError::Rejected {
                code: reply.errcode,
                message: reply.errmsg,
            });
        }
        Ok(())
    }
}

/// Robot signature for `timestamp_ms`, standard base64 (URL encoding happens in the query).
pub fn sign(secret: &str, timestamp_ms: i64) -> Result<String, DeliveryError> {
    let string_to_sign = format!("{}\n{}", timestamp_ms, secret);
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| DeliveryError::Signing(e.to_string()))?;
    mac.update(string_to_sign.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

fn truncate(mut body: String) -> String {
    if body.len() > ERROR_BODY_LIMIT {
        let mut end = ERROR_BODY_LIMIT;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        body.truncate(end);
    }
    body
}
