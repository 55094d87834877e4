use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::session::{DetectionController, DetectionStatus};

/// Control message sent by the page script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Command {
    Ping,
    StartDetection,
    StopDetection,
    GetStatus,
    SetBackendUrl { url: String },
}

/// Reply to a `Command`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommandResponse {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<DetectionStatus>,

    /// Milliseconds since the Unix epoch; set by `ping`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl CommandResponse {
    pub fn ok(status: DetectionStatus) -> Self {
        Self {
            success: true,
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn failed(error: impl ToString, status: DetectionStatus) -> Self {
        Self {
            success: false,
            error: Some(error.to_string()),
            status: Some(status),
            timestamp: None,
        }
    }

    pub fn pong() -> Self {
        Self {
            success: true,
            timestamp: Some(Utc::now().timestamp_millis()),
            ..Default::default()
        }
    }
}

impl DetectionController {
    /// Dispatch one command
    ///
    /// Failures are reported in the response rather than as an `Err`, together
    /// with the status after the attempt.
    pub async fn handle(&self, command: Command) -> CommandResponse {
        let result = match command {
            Command::Ping => return CommandResponse::pong(),
            Command::GetStatus => Ok(self.status()),
            Command::StartDetection => self.start().await,
            Command::StopDetection => self.stop().await,
            Command::SetBackendUrl { url } => self.set_backend_url(&url),
        };

        match result {
            Ok(status) => CommandResponse::ok(status),
            Err(e) => CommandResponse::failed(e, self.status()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_wire_names() {
        let cmd: Command = serde_json::from_str(r#"{"action":"startDetection"}"#).unwrap();
        assert_eq!(cmd, Command::StartDetection);

        let cmd: Command =
            serde_json::from_str(r#"{"action":"setBackendUrl","url":"http://10.0.0.2:7860"}"#)
                .unwrap();
        assert_eq!(
            cmd,
            Command::SetBackendUrl {
                url: "http://10.0.0.2:7860".to_string()
            }
        );

        assert!(serde_json::from_str::<Command>(r#"{"action":"explode"}"#).is_err());
    }

    #[test]
    fn test_pong_omits_status() {
        let json = serde_json::to_value(CommandResponse::pong()).unwrap();
        assert_eq!(json["success"], true);
        assert!(json["timestamp"].is_i64());
        assert!(json.get("status").is_none());
        assert!(json.get("error").is_none());
    }
}
