//! Admin protocol - JSON command/response definitions

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Commands sent by an admin client, one JSON object per line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", content = "params")]
pub enum AdminCommand {
    /// Engine status summary
    Status,
    /// Whether a voxel is currently broken
    IsBroken { world: u32, x: i32, y: i32, z: i32 },
    /// Restore every broken voxel now
    RestoreAll,
    /// Flip a feature toggle (projectile, punch, glide, fall, run, regeneration)
    Toggle { feature: String },
    /// Re-read the configuration file
    Reload {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        path: Option<String>,
    },
    /// Break count for one actor
    Stats { actor: u64 },
    /// Actors with the most breaks
    TopBreakers {
        #[serde(default = "default_limit")]
        limit: usize,
    },
    /// Clear break statistics for one actor, or for everyone
    ResetStats {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        actor: Option<u64>,
    },
    /// Ping (health check)
    Ping,
}

fn default_limit() -> usize {
    10
}

/// Responses from the admin server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum AdminResponse {
    #[serde(rename = "ok")]
    Ok { data: ResponseData },
    #[serde(rename = "error")]
    Error { message: String },
}

/// Response data variants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseData {
    None,
    EngineStatus {
        tick: u64,
        broken: usize,
        pending_restores: usize,
        total_breaks: u64,
        tracked_actors: usize,
        features: Vec<FeatureState>,
    },
    VoxelState {
        world: u32,
        x: i32,
        y: i32,
        z: i32,
        broken: bool,
        broken_at: Option<u64>,
    },
    TopBreakers { entries: Vec<BreakerEntry> },
    ActorBreaks { actor: u64, breaks: u64 },
    Pong { message: String },
    Queued { description: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureState {
    pub name: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakerEntry {
    pub actor: u64,
    pub breaks: u64,
}

impl AdminResponse {
    pub fn ok(data: ResponseData) -> Self {
        Self::Ok { data }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self::Error {
            message: msg.into(),
        }
    }

    pub fn pong() -> Self {
        Self::ok(ResponseData::Pong {
            message: "pong".into(),
        })
    }

    pub fn none() -> Self {
        Self::ok(ResponseData::None)
    }

    /// Acknowledge a command that runs on the next simulation tick
    pub fn queued(description: impl Into<String>) -> Self {
        Self::ok(ResponseData::Queued {
            description: description.into(),
        })
    }
}

/// Failure to read a command line
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("empty command")]
    Empty,

    #[error("invalid command JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Parse one line of input into a command
pub fn parse_command(line: &str) -> Result<AdminCommand, ProtocolError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Err(ProtocolError::Empty);
    }
    Ok(serde_json::from_str(trimmed)?)
}

/// Serialize a response as one newline-terminated line
pub fn encode_response(response: &AdminResponse) -> String {
    let mut json = serde_json::to_string(response).unwrap_or_else(|e| {
        format!(
            "{{\"status\":\"error\",\"message\":\"Serialize error: {}\"}}",
            e
        )
    });
    json.push('\n');
    json
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_command(r#"{"cmd":"Ping"}"#).unwrap(), AdminCommand::Ping);
        assert_eq!(
            parse_command(r#"{"cmd":"IsBroken","params":{"world":0,"x":1,"y":2,"z":3}}"#).unwrap(),
            AdminCommand::IsBroken { world: 0, x: 1, y: 2, z: 3 }
        );
        assert_eq!(
            parse_command(r#"{"cmd":"TopBreakers","params":{}}"#).unwrap(),
            AdminCommand::TopBreakers { limit: 10 }
        );
        assert_eq!(
            parse_command(r#"{"cmd":"Reload","params":{}}"#).unwrap(),
            AdminCommand::Reload { path: None }
        );
        assert_eq!(
            parse_command(r#"{"cmd":"ResetStats","params":{}}"#).unwrap(),
            AdminCommand::ResetStats { actor: None }
        );
        assert_eq!(
            parse_command(r#"{"cmd":"ResetStats","params":{"actor":7}}"#).unwrap(),
            AdminCommand::ResetStats { actor: Some(7) }
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(parse_command("   "), Err(ProtocolError::Empty)));
        assert!(matches!(parse_command(r#"{"cmd":"Explode"}"#), Err(ProtocolError::Json(_))));
    }

    #[test]
    fn test_encode_response() {
        let line = encode_response(&AdminResponse::pong());
        assert!(line.ends_with('\n'));
        let value: serde_json::Value = serde_json::from_str(line.trim()).unwrap();
        assert_eq!(value["status"], "ok");
        assert_eq!(value["data"]["message"], "pong");

        let err = encode_response(&AdminResponse::error("nope"));
        assert!(err.contains("\"status\":\"error\""));
    }
}
