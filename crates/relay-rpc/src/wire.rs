use serde::{Deserialize, Serialize};
use tabwire_core_types::{CallEnvelope, ResultEnvelope};

/// Frames on the relay<->server connection. JSON-encoded, tagged by `kind`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WireFrame {
    Call(CallEnvelope),
    Result(ResultEnvelope),
    Ping,
    Pong,
}

impl WireFrame {
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn decode(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn frames_round_trip_through_json() {
        let call = WireFrame::Call(CallEnvelope {
            id: 9,
            call_type: "snapshot".to_string(),
            payload: json!({}),
        });
        let encoded = call.encode().unwrap();
        assert!(encoded.contains("\"kind\":\"call\""));
        match WireFrame::decode(&encoded).unwrap() {
            WireFrame::Call(env) => assert_eq!(env.id, 9),
            other => panic!("unexpected frame {other:?}"),
        }

        let pong = WireFrame::Pong.encode().unwrap();
        assert!(matches!(WireFrame::decode(&pong).unwrap(), WireFrame::Pong));
    }
}
