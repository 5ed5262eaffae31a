use serde::{Deserialize, Serialize};

/// The outermost JSON object returned to the client, determined by the tool
/// that produced the result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum QueryResponse {
    #[serde(rename = "simple_dialogue")]
    SimpleDialogue {
        response: String,
        status: String,
        message: String,
    },
    #[serde(rename = "cases")]
    Cases {
        response: CaseCard,
        status: String,
        message: String,
    },
    #[serde(rename = "simulation")]
    Simulation {
        simulations: Vec<SimulationEntry>,
        status: String,
        message: String,
    },
}

/// A precedent rendered for the client. The spaced key names are part of the
/// wire contract.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CaseCard {
    pub title: String,
    pub summary: String,
    #[serde(rename = "key points")]
    pub key_points: String,
    #[serde(rename = "judge result")]
    pub judge_result: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimulationEntry {
    pub id: usize,
    pub situation: String,
    pub user: String,
    pub agent: String,
}

impl QueryResponse {
    pub fn success_dialogue(response: impl Into<String>) -> Self {
        Self::SimpleDialogue {
            response: response.into(),
            status: "success".to_string(),
            message: "Response Successful".to_string(),
        }
    }

    pub fn error_dialogue(response: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SimpleDialogue {
            response: response.into(),
            status: "error".to_string(),
            message: message.into(),
        }
    }

    pub fn success_cases(card: CaseCard) -> Self {
        Self::Cases {
            response: card,
            status: "success".to_string(),
            message: "Response Successful".to_string(),
        }
    }

    pub fn success_simulation(simulations: Vec<SimulationEntry>) -> Self {
        Self::Simulation {
            simulations,
            status: "success".to_string(),
            message: "Response Successful".to_string(),
        }
    }

    pub fn is_error(&self) -> bool {
        let status = match self {
            Self::SimpleDialogue { status, .. }
            | Self::Cases { status, .. }
            | Self::Simulation { status, .. } => status,
        };
        status == "error"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_dialogue_envelope_shape() {
        let envelope = QueryResponse::success_dialogue("안내 문구");
        let json = serde_json::to_value(&envelope).expect("json");

        assert_eq!(json["type"], "simple_dialogue");
        assert_eq!(json["response"], "안내 문구");
        assert_eq!(json["status"], "success");
    }

    #[test]
    fn cases_envelope_uses_spaced_keys() {
        let envelope = QueryResponse::success_cases(CaseCard {
            title: "제목".into(),
            summary: "요약".into(),
            key_points: "쟁점".into(),
            judge_result: "판결".into(),
        });
        let json = serde_json::to_value(&envelope).expect("json");

        assert_eq!(json["type"], "cases");
        assert_eq!(json["response"]["key points"], "쟁점");
        assert_eq!(json["response"]["judge result"], "판결");
    }

    #[test]
    fn simulation_envelope_entries_have_four_fields() {
        let envelope = QueryResponse::success_simulation(vec![SimulationEntry {
            id: 0,
            situation: "상황".into(),
            user: "사용자 발화".into(),
            agent: "상담원 발화".into(),
        }]);
        let json = serde_json::to_value(&envelope).expect("json");

        let entry = &json["simulations"][0];
        assert_eq!(entry["id"], 0);
        for field in ["situation", "user", "agent"] {
            assert!(entry[field].is_string());
        }
    }
}
