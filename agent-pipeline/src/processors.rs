use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;
use tracing::warn;

use crate::{
    envelope::{CaseCard, QueryResponse, SimulationEntry},
    messages::AgentMessage,
};

const NO_RESPONSE_FALLBACK: &str = "응답을 생성하지 못했습니다. 다른 질문을 시도하거나, \
     계약서 관련 질문인 경우 '계약 해지 조항 분석해줘'와 같이 더 구체적으로 질문해 보세요.";

const SIMULATION_PATTERN: &str =
    r#"(?s)상황:\s*(.*?)\s*사용자:\s*"?(.*?)"?\s*상담원:\s*"?(.*?)"?\s*$"#;

/// Picks the envelope from the agent's message trail: the newest contentful
/// tool message drives the shape by tool name; otherwise the newest
/// assistant message becomes a plain dialogue.
pub fn extract_response(trail: &[AgentMessage]) -> QueryResponse {
    for message in trail.iter().rev() {
        if let AgentMessage::Tool { name, content } = message {
            if content.is_empty() {
                continue;
            }
            let Ok(parsed) = serde_json::from_str::<Value>(content) else {
                warn!(tool = %name, "tool output was not JSON; parsing as formatted case");
                return process_formatted_case(content);
            };

            return match name.as_str() {
                "find_case_tool" => process_find_case_result(&parsed),
                "simulate_dispute_tool" => process_simulation_result(&parsed),
                "web_search_tool" => process_web_search_result(&parsed),
                _ => QueryResponse::success_dialogue(
                    serde_json::to_string_pretty(&parsed).unwrap_or_else(|_| content.clone()),
                ),
            };
        }
    }

    for message in trail.iter().rev() {
        if let AgentMessage::Assistant { content, .. } = message {
            if !content.is_empty() {
                return QueryResponse::success_dialogue(content.clone());
            }
        }
    }

    QueryResponse::error_dialogue(NO_RESPONSE_FALLBACK, "No valid response content found")
}

/// `find_case_tool` output is shape-tolerant: a list, `{cases}`,
/// `{formatted_cases}`, or a single object.
pub fn process_find_case_result(content: &Value) -> QueryResponse {
    if let Some(items) = content.as_array() {
        return match items.first() {
            Some(Value::String(text)) => process_formatted_case(text),
            Some(first @ Value::Object(_)) => case_from_object(first),
            _ => process_formatted_case(&content.to_string()),
        };
    }

    if let Some(object) = content.as_object() {
        if let Some(cases) = object.get("cases").and_then(Value::as_array) {
            return match cases.first() {
                Some(Value::String(text)) => process_formatted_case(text),
                Some(first @ Value::Object(fields)) => match fields.get("formatted_case") {
                    Some(Value::String(text)) => process_formatted_case(text),
                    _ => case_from_object(first),
                },
                _ => process_formatted_case(&content.to_string()),
            };
        }

        if let Some(formatted) = object.get("formatted_cases").and_then(Value::as_array) {
            if let Some(Value::String(text)) = formatted.first() {
                return process_formatted_case(text);
            }
        }

        return case_from_object(content);
    }

    process_formatted_case(&content.to_string())
}

fn case_from_object(value: &Value) -> QueryResponse {
    let field = |keys: &[&str]| {
        keys.iter()
            .find_map(|key| value.get(*key).and_then(Value::as_str))
            .unwrap_or_default()
            .to_string()
    };

    QueryResponse::success_cases(CaseCard {
        title: field(&["case_name", "title"]),
        summary: field(&["summary"]),
        key_points: field(&["key_points"]),
        judge_result: field(&["judgment", "result"]),
    })
}

/// Parses a formatted precedent text by its literal headers. When nothing
/// matches, the whole text becomes the summary.
pub fn process_formatted_case(formatted_case: &str) -> QueryResponse {
    let title = section_after(formatted_case, "제목:", SectionEnd::Line);
    let summary = section_after(formatted_case, "요약:", SectionEnd::BlankLine);
    let key_points = section_after(formatted_case, "주요 쟁점:", SectionEnd::BlankLine);
    let judge_result = section_after(formatted_case, "판결:", SectionEnd::Rest);

    if title.is_empty() && summary.is_empty() && key_points.is_empty() && judge_result.is_empty() {
        return QueryResponse::success_cases(CaseCard {
            summary: formatted_case.to_string(),
            ..CaseCard::default()
        });
    }

    QueryResponse::success_cases(CaseCard {
        title,
        summary,
        key_points,
        judge_result,
    })
}

enum SectionEnd {
    Line,
    BlankLine,
    Rest,
}

fn section_after(text: &str, header: &str, end: SectionEnd) -> String {
    let Some(start) = text.find(header) else {
        return String::new();
    };
    let rest = &text[start + header.len()..];

    let value = match end {
        SectionEnd::Line => rest.split('\n').next().unwrap_or(rest),
        SectionEnd::BlankLine => rest.split("\n\n").next().unwrap_or(rest),
        SectionEnd::Rest => rest,
    };

    value.trim().to_string()
}

/// `simulate_dispute_tool` output: each simulation string is parsed into the
/// (situation, user, agent) triple.
pub fn process_simulation_result(content: &Value) -> QueryResponse {
    let simulations: Vec<&str> = content
        .get("simulations")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    if simulations.is_empty() {
        return QueryResponse::error_dialogue("시뮬레이션 결과가 없습니다.", "No simulation results");
    }

    let entries = simulations
        .iter()
        .enumerate()
        .map(|(id, simulation)| {
            let (situation, user, agent) = parse_simulation(simulation);
            SimulationEntry {
                id,
                situation,
                user,
                agent,
            }
        })
        .collect();

    QueryResponse::success_simulation(entries)
}

/// Extracts the role-played triple from one simulation transcript. A
/// transcript that does not match yields three empty strings, never a panic.
pub fn parse_simulation(simulation: &str) -> (String, String, String) {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| Regex::new(SIMULATION_PATTERN).ok());

    let cleaned = simulation.trim().replace("```", "");

    let Some(regex) = pattern else {
        return (String::new(), String::new(), String::new());
    };

    match regex.captures(&cleaned) {
        Some(captures) => {
            let group = |i: usize| {
                captures
                    .get(i)
                    .map(|m| m.as_str().trim().to_string())
                    .unwrap_or_default()
            };
            (group(1), group(2), group(3))
        }
        None => (String::new(), String::new(), String::new()),
    }
}

/// `web_search_tool` output: results joined as `{title}:\n{content}`, raw
/// JSON as the fallback when nothing joins.
pub fn process_web_search_result(content: &Value) -> QueryResponse {
    let results: Vec<&Value> = content
        .get("results")
        .and_then(Value::as_array)
        .map(|items| items.iter().collect())
        .unwrap_or_default();

    if results.is_empty() {
        return QueryResponse::error_dialogue("검색 결과가 없습니다.", "No search results");
    }

    let mut response_text = String::new();
    for result in results {
        let title = result.get("title").and_then(Value::as_str).unwrap_or_default();
        let body = result
            .get("content")
            .and_then(Value::as_str)
            .unwrap_or_default();
        if !title.is_empty() && !body.is_empty() {
            response_text.push_str(&format!("{title}:\n{body}\n\n"));
        }
    }

    if response_text.is_empty() {
        response_text = content.to_string();
    }

    QueryResponse::success_dialogue(response_text)
}
