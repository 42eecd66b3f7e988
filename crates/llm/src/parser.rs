//! Response Parsing
//!
//! Recovers a structured analysis from free-form model output. Models wrap
//! JSON in markdown fences, prepend prose, and emit trailing commas; the
//! recovery path here strips all of that before deserializing. Individual
//! test points that fail validation are dropped with a warning; the parse as
//! a whole fails only when nothing valid remains.

use std::collections::HashSet;

use excellentcase_core::{Analysis, PipelineError, PipelineResult, Priority, TestCategory, TestPoint};
use serde::Deserialize;

/// Lenient wire shape for one test point as models actually emit it.
#[derive(Debug, Deserialize)]
struct RawPoint {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    priority: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    scenario: Option<String>,
    #[serde(default)]
    scenarios: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct RawAnalysis {
    #[serde(alias = "featureName", alias = "feature")]
    feature_name: Option<String>,
    #[serde(alias = "testPoints", alias = "test_points")]
    points: Option<Vec<RawPoint>>,
}

/// Parse model output into a validated `Analysis`.
pub fn parse_analysis(raw: &str) -> PipelineResult<Analysis> {
    let json = extract_json(raw).ok_or_else(|| {
        PipelineError::analysis("no JSON object found in model response")
    })?;

    let parsed: RawAnalysis = match serde_json::from_str(&json) {
        Ok(v) => v,
        Err(first_err) => {
            let repaired = repair_json(&json);
            serde_json::from_str(&repaired).map_err(|_| {
                PipelineError::analysis(format!("unparseable model response: {}", first_err))
            })?
        }
    };

    let feature_name = parsed
        .feature_name
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "Unnamed Feature".to_string());

    let raw_points = parsed.points.unwrap_or_default();
    let total = raw_points.len();

    let mut used_ids: HashSet<String> = HashSet::new();
    let mut next_seq: u32 = 1;
    let mut points = Vec::with_capacity(total);

    for (idx, raw) in raw_points.into_iter().enumerate() {
        match validate_point(raw, &mut used_ids, &mut next_seq) {
            Ok(point) => points.push(point),
            Err(reason) => {
                tracing::warn!(index = idx, %reason, "dropping malformed test point");
            }
        }
    }

    if points.is_empty() {
        return Err(PipelineError::analysis(format!(
            "no valid test points in model response ({} candidates rejected)",
            total
        )));
    }

    points.sort_by_key(|p| p.priority);
    tracing::debug!(feature = %feature_name, accepted = points.len(), total, "parsed analysis");
    Ok(Analysis {
        feature_name,
        points,
    })
}

fn validate_point(
    raw: RawPoint,
    used_ids: &mut HashSet<String>,
    next_seq: &mut u32,
) -> Result<TestPoint, String> {
    let description = raw
        .description
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| "missing description".to_string())?;

    let category = match raw.category.as_deref() {
        Some(s) => parse_category(s).ok_or_else(|| format!("unknown category: {}", s))?,
        None => TestCategory::Functional,
    };

    let priority = raw
        .priority
        .as_deref()
        .map(parse_priority)
        .unwrap_or(Priority::P2);

    // Single scenario string, or first entry of a scenarios array, else the
    // description itself.
    let scenario = raw
        .scenario
        .filter(|s| !s.trim().is_empty())
        .or_else(|| {
            raw.scenarios
                .and_then(|v| v.into_iter().find(|s| !s.trim().is_empty()))
        })
        .unwrap_or_else(|| description.clone());

    let id = normalize_id(raw.id.as_deref(), used_ids, next_seq);
    used_ids.insert(id.clone());

    Ok(TestPoint {
        id,
        category,
        priority,
        description,
        scenario: scenario.trim().to_string(),
    })
}

fn parse_category(s: &str) -> Option<TestCategory> {
    match s.trim().to_lowercase().as_str() {
        "functional" | "function" | "功能" | "功能测试" => Some(TestCategory::Functional),
        "performance" | "性能" | "性能测试" => Some(TestCategory::Performance),
        "security" | "安全" | "安全测试" => Some(TestCategory::Security),
        "compatibility" | "兼容性" | "兼容性测试" => Some(TestCategory::Compatibility),
        "usability" | "易用性" | "易用性测试" => Some(TestCategory::Usability),
        _ => None,
    }
}

fn parse_priority(s: &str) -> Priority {
    match s.trim().to_uppercase().as_str() {
        "P0" | "CRITICAL" => Priority::P0,
        "P1" | "HIGH" => Priority::P1,
        "P3" | "LOW" => Priority::P3,
        _ => Priority::P2,
    }
}

/// Coerce a model-supplied id into unique `TP_###` form, assigning the next
/// free sequence number when the id is absent, unparseable, or a duplicate.
fn normalize_id(raw: Option<&str>, used_ids: &HashSet<String>, next_seq: &mut u32) -> String {
    if let Some(raw) = raw {
        let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
        if let Ok(n) = digits.parse::<u32>() {
            let candidate = format!("TP_{:03}", n);
            if !used_ids.contains(&candidate) {
                return candidate;
            }
        }
    }
    loop {
        let candidate = format!("TP_{:03}", next_seq);
        *next_seq += 1;
        if !used_ids.contains(&candidate) {
            return candidate;
        }
    }
}

/// Locate the outermost JSON object in free-form text.
///
/// Strips markdown code fences first, then brace-matches from the first `{`,
/// honoring string literals and escapes.
pub(crate) fn extract_json(raw: &str) -> Option<String> {
    let text = strip_fences(raw);
    let start = text.find('{')?;
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if escaped {
            escaped = false;
            continue;
        }
        match b {
            b'\\' if in_string => escaped = true,
            b'"' => in_string = !in_string,
            b'{' if !in_string => depth += 1,
            b'}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(text[start..=i].to_string());
                }
            }
            _ => {}
        }
    }
    None
}

fn strip_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    if let Some(rest) = trimmed.strip_prefix("```") {
        // Skip an optional language tag on the fence line.
        let body = rest.split_once('\n').map(|(_, b)| b).unwrap_or(rest);
        return body.strip_suffix("```").unwrap_or(body).trim();
    }
    trimmed
}

/// Remove trailing commas and line comments, the two malformations models
/// most often produce.
pub(crate) fn repair_json(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    let mut chars = json.chars().peekable();
    let mut in_string = false;
    let mut escaped = false;
    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => {
                in_string = true;
                out.push('"');
            }
            '/' if chars.peek() == Some(&'/') => {
                for next in chars.by_ref() {
                    if next == '\n' {
                        break;
                    }
                }
            }
            ',' => {
                // Drop the comma if the next significant char closes a scope.
                let mut ws = String::new();
                while let Some(&next) = chars.peek() {
                    if next.is_whitespace() {
                        ws.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }
                if !matches!(chars.peek(), Some('}') | Some(']')) {
                    out.push(',');
                }
                out.push_str(&ws);
            }
            _ => out.push(c),
        }
    }
    out
}
