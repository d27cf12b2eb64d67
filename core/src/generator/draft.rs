use async_trait::async_trait;
use serde_json::Value;

use crate::errors::GenerationError;
use crate::types::{clamp_timeout, CandidateCommand, Category, RiskLevel, TaskDescription};

/// Optional drafting capability. Returns the model's raw text; parsing is the
/// generator's job.
#[async_trait]
pub trait Drafter: Send + Sync {
    fn name(&self) -> &str;

    async fn draft(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// Constrained prompt asking for extra read-only candidates as a JSON array.
pub fn build_prompt(
    task: &TaskDescription,
    category: Category,
    base: &[CandidateCommand],
) -> String {
    let os = &task.os_info;
    let mut prompt = String::new();
    prompt.push_str(
        "You propose read-only diagnostic shell commands for a remote host.\n\
         Rules:\n\
         - Only commands that inspect state. Never modify files, services, users, packages or the network.\n\
         - No chaining, redirection, substitution or pipes into interpreters.\n\
         - At most 3 commands, each finishing within 30 seconds.\n\n",
    );
    prompt.push_str(&format!("Task: {}\n", task.description.trim()));
    prompt.push_str(&format!(
        "Target OS: {} {} (shell: {})\n",
        os.os_type,
        os.version,
        if os.shell.is_empty() { "default" } else { &os.shell }
    ));
    prompt.push_str(&format!("Category: {category}\n"));

    if !base.is_empty() {
        prompt.push_str("Already planned:\n");
        for c in base {
            prompt.push_str(&format!("- {}\n", c.command));
        }
    }
    if !task.prior_commands.is_empty() {
        prompt.push_str("Already executed (do not repeat):\n");
        for c in &task.prior_commands {
            prompt.push_str(&format!("- {c}\n"));
        }
    }

    prompt.push_str(
        "\nRespond with a JSON array only. Each item:\n\
         {\"command\": string, \"purpose\": string, \"category\": \"system_info|memory|cpu|disk|network|processes\", \
         \"riskLevel\": \"low|medium|high\", \"timeoutSeconds\": integer, \"expectedOutputHint\": string, \
         \"prerequisites\": [string]}\n",
    );
    prompt
}

/// Locates the first JSON array in free text, preferring a fenced block.
pub(crate) fn extract_json_array(text: &str) -> Option<&str> {
    if let Some(start) = text.find("```") {
        let after = &text[start + 3..];
        let body_start = after.find('\n').map(|i| i + 1).unwrap_or(0);
        let body = &after[body_start..];
        if let Some(end) = body.find("```") {
            if let Some(arr) = first_array(&body[..end]) {
                return Some(arr);
            }
        }
    }
    first_array(text)
}

fn first_array(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + i + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parses drafted candidates. Items without a non-empty `command` are dropped;
/// a response that holds no JSON array is an error.
pub fn parse_drafted(
    raw: &str,
    fallback_category: Category,
    default_timeout_secs: u32,
) -> Result<Vec<CandidateCommand>, GenerationError> {
    let json = extract_json_array(raw)
        .ok_or_else(|| GenerationError::Malformed("no JSON array in response".into()))?;
    let items: Vec<Value> = serde_json::from_str(json)
        .map_err(|e| GenerationError::Malformed(format!("invalid JSON array: {e}")))?;

    Ok(items
        .iter()
        .filter_map(|item| parse_item(item, fallback_category, default_timeout_secs))
        .collect())
}

fn parse_item(item: &Value, fallback_category: Category, default_timeout_secs: u32) -> Option<CandidateCommand> {
    let obj = item.as_object()?;
    let command = obj.get("command")?.as_str()?.trim();
    if command.is_empty() {
        return None;
    }
    let text = |key: &str| obj.get(key).and_then(Value::as_str).unwrap_or("").trim().to_string();

    let category = obj
        .get("category")
        .and_then(Value::as_str)
        .and_then(|s| s.parse::<Category>().ok())
        .unwrap_or(fallback_category);

    // Drafted commands are never trusted as safe; they always reach scoring
    // unless whitelisted.
    let risk_level = match obj
        .get("riskLevel")
        .and_then(Value::as_str)
        .and_then(|s| s.parse::<RiskLevel>().ok())
    {
        Some(RiskLevel::Safe) => RiskLevel::Low,
        Some(r) => r,
        None => RiskLevel::Medium,
    };

    let timeout = obj
        .get("timeoutSeconds")
        .and_then(Value::as_u64)
        .map(|t| clamp_timeout(t.min(u32::MAX as u64) as u32))
        .unwrap_or_else(|| clamp_timeout(default_timeout_secs));

    let prerequisites = obj
        .get("prerequisites")
        .and_then(Value::as_array)
        .map(|a| {
            a.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let purpose = match text("purpose") {
        p if p.is_empty() => "drafted diagnostic".to_string(),
        p => p,
    };

    let mut candidate = CandidateCommand::new(command, purpose, category, risk_level)
        .with_timeout(timeout)
        .with_hint(text("expectedOutputHint"));
    candidate.prerequisites = prerequisites;
    Some(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{OsInfo, OsType};

    #[test]
    fn prompt_mentions_task_os_and_exclusions() {
        let task = TaskDescription::new(
            "check memory",
            OsInfo {
                os_type: OsType::Linux,
                version: "22.04".into(),
                shell: "bash".into(),
            },
        )
        .with_prior_commands(vec!["free -m".into()]);
        let base = vec![CandidateCommand::new(
            "vmstat -s",
            "p",
            Category::Memory,
            RiskLevel::Safe,
        )];
        let prompt = build_prompt(&task, Category::Memory, &base);
        assert!(prompt.contains("Task: check memory"));
        assert!(prompt.contains("Target OS: linux 22.04 (shell: bash)"));
        assert!(prompt.contains("Category: memory"));
        assert!(prompt.contains("- vmstat -s"));
        assert!(prompt.contains("do not repeat"));
        assert!(prompt.contains("- free -m"));
        assert!(prompt.contains("JSON array only"));
    }

    #[test]
    fn extracts_fenced_and_bare_arrays() {
        let fenced = "Sure:\n```json\n[{\"command\":\"free -h\"}]\n```\nthanks [x]";
        assert_eq!(extract_json_array(fenced), Some("[{\"command\":\"free -h\"}]"));

        let bare = "here [ {\"command\": \"ls [a]\"} ] done";
        assert_eq!(extract_json_array(bare), Some("[ {\"command\": \"ls [a]\"} ]"));

        assert_eq!(extract_json_array("no array"), None);
    }

    #[test]
    fn parse_drops_bad_items_and_normalizes() {
        let raw = r#"[
            {"command": "free -h", "purpose": "mem", "riskLevel": "safe", "timeoutSeconds": 90},
            {"command": "   "},
            {"purpose": "missing command"},
            {"command": "swapon --show", "category": "printer", "riskLevel": "weird"},
            42
        ]"#;
        let out = parse_drafted(raw, Category::Memory, 10).unwrap();
        assert_eq!(out.len(), 2);

        assert_eq!(out[0].command, "free -h");
        assert_eq!(out[0].risk_level, RiskLevel::Low);
        assert_eq!(out[0].timeout_seconds, 30);

        assert_eq!(out[1].category, Category::Memory);
        assert_eq!(out[1].risk_level, RiskLevel::Medium);
        assert_eq!(out[1].timeout_seconds, 10);
        assert_eq!(out[1].purpose, "drafted diagnostic");
    }

    #[test]
    fn parse_rejects_non_array() {
        assert!(matches!(
            parse_drafted("{\"command\":\"x\"}", Category::Cpu, 10),
            Err(GenerationError::Malformed(_))
        ));
        assert!(matches!(
            parse_drafted("[1, 2", Category::Cpu, 10),
            Err(GenerationError::Malformed(_))
        ));
    }
}
