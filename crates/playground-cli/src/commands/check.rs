use anyhow::Context;
use serde::Serialize;
use playground_config::AppConfig;
use playground_types::{Bank, RequestDraft};
use playground_validator::{evaluate, required_field_groups, Blocker, FieldGroups, GroupContext};

use super::{read_json_arg, CommandResult};

#[derive(Debug, Serialize)]
struct CheckReport {
    ready: bool,
    blocker: Option<Blocker>,
    message: Option<String>,
    missing: Vec<String>,
    groups: FieldGroups,
}

/// Exit code 0 when the draft is ready, 1 when blocked, 2 for unreadable input.
pub fn run(
    config: &AppConfig,
    draft: &str,
    bank: Option<&str>,
    iban_valid: bool,
    token_env: Option<&str>,
) -> CommandResult {
    let (draft, bank) = match parse_inputs(draft, bank) {
        Ok(inputs) => inputs,
        Err(error) => return CommandResult::failure("check", "invalid_input", format!("{error:#}"), 2),
    };
    let mut draft = draft;
    draft.is_iban_valid = iban_valid;

    let verdict = evaluate(&draft, bank.as_ref(), &config.playground);
    let context = GroupContext { crowd_source: config.api.crowd_source, token_env };
    let groups = required_field_groups(&draft, bank.as_ref(), &config.playground, context);
    let report = CheckReport {
        ready: verdict.is_ready(),
        message: verdict.blocker().map(ToString::to_string),
        blocker: verdict.blocker().cloned(),
        missing: groups.missing(&draft),
        groups,
    };

    let exit_code = if report.ready { 0 } else { 1 };
    CommandResult::success("check", report).with_exit_code(exit_code)
}

fn parse_inputs(draft: &str, bank: Option<&str>) -> anyhow::Result<(RequestDraft, Option<Bank>)> {
    let draft = serde_json::from_str(&read_json_arg(draft)?).context("parsing draft")?;
    let bank = match bank {
        Some(bank) => Some(serde_json::from_str(&read_json_arg(bank)?).context("parsing bank")?),
        None => None,
    };
    Ok((draft, bank))
}
