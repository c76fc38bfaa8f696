//! The three-stage command dispatcher (§4.1): orchestrates Stage 1
//! (canonical match), Stage 2 (shell validation), and Stage 3 (skill
//! inference) into a single dispatch envelope.

use serde_json::{json, Map, Value};
use tracing::debug;
use wizard_core::{DebugInfo, DispatchEnvelope, DispatchStatus, DispatchTarget, RouteTraceEntry};
use wizard_config::DispatchConfig;

use crate::{stage1, stage2, stage3};
use crate::stage1::Stage1Outcome;
use crate::stage2::Stage2Outcome;

const FUZZY_CONFIRM_THRESHOLD: f64 = 0.95;

fn trace_entry(stage: u8, decision: &str, detail: Map<String, Value>) -> RouteTraceEntry {
    RouteTraceEntry {
        stage,
        decision: decision.to_string(),
        detail,
    }
}

fn detail(pairs: Vec<(&str, Value)>) -> Map<String, Value> {
    pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

/// Dispatch `input` through all three stages. A leading `--dispatch-debug `
/// toggles the route trace on and is stripped before matching begins.
pub fn dispatch(input: &str, config: &DispatchConfig) -> DispatchEnvelope {
    let (debug_enabled, input) = match input.strip_prefix("--dispatch-debug ") {
        Some(rest) => (true, rest),
        None => (false, input),
    };

    let mut env = DispatchEnvelope::base();
    env.debug = DebugInfo {
        enabled: debug_enabled,
        route_trace: Vec::new(),
    };

    if input.trim().is_empty() {
        env.status = DispatchStatus::Error;
        env.message = "Command required".into();
        return env;
    }

    // Stage 1
    match stage1::match_command(input, config.fuzzy_max_distance) {
        Stage1Outcome::Exact { command } => {
            debug!(stage = 1, %command, "exact uCODE match");
            if debug_enabled {
                env.debug.route_trace.push(trace_entry(
                    1,
                    "match",
                    detail(vec![("command", json!(command)), ("confidence", json!(1.0))]),
                ));
            }
            env.stage = Some(1);
            env.dispatch_to = Some(DispatchTarget::Ucode);
            env.command = Some(command.clone());
            env.confidence = Some(1.0);
            env.message = format!("Dispatched to uCODE command {command}");
            return env;
        }
        Stage1Outcome::FuzzyConfident { command, confidence } => {
            if debug_enabled {
                env.debug.route_trace.push(trace_entry(
                    1,
                    "match",
                    detail(vec![("command", json!(command)), ("confidence", json!(confidence))]),
                ));
            }
            env.stage = Some(1);
            env.dispatch_to = Some(DispatchTarget::Ucode);
            env.command = Some(command.clone());
            env.confidence = Some(confidence);
            env.message = format!("Dispatched to uCODE command {command} (fuzzy match)");
            return env;
        }
        Stage1Outcome::FuzzyConfirm { command, confidence } => {
            if debug_enabled {
                env.debug.route_trace.push(trace_entry(
                    1,
                    "confirm_required",
                    detail(vec![("command", json!(command)), ("confidence", json!(confidence))]),
                ));
            }
            env.stage = Some(1);
            env.status = DispatchStatus::Pending;
            env.dispatch_to = Some(DispatchTarget::Confirm);
            env.command = Some(command.clone());
            env.confidence = Some(confidence);
            env.message = format!("Did you mean {command}?");
            debug_assert!(confidence < FUZZY_CONFIRM_THRESHOLD);
            return env;
        }
        Stage1Outcome::NoMatch => {
            if debug_enabled {
                env.debug
                    .route_trace
                    .push(trace_entry(1, "skip", detail(vec![("reason", json!("no_match"))])));
            }
        }
    }

    // Stage 2
    if !config.shell_enabled {
        if debug_enabled {
            env.debug
                .route_trace
                .push(trace_entry(2, "skip", detail(vec![("reason", json!("shell_disabled"))])));
        }
    } else {
        match stage2::validate(
            input,
            config.shell_enabled,
            &config.shell_blocklist,
            &config.shell_allowlist,
            &config.shell_read_only_allowlist,
        ) {
            Stage2Outcome::Valid(payload) => {
                if debug_enabled {
                    env.debug.route_trace.push(trace_entry(
                        2,
                        "validate",
                        detail(vec![
                            ("is_safe", json!(true)),
                            ("command", json!(payload.command)),
                        ]),
                    ));
                }
                env.stage = Some(2);
                if payload.requires_confirmation {
                    env.status = DispatchStatus::Pending;
                    env.dispatch_to = Some(DispatchTarget::Confirm);
                    env.message = format!("Confirm before running '{}'?", payload.command);
                } else {
                    env.dispatch_to = Some(DispatchTarget::Shell);
                    env.message = format!("Dispatched to shell: {}", payload.command);
                }
                env.shell = Some(payload);
                return env;
            }
            Stage2Outcome::Rejected { reason } => {
                if debug_enabled {
                    env.debug.route_trace.push(trace_entry(
                        2,
                        "validate",
                        detail(vec![("is_safe", json!(false)), ("reason", json!(reason))]),
                    ));
                }
            }
            Stage2Outcome::Disabled => unreachable!("shell_enabled already checked"),
        }
    }

    // Stage 3 — always dispatches, never fails.
    let skill = stage3::infer_skill(input);
    if debug_enabled {
        env.debug
            .route_trace
            .push(trace_entry(3, "dispatch", detail(vec![("skill", json!(skill))])));
    }
    env.stage = Some(3);
    env.dispatch_to = Some(DispatchTarget::Vibe);
    env.skill = Some(skill.to_string());
    env.message = format!("Dispatched to Vibe skill '{skill}'");
    env
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_an_error() {
        let env = dispatch("", &DispatchConfig::default());
        assert_eq!(env.status, DispatchStatus::Error);
        assert_eq!(env.message, "Command required");
    }

    #[test]
    fn exact_command_dispatches_to_ucode() {
        let env = dispatch("HELP", &DispatchConfig::default());
        assert_eq!(env.stage, Some(1));
        assert_eq!(env.dispatch_to, Some(DispatchTarget::Ucode));
        assert_eq!(env.command, Some("HELP".to_string()));
        assert_eq!(env.confidence, Some(1.0));
    }

    #[test]
    fn shell_readonly_dispatches_without_confirmation() {
        let env = dispatch("ls -la", &DispatchConfig::default());
        assert_eq!(env.stage, Some(2));
        assert_eq!(env.dispatch_to, Some(DispatchTarget::Shell));
        let shell = env.shell.unwrap();
        assert_eq!(shell.command, "ls");
        assert!(!shell.requires_confirmation);
    }

    #[test]
    fn shell_mutating_command_requires_confirmation() {
        let env = dispatch("mkdir scratch", &DispatchConfig::default());
        assert_eq!(env.stage, Some(2));
        assert_eq!(env.status, DispatchStatus::Pending);
        assert_eq!(env.dispatch_to, Some(DispatchTarget::Confirm));
        assert!(env.shell.unwrap().requires_confirmation);
    }

    #[test]
    fn unrecognized_input_falls_through_to_skill_inference() {
        let env = dispatch("list all devices", &DispatchConfig::default());
        assert_eq!(env.stage, Some(3));
        assert_eq!(env.dispatch_to, Some(DispatchTarget::Vibe));
        assert_eq!(env.skill, Some("device".to_string()));
    }

    #[test]
    fn dangerous_shell_input_falls_through_to_stage_three() {
        let env = dispatch("rm -rf /", &DispatchConfig::default());
        assert_eq!(env.stage, Some(3));
        assert_eq!(env.dispatch_to, Some(DispatchTarget::Vibe));
    }

    #[test]
    fn contract_metadata_always_present() {
        let env = dispatch("", &DispatchConfig::default());
        assert_eq!(env.contract.version, "m1.1");
        let env2 = dispatch("HELP", &DispatchConfig::default());
        assert_eq!(env2.contract.version, "m1.1");
    }

    #[test]
    fn debug_trace_records_every_stage_decision() {
        let env = dispatch("--dispatch-debug list all devices", &DispatchConfig::default());
        assert!(env.debug.enabled);
        assert_eq!(env.debug.route_trace.len(), 3);
        assert_eq!(env.debug.route_trace[0].stage, 1);
        assert_eq!(env.debug.route_trace[1].stage, 2);
        assert_eq!(env.debug.route_trace[2].stage, 3);
    }
}
