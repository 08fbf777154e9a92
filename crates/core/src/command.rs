//! Target-machine commands.
//!
//! One variant per command shape the lowering emits; `render()` produces
//! the final command text. Identifier rendering kebab-cases camelCase
//! segments (the target refuses uppercase in objective and file names) but
//! leaves dots and the `$`/`#`/`--` name families alone.

use serde_json::Value;

/// camelCase -> kebab-case, applied to every identifier that reaches the
/// target: `loopCount` becomes `loop-count`, `ns.myVar` becomes `ns.my-var`.
pub fn to_kebab(name: &str) -> String {
    let mut lower_run = true;
    let mut out = String::with_capacity(name.len());
    for ch in name.chars() {
        if lower_run == ch.is_uppercase() {
            lower_run = !lower_run;
            if ch.is_uppercase() {
                out.push('-');
            }
        }
        out.extend(ch.to_lowercase());
    }
    out
}

/// A `namespace:dir/file` function reference as it appears inside commands.
pub fn file_reference(project: &str, segments: &[String]) -> String {
    let path: Vec<String> = segments.iter().map(|s| to_kebab(s)).collect();
    format!("{}:{}", to_kebab(project), path.join("/"))
}

/// One condition step of an `execute` command.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecuteStep {
    /// `if predicate <project:path>`
    IfPredicate { reference: String },
    /// `if score <name> <objective> matches <range>`
    IfScoreMatches {
        name: String,
        objective: String,
        range: String,
    },
}

/// A single target-machine command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    ObjectiveCreate {
        objective: String,
        criteria: String,
    },
    ObjectiveRemove {
        objective: String,
    },
    ObjectiveSetDisplay {
        slot: String,
        objective: String,
    },
    PlayersSet {
        name: String,
        objective: String,
        value: i64,
    },
    PlayersAdd {
        name: String,
        objective: String,
        value: i64,
    },
    PlayersRemove {
        name: String,
        objective: String,
        value: i64,
    },
    PlayersReset {
        name: String,
        objective: String,
    },
    /// `scoreboard players operation <lhs> <op> <rhs>` -- op is one of
    /// `=`, `+=`, `-=`, `*=`, `/=`, `%=`.
    PlayersOperation {
        name: String,
        objective: String,
        op: &'static str,
        other_name: String,
        other_objective: String,
    },
    /// `bossbar add <id> <title json>`
    BossbarAdd {
        id: String,
        title: Value,
    },
    /// `function <project:path>`
    FunctionCall {
        reference: String,
    },
    /// `execute <steps...> run <command>`
    Execute {
        steps: Vec<ExecuteStep>,
        run: Box<Command>,
    },
    /// `tellraw <selector> <json>`
    Tellraw {
        selector: String,
        text: Value,
    },
    /// Raw JSON body -- the sole content of a predicate file.
    Json(Value),
}

impl ExecuteStep {
    fn render(&self) -> String {
        match self {
            ExecuteStep::IfPredicate { reference } => {
                format!("if predicate {reference}")
            }
            ExecuteStep::IfScoreMatches {
                name,
                objective,
                range,
            } => {
                format!(
                    "if score {} {} matches {}",
                    to_kebab(name),
                    to_kebab(objective),
                    range
                )
            }
        }
    }
}

impl Command {
    /// Final command text. `Json` renders pretty-printed since it is the
    /// whole file body rather than a command line.
    pub fn render(&self) -> String {
        match self {
            Command::ObjectiveCreate {
                objective,
                criteria,
            } => {
                format!("scoreboard objectives add {} {}", to_kebab(objective), criteria)
            }
            Command::ObjectiveRemove { objective } => {
                format!("scoreboard objectives remove {}", to_kebab(objective))
            }
            Command::ObjectiveSetDisplay { slot, objective } => {
                format!(
                    "scoreboard objectives setdisplay {} {}",
                    slot,
                    to_kebab(objective)
                )
            }
            Command::PlayersSet {
                name,
                objective,
                value,
            } => {
                format!(
                    "scoreboard players set {} {} {}",
                    to_kebab(name),
                    to_kebab(objective),
                    value
                )
            }
            Command::PlayersAdd {
                name,
                objective,
                value,
            } => {
                format!(
                    "scoreboard players add {} {} {}",
                    to_kebab(name),
                    to_kebab(objective),
                    value
                )
            }
            Command::PlayersRemove {
                name,
                objective,
                value,
            } => {
                format!(
                    "scoreboard players remove {} {} {}",
                    to_kebab(name),
                    to_kebab(objective),
                    value
                )
            }
            Command::PlayersReset { name, objective } => {
                format!(
                    "scoreboard players reset {} {}",
                    to_kebab(name),
                    to_kebab(objective)
                )
            }
            Command::PlayersOperation {
                name,
                objective,
                op,
                other_name,
                other_objective,
            } => {
                format!(
                    "scoreboard players operation {} {} {} {} {}",
                    to_kebab(name),
                    to_kebab(objective),
                    op,
                    to_kebab(other_name),
                    to_kebab(other_objective)
                )
            }
            Command::BossbarAdd { id, title } => {
                format!("bossbar add {} {}", to_kebab(id), title)
            }
            Command::FunctionCall { reference } => format!("function {reference}"),
            Command::Execute { steps, run } => {
                let steps: Vec<String> = steps.iter().map(ExecuteStep::render).collect();
                format!("execute {} run {}", steps.join(" "), run.render())
            }
            Command::Tellraw { selector, text } => {
                format!("tellraw {} {}", selector, text)
            }
            Command::Json(value) => {
                serde_json::to_string_pretty(value).expect("predicate trees always serialize")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_to_kebab() {
        assert_eq!(to_kebab("loopCount"), "loop-count");
        assert_eq!(to_kebab("x"), "x");
        assert_eq!(to_kebab("ns.myVar"), "ns.my-var");
        assert_eq!(to_kebab("$temp--0"), "$temp--0");
    }

    #[test]
    fn test_players_set_render() {
        let cmd = Command::PlayersSet {
            name: "main.x".into(),
            objective: "pack.defaultScoreboard".into(),
            value: 5,
        };
        assert_eq!(
            cmd.render(),
            "scoreboard players set main.x pack.default-scoreboard 5"
        );
    }

    #[test]
    fn test_execute_if_predicate_render() {
        let cmd = Command::Execute {
            steps: vec![ExecuteStep::IfPredicate {
                reference: file_reference("pack", &["main".into(), "--if--0".into()]),
            }],
            run: Box::new(Command::FunctionCall {
                reference: file_reference("pack", &["main".into(), "--if--0".into()]),
            }),
        };
        assert_eq!(
            cmd.render(),
            "execute if predicate pack:main/--if--0 run function pack:main/--if--0"
        );
    }

    #[test]
    fn test_operation_render() {
        let cmd = Command::PlayersOperation {
            name: "$temp--0".into(),
            objective: "obj".into(),
            op: "*=",
            other_name: "#3".into(),
            other_objective: "obj".into(),
        };
        assert_eq!(
            cmd.render(),
            "scoreboard players operation $temp--0 obj *= #3 obj"
        );
    }

    #[test]
    fn test_tellraw_render() {
        let cmd = Command::Tellraw {
            selector: "@a".into(),
            text: json!([{ "text": "big" }]),
        };
        assert_eq!(cmd.render(), r#"tellraw @a [{"text":"big"}]"#);
    }
}
