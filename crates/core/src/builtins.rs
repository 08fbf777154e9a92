//! Built-in names pre-populated into the root scope: the three type
//! classes used in annotations and the command-like callables. The table
//! is written once before any user code is analyzed and never changes.

use crate::command::Command;
use crate::emit::EmitEnv;
use crate::error::CompileError;
use crate::path::AttributePath;
use crate::scope::ScopeArena;
use crate::value::{print_source, Builtin, Value};
use serde_json::{json, Value as Json};

pub const TABLE: [(&str, Builtin); 6] = [
    ("score", Builtin::ScoreClass),
    ("scoreboard", Builtin::ScoreboardClass),
    ("bossbar", Builtin::BossbarClass),
    ("print", Builtin::Print),
    ("sidebar", Builtin::Sidebar),
    ("remove", Builtin::Remove),
];

pub fn install(scope: &mut ScopeArena) -> Result<(), CompileError> {
    for (name, builtin) in TABLE {
        scope.write(&AttributePath::new(name), Value::Builtin(builtin))?;
    }
    Ok(())
}

impl EmitEnv<'_> {
    pub(crate) fn call_builtin(
        &mut self,
        builtin: Builtin,
        args: Vec<Value>,
    ) -> Result<Value, CompileError> {
        match builtin {
            Builtin::Print => {
                let mut parts: Vec<Json> = vec![json!("")];
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        parts.push(json!(" "));
                    }
                    parts.push(print_source(arg)?);
                }
                self.emitter.emit(Command::Tellraw {
                    selector: "@a".to_owned(),
                    text: Json::Array(parts),
                });
                Ok(Value::None)
            }
            Builtin::Sidebar => {
                let board = expect_scoreboard("sidebar", args)?;
                self.emitter.emit(Command::ObjectiveSetDisplay {
                    slot: "sidebar".to_owned(),
                    objective: board,
                });
                Ok(Value::None)
            }
            Builtin::Remove => {
                let board = expect_scoreboard("remove", args)?;
                self.emitter.emit(Command::ObjectiveRemove { objective: board });
                Ok(Value::None)
            }
            Builtin::ScoreClass | Builtin::ScoreboardClass | Builtin::BossbarClass => {
                Err(CompileError::malformed(
                    "type names are used in annotations, not called",
                ))
            }
        }
    }
}

fn expect_scoreboard(op: &'static str, args: Vec<Value>) -> Result<String, CompileError> {
    match args.as_slice() {
        [Value::Scoreboard(board)] => Ok(board.attr.to_dotted()),
        [other] => Err(CompileError::UnsupportedOperation {
            op,
            left: other.kind(),
            right: "none",
        }),
        _ => Err(CompileError::malformed(format!(
            "'{op}' expects exactly one scoreboard argument"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::{Emitter, FileKind};
    use crate::names::NameTable;

    #[test]
    fn test_install_populates_root() {
        let mut scope = ScopeArena::new();
        install(&mut scope).unwrap();
        assert!(scope.exists(&"print".into()));
        assert!(scope.exists(&"score".into()));
    }

    #[test]
    fn test_print_joins_arguments_with_spaces() {
        let mut emitter = Emitter::new();
        let unit = emitter.new_unit();
        emitter.add_slot(unit, "main", FileKind::Function, AttributePath::new("main"));
        emitter.enter(unit, "main");
        let mut names = NameTable::new("pack");
        let prefix: Vec<String> = Vec::new();
        let mut env = EmitEnv { emitter: &mut emitter, names: &mut names, prefix: &prefix };
        env.call_builtin(
            Builtin::Print,
            vec![Value::Str("a".into()), Value::Int(1)],
        )
        .unwrap();
        emitter.leave();
        let commands = &emitter.into_units()[0].slots["main"].commands[..];
        match &commands[0] {
            Command::Tellraw { selector, text } => {
                assert_eq!(selector, "@a");
                let parts = text.as_array().unwrap();
                assert_eq!(parts.len(), 4);
                assert_eq!(parts[2], json!(" "));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_calling_a_type_name_is_malformed() {
        let mut emitter = Emitter::new();
        let unit = emitter.new_unit();
        emitter.add_slot(unit, "main", FileKind::Function, AttributePath::new("main"));
        emitter.enter(unit, "main");
        let mut names = NameTable::new("pack");
        let prefix: Vec<String> = Vec::new();
        let mut env = EmitEnv { emitter: &mut emitter, names: &mut names, prefix: &prefix };
        assert!(env.call_builtin(Builtin::ScoreClass, vec![]).is_err());
    }
}
