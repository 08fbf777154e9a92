//! Command emission. A compilation builds a set of [`CodeUnit`]s, each
//! holding one or more named slots; every slot becomes one file in the
//! generated pack. The emitter keeps a stack of open slots so deferred
//! constructs can descend into their own files and come back out, and a
//! record buffer so loop constructs can replay condition side effects.

use crate::command::Command;
use crate::names::{NameKind, NameTable};
use crate::path::AttributePath;
use crate::value::ScoreHandle;
use std::collections::BTreeMap;

/// What a slot renders to on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// A `.mcfunction` command file under `functions/`.
    Function,
    /// A `.json` predicate file under `predicates/`.
    Predicate,
}

/// Opaque handle to a code unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitId(pub(crate) usize);

#[derive(Debug)]
pub struct Slot {
    pub kind: FileKind,
    /// Dotted location inside the pack; rendered in kebab-case, with all
    /// but the last segment becoming directories.
    pub path: AttributePath,
    pub commands: Vec<Command>,
}

/// One construct's worth of output files, keyed by slot name
/// (`"main"`, `"if"`, `"else"`, `"predicate"`).
#[derive(Debug, Default)]
pub struct CodeUnit {
    pub slots: BTreeMap<&'static str, Slot>,
}

#[derive(Debug, Default)]
pub struct Emitter {
    units: Vec<CodeUnit>,
    /// Open (unit, slot) pairs; `emit` appends to the top.
    stack: Vec<(UnitId, &'static str)>,
    /// Active record buffers; `emit` tees into every one of them.
    recorders: Vec<Vec<Command>>,
}

impl Emitter {
    pub fn new() -> Self {
        Emitter::default()
    }

    pub fn new_unit(&mut self) -> UnitId {
        self.units.push(CodeUnit::default());
        UnitId(self.units.len() - 1)
    }

    pub fn add_slot(&mut self, unit: UnitId, name: &'static str, kind: FileKind, path: AttributePath) {
        self.units[unit.0].slots.insert(
            name,
            Slot { kind, path, commands: Vec::new() },
        );
    }

    pub fn slot_path(&self, unit: UnitId, name: &'static str) -> &AttributePath {
        &self.units[unit.0].slots[name].path
    }

    pub fn enter(&mut self, unit: UnitId, slot: &'static str) {
        self.stack.push((unit, slot));
    }

    pub fn leave(&mut self) {
        self.stack.pop();
    }

    /// Append a command to the currently open slot.
    pub fn emit(&mut self, command: Command) {
        for recorder in &mut self.recorders {
            recorder.push(command.clone());
        }
        let (unit, slot) = *self.stack.last().expect("emit outside any open slot");
        self.units[unit.0]
            .slots
            .get_mut(slot)
            .expect("emit into unregistered slot")
            .commands
            .push(command);
    }

    /// Start capturing everything emitted from here on, in addition to
    /// emitting it normally.
    pub fn begin_record(&mut self) {
        self.recorders.push(Vec::new());
    }

    pub fn end_record(&mut self) -> Vec<Command> {
        self.recorders.pop().expect("end_record without begin_record")
    }

    /// Re-emit previously recorded commands at the current position.
    pub fn paste(&mut self, commands: &[Command]) {
        for command in commands {
            self.emit(command.clone());
        }
    }

    pub fn into_units(self) -> Vec<CodeUnit> {
        debug_assert!(self.stack.is_empty());
        self.units
    }
}

/// Borrowed emission environment handed to value operations: where to put
/// commands, how to mint names, and which local prefix applies.
pub(crate) struct EmitEnv<'a> {
    pub emitter: &'a mut Emitter,
    pub names: &'a mut NameTable,
    pub prefix: &'a [String],
}

impl EmitEnv<'_> {
    /// Objective backing temporaries and plain scores; created on first use.
    pub fn default_objective(&mut self) -> AttributePath {
        let objective = self.names.default_objective();
        if !self.names.default_objective_created {
            self.names.default_objective_created = true;
            self.emitter.emit(Command::ObjectiveCreate {
                objective: objective.to_dotted(),
                criteria: "dummy".to_owned(),
            });
        }
        objective
    }

    /// Fresh single-assignment temporary score.
    pub fn temp_score(&mut self) -> ScoreHandle {
        let name = self.names.next(NameKind::Temp);
        let attr = AttributePath::new(name).prefixed(self.prefix);
        let objective = self.default_objective();
        ScoreHandle { attr, objective }
    }

    /// Score holding the literal `n`, materialized at most once per
    /// compilation, at the point of first use.
    pub fn constant_score(&mut self, n: i64) -> ScoreHandle {
        let objective = self.default_objective();
        if let Some(attr) = self.names.constants.get(&n) {
            return ScoreHandle { attr: attr.clone(), objective };
        }
        let attr = NameTable::constant_name(n);
        self.names.constants.insert(n, attr.clone());
        self.emitter.emit(Command::PlayersSet {
            name: attr.to_dotted(),
            objective: objective.to_dotted(),
            value: n,
        });
        ScoreHandle { attr, objective }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_emitter() -> (Emitter, UnitId) {
        let mut emitter = Emitter::new();
        let unit = emitter.new_unit();
        emitter.add_slot(unit, "main", FileKind::Function, AttributePath::new("main"));
        emitter.enter(unit, "main");
        (emitter, unit)
    }

    #[test]
    fn test_emit_goes_to_top_slot() {
        let (mut emitter, unit) = open_emitter();
        emitter.emit(Command::PlayersSet {
            name: "x".to_owned(),
            objective: "obj".to_owned(),
            value: 1,
        });
        let inner = emitter.new_unit();
        emitter.add_slot(inner, "if", FileKind::Function, AttributePath::new("inner"));
        emitter.enter(inner, "if");
        emitter.emit(Command::PlayersAdd {
            name: "x".to_owned(),
            objective: "obj".to_owned(),
            value: 2,
        });
        emitter.leave();
        emitter.leave();
        let units = emitter.into_units();
        assert_eq!(units[unit.0].slots["main"].commands.len(), 1);
        assert_eq!(units[1].slots["if"].commands.len(), 1);
    }

    #[test]
    fn test_record_tees_and_replays() {
        let (mut emitter, unit) = open_emitter();
        emitter.begin_record();
        emitter.emit(Command::PlayersSet {
            name: "c".to_owned(),
            objective: "obj".to_owned(),
            value: 7,
        });
        let recorded = emitter.end_record();
        assert_eq!(recorded.len(), 1);
        emitter.paste(&recorded);
        emitter.leave();
        let units = emitter.into_units();
        // Once at the original position, once pasted.
        assert_eq!(units[unit.0].slots["main"].commands.len(), 2);
    }

    #[test]
    fn test_constant_score_is_memoized() {
        let (mut emitter, unit) = open_emitter();
        let mut names = NameTable::new("pack");
        let prefix: Vec<String> = Vec::new();
        let mut env = EmitEnv { emitter: &mut emitter, names: &mut names, prefix: &prefix };
        let first = env.constant_score(5);
        let second = env.constant_score(5);
        assert_eq!(first.attr, second.attr);
        emitter.leave();
        let units = emitter.into_units();
        // Objective creation plus a single `players set #5`.
        assert_eq!(units[unit.0].slots["main"].commands.len(), 2);
    }
}
