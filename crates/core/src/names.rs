//! Generated-name bookkeeping: per-kind monotonic counters for files and
//! synthetic variables, plus the memoized constant-score cache.
//!
//! All of it lives in one table owned by the compilation, so independent
//! compilations in the same process never interfere. Counters never reset
//! mid-compilation; two constructs of the same kind can therefore never
//! collide on a generated file name.

use crate::path::AttributePath;
use std::collections::BTreeMap;

/// Families of generated names. Each has its own counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NameKind {
    IfFile,
    ElseFile,
    WhileFile,
    ForFile,
    PredicateFile,
    Temp,
    Check,
    Return,
    Item,
}

impl NameKind {
    fn format(self, n: usize) -> String {
        match self {
            NameKind::IfFile => format!("--if--{n}"),
            NameKind::ElseFile => format!("--else--{n}"),
            NameKind::WhileFile => format!("--while--{n}"),
            NameKind::ForFile => format!("--for--{n}"),
            NameKind::PredicateFile => format!("--predicate--{n}"),
            NameKind::Temp => format!("$temp--{n}"),
            NameKind::Check => format!("$check--{n}"),
            NameKind::Return => format!("$return--{n}"),
            NameKind::Item => format!("$item--{n}"),
        }
    }
}

/// Name table for one compilation.
#[derive(Debug)]
pub struct NameTable {
    project: String,
    counters: BTreeMap<NameKind, usize>,
    /// Constant scores (`#N`) already materialized, by integer value.
    pub(crate) constants: BTreeMap<i64, AttributePath>,
    /// Whether the default scoreboard objective has been created yet.
    pub(crate) default_objective_created: bool,
}

impl NameTable {
    pub fn new(project: &str) -> Self {
        NameTable {
            project: project.to_owned(),
            counters: BTreeMap::new(),
            constants: BTreeMap::new(),
            default_objective_created: false,
        }
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    /// Next name in the given family, e.g. `--if--3` or `$temp--0`.
    pub fn next(&mut self, kind: NameKind) -> String {
        let counter = self.counters.entry(kind).or_insert(0);
        let n = *counter;
        *counter += 1;
        kind.format(n)
    }

    /// Objective name of the default scoreboard backing plain scores and
    /// temporaries. Scoreboards are global to the target machine, so the
    /// project name is prefixed to keep packs from colliding.
    pub fn default_objective(&self) -> AttributePath {
        AttributePath::from_segments(vec![self.project.clone(), "default_scoreboard".to_owned()])
    }

    /// Static (project-prefixed) attribute for user-declared scoreboards
    /// and bossbars.
    pub fn static_attr(&self, path: &AttributePath) -> AttributePath {
        path.prefixed(&[self.project.clone()])
    }

    /// Name of the constant-score holder for `n` -- the `#` prefix keeps it
    /// out of target-machine displays.
    pub fn constant_name(n: i64) -> AttributePath {
        AttributePath::new(format!("#{n}"))
    }
}
