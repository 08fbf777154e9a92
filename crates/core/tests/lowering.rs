//! End-to-end lowering checks: whole modules in, rendered command files
//! and predicate JSON out.

use sapling_core::ast::{CmpOp, Expr, Module, Param, ReturnSpec, Stmt, Visibility};
use sapling_core::ast::NamespaceBlock;
use sapling_core::emit::Slot;
use sapling_core::{compile, Command, CompileError, CompiledPack, Config};

fn build(body: Vec<Stmt>) -> CompiledPack {
    let config = Config {
        project_name: "pack".to_owned(),
        ..Config::default()
    };
    compile(config, &Module { body }).expect("module compiles")
}

fn try_build(body: Vec<Stmt>) -> Result<CompiledPack, CompileError> {
    compile(Config::default(), &Module { body })
}

fn slot<'a>(pack: &'a CompiledPack, path: &str) -> &'a Slot {
    pack.units
        .iter()
        .flat_map(|unit| unit.slots.values())
        .find(|slot| slot.path.to_dotted() == path)
        .unwrap_or_else(|| panic!("no file at {path}"))
}

fn lines(pack: &CompiledPack, path: &str) -> Vec<String> {
    slot(pack, path).commands.iter().map(Command::render).collect()
}

fn predicate_json(pack: &CompiledPack, path: &str) -> serde_json::Value {
    match &slot(pack, path).commands[..] {
        [Command::Json(value)] => value.clone(),
        other => panic!("expected a single predicate body, got {other:?}"),
    }
}

fn declare_score(name: &str, value: i64) -> Stmt {
    Stmt::AnnAssignment {
        targets: vec![name.to_owned()],
        data_type: "score".to_owned(),
        args: vec![],
        values: vec![Expr::int(value)],
    }
}

fn print_str(text: &str) -> Stmt {
    Stmt::Expr {
        value: Expr::Call {
            target: Box::new(Expr::name("print")),
            args: vec![Expr::str(text)],
        },
    }
}

// ── if / else ────────────────────────────────────────────────────────

#[test]
fn function_with_if_else_lowers_to_flag_wiring() {
    let pack = build(vec![Stmt::FuncDef {
        name: "main".to_owned(),
        params: vec![],
        returns: None,
        body: vec![
            declare_score("x", 5),
            Stmt::If {
                condition: Expr::Compare {
                    operands: vec![Expr::name("x"), Expr::int(3)],
                    ops: vec![CmpOp::Ge],
                },
                then: vec![print_str("big")],
                or_else: vec![print_str("small")],
            },
        ],
    }]);

    assert_eq!(
        lines(&pack, "main"),
        vec![
            "scoreboard objectives add pack.default_scoreboard dummy",
            "scoreboard players set main.x pack.default_scoreboard 5",
            "scoreboard players set main.$check--0 pack.default_scoreboard 1",
            "execute if predicate pack:main/--predicate--0 run function pack:main/--if--0",
            "execute if score main.$check--0 pack.default_scoreboard matches 1 \
             run function pack:main/--else--0",
        ]
    );

    let then_file = lines(&pack, "main.--if--0");
    assert_eq!(then_file.len(), 2);
    assert!(then_file[0].starts_with("tellraw @a"));
    assert!(then_file[0].contains("big"));
    assert_eq!(
        then_file[1],
        "scoreboard players set main.$check--0 pack.default_scoreboard 0"
    );

    let else_file = lines(&pack, "main.--else--0");
    assert_eq!(else_file.len(), 1);
    assert!(else_file[0].contains("small"));

    let predicate = predicate_json(&pack, "main.--predicate--0");
    assert_eq!(predicate["condition"], "minecraft:value_check");
    assert_eq!(predicate["range"]["min"], 3);
    assert!(predicate["range"].get("max").is_none());
    assert_eq!(predicate["value"]["target"]["name"], "main.x");
}

#[test]
fn if_without_else_emits_no_check_flag() {
    let pack = build(vec![Stmt::If {
        condition: Expr::int(1),
        then: vec![print_str("on")],
        or_else: vec![],
    }]);
    let main = lines(&pack, "--main--");
    assert_eq!(main.len(), 1);
    assert!(main[0].starts_with("execute if predicate pack:--predicate--0"));
    assert_eq!(lines(&pack, "--if--0").len(), 1);
}

#[test]
fn always_true_if_else_keeps_branches_in_their_own_files() {
    let pack = build(vec![Stmt::If {
        condition: Expr::int(1),
        then: vec![print_str("yes")],
        or_else: vec![print_str("no")],
    }]);

    assert_eq!(
        lines(&pack, "--main--"),
        vec![
            "scoreboard objectives add pack.default_scoreboard dummy",
            "scoreboard players set $check--0 pack.default_scoreboard 1",
            "execute if predicate pack:--predicate--0 run function pack:--if--0",
            "execute if score $check--0 pack.default_scoreboard matches 1 \
             run function pack:--else--0",
        ]
    );

    // Each branch's effect lives only in its own file; the then-file also
    // clears the flag that would admit the else-file.
    let then_file = lines(&pack, "--if--0");
    assert_eq!(then_file.len(), 2);
    assert!(then_file[0].contains("yes"));
    assert!(!then_file[0].contains("no"));
    assert_eq!(
        then_file[1],
        "scoreboard players set $check--0 pack.default_scoreboard 0"
    );

    let else_file = lines(&pack, "--else--0");
    assert_eq!(else_file.len(), 1);
    assert!(else_file[0].contains("no"));
    assert!(!else_file[0].contains("yes"));

    // A constant-true condition folds to a predicate that always passes.
    let predicate = predicate_json(&pack, "--predicate--0");
    assert_eq!(predicate["condition"], "minecraft:value_check");
    assert_eq!(predicate["value"], 1);
    assert_eq!(predicate["range"]["min"], 1);
    assert_eq!(predicate["range"]["max"], 1);
}

#[test]
fn always_false_if_else_gates_the_then_branch_out() {
    let pack = build(vec![Stmt::If {
        condition: Expr::int(0),
        then: vec![print_str("yes")],
        or_else: vec![print_str("no")],
    }]);

    // Wiring is identical to the true case; only the predicate differs,
    // checking a value that can never lie in the range.
    let predicate = predicate_json(&pack, "--predicate--0");
    assert_eq!(predicate["value"], 0);
    assert_eq!(predicate["range"]["min"], 1);
    assert_eq!(predicate["range"]["max"], 1);

    let main = lines(&pack, "--main--");
    assert_eq!(
        main[1],
        "scoreboard players set $check--0 pack.default_scoreboard 1"
    );
    assert!(lines(&pack, "--if--0")[0].contains("yes"));
    assert!(lines(&pack, "--else--0")[0].contains("no"));
}

#[test]
fn else_numbering_skips_ifs_without_an_else_arm() {
    let pack = build(vec![
        Stmt::If {
            condition: Expr::int(1),
            then: vec![print_str("a")],
            or_else: vec![],
        },
        Stmt::If {
            condition: Expr::int(1),
            then: vec![print_str("b")],
            or_else: vec![print_str("c")],
        },
    ]);
    // The first if draws no else-file name, so the second one's starts
    // the family at zero.
    slot(&pack, "--if--0");
    slot(&pack, "--if--1");
    assert!(lines(&pack, "--else--0")[0].contains("c"));
}

#[test]
fn sibling_ifs_get_distinct_file_names() {
    let always = || Stmt::If {
        condition: Expr::int(1),
        then: vec![print_str("x")],
        or_else: vec![],
    };
    let pack = build(vec![always(), always()]);
    // Both arm files and both predicate files exist under distinct names.
    slot(&pack, "--if--0");
    slot(&pack, "--if--1");
    slot(&pack, "--predicate--0");
    slot(&pack, "--predicate--1");
}

// ── loops ────────────────────────────────────────────────────────────

#[test]
fn while_loop_recurses_behind_its_predicate() {
    let pack = build(vec![
        declare_score("x", 3),
        Stmt::While {
            condition: Expr::Compare {
                operands: vec![Expr::name("x"), Expr::int(0)],
                ops: vec![CmpOp::Gt],
            },
            body: vec![Stmt::AugAssignment {
                op: sapling_core::ast::BinOp::Sub,
                targets: vec![Expr::name("x")],
                values: vec![Expr::int(1)],
            }],
        },
    ]);

    let gate = "execute if predicate pack:--predicate--0 run function pack:--while--0";
    let main = lines(&pack, "--main--");
    assert_eq!(main.last().map(String::as_str), Some(gate));

    let body = lines(&pack, "--while--0");
    assert_eq!(
        body,
        vec!["scoreboard players remove x pack.default_scoreboard 1", gate]
    );

    // x > 0 is NOT(x <= 0).
    let predicate = predicate_json(&pack, "--predicate--0");
    assert_eq!(predicate["condition"], "minecraft:inverted");
    assert_eq!(predicate["term"]["range"]["max"], 0);
}

#[test]
fn for_in_range_is_inclusive_and_steps_by_one() {
    let pack = build(vec![Stmt::ForIn {
        var: "i".to_owned(),
        iter: Expr::Range {
            start: Box::new(Expr::int(0)),
            end: Box::new(Expr::int(3)),
        },
        body: vec![],
    }]);

    assert_eq!(
        lines(&pack, "--main--"),
        vec![
            "scoreboard objectives add pack.default_scoreboard dummy",
            "scoreboard players set $item--0 pack.default_scoreboard 0",
            "execute if predicate pack:--predicate--0 run function pack:--for--0",
        ]
    );
    assert_eq!(
        lines(&pack, "--for--0"),
        vec![
            "scoreboard players operation --for--0.i pack.default_scoreboard \
             = $item--0 pack.default_scoreboard",
            "scoreboard players add $item--0 pack.default_scoreboard 1",
            "execute if predicate pack:--predicate--0 run function pack:--for--0",
        ]
    );

    // Inclusive upper bound: runs for 0..=3, four iterations.
    let predicate = predicate_json(&pack, "--predicate--0");
    assert_eq!(predicate["range"]["max"], 3);
    assert!(predicate["range"].get("min").is_none());
}

#[test]
fn classic_for_replays_condition_side_effects_in_the_loop_file() {
    // for (i = 0; i < 2; i += 1) {}  with the counter declared up front.
    let pack = build(vec![Stmt::For {
        init: Box::new(declare_score("i", 0)),
        condition: Expr::Compare {
            operands: vec![Expr::name("i"), Expr::int(2)],
            ops: vec![CmpOp::Lt],
        },
        step: Box::new(Stmt::AugAssignment {
            op: sapling_core::ast::BinOp::Add,
            targets: vec![Expr::name("i")],
            values: vec![Expr::int(1)],
        }),
        body: vec![],
    }]);

    let gate = "execute if predicate pack:--predicate--0 run function pack:--for--0";
    let main = lines(&pack, "--main--");
    assert_eq!(
        main,
        vec![
            "scoreboard objectives add pack.default_scoreboard dummy",
            "scoreboard players set i pack.default_scoreboard 0",
            gate,
        ]
    );
    assert_eq!(
        lines(&pack, "--for--0"),
        vec!["scoreboard players add i pack.default_scoreboard 1", gate]
    );
}

// ── functions ────────────────────────────────────────────────────────

#[test]
fn call_assigns_parameters_and_reads_the_return_slot() {
    let pack = build(vec![
        Stmt::FuncDef {
            name: "add".to_owned(),
            params: vec![
                Param {
                    target: "a".to_owned(),
                    data_type: "score".to_owned(),
                    args: vec![],
                },
                Param {
                    target: "b".to_owned(),
                    data_type: "score".to_owned(),
                    args: vec![],
                },
            ],
            returns: Some(ReturnSpec {
                data_type: "score".to_owned(),
                args: vec![],
            }),
            body: vec![Stmt::Return {
                value: Expr::Binary {
                    op: sapling_core::ast::BinOp::Add,
                    left: Box::new(Expr::name("a")),
                    right: Box::new(Expr::name("b")),
                },
            }],
        },
        Stmt::AnnAssignment {
            targets: vec!["y".to_owned()],
            data_type: "score".to_owned(),
            args: vec![],
            values: vec![Expr::Call {
                target: Box::new(Expr::name("add")),
                args: vec![Expr::int(1), Expr::int(2)],
            }],
        },
    ]);

    assert_eq!(
        lines(&pack, "add"),
        vec![
            "scoreboard objectives add pack.default_scoreboard dummy",
            "scoreboard players operation add.$temp--0 pack.default_scoreboard \
             = add.a pack.default_scoreboard",
            "scoreboard players operation add.$temp--0 pack.default_scoreboard \
             += add.b pack.default_scoreboard",
            "scoreboard players operation add.$return--0 pack.default_scoreboard \
             = add.$temp--0 pack.default_scoreboard",
        ]
    );

    assert_eq!(
        lines(&pack, "--main--"),
        vec![
            "scoreboard players set add.a pack.default_scoreboard 1",
            "scoreboard players set add.b pack.default_scoreboard 2",
            "function pack:add",
            "scoreboard players operation y pack.default_scoreboard \
             = add.$return--0 pack.default_scoreboard",
        ]
    );
}

#[test]
fn forward_call_resolves_on_the_second_pass() {
    let pack = build(vec![
        Stmt::Expr {
            value: Expr::Call {
                target: Box::new(Expr::name("later")),
                args: vec![],
            },
        },
        Stmt::FuncDef {
            name: "later".to_owned(),
            params: vec![],
            returns: None,
            body: vec![print_str("hello")],
        },
    ]);
    assert_eq!(lines(&pack, "--main--"), vec!["function pack:later"]);
    assert_eq!(lines(&pack, "later").len(), 1);
}

#[test]
fn calling_an_unbound_name_fails() {
    let err = try_build(vec![Stmt::Expr {
        value: Expr::Call {
            target: Box::new(Expr::name("nowhere")),
            args: vec![],
        },
    }])
    .unwrap_err();
    assert!(matches!(err, CompileError::UnboundName { .. }));
}

// ── constant folding ─────────────────────────────────────────────────

#[test]
fn constant_arithmetic_folds_to_a_single_set() {
    // x = (2 + 3) - 3 emits exactly one players-set of 2 and no
    // operation commands at all.
    let pack = build(vec![Stmt::AnnAssignment {
        targets: vec!["x".to_owned()],
        data_type: "score".to_owned(),
        args: vec![],
        values: vec![Expr::Binary {
            op: sapling_core::ast::BinOp::Sub,
            left: Box::new(Expr::Binary {
                op: sapling_core::ast::BinOp::Add,
                left: Box::new(Expr::int(2)),
                right: Box::new(Expr::int(3)),
            }),
            right: Box::new(Expr::int(3)),
        }],
    }]);
    assert_eq!(
        lines(&pack, "--main--"),
        vec![
            "scoreboard objectives add pack.default_scoreboard dummy",
            "scoreboard players set x pack.default_scoreboard 2",
        ]
    );
}

// ── namespaces and visibility ────────────────────────────────────────

#[test]
fn namespace_body_gets_its_own_file_and_call() {
    let pack = build(vec![Stmt::NamespaceDef {
        name: "ns".to_owned(),
        blocks: vec![NamespaceBlock {
            visibility: Visibility::Public,
            body: vec![declare_score("counter", 1)],
        }],
    }]);
    assert_eq!(
        lines(&pack, "--main--"),
        vec!["function pack:--namespace--ns--"]
    );
    assert_eq!(
        lines(&pack, "--namespace--ns--"),
        vec![
            "scoreboard objectives add pack.default_scoreboard dummy",
            "scoreboard players set ns.counter pack.default_scoreboard 1",
        ]
    );
}

#[test]
fn public_namespace_members_are_reachable_by_dotted_path() {
    let pack = build(vec![
        Stmt::NamespaceDef {
            name: "ns".to_owned(),
            blocks: vec![NamespaceBlock {
                visibility: Visibility::Public,
                body: vec![declare_score("counter", 1)],
            }],
        },
        Stmt::AugAssignment {
            op: sapling_core::ast::BinOp::Add,
            targets: vec![Expr::name("ns.counter")],
            values: vec![Expr::int(2)],
        },
    ]);
    assert_eq!(
        lines(&pack, "--main--").last().map(String::as_str),
        Some("scoreboard players add ns.counter pack.default_scoreboard 2")
    );
}

#[test]
fn private_namespace_members_are_hidden_from_outside() {
    let err = try_build(vec![
        Stmt::NamespaceDef {
            name: "ns".to_owned(),
            blocks: vec![NamespaceBlock {
                visibility: Visibility::Private,
                body: vec![declare_score("secret", 1)],
            }],
        },
        print_from("ns.secret"),
    ])
    .unwrap_err();
    assert!(matches!(err, CompileError::HiddenName { .. }));
}

fn print_from(name: &str) -> Stmt {
    Stmt::Expr {
        value: Expr::Call {
            target: Box::new(Expr::name("print")),
            args: vec![Expr::name(name)],
        },
    }
}
