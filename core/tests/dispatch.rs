use std::cell::RefCell;
use std::rc::Rc;

use manage_script_core::*;
use serde_json::Value;

/// Application that records what its factory saw and every context change.
#[derive(Debug, Default)]
struct RecordingApp {
    events: Rc<RefCell<Vec<String>>>,
}

impl Application for RecordingApp {
    fn push_context(&mut self) {
        self.events.borrow_mut().push("push".to_string());
    }

    fn pop_context(&mut self) {
        self.events.borrow_mut().push("pop".to_string());
    }
}

type Log = Rc<RefCell<Vec<String>>>;

fn manager_with_log() -> (Manager<RecordingApp>, Log) {
    let log: Log = Rc::default();
    let events = Rc::clone(&log);
    let mut manager = Manager::new(move |flags: &ParsedFlags| {
        events
            .borrow_mut()
            .push(format!("factory config={:?}", flags.string("config")));
        Ok(RecordingApp {
            events: Rc::clone(&events),
        })
    });
    manager
        .add_option(FlagDescriptor::optional(["-c", "--config"]))
        .unwrap();
    (manager, log)
}

fn recorder(
    log: &Log,
    line: impl Fn(&ParsedFlags) -> String + 'static,
) -> impl Fn(&mut RecordingApp, &ParsedFlags) -> anyhow::Result<Option<i32>> + 'static {
    let log = Rc::clone(log);
    move |_app, flags| {
        log.borrow_mut().push(line(flags));
        Ok(None)
    }
}

fn lines(log: &Log) -> Vec<String> {
    log.borrow()
        .iter()
        .filter(|line| !line.starts_with("factory") && *line != "push" && *line != "pop")
        .cloned()
        .collect()
}

#[test]
fn positional_binds_in_order() {
    let (mut manager, log) = manager_with_log();
    manager
        .command(
            "hello",
            &Signature::new().arg("name"),
            recorder(&log, |flags| format!("hello {}", flags.str("name").unwrap_or_default())),
        )
        .unwrap();

    let outcome = manager.dispatch("manage", ["hello", "joe"]).unwrap();
    assert_eq!(outcome, Outcome::Completed(0));
    assert_eq!(lines(&log), vec!["hello joe"]);
}

#[test]
fn wrong_positional_count_is_usage_error() {
    let (mut manager, log) = manager_with_log();
    manager
        .command(
            "copy",
            &Signature::new().arg("src").arg("dst"),
            recorder(&log, |flags| {
                format!("{:?} {:?}", flags.str("src"), flags.str("dst"))
            }),
        )
        .unwrap();

    for args in [&["copy", "a"][..], &["copy", "a", "b", "c"][..]] {
        let err = manager.dispatch("manage", args.iter().copied()).unwrap_err();
        assert!(matches!(err, Error::Usage(_)), "{args:?}: {err:?}");
        assert_eq!(err.exit_code(), 2);
    }
    assert!(log.borrow().is_empty(), "factory and body must not run");

    manager.dispatch("manage", ["copy", "a", "b"]).unwrap();
    assert_eq!(lines(&log), vec![r#"Some("a") Some("b")"#]);
}

#[test]
fn derived_option_accepts_long_and_short() {
    let (mut manager, log) = manager_with_log();
    manager
        .command(
            "hello",
            &Signature::new().arg_with_default("name", "fred"),
            recorder(&log, |flags| format!("hello {}", flags.str("name").unwrap_or_default())),
        )
        .unwrap();

    manager.dispatch("manage", ["hello", "--name=joe"]).unwrap();
    manager.dispatch("manage", ["hello", "-n", "joe"]).unwrap();
    manager.dispatch("manage", ["hello"]).unwrap();
    assert_eq!(lines(&log), vec!["hello joe", "hello joe", "hello fred"]);
}

#[test]
fn boolean_defaults_toggle() {
    let (mut manager, log) = manager_with_log();
    let verdict = |flags: &ParsedFlags| {
        format!(
            "verified={} loud={}",
            flags.bool("verified"),
            flags.bool("loud")
        )
    };
    manager
        .command(
            "verify",
            &Signature::new()
                .arg_with_default("verified", false)
                .arg_with_default("loud", true),
            recorder(&log, verdict),
        )
        .unwrap();

    manager.dispatch("manage", ["verify"]).unwrap();
    manager.dispatch("manage", ["verify", "--verified", "-l"]).unwrap();
    assert_eq!(
        lines(&log),
        vec!["verified=false loud=true", "verified=true loud=false"]
    );

    // Toggles never take a value.
    assert!(manager.dispatch("manage", ["verify", "-v", "yes"]).is_err());
}

#[test]
fn typed_defaults_parse_values() {
    let (mut manager, log) = manager_with_log();
    manager
        .command(
            "serve",
            &Signature::new()
                .arg_with_default("port", 5000)
                .arg_with_default("ratio", 0.5),
            recorder(&log, |flags| {
                format!("{:?} {:?}", flags.i64("port"), flags.f64("ratio"))
            }),
        )
        .unwrap();

    manager
        .dispatch("manage", ["serve", "--port", "8080", "-r", "0.25"])
        .unwrap();
    manager.dispatch("manage", ["serve"]).unwrap();
    assert_eq!(
        lines(&log),
        vec!["Some(8080) Some(0.25)", "Some(5000) Some(0.5)"]
    );

    let err = manager
        .dispatch("manage", ["serve", "--port", "http"])
        .unwrap_err();
    assert_eq!(err.exit_code(), 2);
}

#[test]
fn unknown_command_reports_available_names() {
    let (mut manager, log) = manager_with_log();
    manager
        .command("hello", &Signature::new(), recorder(&log, |_| "hello".into()))
        .unwrap();

    let err = manager.dispatch("manage", ["bogus"]).unwrap_err();
    match &err {
        Error::CommandNotFound { name, available } => {
            assert_eq!(name, "bogus");
            assert_eq!(available, &vec!["hello".to_string()]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.exit_code(), 2);
    assert!(log.borrow().is_empty());
}

#[test]
fn missing_command_lists_usage() {
    let (mut manager, log) = manager_with_log();
    manager
        .add_command(
            Command::new("hello", recorder(&log, |_| "hello".into()))
                .with_description("Prints hello\n\nLonger description."),
        )
        .unwrap();

    let err = manager.dispatch("manage", Vec::<String>::new()).unwrap_err();
    let Error::NoCommand { usage } = &err else {
        panic!("unexpected error: {err:?}");
    };
    assert!(usage.contains("hello"));
    assert!(usage.contains("Prints hello"));
    assert!(!usage.contains("Longer description."));
    assert_eq!(err.exit_code(), 2);
}

#[test]
fn default_command_runs_without_arguments() {
    let log: Log = Rc::default();
    let mut manager: Manager<()> = Manager::new(|_| Ok(())).with_default_command("status");
    let sink = Rc::clone(&log);
    manager
        .add_command(Command::new("status", move |_, _| {
            sink.borrow_mut().push("status".to_string());
            Ok(None)
        }))
        .unwrap();

    manager.dispatch("manage", Vec::<String>::new()).unwrap();
    assert_eq!(*log.borrow(), vec!["status"]);
}

#[test]
fn catch_all_keeps_undeclared_tokens_in_order() {
    let (mut manager, log) = manager_with_log();
    manager
        .add_command(
            Command::new(
                "catch",
                recorder(&log, |flags| {
                    format!("foo={} rest={:?}", flags.bool("foo"), flags.remaining())
                }),
            )
            .option(FlagDescriptor::optional(["--foo"]).with_action(FlagAction::StoreTrue))
            .capture_all_args(),
        )
        .unwrap();

    manager
        .dispatch("manage", ["catch", "pos1", "--foo", "pos2", "--bar"])
        .unwrap();
    assert_eq!(
        lines(&log),
        vec![r#"foo=true rest=["pos1", "pos2", "--bar"]"#]
    );
}

#[test]
fn namespace_groups_commands() {
    let (mut manager, log) = manager_with_log();
    for name in ["init", "drop"] {
        manager
            .add_command(
                Command::new(name, recorder(&log, move |_| format!("db {name}")))
                    .in_namespace("db"),
            )
            .unwrap();
    }

    assert_eq!(manager.command_names(), vec!["db"]);
    manager.dispatch("manage", ["db", "init"]).unwrap();
    manager.dispatch("manage", ["db", "drop"]).unwrap();
    assert_eq!(lines(&log), vec!["db init", "db drop"]);

    let err = manager.dispatch("manage", ["db"]).unwrap_err();
    assert!(matches!(err, Error::NoCommand { .. }));
    let err = manager.dispatch("manage", ["init"]).unwrap_err();
    assert!(matches!(err, Error::CommandNotFound { .. }));
}

#[test]
fn nested_manager_dispatches_with_help_text() {
    let (mut manager, log) = manager_with_log();
    let mut db = Manager::group().with_usage("Perform database operations");
    db.add_command(Command::new("init", recorder(&log, |_| "init".into())))
        .unwrap();
    manager.add_manager("db", db).unwrap();

    manager.dispatch("manage", ["db", "init"]).unwrap();
    assert_eq!(lines(&log), vec!["init"]);

    let Outcome::Help(text) = manager.dispatch("manage", ["--help"]).unwrap() else {
        panic!("expected help");
    };
    assert!(text.contains("Perform database operations"));
}

#[test]
fn global_flags_reach_factory_from_either_side() {
    let (mut manager, log) = manager_with_log();
    manager
        .command(
            "hello",
            &Signature::new().arg("name"),
            recorder(&log, |flags| format!("hello {}", flags.str("name").unwrap_or_default())),
        )
        .unwrap();

    manager
        .dispatch("manage", ["-c", "dev.yml", "hello", "joe"])
        .unwrap();
    manager
        .dispatch("manage", ["hello", "joe", "--config=prod.yml"])
        .unwrap();

    let factory: Vec<String> = log
        .borrow()
        .iter()
        .filter(|line| line.starts_with("factory"))
        .cloned()
        .collect();
    assert_eq!(
        factory,
        vec![
            r#"factory config=Some("dev.yml")"#,
            r#"factory config=Some("prod.yml")"#,
        ]
    );
    assert_eq!(lines(&log), vec!["hello joe", "hello joe"]);
}

#[test]
fn command_never_sees_global_of_same_name() {
    let (mut manager, log) = manager_with_log();
    manager
        .add_command(
            Command::new(
                "show",
                recorder(&log, |flags| format!("local={:?}", flags.string("config"))),
            )
            .option(FlagDescriptor::optional(["--config"])),
        )
        .unwrap();

    manager
        .dispatch("manage", ["show", "--config", "global.yml"])
        .unwrap();
    let entries = log.borrow().clone();
    assert!(entries.contains(&r#"factory config=Some("global.yml")"#.to_string()));
    assert!(entries.contains(&"local=None".to_string()));
}

#[test]
fn body_runs_inside_context_and_errors_pass_through() {
    let (mut manager, log) = manager_with_log();
    manager
        .add_command(Command::new("fail", |app: &mut RecordingApp, _: &ParsedFlags| {
            app.events.borrow_mut().push("body".to_string());
            anyhow::bail!("disk full")
        }))
        .unwrap();
    manager
        .add_command(Command::new("exit", |_, _| Ok(Some(3))))
        .unwrap();

    let err = manager.dispatch("manage", ["fail"]).unwrap_err();
    assert!(matches!(&err, Error::Command(source) if source.to_string() == "disk full"));
    assert_eq!(err.exit_code(), 1);
    assert_eq!(
        *log.borrow(),
        vec!["factory config=None", "push", "body", "pop"]
    );

    assert_eq!(
        manager.dispatch("manage", ["exit"]).unwrap(),
        Outcome::Completed(3)
    );
}

#[test]
fn factory_error_is_reported() {
    let mut manager: Manager<()> = Manager::new(|_| anyhow::bail!("no config"));
    manager
        .add_command(Command::new("hello", |_, _| Ok(None)))
        .unwrap();

    let err = manager.dispatch("manage", ["hello"]).unwrap_err();
    assert!(matches!(err, Error::AppFactory(_)));
    assert!(err.to_string().contains("no config"));
    assert_eq!(err.exit_code(), 1);
}

#[test]
fn help_requests_short_circuit() {
    let (mut manager, log) = manager_with_log();
    manager
        .add_command(
            Command::from_signature(
                "hello",
                &Signature::new().arg("name").arg_with_default("url", Value::Null),
                recorder(&log, |_| "hello".into()),
            )
            .unwrap()
            .with_description("Says hello\n\nUses the url when given."),
        )
        .unwrap();
    manager
        .add_command(
            Command::new("verify", recorder(&log, |_| "verify".into()))
                .with_description("Checks if verified"),
        )
        .unwrap();

    for args in [&["--help"][..], &["-?"][..], &["bogus", "-h"][..]] {
        let outcome = manager.dispatch("manage", args.iter().copied()).unwrap();
        let Outcome::Help(text) = &outcome else {
            panic!("{args:?}: expected help, got {outcome:?}");
        };
        assert!(text.contains("Says hello"), "{args:?}: {text}");
        assert!(text.contains("Checks if verified"), "{args:?}: {text}");
        assert_eq!(outcome.exit_code(), 0);
    }

    let Outcome::Help(text) = manager.dispatch("manage", ["hello", "--help"]).unwrap() else {
        panic!("expected command help");
    };
    assert!(text.contains("Uses the url when given."));
    assert!(text.contains("--url"));
    assert!(!text.contains("Checks if verified"));

    assert!(log.borrow().is_empty(), "help must not run anything");
}

#[test]
fn dynamic_flags_are_computed_per_dispatch() {
    let default_name = Rc::new(RefCell::new("Joe".to_string()));
    let source = Rc::clone(&default_name);
    let (mut manager, log) = manager_with_log();
    manager
        .add_command(Command::dynamic(
            "simple",
            move || {
                vec![
                    FlagDescriptor::optional(["-n", "--name"])
                        .with_default(source.borrow().clone())
                        .into(),
                ]
            },
            recorder(&log, |flags| flags.string("name").unwrap_or_default()),
        ))
        .unwrap();

    manager.dispatch("manage", ["simple"]).unwrap();
    *default_name.borrow_mut() = "Fred".to_string();
    manager.dispatch("manage", ["simple"]).unwrap();
    manager.dispatch("manage", ["simple", "-n", "Ann"]).unwrap();
    assert_eq!(lines(&log), vec!["Joe", "Fred", "Ann"]);
}

#[test]
fn registration_errors_surface_eagerly() {
    let mut manager: Manager<()> = Manager::new(|_| Ok(()));

    let err = manager
        .command(
            "clash",
            &Signature::new()
                .arg_with_default("name", "x")
                .arg_with_default("number", 1),
            |_, _| Ok(None),
        )
        .unwrap_err();
    assert!(matches!(err, Error::FlagConflict { ref flag, .. } if flag == "-n"));

    let err = manager
        .add_command(
            Command::new("export", |_, _| Ok(None)).group(
                FlagGroup::new([FlagDescriptor::optional(["--json"])])
                    .with_title("Output")
                    .exclusive(),
            ),
        )
        .unwrap_err();
    assert!(matches!(err, Error::Misconfigured(_)));

    let err = manager
        .add_command(
            Command::new("dup", |_, _| Ok(None))
                .option(FlagDescriptor::optional(["-x", "--exact"]))
                .option(FlagDescriptor::optional(["-x", "--extra"])),
        )
        .unwrap_err();
    assert!(matches!(err, Error::Validation(ValidationError::DuplicateFlag(_))));

    assert!(manager.command_names().is_empty());
}

#[test]
fn typed_global_options_deserialize() {
    #[derive(serde::Deserialize)]
    struct Globals {
        config: Option<String>,
        verbose: u64,
    }

    let seen = Rc::new(RefCell::new(None));
    let sink = Rc::clone(&seen);
    let mut manager: Manager<()> = Manager::new(move |flags: &ParsedFlags| {
        let globals: Globals = flags.deserialize()?;
        *sink.borrow_mut() = Some((globals.config, globals.verbose));
        Ok(())
    });
    manager
        .add_option(FlagDescriptor::optional(["-c", "--config"]))
        .unwrap();
    manager
        .add_option(FlagDescriptor::optional(["-v", "--verbose"]).with_action(FlagAction::Count))
        .unwrap();
    manager
        .add_command(Command::new("noop", |_, _| Ok(None)))
        .unwrap();

    manager.dispatch("manage", ["-v", "noop", "-v"]).unwrap();
    assert_eq!(*seen.borrow(), Some((None, 2)));
}

#[test]
fn required_global_does_not_block_help() {
    let mut manager: Manager<RecordingApp> = Manager::new(|_| Ok(RecordingApp::default()));
    manager
        .add_option(FlagDescriptor::optional(["-c", "--config"]).required())
        .unwrap();
    manager
        .command("hello", &Signature::new().arg("name"), |_, _| Ok(None))
        .unwrap();

    for args in [&["--help"][..], &["hello", "-h"][..]] {
        let outcome = manager.dispatch("manage", args.iter().copied()).unwrap();
        assert!(matches!(outcome, Outcome::Help(_)), "{args:?}: {outcome:?}");
    }

    let err = manager.dispatch("manage", ["hello", "joe"]).unwrap_err();
    assert!(matches!(err, Error::Usage(_)), "{err:?}");
    assert!(manager.dispatch("manage", ["hello", "joe", "-c", "app.yml"]).is_ok());
}

#[test]
fn help_after_unknown_flag_shows_command_help() {
    let (mut manager, log) = manager_with_log();
    manager
        .add_command(
            Command::from_signature(
                "hello",
                &Signature::new().arg("name").arg_with_default("url", Value::Null),
                recorder(&log, |_| "hello".into()),
            )
            .unwrap()
            .with_description("Says hello"),
        )
        .unwrap();

    let outcome = manager
        .dispatch("manage", ["hello", "joe", "--bogus", "-h"])
        .unwrap();
    let Outcome::Help(text) = &outcome else {
        panic!("expected command help, got {outcome:?}");
    };
    assert!(text.contains("--url"), "{text}");
    assert_eq!(outcome.exit_code(), 0);

    // After `--` the token is a plain value.
    let err = manager
        .dispatch("manage", ["hello", "joe", "--", "-h"])
        .unwrap_err();
    assert!(matches!(err, Error::Usage(_)), "{err:?}");
    assert!(log.borrow().is_empty());
}

#[test]
fn flags_added_to_dynamic_command_fail_registration() {
    let mut manager: Manager<()> = Manager::new(|_| Ok(()));
    let err = manager
        .add_command(
            Command::dynamic("who", Vec::new, |_, _| Ok(None))
                .option(FlagDescriptor::optional(["-n", "--name"])),
        )
        .unwrap_err();
    assert!(matches!(err, Error::Misconfigured(_)), "{err:?}");
    assert!(manager.get_command("who").is_none());
}
