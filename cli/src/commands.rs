//! Commands registered on the demo `manage` entry point.

use std::collections::BTreeMap;
use std::io;

use anyhow::bail;
use manage_script_core::{
    Command, CommandOption, FlagAction, FlagDescriptor, FlagGroup, Manager, ParsedFlags, Result,
    Signature, descriptors, prompt_bool,
};
use serde_json::Value;

use crate::app::DemoApp;

/// Builds the root manager with every demo command registered.
pub fn build_manager() -> Result<Manager<DemoApp>> {
    let mut manager = Manager::new(DemoApp::from_flags)
        .with_description("Demo management commands");
    manager.add_option(
        FlagDescriptor::optional(["-c", "--config"])
            .with_metavar("PATH")
            .with_help("YAML config file (defaults to $APP_CONFIG)"),
    )?;

    manager.add_command(
        Command::from_signature(
            "hello",
            &Signature::new().arg("name").arg_with_default("url", Value::Null),
            hello,
        )?
        .with_description("Says hello to NAME"),
    )?;
    manager.add_command(
        Command::from_signature(
            "greet",
            &Signature::new().arg_with_default("name", "fred"),
            greet,
        )?
        .with_description("Greets someone, fred unless told otherwise"),
    )?;
    manager.add_command(
        Command::from_signature(
            "verify",
            &Signature::new().arg_with_default("verified", false),
            verify,
        )?
        .with_description("Checks if verified"),
    )?;

    manager.add_command(
        Command::new("optional", optional).with_description("Prints name and url if given"),
    )?;
    manager.option(
        "optional",
        FlagDescriptor::optional(["-n", "--name"]).with_help("name to pass in"),
    )?;
    manager.option(
        "optional",
        FlagDescriptor::optional(["-u", "--url"]).with_help("url to pass in"),
    )?;

    manager.add_command(
        Command::dynamic("whoami", whoami_flags, whoami)
            .with_description("Prints the current user, or the one given"),
    )?;

    manager.add_command(
        Command::from_signature(
            "dumpconfig",
            &Signature::new().arg_with_default("output", Value::Null),
            dumpconfig,
        )?
        .with_description("Prints the loaded configuration as YAML\n\nWith --output, writes it to a file instead."),
    )?;
    manager.add_command(
        Command::new("export", export)
            .with_description("Prints the configuration in one format")
            .group(
                FlagGroup::new([
                    FlagDescriptor::optional(["--json"]).with_action(FlagAction::StoreTrue),
                    FlagDescriptor::optional(["--yaml"]).with_action(FlagAction::StoreTrue),
                ])
                .exclusive()
                .required(),
            ),
    )?;

    manager.add_command(
        Command::new("catch", catch)
            .with_description("Echoes every argument it was not told about")
            .option(FlagDescriptor::optional(["--foo"]).with_action(FlagAction::StoreTrue))
            .capture_all_args(),
    )?;

    manager.add_command(
        Command::new("init", db_init)
            .with_description("Creates the database")
            .in_namespace("db"),
    )?;
    manager.add_command(
        Command::new("drop", db_drop)
            .with_description("Drops the database")
            .option(
                FlagDescriptor::optional(["-y", "--yes"])
                    .with_action(FlagAction::StoreTrue)
                    .with_help("do not ask for confirmation"),
            )
            .in_namespace("db"),
    )?;

    manager.add_command(
        Command::new("fail", fail)
            .with_description("Always fails")
            .unscoped(),
    )?;

    let catalog = flag_catalog(&manager, "");
    manager.add_command(
        Command::from_signature(
            "flags",
            &Signature::new().arg("command"),
            move |_app, flags| print_flags(&catalog, flags),
        )?
        .with_description("Prints the flags a command was registered with, as YAML")
        .unscoped(),
    )?;

    Ok(manager)
}

/// Flag declarations of every command, keyed by its full name (`db drop`).
fn flag_catalog<A>(manager: &Manager<A>, prefix: &str) -> BTreeMap<String, Vec<FlagDescriptor>> {
    let mut catalog = BTreeMap::new();
    for name in manager.command_names() {
        let full = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{prefix} {name}")
        };
        if let Some(command) = manager.get_command(&name) {
            let flags = descriptors(&command.get_flags()).into_iter().cloned().collect();
            catalog.insert(full, flags);
        } else if let Some(sub) = manager.get_manager(&name) {
            catalog.extend(flag_catalog(sub, &full));
        }
    }
    catalog
}

fn print_flags(
    catalog: &BTreeMap<String, Vec<FlagDescriptor>>,
    flags: &ParsedFlags,
) -> anyhow::Result<Option<i32>> {
    let name = flags.str("command").unwrap_or_default();
    let Some(declared) = catalog.get(name) else {
        bail!("unknown command `{name}`");
    };
    print!("{}", serde_yaml::to_string(declared)?);
    Ok(None)
}

fn hello(_app: &mut DemoApp, flags: &ParsedFlags) -> anyhow::Result<Option<i32>> {
    let name = flags.str("name").unwrap_or_default();
    match flags.str("url") {
        Some(url) => println!("hello {name} from {url}"),
        None => println!("hello {name}"),
    }
    Ok(None)
}

fn greet(_app: &mut DemoApp, flags: &ParsedFlags) -> anyhow::Result<Option<i32>> {
    println!("hello {}", flags.str("name").unwrap_or_default());
    Ok(None)
}

fn verify(_app: &mut DemoApp, flags: &ParsedFlags) -> anyhow::Result<Option<i32>> {
    println!("{}", if flags.bool("verified") { "YES" } else { "NO" });
    Ok(None)
}

fn optional(_app: &mut DemoApp, flags: &ParsedFlags) -> anyhow::Result<Option<i32>> {
    match (flags.str("name"), flags.str("url")) {
        (Some(name), Some(url)) => println!("hello {name} from {url}"),
        (Some(name), None) => println!("hello {name}"),
        (None, _) => println!("hello"),
    }
    Ok(None)
}

fn whoami_flags() -> Vec<CommandOption> {
    let user = std::env::var("USER").unwrap_or_else(|_| "nobody".to_string());
    vec![
        FlagDescriptor::optional(["-n", "--name"])
            .with_default(user)
            .with_help("user to report")
            .into(),
    ]
}

fn whoami(_app: &mut DemoApp, flags: &ParsedFlags) -> anyhow::Result<Option<i32>> {
    println!("{}", flags.str("name").unwrap_or_default());
    Ok(None)
}

fn dumpconfig(app: &mut DemoApp, flags: &ParsedFlags) -> anyhow::Result<Option<i32>> {
    if let Some(output) = flags.str("output") {
        app.config.save(output)?;
        println!("wrote {output}");
        return Ok(None);
    }
    if let Some(path) = &app.config_path {
        println!("# {}", path.display());
    }
    print!("{}", serde_yaml::to_string(&app.config)?);
    Ok(None)
}

fn export(app: &mut DemoApp, flags: &ParsedFlags) -> anyhow::Result<Option<i32>> {
    if flags.bool("json") {
        println!("{}", serde_json::to_string_pretty(&app.config)?);
    } else {
        print!("{}", serde_yaml::to_string(&app.config)?);
    }
    Ok(None)
}

fn catch(_app: &mut DemoApp, flags: &ParsedFlags) -> anyhow::Result<Option<i32>> {
    println!("foo={}", flags.bool("foo"));
    println!("remaining={}", serde_json::to_string(flags.remaining())?);
    Ok(None)
}

fn db_init(app: &mut DemoApp, _flags: &ParsedFlags) -> anyhow::Result<Option<i32>> {
    if !app.in_context() {
        bail!("db init must run inside the app context");
    }
    println!("initialized {}", app.config.database_url);
    Ok(None)
}

fn db_drop(app: &mut DemoApp, flags: &ParsedFlags) -> anyhow::Result<Option<i32>> {
    if !flags.bool("yes") {
        let question = format!("Drop {}?", app.config.database_url);
        if !prompt_bool(&mut io::stdin().lock(), &mut io::stdout(), &question, false)? {
            eprintln!("not dropping {}", app.config.database_url);
            return Ok(Some(1));
        }
    }
    println!("dropped {}", app.config.database_url);
    Ok(None)
}

fn fail(_app: &mut DemoApp, _flags: &ParsedFlags) -> anyhow::Result<Option<i32>> {
    bail!("something went wrong")
}
