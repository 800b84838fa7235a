//! CLI for the pyedit tool.

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use indexmap::IndexMap;
use pyedit::diff::colorize;
use pyedit::prelude::*;
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pyedit")]
#[command(author, version, about = "Structural editing of Python source", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GlobalArgs {
    /// File, directory or glob pattern to operate on
    #[arg(short, long, global = true)]
    root: Option<PathBuf>,

    /// JSON session configuration
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Preview changes without applying
    #[arg(long, global = true)]
    dry_run: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List classes and functions in the working set
    List,

    /// Print the source of a class, function or Class.method
    Show { element: String },

    /// Rename a class
    RenameClass { old: String, new: String },

    /// Rename a module-level function
    RenameFunction { old: String, new: String },

    /// Rename a method
    RenameMethod {
        class: String,
        old: String,
        new: String,
    },

    /// Add a class attribute
    AddAttribute {
        class: String,
        name: String,

        /// Type annotation
        #[arg(short = 't', long = "type")]
        annotation: Option<String>,

        /// Default value
        #[arg(long)]
        value: Option<String>,
    },

    /// Add a parameter to a function or Class.method
    AddParameter {
        element: String,
        name: String,

        /// Type annotation
        #[arg(short = 't', long = "type")]
        annotation: Option<String>,

        /// Default value
        #[arg(short, long)]
        default: Option<String>,

        /// Insert after self/cls instead of at the end
        #[arg(long)]
        start: bool,
    },

    /// Remove a parameter from a function or Class.method
    RemoveParameter { element: String, name: String },

    /// Add a decorator to a class, function or Class.method
    AddDecorator { element: String, decorator: String },

    /// Remove a decorator by name
    RemoveDecorator { element: String, name: String },

    /// Add an import statement to a file
    AddImport { file: PathBuf, statement: String },

    /// Generate dunder methods from class attributes
    Generate {
        class: String,

        #[arg(long)]
        init: bool,

        #[arg(long)]
        repr: bool,

        #[arg(long)]
        eq: bool,

        #[arg(long)]
        hash: bool,

        /// Replace existing methods
        #[arg(long)]
        overwrite: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.global.verbose);

    let session = open_session(&cli.global)?;
    let json = cli.global.json;

    let ok = match cli.command {
        Commands::List => cmd_list(&session, json)?,
        Commands::Show { element } => report(&lookup(&session, &element).get_content(), json, true)?,
        Commands::RenameClass { old, new } => report(&session.find_class(&old).rename(&new), json, false)?,
        Commands::RenameFunction { old, new } => {
            report(&session.find_function(&old).rename(&new), json, false)?
        }
        Commands::RenameMethod { class, old, new } => report(
            &session.find_class(&class).find_method(&old).rename(&new),
            json,
            false,
        )?,
        Commands::AddAttribute {
            class,
            name,
            annotation,
            value,
        } => report(
            &session
                .find_class(&class)
                .add_attribute(&name, annotation.as_deref(), value.as_deref()),
            json,
            false,
        )?,
        Commands::AddParameter {
            element,
            name,
            annotation,
            default,
            start,
        } => {
            let mut spec = ParameterSpec::new(name);
            if let Some(annotation) = annotation {
                spec = spec.annotation(annotation);
            }
            if let Some(default) = default {
                spec = spec.default_value(default);
            }
            if start {
                spec = spec.position(ParameterPosition::Start);
            }
            report(&lookup(&session, &element).add_parameter(spec), json, false)?
        }
        Commands::RemoveParameter { element, name } => {
            report(&lookup(&session, &element).remove_parameter(&name), json, false)?
        }
        Commands::AddDecorator { element, decorator } => {
            let decorator = decorator.trim_start_matches('@');
            report(&lookup(&session, &element).add_decorator(decorator), json, false)?
        }
        Commands::RemoveDecorator { element, name } => {
            let name = name.trim_start_matches('@');
            report(&lookup(&session, &element).remove_decorator(name), json, false)?
        }
        Commands::AddImport { file, statement } => {
            report(&session.file(file).add_import(&statement), json, false)?
        }
        Commands::Generate {
            class,
            init,
            repr,
            eq,
            hash,
            overwrite,
        } => {
            let selected: Vec<DunderKind> = [
                (init, DunderKind::Init),
                (repr, DunderKind::Repr),
                (eq, DunderKind::Eq),
                (hash, DunderKind::Hash),
            ]
            .into_iter()
            .filter_map(|(on, kind)| on.then_some(kind))
            .collect();
            let kinds = if selected.is_empty() {
                DunderKind::ALL.to_vec()
            } else {
                selected
            };

            let target = session.find_class(&class);
            let batch = BatchResult::new(
                kinds
                    .into_iter()
                    .map(|kind| target.generate_dunder(kind, overwrite))
                    .collect(),
            );
            report_batch(&batch, json)?
        }
    };

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn open_session(args: &GlobalArgs) -> Result<Session> {
    let mut config = match &args.config {
        Some(path) => SessionConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => SessionConfig::default(),
    };
    if let Some(root) = &args.root {
        config.root = root.clone();
    }
    if args.dry_run {
        config.dry_run = true;
    }
    Session::new(config).context("Invalid session configuration")
}

/// Resolves `Class.method`, or a bare class or function name.
fn lookup<'s>(session: &'s Session, element: &str) -> Target<'s> {
    if let Some((class, method)) = element.rsplit_once('.') {
        return session.find_class(class).find_method(method);
    }
    let class = session.find_class(element);
    if class.is_error() {
        let function = session.find_function(element);
        if !function.is_error() {
            return function;
        }
    }
    class
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("Failed to serialize result")?;
    println!("{text}");
    Ok(())
}

fn report(result: &EditResult, json: bool, show_data: bool) -> Result<bool> {
    if json {
        print_json(result)?;
        return Ok(result.success);
    }

    if result.success {
        if show_data && let Some(text) = result.data_str() {
            println!("{text}");
        } else {
            println!("{}", result.message);
        }
        if let Some(diff) = &result.diff {
            println!("{}", colorize(diff));
        }
    } else {
        eprintln!("error: {}", result.message);
    }
    Ok(result.success)
}

fn report_batch(batch: &BatchResult, json: bool) -> Result<bool> {
    if json {
        print_json(batch)?;
        return Ok(batch.success());
    }

    for result in batch.iter() {
        if result.success {
            println!("{}", result.message);
        } else {
            eprintln!("error: {}", result.message);
        }
    }
    if let Some(diff) = batch.diff() {
        println!("{}", colorize(&diff));
    }
    println!("\n{batch}");
    Ok(batch.success())
}

#[derive(Serialize)]
struct Listing {
    files: IndexMap<PathBuf, pyedit::cst::PositionIndex>,
}

fn cmd_list(session: &Session, json: bool) -> Result<bool> {
    let files = session.files().context("Failed to collect files")?;
    if files.is_empty() {
        bail!("No Python files found under {}", session.config().root.display());
    }

    let mut listing = Listing {
        files: IndexMap::new(),
    };
    for file in files {
        match session.parse(file) {
            Ok(tree) => {
                listing.files.insert(file.clone(), tree.positions());
            }
            Err(e) => eprintln!("warning: skipping {}: {e}", file.display()),
        }
    }

    if json {
        print_json(&listing)?;
        return Ok(true);
    }

    for (file, index) in &listing.files {
        if index.classes.is_empty() && index.functions.is_empty() {
            continue;
        }
        println!("{}", file.display());
        for class in &index.classes {
            println!("  {:>5}  class {}", class.start_line, class.name);
            for method in &class.methods {
                let prefix = if method.is_async { "async def" } else { "def" };
                println!("  {:>5}    {prefix} {}", method.start_line, method.name);
            }
        }
        for function in &index.functions {
            let prefix = if function.is_async { "async def" } else { "def" };
            println!("  {:>5}  {prefix} {}", function.start_line, function.name);
        }
    }
    Ok(true)
}
