//! Tabula - interactive shell

use anyhow::{bail, Context};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing_subscriber::EnvFilter;

use tabula::executor::ExecutionEngine;
use tabula::Config;

const PROMPT: &str = "tabula> ";

/// Print welcome banner
fn print_banner(engine: &ExecutionEngine) {
    println!("{}", "=".repeat(60));
    println!("Tabula - interactive SQL shell");
    println!("{}", "=".repeat(60));
    println!("Database: {}", engine.database().name());
    if let Some(path) = &engine.config().snapshot_path {
        println!("Snapshot: {}", path.display());
    }
    println!("Type 'help' for commands, 'exit' or 'quit' to exit");
    println!();
}

/// Print help message
fn print_help() {
    println!(
        r#"
SQL Commands:
  CREATE TABLE name (col TYPE [PRIMARY KEY | UNIQUE | NOT NULL], ...)
  DROP TABLE name
  INSERT INTO name [(col1, col2)] VALUES (val1, val2)
  SELECT col1, col2 FROM name [WHERE col op value]
  SELECT * FROM t1 [INNER | LEFT] JOIN t2 ON t1.col = t2.col
  UPDATE name SET col1 = val1 [WHERE col op value]
  DELETE FROM name [WHERE col op value]
  CREATE [UNIQUE] INDEX idx_name ON table (column)

Data Types:
  INTEGER, FLOAT, VARCHAR(n), BOOLEAN, DATE

Shell Commands:
  help               Show this help
  tables             List all tables
  describe <table>   Show table structure
  save [path]        Write a snapshot
  exit | quit        Exit the shell
"#
    );
}

fn print_usage() {
    println!("Usage: tabula-cli [--db <snapshot.json>] [--name <database>] [--autosave]");
}

/// Environment configuration overridden by command line flags
fn parse_args() -> anyhow::Result<Option<Config>> {
    let mut config = Config::from_env();
    let mut args = std::env::args().skip(1);

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--db" => {
                let path = args.next().context("--db requires a path")?;
                config = config.snapshot_path(path);
            }
            "--name" => {
                let name = args.next().context("--name requires a value")?;
                config = config.name(name);
            }
            "--autosave" => config = config.autosave(true),
            "-h" | "--help" => {
                print_usage();
                return Ok(None);
            }
            other => bail!("unknown argument '{}'", other),
        }
    }

    Ok(Some(config))
}

/// Handle shell commands. Returns false when the loop should end.
fn handle_command(line: &str, engine: &mut ExecutionEngine) -> bool {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let command = parts.first().map(|s| s.to_lowercase()).unwrap_or_default();

    match command.as_str() {
        "exit" | "quit" if parts.len() == 1 => return false,
        "help" if parts.len() == 1 => print_help(),
        "tables" if parts.len() == 1 => {
            let tables = engine.database().list_tables();
            if tables.is_empty() {
                println!("No tables found");
            } else {
                println!("Tables:");
                for table in tables {
                    println!("  - {}", table);
                }
            }
        }
        "describe" if parts.len() == 2 => match engine.database().get_table(parts[1]) {
            Ok(table) => print!("{}", table.describe()),
            Err(e) => eprintln!("Error: {}", e),
        },
        "save" if parts.len() <= 2 => {
            let result = match parts.get(1) {
                Some(path) => engine.database().save_to_disk(path).map(|_| true),
                None => engine.persist(),
            };
            match result {
                Ok(true) => println!("Snapshot saved"),
                Ok(false) => eprintln!("Error: no snapshot path configured, use 'save <path>'"),
                Err(e) => eprintln!("Error: {}", e),
            }
        }
        _ => match engine.execute(line) {
            Ok(result) => print!("{}", result),
            Err(e) => eprintln!("Error: {}", e),
        },
    }

    true
}

fn run_repl(engine: &mut ExecutionEngine) -> anyhow::Result<()> {
    let mut editor = DefaultEditor::new().context("failed to initialise line editor")?;

    print_banner(engine);

    loop {
        match editor.readline(PROMPT) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(line);

                if !handle_command(line, engine) {
                    break;
                }
                println!();
            }
            Err(ReadlineError::Interrupted) => {
                println!("Use 'exit' or 'quit' to exit");
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e).context("failed to read input"),
        }
    }

    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let Some(config) = parse_args()? else {
        return Ok(());
    };

    let mut engine = ExecutionEngine::open(&config).with_context(|| match &config.snapshot_path {
        Some(path) => format!("failed to open snapshot {}", path.display()),
        None => "failed to open database".to_string(),
    })?;

    run_repl(&mut engine)?;

    if engine.persist().context("failed to save snapshot on exit")? {
        println!("Snapshot saved");
    }
    println!("Goodbye!");
    Ok(())
}
