//! nichedoc CLI - seeding and inspecting the findmyniche document store
//!
//! Usage:
//!   nichedoc seed skills [--clear]              Seed the skill catalog
//!   nichedoc seed questions                     Seed the assessment questions
//!   nichedoc users sync users.json [--user-id N]
//!   nichedoc docs list skills --limit 20
//!   nichedoc docs get skills <id>
//!   nichedoc docs create skills '{"name":"Rust"}' [--id rust]
//!   nichedoc docs update skills <id> '{"description":"Systems"}'
//!   nichedoc docs delete skills <id>
//!   nichedoc docs query skills --where category="Cloud & DevOps" --where icon=☁️
//!
//! Connection settings come from the environment (`FIRESTORE_PROJECT_ID`,
//! `GOOGLE_APPLICATION_CREDENTIALS`, `FIRESTORE_EMULATOR_HOST`) unless given
//! as flags.

use std::{env, fs, path::PathBuf, process::ExitCode};

use anyhow::{Context, Result, anyhow, bail};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::Value as JsonValue;

use nichedoc::{
    catalog,
    firestore::{FirestoreConfig, FirestoreStore},
    prelude::*,
    query::DEFAULT_LIMIT,
    users::{UserMirror, UserRecord},
    value::fields_from_json,
};

#[derive(Parser)]
#[command(name = "nichedoc")]
#[command(about = "Seed and inspect the findmyniche document store", long_about = None)]
#[command(version)]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ConnectionArgs {
    /// Firestore project id
    #[arg(long, global = true)]
    project: Option<String>,

    /// Path to the service-account key file
    #[arg(long, global = true)]
    credentials: Option<PathBuf>,

    /// host:port of a Firestore emulator
    #[arg(long, global = true)]
    emulator_host: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the built-in catalogs
    Seed {
        #[command(subcommand)]
        action: SeedAction,
    },
    /// Mirror relational users into the `users` collection
    Users {
        #[command(subcommand)]
        action: UsersAction,
    },
    /// Ad-hoc document operations
    Docs {
        #[command(subcommand)]
        action: DocsAction,
    },
}

#[derive(Subcommand)]
enum SeedAction {
    /// Seed the skills collection
    Skills {
        /// Delete existing skills first
        #[arg(long)]
        clear: bool,
    },
    /// Seed the questions collection
    Questions,
}

#[derive(Subcommand)]
enum UsersAction {
    /// Sync users from a JSON export
    Sync {
        /// JSON array of user rows
        file: PathBuf,

        /// Only sync this user
        #[arg(long)]
        user_id: Option<i64>,
    },
}

#[derive(Subcommand)]
enum DocsAction {
    /// List one page of documents
    List {
        collection: String,

        #[arg(short, long, default_value_t = DEFAULT_LIMIT)]
        limit: usize,
    },
    /// Read one document
    Get { collection: String, id: String },
    /// Create a document from a JSON object
    Create {
        collection: String,
        json: String,

        /// Create or replace the document with this id
        #[arg(long)]
        id: Option<String>,
    },
    /// Merge a JSON object into an existing document
    Update {
        collection: String,
        id: String,
        json: String,
    },
    /// Delete a document
    Delete { collection: String, id: String },
    /// Find documents by field equality
    Query {
        collection: String,

        /// Condition as field=value; the value is read as JSON when it parses
        #[arg(short = 'w', long = "where", value_name = "FIELD=VALUE")]
        conditions: Vec<String>,

        #[arg(short, long, default_value_t = DEFAULT_LIMIT)]
        limit: usize,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    init_logging(&cli.log_level)?;

    let config = firestore_config(&cli.connection)?;

    let rt = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;

    rt.block_on(async {
        let store = DocumentStore::new(
            FirestoreStore::builder(config)
                .build()
                .await
                .context("Failed to build the Firestore client")?,
        );

        if !store.backend().is_authenticated().await {
            tracing::warn!("No usable credentials, every operation will fail");
        }

        match cli.command {
            Commands::Seed { action } => run_seed(&store, action).await,
            Commands::Users { action } => run_users(&store, action).await,
            Commands::Docs { action } => run_docs(&store, action).await,
        }
    })
}

/// Builds the client configuration from the environment, letting flags win.
fn firestore_config(args: &ConnectionArgs) -> Result<FirestoreConfig> {
    let lookup = |key: &str| {
        let flag = match key {
            "FIRESTORE_PROJECT_ID" => args.project.clone(),
            "GOOGLE_APPLICATION_CREDENTIALS" => args
                .credentials
                .as_ref()
                .map(|path| path.display().to_string()),
            "FIRESTORE_EMULATOR_HOST" => args.emulator_host.clone(),
            _ => None,
        };
        flag.or_else(|| env::var(key).ok())
    };

    FirestoreConfig::from_lookup(lookup).context("Invalid Firestore configuration")
}

async fn run_seed(store: &DocumentStore<FirestoreStore>, action: SeedAction) -> Result<ExitCode> {
    let report = match action {
        SeedAction::Skills { clear } => {
            let report = catalog::seed_skills(store, clear).await;
            if clear {
                println!("Cleared {} existing skills.", report.cleared);
            }
            println!("Seeded {} skills.", report.created);
            for category in catalog::SKILL_CATALOG {
                println!("  • {}: {} skills", category.label(), category.skills.len());
            }
            report
        }
        SeedAction::Questions => {
            let report = catalog::seed_questions(store).await;
            println!("Seeded {} questions.", report.created);
            report
        }
    };

    if report.failed > 0 {
        eprintln!("Failed to add {} documents, see the log for details.", report.failed);
    }

    Ok(ExitCode::SUCCESS)
}

async fn run_users(store: &DocumentStore<FirestoreStore>, action: UsersAction) -> Result<ExitCode> {
    let UsersAction::Sync { file, user_id } = action;

    let raw = fs::read_to_string(&file).with_context(|| format!("Failed to read {}", file.display()))?;
    let users: Vec<UserRecord> =
        serde_json::from_str(&raw).with_context(|| format!("{} is not a JSON array of users", file.display()))?;

    let mirror = UserMirror::new(store);

    if let Some(id) = user_id {
        let user = users
            .iter()
            .find(|user| user.id == id)
            .ok_or_else(|| anyhow!("User with ID {id} not found"))?;

        println!(
            "Syncing user: {} ({})",
            user.name.as_deref().unwrap_or_default(),
            user.email.as_deref().unwrap_or_default()
        );
        if !mirror.sync(user).await {
            bail!("Failed to sync user {id}, check the log for details");
        }
        println!("User synced.");
        return Ok(ExitCode::SUCCESS);
    }

    if users.is_empty() {
        println!("No users found to sync.");
        return Ok(ExitCode::SUCCESS);
    }

    println!("Found {} users to sync...", users.len());
    let report = mirror.sync_all(&users).await;
    println!("Synced: {}", report.synced);
    if report.failed > 0 {
        eprintln!("Failed: {}", report.failed);
    }

    Ok(ExitCode::SUCCESS)
}

async fn run_docs(store: &DocumentStore<FirestoreStore>, action: DocsAction) -> Result<ExitCode> {
    match action {
        DocsAction::List { collection, limit } => {
            print_json(&store.try_read_all(&collection, limit).await?)?;
        }
        DocsAction::Get { collection, id } => match store.try_read(&collection, &id).await? {
            Some(document) => print_json(&document)?,
            None => {
                eprintln!("Document {collection}/{id} not found");
                return Ok(ExitCode::FAILURE);
            }
        },
        DocsAction::Create { collection, json, id } => {
            let document = store
                .try_create(&collection, parse_fields(&json)?, id.as_deref())
                .await?;
            print_json(&document)?;
        }
        DocsAction::Update { collection, id, json } => {
            store.try_update(&collection, &id, parse_fields(&json)?).await?;
            println!("Updated {collection}/{id}");
        }
        DocsAction::Delete { collection, id } => {
            store.try_delete(&collection, &id).await?;
            println!("Deleted {collection}/{id}");
        }
        DocsAction::Query { collection, conditions, limit } => {
            let conditions = conditions
                .iter()
                .map(String::as_str)
                .map(parse_condition)
                .collect::<Result<Vec<_>>>()?;
            let query = Query::where_equals(conditions).with_limit(limit);
            print_json(&store.try_query(&collection, query).await?)?;
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Parses a JSON object into document fields.
fn parse_fields(json: &str) -> Result<Fields> {
    match serde_json::from_str::<JsonValue>(json).context("Document body is not valid JSON")? {
        JsonValue::Object(object) => Ok(fields_from_json(object)),
        _ => bail!("Document body must be a JSON object"),
    }
}

/// Parses `field=value`. Values that are not valid JSON are taken as strings.
fn parse_condition(condition: &str) -> Result<(String, Value)> {
    let (field, raw) = condition
        .split_once('=')
        .ok_or_else(|| anyhow!("Condition `{condition}` is not of the form field=value"))?;

    let field = field.trim();
    if field.is_empty() {
        bail!("Condition `{condition}` has no field name");
    }

    let value = serde_json::from_str::<JsonValue>(raw)
        .map(Value::from)
        .unwrap_or_else(|_| Value::from(raw));

    Ok((field.to_string(), value))
}

fn init_logging(level: &str) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init()
        .context("Failed to install the log subscriber")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conditions_prefer_json_values() {
        assert_eq!(parse_condition("active=true").unwrap(), ("active".into(), Value::Boolean(true)));
        assert_eq!(parse_condition("id=14").unwrap(), ("id".into(), Value::Integer(14)));
        assert_eq!(
            parse_condition("category=Cloud & DevOps").unwrap(),
            ("category".into(), Value::from("Cloud & DevOps"))
        );
        assert_eq!(parse_condition("name=\"42\"").unwrap(), ("name".into(), Value::from("42")));
        assert_eq!(parse_condition("expr=a=b").unwrap(), ("expr".into(), Value::from("a=b")));
        assert!(parse_condition("missing").is_err());
        assert!(parse_condition("=1").is_err());
    }

    #[test]
    fn bodies_must_be_objects() {
        let fields = parse_fields(r#"{"name":"Rust","tags":["systems"]}"#).unwrap();
        assert_eq!(fields.get("name"), Some(&Value::from("Rust")));
        assert_eq!(fields.get("tags"), Some(&Value::from(vec!["systems"])));
        assert!(parse_fields("[1, 2]").is_err());
        assert!(parse_fields("not json").is_err());
    }

    #[test]
    fn flags_override_the_environment() {
        let args = ConnectionArgs {
            project: Some("flag-project".into()),
            credentials: None,
            emulator_host: Some("localhost:8080".into()),
        };

        let config = firestore_config(&args).unwrap();
        assert_eq!(config.project_id, "flag-project");
        assert_eq!(config.endpoint, "http://localhost:8080/v1");
    }

    #[test]
    fn cli_parses_repeated_conditions() {
        let cli = Cli::try_parse_from([
            "nichedoc",
            "docs",
            "query",
            "skills",
            "--where",
            "category=Cybersecurity",
            "-w",
            "icon=🔒",
            "--project",
            "demo",
        ])
        .unwrap();

        assert_eq!(cli.connection.project.as_deref(), Some("demo"));
        match cli.command {
            Commands::Docs { action: DocsAction::Query { conditions, limit, .. } } => {
                assert_eq!(conditions, vec!["category=Cybersecurity", "icon=🔒"]);
                assert_eq!(limit, DEFAULT_LIMIT);
            }
            _ => panic!("expected docs query"),
        }
    }

    #[test]
    fn logging_installs_only_once() {
        init_logging("debug").unwrap();

        let err = init_logging("debug").unwrap_err();
        assert!(err.to_string().contains("log subscriber"));
    }
}
