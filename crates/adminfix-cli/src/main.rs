//! adminfix
//!
//! Operator tool that checks and repairs the admin client record of a hosted
//! project through its auth and REST endpoints.

use adminfix_cli::{
    apply_sql, load_statements, logging::init_logging, reinsert, repair, schema_probe,
    AdminSession, RepairOptions, RepairOutcome,
};
use adminfix_core::{
    models::{AdminStatus, Config},
    sql::preview,
    storage::{init_config_dir, ConfigStorage},
};
use adminfix_rest::{
    ApiKey, ClientFilter, Credentials, ExplicitCredentials, KeyringStore, RestClient, SecretStore,
};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "adminfix")]
#[command(about = "Check and repair the admin client record of a hosted project", long_about = None)]
struct Args {
    /// Config file (defaults to <config dir>/adminfix/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level or filter directive (defaults to the configured level)
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Project base URL
    #[arg(long, env = "ADMINFIX_URL", global = true)]
    url: Option<String>,

    /// Project API key
    #[arg(long, env = "ADMINFIX_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    /// Admin account email
    #[arg(long, env = "ADMINFIX_ADMIN_EMAIL", global = true)]
    email: Option<String>,

    /// Admin account password
    #[arg(long, env = "ADMINFIX_ADMIN_PASSWORD", hide_env_values = true, global = true)]
    password: Option<String>,

    /// Full name written to the admin record
    #[arg(long, global = true)]
    full_name: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check the clients table and the admin record without writing
    Check,

    /// Create the admin record, or set its role to admin
    Repair {
        /// Only report what would be done
        #[arg(long)]
        dry_run: bool,
    },

    /// Delete every record of the admin user and insert a fresh one
    Reinsert {
        /// Confirm the delete
        #[arg(long)]
        yes: bool,
    },

    /// Run a SQL script statement by statement through the exec_sql RPC
    ApplySql {
        file: PathBuf,

        /// Confirm running the script
        #[arg(long)]
        yes: bool,
    },

    /// Manage secrets stored in the OS keyring
    #[command(subcommand)]
    Credentials(CredentialsCommand),

    /// Show or initialize the config file
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand, Debug)]
enum CredentialsCommand {
    /// Store the given --api-key and/or --password
    Set,
    /// Remove the stored API key and password
    Clear,
    /// Show which secrets are stored
    Status,
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    Show,
    /// Save --url, --email and --full-name to the config file
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let storage = match args.config {
        Some(ref path) => ConfigStorage::at_path(path.clone()),
        None => ConfigStorage::new(init_config_dir()?),
    };
    let config = storage
        .load()
        .with_context(|| format!("Failed to load config from {}", storage.path().display()))?;

    let level = args
        .log_level
        .clone()
        .unwrap_or_else(|| config.log_level.clone());
    if let Some(log_path) = init_logging(&level) {
        tracing::debug!("Log file: {}", log_path.display());
    }
    tracing::debug!("Config file: {}", storage.path().display());

    let store = KeyringStore::default();

    match args.command {
        Command::Check => run_check(&args, &config, &store).await,
        Command::Repair { dry_run } => run_repair(&args, &config, &store, dry_run).await,
        Command::Reinsert { yes } => run_reinsert(&args, &config, &store, yes).await,
        Command::ApplySql { ref file, yes } => {
            run_apply_sql(&args, &config, &store, file, yes).await
        }
        Command::Credentials(ref command) => run_credentials(&args, &config, &store, command),
        Command::Config(ref command) => run_config(&args, config, &storage, command),
    }
}

fn explicit_credentials(args: &Args) -> ExplicitCredentials {
    ExplicitCredentials {
        api_key: args.api_key.clone(),
        email: args.email.clone(),
        password: args.password.clone(),
    }
}

fn rest_client(args: &Args, config: &Config, api_key: ApiKey) -> Result<RestClient> {
    let url = args
        .url
        .clone()
        .or_else(|| config.project.url.clone())
        .context("Project URL not set (use --url, ADMINFIX_URL or `adminfix config init`)")?;
    let timeout = Duration::from_secs(config.http.timeout_secs);
    Ok(RestClient::new(url, api_key, timeout)?)
}

fn repair_options(args: &Args, config: &Config, credentials: &Credentials) -> RepairOptions {
    RepairOptions {
        email: credentials.email.clone(),
        full_name: args
            .full_name
            .clone()
            .unwrap_or_else(|| config.admin.full_name.clone()),
        dry_run: false,
    }
}

async fn sign_in(client: RestClient, credentials: &Credentials) -> Result<AdminSession> {
    match AdminSession::open(client, credentials).await {
        Ok(session) => {
            println!("✓ Signed in as {}", credentials.email);
            println!("  User ID: {}", session.user.id);
            Ok(session)
        }
        Err(e) => {
            println!("✗ Failed to sign in: {}", e);
            Err(e.into())
        }
    }
}

async fn run_check(args: &Args, config: &Config, store: &dyn SecretStore) -> Result<()> {
    let credentials = Credentials::resolve(explicit_credentials(args), store, config)?;
    let client = rest_client(args, config, credentials.api_key.clone())?;

    println!("Checking clients table...");
    match schema_probe(&client).await {
        Ok(rows) => {
            println!("✓ Clients table accessible ({} sample rows)", rows.len());
            for row in rows {
                println!("  {}", row);
            }
        }
        Err(e) => println!("✗ Clients table error: {}", e),
    }

    let session = sign_in(client, &credentials).await?;
    let status = adminfix_cli::inspect(&session.client, session.user.id).await;
    session.close().await;

    let status = status?;
    match status {
        AdminStatus::Healthy { ref record } => {
            println!("✓ Client record found: {} <{}>", record.full_name, record.email);
            println!("✓ Role is already admin");
            Ok(())
        }
        AdminStatus::WrongRole { ref record } => {
            println!("✗ Client record has role '{}'", record.role);
            bail!("admin record needs repair: {}", status)
        }
        AdminStatus::Missing => {
            println!("✗ Client record not found");
            bail!("admin record needs repair: {}", status)
        }
        AdminStatus::Duplicate { ref records } => {
            println!("✗ {} client records found for one user", records.len());
            bail!("admin record needs repair: {}", status)
        }
    }
}

async fn run_repair(
    args: &Args,
    config: &Config,
    store: &dyn SecretStore,
    dry_run: bool,
) -> Result<()> {
    let credentials = Credentials::resolve(explicit_credentials(args), store, config)?;
    let client = rest_client(args, config, credentials.api_key.clone())?;
    let options = RepairOptions {
        dry_run,
        ..repair_options(args, config, &credentials)
    };

    println!("Fixing admin login...");
    let session = sign_in(client, &credentials).await?;
    let outcome = repair(&session.client, &session.user, &options).await;
    session.close().await;

    match outcome {
        Ok(outcome) => {
            println!("✓ {}", outcome);
            match outcome {
                RepairOutcome::Planned { .. } => {}
                _ => println!("Admin user fix completed"),
            }
            Ok(())
        }
        Err(e) => {
            println!("✗ {}", e);
            Err(e.into())
        }
    }
}

async fn run_reinsert(
    args: &Args,
    config: &Config,
    store: &dyn SecretStore,
    yes: bool,
) -> Result<()> {
    if !yes {
        bail!("reinsert deletes the admin user's client records; pass --yes to continue");
    }

    let credentials = Credentials::resolve(explicit_credentials(args), store, config)?;
    let client = rest_client(args, config, credentials.api_key.clone())?;
    let options = repair_options(args, config, &credentials);

    let session = sign_in(client, &credentials).await?;
    let outcome = match reinsert(&session.client, &session.user, &options).await {
        Ok(outcome) => outcome,
        Err(e) => {
            println!("✗ Failed to reinsert admin record: {}", e);
            session.close().await;
            return Err(e.into());
        }
    };

    println!(
        "✓ Removed {} old client records",
        outcome.removed.unwrap_or(outcome.existing)
    );
    println!("✓ Client record created with role {}", outcome.record.role);

    println!("Testing admin login...");
    let login = session.verify_login(&credentials).await;
    session.close().await;
    match login {
        Ok(()) => {
            println!("✓ Admin login test successful");
            Ok(())
        }
        Err(e) => {
            println!("✗ Admin login still failing: {}", e);
            Err(e.into())
        }
    }
}

async fn run_apply_sql(
    args: &Args,
    config: &Config,
    store: &dyn SecretStore,
    file: &Path,
    yes: bool,
) -> Result<()> {
    let statements = load_statements(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    if statements.is_empty() {
        bail!("No SQL statements found in {}", file.display());
    }

    if !yes {
        println!("{} statements would be run:", statements.len());
        for statement in &statements {
            println!("  {}", preview(statement, 100));
        }
        println!("Pass --yes to run them");
        return Ok(());
    }

    let api_key = Credentials::resolve_api_key(args.api_key.clone(), store, config)?;
    let client = rest_client(args, config, api_key)?;

    let summary = apply_sql(&client, &statements, |i, outcome| {
        println!("\nExecuting statement {}/{}:", i, statements.len());
        println!("Statement: {}", preview(&outcome.statement, 100));
        match outcome.status {
            Some(status) => println!("Status Code: {}", status),
            None => println!("Status Code: none"),
        }
        println!("Response: {}", outcome.body);
        if outcome.is_success() {
            println!("✓ Success");
        } else {
            println!("✗ Failed");
        }
    })
    .await;

    println!("\n=== Summary ===");
    println!("Successful: {}/{}", summary.succeeded(), summary.total());

    let email = args.email.clone().or_else(|| config.admin.email.clone());
    if let Some(email) = email {
        println!("\nChecking admin user:");
        match client.select_clients(&ClientFilter::Email(email)).await {
            Ok(records) => {
                let status = AdminStatus::classify(records);
                println!("  {}", status);
            }
            Err(e) => println!("✗ {}", e),
        }
    }

    if !summary.all_succeeded() {
        bail!(
            "{} of {} statements failed",
            summary.total() - summary.succeeded(),
            summary.total()
        );
    }
    Ok(())
}

fn run_credentials(
    args: &Args,
    config: &Config,
    store: &dyn SecretStore,
    command: &CredentialsCommand,
) -> Result<()> {
    let api_key_entry = &config.project.api_key_keychain;
    let password_entry = &config.admin.password_keychain;

    match command {
        CredentialsCommand::Set => {
            if args.api_key.is_none() && args.password.is_none() {
                bail!("nothing to store; pass --api-key and/or --password");
            }
            if let Some(ref key) = args.api_key {
                let key = ApiKey::new(key.clone())?;
                store.set(api_key_entry, key.expose())?;
                match key.role() {
                    Ok(role) => println!("✓ Stored API key (role: {})", role),
                    Err(_) => println!("✓ Stored API key"),
                }
            }
            if let Some(ref password) = args.password {
                store.set(password_entry, password)?;
                println!("✓ Stored admin password");
            }
        }
        CredentialsCommand::Clear => {
            store.delete(api_key_entry)?;
            store.delete(password_entry)?;
            println!("✓ Removed stored API key and admin password");
        }
        CredentialsCommand::Status => {
            let stored = |name: &str| -> Result<&'static str> {
                Ok(match store.get(name)? {
                    Some(_) => "stored",
                    None => "not stored",
                })
            };
            println!("API key ({}): {}", api_key_entry, stored(api_key_entry)?);
            println!("Admin password ({}): {}", password_entry, stored(password_entry)?);
        }
    }
    Ok(())
}

fn run_config(
    args: &Args,
    mut config: Config,
    storage: &ConfigStorage,
    command: &ConfigCommand,
) -> Result<()> {
    match command {
        ConfigCommand::Show => {
            println!("# {}", storage.path().display());
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigCommand::Init => {
            if args.url.is_none() && args.email.is_none() && args.full_name.is_none() {
                bail!("nothing to save; pass --url, --email and/or --full-name");
            }
            if let Some(ref url) = args.url {
                config.project.url = Some(url.clone());
            }
            if let Some(ref email) = args.email {
                config.admin.email = Some(email.clone());
            }
            if let Some(ref full_name) = args.full_name {
                config.admin.full_name = full_name.clone();
            }
            storage.save(&config)?;
            println!("✓ Saved {}", storage.path().display());
        }
    }
    Ok(())
}
