use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use session_gate::gate::notice::is_auth_path;
use session_gate::gate::redirect::{guest_redirect, post_login_destination};
use session_gate::gate::{Notice, Redirect};
use session_gate::{AppConfig, AuthError, AuthProvider, GateOutcome, GateSink, Role};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Config(#[from] session_gate::config::ConfigError),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "session-gate", about = "Session gate and auth client for the test-preparation platform")]
struct Cli {
    /// Auth API base URL.
    #[arg(long, env = "AUTH_API_URL")]
    base_url: Option<String>,

    /// Bounded wait for the session check in milliseconds.
    #[arg(long, env = "AUTH_CHECK_TIMEOUT_MS")]
    timeout_ms: Option<u64>,

    /// Token file. Unset keeps the token in memory.
    #[arg(long, env = "SESSION_TOKEN_FILE")]
    token_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve the stored session and print the current user.
    Whoami,
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        /// Guarded path the login flow should return to.
        #[arg(long)]
        from: Option<String>,
    },
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long, default_value = "student")]
        role: Role,
    },
    Logout,
    /// Run the session gate for a protected path.
    Guard { path: String },
}

/// Prints gate side effects as JSON lines on stdout.
struct StdoutSink;

impl GateSink for StdoutSink {
    fn redirect(&self, redirect: &Redirect) {
        print_json("redirect", redirect);
    }

    fn notify(&self, notice: &Notice) {
        print_json("notice", notice);
    }
}

fn print_json<T: serde::Serialize>(kind: &str, value: &T) {
    match serde_json::to_string(value) {
        Ok(rendered) => println!("{kind} {rendered}"),
        Err(e) => tracing::warn!(error = %e, kind, "failed to render gate effect"),
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode, CliError> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let mut config = AppConfig::from_env()?;
    if let Some(base_url) = cli.base_url {
        config.client.api_base_url = base_url;
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        config.gate.check_timeout = Duration::from_millis(timeout_ms);
    }
    if cli.token_file.is_some() {
        config.client.token_file = cli.token_file;
    }

    let provider = AuthProvider::from_config(&config)?;
    match cli.command {
        Command::Whoami => run_whoami(&provider).await,
        Command::Login { email, password, from } => run_login(&provider, &email, &password, from.as_deref()).await,
        Command::Register { name, email, password, role } => {
            let user = provider.register(&name, &email, &password, role).await?;
            println!("{}", serde_json::to_string_pretty(&user)?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Logout => {
            provider.logout().await?;
            println!("signed out");
            Ok(ExitCode::SUCCESS)
        }
        Command::Guard { path } => Ok(run_guard(&provider, path).await),
    }
}

async fn run_whoami(provider: &AuthProvider) -> Result<ExitCode, CliError> {
    match provider.get_current_user().await {
        Ok(user) => {
            println!("{}", serde_json::to_string_pretty(&user)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(AuthError::MissingToken) => {
            eprintln!("not signed in");
            Ok(ExitCode::from(1))
        }
        Err(e) => Err(e.into()),
    }
}

async fn run_login(provider: &AuthProvider, email: &str, password: &str, from: Option<&str>) -> Result<ExitCode, CliError> {
    let user = provider.login(email, password).await?;
    eprintln!("signed in as {} <{}>", user.name, user.email);
    println!("{}", post_login_destination(provider.gate_config(), from, &user));
    Ok(ExitCode::SUCCESS)
}

async fn run_guard(provider: &AuthProvider, path: String) -> ExitCode {
    if is_auth_path(provider.gate_config(), &path) {
        // Auth pages are public; a signed-in visitor is bounced to their dashboard.
        let _ = provider.get_current_user().await;
        match guest_redirect(provider.gate_config(), &path, &provider.snapshot()) {
            Some(dashboard) => println!("redirect {dashboard}"),
            None => println!("guest {path}"),
        }
        return ExitCode::SUCCESS;
    }

    let handle = provider.guard(path, Arc::new(StdoutSink));
    provider.spawn_bootstrap();
    match handle.outcome().await {
        GateOutcome::Authorized(user) => {
            println!("authorized {} ({:?})", user.id, user.role);
            ExitCode::SUCCESS
        }
        GateOutcome::Denied(reason) => {
            print_json("denied", &reason);
            ExitCode::from(2)
        }
        GateOutcome::Unmounted => ExitCode::from(3),
    }
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;
