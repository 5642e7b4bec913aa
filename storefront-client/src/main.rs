use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use env_logger::{Builder, Target};
use log::LevelFilter;
use storefront_client::SessionApp;
use storefront_client::domains::auth::{AuthService, GuardOutcome};
use storefront_client::domains::ui::{HistoryNavigator, Navigator};
use storefront_config::ClientConfig;

#[derive(Debug, Parser)]
#[command(name = "storefront", version, about = "Storefront session client")]
struct Cli {
    /// Backend base URL (overrides configuration)
    #[arg(long, global = true, env = "STOREFRONT_SERVER_URL")]
    server_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Log in and persist the session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "STOREFRONT_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Drop the persisted session
    Logout,
    /// Show the persisted session
    Status,
    /// GET a backend path with the stored credential
    Get {
        path: String,
        /// Page the request is issued from; decides the redirect on a 401
        #[arg(long, default_value = "/")]
        from: String,
    },
    /// Evaluate the route guard for a page
    Visit { path: String },
}

fn init_logger() {
    Builder::new()
        .target(Target::Stderr)
        .filter_level(LevelFilter::Warn)
        .filter_module("storefront_client", LevelFilter::Debug)
        .init();
}

fn print_notification(app: &SessionApp) {
    if let Some(notification) = app.notifications().current() {
        eprintln!("[{}] {}", notification.severity, notification.message);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    if std::env::var("RUST_LOG").is_err() {
        init_logger();
    } else {
        env_logger::init();
    }

    let cli = Cli::parse();

    let (mut config, source) =
        ClientConfig::load().context("failed to load configuration")?;
    log::debug!("[Main] Configuration source: {:?}", source);
    if let Some(server_url) = cli.server_url {
        config.server_url = server_url;
    }

    let start = match &cli.command {
        Command::Get { from, .. } => from.clone(),
        _ => "/".to_string(),
    };
    let navigator = Arc::new(HistoryNavigator::new(start));
    let app = SessionApp::mount_from_config(config, navigator.clone())
        .context("failed to start session core")?;

    match cli.command {
        Command::Login { email, password } => {
            let session = app
                .auth()
                .login(email, password)
                .await
                .context("login failed")?;
            println!("Logged in as {}", session.role());
        }
        Command::Logout => {
            app.auth().logout().await.context("logout failed")?;
            println!("Logged out");
        }
        Command::Status => match app.state().current() {
            Some(session) => println!("Logged in as {}", session.role()),
            None => println!("Not logged in"),
        },
        Command::Get { path, .. } => {
            let result = app.client().get::<serde_json::Value>(&path).await;
            print_notification(&app);
            if navigator.history().len() > 1 {
                eprintln!("Redirected to {}", navigator.current_path());
            }
            let body = result.with_context(|| format!("GET {path} failed"))?;
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        Command::Visit { path } => {
            let roles = app.policy().roles_protecting(&path);
            let outcome = if roles.is_empty() {
                GuardOutcome::Render(())
            } else {
                app.require_role(&roles, || ())
            };
            match outcome {
                GuardOutcome::Render(()) => println!("Render {path}"),
                GuardOutcome::Redirect(target) => {
                    print_notification(&app);
                    println!("Redirect {path} -> {target}");
                }
                GuardOutcome::Pending => println!("Pending {path}"),
            }
        }
    }

    Ok(())
}
