use clap::Parser;
use cpd_admin::cli::{Cli, Command};
use cpd_admin::config::get_configuration;
use cpd_admin::gateway::ApiResult;
use cpd_admin::handlers::{auth, certificates};
use cpd_admin::startup::build_app_state;
use dashboard_core::observability::init_tracing;
use dotenvy::dotenv;
use secrecy::Secret;
use serde_json::Value;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

async fn read_password() -> anyhow::Result<Secret<String>> {
    eprint!("Password: ");
    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read password from stdin: {}", e))?;
    Ok(Secret::new(line.trim_end_matches(['\r', '\n']).to_string()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let cli = Cli::parse();

    let configuration = get_configuration().map_err(|e| {
        eprintln!("Failed to read configuration: {}", e);
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    init_tracing(
        env!("CARGO_PKG_NAME"),
        &configuration.log.level,
        configuration.log.json || cli.json_logs,
    );

    let state = build_app_state(&configuration)?;

    let result: ApiResult<Value> = match cli.command {
        Command::Login { email, remember } => {
            let email = email
                .or_else(|| configuration.login.email.clone())
                .or_else(|| state.session.remembered_email())
                .unwrap_or_default();
            let password = match configuration.login.password.clone() {
                Some(password) => password,
                None => read_password().await?,
            };
            auth::login(&state, &email, &password, remember).await
        }
        Command::Logout => auth::logout(&state).await,
        Command::Whoami { refresh } => auth::whoami(&state, refresh).await,
        Command::Status => auth::status(&state),
        Command::List => certificates::list(&state).await,
        Command::Show { id } => certificates::show(&state, id).await,
        Command::Create(fields) => certificates::create(&state, fields).await,
        Command::Update { id, fields, file } => {
            certificates::update(&state, id, fields, file.as_deref()).await
        }
        Command::Delete { id } => certificates::delete(&state, id).await,
        Command::MarkGenerated { id, pdf } => certificates::mark_generated(&state, id, &pdf).await,
        Command::Upload { id, path } => certificates::upload(&state, id, &path).await,
        Command::Watch { interval } => {
            let shutdown = async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!(error = %e, "Failed to listen for Ctrl-C");
                }
            };
            auth::watch(&state, Duration::from_secs(interval.max(1)), shutdown, |s| {
                println!("{}", serde_json::json!({ "state": s }));
            })
            .await
        }
    };

    println!("{}", serde_json::to_string_pretty(&result)?);

    if !result.is_success() {
        std::process::exit(1);
    }
    Ok(())
}
