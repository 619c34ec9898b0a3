//! `formrelay` - Contact-form intake server and CLI.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use anyhow::Context;
use clap::Parser;

use formrelay::cli::{Cli, Command, ConfigCommand, RecentCommand};
use formrelay::storage::SubmissionLog;
use formrelay::{init_logging, server, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone()).context("loading configuration")?;

    // Execute the command
    match cli.command {
        Command::Serve(serve_cmd) => server::serve(config, serve_cmd.bind)
            .await
            .context("running server"),
        Command::Recent(recent_cmd) => handle_recent(&config, &recent_cmd).await,
        Command::Config(config_cmd) => handle_config(&config, config_cmd),
    }
}

async fn handle_recent(config: &Config, cmd: &RecentCommand) -> anyhow::Result<()> {
    let log = SubmissionLog::open(config.submissions_path())?;
    let (total, submissions) = log.recent(cmd.limit).await?;

    if cmd.json {
        let out = serde_json::json!({
            "count": total,
            "submissions": submissions,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!(
            "{total} submission(s) in {}",
            log.path().display()
        );
        for record in submissions {
            println!(
                "{}  {}  {} <{}>  {}",
                record.id,
                record.timestamp.to_rfc3339(),
                record.name.as_deref().unwrap_or("-"),
                record.email.as_deref().unwrap_or("-"),
                record.status,
            );
        }
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Server]");
                println!("  Bind address:     {}", config.server.bind);
                println!();
                println!("[SMTP]");
                println!("  Host:             {}", config.smtp.host);
                println!("  Port:             {}", config.smtp.port);
                println!("  Implicit TLS:     {}", config.smtp.implicit_tls);
                println!(
                    "  Authentication:   {}",
                    if config.smtp.username.is_some() {
                        "configured"
                    } else {
                        "none"
                    }
                );
                println!();
                println!("[Mail]");
                println!("  From:             {}", config.from_mailbox());
                println!("  Support address:  {}", config.support_address());
                println!();
                println!("[Storage]");
                println!("  Submission log:   {}", config.submissions_path().display());
                println!("  View limit:       {}", config.storage.view_limit);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)).and_then(|c| c.validate()) {
                Ok(()) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
