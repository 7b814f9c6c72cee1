use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use tokenizer_client::{
    config, policies, AccessPolicy, GenerationPolicy, ResolutionContext, TokenizerClient,
    TokenizerError,
};

mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "tokenizer_client=info,tokenizer=info".into()),
    );
    // stdout carries command output; logs go to stderr
    let json_logs = std::env::var("TOKENIZER_LOG_FORMAT").is_ok_and(|v| v == "json");
    let registry = tracing_subscriber::registry().with(filter);
    if json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    let args = cli::Cli::parse();
    let mut cfg = config::load()?;
    if let Some(secs) = args.timeout {
        cfg = cfg.with_timeout(Duration::from_secs(secs));
    }

    let result = run(args.command, cfg).await;

    if let Err(ref e) = result {
        match e.downcast_ref::<TokenizerError>() {
            Some(err) => eprintln!(
                "Error [{}] status={} request_id={}: {}",
                err.kind(),
                err.status().map(|s| s.to_string()).unwrap_or_else(|| "-".into()),
                err.request_id().unwrap_or("-"),
                err.message()
            ),
            None => eprintln!("Error: {:?}", e),
        }
    }
    result
}

async fn run(command: cli::Commands, cfg: config::ClientConfig) -> anyhow::Result<()> {
    let client = TokenizerClient::connect(cfg).await?;

    match command {
        cli::Commands::GenerationPolicy { command } => {
            handle_generation_policy_command(&client, command).await
        }
        cli::Commands::AccessPolicy { command } => {
            handle_access_policy_command(&client, command).await
        }
        cli::Commands::Token { command } => handle_token_command(&client, command).await,
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn parse_id(id: Option<String>) -> anyhow::Result<Uuid> {
    match id {
        Some(s) => Uuid::parse_str(&s).with_context(|| format!("Invalid policy id '{}'", s)),
        None => Ok(Uuid::new_v4()),
    }
}

fn parse_generation_policy(arg: &str) -> anyhow::Result<GenerationPolicy> {
    if let Some(builtin) = policies::generation_by_name(arg) {
        return Ok(builtin);
    }
    let id = Uuid::parse_str(arg)
        .with_context(|| format!("'{}' is neither a built-in generation policy nor an id", arg))?;
    Ok(GenerationPolicy::reference(id))
}

fn parse_access_policy(arg: &str) -> anyhow::Result<AccessPolicy> {
    if arg.eq_ignore_ascii_case("open") {
        return Ok(policies::access_open());
    }
    let id = Uuid::parse_str(arg)
        .with_context(|| format!("'{}' is neither \"open\" nor an access policy id", arg))?;
    Ok(AccessPolicy::reference(id))
}

async fn handle_generation_policy_command(
    client: &TokenizerClient,
    cmd: cli::GenerationPolicyCommands,
) -> anyhow::Result<()> {
    let store = client.policies();
    match cmd {
        cli::GenerationPolicyCommands::List => {
            let list = store.list_generation_policies().await?;
            if list.is_empty() {
                println!("No generation policies found.");
            } else {
                println!("{:<38} {:<30}", "ID", "NAME");
                for p in list {
                    println!("{:<38} {:<30}", p.id, p.name);
                }
            }
        }
        cli::GenerationPolicyCommands::Create {
            name,
            function,
            parameters,
            id,
        } => {
            let policy = GenerationPolicy::new(parse_id(id)?, name, function, parameters)?;
            let created = store.create_generation_policy(&policy).await?;
            print_json(&created)?;
        }
        cli::GenerationPolicyCommands::Delete { id } => {
            let id = Uuid::parse_str(&id).context("Invalid policy id")?;
            if store.delete_generation_policy(id).await? {
                println!("Generation policy deleted.");
            } else {
                println!("Generation policy not deleted.");
            }
        }
    }
    Ok(())
}

async fn handle_access_policy_command(
    client: &TokenizerClient,
    cmd: cli::AccessPolicyCommands,
) -> anyhow::Result<()> {
    let store = client.policies();
    match cmd {
        cli::AccessPolicyCommands::List => {
            let list = store.list_access_policies().await?;
            if list.is_empty() {
                println!("No access policies found.");
            } else {
                println!("{:<38} {:<30} {:<8}", "ID", "NAME", "VERSION");
                for p in list {
                    println!("{:<38} {:<30} {:<8}", p.id, p.name, p.version);
                }
            }
        }
        cli::AccessPolicyCommands::Create {
            name,
            function,
            parameters,
            id,
        } => {
            let policy = AccessPolicy::new(parse_id(id)?, name, function, parameters)?;
            let created = store.create_access_policy(&policy).await?;
            print_json(&created)?;
        }
        cli::AccessPolicyCommands::Update {
            id,
            version,
            name,
            function,
            parameters,
        } => {
            let id = Uuid::parse_str(&id).context("Invalid policy id")?;
            let mut policy = AccessPolicy::new(id, name, function, parameters)?;
            policy.version = version;
            let updated = store.update_access_policy(&policy).await?;
            print_json(&updated)?;
        }
        cli::AccessPolicyCommands::Delete { id, version } => {
            let id = Uuid::parse_str(&id).context("Invalid policy id")?;
            if store.delete_access_policy(id, version).await? {
                println!("Access policy deleted.");
            } else {
                println!("Access policy not deleted.");
            }
        }
    }
    Ok(())
}

async fn handle_token_command(
    client: &TokenizerClient,
    cmd: cli::TokenCommands,
) -> anyhow::Result<()> {
    let tokens = client.tokens();
    match cmd {
        cli::TokenCommands::Create {
            data,
            generation_policy,
            access_policy,
        } => {
            let gp = parse_generation_policy(&generation_policy)?;
            let ap = parse_access_policy(&access_policy)?;
            println!("{}", tokens.create_token(&data, &gp, &ap).await?);
        }
        cli::TokenCommands::Resolve { token, context } => {
            let context: ResolutionContext =
                serde_json::from_str(&context).context("--context must be a JSON object")?;
            println!("{}", tokens.resolve_token(&token, &context).await?);
        }
        cli::TokenCommands::Delete { token } => {
            if tokens.delete_token(&token).await? {
                println!("Token deleted.");
            } else {
                println!("Token not deleted.");
            }
        }
        cli::TokenCommands::Inspect { token } => {
            print_json(&tokens.inspect_token(&token).await?)?;
        }
        cli::TokenCommands::Lookup {
            data,
            generation_policy,
            access_policy,
        } => {
            let gp = parse_generation_policy(&generation_policy)?;
            let ap = parse_access_policy(&access_policy)?;
            let found = tokens.lookup_token(&data, &gp, &ap).await?;
            if found.is_empty() {
                println!("No tokens found.");
            }
            for t in found {
                println!("{}", t);
            }
        }
    }
    Ok(())
}
