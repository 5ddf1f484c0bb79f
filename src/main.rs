use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::{bail, Context as _, Result};
use clap::{Parser, Subcommand};

use qb_migrate::client::authorize;
use qb_migrate::config::{CompanyRole, Credentials};
use qb_migrate::transfer::runner::{self, RunOptions};
use qb_migrate::transfer::EntityType;

#[derive(Parser)]
#[command(
    name = "qb-migrate",
    version,
    about = "Copy accounting entities between QuickBooks Online companies"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Copy entities from the source company to the target company
    Transfer {
        /// Credentials file with the source and target company blocks
        #[arg(long, default_value = "credentials.yml")]
        credentials: PathBuf,

        /// Comma-separated subset of entity types to move
        /// (accounts,employees,customers,classes,vendors,journal-entries);
        /// everything when omitted
        #[arg(long, value_delimiter = ',', value_parser = parse_entity)]
        entities: Vec<EntityType>,

        /// Write the final source-to-target ID mapping to this JSON file
        #[arg(long)]
        mapping_out: Option<PathBuf>,
    },

    /// Obtain OAuth tokens for one company block via the browser consent
    /// flow and store them in the credentials file
    Authorize {
        /// Which company block to authorize (source or target)
        #[arg(value_parser = parse_role)]
        company: CompanyRole,

        #[arg(long, default_value = "credentials.yml")]
        credentials: PathBuf,
    },
}

fn parse_entity(s: &str) -> Result<EntityType, String> {
    s.parse()
}

fn parse_role(s: &str) -> Result<CompanyRole, String> {
    s.parse()
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match Cli::parse().command {
        Command::Transfer {
            credentials,
            entities,
            mapping_out,
        } => transfer(credentials, entities, mapping_out),
        Command::Authorize {
            company,
            credentials,
        } => authorize_company(company, &credentials),
    }
}

fn transfer(
    credentials: PathBuf,
    entities: Vec<EntityType>,
    mapping_out: Option<PathBuf>,
) -> Result<()> {
    let options = RunOptions {
        credentials_path: credentials,
        entities: entities.into_iter().collect::<BTreeSet<_>>(),
        mapping_out,
    };
    let summary = runner::run(&options).context("transfer aborted")?;
    print!("{summary}");
    if summary.failed() > 0 {
        println!(
            "{} record(s) failed; see the log above for source IDs and API messages",
            summary.failed()
        );
    }
    Ok(())
}

fn authorize_company(role: CompanyRole, credentials_path: &PathBuf) -> Result<()> {
    let mut credentials = Credentials::load(credentials_path)?;
    let company = credentials.company(role);
    let redirect_uri = company.redirect_uri.clone();

    let state = authorize::new_state();
    let url = authorize::consent_url(&credentials.client_id, &redirect_uri, &state);
    println!("Authorizing the {role} company.");
    println!("Opening the Intuit consent page; log in and approve access:");
    println!("  {url}");
    if let Err(error) = open::that(&url) {
        log::warn!("could not open a browser ({error}); open the URL manually");
    }

    let pasted: String = dialoguer::Input::new()
        .with_prompt("Paste the full redirect URL from the browser")
        .interact_text()?;
    let grant = authorize::parse_redirect(&pasted)?;
    if grant.state.as_deref() != Some(state.as_str()) {
        bail!("state in the redirect does not match this invocation; aborting");
    }

    let client = qb_migrate::client::default_agent();
    let tokens = authorize::exchange_code(
        &credentials.client_id,
        &credentials.client_secret,
        &redirect_uri,
        &grant.code,
        &client,
    )
    .context("token exchange failed")?;

    let company = credentials.company_mut(role);
    company.access_token = tokens.access_token;
    company.refresh_token = tokens.refresh_token;
    if let Some(realm_id) = grant.realm_id {
        company.company_id = realm_id;
    }
    credentials.save(credentials_path)?;

    println!(
        "Stored new tokens for the {role} company (company id {}).",
        credentials.company(role).company_id
    );
    Ok(())
}
