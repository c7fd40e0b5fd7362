use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use dropbox_business::{
    Authenticator, DropboxAppConfig, PlanTier, TeamApiClient, TimeRange, UnionTag,
};

const MEMBERS_PAGE: u32 = 100;
const MEMBERS_SHOWN: usize = 10;
const EVENTS_PAGE: u32 = 50;
const EVENTS_SHOWN: usize = 5;

/// Dropbox Business CLI - walks through OAuth and the read-only team endpoints
#[derive(Parser)]
#[command(name = "dropbox-business-cli")]
#[command(version = "0.1.0")]
#[command(about = "Authorize a Dropbox Business app and print team info, members and sign-in events", long_about = None)]
struct Cli {
    /// App key (or use DROPBOX_CLIENT_ID env var)
    #[arg(long, env = "DROPBOX_CLIENT_ID")]
    client_id: String,

    /// App secret (or use DROPBOX_CLIENT_SECRET env var)
    #[arg(long, env = "DROPBOX_CLIENT_SECRET", hide_env_values = true)]
    client_secret: String,

    /// Redirect URI registered for the app
    #[arg(long, env = "DROPBOX_REDIRECT_URI", default_value = "http://localhost:8080/callback")]
    redirect_uri: String,

    /// Authorization code; prompted for on stdin when omitted
    #[arg(short = 'c', long)]
    code: Option<String>,

    /// Sign-in event window in days (1-3650)
    #[arg(short = 'd', long, default_value_t = 30, value_parser = clap::value_parser!(u32).range(1..=3650))]
    days: u32,

    /// Verbose mode for debugging
    #[arg(short = 'v', long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    if let Err(e) = run(cli).await {
        log::error!("Application error: {e:#}");
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = DropboxAppConfig::new(cli.client_id, cli.client_secret, cli.redirect_uri);
    let auth = Authenticator::from_config(config).context("invalid app credentials")?;

    println!("Please visit this URL to authorize the application:");
    println!("{}", auth.authorization_url());
    println!();

    let code = match cli.code {
        Some(code) => code,
        None => prompt_code()?,
    };
    if code.trim().is_empty() {
        bail!("authorization code cannot be empty");
    }

    auth.exchange_code(code.trim())
        .await
        .context("failed to exchange authorization code")?;
    println!("Authentication successful!");
    println!();

    let client = TeamApiClient::new(Arc::new(auth))?;

    // Each section reports its own failure so the others still run.
    if let Err(e) = show_team_info(&client).await {
        log::error!("Failed to get team info: {e}");
        eprintln!("Failed to get team info: {e}");
    }
    if let Err(e) = show_members(&client).await {
        log::error!("Failed to get team members: {e}");
        eprintln!("Failed to get team members: {e}");
    }
    if let Err(e) = show_sign_in_events(&client, cli.days).await {
        log::error!("Failed to get sign-in events: {e}");
        eprintln!("Failed to get sign-in events: {e}");
    }

    client.close();
    Ok(())
}

fn prompt_code() -> anyhow::Result<String> {
    print!("Enter the authorization code from the callback URL: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read authorization code")?;
    Ok(line.trim().to_string())
}

fn or_na(value: Option<&str>) -> &str {
    value.unwrap_or("N/A")
}

fn tag_or_na(value: &Option<UnionTag>) -> &str {
    value.as_ref().map(UnionTag::as_str).unwrap_or("N/A")
}

async fn show_team_info(client: &TeamApiClient) -> dropbox_business::Result<()> {
    println!("=== TEAM INFORMATION ===");
    let info = client.get_team_info().await?;

    println!("Team Name: {}", or_na(info.name.as_deref()));
    println!("Team ID: {}", or_na(info.team_id.as_deref()));
    match info.num_licensed_users {
        Some(n) => println!("Licensed Users: {n}"),
        None => println!("Licensed Users: N/A"),
    }
    match info.num_provisioned_users {
        Some(n) => println!("Provisioned Users: {n}"),
        None => println!("Provisioned Users: N/A"),
    }

    if let Some(policies) = &info.policies {
        if let Some(sharing) = &policies.sharing {
            println!(
                "Shared Folder Member Policy: {}",
                tag_or_na(&sharing.shared_folder_member_policy)
            );
            println!(
                "Shared Folder Join Policy: {}",
                tag_or_na(&sharing.shared_folder_join_policy)
            );
            println!(
                "Shared Link Create Policy: {}",
                tag_or_na(&sharing.shared_link_create_policy)
            );
        }
        println!("EMM State: {}", tag_or_na(&policies.emm_state));
        println!("Office Add-in: {}", tag_or_na(&policies.office_addin));
    }

    println!(
        "Estimated Plan Type: {}",
        PlanTier::from_licensed_users(info.num_licensed_users)
    );
    println!();
    Ok(())
}

async fn show_members(client: &TeamApiClient) -> dropbox_business::Result<()> {
    println!("=== TEAM MEMBERS LIST ===");
    let page = client.get_team_members(MEMBERS_PAGE, false).await?;

    println!("Total members found: {}", page.members.len());
    println!("Has more pages: {}", page.has_more);
    println!("Cursor: {}", or_na(page.cursor.as_deref()));
    println!();

    println!("Members:");
    let profiles = page.members.iter().filter_map(|m| m.profile.as_ref());
    for (i, profile) in profiles.take(MEMBERS_SHOWN).enumerate() {
        println!(
            "{}. {} ({}) - Status: {} - Member Type: {}",
            i + 1,
            or_na(profile.display_name()),
            or_na(profile.email.as_deref()),
            tag_or_na(&profile.status),
            tag_or_na(&profile.membership_type),
        );
        if let Some(joined) = &profile.joined_on {
            println!("   Joined: {joined}");
        }
        if let Some(id) = &profile.team_member_id {
            println!("   Team Member ID: {id}");
        }
    }
    if page.members.len() > MEMBERS_SHOWN {
        println!("... and {} more members", page.members.len() - MEMBERS_SHOWN);
    }
    println!();
    Ok(())
}

async fn show_sign_in_events(client: &TeamApiClient, days: u32) -> dropbox_business::Result<()> {
    println!("=== SIGN-IN EVENTS ===");
    let range = TimeRange::last_days(chrono::Utc::now(), days)?;
    let page = client.get_sign_in_events(EVENTS_PAGE, Some(range)).await?;

    println!("Sign-in events found: {}", page.events.len());
    println!("Has more pages: {}", page.has_more);
    println!("Cursor: {}", or_na(page.cursor.as_deref()));
    println!();

    if page.events.is_empty() {
        println!("No sign-in events found in the last {days} days.");
        println!();
        return Ok(());
    }

    println!("Recent sign-in events:");
    for (i, event) in page.events.iter().take(EVENTS_SHOWN).enumerate() {
        let (name, email) = match event.actor_user() {
            Some(user) => (
                or_na(user.display_name.as_deref()),
                or_na(user.email.as_deref()),
            ),
            None => ("Unknown User", "N/A"),
        };
        let location = event
            .origin
            .as_ref()
            .map(|o| o.location_summary())
            .unwrap_or_else(|| "Unknown Location".to_string());

        println!(
            "{}. [{}] {} ({})",
            i + 1,
            or_na(event.timestamp.as_deref()),
            name,
            email
        );
        println!(
            "   Event: {} - {}",
            tag_or_na(&event.event_category),
            tag_or_na(&event.event_type)
        );
        println!("   Location: {location}");
        println!();
    }
    if page.events.len() > EVENTS_SHOWN {
        println!("... and {} more events", page.events.len() - EVENTS_SHOWN);
    }
    println!();
    Ok(())
}
