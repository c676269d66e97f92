use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use little_lemon::config::Config;
use little_lemon::menu::{
    group_by_category, run_query, FilterSelection, HttpMenuSource, QueryState, StartupOutcome,
    StartupSequence,
};
use little_lemon::profile::{Profile, ProfileError, ProfileStore};
use little_lemon::storage::Database;
use little_lemon::AppError;

/// Get the config directory path (~/.config/little-lemon/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("little-lemon"))
}

#[derive(Parser, Debug)]
#[command(name = "little-lemon", about = "Little Lemon menu and profile")]
struct Cli {
    /// Database file (defaults to ~/.config/little-lemon/little_lemon.db)
    #[arg(long, value_name = "FILE", global = true)]
    db: Option<PathBuf>,

    /// Config file (defaults to ~/.config/little-lemon/config.toml)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Delete the local database before running
    #[arg(long, global = true)]
    reset_db: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the menu, grouped by category
    Menu {
        /// Only dishes whose name contains this text (case-sensitive)
        #[arg(long, default_value = "")]
        search: String,

        /// Restrict to a category; repeat for several. None means all.
        #[arg(long = "category", value_name = "NAME")]
        categories: Vec<String>,
    },
    /// Manage the on-device profile
    #[command(subcommand)]
    Profile(ProfileCommand),
}

#[derive(Subcommand, Debug)]
enum ProfileCommand {
    /// First-run registration with names and email only
    Onboard {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        email: String,
    },
    /// Print the stored profile
    Show,
    /// Update fields and save (the whole record is validated and overwritten)
    Set(ProfileUpdate),
    /// Remove the stored profile
    Logout,
}

#[derive(Args, Debug)]
struct ProfileUpdate {
    #[arg(long)]
    first_name: Option<String>,
    #[arg(long)]
    last_name: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    phone_number: Option<String>,
    #[arg(long)]
    order_statuses: Option<bool>,
    #[arg(long)]
    password_changes: Option<bool>,
    #[arg(long)]
    special_offers: Option<bool>,
    #[arg(long)]
    newsletter: Option<bool>,
    /// Avatar URI
    #[arg(long, conflicts_with = "remove_avatar")]
    avatar: Option<String>,
    #[arg(long)]
    remove_avatar: bool,
}

impl ProfileUpdate {
    fn apply(self, profile: &mut Profile) {
        if let Some(v) = self.first_name {
            profile.first_name = v;
        }
        if let Some(v) = self.last_name {
            profile.last_name = v;
        }
        if let Some(v) = self.email {
            profile.email = v;
        }
        if let Some(v) = self.phone_number {
            profile.phone_number = v;
        }
        if let Some(v) = self.order_statuses {
            profile.order_statuses = v;
        }
        if let Some(v) = self.password_changes {
            profile.password_changes = v;
        }
        if let Some(v) = self.special_offers {
            profile.special_offers = v;
        }
        if let Some(v) = self.newsletter {
            profile.newsletter = v;
        }
        if let Some(uri) = self.avatar {
            profile.set_avatar(uri);
        }
        if self.remove_avatar {
            profile.remove_avatar();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config_dir = get_config_dir()?;
    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir).context("Failed to create config directory")?;
    }

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| config_dir.join("config.toml"));
    let config = Config::load(&config_path).context("Failed to load configuration")?;

    let db_path = cli
        .db
        .clone()
        .unwrap_or_else(|| config_dir.join("little_lemon.db"));
    if cli.reset_db && db_path.exists() {
        std::fs::remove_file(&db_path).context("Failed to delete database")?;
        println!("Database reset.");
    }
    let db_path_str = db_path
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid UTF-8 in database path"))?;

    let db = match Database::connect(db_path_str).await {
        Ok(db) => db,
        Err(e) => exit_with_alert(&AppError::from(e)),
    };

    match cli.command {
        Command::Menu { search, categories } => show_menu(&db, &config, search, categories).await,
        Command::Profile(command) => run_profile(db, command).await,
    }
}

/// Print the alert text and stop; every startup failure is terminal.
fn exit_with_alert(err: &AppError) -> ! {
    tracing::error!(error = %err, "Fatal error");
    eprintln!("{}", err.alert_message());
    std::process::exit(1);
}

async fn show_menu(
    db: &Database,
    config: &Config,
    search: String,
    requested: Vec<String>,
) -> Result<()> {
    let client = reqwest::Client::builder()
        .timeout(config.request_timeout())
        .build()
        .context("Failed to build HTTP client")?;
    let source = HttpMenuSource::new(client, &config.menu_url, config.request_timeout());

    let mut startup = StartupSequence::new();
    match startup.run(db, &source).await {
        Ok(StartupOutcome::Populated { count }) => {
            println!("Downloaded {count} menu items from {}", source.url());
        }
        Ok(StartupOutcome::AlreadyPopulated) => {
            if let Ok(Some(imported_at)) = db.menu_imported_at().await {
                println!("Menu cached since {}", imported_at.format("%Y-%m-%d %H:%M UTC"));
            }
        }
        Err(e) => exit_with_alert(&e),
    }

    for name in &requested {
        if !config.categories.contains(name) {
            eprintln!("Warning: unknown category '{name}' ignored");
        }
    }
    let selections = FilterSelection::from(
        config
            .categories
            .iter()
            .map(|c| requested.contains(c))
            .collect::<Vec<_>>(),
    );
    let state = QueryState {
        search_text: search,
        selections,
    };

    let items = match run_query(db, &state, &config.categories).await {
        Ok(items) => items,
        Err(e) => exit_with_alert(&AppError::from(e)),
    };
    let sections = group_by_category(items, &config.categories);

    if sections.is_empty() {
        println!("No dishes match.");
    }
    for section in sections {
        println!("{}", section.display_title());
        for item in &section.data {
            println!("  {:<28} ${:>6.2}", item.name, item.price);
            if !item.description.is_empty() {
                println!("      {}", item.description);
            }
            println!("      {}", item.image_url(&config.image_base_url));
        }
    }
    Ok(())
}

async fn run_profile(db: Database, command: ProfileCommand) -> Result<()> {
    if let Err(e) = db.initialize().await {
        exit_with_alert(&AppError::from(e));
    }
    let store = ProfileStore::new(db);

    match command {
        ProfileCommand::Onboard {
            first_name,
            last_name,
            email,
        } => match store.onboard(&first_name, &last_name, &email).await {
            Ok(profile) => {
                println!("Welcome, {}!", profile.first_name);
                print_profile(&profile);
            }
            Err(e) => exit_with_invalid(e, "Failed to complete onboarding")?,
        },
        ProfileCommand::Show => {
            if !store.is_onboarded().await.context("Failed to load profile")? {
                println!("Not onboarded yet. Run `little-lemon profile onboard`.");
                return Ok(());
            }
            let profile = store.load().await.context("Failed to load profile")?;
            print_profile(&profile);
        }
        ProfileCommand::Set(update) => {
            let mut profile = store.load().await.context("Failed to load profile")?;
            update.apply(&mut profile);
            match store.save(&profile).await {
                Ok(()) => {
                    println!("Profile saved.");
                    print_profile(&profile);
                }
                Err(e) => exit_with_invalid(e, "Failed to save profile")?,
            }
        }
        ProfileCommand::Logout => {
            store.clear().await.context("Failed to clear profile")?;
            println!("Logged out.");
        }
    }
    Ok(())
}

/// Report rejected fields and exit with status 2; pass storage errors on.
fn exit_with_invalid(err: ProfileError, context: &'static str) -> Result<()> {
    match err {
        ProfileError::Invalid(fields) => {
            for field in fields {
                eprintln!("Invalid {field}");
            }
            std::process::exit(2);
        }
        e => Err(e).context(context),
    }
}

fn print_profile(profile: &Profile) {
    let check = |on: bool| if on { "[x]" } else { "[ ]" };
    let avatar = if profile.has_avatar() {
        profile.image.clone()
    } else {
        format!("({})", profile.initials())
    };

    println!("Avatar:       {avatar}");
    println!("First name:   {}", profile.first_name);
    println!("Last name:    {}", profile.last_name);
    println!("Email:        {}", profile.email);
    println!("Phone number: {}", profile.phone_number);
    println!("Email notifications:");
    println!("  {} Order statuses", check(profile.order_statuses));
    println!("  {} Password changes", check(profile.password_changes));
    println!("  {} Special offers", check(profile.special_offers));
    println!("  {} Newsletter", check(profile.newsletter));
}
