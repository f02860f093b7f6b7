use std::net::SocketAddr;
use std::process;
use std::time::Duration;

use clap::{Parser, Subcommand};
use comfy_table::{modifiers, presets, ContentArrangement, Table};
use indicatif::{ProgressBar, ProgressStyle};
use terminal_size::{terminal_size, Width};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use rolepanel::config::{self, BackendKind, Settings, DEFAULT_HOST, DEFAULT_PORT};
use rolepanel::flows::{delete_user, edit_role, provision_account, FlowContext, NewAccount, RoleEdit};
use rolepanel::models::{AppState, UserRecord};
use rolepanel::services::{build_backends, ensure_bootstrap_admin};
use rolepanel::{build_app, utils};

fn fail(msg: impl std::fmt::Display) -> ! {
    eprintln!("{}", yansi::Paint::new(msg.to_string()).red());
    process::exit(1);
}

fn build_context(env_file: Option<&str>) -> (Settings, FlowContext) {
    config::load_env_file(env_file);
    let settings = Settings::from_env();
    let client = match reqwest::Client::builder()
        .user_agent(format!("rolepanel/{}", env!("CARGO_PKG_VERSION")))
        .build()
    {
        Ok(c) => c,
        Err(e) => fail(format!("Failed to create HTTP client: {}", e)),
    };
    let backends = match build_backends(&settings, client) {
        Ok(b) => b,
        Err(e) => {
            tracing::error!(%e, "Failed to open backend");
            fail(format!("Failed to open backend: {}", e))
        }
    };
    (settings, FlowContext::new(backends.auth, backends.records))
}

fn backend_label(settings: &Settings) -> String {
    match settings.backend {
        BackendKind::Local => format!("local ({})", settings.data_dir.display()),
        BackendKind::Rest => utils::hostname_from_url(&settings.records_api_base_url),
    }
}

async fn start_server(env_file: Option<&str>, host: &str, port: u16, stylesheet: Option<String>) {
    let (settings, flows) = build_context(env_file);
    for problem in settings.problems() {
        tracing::warn!(%problem, "Configuration problem");
    }
    if settings.backend == BackendKind::Local {
        match ensure_bootstrap_admin(&flows, &settings.bootstrap_admin_email, &settings.bootstrap_admin_password).await {
            Ok(true) => println!(
                "{} {}",
                yansi::Paint::new("Created bootstrap administrator").yellow(),
                yansi::Paint::new(&settings.bootstrap_admin_email).cyan()
            ),
            Ok(false) => {}
            Err(e) => fail(format!("Failed to create bootstrap administrator: {}", e)),
        }
    }

    let mut state = AppState::new(flows, settings.public_base_url.clone(), settings.deletion_policy)
        .with_backend_label(backend_label(&settings));
    if let Some(path) = stylesheet {
        match std::fs::read_to_string(&path) {
            Ok(css) => {
                state.custom_css = Some(css);
                tracing::info!("Loaded custom stylesheet from {}", path);
            }
            Err(e) => {
                tracing::error!(%e, "Failed to read custom stylesheet");
                fail(format!("Failed to read custom stylesheet at {}: {}", path, e));
            }
        }
    }

    let addr: SocketAddr = match format!("{}:{}", host, port).parse() {
        Ok(a) => a,
        Err(e) => {
            tracing::error!(%e, "Invalid host/port format");
            fail(format!("Invalid host/port format: {}", e));
        }
    };
    let app = build_app(state);
    tracing::info!(%addr, "Starting rolepanel server");
    println!(
        "{} {}",
        yansi::Paint::new("Admin panel running on").green(),
        yansi::Paint::new(format!("http://{}", addr)).cyan()
    );
    match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(%e, "Server encountered an error while running");
                fail(format!("Server error: {}", e));
            }
        }
        Err(e) => {
            tracing::error!(%e, "Failed to bind to address; is the port already in use?");
            eprintln!(
                "{}: {}\n{}",
                yansi::Paint::new(format!("Failed to bind to {}", addr)).red(),
                e,
                yansi::Paint::new("Please stop any process using this port, or start the server with a different --port value.").yellow()
            );
            process::exit(1);
        }
    }
}

fn print_users(users: &[UserRecord]) {
    if users.is_empty() {
        println!("(no users)");
        return;
    }
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL);
    table.apply_modifier(modifiers::UTF8_ROUND_CORNERS);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    if let Some((Width(w), _)) = terminal_size() {
        table.set_width(w.saturating_sub(4));
    }
    table.set_header(vec!["Email", "Role", "Created At", "Last Updated", "ID"]);
    for u in users {
        table.add_row(vec![
            u.email.clone(),
            u.role.to_string(),
            u.created_at.format("%Y-%m-%d %H:%M").to_string(),
            u.last_updated.format("%Y-%m-%d %H:%M").to_string(),
            u.id.to_string(),
        ]);
    }
    println!("\n{table}\n");
}

async fn find_user(flows: &FlowContext, email: &str) -> UserRecord {
    if let Err(e) = flows.directory.refresh().await {
        fail(format!("Failed to load users: {}", e));
    }
    match flows.directory.find_by_email(email) {
        Some(u) => u,
        None => fail(format!("User '{}' not found", email.trim())),
    }
}

#[derive(Parser)]
#[command(
    name = "rolepanel",
    author,
    version,
    about = "User roles administration panel",
    long_about = r#"rolepanel: manage user accounts and roles backed by an external auth service and user-record service.

Run the web panel with `rolepanel serve`, or manage users directly from the terminal with `rolepanel users`. Configuration is read from the environment or a `.env` file (see `--env-file`).

Examples:
  1) Run the panel against the local backend:
      rolepanel serve --host 127.0.0.1 --port 8080
  2) Create and promote a user:
      rolepanel users add a@x.com secret1
      rolepanel users set-role a@x.com moderator
"#,
    after_help = "Use `rolepanel <subcommand> --help` to get subcommand specific options and usage examples."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
    /// Disable colorized output
    #[arg(long, global = true)]
    no_color: bool,
    /// Disable request/response echo for the REST backend
    #[arg(long, global = true)]
    silent: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the web panel
    Serve {
        /// Host to bind to
        #[arg(long, default_value_t = String::from(DEFAULT_HOST))]
        host: String,
        /// Port to bind to
        #[arg(long, default_value_t = DEFAULT_PORT)]
        port: u16,
        /// Path to .env file
        #[arg(long)]
        env_file: Option<String>,
        /// Path to a custom stylesheet to serve instead of the default
        #[arg(long)]
        stylesheet: Option<String>,
    },
    /// Validate configuration and reach the record service
    #[command(long_about = "Validate the environment for the configured backend, then load the user list once to make sure the record service answers.")]
    CheckConfig {
        #[arg(long)]
        env_file: Option<String>,
    },
    /// Manage users through the same flows as the web panel
    Users {
        #[command(subcommand)]
        sub: UserCommands,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    #[command(about = "List users", long_about = "List every user record (email, role, timestamps, record id).")]
    List,
    #[command(about = "Create a user", long_about = "Create the sign-in identity and its user record. If the record cannot be written, the identity is removed again.")]
    Add {
        email: String,
        password: String,
        /// admin | moderator | user
        #[arg(long, default_value = "user")]
        role: String,
    },
    #[command(about = "Change a user's role", long_about = "Change the role of the user with the given email, optionally rotating their password with --password.")]
    SetRole {
        email: String,
        role: String,
        #[arg(long)]
        password: Option<String>,
    },
    #[command(about = "Delete a user", long_about = "Delete the user record and, unless DELETION_POLICY=record_only, the sign-in identity.")]
    Delete { email: String },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if cli.no_color {
        yansi::whenever(yansi::Condition::NEVER);
    }
    if cli.silent {
        rolepanel::api::set_silent(true);
    }

    let Some(command) = cli.command else {
        start_server(None, DEFAULT_HOST, DEFAULT_PORT, None).await;
        return;
    };
    match command {
        Commands::Serve {
            host,
            port,
            env_file,
            stylesheet,
        } => {
            start_server(env_file.as_deref(), &host, port, stylesheet).await;
        }
        Commands::CheckConfig { env_file } => {
            let (settings, flows) = build_context(env_file.as_deref());
            let problems = settings.problems();
            if !problems.is_empty() {
                for p in problems {
                    eprintln!("{}", yansi::Paint::new(p).red());
                }
                process::exit(1);
            }
            let spinner = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
                spinner.set_style(style);
            }
            spinner.set_message("Loading user records...");
            spinner.enable_steady_tick(Duration::from_millis(100));
            let result = flows.directory.refresh().await;
            spinner.finish_and_clear();
            match result {
                Ok(count) => println!(
                    "{} ({} users on {})",
                    yansi::Paint::new("Configuration looks valid").green(),
                    count,
                    backend_label(&settings)
                ),
                Err(e) => fail(format!("Configuration appears invalid: {}", e)),
            }
        }
        Commands::Users { sub } => {
            let (settings, flows) = build_context(None);
            match sub {
                UserCommands::List => {
                    if let Err(e) = flows.directory.refresh().await {
                        fail(format!("Failed to load users: {}", e));
                    }
                    print_users(&flows.directory.snapshot());
                }
                UserCommands::Add { email, password, role } => {
                    let account = match NewAccount::parse(&email, &password, &role) {
                        Ok(a) => a,
                        Err(e) => fail(e.notification()),
                    };
                    match provision_account(&flows, account).await {
                        Ok(p) => println!(
                            "{} '{}' {} ({})",
                            yansi::Paint::new("User").green(),
                            email.trim(),
                            yansi::Paint::new("created").green(),
                            p.record_id
                        ),
                        Err(e) => fail(e.notification()),
                    }
                }
                UserCommands::SetRole { email, role, password } => {
                    let target = find_user(&flows, &email).await;
                    let edit = match RoleEdit::parse(target.id.clone(), &role, password.as_deref()) {
                        Ok(e) => e,
                        Err(e) => fail(e.notification()),
                    };
                    match edit_role(&flows, edit).await {
                        Ok(outcome) => {
                            println!(
                                "{} '{}' {} {}",
                                yansi::Paint::new("Role for").green(),
                                target.email,
                                yansi::Paint::new("set to").green(),
                                role.trim().to_lowercase()
                            );
                            match outcome.credential {
                                Some(Ok(())) => println!("{}", yansi::Paint::new("Password updated").green()),
                                Some(Err(e)) => fail(format!("Failed to update password: {}", e)),
                                None => {}
                            }
                        }
                        Err(e) => fail(e.notification()),
                    }
                }
                UserCommands::Delete { email } => {
                    let target = find_user(&flows, &email).await;
                    match delete_user(&flows, &target, settings.deletion_policy).await {
                        Ok(outcome) => {
                            println!(
                                "{} '{}' {}",
                                yansi::Paint::new("User").green(),
                                target.email,
                                yansi::Paint::new("deleted").green()
                            );
                            if let Some(Err(e)) = outcome.identity {
                                eprintln!(
                                    "{}: {}",
                                    yansi::Paint::new("The sign-in account could not be removed").yellow(),
                                    e
                                );
                            }
                        }
                        Err(e) => fail(e.notification()),
                    }
                }
            }
        }
    }
}
