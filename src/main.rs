use clap::{Args, Parser, Subcommand};
use englishquest::config::{
    DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SITE_URL, SupabaseConfig, Timeouts,
};
use englishquest::error::{AuthError, BackendError, ErrorCode, ProfileError};
use englishquest::{CoordinatorState, Role, SessionCoordinator, dashboard_redirect, supabase};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] englishquest::config::ConfigError),
    #[error("backend unavailable: {0}")]
    Backend(#[from] BackendError),
    #[error("[{code}] {0}", code = .0.error_code())]
    Auth(#[from] AuthError),
    #[error("[{code}] {0}", code = .0.error_code())]
    Profile(#[from] ProfileError),
    #[error("session never resolved")]
    Disposed,
    #[error("startup failed: {0}")]
    Startup(String),
}

#[derive(Parser, Debug)]
#[command(name = "englishquest", about = "EnglishQuest account and session CLI")]
struct Cli {
    #[arg(long, env = "SUPABASE_URL")]
    supabase_url: String,

    #[arg(long, env = "SUPABASE_ANON_KEY", hide_env_values = true)]
    anon_key: String,

    #[arg(long, env = "SITE_URL", default_value = DEFAULT_SITE_URL)]
    site_url: String,

    #[arg(long, env = "SUPABASE_REQUEST_TIMEOUT_SECS", default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS)]
    request_timeout_secs: u64,

    #[arg(long, env = "SUPABASE_CONNECT_TIMEOUT_SECS", default_value_t = DEFAULT_CONNECT_TIMEOUT_SECS)]
    connect_timeout_secs: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct Credentials {
    #[arg(long)]
    email: String,

    #[arg(long, env = "ENGLISHQUEST_PASSWORD", hide_env_values = true)]
    password: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve the session and print the coordinator state.
    Status,
    SignUp(Credentials),
    /// Sign in and print the user, profile and landing route.
    SignIn(Credentials),
    ResetPassword {
        #[arg(long)]
        email: String,
    },
    UpdatePassword {
        #[command(flatten)]
        credentials: Credentials,
        #[arg(long)]
        new_password: String,
    },
    CompleteProfile {
        #[command(flatten)]
        credentials: Credentials,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long, default_value = "student")]
        role: Role,
        #[arg(long)]
        avatar_url: Option<String>,
    },
}

impl Cli {
    fn config(&self) -> Result<SupabaseConfig, englishquest::config::ConfigError> {
        let timeouts = Timeouts { request_secs: self.request_timeout_secs, connect_secs: self.connect_timeout_secs };
        SupabaseConfig::new(self.supabase_url.clone(), self.anon_key.clone(), self.site_url.clone(), timeouts)
    }
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = cli.config()?;
    let (auth, profiles) = supabase::connect(&config)?;
    let coordinator = SessionCoordinator::start(auth, profiles, config.redirects());

    let state = coordinator.ready().await.ok_or(CliError::Disposed)?;
    if let (Some(message), false) = (&state.error, state.is_authenticated()) {
        return Err(CliError::Startup(message.clone()));
    }

    let result = run(&coordinator, cli.command).await;
    coordinator.dispose();
    result
}

async fn run(coordinator: &SessionCoordinator, command: Command) -> Result<(), CliError> {
    match command {
        Command::Status => print_state(&coordinator.snapshot()),
        Command::SignUp(creds) => {
            let outcome = coordinator.sign_up(&creds.email, &creds.password).await?;
            if outcome.needs_email_verification {
                println!("check {} for a confirmation link", creds.email);
            } else {
                println!("account created and signed in");
            }
        }
        Command::SignIn(creds) => {
            coordinator.sign_in(&creds.email, &creds.password).await?;
            print_state(&coordinator.snapshot());
        }
        Command::ResetPassword { email } => {
            coordinator.reset_password(&email).await?;
            println!("password reset email sent to {email}");
        }
        Command::UpdatePassword { credentials, new_password } => {
            coordinator.sign_in(&credentials.email, &credentials.password).await?;
            coordinator.update_password(&new_password).await?;
            println!("password updated");
        }
        Command::CompleteProfile { credentials, first_name, last_name, role, avatar_url } => {
            coordinator.sign_in(&credentials.email, &credentials.password).await?;
            let profile = coordinator.complete_profile(&first_name, &last_name, role, avatar_url).await?;
            println!("profile {} created for {}", profile.id, profile.display_name());
            print_state(&coordinator.snapshot());
        }
    }
    Ok(())
}

fn print_state(state: &CoordinatorState) {
    match &state.user {
        Some(user) => println!("user: {} ({})", user.id, user.email.as_deref().unwrap_or("-")),
        None => println!("user: signed out"),
    }
    if let Some(profile) = &state.profile {
        println!("profile: {} [{}]", profile.display_name(), profile.role);
    }
    if let Some(error) = &state.error {
        println!("error: {error}");
    }
    match dashboard_redirect(state) {
        Ok(path) => println!("route: {path}"),
        Err(access) => println!("route: {}", access.redirect_path().unwrap_or("-")),
    }
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;
