use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use relaygate::cli::{self, Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "relaygate=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => cli::commands::init().await,
        Commands::Serve { host, port } => cli::commands::serve(host, port).await,
        Commands::Login { email, password } => cli::commands::login(&email, &password).await,
        Commands::Signup {
            email,
            password,
            name,
        } => cli::commands::signup(&email, &password, &name).await,
        Commands::Logout => cli::commands::logout().await,
        Commands::Whoami { format } => cli::commands::whoami(format).await,
        Commands::UpdateProfile { name, email } => {
            cli::commands::update_profile(name, email).await
        }
        Commands::DeleteAccount { force } => cli::commands::delete_account(force).await,
        Commands::ForgotPassword { email } => cli::commands::forgot_password(&email).await,
        Commands::ResetPassword { otp, password } => {
            cli::commands::reset_password(&otp, &password).await
        }
        Commands::VerifyEmail { token } => cli::commands::verify_email(&token).await,
        Commands::ResendVerification { email } => {
            cli::commands::resend_verification(&email).await
        }
        Commands::Content { action } => cli::commands::content(action).await,
        Commands::Chat { message } => cli::commands::chat(&message).await,
        Commands::Story { prompt, template } => cli::commands::story(&prompt, template).await,
        Commands::Upload { path, kind } => cli::commands::upload(&path, kind).await,
        Commands::Pdf { action } => cli::commands::pdf(action).await,
        Commands::Token { action } => cli::commands::token(action).await,
    }
}
