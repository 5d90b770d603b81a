//! CLI interface for relaygate

pub mod commands;
mod output;

pub use output::*;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "relaygate")]
#[command(version)]
#[command(about = "Auth-gating gateway and session client", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new relaygate.toml configuration file
    Init,

    /// Start the gateway (auth gate, backend relay and pages)
    Serve {
        /// Host to bind to (defaults to the configured host)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (defaults to the configured port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Log in and store the session token
    Login {
        #[arg(short, long)]
        email: String,

        #[arg(short, long, env = "RELAYGATE_PASSWORD")]
        password: String,
    },

    /// Create an account
    Signup {
        #[arg(short, long)]
        email: String,

        #[arg(short, long, env = "RELAYGATE_PASSWORD")]
        password: String,

        #[arg(short, long)]
        name: String,
    },

    /// Log out and clear the stored session
    Logout,

    /// Show the user behind the stored session
    Whoami {
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Update the current user's profile
    UpdateProfile {
        #[arg(short, long)]
        name: Option<String>,

        #[arg(short, long)]
        email: Option<String>,
    },

    /// Permanently delete the current account
    DeleteAccount {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Request a password reset email
    ForgotPassword {
        #[arg(short, long)]
        email: String,
    },

    /// Complete a password reset with the emailed code
    ResetPassword {
        #[arg(long)]
        otp: String,

        #[arg(short, long, env = "RELAYGATE_PASSWORD")]
        password: String,
    },

    /// Confirm an email address
    VerifyEmail {
        #[arg(short, long)]
        token: String,
    },

    /// Send the verification email again
    ResendVerification {
        #[arg(short, long)]
        email: String,
    },

    /// Browse generated content
    Content {
        #[command(subcommand)]
        action: ContentAction,
    },

    /// Chat with the assistant
    Chat {
        message: String,
    },

    /// Generate a story PDF
    Story {
        prompt: String,

        /// Custom template type
        #[arg(short, long)]
        template: Option<String>,
    },

    /// Upload a file for processing
    Upload {
        path: std::path::PathBuf,

        #[arg(short, long, default_value = "file")]
        kind: UploadKind,
    },

    /// Work with generated PDFs
    Pdf {
        #[command(subcommand)]
        action: PdfAction,
    },

    /// Inspect bearer tokens
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },
}

#[derive(Subcommand)]
pub enum ContentAction {
    /// List content history
    List {
        /// Content type filter (e.g. PDF)
        #[arg(short = 't', long = "type")]
        content_type: Option<String>,

        #[arg(short, long, default_value = "10")]
        limit: u32,

        #[arg(short, long, default_value = "0")]
        offset: u32,

        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Delete a content item
    Delete { id: String },

    /// Download the PDF behind a content item
    Download {
        filename: String,

        #[arg(short, long)]
        output: Option<std::path::PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum PdfAction {
    /// List generated PDFs
    List,

    /// Download a PDF
    Download {
        file_id: String,

        /// Output path (defaults to <file_id>.pdf)
        #[arg(short, long)]
        output: Option<std::path::PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum TokenAction {
    /// Show expiry of a token (defaults to the stored one)
    Inspect { token: Option<String> },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum UploadKind {
    /// Generic document upload
    File,
    /// Image to describe
    Image,
    /// Voice message for the chat assistant
    Voice,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}
