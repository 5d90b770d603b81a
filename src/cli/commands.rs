//! CLI command implementations

use anyhow::Result;
use chrono::{TimeZone, Utc};
use std::fs;
use std::sync::Arc;

use crate::auth::models::{ContentQuery, FormErrors, ProfileUpdate, SignupRequest};
use crate::auth::token::{expiry, is_expired};
use crate::auth::{AuthStore, Session};
use crate::cli::{
    confirm, error, info, print_content_table, print_form_errors, print_user, success, warn,
    CliNotifier, ContentAction, OutputFormat, PdfAction, TokenAction, UploadKind,
};
use crate::client::{ApiClient, Upload};
use crate::config::{self, Config};

/// Initialize a new relaygate.toml configuration file
pub async fn init() -> Result<()> {
    let config_path = std::path::Path::new(config::loader::CONFIG_FILENAME);

    if config_path.exists() {
        warn("relaygate.toml already exists");
        return Ok(());
    }

    let content = config::loader::default_config_content();
    fs::write(config_path, content)?;

    success("Created relaygate.toml");
    info("Edit the configuration file and run 'relaygate serve' to start the gateway");

    Ok(())
}

/// Start the gateway
pub async fn serve(host: Option<String>, port: Option<u16>) -> Result<()> {
    let config = load_config()?;
    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);

    info(&format!("Starting gateway at http://{}:{}", host, port));
    info(&format!("Relaying to {}", config.backend.url));

    crate::api::run_server(config, &host, port).await?;
    Ok(())
}

pub async fn login(email: &str, password: &str) -> Result<()> {
    let store = auth_store(&load_config()?)?;
    match store.login(email, password).await {
        Ok(auth) => {
            if let Some(user) = auth.user {
                info(&format!("Signed in as {} <{}>", user.name, user.email));
            }
            Ok(())
        }
        Err(e) => fail_with_form_errors(e),
    }
}

pub async fn signup(email: &str, password: &str, name: &str) -> Result<()> {
    let store = auth_store(&load_config()?)?;
    let request = SignupRequest {
        email: email.to_string(),
        password: password.to_string(),
        name: name.to_string(),
    };

    match store.signup(&request).await {
        Ok(_) => {
            info("Check your inbox, then run 'relaygate verify-email --token <token>'");
            Ok(())
        }
        Err(e) => fail_with_form_errors(e),
    }
}

pub async fn logout() -> Result<()> {
    let store = auth_store(&load_config()?)?;
    store.logout().await?;
    Ok(())
}

pub async fn whoami(format: OutputFormat) -> Result<()> {
    let store = auth_store(&load_config()?)?;

    match store.init().await {
        Some(user) => {
            match format {
                OutputFormat::Table => print_user(&user),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&user)?),
            }
            Ok(())
        }
        None => {
            warn("Not logged in. Run 'relaygate login' first");
            Ok(())
        }
    }
}

pub async fn update_profile(name: Option<String>, email: Option<String>) -> Result<()> {
    if name.is_none() && email.is_none() {
        warn("Nothing to update; pass --name and/or --email");
        return Ok(());
    }

    let store = auth_store(&load_config()?)?;
    let update = ProfileUpdate {
        name,
        email,
        password: None,
    };

    match store.update_profile(&update).await {
        Ok(user) => {
            print_user(&user);
            Ok(())
        }
        Err(e) => fail_with_form_errors(e),
    }
}

pub async fn delete_account(force: bool) -> Result<()> {
    if !force && !confirm("Permanently delete your account?") {
        info("Cancelled");
        return Ok(());
    }

    let store = auth_store(&load_config()?)?;
    store.delete_account().await?;
    Ok(())
}

pub async fn forgot_password(email: &str) -> Result<()> {
    let store = auth_store(&load_config()?)?;
    match store.forgot_password(email).await {
        Ok(_) => Ok(()),
        Err(e) => fail_with_form_errors(e),
    }
}

pub async fn reset_password(otp: &str, password: &str) -> Result<()> {
    let store = auth_store(&load_config()?)?;
    match store.reset_password(otp, password).await {
        Ok(_) => Ok(()),
        Err(e) => fail_with_form_errors(e),
    }
}

pub async fn verify_email(token: &str) -> Result<()> {
    let store = auth_store(&load_config()?)?;
    store.verify_email(token).await?;
    info("You can now run 'relaygate login'");
    Ok(())
}

pub async fn resend_verification(email: &str) -> Result<()> {
    let store = auth_store(&load_config()?)?;
    store.resend_verification(email).await?;
    Ok(())
}

/// Content history commands
pub async fn content(action: ContentAction) -> Result<()> {
    let store = auth_store(&load_config()?)?;

    match action {
        ContentAction::List {
            content_type,
            limit,
            offset,
            format,
        } => {
            let query = ContentQuery {
                content_type,
                limit,
                offset,
            };
            let items = store.list_content(&query).await?;
            match format {
                OutputFormat::Table => print_content_table(&items),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&items)?),
            }
        }
        ContentAction::Delete { id } => {
            store.delete_content(&id).await?;
        }
        ContentAction::Download { filename, output } => {
            let token = store
                .session()
                .token()?
                .ok_or_else(|| anyhow::anyhow!("Not logged in. Run 'relaygate login' first"))?;
            let client = api_client(&load_config()?)?;
            let bytes = client.download_content_pdf(&filename, &token).await?;
            let output = output.unwrap_or_else(|| filename.clone().into());
            fs::write(&output, &bytes)?;
            success(&format!("Saved {} ({} bytes)", output.display(), bytes.len()));
        }
    }

    Ok(())
}

pub async fn chat(message: &str) -> Result<()> {
    let client = api_client(&load_config()?)?;
    let reply = client.send_message(message).await?;
    println!("{}", serde_json::to_string_pretty(&reply)?);
    Ok(())
}

pub async fn upload(path: &std::path::Path, kind: UploadKind) -> Result<()> {
    let client = api_client(&load_config()?)?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    let upload = Upload::new(file_name, fs::read(path)?);

    let result = match kind {
        UploadKind::File => client.upload_file(upload).await?,
        UploadKind::Image => client.process_image(upload).await?,
        UploadKind::Voice => client.send_voice(upload).await?,
    };

    success("Upload processed");
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

pub async fn story(prompt: &str, template: Option<String>) -> Result<()> {
    let client = api_client(&load_config()?)?;

    info("Generating story...");
    let result = match template {
        Some(template) => client.generate_custom_pdf(prompt, &template).await?,
        None => client.generate_story(prompt).await?,
    };

    success("Story generated");
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

pub async fn pdf(action: PdfAction) -> Result<()> {
    let client = api_client(&load_config()?)?;

    match action {
        PdfAction::List => {
            let pdfs = client.list_pdfs().await?;
            println!("{}", serde_json::to_string_pretty(&pdfs)?);
        }
        PdfAction::Download { file_id, output } => {
            let bytes = client.download_pdf(&file_id).await?;
            let output = output.unwrap_or_else(|| format!("{}.pdf", file_id).into());
            fs::write(&output, &bytes)?;
            success(&format!("Saved {} ({} bytes)", output.display(), bytes.len()));
        }
    }

    Ok(())
}

pub async fn token(action: TokenAction) -> Result<()> {
    match action {
        TokenAction::Inspect { token: raw } => {
            let raw = match raw {
                Some(raw) => raw,
                None => {
                    let config = load_config()?;
                    match session(&config).token()? {
                        Some(stored) => stored,
                        None => {
                            warn("No stored token");
                            return Ok(());
                        }
                    }
                }
            };

            match expiry(&raw) {
                Some(exp) => {
                    let when = Utc
                        .timestamp_opt(exp as i64, 0)
                        .single()
                        .map(|t| t.to_rfc3339())
                        .unwrap_or_else(|| exp.to_string());
                    info(&format!("Expires at {}", when));
                    if is_expired(&raw) {
                        warn("Token is expired");
                    } else {
                        success("Token is fresh");
                    }
                }
                None => error("Token could not be decoded (treated as expired)"),
            }
        }
    }

    Ok(())
}

fn fail_with_form_errors(e: crate::error::Error) -> Result<()> {
    let errors = FormErrors::from_error(&e);
    if !errors.is_empty() {
        print_form_errors(&errors);
    }
    Err(e.into())
}

fn load_config() -> Result<Config> {
    config::load_config_or_default().map_err(|e| anyhow::anyhow!("{}", e))
}

fn session(config: &Config) -> Session {
    Session::in_dir(&config.client.state_dir).with_cookie(
        &config.cookie.name,
        config.cookie.max_age_secs,
        config.secure_cookies(),
    )
}

fn auth_store(config: &Config) -> Result<AuthStore> {
    Ok(AuthStore::new(&config.client.gateway_url, session(config))?
        .with_notifier(Arc::new(CliNotifier)))
}

fn api_client(config: &Config) -> Result<ApiClient> {
    ApiClient::new(&config.client.api_url).map_err(|e| anyhow::anyhow!("{}", e))
}
