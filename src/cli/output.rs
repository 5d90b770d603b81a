//! CLI output formatting utilities

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};

use crate::auth::models::{ContentItem, FormErrors, User};
use crate::auth::store::Notifier;

/// Print a success message
pub fn success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

/// Print an error message
pub fn error(message: &str) {
    eprintln!("{} {}", "✗".red(), message);
}

/// Print a warning message
pub fn warn(message: &str) {
    println!("{} {}", "⚠".yellow(), message);
}

/// Print an info message
pub fn info(message: &str) {
    println!("{} {}", "ℹ".blue(), message);
}

/// Auth store notifications rendered on the terminal
#[derive(Debug, Default, Clone, Copy)]
pub struct CliNotifier;

impl Notifier for CliNotifier {
    fn success(&self, message: &str) {
        success(message);
    }

    fn error(&self, message: &str) {
        error(message);
    }
}

/// Print field-level and general form errors
pub fn print_form_errors(errors: &FormErrors) {
    for (field, message) in &errors.fields {
        eprintln!("  {} {}", format!("{}:", field).yellow(), message);
    }
    if let Some(general) = &errors.general {
        eprintln!("  {}", general);
    }
}

/// Print user details
pub fn print_user(user: &User) {
    println!();
    println!("{}", "User".bold());
    println!("  {}: {}", "ID".cyan(), user.id);
    println!("  {}: {}", "Name".cyan(), user.name);
    println!("  {}: {}", "Email".cyan(), user.email);
    for (key, value) in &user.extra {
        println!("  {}: {}", key.cyan(), value);
    }
    println!();
}

/// Print a table of content history items
pub fn print_content_table(items: &[ContentItem]) {
    if items.is_empty() {
        info("No content found");
        return;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("ID").fg(Color::Cyan),
            Cell::new("Type").fg(Color::Cyan),
            Cell::new("Title").fg(Color::Cyan),
            Cell::new("File").fg(Color::Cyan),
            Cell::new("Created").fg(Color::Cyan),
        ]);

    for item in items {
        table.add_row(vec![
            Cell::new(&item.id),
            Cell::new(item.content_type.as_deref().unwrap_or("-")),
            Cell::new(item.title.as_deref().unwrap_or("-")),
            Cell::new(item.filename.as_deref().unwrap_or("-")),
            Cell::new(item.created_at.as_deref().unwrap_or("-")),
        ]);
    }

    println!("{table}");
}

/// Ask for confirmation
pub fn confirm(message: &str) -> bool {
    use std::io::{self, Write};

    print!("{} {} [y/N] ", "?".cyan(), message);
    if io::stdout().flush().is_err() {
        return false;
    }

    let mut input = String::new();
    if io::stdin().read_line(&mut input).is_err() {
        return false;
    }

    matches!(input.trim().to_lowercase().as_str(), "y" | "yes")
}
