use std::io::Write;

use colored::Colorize;

use crate::core::models::key_entry::EXPIRY_FORMAT;
use crate::core::services::key_vault::VaultStatus;

/// Print a success message.
pub fn success(msg: &str) {
    println!("  {} {}", "✓".green(), msg);
}

/// Print a warning message.
pub fn warning(msg: &str) {
    println!("  {} {}", "⚠".yellow(), msg);
}

/// Print an error message.
pub fn error(msg: &str) {
    eprintln!("  {} {}", "✗".red(), msg);
}

/// Print a header line.
pub fn header(msg: &str) {
    println!("\n{}", msg.bold());
}

/// Print an agent event notice.
pub fn notice(msg: &str) {
    println!("  {} {}", "•".cyan(), msg);
}

/// Print a question without a trailing newline.
pub fn prompt(msg: &str) {
    print!("  {} {} ", "?".magenta().bold(), msg);
    let _ = std::io::stdout().flush();
}

/// Print the custodied keys as a table.
pub fn key_table(status: &VaultStatus) {
    print!("{}", render_key_table(status));
}

/// The table printed by `key_table`, uncolored.
pub fn render_key_table(status: &VaultStatus) -> String {
    if status.locked {
        return "  (agent locked)\n".to_string();
    }
    if status.keys.is_empty() {
        return "  (no keys)\n".to_string();
    }

    let mut out = format!(
        "  {:<12} {:<51} {:<20} {:<30} {}\n",
        "TYPE", "FINGERPRINT", "COMMENT", "EXPIRES", "USES"
    );
    for key in &status.keys {
        out.push_str(&format!(
            "  {:<12} {:<51} {:<20} {:<30} {}\n",
            key.key_type,
            key.fingerprint,
            key.comment,
            key.expire_at.format(EXPIRY_FORMAT).to_string(),
            key.usage_count
        ));
    }
    out
}
