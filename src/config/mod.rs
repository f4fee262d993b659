mod settings;

pub use settings::{Config, InvoiceSettings, MagicFillSettings, PdfSettings, Sender};

use crate::error::{InvoiceError, Result};
use directories::ProjectDirs;
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "config.toml";

/// Get the config directory path (~/.invoice-studio/)
pub fn config_dir() -> Result<PathBuf> {
    // First try XDG-style directories
    if let Some(proj_dirs) = ProjectDirs::from("", "", "invoice-studio") {
        return Ok(proj_dirs.config_dir().to_path_buf());
    }

    // Fallback to ~/.invoice-studio/
    let home = dirs_home().ok_or_else(|| {
        InvoiceError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Could not determine home directory",
        ))
    })?;

    Ok(home.join(".invoice-studio"))
}

fn dirs_home() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

/// Expand ~ in paths
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs_home() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Load the main config.toml
pub fn load_config(config_dir: &Path) -> Result<Config> {
    let path = config_dir.join(CONFIG_FILE);
    if !path.exists() {
        return Err(InvoiceError::ConfigFileNotFound(path));
    }
    let content = fs::read_to_string(&path)?;
    let config: Config =
        toml::from_str(&content).map_err(|e| InvoiceError::ConfigParse { path, source: e })?;
    debug!("loaded config for user '{}'", config.user_id);
    Ok(config)
}

/// Output directory for PDFs; relative paths live under the config dir.
pub fn resolve_output_dir(config_dir: &Path, config: &Config) -> PathBuf {
    settings::resolve(config_dir, &config.pdf.output_dir)
}

/// Creates the config directory with a commented `config.toml`.
pub fn init_config(config_dir: &Path) -> Result<()> {
    if config_dir.exists() {
        return Err(InvoiceError::AlreadyInitialized(config_dir.to_path_buf()));
    }
    fs::create_dir_all(config_dir)?;
    fs::write(config_dir.join(CONFIG_FILE), CONFIG_TEMPLATE)?;
    Ok(())
}

/// Template content for config.toml
pub const CONFIG_TEMPLATE: &str = r#"# Records written by this CLI belong to this user.
user_id = "local"

# Copied into the "from" block of every new invoice.
[sender]
name = "Your Business"
email = "billing@yourbusiness.com"
address = "123 Business Street, San Francisco, CA"
# phone = "+1-555-123-4567"    # optional

[invoice]
due_days = 30
# tax_rate = 8.25              # percent, optional
# notes = "Payment due within 30 days."

[pdf]
output_dir = "output"          # relative to this directory, or ~/...
render_timeout_secs = 30
# TrueType fonts to embed. Without them the built-in Helvetica is used.
# regular_font = "fonts/Inter-Regular.ttf"
# regular_font_url = "https://example.com/Inter-Regular.ttf"
# bold_font = "fonts/Inter-Bold.ttf"
# bold_font_url = "https://example.com/Inter-Bold.ttf"

[magic_fill]
# endpoint = "http://localhost:3000/api/magic-fill"
timeout_secs = 30
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    #[test]
    fn template_parses_with_defaults() {
        let config: Config = toml::from_str(CONFIG_TEMPLATE).unwrap();
        assert_eq!(config.user_id, "local");
        assert_eq!(config.invoice.due_days, 30);
        assert_eq!(config.invoice.tax_rate, None);
        assert!(config.magic_fill.endpoint.is_none());
        assert_eq!(config.pdf.render_timeout_secs, 30);
    }

    #[test]
    fn relative_paths_resolve_against_config_dir() {
        let dir = Path::new("/tmp/invoice-cfg");
        let config = Config::default();
        assert_eq!(resolve_output_dir(dir, &config), dir.join("output"));

        let mut pdf = PdfSettings::default();
        pdf.regular_font = Some("fonts/a.ttf".to_string());
        pdf.bold_font = Some("/abs/b.ttf".to_string());
        let (regular, bold) = pdf.font_sources(dir);
        assert_eq!(regular.path, Some(dir.join("fonts/a.ttf")));
        assert_eq!(bold.path, Some(PathBuf::from("/abs/b.ttf")));
    }

    #[test]
    fn new_invoice_uses_configured_defaults() {
        let config: Config = toml::from_str(
            r#"
            [sender]
            name = "Acme"
            [invoice]
            due_days = 14
            tax_rate = 10.0
            "#,
        )
        .unwrap();
        let today = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let data = config.new_invoice(today).unwrap();
        assert_eq!(data.sender.name, "Acme");
        assert_eq!(data.due_date, NaiveDate::from_ymd_opt(2026, 3, 15));
        assert_eq!(data.tax, Some(10.0));
    }

    #[test]
    fn new_invoice_rejects_out_of_range_tax() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        for raw in ["tax_rate = 150.0", "tax_rate = inf", "tax_rate = -5.0"] {
            let config: Config = toml::from_str(&format!("[invoice]\n{raw}\n")).unwrap();
            assert!(
                matches!(config.new_invoice(today), Err(InvoiceError::InvalidTaxRate(_))),
                "{raw} should be rejected"
            );
        }

        let config: Config = toml::from_str("[invoice]\ntax_rate = 0.0\n").unwrap();
        assert_eq!(config.new_invoice(today).unwrap().tax, None);
    }

    #[test]
    fn init_refuses_existing_directory() {
        let dir = TempDir::new().unwrap();
        let cfg = dir.path().join("cfg");
        init_config(&cfg).unwrap();
        assert!(load_config(&cfg).is_ok());
        assert!(matches!(
            init_config(&cfg),
            Err(InvoiceError::AlreadyInitialized(_))
        ));
    }
}
