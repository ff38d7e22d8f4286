use std::io::BufRead;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use warranty_portal::api::types::LoginRequest;
use warranty_portal::stores::AuthStore;
use warranty_portal::utils::spreadsheet::{self, Sheet};
use warranty_portal::utils::extract_serial_number;
use warranty_portal::{logging, ApiService, ClientConfig, Error, Result};

#[derive(Parser, Debug)]
#[command(name = "warranty-portal")]
#[command(version, about = "Implant warranty portal client", long_about = None)]
struct Cli {
    /// API base URL (defaults to PUBLIC_API_BASE_URL)
    #[arg(long)]
    api_url: Option<String>,

    /// Log API failures and debug output
    #[arg(long)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show whether a warranty can still be registered
    Status { warranty_id: String },

    /// Check a serial number against a warranty
    CheckSerial {
        serial_number: String,
        #[arg(long)]
        warranty: String,
    },

    /// Derive the short serial from a full 54-character serial
    ExtractSerial { full_serial_number: String },

    /// Bulk import serials for a product from a CSV file.
    /// The password is read from PORTAL_PASSWORD, or from stdin when unset.
    ImportSerials {
        file: PathBuf,
        #[arg(long)]
        product_id: String,
        #[arg(long)]
        username: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = ClientConfig::from_env();
    if let Some(url) = &cli.api_url {
        config = ClientConfig::new(url).with_debug(config.debug);
    }
    if cli.debug {
        config.debug = true;
    }
    logging::init(&config);

    match run(cli.command, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("error: {}", e.message());
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command, config: ClientConfig) -> Result<()> {
    match command {
        Command::ExtractSerial { full_serial_number } => {
            match extract_serial_number(&full_serial_number) {
                Some(serial) => println!("{}", serial),
                None => {
                    return Err(Error::Request(format!(
                        "Expected a 54-character serial, got {} characters",
                        full_serial_number.chars().count()
                    )))
                }
            }
        }
        Command::Status { warranty_id } => {
            let api = ApiService::new(config, AuthStore::global())?;
            let status = api.check_warranty_status(&warranty_id).await?;
            println!(
                "{}: {}",
                if status.can_edit { "open" } else { "closed" },
                status.message
            );
        }
        Command::CheckSerial {
            serial_number,
            warranty,
        } => {
            let api = ApiService::new(config, AuthStore::global())?;
            let result = api.check_serial_number(&serial_number, &warranty).await?;
            println!("{}", result.message);
        }
        Command::ImportSerials {
            file,
            product_id,
            username,
        } => {
            let password = read_password(
                std::env::var(PASSWORD_ENV).ok(),
                std::io::stdin().lock(),
            )?;
            import_serials(config, &file, &product_id, username, password).await?
        }
    }
    Ok(())
}

const PASSWORD_ENV: &str = "PORTAL_PASSWORD";

/// Password from the environment, falling back to the first line of `input`.
fn read_password(from_env: Option<String>, mut input: impl BufRead) -> Result<String> {
    if let Some(password) = from_env.filter(|p| !p.is_empty()) {
        return Ok(password);
    }

    eprint!("Password: ");
    let mut line = String::new();
    input.read_line(&mut line)?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        return Err(Error::Request(format!(
            "No password given (set {} or pipe it on stdin)",
            PASSWORD_ENV
        )));
    }
    Ok(password)
}

async fn import_serials(
    config: ClientConfig,
    file: &std::path::Path,
    product_id: &str,
    username: String,
    password: String,
) -> Result<()> {
    let Sheet::Rows(rows) = spreadsheet::read_file(file, true)? else {
        return Err(Error::Request(format!("{} has no header row", file.display())));
    };
    let import = spreadsheet::serial_import_items(&rows, product_id);
    for (index, full) in &import.rejected {
        log::warn!("Skipping row {}: {:?} is not a full serial", index + 2, full);
    }
    if import.items.is_empty() {
        return Err(Error::Request("No importable serials found".to_string()));
    }

    let api = ApiService::new(config, AuthStore::global())?;
    if !api.login(&LoginRequest { username, password }).await? {
        return Err(Error::Request("Login failed".to_string()));
    }
    if !api.restore_session().await? {
        return Err(Error::Request("Session could not be established".to_string()));
    }

    let count = import.items.len();
    let response = api
        .bulk_create_serials(&import.into_request())
        .await?
        .ok_or_else(|| Error::Request("Session expired".to_string()))?;

    println!(
        "Imported {} of {} serials ({} failed)",
        response.success_count, count, response.failed_count
    );
    for item in &response.failed_items {
        println!("  #{} {}: {}", item.index, item.full_serial_number, item.error);
    }

    if let Err(e) = api.logout().await {
        log::warn!("Logout failed: {}", e);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_prefers_environment() {
        let password = read_password(Some("s3cret".into()), "ignored\n".as_bytes()).unwrap();
        assert_eq!(password, "s3cret");
    }

    #[test]
    fn test_password_falls_back_to_stdin() {
        let password = read_password(None, "from stdin\r\nrest\n".as_bytes()).unwrap();
        assert_eq!(password, "from stdin");

        let password = read_password(Some(String::new()), "piped\n".as_bytes()).unwrap();
        assert_eq!(password, "piped");
    }

    #[test]
    fn test_missing_password_is_rejected() {
        assert!(read_password(None, "".as_bytes()).is_err());
    }

    #[test]
    fn test_password_is_not_a_flag() {
        let parsed = Cli::try_parse_from([
            "warranty-portal",
            "import-serials",
            "serials.csv",
            "--product-id",
            "p-1",
            "--username",
            "admin",
            "--password",
            "x",
        ]);
        assert!(parsed.is_err());
    }
}
