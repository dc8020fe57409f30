//! estatedesk CLI - inspect and manage the locally persisted dashboard session
//!
//! Records login responses, clears the session and answers role/permission
//! questions against the same local storage file the dashboard uses.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use estatedesk_core::{
    default_config_path, init_logging, log_operation_error, log_operation_start,
    log_operation_success, EstateConfig, LoggingConfig,
};
use estatedesk_session::{SessionContext, SessionManager, SessionPermissionStore};
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "estatedesk")]
#[command(about = "Local session and permission tool for the estatedesk admin dashboard")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a login response as the current session
    Login {
        /// File holding the response body, `-` for stdin
        response: String,
    },

    /// Clear the current session
    Logout,

    /// Show the logged-in user
    Whoami,

    /// List the effective permissions
    Permissions,

    /// List the assigned roles
    Roles,

    /// Check permissions and roles; exits 1 when not granted
    Check {
        /// Permission title (repeatable)
        #[arg(short, long = "permission")]
        permissions: Vec<String>,

        /// Role title (repeatable)
        #[arg(short, long = "role")]
        roles: Vec<String>,

        /// Require every listed permission instead of any one
        #[arg(long)]
        all: bool,
    },

    /// Manage configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Initialize default configuration
        #[arg(long)]
        init: bool,

        /// Validate current configuration
        #[arg(long)]
        validate: bool,
    },
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_ref())?;

    let logging_config = if cli.verbose {
        LoggingConfig::verbose()
    } else {
        config.logging.clone()
    };
    init_logging(&logging_config)
        .map_err(|e| anyhow::anyhow!(e))
        .context("Failed to initialize logging")?;

    debug!("Starting estatedesk CLI v{}", env!("CARGO_PKG_VERSION"));

    let open_context = || -> anyhow::Result<SessionContext> {
        let context = SessionContext::from_config(&config.session)
            .context("Failed to open session storage")?;
        debug!(?context, "Session context ready");
        Ok(context)
    };

    match cli.command {
        Commands::Login { response } => handle_login(open_context()?, &response)?,
        Commands::Logout => {
            SessionManager::new(open_context()?)
                .logout()
                .context("Failed to clear session")?;
            println!("Logged out");
        }
        Commands::Whoami => handle_whoami(&SessionPermissionStore::new(open_context()?)),
        Commands::Permissions => {
            for title in SessionPermissionStore::new(open_context()?).list_permissions() {
                println!("{}", title);
            }
        }
        Commands::Roles => {
            for role in SessionPermissionStore::new(open_context()?).list_roles() {
                println!("{} ({} permissions)", role.title, role.permissions.len());
            }
        }
        Commands::Check {
            permissions,
            roles,
            all,
        } => {
            let perms = SessionPermissionStore::new(open_context()?);
            if !handle_check(&perms, &permissions, &roles, all)? {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Config {
            show,
            init,
            validate,
        } => handle_config(&config, cli.config.as_ref(), show, init, validate)?,
    }

    Ok(ExitCode::SUCCESS)
}

fn load_config(config_path: Option<&PathBuf>) -> anyhow::Result<EstateConfig> {
    if let Some(path) = config_path {
        return EstateConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()));
    }

    let default_paths = [default_config_path(), Some(PathBuf::from("estatedesk.toml"))];

    for path in default_paths.iter().flatten() {
        if path.exists() {
            return EstateConfig::from_file(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()));
        }
    }

    Ok(EstateConfig::default())
}

fn handle_login(context: SessionContext, response: &str) -> anyhow::Result<()> {
    log_operation_start!("login", source = response);

    let body = if response == "-" {
        let mut body = String::new();
        std::io::stdin()
            .read_to_string(&mut body)
            .context("Failed to read login response from stdin")?;
        body
    } else {
        std::fs::read_to_string(response)
            .with_context(|| format!("Failed to read login response from {}", response))?
    };

    match SessionManager::new(context).record_login_str(&body) {
        Ok(user) => {
            log_operation_success!("login", user = %user.display_string());
            println!(
                "Logged in as {} with {} role(s)",
                user.display_string(),
                user.roles.len()
            );
            Ok(())
        }
        Err(e) => {
            log_operation_error!("login", e);
            Err(e).context("Login response was not recorded")
        }
    }
}

fn handle_whoami(perms: &SessionPermissionStore) {
    match perms.current_user() {
        Some(user) => {
            println!("{}", user.display_string());
            if let Some(email) = &user.email {
                println!("email: {}", email);
            }
            println!("roles: {}", user.role_titles().join(", "));
        }
        None => println!("Not logged in"),
    }
    info!("{}", perms.summary());
}

fn handle_check(
    perms: &SessionPermissionStore,
    permissions: &[String],
    roles: &[String],
    all: bool,
) -> anyhow::Result<bool> {
    if permissions.is_empty() && roles.is_empty() {
        bail!("Nothing to check: pass --permission and/or --role");
    }

    let permission_ok = if permissions.is_empty() {
        true
    } else if all {
        perms.has_all_permissions(permissions)
    } else {
        perms.has_any_permission(permissions)
    };

    let role_ok = roles.is_empty() || perms.has_any_role(roles);
    let granted = permission_ok && role_ok;

    println!("{}", if granted { "granted" } else { "denied" });
    Ok(granted)
}

fn handle_config(
    config: &EstateConfig,
    config_path: Option<&PathBuf>,
    show: bool,
    init: bool,
    validate: bool,
) -> anyhow::Result<()> {
    if init {
        let path = match config_path {
            Some(path) => path.clone(),
            None => default_config_path().context("No configuration directory on this platform")?,
        };
        EstateConfig::default().save_to_file(&path)?;
        println!("Configuration initialized at: {}", path.display());
    }

    if show {
        println!("{}", toml::to_string_pretty(config)?);
    }

    if validate {
        config.validate()?;
        println!("Configuration is valid");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn logged_in() -> SessionPermissionStore {
        let manager = SessionManager::new(SessionContext::in_memory());
        manager
            .record_login_str(
                r#"{"data": {"roles": [
                    {"title": "Leasing", "permissions": [{"title": "tenant.view"}, {"title": "contract.sign"}]}
                ]}}"#,
            )
            .unwrap();
        manager.permissions()
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn check_any_versus_all() {
        let perms = logged_in();
        let wanted = strings(&["tenant.view", "finance.export"]);

        assert!(handle_check(&perms, &wanted, &[], false).unwrap());
        assert!(!handle_check(&perms, &wanted, &[], true).unwrap());
    }

    #[test]
    fn check_combines_roles_and_permissions() {
        let perms = logged_in();

        assert!(handle_check(&perms, &strings(&["tenant.view"]), &strings(&["Leasing"]), false).unwrap());
        assert!(!handle_check(&perms, &strings(&["tenant.view"]), &strings(&["Finance"]), false).unwrap());
    }

    #[test]
    fn check_requires_something_to_check() {
        assert!(handle_check(&logged_in(), &[], &[], false).is_err());
    }
}
