use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::{Local, Utc};
use clap::{Parser, Subcommand};

use crate::api::ApiClient;
use crate::auth::AuthService;
use crate::config::Settings;
use crate::format;
use crate::gateway::{HttpTaskGateway, TaskGateway};
use crate::session::{FileStorage, SessionStore};
use crate::task::{Bucket, NewTask, Task, TaskPatch};
use crate::user::{Credentials, ProfileUpdate, Registration};

#[derive(Debug, Parser)]
#[command(name = "taskdeck", version, about = "Kanban board for the task API, in your terminal")]
pub struct Cli {
    /// API base URL, e.g. http://localhost:8000/api
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Config file to use instead of the default one
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Open the interactive board (default)
    Board,
    /// Sign in and remember the session
    Login {
        #[arg(long)]
        email: String,
        /// Prompted for when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// Create an account
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        username: String,
        #[arg(long)]
        full_name: String,
        #[arg(long)]
        password: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// Show the signed-in user, refreshed from the server
    Whoami,
    /// Change your display name or username
    Profile {
        #[arg(long)]
        full_name: Option<String>,
        #[arg(long)]
        username: Option<String>,
    },
    /// Confirm an email address with the emailed token
    Verify { token: String },
    /// Send the verification email again
    ResendVerification {
        /// Defaults to the signed-in user's email
        #[arg(long)]
        email: Option<String>,
    },
    /// List tasks grouped by status
    List {
        #[arg(long)]
        status: Option<Bucket>,
    },
    /// Create a task
    Add {
        title: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, default_value = "pending")]
        status: Bucket,
        /// YYYY-MM-DD or "YYYY-MM-DD HH:MM", local time
        #[arg(long)]
        due: Option<String>,
    },
    /// Change fields of a task
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        status: Option<Bucket>,
        #[arg(long, conflicts_with = "clear_due")]
        due: Option<String>,
        #[arg(long)]
        clear_due: bool,
    },
    /// Delete a task
    Delete {
        id: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

/// Everything a command needs, built once from settings.
pub struct Services {
    pub api: ApiClient,
    pub session: SessionStore,
}

impl Services {
    pub fn new(settings: &Settings) -> Result<Self> {
        let api = ApiClient::new(&settings.api.base_url, settings.api.timeout())
            .context("building API client")?;
        let storage = FileStorage::new(settings.session.path.clone());
        let session = SessionStore::hydrate(Box::new(storage)).context("restoring session")?;
        Ok(Self { api, session })
    }

    pub fn auth(&self) -> AuthService {
        AuthService::new(self.api.clone())
    }

    pub fn require_login(&self) -> Result<()> {
        if !self.session.is_authenticated() {
            bail!("not logged in, run `taskdeck login --email <EMAIL>` first");
        }
        Ok(())
    }

    pub fn gateway(&self) -> Result<HttpTaskGateway> {
        self.require_login()?;
        Ok(HttpTaskGateway::new(
            self.api.clone().with_token(self.session.token()),
        ))
    }
}

/// Runs every subcommand except `board`, which needs the terminal.
pub async fn execute(command: Commands, ctx: &mut Services) -> Result<()> {
    match command {
        Commands::Board => bail!("the board needs a terminal, run `taskdeck` without a subcommand"),
        Commands::Login { email, password } => {
            let password = match password {
                Some(p) => p,
                None => prompt("Password")?,
            };
            let user = ctx
                .auth()
                .login(&mut ctx.session, &Credentials { email, password })
                .await?;
            println!("Logged in as {} ({})", user.full_name, user.email);
            if !user.is_verified {
                println!("Email not verified. Run `taskdeck resend-verification` if the link expired.");
            }
        }
        Commands::Register {
            email,
            username,
            full_name,
            password,
        } => {
            let password = match password {
                Some(p) => p,
                None => prompt("Password")?,
            };
            let user = ctx
                .auth()
                .register(&Registration {
                    email,
                    username,
                    password,
                    full_name,
                })
                .await?;
            println!(
                "Registered {}. Check {} for a verification link, then run `taskdeck login`.",
                user.username, user.email
            );
        }
        Commands::Logout => {
            ctx.auth().logout(&mut ctx.session)?;
            println!("Logged out.");
        }
        Commands::Whoami => {
            ctx.require_login()?;
            let user = ctx.auth().refresh_user(&mut ctx.session).await?;
            println!("{} (@{})", user.full_name, user.username);
            println!("{}", user.email);
            println!("verified: {}", if user.is_verified { "yes" } else { "no" });
            if let Some(created) = user.created_at {
                println!("member since: {}", created.with_timezone(&Local).format("%b %-d, %Y"));
            }
        }
        Commands::Profile {
            full_name,
            username,
        } => {
            ctx.require_login()?;
            let update = ProfileUpdate {
                full_name,
                username,
            };
            if update.full_name.is_none() && update.username.is_none() {
                bail!("nothing to change, pass --full-name and/or --username");
            }
            let user = ctx.auth().update_profile(&mut ctx.session, &update).await?;
            println!("Profile updated: {} (@{})", user.full_name, user.username);
        }
        Commands::Verify { token } => {
            let message = ctx.auth().verify_email(&token).await?;
            println!("{message}");
        }
        Commands::ResendVerification { email } => {
            let email = match email.or_else(|| ctx.session.user().map(|u| u.email.clone())) {
                Some(email) => email,
                None => bail!("pass --email or log in first"),
            };
            let message = ctx.auth().resend_verification(&email).await?;
            println!("{message}");
        }
        Commands::List { status } => {
            let gateway = ctx.gateway()?;
            let tasks = gateway.list(status).await?;
            print_tasks(&tasks, status);
        }
        Commands::Add {
            title,
            description,
            status,
            due,
        } => {
            let gateway = ctx.gateway()?;
            let due_date = parse_due(due.as_deref())?;
            let task = gateway
                .create(NewTask {
                    title,
                    description,
                    status,
                    due_date,
                })
                .await?;
            println!("Created [{}] {}", task.id, task.title);
        }
        Commands::Edit {
            id,
            title,
            description,
            status,
            due,
            clear_due,
        } => {
            let gateway = ctx.gateway()?;
            let due_date = if clear_due {
                Some(None)
            } else {
                due.as_deref().map(|d| parse_due(Some(d))).transpose()?
            };
            let patch = TaskPatch {
                title,
                description: description.map(Some),
                status,
                due_date,
            };
            if patch.is_empty() {
                bail!("nothing to change");
            }
            let task = gateway.update(&id, patch).await?;
            println!("Updated [{}] {} ({})", task.id, task.title, task.status);
        }
        Commands::Delete { id, yes } => {
            let gateway = ctx.gateway()?;
            if !yes {
                let task = gateway.get(&id).await?;
                let answer = prompt(&format!(
                    "Are you sure you want to delete \"{}\"? [y/N]",
                    task.title
                ))?;
                if !answer.eq_ignore_ascii_case("y") {
                    println!("Cancelled.");
                    return Ok(());
                }
            }
            gateway.remove(&id).await?;
            println!("Deleted {id}");
        }
    }
    Ok(())
}

fn parse_due(raw: Option<&str>) -> Result<Option<chrono::DateTime<Utc>>> {
    match raw {
        Some(raw) => format::parse_due_input(raw, &Local).map_err(anyhow::Error::msg),
        None => Ok(None),
    }
}

fn print_tasks(tasks: &[Task], status: Option<Bucket>) {
    let now = Local::now();
    let buckets: Vec<Bucket> = match status {
        Some(bucket) => vec![bucket],
        None => Bucket::ALL.to_vec(),
    };
    for bucket in buckets {
        println!("{}:", bucket.display_name());
        for task in tasks.iter().filter(|t| t.status == bucket.as_str()) {
            println!(
                "- [{}] {} ({})",
                task.id,
                format::truncate(&task.title, 50),
                format::due_date_label(task.due_date, &now)
            );
        }
    }
    let unknown = tasks.iter().filter(|t| t.bucket().is_none()).count();
    if unknown > 0 {
        println!("({unknown} task(s) with an unknown status not shown)");
    }
}

fn prompt(message: &str) -> Result<String> {
    print!("{message}: ");
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_board_when_no_subcommand() {
        let cli = Cli::try_parse_from(["taskdeck"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn parses_status_values() {
        let cli = Cli::try_parse_from(["taskdeck", "list", "--status", "in-progress"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::List {
                status: Some(Bucket::InProgress)
            })
        ));
        assert!(Cli::try_parse_from(["taskdeck", "list", "--status", "doing"]).is_err());
    }

    #[test]
    fn due_and_clear_due_conflict() {
        let parsed = Cli::try_parse_from([
            "taskdeck", "edit", "abc", "--due", "2026-02-01", "--clear-due",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn global_api_url_after_subcommand() {
        let cli = Cli::try_parse_from(["taskdeck", "logout", "--api-url", "http://x/api"]).unwrap();
        assert_eq!(cli.api_url.as_deref(), Some("http://x/api"));
    }
}
