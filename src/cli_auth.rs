use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

use mcp_marketplace_server::marketplace_db::DB_FILE_NAME;
use mcp_marketplace_server::user::NewUser;
use mcp_marketplace_server::{open_marketplace_db, SqliteUserStore, UserManager};

use rustyline::{
    completion::Completer, highlight::Highlighter, history::FileHistory, validate::Validator,
    CompletionType, Config, Editor, Helper,
};

fn parse_path(s: &str) -> Result<PathBuf> {
    let original_path = PathBuf::from(s);
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path of the marketplace database, or of the directory holding it.
    #[clap(value_parser = parse_path)]
    pub path: PathBuf,
}

#[derive(Parser)]
#[command(name = "")]
struct InnerCli {
    #[command(subcommand)]
    command: InnerCommand,
}

#[derive(Subcommand)]
enum InnerCommand {
    /// Creates a user with the given email.
    AddUser {
        email: String,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
    },

    /// Creates a password login for the given user.
    /// Fails if the user already has a password set.
    AddLogin { email: String, password: String },

    /// Change the password of a user, fails if no password was set.
    UpdateLogin { email: String, password: String },

    /// Deletes the password login of a given user.
    DeleteLogin { email: String },

    /// Shows profile and authentication information of a given user.
    Show { email: String },

    /// Verifies the password of a given user. It only compares the hash,
    /// no token is created and nothing is written.
    CheckPassword { email: String, password: String },

    /// Shows all user emails.
    UserEmails,

    /// Shows the path of the current database.
    Where,

    /// Close this program.
    Exit,
}

enum CommandExecutionResult {
    Ok,
    Exit,
    Error(String),
}

const PROMPT: &str = ">> ";

fn show_user(user_manager: &UserManager, email: &str) -> Result<()> {
    let user_id = user_manager
        .get_user_id(email)?
        .with_context(|| format!("User {} not found.", email))?;
    println!("User:");
    println!("{:#?}", user_manager.get_user(&user_id)?);
    println!("\nCredentials:");
    println!("{:#?}", user_manager.get_user_credentials(email)?);
    println!("\nAuth Tokens:");
    for token in user_manager.get_user_tokens(email)?.iter() {
        println!("{:#?}", token);
    }
    Ok(())
}

fn check_password(user_manager: &UserManager, email: &str, password: &str) -> Result<&'static str> {
    let credentials = user_manager
        .get_user_credentials(email)?
        .with_context(|| format!("User {} not found.", email))?;
    let password_credentials = credentials
        .username_password
        .with_context(|| format!("User {} has no password set.", email))?;
    Ok(
        match password_credentials
            .verify(password)
            .context("Could not verify the password, something went wrong")?
        {
            true => "The password provided is correct!",
            false => "Wrong password.",
        },
    )
}

fn execute_command(line: String, user_manager: &UserManager, db_path: &str) -> CommandExecutionResult {
    if line.is_empty() {
        return CommandExecutionResult::Ok;
    }

    let args =
        shlex::split(&line).unwrap_or_else(|| line.split_whitespace().map(String::from).collect());

    let cli = InnerCli::try_parse_from(std::iter::once(" ").chain(args.iter().map(String::as_str)));

    let cli = match cli {
        Ok(cli) => cli,
        Err(e) => {
            if e.print().is_err() {
                println!("{}", e);
            }
            return CommandExecutionResult::Ok;
        }
    };

    println!("{} {}", PROMPT, &line);
    let outcome = match cli.command {
        InnerCommand::AddUser {
            email,
            first_name,
            last_name,
        } => user_manager
            .add_user(NewUser {
                first_name,
                last_name,
                ..NewUser::with_email(email)
            })
            .map(|user_id| println!("Created user {}", user_id)),
        InnerCommand::AddLogin { email, password } => {
            user_manager.create_password_credentials(&email, &password)
        }
        InnerCommand::UpdateLogin { email, password } => {
            user_manager.update_password_credentials(&email, &password)
        }
        InnerCommand::DeleteLogin { email } => user_manager.delete_password_credentials(&email),
        InnerCommand::Show { email } => show_user(user_manager, &email),
        InnerCommand::CheckPassword { email, password } => {
            check_password(user_manager, &email, &password).map(|msg| println!("{}", msg))
        }
        InnerCommand::UserEmails => user_manager.get_all_user_emails().map(|emails| {
            for email in emails {
                println!("{}", email);
            }
        }),
        InnerCommand::Where => {
            println!("{}", db_path);
            Ok(())
        }
        InnerCommand::Exit => return CommandExecutionResult::Exit,
    };

    match outcome {
        Ok(()) => CommandExecutionResult::Ok,
        Err(err) => CommandExecutionResult::Error(format!("{:#}", err)),
    }
}

#[derive(rustyline_derive::Hinter)]
struct CommandsHelper {
    commands_names: Vec<String>,
}

impl CommandsHelper {
    pub fn new() -> Self {
        let commands_names: Vec<String> = InnerCli::command()
            .get_subcommands()
            .map(|sc| sc.get_name().to_string())
            .collect();

        CommandsHelper { commands_names }
    }
}

impl Completer for CommandsHelper {
    type Candidate = String;

    fn complete(
        &self,
        line: &str,
        _pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<String>)> {
        if line.contains(' ') {
            return Ok((0, Vec::with_capacity(0)));
        }
        let matches = self
            .commands_names
            .iter()
            .filter(|c| c.starts_with(line))
            .cloned()
            .collect::<Vec<_>>();

        Ok((0, matches))
    }
}

impl Highlighter for CommandsHelper {}
impl Validator for CommandsHelper {}
impl Helper for CommandsHelper {}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();
    let db_path = if cli_args.path.is_dir() {
        cli_args.path.join(DB_FILE_NAME)
    } else {
        cli_args.path
    };
    let conn = open_marketplace_db(&db_path)
        .with_context(|| format!("Could not open marketplace database at {:?}", db_path))?;
    let user_manager = UserManager::new(Box::new(SqliteUserStore::new(conn)));
    let db_path = db_path.display().to_string();

    InnerCli::command().print_long_help()?;

    let config = Config::builder()
        .completion_type(CompletionType::List)
        .build();

    let mut rl = Editor::<CommandsHelper, FileHistory>::with_config(config)?;
    rl.set_helper(Some(CommandsHelper::new()));

    loop {
        match rl.readline(PROMPT) {
            Ok(line) => {
                let _ = rl.add_history_entry(&line);
                match execute_command(line, &user_manager, &db_path) {
                    CommandExecutionResult::Ok => {}
                    CommandExecutionResult::Exit => break,
                    CommandExecutionResult::Error(err) => {
                        eprintln!("Error: {}", err);
                    }
                }
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                println!("CTRL-D: exiting.");
                break;
            }
            Err(e) => {
                println!("Error: {:?}", e);
                break;
            }
        }
    }
    Ok(())
}
