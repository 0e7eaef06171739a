#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;

use std::env;
use std::io;
use std::path;
use std::sync::Arc;

use anyhow::bail;
use anyhow::Result;
use clap::value_parser;
use clap::Arg;
use clap::ArgAction;
use clap::ArgGroup;
use clap::ArgMatches;
use clap::Command;
use clap_complete::generate;
use clap_complete::Generator;
use clap_complete::Shell;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Input;
use dialoguer::Password;
use strum::VariantNames;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use yansi::Paint;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Event;
use crate::domain::models::Note;
use crate::domain::models::NoteID;
use crate::domain::models::User;
use crate::domain::services::App;
use crate::infrastructure::storage::FileStore;

pub fn log_dir() -> path::PathBuf {
    if let Ok(dir) = env::var("VICNOTES_LOG_DIR") {
        return path::PathBuf::from(dir);
    }

    return dirs::cache_dir()
        .unwrap_or_else(env::temp_dir)
        .join("vicnotes");
}

fn print_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
}

fn format_note(note: &Note) -> String {
    let mut res = format!("- (ID: {}) {}", note.id, note.title);

    let summary = note.summary(60);
    if !summary.is_empty() {
        res = format!("{res}, {summary}");
    }

    return res;
}

fn format_note_full(note: &Note) -> String {
    let mut header = format!("ID: {}", note.id);
    if let Some(created_at) = note.metadata_str("created_at") {
        header = format!("{header}, Created: {created_at}");
    }
    if let Some(updated_at) = note.metadata_str("updated_at") {
        header = format!("{header}, Updated: {updated_at}");
    }

    return format!(
        "{}\n{header}\n\n{}",
        Paint::new(&note.title).bold(),
        note.content
    );
}

fn format_user(user: &Option<User>) -> String {
    return match user {
        Some(user) if !user.email.is_empty() => format!("Logged in as {}", user.email),
        _ => "Logged in".to_string(),
    };
}

fn report_events(rx: &mut mpsc::UnboundedReceiver<Event>) {
    while let Ok(event) = rx.try_recv() {
        match event {
            Event::LoginRequired => {
                eprintln!(
                    "{}",
                    Paint::yellow(
                        "Your session is no longer valid and has been cleared. Log in again with `vicnotes auth login`."
                    )
                );
            }
        }
    }
}

async fn init_app() -> Result<(App, mpsc::UnboundedReceiver<Event>)> {
    let (tx, rx) = mpsc::unbounded_channel::<Event>();
    let storage = Arc::new(FileStore::default());
    let app = App::init(&Config::get(ConfigKey::ApiURL), storage, Some(tx)).await?;

    return Ok((app, rx));
}

fn prompt_email(matches: &ArgMatches) -> Result<String> {
    if let Some(email) = matches.get_one::<String>("email") {
        return Ok(email.to_string());
    }

    let email = Input::<String>::with_theme(&ColorfulTheme::default())
        .with_prompt("Email")
        .interact_text()?;

    return Ok(email);
}

fn prompt_password(matches: &ArgMatches, confirm: bool) -> Result<String> {
    if let Some(password) = matches.get_one::<String>("password") {
        return Ok(password.to_string());
    }

    let theme = ColorfulTheme::default();
    let mut prompt = Password::with_theme(&theme).with_prompt("Password");
    if confirm {
        prompt = prompt.with_confirmation("Confirm password", "Passwords do not match");
    }

    return Ok(prompt.interact()?);
}

async fn run_auth(matches: &ArgMatches) -> Result<()> {
    let (app, mut rx) = init_app().await?;

    let res = match matches.subcommand() {
        Some(("register", register_matches)) => {
            let email = prompt_email(register_matches)?;
            let password = prompt_password(register_matches, true)?;
            match app.session.register(&email, &password).await {
                Ok(auth) => {
                    println!("Registered. {}", format_user(&Some(auth.user)));
                    Ok(())
                }
                Err(err) => Err(err),
            }
        }
        Some(("login", login_matches)) => {
            let email = prompt_email(login_matches)?;
            let password = prompt_password(login_matches, false)?;
            match app.session.login(&email, &password).await {
                Ok(auth) => {
                    println!("{}", format_user(&Some(auth.user)));
                    Ok(())
                }
                Err(err) => Err(err),
            }
        }
        Some(("logout", _)) => {
            app.session.logout().await;
            println!("Logged out");
            Ok(())
        }
        Some(("status", _)) => {
            if app.session.is_authenticated() {
                println!("{}", format_user(&app.session.user()));
            } else {
                println!("Not logged in. Run `vicnotes auth login` to start a session.");
            }
            Ok(())
        }
        _ => {
            subcommand_auth().print_long_help()?;
            Ok(())
        }
    };

    report_events(&mut rx);
    if res.is_err() {
        if let Some(error) = app.session.error() {
            bail!(error);
        }
    }

    res?;
    return Ok(());
}

async fn print_notes_list(app: &App) -> Result<()> {
    app.notes.fetch_notes().await;
    if let Some(error) = app.notes.error() {
        bail!(error);
    }

    let notes = app.notes.notes();
    if notes.is_empty() {
        println!("There are no notes yet. Create your first one with `vicnotes notes create`.");
        return Ok(());
    }

    let lines = notes
        .iter()
        .map(|note| {
            return format_note(note);
        })
        .collect::<Vec<String>>();

    println!("{}", lines.join("\n"));

    return Ok(());
}

/// The backend replaces both fields, so whatever was not passed is taken from
/// the note as the server has it now.
async fn resolve_update(
    app: &App,
    id: NoteID,
    title: Option<String>,
    content: Option<String>,
) -> Result<(String, String)> {
    if let (Some(title), Some(content)) = (&title, &content) {
        return Ok((title.to_string(), content.to_string()));
    }

    let current = app.notes.fetch_note(id).await?;
    return Ok((
        title.unwrap_or(current.title),
        content.unwrap_or(current.content),
    ));
}

async fn update_note(
    app: &App,
    id: NoteID,
    title: Option<String>,
    content: Option<String>,
) -> Result<()> {
    let (title, content) = resolve_update(app, id, title, content).await?;
    app.notes.update_note(id, &title, &content).await?;
    println!("Updated note {id}");

    return Ok(());
}

async fn run_notes(matches: &ArgMatches) -> Result<()> {
    let (app, mut rx) = init_app().await?;
    if !app.session.is_authenticated() {
        bail!("Not logged in. Run `vicnotes auth login` first.");
    }

    let res = match matches.subcommand() {
        Some(("list", _)) => print_notes_list(&app).await,
        Some(("show", show_matches)) => {
            let id = *show_matches.get_one::<NoteID>("id").unwrap_or(&0);
            match app.notes.fetch_note(id).await {
                Ok(note) => {
                    println!("{}", format_note_full(&note));
                    Ok(())
                }
                Err(err) => Err(err.into()),
            }
        }
        Some(("create", create_matches)) => {
            let title = create_matches
                .get_one::<String>("title")
                .cloned()
                .unwrap_or_default();
            let content = create_matches
                .get_one::<String>("content")
                .cloned()
                .unwrap_or_default();
            match app.notes.create_note(&title, &content).await {
                Ok(note) => {
                    println!("Created note {}", note.id);
                    Ok(())
                }
                Err(err) => Err(err.into()),
            }
        }
        Some(("update", update_matches)) => {
            let id = *update_matches.get_one::<NoteID>("id").unwrap_or(&0);
            let title = update_matches.get_one::<String>("title").cloned();
            let content = update_matches.get_one::<String>("content").cloned();
            update_note(&app, id, title, content).await
        }
        Some(("delete", delete_matches)) => {
            let id = *delete_matches.get_one::<NoteID>("id").unwrap_or(&0);
            match app.notes.delete_note(id).await {
                Ok(()) => {
                    println!("Deleted note {id}");
                    Ok(())
                }
                Err(err) => Err(err.into()),
            }
        }
        _ => {
            subcommand_notes().print_long_help()?;
            Ok(())
        }
    };

    report_events(&mut rx);
    if res.is_err() {
        if let Some(error) = app.notes.error() {
            bail!(error);
        }
    }

    return res;
}

async fn run_health() -> Result<()> {
    let (app, mut rx) = init_app().await?;
    let res = app.client.health_check().await;
    report_events(&mut rx);

    let health = res?;
    println!(
        "{} is {} at {}",
        health.service,
        health.status,
        app.client.url()
    );

    return Ok(());
}

async fn create_config_file() -> Result<()> {
    let config_file_path_str = Config::default(ConfigKey::ConfigFile);
    let config_file_path = path::PathBuf::from(&config_file_path_str);
    if config_file_path.exists() {
        bail!(format!(
            "Config file already exists at {config_file_path_str}"
        ));
    }

    if let Some(parent) = config_file_path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).await?;
        }
    }

    let mut file = fs::File::create(&config_file_path).await?;
    file.write_all(Config::serialize_default(build()).as_bytes())
        .await?;

    println!("Created default config file at {config_file_path_str}");
    return Ok(());
}

fn arg_email() -> Arg {
    return Arg::new("email")
        .short('e')
        .long("email")
        .env("VICNOTES_EMAIL")
        .num_args(1)
        .help("Account email. Prompted for when omitted.");
}

fn arg_password() -> Arg {
    return Arg::new("password")
        .short('p')
        .long("password")
        .env("VICNOTES_PASSWORD")
        .hide_env_values(true)
        .num_args(1)
        .help("Account password. Prompted for when omitted.");
}

fn arg_note_id() -> Arg {
    return Arg::new("id")
        .short('i')
        .long("id")
        .help("Note ID")
        .value_parser(value_parser!(NoteID))
        .required(true);
}

fn subcommand_auth() -> Command {
    return Command::new("auth")
        .about("Manage your session with the VicNotes API.")
        .arg_required_else_help(true)
        .subcommand(
            Command::new("register")
                .about("Create an account and log in.")
                .arg(arg_email())
                .arg(arg_password()),
        )
        .subcommand(
            Command::new("login")
                .about("Log in to an existing account.")
                .arg(arg_email())
                .arg(arg_password()),
        )
        .subcommand(Command::new("logout").about("Forget the stored session. Does not contact the API."))
        .subcommand(Command::new("status").about("Show who is logged in."));
}

fn subcommand_notes() -> Command {
    return Command::new("notes")
        .about("List, read and edit your notes.")
        .arg_required_else_help(true)
        .subcommand(Command::new("list").about("List all notes, newest first."))
        .subcommand(
            Command::new("show")
                .about("Print a single note in full.")
                .arg(arg_note_id()),
        )
        .subcommand(
            Command::new("create")
                .about("Create a new note.")
                .arg(
                    Arg::new("title")
                        .short('t')
                        .long("title")
                        .help("Note title")
                        .required(true),
                )
                .arg(
                    Arg::new("content")
                        .short('b')
                        .long("content")
                        .help("Note body")
                        .num_args(1),
                ),
        )
        .subcommand(
            Command::new("update")
                .about("Change the title or body of a note. Fields left out keep their current value.")
                .arg(arg_note_id())
                .arg(
                    Arg::new("title")
                        .short('t')
                        .long("title")
                        .help("New title")
                        .num_args(1),
                )
                .arg(
                    Arg::new("content")
                        .short('b')
                        .long("content")
                        .help("New body")
                        .num_args(1),
                )
                .group(
                    ArgGroup::new("update-args")
                        .args(["title", "content"])
                        .multiple(true)
                        .required(true),
                ),
        )
        .subcommand(
            Command::new("delete")
                .about("Delete a note.")
                .arg(arg_note_id()),
        );
}

fn subcommand_completions() -> Command {
    return Command::new("completions")
        .about("Generates shell completions.")
        .arg(
            clap::Arg::new("shell")
                .short('s')
                .long("shell")
                .help("Which shell to generate completions for.")
                .action(ArgAction::Set)
                .value_parser(value_parser!(Shell))
                .required(true),
        );
}

fn subcommand_config() -> Command {
    return Command::new("config")
        .about("Configuration file options.")
        .subcommand(
            Command::new("create").about("Saves the default config file to the configuration file path. This command will fail if the file exists already.")
        )
        .subcommand(
            Command::new("default").about("Outputs the default configuration file to stdout.")
        )
        .subcommand(
            Command::new("path").about("Returns the default path for the configuration file.")
        );
}

fn subcommand_debug() -> Command {
    return Command::new("debug")
        .about("Debug helpers for VicNotes")
        .hide(true)
        .subcommand(
            Command::new("log-path").about("Output path to debug log file generated when running VicNotes with environment variable RUST_LOG=vicnotes")
        )
        .subcommand(
            Command::new("enum-config").about("List all config keys as strings.")
        );
}

pub fn build() -> Command {
    let about = format!(
        "{}\n\nVersion: {}\nCommit: {}",
        env!("CARGO_PKG_DESCRIPTION"),
        env!("CARGO_PKG_VERSION"),
        env!("VERGEN_GIT_DESCRIBE")
    );

    return Command::new("vicnotes")
        .about(about)
        .author(env!("CARGO_PKG_AUTHORS"))
        .version(env!("CARGO_PKG_VERSION"))
        .arg_required_else_help(true)
        .subcommand(subcommand_auth())
        .subcommand(subcommand_notes())
        .subcommand(Command::new("health").about("Check that the VicNotes API is reachable."))
        .subcommand(subcommand_completions())
        .subcommand(subcommand_config())
        .subcommand(subcommand_debug())
        .subcommand(Command::new("manpages").about("Generates manpages and outputs to stdout."))
        .arg(
            Arg::new(ConfigKey::ApiURL.to_string())
                .short('u')
                .long(ConfigKey::ApiURL.to_string())
                .env("VICNOTES_API_URL")
                .num_args(1)
                .help(format!("VicNotes API URL to send requests to. [default: {}]", Config::default(ConfigKey::ApiURL)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::ConfigFile.to_string())
                .short('c')
                .long(ConfigKey::ConfigFile.to_string())
                .env("VICNOTES_CONFIG_FILE")
                .num_args(1)
                .help(format!("Path to configuration file [default: {}]", Config::default(ConfigKey::ConfigFile)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::StateDir.to_string())
                .long(ConfigKey::StateDir.to_string())
                .env("VICNOTES_STATE_DIR")
                .num_args(1)
                .help(format!("Directory where the session is persisted between runs. [default: {}]", Config::default(ConfigKey::StateDir)))
                .global(true),
        );
}

pub async fn parse() -> Result<()> {
    let matches = build().get_matches();

    match matches.subcommand() {
        Some(("auth", subcmd_matches)) => {
            Config::load(vec![&matches, subcmd_matches]).await?;
            run_auth(subcmd_matches).await?;
        }
        Some(("notes", subcmd_matches)) => {
            Config::load(vec![&matches, subcmd_matches]).await?;
            run_notes(subcmd_matches).await?;
        }
        Some(("health", subcmd_matches)) => {
            Config::load(vec![&matches, subcmd_matches]).await?;
            run_health().await?;
        }
        Some(("debug", debug_matches)) => match debug_matches.subcommand() {
            Some(("log-path", _)) => {
                println!("{}", log_dir().join("debug.log").to_string_lossy());
            }
            Some(("enum-config", _)) => {
                println!("{}", ConfigKey::VARIANTS.join("\n"));
            }
            _ => {
                subcommand_debug().print_long_help()?;
            }
        },
        Some(("completions", subcmd_matches)) => {
            if let Some(completions) = subcmd_matches.get_one::<Shell>("shell").copied() {
                let mut app = build();
                print_completions(completions, &mut app);
            }
        }
        Some(("config", subcmd_matches)) => match subcmd_matches.subcommand() {
            Some(("create", _)) => {
                create_config_file().await?;
            }
            Some(("default", _)) => {
                println!("{}", Config::serialize_default(build()));
            }
            Some(("path", _)) => {
                println!("{}", Config::default(ConfigKey::ConfigFile));
            }
            _ => {
                subcommand_config().print_long_help()?;
            }
        },
        Some(("manpages", _)) => {
            clap_mangen::Man::new(build()).render(&mut io::stdout())?;
        }
        _ => {
            build().print_long_help()?;
        }
    }

    return Ok(());
}
