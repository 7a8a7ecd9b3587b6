use std::path::PathBuf;

use anyhow::{Context, anyhow, bail};

use cricket_oracle::admin::AdminPanel;
use cricket_oracle::auth::{AuthService, Authenticator, Credentials};
use cricket_oracle::config::{self, AppConfig};
use cricket_oracle::logging;
use cricket_oracle::store::Store;

const USAGE: &str = "usage: admin --user NAME --password PASS [--db PATH] <command>

commands:
  users                          list accounts
  add-user NAME PASS [--admin]   create an account
  predictions                    list saved predictions
  messages                       list every conversation
  send USER_ID TEXT...           reply to a user
  export PATH                    write predictions to an XLSX workbook";

struct Args {
    username: String,
    password: String,
    db: Option<PathBuf>,
    command: Vec<String>,
}

fn parse_args() -> anyhow::Result<Args> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let mut username = None;
    let mut password = None;
    let mut db = None;
    let mut command = Vec::new();
    let mut idx = 0;
    while idx < args.len() {
        let arg = args[idx].as_str();
        match arg {
            "--user" | "--password" | "--db" => {
                let value = args
                    .get(idx + 1)
                    .cloned()
                    .ok_or_else(|| anyhow!("{arg} needs a value"))?;
                match arg {
                    "--user" => username = Some(value),
                    "--password" => password = Some(value),
                    _ => db = Some(PathBuf::from(value)),
                }
                idx += 1;
            }
            "-h" | "--help" => bail!("{USAGE}"),
            _ => command.push(args[idx].clone()),
        }
        idx += 1;
    }

    let (Some(username), Some(password)) = (username, password) else {
        bail!("{USAGE}");
    };
    if command.is_empty() {
        bail!("{USAGE}");
    }
    Ok(Args {
        username,
        password,
        db,
        command,
    })
}

fn main() -> anyhow::Result<()> {
    config::load_dotenv();
    logging::init_stderr();
    let args = parse_args()?;

    let config = AppConfig::from_env();
    let db_path = args.db.clone().unwrap_or_else(|| config.db_path.clone());
    let store = Store::open(&db_path)?;
    let auth = AuthService::from_config(store, &config);
    auth.ensure_admin(&config.admin_username, &config.admin_password)?;

    let session = auth.authenticate(&Credentials::new(&args.username, &args.password))?;
    let panel = AdminPanel::open(&auth, session)?;

    let command = args.command.iter().map(String::as_str).collect::<Vec<_>>();
    match command.as_slice() {
        ["users"] => {
            for user in panel.users()? {
                let role = if user.is_admin { "admin" } else { "user" };
                println!("{:>4}  {:<20} {:<6} {}", user.id, user.username, role, user.created_at);
            }
        }
        ["add-user", name, pass, rest @ ..] => {
            let is_admin = match rest {
                [] => false,
                ["--admin"] => true,
                _ => bail!("{USAGE}"),
            };
            let user = panel.create_user(name, pass, is_admin)?;
            println!("created user #{} {}", user.id, user.username);
        }
        ["predictions"] => {
            for p in panel.predictions()? {
                let owner = p
                    .user_id
                    .map(|id| format!("#{id}"))
                    .unwrap_or_else(|| "guest".to_string());
                println!(
                    "{:>4}  {:<6} {} vs {}  {}% / {}%  {} {} {} {}",
                    p.id,
                    owner,
                    p.team_a,
                    p.team_b,
                    p.team_a_win_percentage,
                    p.team_b_win_percentage,
                    p.match_format,
                    p.gender,
                    p.match_date,
                    p.stadium
                );
            }
        }
        ["messages"] => {
            for m in panel.messages()? {
                let direction = if m.from_admin { "->" } else { "<-" };
                let read = if m.read { " " } else { "*" };
                println!(
                    "{:>4}{read} user #{:<4} {direction} {}  {}",
                    m.id, m.user_id, m.created_at, m.content
                );
            }
        }
        ["send", user_id, text @ ..] if !text.is_empty() => {
            let user_id = user_id
                .parse::<i64>()
                .with_context(|| format!("invalid user id {user_id:?}"))?;
            let message = panel.send_message(user_id, &text.join(" "))?;
            println!("sent message #{} to user #{user_id}", message.id);
        }
        ["export", path] => {
            let report = panel.export_predictions(&PathBuf::from(path))?;
            println!(
                "exported {} predictions ({} factor rows) to {path}",
                report.predictions, report.factor_rows
            );
            for err in &report.errors {
                eprintln!("warning: {err}");
            }
        }
        _ => bail!("{USAGE}"),
    }
    Ok(())
}
