use std::error::Error;

use clap::{Args, Parser, Subcommand};
use engine::{Engine, MoneyCents, NewExpenseCmd};
use migration::{Migrator, MigratorTrait};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

mod settings;

type CliResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

#[derive(Parser, Debug)]
#[command(name = "kitty")]
#[command(about = "Split shared expenses inside groups")]
struct Cli {
    /// Settings file, without extension.
    #[arg(long, global = true, default_value = settings::DEFAULT_SETTINGS_FILE)]
    settings: String,

    /// Database connection string (also read from `DATABASE_URL`). Overrides
    /// the `[database]` settings section.
    #[arg(long, global = true, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Print results as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply or revert database migrations.
    Migrate(Migrate),
    #[command(flatten)]
    Engine(EngineCommand),
}

#[derive(Args, Debug)]
struct Migrate {
    #[command(subcommand)]
    command: MigrateCommand,
}

#[derive(Subcommand, Debug)]
enum MigrateCommand {
    /// Apply pending migrations.
    Up,
    /// Revert the last `steps` migrations, or all of them.
    Down {
        #[arg(long)]
        steps: Option<u32>,
    },
    /// Drop every table and apply all migrations again.
    Fresh,
    /// List applied and pending migrations.
    Status,
}

#[derive(Subcommand, Debug)]
enum EngineCommand {
    Group(Group),
    Expense(Expense),
    /// Balance of a user in a group.
    Balance(BalanceArgs),
    /// Member count and grand total of a group, or of every group of a user.
    Summary(SummaryArgs),
    /// Suggested transfers to settle a group.
    Settle(GroupArgs),
}

#[derive(Args, Debug)]
struct Group {
    #[command(subcommand)]
    command: GroupCommand,
}

#[derive(Subcommand, Debug)]
enum GroupCommand {
    Create(GroupCreateArgs),
    Join(GroupJoinArgs),
    Show(GroupArgs),
    Members(GroupArgs),
    List(UserArgs),
}

#[derive(Args, Debug)]
struct GroupCreateArgs {
    #[arg(long)]
    user: String,
    #[arg(long)]
    name: String,
    #[arg(long)]
    description: Option<String>,
}

#[derive(Args, Debug)]
struct GroupJoinArgs {
    #[arg(long)]
    user: String,
    #[arg(long)]
    code: String,
}

#[derive(Args, Debug)]
struct GroupArgs {
    #[arg(long)]
    user: String,
    #[arg(long)]
    group: Uuid,
}

#[derive(Args, Debug)]
struct UserArgs {
    #[arg(long)]
    user: String,
}

#[derive(Args, Debug)]
struct Expense {
    #[command(subcommand)]
    command: ExpenseCommand,
}

#[derive(Subcommand, Debug)]
enum ExpenseCommand {
    Add(ExpenseAddArgs),
    Show(ExpenseShowArgs),
    List(GroupArgs),
}

#[derive(Args, Debug)]
struct ExpenseAddArgs {
    #[arg(long)]
    user: String,
    #[arg(long)]
    group: Uuid,
    #[arg(long)]
    name: String,
    /// Total amount, e.g. `100.00`.
    #[arg(long)]
    amount: MoneyCents,
    #[arg(long = "type", default_value = "general")]
    expense_type: String,
    /// `equal`, `percent` or `custom`.
    #[arg(long, default_value = "equal")]
    method: String,
    #[arg(long = "participant", required = true)]
    participants: Vec<String>,
    /// Percentages (`percent`) or amounts (`custom`), one per participant.
    #[arg(long = "split")]
    splits: Vec<Decimal>,
}

#[derive(Args, Debug)]
struct ExpenseShowArgs {
    #[arg(long)]
    user: String,
    #[arg(long)]
    expense: Uuid,
}

#[derive(Args, Debug)]
struct BalanceArgs {
    #[arg(long)]
    user: String,
    #[arg(long)]
    group: Uuid,
    /// Show every member of the group.
    #[arg(long)]
    all: bool,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct SummaryArgs {
    #[arg(long)]
    group: Option<Uuid>,
    #[arg(long)]
    user: Option<String>,
}

/// Prints `value` as JSON or through `human`.
fn emit<T: Serialize>(json: bool, value: &T, human: impl FnOnce(&T) -> String) -> CliResult<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", human(value));
    }
    Ok(())
}

async fn migrate(database_url: &str, command: MigrateCommand) -> CliResult<()> {
    let database = sea_orm::Database::connect(database_url).await?;
    tracing::info!(?command, "running migrations");
    match command {
        MigrateCommand::Up => Migrator::up(&database, None).await?,
        MigrateCommand::Down { steps } => Migrator::down(&database, steps).await?,
        MigrateCommand::Fresh => Migrator::fresh(&database).await?,
        MigrateCommand::Status => Migrator::status(&database).await?,
    }
    Ok(())
}

async fn build_engine(
    database_url: &str,
    settings: &settings::Settings,
) -> CliResult<Engine> {
    let database = sea_orm::Database::connect(database_url).await?;
    Migrator::up(&database, None).await?;

    let engine = Engine::builder()
        .database(database)
        .max_invite_attempts(settings.engine.max_invite_attempts)
        .remainder_policy(settings.engine.remainder_policy)
        .build()
        .await?;
    Ok(engine)
}

#[tokio::main]
async fn main() -> CliResult<()> {
    let cli = Cli::parse();
    let settings = settings::Settings::new(&cli.settings)?;

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(format!(
            "kitty={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let database_url = cli
        .database_url
        .clone()
        .unwrap_or_else(|| settings.database.url());
    tracing::debug!(%database_url, "connecting");
    match cli.command {
        Command::Migrate(Migrate { command }) => migrate(&database_url, command).await,
        Command::Engine(command) => {
            let engine = build_engine(&database_url, &settings).await?;
            run(&engine, command, cli.json).await
        }
    }
}

async fn run(engine: &Engine, command: EngineCommand, json: bool) -> CliResult<()> {
    match command {
        EngineCommand::Group(Group { command }) => match command {
            GroupCommand::Create(args) => {
                let group = engine
                    .create_group(&args.name, args.description.as_deref(), &args.user)
                    .await?;
                emit(json, &group, |g| {
                    format!("created group {} ({}), invite code {}", g.name, g.id, g.invite_code)
                })
            }
            GroupCommand::Join(args) => {
                let member = engine.join_group(&args.code, &args.user).await?;
                emit(json, &member, |m| {
                    format!("{} joined group {}", m.user_id, m.group_id)
                })
            }
            GroupCommand::Show(args) => {
                let group = engine.group(args.group, &args.user).await?;
                emit(json, &group, |g| {
                    let mut out = format!("{} ({})\ninvite code: {}", g.name, g.id, g.invite_code);
                    if let Some(description) = &g.description {
                        out.push_str(&format!("\n{description}"));
                    }
                    out
                })
            }
            GroupCommand::Members(args) => {
                let members = engine.list_members(args.group, &args.user).await?;
                emit(json, &members, |members| {
                    members
                        .iter()
                        .map(|m| {
                            let role = if m.is_admin { "admin" } else { "member" };
                            format!("{}\t{role}\t{}", m.user_id, m.joined_at)
                        })
                        .collect::<Vec<_>>()
                        .join("\n")
                })
            }
            GroupCommand::List(args) => {
                let groups = engine.list_user_groups(&args.user).await?;
                emit(json, &groups, |groups| {
                    groups
                        .iter()
                        .map(|g| format!("{}\t{}\t{}", g.id, g.invite_code, g.name))
                        .collect::<Vec<_>>()
                        .join("\n")
                })
            }
        },
        EngineCommand::Expense(Expense { command }) => match command {
            ExpenseCommand::Add(args) => {
                let mut cmd = NewExpenseCmd::new(args.group, args.user, args.name, args.amount)
                    .expense_type(args.expense_type)
                    .split_method(args.method)
                    .participants(args.participants);
                if !args.splits.is_empty() {
                    cmd = cmd.splits(args.splits);
                }
                let detail = engine.create_expense(cmd).await?;
                emit(json, &detail, |d| {
                    let mut out = format!(
                        "created expense {} ({}) of {}",
                        d.expense.name, d.expense.id, d.expense.amount
                    );
                    for share in &d.shares {
                        out.push_str(&format!(
                            "\n  {}\towes {}\tpaid {}",
                            share.user_id, share.amount_owed, share.amount_paid
                        ));
                    }
                    out
                })
            }
            ExpenseCommand::Show(args) => {
                let detail = engine.expense(args.expense, &args.user).await?;
                emit(json, &detail, |d| {
                    let mut out = format!(
                        "{} ({}) {} split {}, by {}",
                        d.expense.name,
                        d.expense.expense_type,
                        d.expense.amount,
                        d.expense.split_method,
                        d.expense.created_by
                    );
                    for share in &d.shares {
                        let state = if share.settled { "settled" } else { "open" };
                        out.push_str(&format!(
                            "\n  {}\towes {}\tpaid {}\t{state}",
                            share.user_id, share.amount_owed, share.amount_paid
                        ));
                    }
                    out
                })
            }
            ExpenseCommand::List(args) => {
                let expenses = engine.list_expenses(args.group, &args.user).await?;
                emit(json, &expenses, |expenses| {
                    expenses
                        .iter()
                        .map(|e| {
                            format!(
                                "{}\t{}\t{}\t{}\t{}",
                                e.created_at, e.id, e.amount, e.split_method, e.name
                            )
                        })
                        .collect::<Vec<_>>()
                        .join("\n")
                })
            }
        },
        EngineCommand::Balance(args) if args.all => {
            let balances = engine.group_balances(args.group, &args.user).await?;
            emit(json, &balances, |balances| {
                balances
                    .iter()
                    .map(|b| format!("{}\t{}", b.user_id, b.balance))
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
        EngineCommand::Balance(args) => {
            let balance = engine.group_balance(args.group, &args.user).await?;
            emit(json, &balance, |b| b.to_string())
        }
        EngineCommand::Summary(SummaryArgs {
            group: Some(group_id),
            ..
        }) => {
            let summary = engine.group_summary(group_id).await?;
            emit(json, &summary, |s| {
                format!("{} members, total {}", s.member_count, s.grand_total)
            })
        }
        EngineCommand::Summary(SummaryArgs {
            user: Some(user), ..
        }) => {
            let summaries = engine.group_summaries(&user).await?;
            emit(json, &summaries, |summaries| {
                summaries
                    .values()
                    .map(|s| format!("{}\t{} members\t{}", s.group_id, s.member_count, s.grand_total))
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
        EngineCommand::Summary(_) => Err("summary needs --group or --user".into()),
        EngineCommand::Settle(args) => {
            let plan = engine.settle_up(args.group, &args.user).await?;
            emit(json, &plan, |plan| {
                if plan.is_empty() {
                    return "nothing to settle".to_string();
                }
                plan.iter()
                    .map(|s| format!("{} -> {}\t{}", s.from, s.to, s.amount))
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn expense_add_collects_repeated_flags() {
        let cli = Cli::try_parse_from([
            "kitty",
            "expense",
            "add",
            "--user",
            "alice",
            "--group",
            "6f1c2c1e-8c47-4a39-9b8e-3d7f9c0f5a10",
            "--name",
            "Rent",
            "--amount",
            "100.00",
            "--method",
            "custom",
            "--participant",
            "alice",
            "--participant",
            "bob",
            "--split",
            "60",
            "--split",
            "40",
        ])
        .unwrap();

        let Command::Engine(EngineCommand::Expense(Expense {
            command: ExpenseCommand::Add(args),
        })) = cli.command
        else {
            panic!("expected expense add");
        };
        assert_eq!(args.amount, MoneyCents::new(10000));
        assert_eq!(args.participants, ["alice", "bob"]);
        assert_eq!(args.splits, [Decimal::from(60), Decimal::from(40)]);
        assert_eq!(args.expense_type, "general");
    }

    #[test]
    fn summary_needs_exactly_one_target() {
        assert!(Cli::try_parse_from(["kitty", "summary"]).is_err());
        assert!(
            Cli::try_parse_from(["kitty", "summary", "--user", "a", "--group", "x"]).is_err()
        );
        assert!(Cli::try_parse_from(["kitty", "summary", "--user", "alice"]).is_ok());
    }

    #[test]
    fn migrate_reads_its_own_subcommands() {
        let cli = Cli::try_parse_from(["kitty", "migrate", "down", "--steps", "1"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Migrate(Migrate {
                command: MigrateCommand::Down { steps: Some(1) }
            })
        ));
        assert!(Cli::try_parse_from(["kitty", "migrate", "sideways"]).is_err());
    }

    #[tokio::test]
    async fn migrate_runs_against_the_given_database() {
        let dir = std::env::temp_dir().join(format!("kitty-migrate-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let url = format!("sqlite:{}?mode=rwc", dir.join("kitty.db").display());

        migrate(&url, MigrateCommand::Up).await.unwrap();
        migrate(&url, MigrateCommand::Status).await.unwrap();
        migrate(&url, MigrateCommand::Down { steps: None }).await.unwrap();
        migrate(&url, MigrateCommand::Fresh).await.unwrap();

        let engine = build_engine(&url, &settings::Settings::default()).await.unwrap();
        let group = engine.create_group("Flat 3B", None, "alice").await.unwrap();
        assert_eq!(group.created_by, "alice");

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
