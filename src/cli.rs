//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::session::perform;
use crate::adapters::terminal::{
    render_chart_stats, render_dashboard, render_summary, render_table, row_line, write_csv,
};
use crate::adapters;
use crate::domain::dashboard::{self, DashboardState, Event, Mutation, Route};
use crate::domain::dropdown::{CodeFilter, visible_options};
use crate::domain::error::StockdashError;
use crate::domain::form::{RecordEdit, StockForm};
use crate::domain::record::{RecordField, StockRecord};
use crate::domain::settings::Settings;
use crate::domain::stats::{chart_series, summary_stats, window_stats};
use crate::domain::table::{PageSize, PriceTrend, SortOrder, TableState, build_view, filter_and_sort};
use crate::ports::stock_port::{StockPort, StockQuery};

#[derive(Parser, Debug)]
#[command(name = "stockdash", about = "Stock price records dashboard")]
pub struct Cli {
    /// INI config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
    /// Backend base URL, overrides [api] base_url
    #[arg(long, global = true)]
    pub base_url: Option<String>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print one page of the filtered, sorted record table
    List {
        #[arg(long)]
        code: Option<String>,
        #[arg(short, long, default_value = "")]
        search: String,
        #[arg(long, value_parser = parse_field)]
        sort: Option<RecordField>,
        #[arg(long, requires = "sort")]
        desc: bool,
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long, value_parser = parse_page_size)]
        page_size: Option<PageSize>,
        /// Write every matching record to a CSV file instead
        #[arg(long)]
        export: Option<PathBuf>,
    },
    /// List trade codes
    Codes {
        #[arg(short, long, default_value = "")]
        search: String,
    },
    /// Show one record
    Show { id: i64 },
    /// Summary and chart-window statistics
    Stats {
        #[arg(long)]
        code: Option<String>,
    },
    /// Create a record
    Create {
        #[arg(long)]
        date: String,
        #[arg(long)]
        trade_code: String,
        #[arg(long)]
        open: String,
        #[arg(long)]
        high: String,
        #[arg(long)]
        low: String,
        #[arg(long)]
        close: String,
        #[arg(long)]
        volume: String,
    },
    /// Change fields of an existing record
    Update {
        id: i64,
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        trade_code: Option<String>,
        #[arg(long)]
        open: Option<String>,
        #[arg(long)]
        high: Option<String>,
        #[arg(long)]
        low: Option<String>,
        #[arg(long)]
        close: Option<String>,
        #[arg(long)]
        volume: Option<String>,
    },
    /// Delete a record
    Delete {
        id: i64,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Interactive dashboard session
    Browse {
        #[arg(long)]
        code: Option<String>,
    },
    /// Start the web dashboard
    Serve,
}

fn parse_field(s: &str) -> Result<RecordField, String> {
    RecordField::parse(s).ok_or_else(|| {
        let names: Vec<&str> = RecordField::ALL.iter().map(|f| f.name()).collect();
        format!("unknown field '{s}', expected one of {}", names.join(", "))
    })
}

fn parse_page_size(s: &str) -> Result<PageSize, String> {
    s.parse::<usize>()
        .ok()
        .and_then(PageSize::from_count)
        .ok_or_else(|| format!("page size must be 25, 50 or 100, got '{s}'"))
}

/// Log to stderr; `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("stockdash=info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

pub fn run(cli: Cli) -> ExitCode {
    let settings = match load_settings(cli.config.as_deref(), cli.base_url.as_deref()) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => return fail(&StockdashError::from(e)),
    };
    match runtime.block_on(run_command(cli.command, settings)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => fail(&e),
    }
}

fn fail(err: &StockdashError) -> ExitCode {
    eprintln!("error: {err}");
    if err.is_upstream() {
        eprintln!("hint: check [api] base_url in the config or pass --base-url");
    }
    err.into()
}

pub fn load_settings(
    config_path: Option<&Path>,
    base_url: Option<&str>,
) -> Result<Settings, StockdashError> {
    let settings = match config_path {
        Some(path) => {
            eprintln!("Loading config from {}", path.display());
            Settings::from_config(&FileConfigAdapter::from_file(path)?)?
        }
        None => Settings::from_config(&FileConfigAdapter::empty())?,
    };
    match base_url {
        Some(url) => settings.with_base_url(url),
        None => Ok(settings),
    }
}

async fn run_command(command: Command, settings: Settings) -> Result<(), StockdashError> {
    let stocks = adapters::connect(&settings)?;
    match command {
        Command::List {
            code,
            search,
            sort,
            desc,
            page,
            page_size,
            export,
        } => {
            let filter = CodeFilter::parse(code.as_deref().unwrap_or_default());
            let mut table = TableState::new(page_size.unwrap_or(settings.page_size));
            table.set_search(search);
            let order = if desc { SortOrder::Desc } else { SortOrder::Asc };
            table.set_sort(sort, order);
            table.page = page.max(1);
            run_list(stocks.as_ref(), &settings, &filter, &table, export.as_deref()).await
        }
        Command::Codes { search } => run_codes(stocks.as_ref(), &search).await,
        Command::Show { id } => run_show(stocks.as_ref(), id).await,
        Command::Stats { code } => {
            let filter = CodeFilter::parse(code.as_deref().unwrap_or_default());
            run_stats(stocks.as_ref(), &settings, &filter).await
        }
        Command::Create {
            date,
            trade_code,
            open,
            high,
            low,
            close,
            volume,
        } => {
            let form = StockForm {
                date,
                trade_code,
                high,
                low,
                open,
                close,
                volume,
            };
            run_create(stocks.as_ref(), &form).await
        }
        Command::Update {
            id,
            date,
            trade_code,
            open,
            high,
            low,
            close,
            volume,
        } => {
            let changes = [
                (RecordField::Date, date),
                (RecordField::TradeCode, trade_code),
                (RecordField::Open, open),
                (RecordField::High, high),
                (RecordField::Low, low),
                (RecordField::Close, close),
                (RecordField::Volume, volume),
            ];
            run_update(stocks.as_ref(), id, changes).await
        }
        Command::Delete { id, yes } => run_delete(stocks.as_ref(), id, yes).await,
        Command::Browse { code } => run_browse(stocks, &settings, code.as_deref()).await,
        Command::Serve => run_serve(stocks, settings).await,
    }
}

async fn fetch(
    stocks: &dyn StockPort,
    settings: &Settings,
    filter: &CodeFilter,
) -> Result<Vec<StockRecord>, StockdashError> {
    eprintln!(
        "Fetching up to {} records ({})",
        settings.fetch_limit,
        filter.label()
    );
    stocks
        .list_stocks(&StockQuery::first(settings.fetch_limit, filter.as_query()))
        .await
}

async fn run_list(
    stocks: &dyn StockPort,
    settings: &Settings,
    filter: &CodeFilter,
    table: &TableState,
    export: Option<&Path>,
) -> Result<(), StockdashError> {
    let records = fetch(stocks, settings, filter).await?;
    if let Some(path) = export {
        let rows = filter_and_sort(&records, table);
        write_csv(&rows, File::create(path)?)?;
        eprintln!("Exported {} records to {}", rows.len(), path.display());
        return Ok(());
    }
    print!("{}", render_table(&build_view(&records, table), table, filter));
    Ok(())
}

async fn run_codes(stocks: &dyn StockPort, search: &str) -> Result<(), StockdashError> {
    let codes = stocks.list_trade_codes().await?;
    let options = visible_options(&codes, search);
    if options.is_empty() {
        println!("No results");
    }
    for option in options {
        println!("{option}");
    }
    Ok(())
}

async fn run_show(stocks: &dyn StockPort, id: i64) -> Result<(), StockdashError> {
    let record = stocks.get_stock(id).await?;
    println!("{:<11} {}", "id", record.id);
    for field in RecordField::ALL {
        println!("{:<11} {}", field.name(), record.field(field));
    }
    Ok(())
}

async fn run_stats(
    stocks: &dyn StockPort,
    settings: &Settings,
    filter: &CodeFilter,
) -> Result<(), StockdashError> {
    let records = fetch(stocks, settings, filter).await?;
    let points = chart_series(&records);
    print!("{}", render_summary(&summary_stats(&records), filter));
    print!("{}", render_chart_stats(&points, &window_stats(&points)));
    Ok(())
}

async fn run_create(stocks: &dyn StockPort, form: &StockForm) -> Result<(), StockdashError> {
    let payload = form.to_payload()?;
    let created = stocks.create_stock(&payload).await?;
    println!("{}", Mutation::Create.notice(true).message());
    println!("{}", row_line(&created, PriceTrend::Flat));
    Ok(())
}

async fn run_update(
    stocks: &dyn StockPort,
    id: i64,
    changes: [(RecordField, Option<String>); 7],
) -> Result<(), StockdashError> {
    let record = stocks.get_stock(id).await?;
    let mut edit = RecordEdit::begin(&record);
    for (field, value) in changes {
        if let Some(value) = value {
            edit.set(field, value);
        }
    }
    if !edit.is_dirty() {
        eprintln!("Nothing to update for stock {id}");
        return Ok(());
    }
    let updated = stocks.update_stock(id, &edit.draft).await?;
    println!("{}", Mutation::Update { id }.notice(true).message());
    println!("{}", row_line(&updated, PriceTrend::Flat));
    Ok(())
}

async fn run_delete(stocks: &dyn StockPort, id: i64, yes: bool) -> Result<(), StockdashError> {
    if !yes {
        eprint!("Are you sure you want to delete stock {id}? [y/N] ");
        let mut answer = String::new();
        BufReader::new(tokio::io::stdin()).read_line(&mut answer).await?;
        if !is_yes(&answer) {
            eprintln!("Cancelled");
            return Ok(());
        }
    }
    stocks.delete_stock(id).await?;
    println!("{}", Mutation::Delete { id }.notice(true).message());
    Ok(())
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

const BROWSE_HELP: &str = "\
commands:
  code <value>          select a trade code (all for every code)
  codes <text>          search trade codes
  search <text>         filter rows (no text clears)
  sort <field>          sort by field, again to flip direction
  size <25|50|100>      rows per page
  page <n> | next | prev
  refresh
  edit <id> | set <field> <value> | save | cancel
  delete <id> | confirm | dismiss
  new | set <field> <value> | submit | back
  help | quit";

#[derive(Debug, PartialEq)]
enum BrowseInput {
    Event(Event),
    Help,
    Quit,
}

/// Map one input line to the event it stands for. `set` edits the create
/// form on the create screen and the edit draft otherwise.
fn parse_browse_input(line: &str, state: &DashboardState) -> Result<BrowseInput, String> {
    let line = line.trim();
    let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();
    let id = || rest.parse::<i64>().map_err(|_| format!("expected a record id, got '{rest}'"));

    let event = match word {
        "" | "show" => return Ok(BrowseInput::Event(Event::ClearNotices)),
        "help" | "?" => return Ok(BrowseInput::Help),
        "quit" | "exit" | "q" => return Ok(BrowseInput::Quit),
        "code" => Event::SelectCode(rest.to_string()),
        "codes" => Event::CodeSearch(rest.to_string()),
        "search" => Event::Search(rest.to_string()),
        "sort" => Event::SortBy(parse_field(rest)?),
        "size" => Event::SetPageSize(parse_page_size(rest)?),
        "page" => Event::GoToPage(
            rest.parse()
                .map_err(|_| format!("expected a page number, got '{rest}'"))?,
        ),
        "next" => Event::NextPage,
        "prev" => Event::PrevPage,
        "refresh" => Event::Refresh,
        "edit" => Event::BeginEdit(id()?),
        "save" => Event::SaveEdit,
        "cancel" => Event::CancelEdit,
        "delete" => Event::RequestDelete(id()?),
        "confirm" => Event::ConfirmDelete,
        "dismiss" => Event::DismissDelete,
        "new" => Event::Navigate(Route::Create),
        "back" => Event::Navigate(Route::Listing),
        "submit" => Event::SubmitForm,
        "set" => {
            let (name, value) = rest
                .split_once(char::is_whitespace)
                .ok_or("usage: set <field> <value>")?;
            let field = parse_field(name)?;
            let value = value.trim().to_string();
            if state.route == Route::Create {
                Event::FormField(field, value)
            } else if state.editing.is_some() {
                Event::EditField(field, value)
            } else {
                return Err("nothing to set: use 'edit <id>' or 'new' first".to_string());
            }
        }
        other => return Err(format!("unknown command '{other}', try 'help'")),
    };
    Ok(BrowseInput::Event(event))
}

fn spawn_commands(
    commands: Vec<dashboard::Command>,
    stocks: &Arc<dyn StockPort>,
    fetch_limit: u32,
    events: &mpsc::UnboundedSender<Event>,
) {
    for command in commands {
        let stocks = Arc::clone(stocks);
        let events = events.clone();
        tokio::spawn(async move {
            let done = perform(stocks.as_ref(), command, fetch_limit).await;
            // receiver only goes away when the session ends
            let _ = events.send(done);
        });
    }
}

async fn run_browse(
    stocks: Arc<dyn StockPort>,
    settings: &Settings,
    code: Option<&str>,
) -> Result<(), StockdashError> {
    let (events, mut completions) = mpsc::unbounded_channel();
    let mut state = DashboardState::new(settings.page_size);
    if let Some(code) = code {
        state.dropdown.select(code);
    }
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    eprintln!("{BROWSE_HELP}");

    let commands = state.update(Event::Start);
    spawn_commands(commands, &stocks, settings.fetch_limit, &events);
    print!("{}", render_dashboard(&state));

    loop {
        tokio::select! {
            Some(done) = completions.recv() => {
                let commands = state.update(done);
                spawn_commands(commands, &stocks, settings.fetch_limit, &events);
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match parse_browse_input(&line, &state) {
                    Ok(BrowseInput::Quit) => break,
                    Ok(BrowseInput::Help) => {
                        eprintln!("{BROWSE_HELP}");
                        continue;
                    }
                    Ok(BrowseInput::Event(event)) => {
                        let commands = state.update(event);
                        spawn_commands(commands, &stocks, settings.fetch_limit, &events);
                    }
                    Err(message) => {
                        eprintln!("{message}");
                        continue;
                    }
                }
            }
        }
        print!("{}", render_dashboard(&state));
        state.update(Event::ClearNotices);
    }
    Ok(())
}

#[cfg(feature = "web")]
async fn run_serve(stocks: Arc<dyn StockPort>, settings: Settings) -> Result<(), StockdashError> {
    use crate::adapters::web::{AppState, build_router};

    let listen = settings.listen;
    eprintln!("Using backend {}", settings.base_url);
    let router = build_router(AppState { stocks, settings });
    let listener = tokio::net::TcpListener::bind(listen).await?;
    eprintln!("Starting web server on {listen}");
    axum::serve(listener, router).await?;
    Ok(())
}

#[cfg(not(feature = "web"))]
async fn run_serve(_stocks: Arc<dyn StockPort>, _settings: Settings) -> Result<(), StockdashError> {
    Err(StockdashError::Io {
        reason: "web feature is required for serve".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing() -> DashboardState {
        let mut state = DashboardState::new(PageSize::Fifty);
        state.records = vec![StockRecord {
            id: 1,
            date: "2024-01-01".into(),
            trade_code: "GP".into(),
            high: "2".into(),
            low: "1".into(),
            open: "1".into(),
            close: "2".into(),
            volume: "10".into(),
        }];
        state
    }

    #[test]
    fn cli_parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "stockdash",
            "list",
            "--sort",
            "close",
            "--desc",
            "--page-size",
            "25",
            "--base-url",
            "http://localhost:8000",
        ])
        .unwrap();
        assert_eq!(cli.base_url.as_deref(), Some("http://localhost:8000"));
        match cli.command {
            Command::List {
                sort,
                desc,
                page_size,
                ..
            } => {
                assert_eq!(sort, Some(RecordField::Close));
                assert!(desc);
                assert_eq!(page_size, Some(PageSize::TwentyFive));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn cli_rejects_bad_page_size_and_field() {
        assert!(Cli::try_parse_from(["stockdash", "list", "--page-size", "30"]).is_err());
        assert!(Cli::try_parse_from(["stockdash", "list", "--sort", "price"]).is_err());
        assert!(Cli::try_parse_from(["stockdash", "list", "--desc"]).is_err());
    }

    #[test]
    fn yes_answers() {
        assert!(is_yes("y\n"));
        assert!(is_yes(" YES "));
        assert!(!is_yes("\n"));
        assert!(!is_yes("nope"));
    }

    #[test]
    fn browse_commands_map_to_events() {
        let state = listing();
        assert_eq!(
            parse_browse_input("sort volume", &state),
            Ok(BrowseInput::Event(Event::SortBy(RecordField::Volume)))
        );
        assert_eq!(
            parse_browse_input("code  ACI ", &state),
            Ok(BrowseInput::Event(Event::SelectCode("ACI".into())))
        );
        assert_eq!(
            parse_browse_input("search", &state),
            Ok(BrowseInput::Event(Event::Search(String::new())))
        );
        assert_eq!(parse_browse_input("quit", &state), Ok(BrowseInput::Quit));
        assert!(parse_browse_input("edit abc", &state).is_err());
        assert!(parse_browse_input("launch", &state).is_err());
    }

    #[test]
    fn set_targets_form_or_draft() {
        let mut state = listing();
        assert!(parse_browse_input("set close 3", &state).is_err());

        state.update(Event::BeginEdit(1));
        assert_eq!(
            parse_browse_input("set close 3.5", &state),
            Ok(BrowseInput::Event(Event::EditField(RecordField::Close, "3.5".into())))
        );

        state.update(Event::CancelEdit);
        state.update(Event::Navigate(Route::Create));
        assert_eq!(
            parse_browse_input("set trade-code GP", &state),
            Ok(BrowseInput::Event(Event::FormField(RecordField::TradeCode, "GP".into())))
        );
    }

    #[test]
    fn settings_default_without_config() {
        let settings = load_settings(None, Some("http://127.0.0.1:1/")).unwrap();
        assert_eq!(settings.base_url, "http://127.0.0.1:1");
        assert!(load_settings(Some(Path::new("/nonexistent/stockdash.ini")), None).is_err());
    }
}
