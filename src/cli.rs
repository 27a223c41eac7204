use clap::{Args, Parser, Subcommand, ValueEnum};
use env_logger::Env;
use std::error::Error;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use crate::debt::{self, AutoConfirm, Confirm, SettleOutcome};
use crate::export::{self, ExportFormat};
use crate::labels::Labels;
use crate::model::{PaymentMethod, RecordKind, ReferenceList, TradeSide};
use crate::period::{self, EntryStamp, Period};
use crate::persist::{self, Workspace};
use crate::report::{
    self, EntryFilter, EntryKind, Report, ReportKind, ReportRow, SortDirection, SortKey, SortState,
};
use crate::settings::{self, Settings};
use crate::stock::project_stock;
use crate::store::{ExpenseDraft, ProcessingDraft, TradeDraft};

#[derive(Parser)]
#[command(name = "ecorecycle", version = crate::version::APP_VERSION)]
pub struct Cli {
    /// Data directory (defaults to $ECORECYCLE_DATA, then the platform data dir).
    #[arg(long, global = true, value_name = "DIR")]
    data: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Login(LoginArgs),
    Logout,
    Buy(BuyArgs),
    Sell(SellArgs),
    Process(ProcessArgs),
    Expense(ExpenseArgs),
    Salary(SalaryArgs),
    Delete(DeleteArgs),
    Debts,
    Settle(SettleArgs),
    Stock,
    Summary(PeriodArgs),
    Journal(JournalArgs),
    Analysis(PeriodArgs),
    Export(ExportArgs),
    Reference(ReferenceArgs),
    Settings(SettingsArgs),
    Backup(BackupArgs),
    Restore(RestoreArgs),
}

#[derive(Args, Debug, Default)]
struct PeriodArgs {
    /// Day view of the given date (default: today).
    #[arg(long, value_name = "YYYY-MM-DD", conflicts_with = "month")]
    date: Option<String>,
    /// Month view.
    #[arg(long, value_name = "YYYY-MM")]
    month: Option<String>,
}

impl PeriodArgs {
    fn resolve(&self) -> Result<Period, crate::error::LedgerError> {
        match (&self.date, &self.month) {
            (_, Some(month)) => Period::month(month),
            (Some(date), None) => Period::day(date),
            (None, None) => Ok(Period::for_day(period::today())),
        }
    }
}

#[derive(Args)]
struct LoginArgs {
    #[arg(long)]
    username: String,
    #[arg(long)]
    password: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum MethodArg {
    Cash,
    Card,
    Debt,
}

impl From<MethodArg> for PaymentMethod {
    fn from(value: MethodArg) -> Self {
        match value {
            MethodArg::Cash => PaymentMethod::Cash,
            MethodArg::Card => PaymentMethod::Card,
            MethodArg::Debt => PaymentMethod::Deferred,
        }
    }
}

#[derive(Args)]
struct BuyArgs {
    #[arg(long, value_name = "NAME")]
    material: String,
    #[arg(long, value_name = "KG")]
    qty: f64,
    #[arg(long)]
    price: f64,
    /// Supplier; left empty the default supplier label is used.
    #[arg(long, default_value = "")]
    client: String,
    #[command(flatten)]
    period: PeriodArgs,
}

#[derive(Args)]
struct SellArgs {
    #[arg(long, value_name = "NAME")]
    material: String,
    #[arg(long, value_name = "KG")]
    qty: f64,
    #[arg(long)]
    price: f64,
    #[arg(long, default_value = "")]
    client: String,
    #[arg(long, value_enum, default_value_t = MethodArg::Cash)]
    method: MethodArg,
    #[command(flatten)]
    period: PeriodArgs,
}

#[derive(Args)]
struct ProcessArgs {
    #[arg(long, value_name = "NAME")]
    from: String,
    #[arg(long = "qty-in", value_name = "KG")]
    qty_in: f64,
    #[arg(long, value_name = "NAME")]
    to: String,
    #[arg(long = "qty-out", value_name = "KG")]
    qty_out: f64,
    #[command(flatten)]
    period: PeriodArgs,
}

#[derive(Args)]
struct ExpenseArgs {
    #[arg(long)]
    category: String,
    #[arg(long)]
    amount: f64,
    #[arg(long, default_value = "")]
    description: String,
    #[command(flatten)]
    period: PeriodArgs,
}

#[derive(Args)]
struct SalaryArgs {
    #[arg(long)]
    worker: String,
    #[arg(long)]
    amount: f64,
    #[command(flatten)]
    period: PeriodArgs,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum RecordArg {
    Trade,
    Processing,
    Expense,
}

impl From<RecordArg> for RecordKind {
    fn from(value: RecordArg) -> Self {
        match value {
            RecordArg::Trade => RecordKind::Trade,
            RecordArg::Processing => RecordKind::Processing,
            RecordArg::Expense => RecordKind::Expense,
        }
    }
}

#[derive(Args)]
struct DeleteArgs {
    #[arg(value_enum)]
    kind: RecordArg,
    id: i64,
    /// Skip the confirmation prompt.
    #[arg(long, short = 'y', default_value_t = false)]
    yes: bool,
}

#[derive(Args)]
struct SettleArgs {
    id: i64,
    #[arg(long, short = 'y', default_value_t = false)]
    yes: bool,
    #[command(flatten)]
    period: PeriodArgs,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum KindArg {
    Buy,
    Sell,
    Processing,
    Expense,
}

impl From<KindArg> for EntryKind {
    fn from(value: KindArg) -> Self {
        match value {
            KindArg::Buy => EntryKind::Buy,
            KindArg::Sell => EntryKind::Sell,
            KindArg::Processing => EntryKind::Processing,
            KindArg::Expense => EntryKind::Expense,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum SortArg {
    Date,
    Kind,
    Details,
    Value,
}

impl From<SortArg> for SortKey {
    fn from(value: SortArg) -> Self {
        match value {
            SortArg::Date => SortKey::DateTime,
            SortArg::Kind => SortKey::Kind,
            SortArg::Details => SortKey::Details,
            SortArg::Value => SortKey::Value,
        }
    }
}

#[derive(Args, Debug, Default)]
struct JournalFilterArgs {
    #[arg(long, value_enum)]
    kind: Option<KindArg>,
    #[arg(long, value_name = "NAME")]
    material: Option<String>,
    /// Sort column; picking one starts ascending.
    #[arg(long, value_enum)]
    sort: Option<SortArg>,
    #[arg(long, conflicts_with = "desc", default_value_t = false)]
    asc: bool,
    #[arg(long, default_value_t = false)]
    desc: bool,
}

impl JournalFilterArgs {
    fn filter(&self) -> EntryFilter {
        EntryFilter {
            kind: self.kind.map(EntryKind::from),
            material: self
                .material
                .as_deref()
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string),
        }
    }

    fn sort_state(&self) -> SortState {
        let mut state = match self.sort {
            Some(key) => SortState::default().toggle(key.into()),
            None => SortState::default(),
        };
        if self.asc {
            state.direction = SortDirection::Asc;
        } else if self.desc {
            state.direction = SortDirection::Desc;
        }
        state
    }
}

#[derive(Args)]
struct JournalArgs {
    #[command(flatten)]
    period: PeriodArgs,
    #[command(flatten)]
    filter: JournalFilterArgs,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ReportArg {
    Journal,
    Stock,
    Analysis,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    Pdf,
    Docx,
    Csv,
}

impl From<FormatArg> for ExportFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Pdf => ExportFormat::Pdf,
            FormatArg::Docx => ExportFormat::Docx,
            FormatArg::Csv => ExportFormat::Csv,
        }
    }
}

#[derive(Args)]
struct ExportArgs {
    #[arg(value_enum)]
    report: ReportArg,
    #[arg(long, value_enum, default_value_t = FormatArg::Pdf)]
    format: FormatArg,
    /// Output file or directory (default: current directory).
    #[arg(long, value_name = "PATH")]
    out: Option<PathBuf>,
    #[command(flatten)]
    period: PeriodArgs,
    #[command(flatten)]
    filter: JournalFilterArgs,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ListArg {
    Raw,
    Finished,
    Categories,
    Workers,
}

impl ListArg {
    const ALL: [ListArg; 4] = [
        ListArg::Raw,
        ListArg::Finished,
        ListArg::Categories,
        ListArg::Workers,
    ];

    fn heading(self) -> &'static str {
        match self {
            ListArg::Raw => "Raw materials",
            ListArg::Finished => "Finished goods",
            ListArg::Categories => "Expense categories",
            ListArg::Workers => "Workers",
        }
    }
}

impl From<ListArg> for ReferenceList {
    fn from(value: ListArg) -> Self {
        match value {
            ListArg::Raw => ReferenceList::RawMaterials,
            ListArg::Finished => ReferenceList::FinishedGoods,
            ListArg::Categories => ReferenceList::ExpenseCategories,
            ListArg::Workers => ReferenceList::Workers,
        }
    }
}

#[derive(Args)]
struct ReferenceArgs {
    #[command(subcommand)]
    command: ReferenceCommand,
}

#[derive(Subcommand)]
enum ReferenceCommand {
    List(ReferenceListArgs),
    Add(ReferenceEditArgs),
    Remove(ReferenceEditArgs),
}

#[derive(Args)]
struct ReferenceListArgs {
    #[arg(value_enum)]
    list: Option<ListArg>,
}

#[derive(Args)]
struct ReferenceEditArgs {
    #[arg(value_enum)]
    list: ListArg,
    name: String,
}

#[derive(Args)]
struct SettingsArgs {
    #[command(subcommand)]
    command: SettingsCommand,
}

#[derive(Subcommand)]
enum SettingsCommand {
    Show,
    Lang(SettingValueArgs),
    Theme(SettingValueArgs),
    Font(SettingValueArgs),
    PdfFont(PdfFontArgs),
}

#[derive(Args)]
struct SettingValueArgs {
    value: String,
}

#[derive(Args)]
struct PdfFontArgs {
    #[arg(
        value_name = "PATH",
        required_unless_present = "clear",
        conflicts_with = "clear"
    )]
    path: Option<PathBuf>,
    /// Go back to the built-in PDF font.
    #[arg(long, default_value_t = false)]
    clear: bool,
}

#[derive(Args)]
struct BackupArgs {
    #[arg(value_name = "PATH")]
    path: PathBuf,
}

#[derive(Args)]
struct RestoreArgs {
    #[arg(value_name = "PATH")]
    path: PathBuf,
    #[arg(long, short = 'y', default_value_t = false)]
    yes: bool,
}

pub fn run() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let data_dir = persist::resolve_data_dir(cli.data)?;
    dispatch(cli.command, &data_dir)
}

fn dispatch(command: Commands, data_dir: &Path) -> Result<(), Box<dyn Error>> {
    match command {
        Commands::Login(args) => run_login(args, data_dir),
        Commands::Logout => run_logout(data_dir),
        Commands::Settings(args) => run_settings(args, data_dir),
        command => {
            crate::session::require_authenticated(data_dir)?;
            let settings = settings::read_settings(data_dir);
            let mut workspace = Workspace::open(data_dir.to_path_buf())?;
            let mut session = Session {
                workspace: &mut workspace,
                settings: &settings,
                labels: Labels::for_lang(settings.lang),
            };
            session.run(command)
        }
    }
}

fn run_login(args: LoginArgs, data_dir: &Path) -> Result<(), Box<dyn Error>> {
    crate::session::login(data_dir, &args.username, &args.password)?;
    println!("Logged in.");
    Ok(())
}

fn run_logout(data_dir: &Path) -> Result<(), Box<dyn Error>> {
    crate::session::logout(data_dir)?;
    println!("Logged out.");
    Ok(())
}

fn run_settings(args: SettingsArgs, data_dir: &Path) -> Result<(), Box<dyn Error>> {
    let mut settings = settings::read_settings(data_dir);
    match args.command {
        SettingsCommand::Show => {
            print_settings(&settings);
            return Ok(());
        }
        SettingsCommand::Lang(a) => settings.set_lang(&a.value)?,
        SettingsCommand::Theme(a) => settings.set_theme(&a.value)?,
        SettingsCommand::Font(a) => settings.set_font(&a.value)?,
        SettingsCommand::PdfFont(a) => {
            settings.pdf_font = if a.clear { None } else { a.path };
        }
    }
    settings::write_settings(data_dir, &settings)?;
    print_settings(&settings);
    Ok(())
}

fn print_settings(settings: &Settings) {
    println!("lang: {}", settings.lang.code());
    println!("theme: {}", settings.theme);
    println!("font: {}", settings.font);
    match &settings.pdf_font {
        Some(path) => println!("pdf font: {}", path.display()),
        None => println!("pdf font: built-in"),
    }
    println!(
        "session: {}",
        if settings.authenticated {
            "logged in"
        } else {
            "logged out"
        }
    );
}

/// Stdin yes/no prompt. Anything but an explicit yes declines.
struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&mut self, prompt: &str) -> bool {
        eprint!("{prompt} [y/N] ");
        let _ = io::stderr().flush();
        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
    }
}

fn confirmer(yes: bool) -> Box<dyn Confirm> {
    if yes {
        Box::new(AutoConfirm(true))
    } else {
        Box::new(StdinConfirm)
    }
}

/// An authenticated, locked invocation.
struct Session<'a> {
    workspace: &'a mut Workspace,
    settings: &'a Settings,
    labels: &'static Labels,
}

impl Session<'_> {
    fn run(&mut self, command: Commands) -> Result<(), Box<dyn Error>> {
        match command {
            Commands::Buy(args) => self.add_trade(
                TradeSide::Buy,
                args.material,
                args.qty,
                args.price,
                args.client,
                PaymentMethod::Cash,
                &args.period,
            ),
            Commands::Sell(args) => self.add_trade(
                TradeSide::Sell,
                args.material,
                args.qty,
                args.price,
                args.client,
                args.method.into(),
                &args.period,
            ),
            Commands::Process(args) => self.add_processing(args),
            Commands::Expense(args) => self.add_expense(
                ExpenseDraft::General {
                    category: args.category,
                    amount: args.amount,
                    description: args.description,
                },
                &args.period,
            ),
            Commands::Salary(args) => self.add_expense(
                ExpenseDraft::Salary {
                    worker: args.worker,
                    amount: args.amount,
                },
                &args.period,
            ),
            Commands::Delete(args) => self.delete(args),
            Commands::Debts => {
                self.print_debts();
                Ok(())
            }
            Commands::Settle(args) => self.settle(args),
            Commands::Stock => {
                self.print_stock();
                Ok(())
            }
            Commands::Summary(args) => self.print_summary(&args),
            Commands::Journal(args) => {
                let report = self.journal(&args.period, &args.filter)?;
                print_report(&report);
                Ok(())
            }
            Commands::Analysis(args) => {
                let period = args.resolve()?;
                let report = report::analysis_report(
                    self.workspace.store.database(),
                    &period,
                    self.labels,
                    &generated_at(),
                );
                print_report(&report);
                Ok(())
            }
            Commands::Export(args) => self.export(args),
            Commands::Reference(args) => self.reference(args),
            Commands::Backup(args) => {
                persist::write_backup(&args.path, self.workspace.store.database())?;
                println!("Backup written to {}", args.path.display());
                Ok(())
            }
            Commands::Restore(args) => self.restore(args),
            Commands::Login(_) | Commands::Logout | Commands::Settings(_) => {
                Err("command does not need a workspace".into())
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn add_trade(
        &mut self,
        side: TradeSide,
        material: String,
        qty: f64,
        price: f64,
        client: String,
        method: PaymentMethod,
        period: &PeriodArgs,
    ) -> Result<(), Box<dyn Error>> {
        let period = period.resolve()?;
        let draft = TradeDraft {
            side,
            material,
            qty,
            price,
            client,
            method,
        };
        let trade = self.workspace.store.add_trade(
            draft,
            &EntryStamp::now(&period),
            self.labels.supplier,
        )?;
        self.workspace.save()?;
        println!(
            "Recorded trade #{}: {} {} kg x {} = {} {} ({})",
            trade.id,
            trade.material,
            trade.qty,
            trade.price,
            report::format_amount(trade.total),
            self.labels.currency,
            self.labels.method_name(trade.method)
        );
        Ok(())
    }

    fn add_processing(&mut self, args: ProcessArgs) -> Result<(), Box<dyn Error>> {
        let period = args.period.resolve()?;
        let draft = ProcessingDraft {
            from: args.from,
            qty_in: args.qty_in,
            to: args.to,
            qty_out: args.qty_out,
        };
        let processing = self
            .workspace
            .store
            .add_processing(draft, &EntryStamp::now(&period))?;
        self.workspace.save()?;
        println!(
            "Recorded processing #{}: {} {} kg -> {} {} kg",
            processing.id, processing.from, processing.qty_in, processing.to, processing.qty_out
        );
        Ok(())
    }

    fn add_expense(
        &mut self,
        draft: ExpenseDraft,
        period: &PeriodArgs,
    ) -> Result<(), Box<dyn Error>> {
        let period = period.resolve()?;
        let expense = self
            .workspace
            .store
            .add_expense(draft, &EntryStamp::now(&period))?;
        self.workspace.save()?;
        println!(
            "Recorded expense #{}: {} {} {}",
            expense.id,
            self.labels.category_name(&expense.category),
            report::format_amount(expense.amount),
            self.labels.currency
        );
        Ok(())
    }

    fn delete(&mut self, args: DeleteArgs) -> Result<(), Box<dyn Error>> {
        let kind = RecordKind::from(args.kind);
        if !self.workspace.store.database().contains_id(kind, args.id) {
            return Err(format!("no {:?} record with id {}", args.kind, args.id).into());
        }
        if !confirmer(args.yes).confirm(self.labels.confirm_delete) {
            println!("Cancelled.");
            return Ok(());
        }
        if self.workspace.store.delete(kind, args.id) {
            self.workspace.save()?;
            println!("Deleted #{}.", args.id);
        }
        Ok(())
    }

    fn print_debts(&self) {
        let db = self.workspace.store.database();
        let debts = debt::outstanding(db);
        println!("{}", self.labels.debts_title);
        if debts.is_empty() {
            println!("{}", self.labels.no_debts);
            return;
        }
        let headers = [
            "#",
            self.labels.col_date,
            self.labels.client,
            self.labels.material,
            self.labels.amount,
        ]
        .map(str::to_string);
        let rows: Vec<ReportRow> = debts
            .iter()
            .map(|trade| ReportRow {
                cells: vec![
                    trade.id.to_string(),
                    trade.date.clone(),
                    trade.client.clone(),
                    trade.material.clone(),
                    format!(
                        "{} {}",
                        report::format_amount(trade.total),
                        self.labels.currency
                    ),
                ],
                amount: Some(trade.total),
            })
            .collect();
        for line in table_lines(&headers, &rows) {
            println!("{line}");
        }
        println!(
            "= {} {}",
            report::format_amount(debt::outstanding_total(db)),
            self.labels.currency
        );
    }

    fn settle(&mut self, args: SettleArgs) -> Result<(), Box<dyn Error>> {
        let period = args.period.resolve()?;
        let mut confirm = confirmer(args.yes);
        let outcome = debt::settle(
            &mut self.workspace.store,
            args.id,
            &period,
            period::today(),
            confirm.as_mut(),
            self.labels.confirm_pay,
        );
        match outcome {
            SettleOutcome::Settled => {
                self.workspace.save()?;
                println!("Settled #{}.", args.id);
                Ok(())
            }
            SettleOutcome::Declined => {
                println!("Cancelled.");
                Ok(())
            }
            SettleOutcome::NotOutstanding => {
                Err(format!("no outstanding debt with id {}", args.id).into())
            }
        }
    }

    fn print_stock(&self) {
        let stock = project_stock(self.workspace.store.database());
        let report = report::stock_report(&stock, self.labels, &generated_at());
        print_report(&report);
        for (material, level) in stock.shortages() {
            eprintln!("warning: {material} is below zero: {level:.2} {}", self.labels.kg);
        }
    }

    fn print_summary(&self, args: &PeriodArgs) -> Result<(), Box<dyn Error>> {
        let period = args.resolve()?;
        let totals = crate::aggregate::summarize(self.workspace.store.database(), &period);
        println!("{}", period.title(self.labels));
        let values = [totals.income, totals.expense, totals.profit];
        let names = [
            self.labels.kpi_income,
            self.labels.kpi_expense,
            self.labels.kpi_profit,
        ];
        for (name, value) in names.iter().zip(values) {
            println!(
                "{name}: {} {}",
                report::format_amount(value),
                self.labels.currency
            );
        }
        Ok(())
    }

    fn journal(
        &self,
        period: &PeriodArgs,
        filter: &JournalFilterArgs,
    ) -> Result<Report, Box<dyn Error>> {
        let period = period.resolve()?;
        Ok(report::journal_report(
            self.workspace.store.database(),
            &period,
            &filter.filter(),
            filter.sort_state(),
            self.labels,
            &generated_at(),
        ))
    }

    fn export(&self, args: ExportArgs) -> Result<(), Box<dyn Error>> {
        let db = self.workspace.store.database();
        let period = args.period.resolve()?;
        let (report, stamp) = match args.report {
            ReportArg::Journal => (
                self.journal(&args.period, &args.filter)?,
                period.reference().to_string(),
            ),
            ReportArg::Stock => (
                report::stock_report(&project_stock(db), self.labels, &generated_at()),
                period::today().format("%Y-%m-%d").to_string(),
            ),
            ReportArg::Analysis => (
                report::analysis_report(db, &period, self.labels, &generated_at()),
                period.reference().to_string(),
            ),
        };
        let format = ExportFormat::from(args.format);
        let file_name = export::default_file_name(&report, &stamp, format);
        let target = match args.out {
            Some(path) if path.is_dir() => path.join(file_name),
            Some(path) => path,
            None => PathBuf::from(file_name),
        };
        let written = export::export_to_file(
            &report,
            format,
            self.settings.pdf_font.as_deref(),
            &target,
        )?;
        println!("{}", written.display());
        Ok(())
    }

    fn reference(&mut self, args: ReferenceArgs) -> Result<(), Box<dyn Error>> {
        match args.command {
            ReferenceCommand::List(a) => {
                let lists = match a.list {
                    Some(list) => vec![list],
                    None => ListArg::ALL.to_vec(),
                };
                let db = self.workspace.store.database();
                for list in lists {
                    println!("{}:", list.heading());
                    for name in db.reference_list(list.into()) {
                        println!("  {}", self.labels.category_name(name));
                    }
                }
                Ok(())
            }
            ReferenceCommand::Add(a) => {
                if self.workspace.store.add_reference(a.list.into(), &a.name) {
                    self.workspace.save()?;
                    println!("Added '{}' to {}.", a.name.trim(), a.list.heading());
                } else {
                    println!("Nothing to add.");
                }
                Ok(())
            }
            ReferenceCommand::Remove(a) => {
                if self.workspace.store.remove_reference(a.list.into(), &a.name) {
                    self.workspace.save()?;
                    println!("Removed '{}' from {}.", a.name, a.list.heading());
                    Ok(())
                } else {
                    Err(format!("'{}' is not in {}", a.name, a.list.heading()).into())
                }
            }
        }
    }

    fn restore(&mut self, args: RestoreArgs) -> Result<(), Box<dyn Error>> {
        let db = persist::read_backup(&args.path)?;
        let prompt = format!(
            "Replace all records with {} ({} trades, {} conversions, {} expenses)?",
            args.path.display(),
            db.transactions.len(),
            db.processing.len(),
            db.expenses.len()
        );
        if !confirmer(args.yes).confirm(&prompt) {
            println!("Cancelled.");
            return Ok(());
        }
        self.workspace.store.replace(db);
        self.workspace.save()?;
        println!("Restored from {}", args.path.display());
        Ok(())
    }
}

fn generated_at() -> String {
    chrono::Local::now().format("%d.%m.%Y %H:%M").to_string()
}

fn print_report(report: &Report) {
    println!("{} - {}", report.title, report.subtitle);
    println!("{}", report.generated);
    if report.kind == ReportKind::Journal {
        if let Some(totals) = &report.totals {
            let values = [totals.income, totals.expense, totals.profit];
            for (label, value) in report.kpi_labels.iter().zip(values) {
                println!(
                    "{label}: {} {}",
                    report::format_amount(value),
                    report.currency
                );
            }
        }
    }
    for section in &report.sections {
        println!();
        for line in table_lines(&section.headers, &section.rows) {
            println!("{line}");
        }
    }
    if let Some(note) = &report.note {
        println!("{note}");
    }
}

/// Left-aligned columns padded to the widest cell.
fn table_lines(headers: &[String], rows: &[ReportRow]) -> Vec<String> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (index, cell) in row.cells.iter().enumerate() {
            let width = cell.chars().count();
            match widths.get_mut(index) {
                Some(current) => *current = (*current).max(width),
                None => widths.push(width),
            }
        }
    }
    let render = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };
    std::iter::once(render(headers))
        .chain(rows.iter().map(|row| render(&row.cells)))
        .collect()
}
