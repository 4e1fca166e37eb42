/*
 * Command-line front end. Parses arguments, wires the store, exporter and
 * settings together, and renders results as tables. All data rules live in
 * `core` and `app_logic`; this module only translates between them and text.
 */
use crate::app_logic::{ApplicationView, Dashboard, IpoTrackerLogic, LogicError};
use crate::core::format::{format_display_date, format_inr, local_offset};
use crate::core::path_utils::APP_NAME;
use crate::core::{
    ApplicationFilter, ApplicationForm, ConfigManagerOperations, CoreExporter, CoreIpoStore,
    FileKeyValueStorage, IpoName, Settings, SortDirection, SortField,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tabled::builder::Builder;
use tabled::settings::object::Columns;
use tabled::settings::{Alignment, Style};

#[derive(Debug, Parser)]
#[command(name = "ipo-tracker", about = "Track IPO share applications", long_about = None)]
pub(crate) struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub(crate) verbose: u8,

    /// Directory holding the record collections (overrides settings)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Manage the IPO names applications can refer to
    #[command(subcommand)]
    Names(NamesCommand),
    /// Record, list and delete applications
    #[command(subcommand)]
    Apps(AppsCommand),
    /// Totals, per-IPO summaries and recent activity
    Dashboard(DashboardArgs),
    /// Write the (filtered) applications to a CSV file
    Export(ExportArgs),
    /// Show or change settings
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Debug, Subcommand)]
enum NamesCommand {
    List,
    Add { name: String },
    Delete { id: String },
}

#[derive(Debug, Subcommand)]
enum AppsCommand {
    List(ListArgs),
    Add(AddApplicationArgs),
    Delete { id: String },
}

#[derive(Debug, Args)]
struct FilterArgs {
    /// Case-insensitive match on PAN, application number or IPO name
    #[arg(long, default_value = "")]
    search: String,

    /// Only applications for exactly this IPO name ("all" for every IPO)
    #[arg(long, default_value = "")]
    ipo: String,
}

impl FilterArgs {
    fn to_filter(&self) -> ApplicationFilter {
        ApplicationFilter::new(self.search.clone(), self.ipo.clone())
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SortFieldArg {
    Timestamp,
    IpoName,
    Pan,
    IpoPrice,
    ApplicationNumber,
}

impl From<SortFieldArg> for SortField {
    fn from(arg: SortFieldArg) -> Self {
        match arg {
            SortFieldArg::Timestamp => SortField::Timestamp,
            SortFieldArg::IpoName => SortField::IpoName,
            SortFieldArg::Pan => SortField::Pan,
            SortFieldArg::IpoPrice => SortField::IpoPrice,
            SortFieldArg::ApplicationNumber => SortField::ApplicationNumber,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DirectionArg {
    Asc,
    Desc,
}

impl From<DirectionArg> for SortDirection {
    fn from(arg: DirectionArg) -> Self {
        match arg {
            DirectionArg::Asc => SortDirection::Ascending,
            DirectionArg::Desc => SortDirection::Descending,
        }
    }
}

#[derive(Debug, Args)]
struct ListArgs {
    #[command(flatten)]
    filter: FilterArgs,

    /// Column to sort by, as if its header were clicked once (default: newest first)
    #[arg(long, value_enum)]
    sort: Option<SortFieldArg>,

    #[arg(long, value_enum)]
    direction: Option<DirectionArg>,
}

#[derive(Debug, Args)]
struct AddApplicationArgs {
    #[arg(long, default_value = "")]
    applicant_name: String,
    #[arg(long, default_value = "")]
    application_number: String,
    #[arg(long, default_value = "")]
    pan: String,
    #[arg(long, default_value = "")]
    ipo_name: String,
    #[arg(long, default_value = "")]
    ipo_price: String,
    /// Fixed price paid in addition to or instead of the IPO price
    #[arg(long, default_value = "")]
    other_price: String,
}

impl From<AddApplicationArgs> for ApplicationForm {
    fn from(args: AddApplicationArgs) -> Self {
        ApplicationForm {
            applicant_name: args.applicant_name,
            application_number: args.application_number,
            pan: args.pan,
            ipo_name: args.ipo_name,
            ipo_price: args.ipo_price,
            other_price: args.other_price,
        }
    }
}

#[derive(Debug, Args)]
struct DashboardArgs {
    /// Number of recent applications to show (default from settings)
    #[arg(long)]
    recent: Option<usize>,
}

#[derive(Debug, Args)]
struct ExportArgs {
    #[command(flatten)]
    filter: FilterArgs,

    /// Target directory (default from settings, else the current directory)
    #[arg(long)]
    out_dir: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum ConfigCommand {
    Show,
    Set(SetConfigArgs),
}

#[derive(Debug, Args)]
struct SetConfigArgs {
    #[arg(long)]
    data_dir: Option<PathBuf>,
    #[arg(long)]
    export_dir: Option<PathBuf>,
    #[arg(long)]
    recent_limit: Option<usize>,
}

impl Cli {
    pub(crate) fn run(self, config_manager: &dyn ConfigManagerOperations) -> Result<(), String> {
        let settings = config_manager.load_settings().unwrap_or_else(|e| {
            log::warn!("Cli: Could not load settings, using defaults: {e}");
            Settings::default()
        });

        let storage = match self.data_dir.clone().or_else(|| settings.data_dir.clone()) {
            Some(dir) => FileKeyValueStorage::new(Some(dir)),
            None => FileKeyValueStorage::for_app(APP_NAME),
        };
        log::debug!("Cli: Using data directory {:?}", storage.dir());
        let data_dir = storage.dir().map(|dir| dir.to_path_buf());
        let mut logic = IpoTrackerLogic::new(
            Arc::new(CoreIpoStore::new(storage)),
            Arc::new(CoreExporter::new()),
        );

        match self.command {
            Commands::Names(command) => run_names(&logic, command),
            Commands::Apps(command) => run_apps(&mut logic, command),
            Commands::Dashboard(args) => {
                let limit = args.recent.unwrap_or(settings.recent_limit);
                print!("{}", render_dashboard(&logic.dashboard(limit)));
                Ok(())
            }
            Commands::Export(args) => {
                let target = args
                    .out_dir
                    .or_else(|| settings.export_dir.clone())
                    .unwrap_or_else(|| PathBuf::from("."));
                let path = logic
                    .export(&args.filter.to_filter(), &target)
                    .map_err(describe_error)?;
                println!("Exported to {}", path.display());
                Ok(())
            }
            Commands::Config(command) => run_config(config_manager, settings, data_dir, command),
        }
    }
}

fn describe_error(error: LogicError) -> String {
    match error {
        LogicError::Validation(errors) => errors
            .messages()
            .into_iter()
            .map(|(field, message)| format!("{field}: {message}"))
            .collect::<Vec<_>>()
            .join("\n"),
        other => other.to_string(),
    }
}

fn run_names(logic: &IpoTrackerLogic, command: NamesCommand) -> Result<(), String> {
    match command {
        NamesCommand::List => {
            print!("{}", render_names(&logic.ipo_names()));
        }
        NamesCommand::Add { name } => {
            let added = logic.submit_ipo_name(&name).map_err(describe_error)?;
            println!("Added IPO name '{}' ({})", added.name, added.id);
        }
        NamesCommand::Delete { id } => {
            let orphaned = logic.remove_ipo_name(&id).map_err(describe_error)?;
            if orphaned > 0 {
                println!("{orphaned} application(s) still refer to the removed name.");
            }
        }
    }
    Ok(())
}

fn run_apps(logic: &mut IpoTrackerLogic, command: AppsCommand) -> Result<(), String> {
    match command {
        AppsCommand::List(args) => {
            if let Some(field) = args.sort {
                logic.select_sort_field(field.into());
            }
            if let Some(direction) = args.direction {
                logic.set_sort_direction(direction.into());
            }
            log::debug!("Cli: Listing applications with {:?}", logic.sort_state());
            let view = logic.application_view(&args.filter.to_filter());
            print!("{}", render_applications(&view));
        }
        AppsCommand::Add(args) => {
            let added = logic
                .submit_application(&ApplicationForm::from(args))
                .map_err(describe_error)?;
            println!(
                "Added application {} for {} ({})",
                added.application_number, added.ipo_name, added.id
            );
        }
        AppsCommand::Delete { id } => {
            logic.remove_application(&id).map_err(describe_error)?;
        }
    }
    Ok(())
}

fn run_config(
    config_manager: &dyn ConfigManagerOperations,
    mut settings: Settings,
    data_dir: Option<PathBuf>,
    command: ConfigCommand,
) -> Result<(), String> {
    match command {
        ConfigCommand::Show => {
            let show = |path: Option<PathBuf>| {
                path.map_or_else(|| "(none)".to_string(), |p| p.display().to_string())
            };
            println!("config dir:   {}", show(config_manager.config_dir()));
            println!("data dir:     {}", show(data_dir));
            println!("export dir:   {}", show(settings.export_dir.clone()));
            println!("recent limit: {}", settings.recent_limit);
        }
        ConfigCommand::Set(args) => {
            if let Some(dir) = args.data_dir {
                settings.data_dir = Some(dir);
            }
            if let Some(dir) = args.export_dir {
                settings.export_dir = Some(dir);
            }
            if let Some(limit) = args.recent_limit {
                settings.recent_limit = limit;
            }
            config_manager
                .save_settings(&settings)
                .map_err(|e| format!("failed to save settings: {e}"))?;
            println!("Settings saved.");
        }
    }
    Ok(())
}

fn render_table(builder: Builder, right_aligned: Option<Columns<std::ops::Range<usize>>>) -> String {
    let mut table = builder.build();
    table.with(Style::modern_rounded());
    if let Some(columns) = right_aligned {
        table.modify(columns, Alignment::right());
    }
    format!("{table}\n")
}

pub(crate) fn render_names(names: &[IpoName]) -> String {
    if names.is_empty() {
        return "No IPO names yet.\n".to_string();
    }
    let offset = local_offset();
    let mut builder = Builder::default();
    builder.push_record(["ID", "Name", "Created"]);
    for name in names {
        builder.push_record([
            name.id.clone(),
            name.name.clone(),
            format_display_date(name.created_at, offset),
        ]);
    }
    render_table(builder, None)
}

pub(crate) fn render_applications(view: &ApplicationView) -> String {
    if view.rows.is_empty() {
        return "No applications found.\n".to_string();
    }
    let offset = local_offset();
    let mut builder = Builder::default();
    builder.push_record([
        "ID",
        "Application No.",
        "PAN",
        "IPO",
        "IPO Price",
        "Fixed Price",
        "Total",
        "Applied",
    ]);
    for application in &view.rows {
        builder.push_record([
            application.id.clone(),
            application.application_number.clone(),
            application.pan.clone(),
            application.ipo_name.clone(),
            format_inr(application.ipo_price),
            application
                .other_price
                .map_or_else(|| "-".to_string(), format_inr),
            format_inr(application.total_amount()),
            format_display_date(application.timestamp, offset),
        ]);
    }
    let suffix = if view.rows.len() == 1 { "" } else { "s" };
    format!(
        "{}Showing {} application{suffix}, total {}\n",
        render_table(builder, Some(Columns::new(4..7))),
        view.rows.len(),
        format_inr(view.total_amount)
    )
}

pub(crate) fn render_dashboard(dashboard: &Dashboard) -> String {
    let summary = &dashboard.summary;
    let mut out = format!(
        "Applications: {}\nTotal investment: {}\nIPOs applied: {}\nIPO names: {}\n\n",
        summary.total_applications,
        format_inr(summary.total_investment),
        summary.unique_ipos,
        summary.registered_ipo_names
    );

    if dashboard.ipo_summaries.is_empty() {
        out.push_str("No IPO names yet.\n");
    } else {
        let mut builder = Builder::default();
        builder.push_record(["IPO", "Applications", "Total"]);
        for ipo in &dashboard.ipo_summaries {
            let total = if ipo.total_amount.is_zero() {
                "-".to_string()
            } else {
                format_inr(ipo.total_amount)
            };
            builder.push_record([ipo.name.clone(), ipo.application_count.to_string(), total]);
        }
        out.push_str(&render_table(builder, Some(Columns::new(1..3))));
    }

    out.push_str("\nRecent applications:\n");
    if dashboard.recent.is_empty() {
        out.push_str("None yet.\n");
    } else {
        let offset = local_offset();
        for application in &dashboard.recent {
            out.push_str(&format!(
                "  {}  {}  {}  {}\n",
                format_display_date(application.timestamp, offset),
                application.ipo_name,
                application.pan,
                format_inr(application.total_amount())
            ));
        }
    }
    out
}
