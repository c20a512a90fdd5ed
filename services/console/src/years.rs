use chrono::NaiveDate;
use clap::{Args, Subcommand};
use school_desk::api::school_years::SortField;
use school_desk::domain::{SchoolYear, SchoolYearStatus};
use school_desk::export::FileSink;
use school_desk::screen::{ListPhase, SchoolYearScreen, StatusFilter};
use school_desk::AppError;

use crate::app::{parse_date, parse_format, parse_status, Context};

#[derive(Subcommand, Debug)]
pub(crate) enum YearCommand {
    /// List school years for the selected school
    List(ListArgs),
    /// Show one school year in full
    Show {
        /// School year id
        id: String,
        /// Also resolve the record if it is soft-deleted
        #[arg(long)]
        include_deleted: bool,
    },
    /// Create a school year
    Create(CreateArgs),
    /// Edit a school year
    Edit(EditArgs),
    /// Soft-delete a school year
    Delete {
        /// School year id
        id: String,
    },
    /// Restore a soft-deleted school year
    Restore {
        /// School year id
        id: String,
    },
    /// Make a school year the tenant default
    SetDefault {
        /// School year id
        id: String,
    },
    /// Move a school year to Active
    Activate {
        /// School year id
        id: String,
    },
    /// Move a school year to Archived
    Archive {
        /// School year id
        id: String,
    },
    /// Set the status of several school years at once
    BulkStatus {
        /// Target status (draft, active, archived)
        #[arg(value_parser = parse_status)]
        status: SchoolYearStatus,
        /// School year ids
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Soft-delete several school years at once
    BulkDelete {
        /// School year ids
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Export school years to a file
    Export(ExportArgs),
    /// Every school year for a school, with its aggregate counts
    Overview {
        /// Tenant id; defaults to the selected school
        id: Option<String>,
    },
    /// Aggregate counts for the selected school
    Stats,
    /// Select the working school year for later commands
    Select {
        /// School year id
        id: String,
    },
}

#[derive(Args, Debug, Default)]
pub(crate) struct ListArgs {
    /// Name or code fragment to search for
    #[arg(long)]
    search: Option<String>,
    /// Restrict to one status (draft, active, archived)
    #[arg(long, value_parser = parse_status)]
    status: Option<SchoolYearStatus>,
    /// Include soft-deleted records
    #[arg(long)]
    show_deleted: bool,
    /// Sort column (name, code, start, end, status)
    #[arg(long, value_parser = parse_sort)]
    sort: Option<SortField>,
    /// Reverse the sort direction
    #[arg(long)]
    descending: bool,
    /// Page number, starting at 1
    #[arg(long, default_value_t = 1)]
    page: u32,
    /// Page size
    #[arg(long, default_value_t = 20)]
    limit: u32,
}

#[derive(Args, Debug)]
pub(crate) struct CreateArgs {
    /// Display name, e.g. "2025-2026"
    #[arg(long)]
    name: String,
    /// Short unique code, e.g. "SY-2526"
    #[arg(long)]
    code: String,
    /// First day (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    start: NaiveDate,
    /// Last day (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    end: NaiveDate,
    /// Initial status (draft, active, archived); server defaults to draft
    #[arg(long, value_parser = parse_status)]
    status: Option<SchoolYearStatus>,
    /// Make this the tenant default
    #[arg(long)]
    default: bool,
    /// Free-form description
    #[arg(long)]
    description: Option<String>,
}

#[derive(Args, Debug)]
pub(crate) struct EditArgs {
    /// School year id
    id: String,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    code: Option<String>,
    #[arg(long, value_parser = parse_date)]
    start: Option<NaiveDate>,
    #[arg(long, value_parser = parse_date)]
    end: Option<NaiveDate>,
    #[arg(long, value_parser = parse_status)]
    status: Option<SchoolYearStatus>,
    #[arg(long)]
    default: Option<bool>,
    #[arg(long)]
    description: Option<String>,
}

#[derive(Args, Debug)]
pub(crate) struct ExportArgs {
    /// Output format (csv, xlsx)
    #[arg(long, default_value = "csv", value_parser = parse_format)]
    format: school_desk::export::ExportFormat,
    /// Include created/updated/deleted audit columns
    #[arg(long)]
    audit: bool,
    /// Include soft-deleted records
    #[arg(long)]
    include_deleted: bool,
    /// Directory the file is written into
    #[arg(long, default_value = ".")]
    out: std::path::PathBuf,
}

pub(crate) async fn run(ctx: &Context, command: YearCommand) -> Result<(), AppError> {
    match command {
        YearCommand::List(args) => list(ctx, args).await,
        YearCommand::Show {
            id,
            include_deleted,
        } => show(ctx, &id, include_deleted).await,
        YearCommand::Create(args) => create(ctx, args).await,
        YearCommand::Edit(args) => edit(ctx, args).await,
        YearCommand::Delete { id } => confirm(ctx, ConfirmKind::Delete, &id).await,
        YearCommand::Restore { id } => confirm(ctx, ConfirmKind::Restore, &id).await,
        YearCommand::SetDefault { id } => row_action(ctx, RowKind::SetDefault, &id).await,
        YearCommand::Activate { id } => row_action(ctx, RowKind::Activate, &id).await,
        YearCommand::Archive { id } => row_action(ctx, RowKind::Archive, &id).await,
        YearCommand::BulkStatus { status, ids } => bulk_status(ctx, status, ids).await,
        YearCommand::BulkDelete { ids } => bulk_delete(ctx, ids).await,
        YearCommand::Export(args) => export(ctx, args).await,
        YearCommand::Overview { id } => overview(ctx, id).await,
        YearCommand::Stats => stats(ctx).await,
        YearCommand::Select { id } => select(ctx, &id).await,
    }
}

fn apply_list_args(screen: &mut SchoolYearScreen, args: &ListArgs) {
    if let Some(search) = &args.search {
        screen.filter.search = search.clone();
    }
    if let Some(status) = args.status {
        screen.filter.status = StatusFilter::Only(status);
    }
    screen.filter.show_deleted = args.show_deleted;
    if let Some(field) = args.sort {
        screen.sort.field = field;
    }
    if args.descending {
        screen.sort.direction = screen.sort.direction.flipped();
    }
    screen.page = args.page;
    screen.page_size = args.limit;
}

async fn list(ctx: &Context, args: ListArgs) -> Result<(), AppError> {
    let mut screen = ctx.screen();
    apply_list_args(&mut screen, &args);
    screen.load().await;
    match &screen.phase {
        ListPhase::Idle => {
            println!("Sign in and select a school first");
            return Ok(());
        }
        ListPhase::Failed(message) => {
            println!("Could not load school years: {message}");
            return Ok(());
        }
        _ => {}
    }

    let stats = screen.stats();
    println!(
        "School years: {} total | {} draft | {} active | {} archived | {} deleted | default: {}",
        stats.total,
        stats.draft,
        stats.active,
        stats.archived,
        stats.deleted,
        stats.default_display()
    );

    if let Some(meta) = screen.meta() {
        println!("Page {}/{} ({} records)", meta.page, meta.total_pages, meta.total);
    }
    for year in screen.records() {
        println!("{}", render_row(year));
    }
    if screen.records().is_empty() {
        println!("(no school years match)");
    }
    Ok(())
}

async fn show(ctx: &Context, id: &str, include_deleted: bool) -> Result<(), AppError> {
    let year = ctx.years.detail(id, include_deleted).await?;
    println!("{} ({})", year.name, year.code);
    println!("- id: {}", year.id);
    println!("- window: {} -> {}", year.start_date, year.end_date);
    println!("- status: {}", year.status.label());
    println!("- default: {}", if year.is_default { "yes" } else { "no" });
    if let Some(description) = &year.description {
        println!("- description: {description}");
    }
    if let Some(start) = year.enrollment_start {
        println!("- enrollment opens: {start}");
    }
    if let Some(end) = year.enrollment_end {
        println!("- enrollment closes: {end}");
    }
    if let Some(deadline) = year.grading_deadline {
        println!("- grading deadline: {deadline}");
    }
    if let Some(date) = year.graduation_date {
        println!("- graduation: {date}");
    }
    println!(
        "- usage: {} students, {} staff, {} classes, {} terms",
        year.student_count, year.staff_count, year.class_count, year.term_count
    );
    if let Some(deleted_at) = year.deleted_at {
        println!("- deleted at: {deleted_at}");
    }
    Ok(())
}

async fn create(ctx: &Context, args: CreateArgs) -> Result<(), AppError> {
    let mut screen = ctx.screen();
    screen.open_create();
    if let Some(form) = screen.form_mut() {
        form.name = args.name;
        form.code = args.code;
        form.start_date = Some(args.start);
        form.end_date = Some(args.end);
        form.status = args.status;
        form.is_default = args.default;
        form.description = args.description.unwrap_or_default();
    }
    screen.submit_create().await;
    report_dialog(&screen);
    Ok(())
}

async fn edit(ctx: &Context, args: EditArgs) -> Result<(), AppError> {
    let mut screen = ctx.screen();
    screen.load().await;
    screen.open_edit(&args.id);
    if screen.dialog.is_none() {
        println!("School year {} is not on the current page", args.id);
        return Ok(());
    }
    if let Some(form) = screen.form_mut() {
        if let Some(name) = args.name {
            form.name = name;
        }
        if let Some(code) = args.code {
            form.code = code;
        }
        if let Some(start) = args.start {
            form.start_date = Some(start);
        }
        if let Some(end) = args.end {
            form.end_date = Some(end);
        }
        if let Some(status) = args.status {
            form.status = Some(status);
        }
        if let Some(default) = args.default {
            form.is_default = default;
        }
        if let Some(description) = args.description {
            form.description = description;
        }
    }
    screen.submit_edit().await;
    report_dialog(&screen);
    Ok(())
}

enum ConfirmKind {
    Delete,
    Restore,
}

async fn confirm(ctx: &Context, kind: ConfirmKind, id: &str) -> Result<(), AppError> {
    let mut screen = ctx.screen();
    match kind {
        ConfirmKind::Delete => {
            screen.open_delete(id);
            screen.confirm_delete().await;
        }
        ConfirmKind::Restore => {
            screen.open_restore(id);
            screen.confirm_restore().await;
        }
    }
    report_dialog(&screen);
    Ok(())
}

enum RowKind {
    SetDefault,
    Activate,
    Archive,
}

async fn row_action(ctx: &Context, kind: RowKind, id: &str) -> Result<(), AppError> {
    let mut screen = ctx.screen();
    match kind {
        RowKind::SetDefault => screen.set_default(id).await,
        RowKind::Activate => screen.activate(id).await,
        RowKind::Archive => screen.archive(id).await,
    }
    Ok(())
}

async fn bulk_status(
    ctx: &Context,
    status: SchoolYearStatus,
    ids: Vec<String>,
) -> Result<(), AppError> {
    let mut screen = ctx.screen();
    screen
        .selection
        .select_all(ids.iter().map(String::as_str));
    screen.open_bulk_status(status);
    screen.confirm_bulk_status().await;
    report_dialog(&screen);
    Ok(())
}

async fn bulk_delete(ctx: &Context, ids: Vec<String>) -> Result<(), AppError> {
    let mut screen = ctx.screen();
    screen
        .selection
        .select_all(ids.iter().map(String::as_str));
    screen.open_bulk_delete();
    screen.confirm_bulk_delete().await;
    report_dialog(&screen);
    Ok(())
}

async fn export(ctx: &Context, args: ExportArgs) -> Result<(), AppError> {
    let mut screen = ctx.screen();
    screen.load().await;
    if let ListPhase::Failed(message) = &screen.phase {
        println!("Could not load school years: {message}");
        return Ok(());
    }

    screen.open_export();
    if let Some(options) = screen.export_options_mut() {
        options.format = args.format;
        options.include_audit = args.audit;
        options.include_deleted = args.include_deleted;
    }
    let sink = FileSink::new(args.out);
    screen.run_export(&sink).await;
    report_dialog(&screen);
    Ok(())
}

async fn overview(ctx: &Context, id: Option<String>) -> Result<(), AppError> {
    let tenant_id = match id.or_else(|| ctx.store.selected_tenant().map(|tenant| tenant.id)) {
        Some(id) => id,
        None => {
            println!("No school selected; pass an id or run `tenants select` first");
            return Ok(());
        }
    };

    let overview = ctx.years.tenant_years(&tenant_id).await?;
    for year in &overview.data {
        println!("{}", render_row(year));
    }
    if overview.data.is_empty() {
        println!("(no school years)");
    }
    if let Some(stats) = &overview.statistics {
        println!(
            "{} total | {} draft | {} active | {} archived | {} deleted",
            stats.total,
            stats.by_status.draft,
            stats.by_status.active,
            stats.by_status.archived,
            stats.deleted
        );
    }
    Ok(())
}

async fn stats(ctx: &Context) -> Result<(), AppError> {
    let tenant = ctx.store.selected_tenant();
    let stats = ctx.years.statistics(tenant.as_ref().map(|t| t.id.as_str())).await?;
    println!("Total: {}", stats.total);
    println!("- draft: {}", stats.by_status.draft);
    println!("- active: {}", stats.by_status.active);
    println!("- archived: {}", stats.by_status.archived);
    println!("- deleted: {}", stats.deleted);
    Ok(())
}

async fn select(ctx: &Context, id: &str) -> Result<(), AppError> {
    let year = ctx.years.detail(id, false).await?;
    ctx.store.set_selected_year(Some(year.to_ref()));
    println!("Selected year: {} ({})", year.name, year.id);
    Ok(())
}

fn render_row(year: &SchoolYear) -> String {
    let default_marker = if year.is_default { " [default]" } else { "" };
    let deleted_marker = if year.is_deleted() { " [deleted]" } else { "" };
    format!(
        "- {} | {} ({}) | {} -> {} | {}{}{}",
        year.id,
        year.name,
        year.code,
        year.start_date,
        year.end_date,
        year.status.label(),
        default_marker,
        deleted_marker
    )
}

fn parse_sort(value: &str) -> Result<SortField, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "name" => Ok(SortField::Name),
        "code" => Ok(SortField::Code),
        "start" | "start-date" => Ok(SortField::StartDate),
        "end" | "end-date" => Ok(SortField::EndDate),
        "status" => Ok(SortField::Status),
        other => Err(format!(
            "'{other}' is not a sort column (expected name, code, start, end, or status)"
        )),
    }
}

/// Prints whatever a still-open dialog is holding: a submit error or inline
/// field errors from local validation.
fn report_dialog(screen: &SchoolYearScreen) {
    let Some(dialog) = &screen.dialog else {
        return;
    };
    if let Some(error) = &dialog.error {
        println!("Error: {error}");
    }
    for field_error in &dialog.field_errors {
        println!("- {}: {}", field_error.field, field_error.message);
    }
}
