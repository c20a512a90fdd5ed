use clap::{Args, Subcommand};
use school_desk::api::tenants::{
    CreateAccessRequest, CreateTenant, ReviewAccessRequest, TenantListQuery,
};
use school_desk::domain::{AccessRequestStatus, UserRole};
use school_desk::AppError;

use crate::app::Context;

#[derive(Subcommand, Debug)]
pub(crate) enum TenantCommand {
    /// List schools visible to the signed-in user
    List(ListArgs),
    /// Select the school later commands operate on
    Select {
        /// Tenant id
        id: String,
    },
    /// Show one school
    Show {
        /// Tenant id
        id: String,
    },
    /// Register a new school
    Create(CreateArgs),
    /// Pending and reviewed access requests for a school
    Requests {
        /// Tenant id; defaults to the selected school
        id: Option<String>,
    },
    /// Ask to join a school
    Request(RequestArgs),
    /// Approve or reject an access request
    Review(ReviewArgs),
    /// Withdraw your own access request
    Cancel {
        /// Access request id
        id: String,
    },
}

#[derive(Args, Debug)]
pub(crate) struct CreateArgs {
    /// School name
    #[arg(long)]
    name: String,
    /// Short unique code
    #[arg(long)]
    code: String,
    /// Street address
    #[arg(long)]
    address: Option<String>,
}

#[derive(Args, Debug)]
pub(crate) struct RequestArgs {
    /// Tenant id; defaults to the selected school
    #[arg(long)]
    tenant: Option<String>,
    /// Role to request (admin, teacher, staff)
    #[arg(long, value_parser = parse_role)]
    role: UserRole,
    /// Message for the reviewing admin
    #[arg(long)]
    message: Option<String>,
}

#[derive(Args, Debug)]
pub(crate) struct ReviewArgs {
    /// Access request id
    id: String,
    /// Approve the request; rejects when absent
    #[arg(long)]
    approve: bool,
    /// Notes shown to the requester
    #[arg(long)]
    notes: Option<String>,
}

fn parse_role(value: &str) -> Result<UserRole, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "admin" => Ok(UserRole::Admin),
        "teacher" => Ok(UserRole::Teacher),
        "staff" => Ok(UserRole::Staff),
        other => Err(format!(
            "'{other}' is not a role (expected admin, teacher, or staff)"
        )),
    }
}

#[derive(Args, Debug)]
pub(crate) struct ListArgs {
    /// Name or code fragment to search for
    #[arg(long)]
    search: Option<String>,
    /// Page number, starting at 1
    #[arg(long, default_value_t = 1)]
    page: u32,
    /// Page size
    #[arg(long, default_value_t = 20)]
    limit: u32,
}

pub(crate) async fn run(ctx: &Context, command: TenantCommand) -> Result<(), AppError> {
    match command {
        TenantCommand::List(args) => list(ctx, args).await,
        TenantCommand::Select { id } => select(ctx, &id).await,
        TenantCommand::Show { id } => show(ctx, &id).await,
        TenantCommand::Create(args) => create(ctx, args).await,
        TenantCommand::Requests { id } => requests(ctx, id).await,
        TenantCommand::Request(args) => request(ctx, args).await,
        TenantCommand::Review(args) => review(ctx, args).await,
        TenantCommand::Cancel { id } => cancel(ctx, &id).await,
    }
}

async fn create(ctx: &Context, args: CreateArgs) -> Result<(), AppError> {
    let input = CreateTenant {
        name: args.name,
        code: args.code,
        address: args.address,
    };
    let tenant = ctx.tenants.create(&input).await?;
    println!("Created school {} ({})", tenant.name, tenant.id);
    Ok(())
}

async fn request(ctx: &Context, args: RequestArgs) -> Result<(), AppError> {
    let tenant_id = match args
        .tenant
        .or_else(|| ctx.store.selected_tenant().map(|tenant| tenant.id))
    {
        Some(id) => id,
        None => {
            println!("No school selected; pass --tenant or run `tenants select` first");
            return Ok(());
        }
    };
    let input = CreateAccessRequest {
        tenant_id,
        requested_role: args.role,
        message: args.message,
    };
    let request = ctx.tenants.submit_access_request(&input).await?;
    println!("Submitted access request {}", request.id);
    Ok(())
}

async fn review(ctx: &Context, args: ReviewArgs) -> Result<(), AppError> {
    let input = ReviewAccessRequest {
        status: if args.approve {
            AccessRequestStatus::Approved
        } else {
            AccessRequestStatus::Rejected
        },
        review_notes: args.notes,
    };
    let request = ctx.tenants.review_access_request(&args.id, &input).await?;
    println!(
        "Access request {} is now {}",
        request.id,
        request.status.label()
    );
    Ok(())
}

async fn cancel(ctx: &Context, id: &str) -> Result<(), AppError> {
    let request = ctx.tenants.cancel_access_request(id).await?;
    println!(
        "Access request {} is now {}",
        request.id,
        request.status.label()
    );
    Ok(())
}

async fn list(ctx: &Context, args: ListArgs) -> Result<(), AppError> {
    let query = TenantListQuery {
        page: Some(args.page),
        limit: Some(args.limit),
        search: args.search,
    };
    let page = ctx.tenants.list(&query).await?;

    println!(
        "Schools (page {}/{}, {} total)",
        page.meta.page, page.meta.total_pages, page.meta.total
    );
    for tenant in &page.data {
        let marker = if ctx
            .store
            .selected_tenant()
            .is_some_and(|selected| selected.id == tenant.id)
        {
            "*"
        } else {
            " "
        };
        println!(
            "{marker} {} | {} ({}) | {}",
            tenant.id,
            tenant.name,
            tenant.code,
            tenant.status.label()
        );
    }
    Ok(())
}

async fn select(ctx: &Context, id: &str) -> Result<(), AppError> {
    let tenant = ctx.tenants.get(id).await?;
    ctx.shell.switch_tenant(&ctx.store, Some(tenant.to_ref()));
    println!("Selected school: {} ({})", tenant.name, tenant.id);
    Ok(())
}

async fn show(ctx: &Context, id: &str) -> Result<(), AppError> {
    let tenant = ctx.tenants.get(id).await?;
    println!("{} ({})", tenant.name, tenant.code);
    println!("- id: {}", tenant.id);
    println!("- status: {}", tenant.status.label());
    if let Some(address) = &tenant.address {
        println!("- address: {address}");
    }
    Ok(())
}

async fn requests(ctx: &Context, id: Option<String>) -> Result<(), AppError> {
    let tenant_id = match id.or_else(|| ctx.store.selected_tenant().map(|tenant| tenant.id)) {
        Some(id) => id,
        None => {
            println!("No school selected; pass an id or run `tenants select` first");
            return Ok(());
        }
    };

    let requests = ctx.tenants.access_requests(&tenant_id).await?;
    if requests.is_empty() {
        println!("No access requests");
        return Ok(());
    }
    for request in &requests {
        println!(
            "- {} | user {} | requested {} | {}",
            request.id,
            request.user_id,
            request.requested_role.label(),
            request.status.label()
        );
        if let Some(notes) = &request.review_notes {
            println!("    notes: {notes}");
        }
    }
    Ok(())
}
