use clap::Args;
use school_desk::api::auth::{ResetPasswordRequest, SignInRequest, SignUpRequest};
use school_desk::api::waitlist::WaitlistEntry;
use school_desk::AppError;

use crate::app::Context;

#[derive(Args, Debug)]
pub(crate) struct SignInArgs {
    /// Account e-mail address
    #[arg(long)]
    pub(crate) email: String,
    /// Account password
    #[arg(long)]
    pub(crate) password: String,
}

#[derive(Args, Debug)]
pub(crate) struct SignUpArgs {
    /// Account e-mail address
    #[arg(long)]
    pub(crate) email: String,
    /// Account password
    #[arg(long)]
    pub(crate) password: String,
    /// Name shown to other users
    #[arg(long)]
    pub(crate) display_name: String,
}

#[derive(Args, Debug)]
pub(crate) struct WaitlistArgs {
    /// Contact e-mail address
    #[arg(long)]
    pub(crate) email: String,
    /// Name of the school
    #[arg(long)]
    pub(crate) school: String,
}

pub(crate) async fn sign_in(ctx: &Context, args: SignInArgs) -> Result<(), AppError> {
    let request = SignInRequest {
        email: args.email,
        password: args.password,
    };
    let session = ctx.auth.sign_in(&request).await?;
    ctx.save_session(&session);
    println!(
        "Signed in as {} <{}> ({})",
        session.user.display_name,
        session.user.email,
        session.user.role.label()
    );
    Ok(())
}

pub(crate) async fn sign_up(ctx: &Context, args: SignUpArgs) -> Result<(), AppError> {
    let request = SignUpRequest {
        email: args.email,
        password: args.password,
        display_name: args.display_name,
    };
    let user = ctx.auth.sign_up(&request).await?;
    println!("Account created for {} <{}>", user.display_name, user.email);
    if !user.email_verified {
        println!("Check your inbox for the verification e-mail before signing in");
    }
    Ok(())
}

pub(crate) async fn verify_email(ctx: &Context, token: &str) -> Result<(), AppError> {
    ctx.auth.verify_email(token).await?;
    println!("E-mail verified");
    Ok(())
}

pub(crate) async fn request_password_reset(ctx: &Context, email: &str) -> Result<(), AppError> {
    ctx.auth.request_password_reset(email).await?;
    println!("Reset instructions sent to {email}");
    Ok(())
}

pub(crate) async fn reset_password(
    ctx: &Context,
    token: String,
    new_password: String,
) -> Result<(), AppError> {
    let request = ResetPasswordRequest {
        token,
        new_password,
    };
    ctx.auth.reset_password(&request).await?;
    println!("Password updated; sign in with the new password");
    Ok(())
}

pub(crate) async fn join_waitlist(ctx: &Context, args: WaitlistArgs) -> Result<(), AppError> {
    let entry = WaitlistEntry {
        email: args.email,
        school_name: args.school,
    };
    ctx.waitlist.join(&entry).await?;
    println!("Added {} to the waitlist", entry.school_name);
    Ok(())
}

pub(crate) async fn sign_out(ctx: &Context) -> Result<(), AppError> {
    // Local state goes first so a dead backend cannot keep us signed in.
    ctx.discard_session();
    if let Err(err) = ctx.auth.sign_out().await {
        tracing::warn!(error = %err, "server-side sign-out failed");
    }
    println!("Signed out");
    Ok(())
}

pub(crate) async fn whoami(ctx: &Context) -> Result<(), AppError> {
    if !ctx.session.is_authenticated() {
        println!("Not signed in");
        return Ok(());
    }
    let user = ctx.auth.me().await?;
    println!("{} <{}> ({})", user.display_name, user.email, user.role.label());
    match ctx.store.selected_tenant() {
        Some(tenant) => println!("Selected school: {} ({})", tenant.name, tenant.id),
        None => println!("Selected school: none"),
    }
    match ctx.store.selected_year() {
        Some(year) => println!("Selected year: {} ({})", year.name, year.id),
        None => println!("Selected year: none"),
    }
    Ok(())
}
