use clap::{Parser, Subcommand};
use school_desk::config::AppConfig;
use school_desk::AppError;

use crate::app::Context;
use crate::{auth, tenants, years};

#[derive(Parser, Debug)]
#[command(
    name = "school-desk",
    about = "Manage school years for a tenant from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in and persist the session for later commands
    SignIn(auth::SignInArgs),
    /// Create an account
    SignUp(auth::SignUpArgs),
    /// Confirm an e-mail address with the token from the verification mail
    VerifyEmail {
        /// Verification token
        token: String,
    },
    /// Request a password-reset e-mail
    RequestReset {
        /// Account e-mail address
        email: String,
    },
    /// Set a new password with the token from the reset e-mail
    ResetPassword {
        /// Reset token
        #[arg(long)]
        token: String,
        /// New password
        #[arg(long)]
        password: String,
    },
    /// Sign out and discard the persisted session
    SignOut,
    /// Show the signed-in user
    Whoami,
    /// Join the product waitlist
    Waitlist(auth::WaitlistArgs),
    /// Browse and select schools (tenants)
    Tenants {
        #[command(subcommand)]
        command: tenants::TenantCommand,
    },
    /// Manage school years for the selected tenant
    Years {
        #[command(subcommand)]
        command: years::YearCommand,
    },
}

pub(crate) async fn run(config: AppConfig) -> Result<(), AppError> {
    let cli = Cli::parse();
    let ctx = Context::new(&config)?;

    let result = match cli.command {
        Command::SignIn(args) => auth::sign_in(&ctx, args).await,
        Command::SignUp(args) => auth::sign_up(&ctx, args).await,
        Command::VerifyEmail { token } => auth::verify_email(&ctx, &token).await,
        Command::RequestReset { email } => auth::request_password_reset(&ctx, &email).await,
        Command::ResetPassword { token, password } => {
            auth::reset_password(&ctx, token, password).await
        }
        Command::SignOut => auth::sign_out(&ctx).await,
        Command::Whoami => auth::whoami(&ctx).await,
        Command::Waitlist(args) => auth::join_waitlist(&ctx, args).await,
        Command::Tenants { command } => tenants::run(&ctx, command).await,
        Command::Years { command } => years::run(&ctx, command).await,
    };

    ctx.flush_notices();
    result
}
