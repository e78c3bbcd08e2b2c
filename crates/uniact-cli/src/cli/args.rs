use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "uniact",
    version,
    about = "UniAct activity portal client: sign in, inspect the session, check route access"
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// API base URL
    #[arg(long, global = true, env = "UNIACT_API_URL")]
    pub api_url: Option<String>,

    /// Directory holding the persisted session
    #[arg(long, global = true, env = "UNIACT_SESSION_DIR")]
    pub session_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Sign in with a student ID and password
    Login(LoginArgs),
    /// End the current session
    Logout,
    /// Show the signed-in user
    Whoami(WhoamiArgs),
    /// Decide whether the current session may view a page
    Check(CheckArgs),
    /// Authenticated GET against the API, printed as JSON
    Get(GetArgs),
    /// List the route table
    Routes,
    /// Renew the access token with the stored refresh token
    Refresh,
}

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// 8-digit student ID
    #[arg(long, short = 's')]
    pub student_id: String,

    /// Password (prompted when omitted)
    #[arg(long, env = "UNIACT_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

#[derive(Args, Debug)]
pub struct WhoamiArgs {
    /// Print the identity as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Page path, e.g. /admin/users
    pub path: String,
}

#[derive(Args, Debug)]
pub struct GetArgs {
    /// API path relative to the base URL, e.g. /activities
    pub path: String,
}
