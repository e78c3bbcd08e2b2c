//! `uniact login` - sign in and persist the session.

use anyhow::Context;
use dialoguer::Password;
use uniact_auth::{home_for, ActionResult, AuthAction, Credentials};

use super::super::args::{GlobalArgs, LoginArgs};
use crate::exit_codes;

pub async fn run(args: LoginArgs, global: &GlobalArgs) -> anyhow::Result<i32> {
    let password = match args.password {
        Some(password) => password,
        None => Password::new()
            .with_prompt("Password")
            .interact()
            .context("failed to read password")?,
    };

    let credentials = Credentials::new(args.student_id, password);
    if let Err(e) = credentials.validate() {
        eprintln!("error: {e}");
        return Ok(e.exit_code());
    }

    let mut ctx = super::open_context(global)?;
    match ctx.dispatch(AuthAction::Login(credentials)).await {
        ActionResult::LoggedIn(identity) => {
            println!(
                "Logged in as {} ({})",
                identity.display_name(),
                identity.role
            );
            println!("Home: {}", home_for(Some(identity.role)));
            Ok(exit_codes::SUCCESS)
        }
        ActionResult::LoginFailed(message) => {
            eprintln!("Login failed: {message}");
            Ok(exit_codes::COMMAND_FAILED)
        }
        ActionResult::LoggedOut => Ok(exit_codes::SUCCESS),
    }
}
