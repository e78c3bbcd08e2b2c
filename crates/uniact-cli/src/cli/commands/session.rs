//! Session inspection and teardown: `whoami`, `logout`, `refresh`.

use anyhow::Context;
use uniact_auth::{ActionResult, AuthAction};

use super::super::args::{GlobalArgs, WhoamiArgs};
use crate::exit_codes;

pub fn whoami(args: WhoamiArgs, global: &GlobalArgs) -> anyhow::Result<i32> {
    let ctx = super::open_context(global)?;
    let Some(identity) = ctx.identity() else {
        eprintln!("Not logged in");
        return Ok(exit_codes::UNAUTHORIZED);
    };

    if args.json {
        let json = serde_json::to_string_pretty(identity).context("failed to encode identity")?;
        println!("{json}");
    } else {
        println!("{}", identity.display_name());
        println!("  id:         {}", identity.id);
        println!("  student id: {}", identity.student_id);
        println!("  role:       {}", identity.role);
        if let Some(email) = &identity.email {
            println!("  email:      {email}");
        }
    }
    Ok(exit_codes::SUCCESS)
}

pub async fn logout(global: &GlobalArgs) -> anyhow::Result<i32> {
    let mut ctx = super::open_context(global)?;
    if !ctx.is_authenticated() {
        println!("Not logged in");
        return Ok(exit_codes::SUCCESS);
    }

    match ctx.dispatch(AuthAction::Logout).await {
        ActionResult::LoggedOut => println!("Logged out"),
        other => tracing::warn!(?other, "unexpected logout result"),
    }
    Ok(exit_codes::SUCCESS)
}

pub async fn refresh(global: &GlobalArgs) -> anyhow::Result<i32> {
    let mut ctx = super::open_context(global)?;
    match ctx.refresh().await {
        Ok(()) => {
            println!("Token refreshed");
            Ok(exit_codes::SUCCESS)
        }
        Err(e) => {
            eprintln!("error: {e}");
            Ok(e.exit_code())
        }
    }
}
