//! `uniact check` and `uniact routes`.

use uniact_auth::{GuardDecision, ROUTES};

use super::super::args::{CheckArgs, GlobalArgs};
use crate::exit_codes;

pub fn run(args: CheckArgs, global: &GlobalArgs) -> anyhow::Result<i32> {
    let ctx = super::open_context(global)?;
    let decision = ctx.guard(&args.path);
    println!("{decision}");

    Ok(match decision {
        GuardDecision::Render => exit_codes::SUCCESS,
        GuardDecision::Redirect(_) => exit_codes::COMMAND_FAILED,
    })
}

pub fn routes() -> i32 {
    let width = ROUTES.iter().map(|r| r.path.len()).max().unwrap_or(0);
    for rule in ROUTES {
        println!("{:<width$}  {}", rule.path, rule.access, width = width);
    }
    exit_codes::SUCCESS
}
