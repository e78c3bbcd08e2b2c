//! `uniact get` - authenticated GET against the API.

use anyhow::Context;

use super::super::args::{GetArgs, GlobalArgs};
use crate::exit_codes;

pub async fn run(args: GetArgs, global: &GlobalArgs) -> anyhow::Result<i32> {
    let mut ctx = super::open_context(global)?;
    match ctx.get_json(&args.path).await {
        Ok(body) => {
            let json = serde_json::to_string_pretty(&body).context("failed to encode response")?;
            println!("{json}");
            Ok(exit_codes::SUCCESS)
        }
        Err(e) => {
            eprintln!("error: {e}");
            Ok(e.exit_code())
        }
    }
}
