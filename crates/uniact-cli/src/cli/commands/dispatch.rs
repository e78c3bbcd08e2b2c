use super::super::args::*;

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    let global = cli.global;
    match cli.cmd {
        Command::Login(args) => super::login::run(args, &global).await,
        Command::Logout => super::session::logout(&global).await,
        Command::Whoami(args) => super::session::whoami(args, &global),
        Command::Check(args) => super::check::run(args, &global),
        Command::Get(args) => super::get::run(args, &global).await,
        Command::Routes => Ok(super::check::routes()),
        Command::Refresh => super::session::refresh(&global).await,
    }
}
