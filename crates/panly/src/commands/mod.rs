//! Command handlers.
//!
//! Each handler issues its request and leaves the response on the
//! client; `dispatch` prints it the same way for every command.

pub mod config_cmd;
mod files;
mod jobs;

use secrecy::ExposeSecret;

use panly_api::{Error as ApiError, XapiClient};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;
use crate::output;

/// Run one request command and print its result.
pub async fn dispatch(cmd: Command, client: &mut XapiClient, global: &GlobalOpts) -> Result<(), CliError> {
    let name = cmd.name();
    let url = client.api_url().to_string();
    let api = |err: ApiError| CliError::from_api(err, &url);

    match cmd {
        Command::Keygen => {
            let key = client.keygen().await.map_err(api)?;
            println!("API key: \"{}\"", key.expose_secret());
            return Ok(());
        }
        Command::Show(args) => client.show(args.xpath.as_deref()).await.map_err(api)?,
        Command::Get(args) => client.get(args.xpath.as_deref()).await.map_err(api)?,
        Command::Delete(args) => client.delete(args.xpath.as_deref()).await.map_err(api)?,
        Command::Set(args) => {
            let element = read_arg(&args.element)?;
            client.set(Some(&args.xpath), Some(&element)).await.map_err(api)?;
        }
        Command::Edit(args) => {
            let element = read_arg(&args.element)?;
            client.edit(Some(&args.xpath), Some(&element)).await.map_err(api)?;
        }
        Command::Override(args) => {
            let element = read_arg(&args.element)?;
            client
                .override_node(Some(&args.xpath), Some(&element))
                .await
                .map_err(api)?;
        }
        Command::Move(args) => client
            .move_node(Some(&args.xpath), Some(&args.r#where), args.dst.as_deref())
            .await
            .map_err(api)?,
        Command::Rename(args) => client
            .rename(Some(&args.xpath), Some(&args.newname))
            .await
            .map_err(api)?,
        Command::Clone(args) => client
            .clone_node(Some(&args.xpath), Some(&args.from), Some(&args.newname))
            .await
            .map_err(api)?,
        Command::MultiConfig(args) => {
            let element = read_arg(&args.element)?;
            client.multi_config(&element, args.strict).await.map_err(api)?;
        }
        Command::Op(args) => client
            .op(Some(&args.cmd), args.vsys.as_deref(), args.cmd_xml)
            .await
            .map_err(api)?,
        Command::UserId(args) => {
            let cmd = read_arg(&args.cmd)?;
            client.user_id(Some(&cmd), args.vsys.as_deref()).await.map_err(api)?;
        }
        Command::AdHoc(args) => client
            .ad_hoc(args.query.as_deref(), args.xpath.as_deref(), args.modify)
            .await
            .map_err(api)?,
        Command::Commit(args) => jobs::commit(client, args, global).await.map_err(api)?,
        Command::Log(args) => jobs::log(client, args).await.map_err(api)?,
        Command::Report(args) => jobs::report(client, args).await.map_err(api)?,
        Command::Wait(args) => jobs::wait(client, args).await.map_err(api)?,
        Command::Export(args) => files::export(client, args, global, &api).await?,
        Command::Import(args) => files::import(client, args, &api).await?,
        // handled in main without a connection
        Command::Config(_) | Command::Completions(_) => return Ok(()),
    }

    print_response(name, client, global);
    Ok(())
}

fn print_response(name: &str, client: &XapiClient, global: &GlobalOpts) {
    let response = client.last_response();
    if !global.quiet {
        eprintln!("{}", output::status_line(name, response, global.output));
    }
    if let Some(out) = output::render(response, global.output) {
        println!("{out}");
    }
}

/// `@path` reads the argument from a file; anything else is literal.
fn read_arg(raw: &str) -> Result<String, CliError> {
    match raw.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path).map_err(|e| CliError::io(path, e)),
        None => Ok(raw.to_owned()),
    }
}
