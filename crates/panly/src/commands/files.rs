//! export and import.

use std::path::PathBuf;

use panly_api::{Error as ApiError, ExportQuery, ImportRequest, XapiClient};

use crate::cli::{ExportArgs, GlobalOpts, ImportArgs};
use crate::error::CliError;

/// Export, saving any attachment to `--out` or its own filename.
pub async fn export(
    client: &mut XapiClient,
    args: ExportArgs,
    global: &GlobalOpts,
    api: &impl Fn(ApiError) -> CliError,
) -> Result<(), CliError> {
    let query = ExportQuery {
        category: args.category,
        from: args.from,
        to: args.to,
        extra: args.params,
    };
    client.export(&query).await.map_err(api)?;

    let Some(attachment) = client.last_response().attachment() else {
        return Ok(());
    };
    let path = match (args.out, attachment.filename.as_deref()) {
        (Some(out), _) => out,
        (None, Some(name)) => PathBuf::from(name),
        (None, None) => {
            return Err(CliError::Validation {
                message: "attachment has no filename; pass --out".into(),
            });
        }
    };
    std::fs::write(&path, &attachment.content).map_err(|e| CliError::io(path.display(), e))?;
    if !global.quiet {
        eprintln!("saved {} ({} bytes)", path.display(), attachment.content.len());
    }
    Ok(())
}

pub async fn import(
    client: &mut XapiClient,
    args: ImportArgs,
    api: &impl Fn(ApiError) -> CliError,
) -> Result<(), CliError> {
    let content = std::fs::read(&args.file).map_err(|e| CliError::io(args.file.display(), e))?;
    let filename = args
        .file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    client
        .import(ImportRequest {
            category: args.category,
            filename,
            content,
            extra: args.params,
        })
        .await
        .map_err(api)
}
