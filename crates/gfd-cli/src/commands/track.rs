use anyhow::Context;
use serde_json::Value;

use gfd_core::transfer::TrackExport;
use gfd_db::service::{ActionContext, GameService};

use crate::cli::GlobalFlags;
use crate::cli::subcommands::TrackCommands;
use crate::commands::write_or_print;
use crate::output::output;

pub async fn handle(
    action: &TrackCommands,
    service: &GameService,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let ctx = ActionContext::system();
    match action {
        TrackCommands::List => output(&service.all_tracks().await?, flags.format),
        TrackCommands::Export { id, all, output } => {
            let body = match id {
                Some(id) => serde_json::to_string_pretty(&service.export_track(*id, &ctx).await?)?,
                None => serde_json::to_string_pretty(&service.export_tracks(!*all, &ctx).await?)?,
            };
            write_or_print(output.as_deref(), body.as_bytes()).await
        }
        TrackCommands::Import { file } => {
            let raw = tokio::fs::read_to_string(file)
                .await
                .with_context(|| format!("failed to read {file}"))?;
            let docs = parse_import(&raw)?;
            let mut imported = Vec::with_capacity(docs.len());
            for doc in docs {
                let name = doc.name.clone();
                let track = service
                    .import_track(doc, &ctx)
                    .await
                    .with_context(|| format!("failed to import '{name}'"))?;
                imported.push(track);
            }
            tracing::info!(count = imported.len(), file, "tracks imported");
            output(&imported, flags.format)
        }
    }
}

/// Accept either one exported track or an array of them.
fn parse_import(raw: &str) -> anyhow::Result<Vec<TrackExport>> {
    let value: Value = serde_json::from_str(raw).context("import file is not valid JSON")?;
    let docs = match value {
        Value::Array(_) => serde_json::from_value(value)?,
        other => vec![serde_json::from_value(other)?],
    };
    Ok(docs)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::parse_import;

    const DOC: &str = r#"{
        "name": "Spiral",
        "gridConfig": "[[1,1,1,0,0],[0,0,1,0,0],[0,0,1,1,1],[0,0,0,0,0]]",
        "startX": 0,
        "startY": 0,
        "startDirection": "EAST"
    }"#;

    #[test]
    fn single_document_imports_one() {
        let docs = parse_import(DOC).expect("doc should parse");
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].name, "Spiral");
        assert_eq!(docs[0].export_version, "1.0");
    }

    #[test]
    fn array_imports_each() {
        let docs = parse_import(&format!("[{DOC},{DOC}]")).expect("array should parse");
        assert_eq!(docs.len(), 2);
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(parse_import("not json").is_err());
        assert!(parse_import(r#"{"name": "missing fields"}"#).is_err());
    }
}
