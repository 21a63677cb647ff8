use anyhow::{anyhow, bail, Context};
use clap::Args;
use docscan_core::{Config, RecognizedText, ScanSubmission, UploadKind};
use docscan_ocr::{DocumentPipeline, PipelineError};
use docscan_storage::ScanRecord;
use std::path::PathBuf;

use crate::{file_name_of, parse_field_edit};

#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Image (JPG, PNG) or PDF to scan
    pub file: PathBuf,
    /// Declared content type; inferred from the extension when omitted
    #[arg(long)]
    pub mime: Option<String>,
    /// Correct an extracted field before saving (repeatable)
    #[arg(long, value_name = "FIELD=VALUE", value_parser = parse_field_edit)]
    pub set: Vec<(String, String)>,
    /// Replace the recognized text with the contents of this file
    #[arg(long, value_name = "FILE")]
    pub text: Option<PathBuf>,
    /// Confirm the scan and persist it to the record store
    #[arg(long)]
    pub save: bool,
    /// Also write the binarized page that was fed to OCR
    #[arg(long, value_name = "PNG")]
    pub enhanced_out: Option<PathBuf>,
    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn scan(config: &Config, args: ScanArgs) -> anyhow::Result<()> {
    let kind = match &args.mime {
        Some(mime) => UploadKind::from_mime(mime),
        None => UploadKind::from_path(&args.file),
    }
    .ok_or_else(|| {
        anyhow!(
            "Unsupported upload '{}': expected image/jpeg, image/png or application/pdf",
            args.file.display()
        )
    })?;

    let filename = file_name_of(&args.file);
    let data = std::fs::read(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;

    let stored = docscan_ocr::store_upload(&config.uploads_dir(), &filename, &data)
        .context("Failed to store upload")?;
    tracing::info!(file = %filename, ?kind, "processing upload");

    let pipeline = DocumentPipeline::from_config(config);
    let outcome = match pipeline.process(kind, &data) {
        Ok(outcome) => outcome,
        Err(e @ PipelineError::Load(_)) => {
            eprintln!("Failed to load document.");
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };

    if let Some(out) = &args.enhanced_out {
        outcome
            .enhanced
            .save(out)
            .with_context(|| format!("Failed to write {}", out.display()))?;
    }

    let mut submission = outcome.into_submission(filename, Some(stored));
    apply_edits(&mut submission, &args)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&submission)?);
    } else {
        print_submission(&submission);
    }

    if args.save {
        let db = docscan_storage::create_db(&config.database_path())
            .await
            .context("Database error: could not open the record store")?;
        match docscan_storage::save_scan(&db, &submission).await {
            Ok(id) => println!("Saved to local database as record #{id}"),
            Err(e) => {
                tracing::error!(error = %e, "failed to save scan");
                bail!("Database error: the scan was not saved");
            }
        }
    }

    Ok(())
}

fn apply_edits(submission: &mut ScanSubmission, args: &ScanArgs) -> anyhow::Result<()> {
    for (field, value) in &args.set {
        submission.fields.set(field.as_str(), value.as_str());
    }
    if let Some(path) = &args.text {
        let edited = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        submission.text = RecognizedText::edited(edited);
    }
    Ok(())
}

fn print_submission(submission: &ScanSubmission) {
    println!("Detected type: {}", submission.doc_type);
    println!("Fields:");
    for (field, value) in submission.fields.iter() {
        println!("  {field}: {value}");
    }
    println!("Raw text:");
    for line in submission.text.as_str().lines() {
        println!("  {line}");
    }
}

pub async fn recent(config: &Config, limit: Option<u32>, json: bool) -> anyhow::Result<()> {
    let db = docscan_storage::create_db(&config.database_path())
        .await
        .context("Database error: could not open the record store")?;
    let records = docscan_storage::recent_scans(&db, limit.unwrap_or(config.recent_limit)).await?;
    print!("{}", render_recent(&records, json)?);
    Ok(())
}

fn render_recent(records: &[ScanRecord], json: bool) -> anyhow::Result<String> {
    if json {
        return Ok(format!("{}\n", serde_json::to_string_pretty(records)?));
    }
    if records.is_empty() {
        return Ok("No scans saved yet.\n".to_string());
    }
    Ok(records
        .iter()
        .map(|r| format!("{} | {} | {}\n", r.filename, r.doc_type, r.upload_date))
        .collect())
}

pub fn show_config(config: &Config) -> anyhow::Result<()> {
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}
