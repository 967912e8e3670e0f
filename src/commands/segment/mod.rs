#[cfg(test)]
mod tests;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use tracing::{info, warn};

use crate::cli::SegmentArgs;
use crate::dialect::{DialectRegistry, DialectRule};
use crate::model::{DocumentSummary, SegmentCounts, SegmentRunManifest};
use crate::segment::{LineClassifier, segment_document};
use crate::util::{ensure_directory, manifest_timestamp, run_stamp, sha256_hex, write_json_file};

pub fn run(args: SegmentArgs) -> Result<()> {
    let manifest = execute(&args)?;

    info!(
        documents = manifest.counts.segmented_document_count,
        chunks = manifest.counts.chunks_emitted,
        "wrote segment run manifest"
    );

    Ok(())
}

fn execute(args: &SegmentArgs) -> Result<SegmentRunManifest> {
    let started_ts = Utc::now();
    let run_id = format!("run-{}", run_stamp(started_ts));

    if args.doc_id.is_some() && args.inputs.len() > 1 {
        bail!("--doc-id is only valid with a single --input");
    }

    let registry = DialectRegistry::builtin()?;
    let dialect = registry.resolve(&args.family).with_context(|| {
        format!(
            "no dialect for this document family; known families: {}",
            registry.families().join(", ")
        )
    })?;
    let classifier = LineClassifier::new()?;

    ensure_directory(&args.output_dir)?;
    info!(family = %args.family, run_id = %run_id, inputs = args.inputs.len(), "starting segmentation");

    let mut counts = SegmentCounts {
        input_count: args.inputs.len(),
        ..SegmentCounts::default()
    };
    let mut documents = Vec::new();
    let mut warnings = Vec::new();

    // Documents are independent; one failing input is logged and skipped so
    // the rest of the batch still completes.
    for input in &args.inputs {
        let doc_id = match args.doc_id.clone() {
            Some(doc_id) => doc_id,
            None => doc_id_for(input)?,
        };

        match segment_one(&classifier, dialect, input, &doc_id, &args.output_dir) {
            Ok(summary) => {
                info!(
                    doc_id = %summary.doc_id,
                    chunks = summary.chunk_count,
                    path = %summary.chunks_path,
                    "segmented document"
                );
                counts.segmented_document_count += 1;
                counts.chunks_emitted += summary.chunk_count;
                if summary.chunk_count == 0 {
                    warnings.push(format!("no chunks emitted for {doc_id}"));
                }
                if summary.discarded_line_count > 0 {
                    warnings.push(format!(
                        "discarded {} unattributed lines in {doc_id}",
                        summary.discarded_line_count
                    ));
                }
                documents.push(summary);
            }
            Err(err) => {
                let warning = format!("failed to segment {}: {err:#}", input.display());
                warn!(warning = %warning, "segmentation warning");
                counts.skipped_document_count += 1;
                warnings.push(warning);
            }
        }
    }

    let manifest_path = args.manifest_path.clone().unwrap_or_else(|| {
        args.output_dir
            .join(format!("segment_run_{}.json", run_stamp(started_ts)))
    });
    let manifest = SegmentRunManifest {
        manifest_version: 1,
        run_id,
        generated_at: manifest_timestamp(started_ts),
        family: args.family.clone(),
        counts,
        documents,
        warnings,
    };
    write_json_file(&manifest_path, &manifest)?;

    Ok(manifest)
}

fn segment_one(
    classifier: &LineClassifier,
    dialect: &DialectRule,
    input: &Path,
    doc_id: &str,
    output_dir: &Path,
) -> Result<DocumentSummary> {
    let text = fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;

    let segmented = segment_document(classifier, dialect, doc_id, &text);

    let chunks_path = output_dir.join(format!("{doc_id}_chunks.json"));
    write_json_file(&chunks_path, &segmented.chunks)?;

    Ok(DocumentSummary {
        doc_id: doc_id.to_string(),
        source_path: input.display().to_string(),
        sha256: sha256_hex(text.as_bytes()),
        line_count: text.lines().count(),
        chunk_count: segmented.chunks.len(),
        discarded_line_count: segmented.discarded_line_count,
        chunks_path: chunks_path.display().to_string(),
    })
}

fn doc_id_for(input: &Path) -> Result<String> {
    let stem = input
        .file_stem()
        .and_then(|stem| stem.to_str())
        .with_context(|| format!("cannot derive a document id from {}", input.display()))?;
    Ok(stem.to_string())
}
