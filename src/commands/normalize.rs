use std::fs;

use anyhow::{Context, Result};
use chrono::Utc;
use serde_json::Value;
use tracing::{info, warn};

use crate::cli::NormalizeArgs;
use crate::model::{NormalizeCounts, NormalizeRunManifest};
use crate::taxonomy::{CategoryNormalizer, Taxonomy};
use crate::util::{ensure_directory, manifest_timestamp, run_stamp, write_json_file};

pub fn run(args: NormalizeArgs) -> Result<()> {
    let started_ts = Utc::now();
    let run_id = format!("run-{}", run_stamp(started_ts));

    let taxonomy = match &args.taxonomy_path {
        Some(path) => Taxonomy::load(path)?,
        None => Taxonomy::builtin(),
    };
    let normalizer = CategoryNormalizer::new(taxonomy)?;

    let raw = fs::read(&args.chunks_path)
        .with_context(|| format!("failed to read {}", args.chunks_path.display()))?;
    let mut records: Vec<Value> = serde_json::from_slice(&raw)
        .with_context(|| format!("failed to parse {}", args.chunks_path.display()))?;

    let mut counts = NormalizeCounts {
        record_count: records.len(),
        ..NormalizeCounts::default()
    };

    for record in &mut records {
        let Some(object) = record.as_object_mut() else {
            counts.missing_field_count += 1;
            continue;
        };
        let Some(raw_answer) = object.get(&args.field).and_then(Value::as_str) else {
            counts.missing_field_count += 1;
            continue;
        };

        let label = normalizer.normalize(raw_answer);
        if label.is_unidentified() {
            counts.unidentified_count += 1;
        } else {
            counts.matched_count += 1;
        }
        object.insert(args.field.clone(), Value::String(label.to_string()));
    }

    if counts.missing_field_count > 0 {
        warn!(
            missing = counts.missing_field_count,
            field = %args.field,
            "records without a classification answer were left untouched"
        );
    }

    ensure_directory(&args.output_dir)?;
    let output_path = args.output_path.clone().unwrap_or_else(|| {
        args.output_dir
            .join(format!("normalized_chunks_{}.json", run_stamp(started_ts)))
    });
    write_json_file(&output_path, &records)?;

    let manifest_path = args.manifest_path.clone().unwrap_or_else(|| {
        args.output_dir
            .join(format!("normalize_run_{}.json", run_stamp(started_ts)))
    });
    let manifest = NormalizeRunManifest {
        manifest_version: 1,
        run_id,
        generated_at: manifest_timestamp(started_ts),
        chunks_path: args.chunks_path.display().to_string(),
        output_path: output_path.display().to_string(),
        taxonomy_len: normalizer.taxonomy().len(),
        field: args.field.clone(),
        counts,
    };
    write_json_file(&manifest_path, &manifest)?;

    info!(
        path = %output_path.display(),
        matched = manifest.counts.matched_count,
        unidentified = manifest.counts.unidentified_count,
        "normalized categories"
    );

    Ok(())
}
