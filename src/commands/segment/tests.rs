use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;

use super::*;
use crate::model::Chunk;

fn scratch_dir(label: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "policyseg_{}_{}_{}",
        label,
        std::process::id(),
        Utc::now().timestamp_nanos_opt().unwrap_or_default()
    ));
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_input(dir: &Path, name: &str, lines: &[&str]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, lines.join("\n")).unwrap();
    path
}

fn args_for(inputs: Vec<PathBuf>, family: &str, dir: &Path) -> SegmentArgs {
    SegmentArgs {
        inputs,
        family: family.to_string(),
        doc_id: None,
        output_dir: dir.join("out"),
        manifest_path: None,
    }
}

fn read_chunks(path: &str) -> Vec<Chunk> {
    serde_json::from_slice(&fs::read(path).unwrap()).unwrap()
}

#[test]
fn manifest_counts_match_the_emitted_chunk_files() {
    let dir = scratch_dir("segment_counts");
    let first = write_input(
        &dir,
        "motor_a.txt",
        &["Partie B", "Liability", "B1", "Coverage", "Covered events."],
    );
    let second = write_input(
        &dir,
        "motor_b.txt",
        &[
            "Partie C",
            "Accidental damage",
            "C1",
            "Scope",
            "Damage to the vehicle.",
            "C2",
            "Exclusions",
            "Gross negligence.",
        ],
    );

    let manifest = execute(&args_for(vec![first, second], "axa-motor", &dir)).unwrap();

    assert_eq!(manifest.counts.input_count, 2);
    assert_eq!(manifest.counts.segmented_document_count, 2);
    assert_eq!(manifest.counts.skipped_document_count, 0);
    assert!(manifest.warnings.is_empty());

    let mut emitted = 0;
    for summary in &manifest.documents {
        let chunks = read_chunks(&summary.chunks_path);
        assert_eq!(chunks.len(), summary.chunk_count);
        assert_eq!(summary.sha256.len(), 64);
        emitted += chunks.len();
    }
    assert_eq!(manifest.counts.chunks_emitted, emitted);
    assert_eq!(emitted, 3);

    let manifest_files: Vec<_> = fs::read_dir(dir.join("out"))
        .unwrap()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry
                .file_name()
                .to_string_lossy()
                .starts_with("segment_run_")
        })
        .collect();
    assert_eq!(manifest_files.len(), 1);

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn unreadable_input_is_skipped_with_a_warning() {
    let dir = scratch_dir("segment_skip");
    let good = write_input(
        &dir,
        "motor_a.txt",
        &["Partie B", "Liability", "B1", "Coverage", "Covered events."],
    );
    let missing = dir.join("absent.txt");

    let manifest = execute(&args_for(vec![good, missing], "axa-motor", &dir)).unwrap();

    assert_eq!(manifest.counts.input_count, 2);
    assert_eq!(manifest.counts.segmented_document_count, 1);
    assert_eq!(manifest.counts.skipped_document_count, 1);
    assert_eq!(manifest.counts.chunks_emitted, 1);
    assert!(
        manifest
            .warnings
            .iter()
            .any(|warning| warning.contains("failed to segment")),
        "missing skip warning: {:?}",
        manifest.warnings
    );
    assert_eq!(manifest.documents.len(), 1);

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn discarded_preamble_lines_surface_in_the_warnings() {
    let dir = scratch_dir("segment_discard");
    let input = write_input(
        &dir,
        "generali.txt",
        &[
            "Ligne de couverture.",
            "Mention légale.",
            "B.",
            "RESPONSABILITÉ CIVILE",
            "1. Étendue",
            "Texte de la clause.",
        ],
    );

    let manifest = execute(&args_for(vec![input], "generali-motor-fr", &dir)).unwrap();

    assert_eq!(manifest.counts.chunks_emitted, 1);
    assert_eq!(manifest.documents[0].discarded_line_count, 2);
    assert!(
        manifest
            .warnings
            .iter()
            .any(|warning| warning.contains("discarded 2 unattributed lines")),
        "missing discard warning: {:?}",
        manifest.warnings
    );

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn doc_id_override_requires_a_single_input() {
    let dir = scratch_dir("segment_doc_id");
    let first = write_input(&dir, "a.txt", &["B1", "Coverage", "text"]);
    let second = write_input(&dir, "b.txt", &["B1", "Coverage", "text"]);

    let mut args = args_for(vec![first, second], "axa-motor", &dir);
    args.doc_id = Some("override".to_string());
    let err = execute(&args).unwrap_err();
    assert!(err.to_string().contains("--doc-id"));

    fs::remove_dir_all(&dir).ok();
}
