//! Integration tests for the reference/defaults folder discovery the CLI
//! performs before calling into `pipeline` (`6. EXTERNAL INTERFACES`).

use std::fs;

use drawio_rdf_bridge::pipeline::ReferenceFile;

/// Mirrors the CLI's non-recursive `.ttl` discovery (`3. DATA MODEL`,
/// reference/defaults file discovery): every direct child with a `.ttl`
/// extension contributes, sorted by name, subdirectories are skipped.
fn load_reference_folder(path: &std::path::Path) -> Vec<ReferenceFile> {
    let mut files = Vec::new();
    for entry in fs::read_dir(path).unwrap() {
        let entry = entry.unwrap();
        let entry_path = entry.path();
        if entry_path.extension().and_then(|e| e.to_str()) != Some("ttl") {
            continue;
        }
        let content = fs::read_to_string(&entry_path).unwrap();
        let name = entry_path.file_name().unwrap().to_string_lossy().into_owned();
        files.push(ReferenceFile { name, content });
    }
    files.sort_by(|a, b| a.name.cmp(&b.name));
    files
}

#[test]
fn discovers_ttl_files_sorted_by_name_and_skips_other_extensions() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("zebra.ttl"), "@prefix ex: <http://example.org/> .\n").unwrap();
    fs::write(dir.path().join("alpha.ttl"), "@prefix ex: <http://example.org/> .\n").unwrap();
    fs::write(dir.path().join("notes.txt"), "not turtle").unwrap();

    let files = load_reference_folder(dir.path());

    assert_eq!(files.len(), 2);
    assert_eq!(files[0].name, "alpha.ttl");
    assert_eq!(files[1].name, "zebra.ttl");
}

#[test]
fn skips_subdirectories_without_descending_into_them() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("nested")).unwrap();
    fs::write(dir.path().join("nested").join("inner.ttl"), "@prefix ex: <http://example.org/> .\n").unwrap();
    fs::write(dir.path().join("top.ttl"), "@prefix ex: <http://example.org/> .\n").unwrap();

    let files = load_reference_folder(dir.path());

    assert_eq!(files.len(), 1);
    assert_eq!(files[0].name, "top.ttl");
}

#[test]
fn reference_folder_contents_feed_the_forward_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("animals.ttl"),
        "@prefix ex: <http://example.org/> .\nex:Dog rdfs:label \"Dog\" .\n",
    )
    .unwrap();
    let reference_files = load_reference_folder(dir.path());
    assert_eq!(reference_files.len(), 1);
    assert!(reference_files[0].content.contains("Dog"));
}
