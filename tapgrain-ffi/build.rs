// Keeps `include/tapgrain.h` honest.
//
// Every `pub extern "C" fn tapgrain_*` in src/lib.rs must be declared in the
// checked-in header; a missing declaration is reported as a build warning.
// When `cbindgen` is on PATH the header is also regenerated into $OUT_DIR and
// the two symbol sets are compared. $OUT_DIR/tapgrain.h is always produced,
// from cbindgen or as a copy of the checked-in file.

use std::collections::BTreeSet;
use std::{env, fs, path::PathBuf, process::Command};

/// `tapgrain_*` identifiers that appear directly before a `(`.
fn declared(text: &str) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    let mut rest = text;
    while let Some(at) = rest.find("tapgrain_") {
        let tail = &rest[at..];
        let end = tail
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(tail.len());
        if tail[end..].trim_start().starts_with('(') {
            names.insert(tail[..end].to_string());
        }
        rest = &tail[end..];
    }
    names
}

/// Names of the exported C functions in the crate source.
fn exported(source: &str) -> BTreeSet<String> {
    source
        .split("pub extern \"C\" fn ")
        .skip(1)
        .filter_map(|s| s.split('(').next())
        .map(|s| s.trim().to_string())
        .collect()
}

fn main() {
    println!("cargo:rerun-if-changed=src/lib.rs");
    println!("cargo:rerun-if-changed=include/tapgrain.h");

    let crate_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let header_repo = crate_dir.join("include").join("tapgrain.h");
    let header_out = out_dir.join("tapgrain.h");

    let source = fs::read_to_string(crate_dir.join("src").join("lib.rs")).expect("read src/lib.rs");
    let header = fs::read_to_string(&header_repo).expect("read include/tapgrain.h");

    let checked_in = declared(&header);
    for name in exported(&source).difference(&checked_in) {
        println!("cargo:warning=tapgrain-ffi: {name} is exported but missing from include/tapgrain.h");
    }

    let generated = Command::new("cbindgen")
        .args(["--crate", "tapgrain-ffi", "--lang", "C", "--output"])
        .arg(&header_out)
        .current_dir(&crate_dir)
        .status()
        .map(|s| s.success())
        .unwrap_or(false);

    if generated {
        let fresh = declared(&fs::read_to_string(&header_out).unwrap_or_default());
        if fresh != checked_in {
            println!("cargo:warning=tapgrain-ffi: include/tapgrain.h differs from the cbindgen output in {}", header_out.display());
        }
        return;
    }

    fs::copy(&header_repo, &header_out).expect("copy include/tapgrain.h to OUT_DIR");
}
