//! Integration tests for the `typebridge` binary.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const DECLARATIONS: &str = r#"{ "packages": [ { "path": "example.com/app/models", "declarations": [
    { "kind": "named", "name": "UserID", "underlying": { "kind": "basic", "name": "uint64" } },
    { "kind": "struct", "name": "User", "fields": [
        { "name": "ID", "type": { "kind": "named", "name": "UserID" }, "tag": "json:\"id\"" }
    ] }
] } ] }"#;

fn typebridge(args: &[&str], dir: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_typebridge"))
        .args(args)
        .current_dir(dir)
        .env("RUST_LOG", "typebridge=warn")
        .output()
        .expect("Failed to run typebridge")
}

fn write_input(dir: &TempDir, json: &str) {
    fs::write(dir.path().join("decls.json"), json).expect("Failed to write input");
}

#[test]
fn test_writes_to_stdout() {
    let dir = TempDir::new().unwrap();
    write_input(&dir, DECLARATIONS);

    let output = typebridge(&["--input", "decls.json"], dir.path());
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("// Code generated by typebridge. DO NOT EDIT.\n"));
    assert!(stdout.contains("export interface User {\n  id: UserID;\n}\n"));
}

#[test]
fn test_config_and_output_file() {
    let dir = TempDir::new().unwrap();
    write_input(&dir, DECLARATIONS);
    fs::write(
        dir.path().join("typebridge.toml"),
        "declarationForm = \"alias\"\nemitHeader = false\n",
    )
    .unwrap();

    let output = typebridge(
        &["--input", "decls.json", "--config", "typebridge.toml", "--output", "api.ts"],
        dir.path(),
    );
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(output.stdout.is_empty());

    let generated = fs::read_to_string(dir.path().join("api.ts")).unwrap();
    assert_eq!(
        generated,
        "export type UserID = number;\n\nexport type User = {\n  id: UserID;\n};\n"
    );
}

#[test]
fn test_check_detects_stale_output() {
    let dir = TempDir::new().unwrap();
    write_input(&dir, DECLARATIONS);

    let output = typebridge(&["--input", "decls.json", "--output", "api.ts"], dir.path());
    assert!(output.status.success());

    let output = typebridge(&["--input", "decls.json", "--output", "api.ts", "--check"], dir.path());
    assert!(output.status.success(), "fresh output should pass --check");

    let path = dir.path().join("api.ts");
    let stale = fs::read_to_string(&path).unwrap().replace("id: UserID", "id: number");
    fs::write(&path, &stale).unwrap();

    let output = typebridge(&["--input", "decls.json", "--output", "api.ts", "--check"], dir.path());
    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("-  id: number;"), "diff: {stdout}");
    assert!(stdout.contains("+  id: UserID;"), "diff: {stdout}");
    assert_eq!(fs::read_to_string(&path).unwrap(), stale, "--check must not write");
}

#[test]
fn test_error_diagnostics_fail_the_run() {
    let dir = TempDir::new().unwrap();
    write_input(
        &dir,
        r#"{ "packages": [ { "path": "p", "declarations": [
            { "kind": "struct", "name": "Dup", "fields": [
                { "name": "A", "type": { "kind": "basic", "name": "string" }, "tag": "json:\"x\"" },
                { "name": "B", "type": { "kind": "basic", "name": "string" }, "tag": "json:\"x\"" }
            ] },
            { "kind": "struct", "name": "Fine" }
        ] } ] }"#,
    );

    let output = typebridge(&["--input", "decls.json"], dir.path());
    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("export interface Fine {}"), "other declarations still emit");
    assert!(!stdout.contains("Dup"));
    assert!(String::from_utf8_lossy(&output.stderr).contains("error diagnostic"));
}

#[test]
fn test_invalid_config_is_rejected() {
    let dir = TempDir::new().unwrap();
    write_input(&dir, DECLARATIONS);
    fs::write(dir.path().join("bad.toml"), "noSuchOption = true\n").unwrap();

    let output = typebridge(&["--input", "decls.json", "--config", "bad.toml"], dir.path());
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid configuration"));
}
