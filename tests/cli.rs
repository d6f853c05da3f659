use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;

#[test]
fn converts_into_output_directory() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("loop.py");
    fs::write(&input, "for i in range(3):\n    print(i)\n").unwrap();
    let out_dir = dir.path().join("charts");

    let output = cargo_bin_cmd!("pyflow")
        .arg(&input)
        .arg("--output-dir")
        .arg(&out_dir)
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Successfully converted"));

    let written = fs::read_to_string(out_dir.join("loop.fprg")).unwrap();
    assert!(written.starts_with("<?xml version=\"1.0\" ?>\n<flowgorithm fileversion=\"4.2\">"));
    assert!(written.contains("<for variable=\"i\" start=\"0\" end=\"3\" direction=\"inc\" step=\"1\">"));
}

#[test]
fn explicit_output_name_and_json() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("prog.py");
    fs::write(&input, "x = 1\n").unwrap();

    let output = cargo_bin_cmd!("pyflow")
        .arg(&input)
        .arg("tree.json")
        .arg("-d")
        .arg(dir.path())
        .arg("--emit")
        .arg("json")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(0));
    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("tree.json")).unwrap()).unwrap();
    assert_eq!(json["functions"][0]["name"], "Main");
}

#[test]
fn unsupported_statements_still_convert() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("imports.py");
    fs::write(&input, "import math\nx = 1\nprint(x)\n").unwrap();

    let output = cargo_bin_cmd!("pyflow")
        .arg(&input)
        .arg("-d")
        .arg(dir.path())
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains("1 diagnostic(s) during conversion"));
    assert!(dir.path().join("imports.fprg").exists());
}

#[test]
fn parse_error_exits_with_failure() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("bad.py");
    fs::write(&input, "if x\n    y = 1\n").unwrap();
    let out_dir = dir.path().join("out");

    let output = cargo_bin_cmd!("pyflow")
        .arg(&input)
        .arg("-d")
        .arg(&out_dir)
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Parse error"));
    assert!(!out_dir.exists());
}
