//! CLI end-to-end tests.
//!
//! These tests spawn the actual `reswrite` binary in a temporary solution
//! directory and validate stdout, exit codes and the files left behind.
//!
//! Exit code expectations:
//! - 0: Success
//! - 2: Missing or invalid configuration
//! - 3: Solution file not found

use serde_json::Value;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

const SOLUTION: &str = r#"
Microsoft Visual Studio Solution File, Format Version 12.00
Project("{FAE04EC0-301F-11D3-BF4B-00C04F79EFBC}") = "App", "App\App.csproj", "{11111111-1111-1111-1111-111111111111}"
EndProject
Project("{FAE04EC0-301F-11D3-BF4B-00C04F79EFBC}") = "Tools", "Tools\Tools.csproj", "{22222222-2222-2222-2222-222222222222}"
EndProject
"#;

const RESOURCES: &str = r#"namespace App.Properties
{
    [global::System.CodeDom.Compiler.GeneratedCodeAttribute("DMKSoftware.CodeGenerators.Tools.StronglyTypedResourceBuilderEx", "2.6.0.0")]
    internal class Res
    {
        internal static string Hello { get { return ""; } }
        internal static string HelloFormat(object a) { return ""; }
    }
}
"#;

const GREETER: &str = r#"using App.Properties;

namespace App
{
    class Greeter
    {
        string Greet(string name)
        {
            // say hello
            return Res.HelloFormat(name);
        }
    }
}
"#;

const GREETER_REWRITTEN: &str = r#"using App.Properties;

namespace App
{
    class Greeter
    {
        string Greet(string name)
        {
            // say hello
            return string.Format(Res.Culture, Res.Hello, name);
        }
    }
}
"#;

const TOOL: &str = "namespace Tools { class T { string M() => App.Properties.Res.HelloFormat(1); } }\n";

/// Lay out a two-project solution with an `appconfig.json`.
fn solution_dir(config: &str) -> TempDir {
    let dir = TempDir::new().expect("create temp dir");
    let root = dir.path();
    fs::create_dir_all(root.join("App")).unwrap();
    fs::create_dir_all(root.join("Tools")).unwrap();
    fs::write(root.join("All.sln"), SOLUTION).unwrap();
    fs::write(root.join("App/App.csproj"), "<Project />").unwrap();
    fs::write(root.join("App/Res.Designer.cs"), RESOURCES).unwrap();
    fs::write(root.join("App/Greeter.cs"), GREETER).unwrap();
    fs::write(root.join("Tools/Tools.csproj"), "<Project />").unwrap();
    fs::write(root.join("Tools/T.cs"), TOOL).unwrap();
    fs::write(root.join("appconfig.json"), config).unwrap();
    dir
}

/// Run reswrite in `dir` and return (stdout, stderr, exit_code).
fn run_reswrite(dir: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_reswrite"))
        .args(args)
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to execute reswrite");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let exit_code = output.status.code().unwrap_or(-1);

    (stdout, stderr, exit_code)
}

fn parse(stdout: &str) -> Value {
    serde_json::from_str(stdout).expect("stdout should be valid JSON")
}

#[test]
fn writes_update_files_by_default() {
    let dir = solution_dir(r#"{ "appSettings": { "solution": "All.sln" } }"#);
    let (stdout, stderr, exit_code) = run_reswrite(dir.path(), &[]);

    assert_eq!(exit_code, 0, "stderr: {}", stderr);
    let json = parse(&stdout);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["projects"], 2);
    assert_eq!(json["rewritten"], 1);

    let updated = fs::read_to_string(dir.path().join("App/Greeter.cs.upd")).unwrap();
    assert_eq!(updated, GREETER_REWRITTEN);
    assert_eq!(
        fs::read_to_string(dir.path().join("App/Greeter.cs")).unwrap(),
        GREETER
    );
    // Res is declared in another project; T.cs cannot resolve it.
    assert!(!dir.path().join("Tools/T.cs.upd").exists());
}

#[test]
fn rewrite_files_overwrites_sources() {
    let dir = solution_dir(r#"{ "appSettings": { "solution": "All.sln", "rewriteFiles": true } }"#);
    let (stdout, _stderr, exit_code) = run_reswrite(dir.path(), &[]);

    assert_eq!(exit_code, 0);
    assert_eq!(parse(&stdout)["rewritten"], 1);
    assert_eq!(
        fs::read_to_string(dir.path().join("App/Greeter.cs")).unwrap(),
        GREETER_REWRITTEN
    );
    assert!(!dir.path().join("App/Greeter.cs.upd").exists());
}

#[test]
fn flags_override_the_configuration_file() {
    let dir = solution_dir("{}");
    let (stdout, _stderr, exit_code) =
        run_reswrite(dir.path(), &["--solution", "All.sln", "--rewrite-files"]);

    assert_eq!(exit_code, 0);
    assert_eq!(parse(&stdout)["rewritten"], 1);
    assert_eq!(
        fs::read_to_string(dir.path().join("App/Greeter.cs")).unwrap(),
        GREETER_REWRITTEN
    );
}

#[test]
fn dry_run_reports_without_writing() {
    let dir = solution_dir(r#"{ "appSettings": { "solution": "All.sln" } }"#);
    let (stdout, _stderr, exit_code) = run_reswrite(dir.path(), &["--dry-run"]);

    assert_eq!(exit_code, 0);
    let json = parse(&stdout);
    assert_eq!(json["dry_run"], true);
    assert_eq!(json["rewritten"], 1);
    let files = json["files"].as_array().unwrap();
    assert!(files[0].as_str().unwrap().ends_with("Greeter.cs.upd"));
    assert!(!dir.path().join("App/Greeter.cs.upd").exists());
}

#[test]
fn project_include_names_limit_the_run() {
    let dir = solution_dir(
        r#"{ "appSettings": { "solution": "All.sln", "projects.include.names": ["Tools"] } }"#,
    );
    let (stdout, _stderr, exit_code) = run_reswrite(dir.path(), &[]);

    assert_eq!(exit_code, 0);
    let json = parse(&stdout);
    assert_eq!(json["projects"], 1);
    assert_eq!(json["rewritten"], 0);
    assert!(!dir.path().join("App/Greeter.cs.upd").exists());
}

#[test]
fn excluded_files_are_left_alone() {
    let dir = solution_dir(
        r#"{ "appSettings": { "solution": "All.sln", "files.exclude.patterns": ["Greeter.cs"] } }"#,
    );
    let (stdout, _stderr, exit_code) = run_reswrite(dir.path(), &[]);

    assert_eq!(exit_code, 0);
    assert_eq!(parse(&stdout)["rewritten"], 0);
    assert!(!dir.path().join("App/Greeter.cs.upd").exists());
}

#[test]
fn unparsable_documents_are_skipped() {
    let dir = solution_dir(r#"{ "appSettings": { "solution": "All.sln" } }"#);
    fs::write(dir.path().join("App/Broken.cs"), "class B { void M( }\n").unwrap();
    let (stdout, _stderr, exit_code) = run_reswrite(dir.path(), &[]);

    assert_eq!(exit_code, 0);
    let json = parse(&stdout);
    assert_eq!(json["skipped"], 1);
    assert_eq!(json["rewritten"], 1);
}

/// Solution, project and sources all in one directory.
fn flat_solution_dir() -> TempDir {
    let dir = TempDir::new().expect("create temp dir");
    let root = dir.path();
    fs::write(
        root.join("App.sln"),
        r#"Project("{FAE04EC0-301F-11D3-BF4B-00C04F79EFBC}") = "App", "App.csproj", "{11111111-1111-1111-1111-111111111111}""#,
    )
    .unwrap();
    fs::write(root.join("App.csproj"), "<Project />").unwrap();
    fs::write(root.join("Res.Designer.cs"), RESOURCES).unwrap();
    fs::write(root.join("Greeter.cs"), GREETER).unwrap();
    fs::write(root.join("appconfig.json"), r#"{ "appSettings": { "solution": "App.sln" } }"#).unwrap();
    dir
}

#[test]
fn relative_solution_beside_its_project() {
    let dir = flat_solution_dir();
    let (stdout, stderr, exit_code) = run_reswrite(dir.path(), &[]);

    assert_eq!(exit_code, 0, "stderr: {}", stderr);
    let json = parse(&stdout);
    assert_eq!(json["documents"], 2);
    assert_eq!(json["rewritten"], 1);
    assert_eq!(
        fs::read_to_string(dir.path().join("Greeter.cs.upd")).unwrap(),
        GREETER_REWRITTEN
    );
}

#[test]
fn relative_project_file_on_the_command_line() {
    let dir = flat_solution_dir();
    let (stdout, _stderr, exit_code) = run_reswrite(dir.path(), &["--solution", "App.csproj"]);

    assert_eq!(exit_code, 0);
    let json = parse(&stdout);
    assert_eq!(json["documents"], 2);
    assert_eq!(json["rewritten"], 1);
    assert!(dir.path().join("Greeter.cs.upd").exists());
}

#[test]
fn missing_solution_setting_returns_exit_2() {
    let dir = solution_dir(r#"{ "appSettings": { } }"#);
    let (stdout, _stderr, exit_code) = run_reswrite(dir.path(), &[]);

    assert_eq!(exit_code, 2);
    let json = parse(&stdout);
    assert_eq!(json["status"], "error");
    assert_eq!(json["error"]["code"], 2);
}

#[test]
fn missing_solution_file_returns_exit_3() {
    let dir = solution_dir(r#"{ "appSettings": { "solution": "Missing.sln" } }"#);
    let (stdout, _stderr, exit_code) = run_reswrite(dir.path(), &[]);

    assert_eq!(exit_code, 3);
    let json = parse(&stdout);
    assert_eq!(json["status"], "error");
    assert!(json["error"]["file"].as_str().unwrap().ends_with("Missing.sln"));
}
