use assert_cmd::Command;
use tempfile::TempDir;

fn lcat(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("lcat").unwrap();
    cmd.env("HOME", home.path())
        .env("LCAT_LANG", "en")
        .env_remove("LCAT_TIMEOUT")
        .env_remove("LCAT_LOG")
        .arg("--no-color")
        .current_dir(home.path());
    cmd
}

fn stdout_of(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn run_exits_with_the_command_return_code() {
    let home = TempDir::new().unwrap();

    let first = lcat(&home).args(["run", "mkdir", "made"]).output().unwrap();
    assert_eq!(first.status.code(), Some(0));
    assert!(home.path().join("made").is_dir());

    let second = lcat(&home).args(["run", "mkdir", "made"]).output().unwrap();
    assert_eq!(second.status.code(), Some(1));
    assert!(stdout_of(&second).contains("File exists"));
}

#[test]
fn run_json_prints_the_record() {
    let home = TempDir::new().unwrap();
    let output = lcat(&home).args(["run", "--json", "pwd"]).output().unwrap();
    assert_eq!(output.status.code(), Some(0));

    let record: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(record["command"], "pwd");
    assert_eq!(record["returncode"], 0);
    assert_eq!(record["success"], true);
    let canonical = home.path().canonicalize().unwrap();
    assert_eq!(record["summary"]["current_directory"], canonical.to_string_lossy().into_owned());
}

#[test]
fn rejected_arguments_exit_with_two() {
    let home = TempDir::new().unwrap();
    let output = lcat(&home).args(["run", "ls", "--bogus"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("--bogus"));

    let output = lcat(&home).args(["run", "frobnicate"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Unknown command: frobnicate"));
}

#[test]
fn list_shows_every_command() {
    let home = TempDir::new().unwrap();
    let output = lcat(&home).arg("list").output().unwrap();
    assert!(output.status.success());
    let text = stdout_of(&output);
    assert!(text.starts_with("Run common Linux utilities through typed wrappers"));
    for name in ["ls", "pwd", "cd", "mkdir", "touch", "rm", "chmod", "chown", "ps", "kill", "grep", "find", "top", "free"] {
        assert!(text.contains(name), "{} missing from list", name);
    }
}

#[test]
fn shell_reads_commands_from_stdin() {
    let home = TempDir::new().unwrap();
    let output = lcat(&home)
        .arg("shell")
        .write_stdin("touch notes.txt\nls\nhistory\nexit\n")
        .output()
        .unwrap();
    assert!(output.status.success());

    let text = stdout_of(&output);
    assert!(text.contains("notes.txt"));
    assert!(text.contains("History (showing 2 of 2):"));
    assert!(text.trim_end().ends_with("Bye"));
    assert!(home.path().join("notes.txt").exists());
}

#[test]
fn shell_ends_cleanly_at_end_of_input() {
    let home = TempDir::new().unwrap();
    let output = lcat(&home).write_stdin("pwd\n").output().unwrap();
    assert!(output.status.success());
    assert!(stdout_of(&output).contains("Bye"));
}

#[test]
fn config_file_sets_the_prompt() {
    let home = TempDir::new().unwrap();
    std::fs::create_dir(home.path().join(".lcat")).unwrap();
    std::fs::write(
        home.path().join(".lcat").join("config.toml"),
        "[display]\nprompt = \"toolkit% \"\n",
    )
    .unwrap();

    let output = lcat(&home).write_stdin("exit\n").output().unwrap();
    assert!(stdout_of(&output).contains("toolkit% "));
}
