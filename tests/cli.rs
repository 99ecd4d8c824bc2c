use std::fs;

use assert_cmd::Command;

fn datagrab(app_data: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("datagrab").unwrap();
    cmd.env_remove("RUST_LOG")
        .env_remove("DATAGRAB_APP_DATA_DIR")
        .arg("--app-data-dir")
        .arg(app_data)
        .args(["--log-level", "warn"]);
    cmd
}

#[test]
fn runs() {
    let mut cmd = Command::cargo_bin("datagrab").unwrap();
    cmd.assert().success();
}

#[test]
fn outputs_tool_name() {
    let mut cmd = Command::cargo_bin("datagrab").unwrap();
    cmd.arg("-V");
    cmd.assert().success().stdout("datagrab 0.2.0\n");
}

#[test]
fn schemes_lists_builtin_handlers() {
    let temp = tempfile::tempdir().expect("create temp dir");
    datagrab(temp.path())
        .arg("schemes")
        .assert()
        .success()
        .stdout(predicates::str::contains("file\n"))
        .stdout(predicates::str::contains("http\n"))
        .stdout(predicates::str::contains("https\n"));
}

#[test]
fn grab_local_file_writes_bytes_to_stdout() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let file = temp.path().join("hello.txt");
    fs::write(&file, "hello, world").expect("write file");

    datagrab(temp.path())
        .arg("grab")
        .arg(&file)
        .assert()
        .success()
        .stdout("hello, world");
}

#[test]
fn grab_directory_lists_keys() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let dir = temp.path().join("data");
    fs::create_dir_all(dir.join("nested")).expect("create dirs");
    fs::write(dir.join("a.csv"), "a").expect("write a");
    fs::write(dir.join("nested/b.json"), "{}").expect("write b");

    datagrab(temp.path())
        .arg("grab")
        .arg(format!("file://{}", dir.display()))
        .assert()
        .success()
        .stdout("a.csv\nnested/b.json\n");
}

#[test]
fn grab_to_output_file() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let file = temp.path().join("in.bin");
    let out = temp.path().join("out.bin");
    fs::write(&file, [1u8, 2, 3]).expect("write file");

    datagrab(temp.path())
        .arg("grab")
        .arg(&file)
        .arg("-o")
        .arg(&out)
        .assert()
        .success();
    assert_eq!(fs::read(&out).expect("read output"), vec![1, 2, 3]);
}

#[test]
fn grab_unknown_scheme_fails() {
    let temp = tempfile::tempdir().expect("create temp dir");
    datagrab(temp.path())
        .args(["grab", "gopher://example.org/x"])
        .assert()
        .failure()
        .stderr(predicates::str::contains("Unrecognized scheme: gopher"));
}

#[test]
fn owid_url_prints_url_and_cache_path() {
    let temp = tempfile::tempdir().expect("create temp dir");
    datagrab(temp.path())
        .args(["owid-url", "life-expectancy", "--kind", "csv"])
        .assert()
        .success()
        .stdout(predicates::str::contains(
            "https://ourworldindata.org/grapher/life-expectancy.csv\n",
        ))
        .stdout(predicates::str::contains("life-expectancy.csv"));
    assert!(temp.path().join("downloads/owid").is_dir());
}

#[test]
fn owid_url_rejects_unknown_kind() {
    let temp = tempfile::tempdir().expect("create temp dir");
    datagrab(temp.path())
        .args(["owid-url", "life-expectancy", "--kind", "parquet"])
        .assert()
        .failure()
        .stderr(predicates::str::contains("Unknown artifact kind"));
}

#[test]
fn owid_uses_cached_files_without_network() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let owid_dir = temp.path().join("downloads/owid");
    fs::create_dir_all(&owid_dir).expect("create cache dir");
    fs::write(owid_dir.join("cached.csv"), "a,b\n").expect("write csv");
    fs::write(owid_dir.join("cached.metadata.json"), "{}").expect("write json");

    datagrab(temp.path())
        .args(["owid", "cached"])
        .assert()
        .success()
        .stdout(predicates::str::contains("cached\t"))
        .stdout(predicates::str::contains("cached.metadata.json"))
        .stdout(predicates::str::contains("cached.csv"));
}

#[test]
fn owid_rejects_path_like_slug() {
    let temp = tempfile::tempdir().expect("create temp dir");
    datagrab(temp.path())
        .args(["owid", "../../x"])
        .assert()
        .failure()
        .stderr(predicates::str::contains("Invalid chart slug"));
    assert!(!temp.path().join("x.csv").exists());
}
