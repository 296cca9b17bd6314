use assert_cmd::{cargo, prelude::*};
use predicates::prelude::*;
use std::{path::PathBuf, process::Command};
use tempfile::TempDir;


use cli_helpers::{count_json, import_json, write_default_profile, write_sparkasse_csv};

fn setup_temp_home() -> TempDir {
    TempDir::new().expect("failed to create temp home")
}

const ROWS: &[&str] = &[
    "DE44500105175407324931;01.03.24;01.03.24;FOLGELASTSCHRIFT;Miete März;Hausverwaltung Müller;DE02120300000000202051;-850,00;Umsatz gebucht",
    "DE44500105175407324931;04.03.24;04.03.24;GUTSCHR. UEBERWEISUNG;Gehalt 03/24;Arbeitgeber GmbH;DE89370400440532013000;2450,00;Umsatz gebucht",
    "DE44500105175407324931;05.03.24;05.03.24;KARTENZAHLUNG;Bäckerei;Bäckerei Schmidt;;-12,50;Umsatz gebucht",
];

#[test]
fn count_empty_db_no_color_when_piped() {
    let home = setup_temp_home();

    let mut cmd = Command::new(cargo::cargo_bin!("bankfeed"));
    cmd.env("HOME", home.path());
    cmd.arg("count").arg("--no-color");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("0 transactions stored"))
        .stdout(predicate::str::contains("\u{001b}[").not());
}

#[test]
fn import_dry_run_does_not_create_db() {
    let home = setup_temp_home();
    let db_path = PathBuf::from(home.path()).join(".bankfeed").join("data.db");
    assert!(!db_path.exists(), "db should start absent");
    let file = write_sparkasse_csv(home.path(), "umsatz.csv", ROWS);

    let mut cmd = Command::new(cargo::cargo_bin!("bankfeed"));
    cmd.env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join(".config"))
        .arg("--no-color")
        .arg("import")
        .arg(&file)
        .arg("--dry-run");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Found 3 rows"))
        .stdout(predicate::str::contains("Dry run"))
        .stdout(predicate::str::contains("\u{001b}[").not());

    assert!(!db_path.exists(), "dry-run should not create db");
}

#[test]
fn import_twice_is_idempotent() {
    let home = setup_temp_home();
    let file = write_sparkasse_csv(home.path(), "umsatz.csv", ROWS);

    let first = import_json(&home, &file).unwrap();
    assert_eq!(first["rows"], 3);
    assert_eq!(first["inserted"], 3);

    let second = import_json(&home, &file).unwrap();
    assert_eq!(second["inserted"], 0);
    assert_eq!(second["duplicates"].as_array().unwrap().len(), 3);
    assert_eq!(second["duplicates"][0]["line"], 2);

    assert_eq!(count_json(&home).unwrap(), 3);

    let conn = sqlite_helpers::open_conn(&home).unwrap();
    assert_eq!(sqlite_helpers::count_imports(&conn).unwrap(), 2);
}

#[test]
fn import_stores_unsigned_amount_and_direction() {
    let home = setup_temp_home();
    let file = write_sparkasse_csv(home.path(), "umsatz.csv", ROWS);
    import_json(&home, &file).unwrap();

    let conn = sqlite_helpers::open_conn(&home).unwrap();
    let amounts = sqlite_helpers::list_amounts(&conn).unwrap();
    assert_eq!(
        amounts,
        vec![
            ("850.00".to_string(), "debit".to_string()),
            ("2450.00".to_string(), "credit".to_string()),
            ("12.50".to_string(), "debit".to_string()),
        ]
    );

    let details = sqlite_helpers::details_of(&conn, 1).unwrap();
    assert!(details.contains(&(
        "beguenstigter/zahlungspflichtiger".to_string(),
        "Hausverwaltung Müller".to_string()
    )));
    assert!(details.contains(&("verwendungszweck".to_string(), "Miete März".to_string())));
}

#[test]
fn detail_types_lists_unmapped_columns() {
    let home = setup_temp_home();
    let file = write_sparkasse_csv(home.path(), "umsatz.csv", ROWS);
    import_json(&home, &file).unwrap();

    let mut cmd = cli_helpers::base_cmd(&home);
    cmd.arg("detail-types");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("auftragskonto"))
        .stdout(predicate::str::contains("kontonummer/iban"))
        .stdout(predicate::str::contains("info"))
        .stdout(predicate::str::contains("betrag").not());
}

#[test]
fn import_missing_file_fails_with_error() {
    let home = setup_temp_home();

    let mut cmd = cli_helpers::base_cmd(&home);
    cmd.arg("import").arg(home.path().join("missing.csv"));
    cmd.assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Error:"))
        .stderr(predicate::str::contains("file not found"));
}

#[test]
fn import_missing_amount_column_names_header() {
    let home = setup_temp_home();
    let path = home.path().join("broken.csv");
    std::fs::write(&path, "Buchungstag;Valutadatum;Verwendungszweck\n01.03.24;01.03.24;x\n").unwrap();

    let mut cmd = cli_helpers::base_cmd(&home);
    cmd.arg("import").arg(&path);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("'amount'"))
        .stderr(predicate::str::contains("betrag"));
}

#[test]
fn import_uses_default_profile_and_flag_overrides() {
    let home = setup_temp_home();
    write_default_profile(
        &home,
        r#"
        [csv]
        separator = ","
        encoding = "utf-8"
        decimal_separator = "."

        [columns]
        amount = "Amount"
        booking_date = "Date"
        value_date = "Date Valued"
        date_format = "%Y-%m-%d"
        uniqueness = ["Payee"]
        "#,
    );
    let path = home.path().join("export.csv");
    std::fs::write(
        &path,
        "Date,Date Valued,Amount,Payee,Memo\n2024-03-01,2024-03-02,-9.99,Streaming Co,March\n",
    )
    .unwrap();

    let value = import_json(&home, &path).unwrap();
    assert_eq!(value["inserted"], 1);

    // the memo is not part of the uniqueness set, so this is the same row
    std::fs::write(
        &path,
        "Date,Date Valued,Amount,Payee,Memo\n2024-03-01,2024-03-02,-9.99,Streaming Co,April\n",
    )
    .unwrap();
    let value = import_json(&home, &path).unwrap();
    assert_eq!(value["inserted"], 0);

    // unless the memo is made a uniqueness column on the command line
    let path_str = path.to_string_lossy();
    let value = cli_helpers::run_cmd_json(
        &home,
        &["--json", "import", path_str.as_ref(), "--unique", "Memo"],
    )
    .unwrap();
    assert_eq!(value["inserted"], 1);
}

#[test]
fn profile_prints_effective_toml() {
    let home = setup_temp_home();

    let mut cmd = cli_helpers::base_cmd(&home);
    cmd.args(["profile", "--separator", ","]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("[csv]"))
        .stdout(predicate::str::contains("separator = \",\""))
        .stdout(predicate::str::contains("amount = \"betrag\""));
}
