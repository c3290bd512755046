use chrono::NaiveDate;
use rivals::{load_dataset, DatasetError, Platform};
use rusqlite::Connection;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write_csv(path: &Path, header: &str, rows: &[&str]) {
    let mut out = String::new();
    out.push_str(header);
    out.push('\n');
    for row in rows {
        out.push_str(row);
        out.push('\n');
    }
    fs::write(path, out).unwrap();
}

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn csv_with_english_headers() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("subs.csv");
    write_csv(
        &path,
        "competitor,date,vk,telegram,instagram",
        &[
            "Alpha,2024-03-01,100,20,5",
            "Beta,2024-03-01,300,,7",
            "Alpha,2024-03-02,120,25,5",
        ],
    );

    let dataset = load_dataset(&path, "subscribers").unwrap();
    assert_eq!(dataset.len(), 3);
    assert_eq!(dataset.competitors(), vec!["Alpha", "Beta"]);

    let beta = &dataset.records()[1];
    assert_eq!(beta.date, ymd(2024, 3, 1));
    assert_eq!(beta.count(Platform::Vk), Some(300));
    assert_eq!(beta.count(Platform::Telegram), None);
}

#[test]
fn csv_with_original_russian_headers_and_dotted_dates() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("konkurent.csv");
    write_csv(
        &path,
        "Конкурент,Дата,ВК,Телеграмм,Инстаграмм",
        &["Альфа,01.03.2024,10,0,3", "Бета, 01.03.2024 ,4,5,"],
    );

    let dataset = load_dataset(&path, "subscribers").unwrap();
    assert_eq!(dataset.competitors(), vec!["Альфа", "Бета"]);
    assert_eq!(dataset.records()[1].date, ymd(2024, 3, 1));
    assert_eq!(dataset.records()[1].instagram_count, None);
    assert_eq!(dataset.records()[0].telegram_count, Some(0));
}

#[test]
fn csv_duplicate_key_fails_the_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("dup.csv");
    write_csv(
        &path,
        "competitor,date,vk,telegram,instagram",
        &["Alpha,2024-03-01,1,2,3", "Alpha,2024-03-01,4,5,6"],
    );

    let err = load_dataset(&path, "subscribers").unwrap_err();
    assert_eq!(
        err.downcast_ref::<DatasetError>(),
        Some(&DatasetError::DuplicateRecord {
            competitor: "Alpha".to_string(),
            date: ymd(2024, 3, 1),
        })
    );
}

#[test]
fn csv_bad_date_names_the_line() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.csv");
    write_csv(
        &path,
        "competitor,date,vk,telegram,instagram",
        &["Alpha,2024-03-01,1,2,3", "Alpha,yesterday,4,5,6"],
    );

    let err = load_dataset(&path, "subscribers").unwrap_err();
    assert_eq!(
        err.downcast_ref::<DatasetError>(),
        Some(&DatasetError::InvalidDate {
            line: 3,
            value: "yesterday".to_string(),
        })
    );
}

#[test]
fn csv_negative_count_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("neg.csv");
    write_csv(
        &path,
        "competitor,date,vk,telegram,instagram",
        &["Alpha,2024-03-01,1,-2,3"],
    );

    let err = load_dataset(&path, "subscribers").unwrap_err();
    assert!(matches!(
        err.downcast_ref::<DatasetError>(),
        Some(DatasetError::NegativeCount { column: "telegram", .. })
    ));
}

#[test]
fn missing_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    assert!(load_dataset(&dir.path().join("absent.csv"), "subscribers").is_err());
}

#[test]
fn sqlite_table_in_rowid_order_with_nulls() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("subs.db");
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TABLE stats (competitor TEXT, date TEXT, vk INTEGER, telegram INTEGER, instagram INTEGER);
         INSERT INTO stats VALUES ('Beta', '2024-03-02', 500, NULL, 10);
         INSERT INTO stats VALUES ('Alpha', '2024-03-01', 100, 20, NULL);",
    )
    .unwrap();
    drop(conn);

    let dataset = load_dataset(&path, "stats").unwrap();
    assert_eq!(dataset.competitors(), vec!["Beta", "Alpha"]);
    assert_eq!(dataset.records()[0].telegram_count, None);
    assert_eq!(dataset.records()[1].vk_count, Some(100));
}

#[test]
fn sqlite_rejects_suspicious_table_names() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("subs.sqlite");
    Connection::open(&path)
        .unwrap()
        .execute_batch("CREATE TABLE subscribers (competitor TEXT, date TEXT, vk INTEGER, telegram INTEGER, instagram INTEGER);")
        .unwrap();

    assert!(load_dataset(&path, "subscribers; DROP TABLE subscribers").is_err());
    assert!(load_dataset(&path, "subscribers").unwrap().is_empty());
}

#[test]
fn xlsx_fixture_with_original_headers() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/konkurent.xlsx");

    let dataset = load_dataset(&path, "subscribers").unwrap();
    assert_eq!(dataset.len(), 3);
    assert_eq!(dataset.competitors(), vec!["Альфа", "Бета"]);

    let alpha = &dataset.records()[0];
    assert_eq!(alpha.date, ymd(2024, 3, 1));
    assert_eq!(alpha.count(Platform::Vk), Some(100));
    assert_eq!(alpha.count(Platform::Instagram), None);

    // Text date cell and an explicit zero
    let beta = &dataset.records()[1];
    assert_eq!(beta.date, ymd(2024, 3, 1));
    assert_eq!(beta.count(Platform::Telegram), Some(0));
    assert_eq!(beta.count(Platform::Instagram), Some(7));

    assert_eq!(dataset.records()[2].date, ymd(2024, 3, 2));
}

#[test]
fn xlsx_that_is_not_a_workbook_fails() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.xlsx");
    fs::write(&path, "not a zip archive").unwrap();

    assert!(load_dataset(&path, "subscribers").is_err());
}
