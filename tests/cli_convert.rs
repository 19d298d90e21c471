use std::fs;

use bookscrape::formats::ConvertedBook;
use predicates::prelude::*;

#[test]
fn convert_writes_one_object_per_row() -> anyhow::Result<()> {
    let temp = tempfile::TempDir::new()?;
    let input = temp.path().join("books_with_tags.csv");
    let out = temp.path().join("books.json");
    fs::write(
        &input,
        "\u{feff}제목,저자,출판사,출판년도,분량,줄거리,태그\n\
         코스모스,칼 세이건,사이언스북스,2006,719,우주의 역사,\"과학,2만원 이상|★4.5~5\"\n\
         이기적 유전자,리처드 도킨스,을유문화사,2018,,,과학/1~2만원\n",
    )?;

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("bookscrape");
    cmd.args([
        "convert",
        "--input",
        input.to_str().unwrap(),
        "--out",
        out.to_str().unwrap(),
    ])
    .assert()
    .success()
    .stdout(predicate::str::contains("converted 2 rows"));

    let books: Vec<ConvertedBook> = serde_json::from_str(&fs::read_to_string(&out)?)?;
    assert_eq!(books.len(), 2);
    assert_eq!(books[0].title, "코스모스");
    assert_eq!(books[0].year, "2006");
    assert_eq!(books[0].pages, "719");
    assert_eq!(books[0].description, "우주의 역사");
    assert_eq!(books[0].tags, vec!["과학", "2만원 이상", "★4.5~5"]);
    assert_eq!(books[1].author, "리처드 도킨스");
    assert_eq!(books[1].pages, "");
    assert_eq!(books[1].tags, vec!["과학", "1~2만원"]);
    Ok(())
}

#[test]
fn convert_fails_on_missing_input() -> anyhow::Result<()> {
    let temp = tempfile::TempDir::new()?;

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("bookscrape");
    cmd.args([
        "convert",
        "--input",
        temp.path().join("missing.csv").to_str().unwrap(),
        "--out",
        temp.path().join("books.json").to_str().unwrap(),
    ])
    .assert()
    .failure()
    .stderr(predicate::str::contains("read csv"));
    Ok(())
}

#[test]
fn convert_overwrites_with_force() -> anyhow::Result<()> {
    let temp = tempfile::TempDir::new()?;
    let input = temp.path().join("in.csv");
    let out = temp.path().join("books.json");
    fs::write(&input, "title,tags\nCosmos,science\n")?;
    fs::write(&out, "stale")?;

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("bookscrape");
    cmd.args([
        "convert",
        "--input",
        input.to_str().unwrap(),
        "--out",
        out.to_str().unwrap(),
    ])
    .assert()
    .failure();

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("bookscrape");
    cmd.args([
        "convert",
        "--input",
        input.to_str().unwrap(),
        "--out",
        out.to_str().unwrap(),
        "--force",
    ])
    .assert()
    .success();

    let books: Vec<ConvertedBook> = serde_json::from_str(&fs::read_to_string(&out)?)?;
    assert_eq!(books[0].title, "Cosmos");
    Ok(())
}
