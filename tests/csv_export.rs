#[path = "common/mod.rs"]
mod common;

use common::*;
use rharvest::{
    append_threads_to_path, normalize, read_done_urls, read_url_column, thread_rows, write_threads,
    write_threads_to_path, CSV_HEADER,
};
use serde_json::json;
use std::fs;

fn parse_csv(text: &str) -> Vec<Vec<String>> {
    csv::ReaderBuilder::new()
        .has_headers(false)
        .from_reader(text.as_bytes())
        .records()
        .map(|r| r.unwrap().iter().map(str::to_string).collect())
        .collect()
}

#[test]
fn header_has_the_documented_column_order() {
    assert_eq!(
        CSV_HEADER.join(","),
        "url,title,subreddit,post_id,author,post_score,num_comments,\
         comment_author,comment_body,comment_score,comment_depth"
    );
}

/// One row per comment, post fields repeated, in flattened order.
#[test]
fn rows_repeat_post_fields_per_comment() {
    let thread = normalize(&mixed_tree()).unwrap();
    let rows = thread_rows(&thread);
    assert_eq!(rows.len(), 6);
    assert!(rows.iter().all(|r| r.post_id == "p1" && r.title == "mixed" && r.post_score == 42));
    let authors: Vec<&str> = rows.iter().map(|r| r.comment_author).collect();
    assert_eq!(authors, vec!["alice", "bob", "carol", "dave", "erin", "frank"]);
    let depths: Vec<usize> = rows.iter().map(|r| r.comment_depth).collect();
    assert_eq!(depths, vec![0, 1, 2, 1, 0, 1]);
}

/// Delimiters, quotes and newlines in text fields are quoted and survive a read back.
#[test]
fn text_fields_are_quoted_and_round_trip() {
    let tricky = "he said \"hi\", then left\nsecond line";
    let raw = document(
        post("p1", "title, with comma", 1),
        vec![comment("a", "t3_p1", "alice", tricky, -3, vec![])],
    );
    let thread = normalize(&raw).unwrap();

    let mut buf = Vec::new();
    let n = write_threads(&mut buf, &[thread]).unwrap();
    assert_eq!(n, 1);

    let text = String::from_utf8(buf).unwrap();
    assert!(text.contains("\"title, with comma\""));
    assert!(text.contains("\"\"hi\"\""));

    let records = parse_csv(&text);
    assert_eq!(records.len(), 2);
    assert_eq!(records[0], CSV_HEADER.iter().map(|s| s.to_string()).collect::<Vec<_>>());
    assert_eq!(records[1][1], "title, with comma");
    assert_eq!(records[1][8], tricky);
    assert_eq!(records[1][9], "-3");
    assert_eq!(records[1][10], "0");
}

#[test]
fn thread_without_comments_writes_only_the_header() {
    let raw = json!([post("p1", "quiet", 0), listing(vec![more(&["x"])])]);
    let thread = normalize(&raw).unwrap();
    assert!(thread_rows(&thread).is_empty());

    let mut buf = Vec::new();
    assert_eq!(write_threads(&mut buf, &[thread]).unwrap(), 0);
    assert_eq!(parse_csv(&String::from_utf8(buf).unwrap()).len(), 1);
}

#[test]
fn path_writers_and_readers_agree() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out.csv");
    let thread = normalize(&mixed_tree()).unwrap();

    assert_eq!(write_threads_to_path(&out, &[thread.clone()]).unwrap(), 6);
    assert!(!dir.path().join("out.csv.tmp").exists(), "temp file is promoted");

    // Appending to an existing export must not repeat the header.
    let appended = dir.path().join("appended.csv");
    append_threads_to_path(&appended, &[]).unwrap();
    append_threads_to_path(&appended, &[thread.clone()]).unwrap();
    append_threads_to_path(&appended, &[thread]).unwrap();
    let records = parse_csv(&fs::read_to_string(&appended).unwrap());
    assert_eq!(records.len(), 1 + 12);
    assert_eq!(records.iter().filter(|r| r[0] == "url").count(), 1);

    let done = read_done_urls(&appended).unwrap();
    assert_eq!(done.len(), 1);
    assert!(done.contains("https://www.reddit.com/r/rust/comments/p1/t/"));
    assert!(read_done_urls(&dir.path().join("missing.csv")).unwrap().is_empty());
}

#[test]
fn url_column_is_read_by_name_and_blanks_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.csv");
    fs::write(&input, "id,URL,note\n1,https://a.example/x/,first\n2,,blank\n3, https://b.example/y/ ,\"quoted, note\"\n").unwrap();

    let urls = read_url_column(&input, "URL").unwrap();
    assert_eq!(urls, vec!["https://a.example/x/", "https://b.example/y/"]);

    let err = read_url_column(&input, "link").unwrap_err();
    assert!(err.to_string().contains("column 'link' not found"));
}
