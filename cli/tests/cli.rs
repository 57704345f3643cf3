use assert_cmd::Command;
use predicates::prelude::*;
use std::fs::write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const SENTENCE: &str = "1\tLe\tle\tDET\t_\tDefinite=Def\t2\tdet\t_\t_
2\tchat\tchat\tNOUN\t_\tGender=Masc\t0\troot\t_\t_
";

fn corpus(dir: &Path, name: &str, n_sentences: usize) -> PathBuf {
    let path = dir.join(name);
    write(&path, vec![SENTENCE; n_sentences].join("\n")).unwrap();
    path
}

fn morpheval(gold: &Path, pred: &Path) -> Command {
    let mut cmd = Command::cargo_bin("morpheval").unwrap();
    cmd.env("RUST_LOG", "off").arg("-g").arg(gold).arg("-p").arg(pred);
    cmd
}

#[test]
fn test_duplicate_filter_key_is_reported_without_logs() {
    let dir = TempDir::new().unwrap();
    let gold = corpus(dir.path(), "gold.conllu", 1);
    morpheval(&gold, &gold)
        .args(["-f", "upos=NOUN;upos=VERB"])
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains(
            "Error: incorrect filter (\"upos\" mentioned at least twice)",
        ));
}

#[test]
fn test_corpus_length_mismatch_is_reported_without_logs() {
    let dir = TempDir::new().unwrap();
    let gold = corpus(dir.path(), "gold.conllu", 2);
    let pred = corpus(dir.path(), "pred.conllu", 1);
    morpheval(&gold, &pred).assert().code(1).stderr(predicate::str::contains(
        "number of sentences in corpora isn't equal: len(gold)==2, len(pred)==1",
    ));
}

#[test]
fn test_table_on_stdout() {
    let dir = TempDir::new().unwrap();
    let gold = corpus(dir.path(), "gold.conllu", 2);
    morpheval(&gold, &gold)
        .arg("-s")
        .assert()
        .success()
        .stdout(predicate::str::contains("UPOS=NOUN"))
        .stdout(predicate::str::contains("Gender=Masc"))
        .stderr(predicate::str::is_empty());
}

#[test]
fn test_jsonl_output() {
    let dir = TempDir::new().unwrap();
    let gold = corpus(dir.path(), "gold.conllu", 1);
    morpheval(&gold, &gold)
        .args(["--format", "jsonl"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""kind":"metric""#))
        .stdout(predicate::str::contains(r#""kind":"summary""#))
        .stdout(predicate::str::contains(r#""name":"UPOS=DET""#));
}
