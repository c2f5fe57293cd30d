// rename_integration_tests.rs - ファイルリネームと名前空間伝播の統合テスト

use cljr::{CljrConfig, Outcome, SkipReason, Workspace};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

fn write(root: &Path, relative: &str, content: &str) -> PathBuf {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, content).unwrap();
    path
}

fn sample_project() -> (TempDir, PathBuf) {
    let dir = tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    write(&root, "project.clj", "(defproject shop \"0.1.0\")\n");
    write(
        &root,
        "src/shop/cart.clj",
        "(ns shop.cart\n  (:require [shop.pricing :as p]))\n\n(defn total [items] (p/sum items))\n",
    );
    write(
        &root,
        "src/shop/pricing.clj",
        "(ns shop.pricing)\n\n(defn sum [xs] (reduce + xs))\n",
    );
    write(
        &root,
        "test/shop/pricing_test.clj",
        "(ns shop.pricing-test\n  (:use shop.pricing\n        clojure.test))\n\n(deftest s (is (= 3 (shop.pricing/sum [1 2]))))\n",
    );
    write(&root, ".git/shop/pricing.clj", "(ns shop.pricing)\n");
    write(&root, "resources/notes.md", "shop.pricing is described here\n");
    (dir, root)
}

#[test]
fn test_rename_propagates_across_project() {
    let (_dir, root) = sample_project();
    let mut workspace = Workspace::new(CljrConfig::default()).unwrap();

    workspace.open_file(root.join("src/shop/pricing.clj")).unwrap();
    let report = workspace.rename_file("price_rules.clj").unwrap();

    assert_eq!(report.new_ns.as_deref(), Some("shop.price-rules"));
    assert_eq!(
        report.message,
        "File 'pricing.clj' successfully renamed to 'price_rules.clj'"
    );

    let Outcome::Succeeded(replaced) = &report.propagation else {
        panic!("propagation did not succeed: {:?}", report.propagation);
    };
    assert_eq!(replaced.replacements, 3);
    assert_eq!(replaced.files_changed.len(), 2);

    assert_eq!(
        fs::read_to_string(root.join("src/shop/cart.clj")).unwrap(),
        "(ns shop.cart\n  (:require [shop.price-rules :as p]))\n\n(defn total [items] (p/sum items))\n"
    );
    assert_eq!(
        fs::read_to_string(root.join("test/shop/pricing_test.clj")).unwrap(),
        "(ns shop.pricing-test\n  (:use shop.price-rules\n        clojure.test))\n\n(deftest s (is (= 3 (shop.price-rules/sum [1 2]))))\n"
    );
    assert_eq!(
        fs::read_to_string(root.join("src/shop/price_rules.clj")).unwrap(),
        "(ns shop.price-rules)\n\n(defn sum [xs] (reduce + xs))\n"
    );

    // 対象外のディレクトリと拡張子は変更しない
    assert_eq!(
        fs::read_to_string(root.join(".git/shop/pricing.clj")).unwrap(),
        "(ns shop.pricing)\n"
    );
    assert_eq!(
        fs::read_to_string(root.join("resources/notes.md")).unwrap(),
        "shop.pricing is described here\n"
    );
}

#[test]
fn test_rename_into_other_directory() {
    let (_dir, root) = sample_project();
    let mut workspace = Workspace::new(CljrConfig::default()).unwrap();

    workspace.open_file(root.join("src/shop/cart.clj")).unwrap();
    let report = workspace.rename_file("../checkout/basket.clj").unwrap();

    assert_eq!(report.new_path, root.join("src/checkout/basket.clj"));
    assert_eq!(report.new_ns.as_deref(), Some("checkout.basket"));
    assert_eq!(workspace.current_buffer().unwrap().name(), "basket.clj");
    assert!(fs::read_to_string(&report.new_path)
        .unwrap()
        .starts_with("(ns checkout.basket\n"));
}

#[test]
fn test_move_between_source_roots_keeps_namespace() {
    let (_dir, root) = sample_project();
    let mut workspace = Workspace::new(CljrConfig::default()).unwrap();

    workspace.open_file(root.join("src/shop/pricing.clj")).unwrap();
    let report = workspace
        .rename_file("../../test/shop/pricing.clj")
        .unwrap();

    assert_eq!(
        report.propagation.skip_reason(),
        Some(&SkipReason::Unchanged)
    );
    assert!(report.saved.is_empty());
    assert!(root.join("test/shop/pricing.clj").is_file());
}

#[test]
fn test_custom_project_marker() {
    let dir = tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    write(&root, "deps.edn", "{:paths [\"src\"]}\n");
    write(&root, "src/app/a.clj", "(ns app.a)\n");
    write(&root, "src/app/b.clj", "(ns app.b (:require app.a))\n");

    let config = CljrConfig {
        project_marker: "deps.edn".to_string(),
        ..CljrConfig::default()
    };
    let mut workspace = Workspace::new(config).unwrap();
    workspace.open_file(root.join("src/app/a.clj")).unwrap();
    let report = workspace.rename_file("alpha.clj").unwrap();

    assert!(report.propagation.is_succeeded());
    assert_eq!(
        fs::read_to_string(root.join("src/app/b.clj")).unwrap(),
        "(ns app.b (:require app.alpha))\n"
    );
}

#[test]
fn test_rename_rewrites_quoted_and_keyword_references() {
    let dir = tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    write(&root, "project.clj", "(defproject app \"0.1.0\")\n");
    write(&root, "src/app/db.clj", "(ns app.db)\n\n(defn conn [] ::app.db/conn)\n");
    write(
        &root,
        "src/app/repl.clj",
        "(ns app.repl)\n\n(require 'app.db)\n(alter-var-root #'app.db/conn identity)\n(def k :app.db/conn)\n(def s 'app.dbx)\n",
    );

    let mut workspace = Workspace::new(CljrConfig::default()).unwrap();
    workspace.open_file(root.join("src/app/db.clj")).unwrap();
    let report = workspace.rename_file("store.clj").unwrap();

    let Outcome::Succeeded(replaced) = &report.propagation else {
        panic!("propagation did not succeed: {:?}", report.propagation);
    };
    assert_eq!(replaced.replacements, 4);
    assert_eq!(
        fs::read_to_string(root.join("src/app/repl.clj")).unwrap(),
        "(ns app.repl)\n\n(require 'app.store)\n(alter-var-root #'app.store/conn identity)\n(def k :app.store/conn)\n(def s 'app.dbx)\n"
    );
    assert_eq!(
        fs::read_to_string(root.join("src/app/store.clj")).unwrap(),
        "(ns app.store)\n\n(defn conn [] ::app.store/conn)\n"
    );
}
