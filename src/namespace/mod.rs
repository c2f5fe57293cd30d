//! 名前空間宣言の操作
//!
//! `(ns ...)` フォームの検出、ファイルパスから期待される名前空間の導出、
//! 名前空間名の更新、`:require` / `:use` / `:import` 節への挿入位置決めを提供

pub mod clause;
pub mod sexp;

pub use clause::{insert_in_ns, ClauseKind};
pub use sexp::CodeMap;

use crate::buffer::Buffer;
use crate::error::{NamespaceError, Result};
use crate::file::path::{file_stem, relative_to};
use regex::Regex;
use std::ops::Range;
use std::path::{Component, Path};
use std::sync::OnceLock;

fn ns_regex() -> &'static Regex {
    static NS_REGEX: OnceLock<Regex> = OnceLock::new();
    NS_REGEX.get_or_init(|| {
        Regex::new(
            r#"(?m)^\((?:clojure\.core/)?ns\s+(?:(?:#?\^\{[^}]*\}|\^:?[^\s()\[\]{}]+)\s+)*([^\s,()\[\]{}"]+)"#,
        )
        .expect("namespace regex is valid")
    })
}

fn test_ns_regex() -> &'static Regex {
    static TEST_NS_REGEX: OnceLock<Regex> = OnceLock::new();
    TEST_NS_REGEX.get_or_init(|| Regex::new(r"test\..+").expect("test namespace regex is valid"))
}

/// 検出した ns フォームの位置（文字インデックス）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NsForm {
    /// 開き括弧の位置
    pub start: usize,
    /// 名前の開始位置
    pub name_start: usize,
    /// 名前の終了位置（排他的）
    pub name_end: usize,
    /// 名前空間名
    pub name: String,
}

/// テキスト中で最初の（文字列・コメント外の）ns フォームを探す
pub fn find_ns_form(text: &str) -> Option<NsForm> {
    let map = CodeMap::new(text);
    ns_regex().captures_iter(text).find_map(|captures| {
        let whole = captures.get(0)?;
        let name = captures.get(1)?;
        let start = text[..whole.start()].chars().count();
        if !map.is_code(start) {
            return None;
        }
        let name_start = text[..name.start()].chars().count();
        Some(NsForm {
            start,
            name_start,
            name_end: name_start + name.as_str().chars().count(),
            name: name.as_str().to_string(),
        })
    })
}

/// 現在の名前空間名
pub fn find_ns(text: &str) -> Option<String> {
    find_ns_form(text).map(|form| form.name)
}

/// ファイルパスから期待される名前空間名を導出する
///
/// プロジェクトルートからの相対パスの先頭ディレクトリ（`src`、`test` など）を除き、
/// 拡張子を外して `/` を `.`、`_` を `-` に置き換える。
/// ルートがない場合は最後の `src` / `test` ディレクトリ以降を使う
pub fn expected_ns(file: &Path, project_root: Option<&Path>) -> Result<String> {
    let underivable = || NamespaceError::Underivable {
        path: file.display().to_string(),
    };

    let mut parts: Vec<String> = match project_root.and_then(|root| relative_to(file, root)) {
        Some(relative) => normal_components(&relative).into_iter().skip(1).collect(),
        None => {
            let all = normal_components(file);
            match all.iter().rposition(|c| c == "src" || c == "test") {
                Some(index) => all[index + 1..].to_vec(),
                None => Vec::new(),
            }
        }
    };

    if parts.is_empty() {
        parts.push(file.file_name().ok_or_else(underivable)?.to_string_lossy().into_owned());
    }

    if let Some(last) = parts.last_mut() {
        *last = file_stem(last.as_str()).ok_or_else(underivable)?;
    }

    let ns = parts.join(".").replace('_', "-");
    if ns.is_empty() {
        return Err(underivable().into());
    }
    Ok(ns)
}

fn normal_components(path: &Path) -> Vec<String> {
    path.components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect()
}

/// ns フォームの名前を書き換える。変更があれば `true`
pub fn update_ns(buffer: &mut Buffer, ns: &str) -> Result<bool> {
    let form = find_ns_form(buffer.text()).ok_or(NamespaceError::NotFound)?;
    if form.name == ns {
        return Ok(false);
    }
    buffer.replace_range(form.name_start, form.name_end, ns)?;
    Ok(true)
}

/// バッファ先頭に ns フォームを挿入し、ポイントをその直後に置く
pub fn insert_ns_form(buffer: &mut Buffer, ns: &str) {
    buffer.goto_char(0);
    buffer.insert(&format!("(ns {})", ns));
}

/// テストファイルかどうか
pub fn in_tests(file: &Path, ns: &str, test_suffix: &str) -> bool {
    let by_file = file_stem(file)
        .map(|stem| stem.ends_with(test_suffix))
        .unwrap_or(false);
    by_file || test_ns_regex().is_match(ns)
}

/// テスト名前空間からテスト対象の名前空間を求める（`-test` 接尾辞を除く）
pub fn strip_test_suffix(ns: &str, test_suffix: &str) -> String {
    let suffix = test_suffix.replace('_', "-");
    ns.strip_suffix(suffix.as_str()).unwrap_or(ns).to_string()
}

/// `text` 中のシンボル `old` の出現位置（バイト範囲）
///
/// シンボルの一部分（`foo.bar` に対する `foo.bar-test` など）は含めない。
/// `foo.bar/f` のような修飾名の名前空間部分と、`'foo.bar` `#'foo.bar/f`
/// `:foo.bar/k` のような接頭辞付きの参照は含める
pub fn symbol_occurrences(text: &str, old: &str) -> Vec<Range<usize>> {
    if old.is_empty() {
        return Vec::new();
    }

    let mut found: Vec<Range<usize>> = Vec::new();
    for (start, matched) in text.match_indices(old) {
        let end = start + matched.len();
        let before_ok = starts_symbol(&text[..start]);
        let after_ok = text[end..]
            .chars()
            .next()
            .map(|c| c == '/' || !sexp::is_symbol_char(c))
            .unwrap_or(true);
        if before_ok && after_ok {
            found.push(start..end);
        }
    }
    found
}

/// `preceding` の直後からシンボルが始まるか
///
/// `'` `#'` `::` などのリーダーマクロ接頭辞は読み飛ばす
fn starts_symbol(preceding: &str) -> bool {
    let unprefixed = preceding.trim_end_matches(sexp::is_reader_prefix_char);
    unprefixed
        .chars()
        .next_back()
        .map(|c| !sexp::is_symbol_char(c))
        .unwrap_or(true)
}

/// `text` 中のシンボル `old` をすべて `new` に置き換え、置換数を返す
pub fn replace_symbol(text: &str, old: &str, new: &str) -> (String, usize) {
    let occurrences = symbol_occurrences(text, old);
    let mut output = String::with_capacity(text.len());
    let mut last = 0;
    for range in &occurrences {
        output.push_str(&text[last..range.start]);
        output.push_str(new);
        last = range.end;
    }
    output.push_str(&text[last..]);
    (output, occurrences.len())
}

/// バッファ中のシンボル `old` を `new` に置き換える
///
/// 後ろから置き換えるのでポイントとマークは編集に追従する
pub fn replace_symbol_in_buffer(buffer: &mut Buffer, old: &str, new: &str) -> Result<usize> {
    let occurrences = symbol_occurrences(buffer.text(), old);
    for range in occurrences.iter().rev() {
        let start = buffer.byte_to_char(range.start);
        let end = buffer.byte_to_char(range.end);
        buffer.replace_range(start, end, new)?;
    }
    Ok(occurrences.len())
}

/// 名前空間を扱う機能の差し替え口
pub trait NamespaceSupport {
    /// 現在の名前空間名
    fn find_ns(&self, text: &str) -> Option<String>;

    /// ファイルパスから期待される名前空間名
    fn expected_ns(&self, file: &Path, project_root: Option<&Path>) -> Result<String>;

    /// ns フォームの名前を書き換える
    fn update_ns(&self, buffer: &mut Buffer, ns: &str) -> Result<bool>;

    /// 既定の ns フォームを挿入する
    fn insert_ns_form(&self, buffer: &mut Buffer, ns: &str);

    /// テストファイルかどうか
    fn in_tests(&self, file: &Path, ns: &str) -> bool;

    /// テスト名前空間に対応する本体の名前空間
    fn non_test_ns(&self, ns: &str) -> String;
}

/// Clojure 用の既定実装
#[derive(Debug, Clone)]
pub struct ClojureNamespace {
    test_suffix: String,
}

impl ClojureNamespace {
    pub fn new(test_suffix: impl Into<String>) -> Self {
        Self {
            test_suffix: test_suffix.into(),
        }
    }
}

impl Default for ClojureNamespace {
    fn default() -> Self {
        Self::new("_test")
    }
}

impl NamespaceSupport for ClojureNamespace {
    fn find_ns(&self, text: &str) -> Option<String> {
        find_ns(text)
    }

    fn expected_ns(&self, file: &Path, project_root: Option<&Path>) -> Result<String> {
        expected_ns(file, project_root)
    }

    fn update_ns(&self, buffer: &mut Buffer, ns: &str) -> Result<bool> {
        update_ns(buffer, ns)
    }

    fn insert_ns_form(&self, buffer: &mut Buffer, ns: &str) {
        insert_ns_form(buffer, ns)
    }

    fn in_tests(&self, file: &Path, ns: &str) -> bool {
        in_tests(file, ns, &self.test_suffix)
    }

    fn non_test_ns(&self, ns: &str) -> String {
        strip_test_suffix(ns, &self.test_suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn finds_plain_and_annotated_ns() {
        assert_eq!(find_ns("(ns app.core)"), Some("app.core".to_string()));
        assert_eq!(
            find_ns(";; header\n(ns ^:no-doc app.impl\n  (:require [a.b :as b]))"),
            Some("app.impl".to_string())
        );
        assert_eq!(
            find_ns("(ns ^{:author \"me\"} app.meta)"),
            Some("app.meta".to_string())
        );
        assert_eq!(find_ns("(def x 1)"), None);
    }

    #[test]
    fn ignores_ns_inside_strings() {
        let text = "(def s \"\n(ns fake.ns)\")\n(ns real.ns)";
        assert_eq!(find_ns(text), Some("real.ns".to_string()));
    }

    #[test]
    fn ns_form_positions_are_char_indices() {
        let form = find_ns_form(";; é\n(ns app.core)").unwrap();
        assert_eq!(form.start, 5);
        assert_eq!(form.name_start, 9);
        assert_eq!(form.name_end, 17);
    }

    #[test]
    fn expected_ns_from_project_root() {
        let ns = expected_ns(
            Path::new("/p/src/my_app/http_server.clj"),
            Some(Path::new("/p")),
        )
        .unwrap();
        assert_eq!(ns, "my-app.http-server");

        let ns = expected_ns(Path::new("/p/test/app/core_test.clj"), Some(Path::new("/p"))).unwrap();
        assert_eq!(ns, "app.core-test");
    }

    #[test]
    fn expected_ns_without_project_root() {
        let ns = expected_ns(Path::new("/home/me/work/src/app/util.clj"), None).unwrap();
        assert_eq!(ns, "app.util");

        let ns = expected_ns(Path::new("/tmp/scratch.clj"), None).unwrap();
        assert_eq!(ns, "scratch");
    }

    #[test]
    fn update_ns_rewrites_name_only() {
        let mut buffer = Buffer::from_str("a", "(ns old.name\n  (:use old.name.util))");
        assert!(update_ns(&mut buffer, "new.name").unwrap());
        assert_eq!(buffer.text(), "(ns new.name\n  (:use old.name.util))");
        assert!(!update_ns(&mut buffer, "new.name").unwrap());

        let mut empty = Buffer::new("b");
        assert!(update_ns(&mut empty, "x").is_err());
    }

    #[test]
    fn test_detection() {
        assert!(in_tests(Path::new("test/app/core_test.clj"), "app.core-test", "_test"));
        assert!(in_tests(Path::new("t/app/core.clj"), "app.test.core", "_test"));
        assert!(!in_tests(Path::new("src/app/core.clj"), "app.core", "_test"));
        assert_eq!(strip_test_suffix("app.core-test", "_test"), "app.core");
        assert_eq!(strip_test_suffix("app.core", "_test"), "app.core");
    }

    #[test]
    fn replace_symbol_respects_boundaries() {
        let text = "(ns x (:require [foo.bar :as b] [foo.bar-test] foo.barn))\n(foo.bar/f)";
        let (replaced, count) = replace_symbol(text, "foo.bar", "foo.baz");
        assert_eq!(count, 3);
        assert_eq!(
            replaced,
            "(ns x (:require [foo.baz :as b] [foo.bar-test] foo.barn))\n(foo.baz/f)"
        );
    }

    #[test]
    fn replace_symbol_through_reader_prefixes() {
        let text = "(require 'foo.bar)\n(#'foo.bar/f)\n{:foo.bar/k 1 ::foo.bar/m 2}\n`(foo.bar/g ~@xs)\n(x'foo.bar)";
        let (replaced, count) = replace_symbol(text, "foo.bar", "foo.baz");
        assert_eq!(count, 5);
        assert_eq!(
            replaced,
            "(require 'foo.baz)\n(#'foo.baz/f)\n{:foo.baz/k 1 ::foo.baz/m 2}\n`(foo.baz/g ~@xs)\n(x'foo.bar)"
        );

        let (untouched, count) = replace_symbol("(def x 'foo.bar')", "foo.bar", "foo.baz");
        assert_eq!(count, 0);
        assert_eq!(untouched, "(def x 'foo.bar')");
    }

    #[test]
    fn replace_in_buffer_keeps_point_on_following_text() {
        let mut buffer = Buffer::from_str("b", "(ns a.b)\n(a.b/f)\n(g)");
        buffer.goto_char(17);
        assert_eq!(buffer.char_at(17), Some('('));

        let count = replace_symbol_in_buffer(&mut buffer, "a.b", "x.yz").unwrap();
        assert_eq!(count, 2);
        assert_eq!(buffer.text(), "(ns x.yz)\n(x.yz/f)\n(g)");
        assert_eq!(buffer.char_at(buffer.point()), Some('('));
        assert_eq!(buffer.point(), 19);
    }

    #[test]
    fn clojure_namespace_support_delegates() {
        let support = ClojureNamespace::default();
        let mut buffer = Buffer::visiting(PathBuf::from("/p/src/a/b.clj"), "");
        support.insert_ns_form(&mut buffer, "a.b");
        assert_eq!(buffer.text(), "(ns a.b)");
        assert_eq!(buffer.point(), 8);
        assert_eq!(support.find_ns(buffer.text()), Some("a.b".to_string()));
        assert_eq!(support.non_test_ns("a.b-test"), "a.b");
    }
}
