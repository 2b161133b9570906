//! Header Sanitizer Module
//!
//! スプレッドシートの列名を、BigQueryなどのカラムナ型データウェアハウスで
//! 安全に使用できる識別子へ変換するモジュール。

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::api::CollisionPolicy;
use crate::error::XlsxToJsonlError;

/// 列名をサニタイズする
///
/// 以下の順序で変換します（順序は結果の決定性に影響します）。
///
/// 1. 小文字に変換
/// 2. 連続する空白文字を1つのアンダースコアに置換
/// 3. `[a-z0-9_]` 以外の文字を削除（`.`、`(`、`)`、`+`、`/`などは置換せず削除）
///
/// すべての文字列に対して定義される全域関数で、結果は常に `[a-z0-9_]*` に一致します。
/// 空でないことや一意であることは保証しません（[`HeaderSanitizer`]を参照）。
///
/// # 使用例
///
/// ```rust
/// use xlsxjsonl::sanitize_column_name;
///
/// assert_eq!(sanitize_column_name("Customer Name"), "customer_name");
/// assert_eq!(sanitize_column_name("Revenue (USD)"), "revenue_usd");
/// assert_eq!(sanitize_column_name("email.address+tag"), "emailaddresstag");
/// ```
pub fn sanitize_column_name(raw: &str) -> String {
    let lowered = raw.to_lowercase();

    let mut collapsed = String::with_capacity(lowered.len());
    let mut in_whitespace = false;
    for ch in lowered.chars() {
        if ch.is_whitespace() {
            if !in_whitespace {
                collapsed.push('_');
            }
            in_whitespace = true;
        } else {
            collapsed.push(ch);
            in_whitespace = false;
        }
    }

    collapsed
        .chars()
        .filter(|ch| matches!(ch, 'a'..='z' | '0'..='9' | '_'))
        .collect()
}

/// サニタイズ結果が空の場合の代替列名（`position`は1始まり）
fn fallback_name(position: usize) -> String {
    format!("column_{}", position)
}

/// ヘッダー行全体のサニタイザー
///
/// 各列名を[`sanitize_column_name`]で変換したうえで、
/// 空の結果には `column_<n>`（nは1始まりの列位置）を割り当て、
/// 衝突は[`CollisionPolicy`]に従って解決します。
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderSanitizer {
    collision_policy: CollisionPolicy,
}

impl HeaderSanitizer {
    /// 指定された衝突ポリシーでサニタイザーを生成
    pub fn new(collision_policy: CollisionPolicy) -> Self {
        Self { collision_policy }
    }

    /// ヘッダー行をサニタイズする
    ///
    /// # 戻り値
    ///
    /// * `Ok(Vec<String>)` - 一意なサニタイズ済み列名（元の列順）
    /// * `Err(XlsxToJsonlError::DuplicateColumn)` - `CollisionPolicy::Error`で衝突が検出された場合
    pub fn sanitize_headers<S: AsRef<str>>(
        &self,
        raw_headers: &[S],
    ) -> Result<Vec<String>, XlsxToJsonlError> {
        let base_names: Vec<String> = raw_headers
            .iter()
            .enumerate()
            .map(|(idx, raw)| {
                let sanitized = sanitize_column_name(raw.as_ref());
                if sanitized.is_empty() {
                    let fallback = fallback_name(idx + 1);
                    debug!(
                        "Column {} ('{}') sanitized to an empty name, using '{}'",
                        idx,
                        raw.as_ref(),
                        fallback
                    );
                    fallback
                } else {
                    sanitized
                }
            })
            .collect();

        match self.collision_policy {
            CollisionPolicy::Error => {
                let mut first_seen: HashMap<&str, usize> = HashMap::new();
                for (idx, name) in base_names.iter().enumerate() {
                    if let Some(&first) = first_seen.get(name.as_str()) {
                        return Err(XlsxToJsonlError::DuplicateColumn {
                            name: name.clone(),
                            first,
                            second: idx,
                        });
                    }
                    first_seen.insert(name.as_str(), idx);
                }
                Ok(base_names)
            }
            CollisionPolicy::Suffix => Ok(Self::resolve_with_suffix(base_names)),
        }
    }

    /// 重複した列名に連番の接尾辞を付与する
    ///
    /// 最初の出現はそのまま保持し、ヘッダー行に存在する名前は予約済みとして扱う。
    fn resolve_with_suffix(base_names: Vec<String>) -> Vec<String> {
        let mut taken: HashSet<String> = base_names.iter().cloned().collect();
        let mut seen: HashSet<String> = HashSet::new();
        let mut resolved = Vec::with_capacity(base_names.len());

        for name in base_names {
            if seen.insert(name.clone()) {
                resolved.push(name);
                continue;
            }

            let mut suffix = 2usize;
            let candidate = loop {
                let candidate = format!("{}_{}", name, suffix);
                if !taken.contains(&candidate) {
                    break candidate;
                }
                suffix += 1;
            };
            debug!("Duplicate column '{}' renamed to '{}'", name, candidate);
            taken.insert(candidate.clone());
            seen.insert(candidate.clone());
            resolved.push(candidate);
        }

        resolved
    }
}
