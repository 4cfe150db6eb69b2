//! 縦クロスワードの解決
//!
//! 検索文字列の各文字`q[i]`について、ある文字位置`p`に`q[i]`を持つ駅名を探します。
//! すべての文字について1件以上見つかった位置`p`が、縦クロスワードとして成立する位置です。
//!
//! 各文字の候補は、優先集合に含まれるレコードが先に、その他のレコードが後に並びます。
//! 位置は0から[`MAX_QUERY_LEN`]未満までを互いに独立に調べます。

use std::str::FromStr;

use hashbrown::HashSet;
use rayon::prelude::*;

use crate::corpus::Corpus;
use crate::index::PositionalIndex;
use crate::normalizer::{Query, MAX_QUERY_LEN};
use crate::region::PrioritySet;

/// 候補がどちらの範囲から採られたか
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Provenance {
    /// 優先集合(選択地域)から採られた
    Priority,
    /// 全国から補われた
    Fallback,
}

impl Provenance {
    /// 表示用のラベル
    pub const fn label(self) -> &'static str {
        match self {
            Self::Priority => "選択地域内",
            Self::Fallback => "全国",
        }
    }
}

/// 候補のレコード
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Hit {
    /// レコードID
    pub record_id: u32,
    /// 候補の出所
    pub provenance: Provenance,
}

/// 検索文字列の1文字に対する候補の列
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CharMatches {
    /// 検索文字列の文字
    pub query_char: char,
    /// 候補。優先集合のレコードが先に並びます。空になることはありません。
    pub hits: Vec<Hit>,
}

/// 縦クロスワードが成立した位置
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OffsetMatch {
    /// 0始まりの文字位置
    pub offset: usize,
    /// 検索文字列の文字ごとの候補。検索文字列と同じ順に並びます。
    pub groups: Vec<CharMatches>,
}

/// 縦クロスワードの解決結果
///
/// 成立した位置が昇順に並びます。どの位置も成立しなければ空です。
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Resolution {
    accepted: Vec<OffsetMatch>,
}

impl Resolution {
    /// 成立した位置
    pub fn accepted(&self) -> &[OffsetMatch] {
        &self.accepted
    }

    /// 1つ以上の位置で成立したかを返します。
    pub fn is_resolvable(&self) -> bool {
        !self.accepted.is_empty()
    }

    /// 成立した位置を取り出します。
    pub fn into_accepted(self) -> Vec<OffsetMatch> {
        self.accepted
    }
}

/// 全国から補う候補の重複判定
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DedupPolicy {
    /// 優先集合の候補と同じレコードIDを除きます。
    #[default]
    RecordId,
    /// 優先集合の候補と駅名・地域コードが同じレコードを除きます。
    ///
    /// 同じ駅が路線ごとに別レコードになっている場合、
    /// 優先集合の駅と同名同地域のレコードは全国側から補われません。
    NameAndRegion,
}

impl DedupPolicy {
    /// 名前から重複判定を取得します。
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "id" | "record-id" => Some(Self::RecordId),
            "name-region" | "name-and-region" => Some(Self::NameAndRegion),
            _ => None,
        }
    }
}

impl FromStr for DedupPolicy {
    type Err = &'static str;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::from_name(name).ok_or("Could not parse a dedup policy")
    }
}

/// 縦クロスワードを解決するリゾルバー
///
/// インデックスを借用するだけで状態を持たないため、
/// 複数のスレッドから同時に使用できます。
///
/// # 例
///
/// ```
/// use ekitate::corpus::{Corpus, RecordDraft};
/// use ekitate::index::IndexBuilder;
/// use ekitate::normalizer::{Query, ScriptMode};
/// use ekitate::region::PrioritySet;
/// use ekitate::resolver::CrosswordResolver;
///
/// let corpus = Corpus::from_drafts(vec![
///     RecordDraft::new("しんじゅく", 13),
///     RecordDraft::new("おおさか", 27),
/// ])?;
/// let index = IndexBuilder::build(&corpus, ScriptMode::Folded)?;
///
/// let query = Query::new("しお", ScriptMode::Folded);
/// let resolution = CrosswordResolver::new(&index).resolve(&query, &PrioritySet::new(), &corpus);
///
/// assert_eq!(resolution.accepted().len(), 1);
/// assert_eq!(resolution.accepted()[0].offset, 0);
/// # Ok::<(), ekitate::errors::EkitateError>(())
/// ```
#[derive(Clone, Copy, Debug)]
pub struct CrosswordResolver<'a> {
    index: &'a PositionalIndex,
    dedup: DedupPolicy,
    parallel: bool,
}

impl<'a> CrosswordResolver<'a> {
    /// インデックスを指定して作成します。
    pub const fn new(index: &'a PositionalIndex) -> Self {
        Self {
            index,
            dedup: DedupPolicy::RecordId,
            parallel: false,
        }
    }

    /// 重複判定を設定します。
    pub const fn dedup_policy(mut self, dedup: DedupPolicy) -> Self {
        self.dedup = dedup;
        self
    }

    /// 文字位置ごとの探索を並列に行うかを設定します。結果は変わりません。
    pub const fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// 縦クロスワードを解決します。
    ///
    /// # 引数
    ///
    /// * `query` - 正規化済みの検索文字列
    /// * `priority` - 優先集合。空の場合はすべての候補が全国扱いになります。
    /// * `corpus` - インデックスの元になったコーパス
    ///
    /// # 戻り値
    ///
    /// 成立した位置の昇順の列。検索文字列が空の場合や一致がない場合は空です。
    pub fn resolve(&self, query: &Query, priority: &PrioritySet, corpus: &Corpus) -> Resolution {
        let folded;
        let query = if query.mode() == self.index.mode() {
            query
        } else {
            log::debug!(
                "query normalized for {} used with {} index",
                query.mode().name(),
                self.index.mode().name()
            );
            folded = Query::new(&query.as_string(), self.index.mode());
            &folded
        };
        if query.is_empty() {
            return Resolution::default();
        }

        let chars = query.chars();
        let accepted: Vec<OffsetMatch> = if self.parallel {
            (0..MAX_QUERY_LEN)
                .into_par_iter()
                .filter_map(|offset| self.resolve_offset(offset, chars, priority, corpus))
                .collect()
        } else {
            (0..MAX_QUERY_LEN)
                .filter_map(|offset| self.resolve_offset(offset, chars, priority, corpus))
                .collect()
        };
        log::debug!(
            "query {}: {} offsets accepted",
            query.as_string(),
            accepted.len()
        );
        Resolution { accepted }
    }

    fn resolve_offset(
        &self,
        offset: usize,
        chars: &[char],
        priority: &PrioritySet,
        corpus: &Corpus,
    ) -> Option<OffsetMatch> {
        let mut groups = Vec::with_capacity(chars.len());
        for &query_char in chars {
            let hits = self.combine(self.index.lookup(offset, query_char), priority, corpus);
            if hits.is_empty() {
                return None;
            }
            groups.push(CharMatches { query_char, hits });
        }
        Some(OffsetMatch { offset, groups })
    }

    fn combine(&self, ids: &[u32], priority: &PrioritySet, corpus: &Corpus) -> Vec<Hit> {
        let mut hits: Vec<Hit> = ids
            .iter()
            .filter(|&&id| priority.contains(id))
            .map(|&record_id| Hit {
                record_id,
                provenance: Provenance::Priority,
            })
            .collect();

        let fallback = ids.iter().copied().filter(|&id| !priority.contains(id));
        match self.dedup {
            DedupPolicy::RecordId => {
                hits.extend(fallback.map(|record_id| Hit {
                    record_id,
                    provenance: Provenance::Fallback,
                }));
            }
            DedupPolicy::NameAndRegion => {
                let seen: HashSet<(&str, u32)> = hits
                    .iter()
                    .filter_map(|h| corpus.get(h.record_id))
                    .map(|r| (r.name.as_str(), r.region))
                    .collect();
                let fallback: Vec<u32> = fallback
                    .filter(|&id| {
                        corpus
                            .get(id)
                            .is_none_or(|r| !seen.contains(&(r.name.as_str(), r.region)))
                    })
                    .collect();
                hits.extend(fallback.into_iter().map(|record_id| Hit {
                    record_id,
                    provenance: Provenance::Fallback,
                }));
            }
        }
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::corpus::RecordDraft;
    use crate::index::IndexBuilder;
    use crate::normalizer::ScriptMode;

    fn corpus(names: &[(&str, u32)]) -> Corpus {
        Corpus::from_drafts(names.iter().map(|&(n, r)| RecordDraft::new(n, r))).unwrap()
    }

    fn ids(m: &CharMatches) -> Vec<(u32, Provenance)> {
        m.hits.iter().map(|h| (h.record_id, h.provenance)).collect()
    }

    #[test]
    fn test_scenario_with_priority() {
        let corpus = corpus(&[("しんじゅく", 13), ("しぶや", 13), ("おおさか", 27)]);
        let index = IndexBuilder::build(&corpus, ScriptMode::Folded).unwrap();
        let query = Query::new("しお", ScriptMode::Folded);
        let priority = PrioritySet::from_ids([0, 1]);

        let r = CrosswordResolver::new(&index).resolve(&query, &priority, &corpus);

        assert!(r.is_resolvable());
        assert_eq!(r.accepted().len(), 1);
        let m = &r.accepted()[0];
        assert_eq!(m.offset, 0);
        assert_eq!(m.groups[0].query_char, 'し');
        assert_eq!(
            ids(&m.groups[0]),
            vec![(0, Provenance::Priority), (1, Provenance::Priority)]
        );
        assert_eq!(m.groups[1].query_char, 'お');
        assert_eq!(ids(&m.groups[1]), vec![(2, Provenance::Fallback)]);
    }

    #[test]
    fn test_multiple_offsets() {
        let corpus = corpus(&[("おおさか", 27), ("しおさい", 12), ("あさお", 14)]);
        let index = IndexBuilder::build(&corpus, ScriptMode::Folded).unwrap();
        let query = Query::new("おさ", ScriptMode::Folded);

        let r = CrosswordResolver::new(&index).resolve(&query, &PrioritySet::new(), &corpus);
        let offsets: Vec<_> = r.accepted().iter().map(|m| m.offset).collect();

        // offset 0: お(0) さ(なし) -> rejected
        // offset 1: お(0, 1) さ(2)
        // offset 2: お(2) さ(0, 1)
        assert_eq!(offsets, vec![1, 2]);
        assert_eq!(ids(&r.accepted()[0].groups[0]).len(), 2);
    }

    #[test]
    fn test_priority_first() {
        let corpus = corpus(&[("しながわ", 13), ("しずおか", 22), ("しものせき", 35)]);
        let index = IndexBuilder::build(&corpus, ScriptMode::Folded).unwrap();
        let query = Query::new("し", ScriptMode::Folded);
        let priority = PrioritySet::from_ids([2]);

        let r = CrosswordResolver::new(&index).resolve(&query, &priority, &corpus);

        assert_eq!(
            ids(&r.accepted()[0].groups[0]),
            vec![
                (2, Provenance::Priority),
                (0, Provenance::Fallback),
                (1, Provenance::Fallback),
            ]
        );
    }

    #[test]
    fn test_no_partial_offsets() {
        let corpus = corpus(&[("しんじゅく", 13), ("しぶや", 13)]);
        let index = IndexBuilder::build(&corpus, ScriptMode::Folded).unwrap();
        let query = Query::new("しお", ScriptMode::Folded);

        let r = CrosswordResolver::new(&index).resolve(&query, &PrioritySet::new(), &corpus);

        assert!(!r.is_resolvable());
        assert!(r.accepted().is_empty());
    }

    #[test]
    fn test_empty_query() {
        let corpus = corpus(&[("しんじゅく", 13)]);
        let index = IndexBuilder::build(&corpus, ScriptMode::Folded).unwrap();
        let query = Query::new("abc", ScriptMode::Folded);

        let r = CrosswordResolver::new(&index).resolve(&query, &PrioritySet::new(), &corpus);

        assert!(!r.is_resolvable());
    }

    #[test]
    fn test_repeated_query_chars() {
        let corpus = corpus(&[("しお", 13), ("しま", 32)]);
        let index = IndexBuilder::build(&corpus, ScriptMode::Folded).unwrap();
        let query = Query::new("しし", ScriptMode::Folded);

        let r = CrosswordResolver::new(&index).resolve(&query, &PrioritySet::new(), &corpus);

        assert_eq!(r.accepted().len(), 1);
        assert_eq!(r.accepted()[0].groups.len(), 2);
        assert_eq!(r.accepted()[0].groups[0], r.accepted()[0].groups[1]);
    }

    #[test]
    fn test_dedup_name_and_region() {
        // The same station listed once per line.
        let corpus = corpus(&[("しぶや", 13), ("しぶや", 13), ("しぶや", 14)]);
        let index = IndexBuilder::build(&corpus, ScriptMode::Folded).unwrap();
        let query = Query::new("し", ScriptMode::Folded);
        let priority = PrioritySet::from_ids([0]);

        let by_id = CrosswordResolver::new(&index).resolve(&query, &priority, &corpus);
        assert_eq!(
            ids(&by_id.accepted()[0].groups[0]),
            vec![
                (0, Provenance::Priority),
                (1, Provenance::Fallback),
                (2, Provenance::Fallback),
            ]
        );

        let by_name = CrosswordResolver::new(&index)
            .dedup_policy(DedupPolicy::NameAndRegion)
            .resolve(&query, &priority, &corpus);
        assert_eq!(
            ids(&by_name.accepted()[0].groups[0]),
            vec![(0, Provenance::Priority), (2, Provenance::Fallback)]
        );
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let corpus = corpus(&[
            ("おおさか", 27),
            ("しおさい", 12),
            ("あさお", 14),
            ("おさかべ", 28),
            ("さかい", 27),
        ]);
        let index = IndexBuilder::build(&corpus, ScriptMode::Folded).unwrap();
        let priority = PrioritySet::from_ids([1, 4]);
        for q in ["おさ", "さか", "か", "い"] {
            let query = Query::new(q, ScriptMode::Folded);
            let seq = CrosswordResolver::new(&index).resolve(&query, &priority, &corpus);
            let par = CrosswordResolver::new(&index)
                .parallel(true)
                .resolve(&query, &priority, &corpus);
            assert_eq!(seq, par, "{q}");
        }
    }

    #[test]
    fn test_query_mode_follows_index() {
        let corpus = corpus(&[("シブヤ", 13)]);
        let index = IndexBuilder::build(&corpus, ScriptMode::Folded).unwrap();
        let query = Query::new("シ", ScriptMode::Preserved);

        let r = CrosswordResolver::new(&index).resolve(&query, &PrioritySet::new(), &corpus);

        assert_eq!(r.accepted()[0].groups[0].query_char, 'し');
    }

    #[test]
    fn test_dedup_policy_names() {
        assert_eq!(DedupPolicy::from_name("id"), Some(DedupPolicy::RecordId));
        assert_eq!(
            DedupPolicy::from_name("name-region"),
            Some(DedupPolicy::NameAndRegion)
        );
        assert_eq!(DedupPolicy::from_name("other"), None);
        assert_eq!("record-id".parse(), Ok(DedupPolicy::RecordId));
        assert!("other".parse::<DedupPolicy>().is_err());
        assert_eq!(Provenance::Priority.label(), "選択地域内");
        assert_eq!(Provenance::Fallback.label(), "全国");
    }
}
