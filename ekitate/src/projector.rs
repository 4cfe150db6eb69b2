//! 解決結果の表形式への変換

use crate::corpus::{Corpus, Payload};
use crate::resolver::{Provenance, Resolution};

/// 結果の1行
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResultRow {
    /// レコードID
    pub record_id: u32,
    /// 駅名
    pub name: String,
    /// 地域コード
    pub region: u32,
    /// 付加情報
    pub payload: Payload,
    /// 検索文字列の文字
    pub query_char: char,
    /// 駅名のその位置にある元の表記の文字
    pub matched_char: char,
    /// 1始まりの文字位置
    pub char_position: usize,
    /// 候補の出所
    pub provenance: Provenance,
}

/// 解決結果を行の列に変換します。
///
/// 行は位置の昇順、同じ位置の中では検索文字列の文字順、
/// 同じ文字の中では候補の順に並びます。
///
/// # 引数
///
/// * `resolution` - 解決結果
/// * `corpus` - 解決に使ったコーパス
///
/// # 戻り値
///
/// 結果行の列。コーパスに存在しないIDの候補は除かれます。
pub fn project(resolution: &Resolution, corpus: &Corpus) -> Vec<ResultRow> {
    let mut rows = vec![];
    for m in resolution.accepted() {
        for group in &m.groups {
            for hit in &group.hits {
                let Some(record) = corpus.get(hit.record_id) else {
                    log::warn!("record {} is not in the corpus", hit.record_id);
                    continue;
                };
                let matched_char = record
                    .name
                    .chars()
                    .nth(m.offset)
                    .unwrap_or(group.query_char);
                rows.push(ResultRow {
                    record_id: record.id,
                    name: record.name.clone(),
                    region: record.region,
                    payload: record.payload.clone(),
                    query_char: group.query_char,
                    matched_char,
                    char_position: m.offset + 1,
                    provenance: hit.provenance,
                });
            }
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::corpus::RecordDraft;
    use crate::index::IndexBuilder;
    use crate::normalizer::{fold_char, Query, ScriptMode};
    use crate::region::PrioritySet;
    use crate::resolver::CrosswordResolver;

    #[test]
    fn test_project_scenario() {
        let corpus = Corpus::from_drafts(vec![
            RecordDraft::new("しんじゅく", 13),
            RecordDraft::new("しぶや", 13),
            RecordDraft::new("おおさか", 27),
        ])
        .unwrap();
        let index = IndexBuilder::build(&corpus, ScriptMode::Folded).unwrap();
        let query = Query::new("しお", ScriptMode::Folded);
        let priority = PrioritySet::from_ids([0, 1]);
        let resolution = CrosswordResolver::new(&index).resolve(&query, &priority, &corpus);

        let rows = project(&resolution, &corpus);

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].name, "しんじゅく");
        assert_eq!(rows[0].provenance, Provenance::Priority);
        assert_eq!(rows[1].name, "しぶや");
        assert_eq!(rows[2].name, "おおさか");
        assert_eq!(rows[2].payload.region_name, "大阪府");
        assert_eq!(rows[2].query_char, 'お');
        assert_eq!(rows[2].provenance, Provenance::Fallback);
        assert!(rows.iter().all(|r| r.char_position == 1));
    }

    #[test]
    fn test_matched_char_keeps_script() {
        let corpus = Corpus::from_drafts(vec![
            RecordDraft::new("ユーカリが丘", 12),
            RecordDraft::new("ゆりがおか", 13),
        ])
        .unwrap();
        let index = IndexBuilder::build(&corpus, ScriptMode::Folded).unwrap();
        let query = Query::new("ゆ", ScriptMode::Folded);
        let resolution =
            CrosswordResolver::new(&index).resolve(&query, &PrioritySet::new(), &corpus);

        let rows = project(&resolution, &corpus);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].matched_char, 'ユ');
        assert_eq!(rows[1].matched_char, 'ゆ');
        for row in &rows {
            let c = row.name.chars().nth(row.char_position - 1).unwrap();
            assert_eq!(fold_char(c, ScriptMode::Folded), row.query_char);
        }
    }

    #[test]
    fn test_row_order() {
        let corpus = Corpus::from_drafts(vec![
            RecordDraft::new("おおさか", 27),
            RecordDraft::new("しおさい", 12),
            RecordDraft::new("あさお", 14),
        ])
        .unwrap();
        let index = IndexBuilder::build(&corpus, ScriptMode::Folded).unwrap();
        let query = Query::new("おさ", ScriptMode::Folded);
        let resolution =
            CrosswordResolver::new(&index).resolve(&query, &PrioritySet::new(), &corpus);

        let rows: Vec<_> = project(&resolution, &corpus)
            .into_iter()
            .map(|r| (r.char_position, r.query_char, r.record_id))
            .collect();

        assert_eq!(
            rows,
            vec![
                (2, 'お', 0),
                (2, 'お', 1),
                (2, 'さ', 2),
                (3, 'お', 2),
                (3, 'さ', 0),
                (3, 'さ', 1),
            ]
        );
    }

    #[test]
    fn test_empty_resolution() {
        let corpus = Corpus::from_drafts(vec![]).unwrap();
        assert!(project(&Resolution::default(), &corpus).is_empty());
    }
}
