//! 検索セッション
//!
//! コーパスと2つの位置インデックスをまとめた[`Snapshot`]を保持し、
//! 検索の入口を提供します。データの再読み込み時は新しいスナップショットを
//! 構築してから差し替えるため、古いスナップショットを使用中の読み手には影響しません。

use std::sync::Arc;

use parking_lot::RwLock;

use crate::corpus::{Corpus, RecordSource};
use crate::errors::Result;
use crate::index::{IndexBuilder, IndexStore, PositionalIndex};
use crate::normalizer::{Query, ScriptMode};
use crate::projector::{project, ResultRow};
use crate::region::{PrioritySet, RegionSelection};
use crate::resolver::{CrosswordResolver, DedupPolicy};

/// コーパスとその位置インデックスの組
#[derive(Debug)]
pub struct Snapshot {
    corpus: Corpus,
    folded: PositionalIndex,
    preserved: PositionalIndex,
}

impl Snapshot {
    /// コーパス
    pub const fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    /// モードに対応する位置インデックス
    pub const fn index(&self, mode: ScriptMode) -> &PositionalIndex {
        match mode {
            ScriptMode::Folded => &self.folded,
            ScriptMode::Preserved => &self.preserved,
        }
    }
}

/// 縦クロスワード検索のセッション
pub struct CrosswordSession {
    snapshot: RwLock<Arc<Snapshot>>,
    builder: IndexBuilder,
    dedup: DedupPolicy,
    parallel: bool,
}

impl CrosswordSession {
    /// 供給元からコーパスを読み込み、セッションを開きます。
    ///
    /// インデックスは保存先から読み込み、なければ構築して保存先に書き込みます。
    /// 保存先の読み込みや書き込みの失敗は警告として記録され、処理は続行されます。
    ///
    /// # 引数
    ///
    /// * `source` - レコードの供給元
    /// * `store` - インデックスの保存先。`None`の場合は常に構築します。
    ///
    /// # エラー
    ///
    /// コーパスを読み込めない場合、[`EkitateError::CorpusUnavailable`](crate::errors::EkitateError::CorpusUnavailable)
    /// が返されます。
    pub fn open(source: &dyn RecordSource, store: Option<&dyn IndexStore>) -> Result<Self> {
        let builder = IndexBuilder::new();
        let snapshot = Self::load_snapshot(&builder, source, store)?;
        Ok(Self::with_snapshot(snapshot, builder))
    }

    /// コーパスからインデックスを構築してセッションを作成します。
    pub fn from_corpus(corpus: Corpus) -> Result<Self> {
        let builder = IndexBuilder::new();
        let (folded, preserved) = builder.build_both(&corpus)?;
        let snapshot = Snapshot {
            corpus,
            folded,
            preserved,
        };
        Ok(Self::with_snapshot(snapshot, builder))
    }

    fn with_snapshot(snapshot: Snapshot, builder: IndexBuilder) -> Self {
        Self {
            snapshot: RwLock::new(Arc::new(snapshot)),
            builder,
            dedup: DedupPolicy::default(),
            parallel: false,
        }
    }

    /// 重複判定を設定します。
    pub fn with_dedup_policy(mut self, dedup: DedupPolicy) -> Self {
        self.dedup = dedup;
        self
    }

    /// 文字位置ごとの探索を並列に行うかを設定します。
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// 現在のスナップショットを返します。
    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.snapshot.read())
    }

    /// 検索します。
    ///
    /// # 引数
    ///
    /// * `raw_query` - 正規化前の検索文字列
    /// * `mode` - 使用するインデックスのモード
    /// * `regions` - 優先する地域
    ///
    /// # 戻り値
    ///
    /// 結果行の列。縦クロスワードが成立しない場合は空です。
    pub fn search(
        &self,
        raw_query: &str,
        mode: ScriptMode,
        regions: &RegionSelection,
    ) -> Vec<ResultRow> {
        let snapshot = self.snapshot();
        let query = Query::new(raw_query, mode);
        let priority = PrioritySet::from_regions(snapshot.corpus(), regions);
        let resolution = CrosswordResolver::new(snapshot.index(mode))
            .dedup_policy(self.dedup)
            .parallel(self.parallel)
            .resolve(&query, &priority, snapshot.corpus());
        project(&resolution, snapshot.corpus())
    }

    /// コーパスを読み込み直してスナップショットを差し替えます。
    ///
    /// # エラー
    ///
    /// コーパスを読み込めない場合はエラーを返し、現在のスナップショットは保持されます。
    pub fn reload(&self, source: &dyn RecordSource, store: Option<&dyn IndexStore>) -> Result<()> {
        let snapshot = Self::load_snapshot(&self.builder, source, store)?;
        *self.snapshot.write() = Arc::new(snapshot);
        log::info!("session reloaded");
        Ok(())
    }

    fn load_snapshot(
        builder: &IndexBuilder,
        source: &dyn RecordSource,
        store: Option<&dyn IndexStore>,
    ) -> Result<Snapshot> {
        let corpus = Corpus::load(source)?;
        let fingerprint = corpus.fingerprint();
        let folded = Self::load_or_build(builder, &corpus, ScriptMode::Folded, store, &fingerprint)?;
        let preserved =
            Self::load_or_build(builder, &corpus, ScriptMode::Preserved, store, &fingerprint)?;
        Ok(Snapshot {
            corpus,
            folded,
            preserved,
        })
    }

    fn load_or_build(
        builder: &IndexBuilder,
        corpus: &Corpus,
        mode: ScriptMode,
        store: Option<&dyn IndexStore>,
        fingerprint: &str,
    ) -> Result<PositionalIndex> {
        let Some(store) = store else {
            return builder.build_parallel(corpus, mode);
        };
        match store
            .load_index(mode, fingerprint)
            .and_then(|index| match index {
                Some(index) => index.validate_records(corpus.len()).map(|()| Some(index)),
                None => Ok(None),
            }) {
            Ok(Some(index)) => return Ok(index),
            Ok(None) => {}
            Err(e) => log::warn!("failed to load {} index: {e}", mode.name()),
        }
        let index = builder.build_parallel(corpus, mode)?;
        if let Err(e) = store.save_index(mode, &index, fingerprint) {
            log::warn!("failed to save {} index: {e}", mode.name());
        }
        Ok(index)
    }
}
