//! 位置インデックスの構築
//!
//! コーパスの各駅名を1文字ずつ畳み込み、(位置, 文字)ごとにレコードIDを登録します。
//! 大きなコーパスに対しては、連続したレコードの塊ごとに並列に構築してから
//! 塊の順に連結します。連結後のIDの並びは逐次構築と同一です。

use rayon::prelude::*;

use crate::corpus::Record;
use crate::errors::{EkitateError, Result};
use crate::index::{PositionalIndex, PositionalIndexBuilder};
use crate::normalizer::{fold_name, ScriptMode};

/// 並列構築で1つのタスクが受け持つレコード数の既定値
pub const DEFAULT_SHARD_SIZE: usize = 4096;

/// コーパスから位置インデックスを構築するビルダー
#[derive(Clone, Copy, Debug)]
pub struct IndexBuilder {
    shard_size: usize,
}

impl Default for IndexBuilder {
    fn default() -> Self {
        Self {
            shard_size: DEFAULT_SHARD_SIZE,
        }
    }
}

impl IndexBuilder {
    /// 既定の設定でビルダーを作成します。
    pub fn new() -> Self {
        Self::default()
    }

    /// 並列構築で1つのタスクが受け持つレコード数を設定します。
    ///
    /// # エラー
    ///
    /// `shard_size`が0の場合、[`EkitateError`]が返されます。
    pub fn with_shard_size(mut self, shard_size: usize) -> Result<Self> {
        if shard_size == 0 {
            return Err(EkitateError::invalid_argument(
                "shard_size",
                "must be greater than 0",
            ));
        }
        self.shard_size = shard_size;
        Ok(self)
    }

    /// レコードを1回走査して位置インデックスを構築します。
    ///
    /// # 引数
    ///
    /// * `records` - コーパスのレコード
    /// * `mode` - 駅名の畳み込みに使うモード
    ///
    /// # 戻り値
    ///
    /// 構築された位置インデックス
    ///
    /// # エラー
    ///
    /// IDの総数が`u32`で表現できない場合、[`EkitateError`]が返されます。
    pub fn build(records: &[Record], mode: ScriptMode) -> Result<PositionalIndex> {
        let index = Self::shard(records, mode).build()?;
        log::info!(
            "built {} index: {} records, {} offsets, {} entries",
            mode.name(),
            records.len(),
            index.num_offsets(),
            index.num_entries(),
        );
        Ok(index)
    }

    /// レコードを塊に分けて並列に構築します。
    ///
    /// 結果は[`IndexBuilder::build`]と同一です。
    pub fn build_parallel(&self, records: &[Record], mode: ScriptMode) -> Result<PositionalIndex> {
        if records.len() <= self.shard_size {
            return Self::build(records, mode);
        }
        let shards: Vec<PositionalIndexBuilder> = records
            .par_chunks(self.shard_size)
            .map(|chunk| Self::shard(chunk, mode))
            .collect();
        log::debug!("merging {} shards", shards.len());

        let mut merged = PositionalIndexBuilder::new(mode);
        for shard in shards {
            merged.merge(shard)?;
        }
        let index = merged.build()?;
        log::info!(
            "built {} index: {} records, {} offsets, {} entries",
            mode.name(),
            records.len(),
            index.num_offsets(),
            index.num_entries(),
        );
        Ok(index)
    }

    /// 両方のモードのインデックスを構築します。
    ///
    /// # 戻り値
    ///
    /// `(Folded, Preserved)`の組
    pub fn build_both(&self, records: &[Record]) -> Result<(PositionalIndex, PositionalIndex)> {
        let (folded, preserved) = rayon::join(
            || self.build_parallel(records, ScriptMode::Folded),
            || self.build_parallel(records, ScriptMode::Preserved),
        );
        Ok((folded?, preserved?))
    }

    fn shard(records: &[Record], mode: ScriptMode) -> PositionalIndexBuilder {
        let mut builder = PositionalIndexBuilder::new(mode);
        for record in records {
            for (offset, c) in fold_name(&record.name, mode).into_iter().enumerate() {
                builder.insert(offset, c, record.id);
            }
        }
        builder
    }
}
