//! 位置インデックス
//!
//! 駅名の文字位置と文字の組から、その位置にその文字を持つレコードのIDの列を引く
//! 転置インデックスです。
//!
//! ```text
//! 位置 → 文字 → [レコードID, ...]
//! ```
//!
//! 位置ごとにハッシュ表を持ち、値はポスティングリスト上の先頭位置を指します。
//! IDの列はコーパスの読み込み順(挿入順)に並びます。
//! インデックスは[`ScriptMode`]ごとに1つずつ作られ、構築後は変更されません。

pub mod builder;
mod postings;
pub mod store;

use std::collections::BTreeMap;

use hashbrown::HashMap;
use rkyv::{Archive, Deserialize, Serialize};

use crate::errors::{EkitateError, Result};
use crate::index::postings::{Postings, PostingsBuilder};
use crate::normalizer::ScriptMode;
use crate::utils::FromU32;

pub use crate::index::builder::IndexBuilder;
pub use crate::index::store::{FileIndexStore, IndexArtifact, IndexStore};

/// 1つの文字位置に対応する表
#[derive(Archive, Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct OffsetSlot {
    heads: HashMap<char, u32>,
}

/// 構築済みの位置インデックス
#[derive(Archive, Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct PositionalIndex {
    mode: ScriptMode,
    slots: Vec<OffsetSlot>,
    postings: Postings,
}

impl PositionalIndex {
    /// 位置`offset`に文字`c`を持つレコードのIDを挿入順で返します。
    ///
    /// 該当がなければ空のスライスを返します。
    ///
    /// # 引数
    ///
    /// * `offset` - 0始まりの文字位置
    /// * `c` - インデックスのモードで畳み込まれた文字
    #[inline(always)]
    pub fn lookup(&self, offset: usize, c: char) -> &[u32] {
        self.slots
            .get(offset)
            .and_then(|slot| slot.heads.get(&c))
            .map(|&head| self.postings.ids(usize::from_u32(head)))
            .unwrap_or(&[])
    }

    /// インデックスのモード
    pub const fn mode(&self) -> ScriptMode {
        self.mode
    }

    /// 文字位置の数。最も長い駅名の文字数と等しくなります。
    pub fn num_offsets(&self) -> usize {
        self.slots.len()
    }

    /// (位置, 文字)の組の数
    pub fn num_buckets(&self) -> usize {
        self.slots.iter().map(|slot| slot.heads.len()).sum()
    }

    /// 登録されたIDの総数。全駅名の文字数の合計と等しくなります。
    pub fn num_entries(&self) -> usize {
        self.entries().map(|(_, _, ids)| ids.len()).sum()
    }

    /// すべての(位置, 文字, IDの列)を返します。
    ///
    /// 位置の昇順、同じ位置の中では文字のコードポイント順に並びます。
    pub fn entries(&self) -> impl Iterator<Item = (usize, char, &[u32])> + '_ {
        self.slots
            .iter()
            .enumerate()
            .flat_map(move |(offset, slot)| {
                let mut heads: Vec<_> = slot.heads.iter().map(|(&c, &h)| (c, h)).collect();
                heads.sort_unstable_by_key(|&(c, _)| c);
                heads
                    .into_iter()
                    .map(move |(c, h)| (offset, c, self.postings.ids(usize::from_u32(h))))
            })
    }

    /// 読み込んだインデックスの整合性を検査します。
    ///
    /// # エラー
    ///
    /// ポスティングリストの範囲外を指す表がある場合、[`EkitateError`]が返されます。
    pub fn validate(&self) -> Result<()> {
        for (offset, slot) in self.slots.iter().enumerate() {
            for (&c, &head) in &slot.heads {
                if !self.postings.is_valid_head(usize::from_u32(head)) {
                    return Err(EkitateError::invalid_format(
                        "index",
                        format!("posting head out of range at ({offset}, {c})"),
                    ));
                }
            }
        }
        Ok(())
    }

    /// インデックスが`num_records`件のコーパスに対応しているかを検査します。
    ///
    /// 各IDリストの要素はすべてレコード数未満で、読み込み順に厳密に増加している
    /// 必要があります。
    ///
    /// # エラー
    ///
    /// 範囲外のIDや順序の乱れがある場合、[`EkitateError`]が返されます。
    pub fn validate_records(&self, num_records: usize) -> Result<()> {
        for (offset, c, ids) in self.entries() {
            let in_range = ids.iter().all(|&id| usize::from_u32(id) < num_records);
            if !in_range || !ids.windows(2).all(|w| w[0] < w[1]) {
                return Err(EkitateError::invalid_format(
                    "index",
                    format!("invalid record ids at ({offset}, {c}) for {num_records} records"),
                ));
            }
        }
        Ok(())
    }
}

/// 位置インデックスのビルダー
///
/// 挿入のみが可能で、[`build`](Self::build)で凍結された[`PositionalIndex`]になります。
pub struct PositionalIndexBuilder {
    mode: ScriptMode,
    slots: Vec<BTreeMap<char, Vec<u32>>>,
}

impl PositionalIndexBuilder {
    /// 指定されたモードのビルダーを作成します。
    pub const fn new(mode: ScriptMode) -> Self {
        Self {
            mode,
            slots: vec![],
        }
    }

    /// ビルダーのモード
    pub const fn mode(&self) -> ScriptMode {
        self.mode
    }

    /// 位置`offset`の文字`c`にIDを追加します。
    #[inline(always)]
    pub fn insert(&mut self, offset: usize, c: char, id: u32) {
        if self.slots.len() <= offset {
            self.slots.resize_with(offset + 1, BTreeMap::new);
        }
        self.slots[offset].entry(c).or_default().push(id);
    }

    /// 別のビルダーの内容を後ろに連結します。
    ///
    /// 各(位置, 文字)のIDの列は、自身の列の後ろに`other`の列が続きます。
    ///
    /// # エラー
    ///
    /// モードが異なる場合、[`EkitateError`]が返されます。
    pub fn merge(&mut self, other: Self) -> Result<()> {
        if self.mode != other.mode {
            return Err(EkitateError::invalid_argument(
                "other",
                format!(
                    "cannot merge a {} index into a {} index",
                    other.mode.name(),
                    self.mode.name()
                ),
            ));
        }
        if self.slots.len() < other.slots.len() {
            self.slots.resize_with(other.slots.len(), BTreeMap::new);
        }
        for (slot, other_slot) in self.slots.iter_mut().zip(other.slots) {
            for (c, ids) in other_slot {
                slot.entry(c).or_default().extend(ids);
            }
        }
        Ok(())
    }

    /// インデックスを凍結します。
    ///
    /// # エラー
    ///
    /// IDの総数が`u32`で表現できない場合、[`EkitateError`]が返されます。
    pub fn build(self) -> Result<PositionalIndex> {
        let mut postings = PostingsBuilder::new();
        let mut slots = Vec::with_capacity(self.slots.len());
        for slot in self.slots {
            let mut heads = HashMap::with_capacity(slot.len());
            for (c, ids) in slot {
                heads.insert(c, postings.push(&ids)?);
            }
            slots.push(OffsetSlot { heads });
        }
        Ok(PositionalIndex {
            mode: self.mode,
            slots,
            postings: postings.build(),
        })
    }
}
