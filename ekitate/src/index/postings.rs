//! ポスティングリスト
//!
//! (位置, 文字)ごとのレコードIDの列を1本の配列にまとめて保持します。

use rkyv::{Archive, Deserialize, Serialize};

use crate::errors::Result;
use crate::utils::FromU32;

/// ポスティングリスト
#[derive(Archive, Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Postings {
    // Each id list is stored as its length followed by the ids.
    data: Vec<u32>,
}

impl Postings {
    /// 指定された先頭位置のIDリストを取得します。
    #[inline(always)]
    pub fn ids(&self, i: usize) -> &[u32] {
        let len = usize::from_u32(self.data[i]);
        &self.data[i + 1..i + 1 + len]
    }

    /// IDリストの先頭位置として有効かを確かめます。
    pub(crate) fn is_valid_head(&self, i: usize) -> bool {
        self.data
            .get(i)
            .and_then(|&len| i.checked_add(1)?.checked_add(usize::from_u32(len)))
            .is_some_and(|end| end <= self.data.len())
    }
}

/// ポスティングリストを構築するビルダー
#[derive(Default)]
pub struct PostingsBuilder {
    data: Vec<u32>,
}

impl PostingsBuilder {
    /// 新しいビルダーを作成します。
    pub fn new() -> Self {
        Self::default()
    }

    /// IDリストを追加し、その先頭位置を返します。
    #[inline(always)]
    pub fn push(&mut self, ids: &[u32]) -> Result<u32> {
        let offset = u32::try_from(self.data.len())?;
        self.data.push(ids.len().try_into()?);
        self.data.extend_from_slice(ids);
        Ok(offset)
    }

    /// ポスティングリストを構築します。
    pub fn build(self) -> Postings {
        Postings { data: self.data }
    }
}
