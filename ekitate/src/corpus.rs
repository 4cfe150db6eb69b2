//! 駅データのコーパス
//!
//! コーパスは読み込み順に0から採番された[`Record`]の不変な集合です。
//! レコードの供給元は[`RecordSource`]トレイトで抽象化されており、
//! 駅データCSVを読み込む[`CsvRecordSource`]が実装として用意されています。

use std::fs::File;
use std::io::{BufReader, Read};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use sha2::{Digest, Sha256};

use crate::errors::{EkitateError, Result};
use crate::region::prefecture_name;
use crate::utils::{CsvRecords, FromU32};

/// 付加情報が欠けている場合に使われる値。
pub const UNKNOWN: &str = "不明";

/// レコードの付加情報
///
/// 結果行にそのまま複写されるだけで、検索には使用されません。
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Payload {
    /// 地域名(都道府県名)
    pub region_name: String,
    /// 事業者名
    pub operator: String,
    /// 路線名
    pub route: String,
}

impl Payload {
    /// 地域コードから地域名を補い、その他を[`UNKNOWN`]とした付加情報を作成します。
    pub fn for_region(region: u32) -> Self {
        Self {
            region_name: region_display_name(region),
            operator: UNKNOWN.to_string(),
            route: UNKNOWN.to_string(),
        }
    }
}

/// 地域コードの表示名を返します。
///
/// 既知の都道府県コードでなければ`"<コード>番"`を返します。
pub fn region_display_name(region: u32) -> String {
    prefecture_name(region).map_or_else(|| format!("{region}番"), str::to_string)
}

/// 駅レコード
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Record {
    /// コーパス内の位置と一致するID
    pub id: u32,
    /// 駅名
    pub name: String,
    /// 地域コード(都道府県コード)
    pub region: u32,
    /// 付加情報
    pub payload: Payload,
}

/// IDが振られる前のレコード
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RecordDraft {
    /// 駅名
    pub name: String,
    /// 地域コード
    pub region: u32,
    /// 付加情報
    pub payload: Payload,
}

impl RecordDraft {
    /// 駅名と地域コードから作成します。付加情報は地域コードから補われます。
    pub fn new<S>(name: S, region: u32) -> Self
    where
        S: Into<String>,
    {
        Self {
            name: name.into(),
            region,
            payload: Payload::for_region(region),
        }
    }

    /// 付加情報を設定します。
    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }
}

/// レコードの供給元
///
/// 失敗した場合は[`EkitateError::CorpusUnavailable`]を返す必要があります。
/// 一部だけ読み込まれたレコードを返してはいけません。
pub trait RecordSource {
    /// すべてのレコードを読み込み順に返します。
    fn load(&self) -> Result<Vec<RecordDraft>>;
}

impl RecordSource for Vec<RecordDraft> {
    fn load(&self) -> Result<Vec<RecordDraft>> {
        Ok(self.clone())
    }
}

impl RecordSource for [RecordDraft] {
    fn load(&self) -> Result<Vec<RecordDraft>> {
        Ok(self.to_vec())
    }
}

/// 不変なレコードの集合
///
/// 複製は参照カウントの増加のみで行われます。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Corpus {
    records: Arc<[Record]>,
}

impl Corpus {
    /// レコードの下書きからコーパスを作成します。IDは順番に0から振られます。
    ///
    /// # エラー
    ///
    /// レコード数が`u32`で表現できない場合、[`EkitateError`]が返されます。
    pub fn from_drafts<I>(drafts: I) -> Result<Self>
    where
        I: IntoIterator<Item = RecordDraft>,
    {
        let records = drafts
            .into_iter()
            .enumerate()
            .map(|(i, d)| {
                Ok(Record {
                    id: u32::try_from(i)?,
                    name: d.name,
                    region: d.region,
                    payload: d.payload,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            records: records.into(),
        })
    }

    /// 供給元からコーパスを読み込みます。
    ///
    /// # エラー
    ///
    /// 供給元が失敗した場合、[`EkitateError::CorpusUnavailable`]が返されます。
    pub fn load(source: &dyn RecordSource) -> Result<Self> {
        let drafts = source.load().map_err(|e| match e {
            e @ EkitateError::CorpusUnavailable(_) => e,
            e => EkitateError::corpus_unavailable(e.to_string()),
        })?;
        let corpus = Self::from_drafts(drafts)?;
        log::info!("loaded {} station records", corpus.len());
        Ok(corpus)
    }

    /// すべてのレコード
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// IDからレコードを取得します。
    #[inline(always)]
    pub fn get(&self, id: u32) -> Option<&Record> {
        self.records.get(usize::from_u32(id))
    }

    /// コーパスの指紋を計算します。
    ///
    /// 駅名と地域コードのSHA-256を16進文字列で返します。
    /// 保存済みインデックスが同じコーパスから作られたかの判定に使われます。
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(u64::try_from(self.records.len()).unwrap_or(u64::MAX).to_le_bytes());
        for r in self.records.iter() {
            hasher.update(r.name.as_bytes());
            hasher.update([0x1f_u8]);
            hasher.update(r.region.to_le_bytes());
        }
        hex::encode(hasher.finalize())
    }
}

impl Deref for Corpus {
    type Target = [Record];

    fn deref(&self) -> &Self::Target {
        &self.records
    }
}

const COLUMN_NAME: &str = "station_name";
const COLUMN_REGION: &str = "pref_cd";
const COLUMN_REGION_NAME: &str = "prefecture";
const COLUMN_OPERATOR: &str = "operator_name";
const COLUMN_ROUTE: &str = "route_name";

/// 駅データCSVのレコード供給元
///
/// 1行目はヘッダ行で、`station_name`と`pref_cd`の列が必須です。
/// `prefecture`、`operator_name`、`route_name`の列があれば付加情報として読み込みます。
/// その他の列は無視されます。
#[derive(Clone, Debug)]
pub struct CsvRecordSource {
    path: PathBuf,
}

impl CsvRecordSource {
    /// CSVファイルのパスから作成します。
    pub fn new<P>(path: P) -> Self
    where
        P: AsRef<Path>,
    {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// CSVファイルのパス
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// リーダーから駅データCSVを読み込みます。
    ///
    /// 駅名が空の行は警告を出して読み飛ばします。
    ///
    /// # 引数
    ///
    /// * `rdr` - 駅データCSVのリーダー
    ///
    /// # 戻り値
    ///
    /// 読み込み順のレコード
    ///
    /// # エラー
    ///
    /// ヘッダ行や必須列がない場合、または地域コードが整数でない場合、
    /// [`EkitateError`]が返されます。
    pub fn from_reader<R>(rdr: R) -> Result<Vec<RecordDraft>>
    where
        R: Read,
    {
        let mut records = CsvRecords::new(BufReader::new(rdr));

        let header = match records.next_record()? {
            Some((_, header)) => header,
            None => return Err(EkitateError::invalid_format("csv", "missing header row")),
        };
        let find = |name: &str| {
            header
                .iter()
                .position(|h| h.trim_start_matches('\u{feff}').trim() == name)
        };
        let name_col = find(COLUMN_NAME).ok_or_else(|| {
            EkitateError::invalid_format("csv", format!("missing column: {COLUMN_NAME}"))
        })?;
        let region_col = find(COLUMN_REGION).ok_or_else(|| {
            EkitateError::invalid_format("csv", format!("missing column: {COLUMN_REGION}"))
        })?;
        let region_name_col = find(COLUMN_REGION_NAME);
        let operator_col = find(COLUMN_OPERATOR);
        let route_col = find(COLUMN_ROUTE);

        let mut drafts = vec![];
        while let Some((lineno, cols)) = records.next_record()? {
            let field = |col: usize| cols.get(col).map(|s| s.trim()).unwrap_or("");
            let optional = |col: Option<usize>| {
                col.map(field)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
            };

            let name = field(name_col);
            if name.is_empty() {
                log::warn!("line {lineno}: empty station name, skipped");
                continue;
            }
            let region: u32 = field(region_col).parse().map_err(|e| {
                EkitateError::invalid_format(
                    "csv",
                    format!("line {lineno}: invalid {COLUMN_REGION}: {e}"),
                )
            })?;

            drafts.push(RecordDraft {
                name: name.to_string(),
                region,
                payload: Payload {
                    region_name: optional(region_name_col)
                        .unwrap_or_else(|| region_display_name(region)),
                    operator: optional(operator_col).unwrap_or_else(|| UNKNOWN.to_string()),
                    route: optional(route_col).unwrap_or_else(|| UNKNOWN.to_string()),
                },
            });
        }
        Ok(drafts)
    }
}

impl RecordSource for CsvRecordSource {
    fn load(&self) -> Result<Vec<RecordDraft>> {
        let read = || -> Result<Vec<RecordDraft>> {
            let file = File::open(&self.path)?;
            Self::from_reader(file)
        };
        read().map_err(|e| {
            EkitateError::corpus_unavailable(format!("{}: {e}", self.path.display()))
        })
    }
}
