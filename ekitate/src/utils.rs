//! ユーティリティ関数と型変換トレイトを提供するモジュール
//!
//! - `FromU32`: u32からの型変換トレイト
//! - `CsvRecords`: 引用符付きフィールドに対応したCSVレコードの読み出し

use std::io::BufRead;

use csv_core::ReadFieldResult;

use crate::errors::Result;

/// u32から他の型への変換を提供するトレイト
///
/// 標準ライブラリのFromトレイトとは異なり、プラットフォーム固有の仮定を行います。
pub trait FromU32 {
    /// u32値から実装型を生成する
    fn from_u32(src: u32) -> Self;
}

#[cfg(any(target_pointer_width = "32", target_pointer_width = "64"))]
impl FromU32 for usize {
    #[inline(always)]
    fn from_u32(src: u32) -> Self {
        // Since the pointer width is guaranteed to be 32 or 64,
        // the following process always succeeds.
        unsafe { Self::try_from(src).unwrap_unchecked() }
    }
}

/// バイト列からCSVのレコードを順に読み出すリーダー
///
/// 入力全体を1つの`csv_core::Reader`に流すため、ダブルクォートで囲まれた
/// フィールドはカンマや改行を含むことができます。空行は読み飛ばされます。
///
/// # 例
///
/// ```
/// # use ekitate::utils::CsvRecords;
/// let data = "新宿,13\n\"JR山手線\n内回り\",13\n";
/// let mut records = CsvRecords::new(data.as_bytes());
///
/// let (line, fields) = records.next_record().unwrap().unwrap();
/// assert_eq!((line, fields), (1, vec!["新宿".to_string(), "13".to_string()]));
///
/// let (line, fields) = records.next_record().unwrap().unwrap();
/// assert_eq!(line, 2);
/// assert_eq!(fields, vec!["JR山手線\n内回り", "13"]);
///
/// assert!(records.next_record().unwrap().is_none());
/// ```
pub struct CsvRecords<R> {
    rdr: R,
    csv: csv_core::Reader,
    field: Vec<u8>,
}

impl<R> CsvRecords<R>
where
    R: BufRead,
{
    /// リーダーから作成します。
    pub fn new(rdr: R) -> Self {
        Self {
            rdr,
            csv: csv_core::Reader::new(),
            field: vec![],
        }
    }

    /// 次のレコードを読み出します。
    ///
    /// # 戻り値
    ///
    /// レコードの開始行番号(1始まり)とフィールドの組。入力の終わりでは`None`
    ///
    /// # エラー
    ///
    /// 読み込みに失敗した場合や、フィールドが有効なUTF-8でない場合にエラーを返します。
    pub fn next_record(&mut self) -> Result<Option<(u64, Vec<String>)>> {
        loop {
            let line = self.csv.line();
            let Some(fields) = self.read_fields()? else {
                return Ok(None);
            };
            // A blank line between records.
            if fields.len() == 1 && fields[0].is_empty() {
                continue;
            }
            return Ok(Some((line, fields)));
        }
    }

    fn read_fields(&mut self) -> Result<Option<Vec<String>>> {
        let mut fields = vec![];
        let mut output = [0; 4096];
        loop {
            let input = self.rdr.fill_buf()?;
            let (result, nin, nout) = self.csv.read_field(input, &mut output);
            self.rdr.consume(nin);
            self.field.extend_from_slice(&output[..nout]);
            match result {
                ReadFieldResult::InputEmpty | ReadFieldResult::OutputFull => {}
                ReadFieldResult::Field { record_end } => {
                    fields.push(std::str::from_utf8(&self.field)?.to_string());
                    self.field.clear();
                    if record_end {
                        return Ok(Some(fields));
                    }
                }
                ReadFieldResult::End => return Ok(None),
            }
        }
    }
}
