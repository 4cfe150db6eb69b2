//! エラー型の定義
//!
//! 正規化と縦クロスワード解決は失敗しません。空のクエリや一致なしは
//! 戻り値の形(空の[`Resolution`](crate::Resolution))で表現されます。
//! エラーとして伝播するのは、駅データが読み込めない場合や
//! インデックスファイルが壊れている場合などの構造的な失敗のみです。

use thiserror::Error;

/// ekitate専用のResult型
///
/// エラー型としてデフォルトで[`EkitateError`]を使用します。
pub type Result<T, E = EkitateError> = std::result::Result<T, E>;

/// ekitateのエラー型
#[derive(Debug, Error)]
pub enum EkitateError {
    /// 引数が受け付けられない値だった
    #[error(transparent)]
    InvalidArgument(InvalidArgumentError),

    /// 駅データやインデックスの内容が想定した形式でない
    #[error(transparent)]
    InvalidFormat(InvalidFormatError),

    /// 処理を続けられない状態に陥った
    #[error(transparent)]
    InvalidState(InvalidStateError),

    /// 駅データを取得できない
    ///
    /// データソースがレコードを供給できなかった場合に発生します。
    /// 部分的に読み込まれたコーパスで処理を続けることはありません。
    #[error("Corpus unavailable: {0}")]
    CorpusUnavailable(String),

    /// レコード数やポスティング長がu32に収まらない
    #[error(transparent)]
    TryFromInt(#[from] std::num::TryFromIntError),

    /// 整数として読めない列
    #[error(transparent)]
    ParseInt(#[from] std::num::ParseIntError),

    /// UTF-8として読めない列
    #[error(transparent)]
    Utf8(#[from] std::str::Utf8Error),

    /// I/Oエラー
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// rkyvのシリアライズ・検証エラー
    #[error(transparent)]
    Rkyv(#[from] rkyv::rancor::Error),

    /// 一時ファイルを置き換えられなかった
    #[error(transparent)]
    PathPersist(#[from] tempfile::PersistError),
}

impl EkitateError {
    pub(crate) fn invalid_argument<S>(arg: &'static str, msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::InvalidArgument(InvalidArgumentError {
            arg,
            msg: msg.into(),
        })
    }

    /// # 引数
    ///
    /// * `source` - 入力の種類(`"csv"`、`"index"`など)
    /// * `msg` - エラーメッセージ
    pub(crate) fn invalid_format<S>(source: &'static str, msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::InvalidFormat(InvalidFormatError {
            source_kind: source,
            msg: msg.into(),
        })
    }

    pub(crate) fn invalid_state<S, M>(msg: S, cause: M) -> Self
    where
        S: Into<String>,
        M: Into<String>,
    {
        Self::InvalidState(InvalidStateError {
            msg: msg.into(),
            cause: cause.into(),
        })
    }

    pub(crate) fn corpus_unavailable<S>(msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::CorpusUnavailable(msg.into())
    }
}

/// 引数が無効な場合に使用されるエラー
#[derive(Debug, Error)]
#[error("InvalidArgumentError: {arg}: {msg}")]
pub struct InvalidArgumentError {
    /// 引数の名前
    pub(crate) arg: &'static str,
    pub(crate) msg: String,
}

/// 入力の形式が無効な場合に使用されるエラー
#[derive(Debug, Error)]
#[error("InvalidFormatError: {source_kind}: {msg}")]
pub struct InvalidFormatError {
    /// 入力の種類
    pub(crate) source_kind: &'static str,
    pub(crate) msg: String,
}

/// 状態が無効な場合に使用されるエラー
#[derive(Debug, Error)]
#[error("InvalidStateError: {msg}: {cause}")]
pub struct InvalidStateError {
    pub(crate) msg: String,

    /// 根本原因
    pub(crate) cause: String,
}
