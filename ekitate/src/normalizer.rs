//! 検索文字列と駅名の正規化
//!
//! 縦クロスワード検索では、文字の表記モードを2種類扱います。
//!
//! - [`ScriptMode::Folded`]: カタカナをひらがなに畳み込んでから比較します。
//!   `シ`と`し`は同じ文字として扱われます。
//! - [`ScriptMode::Preserved`]: 表記をそのまま保持します。`シ`と`し`は別の文字です。
//!
//! 検索文字列は[`normalize`]で許可された文字のみに絞り込まれ、
//! 先頭[`MAX_QUERY_LEN`]文字に切り詰められます。駅名の索引付けには
//! 文字の除去も切り詰めも行わない[`fold_name`]を使用するため、
//! 索引上の位置は元の駅名の文字位置と一致します。

use std::str::FromStr;

use rkyv::{Archive, Deserialize, Serialize};

/// 検索文字列の最大文字数。
///
/// 縦クロスワードの位置の探索範囲もこの値で制限されます。
pub const MAX_QUERY_LEN: usize = 20;

const HIRAGANA_FIRST: char = '\u{3041}'; // ぁ
const HIRAGANA_LAST: char = '\u{3093}'; // ん
const KATAKANA_FIRST: char = '\u{30A1}'; // ァ
const KATAKANA_LAST: char = '\u{30FE}'; // ヾ
const KATAKANA_FOLDABLE_LAST: char = '\u{30F6}'; // ヶ
const KATAKANA_ITERATION: char = '\u{30FD}'; // ヽ
const KATAKANA_VOICED_ITERATION: char = '\u{30FE}'; // ヾ
const PROLONGED_SOUND_MARK: char = '\u{30FC}'; // ー
const IDEOGRAPH_FIRST: char = '\u{4E00}'; // 一
const IDEOGRAPH_LAST: char = '\u{9FAF}'; // 龯

/// カタカナとひらがなのコードポイントの差。
const KANA_DISTANCE: u32 = 0x60;

/// 文字表記の正規化モード。
///
/// 2つの位置インデックスのどちらを使うかを選択します。
#[derive(
    Clone, Copy, Eq, PartialEq, Debug, Hash, Default,
    Archive, Serialize, Deserialize,
)]
#[rkyv(derive(Debug, Eq, PartialEq, Hash, Clone, Copy))]
#[repr(u8)]
pub enum ScriptMode {
    /// カタカナをひらがなに畳み込むモード。
    #[default]
    Folded,
    /// ひらがなとカタカナを区別するモード。
    Preserved,
}

impl ScriptMode {
    /// 両方のモード。インデックスの構築順序でもあります。
    pub const ALL: [ScriptMode; 2] = [ScriptMode::Folded, ScriptMode::Preserved];

    /// カタカナを畳み込むかどうかのフラグからモードを作成します。
    pub const fn from_fold(fold_script: bool) -> Self {
        if fold_script {
            Self::Folded
        } else {
            Self::Preserved
        }
    }

    /// モード名を返します。ファイル名やCLI引数に使用されます。
    pub const fn name(self) -> &'static str {
        match self {
            Self::Folded => "folded",
            Self::Preserved => "preserved",
        }
    }

    /// モード名からモードを取得します。
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "folded" | "hiragana" => Some(Self::Folded),
            "preserved" | "katakana" => Some(Self::Preserved),
            _ => None,
        }
    }
}

impl FromStr for ScriptMode {
    type Err = &'static str;

    fn from_str(mode: &str) -> Result<Self, Self::Err> {
        Self::from_name(mode).ok_or("Could not parse a mode")
    }
}

/// 1文字をモードに従って畳み込みます。
///
/// `Folded`ではカタカナ`ァ`〜`ヶ`、`ヽ`、`ヾ`を対応するひらがなに変換します。
/// `ー`や`ヷ`〜`ヺ`のように対応するひらがながない文字はそのまま返します。
/// `Preserved`では常にそのまま返します。
#[inline(always)]
pub fn fold_char(c: char, mode: ScriptMode) -> char {
    if mode == ScriptMode::Preserved {
        return c;
    }
    let foldable = matches!(c, KATAKANA_FIRST..=KATAKANA_FOLDABLE_LAST)
        || c == KATAKANA_ITERATION
        || c == KATAKANA_VOICED_ITERATION;
    if foldable {
        // The mapped code point is always a valid hiragana.
        char::from_u32(u32::from(c) - KANA_DISTANCE).unwrap_or(c)
    } else {
        c
    }
}

/// 文字が検索文字列で許可されているかを判定します。
///
/// 許可される文字は、ひらがな(`ぁ`〜`ん`)、長音符`ー`、漢字(`一`〜`龯`)と、
/// `Preserved`の場合はカタカナ(`ァ`〜`ヾ`)です。
#[inline(always)]
pub fn is_permitted(c: char, mode: ScriptMode) -> bool {
    match c {
        HIRAGANA_FIRST..=HIRAGANA_LAST => true,
        PROLONGED_SOUND_MARK => true,
        IDEOGRAPH_FIRST..=IDEOGRAPH_LAST => true,
        KATAKANA_FIRST..=KATAKANA_LAST => mode == ScriptMode::Preserved,
        _ => false,
    }
}

/// 検索文字列を正規化します。
///
/// 1. `Folded`ではカタカナをひらがなに畳み込みます。
/// 2. 許可されていない文字を取り除きます。
/// 3. 先頭[`MAX_QUERY_LEN`]文字に切り詰めます。
///
/// 空文字列や無効な文字のみの入力に対しては空文字列を返します。エラーにはなりません。
///
/// # 例
///
/// ```
/// use ekitate::normalizer::{normalize, ScriptMode};
///
/// assert_eq!(normalize("シブヤ駅!", ScriptMode::Folded), "しぶや駅");
/// assert_eq!(normalize("シブヤ駅!", ScriptMode::Preserved), "シブヤ駅");
/// assert_eq!(normalize("abc", ScriptMode::Folded), "");
/// ```
pub fn normalize(raw: &str, mode: ScriptMode) -> String {
    raw.chars()
        .map(|c| fold_char(c, mode))
        .filter(|&c| is_permitted(c, mode))
        .take(MAX_QUERY_LEN)
        .collect()
}

/// 駅名をモードに従って1文字ずつ畳み込みます。
///
/// [`normalize`]と異なり、文字の除去も切り詰めも行いません。
/// 戻り値の長さは常に元の駅名の文字数と等しくなります。
pub fn fold_name(name: &str, mode: ScriptMode) -> Vec<char> {
    name.chars().map(|c| fold_char(c, mode)).collect()
}

/// 正規化済みの検索文字列。
///
/// 一度作成された後は変更されません。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Query {
    chars: Vec<char>,
    mode: ScriptMode,
}

impl Query {
    /// 生の文字列を正規化して検索文字列を作成します。
    pub fn new(raw: &str, mode: ScriptMode) -> Self {
        Self {
            chars: normalize(raw, mode).chars().collect(),
            mode,
        }
    }

    /// 正規化済みの文字列です。
    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    /// 正規化に使用したモードです。
    pub const fn mode(&self) -> ScriptMode {
        self.mode
    }

    /// 文字数です。
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    /// 空の検索文字列かどうかを返します。
    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// 正規化済みの文字列を返します。
    pub fn as_string(&self) -> String {
        self.chars.iter().collect()
    }
}
