//! 都道府県と地方区分
//!
//! 検索範囲の指定に使う都道府県コード(JIS X 0401)と地方区分を扱います。
//! 選択された地域に属する駅は優先集合([`PrioritySet`])として
//! 縦クロスワード解決に渡されます。

use std::collections::BTreeSet;

use hashbrown::HashSet;

use crate::corpus::Corpus;

/// JIS X 0401の都道府県コードと名前。コード順に並んでいます。
pub const PREFECTURES: [(u32, &str); 47] = [
    (1, "北海道"),
    (2, "青森県"),
    (3, "岩手県"),
    (4, "宮城県"),
    (5, "秋田県"),
    (6, "山形県"),
    (7, "福島県"),
    (8, "茨城県"),
    (9, "栃木県"),
    (10, "群馬県"),
    (11, "埼玉県"),
    (12, "千葉県"),
    (13, "東京都"),
    (14, "神奈川県"),
    (15, "新潟県"),
    (16, "富山県"),
    (17, "石川県"),
    (18, "福井県"),
    (19, "山梨県"),
    (20, "長野県"),
    (21, "岐阜県"),
    (22, "静岡県"),
    (23, "愛知県"),
    (24, "三重県"),
    (25, "滋賀県"),
    (26, "京都府"),
    (27, "大阪府"),
    (28, "兵庫県"),
    (29, "奈良県"),
    (30, "和歌山県"),
    (31, "鳥取県"),
    (32, "島根県"),
    (33, "岡山県"),
    (34, "広島県"),
    (35, "山口県"),
    (36, "徳島県"),
    (37, "香川県"),
    (38, "愛媛県"),
    (39, "高知県"),
    (40, "福岡県"),
    (41, "佐賀県"),
    (42, "長崎県"),
    (43, "熊本県"),
    (44, "大分県"),
    (45, "宮崎県"),
    (46, "鹿児島県"),
    (47, "沖縄県"),
];

/// 都道府県コードから名前を取得します。
pub fn prefecture_name(code: u32) -> Option<&'static str> {
    let i = usize::try_from(code).ok()?.checked_sub(1)?;
    PREFECTURES.get(i).map(|&(_, name)| name)
}

/// 都道府県名からコードを取得します。
pub fn prefecture_code(name: &str) -> Option<u32> {
    PREFECTURES
        .iter()
        .find(|&&(_, n)| n == name)
        .map(|&(code, _)| code)
}

/// 地方区分
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RegionGroup {
    /// 北海道地方
    Hokkaido,
    /// 東北地方
    Tohoku,
    /// 関東地方
    Kanto,
    /// 中部地方
    Chubu,
    /// 近畿地方
    Kinki,
    /// 中国地方
    Chugoku,
    /// 四国地方
    Shikoku,
    /// 九州・沖縄地方
    KyushuOkinawa,
}

impl RegionGroup {
    /// すべての地方区分。北から順に並んでいます。
    pub const ALL: [RegionGroup; 8] = [
        RegionGroup::Hokkaido,
        RegionGroup::Tohoku,
        RegionGroup::Kanto,
        RegionGroup::Chubu,
        RegionGroup::Kinki,
        RegionGroup::Chugoku,
        RegionGroup::Shikoku,
        RegionGroup::KyushuOkinawa,
    ];

    /// 地方名
    pub const fn name(self) -> &'static str {
        match self {
            Self::Hokkaido => "北海道",
            Self::Tohoku => "東北",
            Self::Kanto => "関東",
            Self::Chubu => "中部",
            Self::Kinki => "近畿",
            Self::Chugoku => "中国",
            Self::Shikoku => "四国",
            Self::KyushuOkinawa => "九州・沖縄",
        }
    }

    /// 地方名から地方区分を取得します。
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|g| g.name() == name)
    }

    /// 地方に属する都道府県コード
    pub const fn prefectures(self) -> &'static [u32] {
        match self {
            Self::Hokkaido => &[1],
            Self::Tohoku => &[2, 3, 4, 5, 6, 7],
            Self::Kanto => &[8, 9, 10, 11, 12, 13, 14],
            Self::Chubu => &[15, 16, 17, 18, 19, 20, 21, 22, 23],
            Self::Kinki => &[24, 25, 26, 27, 28, 29, 30],
            Self::Chugoku => &[31, 32, 33, 34, 35],
            Self::Shikoku => &[36, 37, 38, 39],
            Self::KyushuOkinawa => &[40, 41, 42, 43, 44, 45, 46, 47],
        }
    }

    /// 選択肢として表示する`【地方名】`形式の文字列を返します。
    pub fn option_label(self) -> String {
        format!("【{}】", self.name())
    }
}

/// 検索範囲の選択肢を返します。
///
/// 地方区分(`【関東】`など)が先に、続いて都道府県名がコード順に並びます。
pub fn region_options() -> Vec<String> {
    RegionGroup::ALL
        .into_iter()
        .map(RegionGroup::option_label)
        .chain(PREFECTURES.iter().map(|&(_, name)| name.to_string()))
        .collect()
}

/// 選択された検索範囲
///
/// 地方区分と都道府県の選択を都道府県コードの集合に展開したものです。
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegionSelection {
    codes: BTreeSet<u32>,
}

impl RegionSelection {
    /// 選択肢の文字列を解析します。
    ///
    /// `【地方名】`は地方に属する全都道府県に、都道府県名はそのコードに展開されます。
    /// 認識できない選択肢は無視されます。
    ///
    /// # 例
    ///
    /// ```
    /// use ekitate::region::RegionSelection;
    ///
    /// let sel = RegionSelection::parse(["【四国】", "東京都", "火星"]);
    /// assert_eq!(sel.codes().collect::<Vec<_>>(), vec![13, 36, 37, 38, 39]);
    /// ```
    pub fn parse<I, S>(options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut codes = BTreeSet::new();
        for option in options {
            let option = option.as_ref().trim();
            if let Some(group) = option
                .strip_prefix('【')
                .and_then(|s| s.strip_suffix('】'))
            {
                match RegionGroup::from_name(group) {
                    Some(g) => codes.extend(g.prefectures().iter().copied()),
                    None => log::debug!("unknown region group: {option}"),
                }
            } else if let Some(code) = prefecture_code(option) {
                codes.insert(code);
            } else {
                log::debug!("unknown region option: {option}");
            }
        }
        Self { codes }
    }

    /// 都道府県コードから直接作成します。
    pub fn from_codes<I>(codes: I) -> Self
    where
        I: IntoIterator<Item = u32>,
    {
        Self {
            codes: codes.into_iter().collect(),
        }
    }

    /// 選択された都道府県コードを昇順で返します。
    pub fn codes(&self) -> impl Iterator<Item = u32> + '_ {
        self.codes.iter().copied()
    }

    /// 都道府県コードが選択されているかを返します。
    pub fn contains(&self, code: u32) -> bool {
        self.codes.contains(&code)
    }

    /// 何も選択されていないかを返します。
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

/// 優先集合
///
/// 縦クロスワード解決で優先して採用されるレコードIDの集合です。
/// 空の場合は全国のレコードが同列に扱われます。
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PrioritySet {
    ids: HashSet<u32>,
}

impl PrioritySet {
    /// 空の優先集合を作成します。
    pub fn new() -> Self {
        Self::default()
    }

    /// レコードIDから作成します。
    pub fn from_ids<I>(ids: I) -> Self
    where
        I: IntoIterator<Item = u32>,
    {
        Self {
            ids: ids.into_iter().collect(),
        }
    }

    /// 選択された地域に属するレコードから作成します。
    pub fn from_regions(corpus: &Corpus, selection: &RegionSelection) -> Self {
        if selection.is_empty() {
            return Self::new();
        }
        Self::from_ids(
            corpus
                .records()
                .iter()
                .filter(|r| selection.contains(r.region))
                .map(|r| r.id),
        )
    }

    /// IDが含まれているかを返します。
    #[inline(always)]
    pub fn contains(&self, id: u32) -> bool {
        self.ids.contains(&id)
    }

    /// 含まれているIDの数
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// 空かどうか
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
