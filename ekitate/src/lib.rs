//! # ekitate
//!
//! 駅名の縦クロスワード検索の実装です。
//!
//! ## 概要
//!
//! 検索文字列の各文字が、ある同じ文字位置に現れる駅名をそれぞれ探します。
//! たとえば「しお」に対しては、1文字目が「し」の駅と1文字目が「お」の駅を並べることで、
//! 縦に「しお」と読める組み合わせが得られます。
//!
//! ## 主な機能
//!
//! - **位置インデックス**: `位置 → 文字 → レコードID`の転置インデックス
//! - **2つの表記モード**: カタカナをひらがなに畳み込むモードと、表記を保持するモード
//! - **地域優先**: 選択した都道府県・地方の駅を優先し、足りない分を全国から補う
//! - **インデックスの保存**: rkyvとzstdによるインデックスファイルの保存と再利用
//!
//! ## 使用例
//!
//! ```
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use ekitate::{CrosswordSession, Provenance, RecordDraft, RegionSelection, ScriptMode};
//!
//! let stations = vec![
//!     RecordDraft::new("しんじゅく", 13),
//!     RecordDraft::new("しぶや", 13),
//!     RecordDraft::new("おおさか", 27),
//! ];
//! let session = CrosswordSession::open(&stations, None)?;
//!
//! let rows = session.search("シオ", ScriptMode::Folded, &RegionSelection::parse(["【関東】"]));
//! assert_eq!(rows.len(), 3);
//!
//! assert_eq!(rows[0].name, "しんじゅく");
//! assert_eq!(rows[0].provenance, Provenance::Priority);
//! assert_eq!(rows[2].name, "おおさか");
//! assert_eq!(rows[2].matched_char, 'お');
//! assert_eq!(rows[2].char_position, 1);
//! assert_eq!(rows[2].provenance, Provenance::Fallback);
//! # Ok(())
//! # }
//! ```

#[cfg(not(any(target_pointer_width = "32", target_pointer_width = "64")))]
compile_error!("`target_pointer_width` must be 32 or 64");

/// 駅データのコーパスと読み込み
pub mod corpus;

/// エラー型の定義
pub mod errors;

/// 位置インデックスとその構築・保存
pub mod index;

/// 検索文字列と駅名の正規化
pub mod normalizer;

/// 解決結果の表形式への変換
pub mod projector;

/// 都道府県と地方区分
pub mod region;

/// 縦クロスワードの解決
pub mod resolver;

/// 検索セッション
pub mod session;

/// 内部ユーティリティ関数
pub mod utils;

#[cfg(test)]
mod tests;

// Re-exports
pub use corpus::{Corpus, CsvRecordSource, Payload, Record, RecordDraft, RecordSource};
pub use index::{FileIndexStore, IndexBuilder, IndexStore, PositionalIndex};
pub use normalizer::{normalize, Query, ScriptMode, MAX_QUERY_LEN};
pub use projector::{project, ResultRow};
pub use region::{PrioritySet, RegionSelection};
pub use resolver::{CrosswordResolver, DedupPolicy, Provenance, Resolution};
pub use session::{CrosswordSession, Snapshot};

/// このライブラリのバージョン番号
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
