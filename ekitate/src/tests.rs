//! ekitateのテストモジュール群
//!
//! 駅データCSVから検索結果までを通した動作と、
//! インデックスの保存・読み込みを検証するテストを含みます。

mod store;
