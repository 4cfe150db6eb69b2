//! 駅名インデックスコンパイラのメインエントリーポイント
//!
//! 駅データCSVから縦クロスワード検索用の位置インデックスを構築するサブコマンドと、
//! 構築済みのインデックスを確認するサブコマンドを提供します。

mod build;
mod inspect;

use clap::Parser;
use thiserror::Error;

use crate::{build::BuildError, inspect::InspectError};

/// コマンドライン引数の構造体
#[derive(Parser, Debug)]
#[clap(name = "compile", version)]
struct Cli {
    /// 実行するサブコマンド
    #[clap(subcommand)]
    command: Command,
}

/// 利用可能なサブコマンド
#[derive(Parser, Debug)]
enum Command {
    /// 駅データから位置インデックスを構築します
    ///
    /// 畳み込みモードと表記保持モードの2つのインデックスを出力ディレクトリに書き出します。
    Build(build::Args),

    /// 構築済みの位置インデックスの情報を表示します
    Inspect(inspect::Args),
}

/// コンパイラの実行中に発生する可能性のあるエラー
#[derive(Debug, Error)]
pub enum CompileError {
    /// ビルド実行中のエラー
    #[error(transparent)]
    BuildError(#[from] BuildError),
    /// 情報表示中のエラー
    #[error(transparent)]
    InspectError(#[from] InspectError),
}

/// メイン関数
///
/// コマンドライン引数をパースし、指定されたサブコマンドを実行します。
///
/// # エラー
///
/// 各サブコマンドの実行中にエラーが発生した場合、そのエラーが返されます。
fn main() -> Result<(), CompileError> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Command::Build(args) => Ok(build::run(args)?),
        Command::Inspect(args) => Ok(inspect::run(args)?),
    }
}
