//! 位置インデックスの情報を表示するモジュール

use std::path::PathBuf;

use ekitate::errors::EkitateError;
use ekitate::{Corpus, CsvRecordSource, FileIndexStore, ScriptMode};

use clap::Parser;

/// 表示コマンドの引数
#[derive(Parser, Debug)]
#[clap(
    name = "inspect",
    about = "A program to show the summary of the positional indexes."
)]
pub struct Args {
    /// Directory of the compiled indexes.
    #[clap(short = 'd', long)]
    index_dir: PathBuf,

    /// Station data (CSV) to check the fingerprints against.
    #[clap(short = 'i', long)]
    stations_in: Option<PathBuf>,
}

/// 表示処理中に発生する可能性のあるエラー
#[derive(Debug, thiserror::Error)]
pub enum InspectError {
    /// インデックスまたは駅データの読み込みエラー
    #[error("Index inspection failed: {0}")]
    Ekitate(#[from] EkitateError),
}

/// 表示コマンドを実行する
///
/// 各モードのインデックスファイルについて、指紋と規模を表示します。
/// 駅データが指定された場合は、指紋が一致するかも表示します。
///
/// # エラー
///
/// ファイルが壊れている場合や駅データを読み込めない場合、`InspectError`を返します。
pub fn run(args: Args) -> Result<(), InspectError> {
    let current = match &args.stations_in {
        Some(path) => Some(Corpus::load(&CsvRecordSource::new(path))?.fingerprint()),
        None => None,
    };

    let store = FileIndexStore::new(&args.index_dir);
    for mode in ScriptMode::ALL {
        let path = store.path(mode);
        let Some(artifact) = store.read_artifact(mode)? else {
            println!("{}: not found ({})", mode.name(), path.display());
            continue;
        };
        let index = &artifact.index;
        println!("{}: {}", mode.name(), path.display());
        println!("  fingerprint: {}", artifact.fingerprint);
        println!("  offsets: {}", index.num_offsets());
        println!("  buckets: {}", index.num_buckets());
        println!("  entries: {}", index.num_entries());
        if let Some(fingerprint) = &current {
            let status = if *fingerprint == artifact.fingerprint {
                "up to date"
            } else {
                "stale"
            };
            println!("  status: {status}");
        }
    }
    Ok(())
}
