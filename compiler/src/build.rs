//! 位置インデックスのビルドモジュール
//!
//! このモジュールは、駅データCSVから2つの表記モードの位置インデックスを構築し、
//! zstd圧縮したrkyv形式のファイルとして出力する機能を提供します。

use std::path::PathBuf;
use std::time::Instant;

use ekitate::errors::EkitateError;
use ekitate::index::builder::DEFAULT_SHARD_SIZE;
use ekitate::index::store::DEFAULT_COMPRESSION_LEVEL;
use ekitate::{Corpus, CsvRecordSource, FileIndexStore, IndexBuilder, IndexStore, ScriptMode};

use clap::Parser;

/// ビルドコマンドの引数
#[derive(Parser, Debug)]
#[clap(
    name = "build",
    about = "A program to build the positional indexes."
)]
pub struct Args {
    /// Station data (CSV).
    #[clap(short = 'i', long)]
    stations_in: PathBuf,

    /// Directory to which the indexes are output.
    #[clap(short = 'o', long)]
    index_out: PathBuf,

    /// Number of records indexed by one worker.
    #[clap(long, default_value_t = DEFAULT_SHARD_SIZE)]
    shard_size: usize,

    /// zstd compression level of the output files.
    #[clap(short = 'l', long, default_value_t = DEFAULT_COMPRESSION_LEVEL)]
    level: i32,

    /// Builds the indexes on the current thread only.
    #[clap(long)]
    single_thread: bool,
}

/// ビルド処理中に発生する可能性のあるエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// 駅データの読み込み、インデックスの構築、または書き出しのエラー
    #[error("Index building failed: {0}")]
    Ekitate(#[from] EkitateError),
}

/// ビルドコマンドを実行する
///
/// 駅データから両モードの位置インデックスを構築し、出力ディレクトリに保存します。
///
/// # 引数
///
/// * `args` - ビルドコマンドの引数
///
/// # エラー
///
/// 駅データの読み込み、構築、書き出しに失敗した場合、`BuildError`を返します。
pub fn run(args: Args) -> Result<(), BuildError> {
    eprintln!("Loading the station data...");
    let start = Instant::now();
    let corpus = Corpus::load(&CsvRecordSource::new(&args.stations_in))?;
    let fingerprint = corpus.fingerprint();
    eprintln!(
        "{} stations loaded in {:.3} s",
        corpus.len(),
        start.elapsed().as_secs_f64()
    );

    eprintln!("Compiling the positional indexes...");
    let start = Instant::now();
    let (folded, preserved) = if args.single_thread {
        (
            IndexBuilder::build(&corpus, ScriptMode::Folded)?,
            IndexBuilder::build(&corpus, ScriptMode::Preserved)?,
        )
    } else {
        IndexBuilder::new()
            .with_shard_size(args.shard_size)?
            .build_both(&corpus)?
    };
    eprintln!("Compiled in {:.3} s", start.elapsed().as_secs_f64());

    eprintln!("Writing the positional indexes...");
    let store = FileIndexStore::new(&args.index_out).with_compression_level(args.level);
    for index in [&folded, &preserved] {
        let mode = index.mode();
        store.save_index(mode, index, &fingerprint)?;
        eprintln!(
            "{}: {} offsets, {} buckets, {} entries -> {}",
            mode.name(),
            index.num_offsets(),
            index.num_buckets(),
            index.num_entries(),
            store.path(mode).display()
        );
    }

    println!(
        "Successfully built the indexes to {} (fingerprint {fingerprint})",
        args.index_out.display()
    );
    Ok(())
}
