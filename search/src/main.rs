//! 縦クロスワード検索を実行するユーティリティ
//!
//! このバイナリは、標準入力から1行ずつ検索文字列を読み込み、
//! 縦クロスワードの候補駅をタブ区切りで出力します。
//! 1つの検索文字列の結果の後には`EOS`が出力されます。

use std::error::Error;
use std::io::{BufRead, BufWriter, Write};
use std::path::PathBuf;

use ekitate::region::region_options;
use ekitate::{
    CrosswordSession, CsvRecordSource, DedupPolicy, FileIndexStore, IndexStore, RegionSelection,
    ScriptMode,
};

use clap::Parser;

/// コマンドライン引数
#[derive(Parser, Debug)]
#[clap(name = "search", about = "Finds stations for a vertical crossword")]
struct Args {
    /// Station data (CSV).
    #[clap(short = 'i', long, required_unless_present = "list_regions")]
    stations_in: Option<PathBuf>,

    /// Directory of the compiled indexes.
    ///
    /// If this argument is not specified, the user cache directory is used.
    #[clap(short = 'd', long)]
    index_dir: Option<PathBuf>,

    /// Builds the indexes in memory without reading or writing index files.
    #[clap(long)]
    no_cache: bool,

    /// Script mode. Choices are folded and preserved.
    #[clap(short = 'm', long, default_value = "folded")]
    mode: ScriptMode,

    /// Prioritized region, such as 東京都 or 【関東】. Can be repeated.
    #[clap(short = 'r', long = "region")]
    regions: Vec<String>,

    /// Duplicate elimination policy. Choices are id and name-region.
    #[clap(long, default_value = "id")]
    dedup: DedupPolicy,

    /// Resolves the offsets in parallel.
    #[clap(short = 'P', long)]
    parallel: bool,

    /// Prints the available region options and exits.
    #[clap(long)]
    list_regions: bool,
}

/// メイン関数
///
/// 駅データとインデックスをロードし、標準入力の各行を検索文字列として
/// 縦クロスワードを解決した結果を標準出力に出力します。
fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = Args::parse();

    let out = std::io::stdout();
    let mut out = BufWriter::new(out.lock());

    if args.list_regions {
        for option in region_options() {
            writeln!(&mut out, "{option}")?;
        }
        return Ok(());
    }

    let Some(stations_in) = args.stations_in else {
        return Err("--stations-in is required".into());
    };
    let source = CsvRecordSource::new(stations_in);
    let store = if args.no_cache {
        None
    } else if let Some(dir) = args.index_dir {
        Some(FileIndexStore::new(dir))
    } else {
        FileIndexStore::in_cache_dir().ok()
    };

    eprintln!("Loading the station data...");
    let session = CrosswordSession::open(&source, store.as_ref().map(|s| s as &dyn IndexStore))?
        .with_dedup_policy(args.dedup)
        .with_parallel(args.parallel);

    let selection = RegionSelection::parse(&args.regions);
    if !args.regions.is_empty() && selection.is_empty() {
        eprintln!("Warning: none of the regions is known; searching nationwide");
    }

    eprintln!("Ready to search");

    let is_tty = atty::is(atty::Stream::Stdout);

    let lines = std::io::stdin().lock().lines();
    for line in lines {
        let line = line?;
        for row in session.search(&line, args.mode, &selection) {
            writeln!(
                &mut out,
                "{}\t{}\t{}\t{}\t{}\t{}\t{}",
                row.name,
                row.payload.region_name,
                row.payload.operator,
                row.payload.route,
                row.matched_char,
                row.char_position,
                row.provenance.label(),
            )?;
        }
        out.write_all(b"EOS\n")?;
        if is_tty {
            out.flush()?;
        }
    }

    Ok(())
}
