//! 位置インデックスの正しさを評価するユーティリティ
//!
//! このバイナリは、コンパイル済みの位置インデックスを駅データの全件走査と比較し、
//! 適合率（Precision）、再現率（Recall）、F1スコアを表示します。
//! 1件でも食い違いがあれば、終了コードは0以外になります。

use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::path::PathBuf;

use ekitate::normalizer::fold_name;
use ekitate::{Corpus, CsvRecordSource, FileIndexStore, IndexStore, PositionalIndex, ScriptMode};

use clap::Parser;

/// コマンドライン引数
#[derive(Parser, Debug)]
#[clap(name = "evaluate", about = "Evaluate the compiled indexes")]
struct Args {
    /// Station data (CSV).
    #[clap(short = 'i', long)]
    stations_in: PathBuf,

    /// Directory of the compiled indexes.
    #[clap(short = 'd', long)]
    index_dir: PathBuf,

    /// Script modes to evaluate. Specify comma-separated names.
    /// If empty, both modes are evaluated.
    #[clap(short = 'm', long, value_delimiter(','))]
    modes: Vec<ScriptMode>,

    /// Maximum number of mismatches to print per mode.
    #[clap(long, default_value = "10")]
    max_report: usize,
}

/// (位置, 文字)ごとのレコードIDの集合
type Table = BTreeMap<(usize, char), BTreeSet<u32>>;

/// 駅名を全件走査して期待されるインデックスを作る
///
/// # 引数
///
/// * `corpus` - 走査対象のコーパス
/// * `mode` - 駅名の畳み込みに使用するモード
///
/// # 戻り値
///
/// (位置, 文字)からレコードIDの集合への表
fn scan(corpus: &Corpus, mode: ScriptMode) -> Table {
    let mut table = Table::new();
    for record in corpus.iter() {
        for (offset, c) in fold_name(&record.name, mode).into_iter().enumerate() {
            table.entry((offset, c)).or_default().insert(record.id);
        }
    }
    table
}

/// インデックスの内容を表に変換する
fn collect(index: &PositionalIndex) -> Table {
    index
        .entries()
        .map(|(offset, c, ids)| ((offset, c), ids.iter().copied().collect()))
        .collect()
}

/// メイン関数
///
/// 駅データのフィンガープリントに一致するインデックスを読み込み、
/// 全件走査の結果と比較します。
///
/// # 戻り値
///
/// すべてのモードが一致した場合は `Ok(())`、読み込みに失敗した場合や
/// 食い違いがあった場合はエラー情報
fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = Args::parse();

    eprintln!("Loading the station data...");
    let corpus = Corpus::load(&CsvRecordSource::new(&args.stations_in))?;
    let fingerprint = corpus.fingerprint();
    eprintln!("{} stations, fingerprint {fingerprint}", corpus.len());

    let store = FileIndexStore::new(&args.index_dir);
    let modes = if args.modes.is_empty() {
        ScriptMode::ALL.to_vec()
    } else {
        args.modes.clone()
    };

    let mut failed = false;
    for mode in modes {
        let Some(index) = store.load_index(mode, &fingerprint)? else {
            eprintln!(
                "{}: missing or stale index at {}",
                mode.name(),
                store.path(mode).display()
            );
            failed = true;
            continue;
        };

        eprintln!("Evaluating the {} index...", mode.name());
        let expected = scan(&corpus, mode);
        let actual = collect(&index);

        let mut num_ref = 0;
        let mut num_sys = 0;
        let mut num_cor = 0;
        let mut mismatches = vec![];
        for key in expected.keys().chain(actual.keys()).collect::<BTreeSet<_>>() {
            let empty = BTreeSet::new();
            let e = expected.get(key).unwrap_or(&empty);
            let a = actual.get(key).unwrap_or(&empty);
            num_ref += e.len();
            num_sys += a.len();
            num_cor += e.intersection(a).count();
            if e != a {
                mismatches.push((*key, e.len(), a.len()));
            }
        }
        if index.num_entries() != num_ref {
            eprintln!(
                "{}: entry count {} differs from the scan {}",
                mode.name(),
                index.num_entries(),
                num_ref
            );
            failed = true;
        }

        let precision = num_cor as f64 / num_sys.max(1) as f64;
        let recall = num_cor as f64 / num_ref.max(1) as f64;
        let f1 = if precision + recall == 0.0 {
            0.0
        } else {
            2.0 * precision * recall / (precision + recall)
        };
        println!("[{}]", mode.name());
        println!("Offsets: {}", index.num_offsets());
        println!("Buckets: {}", index.num_buckets());
        println!("Entries: {}", index.num_entries());
        println!("Precision: {precision}");
        println!("Recall: {recall}");
        println!("F1: {f1}");

        for ((offset, c), e, a) in mismatches.iter().take(args.max_report) {
            println!("Mismatch: offset={offset} char={c} expected={e} actual={a}");
        }
        if !mismatches.is_empty() {
            println!("Mismatches: {}", mismatches.len());
            failed = true;
        }
    }

    if failed {
        return Err("the indexes do not match the station data".into());
    }
    Ok(())
}
