//! 位置インデックスの保存と読み込み
//!
//! 構築済みのインデックスはモードごとに1つのファイルとして保存されます。
//! ファイルの中身はzstdで圧縮された次のバイト列です。
//!
//! ```text
//! INDEX_MAGIC | 0xFF パディング(16バイト境界まで) | rkyv(IndexArtifact)
//! ```
//!
//! [`IndexArtifact`]にはコーパスの指紋が含まれており、
//! 別のコーパスから作られたインデックスは読み込まれません。

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use rkyv::rancor::Error;
use rkyv::util::AlignedVec;
use rkyv::{
    access, api::serialize_using, ser::allocator::Arena, ser::sharing::Share,
    ser::writer::IoWriter, ser::Serializer, util::with_arena, Archive, Deserialize,
    Serialize,
};

use crate::errors::{EkitateError, Result};
use crate::index::PositionalIndex;
use crate::normalizer::ScriptMode;

/// インデックスファイルを識別するマジックバイト。
///
/// "0.1"はファイルフォーマットのバージョンで、クレートのバージョンとは独立しています。
pub const INDEX_MAGIC: &[u8] = b"EkitateIndexRkyv 0.1\n";

const INDEX_MAGIC_LEN: usize = INDEX_MAGIC.len();
const RKYV_ALIGNMENT: usize = 16;
const PADDING_LEN: usize = (RKYV_ALIGNMENT - (INDEX_MAGIC_LEN % RKYV_ALIGNMENT)) % RKYV_ALIGNMENT;
const DATA_START: usize = INDEX_MAGIC_LEN + PADDING_LEN;

/// zstd圧縮レベルの既定値
pub const DEFAULT_COMPRESSION_LEVEL: i32 = 19;

/// グローバルキャッシュディレクトリのパス。
///
/// ユーザー固有のシステムキャッシュディレクトリ内の`ekitate`サブディレクトリを指します。
/// - Linux: `$XDG_CACHE_HOME/ekitate` または `$HOME/.cache/ekitate`
/// - macOS: `$HOME/Library/Caches/ekitate`
/// - Windows: `{FOLDERID_LocalAppData}/ekitate`
pub static GLOBAL_CACHE_DIR: LazyLock<Option<PathBuf>> = LazyLock::new(|| {
    let path = dirs::cache_dir()?.join("ekitate");
    fs::create_dir_all(&path).ok()?;

    Some(path)
});

/// インデックスの保存先
///
/// 保存先に該当するインデックスがない場合や古い場合、読み込みは`None`を返します。
/// 呼び出し側はその場合インデックスを構築し直します。
pub trait IndexStore: Send + Sync {
    /// モードに対応するインデックスを読み込みます。
    ///
    /// # 引数
    ///
    /// * `mode` - 読み込むインデックスのモード
    /// * `fingerprint` - 現在のコーパスの指紋
    ///
    /// # 戻り値
    ///
    /// 保存されていない、または指紋が一致しない場合は`None`
    ///
    /// # エラー
    ///
    /// 保存されたデータが壊れている場合などに[`EkitateError`]が返されます。
    fn load_index(&self, mode: ScriptMode, fingerprint: &str) -> Result<Option<PositionalIndex>>;

    /// インデックスを保存します。
    ///
    /// # エラー
    ///
    /// 書き込みに失敗した場合、[`EkitateError`]が返されます。
    fn save_index(&self, mode: ScriptMode, index: &PositionalIndex, fingerprint: &str)
        -> Result<()>;
}

/// 保存されるインデックスとその元になったコーパスの指紋
#[derive(Archive, Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct IndexArtifact {
    /// コーパスの指紋
    pub fingerprint: String,
    /// 位置インデックス
    pub index: PositionalIndex,
}

impl IndexArtifact {
    /// アーティファクトを書き出します。
    ///
    /// # エラー
    ///
    /// 書き込みまたはrkyvシリアライゼーションに失敗した場合、[`EkitateError`]が返されます。
    pub fn write<W>(&self, mut wtr: W) -> Result<()>
    where
        W: Write,
    {
        wtr.write_all(INDEX_MAGIC)?;

        let padding_bytes = vec![0xFF; PADDING_LEN];
        wtr.write_all(&padding_bytes)?;

        with_arena(|arena: &mut Arena| {
            let writer = IoWriter::new(&mut wtr);
            let mut serializer = Serializer::new(writer, arena.acquire(), Share::new());
            serialize_using::<_, Error>(self, &mut serializer)
        })
        .map_err(|e| {
            EkitateError::invalid_state("rkyv serialization failed".to_string(), e.to_string())
        })?;

        Ok(())
    }

    /// アーティファクトを読み込みます。
    ///
    /// マジックバイトとrkyvの検証を行った後、所有権を持つ値に変換します。
    ///
    /// # エラー
    ///
    /// マジックバイトが一致しない場合や、データが壊れている場合に[`EkitateError`]が返されます。
    pub fn read<R: Read>(mut rdr: R) -> Result<Self> {
        let mut buffer = Vec::new();
        rdr.read_to_end(&mut buffer)?;

        if !buffer.starts_with(INDEX_MAGIC) {
            return Err(EkitateError::invalid_argument(
                "rdr",
                "The magic number of the input index mismatches.",
            ));
        }

        let mut aligned_bytes: AlignedVec = AlignedVec::with_capacity(buffer.len());
        aligned_bytes.extend_from_slice(&buffer);

        let Some(data_bytes) = aligned_bytes.get(DATA_START..) else {
            return Err(EkitateError::invalid_argument(
                "rdr",
                "Index file too small or corrupted.",
            ));
        };

        let archived = access::<ArchivedIndexArtifact, Error>(data_bytes).map_err(|e| {
            EkitateError::invalid_state(
                "rkyv validation failed. The index file may be corrupted or incompatible."
                    .to_string(),
                e.to_string(),
            )
        })?;

        let artifact = rkyv::deserialize::<IndexArtifact, Error>(archived)?;
        artifact.index.validate()?;
        Ok(artifact)
    }
}

/// ディレクトリにインデックスを保存する[`IndexStore`]
///
/// 書き込みは一時ファイルを経由して置き換えるため、読み込み側が
/// 書き込み途中のファイルを見ることはありません。
#[derive(Clone, Debug)]
pub struct FileIndexStore {
    dir: PathBuf,
    compression_level: i32,
}

impl FileIndexStore {
    /// 保存先ディレクトリを指定して作成します。
    pub fn new<P>(dir: P) -> Self
    where
        P: AsRef<Path>,
    {
        Self {
            dir: dir.as_ref().to_path_buf(),
            compression_level: DEFAULT_COMPRESSION_LEVEL,
        }
    }

    /// [`GLOBAL_CACHE_DIR`]を保存先として作成します。
    ///
    /// # エラー
    ///
    /// キャッシュディレクトリを決定できない場合、[`EkitateError`]が返されます。
    pub fn in_cache_dir() -> Result<Self> {
        let dir = GLOBAL_CACHE_DIR.as_ref().ok_or_else(|| {
            EkitateError::invalid_state(
                "Could not determine the global cache directory.",
                "dirs::cache_dir() returned None",
            )
        })?;
        Ok(Self::new(dir))
    }

    /// zstdの圧縮レベルを設定します。
    pub const fn with_compression_level(mut self, level: i32) -> Self {
        self.compression_level = level;
        self
    }

    /// 保存先ディレクトリ
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// モードに対応するファイルのパスを返します。
    pub fn path(&self, mode: ScriptMode) -> PathBuf {
        self.dir.join(format!("station_{}.idx.zst", mode.name()))
    }
}

impl FileIndexStore {
    /// 指紋を確認せずにアーティファクトを読み込みます。
    ///
    /// ファイルが存在しない場合は`None`を返します。
    ///
    /// # エラー
    ///
    /// ファイルが壊れている場合、[`EkitateError`]が返されます。
    pub fn read_artifact(&self, mode: ScriptMode) -> Result<Option<IndexArtifact>> {
        let path = self.path(mode);
        if !path.exists() {
            log::debug!("no index at {}", path.display());
            return Ok(None);
        }

        let decoder = zstd::Decoder::new(File::open(&path)?)?;
        IndexArtifact::read(decoder).map(Some)
    }
}

impl IndexStore for FileIndexStore {
    fn load_index(&self, mode: ScriptMode, fingerprint: &str) -> Result<Option<PositionalIndex>> {
        let Some(artifact) = self.read_artifact(mode)? else {
            return Ok(None);
        };
        let path = self.path(mode);

        if artifact.fingerprint != fingerprint {
            log::info!("stale index at {}", path.display());
            return Ok(None);
        }
        if artifact.index.mode() != mode {
            return Err(EkitateError::invalid_state(
                format!("unexpected index in {}", path.display()),
                format!(
                    "expected {}, found {}",
                    mode.name(),
                    artifact.index.mode().name()
                ),
            ));
        }
        log::info!("loaded {} index from {}", mode.name(), path.display());
        Ok(Some(artifact.index))
    }

    fn save_index(
        &self,
        mode: ScriptMode,
        index: &PositionalIndex,
        fingerprint: &str,
    ) -> Result<()> {
        if index.mode() != mode {
            return Err(EkitateError::invalid_argument(
                "index",
                format!("expected a {} index", mode.name()),
            ));
        }
        fs::create_dir_all(&self.dir)?;

        let artifact = IndexArtifact {
            fingerprint: fingerprint.to_string(),
            index: index.clone(),
        };

        let mut temp_file = tempfile::NamedTempFile::new_in(&self.dir)?;
        {
            let mut encoder = zstd::Encoder::new(temp_file.as_file_mut(), self.compression_level)?;
            artifact.write(&mut encoder)?;
            encoder.finish()?;
        }
        temp_file.as_file().sync_all()?;

        let path = self.path(mode);
        temp_file.persist(&path)?;
        log::info!("saved {} index to {}", mode.name(), path.display());
        Ok(())
    }
}
