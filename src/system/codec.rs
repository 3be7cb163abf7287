use crate::models::archive_entry::{ArchiveEntry, UNKNOWN_TIME};
use crate::utils::error::{BokslZipError, Result};
use chrono::{Datelike, Timelike};
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::warn;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipArchive, ZipWriter};

/// 엔트리 이름 인코딩
///
/// zip 포맷이 규정하는 두 가지 이름 인코딩만 지원한다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameEncoding {
    Utf8,
    Cp437,
}

impl NameEncoding {
    pub fn label(&self) -> &'static str {
        match self {
            NameEncoding::Utf8 => "UTF-8",
            NameEncoding::Cp437 => "CP437",
        }
    }

    /// 원시 이름 바이트를 문자열로 변환
    pub fn decode(&self, raw: &[u8]) -> String {
        match self {
            NameEncoding::Utf8 => String::from_utf8_lossy(raw).into_owned(),
            NameEncoding::Cp437 => raw
                .iter()
                .map(|&b| {
                    if b < 0x80 {
                        b as char
                    } else {
                        CP437_HIGH[(b - 0x80) as usize]
                    }
                })
                .collect(),
        }
    }
}

// CP437 상위 바이트 (0x80-0xFF) 변환 테이블
const CP437_HIGH: [char; 128] = [
    'Ç', 'ü', 'é', 'â', 'ä', 'à', 'å', 'ç', 'ê', 'ë', 'è', 'ï', 'î', 'ì', 'Ä', 'Å', 'É', 'æ', 'Æ',
    'ô', 'ö', 'ò', 'û', 'ù', 'ÿ', 'Ö', 'Ü', '¢', '£', '¥', '₧', 'ƒ', 'á', 'í', 'ó', 'ú', 'ñ', 'Ñ',
    'ª', 'º', '¿', '⌐', '¬', '½', '¼', '¡', '«', '»', '░', '▒', '▓', '│', '┤', '╡', '╢', '╖', '╕',
    '╣', '║', '╗', '╝', '╜', '╛', '┐', '└', '┴', '┬', '├', '─', '┼', '╞', '╟', '╚', '╔', '╩', '╦',
    '╠', '═', '╬', '╧', '╨', '╤', '╥', '╙', '╘', '╒', '╓', '╫', '╪', '┘', '┌', '█', '▄', '▌', '▐',
    '▀', 'α', 'ß', 'Γ', 'π', 'Σ', 'σ', 'µ', 'τ', 'Φ', 'Θ', 'Ω', 'δ', '∞', 'φ', 'ε', '∩', '≡', '±',
    '≥', '≤', '⌠', '⌡', '÷', '≈', '°', '∙', '·', '√', 'ⁿ', '²', '■', '\u{00A0}',
];

/// 열려 있는 아카이브에 대한 읽기 코덱
pub struct ZipCodec {
    path: PathBuf,
    archive: ZipArchive<File>,
    encoding: NameEncoding,
}

impl ZipCodec {
    /// 아카이브 파일을 열고 유효한 zip인지 확인
    pub fn open(path: &Path, encoding: NameEncoding) -> Result<Self> {
        let file = File::open(path).map_err(|e| {
            if e.kind() == io::ErrorKind::PermissionDenied {
                BokslZipError::PermissionDenied {
                    path: path.to_path_buf(),
                }
            } else {
                BokslZipError::Io(e)
            }
        })?;
        let archive = ZipArchive::new(file).map_err(|e| BokslZipError::ArchiveOpenFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            path: path.to_path_buf(),
            archive,
            encoding,
        })
    }

    /// 코덱의 네이티브 순서대로 엔트리 열거
    pub fn entries(&mut self) -> Result<Vec<ArchiveEntry>> {
        let encoding = self.encoding;
        let mut entries = Vec::with_capacity(self.archive.len());

        for i in 0..self.archive.len() {
            let entry = self
                .archive
                .by_index(i)
                .map_err(|e| BokslZipError::ArchiveOpenFailed {
                    path: self.path.clone(),
                    reason: e.to_string(),
                })?;

            let name = encoding.decode(entry.name_raw());
            let modified = entry
                .last_modified()
                .map(datetime_to_epoch)
                .unwrap_or(UNKNOWN_TIME);
            entries.push(ArchiveEntry::new(name, entry.size(), modified));
        }

        Ok(entries)
    }

    /// 엔트리의 압축 해제된 내용을 `out`으로 스트리밍
    pub fn copy_entry_to(&mut self, name: &str, out: &mut dyn Write) -> Result<u64> {
        let encoding = self.encoding;

        for i in 0..self.archive.len() {
            let mut entry =
                self.archive
                    .by_index(i)
                    .map_err(|e| BokslZipError::EntryReadFailed {
                        name: name.to_string(),
                        reason: e.to_string(),
                    })?;

            if encoding.decode(entry.name_raw()) == name {
                return io::copy(&mut entry, out).map_err(|e| BokslZipError::EntryReadFailed {
                    name: name.to_string(),
                    reason: e.to_string(),
                });
            }
        }

        Err(BokslZipError::EntryReadFailed {
            name: name.to_string(),
            reason: "entry not found in archive".to_string(),
        })
    }
}

/// 새 아카이브 파일을 만드는 쓰기 코덱
///
/// `put_directory` / `begin_file` + [`Write`] / `finish` 순서로 사용한다.
pub struct ZipCodecWriter {
    path: PathBuf,
    writer: ZipWriter<File>,
    encoding: NameEncoding,
}

impl ZipCodecWriter {
    pub fn create(file: File, path: &Path, encoding: NameEncoding) -> Self {
        Self {
            path: path.to_path_buf(),
            writer: ZipWriter::new(file),
            encoding,
        }
    }

    /// 디렉토리 엔트리 기록
    pub fn put_directory(&mut self, name: &str, modified: i64) -> Result<()> {
        self.check_name(name);
        let options = self.options(modified);
        self.writer
            .add_directory(name, options)
            .map_err(|e| self.write_error(e.to_string()))
    }

    /// 파일 엔트리 시작. 내용은 [`Write`] 구현으로 이어서 기록한다.
    pub fn begin_file(&mut self, name: &str, modified: i64) -> Result<()> {
        self.check_name(name);
        let options = self.options(modified);
        self.writer
            .start_file(name, options)
            .map_err(|e| self.write_error(e.to_string()))
    }

    /// 중앙 디렉토리를 기록하고 아카이브를 완성
    pub fn finish(mut self) -> Result<()> {
        self.writer
            .finish()
            .map(|_| ())
            .map_err(|e| BokslZipError::ArchiveWriteFailed {
                path: self.path.clone(),
                reason: e.to_string(),
            })
    }

    fn options(&self, modified: i64) -> SimpleFileOptions {
        let mut options =
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        if let Some(datetime) = epoch_to_datetime(modified) {
            options = options.last_modified_time(datetime);
        }
        options
    }

    fn check_name(&self, name: &str) {
        if self.encoding == NameEncoding::Cp437 && !name.is_ascii() {
            warn!(name, "entry name is not representable in CP437, storing as UTF-8");
        }
    }

    fn write_error(&self, reason: String) -> BokslZipError {
        BokslZipError::ArchiveWriteFailed {
            path: self.path.clone(),
            reason,
        }
    }
}

impl Write for ZipCodecWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// 파일시스템 경로의 수정 시간 (epoch 초, 모르면 [`UNKNOWN_TIME`])
pub fn fs_modified(path: &Path) -> i64 {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
        .map(|d| d.as_secs() as i64)
        .unwrap_or(UNKNOWN_TIME)
}

fn datetime_to_epoch(datetime: DateTime) -> i64 {
    chrono::NaiveDate::from_ymd_opt(
        datetime.year() as i32,
        datetime.month() as u32,
        datetime.day() as u32,
    )
    .and_then(|date| {
        date.and_hms_opt(
            datetime.hour() as u32,
            datetime.minute() as u32,
            datetime.second() as u32,
        )
    })
    .map(|naive| naive.and_utc().timestamp())
    .unwrap_or(UNKNOWN_TIME)
}

// DOS 날짜 범위(1980-2107)를 벗어나면 None
fn epoch_to_datetime(modified: i64) -> Option<DateTime> {
    if modified < 0 {
        return None;
    }

    let naive = chrono::DateTime::from_timestamp(modified, 0)?.naive_utc();
    DateTime::from_date_and_time(
        naive.year() as u16,
        naive.month() as u8,
        naive.day() as u8,
        naive.hour() as u8,
        naive.minute() as u8,
        naive.second() as u8,
    )
    .ok()
}
