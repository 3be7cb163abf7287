//! 압축 파일 루트 객체
//!
//! 코덱이 열거한 엔트리 목록을 소유하고, 평면 목록을 가상 디렉토리
//! 트리로 투영한다. 보이는 행 인덱스와 절대 엔트리 인덱스 사이의
//! 변환도 여기서 담당한다.

use crate::models::archive_entry::ArchiveEntry;
use crate::models::sort::EntryKind;
use crate::system::codec::{NameEncoding, ZipCodec, ZipCodecWriter};
use crate::utils::entry_path;
use crate::utils::error::{BokslZipError, Result};
use std::collections::{BTreeSet, HashSet};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::debug;

/// 열려 있는 압축 파일 하나
///
/// `view_path`가 `None`이면 모든 파일 보기(전체 엔트리를 전체 경로와
/// 함께), `Some`이면 디렉토리로 보기(현재 디렉토리의 직계 자식만)이다.
/// `Some("")`은 최상위, `Some("a/b/")`는 해당 디렉토리를 가리킨다.
pub struct Archive {
    pub(crate) path: PathBuf,
    pub(crate) encoding: NameEncoding,
    pub(crate) codec: ZipCodec,
    pub(crate) entries: Vec<ArchiveEntry>,
    original_len: usize,
    pub(crate) view_path: Option<String>,
    pub(crate) scratch: Option<TempDir>,
}

impl Archive {
    /// 새로운(빈) 압축 파일 생성
    pub fn create_new(path: &Path, encoding: NameEncoding) -> Result<()> {
        let file = File::create(path)?;
        let writer = ZipCodecWriter::create(file, path, encoding);
        writer.finish()
    }

    /// 압축 파일 열기
    ///
    /// 파일이 유효한 zip으로 인식되어야 성공한다.
    pub fn open(path: &Path, encoding: NameEncoding, tree_view: bool) -> Result<Self> {
        if !path.exists() {
            return Err(BokslZipError::PathNotFound {
                path: path.to_path_buf(),
            });
        }

        let codec = ZipCodec::open(path, encoding)?;
        let mut archive = Self {
            path: path.to_path_buf(),
            encoding,
            codec,
            entries: Vec::new(),
            original_len: 0,
            view_path: tree_view.then(String::new),
            scratch: None,
        };
        archive.reload()?;

        Ok(archive)
    }

    /// 엔트리 목록 다시 불러오기
    ///
    /// 모든 재작성 후와 보기 방식 전환 시에 호출된다. 디렉토리로 보기인
    /// 경우 열거에서 빠진 조상 디렉토리를 합성해서 덧붙인다.
    pub fn reload(&mut self) -> Result<()> {
        self.codec = ZipCodec::open(&self.path, self.encoding)?;
        self.entries = self.codec.entries()?;
        self.original_len = self.entries.len();

        if self.view_path.is_some() {
            self.synthesize_missing_dirs();
        }

        debug!(
            path = %self.path.display(),
            entries = self.entries.len(),
            "archive entries loaded"
        );
        Ok(())
    }

    // 열거에 없는 조상 디렉토리를 합성 엔트리로 덧붙인다.
    // BTreeSet을 거치므로 덧붙는 순서는 입력에 대해 결정적이다.
    fn synthesize_missing_dirs(&mut self) {
        let missing: BTreeSet<String> = {
            let existing: HashSet<&str> = self.entries.iter().map(|e| e.name.as_str()).collect();
            let mut missing = BTreeSet::new();

            for entry in &self.entries {
                let mut parent = entry_path::parent_name(&entry.name);
                while !parent.is_empty() {
                    if !existing.contains(parent) {
                        missing.insert(parent.to_string());
                    }
                    parent = entry_path::parent_name(parent);
                }
            }
            missing
        };

        for name in missing {
            self.entries.push(ArchiveEntry::synthesized_dir(name));
        }
    }

    // === 보기 방식 / 커서 ===

    /// 디렉토리로 보기 여부
    pub fn is_tree_view(&self) -> bool {
        self.view_path.is_some()
    }

    /// 보기 방식 전환 (전환 시 엔트리 목록을 다시 불러온다)
    pub fn set_tree_view(&mut self, tree_view: bool) -> Result<()> {
        if tree_view == self.is_tree_view() {
            return Ok(());
        }

        self.view_path = tree_view.then(String::new);
        self.reload()
    }

    /// 현재 경로를 표시용 형식으로 반환 (`/`, `/a/b`). 모든 파일 보기면 `None`.
    pub fn path_display(&self) -> Option<String> {
        self.view_path.as_ref().map(|view| {
            if view.is_empty() {
                "/".to_string()
            } else {
                format!("/{}", &view[..view.len() - 1])
            }
        })
    }

    /// 선택한 디렉토리 항목으로 현재 경로 변경
    pub fn open_dir(&mut self, visible_index: usize) {
        let index = self.to_absolute(visible_index);
        let entry = &self.entries[index];
        assert!(entry.is_directory(), "open_dir requires a directory entry");
        self.view_path = Some(entry.name.clone());
    }

    /// 부모 디렉토리로 이동 (최상위면 아무 일도 하지 않음)
    pub fn go_parent(&mut self) {
        if let Some(view) = &mut self.view_path {
            if !view.is_empty() {
                *view = entry_path::parent_name(view).to_string();
            }
        }
    }

    /// 최상위 디렉토리로 이동
    pub fn go_top(&mut self) {
        if let Some(view) = &mut self.view_path {
            view.clear();
        }
    }

    /// 표시용 경로로 현재 경로 변경
    ///
    /// 해당 이름의 디렉토리 엔트리가 없으면 커서를 바꾸지 않고 `false`를
    /// 반환한다.
    pub fn set_path(&mut self, text: &str) -> bool {
        if self.view_path.is_none() {
            return false;
        }

        if text == "/" || text.is_empty() {
            self.view_path = Some(String::new());
            return true;
        }

        let mut name = text.strip_prefix('/').unwrap_or(text).to_string();
        if !name.ends_with('/') {
            name.push('/');
        }

        if self.entries.iter().any(|e| e.name == name) {
            self.view_path = Some(name);
            true
        } else {
            false
        }
    }

    // === 인덱스 변환 ===

    /// 현재 보기에서의 항목 수
    pub fn visible_count(&self) -> usize {
        match &self.view_path {
            Some(view) => self
                .entries
                .iter()
                .filter(|e| e.parent_name() == view.as_str())
                .count(),
            None => self.entries.len(),
        }
    }

    /// 보이는 행 인덱스를 엔트리 목록의 절대 인덱스로 변환
    ///
    /// 보이는 범위를 벗어난 인덱스는 호출자 계약 위반이다 (panic).
    pub fn to_absolute(&self, visible_index: usize) -> usize {
        let Some(view) = &self.view_path else {
            return visible_index;
        };

        let mut remaining = visible_index;
        for (index, entry) in self.entries.iter().enumerate() {
            if entry.parent_name() == view.as_str() {
                if remaining == 0 {
                    return index;
                }
                remaining -= 1;
            }
        }

        panic!(
            "visible index {} out of range for path {:?}",
            visible_index, view
        );
    }

    // === 엔트리 조회 ===

    /// 전체 엔트리 목록 (절대 인덱스 순서)
    pub fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    /// 보이는 행의 엔트리
    pub fn entry(&self, visible_index: usize) -> &ArchiveEntry {
        &self.entries[self.to_absolute(visible_index)]
    }

    /// 보이는 행이 디렉토리인지 여부
    pub fn is_directory(&self, visible_index: usize) -> bool {
        self.entry(visible_index).is_directory()
    }

    /// 보이는 행의 이름 (경로 미포함)
    pub fn entry_name(&self, visible_index: usize) -> &str {
        self.entry(visible_index).leaf_name()
    }

    /// 보이는 행의 크기
    ///
    /// 디렉토리로 보기에서 디렉토리는 하위 파일 크기의 합이다.
    pub fn entry_size(&self, visible_index: usize) -> u64 {
        let entry = self.entry(visible_index);
        if self.is_tree_view() && entry.is_directory() {
            self.dir_size(&entry.name)
        } else {
            entry.size
        }
    }

    /// 보이는 행의 형식
    pub fn entry_kind(&self, visible_index: usize) -> EntryKind {
        EntryKind::of_name(&self.entry(visible_index).name)
    }

    /// 보이는 행의 수정 시간
    pub fn entry_time(&self, visible_index: usize) -> i64 {
        self.entry(visible_index).modified
    }

    /// 보이는 행의 위치 (모든 파일 보기의 위치 열)
    pub fn entry_path_display(&self, visible_index: usize) -> String {
        self.entry(visible_index).path_display()
    }

    /// 디렉토리의 크기 (하위 파일 크기의 재귀 합)
    pub fn dir_size(&self, dir_name: &str) -> u64 {
        self.entries
            .iter()
            .filter(|e| !e.is_directory() && entry_path::is_descendant_of(&e.name, dir_name))
            .map(|e| e.size)
            .sum()
    }

    /// 표시용 경로에 있는 하위 디렉토리 이름 목록
    pub fn dir_leaf_names(&self, display_dir: &str) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| e.is_directory() && e.path_display() == display_dir)
            .map(|e| e.leaf_name().to_string())
            .collect()
    }

    // === 파일 정보 ===

    /// 압축 파일 경로
    pub fn file_path(&self) -> &Path {
        &self.path
    }

    /// 압축 파일 이름 (경로 미포함)
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// 압축 파일에 대한 쓰기 권한 여부
    pub fn can_write(&self) -> bool {
        fs::metadata(&self.path)
            .map(|m| !m.permissions().readonly())
            .unwrap_or(false)
    }

    /// 압축 파일의 크기 (압축된 크기)
    pub fn archive_len(&self) -> u64 {
        fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
    }

    /// 모든 엔트리의 원본 크기 합
    pub fn original_total_size(&self) -> u64 {
        self.entries.iter().map(|e| e.size).sum()
    }

    /// 코덱이 열거한 엔트리 수 (합성 엔트리 제외)
    pub fn original_len(&self) -> usize {
        self.original_len
    }

    /// 엔트리 이름 인코딩
    pub fn encoding(&self) -> NameEncoding {
        self.encoding
    }

    // === 선택 확장 ===

    // 보이는 행 선택을 절대 인덱스 집합으로 확장한다. 디렉토리는 모든
    // 하위 항목을 포함하고, None은 전체 선택이다. 삭제, 다른 이름으로
    // 저장, 일괄 압축 풀기가 공유한다.
    pub(crate) fn expand_selection(&self, visible_indices: Option<&[usize]>) -> Vec<usize> {
        let Some(visible_indices) = visible_indices else {
            return (0..self.entries.len()).collect();
        };

        let mut selected = BTreeSet::new();
        for &visible in visible_indices {
            let index = self.to_absolute(visible);
            selected.insert(index);

            if self.entries[index].is_directory() {
                let dir_name = &self.entries[index].name;
                for (other, entry) in self.entries.iter().enumerate() {
                    if entry_path::is_descendant_of(&entry.name, dir_name) {
                        selected.insert(other);
                    }
                }
            }
        }

        selected.into_iter().collect()
    }
}
