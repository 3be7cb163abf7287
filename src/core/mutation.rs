//! 아카이브 변경 엔진
//!
//! 코덱이 추가 기록 전용이라 더하기/삭제/이름 바꾸기는 모두 전체
//! 재작성이다. 살아남는 엔트리를 새 임시 파일로 바이트 그대로
//! 스트리밍하고(이름과 수정 시간 유지) 변경분을 끼워 넣은 뒤, 완성된
//! 임시 파일로 원본을 원자적으로 교체하고 나서 엔트리 목록을 다시
//! 불러온다. 교체 전에 실패하면 원본 파일은 그대로 남는다.

use crate::core::archive::Archive;
use crate::core::conflict::{DecisionSource, OverwriteState};
use crate::models::operation::{OperationSummary, ProgressSink};
use crate::system::codec::{fs_modified, ZipCodecWriter};
use crate::utils::entry_path;
use crate::utils::error::{BokslZipError, Result};
use std::collections::HashSet;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// 새 이름을 제공하는 외부 입력자 (이름 바꾸기 대화상자)
pub trait RenameSource {
    /// 새 이름 반환. 취소면 `None`.
    fn rename_to(&mut self, current_leaf: &str) -> Option<String>;
}

impl<F> RenameSource for F
where
    F: FnMut(&str) -> Option<String>,
{
    fn rename_to(&mut self, current_leaf: &str) -> Option<String> {
        self(current_leaf)
    }
}

// 엔트리 이름에 쓸 수 없는 문자
const RESERVED_CHARACTERS: [char; 9] = ['*', '|', '\\', ':', '"', '<', '>', '?', '/'];

impl Archive {
    /// 파일이나 디렉토리를 압축 파일에 더하기
    ///
    /// `dest_dir`는 엔트리 이름 형식의 대상 디렉토리다 (`""` = 최상위,
    /// 그 외에는 `a/b/`처럼 `/`로 끝남). 없거나 읽을 수 없는 소스는
    /// 개별 보고 후 제외되고 나머지로 계속 진행한다. 결정자가 취소하면
    /// 아무것도 쓰지 않고 전체를 중단한다.
    pub fn add_paths(
        &mut self,
        sources: &[PathBuf],
        dest_dir: &str,
        decisions: &mut dyn DecisionSource,
    ) -> Result<OperationSummary> {
        debug_assert!(dest_dir.is_empty() || dest_dir.ends_with('/'));
        let mut summary = OperationSummary::new(sources.len());

        // 1. 소스 검증과 대상 이름 계산
        let mut planned: Vec<Option<(PathBuf, String)>> = Vec::with_capacity(sources.len());
        for source in sources {
            if !source.exists() {
                summary.add_error(&source.to_string_lossy(), "file or directory does not exist");
                planned.push(None);
                continue;
            }
            if !is_readable(source) {
                summary.add_error(&source.to_string_lossy(), "no read permission");
                planned.push(None);
                continue;
            }
            let Some(leaf) = source.file_name().map(|n| n.to_string_lossy().into_owned()) else {
                summary.add_error(&source.to_string_lossy(), "invalid source name");
                planned.push(None);
                continue;
            };
            planned.push(Some((source.clone(), format!("{dest_dir}{leaf}"))));
        }

        // 2. 충돌 검사. 취소되면 원본 파일에 손대지 않고 중단한다.
        let mut state = OverwriteState::new();
        let mut removal: HashSet<usize> = HashSet::new();
        let mut skipped_children: HashSet<PathBuf> = HashSet::new();

        for slot in planned.iter_mut() {
            let Some((source, dest_name)) = slot.clone() else {
                continue;
            };

            let proceed =
                self.resolve_dest_collision(&dest_name, &mut removal, &mut state, decisions);
            if state.is_cancelled() {
                summary.cancelled = true;
                return Ok(summary);
            }
            if !proceed {
                summary.items_skipped += 1;
                *slot = None;
                continue;
            }

            if source.is_dir() {
                // 디렉토리 소스는 펼쳐질 하위 경로까지 전부 검사
                self.detect_child_conflicts(
                    &source,
                    &format!("{dest_name}/"),
                    &mut removal,
                    &mut skipped_children,
                    &mut state,
                    decisions,
                    &mut summary,
                );
                if state.is_cancelled() {
                    summary.cancelled = true;
                    return Ok(summary);
                }
            }
        }

        // 더할 소스가 하나도 없으면 재작성하지 않음
        if planned.iter().all(Option::is_none) {
            return Ok(summary);
        }

        // 3. 재작성: 살아남는 원본을 스트리밍한 뒤 새 항목을 붙인다.
        let (temp, mut writer) = self.begin_rewrite()?;
        self.write_surviving_entries(&mut writer, &removal)?;
        for slot in &planned {
            let Some((source, dest_name)) = slot else {
                continue;
            };
            append_source(
                &mut writer,
                source,
                dest_name,
                &skipped_children,
                &mut summary.errors,
            )?;
            summary.items_processed += 1;
        }
        self.finish_rewrite(temp, writer)?;

        debug!(
            path = %self.path.display(),
            added = summary.items_processed,
            replaced = removal.len(),
            "archive rewritten for add"
        );
        Ok(summary)
    }

    /// 선택한 항목 삭제
    ///
    /// 선택된 디렉토리는 모든 하위 항목까지 확장되고, 확장된 집합을
    /// 제외한 엔트리로 아카이브를 재작성한다. 삭제 확인은 호출자 몫이다.
    pub fn delete(&mut self, visible_indices: &[usize]) -> Result<OperationSummary> {
        let expanded = self.expand_selection(Some(visible_indices));
        let removal: HashSet<usize> = expanded.iter().copied().collect();
        let mut summary = OperationSummary::new(expanded.len());

        let (temp, mut writer) = self.begin_rewrite()?;
        self.write_surviving_entries(&mut writer, &removal)?;
        self.finish_rewrite(temp, writer)?;

        summary.items_processed = expanded.len();
        debug!(
            path = %self.path.display(),
            removed = expanded.len(),
            "archive rewritten for delete"
        );
        Ok(summary)
    }

    /// 항목 이름 바꾸기
    ///
    /// 디렉토리의 경우 모든 하위 엔트리의 이름 접두사도 함께 바뀐다.
    pub fn rename(&mut self, visible_index: usize, new_leaf: &str) -> Result<()> {
        // 1. 사용 불가 문자 검사 (I/O 전에 거부)
        if let Some(character) = new_leaf.chars().find(|c| RESERVED_CHARACTERS.contains(c)) {
            return Err(BokslZipError::InvalidEntryName {
                name: new_leaf.to_string(),
                character,
            });
        }

        let index = self.to_absolute(visible_index);
        let old_name = self.entries[index].name.clone();

        // 2. 부모 경로와 디렉토리 표시를 유지한 새 전체 이름
        let mut new_name = format!("{}{}", entry_path::parent_name(&old_name), new_leaf);
        if entry_path::is_dir_name(&old_name) {
            new_name.push('/');
        }

        // 3. 끝 `/` 차이를 무시하고 같은 이름이 이미 있으면 거부
        let target = new_name.strip_suffix('/').unwrap_or(&new_name);
        for entry in &self.entries {
            if entry.name.strip_suffix('/').unwrap_or(&entry.name) == target {
                return Err(BokslZipError::DuplicateEntryName {
                    name: new_name.clone(),
                });
            }
        }

        // 4. 재작성: 대상 엔트리와 하위 엔트리의 접두사만 바꿔서 기록
        let (temp, mut writer) = self.begin_rewrite()?;
        let codec = &mut self.codec;
        for (i, entry) in self.entries.iter().enumerate() {
            if entry.synthesized {
                continue;
            }

            let name = if i == index {
                new_name.clone()
            } else if entry_path::is_descendant_of(&entry.name, &old_name) {
                format!("{}{}", new_name, &entry.name[old_name.len()..])
            } else {
                entry.name.clone()
            };

            if entry.is_directory() {
                writer.put_directory(&name, entry.modified)?;
            } else {
                writer.begin_file(&name, entry.modified)?;
                codec.copy_entry_to(&entry.name, &mut writer)?;
            }
        }
        self.finish_rewrite(temp, writer)?;

        debug!(
            path = %self.path.display(),
            from = %old_name,
            to = %new_name,
            "archive rewritten for rename"
        );
        Ok(())
    }

    /// 외부 입력자에게 새 이름을 받아 이름 바꾸기
    ///
    /// 입력자가 취소하면 아무 일도 하지 않고 `false`를 반환한다.
    pub fn rename_with(
        &mut self,
        visible_index: usize,
        source: &mut dyn RenameSource,
    ) -> Result<bool> {
        let current = self.entry_name(visible_index).to_string();
        match source.rename_to(&current) {
            Some(new_leaf) => {
                self.rename(visible_index, &new_leaf)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// 선택한 항목을 다른 압축 파일로 저장
    ///
    /// `visible_indices`가 `None`이면 전체 저장. 선택된 디렉토리는 모든
    /// 하위 항목까지 포함되고, 엔트리 이름은 바뀌지 않는다.
    pub fn save_as(
        &mut self,
        dest: &Path,
        visible_indices: Option<&[usize]>,
        progress: &mut dyn ProgressSink,
    ) -> Result<OperationSummary> {
        if dest == self.path {
            return Err(BokslZipError::ArchiveWriteFailed {
                path: dest.to_path_buf(),
                reason: "cannot overwrite the archive being read".to_string(),
            });
        }

        let selected: Vec<usize> = self
            .expand_selection(visible_indices)
            .into_iter()
            .filter(|&i| !self.entries[i].synthesized)
            .collect();
        let mut summary = OperationSummary::new(selected.len());

        let file = File::create(dest)?;
        let mut writer = ZipCodecWriter::create(file, dest, self.encoding);

        progress.begin(selected.len());
        let codec = &mut self.codec;
        for (step, &index) in selected.iter().enumerate() {
            let entry = &self.entries[index];
            if entry.is_directory() {
                writer.put_directory(&entry.name, entry.modified)?;
            } else {
                writer.begin_file(&entry.name, entry.modified)?;
                codec.copy_entry_to(&entry.name, &mut writer)?;
            }
            summary.items_processed += 1;
            progress.update(step + 1);
        }
        writer.finish()?;
        progress.end();

        debug!(dest = %dest.display(), entries = summary.items_processed, "archive saved as");
        Ok(summary)
    }

    // === 재작성 공통 단계 ===

    // 원본과 같은 디렉토리에 임시 파일을 만들고 쓰기 코덱을 연다.
    // 임시 파일은 교체 전까지 다른 작업에 보이지 않는다.
    fn begin_rewrite(&self) -> Result<(NamedTempFile, ZipCodecWriter)> {
        let parent = self.path.parent().unwrap_or(Path::new("."));
        let temp = NamedTempFile::new_in(parent)?;
        let file = temp.as_file().try_clone()?;
        Ok((temp, ZipCodecWriter::create(file, &self.path, self.encoding)))
    }

    // 제거 집합에 없는 원본 엔트리를 이름/시간 그대로 스트리밍한다.
    // 합성 엔트리는 아카이브에 기록하지 않는다.
    fn write_surviving_entries(
        &mut self,
        writer: &mut ZipCodecWriter,
        removal: &HashSet<usize>,
    ) -> Result<()> {
        let codec = &mut self.codec;
        for (index, entry) in self.entries.iter().enumerate() {
            if entry.synthesized || removal.contains(&index) {
                continue;
            }

            if entry.is_directory() {
                writer.put_directory(&entry.name, entry.modified)?;
            } else {
                writer.begin_file(&entry.name, entry.modified)?;
                codec.copy_entry_to(&entry.name, writer)?;
            }
        }
        Ok(())
    }

    // 임시 파일을 완성하고 원본 파일을 교체한 뒤 목록을 다시 불러온다.
    fn finish_rewrite(&mut self, temp: NamedTempFile, writer: ZipCodecWriter) -> Result<()> {
        writer.finish()?;
        temp.persist(&self.path)
            .map_err(|e| BokslZipError::ArchiveWriteFailed {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;
        self.reload()
    }

    // === 충돌 검사 ===

    // 대상 이름과 충돌하는 기존 엔트리를 결정자와 협상한다.
    // 디렉토리 충돌을 수락하면 기존 하위 엔트리 전체가 제거 대상이 된다.
    // 반환값: true = 계속 진행, false = 이 항목 건너뛰기(또는 취소됨)
    fn resolve_dest_collision(
        &self,
        dest_name: &str,
        removal: &mut HashSet<usize>,
        state: &mut OverwriteState,
        decisions: &mut dyn DecisionSource,
    ) -> bool {
        let dir_name = format!("{dest_name}/");

        for (index, entry) in self.entries.iter().enumerate() {
            if removal.contains(&index) {
                continue;
            }

            if entry.name == dest_name {
                if state.resolve(dest_name, decisions) {
                    removal.insert(index);
                } else {
                    return false;
                }
            } else if entry.name == dir_name {
                if state.resolve(dest_name, decisions) {
                    removal.insert(index);
                    for (other, descendant) in self.entries.iter().enumerate() {
                        if entry_path::is_descendant_of(&descendant.name, &dir_name) {
                            removal.insert(other);
                        }
                    }
                } else {
                    return false;
                }
            }
        }
        true
    }

    // 디렉토리 소스를 재귀적으로 펼치면서 대상 경로 충돌을 검사한다.
    // 거절된 하위 항목은 추가 단계에서 건너뛰도록 기록한다.
    #[allow(clippy::too_many_arguments)]
    fn detect_child_conflicts(
        &self,
        source_dir: &Path,
        dest_prefix: &str,
        removal: &mut HashSet<usize>,
        skipped_children: &mut HashSet<PathBuf>,
        state: &mut OverwriteState,
        decisions: &mut dyn DecisionSource,
        summary: &mut OperationSummary,
    ) {
        let children = match read_dir_sorted(source_dir) {
            Ok(children) => children,
            Err(e) => {
                summary
                    .errors
                    .push(format!("{}: {}", source_dir.display(), e));
                return;
            }
        };

        for child in children {
            let Some(leaf) = child.file_name().map(|n| n.to_string_lossy().into_owned()) else {
                continue;
            };
            let dest_name = format!("{dest_prefix}{leaf}");

            let proceed = self.resolve_dest_collision(&dest_name, removal, state, decisions);
            if state.is_cancelled() {
                return;
            }
            if !proceed {
                skipped_children.insert(child);
                continue;
            }

            if child.is_dir() {
                self.detect_child_conflicts(
                    &child,
                    &format!("{dest_name}/"),
                    removal,
                    skipped_children,
                    state,
                    decisions,
                    summary,
                );
                if state.is_cancelled() {
                    return;
                }
            }
        }
    }
}

// 소스 경로 하나를 재귀적으로 아카이브에 기록한다. 디렉토리는 엔트리를
// 먼저 만들고 하위 항목으로 내려가며, 수정 시간은 파일시스템에서 읽는다.
fn append_source(
    writer: &mut ZipCodecWriter,
    source: &Path,
    dest_name: &str,
    skipped_children: &HashSet<PathBuf>,
    errors: &mut Vec<String>,
) -> Result<()> {
    let modified = fs_modified(source);

    if source.is_dir() {
        let dir_name = format!("{dest_name}/");
        writer.put_directory(&dir_name, modified)?;

        let children = match read_dir_sorted(source) {
            Ok(children) => children,
            Err(e) => {
                errors.push(format!("{}: {}", source.display(), e));
                return Ok(());
            }
        };
        for child in children {
            if skipped_children.contains(&child) {
                continue;
            }
            let Some(leaf) = child.file_name().map(|n| n.to_string_lossy().into_owned()) else {
                continue;
            };
            append_source(
                writer,
                &child,
                &format!("{dir_name}{leaf}"),
                skipped_children,
                errors,
            )?;
        }
    } else {
        match File::open(source) {
            Ok(mut input) => {
                writer.begin_file(dest_name, modified)?;
                io::copy(&mut input, writer)?;
            }
            Err(e) => errors.push(format!("{}: {}", source.display(), e)),
        }
    }
    Ok(())
}

// 추가되는 엔트리 순서가 입력에 대해 결정적이도록 이름순으로 읽는다.
fn read_dir_sorted(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut children: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .collect();
    children.sort();
    Ok(children)
}

fn is_readable(path: &Path) -> bool {
    if path.is_dir() {
        fs::read_dir(path).is_ok()
    } else {
        File::open(path).is_ok()
    }
}
