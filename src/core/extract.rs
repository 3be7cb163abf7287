//! 압축 해제 엔진
//!
//! 가상 트리를 실제 디렉토리 구조로 복원한다. 열기/드래그용 단일 항목
//! 풀기는 아카이브 전용 임시 디렉토리를 쓰고, 일괄 풀기는 대상 경로
//! 충돌을 덮어쓰기 협상으로 해결한다. 취소해도 이미 풀린 파일은
//! 되돌리지 않는다.

use crate::core::archive::Archive;
use crate::core::conflict::{DecisionSource, OverwriteState};
use crate::models::archive_entry::ArchiveEntry;
use crate::models::operation::{OperationSummary, ProgressSink};
use crate::utils::entry_path;
use crate::utils::error::{BokslZipError, Result};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::debug;

impl Archive {
    /// 항목 하나를 전용 임시 디렉토리에 풀기
    ///
    /// 디렉토리로 보기에서 디렉토리를 풀면 하위 항목 전체가 중첩 구조
    /// 그대로 복원된다. 합성된 중간 디렉토리도 실제 디렉토리로 만들어진다.
    /// 반환값은 임시 디렉토리 안에 만들어진 경로다.
    pub fn extract_to_scratch(&mut self, visible_index: usize) -> Result<PathBuf> {
        let index = self.to_absolute(visible_index);
        let entry = self.entries[index].clone();
        let scratch = self.scratch_dir()?;
        let dest = scratch.join(entry.leaf_name());

        if entry.is_directory() {
            // 같은 이름의 파일이 남아있으면 삭제
            if dest.is_file() {
                fs::remove_file(&dest)?;
            }
            fs::create_dir_all(&dest)?;

            if self.view_path.is_some() {
                let descendants: Vec<ArchiveEntry> = self
                    .entries
                    .iter()
                    .filter(|e| entry_path::is_descendant_of(&e.name, &entry.name))
                    .cloned()
                    .collect();

                for descendant in descendants {
                    let relative = &descendant.name[entry.name.len()..];
                    let target = dest.join(relative.strip_suffix('/').unwrap_or(relative));

                    if descendant.is_directory() {
                        if target.is_file() {
                            fs::remove_file(&target)?;
                        }
                        fs::create_dir_all(&target)?;
                    } else {
                        if target.is_dir() {
                            fs::remove_dir_all(&target)?;
                        }
                        if let Some(parent) = target.parent() {
                            fs::create_dir_all(parent)?;
                        }
                        self.write_entry_file(&descendant.name, &target)?;
                    }
                }
            }
        } else {
            if dest.is_dir() {
                fs::remove_dir_all(&dest)?;
            }
            self.write_entry_file(&entry.name, &dest)?;
        }

        debug!(entry = %entry.name, dest = %dest.display(), "entry extracted to scratch");
        Ok(dest)
    }

    /// 선택한 항목을 대상 디렉토리에 풀기
    ///
    /// `visible_indices`가 `None`이면 전체를 푼다. 선택된 디렉토리는 모든
    /// 하위 항목까지 확장되고, 각 엔트리는 전체 이름 그대로 `dest_dir`
    /// 아래에 복원된다. 기존 경로와의 충돌은 항목별로 결정자와 협상하며,
    /// 취소하면 남은 작업만 중단한다.
    pub fn extract_to(
        &mut self,
        dest_dir: &Path,
        visible_indices: Option<&[usize]>,
        decisions: &mut dyn DecisionSource,
        progress: &mut dyn ProgressSink,
    ) -> Result<OperationSummary> {
        if !dest_dir.is_dir() {
            return Err(BokslZipError::NotADirectory {
                path: dest_dir.to_path_buf(),
            });
        }

        let selected = self.expand_selection(visible_indices);
        let mut summary = OperationSummary::new(selected.len());
        let mut state = OverwriteState::new();

        progress.begin(selected.len());
        for (step, &index) in selected.iter().enumerate() {
            let entry = self.entries[index].clone();

            if entry.is_directory() {
                let target = dest_dir.join(entry.name.strip_suffix('/').unwrap_or(&entry.name));

                // 같은 이름의 파일이 이미 있으면 협상 후 삭제
                if target.is_file() {
                    if state.resolve(&target.to_string_lossy(), decisions) {
                        if let Err(e) = fs::remove_file(&target) {
                            summary.add_error(&entry.name, &e.to_string());
                            progress.update(step + 1);
                            continue;
                        }
                    } else if state.is_cancelled() {
                        summary.cancelled = true;
                        progress.end();
                        return Ok(summary);
                    } else {
                        summary.items_skipped += 1;
                        progress.update(step + 1);
                        continue;
                    }
                }

                match fs::create_dir_all(&target) {
                    Ok(()) => summary.items_processed += 1,
                    Err(e) => summary.add_error(&entry.name, &e.to_string()),
                }
            } else {
                let target = dest_dir.join(&entry.name);
                if let Some(parent) = target.parent() {
                    let _ = fs::create_dir_all(parent);
                }

                if target.exists() {
                    if state.resolve(&target.to_string_lossy(), decisions) {
                        // 같은 이름의 디렉토리는 하위까지 삭제 후 교체
                        if target.is_dir() {
                            if let Err(e) = fs::remove_dir_all(&target) {
                                summary.add_error(&entry.name, &e.to_string());
                                progress.update(step + 1);
                                continue;
                            }
                        }
                    } else if state.is_cancelled() {
                        summary.cancelled = true;
                        progress.end();
                        return Ok(summary);
                    } else {
                        summary.items_skipped += 1;
                        progress.update(step + 1);
                        continue;
                    }
                }

                match self.write_entry_file(&entry.name, &target) {
                    Ok(()) => summary.items_processed += 1,
                    Err(e) => summary.add_error(&entry.name, &e.to_string()),
                }
            }

            progress.update(step + 1);
        }
        progress.end();

        debug!(
            dest = %dest_dir.display(),
            processed = summary.items_processed,
            skipped = summary.items_skipped,
            "batch extraction finished"
        );
        Ok(summary)
    }

    // 엔트리 내용을 파일 하나로 스트리밍한다.
    fn write_entry_file(&mut self, name: &str, target: &Path) -> Result<()> {
        let mut output = File::create(target).map_err(|e| BokslZipError::ExtractFailed {
            path: target.to_path_buf(),
            reason: e.to_string(),
        })?;
        self.codec.copy_entry_to(name, &mut output)?;
        Ok(())
    }

    // 아카이브 전용 임시 디렉토리 (처음 쓸 때 생성, Archive와 함께 삭제)
    fn scratch_dir(&mut self) -> Result<PathBuf> {
        match &self.scratch {
            Some(dir) => Ok(dir.path().to_path_buf()),
            None => {
                let dir = tempfile::Builder::new().prefix("bokslzip-").tempdir()?;
                let path = dir.path().to_path_buf();
                self.scratch = Some(dir);
                Ok(path)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::operation::{ConflictResolution, NoProgress, ProgressEvent};
    use crate::system::codec::NameEncoding;
    use std::io::Write;
    use tempfile::tempdir;
    use zip::write::SimpleFileOptions;
    use zip::{CompressionMethod, ZipWriter};

    fn write_fixture(path: &Path, entries: &[(&str, &str)]) {
        let file = File::create(path).expect("create fixture archive");
        let mut writer = ZipWriter::new(file);
        let options =
            SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

        for (name, content) in entries {
            if name.ends_with('/') {
                writer.add_directory(*name, options).expect("add directory");
            } else {
                writer.start_file(*name, options).expect("start file");
                writer.write_all(content.as_bytes()).expect("write body");
            }
        }
        writer.finish().expect("finish fixture");
    }

    fn visible_row(archive: &Archive, leaf: &str) -> usize {
        (0..archive.visible_count())
            .find(|&v| archive.entry_name(v) == leaf)
            .expect("visible row")
    }

    fn no_conflict() -> impl FnMut(&str) -> ConflictResolution {
        |candidate: &str| panic!("unexpected conflict for {candidate}")
    }

    #[test]
    fn test_extract_single_file_to_scratch() {
        let temp = tempdir().expect("create tempdir");
        let path = temp.path().join("sample.zip");
        write_fixture(&path, &[("a/", ""), ("a/x.txt", "payload")]);

        let mut archive = Archive::open(&path, NameEncoding::Utf8, true).expect("open archive");
        assert!(archive.set_path("/a"));
        let row = visible_row(&archive, "x.txt");

        let extracted = archive.extract_to_scratch(row).expect("extract file");
        assert_eq!(extracted.file_name().and_then(|n| n.to_str()), Some("x.txt"));
        assert_eq!(fs::read(&extracted).expect("read extracted"), b"payload");
    }

    #[test]
    fn test_extract_directory_subtree_with_synthesized_ancestors() {
        // a/와 a/b/ 디렉토리 엔트리가 열거에 없어도 트리 전체가 복원된다.
        let temp = tempdir().expect("create tempdir");
        let path = temp.path().join("sample.zip");
        write_fixture(&path, &[("a/x.txt", "x"), ("a/b/y.txt", "y"), ("top.txt", "t")]);

        let mut archive = Archive::open(&path, NameEncoding::Utf8, true).expect("open archive");
        let row = visible_row(&archive, "a");

        let extracted = archive.extract_to_scratch(row).expect("extract directory");
        assert!(extracted.is_dir());
        assert_eq!(fs::read(extracted.join("x.txt")).expect("read x"), b"x");
        assert_eq!(fs::read(extracted.join("b/y.txt")).expect("read y"), b"y");
        assert!(!extracted.join("top.txt").exists());
    }

    #[test]
    fn test_extract_directory_in_flat_view_creates_empty_dir() {
        // 모든 파일 보기에서는 디렉토리 항목만 만들어지고 하위 항목은 풀지 않음
        let temp = tempdir().expect("create tempdir");
        let path = temp.path().join("sample.zip");
        write_fixture(&path, &[("a/", ""), ("a/x.txt", "x")]);

        let mut archive = Archive::open(&path, NameEncoding::Utf8, false).expect("open archive");
        let extracted = archive.extract_to_scratch(0).expect("extract directory");

        assert!(extracted.is_dir());
        assert!(!extracted.join("x.txt").exists());
    }

    #[test]
    fn test_extract_batch_all_entries() {
        let temp = tempdir().expect("create tempdir");
        let path = temp.path().join("sample.zip");
        write_fixture(
            &path,
            &[("a/", ""), ("a/x.txt", "x"), ("a/b/", ""), ("a/b/y.txt", "y"), ("top.txt", "t")],
        );
        let dest = temp.path().join("out");
        fs::create_dir_all(&dest).expect("create dest");

        let mut archive = Archive::open(&path, NameEncoding::Utf8, true).expect("open archive");
        let summary = archive
            .extract_to(&dest, None, &mut no_conflict(), &mut NoProgress)
            .expect("extract all");

        assert!(summary.is_clean());
        assert_eq!(summary.items_processed, 5);
        assert_eq!(fs::read(dest.join("a/x.txt")).expect("read x"), b"x");
        assert_eq!(fs::read(dest.join("a/b/y.txt")).expect("read y"), b"y");
        assert_eq!(fs::read(dest.join("top.txt")).expect("read top"), b"t");
    }

    #[test]
    fn test_extract_batch_synthesized_directory_selection() {
        // 코덱 열거에 a/가 없어도 a/를 선택해 풀면 dest/a/x.txt가 생긴다.
        let temp = tempdir().expect("create tempdir");
        let path = temp.path().join("sample.zip");
        write_fixture(&path, &[("a/x.txt", "x"), ("other.txt", "o")]);
        let dest = temp.path().join("out");
        fs::create_dir_all(&dest).expect("create dest");

        let mut archive = Archive::open(&path, NameEncoding::Utf8, true).expect("open archive");
        let row = visible_row(&archive, "a");
        let summary = archive
            .extract_to(&dest, Some(&[row]), &mut no_conflict(), &mut NoProgress)
            .expect("extract selection");

        assert!(summary.is_clean());
        assert_eq!(fs::read(dest.join("a/x.txt")).expect("read x"), b"x");
        assert!(!dest.join("other.txt").exists());
    }

    #[test]
    fn test_extract_batch_skip_keeps_existing_file() {
        let temp = tempdir().expect("create tempdir");
        let path = temp.path().join("sample.zip");
        write_fixture(&path, &[("keep.txt", "from archive")]);
        let dest = temp.path().join("out");
        fs::create_dir_all(&dest).expect("create dest");
        fs::write(dest.join("keep.txt"), "already here").expect("write existing");

        let mut archive = Archive::open(&path, NameEncoding::Utf8, true).expect("open archive");
        let summary = archive
            .extract_to(
                &dest,
                None,
                &mut |_: &str| ConflictResolution::Skip,
                &mut NoProgress,
            )
            .expect("extract with skip");

        assert_eq!(summary.items_skipped, 1);
        assert_eq!(summary.items_processed, 0);
        assert_eq!(
            fs::read(dest.join("keep.txt")).expect("read kept file"),
            b"already here"
        );
    }

    #[test]
    fn test_extract_batch_overwrite_replaces_file() {
        let temp = tempdir().expect("create tempdir");
        let path = temp.path().join("sample.zip");
        write_fixture(&path, &[("keep.txt", "from archive")]);
        let dest = temp.path().join("out");
        fs::create_dir_all(&dest).expect("create dest");
        fs::write(dest.join("keep.txt"), "stale").expect("write existing");

        let mut archive = Archive::open(&path, NameEncoding::Utf8, true).expect("open archive");
        let mut prompted = Vec::new();
        let summary = archive
            .extract_to(
                &dest,
                None,
                &mut |candidate: &str| {
                    prompted.push(candidate.to_string());
                    ConflictResolution::Overwrite
                },
                &mut NoProgress,
            )
            .expect("extract with overwrite");

        assert_eq!(summary.items_processed, 1);
        assert_eq!(prompted.len(), 1);
        assert!(prompted[0].ends_with("keep.txt"));
        assert_eq!(
            fs::read(dest.join("keep.txt")).expect("read replaced file"),
            b"from archive"
        );
    }

    #[test]
    fn test_extract_batch_file_replaces_existing_directory() {
        let temp = tempdir().expect("create tempdir");
        let path = temp.path().join("sample.zip");
        write_fixture(&path, &[("node", "now a file")]);
        let dest = temp.path().join("out");
        fs::create_dir_all(dest.join("node/inner")).expect("create colliding dir");

        let mut archive = Archive::open(&path, NameEncoding::Utf8, true).expect("open archive");
        let summary = archive
            .extract_to(
                &dest,
                None,
                &mut |_: &str| ConflictResolution::Overwrite,
                &mut NoProgress,
            )
            .expect("extract over directory");

        assert!(summary.is_clean());
        assert!(dest.join("node").is_file());
        assert_eq!(fs::read(dest.join("node")).expect("read file"), b"now a file");
    }

    #[test]
    fn test_extract_batch_cancel_keeps_already_extracted() {
        let temp = tempdir().expect("create tempdir");
        let path = temp.path().join("sample.zip");
        write_fixture(&path, &[("first.txt", "1"), ("second.txt", "2")]);
        let dest = temp.path().join("out");
        fs::create_dir_all(&dest).expect("create dest");
        fs::write(dest.join("second.txt"), "existing").expect("write existing");

        let mut archive = Archive::open(&path, NameEncoding::Utf8, true).expect("open archive");
        let summary = archive
            .extract_to(
                &dest,
                None,
                &mut |_: &str| ConflictResolution::Cancel,
                &mut NoProgress,
            )
            .expect("extract cancelled");

        assert!(summary.cancelled);
        // 이미 풀린 항목은 되돌리지 않음
        assert_eq!(fs::read(dest.join("first.txt")).expect("read first"), b"1");
        assert_eq!(
            fs::read(dest.join("second.txt")).expect("read second"),
            b"existing"
        );
    }

    #[test]
    fn test_extract_requires_existing_directory() {
        let temp = tempdir().expect("create tempdir");
        let path = temp.path().join("sample.zip");
        write_fixture(&path, &[("a.txt", "a")]);

        let mut archive = Archive::open(&path, NameEncoding::Utf8, true).expect("open archive");
        let result = archive.extract_to(
            &temp.path().join("missing"),
            None,
            &mut no_conflict(),
            &mut NoProgress,
        );
        assert!(matches!(result, Err(BokslZipError::NotADirectory { .. })));
    }

    #[test]
    fn test_extract_reports_progress_per_entry() {
        let temp = tempdir().expect("create tempdir");
        let path = temp.path().join("sample.zip");
        write_fixture(&path, &[("a.txt", "a"), ("b.txt", "b"), ("c.txt", "c")]);
        let dest = temp.path().join("out");
        fs::create_dir_all(&dest).expect("create dest");

        let mut archive = Archive::open(&path, NameEncoding::Utf8, true).expect("open archive");
        let (tx, rx) = std::sync::mpsc::channel();
        let mut progress = tx;
        archive
            .extract_to(&dest, None, &mut no_conflict(), &mut progress)
            .expect("extract all");

        let events: Vec<ProgressEvent> = rx.try_iter().collect();
        assert_eq!(
            events,
            vec![
                ProgressEvent::Begun { total: 3 },
                ProgressEvent::Advanced { completed: 1 },
                ProgressEvent::Advanced { completed: 2 },
                ProgressEvent::Advanced { completed: 3 },
                ProgressEvent::Finished,
            ]
        );
    }

    #[test]
    fn test_roundtrip_extract_then_add_back() {
        // 풀었다가 같은 위치에 모두 덮어쓰기로 다시 더하면 파일 내용이
        // 바이트 단위로 동일해야 한다.
        let temp = tempdir().expect("create tempdir");
        let path = temp.path().join("sample.zip");
        write_fixture(
            &path,
            &[("a/", ""), ("a/x.txt", "x-bytes"), ("a/b/", ""), ("a/b/y.txt", "y-bytes")],
        );
        let dest = temp.path().join("out");
        fs::create_dir_all(&dest).expect("create dest");

        let mut archive = Archive::open(&path, NameEncoding::Utf8, true).expect("open archive");
        archive
            .extract_to(&dest, None, &mut no_conflict(), &mut NoProgress)
            .expect("extract all");

        let summary = archive
            .add_paths(
                &[dest.join("a")],
                "",
                &mut |_: &str| ConflictResolution::OverwriteAll,
            )
            .expect("add extracted tree back");
        assert!(summary.is_clean());

        let mut reread = Archive::open(&path, NameEncoding::Utf8, true).expect("reopen archive");
        let mut names: Vec<String> =
            reread.entries().iter().map(|e| e.name.clone()).collect();
        names.sort();
        assert_eq!(names, vec!["a/", "a/b/", "a/b/y.txt", "a/x.txt"]);

        let mut body = Vec::new();
        reread
            .codec
            .copy_entry_to("a/x.txt", &mut body)
            .expect("read x");
        assert_eq!(body, b"x-bytes");

        body.clear();
        reread
            .codec
            .copy_entry_to("a/b/y.txt", &mut body)
            .expect("read y");
        assert_eq!(body, b"y-bytes");
    }
}
