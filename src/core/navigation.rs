//! 디렉토리 이동 기록
//!
//! 디렉토리로 보기에서 브라우저식 이전/다음 이동을 제공한다. 기록은
//! 표시용 경로(`/`, `/a/b`)를 쌓으며, 압축 파일을 닫거나 다시 불러오면
//! 호출자가 [`Navigator::clear`]로 비운다.

use crate::core::archive::Archive;

/// 이전/다음 경로 스택
#[derive(Debug, Default)]
pub struct Navigator {
    back: Vec<String>,
    forward: Vec<String>,
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 기록 비우기
    pub fn clear(&mut self) {
        self.back.clear();
        self.forward.clear();
    }

    /// 이전 경로가 있는지 여부
    pub fn can_go_back(&self) -> bool {
        !self.back.is_empty()
    }

    /// 다음 경로가 있는지 여부
    pub fn can_go_forward(&self) -> bool {
        !self.forward.is_empty()
    }

    /// 선택한 디렉토리 항목으로 들어가기
    pub fn enter_directory(&mut self, archive: &mut Archive, visible_index: usize) {
        let Some(current) = archive.path_display() else {
            return;
        };

        self.back.push(current);
        self.forward.clear();
        archive.open_dir(visible_index);
    }

    /// 부모 디렉토리로 이동 (최상위면 no-op)
    pub fn go_up(&mut self, archive: &mut Archive) {
        match archive.path_display() {
            Some(current) if current != "/" => {
                self.back.push(current);
                self.forward.clear();
                archive.go_parent();
            }
            _ => {}
        }
    }

    /// 최상위 디렉토리로 이동 (최상위면 no-op)
    pub fn go_home(&mut self, archive: &mut Archive) {
        match archive.path_display() {
            Some(current) if current != "/" => {
                self.back.push(current);
                self.forward.clear();
                archive.go_top();
            }
            _ => {}
        }
    }

    /// 이전 디렉토리로 이동 (기록이 없으면 no-op)
    pub fn go_back(&mut self, archive: &mut Archive) {
        let Some(target) = self.back.pop() else {
            return;
        };

        if let Some(current) = archive.path_display() {
            self.forward.push(current);
        }
        archive.set_path(&target);
    }

    /// 다음 디렉토리로 이동 (기록이 없으면 no-op)
    pub fn go_forward(&mut self, archive: &mut Archive) {
        let Some(target) = self.forward.pop() else {
            return;
        };

        if let Some(current) = archive.path_display() {
            self.back.push(current);
        }
        archive.set_path(&target);
    }

    /// 특정 디렉토리로 이동
    ///
    /// 대상 디렉토리가 존재할 때만 기록을 쌓는다. 없는 경로는 커서를
    /// 바꾸지 않는다.
    pub fn goto_path(&mut self, archive: &mut Archive, display_path: &str) {
        let Some(current) = archive.path_display() else {
            return;
        };
        if current == display_path {
            return;
        }

        if archive.set_path(display_path) {
            self.back.push(current);
            self.forward.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::codec::NameEncoding;
    use std::fs::File;
    use std::io::Write;
    use std::path::Path;
    use tempfile::tempdir;
    use zip::write::SimpleFileOptions;
    use zip::{CompressionMethod, ZipWriter};

    fn write_fixture(path: &Path, entries: &[&str]) {
        let file = File::create(path).expect("create fixture archive");
        let mut writer = ZipWriter::new(file);
        let options =
            SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

        for name in entries {
            if name.ends_with('/') {
                writer.add_directory(*name, options).expect("add directory");
            } else {
                writer.start_file(*name, options).expect("start file");
                writer.write_all(b"x").expect("write body");
            }
        }
        writer.finish().expect("finish fixture");
    }

    fn sample_archive(dir: &Path) -> Archive {
        let path = dir.join("sample.zip");
        write_fixture(&path, &["a/", "a/b/", "a/b/c.txt", "d/"]);
        Archive::open(&path, NameEncoding::Utf8, true).expect("open archive")
    }

    fn visible_row(archive: &Archive, leaf: &str) -> usize {
        (0..archive.visible_count())
            .find(|&v| archive.entry_name(v) == leaf)
            .expect("visible row")
    }

    #[test]
    fn test_enter_then_back_and_forward() {
        let temp = tempdir().expect("create tempdir");
        let mut archive = sample_archive(temp.path());
        let mut nav = Navigator::new();

        let row_a = visible_row(&archive, "a");
        nav.enter_directory(&mut archive, row_a);
        let row_b = visible_row(&archive, "b");
        nav.enter_directory(&mut archive, row_b);
        assert_eq!(archive.path_display().as_deref(), Some("/a/b"));

        nav.go_back(&mut archive);
        assert_eq!(archive.path_display().as_deref(), Some("/a"));
        nav.go_back(&mut archive);
        assert_eq!(archive.path_display().as_deref(), Some("/"));
        assert!(!nav.can_go_back());

        nav.go_forward(&mut archive);
        assert_eq!(archive.path_display().as_deref(), Some("/a"));
        nav.go_forward(&mut archive);
        assert_eq!(archive.path_display().as_deref(), Some("/a/b"));
        assert!(!nav.can_go_forward());

        // 스택이 비었으면 no-op
        nav.go_forward(&mut archive);
        assert_eq!(archive.path_display().as_deref(), Some("/a/b"));
    }

    #[test]
    fn test_entering_clears_forward_history() {
        let temp = tempdir().expect("create tempdir");
        let mut archive = sample_archive(temp.path());
        let mut nav = Navigator::new();

        let row_a = visible_row(&archive, "a");
        nav.enter_directory(&mut archive, row_a);
        nav.go_back(&mut archive);
        assert!(nav.can_go_forward());

        let row_d = visible_row(&archive, "d");
        nav.enter_directory(&mut archive, row_d);
        assert!(!nav.can_go_forward());
        assert_eq!(archive.path_display().as_deref(), Some("/d"));
    }

    #[test]
    fn test_go_up_and_home() {
        let temp = tempdir().expect("create tempdir");
        let mut archive = sample_archive(temp.path());
        let mut nav = Navigator::new();

        nav.goto_path(&mut archive, "/a/b");
        nav.go_up(&mut archive);
        assert_eq!(archive.path_display().as_deref(), Some("/a"));

        nav.go_home(&mut archive);
        assert_eq!(archive.path_display().as_deref(), Some("/"));

        // 최상위에서는 기록을 쌓지 않음
        let back_before = nav.can_go_back();
        nav.go_up(&mut archive);
        nav.go_home(&mut archive);
        assert_eq!(archive.path_display().as_deref(), Some("/"));
        assert_eq!(nav.can_go_back(), back_before);
    }

    #[test]
    fn test_goto_missing_path_keeps_history_and_cursor() {
        let temp = tempdir().expect("create tempdir");
        let mut archive = sample_archive(temp.path());
        let mut nav = Navigator::new();

        nav.goto_path(&mut archive, "/a");
        nav.goto_path(&mut archive, "/nope");

        assert_eq!(archive.path_display().as_deref(), Some("/a"));
        // 실패한 이동은 기록에 남지 않음
        nav.go_back(&mut archive);
        assert_eq!(archive.path_display().as_deref(), Some("/"));
        assert!(!nav.can_go_back());
    }
}
