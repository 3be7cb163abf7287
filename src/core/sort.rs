//! 엔트리 정렬
//!
//! 모든 비교자는 `reverse` 플래그로 마지막 비교의 피연산자 순서를
//! 뒤집는다. 디렉토리 우선 정렬은 같은 종류끼리 항상 같다고 판단하고
//! 2차 순서를 안정 정렬에 맡긴다.

use crate::core::archive::Archive;
use crate::models::archive_entry::ArchiveEntry;
use crate::models::sort::{EntryKind, SortBy};
use std::cmp::Ordering;

impl Archive {
    /// 기준에 따라 엔트리 목록 정렬
    ///
    /// 위치 정렬은 모든 파일 보기에서만 의미가 있고 디렉토리로 보기에서는
    /// 아무 일도 하지 않는다.
    pub fn sort_by(&mut self, sort_by: SortBy, reverse: bool) {
        match sort_by {
            SortBy::Name => self.entries.sort_by(|a, b| {
                ordered(a.leaf_name().cmp(b.leaf_name()), reverse)
            }),
            SortBy::Size => self.sort_by_size(reverse),
            SortBy::Kind => self.entries.sort_by(|a, b| {
                let kind_a = EntryKind::of_name(&a.name).name();
                let kind_b = EntryKind::of_name(&b.name).name();
                ordered(kind_a.cmp(kind_b), reverse)
            }),
            SortBy::Time => self.entries.sort_by(|a, b| {
                ordered(a.modified.cmp(&b.modified), reverse)
            }),
            SortBy::Path => {
                if self.is_tree_view() {
                    return;
                }
                self.entries.sort_by(|a, b| {
                    ordered(a.path_display().cmp(&b.path_display()), reverse)
                });
            }
        }
    }

    /// 디렉토리를 파일보다 앞에 두는 정렬 (`reverse`면 뒤에)
    pub fn sort_dirs_first(&mut self, reverse: bool) {
        self.entries.sort_by(|a, b| {
            match (a.is_directory(), b.is_directory()) {
                // 같은 종류는 항상 같음: 기존 순서가 유지된다
                (true, true) | (false, false) => Ordering::Equal,
                (true, false) => ordered(Ordering::Less, reverse),
                (false, true) => ordered(Ordering::Greater, reverse),
            }
        });
    }

    // 크기 정렬. 디렉토리로 보기에서 디렉토리는 하위 파일 합산 크기로
    // 비교하므로 키를 먼저 계산해 둔다.
    fn sort_by_size(&mut self, reverse: bool) {
        let tree_view = self.is_tree_view();
        let sizes: Vec<u64> = self
            .entries
            .iter()
            .map(|e| {
                if tree_view && e.is_directory() {
                    self.dir_size(&e.name)
                } else {
                    e.size
                }
            })
            .collect();

        let mut decorated: Vec<(u64, ArchiveEntry)> =
            sizes.into_iter().zip(self.entries.drain(..)).collect();
        decorated.sort_by(|a, b| ordered(a.0.cmp(&b.0), reverse));
        self.entries = decorated.into_iter().map(|(_, entry)| entry).collect();
    }
}

fn ordered(ordering: Ordering, reverse: bool) -> Ordering {
    if reverse {
        ordering.reverse()
    } else {
        ordering
    }
}
