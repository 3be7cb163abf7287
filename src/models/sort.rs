//! 정렬 기준과 엔트리 형식 분류

use crate::utils::entry_path;

/// 정렬 기준
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortBy {
    /// 이름 (경로 미포함)
    Name,
    /// 크기 (디렉토리는 하위 파일 크기 합)
    Size,
    /// 형식 (확장자 기반 분류)
    Kind,
    /// 수정 시간
    Time,
    /// 위치 (모든 파일 보기에서만)
    Path,
}

/// 확장자로 판단한 엔트리 형식
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// 디렉토리
    Directory,
    /// 그림 파일
    Image,
    /// 음악 파일
    Audio,
    /// 동영상 파일
    Video,
    /// 텍스트 파일
    Text,
    /// HTML 파일
    Html,
    /// 압축 파일
    Archive,
    /// 일반 파일
    Regular,
}

impl EntryKind {
    /// 엔트리 이름에서 형식 판단
    pub fn of_name(name: &str) -> Self {
        if entry_path::is_dir_name(name) {
            return EntryKind::Directory;
        }

        let leaf = entry_path::leaf_name(name);
        let Some((_, extension)) = leaf.rsplit_once('.') else {
            return EntryKind::Regular;
        };

        match extension.to_lowercase().as_str() {
            "jpg" | "jpeg" | "bmp" | "png" | "gif" => EntryKind::Image,
            "mp3" | "wav" | "ogg" => EntryKind::Audio,
            "avi" | "mpg" | "mpeg" => EntryKind::Video,
            "txt" => EntryKind::Text,
            "html" | "htm" => EntryKind::Html,
            "zip" | "gz" | "bz2" | "rar" | "jar" => EntryKind::Archive,
            _ => EntryKind::Regular,
        }
    }

    /// 형식 이름 반환
    pub fn name(&self) -> &'static str {
        match self {
            EntryKind::Directory => "directory",
            EntryKind::Image => "image",
            EntryKind::Audio => "audio",
            EntryKind::Video => "video",
            EntryKind::Text => "text",
            EntryKind::Html => "html",
            EntryKind::Archive => "archive",
            EntryKind::Regular => "regular",
        }
    }

    /// 한글 이름 반환
    pub fn name_ko(&self) -> &'static str {
        match self {
            EntryKind::Directory => "디렉토리",
            EntryKind::Image => "그림 파일",
            EntryKind::Audio => "음악 파일",
            EntryKind::Video => "동영상 파일",
            EntryKind::Text => "텍스트 파일",
            EntryKind::Html => "HTML 파일",
            EntryKind::Archive => "압축 파일",
            EntryKind::Regular => "일반 파일",
        }
    }
}
