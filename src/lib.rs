//! bokslzip - zip 압축 파일 항목 관리 엔진
//!
//! 평면 엔트리 목록을 가상 디렉토리 트리로 투영하고, 추가 기록 전용
//! 코덱 위에서 더하기/삭제/이름 바꾸기를 전체 재작성으로 구현한다.
//! 화면 표시(테이블, 트리, 대화상자)는 이 크레이트의 범위가 아니며
//! [`DecisionSource`], [`RenameSource`], [`ProgressSink`] 경계로만
//! 연결된다.

pub mod core;
pub mod models;
pub mod system;
pub mod utils;

pub use crate::core::{Archive, DecisionSource, Navigator, OverwriteState, RenameSource};
pub use crate::models::{
    ArchiveEntry, ConflictResolution, EntryKind, NoProgress, OperationSummary, ProgressEvent,
    ProgressSink, SortBy, UNKNOWN_TIME,
};
pub use crate::system::NameEncoding;
pub use crate::utils::error::{BokslZipError, Result};
