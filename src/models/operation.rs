//! 아카이브 작업 모델
//!
//! 덮어쓰기 충돌 해결, 일괄 작업 결과 집계, 진행률 보고에 필요한
//! 데이터 구조 정의

use std::sync::mpsc::Sender;

/// 충돌 해결 방법
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictResolution {
    /// 덮어쓰기
    Overwrite,
    /// 건너뛰기
    Skip,
    /// 모두 덮어쓰기
    OverwriteAll,
    /// 모두 건너뛰기
    SkipAll,
    /// 취소 (진행 중인 일괄 작업 전체 중단)
    Cancel,
}

/// 일괄 작업 결과 요약
#[derive(Debug, Clone, Default)]
pub struct OperationSummary {
    /// 전체 항목 수
    pub total_items: usize,
    /// 처리된 항목 수
    pub items_processed: usize,
    /// 건너뛴 항목 수
    pub items_skipped: usize,
    /// 누적 에러 목록 (`이름: 원인` 형식)
    pub errors: Vec<String>,
    /// 사용자가 취소했는지 여부
    pub cancelled: bool,
}

impl OperationSummary {
    /// 새 요약 생성
    pub fn new(total_items: usize) -> Self {
        Self {
            total_items,
            ..Self::default()
        }
    }

    /// 항목 에러 기록 (해당 항목은 건너뛴 것으로 집계)
    pub fn add_error(&mut self, name: &str, reason: &str) {
        self.items_skipped += 1;
        self.errors.push(format!("{}: {}", name, reason));
    }

    /// 에러 없이 완료되었는지 여부
    pub fn is_clean(&self) -> bool {
        !self.cancelled && self.errors.is_empty()
    }
}

/// 진행률 이벤트
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressEvent {
    /// 작업 시작 (전체 항목 수)
    Begun { total: usize },
    /// 항목 하나 처리 완료 (누적 완료 수)
    Advanced { completed: usize },
    /// 작업 종료
    Finished,
}

/// 진행률 수신자
///
/// 일괄 작업마다 `begin` / `update`* / `end` 순서로 호출된다.
pub trait ProgressSink {
    fn begin(&mut self, total: usize);
    fn update(&mut self, completed: usize);
    fn end(&mut self);
}

/// 진행률을 보고받지 않는 수신자
#[derive(Debug, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn begin(&mut self, _total: usize) {}
    fn update(&mut self, _completed: usize) {}
    fn end(&mut self) {}
}

impl ProgressSink for Sender<ProgressEvent> {
    fn begin(&mut self, total: usize) {
        let _ = self.send(ProgressEvent::Begun { total });
    }

    fn update(&mut self, completed: usize) {
        let _ = self.send(ProgressEvent::Advanced { completed });
    }

    fn end(&mut self) {
        let _ = self.send(ProgressEvent::Finished);
    }
}
