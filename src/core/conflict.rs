//! 이름 충돌 협상
//!
//! 더하기/압축 풀기 중 대상 이름이 이미 존재할 때 외부 결정자와
//! 덮어쓰기 여부를 협상한다. `OverwriteAll`/`SkipAll`은 작업이 끝날
//! 때까지 유지되고, `Cancel`은 진행 중인 일괄 작업 전체를 중단시킨다.

use crate::models::operation::ConflictResolution;

/// 덮어쓰기 여부를 결정하는 외부 결정자 (덮어쓰기 대화상자)
pub trait DecisionSource {
    /// 충돌한 경로에 대한 결정 반환
    fn decide(&mut self, candidate: &str) -> ConflictResolution;
}

impl<F> DecisionSource for F
where
    F: FnMut(&str) -> ConflictResolution,
{
    fn decide(&mut self, candidate: &str) -> ConflictResolution {
        self(candidate)
    }
}

/// 작업 하나 동안 유지되는 덮어쓰기 상태
///
/// 기본값은 건너뛰기. 결정자의 답이 새 상태로 저장된다.
#[derive(Debug)]
pub struct OverwriteState {
    mode: ConflictResolution,
}

impl OverwriteState {
    pub fn new() -> Self {
        Self {
            mode: ConflictResolution::Skip,
        }
    }

    /// 충돌한 `candidate`를 덮어쓸지 결정
    pub fn resolve(&mut self, candidate: &str, source: &mut dyn DecisionSource) -> bool {
        match self.mode {
            ConflictResolution::OverwriteAll => true,
            ConflictResolution::SkipAll | ConflictResolution::Cancel => false,
            ConflictResolution::Overwrite | ConflictResolution::Skip => {
                self.mode = source.decide(candidate);
                matches!(
                    self.mode,
                    ConflictResolution::Overwrite | ConflictResolution::OverwriteAll
                )
            }
        }
    }

    /// 취소 여부 (일괄 작업 중단 신호)
    pub fn is_cancelled(&self) -> bool {
        self.mode == ConflictResolution::Cancel
    }
}

impl Default for OverwriteState {
    fn default() -> Self {
        Self::new()
    }
}
