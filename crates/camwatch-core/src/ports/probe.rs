//! 네트워크 도달성 검사 포트.
//!
//! 구현: `camwatch-network` crate (ping 서브프로세스)

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;

/// 도달성 검사 결과
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeOutcome {
    /// 호스트 응답
    Reachable,
    /// 호스트 무응답
    Unreachable,
    /// 검사 자체 실패 (타임아웃, 실행 불가 등)
    ProbeError(String),
}

impl fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeOutcome::Reachable => write!(f, "reachable"),
            ProbeOutcome::Unreachable => write!(f, "unreachable"),
            ProbeOutcome::ProbeError(reason) => write!(f, "probe error: {reason}"),
        }
    }
}

/// 도달성 검사기 — 문제 발생 시에만 호출 (주기적 폴링 금지)
#[async_trait]
pub trait ReachabilityProbe: Send + Sync {
    /// 스트림 엔드포인트에서 검사 대상 호스트 추출 (실패 시 None, 패닉 없음)
    fn extract_host(&self, endpoint: &str) -> Option<String>;

    /// 호스트 도달성 검사 (구현체가 자체 타임아웃을 보장)
    async fn probe(&self, host: &str) -> ProbeOutcome;
}
