//! CAMWATCH 도메인 모델.
//!
//! 모니터링 세션, 프레임, 품질 지표, 대시보드 이벤트, 제어 명령을 정의한다.
//! 외부로 나가는 모델은 `serde` Serialize를 구현한다.

pub mod command;
pub mod event;
pub mod frame;
pub mod quality;
pub mod session;
