//! # camwatch-monitor
//!
//! 카메라 스트림 모니터링 엔진.
//! 프레임 수집 루프, 슬라이딩 윈도우 이상 탐지, 디바운스 알림,
//! 단일 세션 생명주기를 관리한다. 어댑터는 `camwatch-core` 포트로만 참조한다.

pub mod anomaly;
pub mod controller;
pub mod metrics_window;
pub mod session;

pub use controller::{SessionController, StartOutcome, StopOutcome};
pub use session::{SessionDeps, SessionOutcome};
