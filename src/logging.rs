//! tracing 구독자 초기화.
//! RUST_LOG 환경변수가 있으면 설정 파일의 필터보다 우선한다.

use tracing_subscriber::{fmt, EnvFilter};

/// 전역 구독자를 설치한다. 이미 설치되어 있으면 조용히 넘어간다.
pub fn init(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let result = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init();

    if result.is_ok() {
        tracing::debug!(filter = default_filter, "로깅 초기화");
    }
}

/// 테스트용. 출력은 테스트 하네스가 잡는다.
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
