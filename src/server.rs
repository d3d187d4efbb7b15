//! HTTP 인터페이스 (warp).
//!
//! - POST   /calculate       계산 + 이력 기록
//! - POST   /export          계산 결과 CSV (이력 기록 없음)
//! - GET    /history         이력 조회 (?limit=N)
//! - GET    /history/export  이력 CSV
//! - DELETE /history/clear   이력 전체 삭제
//! - GET    /fluids          지원 유체 목록
//!
//! 물성 계산과 SQLite 접근은 동기 코드라 `spawn_blocking` 스레드에서 돌린다.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use warp::http::StatusCode;
use warp::reply::Response;
use warp::{Filter, Rejection, Reply};

use crate::export;
use crate::process::CalcError;
use crate::properties::Fluid;
use crate::service::{Solver, ThermoRequest};

/// 오류 응답 본문
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub kind: String,
}

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    limit: Option<usize>,
}

#[derive(Serialize)]
struct HistoryBody<'a> {
    history: &'a [crate::history::HistoryRecord],
}

#[derive(Serialize)]
struct ClearedBody {
    status: &'static str,
    removed: usize,
}

#[derive(Serialize)]
struct FluidsBody {
    fluids: Vec<&'static str>,
}

fn json_response<T: Serialize>(body: &T, status: StatusCode) -> Response {
    warp::reply::with_status(warp::reply::json(body), status).into_response()
}

fn error_response(status: StatusCode, kind: &str, error: impl ToString) -> Response {
    json_response(
        &ErrorBody {
            error: error.to_string(),
            kind: kind.to_string(),
        },
        status,
    )
}

fn csv_response(body: String) -> Response {
    warp::reply::with_header(body, "content-type", "text/csv; charset=utf-8").into_response()
}

fn calc_error_response(err: &CalcError) -> Response {
    let status = match err {
        CalcError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
        CalcError::PropertyLookup { .. } => StatusCode::UNPROCESSABLE_ENTITY,
    };
    error_response(status, err.kind(), err)
}

fn calculate(request: ThermoRequest, solver: Arc<Solver>) -> Response {
    match solver.calculate(&request) {
        Ok(resp) => json_response(&resp, StatusCode::OK),
        Err(err) => calc_error_response(&err),
    }
}

fn export_result(request: ThermoRequest, solver: Arc<Solver>) -> Response {
    let outcome = match solver.evaluate(&request) {
        Ok(outcome) => outcome,
        Err(err) => return calc_error_response(&err),
    };
    match outcome.to_csv() {
        Ok(body) => csv_response(body),
        Err(err) => error_response(StatusCode::INTERNAL_SERVER_ERROR, "export", err),
    }
}

fn history(query: HistoryQuery, solver: Arc<Solver>) -> Response {
    match solver.history(query.limit) {
        Ok(records) => json_response(&HistoryBody { history: &records }, StatusCode::OK),
        Err(err) => {
            tracing::error!(error = %err, "이력 조회 실패");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "persistence", err)
        }
    }
}

fn history_export(solver: Arc<Solver>) -> Response {
    let records = match solver.history(None) {
        Ok(records) => records,
        Err(err) => {
            tracing::error!(error = %err, "이력 조회 실패");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "persistence", err);
        }
    };
    match export::history_to_csv(&records) {
        Ok(body) => csv_response(body),
        Err(err) => error_response(StatusCode::INTERNAL_SERVER_ERROR, "export", err),
    }
}

fn history_clear(solver: Arc<Solver>) -> Response {
    match solver.clear_history() {
        Ok(removed) => json_response(
            &ClearedBody {
                status: "History cleared",
                removed,
            },
            StatusCode::OK,
        ),
        Err(err) => {
            tracing::error!(error = %err, "이력 삭제 실패");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "persistence", err)
        }
    }
}

fn fluids() -> Response {
    json_response(
        &FluidsBody {
            fluids: Fluid::ALL.iter().map(|f| f.name()).collect(),
        },
        StatusCode::OK,
    )
}

/// 동기 핸들러를 blocking 스레드 풀에서 실행한다.
async fn blocking<F>(handler: F) -> Result<Response, Rejection>
where
    F: FnOnce() -> Response + Send + 'static,
{
    match tokio::task::spawn_blocking(handler).await {
        Ok(resp) => Ok(resp),
        Err(err) => {
            tracing::error!(error = %err, "핸들러 작업 실패");
            Ok(error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal", err))
        }
    }
}

/// 본문/쿼리 파싱 실패를 JSON 오류로 바꾼다. 나머지는 warp 기본 처리에 맡긴다.
async fn handle_rejection(err: Rejection) -> Result<Response, Rejection> {
    if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        return Ok(error_response(StatusCode::BAD_REQUEST, "invalid_input", e));
    }
    if let Some(e) = err.find::<warp::reject::InvalidQuery>() {
        return Ok(error_response(StatusCode::BAD_REQUEST, "invalid_input", e));
    }
    Err(err)
}

fn with_solver(
    solver: Arc<Solver>,
) -> impl Filter<Extract = (Arc<Solver>,), Error = std::convert::Infallible> + Clone {
    warp::any().map(move || solver.clone())
}

/// 전체 라우트
pub fn routes(
    solver: Arc<Solver>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let calculate_route = warp::path!("calculate")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_solver(solver.clone()))
        .and_then(|request: ThermoRequest, solver: Arc<Solver>| {
            blocking(move || calculate(request, solver))
        });

    let export_route = warp::path!("export")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_solver(solver.clone()))
        .and_then(|request: ThermoRequest, solver: Arc<Solver>| {
            blocking(move || export_result(request, solver))
        });

    let history_list_route = warp::path!("history")
        .and(warp::get())
        .and(warp::query::<HistoryQuery>())
        .and(with_solver(solver.clone()))
        .and_then(|query: HistoryQuery, solver: Arc<Solver>| {
            blocking(move || history(query, solver))
        });

    let history_export_route = warp::path!("history" / "export")
        .and(warp::get())
        .and(with_solver(solver.clone()))
        .and_then(|solver: Arc<Solver>| blocking(move || history_export(solver)));

    let history_clear_route = warp::path!("history" / "clear")
        .and(warp::delete())
        .and(with_solver(solver))
        .and_then(|solver: Arc<Solver>| blocking(move || history_clear(solver)));

    let fluids_route = warp::path!("fluids").and(warp::get()).map(fluids);

    calculate_route
        .or(export_route)
        .unify()
        .or(history_list_route)
        .unify()
        .or(history_export_route)
        .unify()
        .or(history_clear_route)
        .unify()
        .or(fluids_route)
        .unify()
        .recover(handle_rejection)
        .unify()
        .with(warp::trace::request())
}

/// 서버를 띄우고 종료될 때까지 대기한다.
pub async fn serve(solver: Arc<Solver>, addr: SocketAddr) {
    tracing::info!(%addr, backend = solver.backend().name(), "서버 시작");
    warp::serve(routes(solver)).run(addr).await;
}
