use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;

use crate::config::{Config, ConfigError};
use crate::export::{self, ExportError};
use crate::history::{HistoryStore, PersistenceError};
use crate::process::CalcError;
use crate::properties::StandardBackend;
use crate::server;
use crate::service::{Solver, ThermoOutcome, ThermoRequest};
use crate::ui_cli::{self, Cli, Command, HistoryCommand};

/// 애플리케이션 실행 중 발생 가능한 오류를 표현한다.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("입출력 오류: {0}")]
    Io(#[from] std::io::Error),

    #[error("설정 오류: {0}")]
    Config(#[from] ConfigError),

    #[error("계산 오류: {0}")]
    Calc(#[from] CalcError),

    #[error("이력 저장소 오류: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("CSV 변환 오류: {0}")]
    Export(#[from] ExportError),

    #[error("잘못된 서버 주소: {0}")]
    Address(String),
}

/// 설정에 따라 이력 저장소를 연다. 기록을 끄면 저장소 없이 동작한다.
fn open_store(cfg: &Config) -> Result<Option<HistoryStore>, AppError> {
    if !cfg.storage.record_history {
        tracing::info!("이력 기록 비활성");
        return Ok(None);
    }
    Ok(Some(HistoryStore::open(&cfg.storage.database_path)?))
}

fn build_solver(cfg: &Config) -> Result<Solver, AppError> {
    Ok(Solver::new(Arc::new(StandardBackend::new()), open_store(cfg)?))
}

fn print_outcome(cfg: &Config, outcome: &ThermoOutcome, csv: bool) -> Result<(), AppError> {
    if csv {
        print!("{}", outcome.to_csv()?);
        return Ok(());
    }
    match outcome {
        ThermoOutcome::Rankine { result, .. } => ui_cli::print_rankine(&cfg.display, result),
        ThermoOutcome::Unsteady(result) => ui_cli::print_discharge(&cfg.display, result),
    }
    Ok(())
}

fn calculate_and_print(
    cfg: &Config,
    request: ThermoRequest,
    csv: bool,
) -> Result<(), AppError> {
    let solver = build_solver(cfg)?;
    let response = solver.calculate(&request)?;
    print_outcome(cfg, &response.outcome, csv)?;
    if let Some(err) = response.history_error {
        eprintln!("경고: 이력 기록 실패 ({err})");
    }
    Ok(())
}

fn run_server(cfg: &Config, host: Option<String>, port: Option<u16>) -> Result<(), AppError> {
    let host = host.unwrap_or_else(|| cfg.server.host.clone());
    let port = port.unwrap_or(cfg.server.port);
    let text = format!("{host}:{port}");
    let addr: SocketAddr = text.parse().map_err(|_| AppError::Address(text.clone()))?;

    let solver = Arc::new(build_solver(cfg)?);
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(server::serve(solver, addr));
    Ok(())
}

fn run_history(cfg: &Config, cmd: HistoryCommand) -> Result<(), AppError> {
    let store = HistoryStore::open(&cfg.storage.database_path)?;
    match cmd {
        HistoryCommand::List { limit } => {
            let records = match limit {
                Some(n) => store.recent(n)?,
                None => store.list()?,
            };
            ui_cli::print_history(&records);
        }
        HistoryCommand::Clear => {
            let removed = store.clear()?;
            println!("이력 {removed}건을 삭제했습니다.");
        }
        HistoryCommand::Export => {
            print!("{}", export::history_to_csv(&store.list()?)?);
        }
    }
    Ok(())
}

/// 명령 하나를 실행한다.
pub fn run(cli: Cli, cfg: &Config) -> Result<(), AppError> {
    match cli.command {
        Command::Serve { host, port } => run_server(cfg, host, port),
        Command::Rankine(args) => {
            calculate_and_print(cfg, ThermoRequest::Rankine(args.to_input()), args.csv)
        }
        Command::Tank(args) => {
            calculate_and_print(cfg, ThermoRequest::TankDischarge(args.to_input()), args.csv)
        }
        Command::History(cmd) => run_history(cfg, cmd),
    }
}
