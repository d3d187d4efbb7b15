//! 명령행 정의와 결과 출력.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{DisplayUnits, DEFAULT_CONFIG_PATH};
use crate::history::HistoryRecord;
use crate::process::{RankineInput, RankineResult, TankDischargeInput, TankDischargeResult};
use crate::properties::{Fluid, StatePoint};
use crate::units::{from_kelvin, from_pascal, joule_to};

/// 랭킨 사이클 / 탱크 방출 열역학 계산기
#[derive(Debug, Parser)]
#[command(name = "thermo_solver", version)]
pub struct Cli {
    /// 설정 파일 경로
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// HTTP 서버 실행
    Serve {
        /// 설정의 host 대신 사용할 주소
        #[arg(long)]
        host: Option<String>,
        /// 설정의 port 대신 사용할 포트
        #[arg(long)]
        port: Option<u16>,
    },
    /// 이상 랭킨 사이클 계산
    Rankine(RankineArgs),
    /// 강체 탱크 방출 계산
    Tank(TankArgs),
    /// 계산 이력
    #[command(subcommand)]
    History(HistoryCommand),
}

#[derive(Debug, Args)]
pub struct RankineArgs {
    /// 보일러 압력 [bar]
    #[arg(long, default_value_t = 35.0)]
    pub boiler_bar: f64,
    /// 터빈 입구 온도 [°C]
    #[arg(long, default_value_t = 350.0)]
    pub inlet_c: f64,
    /// 복수기 압력 [bar]
    #[arg(long, default_value_t = 0.1)]
    pub condenser_bar: f64,
    /// 표 대신 CSV 출력
    #[arg(long)]
    pub csv: bool,
}

impl RankineArgs {
    pub fn to_input(&self) -> RankineInput {
        RankineInput {
            boiler_pressure_bar: self.boiler_bar,
            turbine_inlet_temp_c: self.inlet_c,
            condenser_pressure_bar: self.condenser_bar,
        }
    }
}

#[derive(Debug, Args)]
pub struct TankArgs {
    /// 유체 (Water, Air, Nitrogen, Oxygen, Methane, CO2)
    #[arg(long, default_value = "Air")]
    pub fluid: Fluid,
    /// 탱크 체적 [m³]
    #[arg(long, default_value_t = 0.3)]
    pub volume_m3: f64,
    /// 초기 압력 [bar]
    #[arg(long, default_value_t = 35.0)]
    pub initial_bar: f64,
    /// 초기 온도 [°C]
    #[arg(long, default_value_t = 40.0)]
    pub initial_c: f64,
    /// 최종 압력 [bar]
    #[arg(long, default_value_t = 1.0)]
    pub final_bar: f64,
    /// 표 대신 CSV 출력
    #[arg(long)]
    pub csv: bool,
}

impl TankArgs {
    pub fn to_input(&self) -> TankDischargeInput {
        TankDischargeInput {
            fluid: self.fluid,
            volume_m3: self.volume_m3,
            initial_pressure_bar: self.initial_bar,
            initial_temp_c: self.initial_c,
            final_pressure_bar: self.final_bar,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum HistoryCommand {
    /// 이력 목록
    List {
        /// 최근 N개만
        #[arg(long)]
        limit: Option<usize>,
    },
    /// 이력 전체 삭제
    Clear,
    /// 이력 CSV 출력
    Export,
}

fn print_state(units: &DisplayUnits, number: usize, label: &str, s: &StatePoint) {
    let e = units.energy.symbol();
    let quality = s
        .quality
        .map(|x| format!("  x={x:.4}"))
        .unwrap_or_default();
    println!(
        "  {number}) {label:<32} P={:.4} {}  T={:.2} {}  h={:.3} {e}/kg  s={:.5} {e}/kg·K  v={:.6} m³/kg{quality}",
        from_pascal(s.pressure_pa, units.pressure),
        units.pressure.symbol(),
        from_kelvin(s.temperature_k, units.temperature),
        units.temperature.symbol(),
        joule_to(s.enthalpy_j_per_kg, units.energy),
        joule_to(s.entropy_j_per_kg_k, units.energy),
        s.specific_volume_m3_per_kg,
    );
}

/// 랭킨 사이클 결과를 표로 출력한다.
pub fn print_rankine(units: &DisplayUnits, result: &RankineResult) {
    let e = units.energy.symbol();
    println!("\n-- 이상 랭킨 사이클 ({}) --", result.fluid);
    for s in &result.states {
        print_state(units, s.point.number(), s.point.label(), &s.state);
    }
    println!("터빈 일   : {:.3} {e}/kg", joule_to(result.turbine_work_j_per_kg, units.energy));
    println!("펌프 일   : {:.3} {e}/kg", joule_to(result.pump_work_j_per_kg, units.energy));
    println!("순 일     : {:.3} {e}/kg", joule_to(result.net_work_j_per_kg, units.energy));
    println!("가열량    : {:.3} {e}/kg", joule_to(result.heat_added_j_per_kg, units.energy));
    println!("열효율    : {:.2} %", result.efficiency_percent());
}

/// 탱크 방출 결과를 출력한다.
pub fn print_discharge(units: &DisplayUnits, result: &TankDischargeResult) {
    println!("\n-- 탱크 방출 ({}, V={} m³) --", result.fluid, result.volume_m3);
    print_state(units, 1, "initial", &result.initial_state);
    print_state(units, 2, "final (isentropic)", &result.final_state);
    println!("초기 질량 : {:.4} kg", result.initial_mass_kg);
    println!("최종 질량 : {:.4} kg", result.final_mass_kg);
    println!("방출 질량 : {:.4} kg", result.discharged_mass_kg);
    println!(
        "최종 온도 : {:.2} {}",
        from_kelvin(result.final_temperature_k, units.temperature),
        units.temperature.symbol()
    );
    println!(
        "최대 일   : {:.3} {}",
        joule_to(result.max_work_j, units.energy),
        units.energy.symbol()
    );
}

/// 이력 요약을 출력한다.
pub fn print_history(records: &[HistoryRecord]) {
    if records.is_empty() {
        println!("저장된 이력이 없습니다.");
        return;
    }
    for r in records {
        println!(
            "#{:<5} {}  {:<8} {:<8} primary={:.6e}  secondary={:.6e}",
            r.id,
            r.timestamp.format("%Y-%m-%d %H:%M:%S"),
            r.mode.as_str(),
            r.fluid,
            r.primary_value,
            r.secondary_value
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn tank_args_parse_fluid_aliases() {
        let cli = Cli::try_parse_from(["thermo_solver", "tank", "--fluid", "co2", "--final-bar", "2"])
            .unwrap();
        match cli.command {
            Command::Tank(args) => {
                let input = args.to_input();
                assert_eq!(input.fluid, Fluid::CarbonDioxide);
                assert_eq!(input.final_pressure_bar, 2.0);
                assert_eq!(input.volume_m3, 0.3);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
