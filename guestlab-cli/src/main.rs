//! guestlab 명령줄 도구 진입점
//!
//! 설정 로드, 로깅 초기화, 서브커맨드 디스패치를 담당한다.
//! 종료 코드 매핑은 [`error::CliError::exit_code`] 참고.

mod cli;
mod commands;
mod error;
mod logging;
mod output;

use clap::Parser;

use guestlab_core::config::GuestlabConfig;

use crate::cli::{Cli, Commands};
use crate::error::CliError;
use crate::output::OutputWriter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let code = match run(cli).await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("error: {e}");
            e.exit_code()
        }
    };
    std::process::exit(code);
}

async fn run(cli: Cli) -> Result<(), CliError> {
    // 로깅은 설정 파일이 깨져 있어도 동작해야 하므로, [general] 섹션을
    // 읽지 못하면 기본값으로 초기화한다. 설정 오류 자체는 각 서브커맨드가
    // 다시 로드하면서 보고한다.
    let general = match GuestlabConfig::from_file(&cli.config).await {
        Ok(config) => config.general,
        Err(_) => Default::default(),
    };
    logging::init_tracing(&general, cli.log_level.as_deref())?;

    guestlab_core::metrics::describe_all();

    let writer = OutputWriter::new(cli.output);

    match cli.command {
        Commands::Run(args) => commands::run::execute(args, &cli.config, &writer).await,
        Commands::Poll(args) => commands::poll::execute(args, &cli.config, &writer).await,
        Commands::Vm(args) => commands::vm::execute(args, &cli.config, &writer).await,
        Commands::Config(args) => commands::config::execute(args, &cli.config, &writer).await,
    }
}
