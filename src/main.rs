use clap::Parser;
use everflow_dash::config::cli::{Command, OutputFormat, ReportArgs};
use everflow_dash::core::export::write_csv;
use everflow_dash::utils::error::ErrorSeverity;
use everflow_dash::utils::{logger, validation::Validate};
use everflow_dash::{
    server, AppConfig, CliConfig, DashError, DateRange, EverflowClient, EverflowService,
};
use std::io::Write;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting everflow-dash");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let mut config = match AppConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => exit_with(e),
    };

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        exit_with(e);
    }

    let outcome = match cli.command.clone() {
        None => server::start_server(config).await,
        Some(Command::Serve { host, port }) => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            server::start_server(config).await
        }
        Some(Command::Report(args)) => run_report(&config, &args).await,
    };

    if let Err(e) = outcome {
        tracing::error!(
            "❌ everflow-dash failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        exit_with(e);
    }

    Ok(())
}

async fn run_report(config: &AppConfig, args: &ReportArgs) -> everflow_dash::Result<()> {
    let range = DateRange::parse(&args.start, &args.end)?;

    let client = EverflowClient::new(&config.everflow)?;
    let service = EverflowService::new(client, &config.everflow);
    let result = service.entity_stats(args.kind, &range).await?;

    if result.is_unrecognized() {
        tracing::warn!("⚠️ Everflow response was not recognized; output contains the raw payload");
    }

    let mut buffer = Vec::new();
    match args.format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut buffer, &result)?;
            buffer.push(b'\n');
        }
        OutputFormat::Csv => write_csv(result.records(), &mut buffer)?,
    }

    match &args.output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, &buffer)?;
            tracing::info!("📁 Report saved to: {}", path.display());
        }
        None => std::io::stdout().write_all(&buffer)?,
    }

    tracing::info!(
        "✅ {} report: {} records ({})",
        args.kind.as_str(),
        result.count(),
        result.data_source()
    );
    Ok(())
}

/// 輸出使用者訊息並依錯誤嚴重程度決定退出碼
fn exit_with(e: DashError) -> ! {
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::Low | ErrorSeverity::High => 1,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::Critical => 3,
    };

    std::process::exit(exit_code);
}
