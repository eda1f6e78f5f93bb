use clap::Parser;
use compile_doc::domain::model::BuildReport;
use compile_doc::utils::error::{BuildError, ErrorSeverity};
use compile_doc::utils::logger;
use compile_doc::{BuildEngine, BuildPlan, CliConfig, ConsoleReporter, ShellRunner};

fn report_error(e: &BuildError) {
    tracing::error!(
        "❌ {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
}

fn write_report(path: &str, report: &BuildReport) -> compile_doc::Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json)?;
    tracing::info!("📁 Build report saved to: {}", path);
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.log_json {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }
    tracing::debug!("CLI config: {:?}", cli);

    // 載入並驗證配置
    let config = match cli.resolve() {
        Ok(config) => config,
        Err(e) => {
            report_error(&e);
            std::process::exit(1);
        }
    };

    let plan = BuildPlan::from_config(&config);
    let engine = BuildEngine::new(ShellRunner::from_config(&config), ConsoleReporter)
        .with_policy(config.failure_policy());

    if cli.dry_run {
        engine.dry_run(&plan);
        return Ok(());
    }

    let report = engine.run(&plan).await;

    if let Some(path) = &cli.report {
        if let Err(e) = write_report(path, &report) {
            // 報告寫入失敗不影響結束碼
            report_error(&e);
        }
    }

    if report.exit_code != 0 {
        if let Some(e) = report.first_failure() {
            report_error(&e);
            if e.severity() >= ErrorSeverity::High {
                eprintln!("💡 {}", e.recovery_suggestion());
            }
        }
        std::process::exit(report.exit_code);
    }

    Ok(())
}
