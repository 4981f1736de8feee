use chrono::Utc;
use clap::Parser;
use nse_picks::core::job::run_daemon;
use nse_picks::core::schedule::{describe_fire_time, parse_timezone};
use nse_picks::utils::{logger, validation::Validate};
use nse_picks::{dispatch, AppConfig, CliConfig, Command, CronSchedule, Job, PicksError, Trigger};

fn exit_with(e: &PicksError, context: &str) -> ! {
    // 記錄詳細錯誤信息
    tracing::error!(
        "❌ {}: {} (Category: {:?}, Severity: {:?})",
        context,
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    // 輸出用戶友好的錯誤信息
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

    std::process::exit(e.exit_code());
}

fn load_config(cli: &CliConfig) -> AppConfig {
    let config = match cli.load_app_config() {
        Ok(config) => config,
        Err(e) => exit_with(&e, "Failed to load configuration"),
    };

    // 驗證配置
    if let Err(e) = config.validate() {
        exit_with(&e, "Configuration validation failed");
    }

    config
}

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting nse-picks");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let config = load_config(&cli);

    match cli.command() {
        Command::Run {
            job,
            dry_run,
            output_path,
        } => {
            let job = Job::new(job, config)
                .dry_run(dry_run)
                .with_output_path(output_path);

            match dispatch(&job, Trigger::Manual).await {
                Ok(summary) => {
                    tracing::info!("✅ {} completed", job.kind());
                    println!("✅ {}", summary);
                }
                Err(e) => exit_with(&e, "Job failed"),
            }
        }
        Command::Schedule { count } => {
            let (schedule, zone) = match CronSchedule::parse(&config.schedule.cron)
                .and_then(|s| Ok((s, parse_timezone(&config.schedule.display_timezone)?)))
            {
                Ok(parsed) => parsed,
                Err(e) => exit_with(&e, "Invalid schedule"),
            };

            println!("📅 {}", schedule);
            for at in schedule.upcoming(Utc::now(), count) {
                println!("  {}", describe_fire_time(at, zone));
            }
        }
        Command::Daemon {
            job,
            dry_run,
            output_path,
        } => {
            let schedule = match CronSchedule::parse(&config.schedule.cron) {
                Ok(schedule) => schedule,
                Err(e) => exit_with(&e, "Invalid schedule"),
            };
            let job = Job::new(job, config)
                .dry_run(dry_run)
                .with_output_path(output_path);

            tracing::info!("🕒 Scheduling {} on '{}'", job.kind(), schedule);
            if let Err(e) = run_daemon(&job, &schedule).await {
                exit_with(&e, "Scheduler stopped");
            }
        }
    }
}
